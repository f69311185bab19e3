//! Human-readable receipt rendering.
//!
//! When no printer protocol path is available the receipt is rendered as a
//! paginated document instead: plain text for previews and logs, and a
//! self-contained HTML page sized for an 80 mm roll that an OS print dialog
//! can print directly. Sections appear in the same order as on the printed
//! receipt because both walk [`receipt_lines`].

use crate::commands::Alignment;
use crate::layout::{Line, receipt_lines};
use crate::receipt::ReceiptDocument;
use posdeck_core::constants::{FALLBACK_LINES_PER_PAGE, RECEIPT_LINE_WIDTH};
use std::fmt::Write;

/// One page of a rendered receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    lines: Vec<Line>,
}

impl RenderedPage {
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }
}

/// Paginated human-readable receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedReceipt {
    pages: Vec<RenderedPage>,
    template: Option<String>,
    title: String,
}

impl RenderedReceipt {
    pub fn pages(&self) -> &[RenderedPage] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn template(&self) -> Option<&str> {
        self.template.as_deref()
    }

    /// Plain text with each line padded to the receipt width according to
    /// its alignment. Pages are separated by a form feed.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for (index, page) in self.pages.iter().enumerate() {
            if index > 0 {
                out.push('\x0c');
            }
            for line in &page.lines {
                out.push_str(aligned_text(line).trim_end());
                out.push('\n');
            }
        }
        out
    }

    /// Print-ready HTML document.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
        let _ = writeln!(out, "<title>{}</title>", escape_html(&self.title));
        out.push_str(STYLESHEET);
        out.push_str("</head>\n");

        match &self.template {
            Some(template) => {
                let _ = writeln!(out, "<body data-template=\"{}\">", escape_html(template));
            }
            None => out.push_str("<body>\n"),
        }

        for page in &self.pages {
            out.push_str("<section class=\"page\">\n");
            for line in &page.lines {
                let _ = writeln!(
                    out,
                    "<div class=\"{}\">{}</div>",
                    line_classes(line),
                    escape_html(&line.text)
                );
            }
            out.push_str("</section>\n");
        }

        out.push_str("</body>\n</html>\n");
        out
    }
}

const STYLESHEET: &str = "<style>
@page { size: 80mm auto; margin: 4mm; }
body { width: 72mm; margin: 0 auto; font-family: monospace; font-size: 12px; }
.page { page-break-after: always; }
.page:last-child { page-break-after: auto; }
.line { white-space: pre; min-height: 1em; }
.left { text-align: left; }
.center { text-align: center; }
.right { text-align: right; }
.bold { font-weight: bold; }
.large { font-size: 200%; }
</style>
";

/// Render a receipt as a paginated human-readable document.
///
/// Rendering cannot fail.
///
/// # Examples
///
/// ```
/// use posdeck_escpos::{ReceiptDocument, render_receipt};
///
/// let rendered = render_receipt(&ReceiptDocument::sample());
/// assert_eq!(rendered.page_count(), 1);
/// assert!(rendered.to_text().contains("TEST PRINT"));
/// assert!(rendered.to_html().starts_with("<!DOCTYPE html>"));
/// ```
pub fn render_receipt(doc: &ReceiptDocument) -> RenderedReceipt {
    let lines = receipt_lines(doc);
    let pages = lines
        .chunks(FALLBACK_LINES_PER_PAGE)
        .map(|chunk| RenderedPage {
            lines: chunk.to_vec(),
        })
        .collect();

    RenderedReceipt {
        pages,
        template: doc.template.clone(),
        title: format!("Receipt {}", doc.receipt_number),
    }
}

fn aligned_text(line: &Line) -> String {
    let width = RECEIPT_LINE_WIDTH;
    match line.style.align {
        Alignment::Left => line.text.clone(),
        Alignment::Center => format!("{:^width$}", line.text),
        Alignment::Right => format!("{:>width$}", line.text),
    }
}

fn line_classes(line: &Line) -> String {
    let mut classes = String::from("line ");
    classes.push_str(match line.style.align {
        Alignment::Left => "left",
        Alignment::Center => "center",
        Alignment::Right => "right",
    });
    if line.style.bold {
        classes.push_str(" bold");
    }
    if line.style.double_size {
        classes.push_str(" large");
    }
    classes
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
