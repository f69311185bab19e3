//! Line layout shared by the protocol encoder and the human-readable renderer.
//!
//! Both outputs walk the same list of [`Line`]s, which keeps the section
//! order of a printed receipt and its on-screen fallback identical.

use crate::commands::Alignment;
use crate::receipt::{LineItem, ReceiptDocument};
use posdeck_core::constants::{
    ITEM_NAME_WIDTH, ITEM_PRICE_WIDTH, ITEM_QUANTITY_WIDTH, RECEIPT_LINE_WIDTH,
};

/// Visual style of one receipt line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineStyle {
    pub align: Alignment,
    pub bold: bool,
    pub double_size: bool,
}

impl LineStyle {
    /// Printer state right after `ESC @`.
    pub const RESET: LineStyle = LineStyle {
        align: Alignment::Left,
        bold: false,
        double_size: false,
    };

    pub const fn aligned(align: Alignment) -> Self {
        Self {
            align,
            bold: false,
            double_size: false,
        }
    }

    pub const fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub const fn double_size(mut self) -> Self {
        self.double_size = true;
        self
    }
}

/// One line of receipt text with its style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub text: String,
    pub style: LineStyle,
}

impl Line {
    fn new(text: impl Into<String>, style: LineStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

/// Format an amount with exactly two decimals.
pub fn format_amount(value: f64) -> String {
    format!("{value:.2}")
}

/// Format a quantity, dropping the decimals for whole numbers.
pub fn format_quantity(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

/// Truncate or right-pad `text` to exactly `width` characters.
pub fn fit(text: &str, width: usize) -> String {
    let truncated: String = text.chars().take(width).collect();
    format!("{truncated:<width$}")
}

/// Right-justify `text` in `width` characters, truncating from the left.
pub fn right_justify(text: &str, width: usize) -> String {
    let count = text.chars().count();
    if count >= width {
        text.chars().skip(count - width).collect()
    } else {
        format!("{text:>width$}")
    }
}

/// Full-width divider.
pub fn divider() -> String {
    "-".repeat(RECEIPT_LINE_WIDTH)
}

/// Name, quantity and unit price columns of an item row.
pub fn item_row(item: &LineItem) -> String {
    format!(
        "{}{}{}",
        fit(&item.name, ITEM_NAME_WIDTH),
        right_justify(&format_quantity(item.quantity), ITEM_QUANTITY_WIDTH),
        right_justify(&format_amount(item.unit_price), ITEM_PRICE_WIDTH),
    )
}

/// Lay out a receipt in print order.
pub fn receipt_lines(doc: &ReceiptDocument) -> Vec<Line> {
    let center = LineStyle::aligned(Alignment::Center);
    let left = LineStyle::aligned(Alignment::Left);
    let right = LineStyle::aligned(Alignment::Right);

    let mut lines = Vec::with_capacity(doc.items.len() * 2 + 24);

    lines.push(Line::new(&doc.store_name, center.bold().double_size()));
    if let Some(address) = &doc.store_address {
        lines.push(Line::new(address, center));
    }
    if let Some(phone) = &doc.store_phone {
        lines.push(Line::new(phone, center));
    }
    if let Some(header) = &doc.header {
        lines.extend(header.lines().map(|text| Line::new(text, center)));
    }
    lines.push(Line::new(divider(), center));

    lines.push(Line::new(format!("Receipt: {}", doc.receipt_number), left));
    lines.push(Line::new(format!("Date: {}", doc.date), left));
    lines.push(Line::new(divider(), left));

    for item in &doc.items {
        lines.push(Line::new(item_row(item), left));
        lines.push(Line::new(format_amount(item.line_total), right));
    }
    lines.push(Line::new(divider(), left));

    lines.push(Line::new(format!("Subtotal: {}", format_amount(doc.subtotal)), right));
    if let Some(discount) = doc.discount {
        lines.push(Line::new(format!("Discount: -{}", format_amount(discount)), right));
    }
    if let Some(tax) = &doc.tax {
        lines.push(Line::new(
            format!("{}: {}", tax.label, format_amount(tax.amount)),
            right,
        ));
    }
    lines.push(Line::new(format!("TOTAL: {}", format_amount(doc.total)), right.bold()));

    lines.push(Line::new(format!("Payment: {}", doc.payment_method), left));
    if let Some(cash) = doc.cash_received {
        lines.push(Line::new(format!("Cash: {}", format_amount(cash)), left));
    }
    if let Some(change) = doc.change {
        lines.push(Line::new(format!("Change: {}", format_amount(change)), left));
    }

    if let Some(footer) = &doc.footer {
        lines.push(Line::new(String::new(), center));
        lines.extend(footer.lines().map(|text| Line::new(text, center)));
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1.0, "1.00")]
    #[case(12.346, "12.35")]
    #[case(-3.5, "-3.50")]
    #[case(0.0, "0.00")]
    fn test_format_amount(#[case] value: f64, #[case] expected: &str) {
        assert_eq!(format_amount(value), expected);
    }

    #[rstest]
    #[case(2.0, "2")]
    #[case(0.5, "0.50")]
    #[case(-1.0, "-1")]
    fn test_format_quantity(#[case] value: f64, #[case] expected: &str) {
        assert_eq!(format_quantity(value), expected);
    }

    #[test]
    fn test_fit_pads_and_truncates() {
        assert_eq!(fit("abc", 5), "abc  ");
        assert_eq!(fit("abcdefgh", 5), "abcde");
        assert_eq!(fit("çãé", 2), "çã");
    }

    #[test]
    fn test_right_justify() {
        assert_eq!(right_justify("7", 3), "  7");
        assert_eq!(right_justify("12345", 3), "345");
    }

    #[test]
    fn test_item_row_has_fixed_width() {
        let item = LineItem::new("A very long product name that overflows", 2.0, 3.5);
        let row = item_row(&item);

        assert_eq!(row.chars().count(), RECEIPT_LINE_WIDTH);
        assert!(row.starts_with("A very long product name"));
        assert!(row.ends_with("3.50"));
    }

    #[test]
    fn test_receipt_lines_section_order() {
        let doc = ReceiptDocument::builder("Shop", "R1", "2025-01-01")
            .address("1 Main St")
            .item(LineItem::new("Tea", 1.0, 2.0))
            .tax("Tax", 0.2)
            .payment_method("Card")
            .footer("Thanks")
            .build();

        let lines = receipt_lines(&doc);
        let texts: Vec<&str> = lines
            .iter()
            .map(|line| line.text.as_str())
            .collect();

        let position = |needle: &str| texts.iter().position(|t| t.starts_with(needle)).unwrap();

        assert_eq!(texts[0], "Shop");
        assert!(position("1 Main St") < position("Receipt: R1"));
        assert!(position("Receipt: R1") < position("Tea"));
        assert!(position("Tea") < position("Subtotal"));
        assert!(position("Subtotal") < position("Tax: 0.20"));
        assert!(position("Tax: 0.20") < position("TOTAL"));
        assert!(position("TOTAL") < position("Payment: Card"));
        assert_eq!(*texts.last().unwrap(), "Thanks");
    }

    #[test]
    fn test_store_name_is_bold_centered_double() {
        let doc = ReceiptDocument::sample();
        let first = &receipt_lines(&doc)[0];

        assert_eq!(first.style.align, Alignment::Center);
        assert!(first.style.bold);
        assert!(first.style.double_size);
    }

    #[test]
    fn test_item_total_is_right_aligned() {
        let doc = ReceiptDocument::sample();
        let lines = receipt_lines(&doc);
        let row = lines
            .iter()
            .position(|line| line.text.starts_with("Test item"))
            .unwrap();

        assert_eq!(lines[row + 1].text, "1.00");
        assert_eq!(lines[row + 1].style.align, Alignment::Right);
    }
}
