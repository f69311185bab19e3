//! Receipt document model.
//!
//! A [`ReceiptDocument`] is an immutable value describing one sale. Amounts
//! are plain numbers; the encoder and renderer print them with two decimals
//! and never add a currency symbol. Business rules are not validated here:
//! a negative quantity or a total that does not add up is printed as given.

use serde::{Deserialize, Serialize};

/// One sold item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub line_total: f64,
}

impl LineItem {
    /// Create an item whose line total is `quantity * unit_price`.
    pub fn new(name: impl Into<String>, quantity: f64, unit_price: f64) -> Self {
        Self {
            name: name.into(),
            quantity,
            unit_price,
            line_total: quantity * unit_price,
        }
    }
}

/// Tax summary line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxLine {
    pub label: String,
    pub amount: f64,
}

/// Complete receipt for one transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptDocument {
    pub store_name: String,
    #[serde(default)]
    pub store_address: Option<String>,
    #[serde(default)]
    pub store_phone: Option<String>,
    pub receipt_number: String,
    /// Pre-formatted transaction date.
    pub date: String,
    #[serde(default)]
    pub items: Vec<LineItem>,
    pub subtotal: f64,
    #[serde(default)]
    pub discount: Option<f64>,
    #[serde(default)]
    pub tax: Option<TaxLine>,
    pub total: f64,
    pub payment_method: String,
    #[serde(default)]
    pub cash_received: Option<f64>,
    #[serde(default)]
    pub change: Option<f64>,
    #[serde(default)]
    pub header: Option<String>,
    #[serde(default)]
    pub footer: Option<String>,
    /// Custom layout identifier understood by the human-readable renderer.
    #[serde(default)]
    pub template: Option<String>,
}

impl ReceiptDocument {
    /// Start building a receipt.
    ///
    /// # Examples
    ///
    /// ```
    /// use posdeck_escpos::{LineItem, ReceiptDocument};
    ///
    /// let receipt = ReceiptDocument::builder("Corner Shop", "R-0042", "2025-06-01 10:15")
    ///     .item(LineItem::new("Espresso", 2.0, 2.50))
    ///     .payment_method("Cash")
    ///     .cash(10.0)
    ///     .build();
    ///
    /// assert_eq!(receipt.subtotal, 5.0);
    /// assert_eq!(receipt.total, 5.0);
    /// assert_eq!(receipt.change, Some(5.0));
    /// ```
    pub fn builder(
        store_name: impl Into<String>,
        receipt_number: impl Into<String>,
        date: impl Into<String>,
    ) -> ReceiptBuilder {
        ReceiptBuilder::new(store_name, receipt_number, date)
    }

    /// Synthetic one-item receipt used for printer self-tests.
    pub fn sample() -> Self {
        Self::builder("TEST PRINT", "TEST-0001", "1970-01-01 00:00")
            .address("Printer self-test")
            .item(LineItem::new("Test item", 1.0, 1.00))
            .payment_method("Test")
            .footer("If you can read this, the printer works.")
            .build()
    }
}

/// Fluent builder for [`ReceiptDocument`].
///
/// Subtotal and total are derived from the items, discount and tax unless
/// set explicitly.
#[derive(Debug, Clone)]
pub struct ReceiptBuilder {
    doc: ReceiptDocument,
    subtotal_set: bool,
    total_set: bool,
}

impl ReceiptBuilder {
    fn new(
        store_name: impl Into<String>,
        receipt_number: impl Into<String>,
        date: impl Into<String>,
    ) -> Self {
        Self {
            doc: ReceiptDocument {
                store_name: store_name.into(),
                store_address: None,
                store_phone: None,
                receipt_number: receipt_number.into(),
                date: date.into(),
                items: Vec::new(),
                subtotal: 0.0,
                discount: None,
                tax: None,
                total: 0.0,
                payment_method: String::new(),
                cash_received: None,
                change: None,
                header: None,
                footer: None,
                template: None,
            },
            subtotal_set: false,
            total_set: false,
        }
    }

    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.doc.store_address = Some(address.into());
        self
    }

    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.doc.store_phone = Some(phone.into());
        self
    }

    pub fn item(mut self, item: LineItem) -> Self {
        self.doc.items.push(item);
        self
    }

    pub fn subtotal(mut self, subtotal: f64) -> Self {
        self.doc.subtotal = subtotal;
        self.subtotal_set = true;
        self
    }

    pub fn discount(mut self, discount: f64) -> Self {
        self.doc.discount = Some(discount);
        self
    }

    pub fn tax(mut self, label: impl Into<String>, amount: f64) -> Self {
        self.doc.tax = Some(TaxLine {
            label: label.into(),
            amount,
        });
        self
    }

    pub fn total(mut self, total: f64) -> Self {
        self.doc.total = total;
        self.total_set = true;
        self
    }

    pub fn payment_method(mut self, method: impl Into<String>) -> Self {
        self.doc.payment_method = method.into();
        self
    }

    /// Record cash tendered; change is derived from the total at build time.
    pub fn cash(mut self, received: f64) -> Self {
        self.doc.cash_received = Some(received);
        self
    }

    pub fn header(mut self, header: impl Into<String>) -> Self {
        self.doc.header = Some(header.into());
        self
    }

    pub fn footer(mut self, footer: impl Into<String>) -> Self {
        self.doc.footer = Some(footer.into());
        self
    }

    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.doc.template = Some(template.into());
        self
    }

    pub fn build(mut self) -> ReceiptDocument {
        if !self.subtotal_set {
            self.doc.subtotal = self.doc.items.iter().map(|item| item.line_total).sum();
        }
        if !self.total_set {
            let discount = self.doc.discount.unwrap_or(0.0);
            let tax = self.doc.tax.as_ref().map_or(0.0, |tax| tax.amount);
            self.doc.total = self.doc.subtotal - discount + tax;
        }
        if let Some(received) = self.doc.cash_received {
            self.doc.change = Some(received - self.doc.total);
        }
        self.doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_item_total() {
        let item = LineItem::new("Bagel", 3.0, 1.25);
        assert_eq!(item.line_total, 3.75);
    }

    #[test]
    fn test_builder_derives_totals() {
        let receipt = ReceiptDocument::builder("Shop", "1", "today")
            .item(LineItem::new("A", 1.0, 10.0))
            .item(LineItem::new("B", 2.0, 5.0))
            .discount(2.0)
            .tax("VAT 10%", 1.8)
            .build();

        assert_eq!(receipt.subtotal, 20.0);
        assert!((receipt.total - 19.8).abs() < 1e-9);
        assert!(receipt.change.is_none());
    }

    #[test]
    fn test_builder_explicit_totals_win() {
        let receipt = ReceiptDocument::builder("Shop", "1", "today")
            .item(LineItem::new("A", 1.0, 10.0))
            .subtotal(99.0)
            .total(100.0)
            .build();

        assert_eq!(receipt.subtotal, 99.0);
        assert_eq!(receipt.total, 100.0);
    }

    #[test]
    fn test_sample_has_one_item() {
        let sample = ReceiptDocument::sample();
        assert_eq!(sample.items.len(), 1);
        assert_eq!(sample.total, 1.0);
    }

    #[test]
    fn test_deserialize_minimal_json() {
        let json = r#"{
            "store_name": "Shop",
            "receipt_number": "7",
            "date": "2025-01-01",
            "items": [{ "name": "Tea", "quantity": 1, "unit_price": 2.0, "line_total": 2.0 }],
            "subtotal": 2.0,
            "total": 2.0,
            "payment_method": "Card"
        }"#;

        let receipt: ReceiptDocument = serde_json::from_str(json).unwrap();
        assert_eq!(receipt.items[0].name, "Tea");
        assert!(receipt.tax.is_none());
        assert!(receipt.footer.is_none());
    }
}
