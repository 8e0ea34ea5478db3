use serde::{Deserialize, Serialize};

/// One free-text row from an imported purchase history or order sheet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRecordInput {
    pub item_name: String,
    pub catalog_number: Option<String>,
    pub vendor_hint: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

impl PurchaseRecordInput {
    pub fn new(item_name: impl Into<String>) -> Self {
        Self {
            item_name: item_name.into(),
            catalog_number: None,
            vendor_hint: None,
            quantity: default_quantity(),
        }
    }

    pub fn with_catalog_number(mut self, catalog_number: impl Into<String>) -> Self {
        self.catalog_number = Some(catalog_number.into());
        self
    }

    pub fn with_vendor_hint(mut self, vendor_hint: impl Into<String>) -> Self {
        self.vendor_hint = Some(vendor_hint.into());
        self
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    /// Catalog number with surrounding whitespace removed; blank values count as absent.
    pub fn normalized_catalog_number(&self) -> Option<&str> {
        non_blank(self.catalog_number.as_deref())
    }

    pub fn normalized_vendor_hint(&self) -> Option<&str> {
        non_blank(self.vendor_hint.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
