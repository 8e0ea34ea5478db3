use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::product::ProductId;
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VendorId(pub String);

impl fmt::Display for VendorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VendorId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    InStock,
    Limited,
    Backorder,
    Discontinued,
    Unknown,
}

impl StockStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InStock => "in_stock",
            Self::Limited => "limited",
            Self::Backorder => "backorder",
            Self::Discontinued => "discontinued",
            Self::Unknown => "unknown",
        }
    }
}

impl FromStr for StockStatus {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "in_stock" => Ok(Self::InStock),
            "limited" => Ok(Self::Limited),
            "backorder" => Ok(Self::Backorder),
            "discontinued" => Ok(Self::Discontinued),
            "unknown" | "" => Ok(Self::Unknown),
            other => Err(DomainError::InvariantViolation(format!(
                "unsupported stock status `{other}`"
            ))),
        }
    }
}

/// A vendor's price, lead-time and stock quote for one catalog product.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorOffer {
    pub product_id: ProductId,
    pub vendor_id: VendorId,
    pub vendor_name: String,
    pub price: Decimal,
    pub currency: String,
    /// Quoted days until delivery; `None` when the vendor did not quote one.
    pub lead_time_days: Option<u32>,
    pub stock_status: StockStatus,
}

impl VendorOffer {
    pub fn new(
        product_id: impl Into<String>,
        vendor_id: impl Into<String>,
        price: Decimal,
        lead_time_days: Option<u32>,
    ) -> Self {
        let vendor_id = vendor_id.into();
        Self {
            product_id: ProductId(product_id.into()),
            vendor_name: vendor_id.clone(),
            vendor_id: VendorId(vendor_id),
            price,
            currency: "KRW".to_owned(),
            lead_time_days,
            stock_status: StockStatus::Unknown,
        }
    }

    pub fn with_vendor_name(mut self, vendor_name: impl Into<String>) -> Self {
        self.vendor_name = vendor_name.into();
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn with_stock_status(mut self, stock_status: StockStatus) -> Self {
        self.stock_status = stock_status;
        self
    }

    /// Whether a free-text vendor hint names this offer's vendor.
    pub fn matches_vendor_hint(&self, hint: &str) -> bool {
        let hint = hint.trim();
        !hint.is_empty()
            && (self.vendor_id.0.eq_ignore_ascii_case(hint)
                || self.vendor_name.trim().eq_ignore_ascii_case(hint))
    }
}
