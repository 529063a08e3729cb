use serde::{Deserialize, Serialize};

/// One line-item of weekly demand. Row order in the input is allocation priority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandRow {
    pub product: String,
    pub brand: String,
    /// Boxes to produce.
    pub quantity: u64,
    /// Boxes per hour on an automatic line.
    pub automatic_rate: f64,
    /// Boxes per hour on a manual line.
    pub manual_rate: f64,
}

impl DemandRow {
    pub fn new(
        product: impl Into<String>,
        brand: impl Into<String>,
        quantity: u64,
        automatic_rate: f64,
        manual_rate: f64,
    ) -> Self {
        Self {
            product: product.into(),
            brand: brand.into(),
            quantity,
            automatic_rate,
            manual_rate,
        }
    }
}
