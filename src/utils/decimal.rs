use bigdecimal::{BigDecimal, RoundingMode};
use num_traits::Zero;

use crate::service::error::ServiceError;

pub trait BigDecimalHelpers {
    fn to_decimal_or_zero(&self) -> BigDecimal;
}

impl BigDecimalHelpers for Option<BigDecimal> {
    fn to_decimal_or_zero(&self) -> BigDecimal {
        self.clone().unwrap_or_else(BigDecimal::zero)
    }
}

/// JSON numbers arrive as f64; stored amounts are fixed-point.
pub fn from_f64(value: f64, scale: i64, field: &str) -> Result<BigDecimal, ServiceError> {
    BigDecimal::try_from(value)
        .map(|d| d.with_scale_round(scale, RoundingMode::HalfUp))
        .map_err(|_| ServiceError::Validation(format!("{} is not a valid number", field)))
}
