use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductSummary {
    pub name: String,
    pub price: Decimal,
    pub image_path: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub price: Decimal,
    pub type_id: i32,
    pub image_path: String,
}

#[derive(Debug, Deserialize)]
pub struct ProductListQuery {
    #[serde(rename = "typeId")]
    pub type_id: i32,
    pub filter: Option<Decimal>,
    pub sort: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub match_name: String,
    pub new_name: Option<String>,
    pub new_price: Option<Decimal>,
    pub new_type_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteProductRequest {
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSort {
    Asc,
    Desc,
}

impl PriceSort {
    /// Accepts exactly "asc" and "desc"; anything else means no ordering.
    /// ORDER BY cannot be parameterized, so the clause is only ever built
    /// from these two literals.
    pub fn from_param(value: &str) -> Option<Self> {
        match value {
            "asc" => Some(PriceSort::Asc),
            "desc" => Some(PriceSort::Desc),
            _ => None,
        }
    }
}

pub fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(AppError::BadRequest("name must not be empty".to_string()));
    }

    Ok(())
}

/// Prices are non-negative with at most 2 fractional digits. Trailing zeros
/// do not count against the limit ("9.990" is fine, "9.999" is not).
pub fn validate_price(price: Decimal) -> Result<()> {
    if price.is_sign_negative() {
        return Err(AppError::BadRequest(
            "price must not be negative".to_string(),
        ));
    }

    if price.normalize().scale() > 2 {
        return Err(AppError::BadRequest(
            "price must have at most 2 decimal places".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[test]
    fn sort_param_accepts_only_the_two_literals() {
        assert_eq!(PriceSort::from_param("asc"), Some(PriceSort::Asc));
        assert_eq!(PriceSort::from_param("desc"), Some(PriceSort::Desc));
        assert_eq!(PriceSort::from_param("ASC"), None);
        assert_eq!(PriceSort::from_param("price; DROP TABLE products"), None);
        assert_eq!(PriceSort::from_param(""), None);
    }

    #[test]
    fn empty_name_is_rejected() {
        assert!(validate_name("Widget").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("   ").is_err());
    }

    #[test]
    fn negative_price_is_rejected() {
        assert!(validate_price(Decimal::from_str("-0.01").unwrap()).is_err());
        assert!(validate_price(Decimal::ZERO).is_ok());
    }

    #[test]
    fn price_scale_is_capped_at_two() {
        assert!(validate_price(Decimal::from_str("9.99").unwrap()).is_ok());
        assert!(validate_price(Decimal::from_str("9.999").unwrap()).is_err());
        // trailing zeros normalize away
        assert!(validate_price(Decimal::from_str("9.990").unwrap()).is_ok());
        assert!(validate_price(Decimal::from_str("10").unwrap()).is_ok());
    }
}
