//! # Error Types
//!
//! Errors raised by shop-core. These only cover pure parsing; everything that
//! touches the store lives in `shop-db`'s `DbError`.

use thiserror::Error;

/// Failures when turning a decimal string into [`crate::Money`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    #[error("amount is empty")]
    Empty,

    /// More than two fractional digits (the store keeps DECIMAL(10,2)).
    #[error("amount '{0}' has more than two decimal places")]
    TooPrecise(String),

    #[error("amount '{0}' is not a valid decimal")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(MoneyError::Empty.to_string(), "amount is empty");
        assert_eq!(
            MoneyError::TooPrecise("1.999".to_string()).to_string(),
            "amount '1.999' has more than two decimal places"
        );
    }
}
