//! Conversion between decimal display amounts and wei

use alloy_primitives::utils::{format_ether, parse_ether};
use alloy_primitives::U256;

use crate::error::TransactionError;

/// Decimal places of the native unit (1 unit = 10^18 wei)
pub const NATIVE_DECIMALS: u8 = 18;

/// Parse a decimal amount such as `"0.5"` into wei
pub fn parse_amount(amount: &str) -> Result<U256, TransactionError> {
    let trimmed = amount.trim();
    if trimmed.is_empty() {
        return Err(TransactionError::InvalidAmount("amount is empty".to_string()));
    }
    if trimmed.starts_with('-') || trimmed.starts_with('+') {
        return Err(TransactionError::InvalidAmount(format!(
            "'{}' must be an unsigned decimal",
            amount
        )));
    }
    if let Some((_, fraction)) = trimmed.split_once('.') {
        if fraction.len() > NATIVE_DECIMALS as usize {
            return Err(TransactionError::InvalidAmount(format!(
                "'{}' has more than {} decimal places",
                amount, NATIVE_DECIMALS
            )));
        }
    }
    parse_ether(trimmed)
        .map_err(|e| TransactionError::InvalidAmount(format!("'{}': {}", amount, e)))
}

/// Render wei as a decimal string without trailing zeros, e.g. `"0.01"`
pub fn format_amount(wei: U256) -> String {
    let formatted = format_ether(wei);
    if formatted.contains('.') {
        formatted
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    } else {
        formatted
    }
}

/// Wei divided by 10^18 as a float, for display only
pub fn to_display_units(wei: U256) -> f64 {
    format_amount(wei).parse().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(
            parse_amount("0.01").unwrap(),
            U256::from(10_000_000_000_000_000u64)
        );
        assert_eq!(
            parse_amount("1").unwrap(),
            U256::from(1_000_000_000_000_000_000u64)
        );
        assert_eq!(parse_amount(" 0.5 ").unwrap(), U256::from(500_000_000_000_000_000u64));
    }

    #[test]
    fn test_invalid_amounts() {
        for bad in [
            "",
            "   ",
            "abc",
            "-1",
            "+1",
            "1.2.3",
            "0.1234567890123456789",
        ] {
            assert!(
                matches!(parse_amount(bad), Err(TransactionError::InvalidAmount(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_then_render_reproduces_amount() {
        for amount in ["0.01", "1", "12.5", "0.000001", "1000", "0.123456789012345678"] {
            let wei = parse_amount(amount).unwrap();
            assert_eq!(format_amount(wei), amount);

            let expected: f64 = amount.parse().unwrap();
            assert!((to_display_units(wei) - expected).abs() <= expected * 1e-12);
        }
    }

    #[test]
    fn test_full_precision_is_accepted() {
        assert_eq!(parse_amount("0.000000000000000001").unwrap(), U256::from(1u64));
    }

    #[test]
    fn test_format_zero() {
        assert_eq!(format_amount(U256::ZERO), "0");
    }
}
