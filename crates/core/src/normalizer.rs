//! Price normalization and display formatting.

use alloy::primitives::I256;
use chrono::DateTime;
use std::fmt;
use tracing::warn;

/// Exponent applied to every raw price for display.
///
/// The exponent reported by the contract is advisory only. Deployed feeds
/// have been observed reporting exponents that do not match their data, so
/// display always divides by `10^8`. Suspect: revisit once feeds report
/// consistent decimals.
pub const DISPLAY_EXPONENT: u8 = 8;

/// Values above this render in exponential notation.
const EXPONENTIAL_ABOVE: f64 = 1_000_000.0;

/// Values above this are assumed to be test data when no source is known.
const TEST_DATA_ABOVE: f64 = 100_000.0;

/// A raw price scaled for display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedPrice {
    pub display_exponent: u8,
    pub value: f64,
}

/// Scale `raw_price` by [`DISPLAY_EXPONENT`].
pub fn normalize(raw_price: I256, contract_exponent: u8) -> NormalizedPrice {
    if contract_exponent != DISPLAY_EXPONENT {
        warn!(
            contract_exponent,
            display_exponent = DISPLAY_EXPONENT,
            "Contract exponent differs from display exponent"
        );
    }

    let raw: f64 = raw_price.to_string().parse().unwrap_or_default();
    NormalizedPrice {
        display_exponent: DISPLAY_EXPONENT,
        value: raw / 10f64.powi(i32::from(DISPLAY_EXPONENT)),
    }
}

/// Where a displayed price is believed to come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    Blocksense,
    Simulated,
    Test,
    Realistic,
}

impl Provenance {
    /// Classify by source label, else by magnitude.
    pub fn classify(value: f64, source: Option<&str>) -> Self {
        match source {
            Some(s) if s.contains("Blocksense") => Provenance::Blocksense,
            Some(s) if s.contains("Simulated") => Provenance::Simulated,
            _ if value > TEST_DATA_ABOVE => Provenance::Test,
            _ => Provenance::Realistic,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Provenance::Blocksense => "(Real Blocksense Data)",
            Provenance::Simulated => "(Simulated Data)",
            Provenance::Test => "(Test Data)",
            Provenance::Realistic => "(Realistic Data)",
        }
    }
}

/// Display form of a price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedPrice {
    /// e.g. `$42.50` or `$1.50e+6`
    pub amount: String,
    pub tag: &'static str,
}

impl fmt::Display for FormattedPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.tag)
    }
}

/// Format a normalized value with its provenance tag.
pub fn format_price(value: f64, source: Option<&str>) -> FormattedPrice {
    let amount = if value > EXPONENTIAL_ABOVE {
        format!("${}", exponential(value))
    } else {
        let digits = grouped(value.abs());
        let sign = if value < 0.0 && digits != "0.00" { "-" } else { "" };
        format!("{sign}${digits}")
    };
    FormattedPrice {
        amount,
        tag: Provenance::classify(value, source).tag(),
    }
}

/// `1500000.0` -> `1.50e+6`
fn exponential(value: f64) -> String {
    let formatted = format!("{value:.2e}");
    match formatted.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
        _ => formatted,
    }
}

/// `1234.5` -> `1,234.50`, for non-negative `value`
fn grouped(value: f64) -> String {
    let fixed = format!("{value:.2}");
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut digits = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            digits.push(',');
        }
        digits.push(c);
    }
    format!("{digits}.{frac_part}")
}

/// Unix seconds as `YYYY-MM-DD HH:MM:SS UTC`.
pub fn format_timestamp(unix_secs: u64) -> String {
    i64::try_from(unix_secs)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| format!("{unix_secs} (unix)"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(v: i64) -> I256 {
        I256::try_from(v).unwrap()
    }

    #[test]
    fn test_normalize_always_uses_display_exponent() {
        for contract_exponent in [0u8, 6, 8, 18] {
            let n = normalize(raw(4_250_000_000), contract_exponent);
            assert_eq!(n.display_exponent, DISPLAY_EXPONENT);
            assert_eq!(n.value, 42.5);
        }
    }

    #[test]
    fn test_normalize_negative() {
        assert_eq!(normalize(raw(-150_000_000), 8).value, -1.5);
    }

    #[test]
    fn test_format_fixed() {
        let p = format_price(42.5, None);
        assert_eq!(p.amount, "$42.50");
        assert_eq!(p.tag, "(Realistic Data)");
        assert_eq!(p.to_string(), "$42.50 (Realistic Data)");

        assert_eq!(format_price(3500.0, None).amount, "$3,500.00");
        assert_eq!(format_price(999_999.994, None).amount, "$999,999.99");
        assert_eq!(format_price(0.0, None).amount, "$0.00");
    }

    #[test]
    fn test_format_negative_sign_precedes_currency() {
        assert_eq!(format_price(-1.5, None).amount, "-$1.50");
        assert_eq!(format_price(-1234.5, None).amount, "-$1,234.50");
        assert_eq!(format_price(-0.001, None).amount, "$0.00");
    }

    #[test]
    fn test_format_exponential() {
        let p = format_price(1_500_000.0, None);
        assert_eq!(p.amount, "$1.50e+6");
        assert_eq!(p.tag, "(Test Data)");

        assert_eq!(format_price(1_000_000.0, None).amount, "$1,000,000.00");
        assert_eq!(format_price(2.5e12, None).amount, "$2.50e+12");
    }

    #[test]
    fn test_provenance_tags() {
        assert_eq!(
            format_price(3500.0, Some("Blocksense ETH/USD feed")).tag,
            "(Real Blocksense Data)"
        );
        assert_eq!(
            format_price(3500.0, Some("Simulated oracle")).tag,
            "(Simulated Data)"
        );
        // Source label wins over magnitude.
        assert_eq!(
            format_price(5_000_000.0, Some("Simulated oracle")).tag,
            "(Simulated Data)"
        );
        assert_eq!(format_price(100_001.0, Some("Chainlink")).tag, "(Test Data)");
        assert_eq!(format_price(100_000.0, None).tag, "(Realistic Data)");
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(1_700_000_000), "2023-11-14 22:13:20 UTC");
        assert_eq!(format_timestamp(u64::MAX), format!("{} (unix)", u64::MAX));
    }
}
