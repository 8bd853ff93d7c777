//! Pure conversion arithmetic over a rate table snapshot.
//!
//! All conversions route through the base unit: `amount / rate[from] *
//! rate[to]`, followed by currency-specific rounding (8 decimals for the
//! crypto unit, 2 for fiat).

use super::rates::RateTable;
use super::Currency;
use crate::errors::CasinoResult;

/// Round to a fixed number of decimal places
pub fn round_to(amount: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (amount * factor).round() / factor
}

/// Round an amount to the precision of its currency
pub fn round_amount(amount: f64, currency: Currency) -> f64 {
    round_to(amount, currency.decimals())
}

/// Convert `amount` between two currencies using the given table snapshot.
///
/// Same-currency conversion is an identity (no rounding applied).
pub fn convert_with_table(
    table: &RateTable,
    amount: f64,
    from: Currency,
    to: Currency,
) -> CasinoResult<f64> {
    if from == to {
        return Ok(amount);
    }

    let from_rate = table.rate(from)?;
    let to_rate = table.rate(to)?;
    Ok(round_amount(amount / from_rate * to_rate, to))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::rates::RateTable;

    #[test]
    fn test_rounding_precision() {
        assert_eq!(round_amount(10.456, Currency::Usd), 10.46);
        assert_eq!(round_amount(0.123456789, Currency::Sol), 0.12345679);
    }

    #[test]
    fn test_same_currency_is_identity() {
        let table = RateTable::fallback();
        let converted = convert_with_table(&table, 42.424242, Currency::Usd, Currency::Usd).unwrap();
        assert_eq!(converted, 42.424242);
    }

    #[test]
    fn test_converts_via_base_unit() {
        let table = RateTable::fallback();
        // Fallback table carries USD->BDT at 110.
        let bdt = convert_with_table(&table, 50.0, Currency::Usd, Currency::Bdt).unwrap();
        assert_eq!(bdt, 5500.0);
    }

    #[test]
    fn test_round_trip_within_fiat_tolerance() {
        let table = RateTable::fallback();
        for &(from, to) in &[
            (Currency::Usd, Currency::Bdt),
            (Currency::Usd, Currency::Eur),
            (Currency::Eur, Currency::Bdt),
        ] {
            let amount = 123.45;
            let there = convert_with_table(&table, amount, from, to).unwrap();
            let back = convert_with_table(&table, there, to, from).unwrap();
            assert!(
                (back - amount).abs() < 0.01,
                "{from}->{to} round trip drifted: {back}"
            );
        }
    }

    #[test]
    fn test_round_trip_within_crypto_tolerance() {
        let table = RateTable::fallback();
        let amount = 0.5;
        let usd = convert_with_table(&table, amount, Currency::Sol, Currency::Usd).unwrap();
        let back = convert_with_table(&table, usd, Currency::Usd, Currency::Sol).unwrap();
        assert!((back - amount).abs() < 1e-8);
    }
}
