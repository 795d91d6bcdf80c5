//! Typed price table: unit size → price.
//!
//! Sizes and prices are exact decimals. The table is stored as a JSON object of
//! decimal strings and is the single source of truth for a product's prices;
//! the product's base price is whatever the table says for size 1.

use crate::errors::{Error, Result};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::str::FromStr;

/// Ordered mapping from unit size to the price of one unit of that size
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PriceTable(BTreeMap<Decimal, Decimal>);

/// Parses a decimal typed by a person, accepting `.` or `,` as the fractional
/// separator. The result is normalized (`2.50` becomes `2.5`).
pub fn parse_decimal(input: &str) -> Result<Decimal> {
    let cleaned = input.trim().replace(',', ".");
    if cleaned.is_empty() {
        return Err(Error::InvalidAmount {
            input: input.to_string(),
        });
    }
    Decimal::from_str(&cleaned)
        .map(|value| value.normalize())
        .map_err(|_| Error::InvalidAmount {
            input: input.to_string(),
        })
}

/// Parses a strictly positive decimal.
pub fn parse_positive(input: &str) -> Result<Decimal> {
    let value = parse_decimal(input)?;
    if value <= Decimal::ZERO {
        return Err(Error::InvalidAmount {
            input: input.to_string(),
        });
    }
    Ok(value)
}

/// Writes a decimal with `.` and without trailing zeros.
#[must_use]
pub fn format_decimal(value: Decimal) -> String {
    value.normalize().to_string()
}

impl PriceTable {
    /// An empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A table with only the size-1 entry.
    #[must_use]
    pub fn single(price: Decimal) -> Self {
        let mut table = Self::new();
        table.0.insert(Decimal::ONE, price.normalize());
        table
    }

    /// Adds or replaces one entry. Sizes and prices must be positive.
    pub fn insert(&mut self, size: Decimal, price: Decimal) -> Result<()> {
        if size <= Decimal::ZERO {
            return Err(Error::invalid_input(format!(
                "Unit size must be positive, got {}",
                format_decimal(size)
            )));
        }
        if price <= Decimal::ZERO {
            return Err(Error::InvalidAmount {
                input: format_decimal(price),
            });
        }
        self.0.insert(size.normalize(), price.normalize());
        Ok(())
    }

    /// Price of one unit of `size`, if the size is offered.
    #[must_use]
    pub fn price_for(&self, size: Decimal) -> Option<Decimal> {
        self.0.get(&size).copied()
    }

    /// Whether `size` is offered.
    #[must_use]
    pub fn contains(&self, size: Decimal) -> bool {
        self.0.contains_key(&size)
    }

    /// Price for size 1.
    #[must_use]
    pub fn base_price(&self) -> Option<Decimal> {
        self.price_for(Decimal::ONE)
    }

    /// Sets the size-1 entry, leaving the other sizes alone.
    #[must_use]
    pub fn with_base_price(mut self, price: Decimal) -> Self {
        self.0.insert(Decimal::ONE, price.normalize());
        self
    }

    /// Adds a size-1 entry at `price` when the table has none.
    #[must_use]
    pub fn or_base_price(mut self, price: Decimal) -> Self {
        self.0.entry(Decimal::ONE).or_insert_with(|| price.normalize());
        self
    }

    /// Entries in ascending size order.
    pub fn iter(&self) -> impl Iterator<Item = (Decimal, Decimal)> + '_ {
        self.0.iter().map(|(size, price)| (*size, *price))
    }

    /// Number of sizes offered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no size is offered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Serializes to the JSON object stored in the `price_table` column.
    #[must_use]
    pub fn to_json(&self) -> String {
        let map: BTreeMap<String, String> = self
            .0
            .iter()
            .map(|(size, price)| (format_decimal(*size), format_decimal(*price)))
            .collect();
        // A map of strings always serializes.
        serde_json::to_string(&map).unwrap_or_else(|_| "{}".to_string())
    }

    /// Reads the JSON object stored in the `price_table` column.
    pub fn from_json(json: &str) -> Result<Self> {
        let map: BTreeMap<String, String> =
            serde_json::from_str(json).map_err(|e| Error::Database(format!(
                "Corrupt price table {json:?}: {e}"
            )))?;
        let mut table = Self::new();
        for (size, price) in map {
            table.insert(parse_decimal(&size)?, parse_decimal(&price)?)?;
        }
        Ok(table)
    }

    /// Parses an admin-typed list such as `1:100, 2:180` or `0,5:60; 1:100`.
    ///
    /// Pairs are `size:price`. Between pairs the separator is `;`, a newline or
    /// a `,` followed by whitespace; if a gap has none of those, its first
    /// bare `,` is the separator. Inside numbers both `.` and `,` mark the
    /// fraction.
    pub fn parse_list(input: &str) -> Result<Self> {
        let trimmed = input.trim().trim_end_matches([',', ';']).trim_end();
        let segments: Vec<&str> = trimmed.split(':').collect();
        if segments.len() < 2 {
            return Err(Error::invalid_input(
                "Use the format size:price, for example 1:100, 2:180",
            ));
        }

        let last = segments.len() - 1;
        let mut size = segments[0];
        let mut table = Self::new();
        for (index, segment) in segments.iter().enumerate().skip(1) {
            let (price, next_size) = if index == last {
                (*segment, "")
            } else {
                split_pair_gap(segment).ok_or_else(|| {
                    Error::invalid_input(format!("Missing separator after price in {segment:?}"))
                })?
            };

            let parsed_size = parse_decimal(size)?;
            if table.contains(parsed_size.normalize()) {
                return Err(Error::invalid_input(format!(
                    "Unit size {} is listed twice",
                    format_decimal(parsed_size)
                )));
            }
            table.insert(parsed_size, parse_decimal(price)?)?;
            size = next_size;
        }
        Ok(table)
    }
}

/// Splits the text between two `:` into the previous pair's price and the
/// next pair's size.
fn split_pair_gap(gap: &str) -> Option<(&str, &str)> {
    let strong = gap.char_indices().find(|&(index, c)| {
        c == ';'
            || c == '\n'
            || (c == ',' && gap[index + 1..].starts_with(char::is_whitespace))
    });
    let (index, separator) = strong.or_else(|| gap.char_indices().find(|&(_, c)| c == ','))?;
    Some((&gap[..index], &gap[index + separator.len_utf8()..]))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn dec(value: &str) -> Decimal {
        Decimal::from_str(value).unwrap()
    }

    #[test]
    fn test_parse_decimal_accepts_both_separators() {
        assert_eq!(parse_decimal("0.5").unwrap(), dec("0.5"));
        assert_eq!(parse_decimal("0,5").unwrap(), dec("0.5"));
        assert_eq!(parse_decimal(" 12 ").unwrap(), dec("12"));
        assert_eq!(parse_decimal("2.50").unwrap().to_string(), "2.5");
        assert!(parse_decimal("").is_err());
        assert!(parse_decimal("abc").is_err());
    }

    #[test]
    fn test_parse_positive_rejects_zero_and_negative() {
        assert!(parse_positive("0").is_err());
        assert!(parse_positive("-3").is_err());
        assert_eq!(parse_positive("3").unwrap(), dec("3"));
    }

    #[test]
    fn test_parse_list_simple() {
        let table = PriceTable::parse_list("1:100,2:180").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.price_for(dec("1")), Some(dec("100")));
        assert_eq!(table.price_for(dec("2")), Some(dec("180")));
    }

    #[test]
    fn test_parse_list_with_comma_fractions() {
        let table = PriceTable::parse_list("0,5:800, 1:1500, 2,5:2800").unwrap();
        assert_eq!(table.price_for(dec("0.5")), Some(dec("800")));
        assert_eq!(table.price_for(dec("1")), Some(dec("1500")));
        assert_eq!(table.price_for(dec("2.5")), Some(dec("2800")));

        let table = PriceTable::parse_list("1:100,5, 2:180").unwrap();
        assert_eq!(table.price_for(dec("1")), Some(dec("100.5")));
        assert_eq!(table.price_for(dec("2")), Some(dec("180")));
    }

    #[test]
    fn test_parse_list_semicolons_and_newlines() {
        let table = PriceTable::parse_list("0.5:60;1:100\n3:270;").unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.price_for(dec("3")), Some(dec("270")));
    }

    #[test]
    fn test_parse_list_rejects_garbage() {
        assert!(PriceTable::parse_list("100").is_err());
        assert!(PriceTable::parse_list("1:abc").is_err());
        assert!(PriceTable::parse_list("1:100 2:180").is_err());
        assert!(PriceTable::parse_list("1:100, 1:120").is_err());
        assert!(PriceTable::parse_list("0:100").is_err());
    }

    #[test]
    fn test_json_round_trip_is_exact() {
        let table = PriceTable::parse_list("0.1:15, 1:100, 2.25:210").unwrap();
        let json = table.to_json();
        assert_eq!(json, r#"{"0.1":"15","1":"100","2.25":"210"}"#);
        assert_eq!(PriceTable::from_json(&json).unwrap(), table);
    }

    #[test]
    fn test_base_price_helpers() {
        let table = PriceTable::parse_list("2:180").unwrap();
        assert_eq!(table.base_price(), None);

        let table = table.or_base_price(dec("100"));
        assert_eq!(table.base_price(), Some(dec("100")));

        let table = table.or_base_price(dec("999"));
        assert_eq!(table.base_price(), Some(dec("100")));

        let table = table.with_base_price(dec("110"));
        assert_eq!(table.base_price(), Some(dec("110")));
        assert_eq!(table.price_for(dec("2")), Some(dec("180")));
    }

    #[test]
    fn test_from_json_rejects_corrupt_column() {
        assert!(PriceTable::from_json("not json").is_err());
        assert!(PriceTable::from_json(r#"{"1":"x"}"#).is_err());
    }
}
