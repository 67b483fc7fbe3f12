use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, Mul};

/// Storefront prices are quoted in Ghana cedis.
pub const DEFAULT_CURRENCY: &str = "GHS";

const MINOR_PER_MAJOR: i64 = 100;

/// An amount held in integer minor units (pesewas) so quotes never drift.
///
/// On the wire it is a plain JSON number in major units (`3100.0`), which is
/// what the backend stores in its `DECIMAL(10, 2)` columns. Deserialization
/// also accepts decimal strings such as `"1000.00"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money {
    minor: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyError {
    #[error("amount is empty")]
    Empty,
    #[error("malformed amount: {0}")]
    Malformed(String),
    #[error("amount out of range")]
    Overflow,
}

impl Money {
    pub const ZERO: Money = Money { minor: 0 };

    pub const fn from_minor(minor: i64) -> Self {
        Self { minor }
    }

    pub const fn from_major(units: i64) -> Self {
        Self { minor: units * MINOR_PER_MAJOR }
    }

    pub const fn minor(&self) -> i64 {
        self.minor
    }

    pub fn as_major_f64(&self) -> f64 {
        self.minor as f64 / MINOR_PER_MAJOR as f64
    }

    pub fn is_negative(&self) -> bool {
        self.minor < 0
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.minor.checked_add(other.minor).map(Money::from_minor)
    }

    pub fn checked_mul(self, factor: u32) -> Option<Money> {
        self.minor.checked_mul(i64::from(factor)).map(Money::from_minor)
    }

    /// Round a floating point major-unit amount to the nearest minor unit.
    pub fn from_major_f64(value: f64) -> Result<Self, MoneyError> {
        if !value.is_finite() {
            return Err(MoneyError::Malformed(value.to_string()));
        }
        let minor = (value * MINOR_PER_MAJOR as f64).round();
        if minor.abs() > i64::MAX as f64 {
            return Err(MoneyError::Overflow);
        }
        Ok(Self { minor: minor as i64 })
    }

    /// Parse `"1000"`, `"1000.5"` or `"1000.50"`. A third fractional digit
    /// rounds half away from zero.
    pub fn parse_decimal(raw: &str) -> Result<Self, MoneyError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(MoneyError::Empty);
        }

        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let (whole, fraction) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };

        let malformed = || MoneyError::Malformed(raw.to_string());
        if whole.is_empty() && fraction.is_empty() {
            return Err(malformed());
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit()) {
            return Err(malformed());
        }

        let whole_minor = if whole.is_empty() {
            0
        } else {
            whole
                .parse::<i64>()
                .map_err(|_| MoneyError::Overflow)?
                .checked_mul(MINOR_PER_MAJOR)
                .ok_or(MoneyError::Overflow)?
        };

        let mut frac_digits = fraction.bytes().map(|b| i64::from(b - b'0'));
        let tens = frac_digits.next().unwrap_or(0);
        let ones = frac_digits.next().unwrap_or(0);
        let round_up = frac_digits.next().map(|d| d >= 5).unwrap_or(false);
        let frac_minor = tens * 10 + ones + i64::from(round_up);

        let minor = whole_minor.checked_add(frac_minor).ok_or(MoneyError::Overflow)?;
        Ok(Self { minor: if negative { -minor } else { minor } })
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money::from_minor(self.minor + rhs.minor)
    }
}

impl Mul<u32> for Money {
    type Output = Money;

    fn mul(self, rhs: u32) -> Money {
        Money::from_minor(self.minor * i64::from(rhs))
    }
}

/// Two-decimal display, e.g. `3100.00`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.minor < 0 { "-" } else { "" };
        let abs = self.minor.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Serialize for Money {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(self.as_major_f64())
    }
}

struct MoneyVisitor;

impl<'de> Visitor<'de> for MoneyVisitor {
    type Value = Money;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a number or a decimal string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
        v.checked_mul(MINOR_PER_MAJOR)
            .map(Money::from_minor)
            .ok_or_else(|| E::custom(MoneyError::Overflow))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
        let v = i64::try_from(v).map_err(|_| E::custom(MoneyError::Overflow))?;
        self.visit_i64(v)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
        Money::from_major_f64(v).map_err(E::custom)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
        Money::parse_decimal(v).map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D>(deserializer: D) -> Result<Money, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(MoneyVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decimal() {
        assert_eq!(Money::parse_decimal("1000").unwrap(), Money::from_major(1000));
        assert_eq!(Money::parse_decimal("1000.5").unwrap().minor(), 100_050);
        assert_eq!(Money::parse_decimal("0.07").unwrap().minor(), 7);
        assert_eq!(Money::parse_decimal("19.995").unwrap().minor(), 2000);
        assert_eq!(Money::parse_decimal("-3.10").unwrap().minor(), -310);
        assert!(Money::parse_decimal("").is_err());
        assert!(Money::parse_decimal("12a").is_err());
        assert!(Money::parse_decimal(".").is_err());
    }

    #[test]
    fn test_display_two_decimals() {
        assert_eq!(Money::from_major(3100).to_string(), "3100.00");
        assert_eq!(Money::from_minor(5).to_string(), "0.05");
        assert_eq!(Money::from_minor(-150).to_string(), "-1.50");
    }

    #[test]
    fn test_wire_format() {
        let amount: Money = serde_json::from_str("\"1000.00\"").unwrap();
        assert_eq!(amount, Money::from_major(1000));

        let amount: Money = serde_json::from_str("450").unwrap();
        assert_eq!(amount, Money::from_major(450));

        let amount: Money = serde_json::from_str("0.1").unwrap();
        assert_eq!(amount.minor(), 10);

        let json = serde_json::to_value(Money::from_major(3100)).unwrap();
        assert_eq!(json.as_f64(), Some(3100.0));
    }

    #[test]
    fn test_arithmetic() {
        let total = (Money::from_major(500) + Money::from_major(200) + Money::from_major(100)) * 3;
        assert_eq!(total, Money::from_major(2400));
        assert_eq!(Money::from_minor(i64::MAX).checked_mul(2), None);
    }
}
