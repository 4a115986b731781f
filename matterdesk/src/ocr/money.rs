use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

static AMOUNT_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"-?\d+(?:\.\d{1,2})?").expect("amount token pattern is valid")
});

/// A signed monetary amount with two decimals, held as cents.
///
/// OCR figures are compared for exact zero and against a whitelist, so they are never
/// carried as floating point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Amount(i64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub fn from_cents(cents: i64) -> Self {
        Amount(cents)
    }

    pub fn cents(&self) -> i64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Parses a whole token such as `12`, `-0.5` or `143.72`.
    pub fn parse(token: &str) -> Option<Amount> {
        let token = token.trim();
        let (negative, digits) = match token.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, token),
        };
        let (whole, frac) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };
        if whole.is_empty()
            || !whole.bytes().all(|b| b.is_ascii_digit())
            || frac.len() > 2
            || !frac.bytes().all(|b| b.is_ascii_digit())
            || (digits.contains('.') && frac.is_empty())
        {
            return None;
        }
        let whole: i64 = whole.parse().ok()?;
        let frac: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().ok()? * 10,
            _ => frac.parse().ok()?,
        };
        let cents = whole.checked_mul(100)?.checked_add(frac)?;
        Some(Amount(if negative { -cents } else { cents }))
    }

    /// First amount-looking token in `text`.
    pub fn first_in(text: &str) -> Option<Amount> {
        AMOUNT_TOKEN
            .find(text)
            .and_then(|m| Amount::parse(m.as_str()))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl TryFrom<String> for Amount {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Amount::parse(&value).ok_or_else(|| format!("not an amount: '{value}'"))
    }
}

impl From<Amount> for String {
    fn from(value: Amount) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amounts() {
        assert_eq!(Amount::parse("143.72"), Some(Amount::from_cents(14372)));
        assert_eq!(Amount::parse("-0.5"), Some(Amount::from_cents(-50)));
        assert_eq!(Amount::parse("12"), Some(Amount::from_cents(1200)));
        assert_eq!(Amount::parse("-0.00"), Some(Amount::ZERO));
        assert_eq!(Amount::parse("1.234"), None);
        assert_eq!(Amount::parse("12."), None);
        assert_eq!(Amount::parse("abc"), None);
    }

    #[test]
    fn test_first_in_takes_leading_token() {
        assert_eq!(Amount::first_in(": $ 1,250.00"), Some(Amount::from_cents(100)));
        assert_eq!(Amount::first_in(" -402.41 CAD"), Some(Amount::from_cents(-40241)));
        assert_eq!(Amount::first_in("none here"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Amount::from_cents(-5).to_string(), "-0.05");
        assert_eq!(Amount::from_cents(40241).to_string(), "402.41");
    }
}
