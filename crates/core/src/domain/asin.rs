use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

pub const ASIN_LEN: usize = 10;

fn asin_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z0-9]{10}$").expect("valid ASIN regex"))
}

fn product_url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"/(?:dp|gp/product)/([A-Z0-9]{10})(?:[/?#]|$)").expect("valid product URL regex")
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidAsin(pub String);

impl fmt::Display for InvalidAsin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid ASIN {:?}: expected {ASIN_LEN} uppercase letters or digits",
            self.0
        )
    }
}

impl std::error::Error for InvalidAsin {}

/// Amazon Standard Identification Number.
///
/// Only constructible through [`Asin::parse`] (or deserialization, which runs the same check),
/// so holding an `Asin` means the value is exactly 10 characters of `[A-Z0-9]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Asin(String);

impl Asin {
    pub fn parse(s: &str) -> Result<Self, InvalidAsin> {
        let t = s.trim();
        if asin_re().is_match(t) {
            Ok(Self(t.to_string()))
        } else {
            Err(InvalidAsin(s.to_string()))
        }
    }

    /// Accepts a bare ASIN or an Amazon product URL (`/dp/<ASIN>` or `/gp/product/<ASIN>`).
    pub fn from_input(input: &str) -> Result<Self, InvalidAsin> {
        let t = input.trim();
        if let Some(caps) = product_url_re().captures(t) {
            return Self::parse(&caps[1]);
        }
        Self::parse(t).map_err(|_| InvalidAsin(input.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Asin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Asin {
    type Error = InvalidAsin;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Asin> for String {
    fn from(value: Asin) -> Self {
        value.0
    }
}

impl AsRef<str> for Asin {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
