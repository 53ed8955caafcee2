use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// Opaque, case-sensitive retrieval token that resolves to one or more
/// stored files. Appears as `?start=<code>` in deep links.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct RetrievalCode(String);

impl RetrievalCode {
    pub const LENGTH: usize = 8;

    /// Validate and wrap a raw code.
    pub fn parse(raw: &str) -> Result<Self, ModelError> {
        if raw.len() == Self::LENGTH
            && raw.chars().all(|c| c.is_ascii_alphanumeric())
        {
            Ok(Self(raw.to_string()))
        } else {
            Err(ModelError::InvalidCode(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RetrievalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RetrievalCode {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RetrievalCode {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RetrievalCode> for String {
    fn from(code: RetrievalCode) -> Self {
        code.0
    }
}

impl AsRef<str> for RetrievalCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_eight_alphanumerics() {
        let code = RetrievalCode::parse("aB3dE5gH").unwrap();
        assert_eq!(code.as_str(), "aB3dE5gH");
    }

    #[test]
    fn rejects_wrong_length_and_symbols() {
        assert!(RetrievalCode::parse("short").is_err());
        assert!(RetrievalCode::parse("toolongcode").is_err());
        assert!(RetrievalCode::parse("abc-efgh").is_err());
    }

    #[test]
    fn codes_are_case_sensitive() {
        let lower = RetrievalCode::parse("abcdefgh").unwrap();
        let upper = RetrievalCode::parse("ABCDEFGH").unwrap();
        assert_ne!(lower, upper);
    }
}
