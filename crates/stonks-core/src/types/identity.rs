//! Symbol identity: the unit a cached table belongs to.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::StonksError;

/// An (exchange, symbol, extension) triple, e.g. `NYSE:BRK.A`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SymbolIdentity {
    /// Exchange code, "NYSE" in `NYSE:BRK.A`
    pub exchange: String,
    /// Symbol, "BRK" in `NYSE:BRK.A`
    pub symbol: String,
    /// Behind-the-dot extension, "A" in `NYSE:BRK.A`
    pub extension: Option<String>,
}

impl SymbolIdentity {
    /// Create an identity. Without an explicit extension, a dotted symbol
    /// such as `BRK.A` is split at its first dot.
    pub fn new(exchange: &str, symbol: &str, extension: Option<&str>) -> Self {
        let (symbol, extension) = match extension.filter(|e| !e.is_empty()) {
            Some(ext) => (symbol, Some(ext)),
            None => match symbol.split_once('.') {
                Some((symbol, ext)) => (symbol, Some(ext).filter(|e| !e.is_empty())),
                None => (symbol, None),
            },
        };
        Self {
            exchange: exchange.to_string(),
            symbol: symbol.to_string(),
            extension: extension.map(str::to_string),
        }
    }

    /// Symbol with its extension, e.g. `BRK.A`.
    pub fn ticker(&self) -> String {
        match &self.extension {
            Some(ext) => format!("{}.{}", self.symbol, ext),
            None => self.symbol.clone(),
        }
    }

    /// Cache location relative to the cache root: `EXCHANGE/SYMBOL[.EXT]`.
    pub fn relative_path(&self) -> PathBuf {
        PathBuf::from(&self.exchange).join(self.ticker())
    }

    /// Check that every component is non-empty and safe as a path component.
    pub fn validate(&self) -> Result<(), StonksError> {
        check_component("exchange", &self.exchange)?;
        check_component("symbol", &self.symbol)?;
        if let Some(ext) = &self.extension {
            check_component("extension", ext)?;
        }
        Ok(())
    }
}

fn check_component(what: &str, value: &str) -> Result<(), StonksError> {
    if value.trim().is_empty() {
        return Err(StonksError::Validation(format!("{} must not be empty", what)));
    }
    if value == "." || value == ".." || value.contains(['/', '\\', '\0']) {
        return Err(StonksError::Validation(format!(
            "{} '{}' is not a valid identifier",
            what, value
        )));
    }
    Ok(())
}

impl fmt::Display for SymbolIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.exchange, self.ticker())
    }
}

impl FromStr for SymbolIdentity {
    type Err = StonksError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (exchange, rest) = s.split_once(':').ok_or_else(|| {
            StonksError::Validation(format!("expected EXCHANGE:SYMBOL, got '{}'", s))
        })?;
        let identity = SymbolIdentity::new(exchange.trim(), rest.trim(), None);
        identity.validate()?;
        Ok(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_extension() {
        let id: SymbolIdentity = "NYSE:BRK.A".parse().unwrap();
        assert_eq!(id.exchange, "NYSE");
        assert_eq!(id.symbol, "BRK");
        assert_eq!(id.extension.as_deref(), Some("A"));
        assert_eq!(id.to_string(), "NYSE:BRK.A");
    }

    #[test]
    fn test_parse_without_extension() {
        let id: SymbolIdentity = "NASDAQ:AAPL".parse().unwrap();
        assert_eq!(id.extension, None);
        assert_eq!(id.ticker(), "AAPL");
    }

    #[test]
    fn test_parse_rejects_missing_exchange() {
        assert!("AAPL".parse::<SymbolIdentity>().is_err());
        assert!(":AAPL".parse::<SymbolIdentity>().is_err());
    }

    #[test]
    fn test_relative_path() {
        let id = SymbolIdentity::new("NYSE", "BRK", Some("A"));
        assert_eq!(id.relative_path(), PathBuf::from("NYSE").join("BRK.A"));

        let id = SymbolIdentity::new("NYSE", "IBM", None);
        assert_eq!(id.relative_path(), PathBuf::from("NYSE").join("IBM"));
    }

    #[test]
    fn test_dotted_symbol_splits_into_extension() {
        let id = SymbolIdentity::new("NYSE", "BRK.A", None);
        assert_eq!(id, SymbolIdentity::new("NYSE", "BRK", Some("A")));
        assert_eq!(id, "NYSE:BRK.A".parse::<SymbolIdentity>().unwrap());

        let id = SymbolIdentity::new("NYSE", "IBM.", None);
        assert_eq!(id.symbol, "IBM");
        assert_eq!(id.extension, None);
    }

    #[test]
    fn test_empty_extension_is_none() {
        let id = SymbolIdentity::new("NYSE", "IBM", Some(""));
        assert_eq!(id.extension, None);
    }

    #[test]
    fn test_validate_rejects_path_tricks() {
        assert!(SymbolIdentity::new("..", "IBM", None).validate().is_err());
        assert!(SymbolIdentity::new("NYSE", "a/b", None).validate().is_err());
        assert!(SymbolIdentity::new("NYSE", "", None).validate().is_err());
        assert!(SymbolIdentity::new("NYSE", "IBM", None).validate().is_ok());
    }
}
