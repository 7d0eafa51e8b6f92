//! Buyer-firm whitelist.
//!
//! Membership is deployment configuration, so the list is injected rather
//! than compiled in; [`FirmRegistry::default`] carries the stock list.

use super::validation::ValidationError;
use serde::{Deserialize, Serialize};

const DEFAULT_FIRMS: &[&str] = &[
    "NKG Stockler",
    "Cofco",
    "Sucafina",
    "Volcafé",
    "Eisa",
    "Elam",
    "Mitsui",
    "Olam",
    "Ocramar",
    "Comexim",
    "Louis Dreyfus",
    "Tristão",
    "Neumann",
];

/// Ordered set of firm names accepted for delivery and edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FirmRegistry {
    firms: Vec<String>,
}

impl FirmRegistry {
    /// Builds a registry from configured names, in display order.
    pub fn new<I, S>(firms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            firms: firms.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the stock firm names.
    pub fn default_firms() -> &'static [&'static str] {
        DEFAULT_FIRMS
    }

    /// Names in display order, for populating a picker.
    pub fn names(&self) -> &[String] {
        &self.firms
    }

    /// Returns the canonical stored name for `firm`, or `UnknownFirm`.
    pub fn resolve(&self, firm: &str) -> Result<String, ValidationError> {
        let trimmed = firm.trim();
        self.firms
            .iter()
            .find(|known| known.as_str() == trimmed)
            .cloned()
            .ok_or_else(|| ValidationError::UnknownFirm(trimmed.to_string()))
    }
}

impl Default for FirmRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_FIRMS.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::FirmRegistry;
    use crate::model::validation::ValidationError;

    #[test]
    fn default_registry_accepts_stock_names_exactly() {
        let registry = FirmRegistry::default();
        assert_eq!(registry.resolve("Cofco"), Ok("Cofco".to_string()));
        assert_eq!(registry.resolve(" Volcafé "), Ok("Volcafé".to_string()));
        assert_eq!(
            registry.resolve("cofco"),
            Err(ValidationError::UnknownFirm("cofco".to_string()))
        );
        assert_eq!(registry.names().len(), FirmRegistry::default_firms().len());
    }

    #[test]
    fn injected_registry_replaces_stock_list() {
        let registry = FirmRegistry::new(["Acme Trading"]);
        assert_eq!(registry.resolve("Acme Trading "), Ok("Acme Trading".to_string()));
        assert_eq!(
            registry.resolve("Cofco"),
            Err(ValidationError::UnknownFirm("Cofco".to_string()))
        );
    }
}
