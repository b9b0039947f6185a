//! # Policy Categories
//!
//! The closed set of legal document categories the marketplace publishes.
//! One definition, exhaustive `match` everywhere — adding a category forces
//! every consumer to handle it.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// The category of a legal policy document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyCategory {
    /// Terms of Service.
    Terms,
    /// Privacy Policy.
    Privacy,
    /// Data Processing Agreement.
    DataProcessing,
    /// Cookie Policy.
    Cookie,
}

impl PolicyCategory {
    /// All categories, in display order.
    pub const ALL: [PolicyCategory; 4] = [
        PolicyCategory::Terms,
        PolicyCategory::Privacy,
        PolicyCategory::DataProcessing,
        PolicyCategory::Cookie,
    ];

    /// The canonical `snake_case` name, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Terms => "terms",
            Self::Privacy => "privacy",
            Self::DataProcessing => "data_processing",
            Self::Cookie => "cookie",
        }
    }

    /// Parse a category from its canonical name.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownCategory`] for any other string.
    pub fn from_name(name: &str) -> Result<Self, ValidationError> {
        match name {
            "terms" => Ok(Self::Terms),
            "privacy" => Ok(Self::Privacy),
            "data_processing" => Ok(Self::DataProcessing),
            "cookie" => Ok(Self::Cookie),
            other => Err(ValidationError::UnknownCategory(other.to_string())),
        }
    }
}

impl std::fmt::Display for PolicyCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
