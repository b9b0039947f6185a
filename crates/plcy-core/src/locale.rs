//! # Locale Tags
//!
//! [`Locale`] scopes a policy version to a language (and optionally a
//! region): `"en"`, `"fi"`, `"en-GB"`, `"sv-FI"`. The engine does not
//! consult a registry of real-world tags — it enforces shape, and the
//! canonical casing, so that `(document, locale)` keys compare reliably.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A language/region tag scoping a policy version.
///
/// # Validation
///
/// - Language subtag: 2 or 3 ASCII letters (stored lowercase)
/// - Optional region subtag after `-`: exactly 2 ASCII letters (stored
///   uppercase)
///
/// The constructor normalizes casing, so `"EN-gb"` and `"en-GB"` construct
/// equal values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Locale(String);

impl Locale {
    /// Parse a locale tag, normalizing case.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidLocale`] if the tag does not match
    /// the `ll` / `lll` / `ll-RR` / `lll-RR` shape.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = value.into();
        let mut parts = raw.split('-');

        let language = parts.next().unwrap_or("");
        if !(2..=3).contains(&language.len()) || !language.chars().all(|c| c.is_ascii_alphabetic())
        {
            return Err(ValidationError::InvalidLocale(raw));
        }

        let region = parts.next();
        if let Some(region) = region {
            if region.len() != 2 || !region.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(ValidationError::InvalidLocale(raw));
            }
        }
        if parts.next().is_some() {
            return Err(ValidationError::InvalidLocale(raw));
        }

        let canonical = match region {
            Some(region) => format!("{}-{}", language.to_lowercase(), region.to_uppercase()),
            None => language.to_lowercase(),
        };
        Ok(Self(canonical))
    }

    /// Access the canonical tag string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The language subtag (always lowercase).
    pub fn language(&self) -> &str {
        match self.0.find('-') {
            Some(i) => &self.0[..i],
            None => &self.0,
        }
    }

    /// The region subtag, if present (always uppercase).
    pub fn region(&self) -> Option<&str> {
        self.0.split('-').nth(1)
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
