//! Error types for the canvas pipeline and its collaborators

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for sitecanvas operations
pub type Result<T> = std::result::Result<T, Error>;

/// Field-level validation messages, keyed by the offending field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message against `field`.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// `Ok(())` when nothing was recorded, otherwise `Error::Validation`.
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, msgs) in &self.0 {
            for msg in msgs {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{}: {}", field, msg)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Errors that can occur in sitecanvas
#[derive(Error, Debug)]
pub enum Error {
    /// The element factory was asked for a variant it doesn't know.
    /// This is a schema mismatch between caller and library.
    #[error("Unknown element variant: {0}")]
    UnknownVariant(String),

    /// Malformed input (subdomain, page fields, ...)
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// A referenced page, website or element doesn't exist
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// A uniqueness constraint was violated (path, subdomain)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Transport failure talking to a remote store or upload target
    #[error("Network error: {0}")]
    Network(String),

    /// Failed to read or write the store snapshot
    #[error("Storage error: {0}")]
    Storage(String),

    /// JSON (de)serialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Error::NotFound { kind, id: id.into() }
    }

    /// Single-field validation failure.
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        let mut errs = ValidationErrors::new();
        errs.add(field, message);
        Error::Validation(errs)
    }

    /// HTTP status the server maps this error to.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Validation(_) | Error::Serialization(_) | Error::UnknownVariant(_) => 400,
            Error::NotFound { .. } => 404,
            Error::Conflict(_) => 409,
            Error::Network(_) => 502,
            Error::Storage(_) | Error::Config(_) => 500,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

#[cfg(feature = "client")]
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_collect_per_field() {
        let mut errs = ValidationErrors::new();
        errs.add("subdomain", "too short");
        errs.add("subdomain", "bad start");
        errs.add("title", "required");
        assert_eq!(errs.messages("subdomain").len(), 2);
        assert_eq!(errs.fields().collect::<Vec<_>>(), vec!["subdomain", "title"]);
        let err = errs.into_result().unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn empty_validation_is_ok() {
        assert!(ValidationErrors::new().into_result().is_ok());
    }

    #[test]
    fn not_found_message() {
        let e = Error::not_found("page", "abc");
        assert_eq!(e.to_string(), "page not found: abc");
        assert_eq!(e.status_code(), 404);
    }
}
