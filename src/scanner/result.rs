//! Scan result type.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Outcome of scanning one domain.
///
/// Record fields are empty when the record was not found. When `error` is
/// set, every record field is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    pub domain: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub bimi: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub dkim: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub dmarc: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mx: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ns: Vec<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub spf: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,

    /// Wall time spent resolving the domain. Zero for cached results that
    /// were never resolved by this process.
    #[serde(skip)]
    pub elapsed: Duration,
}

impl ScanResult {
    /// A result carrying only the domain and an error message.
    pub fn failed(domain: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            error: error.into(),
            ..Self::default()
        }
    }

    pub fn is_error(&self) -> bool {
        !self.error.is_empty()
    }
}
