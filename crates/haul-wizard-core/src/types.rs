// SPDX-License-Identifier: AGPL-3.0
// Haul Wizard Core - Type definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A single answer as captured from a screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Number(f64),
    Text(String),
}

impl AnswerValue {
    /// True for empty or whitespace-only text. Numbers are never blank.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(text) => text.trim().is_empty(),
            Self::Number(_) => false,
        }
    }

    /// Textual form used by visibility rules and option checks
    pub fn to_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Number(number) => number.to_string(),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(number) => Some(*number),
            Self::Text(_) => None,
        }
    }

    pub(crate) fn to_json(&self) -> Value {
        match self {
            Self::Text(text) => Value::String(text.clone()),
            Self::Number(number) => serde_json::Number::from_f64(*number)
                .map(Value::Number)
                .unwrap_or(Value::Null),
        }
    }
}

impl fmt::Display for AnswerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<&str> for AnswerValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for AnswerValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<f64> for AnswerValue {
    fn from(number: f64) -> Self {
        Self::Number(number)
    }
}

/// Fully normalized answer map handed to the submit collaborator.
///
/// Every catalog key is present; unanswered or hidden fields are `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SubmissionPayload(Map<String, Value>);

impl SubmissionPayload {
    pub(crate) fn insert(&mut self, key: &str, value: Value) {
        self.0.insert(key.to_string(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// True if the key is present and normalized to `null`
    pub fn is_null(&self, key: &str) -> bool {
        matches!(self.0.get(key), Some(Value::Null))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|k| k.as_str())
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

/// Acknowledgement returned by the submit collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAck {
    /// Backend reference for the stored record, if it returns one
    pub reference: Option<String>,
    pub received_at: DateTime<Utc>,
}

impl SubmitAck {
    pub fn new(reference: Option<String>) -> Self {
        Self {
            reference,
            received_at: Utc::now(),
        }
    }
}

/// Failure reported by the submit collaborator
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SubmitError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Rejected by backend: {0}")]
    Rejected(String),

    #[error("Not authorized")]
    Unauthorized,
}

/// How many fields a page shows and how far ahead the paginator scans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageLayout {
    pub page_size: usize,
    /// Catalog positions scanned per step while filling a page. Only sizes
    /// the scan chunks: a short window is extended, so page contents and
    /// cursors depend on `page_size` alone.
    pub look_ahead: usize,
}

impl PageLayout {
    pub const fn new(page_size: usize, look_ahead: usize) -> Self {
        Self {
            page_size,
            look_ahead,
        }
    }

    /// Layout whose look-ahead window equals the page size
    pub const fn uniform(page_size: usize) -> Self {
        Self::new(page_size, page_size)
    }

    pub fn validate(&self) -> Result<(), WizardError> {
        if self.page_size == 0 {
            return Err(WizardError::InvalidLayout(
                "page size must be at least 1".to_string(),
            ));
        }
        if self.look_ahead < self.page_size {
            return Err(WizardError::InvalidLayout(format!(
                "look-ahead window {} is smaller than page size {}",
                self.look_ahead, self.page_size
            )));
        }
        Ok(())
    }
}

impl Default for PageLayout {
    fn default() -> Self {
        Self::uniform(2)
    }
}

/// Where `previous` moves the cursor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackwardNavigation {
    /// Back to the start of the previous page under the current answers
    #[default]
    Symmetric,
    /// Cursor minus page size, no skipping of hidden fields
    FixedStep,
}

/// Problems found while building a field catalog
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("Duplicate field key: {0}")]
    DuplicateKey(String),

    #[error("Select field {0} has no options")]
    MissingOptions(String),

    #[error("Field {controller} controls unknown field {dependent}")]
    UnknownDependent {
        controller: String,
        dependent: String,
    },

    #[error("Field {controller} gates {dependent} with a rule other than its own")]
    ConflictingRule {
        controller: String,
        dependent: String,
    },

    #[error("Field {0} controls itself")]
    SelfControl(String),

    #[error("Field {dependent} has more than one controller")]
    MultipleControllers { dependent: String },

    #[error("Controller {controller} is itself conditional")]
    NestedCondition { controller: String },

    #[error("Invalid catalog definition: {0}")]
    Definition(String),
}

/// Error types for the form engine
#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error("Required fields are not answered: {}", .missing.join(", "))]
    ValidationBlocked { missing: Vec<String> },

    #[error("Submission failed: {0}")]
    SubmitFailed(#[source] SubmitError),

    #[error("A submission is already in flight")]
    SubmitInFlight,

    #[error("Wizard already completed")]
    AlreadyComplete,

    #[error("No submission is in flight")]
    NotSubmitting,

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Invalid page layout: {0}")]
    InvalidLayout(String),

    #[error("Catalog misconfigured: {0}")]
    Catalog(#[from] CatalogError),

    #[error("File I/O error: {0}")]
    FileIo(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for WizardError {
    fn from(err: std::io::Error) -> Self {
        WizardError::FileIo(err.to_string())
    }
}
