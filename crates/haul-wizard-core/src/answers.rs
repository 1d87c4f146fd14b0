// SPDX-License-Identifier: AGPL-3.0
// Haul Wizard Core - Answer storage
//
// Mutable answers for one wizard instance. Values are kept close to what the
// screen captured; normalization happens when the submission snapshot is taken.

use crate::catalog::FieldCatalog;
use crate::field::{FieldDescriptor, FieldKind};
use crate::types::{AnswerValue, SubmissionPayload, WizardError};
use crate::visibility::is_visible;
use chrono::NaiveDate;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Field key -> captured answer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnswerStore {
    values: BTreeMap<String, AnswerValue>,
}

impl AnswerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed answers from an existing record when editing
    pub fn from_record(record: &Map<String, Value>) -> Self {
        let mut store = Self::new();
        for (key, value) in record {
            match value {
                Value::Null => {}
                Value::String(text) => store.set(key, text.as_str()),
                Value::Bool(flag) => store.set(key, flag.to_string()),
                Value::Number(number) => match number.as_f64() {
                    Some(n) => store.set(key, n),
                    None => tracing::warn!("Skipping unrepresentable number for {}", key),
                },
                Value::Array(_) | Value::Object(_) => {
                    tracing::warn!("Skipping non-scalar record entry for {}", key);
                }
            }
        }
        store
    }

    pub fn get(&self, key: &str) -> Option<&AnswerValue> {
        self.values.get(key)
    }

    /// Overwrite the answer for `key`
    pub fn set(&mut self, key: &str, value: impl Into<AnswerValue>) {
        self.values.insert(key.to_string(), value.into());
    }

    /// Store raw screen input for `field`, parsing numeric kinds.
    ///
    /// Empty input is stored as empty text. With `strict`, select values must
    /// be one of the options, numbers must parse and dates must be YYYY-MM-DD.
    pub fn set_input(
        &mut self,
        field: &FieldDescriptor,
        raw: &str,
        strict: bool,
    ) -> Result<(), WizardError> {
        if raw.trim().is_empty() {
            self.set(&field.key, "");
            return Ok(());
        }

        if strict {
            check_input(field, raw)?;
        }

        match parse_number(&field.kind, raw) {
            Some(number) => self.set(&field.key, number),
            None => self.set(&field.key, raw),
        }
        Ok(())
    }

    /// True if `key` holds a non-blank answer
    pub fn is_answered(&self, key: &str) -> bool {
        self.values.get(key).is_some_and(|v| !v.is_blank())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AnswerValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Normalize the answers into the payload for the submit collaborator.
    ///
    /// Every catalog key is present. Blank, missing and hidden answers become
    /// `null`; numeric kinds are numbers or `null`.
    pub fn snapshot_for_submission(&self, catalog: &FieldCatalog) -> SubmissionPayload {
        let mut payload = SubmissionPayload::default();
        for (index, field) in catalog.fields().iter().enumerate() {
            let value = match self.get(&field.key) {
                _ if !is_visible(catalog, index, self) => Value::Null,
                None => Value::Null,
                Some(answer) if answer.is_blank() => Value::Null,
                Some(answer) if field.kind.is_numeric() => numeric_json(&field.kind, answer),
                Some(answer) => answer.to_json(),
            };
            payload.insert(&field.key, value);
        }
        payload
    }
}

fn numeric_json(kind: &FieldKind, answer: &AnswerValue) -> Value {
    let number = match answer {
        AnswerValue::Number(n) => Some(*n),
        AnswerValue::Text(text) => parse_number(kind, text),
    };
    number
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Parse input for numeric kinds. Decimals accept a comma separator.
fn parse_number(kind: &FieldKind, raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let parsed = match kind {
        FieldKind::Number => trimmed
            .parse::<i64>()
            .map(|n| n as f64)
            .or_else(|_| trimmed.parse::<f64>())
            .ok(),
        FieldKind::Decimal => trimmed.replace(',', ".").parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|n| n.is_finite())
}

fn check_input(field: &FieldDescriptor, raw: &str) -> Result<(), WizardError> {
    let invalid = |reason: String| WizardError::InvalidValue {
        key: field.key.clone(),
        reason,
    };
    let trimmed = raw.trim();

    match &field.kind {
        FieldKind::SingleSelect { options } | FieldKind::CountrySelect { options } => {
            if !options.iter().any(|o| o == raw) {
                return Err(invalid(format!("must be one of: {}", options.join(", "))));
            }
        }
        FieldKind::Number => {
            if trimmed.parse::<i64>().is_err() {
                return Err(invalid("must be a whole number".to_string()));
            }
        }
        FieldKind::Decimal => {
            if parse_number(&field.kind, trimmed).is_none() {
                return Err(invalid("must be a number".to_string()));
            }
        }
        FieldKind::Date => {
            if NaiveDate::parse_from_str(trimmed, DATE_FORMAT).is_err() {
                return Err(invalid("use YYYY-MM-DD".to_string()));
            }
        }
        FieldKind::Text | FieldKind::PhotoCapture => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::VisibilityRule;
    use serde_json::json;

    fn catalog() -> FieldCatalog {
        FieldCatalog::new(
            "t",
            "T",
            vec![
                FieldDescriptor::new("status", "Status", FieldKind::single_select(["OK", "NotOK"]))
                    .controls("problems", VisibilityRule::equals("NotOK")),
                FieldDescriptor::new("problems", "Problems", FieldKind::Text),
                FieldDescriptor::new("packages", "Packages", FieldKind::Number),
                FieldDescriptor::new("weight", "Weight", FieldKind::Decimal),
                FieldDescriptor::new("date", "Date", FieldKind::Date),
                FieldDescriptor::new("photo", "Photo", FieldKind::PhotoCapture),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_numeric_input_is_parsed() {
        let catalog = catalog();
        let mut answers = AnswerStore::new();
        answers
            .set_input(catalog.field("weight").unwrap(), "12,5", true)
            .unwrap();
        answers
            .set_input(catalog.field("packages").unwrap(), " 33 ", true)
            .unwrap();
        assert_eq!(answers.get("weight"), Some(&AnswerValue::Number(12.5)));
        assert_eq!(answers.get("packages"), Some(&AnswerValue::Number(33.0)));
    }

    #[test]
    fn test_empty_input_is_kept_empty() {
        let catalog = catalog();
        let mut answers = AnswerStore::new();
        answers
            .set_input(catalog.field("packages").unwrap(), "", true)
            .unwrap();
        assert_eq!(answers.get("packages"), Some(&AnswerValue::from("")));
        assert!(!answers.is_answered("packages"));
    }

    #[test]
    fn test_strict_input_checks() {
        let catalog = catalog();
        let mut answers = AnswerStore::new();
        let status = catalog.field("status").unwrap();
        assert!(matches!(
            answers.set_input(status, "Maybe", true),
            Err(WizardError::InvalidValue { .. })
        ));
        assert!(answers.set_input(catalog.field("packages").unwrap(), "3.5", true).is_err());
        assert!(answers.set_input(catalog.field("date").unwrap(), "18.10.2026", true).is_err());
        assert!(answers.set_input(catalog.field("date").unwrap(), "2026-10-18", true).is_ok());
        assert!(answers.is_answered("date"));
        assert!(!answers.is_answered("status"));
    }

    #[test]
    fn test_lenient_input_keeps_raw_text() {
        let catalog = catalog();
        let mut answers = AnswerStore::new();
        answers
            .set_input(catalog.field("status").unwrap(), "Maybe", false)
            .unwrap();
        answers
            .set_input(catalog.field("weight").unwrap(), "heavy", false)
            .unwrap();
        assert_eq!(answers.get("status"), Some(&AnswerValue::from("Maybe")));

        // Unparseable numeric text still counts as answered but submits as null
        assert!(answers.is_answered("weight"));
        let payload = answers.snapshot_for_submission(&catalog);
        assert!(payload.is_null("weight"));
    }

    #[test]
    fn test_snapshot_covers_every_key() {
        let catalog = catalog();
        let mut answers = AnswerStore::new();
        answers.set("status", "OK");
        answers.set("packages", "7");
        answers.set("photo", "");

        let payload = answers.snapshot_for_submission(&catalog);
        assert_eq!(payload.len(), catalog.len());
        assert_eq!(payload.get("status"), Some(&json!("OK")));
        assert_eq!(payload.get("packages"), Some(&json!(7.0)));
        assert!(payload.is_null("problems"));
        assert!(payload.is_null("weight"));
        assert!(payload.is_null("photo"));
    }

    #[test]
    fn test_snapshot_nulls_hidden_answers() {
        let catalog = catalog();
        let mut answers = AnswerStore::new();
        answers.set("status", "NotOK");
        answers.set("problems", "Pallet broken");
        assert_eq!(
            answers.snapshot_for_submission(&catalog).get("problems"),
            Some(&json!("Pallet broken"))
        );

        answers.set("status", "OK");
        let payload = answers.snapshot_for_submission(&catalog);
        assert!(payload.is_null("problems"));
        // The stored answer itself is untouched
        assert_eq!(answers.get("problems"), Some(&AnswerValue::from("Pallet broken")));
    }

    #[test]
    fn test_from_record() {
        let record = json!({
            "status": "NotOK",
            "packages": 4,
            "photo": null,
            "checked": true,
            "nested": { "x": 1 }
        });
        let answers = AnswerStore::from_record(record.as_object().unwrap());
        assert_eq!(answers.get("status"), Some(&AnswerValue::from("NotOK")));
        assert_eq!(answers.get("packages"), Some(&AnswerValue::Number(4.0)));
        assert_eq!(answers.get("checked"), Some(&AnswerValue::from("true")));
        assert!(answers.get("photo").is_none());
        assert!(answers.get("nested").is_none());
        assert_eq!(answers.len(), 3);
    }
}
