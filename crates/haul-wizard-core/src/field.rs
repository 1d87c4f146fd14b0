// SPDX-License-Identifier: AGPL-3.0
// Haul Wizard Core - Field descriptors
//
// Declarative description of a single form field. Descriptors are immutable
// once placed in a catalog.

use crate::types::AnswerValue;
use serde::{Deserialize, Serialize};

/// Input kind of a field. Only the select kinds carry options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum FieldKind {
    Text,
    Number,
    Decimal,
    Date,
    SingleSelect { options: Vec<String> },
    CountrySelect { options: Vec<String> },
    PhotoCapture,
}

impl FieldKind {
    pub fn single_select<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::SingleSelect {
            options: options.into_iter().map(Into::into).collect(),
        }
    }

    pub fn country_select<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::CountrySelect {
            options: options.into_iter().map(Into::into).collect(),
        }
    }

    /// Numeric kinds are parsed to numbers before storage and submission
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Number | Self::Decimal)
    }

    /// Photo fields are optional and never block navigation
    pub fn is_photo(&self) -> bool {
        matches!(self, Self::PhotoCapture)
    }

    pub fn options(&self) -> Option<&[String]> {
        match self {
            Self::SingleSelect { options } | Self::CountrySelect { options } => {
                Some(options.as_slice())
            }
            _ => None,
        }
    }
}

/// Predicate over a controller's answer deciding whether its dependents show
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "when", content = "value", rename_all = "kebab-case")]
pub enum VisibilityRule {
    Equals(String),
    /// Answered with anything other than the given value
    NotEquals(String),
    AnyOf(Vec<String>),
    Answered,
}

impl VisibilityRule {
    pub fn equals(value: impl Into<String>) -> Self {
        Self::Equals(value.into())
    }

    pub fn not_equals(value: impl Into<String>) -> Self {
        Self::NotEquals(value.into())
    }

    pub fn matches(&self, answer: Option<&AnswerValue>) -> bool {
        let Some(answer) = answer.filter(|a| !a.is_blank()) else {
            return false;
        };
        let text = answer.to_text();
        match self {
            Self::Equals(expected) => text == *expected,
            Self::NotEquals(unexpected) => text != *unexpected,
            Self::AnyOf(candidates) => candidates.iter().any(|c| *c == text),
            Self::Answered => true,
        }
    }
}

/// Visibility gate carried by a controlling field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gate {
    /// Keys of the fields this controller shows or hides
    pub controls: Vec<String>,
    pub visible_when: VisibilityRule,
    /// Dependents added with a rule other than `visible_when`
    #[serde(skip)]
    pub(crate) conflicting: Vec<String>,
}

/// Declarative description of a form field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub placeholder: String,
    #[serde(flatten)]
    pub kind: FieldKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate: Option<Gate>,
}

impl FieldDescriptor {
    pub fn new(key: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            placeholder: String::new(),
            kind,
            gate: None,
        }
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    /// Make this field control the visibility of `dependent`.
    ///
    /// A controller has a single rule. A dependent added with a different
    /// rule does not change it; the catalog rejects such a field instead.
    pub fn controls(mut self, dependent: impl Into<String>, visible_when: VisibilityRule) -> Self {
        let dependent: String = dependent.into();
        match self.gate.as_mut() {
            Some(gate) if gate.visible_when != visible_when => gate.conflicting.push(dependent),
            Some(gate) => gate.controls.push(dependent),
            None => {
                self.gate = Some(Gate {
                    controls: vec![dependent],
                    visible_when,
                    conflicting: Vec::new(),
                });
            }
        }
        self
    }

    pub fn is_controller(&self) -> bool {
        self.gate.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_helpers() {
        assert!(FieldKind::Decimal.is_numeric());
        assert!(!FieldKind::Text.is_numeric());
        assert!(FieldKind::PhotoCapture.is_photo());
        assert_eq!(
            FieldKind::single_select(["OK", "NotOK"]).options(),
            Some(&["OK".to_string(), "NotOK".to_string()][..])
        );
        assert!(FieldKind::Date.options().is_none());
    }

    #[test]
    fn test_rules_on_blank_answers() {
        let rule = VisibilityRule::not_equals("OK");
        assert!(!rule.matches(None));
        assert!(!rule.matches(Some(&AnswerValue::from(""))));
        assert!(rule.matches(Some(&AnswerValue::from("NotOK"))));
        assert!(!rule.matches(Some(&AnswerValue::from("OK"))));
    }

    #[test]
    fn test_rule_matches_numbers_by_text() {
        let rule = VisibilityRule::AnyOf(vec!["1".to_string(), "2".to_string()]);
        assert!(rule.matches(Some(&AnswerValue::Number(2.0))));
        assert!(!rule.matches(Some(&AnswerValue::Number(2.5))));
        assert!(VisibilityRule::Answered.matches(Some(&AnswerValue::Number(0.0))));
    }

    #[test]
    fn test_controls_accumulates_dependents() {
        let field = FieldDescriptor::new("gate", "Gate", FieldKind::single_select(["on", "off"]))
            .controls("h1", VisibilityRule::equals("on"))
            .controls("h2", VisibilityRule::equals("on"));
        let gate = field.gate.expect("gate");
        assert_eq!(gate.controls, vec!["h1", "h2"]);
        assert!(gate.conflicting.is_empty());
    }

    #[test]
    fn test_controls_keeps_first_rule() {
        let field = FieldDescriptor::new("seal", "Seal intact", FieldKind::single_select(["Yes", "No"]))
            .controls("seal_number", VisibilityRule::equals("Yes"))
            .controls("seal_remarks", VisibilityRule::equals("No"));
        let gate = field.gate.expect("gate");
        assert_eq!(gate.controls, vec!["seal_number"]);
        assert_eq!(gate.visible_when, VisibilityRule::equals("Yes"));
        assert_eq!(gate.conflicting, vec!["seal_remarks"]);
    }

    #[test]
    fn test_descriptor_from_json() {
        let json = r#"{
            "key": "loading_status",
            "label": "Loading status",
            "type": "single-select",
            "options": ["OK", "NotOK"],
            "gate": { "controls": ["loading_problems"], "visibleWhen": { "when": "equals", "value": "NotOK" } }
        }"#;
        let field: FieldDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(field.kind, FieldKind::single_select(["OK", "NotOK"]));
        assert_eq!(field.placeholder, "");
        assert!(field.is_controller());
    }
}
