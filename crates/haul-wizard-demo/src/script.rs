// SPDX-License-Identifier: AGPL-3.0
// Haul Wizard Demo - Scripted input
//
// A script is a JSON array of steps, e.g.
// [{"set": {"key": "odometer_km", "value": "120450"}}, "next", "previous",
//  {"forceSubmit": {"confirm": true}}]

use haul_wizard_core::{Confirmation, FieldCatalog, FieldKind, WizardBridge};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScriptStep {
    Set { key: String, value: String },
    Next,
    Previous,
    ForceSubmit { confirm: bool },
}

impl ScriptStep {
    fn set(key: &str, value: &str) -> Self {
        Self::Set {
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    pub async fn send(self, bridge: &WizardBridge) {
        match self {
            Self::Set { key, value } => bridge.set_answer(key, value).await,
            Self::Next => bridge.next().await,
            Self::Previous => bridge.previous().await,
            Self::ForceSubmit { confirm } => {
                let confirmation = if confirm {
                    Confirmation::Confirmed
                } else {
                    Confirmation::Declined
                };
                bridge.force_submit(confirmation).await
            }
        }
    }
}

pub fn parse(json: &str) -> Result<Vec<ScriptStep>, String> {
    serde_json::from_str(json).map_err(|e| format!("Invalid script: {}", e))
}

pub fn load(path: &str) -> Result<Vec<ScriptStep>, String> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read script {}: {}", path, e))?;
    parse(&json)
}

fn sample_input(kind: &FieldKind) -> Option<String> {
    match kind {
        FieldKind::Text => Some("Checked at gate".to_string()),
        FieldKind::Number => Some("42".to_string()),
        FieldKind::Decimal => Some("12,5".to_string()),
        FieldKind::Date => Some("2026-10-18".to_string()),
        FieldKind::SingleSelect { options } | FieldKind::CountrySelect { options } => {
            options.first().cloned()
        }
        FieldKind::PhotoCapture => None,
    }
}

/// Try to advance empty-handed, fill every field, then walk forward
pub fn builtin(catalog: &FieldCatalog) -> Vec<ScriptStep> {
    let mut steps = vec![ScriptStep::Next];
    for field in catalog.fields() {
        if let Some(value) = sample_input(&field.kind) {
            steps.push(ScriptStep::set(&field.key, &value));
        }
    }
    steps.push(ScriptStep::Next);
    steps.push(ScriptStep::Previous);
    steps.extend((0..catalog.len()).map(|_| ScriptStep::Next));
    steps
}
