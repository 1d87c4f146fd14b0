// SPDX-License-Identifier: AGPL-3.0
// Haul Wizard Demo - Console submitter

use haul_wizard_core::{SubmissionPayload, SubmitAck, SubmitError, SubmitHandler};
use std::sync::atomic::{AtomicU32, Ordering};

/// Prints each payload instead of sending it anywhere
#[derive(Default)]
pub struct ConsoleSubmitter {
    sent: AtomicU32,
}

impl SubmitHandler for ConsoleSubmitter {
    async fn submit(&self, payload: SubmissionPayload) -> Result<SubmitAck, SubmitError> {
        let json = serde_json::to_string_pretty(&payload)
            .map_err(|e| SubmitError::Rejected(e.to_string()))?;
        println!("{}", json);

        let number = self.sent.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!(fields = payload.len(), "Payload delivered to console");
        Ok(SubmitAck::new(Some(format!("DEMO-{}", number))))
    }
}
