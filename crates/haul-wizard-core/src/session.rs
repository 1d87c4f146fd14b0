// SPDX-License-Identifier: AGPL-3.0
// Haul Wizard Core - Async submission
//
// The submit collaborator owns all network I/O. A session pairs one
// controller with one collaborator and awaits submissions in place.

use crate::controller::{Advance, Confirmation, Retreat, WizardController};
use crate::types::{SubmissionPayload, SubmitAck, SubmitError, WizardError};
use std::future::Future;
use std::sync::Arc;

/// External collaborator that delivers the snapshot to the backend.
///
/// The engine never retries; retrying is left to the caller.
pub trait SubmitHandler: Send + Sync {
    fn submit(
        &self,
        payload: SubmissionPayload,
    ) -> impl Future<Output = Result<SubmitAck, SubmitError>> + Send;
}

impl<S: SubmitHandler> SubmitHandler for Arc<S> {
    fn submit(
        &self,
        payload: SubmissionPayload,
    ) -> impl Future<Output = Result<SubmitAck, SubmitError>> + Send {
        (**self).submit(payload)
    }
}

/// What a session step ended in
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    Moved { cursor: usize, page: usize },
    Completed(SubmitAck),
    ExitWizard,
    /// Force-submit prompt was declined
    Stayed,
}

pub struct WizardSession<S> {
    controller: WizardController,
    submitter: S,
}

impl<S: SubmitHandler> WizardSession<S> {
    pub fn new(controller: WizardController, submitter: S) -> Self {
        Self {
            controller,
            submitter,
        }
    }

    pub fn controller(&self) -> &WizardController {
        &self.controller
    }

    pub fn into_controller(self) -> WizardController {
        self.controller
    }

    pub fn set_answer(&mut self, key: &str, raw: &str) -> Result<(), WizardError> {
        self.controller.set_answer(key, raw)
    }

    pub async fn next(&mut self) -> Result<SessionOutcome, WizardError> {
        match self.controller.next()? {
            Advance::Moved { cursor, page, .. } => Ok(SessionOutcome::Moved { cursor, page }),
            Advance::Submit(payload) => self.deliver(payload).await,
        }
    }

    pub fn previous(&mut self) -> Result<SessionOutcome, WizardError> {
        Ok(match self.controller.previous()? {
            Retreat::Moved { cursor, page } => SessionOutcome::Moved { cursor, page },
            Retreat::ExitWizard => SessionOutcome::ExitWizard,
        })
    }

    pub async fn force_submit(
        &mut self,
        confirmation: Confirmation,
    ) -> Result<SessionOutcome, WizardError> {
        match self.controller.force_submit(confirmation)? {
            Some(payload) => self.deliver(payload).await,
            None => Ok(SessionOutcome::Stayed),
        }
    }

    async fn deliver(&mut self, payload: SubmissionPayload) -> Result<SessionOutcome, WizardError> {
        let result = self.submitter.submit(payload).await;
        self.controller
            .finish_submission(result)
            .map(SessionOutcome::Completed)
    }
}
