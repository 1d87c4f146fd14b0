// SPDX-License-Identifier: AGPL-3.0
// Haul Wizard Core - Wizard controller
//
// Explicit state machine for one wizard instance. It owns the answers and the
// page cursor; every input event goes through it. Submission is split into
// two steps (hand out the payload, then fold the collaborator's result back
// in) so the controller itself guards against re-entrant calls while a
// submission is in flight.

use crate::answers::AnswerStore;
use crate::catalog::FieldCatalog;
use crate::field::FieldDescriptor;
use crate::paginator::Pagination;
use crate::settings::WizardSettings;
use crate::types::{
    BackwardNavigation, PageLayout, SubmissionPayload, SubmitAck, SubmitError, WizardError,
};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum WizardMode {
    Browsing,
    Submitting,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardState {
    /// Catalog index where the current page starts
    pub cursor: usize,
    pub mode: WizardMode,
}

/// User answer to the "submit now?" prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Declined,
}

/// Result of a successful `next`
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    Moved {
        cursor: usize,
        page: usize,
        total_pages: usize,
    },
    /// The catalog is exhausted; hand this payload to the submit collaborator
    Submit(SubmissionPayload),
}

/// Result of a successful `previous`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retreat {
    Moved { cursor: usize, page: usize },
    /// Already on the first page; the caller leaves the wizard
    ExitWizard,
}

pub struct WizardController {
    session_id: Uuid,
    catalog: Arc<FieldCatalog>,
    layout: PageLayout,
    backward: BackwardNavigation,
    strict_values: bool,
    answers: AnswerStore,
    state: WizardState,
}

impl WizardController {
    pub fn new(catalog: Arc<FieldCatalog>, layout: PageLayout) -> Result<Self, WizardError> {
        layout.validate()?;
        let session_id = Uuid::new_v4();
        tracing::info!(
            %session_id,
            catalog = catalog.id(),
            page_size = layout.page_size,
            look_ahead = layout.look_ahead,
            "Wizard started"
        );

        Ok(Self {
            session_id,
            catalog,
            layout,
            backward: BackwardNavigation::default(),
            strict_values: true,
            answers: AnswerStore::new(),
            state: WizardState {
                cursor: 0,
                mode: WizardMode::Browsing,
            },
        })
    }

    /// Controller configured from the layout and policies in `settings`
    pub fn from_settings(
        catalog: Arc<FieldCatalog>,
        settings: &WizardSettings,
    ) -> Result<Self, WizardError> {
        let layout = settings.layout_for(catalog.id());
        Ok(Self::new(catalog, layout)?
            .strict_values(settings.strict_values)
            .backward_navigation(settings.backward_navigation))
    }

    /// Start from an existing record instead of empty answers
    pub fn with_answers(mut self, answers: AnswerStore) -> Self {
        self.answers = answers;
        self
    }

    pub fn strict_values(mut self, strict: bool) -> Self {
        self.strict_values = strict;
        self
    }

    pub fn backward_navigation(mut self, backward: BackwardNavigation) -> Self {
        self.backward = backward;
        self
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn catalog(&self) -> &FieldCatalog {
        &self.catalog
    }

    pub fn layout(&self) -> PageLayout {
        self.layout
    }

    pub fn state(&self) -> WizardState {
        self.state
    }

    pub fn answers(&self) -> &AnswerStore {
        &self.answers
    }

    pub fn pages(&self) -> Pagination<'_> {
        // Checked in `new`
        Pagination::with_checked_layout(&self.catalog, &self.answers, self.layout)
    }

    pub fn total_pages(&self) -> usize {
        self.pages().total_pages()
    }

    /// 1-based page number for display
    pub fn current_page(&self) -> usize {
        self.pages().page_number(self.state.cursor)
    }

    pub fn current_fields(&self) -> Vec<&FieldDescriptor> {
        self.pages().page_at(self.state.cursor).fields
    }

    /// Keys on the current page that still block `next`. Photos never block.
    pub fn missing_fields(&self) -> Vec<String> {
        self.current_fields()
            .into_iter()
            .filter(|f| !f.kind.is_photo() && !self.answers.is_answered(&f.key))
            .map(|f| f.key.clone())
            .collect()
    }

    pub fn can_advance(&self) -> bool {
        self.state.mode == WizardMode::Browsing && self.missing_fields().is_empty()
    }

    /// Record user input for `key`
    pub fn set_answer(&mut self, key: &str, raw: &str) -> Result<(), WizardError> {
        self.ensure_browsing()?;
        let field = self
            .catalog
            .field(key)
            .ok_or_else(|| WizardError::UnknownField(key.to_string()))?;
        self.answers.set_input(field, raw, self.strict_values)
    }

    /// Validate the current page and move to the next one, or hand out the
    /// submission payload when no visible field remains.
    pub fn next(&mut self) -> Result<Advance, WizardError> {
        self.ensure_browsing()?;

        let missing = self.missing_fields();
        if !missing.is_empty() {
            tracing::debug!(session_id = %self.session_id, ?missing, "Next blocked");
            return Err(WizardError::ValidationBlocked { missing });
        }

        let next = {
            let pages = self.pages();
            let page = pages.page_at(self.state.cursor);
            pages.next_cursor(&page)
        };

        match next {
            Some(cursor) => {
                self.state.cursor = cursor;
                let page = self.current_page();
                let total_pages = self.total_pages();
                tracing::info!(session_id = %self.session_id, cursor, page, total_pages, "Moved to next page");
                Ok(Advance::Moved {
                    cursor,
                    page,
                    total_pages,
                })
            }
            None => Ok(Advance::Submit(self.begin_submission())),
        }
    }

    /// Move back one page
    pub fn previous(&mut self) -> Result<Retreat, WizardError> {
        self.ensure_browsing()?;
        let cursor = self.state.cursor;

        let target = match self.backward {
            BackwardNavigation::Symmetric => self
                .pages()
                .page_starts()
                .into_iter()
                .rev()
                .find(|&start| start < cursor),
            BackwardNavigation::FixedStep => cursor.checked_sub(self.layout.page_size),
        };

        match target {
            Some(cursor) => {
                self.state.cursor = cursor;
                let page = self.current_page();
                tracing::info!(session_id = %self.session_id, cursor, page, "Moved to previous page");
                Ok(Retreat::Moved { cursor, page })
            }
            None => {
                tracing::info!(session_id = %self.session_id, "Leaving wizard from first page");
                Ok(Retreat::ExitWizard)
            }
        }
    }

    /// Submit whatever has been answered, skipping page validation.
    ///
    /// Returns `None` when the user declined the confirmation.
    pub fn force_submit(
        &mut self,
        confirmation: Confirmation,
    ) -> Result<Option<SubmissionPayload>, WizardError> {
        self.ensure_browsing()?;
        match confirmation {
            Confirmation::Declined => Ok(None),
            Confirmation::Confirmed => {
                tracing::info!(session_id = %self.session_id, cursor = self.state.cursor, "Forced submission");
                Ok(Some(self.begin_submission()))
            }
        }
    }

    /// Fold the submit collaborator's result back into the state machine.
    ///
    /// Success completes the wizard. Failure returns to browsing at the same
    /// cursor with every answer kept.
    pub fn finish_submission(
        &mut self,
        result: Result<SubmitAck, SubmitError>,
    ) -> Result<SubmitAck, WizardError> {
        if self.state.mode != WizardMode::Submitting {
            return Err(WizardError::NotSubmitting);
        }

        match result {
            Ok(ack) => {
                self.state.mode = WizardMode::Complete;
                tracing::info!(session_id = %self.session_id, reference = ?ack.reference, "Submission accepted");
                Ok(ack)
            }
            Err(err) => {
                self.state.mode = WizardMode::Browsing;
                tracing::warn!(session_id = %self.session_id, "Submission failed: {}", err);
                Err(WizardError::SubmitFailed(err))
            }
        }
    }

    fn begin_submission(&mut self) -> SubmissionPayload {
        self.state.mode = WizardMode::Submitting;
        tracing::info!(session_id = %self.session_id, catalog = self.catalog.id(), "Submitting answers");
        self.answers.snapshot_for_submission(&self.catalog)
    }

    fn ensure_browsing(&self) -> Result<(), WizardError> {
        match self.state.mode {
            WizardMode::Browsing => Ok(()),
            WizardMode::Submitting => Err(WizardError::SubmitInFlight),
            WizardMode::Complete => Err(WizardError::AlreadyComplete),
        }
    }
}
