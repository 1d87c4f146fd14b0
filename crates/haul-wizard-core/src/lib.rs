// SPDX-License-Identifier: AGPL-3.0
// Haul Wizard Core - Shared form engine for all driver screens
//
// This crate provides:
// - FieldCatalog and FieldDescriptor for declaring forms
// - Visibility resolution and pagination over a catalog
// - AnswerStore and the normalized submission snapshot
// - WizardController, the per-form state machine
// - WizardSession and WizardBridge for async submission
// - SettingsStore for persisted page layouts
//
// Screens and network clients live in separate crates.

pub mod answers;
pub mod bridge;
pub mod catalog;
pub mod catalogs;
pub mod controller;
pub mod field;
pub mod paginator;
pub mod session;
pub mod settings;
pub mod types;
pub mod visibility;

// Re-export commonly used items
pub use answers::AnswerStore;
pub use bridge::{WizardBridge, WizardCommand, WizardEvent, WizardView};
pub use catalog::FieldCatalog;
pub use controller::{Advance, Confirmation, Retreat, WizardController, WizardMode, WizardState};
pub use field::{FieldDescriptor, FieldKind, Gate, VisibilityRule};
pub use paginator::{paginate, Page, Pagination};
pub use session::{SessionOutcome, SubmitHandler, WizardSession};
pub use settings::{SettingsStore, WizardSettings};
pub use types::{
    AnswerValue, BackwardNavigation, CatalogError, PageLayout, SubmissionPayload, SubmitAck,
    SubmitError, WizardError,
};
pub use visibility::{is_visible, visible_indices};
