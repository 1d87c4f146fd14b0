// SPDX-License-Identifier: AGPL-3.0
// Haul Wizard Core - Screen bridge
//
// Bridges a wizard controller with an event-driven screen. Commands arrive on
// a channel and are applied one at a time; submissions run as separate tasks
// so that commands keep flowing (and get rejected) while one is in flight.

use crate::controller::{
    Advance, Confirmation, Retreat, WizardController, WizardMode, WizardState,
};
use crate::session::SubmitHandler;
use crate::types::{SubmissionPayload, SubmitAck, SubmitError, WizardError};
use async_channel::{Receiver, Sender};
use serde::Serialize;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Commands that can be sent to the wizard
#[derive(Debug)]
pub enum WizardCommand {
    SetAnswer { key: String, value: String },
    Next,
    Previous,
    ForceSubmit(Confirmation),
    GetView { reply: Sender<WizardView> },
}

/// Events emitted back to the screen
#[derive(Debug, Clone, PartialEq)]
pub enum WizardEvent {
    AnswerRecorded {
        key: String,
    },
    Moved {
        cursor: usize,
        page: usize,
        total_pages: usize,
    },
    /// Required fields on the current page are unanswered
    Blocked {
        missing: Vec<String>,
    },
    ExitWizard,
    /// Force-submit prompt was declined
    Stayed,
    Submitting,
    Completed(SubmitAck),
    SubmitFailed(SubmitError),
    /// The command was refused; carries the reason for display
    Rejected(String),
}

/// Read-only picture of the wizard for rendering
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardView {
    pub state: WizardState,
    pub page: usize,
    pub total_pages: usize,
    pub fields: Vec<String>,
    pub missing: Vec<String>,
}

impl WizardView {
    fn of(controller: &WizardController) -> Self {
        Self {
            state: controller.state(),
            page: controller.current_page(),
            total_pages: controller.total_pages(),
            fields: controller
                .current_fields()
                .iter()
                .map(|f| f.key.clone())
                .collect(),
            missing: controller.missing_fields(),
        }
    }
}

/// Bridge between a screen and one wizard instance
pub struct WizardBridge {
    command_tx: Sender<WizardCommand>,
    event_rx: Receiver<WizardEvent>,
    task: JoinHandle<WizardController>,
}

impl WizardBridge {
    /// Spawn the wizard task on `handle`
    pub fn spawn<S>(handle: &Handle, controller: WizardController, submitter: Arc<S>) -> Self
    where
        S: SubmitHandler + 'static,
    {
        let (command_tx, command_rx) = async_channel::bounded::<WizardCommand>(32);
        let (event_tx, event_rx) = async_channel::bounded::<WizardEvent>(64);

        let task = handle.spawn(Self::run_wizard(controller, submitter, command_rx, event_tx));

        Self {
            command_tx,
            event_rx,
            task,
        }
    }

    async fn run_wizard<S>(
        controller: WizardController,
        submitter: Arc<S>,
        command_rx: Receiver<WizardCommand>,
        event_tx: Sender<WizardEvent>,
    ) -> WizardController
    where
        S: SubmitHandler + 'static,
    {
        let (done_tx, done_rx) = async_channel::bounded::<Result<SubmitAck, SubmitError>>(1);
        let mut task = BridgeTask {
            controller,
            submitter,
            done_tx,
        };

        loop {
            tokio::select! {
                // Handle commands from the screen
                cmd = command_rx.recv() => {
                    match cmd {
                        Ok(cmd) => {
                            if let Some(event) = task.apply(cmd) {
                                if event_tx.send(event).await.is_err() {
                                    break; // Channel closed
                                }
                            }
                        }
                        Err(_) => {
                            // Screen went away; let an in-flight submission land first
                            if task.controller.state().mode == WizardMode::Submitting {
                                if let Ok(result) = done_rx.recv().await {
                                    let _ = event_tx.send(task.finish(result)).await;
                                }
                            }
                            break;
                        }
                    }
                }
                // Fold submission results back in
                result = done_rx.recv() => {
                    if let Ok(result) = result {
                        if event_tx.send(task.finish(result)).await.is_err() {
                            break; // Channel closed
                        }
                    }
                }
            }
        }

        task.controller
    }

    async fn send(&self, cmd: WizardCommand) {
        let _ = self.command_tx.send(cmd).await;
    }

    pub async fn set_answer(&self, key: impl Into<String>, value: impl Into<String>) {
        self.send(WizardCommand::SetAnswer {
            key: key.into(),
            value: value.into(),
        })
        .await;
    }

    pub async fn next(&self) {
        self.send(WizardCommand::Next).await;
    }

    pub async fn previous(&self) {
        self.send(WizardCommand::Previous).await;
    }

    pub async fn force_submit(&self, confirmation: Confirmation) {
        self.send(WizardCommand::ForceSubmit(confirmation)).await;
    }

    /// Current page, fields and blocking keys
    pub async fn view(&self) -> Option<WizardView> {
        let (reply_tx, reply_rx) = async_channel::bounded(1);
        self.send(WizardCommand::GetView { reply: reply_tx }).await;
        reply_rx.recv().await.ok()
    }

    /// Get event receiver for subscribing to wizard events
    pub fn event_receiver(&self) -> Receiver<WizardEvent> {
        self.event_rx.clone()
    }

    /// Stop accepting commands and hand back the controller
    pub async fn shutdown(self) -> Option<WizardController> {
        let Self {
            command_tx, task, ..
        } = self;
        drop(command_tx);
        task.await.ok()
    }
}

struct BridgeTask<S> {
    controller: WizardController,
    submitter: Arc<S>,
    done_tx: Sender<Result<SubmitAck, SubmitError>>,
}

impl<S: SubmitHandler + 'static> BridgeTask<S> {
    fn apply(&mut self, cmd: WizardCommand) -> Option<WizardEvent> {
        let result = match cmd {
            WizardCommand::SetAnswer { key, value } => self
                .controller
                .set_answer(&key, &value)
                .map(|()| WizardEvent::AnswerRecorded { key }),
            WizardCommand::Next => self.controller.next().map(|advance| match advance {
                Advance::Moved {
                    cursor,
                    page,
                    total_pages,
                } => WizardEvent::Moved {
                    cursor,
                    page,
                    total_pages,
                },
                Advance::Submit(payload) => self.start_submission(payload),
            }),
            WizardCommand::Previous => self.controller.previous().map(|retreat| match retreat {
                Retreat::Moved { cursor, page } => WizardEvent::Moved {
                    cursor,
                    page,
                    total_pages: self.controller.total_pages(),
                },
                Retreat::ExitWizard => WizardEvent::ExitWizard,
            }),
            WizardCommand::ForceSubmit(confirmation) => {
                self.controller
                    .force_submit(confirmation)
                    .map(|payload| match payload {
                        Some(payload) => self.start_submission(payload),
                        None => WizardEvent::Stayed,
                    })
            }
            WizardCommand::GetView { reply } => {
                let _ = reply.try_send(WizardView::of(&self.controller));
                return None;
            }
        };

        Some(result.unwrap_or_else(|err| match err {
            WizardError::ValidationBlocked { missing } => WizardEvent::Blocked { missing },
            other => WizardEvent::Rejected(other.to_string()),
        }))
    }

    fn start_submission(&self, payload: SubmissionPayload) -> WizardEvent {
        let submitter = self.submitter.clone();
        let done_tx = self.done_tx.clone();
        tokio::spawn(async move {
            let result = submitter.submit(payload).await;
            let _ = done_tx.send(result).await;
        });
        WizardEvent::Submitting
    }

    fn finish(&mut self, result: Result<SubmitAck, SubmitError>) -> WizardEvent {
        match self.controller.finish_submission(result) {
            Ok(ack) => WizardEvent::Completed(ack),
            Err(WizardError::SubmitFailed(err)) => WizardEvent::SubmitFailed(err),
            Err(other) => WizardEvent::Rejected(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FieldCatalog;
    use crate::field::{FieldDescriptor, FieldKind};
    use crate::types::PageLayout;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    /// Holds every submission until the gate opens
    #[derive(Default)]
    struct GatedSubmitter {
        gate: Notify,
        calls: AtomicUsize,
        fail: bool,
    }

    impl SubmitHandler for GatedSubmitter {
        async fn submit(&self, _payload: SubmissionPayload) -> Result<SubmitAck, SubmitError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.gate.notified().await;
            if self.fail {
                Err(SubmitError::Network("offline".to_string()))
            } else {
                Ok(SubmitAck::new(Some("B-7".to_string())))
            }
        }
    }

    fn controller() -> WizardController {
        let catalog = FieldCatalog::new(
            "trip",
            "Trip",
            vec![
                FieldDescriptor::new("driver", "Driver", FieldKind::Text),
                FieldDescriptor::new("km", "Kilometres", FieldKind::Number),
            ],
        )
        .unwrap();
        WizardController::new(Arc::new(catalog), PageLayout::uniform(2)).unwrap()
    }

    #[tokio::test]
    async fn test_commands_rejected_while_submitting() {
        let submitter = Arc::new(GatedSubmitter::default());
        let bridge = WizardBridge::spawn(&Handle::current(), controller(), submitter.clone());
        let events = bridge.event_receiver();

        bridge.next().await;
        assert_eq!(
            events.recv().await.unwrap(),
            WizardEvent::Blocked {
                missing: vec!["driver".to_string(), "km".to_string()]
            }
        );

        bridge.set_answer("driver", "Jana").await;
        assert_eq!(
            events.recv().await.unwrap(),
            WizardEvent::AnswerRecorded {
                key: "driver".to_string()
            }
        );

        bridge.force_submit(Confirmation::Confirmed).await;
        assert_eq!(events.recv().await.unwrap(), WizardEvent::Submitting);

        bridge.next().await;
        assert_eq!(
            events.recv().await.unwrap(),
            WizardEvent::Rejected(WizardError::SubmitInFlight.to_string())
        );
        bridge.set_answer("km", "10").await;
        assert!(matches!(events.recv().await.unwrap(), WizardEvent::Rejected(_)));

        submitter.gate.notify_one();
        let WizardEvent::Completed(ack) = events.recv().await.unwrap() else {
            panic!("expected completion");
        };
        assert_eq!(ack.reference.as_deref(), Some("B-7"));
        assert_eq!(submitter.calls.load(Ordering::SeqCst), 1);

        let view = bridge.view().await.unwrap();
        assert_eq!(view.state.mode, WizardMode::Complete);

        let controller = bridge.shutdown().await.unwrap();
        assert_eq!(controller.state().mode, WizardMode::Complete);
    }

    #[tokio::test]
    async fn test_failed_submission_reopens_wizard() {
        let submitter = Arc::new(GatedSubmitter {
            fail: true,
            ..Default::default()
        });
        let bridge = WizardBridge::spawn(&Handle::current(), controller(), submitter.clone());
        let events = bridge.event_receiver();

        bridge.set_answer("driver", "Jana").await;
        bridge.set_answer("km", "12").await;
        bridge.next().await;
        assert!(matches!(events.recv().await.unwrap(), WizardEvent::AnswerRecorded { .. }));
        assert!(matches!(events.recv().await.unwrap(), WizardEvent::AnswerRecorded { .. }));
        assert_eq!(events.recv().await.unwrap(), WizardEvent::Submitting);

        submitter.gate.notify_one();
        assert_eq!(
            events.recv().await.unwrap(),
            WizardEvent::SubmitFailed(SubmitError::Network("offline".to_string()))
        );

        let view = bridge.view().await.unwrap();
        assert_eq!(view.state.mode, WizardMode::Browsing);
        assert_eq!(view.fields, vec!["driver", "km"]);
        assert!(view.missing.is_empty());

        bridge.previous().await;
        assert_eq!(events.recv().await.unwrap(), WizardEvent::ExitWizard);
    }
}
