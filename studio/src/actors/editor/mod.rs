//! EditorActor - one actor per editor session.
//!
//! Single mutation authority for the session's document, selection, and
//! popover. All changes are serialized through the mailbox; the remote
//! inline-edit call is the only suspension point and runs as a spawned task
//! that messages its outcome back, so close and dismiss keep working while a
//! submission is in flight. A late outcome whose attempt number is no longer
//! held is discarded without touching the document.

mod messages;
mod state;

use async_trait::async_trait;
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use shared_types::{EditorSnapshot, InlineEditRequest, KeyChord, SubmissionState};

pub use messages::{EditorError, EditorMsg, KeyOutcome};
pub use state::{EditorSessionState, PendingReply, PendingSubmit, PopoverState};

use crate::edit_service::{EditServiceClient, EditServiceError};
use crate::keymap::{self, PopoverAction};

/// Shown in `last_error` when a submission fails; the raw upstream error is
/// logged, not surfaced.
const SUBMIT_FAILED_MESSAGE: &str = "The edit request failed. Please try again.";

#[derive(Debug, Default)]
pub struct EditorActor;

#[derive(Debug, Clone)]
pub struct EditorArguments {
    pub session_id: String,
    pub user_id: String,
    pub content: String,
    pub edit_service: EditServiceClient,
}

#[async_trait]
impl Actor for EditorActor {
    type Msg = EditorMsg;
    type State = EditorSessionState;
    type Arguments = EditorArguments;

    async fn pre_start(
        &self,
        myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        tracing::info!(
            actor_id = %myself.get_id(),
            session_id = %args.session_id,
            user_id = %args.user_id,
            "EditorActor starting"
        );
        Ok(EditorSessionState::new(
            args.session_id,
            args.user_id,
            &args.content,
            args.edit_service,
        ))
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            EditorMsg::Snapshot { reply } => {
                let _ = reply.send(state.snapshot());
            }
            EditorMsg::SetSelection { range, reply } => {
                let result = state.document.check_range(range).map(|_| {
                    state.selection = range;
                    state.bump_revision();
                    state.snapshot()
                });
                let _ = reply.send(result.map_err(Into::into));
            }
            EditorMsg::TogglePopover { reply } => {
                if state.popover.open {
                    Self::close_popover(state);
                } else {
                    Self::open_popover(state);
                }
                let _ = reply.send(state.snapshot());
            }
            EditorMsg::ClosePopover { reply } => {
                if state.popover.open {
                    Self::close_popover(state);
                }
                let _ = reply.send(state.snapshot());
            }
            EditorMsg::Submit { instruction, reply } => {
                self.handle_submit(&myself, state, instruction, PendingReply::Submit(reply));
            }
            EditorMsg::SuggestionOutcome { attempt, result } => {
                self.handle_suggestion_outcome(state, attempt, result);
            }
            EditorMsg::Accept { reply } => {
                Self::handle_accept(state);
                let _ = reply.send(Ok(state.snapshot()));
            }
            EditorMsg::Reject { reply } => {
                Self::handle_reject(state);
                let _ = reply.send(Ok(state.snapshot()));
            }
            EditorMsg::Key {
                chord,
                instruction,
                reply,
            } => {
                self.handle_key(&myself, state, chord, instruction, reply);
            }
            EditorMsg::LinkAt { pos, reply } => {
                let _ = reply.send(state.document.link_at(pos));
            }
            EditorMsg::SetLink {
                href,
                open_in_new_tab,
                reply,
            } => {
                let _ = reply.send(Self::handle_set_link(state, href, open_in_new_tab));
            }
            EditorMsg::UnsetLink { reply } => {
                let result = state
                    .document
                    .unset_link(state.selection)
                    .map(|_| {
                        state.bump_revision();
                        state.snapshot()
                    })
                    .map_err(Into::into);
                let _ = reply.send(result);
            }
        }
        Ok(())
    }
}

impl EditorActor {
    fn open_popover(state: &mut EditorSessionState) {
        state.popover.open = true;
        state.popover.reset();
        state.bump_revision();
    }

    /// Close without a decision: a displayed suggestion is auto-rejected and
    /// an in-flight submission superseded, so no decision marks and no stale
    /// outcome can outlive the popover.
    fn close_popover(state: &mut EditorSessionState) {
        if let Some(change) = state.popover.pending() {
            state.document.reject_suggestion(change);
        }
        state.supersede_pending_submit();
        state.popover.open = false;
        state.popover.reset();
        state.clamp_selection();
        state.bump_revision();
    }

    /// Accept with nothing pending is an idempotent no-op.
    fn handle_accept(state: &mut EditorSessionState) {
        let Some(change) = state.popover.pending() else {
            return;
        };
        state.document.accept_suggestion(change);
        state.popover.open = false;
        state.popover.reset();
        state.clamp_selection();
        state.bump_revision();
    }

    /// Reject with nothing pending is an idempotent no-op.
    fn handle_reject(state: &mut EditorSessionState) {
        let Some(change) = state.popover.pending() else {
            return;
        };
        state.document.reject_suggestion(change);
        state.popover.open = false;
        state.popover.reset();
        state.clamp_selection();
        state.bump_revision();
    }

    fn handle_set_link(
        state: &mut EditorSessionState,
        href: String,
        open_in_new_tab: bool,
    ) -> Result<EditorSnapshot, EditorError> {
        let href = href.trim();
        if href.is_empty() {
            return Err(EditorError::Validation(
                "Link href cannot be empty.".to_string(),
            ));
        }
        state.document.set_link(state.selection, href, open_in_new_tab)?;
        state.bump_revision();
        Ok(state.snapshot())
    }

    fn handle_submit(
        &self,
        myself: &ActorRef<EditorMsg>,
        state: &mut EditorSessionState,
        instruction: String,
        reply: PendingReply,
    ) {
        if !state.popover.open {
            Self::answer(reply, Err(EditorError::PopoverClosed));
            return;
        }
        match state.popover.submission() {
            SubmissionState::Submitting => {
                Self::answer(reply, Err(EditorError::SubmissionInFlight));
                return;
            }
            SubmissionState::Submitted => {
                Self::answer(reply, Err(EditorError::DecisionPending));
                return;
            }
            SubmissionState::Idle => {}
        }
        let instruction = instruction.trim().to_string();
        if instruction.is_empty() {
            Self::answer(
                reply,
                Err(EditorError::Validation(
                    "Message must be at least 1 character.".to_string(),
                )),
            );
            return;
        }

        // Context and selection are captured now; the outcome renders against
        // this range even if the cursor moves while the call is in flight.
        let selection = state.selection;
        let request = InlineEditRequest {
            context: state.document.committed_content(),
            selection: state.document.slice(selection),
            edit: instruction,
        };
        let attempt = state.next_attempt();
        state.popover.begin_submitting();
        state.pending_submit = Some(PendingSubmit {
            attempt,
            selection,
            reply,
        });
        state.bump_revision();

        tracing::debug!(
            session_id = %state.session_id,
            attempt,
            selection_from = selection.from,
            selection_to = selection.to,
            "submitting inline edit"
        );

        let edit_service = state.edit_service.clone();
        let actor = myself.clone();
        tokio::spawn(async move {
            let result = edit_service.suggest(&request).await;
            let _ = actor.send_message(EditorMsg::SuggestionOutcome { attempt, result });
        });
    }

    fn handle_suggestion_outcome(
        &self,
        state: &mut EditorSessionState,
        attempt: u64,
        result: Result<String, EditServiceError>,
    ) {
        if !state.is_current_attempt(attempt) {
            tracing::debug!(
                session_id = %state.session_id,
                attempt,
                "discarding stale suggestion outcome"
            );
            return;
        }
        let Some(pending_submit) = state.pending_submit.take() else {
            return;
        };

        match result {
            Ok(suggested) => {
                match state
                    .document
                    .begin_suggestion(pending_submit.selection, &suggested)
                {
                    Ok(change) => {
                        state.popover.complete_submitted(change);
                        state.bump_revision();
                        Self::answer(pending_submit.reply, Ok(state.snapshot()));
                    }
                    Err(e) => {
                        state.popover.fail_to_idle(SUBMIT_FAILED_MESSAGE.to_string());
                        state.bump_revision();
                        Self::answer(pending_submit.reply, Err(e.into()));
                    }
                }
            }
            Err(e) => {
                tracing::warn!(
                    session_id = %state.session_id,
                    attempt,
                    error = %e,
                    "inline edit submission failed"
                );
                state.popover.fail_to_idle(SUBMIT_FAILED_MESSAGE.to_string());
                state.bump_revision();
                Self::answer(pending_submit.reply, Err(e.into()));
            }
        }
    }

    fn handle_key(
        &self,
        myself: &ActorRef<EditorMsg>,
        state: &mut EditorSessionState,
        chord: KeyChord,
        instruction: Option<String>,
        reply: RpcReplyPort<Result<KeyOutcome, EditorError>>,
    ) {
        let action = keymap::resolve(&chord, state.popover.open, state.popover.submission());
        match action {
            Some(PopoverAction::Submit) => {
                self.handle_submit(
                    myself,
                    state,
                    instruction.unwrap_or_default(),
                    PendingReply::Key(reply),
                );
            }
            Some(PopoverAction::Toggle) => {
                if state.popover.open {
                    Self::close_popover(state);
                } else {
                    Self::open_popover(state);
                }
                let _ = reply.send(Ok(KeyOutcome {
                    action,
                    snapshot: state.snapshot(),
                }));
            }
            Some(PopoverAction::Close) => {
                Self::close_popover(state);
                let _ = reply.send(Ok(KeyOutcome {
                    action,
                    snapshot: state.snapshot(),
                }));
            }
            Some(PopoverAction::Accept) => {
                Self::handle_accept(state);
                let _ = reply.send(Ok(KeyOutcome {
                    action,
                    snapshot: state.snapshot(),
                }));
            }
            Some(PopoverAction::Reject) => {
                Self::handle_reject(state);
                let _ = reply.send(Ok(KeyOutcome {
                    action,
                    snapshot: state.snapshot(),
                }));
            }
            None => {
                let _ = reply.send(Ok(KeyOutcome {
                    action: None,
                    snapshot: state.snapshot(),
                }));
            }
        }
    }

    fn answer(reply: PendingReply, result: Result<EditorSnapshot, EditorError>) {
        match reply {
            PendingReply::Submit(port) => {
                let _ = port.send(result);
            }
            PendingReply::Key(port) => {
                let _ = port.send(result.map(|snapshot| KeyOutcome {
                    action: Some(PopoverAction::Submit),
                    snapshot,
                }));
            }
        }
    }
}
