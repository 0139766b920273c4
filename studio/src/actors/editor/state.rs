//! EditorActor state types.

use ractor::RpcReplyPort;
use shared_types::{
    EditorSnapshot, PendingChange, PopoverSnapshot, SubmissionState, TextRange,
};

use crate::document::Document;
use crate::edit_service::EditServiceClient;

use super::messages::{EditorError, KeyOutcome};

/// Reply port held while a submission is in flight. Key-initiated submits
/// answer with the resolved action alongside the snapshot.
pub enum PendingReply {
    Submit(RpcReplyPort<Result<EditorSnapshot, EditorError>>),
    Key(RpcReplyPort<Result<KeyOutcome, EditorError>>),
}

/// One in-flight submission: the attempt identifying it, the selection
/// captured at submission time (the outcome renders against this range, not
/// wherever the cursor has moved since), and the caller waiting on it.
pub struct PendingSubmit {
    pub attempt: u64,
    pub selection: TextRange,
    pub reply: PendingReply,
}

/// Inline-edit popover state.
///
/// `pending` is Some iff `submission` is `Submitted`; the transition methods
/// keep the two in step, so callers never set the fields directly.
#[derive(Debug, Clone)]
pub struct PopoverState {
    pub open: bool,
    submission: SubmissionState,
    pending: Option<PendingChange>,
    last_error: Option<String>,
}

impl PopoverState {
    pub fn closed() -> Self {
        Self {
            open: false,
            submission: SubmissionState::Idle,
            pending: None,
            last_error: None,
        }
    }

    pub fn submission(&self) -> SubmissionState {
        self.submission
    }

    pub fn pending(&self) -> Option<PendingChange> {
        self.pending
    }

    pub fn snapshot(&self) -> PopoverSnapshot {
        PopoverSnapshot {
            open: self.open,
            submission: self.submission,
            pending: self.pending,
            last_error: self.last_error.clone(),
        }
    }

    /// Idle → Submitting. Clears any error from a previous attempt.
    pub fn begin_submitting(&mut self) {
        self.submission = SubmissionState::Submitting;
        self.pending = None;
        self.last_error = None;
    }

    /// Submitting → Submitted, recording the rendered change.
    pub fn complete_submitted(&mut self, pending: PendingChange) {
        self.submission = SubmissionState::Submitted;
        self.pending = Some(pending);
    }

    /// Submitting → Idle with a user-visible error.
    pub fn fail_to_idle(&mut self, message: String) {
        self.submission = SubmissionState::Idle;
        self.pending = None;
        self.last_error = Some(message);
    }

    /// Back to Idle with nothing pending (decision made or popover closed).
    pub fn reset(&mut self) {
        self.submission = SubmissionState::Idle;
        self.pending = None;
        self.last_error = None;
    }
}

pub struct EditorSessionState {
    pub session_id: String,
    pub user_id: String,
    pub document: Document,
    pub selection: TextRange,
    pub popover: PopoverState,
    pub edit_service: EditServiceClient,
    /// Monotonic per-session mutation counter.
    pub revision: u64,
    /// Monotonic submission counter; outcomes carrying an attempt that is no
    /// longer the in-flight one are stale and discarded.
    pub attempt_seq: u64,
    pub pending_submit: Option<PendingSubmit>,
}

impl EditorSessionState {
    pub fn new(
        session_id: String,
        user_id: String,
        content: &str,
        edit_service: EditServiceClient,
    ) -> Self {
        Self {
            session_id,
            user_id,
            document: Document::new(content),
            selection: TextRange::caret(0),
            popover: PopoverState::closed(),
            edit_service,
            revision: 0,
            attempt_seq: 0,
            pending_submit: None,
        }
    }

    pub fn snapshot(&self) -> EditorSnapshot {
        EditorSnapshot {
            session_id: self.session_id.clone(),
            content: self.document.content(),
            committed_content: self.document.committed_content(),
            selection: self.selection,
            marks: self.document.marks().to_vec(),
            popover: self.popover.snapshot(),
            revision: self.revision,
        }
    }

    pub fn bump_revision(&mut self) {
        self.revision += 1;
    }

    /// Keep the selection inside the document after content changes.
    pub fn clamp_selection(&mut self) {
        let len = self.document.len();
        self.selection =
            TextRange::new(self.selection.from.min(len), self.selection.to.min(len));
    }

    /// Allocate the attempt number for a new submission.
    pub fn next_attempt(&mut self) -> u64 {
        self.attempt_seq += 1;
        self.attempt_seq
    }

    /// Whether `attempt` identifies the submission currently in flight.
    pub fn is_current_attempt(&self, attempt: u64) -> bool {
        self.pending_submit
            .as_ref()
            .is_some_and(|p| p.attempt == attempt)
    }

    /// Drop the in-flight submission, answering its caller with
    /// `Superseded`. Any outcome it later produces no longer matches a held
    /// attempt and is discarded.
    pub fn supersede_pending_submit(&mut self) {
        if let Some(pending) = self.pending_submit.take() {
            match pending.reply {
                PendingReply::Submit(reply) => {
                    let _ = reply.send(Err(EditorError::Superseded));
                }
                PendingReply::Key(reply) => {
                    let _ = reply.send(Err(EditorError::Superseded));
                }
            }
        }
    }
}
