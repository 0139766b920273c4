//! EditorActor message types.
//!
//! Commands for one editor session with single-writer authority over its
//! document and popover.

use ractor::RpcReplyPort;
use shared_types::{EditorSnapshot, KeyChord, LinkInfo, TextRange};

use crate::document::DocumentError;
use crate::edit_service::EditServiceError;
use crate::keymap::PopoverAction;

#[derive(Debug)]
pub enum EditorMsg {
    /// Read-only view of the session.
    Snapshot {
        reply: RpcReplyPort<EditorSnapshot>,
    },
    SetSelection {
        range: TextRange,
        reply: RpcReplyPort<Result<EditorSnapshot, EditorError>>,
    },
    TogglePopover {
        reply: RpcReplyPort<EditorSnapshot>,
    },
    ClosePopover {
        reply: RpcReplyPort<EditorSnapshot>,
    },
    /// Submit an edit instruction. The reply is held until the remote call
    /// resolves, fails, or is superseded by a close/dismiss.
    Submit {
        instruction: String,
        reply: RpcReplyPort<Result<EditorSnapshot, EditorError>>,
    },
    /// Outcome of a spawned submission call, tagged with its attempt number.
    /// Outcomes whose attempt is no longer current are discarded.
    SuggestionOutcome {
        attempt: u64,
        result: Result<String, EditServiceError>,
    },
    Accept {
        reply: RpcReplyPort<Result<EditorSnapshot, EditorError>>,
    },
    Reject {
        reply: RpcReplyPort<Result<EditorSnapshot, EditorError>>,
    },
    /// Resolve a key chord against the popover state and apply the action.
    Key {
        chord: KeyChord,
        /// Drafted popover text, needed when the chord resolves to submit.
        instruction: Option<String>,
        reply: RpcReplyPort<Result<KeyOutcome, EditorError>>,
    },
    LinkAt {
        pos: usize,
        reply: RpcReplyPort<Option<LinkInfo>>,
    },
    SetLink {
        href: String,
        open_in_new_tab: bool,
        reply: RpcReplyPort<Result<EditorSnapshot, EditorError>>,
    },
    UnsetLink {
        reply: RpcReplyPort<Result<EditorSnapshot, EditorError>>,
    },
}

/// Result of a key message: which action the chord resolved to (if any) and
/// the session state after applying it.
#[derive(Debug, Clone)]
pub struct KeyOutcome {
    pub action: Option<PopoverAction>,
    pub snapshot: EditorSnapshot,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum EditorError {
    #[error("{0}")]
    Validation(String),

    #[error("A submission is already in flight")]
    SubmissionInFlight,

    #[error("A suggestion is awaiting accept or reject")]
    DecisionPending,

    #[error("The popover is not open")]
    PopoverClosed,

    #[error("The submission was superseded before it resolved")]
    Superseded,

    #[error("Edit service failed: {0}")]
    EditService(String),
}

impl From<DocumentError> for EditorError {
    fn from(e: DocumentError) -> Self {
        EditorError::Validation(e.to_string())
    }
}

impl From<EditServiceError> for EditorError {
    fn from(e: EditServiceError) -> Self {
        EditorError::EditService(e.to_string())
    }
}
