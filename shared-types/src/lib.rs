//! Shared types between the gateway and the studio backend
//!
//! These types are used by both:
//! - studio editor-session actors (native Rust)
//! - gateway proxy/auth plumbing and any HTTP client of the editor API
//!
//! Serializable with serde for JSON over HTTP

use serde::{Deserialize, Serialize};

// ============================================================================
// Text Ranges
// ============================================================================

/// Half-open range of char indices into a document, `from <= to`.
///
/// All positions in the editor API are char offsets, not byte offsets, so
/// multi-byte text behaves the same on both sides of the wire.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TextRange {
    pub from: usize,
    pub to: usize,
}

impl TextRange {
    pub fn new(from: usize, to: usize) -> Self {
        Self { from, to }
    }

    /// Empty range at a single position.
    pub fn caret(pos: usize) -> Self {
        Self { from: pos, to: pos }
    }

    pub fn len(&self) -> usize {
        self.to - self.from
    }

    pub fn is_empty(&self) -> bool {
        self.from == self.to
    }

    /// Whether `pos` falls inside the range (half-open).
    pub fn contains(&self, pos: usize) -> bool {
        pos >= self.from && pos < self.to
    }

    /// Whether two ranges share at least one position.
    pub fn overlaps(&self, other: &TextRange) -> bool {
        self.from < other.to && other.from < self.to
    }

    /// Whether `other` touches this range (overlap or shared endpoint).
    pub fn touches(&self, other: &TextRange) -> bool {
        self.from <= other.to && other.from <= self.to
    }
}

// ============================================================================
// Marks
// ============================================================================

/// Presentational annotation over a span of document text.
///
/// Decision marks (`PendingRemoval`, `PendingSuggestion`) exist only while a
/// suggestion awaits accept/reject. `Link` marks are ordinary persistent
/// formatting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MarkKind {
    /// Original span proposed for removal, rendered struck-through.
    PendingRemoval,
    /// Suggested replacement span, rendered highlighted. Not part of
    /// committed content until accepted.
    PendingSuggestion,
    /// Hyperlink over the span.
    Link {
        href: String,
        open_in_new_tab: bool,
    },
}

impl MarkKind {
    /// Decision marks are the reversible overlay of an unresolved suggestion.
    pub fn is_decision(&self) -> bool {
        matches!(self, MarkKind::PendingRemoval | MarkKind::PendingSuggestion)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Mark {
    pub range: TextRange,
    pub kind: MarkKind,
}

/// Link found at a document position.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LinkInfo {
    pub range: TextRange,
    pub href: String,
    pub open_in_new_tab: bool,
}

// ============================================================================
// Popover Workflow
// ============================================================================

/// Lifecycle of one inline-edit submission.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionState {
    Idle,
    Submitting,
    Submitted,
}

/// A rendered suggestion awaiting accept/reject.
///
/// The two ranges are disjoint: the suggested text is inserted immediately
/// after the original span. Present iff the popover is in `Submitted` state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingChange {
    pub original_range: TextRange,
    pub suggested_range: TextRange,
}

/// Wire view of the inline-edit popover.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PopoverSnapshot {
    pub open: bool,
    pub submission: SubmissionState,
    pub pending: Option<PendingChange>,
    /// User-visible message from the last failed submission, cleared on the
    /// next submit or popover close.
    pub last_error: Option<String>,
}

// ============================================================================
// Editor Snapshot
// ============================================================================

/// Full wire view of one editor session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EditorSnapshot {
    pub session_id: String,

    /// Raw document text, including any not-yet-accepted suggested span.
    pub content: String,

    /// Document text minus pending-suggestion spans. Equals `content` when
    /// no suggestion is displayed.
    pub committed_content: String,

    pub selection: TextRange,
    pub marks: Vec<Mark>,
    pub popover: PopoverSnapshot,

    /// Monotonic per-session mutation counter.
    pub revision: u64,
}

// ============================================================================
// Keyboard Input
// ============================================================================

/// One key event as reported by the editor client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyChord {
    /// Logical key name: "k", "Enter", "Escape", "Backspace", ...
    pub key: String,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub meta: bool,
    #[serde(default)]
    pub shift: bool,
}

impl KeyChord {
    /// Cmd on macOS, Ctrl elsewhere.
    pub fn primary_modifier(&self) -> bool {
        self.ctrl || self.meta
    }
}

// ============================================================================
// Edit Service Wire Types
// ============================================================================

/// Request body for the remote inline-edit service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InlineEditRequest {
    /// Full committed document text.
    pub context: String,
    /// Text under the selection at submission time.
    pub selection: String,
    /// The user's edit instruction.
    pub edit: String,
}

/// Response body from the remote inline-edit service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InlineEditResponse {
    /// Suggested replacement for the selection. May be empty (pure deletion).
    pub edit: String,
}

// ============================================================================
// Constants
// ============================================================================

/// Identity headers injected by the gateway on proxied requests. The studio
/// trusts these because the gateway strips them from inbound traffic first.
pub const USER_ID_HEADER: &str = "x-draftroom-user-id";
pub const PROXY_AUTH_HEADER: &str = "x-draftroom-proxy-authenticated";

// ============================================================================
// Tests
// ============================================================================
