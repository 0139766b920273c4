//! Server-side keyboard resolution for the inline-edit popover.
//!
//! Key events arrive as session-scoped messages and are resolved against the
//! popover's current state, so there is no global listener to leak when a
//! session ends. Chords that fail their gate resolve to no action.

use shared_types::{KeyChord, SubmissionState};

/// Action a key chord resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopoverAction {
    Toggle,
    Close,
    Accept,
    Reject,
    Submit,
}

impl PopoverAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Toggle => "toggle",
            Self::Close => "close",
            Self::Accept => "accept",
            Self::Reject => "reject",
            Self::Submit => "submit",
        }
    }
}

/// Resolve one key event against the popover state.
///
/// - Cmd/Ctrl+K toggles in any state.
/// - Escape closes an open popover.
/// - Cmd/Ctrl+Enter accepts and Cmd/Ctrl+Backspace rejects, only while a
///   suggestion awaits a decision.
/// - Enter without Shift submits the drafted instruction, only while the
///   popover is open and idle.
pub fn resolve(
    chord: &KeyChord,
    open: bool,
    submission: SubmissionState,
) -> Option<PopoverAction> {
    if chord.primary_modifier() && chord.key.eq_ignore_ascii_case("k") {
        return Some(PopoverAction::Toggle);
    }

    if !open {
        return None;
    }

    match chord.key.as_str() {
        "Escape" => Some(PopoverAction::Close),
        "Enter" if chord.primary_modifier() => {
            (submission == SubmissionState::Submitted).then_some(PopoverAction::Accept)
        }
        "Backspace" if chord.primary_modifier() => {
            (submission == SubmissionState::Submitted).then_some(PopoverAction::Reject)
        }
        "Enter" if !chord.shift => {
            (submission == SubmissionState::Idle).then_some(PopoverAction::Submit)
        }
        _ => None,
    }
}
