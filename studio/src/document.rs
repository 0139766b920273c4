//! Char-indexed document model for editor sessions.
//!
//! All positions are char offsets (not bytes), matching the wire contract in
//! `shared_types::TextRange`. Marks are presentational overlays; the decision
//! marks (`PendingRemoval` / `PendingSuggestion`) are the reversible rendering
//! of an unresolved suggestion, while `Link` marks are ordinary formatting.

use shared_types::{LinkInfo, Mark, MarkKind, PendingChange, TextRange};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error("range {from}..{to} is out of bounds for a document of {len} chars")]
    OutOfBounds { from: usize, to: usize, len: usize },

    #[error("range is inverted: {from} > {to}")]
    Inverted { from: usize, to: usize },

    #[error("cannot apply a link to an empty selection outside a link")]
    EmptyLinkSelection,
}

/// One editor session's document: text plus marks.
///
/// Content is stored as chars so range arithmetic never lands inside a UTF-8
/// sequence. Documents are small (one editing surface), so the extra width is
/// irrelevant next to getting offsets right.
#[derive(Debug, Clone, Default)]
pub struct Document {
    chars: Vec<char>,
    marks: Vec<Mark>,
}

impl Document {
    pub fn new(content: &str) -> Self {
        Self {
            chars: content.chars().collect(),
            marks: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn content(&self) -> String {
        self.chars.iter().collect()
    }

    pub fn marks(&self) -> &[Mark] {
        &self.marks
    }

    /// Text under `range`. Caller must have validated the range.
    pub fn slice(&self, range: TextRange) -> String {
        let from = range.from.min(self.chars.len());
        let to = range.to.min(self.chars.len());
        self.chars[from..to].iter().collect()
    }

    /// Validate an API-supplied range against the current document.
    pub fn check_range(&self, range: TextRange) -> Result<(), DocumentError> {
        if range.from > range.to {
            return Err(DocumentError::Inverted {
                from: range.from,
                to: range.to,
            });
        }
        if range.to > self.chars.len() {
            return Err(DocumentError::OutOfBounds {
                from: range.from,
                to: range.to,
                len: self.chars.len(),
            });
        }
        Ok(())
    }

    /// Content with pending-suggestion spans removed. Equals `content()` when
    /// no suggestion is displayed.
    pub fn committed_content(&self) -> String {
        let suggested: Vec<TextRange> = self
            .marks
            .iter()
            .filter(|m| m.kind == MarkKind::PendingSuggestion)
            .map(|m| m.range)
            .collect();
        if suggested.is_empty() {
            return self.content();
        }
        self.chars
            .iter()
            .enumerate()
            .filter(|(i, _)| !suggested.iter().any(|r| r.contains(*i)))
            .map(|(_, c)| c)
            .collect()
    }

    // ── Mutations ──

    /// Insert `text` at `pos` (clamped to the document end), shifting marks.
    ///
    /// Marks starting at or after the insertion point move right; marks
    /// strictly containing the point grow. A mark ending exactly at the point
    /// is left alone, so text typed at a link boundary is not linked.
    pub fn insert(&mut self, pos: usize, text: &str) {
        let pos = pos.min(self.chars.len());
        let inserted: Vec<char> = text.chars().collect();
        let n = inserted.len();
        if n == 0 {
            return;
        }
        self.chars.splice(pos..pos, inserted);

        for mark in &mut self.marks {
            if mark.range.from >= pos {
                mark.range.from += n;
                mark.range.to += n;
            } else if mark.range.to > pos {
                mark.range.to += n;
            }
        }
    }

    /// Delete `range` (clamped), shifting, truncating, or dropping marks by
    /// overlap.
    pub fn delete(&mut self, range: TextRange) {
        let from = range.from.min(self.chars.len());
        let to = range.to.min(self.chars.len());
        if from >= to {
            return;
        }
        self.chars.drain(from..to);

        let n = to - from;
        let map = |p: usize| {
            if p <= from {
                p
            } else if p >= to {
                p - n
            } else {
                from
            }
        };
        self.marks.retain_mut(|mark| {
            mark.range.from = map(mark.range.from);
            mark.range.to = map(mark.range.to);
            mark.range.from < mark.range.to
        });
    }

    // ── Suggestion overlay ──

    /// Render a suggested replacement for `selection` as a tracked change.
    ///
    /// The original text stays in place marked `PendingRemoval`; the
    /// suggestion is inserted immediately after it marked `PendingSuggestion`.
    /// Committed content is untouched until the change is accepted. Empty
    /// selections (pure insertion) and empty suggestions (pure deletion
    /// proposal) are both legal; the corresponding empty-range mark is
    /// omitted.
    pub fn begin_suggestion(
        &mut self,
        selection: TextRange,
        suggested: &str,
    ) -> Result<PendingChange, DocumentError> {
        self.check_range(selection)?;

        let suggested_len = suggested.chars().count();
        self.insert(selection.to, suggested);

        let original_range = selection;
        let suggested_range = TextRange::new(selection.to, selection.to + suggested_len);

        if !original_range.is_empty() {
            self.marks.push(Mark {
                range: original_range,
                kind: MarkKind::PendingRemoval,
            });
        }
        if !suggested_range.is_empty() {
            self.marks.push(Mark {
                range: suggested_range,
                kind: MarkKind::PendingSuggestion,
            });
        }

        Ok(PendingChange {
            original_range,
            suggested_range,
        })
    }

    /// Finalize a pending change: the original span is removed and the
    /// suggested text becomes committed content.
    pub fn accept_suggestion(&mut self, pending: PendingChange) {
        self.marks.retain(|m| !m.kind.is_decision());
        self.delete(pending.original_range);
    }

    /// Revert a pending change: the suggested span is removed and the
    /// document equals its pre-submission content.
    pub fn reject_suggestion(&mut self, pending: PendingChange) {
        self.marks.retain(|m| !m.kind.is_decision());
        self.delete(pending.suggested_range);
    }

    // ── Links ──

    /// The link mark covering `pos`, if any.
    pub fn link_at(&self, pos: usize) -> Option<LinkInfo> {
        self.marks.iter().find_map(|m| match &m.kind {
            MarkKind::Link {
                href,
                open_in_new_tab,
            } if m.range.contains(pos) => Some(LinkInfo {
                range: m.range,
                href: href.clone(),
                open_in_new_tab: *open_in_new_tab,
            }),
            _ => None,
        })
    }

    /// Grow `selection` to cover every link mark it touches (overlap or
    /// shared endpoint), to a fixpoint. An empty selection extends to the
    /// link under the caret.
    fn extended_link_range(&self, selection: TextRange) -> TextRange {
        let mut extent = selection;
        if extent.is_empty() {
            if let Some(link) = self.link_at(extent.from) {
                extent = link.range;
            } else {
                return extent;
            }
        }
        loop {
            let grown = self
                .marks
                .iter()
                .filter(|m| matches!(m.kind, MarkKind::Link { .. }))
                .filter(|m| m.range.touches(&extent))
                .fold(extent, |acc, m| {
                    TextRange::new(acc.from.min(m.range.from), acc.to.max(m.range.to))
                });
            if grown == extent {
                return extent;
            }
            extent = grown;
        }
    }

    /// Apply a link over the selection, replacing any links it touches across
    /// their merged extent. Returns the linked range.
    pub fn set_link(
        &mut self,
        selection: TextRange,
        href: &str,
        open_in_new_tab: bool,
    ) -> Result<TextRange, DocumentError> {
        self.check_range(selection)?;
        if selection.is_empty() && self.link_at(selection.from).is_none() {
            return Err(DocumentError::EmptyLinkSelection);
        }

        let extent = self.extended_link_range(selection);
        self.remove_links_within(extent);
        self.marks.push(Mark {
            range: extent,
            kind: MarkKind::Link {
                href: href.to_string(),
                open_in_new_tab,
            },
        });
        Ok(extent)
    }

    /// Remove links across the extended selection. Returns the cleared range.
    pub fn unset_link(&mut self, selection: TextRange) -> Result<TextRange, DocumentError> {
        self.check_range(selection)?;
        if selection.is_empty() && self.link_at(selection.from).is_none() {
            return Err(DocumentError::EmptyLinkSelection);
        }

        let extent = self.extended_link_range(selection);
        self.remove_links_within(extent);
        Ok(extent)
    }

    fn remove_links_within(&mut self, extent: TextRange) {
        self.marks.retain(|m| {
            !(matches!(m.kind, MarkKind::Link { .. }) && m.range.touches(&extent))
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link_mark(from: usize, to: usize, href: &str) -> Mark {
        Mark {
            range: TextRange::new(from, to),
            kind: MarkKind::Link {
                href: href.to_string(),
                open_in_new_tab: false,
            },
        }
    }

    // ===== Insert / delete mark maintenance =====

    #[test]
    fn insert_shifts_marks_after_point() {
        let mut doc = Document::new("hello world");
        doc.marks.push(link_mark(6, 11, "https://a.example"));

        doc.insert(0, ">> ");
        assert_eq!(doc.content(), ">> hello world");
        assert_eq!(doc.marks()[0].range, TextRange::new(9, 14));
    }

    #[test]
    fn insert_inside_mark_grows_it() {
        let mut doc = Document::new("hello world");
        doc.marks.push(link_mark(0, 5, "https://a.example"));

        doc.insert(2, "XY");
        assert_eq!(doc.content(), "heXYllo world");
        assert_eq!(doc.marks()[0].range, TextRange::new(0, 7));
    }

    #[test]
    fn insert_at_mark_end_leaves_it_alone() {
        let mut doc = Document::new("hello world");
        doc.marks.push(link_mark(0, 5, "https://a.example"));

        doc.insert(5, "!!");
        assert_eq!(doc.content(), "hello!! world");
        assert_eq!(doc.marks()[0].range, TextRange::new(0, 5));
    }

    #[test]
    fn delete_truncates_overlapping_mark() {
        let mut doc = Document::new("hello world");
        doc.marks.push(link_mark(3, 8, "https://a.example"));

        doc.delete(TextRange::new(5, 11));
        assert_eq!(doc.content(), "hello");
        assert_eq!(doc.marks()[0].range, TextRange::new(3, 5));
    }

    #[test]
    fn delete_drops_fully_covered_mark() {
        let mut doc = Document::new("hello world");
        doc.marks.push(link_mark(2, 4, "https://a.example"));

        doc.delete(TextRange::new(0, 6));
        assert_eq!(doc.content(), "world");
        assert!(doc.marks().is_empty());
    }

    #[test]
    fn delete_shifts_marks_after_range() {
        let mut doc = Document::new("hello world");
        doc.marks.push(link_mark(6, 11, "https://a.example"));

        doc.delete(TextRange::new(0, 3));
        assert_eq!(doc.content(), "lo world");
        assert_eq!(doc.marks()[0].range, TextRange::new(3, 8));
    }

    // ===== Suggestion lifecycle =====

    #[test]
    fn begin_suggestion_inserts_after_selection() {
        let mut doc = Document::new("make this better now");
        let pending = doc
            .begin_suggestion(TextRange::new(5, 9), "that")
            .unwrap();

        assert_eq!(doc.content(), "make thisthat better now");
        assert_eq!(pending.original_range, TextRange::new(5, 9));
        assert_eq!(pending.suggested_range, TextRange::new(9, 13));
        assert!(!pending.original_range.overlaps(&pending.suggested_range));

        let kinds: Vec<&MarkKind> = doc.marks().iter().map(|m| &m.kind).collect();
        assert_eq!(
            kinds,
            vec![&MarkKind::PendingRemoval, &MarkKind::PendingSuggestion]
        );
    }

    #[test]
    fn committed_content_excludes_suggested_span() {
        let mut doc = Document::new("make this better");
        let before = doc.content();
        doc.begin_suggestion(TextRange::new(5, 9), "that").unwrap();

        assert_eq!(doc.committed_content(), before);
        assert_ne!(doc.content(), before);
    }

    #[test]
    fn accept_keeps_suggested_text_only() {
        let mut doc = Document::new("make this better");
        let pending = doc.begin_suggestion(TextRange::new(5, 9), "that").unwrap();

        doc.accept_suggestion(pending);
        assert_eq!(doc.content(), "make that better");
        assert_eq!(doc.committed_content(), "make that better");
        assert!(doc.marks().is_empty());
    }

    #[test]
    fn reject_restores_original_content() {
        let mut doc = Document::new("make this better");
        let before = doc.content();
        let pending = doc.begin_suggestion(TextRange::new(5, 9), "that").unwrap();

        doc.reject_suggestion(pending);
        assert_eq!(doc.content(), before);
        assert!(doc.marks().is_empty());
    }

    #[test]
    fn empty_selection_is_pure_insertion() {
        let mut doc = Document::new("hello world");
        let pending = doc
            .begin_suggestion(TextRange::caret(5), ", dear")
            .unwrap();

        assert!(pending.original_range.is_empty());
        assert_eq!(pending.suggested_range, TextRange::new(5, 11));
        // no removal mark for an empty original span
        assert_eq!(doc.marks().len(), 1);
        assert_eq!(doc.marks()[0].kind, MarkKind::PendingSuggestion);

        doc.accept_suggestion(pending);
        assert_eq!(doc.content(), "hello, dear world");
    }

    #[test]
    fn empty_suggestion_is_pure_deletion_proposal() {
        let mut doc = Document::new("hello cruel world");
        let pending = doc
            .begin_suggestion(TextRange::new(5, 11), "")
            .unwrap();

        assert!(pending.suggested_range.is_empty());
        assert_eq!(doc.marks().len(), 1);
        assert_eq!(doc.marks()[0].kind, MarkKind::PendingRemoval);
        assert_eq!(doc.content(), "hello cruel world");

        doc.accept_suggestion(pending);
        assert_eq!(doc.content(), "hello world");
    }

    #[test]
    fn suggestion_offsets_are_char_based() {
        let mut doc = Document::new("héllo wörld");
        let pending = doc.begin_suggestion(TextRange::new(6, 11), "mönde").unwrap();

        assert_eq!(doc.slice(pending.original_range), "wörld");
        assert_eq!(doc.slice(pending.suggested_range), "mönde");

        doc.accept_suggestion(pending);
        assert_eq!(doc.content(), "héllo mönde");
    }

    #[test]
    fn begin_suggestion_rejects_out_of_bounds_selection() {
        let mut doc = Document::new("short");
        let err = doc
            .begin_suggestion(TextRange::new(2, 99), "text")
            .unwrap_err();
        assert!(matches!(err, DocumentError::OutOfBounds { .. }));

        let err = doc
            .begin_suggestion(TextRange::new(4, 2), "text")
            .unwrap_err();
        assert!(matches!(err, DocumentError::Inverted { .. }));
    }

    #[test]
    fn suggestion_preserves_links_outside_selection() {
        let mut doc = Document::new("see the docs for details");
        doc.set_link(TextRange::new(8, 12), "https://docs.example", false)
            .unwrap();

        let pending = doc.begin_suggestion(TextRange::new(0, 3), "read").unwrap();
        doc.accept_suggestion(pending);

        assert_eq!(doc.content(), "read the docs for details");
        let link = doc.link_at(9).unwrap();
        assert_eq!(doc.slice(link.range), "docs");
    }

    // ===== Links =====

    #[test]
    fn set_and_read_link() {
        let mut doc = Document::new("visit the site today");
        let range = doc
            .set_link(TextRange::new(6, 14), "https://site.example", true)
            .unwrap();
        assert_eq!(range, TextRange::new(6, 14));

        let link = doc.link_at(7).unwrap();
        assert_eq!(link.href, "https://site.example");
        assert!(link.open_in_new_tab);
        assert!(doc.link_at(14).is_none());
    }

    #[test]
    fn set_link_over_touching_link_replaces_merged_extent() {
        let mut doc = Document::new("alpha beta gamma");
        doc.set_link(TextRange::new(0, 5), "https://old.example", false)
            .unwrap();

        let range = doc
            .set_link(TextRange::new(3, 10), "https://new.example", false)
            .unwrap();
        assert_eq!(range, TextRange::new(0, 10));

        let links: Vec<&Mark> = doc
            .marks()
            .iter()
            .filter(|m| matches!(m.kind, MarkKind::Link { .. }))
            .collect();
        assert_eq!(links.len(), 1);
        assert_eq!(
            links[0].kind,
            MarkKind::Link {
                href: "https://new.example".to_string(),
                open_in_new_tab: false,
            }
        );
    }

    #[test]
    fn set_link_adjacent_to_existing_link_merges_extents() {
        let mut doc = Document::new("alpha beta gamma");
        doc.set_link(TextRange::new(0, 5), "https://old.example", false)
            .unwrap();

        // Shares only the endpoint at 5, no overlapping chars.
        let range = doc
            .set_link(TextRange::new(5, 10), "https://new.example", false)
            .unwrap();
        assert_eq!(range, TextRange::new(0, 10));

        let links: Vec<&Mark> = doc
            .marks()
            .iter()
            .filter(|m| matches!(m.kind, MarkKind::Link { .. }))
            .collect();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].range, TextRange::new(0, 10));
        assert_eq!(
            links[0].kind,
            MarkKind::Link {
                href: "https://new.example".to_string(),
                open_in_new_tab: false,
            }
        );
    }

    #[test]
    fn caret_set_link_retargets_whole_link() {
        let mut doc = Document::new("alpha beta gamma");
        doc.set_link(TextRange::new(0, 5), "https://old.example", false)
            .unwrap();

        let range = doc
            .set_link(TextRange::caret(2), "https://new.example", false)
            .unwrap();
        assert_eq!(range, TextRange::new(0, 5));
        assert_eq!(doc.link_at(0).unwrap().href, "https://new.example");
    }

    #[test]
    fn unset_link_from_caret_inside() {
        let mut doc = Document::new("alpha beta gamma");
        doc.set_link(TextRange::new(6, 10), "https://a.example", false)
            .unwrap();

        let cleared = doc.unset_link(TextRange::caret(8)).unwrap();
        assert_eq!(cleared, TextRange::new(6, 10));
        assert!(doc.link_at(8).is_none());
        assert!(doc.marks().is_empty());
    }

    #[test]
    fn empty_selection_outside_link_is_rejected() {
        let mut doc = Document::new("no links here");
        let err = doc
            .set_link(TextRange::caret(3), "https://a.example", false)
            .unwrap_err();
        assert_eq!(err, DocumentError::EmptyLinkSelection);

        let err = doc.unset_link(TextRange::caret(3)).unwrap_err();
        assert_eq!(err, DocumentError::EmptyLinkSelection);
    }
}
