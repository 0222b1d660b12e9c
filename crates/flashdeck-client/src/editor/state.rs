//! Editor state slices.
//!
//! # Design
//! - Each card keeps its last server copy next to the local draft.
//! - A card is dirty only while the draft differs from that copy.

use std::fmt::{self, Display, Formatter};

use flashdeck_api_models::{Card, CardPayload, CardSet, Id};

use crate::forms::SetDraft;

/// Save indicator shown in the editor header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveStatus {
    /// Nothing in flight.
    #[default]
    Idle,
    /// A save is running.
    Saving,
    /// The last save succeeded.
    Saved,
}

impl SaveStatus {
    /// Label for the header badge.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Saving => "saving",
            Self::Saved => "saved",
        }
    }
}

impl Display for SaveStatus {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// A card with its unsaved edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardEntry {
    /// Last copy confirmed by the server.
    pub card: Card,
    /// Values currently shown in the editor.
    pub draft: CardPayload,
}

impl CardEntry {
    /// Entry with no local edits.
    #[must_use]
    pub fn new(card: Card) -> Self {
        let draft = CardPayload::from(&card);
        Self { card, draft }
    }

    /// Whether the draft differs from the server copy.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.draft != CardPayload::from(&self.card)
    }

    /// Card as displayed: server identity and order with draft values.
    #[must_use]
    pub fn display(&self) -> Card {
        Card {
            term: self.draft.term.clone(),
            definition: self.draft.definition.clone(),
            example: self.draft.example.clone(),
            translation: self.draft.translation.clone(),
            ..self.card.clone()
        }
    }
}

/// Everything the editor page shows.
#[derive(Debug, Clone)]
pub(crate) struct EditorState {
    pub(crate) set: CardSet,
    pub(crate) details: SetDraft,
    pub(crate) cards: Vec<CardEntry>,
}

impl EditorState {
    pub(crate) fn new(set: CardSet, cards: Vec<Card>) -> Self {
        let details = SetDraft::from(&set);
        let mut cards: Vec<CardEntry> = cards.into_iter().map(CardEntry::new).collect();
        cards.sort_by_key(|entry| entry.card.order);
        Self {
            set,
            details,
            cards,
        }
    }

    pub(crate) fn entry_mut(&mut self, card_id: Id) -> Option<&mut CardEntry> {
        self.cards.iter_mut().find(|entry| entry.card.id == card_id)
    }

    pub(crate) fn card_ids(&self) -> Vec<Id> {
        self.cards.iter().map(|entry| entry.card.id).collect()
    }

    /// Rewrite `order` to match list positions.
    pub(crate) fn renumber(&mut self) {
        for (index, entry) in self.cards.iter_mut().enumerate() {
            entry.card.order = u32::try_from(index).unwrap_or(u32::MAX);
        }
    }
}

/// Move the element at `from` so it ends up at index `to`, shifting the rest.
///
/// Returns `false` and leaves `items` untouched when either index is out of range.
pub fn move_item<T>(items: &mut Vec<T>, from: usize, to: usize) -> bool {
    if from >= items.len() || to >= items.len() {
        return false;
    }
    let item = items.remove(from);
    items.insert(to, item);
    true
}
