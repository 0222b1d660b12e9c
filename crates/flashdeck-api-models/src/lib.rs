#![forbid(unsafe_code)]
#![warn(
    unused,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    rustdoc::broken_intra_doc_links,
    missing_docs
)]
//! Shared HTTP DTOs for the Flashdeck REST API.
//!
//! These types are used by the client for request/response encoding so the
//! contract with the server lives in one place. Response types are lenient about
//! optional server fields; request payloads serialise exactly what the server
//! accepts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

mod timestamp;

/// Server-assigned identifier for folders, sets, cards, tags, and users.
pub type Id = i64;

/// Access token returned by `/auth/login` and `/auth/refresh`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Token {
    /// Opaque bearer token.
    pub access_token: String,
    /// Token scheme reported by the server (always `bearer` today).
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Registration payload for `POST /users/`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserCreate {
    /// Account email address.
    pub email: String,
    /// Plain-text password; hashed server-side.
    pub password: String,
}

/// User record returned after registration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// User identifier.
    pub id: Id,
    /// Account email address.
    pub email: String,
    /// Whether the account is active.
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Account creation time.
    #[serde(default, with = "timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
}

const fn default_true() -> bool {
    true
}

/// Folder summary as listed in the library.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Folder {
    /// Folder identifier.
    pub id: Id,
    /// Display name.
    pub name: String,
    /// Whether other users may see the folder.
    #[serde(default)]
    pub is_public: bool,
    /// Number of card sets the folder owns.
    #[serde(default)]
    pub set_count: u32,
    /// Owning user, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<Id>,
    /// Creation time, when reported.
    #[serde(
        default,
        with = "timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

/// Create/update payload for folders.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FolderPayload {
    /// Display name.
    pub name: String,
    /// Visibility flag.
    pub is_public: bool,
}

/// Tag attached to a card set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Tag {
    /// Tag identifier.
    pub id: Id,
    /// Tag label.
    pub name: String,
}

/// Card set as returned by the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CardSet {
    /// Set identifier.
    pub id: Id,
    /// Display name.
    pub name: String,
    /// Optional free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Visibility flag.
    #[serde(default)]
    pub is_public: bool,
    /// Owning user.
    pub owner_id: Id,
    /// Folder that owns the set.
    pub folder_id: Id,
    /// Creation time.
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    /// Tags in server order.
    #[serde(default)]
    pub tags: Vec<Tag>,
    /// Number of cards in the set, when reported.
    #[serde(default)]
    pub card_count: u32,
}

impl CardSet {
    /// Render the set's tags as the comma-separated string used by edit forms.
    #[must_use]
    pub fn tags_text(&self) -> String {
        join_tags(&self.tags)
    }
}

/// Create/update payload for card sets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SetPayload {
    /// Display name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Visibility flag.
    pub is_public: bool,
    /// Tag names; the server normalises case and whitespace.
    pub tags: Vec<String>,
}

/// A single flashcard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Card {
    /// Card identifier.
    pub id: Id,
    /// Front side.
    pub term: String,
    /// Back side.
    pub definition: String,
    /// Optional usage example.
    #[serde(default)]
    pub example: Option<String>,
    /// Optional translation.
    #[serde(default)]
    pub translation: Option<String>,
    /// Position within the set.
    #[serde(default)]
    pub order: u32,
    /// Owning set.
    pub set_id: Id,
}

/// Create/update payload for cards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct CardPayload {
    /// Front side.
    pub term: String,
    /// Back side.
    pub definition: String,
    /// Optional usage example.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    /// Optional translation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
}

impl From<&Card> for CardPayload {
    fn from(card: &Card) -> Self {
        Self {
            term: card.term.clone(),
            definition: card.definition.clone(),
            example: card.example.clone(),
            translation: card.translation.clone(),
        }
    }
}

/// Payload for `POST /folders/{id}/sets/{set_id}/reorder`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReorderRequest {
    /// Every card id of the set in the desired order.
    pub card_ids: Vec<Id>,
}

/// Error body emitted by the server on non-2xx responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ErrorBody {
    /// Either a message or a list of validation issues.
    #[serde(default)]
    pub detail: Option<ErrorDetail>,
}

impl ErrorBody {
    /// Flatten the detail into a single human-readable line.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        match self.detail.as_ref()? {
            ErrorDetail::Message(message) => Some(message.clone()),
            ErrorDetail::Validation(issues) => {
                let parts: Vec<String> = issues.iter().map(ValidationIssue::describe).collect();
                (!parts.is_empty()).then(|| parts.join("; "))
            }
        }
    }
}

/// Shape of the `detail` field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ErrorDetail {
    /// Plain message (`{"detail": "Folder not found"}`).
    Message(String),
    /// Request validation failures.
    Validation(Vec<ValidationIssue>),
}

/// One request validation failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Path to the offending field.
    #[serde(default)]
    pub loc: Vec<LocSegment>,
    /// Failure description.
    pub msg: String,
}

impl ValidationIssue {
    fn describe(&self) -> String {
        let path: Vec<String> = self
            .loc
            .iter()
            .map(|segment| match segment {
                LocSegment::Key(key) => key.clone(),
                LocSegment::Index(index) => index.to_string(),
            })
            .collect();
        if path.is_empty() {
            self.msg.clone()
        } else {
            format!("{}: {}", path.join("."), self.msg)
        }
    }
}

/// Segment of a validation location path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum LocSegment {
    /// Object key.
    Key(String),
    /// Array index.
    Index(u64),
}

/// Split a comma-separated tag string into trimmed, non-empty names.
#[must_use]
pub fn split_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// Join tags into the comma-separated form used by edit forms.
#[must_use]
pub fn join_tags(tags: &[Tag]) -> String {
    tags.iter()
        .map(|tag| tag.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
