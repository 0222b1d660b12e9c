//! Flashcard editor page controller.
//!
//! # Design
//! - Opening waits for session hydration; no token redirects to login.
//! - Card edits autosave per card after a quiet period; see `autosave.rs`.
//! - Reorders apply locally first and are then submitted whole. Failures are not
//!   rolled back.
//! - One tri-state [`SaveStatus`] covers set saves, autosaves, and reorders.

mod autosave;
mod state;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use flashdeck_api_models::{Card, CardPayload, CardSet, Id};
use flashdeck_config::ClientConfig;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};

pub use state::{CardEntry, SaveStatus, move_item};

use crate::editor::autosave::Autosaver;
use crate::editor::state::EditorState;
use crate::error::ApiError;
use crate::forms::{FormError, SetDraft};
use crate::http::ApiClient;
use crate::navigation::Route;

/// Message shown when the set or its cards cannot be loaded.
pub const LOAD_FAILED_MESSAGE: &str =
    "Failed to load card set. You may not have permission to view it.";

/// Term given to cards created from the editor.
pub const NEW_CARD_TERM: &str = "New Term";
/// Definition given to cards created from the editor.
pub const NEW_CARD_DEFINITION: &str = "New Definition";

/// Failures surfaced by the editor page.
#[derive(Debug, Error, PartialEq)]
pub enum EditorError {
    /// No session after hydration; the navigator was sent to login.
    #[error("log in to edit card sets")]
    LoginRequired,
    /// The set or its cards could not be fetched.
    #[error("Failed to load card set. You may not have permission to view it.")]
    Load {
        /// Underlying request failure.
        #[source]
        source: ApiError,
    },
    /// No card with this id is loaded.
    #[error("card {0} is not part of this set")]
    UnknownCard(Id),
    /// A move index was out of range.
    #[error("cannot move card from position {from} to {to} in a set of {len}")]
    InvalidMove {
        /// Source index.
        from: usize,
        /// Target index.
        to: usize,
        /// Number of cards.
        len: usize,
    },
    /// Set details failed validation.
    #[error(transparent)]
    Form(#[from] FormError),
    /// A mutation failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Result alias for editor operations.
pub type EditorResult<T> = Result<T, EditorError>;

/// Editor for one card set.
#[derive(Debug)]
pub struct EditorPage {
    client: ApiClient,
    set_id: Id,
    state: Arc<Mutex<EditorState>>,
    status: Arc<watch::Sender<SaveStatus>>,
    autosave: Autosaver,
}

impl EditorPage {
    /// Open the editor for `set_id`, loading the set and all of its cards.
    ///
    /// # Errors
    ///
    /// [`EditorError::LoginRequired`] after redirecting when no session exists, or
    /// [`EditorError::Load`] when the set or its cards cannot be fetched.
    pub async fn open(
        client: ApiClient,
        set_id: Id,
        autosave_delay: Duration,
    ) -> EditorResult<Self> {
        client.auth().hydrate().await;
        if !client.auth().is_authenticated() {
            client.navigator().navigate(Route::Login);
            return Err(EditorError::LoginRequired);
        }

        let set = client.get_set(set_id).await.map_err(load_failed)?;
        let cards = client.list_all_cards(set_id).await.map_err(load_failed)?;
        info!(set_id, cards = cards.len(), "editor opened");

        let state = Arc::new(Mutex::new(EditorState::new(set, cards)));
        let (status, _) = watch::channel(SaveStatus::Idle);
        let status = Arc::new(status);
        let autosave = Autosaver::new(
            client.clone(),
            Arc::clone(&state),
            Arc::clone(&status),
            autosave_delay,
        );
        Ok(Self {
            client,
            set_id,
            state,
            status,
            autosave,
        })
    }

    /// Open with the configured autosave delay.
    ///
    /// # Errors
    ///
    /// See [`EditorPage::open`].
    pub async fn open_with_config(
        client: ApiClient,
        set_id: Id,
        config: &ClientConfig,
    ) -> EditorResult<Self> {
        Self::open(client, set_id, config.autosave_debounce).await
    }

    /// Id of the edited set.
    #[must_use]
    pub const fn set_id(&self) -> Id {
        self.set_id
    }

    /// Last saved copy of the set.
    #[must_use]
    pub fn set(&self) -> CardSet {
        self.state().set.clone()
    }

    /// Editable set details.
    #[must_use]
    pub fn details(&self) -> SetDraft {
        self.state().details.clone()
    }

    /// Cards in display order, showing unsaved edits.
    #[must_use]
    pub fn cards(&self) -> Vec<Card> {
        self.state().cards.iter().map(CardEntry::display).collect()
    }

    /// Cards with their server copies and drafts.
    #[must_use]
    pub fn entries(&self) -> Vec<CardEntry> {
        self.state().cards.clone()
    }

    /// Current save indicator.
    #[must_use]
    pub fn status(&self) -> SaveStatus {
        *self.status.borrow()
    }

    /// Observe the save indicator.
    #[must_use]
    pub fn subscribe_status(&self) -> watch::Receiver<SaveStatus> {
        self.status.subscribe()
    }

    /// Edit the set name. Saved by [`EditorPage::save`].
    pub fn set_name(&self, name: impl Into<String>) {
        self.state().details.name = name.into();
    }

    /// Edit the set description. Saved by [`EditorPage::save`].
    pub fn set_description(&self, description: impl Into<String>) {
        self.state().details.description = description.into();
    }

    /// Edit the comma-separated tags. Saved by [`EditorPage::save`].
    pub fn set_tags(&self, tags: impl Into<String>) {
        self.state().details.tags = tags.into();
    }

    /// Save name, description, and tags, keeping the set's visibility.
    ///
    /// # Errors
    ///
    /// [`EditorError::Form`] for a blank name, or [`EditorError::Api`].
    pub async fn save(&self) -> EditorResult<CardSet> {
        let payload = {
            let state = self.state();
            let mut details = state.details.clone();
            details.is_public = state.set.is_public;
            details.to_payload()?
        };
        self.status.send_replace(SaveStatus::Saving);
        match self.client.update_set(self.set_id, &payload).await {
            Ok(set) => {
                self.state().set = set.clone();
                self.status.send_replace(SaveStatus::Saved);
                Ok(set)
            }
            Err(err) => {
                warn!(set_id = self.set_id, error = %err, "failed to save set details");
                self.status.send_replace(SaveStatus::Idle);
                Err(err.into())
            }
        }
    }

    /// Replace a card's draft and restart its autosave timer.
    ///
    /// # Errors
    ///
    /// [`EditorError::UnknownCard`].
    pub fn edit_card(&self, card_id: Id, draft: CardPayload) -> EditorResult<()> {
        self.update_draft(card_id, |current| *current = draft)
    }

    /// Change a card's term and restart its autosave timer.
    ///
    /// # Errors
    ///
    /// [`EditorError::UnknownCard`].
    pub fn edit_term(&self, card_id: Id, term: impl Into<String>) -> EditorResult<()> {
        let term = term.into();
        self.update_draft(card_id, |draft| draft.term = term)
    }

    /// Change a card's definition and restart its autosave timer.
    ///
    /// # Errors
    ///
    /// [`EditorError::UnknownCard`].
    pub fn edit_definition(&self, card_id: Id, definition: impl Into<String>) -> EditorResult<()> {
        let definition = definition.into();
        self.update_draft(card_id, |draft| draft.definition = definition)
    }

    /// Move the card at `from` to position `to`, then submit the new order.
    ///
    /// The local list is updated before the request and kept if it fails.
    ///
    /// # Errors
    ///
    /// [`EditorError::InvalidMove`] without a request, or [`EditorError::Api`].
    pub async fn move_card(&self, from: usize, to: usize) -> EditorResult<Vec<Id>> {
        let card_ids = {
            let mut state = self.state();
            let len = state.cards.len();
            if !move_item(&mut state.cards, from, to) {
                return Err(EditorError::InvalidMove { from, to, len });
            }
            state.renumber();
            state.card_ids()
        };
        self.status.send_replace(SaveStatus::Saving);
        match self.client.reorder_cards(self.set_id, &card_ids).await {
            Ok(()) => {
                self.status.send_replace(SaveStatus::Saved);
                Ok(card_ids)
            }
            Err(err) => {
                warn!(set_id = self.set_id, error = %err, "failed to reorder cards");
                self.status.send_replace(SaveStatus::Idle);
                Err(err.into())
            }
        }
    }

    /// Append a placeholder card.
    ///
    /// # Errors
    ///
    /// [`EditorError::Api`].
    pub async fn add_card(&self) -> EditorResult<Card> {
        let payload = CardPayload {
            term: NEW_CARD_TERM.to_string(),
            definition: NEW_CARD_DEFINITION.to_string(),
            ..CardPayload::default()
        };
        let card = self.client.create_card(self.set_id, &payload).await?;
        self.state().cards.push(CardEntry::new(card.clone()));
        Ok(card)
    }

    /// Delete one card and forget its pending edits.
    ///
    /// # Errors
    ///
    /// [`EditorError::UnknownCard`] or [`EditorError::Api`].
    pub async fn delete_card(&self, card_id: Id) -> EditorResult<()> {
        if self.state().entry_mut(card_id).is_none() {
            return Err(EditorError::UnknownCard(card_id));
        }
        self.autosave.cancel(card_id);
        self.client.delete_card(card_id).await?;
        self.state().cards.retain(|entry| entry.card.id != card_id);
        Ok(())
    }

    /// Delete every card of the set. Callers confirm with the user first.
    ///
    /// # Errors
    ///
    /// [`EditorError::Api`]; local cards are kept when the request fails.
    pub async fn delete_all_cards(&self) -> EditorResult<()> {
        self.autosave.cancel_all();
        self.client.delete_all_cards(self.set_id).await?;
        self.state().cards.clear();
        Ok(())
    }

    /// Whether an autosave is waiting or running.
    #[must_use]
    pub fn has_pending_saves(&self) -> bool {
        self.autosave.is_pending()
    }

    /// Wait for all scheduled autosaves to finish.
    pub async fn flush(&self) {
        self.autosave.flush().await;
    }

    fn update_draft(
        &self,
        card_id: Id,
        edit: impl FnOnce(&mut CardPayload),
    ) -> EditorResult<()> {
        {
            let mut state = self.state();
            let entry = state
                .entry_mut(card_id)
                .ok_or(EditorError::UnknownCard(card_id))?;
            edit(&mut entry.draft);
        }
        self.autosave.schedule(card_id);
        Ok(())
    }

    fn state(&self) -> MutexGuard<'_, EditorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn load_failed(source: ApiError) -> EditorError {
    warn!(error = %source, "failed to load card set");
    EditorError::Load { source }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::client_for;
    use httpmock::prelude::*;
    use serde_json::{Value, json};

    const QUICK: Duration = Duration::from_millis(50);

    fn set_json() -> Value {
        json!({
            "id": 5,
            "name": "Verbs",
            "description": null,
            "is_public": true,
            "owner_id": 1,
            "folder_id": 3,
            "created_at": "2024-03-01T10:15:00",
            "tags": [{"id": 1, "name": "spanish"}]
        })
    }

    fn card_json(id: Id, term: &str, order: u32) -> Value {
        json!({
            "id": id,
            "term": term,
            "definition": format!("def {id}"),
            "example": null,
            "translation": null,
            "order": order,
            "set_id": 5
        })
    }

    fn mock_set(server: &MockServer) {
        server.mock(|when, then| {
            when.method(GET).path("/api/v1/sets/5");
            then.status(200).json_body(set_json());
        });
        server.mock(|when, then| {
            when.method(GET).path("/api/v1/folders/0/sets/5/cards");
            then.status(200).json_body(json!([
                card_json(1, "uno", 0),
                card_json(2, "dos", 1),
                card_json(3, "tres", 2)
            ]));
        });
    }

    async fn open(server: &MockServer) -> EditorPage {
        mock_set(server);
        let client = client_for(server, Some("tok")).await;
        EditorPage::open(client, 5, QUICK).await.expect("editor opens")
    }

    #[tokio::test]
    async fn missing_session_redirects_to_login() {
        let server = MockServer::start_async().await;
        let get = server.mock(|when, then| {
            when.method(GET).path("/api/v1/sets/5");
            then.status(200).json_body(set_json());
        });
        let client = client_for(&server, None).await;

        let err = EditorPage::open(client.clone(), 5, QUICK)
            .await
            .expect_err("guarded");
        assert_eq!(err, EditorError::LoginRequired);
        assert_eq!(client.navigator().current(), Route::Login);
        get.assert_calls(0);
    }

    #[tokio::test]
    async fn load_failure_reports_permission_message() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/v1/sets/5");
            then.status(404)
                .json_body(json!({"detail": "Card Set not found or access denied"}));
        });
        let client = client_for(&server, Some("tok")).await;

        let err = EditorPage::open(client, 5, QUICK)
            .await
            .expect_err("load fails");
        assert_eq!(err.to_string(), LOAD_FAILED_MESSAGE);
        assert!(matches!(err, EditorError::Load { .. }));
    }

    #[tokio::test]
    async fn rapid_edits_produce_one_update() {
        let server = MockServer::start_async().await;
        let update = server.mock(|when, then| {
            when.method(PUT)
                .path("/api/v1/cards/1")
                .json_body(json!({"term": "Hola", "definition": "def 1"}));
            then.status(200).json_body(card_json(1, "Hola", 0));
        });
        let editor = open(&server).await;

        editor.edit_term(1, "H").expect("edit");
        editor.edit_term(1, "Ho").expect("edit");
        editor.edit_term(1, "Hola").expect("edit");
        assert_eq!(editor.cards()[0].term, "Hola");
        editor.flush().await;

        update.assert_calls(1);
        assert_eq!(editor.status(), SaveStatus::Saved);
        assert!(!editor.entries()[0].is_dirty());
    }

    #[tokio::test]
    async fn reverted_edit_sends_nothing() {
        let server = MockServer::start_async().await;
        let update = server.mock(|when, then| {
            when.method(PUT).path("/api/v1/cards/2");
            then.status(200).json_body(card_json(2, "dos", 1));
        });
        let editor = open(&server).await;

        editor.edit_term(2, "dosss").expect("edit");
        editor.edit_term(2, "dos").expect("revert");
        editor.flush().await;

        update.assert_calls(0);
        assert_eq!(editor.status(), SaveStatus::Idle);
    }

    #[tokio::test]
    async fn revert_while_update_in_flight_is_saved_again() {
        let server = MockServer::start_async().await;
        let slow = server.mock(|when, then| {
            when.method(PUT)
                .path("/api/v1/cards/1")
                .json_body(json!({"term": "X", "definition": "def 1"}));
            then.status(200)
                .json_body(card_json(1, "X", 0))
                .delay(Duration::from_millis(300));
        });
        let revert = server.mock(|when, then| {
            when.method(PUT)
                .path("/api/v1/cards/1")
                .json_body(json!({"term": "uno", "definition": "def 1"}));
            then.status(200).json_body(card_json(1, "uno", 0));
        });
        let editor = open(&server).await;

        editor.edit_term(1, "X").expect("edit");
        tokio::time::sleep(Duration::from_millis(100)).await;
        editor.edit_term(1, "uno").expect("revert");
        editor.flush().await;

        slow.assert_calls(1);
        revert.assert_calls(1);
        let entries = editor.entries();
        assert_eq!(entries[0].card.term, "uno");
        assert!(!entries[0].is_dirty());
        assert!(!editor.has_pending_saves());
        assert_eq!(editor.status(), SaveStatus::Saved);
    }

    #[tokio::test]
    async fn failed_autosave_returns_to_idle() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(PUT).path("/api/v1/cards/3");
            then.status(500);
        });
        let editor = open(&server).await;

        editor.edit_definition(3, "three").expect("edit");
        editor.flush().await;
        assert_eq!(editor.status(), SaveStatus::Idle);
        assert!(editor.entries()[2].is_dirty());
    }

    #[tokio::test]
    async fn move_is_optimistic_and_submits_full_order() {
        let server = MockServer::start_async().await;
        let reorder = server.mock(|when, then| {
            when.method(POST)
                .path("/api/v1/folders/0/sets/5/reorder")
                .json_body(json!({"card_ids": [3, 1, 2]}));
            then.status(500);
        });
        let editor = open(&server).await;

        let err = editor.move_card(2, 0).await.expect_err("server failure");
        assert!(matches!(err, EditorError::Api(_)));
        let ids: Vec<Id> = editor.cards().iter().map(|card| card.id).collect();
        assert_eq!(ids, vec![3, 1, 2], "local order kept without rollback");
        assert_eq!(editor.status(), SaveStatus::Idle);
        reorder.assert();

        assert_eq!(
            editor.move_card(0, 7).await,
            Err(EditorError::InvalidMove {
                from: 0,
                to: 7,
                len: 3
            })
        );
    }

    #[tokio::test]
    async fn save_sends_split_tags_and_current_visibility() {
        let server = MockServer::start_async().await;
        let update = server.mock(|when, then| {
            when.method(PUT)
                .path("/api/v1/sets/5")
                .json_body(json!({
                    "name": "Irregular verbs",
                    "description": "",
                    "is_public": true,
                    "tags": ["spanish", "verbs"]
                }));
            then.status(200).json_body(set_json());
        });
        let editor = open(&server).await;
        assert_eq!(editor.details().tags, "spanish");

        editor.set_name("Irregular verbs");
        editor.set_tags("spanish, verbs, ");
        editor.save().await.expect("saved");

        update.assert();
        assert_eq!(editor.status(), SaveStatus::Saved);
    }

    #[tokio::test]
    async fn add_and_delete_cards_update_local_list() {
        let server = MockServer::start_async().await;
        let create = server.mock(|when, then| {
            when.method(POST)
                .path("/api/v1/folders/0/sets/5/cards")
                .json_body(json!({"term": NEW_CARD_TERM, "definition": NEW_CARD_DEFINITION}));
            then.status(201).json_body(card_json(4, NEW_CARD_TERM, 3));
        });
        let delete = server.mock(|when, then| {
            when.method(DELETE).path("/api/v1/cards/4");
            then.status(204);
        });
        let clear = server.mock(|when, then| {
            when.method(DELETE).path("/api/v1/sets/5/cards");
            then.status(200).json_body(json!({"ok": true}));
        });
        let update = server.mock(|when, then| {
            when.method(PUT).path("/api/v1/cards/1");
            then.status(200).json_body(card_json(1, "x", 0));
        });
        let editor = open(&server).await;

        let card = editor.add_card().await.expect("added");
        assert_eq!(editor.cards().last().map(|c| c.id), Some(card.id));
        editor.delete_card(card.id).await.expect("deleted");
        assert_eq!(editor.cards().len(), 3);
        assert_eq!(
            editor.delete_card(99).await,
            Err(EditorError::UnknownCard(99))
        );

        editor.edit_term(1, "x").expect("edit");
        editor.delete_all_cards().await.expect("cleared");
        editor.flush().await;
        assert!(editor.cards().is_empty());
        update.assert_calls(0);
        create.assert();
        delete.assert();
        clear.assert();
    }
}
