//! Library page controller: folders, the selected folder's sets, and search.
//!
//! # Design
//! - Folders and sets are independent [`PagedList`]s sharing one search query.
//! - A folder's `set_count` is maintained locally after set create/delete.
//! - Folders holding sets are never sent a delete request.
//! - State sits behind a short-lived lock that is never held across a request.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use flashdeck_api_models::{CardSet, Folder, FolderPayload, Id};
use flashdeck_config::ClientConfig;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::api::{ListParams, SetListParams};
use crate::debounce::Debouncer;
use crate::error::ApiError;
use crate::forms::{FormError, SetDraft, required};
use crate::http::ApiClient;
use crate::pagination::{PageTicket, PagedList};

/// Failures surfaced by the library page.
#[derive(Debug, Error, PartialEq)]
pub enum LibraryError {
    /// The folder still holds sets.
    #[error("Cannot delete a folder that contains card sets.")]
    FolderNotEmpty {
        /// Folder that was refused.
        folder_id: Id,
        /// Cached number of sets.
        set_count: u32,
    },
    /// Creating a set requires a selected folder.
    #[error("select a folder before creating a card set")]
    NoFolderSelected,
    /// A submitted field failed validation.
    #[error(transparent)]
    Form(#[from] FormError),
    /// The server call failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Result alias for library operations.
pub type LibraryResult<T> = Result<T, LibraryError>;

/// Search input whose value settles after a quiet period.
#[derive(Debug)]
pub struct SearchBox {
    text: Mutex<String>,
    settled: Arc<watch::Sender<String>>,
    debouncer: Debouncer,
}

impl SearchBox {
    /// Empty search box settling after `delay`.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        let (settled, _) = watch::channel(String::new());
        Self {
            text: Mutex::new(String::new()),
            settled: Arc::new(settled),
            debouncer: Debouncer::new(delay),
        }
    }

    /// Replace the typed text. The settled value follows once typing pauses.
    pub fn input(&self, text: impl Into<String>) {
        let text = text.into();
        let query = text.trim().to_string();
        *self.text.lock().unwrap_or_else(PoisonError::into_inner) = text;
        let settled = Arc::clone(&self.settled);
        self.debouncer.schedule(async move {
            settled.send_if_modified(|current| {
                if *current == query {
                    return false;
                }
                *current = query;
                true
            });
        });
    }

    /// Text as typed.
    #[must_use]
    pub fn text(&self) -> String {
        self.text
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Last settled query.
    #[must_use]
    pub fn settled(&self) -> String {
        self.settled.borrow().clone()
    }

    /// Observe settled queries.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.settled.subscribe()
    }

    /// Wait for a pending keystroke to settle.
    pub async fn settle(&self) {
        self.debouncer.settle().await;
    }
}

/// Snapshot-able state of the library page.
#[derive(Debug, Clone)]
pub struct LibraryState {
    /// Folder list.
    pub folders: PagedList<Folder>,
    /// Sets of the selected folder.
    pub sets: PagedList<CardSet>,
    /// Query applied to both lists.
    pub search: String,
    /// Folder whose sets are listed.
    pub selected_folder: Option<Id>,
}

impl LibraryState {
    fn new(page_size: u32) -> Self {
        let mut sets = PagedList::new(page_size);
        sets.clear();
        Self {
            folders: PagedList::new(page_size),
            sets,
            search: String::new(),
            selected_folder: None,
        }
    }

    fn adjust_set_count(&mut self, folder_id: Id, grow: bool) {
        if let Some(folder) = self.folders.find_mut(|folder| folder.id == folder_id) {
            folder.set_count = if grow {
                folder.set_count.saturating_add(1)
            } else {
                folder.set_count.saturating_sub(1)
            };
        }
    }
}

/// Library page controller.
#[derive(Debug)]
pub struct LibraryPage {
    client: ApiClient,
    state: Mutex<LibraryState>,
    search_box: SearchBox,
}

impl LibraryPage {
    /// Controller with explicit page size and search debounce.
    #[must_use]
    pub fn new(client: ApiClient, page_size: u32, search_debounce: Duration) -> Self {
        Self {
            client,
            state: Mutex::new(LibraryState::new(page_size)),
            search_box: SearchBox::new(search_debounce),
        }
    }

    /// Controller using the configured page size and debounce.
    #[must_use]
    pub fn from_config(client: ApiClient, config: &ClientConfig) -> Self {
        Self::new(client, config.page_size, config.search_debounce)
    }

    /// Copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> LibraryState {
        self.state().clone()
    }

    /// Loaded folders.
    #[must_use]
    pub fn folders(&self) -> Vec<Folder> {
        self.state().folders.items().to_vec()
    }

    /// Loaded sets of the selected folder.
    #[must_use]
    pub fn sets(&self) -> Vec<CardSet> {
        self.state().sets.items().to_vec()
    }

    /// Selected folder id.
    #[must_use]
    pub fn selected_folder(&self) -> Option<Id> {
        self.state().selected_folder
    }

    /// Active search query.
    #[must_use]
    pub fn search(&self) -> String {
        self.state().search.clone()
    }

    /// Search box feeding [`LibraryPage::apply_settled_search`].
    #[must_use]
    pub const fn search_box(&self) -> &SearchBox {
        &self.search_box
    }

    /// Load the next folder page, or page zero with `reset`.
    ///
    /// Returns `false` when nothing was requested (load running or list exhausted).
    ///
    /// # Errors
    ///
    /// [`LibraryError::Api`] when the listing fails.
    pub async fn load_folders(&self, reset: bool) -> LibraryResult<bool> {
        let (ticket, search) = {
            let mut state = self.state();
            let Some(ticket) = state.folders.begin(reset) else {
                return Ok(false);
            };
            (ticket, state.search.clone())
        };
        let params = list_params(ticket, search);
        match self.client.list_folders(&params).await {
            Ok(batch) => {
                debug!(skip = ticket.skip, count = batch.len(), "loaded folders");
                self.state().folders.finish(ticket, batch);
                Ok(true)
            }
            Err(err) => {
                warn!(error = %err, "failed to fetch folders");
                self.state().folders.fail(ticket);
                Err(err.into())
            }
        }
    }

    /// Load the next set page of the selected folder, or page zero with `reset`.
    ///
    /// Returns `false` when no folder is selected or nothing was requested.
    ///
    /// # Errors
    ///
    /// [`LibraryError::Api`] when the listing fails.
    pub async fn load_sets(&self, reset: bool) -> LibraryResult<bool> {
        let (folder_id, ticket, search) = {
            let mut state = self.state();
            let Some(folder_id) = state.selected_folder else {
                return Ok(false);
            };
            let Some(ticket) = state.sets.begin(reset) else {
                return Ok(false);
            };
            (folder_id, ticket, state.search.clone())
        };
        let params = SetListParams::new(list_params(ticket, search));
        match self.client.list_sets(folder_id, &params).await {
            Ok(batch) => {
                debug!(folder_id, skip = ticket.skip, count = batch.len(), "loaded sets");
                self.state().sets.finish(ticket, batch);
                Ok(true)
            }
            Err(err) => {
                warn!(error = %err, folder_id, "failed to fetch sets");
                self.state().sets.fail(ticket);
                Err(err.into())
            }
        }
    }

    /// Select a folder and reload its sets, or clear the set list with `None`.
    ///
    /// # Errors
    ///
    /// [`LibraryError::Api`] when the set listing fails.
    pub async fn select_folder(&self, folder_id: Option<Id>) -> LibraryResult<()> {
        {
            let mut state = self.state();
            state.selected_folder = folder_id;
            if folder_id.is_none() {
                state.sets.clear();
                return Ok(());
            }
        }
        self.load_sets(true).await.map(|_| ())
    }

    /// Apply a query to both lists, resetting them when it changed.
    ///
    /// # Errors
    ///
    /// [`LibraryError::Api`] when a reload fails.
    pub async fn set_search(&self, query: &str) -> LibraryResult<()> {
        let query = query.trim().to_string();
        {
            let mut state = self.state();
            if state.search == query {
                return Ok(());
            }
            state.search = query;
        }
        self.load_folders(true).await?;
        self.load_sets(true).await?;
        Ok(())
    }

    /// Wait for the search box to settle on a new query, then apply it.
    ///
    /// # Errors
    ///
    /// [`LibraryError::Api`] when a reload fails.
    pub async fn apply_settled_search(&self) -> LibraryResult<()> {
        let current = self.search();
        let mut feed = self.search_box.subscribe();
        let query = match feed.wait_for(|settled| *settled != current).await {
            Ok(settled) => settled.clone(),
            Err(_) => return Ok(()),
        };
        self.set_search(&query).await
    }

    /// Create a folder and show it first.
    ///
    /// # Errors
    ///
    /// [`LibraryError::Form`] or [`LibraryError::Api`].
    pub async fn create_folder(&self, name: &str, is_public: bool) -> LibraryResult<Folder> {
        let payload = FolderPayload {
            name: required("name", name)?,
            is_public,
        };
        let folder = self.client.create_folder(&payload).await?;
        self.state().folders.prepend(folder.clone());
        Ok(folder)
    }

    /// Rename or change the visibility of a folder in place.
    ///
    /// # Errors
    ///
    /// [`LibraryError::Form`] or [`LibraryError::Api`].
    pub async fn update_folder(
        &self,
        folder_id: Id,
        name: &str,
        is_public: bool,
    ) -> LibraryResult<Folder> {
        let payload = FolderPayload {
            name: required("name", name)?,
            is_public,
        };
        let folder = self.client.update_folder(folder_id, &payload).await?;
        self.state()
            .folders
            .replace_where(|row| row.id == folder_id, folder.clone());
        Ok(folder)
    }

    /// Delete an empty folder.
    ///
    /// The locally maintained `set_count` wins over the one on `folder`.
    ///
    /// # Errors
    ///
    /// [`LibraryError::FolderNotEmpty`] without contacting the server, or
    /// [`LibraryError::Api`].
    pub async fn delete_folder(&self, folder: &Folder) -> LibraryResult<()> {
        let set_count = self
            .state()
            .folders
            .items()
            .iter()
            .find(|row| row.id == folder.id)
            .map_or(folder.set_count, |row| row.set_count);
        if set_count > 0 {
            return Err(LibraryError::FolderNotEmpty {
                folder_id: folder.id,
                set_count,
            });
        }
        self.client.delete_folder(folder.id).await?;
        let mut state = self.state();
        state.folders.remove_where(|row| row.id == folder.id);
        if state.selected_folder == Some(folder.id) {
            state.selected_folder = None;
            state.sets.clear();
        }
        Ok(())
    }

    /// Create a set in the selected folder and bump its count.
    ///
    /// # Errors
    ///
    /// [`LibraryError::NoFolderSelected`], [`LibraryError::Form`], or
    /// [`LibraryError::Api`].
    pub async fn create_set(&self, draft: &SetDraft) -> LibraryResult<CardSet> {
        let folder_id = self
            .selected_folder()
            .ok_or(LibraryError::NoFolderSelected)?;
        let payload = draft.to_payload()?;
        let set = self.client.create_set(folder_id, &payload).await?;
        let mut state = self.state();
        if state.selected_folder == Some(folder_id) {
            state.sets.prepend(set.clone());
        }
        state.adjust_set_count(folder_id, true);
        Ok(set)
    }

    /// Update a set in place.
    ///
    /// # Errors
    ///
    /// [`LibraryError::Form`] or [`LibraryError::Api`].
    pub async fn update_set(&self, set_id: Id, draft: &SetDraft) -> LibraryResult<CardSet> {
        let payload = draft.to_payload()?;
        let set = self.client.update_set(set_id, &payload).await?;
        self.state()
            .sets
            .replace_where(|row| row.id == set_id, set.clone());
        Ok(set)
    }

    /// Delete a set and decrement its folder's count.
    ///
    /// # Errors
    ///
    /// [`LibraryError::Api`].
    pub async fn delete_set(&self, set: &CardSet) -> LibraryResult<()> {
        self.client.delete_set(set.id).await?;
        let mut state = self.state();
        state.sets.remove_where(|row| row.id == set.id);
        state.adjust_set_count(set.folder_id, false);
        Ok(())
    }

    fn state(&self) -> MutexGuard<'_, LibraryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn list_params(ticket: PageTicket, search: String) -> ListParams {
    ListParams {
        skip: ticket.skip,
        limit: ticket.limit,
        search,
    }
}
