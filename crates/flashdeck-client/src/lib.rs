#![forbid(unsafe_code)]
#![warn(
    unused,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    missing_docs
)]
#![allow(clippy::redundant_pub_crate, clippy::module_name_repetitions)]

//! Headless Flashdeck client.
//!
//! Layout:
//! - `http.rs`: shared REST client, bearer injection, single-flight refresh
//! - `session.rs`: persisted auth store with hydration
//! - `api/`: typed endpoint wrappers grouped by resource
//! - `library.rs`, `editor/`, `home.rs`, `forms.rs`: page controllers
//! - `debounce.rs`, `pagination.rs`: controller building blocks
//! - `navigation.rs`: redirect signal consumed by the front end

pub mod api;
pub mod debounce;
pub mod editor;
pub mod error;
pub mod forms;
pub mod home;
pub mod http;
pub mod library;
pub mod navigation;
pub mod pagination;
pub mod session;

pub use api::{CARD_PAGE_SIZE, ListParams, SetListParams};
pub use debounce::Debouncer;
pub use editor::{CardEntry, EditorError, EditorPage, EditorResult, SaveStatus, move_item};
pub use error::{ApiError, ApiResult};
pub use forms::{FormError, LoginForm, RegisterForm, SetDraft};
pub use home::{HomePage, Landing};
pub use http::{ApiClient, ApiRequest};
pub use library::{LibraryError, LibraryPage, LibraryResult, LibraryState, SearchBox};
pub use navigation::{Navigator, Route};
pub use pagination::PagedList;
pub use session::{
    AuthStore, FileSessionStorage, MemorySessionStorage, SessionCookies, SessionStorage,
    StoredCookie,
};
