//! Client side of the shelf book API: a typed HTTP client, the add/edit form,
//! and the inventory state layer driven by [`controller::InventoryController`].

pub mod api;
pub mod controller;
pub mod error;
pub mod form;
pub mod pagination;
pub mod state;

pub use api::{BooksApi, HttpBooksApi, ListQuery};
pub use controller::{InventoryController, SubmitOutcome};
pub use error::ClientError;
pub use form::BookForm;
pub use state::{reduce, Action, InventoryState};
