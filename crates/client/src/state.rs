//! Inventory screen state and its pure transitions.

use shelf_model::{
    models::{Book, Pagination},
    validation::{Field, FieldErrors},
    CONFLICT_MESSAGE,
};
use uuid::Uuid;

use crate::{error::ClientError, form::BookForm};

/// Identifies one fetch; later fetches carry larger tokens
pub type RequestToken = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalMode {
    Add,
    Edit(Uuid),
}

/// The shared add/edit dialog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalState {
    pub mode: ModalMode,
    pub form: BookForm,
    pub errors: FieldErrors,
    pub submitting: bool,
    /// Failure not attributable to any field
    pub alert: Option<String>,
}

impl ModalState {
    fn new(mode: ModalMode, form: BookForm) -> Self {
        Self {
            mode,
            form,
            errors: FieldErrors::new(),
            submitting: false,
            alert: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InventoryState {
    pub books: Vec<Book>,
    pub search: String,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
    pub total_books: u64,
    pub loading: bool,
    /// A search change is waiting for its results
    pub searching: bool,
    /// Page-level banner
    pub error: Option<String>,
    pub modal: Option<ModalState>,
    /// Only responses carrying this token are applied
    pub latest_token: RequestToken,
}

impl InventoryState {
    pub fn new(limit: u32) -> Self {
        Self {
            books: Vec::new(),
            search: String::new(),
            page: 1,
            limit: limit.max(1),
            total_pages: 0,
            total_books: 0,
            loading: false,
            searching: false,
            error: None,
            modal: None,
            latest_token: 0,
        }
    }

    /// Search text sent to the server, `None` when blank
    pub fn search_term(&self) -> Option<String> {
        let term = self.search.trim();
        (!term.is_empty()).then(|| term.to_string())
    }
}

impl Default for InventoryState {
    fn default() -> Self {
        Self::new(5)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SearchChanged(String),
    PageChanged(u32),
    FetchStarted(RequestToken),
    FetchSucceeded {
        token: RequestToken,
        books: Vec<Book>,
        pagination: Pagination,
    },
    FetchFailed {
        token: RequestToken,
        error: ClientError,
    },
    /// A delete or other page-level operation failed
    OperationFailed(ClientError),
    DismissError,
    OpenAdd,
    OpenEdit(Book),
    CloseModal,
    FieldEdited {
        field: Field,
        value: String,
    },
    /// Client-side validation blocked the submit
    SubmitRejected(FieldErrors),
    SubmitStarted,
    SubmitSucceeded,
    SubmitFailed(ClientError),
}

/// Apply `action` to `state`
pub fn reduce(mut state: InventoryState, action: Action) -> InventoryState {
    match action {
        Action::SearchChanged(search) => {
            state.searching = search.trim() != state.search.trim() || state.searching;
            state.search = search;
            state.page = 1;
        }
        Action::PageChanged(page) => {
            state.page = page.max(1);
        }
        Action::FetchStarted(token) => {
            state.latest_token = state.latest_token.max(token);
            state.loading = true;
        }
        Action::FetchSucceeded {
            token,
            books,
            pagination,
        } => {
            if token != state.latest_token {
                return state;
            }
            state.books = books;
            state.total_pages = pagination.total_pages;
            state.total_books = pagination.total_books;
            state.loading = false;
            state.searching = false;
            state.error = None;
        }
        Action::FetchFailed { token, error } => {
            if token != state.latest_token {
                return state;
            }
            state.books.clear();
            state.total_pages = 0;
            state.total_books = 0;
            state.loading = false;
            state.searching = false;
            state.error = Some(error.user_message());
        }
        Action::OperationFailed(error) => {
            state.error = Some(error.user_message());
        }
        Action::DismissError => {
            state.error = None;
        }
        Action::OpenAdd => {
            state.modal = Some(ModalState::new(ModalMode::Add, BookForm::default()));
        }
        Action::OpenEdit(book) => {
            state.modal = Some(ModalState::new(
                ModalMode::Edit(book.id),
                BookForm::from_book(&book),
            ));
        }
        Action::CloseModal | Action::SubmitSucceeded => {
            state.modal = None;
        }
        Action::FieldEdited { field, value } => {
            if let Some(modal) = state.modal.as_mut() {
                modal.form.set(field, value);
                modal.errors = modal
                    .errors
                    .iter()
                    .filter(|error| error.field != field.name())
                    .cloned()
                    .collect::<Vec<_>>()
                    .into();
            }
        }
        Action::SubmitRejected(errors) => {
            if let Some(modal) = state.modal.as_mut() {
                modal.errors = errors;
                modal.alert = None;
            }
        }
        Action::SubmitStarted => {
            if let Some(modal) = state.modal.as_mut() {
                modal.submitting = true;
                modal.alert = None;
            }
        }
        Action::SubmitFailed(error) => {
            if let Some(modal) = state.modal.as_mut() {
                modal.submitting = false;
                let mut errors = error.field_errors();
                if errors.is_empty() && error.status() == Some(409) {
                    errors.push(Field::Isbn.name(), CONFLICT_MESSAGE);
                }

                if errors.is_empty() {
                    modal.alert = Some(error.user_message());
                } else {
                    modal.errors = errors;
                }
            }
        }
    }

    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use shelf_model::{models::NewBook, validation::FieldError};
    use time::macros::datetime;

    fn book(title: &str) -> Book {
        NewBook {
            title: title.to_string(),
            author: "Octavia E. Butler".to_string(),
            isbn: "978-0-446-67550-5".to_string(),
            published_date: datetime!(1993-10-01 0:00 UTC),
            publisher: "Four Walls Eight Windows".to_string(),
            pages: 345,
            genre: "Science Fiction".to_string(),
            description: "Earthseed and the fall of everything.".to_string(),
            price: Decimal::new(1650, 2),
            stock: 1,
        }
        .into_book(datetime!(2024-01-01 0:00 UTC))
    }

    fn pagination(total_books: u64, total_pages: u32) -> Pagination {
        Pagination {
            page: 1,
            limit: 5,
            total_books,
            total_pages,
        }
    }

    fn run(actions: impl IntoIterator<Item = Action>) -> InventoryState {
        actions
            .into_iter()
            .fold(InventoryState::default(), reduce)
    }

    #[test]
    fn search_change_resets_page() {
        let state = run([
            Action::PageChanged(4),
            Action::SearchChanged("butler".to_string()),
        ]);

        assert_eq!(state.page, 1);
        assert!(state.searching);
        assert_eq!(state.search_term().as_deref(), Some("butler"));
    }

    #[test]
    fn page_is_at_least_one() {
        assert_eq!(run([Action::PageChanged(0)]).page, 1);
    }

    #[test]
    fn stale_responses_are_discarded() {
        let state = run([
            Action::FetchStarted(1),
            Action::FetchStarted(2),
            Action::FetchSucceeded {
                token: 2,
                books: vec![book("Parable of the Talents")],
                pagination: pagination(1, 1),
            },
            Action::FetchSucceeded {
                token: 1,
                books: vec![book("Parable of the Sower"), book("Kindred")],
                pagination: pagination(2, 1),
            },
            Action::FetchFailed {
                token: 1,
                error: ClientError::Network("late".to_string()),
            },
        ]);

        assert_eq!(state.books.len(), 1);
        assert_eq!(state.books[0].title, "Parable of the Talents");
        assert_eq!(state.total_books, 1);
        assert!(state.error.is_none());
        assert!(!state.loading);
    }

    #[test]
    fn failed_fetch_shows_empty_list_and_banner() {
        let state = run([
            Action::FetchStarted(1),
            Action::FetchSucceeded {
                token: 1,
                books: vec![book("Kindred")],
                pagination: pagination(1, 1),
            },
            Action::FetchStarted(2),
            Action::FetchFailed {
                token: 2,
                error: ClientError::Network("refused".to_string()),
            },
        ]);

        assert!(state.books.is_empty());
        assert_eq!(
            state.error.as_deref(),
            Some("Network error. Please check your internet connection.")
        );
    }

    #[test]
    fn edit_prefills_and_editing_clears_that_fields_error() {
        let mut errors = FieldErrors::new();
        errors.push("title", "Title is required");
        errors.push("pages", "Pages must be a positive number");

        let state = run([
            Action::OpenEdit(book("Kindred")),
            Action::SubmitRejected(errors),
            Action::FieldEdited {
                field: Field::Pages,
                value: "300".to_string(),
            },
        ]);

        let modal = state.modal.unwrap();
        assert!(matches!(modal.mode, ModalMode::Edit(_)));
        assert_eq!(modal.form.price, "16.50");
        assert_eq!(modal.form.pages, "300");
        assert_eq!(modal.errors.get("pages"), None);
        assert_eq!(modal.errors.get("title"), Some("Title is required"));
    }

    #[test]
    fn server_field_errors_land_on_fields_others_in_alert() {
        let conflict = ClientError::Server {
            status: 409,
            message: CONFLICT_MESSAGE.to_string(),
            details: vec![FieldError {
                field: "isbn".to_string(),
                message: CONFLICT_MESSAGE.to_string(),
            }],
        };
        let state = run([
            Action::OpenAdd,
            Action::SubmitStarted,
            Action::SubmitFailed(conflict),
        ]);
        let modal = state.modal.unwrap();
        assert!(!modal.submitting);
        assert_eq!(modal.errors.get("isbn"), Some(CONFLICT_MESSAGE));
        assert!(modal.alert.is_none());

        let outage = ClientError::Server {
            status: 500,
            message: String::new(),
            details: Vec::new(),
        };
        let state = run([
            Action::OpenAdd,
            Action::SubmitStarted,
            Action::SubmitFailed(outage),
        ]);
        assert_eq!(
            state.modal.unwrap().alert.as_deref(),
            Some("Something went wrong on the server.")
        );
    }

    #[test]
    fn successful_submit_closes_modal() {
        let state = run([
            Action::OpenAdd,
            Action::SubmitStarted,
            Action::SubmitSucceeded,
        ]);
        assert!(state.modal.is_none());
    }
}
