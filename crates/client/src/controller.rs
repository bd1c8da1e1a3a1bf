//! Drives [`InventoryState`] against a [`BooksApi`]: debounced fetches,
//! request tokens, modal submits and refetch after every mutation.

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    time::Duration,
};

use shelf_model::{
    models::{Book, BookInput},
    validation::Field,
};
use time::{Date, OffsetDateTime};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::{
    api::{BooksApi, ListQuery},
    error::ClientError,
    state::{reduce, Action, InventoryState, ModalMode},
};

/// Result of asking the modal to submit
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    NoModal,
    /// A submit is already in flight
    AlreadySubmitting,
    /// Client-side validation failed; nothing was sent
    Invalid,
    Saved(Book),
    Failed(ClientError),
}

struct Inner {
    api: Arc<dyn BooksApi>,
    state: Mutex<InventoryState>,
    tokens: AtomicU64,
    pending: Mutex<Option<JoinHandle<()>>>,
    debounce: Duration,
}

#[derive(Clone)]
pub struct InventoryController {
    inner: Arc<Inner>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn apply(state: &mut InventoryState, action: Action) {
    let current = std::mem::take(state);
    *state = reduce(current, action);
}

impl InventoryController {
    /// Fetches wait `debounce` after the last search or page change
    pub fn new(api: Arc<dyn BooksApi>, debounce: Duration, page_size: u32) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                state: Mutex::new(InventoryState::new(page_size)),
                tokens: AtomicU64::new(0),
                pending: Mutex::new(None),
                debounce,
            }),
        }
    }

    /// Snapshot of the current state
    pub fn state(&self) -> InventoryState {
        lock(&self.inner.state).clone()
    }

    /// Apply one action and return the resulting state
    pub fn dispatch(&self, action: Action) -> InventoryState {
        let mut state = lock(&self.inner.state);
        apply(&mut state, action);
        state.clone()
    }

    /// Change the search term; the page goes back to 1
    pub fn set_search(&self, search: impl Into<String>) {
        self.dispatch(Action::SearchChanged(search.into()));
        self.schedule_fetch();
    }

    pub fn set_page(&self, page: u32) {
        self.dispatch(Action::PageChanged(page));
        self.schedule_fetch();
    }

    /// Fetch after the debounce delay. A newer call replaces a pending one;
    /// fetches already sent are left to finish and are sequenced by token.
    pub fn schedule_fetch(&self) {
        let controller = self.clone();
        let delay = self.inner.debounce;

        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tokio::spawn(async move { controller.refresh().await });
        });

        if let Some(previous) = lock(&self.inner.pending).replace(timer) {
            previous.abort();
        }
    }

    /// Fetch the current page now
    pub async fn refresh(&self) {
        let token = self.inner.tokens.fetch_add(1, Ordering::SeqCst) + 1;
        let state = self.dispatch(Action::FetchStarted(token));

        let query = ListQuery {
            page: state.page,
            limit: state.limit,
            search: state.search_term(),
        };
        tracing::debug!(token, page = query.page, search = ?query.search, "fetching books");

        match self.inner.api.list(query).await {
            Ok(response) => {
                self.dispatch(Action::FetchSucceeded {
                    token,
                    books: response.data,
                    pagination: response.pagination,
                });
            }
            Err(error) => {
                tracing::warn!(token, %error, "book fetch failed");
                self.dispatch(Action::FetchFailed { token, error });
            }
        }
    }

    /// Clear the banner and fetch again immediately
    pub async fn retry(&self) {
        self.dispatch(Action::DismissError);
        self.refresh().await;
    }

    pub fn open_add(&self) {
        self.dispatch(Action::OpenAdd);
    }

    pub fn open_edit(&self, book: Book) {
        self.dispatch(Action::OpenEdit(book));
    }

    pub fn close_modal(&self) {
        self.dispatch(Action::CloseModal);
    }

    pub fn edit_field(&self, field: Field, value: impl Into<String>) {
        self.dispatch(Action::FieldEdited {
            field,
            value: value.into(),
        });
    }

    /// Submit the modal, validating against today's date
    pub async fn submit(&self) -> SubmitOutcome {
        self.submit_on(OffsetDateTime::now_utc().date()).await
    }

    /// Submit the modal. Refused while another submit is in flight.
    pub async fn submit_on(&self, today: Date) -> SubmitOutcome {
        let (mode, book) = {
            let mut state = lock(&self.inner.state);
            let Some(modal) = state.modal.as_ref() else {
                return SubmitOutcome::NoModal;
            };
            if modal.submitting {
                return SubmitOutcome::AlreadySubmitting;
            }

            let mode = modal.mode.clone();
            match modal.form.validate(today) {
                Ok(book) => {
                    apply(&mut state, Action::SubmitStarted);
                    (mode, book)
                }
                Err(errors) => {
                    apply(&mut state, Action::SubmitRejected(errors));
                    return SubmitOutcome::Invalid;
                }
            }
        };

        let input = BookInput::from(book);
        let result = match mode {
            ModalMode::Add => self.inner.api.create(input).await,
            ModalMode::Edit(id) => self.inner.api.update(id, input).await,
        };

        match result {
            Ok(book) => {
                tracing::info!(book_id = %book.id, "book saved");
                self.dispatch(Action::SubmitSucceeded);
                self.refresh().await;
                SubmitOutcome::Saved(book)
            }
            Err(error) => {
                tracing::warn!(%error, "book submit failed");
                self.dispatch(Action::SubmitFailed(error.clone()));
                SubmitOutcome::Failed(error)
            }
        }
    }

    /// Delete a book and refetch the current page
    pub async fn delete(&self, id: Uuid) -> Result<Book, ClientError> {
        match self.inner.api.delete(id).await {
            Ok(book) => {
                tracing::info!(book_id = %book.id, "book deleted");
                self.refresh().await;
                Ok(book)
            }
            Err(error) => {
                self.dispatch(Action::OperationFailed(error.clone()));
                Err(error)
            }
        }
    }
}
