//! Add/edit form fields as the user typed them.

use serde_json::Value;
use shelf_model::{
    models::{Book, BookInput, NewBook},
    validation::{self, Field, FieldErrors},
};
use time::{macros::format_description, Date};

pub const FUTURE_DATE_MESSAGE: &str = "Published date cannot be in the future";

/// Raw text of every editable field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookForm {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub published_date: String,
    pub publisher: String,
    pub pages: String,
    pub genre: String,
    pub description: String,
    pub price: String,
    pub stock: String,
}

impl BookForm {
    /// Prefill from a stored record: date as `YYYY-MM-DD`, price with two decimals
    pub fn from_book(book: &Book) -> Self {
        let published_date = book
            .published_date
            .date()
            .format(format_description!("[year]-[month]-[day]"))
            .unwrap_or_default();

        Self {
            title: book.title.clone(),
            author: book.author.clone(),
            isbn: book.isbn.clone(),
            published_date,
            publisher: book.publisher.clone(),
            pages: book.pages.to_string(),
            genre: book.genre.clone(),
            description: book.description.clone(),
            price: format!("{:.2}", book.price),
            stock: book.stock.to_string(),
        }
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Title => &self.title,
            Field::Author => &self.author,
            Field::Isbn => &self.isbn,
            Field::PublishedDate => &self.published_date,
            Field::Publisher => &self.publisher,
            Field::Pages => &self.pages,
            Field::Genre => &self.genre,
            Field::Description => &self.description,
            Field::Price => &self.price,
            Field::Stock => &self.stock,
        }
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let slot = match field {
            Field::Title => &mut self.title,
            Field::Author => &mut self.author,
            Field::Isbn => &mut self.isbn,
            Field::PublishedDate => &mut self.published_date,
            Field::Publisher => &mut self.publisher,
            Field::Pages => &mut self.pages,
            Field::Genre => &mut self.genre,
            Field::Description => &mut self.description,
            Field::Price => &mut self.price,
            Field::Stock => &mut self.stock,
        };
        *slot = value.into();
    }

    /// Form text as an API payload. A blank stock is left out so it defaults to zero.
    pub fn to_input(&self) -> BookInput {
        let text = |field: Field| Some(Value::String(self.get(field).to_string()));

        BookInput {
            title: text(Field::Title),
            author: text(Field::Author),
            isbn: text(Field::Isbn),
            published_date: text(Field::PublishedDate),
            publisher: text(Field::Publisher),
            pages: text(Field::Pages),
            genre: text(Field::Genre),
            description: text(Field::Description),
            price: text(Field::Price),
            stock: (!self.stock.trim().is_empty()).then(|| Value::String(self.stock.clone())),
        }
    }

    /// Apply the server's rules plus a no-future-date check against `today`
    pub fn validate(&self, today: Date) -> Result<NewBook, FieldErrors> {
        let checked = validation::validate_new(&self.to_input());

        let in_future = validation::parse_published_date(&self.published_date)
            .is_some_and(|date| date.date() > today);
        if !in_future {
            return checked;
        }

        let mut errors = match checked {
            Ok(_) => FieldErrors::new(),
            Err(errors) => errors,
        };
        errors.push(Field::PublishedDate.name(), FUTURE_DATE_MESSAGE);

        // Keep errors in field order so the first one shown is the topmost field.
        let mut ordered = errors.into_vec();
        ordered.sort_by_key(|error| {
            Field::from_name(&error.field)
                .and_then(|field| Field::ALL.iter().position(|f| *f == field))
                .unwrap_or(usize::MAX)
        });
        Err(ordered.into())
    }
}
