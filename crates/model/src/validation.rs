//! Field-level checks for book payloads.
//!
//! Validation never fails on malformed input: every problem becomes a
//! [`FieldError`] naming the offending field in its JSON spelling. Checks run
//! in field declaration order, so the first error is the first failing field.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::{
    format_description::well_known::Rfc3339, macros::format_description, Date, OffsetDateTime,
};

use crate::models::{BookInput, BookPatch, NewBook};

pub const ISBN_MIN_LEN: usize = 10;
pub const ISBN_MAX_LEN: usize = 17;
pub const DESCRIPTION_MIN_LEN: usize = 10;

/// One rejected field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Ordered collection of field errors
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn first(&self) -> Option<&FieldError> {
        self.0.first()
    }

    /// Message for `field`, if it failed
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|error| error.field == field)
            .map(|error| error.message.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    pub fn into_vec(self) -> Vec<FieldError> {
        self.0
    }
}

impl From<Vec<FieldError>> for FieldErrors {
    fn from(errors: Vec<FieldError>) -> Self {
        Self(errors)
    }
}

/// Book fields in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Author,
    Isbn,
    PublishedDate,
    Publisher,
    Pages,
    Genre,
    Description,
    Price,
    Stock,
}

impl Field {
    pub const ALL: [Field; 10] = [
        Field::Title,
        Field::Author,
        Field::Isbn,
        Field::PublishedDate,
        Field::Publisher,
        Field::Pages,
        Field::Genre,
        Field::Description,
        Field::Price,
        Field::Stock,
    ];

    /// JSON field name
    pub fn name(self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Author => "author",
            Field::Isbn => "isbn",
            Field::PublishedDate => "publishedDate",
            Field::Publisher => "publisher",
            Field::Pages => "pages",
            Field::Genre => "genre",
            Field::Description => "description",
            Field::Price => "price",
            Field::Stock => "stock",
        }
    }

    /// Human label used in messages
    pub fn label(self) -> &'static str {
        match self {
            Field::Title => "Title",
            Field::Author => "Author",
            Field::Isbn => "ISBN",
            Field::PublishedDate => "Published date",
            Field::Publisher => "Publisher",
            Field::Pages => "Pages",
            Field::Genre => "Genre",
            Field::Description => "Description",
            Field::Price => "Price",
            Field::Stock => "Stock",
        }
    }

    pub fn from_name(name: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|field| field.name() == name)
    }
}

/// Strip hyphens and whitespace
pub fn normalize_isbn(raw: &str) -> String {
    raw.chars()
        .filter(|c| *c != '-' && !c.is_whitespace())
        .collect()
}

/// Accepts `YYYY-MM-DD` (midnight UTC) or an RFC 3339 timestamp
pub fn parse_published_date(raw: &str) -> Option<OffsetDateTime> {
    let raw = raw.trim();
    let day = format_description!("[year]-[month]-[day]");

    if let Ok(date) = Date::parse(raw, day) {
        return Some(date.midnight().assume_utc());
    }

    OffsetDateTime::parse(raw, &Rfc3339).ok()
}

/// Round to cents and pin the scale so `19.9` renders as `19.90`
pub fn to_cents(price: Decimal) -> Decimal {
    let mut rounded = price.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Create,
    Update,
}

struct Checker {
    mode: Mode,
    errors: FieldErrors,
}

impl Checker {
    fn new(mode: Mode) -> Self {
        Self {
            mode,
            errors: FieldErrors::new(),
        }
    }

    fn reject(&mut self, field: Field, message: impl Into<String>) {
        self.errors.push(field.name(), message);
    }

    /// `None` when the field is absent; on create that is itself an error
    fn present<'v>(&mut self, field: Field, value: Option<&'v Value>) -> Option<&'v Value> {
        match value {
            Some(Value::Null) | None => {
                if self.mode == Mode::Create {
                    self.reject(field, format!("{} is required", field.label()));
                }
                None
            }
            Some(value) => Some(value),
        }
    }

    fn text(&mut self, field: Field, value: Option<&Value>) -> Option<String> {
        let value = self.present(field, value)?;

        let Some(raw) = value.as_str() else {
            self.reject(field, format!("{} must be text", field.label()));
            return None;
        };

        let trimmed = raw.trim();
        if trimmed.is_empty() {
            let message = match self.mode {
                Mode::Create => format!("{} is required", field.label()),
                Mode::Update => format!("{} cannot be empty", field.label()),
            };
            self.reject(field, message);
            return None;
        }

        Some(trimmed.to_string())
    }

    fn isbn(&mut self, value: Option<&Value>) -> Option<String> {
        let isbn = self.text(Field::Isbn, value)?;
        let len = normalize_isbn(&isbn).chars().count();

        if !(ISBN_MIN_LEN..=ISBN_MAX_LEN).contains(&len) {
            self.reject(Field::Isbn, "Invalid ISBN format");
            return None;
        }

        Some(isbn)
    }

    fn description(&mut self, value: Option<&Value>) -> Option<String> {
        let description = self.text(Field::Description, value)?;

        if description.chars().count() < DESCRIPTION_MIN_LEN {
            self.reject(
                Field::Description,
                format!(
                    "Description must be at least {} characters",
                    DESCRIPTION_MIN_LEN
                ),
            );
            return None;
        }

        Some(description)
    }

    fn published_date(&mut self, value: Option<&Value>) -> Option<OffsetDateTime> {
        let value = self.present(Field::PublishedDate, value)?;

        match value.as_str().and_then(parse_published_date) {
            Some(date) => Some(date),
            None => {
                self.reject(Field::PublishedDate, "Published date must be a valid date");
                None
            }
        }
    }

    fn pages(&mut self, value: Option<&Value>) -> Option<u32> {
        let value = self.present(Field::Pages, value)?;

        match whole_number(value) {
            Some(pages) if pages >= 1.0 && pages <= f64::from(u32::MAX) => Some(pages as u32),
            _ => {
                self.reject(Field::Pages, "Pages must be a positive number");
                None
            }
        }
    }

    fn stock(&mut self, value: Option<&Value>) -> Option<u32> {
        // Absent stock defaults to zero on create; on update it stays untouched.
        let value = match value {
            Some(Value::Null) | None => return None,
            Some(value) => value,
        };

        match whole_number(value) {
            Some(stock) if stock >= 0.0 && stock <= f64::from(u32::MAX) => Some(stock as u32),
            _ => {
                self.reject(Field::Stock, "Stock must be a non-negative number");
                None
            }
        }
    }

    fn price(&mut self, value: Option<&Value>) -> Option<Decimal> {
        let value = self.present(Field::Price, value)?;

        match decimal(value).map(to_cents) {
            Some(price) if price > Decimal::ZERO => Some(price),
            _ => {
                self.reject(Field::Price, "Price must be a positive number");
                None
            }
        }
    }

    fn finish<T>(self, value: Option<T>) -> Result<T, FieldErrors> {
        match value {
            Some(value) if self.errors.is_empty() => Ok(value),
            _ => Err(self.errors),
        }
    }
}

/// Numbers and numeric strings, truncated toward zero
fn whole_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    number.is_finite().then(|| number.trunc())
}

fn decimal(value: &Value) -> Option<Decimal> {
    let raw = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };

    Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .ok()
}

/// Validate a create payload. Every field except stock is required.
pub fn validate_new(input: &BookInput) -> Result<NewBook, FieldErrors> {
    let mut check = Checker::new(Mode::Create);

    let title = check.text(Field::Title, input.title.as_ref());
    let author = check.text(Field::Author, input.author.as_ref());
    let isbn = check.isbn(input.isbn.as_ref());
    let published_date = check.published_date(input.published_date.as_ref());
    let publisher = check.text(Field::Publisher, input.publisher.as_ref());
    let pages = check.pages(input.pages.as_ref());
    let genre = check.text(Field::Genre, input.genre.as_ref());
    let description = check.description(input.description.as_ref());
    let price = check.price(input.price.as_ref());
    let stock_supplied = !matches!(input.stock, None | Some(Value::Null));
    let stock = check.stock(input.stock.as_ref());

    let book = (|| {
        Some(NewBook {
            title: title?,
            author: author?,
            isbn: isbn?,
            published_date: published_date?,
            publisher: publisher?,
            pages: pages?,
            genre: genre?,
            description: description?,
            price: price?,
            stock: match stock {
                Some(stock) => stock,
                None if !stock_supplied => 0,
                None => return None,
            },
        })
    })();

    check.finish(book)
}

/// Validate an update payload. Only supplied fields are checked.
pub fn validate_patch(input: &BookInput) -> Result<BookPatch, FieldErrors> {
    let mut check = Checker::new(Mode::Update);

    let patch = BookPatch {
        title: check.text(Field::Title, input.title.as_ref()),
        author: check.text(Field::Author, input.author.as_ref()),
        isbn: check.isbn(input.isbn.as_ref()),
        published_date: check.published_date(input.published_date.as_ref()),
        publisher: check.text(Field::Publisher, input.publisher.as_ref()),
        pages: check.pages(input.pages.as_ref()),
        genre: check.text(Field::Genre, input.genre.as_ref()),
        description: check.description(input.description.as_ref()),
        price: check.price(input.price.as_ref()),
        stock: check.stock(input.stock.as_ref()),
    };

    check.finish(Some(patch))
}
