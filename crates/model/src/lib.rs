//! Book records, API payloads and the validation rules shared by the
//! shelf server and its clients.

pub mod models;
pub mod validation;

pub const CONFLICT_MESSAGE: &str = "A book with this ISBN already exists";
pub const NOT_FOUND_MESSAGE: &str = "Book not found";
