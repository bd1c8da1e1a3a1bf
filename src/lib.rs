//! Shelf application library
//!
//! Book inventory modules and the bootstrap that wires them to the kernel,
//! the store and the HTTP surface.

pub mod app;
pub mod modules;

pub use app::App;
pub use modules::books;
