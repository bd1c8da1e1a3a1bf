use std::path::Path;

use anyhow::{anyhow, Context};
use shelf_model::models::{Book, BookInput, BookListResponse};
use shelf_client::{pagination::page_window, BooksApi, ClientError, ListQuery};
use uuid::Uuid;

use crate::args::BooksCommand;

pub async fn run(api: &dyn BooksApi, command: BooksCommand, default_limit: u32) -> anyhow::Result<()> {
    match command {
        BooksCommand::List {
            search,
            page,
            limit,
        } => {
            let query = ListQuery {
                page: page.max(1),
                limit: limit.unwrap_or(default_limit),
                search: search.filter(|term| !term.trim().is_empty()),
            };
            let listing = api.list(query).await.map_err(describe)?;
            print_listing(&listing);
        }
        BooksCommand::Show { id } => {
            let book = api.get(parse_id(&id)?).await.map_err(describe)?;
            print_book(&book)?;
        }
        BooksCommand::Add { file } => {
            let book = api.create(read_input(&file)?).await.map_err(describe)?;
            println!("Book created successfully");
            print_book(&book)?;
        }
        BooksCommand::Update { id, file } => {
            let id = parse_id(&id)?;
            let book = api.update(id, read_input(&file)?).await.map_err(describe)?;
            println!("Book updated successfully");
            print_book(&book)?;
        }
        BooksCommand::Delete { id } => {
            let book = api.delete(parse_id(&id)?).await.map_err(describe)?;
            println!("Book deleted successfully: {} ({})", book.title, book.id);
        }
    }

    Ok(())
}

fn parse_id(raw: &str) -> anyhow::Result<Uuid> {
    Uuid::parse_str(raw.trim()).with_context(|| format!("'{raw}' is not a book id"))
}

fn read_input(path: &Path) -> anyhow::Result<BookInput> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("{} is not a JSON book object", path.display()))
}

/// Fold server field errors into one readable error
fn describe(error: ClientError) -> anyhow::Error {
    let fields = error.field_errors();
    if fields.is_empty() {
        return anyhow!(error.user_message());
    }

    let lines: Vec<String> = fields
        .iter()
        .map(|e| format!("  {}: {}", e.field, e.message))
        .collect();
    anyhow!("{}\n{}", error.user_message(), lines.join("\n"))
}

fn print_book(book: &Book) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(book)?);
    Ok(())
}

fn print_listing(listing: &BookListResponse) {
    if listing.data.is_empty() {
        println!("No books found");
    }

    for book in &listing.data {
        println!(
            "{}  {:<32}  {:<24}  {:<17}  {:>8}  stock {}",
            book.id, book.title, book.author, book.isbn, book.price, book.stock
        );
    }

    let pagination = &listing.pagination;
    let pages: Vec<String> = page_window(pagination.page, pagination.total_pages)
        .into_iter()
        .map(|page| {
            if page == pagination.page {
                format!("[{page}]")
            } else {
                page.to_string()
            }
        })
        .collect();

    println!(
        "page {} of {} ({} books)  {}",
        pagination.page,
        pagination.total_pages,
        pagination.total_books,
        pages.join(" ")
    );
}
