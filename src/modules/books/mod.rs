pub mod error;
pub mod query;
pub mod repository;
pub mod routes;
pub mod service;

pub use shelf_model::{models, validation};

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use once_cell::sync::{Lazy, OnceCell};
use serde_json::{json, Value};
use shelf_kernel::{InitCtx, Migration, Module};

use service::BooksService;

const MIGRATIONS: &[Migration] = &[Migration {
    id: "001_init",
    up: include_str!("sql/001_init.sql"),
}];

/// Inventory of books, mounted under `/api/book`
#[derive(Default)]
pub struct BooksModule {
    service: OnceCell<Arc<BooksService>>,
}

impl BooksModule {
    pub fn new() -> Self {
        Self::default()
    }

    /// The service opened during `init`, if any
    pub fn service(&self) -> Option<&Arc<BooksService>> {
        self.service.get()
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "book"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        if self.service.get().is_some() {
            return Ok(());
        }

        let service = BooksService::open(ctx.db, ctx.settings.books.clone());
        let count = service.count().await?;
        let _ = self.service.set(Arc::new(service));

        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            books = count,
            persistent = ctx.db.path().is_some(),
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        match self.service.get() {
            Some(service) => routes::router(service.clone()),
            None => {
                tracing::warn!(module = self.name(), "routes requested before init");
                Router::new()
            }
        }
    }

    fn openapi(&self) -> Option<Value> {
        Some(OPENAPI.clone())
    }

    fn migrations(&self) -> Vec<Migration> {
        MIGRATIONS.to_vec()
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create a new instance of the books module
pub fn create_module() -> Arc<dyn Module> {
    Arc::new(BooksModule::new())
}

/// In-memory database with the books schema applied
#[cfg(test)]
pub(crate) async fn migrated_db() -> shelf_db::Database {
    let db = shelf_db::Database::in_memory().await.unwrap();
    for migration in MIGRATIONS {
        db.apply("book", migration).await.unwrap();
    }
    db
}

fn error_response(description: &str) -> Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        }
    })
}

fn book_response(description: &str) -> Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/BookResponse" }
            }
        }
    })
}

fn book_input_body(schema: &str) -> Value {
    json!({
        "required": true,
        "content": {
            "application/json": {
                "schema": { "$ref": format!("#/components/schemas/{schema}") }
            }
        }
    })
}

fn id_parameter() -> Value {
    json!({
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "string", "format": "uuid" }
    })
}

fn query_parameter(name: &str, schema: Value, description: &str) -> Value {
    json!({
        "name": name,
        "in": "query",
        "required": false,
        "description": description,
        "schema": schema
    })
}

fn book_properties() -> Value {
    json!({
        "title": { "type": "string" },
        "author": { "type": "string" },
        "isbn": { "type": "string", "minLength": 10, "maxLength": 17 },
        "publishedDate": { "type": "string", "format": "date-time" },
        "publisher": { "type": "string" },
        "pages": { "type": "integer", "minimum": 1 },
        "genre": { "type": "string" },
        "description": { "type": "string", "minLength": 10 },
        "price": { "type": "string", "description": "Decimal with two places, e.g. \"19.90\"" },
        "stock": { "type": "integer", "minimum": 0 }
    })
}

static OPENAPI: Lazy<Value> = Lazy::new(|| {
    let mut book_properties_with_meta = book_properties();
    if let Some(properties) = book_properties_with_meta.as_object_mut() {
        properties.insert("id".into(), json!({ "type": "string", "format": "uuid" }));
        properties.insert(
            "createdAt".into(),
            json!({ "type": "string", "format": "date-time" }),
        );
        properties.insert(
            "updatedAt".into(),
            json!({ "type": "string", "format": "date-time" }),
        );
    }

    json!({
        "paths": {
            "/": {
                "get": {
                    "summary": "List books",
                    "tags": ["Books"],
                    "parameters": [
                        query_parameter("page", json!({ "type": "integer", "minimum": 1, "default": 1 }), "1-based page number"),
                        query_parameter("limit", json!({ "type": "integer", "minimum": 1, "maximum": 100, "default": 10 }), "Page size"),
                        query_parameter("search", json!({ "type": "string" }), "Matches title, author, isbn or genre")
                    ],
                    "responses": {
                        "200": {
                            "description": "A page of books, newest first",
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/BookListResponse" }
                                }
                            }
                        }
                    }
                },
                "post": {
                    "summary": "Create a book",
                    "tags": ["Books"],
                    "requestBody": book_input_body("BookInput"),
                    "responses": {
                        "201": book_response("Book created"),
                        "400": error_response("Validation failed"),
                        "409": error_response("ISBN already in use"),
                        "500": error_response("Internal server error")
                    }
                }
            },
            "/{id}": {
                "get": {
                    "summary": "Get a book",
                    "tags": ["Books"],
                    "parameters": [id_parameter()],
                    "responses": {
                        "200": book_response("Book found"),
                        "404": error_response("Book not found")
                    }
                },
                "patch": {
                    "summary": "Update supplied fields of a book",
                    "tags": ["Books"],
                    "parameters": [id_parameter()],
                    "requestBody": book_input_body("BookPatch"),
                    "responses": {
                        "200": book_response("Book updated"),
                        "400": error_response("Validation failed"),
                        "404": error_response("Book not found"),
                        "409": error_response("ISBN already in use")
                    }
                },
                "delete": {
                    "summary": "Delete a book",
                    "tags": ["Books"],
                    "parameters": [id_parameter()],
                    "responses": {
                        "200": book_response("Book deleted"),
                        "404": error_response("Book not found")
                    }
                }
            },
            "/health": {
                "get": {
                    "summary": "Books health check",
                    "tags": ["Books"],
                    "responses": {
                        "200": {
                            "description": "OK",
                            "content": { "text/plain": { "schema": { "type": "string" } } }
                        }
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Book": {
                    "type": "object",
                    "properties": book_properties_with_meta,
                    "required": [
                        "id", "title", "author", "isbn", "publishedDate", "publisher",
                        "pages", "genre", "description", "price", "stock",
                        "createdAt", "updatedAt"
                    ]
                },
                "BookInput": {
                    "type": "object",
                    "properties": book_properties(),
                    "required": [
                        "title", "author", "isbn", "publishedDate", "publisher",
                        "pages", "genre", "description", "price"
                    ]
                },
                "BookPatch": {
                    "type": "object",
                    "properties": book_properties()
                },
                "BookResponse": {
                    "type": "object",
                    "properties": {
                        "success": { "type": "boolean" },
                        "message": { "type": "string" },
                        "data": { "$ref": "#/components/schemas/Book" }
                    }
                },
                "BookListResponse": {
                    "type": "object",
                    "properties": {
                        "success": { "type": "boolean" },
                        "data": {
                            "type": "array",
                            "items": { "$ref": "#/components/schemas/Book" }
                        },
                        "pagination": {
                            "type": "object",
                            "properties": {
                                "page": { "type": "integer" },
                                "limit": { "type": "integer" },
                                "totalBooks": { "type": "integer" },
                                "totalPages": { "type": "integer" }
                            }
                        }
                    }
                }
            }
        }
    })
});

#[cfg(test)]
mod tests {
    use super::*;
    use shelf_kernel::settings::Settings;

    #[tokio::test]
    async fn init_is_idempotent_and_enables_routes() {
        let module = BooksModule::new();
        assert!(module.service().is_none());

        let settings = Settings::default();
        let db = migrated_db().await;
        let ctx = InitCtx {
            settings: &settings,
            db: &db,
        };

        module.init(&ctx).await.unwrap();
        let first = module.service().cloned().unwrap();
        module.init(&ctx).await.unwrap();

        assert!(Arc::ptr_eq(&first, module.service().unwrap()));
    }

    #[tokio::test]
    async fn schema_declares_unique_isbn_index() {
        let migrations = BooksModule::new().migrations();

        assert_eq!(migrations.len(), 1);
        assert!(migrations[0]
            .up
            .contains("CREATE UNIQUE INDEX IF NOT EXISTS books_isbn_key_unique ON books (isbn_key)"));

        let db = migrated_db().await;
        assert!(!db.apply("book", &migrations[0]).await.unwrap());
    }

    #[test]
    fn openapi_documents_every_route() {
        let fragment = BooksModule::new().openapi().unwrap();
        let paths = fragment["paths"].as_object().unwrap();

        assert!(paths.contains_key("/"));
        assert!(paths.contains_key("/{id}"));
        assert!(paths.contains_key("/health"));
        for method in ["get", "patch", "delete"] {
            assert!(paths["/{id}"].get(method).is_some(), "missing {method}");
        }
        assert!(fragment["components"]["schemas"]["Book"]["properties"]["createdAt"].is_object());
    }
}
