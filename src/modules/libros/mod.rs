pub mod handlers;
pub mod models;
pub mod repository;
pub mod routes;
pub mod validation;

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use axum::Router;
use biblioteca_db::Database;
use biblioteca_kernel::{InitCtx, Module};
use serde_json::json;

use handlers::SharedRepository;
use repository::SqlBookRepository;

/// CRUD module for the `libros` table
pub struct LibrosModule {
    repository: SharedRepository,
}

impl LibrosModule {
    pub fn new(repository: SharedRepository) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl Module for LibrosModule {
    fn name(&self) -> &'static str {
        "libros"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        if ctx.settings.database.bootstrap_schema {
            self.repository
                .ensure_schema()
                .await
                .context("failed to create the libros table")?;
        }

        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "libros module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.repository.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi_fragment())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "libros module stopped");
        Ok(())
    }
}

fn error_response(description: &str) -> serde_json::Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        }
    })
}

fn count_response(key: &str) -> serde_json::Value {
    json!({
        "description": "OK",
        "content": {
            "application/json": {
                "schema": {
                    "type": "object",
                    "properties": { key: { "type": "integer" } },
                    "required": [key]
                }
            }
        }
    })
}

fn openapi_fragment() -> serde_json::Value {
    let id_param = json!({
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "integer" }
    });

    json!({
        "paths": {
            "/libros": {
                "get": {
                    "summary": "List books",
                    "tags": ["Libros"],
                    "responses": {
                        "200": {
                            "description": "Every book, or a message when the catalogue is empty",
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "oneOf": [
                                            {
                                                "type": "array",
                                                "items": { "$ref": "#/components/schemas/Book" }
                                            },
                                            {
                                                "type": "object",
                                                "properties": { "message": { "type": "string" } }
                                            }
                                        ]
                                    }
                                }
                            }
                        },
                        "500": error_response("Storage failure")
                    }
                },
                "post": {
                    "summary": "Create a book",
                    "tags": ["Libros"],
                    "requestBody": {
                        "required": true,
                        "content": {
                            "application/json": {
                                "schema": { "$ref": "#/components/schemas/BookInput" }
                            }
                        }
                    },
                    "responses": {
                        "200": count_response("Id insertado"),
                        "400": error_response("Invalid data or duplicate ISBN"),
                        "500": error_response("Storage failure")
                    }
                }
            },
            "/libros/{id}": {
                "get": {
                    "summary": "Get a book by id",
                    "tags": ["Libros"],
                    "parameters": [id_param.clone()],
                    "responses": {
                        "200": {
                            "description": "The book",
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/Book" }
                                }
                            }
                        },
                        "404": error_response("No book with that id"),
                        "500": error_response("Storage failure")
                    }
                },
                "delete": {
                    "summary": "Delete a book by id",
                    "tags": ["Libros"],
                    "parameters": [id_param.clone()],
                    "requestBody": {
                        "required": true,
                        "content": {
                            "application/json": {
                                "schema": {
                                    "type": "object",
                                    "properties": { "id": { "type": "integer" } },
                                    "required": ["id"]
                                }
                            }
                        }
                    },
                    "responses": {
                        "200": count_response("Registros eliminados"),
                        "400": error_response("Missing id"),
                        "404": error_response("No book with that id"),
                        "500": error_response("Storage failure")
                    }
                }
            },
            "/libros/ISBN/{isbn}": {
                "delete": {
                    "summary": "Delete a book by ISBN",
                    "tags": ["Libros"],
                    "parameters": [{
                        "name": "isbn",
                        "in": "path",
                        "required": true,
                        "schema": { "type": "string", "pattern": "^[0-9]{13}$" }
                    }],
                    "responses": {
                        "200": count_response("Registros eliminados"),
                        "400": error_response("Malformed ISBN"),
                        "404": error_response("No book with that ISBN"),
                        "500": error_response("Storage failure")
                    }
                }
            },
            "/libros/actualizar/{id}": {
                "put": {
                    "summary": "Update a book",
                    "tags": ["Libros"],
                    "parameters": [id_param],
                    "requestBody": {
                        "required": true,
                        "content": {
                            "application/json": {
                                "schema": { "$ref": "#/components/schemas/BookInput" }
                            }
                        }
                    },
                    "responses": {
                        "200": count_response("Registros actualizados"),
                        "400": error_response("Malformed ISBN or invalid data"),
                        "404": error_response("No book with that id"),
                        "500": error_response("Storage failure")
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Book": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer" },
                        "nombre": { "type": "string" },
                        "autor": { "type": "string" },
                        "categoria": { "type": ["string", "null"] },
                        "año-publicacion": { "type": ["integer", "null"] },
                        "ISBN": { "type": "string", "pattern": "^[0-9]{13}$" }
                    },
                    "required": ["id", "nombre", "autor", "ISBN"]
                },
                "BookInput": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer" },
                        "nombre": { "type": "string", "minLength": 1 },
                        "autor": { "type": "string", "minLength": 1 },
                        "categoria": { "type": ["string", "null"] },
                        "año-publicacion": { "type": ["integer", "string", "null"] },
                        "ISBN": { "type": ["string", "integer"], "pattern": "^[0-9]{13}$" }
                    },
                    "required": ["ISBN"]
                }
            }
        }
    })
}

/// Build the libros module over the shared pool
pub fn create_module(db: Database) -> Arc<dyn Module> {
    Arc::new(LibrosModule::new(Arc::new(SqlBookRepository::new(db))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_fragment_documents_every_route() {
        let fragment = openapi_fragment();
        let paths = fragment["paths"].as_object().unwrap();

        assert!(paths["/libros"]["get"].is_object());
        assert!(paths["/libros"]["post"].is_object());
        assert!(paths["/libros/{id}"]["get"].is_object());
        assert!(paths["/libros/{id}"]["delete"].is_object());
        assert!(paths["/libros/ISBN/{isbn}"]["delete"].is_object());
        assert!(paths["/libros/actualizar/{id}"]["put"].is_object());
        assert!(fragment["components"]["schemas"]["Book"].is_object());
    }
}
