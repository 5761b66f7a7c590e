use axum::{
    routing::{delete, get, put},
    Router,
};

use super::handlers::{self, SharedRepository};

/// HTTP surface of the libros collection.
pub fn router(repository: SharedRepository) -> Router {
    Router::new()
        .route("/libros", get(handlers::list_books).post(handlers::create_book))
        .route(
            "/libros/{id}",
            get(handlers::get_book).delete(handlers::delete_book),
        )
        .route("/libros/ISBN/{isbn}", delete(handlers::delete_book_by_isbn))
        .route("/libros/actualizar/{id}", put(handlers::update_book))
        .with_state(repository)
}
