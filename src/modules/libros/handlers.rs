//! One handler per libros operation.
//!
//! Storage failures are logged in full and answered with a fixed message per
//! operation; nothing from the database reaches the client.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::{IntoResponse, Response},
    Json,
};
use biblioteca_http::error::AppError;
use serde_json::json;

use super::models::{BookPayload, DeleteBody};
use super::repository::{BookRepository, RepositoryError};
use super::validation::{is_valid_isbn, Rejection};

pub type SharedRepository = Arc<dyn BookRepository>;

pub const EMPTY_CATALOGUE: &str = "No se encontraron libros.";
pub const LIST_FAILED: &str = "Error al obtener todos los libros";
pub const BOOK_NOT_FOUND: &str = "Libro no encontrado";
pub const GET_FAILED: &str = "Error al obtener un libro";
pub const INVALID_BOOK: &str = "Datos de libro incorrectos";
pub const DUPLICATE_ISBN: &str = "Este libro ya existe en la base de datos";
pub const CREATE_FAILED: &str = "Error al agregar un libro";
pub const ID_REQUIRED: &str = "Se requiere un ID para eliminar un libro";
pub const ID_MISMATCH: &str = "El ID de la ruta no coincide con el ID del cuerpo";
pub const ID_NOT_FOUND: &str = "No se encontró un libro con ese ID";
pub const DELETE_BY_ID_FAILED: &str = "Error al eliminar un libro por ID";
pub const INVALID_ISBN: &str = "Número de ISBN incorrecto. Debe contener 13 dígitos.";
pub const ISBN_NOT_FOUND: &str = "Libro con este ISBN no encontrado en la base de datos.";
pub const DELETE_BY_ISBN_FAILED: &str = "Error al eliminar un libro por ISBN";
pub const UPDATE_NOT_FOUND: &str = "Libro con este ID no encontrado en la base de datos";
pub const UPDATE_FAILED: &str = "Error al actualizar un libro";

/// Unwrap a JSON body, turning any extractor rejection into a 400 with the
/// operation's own message.
fn body_or<T>(
    body: Result<Json<T>, JsonRejection>,
    message: &'static str,
) -> Result<T, AppError> {
    body.map(|Json(payload)| payload).map_err(|rejection| {
        tracing::debug!(error = %rejection.body_text(), "unreadable request body");
        AppError::bad_request(message)
    })
}

/// Reconcile the id in the path with the one in the body; the body wins
/// when the path segment is not numeric.
fn resolve_id(path_id: &str, body_id: Option<i64>) -> Result<Option<i64>, AppError> {
    let path_id = path_id.parse::<i64>().ok();
    match (path_id, body_id) {
        (Some(path), Some(body)) if path != body => Err(AppError::validation(ID_MISMATCH)),
        (_, Some(body)) => Ok(Some(body)),
        (path, None) => Ok(path),
    }
}

/// `GET /libros`
pub async fn list_books(State(repository): State<SharedRepository>) -> Result<Response, AppError> {
    let books = repository
        .list()
        .await
        .map_err(|e| AppError::internal(LIST_FAILED, e))?;

    if books.is_empty() {
        return Ok(Json(json!({ "message": EMPTY_CATALOGUE })).into_response());
    }

    Ok(Json(books).into_response())
}

/// `GET /libros/{id}`
pub async fn get_book(
    State(repository): State<SharedRepository>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    // Strict parse: "5abc" is not id 5.
    let Ok(id) = id.parse::<i64>() else {
        return Err(AppError::not_found(BOOK_NOT_FOUND));
    };

    let book = repository
        .find_by_id(id)
        .await
        .map_err(|e| AppError::internal(GET_FAILED, e))?
        .ok_or_else(|| AppError::not_found(BOOK_NOT_FOUND))?;

    Ok(Json(book).into_response())
}

/// `POST /libros`
pub async fn create_book(
    State(repository): State<SharedRepository>,
    body: Result<Json<BookPayload>, JsonRejection>,
) -> Result<Response, AppError> {
    let new_book = body_or(body, INVALID_BOOK)?
        .into_new_book()
        .map_err(|_| AppError::validation(INVALID_BOOK))?;

    let existing = repository
        .find_id_by_isbn(&new_book.isbn)
        .await
        .map_err(|e| AppError::internal(CREATE_FAILED, e))?;
    if existing.is_some() {
        return Err(AppError::conflict(DUPLICATE_ISBN));
    }

    let outcome = repository.insert(&new_book).await.map_err(|e| match e {
        // Lost the race against a concurrent create with the same ISBN.
        RepositoryError::UniqueViolation(_) => AppError::conflict(DUPLICATE_ISBN),
        other => AppError::internal(CREATE_FAILED, other),
    })?;

    if outcome.affected_rows != 1 {
        return Err(AppError::internal(
            CREATE_FAILED,
            anyhow::anyhow!("insert reported {} affected rows", outcome.affected_rows),
        ));
    }

    tracing::info!(id = outcome.id, isbn = %new_book.isbn, "book created");
    Ok(Json(json!({ "Id insertado": outcome.id })).into_response())
}

/// `DELETE /libros/{id}`; the id must also be present in the body.
pub async fn delete_book(
    State(repository): State<SharedRepository>,
    Path(path_id): Path<String>,
    body: Result<Json<DeleteBody>, JsonRejection>,
) -> Result<Response, AppError> {
    let id = match body_or(body, ID_REQUIRED)?.id {
        Some(id) if id != 0 => id,
        _ => return Err(AppError::validation(ID_REQUIRED)),
    };
    resolve_id(&path_id, Some(id))?;

    let deleted = repository
        .delete_by_id(id)
        .await
        .map_err(|e| AppError::internal(DELETE_BY_ID_FAILED, e))?;

    if deleted == 0 {
        return Err(AppError::not_found(ID_NOT_FOUND));
    }

    tracing::info!(id, deleted, "book deleted by id");
    Ok(Json(json!({ "Registros eliminados": deleted })).into_response())
}

/// `DELETE /libros/ISBN/{isbn}`
pub async fn delete_book_by_isbn(
    State(repository): State<SharedRepository>,
    Path(isbn): Path<String>,
) -> Result<Response, AppError> {
    if !is_valid_isbn(&isbn) {
        return Err(AppError::validation(INVALID_ISBN));
    }

    let deleted = repository
        .delete_by_isbn(&isbn)
        .await
        .map_err(|e| AppError::internal(DELETE_BY_ISBN_FAILED, e))?;

    if deleted == 0 {
        return Err(AppError::not_found(ISBN_NOT_FOUND));
    }

    tracing::info!(%isbn, deleted, "book deleted by ISBN");
    Ok(Json(json!({ "Registros eliminados": deleted })).into_response())
}

/// `PUT /libros/actualizar/{id}`
pub async fn update_book(
    State(repository): State<SharedRepository>,
    Path(path_id): Path<String>,
    body: Result<Json<BookPayload>, JsonRejection>,
) -> Result<Response, AppError> {
    let payload = body_or(body, INVALID_ISBN)?;
    let body_id = payload.id;

    let changes = payload.into_changes().map_err(|rejection| match rejection {
        Rejection::InvalidIsbn => AppError::validation(INVALID_ISBN),
        Rejection::MissingField => AppError::validation(INVALID_BOOK),
    })?;

    let Some(id) = resolve_id(&path_id, body_id)? else {
        return Err(AppError::not_found(UPDATE_NOT_FOUND));
    };

    let updated = repository.update(id, &changes).await.map_err(|e| match e {
        RepositoryError::UniqueViolation(_) => AppError::conflict(DUPLICATE_ISBN),
        other => AppError::internal(UPDATE_FAILED, other),
    })?;

    if updated == 0 {
        return Err(AppError::not_found(UPDATE_NOT_FOUND));
    }

    tracing::info!(id, updated, "book updated");
    Ok(Json(json!({ "Registros actualizados": updated })).into_response())
}
