//! Input rules for the libros endpoints.

use once_cell::sync::Lazy;
use regex::Regex;

use super::models::{BookChanges, BookPayload, NewBook};

// ASCII only; `\d` would also accept other Unicode digits.
static ISBN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{13}$").expect("ISBN pattern is a valid regex"));

/// An ISBN is accepted when it is exactly 13 decimal digits. No checksum.
pub fn is_valid_isbn(isbn: &str) -> bool {
    ISBN_PATTERN.is_match(isbn)
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

/// Why a payload was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    InvalidIsbn,
    MissingField,
}

impl BookPayload {
    /// `nombre`, `autor` and a well-formed `ISBN` are mandatory.
    pub fn into_new_book(self) -> Result<NewBook, Rejection> {
        if !present(&self.nombre) || !present(&self.autor) {
            return Err(Rejection::MissingField);
        }
        let isbn = self.isbn.ok_or(Rejection::MissingField)?;
        if !is_valid_isbn(&isbn) {
            return Err(Rejection::InvalidIsbn);
        }

        Ok(NewBook {
            nombre: self.nombre.unwrap_or_default(),
            autor: self.autor.unwrap_or_default(),
            categoria: self.categoria.flatten(),
            anio_publicacion: self.anio_publicacion.flatten(),
            isbn,
        })
    }

    /// The ISBN is checked first; `nombre` and `autor` may be omitted but
    /// never blanked.
    pub fn into_changes(self) -> Result<BookChanges, Rejection> {
        let isbn = match self.isbn {
            Some(isbn) if is_valid_isbn(&isbn) => isbn,
            _ => return Err(Rejection::InvalidIsbn),
        };
        if (self.nombre.is_some() && !present(&self.nombre))
            || (self.autor.is_some() && !present(&self.autor))
        {
            return Err(Rejection::MissingField);
        }

        Ok(BookChanges {
            nombre: self.nombre,
            autor: self.autor,
            categoria: self.categoria,
            anio_publicacion: self.anio_publicacion,
            isbn,
        })
    }
}
