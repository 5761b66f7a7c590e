//! Data access for the `libros` table.
//!
//! Every method issues exactly one parameterized statement. The SQL text is
//! shared by both backends; MySQL and SQLite both accept backtick-quoted
//! identifiers, which `año-publicacion` needs.

use async_trait::async_trait;
use biblioteca_db::Database;
use thiserror::Error;

use super::models::{Book, BookChanges, InsertOutcome, NewBook};

const SELECT_ALL: &str =
    "SELECT id, nombre, autor, categoria, `año-publicacion`, ISBN FROM libros";
const SELECT_BY_ID: &str =
    "SELECT id, nombre, autor, categoria, `año-publicacion`, ISBN FROM libros WHERE id = ?";
const SELECT_ID_BY_ISBN: &str = "SELECT id FROM libros WHERE ISBN = ?";
const INSERT: &str =
    "INSERT INTO libros (nombre, autor, categoria, `año-publicacion`, ISBN) VALUES (?, ?, ?, ?, ?)";
const DELETE_BY_ID: &str = "DELETE FROM libros WHERE id = ?";
const DELETE_BY_ISBN: &str = "DELETE FROM libros WHERE ISBN = ?";
// Nullable columns take a "provided" flag so an explicit NULL can be written.
const UPDATE: &str = "UPDATE libros SET \
     nombre = COALESCE(?, nombre), \
     autor = COALESCE(?, autor), \
     categoria = CASE WHEN ? THEN ? ELSE categoria END, \
     `año-publicacion` = CASE WHEN ? THEN ? ELSE `año-publicacion` END, \
     ISBN = ? \
     WHERE id = ?";

const MYSQL_SCHEMA: &str = "CREATE TABLE IF NOT EXISTS libros (
    id BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY,
    nombre VARCHAR(255) NOT NULL,
    autor VARCHAR(255) NOT NULL,
    categoria VARCHAR(255) NULL,
    `año-publicacion` INT NULL,
    ISBN CHAR(13) NOT NULL,
    UNIQUE KEY libros_isbn_unique (ISBN)
) DEFAULT CHARSET = utf8mb4";

const SQLITE_SCHEMA: &str = "CREATE TABLE IF NOT EXISTS libros (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    nombre TEXT NOT NULL,
    autor TEXT NOT NULL,
    categoria TEXT,
    `año-publicacion` INTEGER,
    ISBN TEXT NOT NULL UNIQUE
)";

#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The storage-level ISBN uniqueness constraint rejected the write.
    #[error("ISBN already registered: {0}")]
    UniqueViolation(#[source] sqlx::Error),

    #[error("database failure: {0}")]
    Database(#[source] sqlx::Error),

    #[error("generated id {0} does not fit in a signed 64-bit integer")]
    IdOutOfRange(u64),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::Database(db_error) if db_error.is_unique_violation() => {
                RepositoryError::UniqueViolation(error)
            }
            _ => RepositoryError::Database(error),
        }
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Storage operations behind the libros handlers.
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Create the table when it does not exist yet.
    async fn ensure_schema(&self) -> RepositoryResult<()>;

    /// All rows in storage order.
    async fn list(&self) -> RepositoryResult<Vec<Book>>;

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Book>>;

    async fn find_id_by_isbn(&self, isbn: &str) -> RepositoryResult<Option<i64>>;

    async fn insert(&self, book: &NewBook) -> RepositoryResult<InsertOutcome>;

    /// Returns the number of deleted rows.
    async fn delete_by_id(&self, id: i64) -> RepositoryResult<u64>;

    /// Returns the number of deleted rows.
    async fn delete_by_isbn(&self, isbn: &str) -> RepositoryResult<u64>;

    /// Returns the number of rows matched by `id`.
    async fn update(&self, id: i64, changes: &BookChanges) -> RepositoryResult<u64>;
}

/// Runs the same statement-building expression against whichever pool is live.
macro_rules! on_pool {
    ($db:expr, $pool:ident => $body:expr) => {
        match $db {
            Database::MySql($pool) => $body,
            Database::Sqlite($pool) => $body,
        }
    };
}

/// [`BookRepository`] backed by the shared connection pool.
#[derive(Debug, Clone)]
pub struct SqlBookRepository {
    db: Database,
}

impl SqlBookRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BookRepository for SqlBookRepository {
    async fn ensure_schema(&self) -> RepositoryResult<()> {
        match &self.db {
            Database::MySql(pool) => {
                sqlx::query(MYSQL_SCHEMA).execute(pool).await?;
            }
            Database::Sqlite(pool) => {
                sqlx::query(SQLITE_SCHEMA).execute(pool).await?;
            }
        }
        tracing::info!(backend = ?self.db.backend(), "libros schema ensured");
        Ok(())
    }

    async fn list(&self) -> RepositoryResult<Vec<Book>> {
        let books = on_pool!(&self.db, pool => {
            sqlx::query_as::<_, Book>(SELECT_ALL).fetch_all(pool).await?
        });
        Ok(books)
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Book>> {
        let book = on_pool!(&self.db, pool => {
            sqlx::query_as::<_, Book>(SELECT_BY_ID)
                .bind(id)
                .fetch_optional(pool)
                .await?
        });
        Ok(book)
    }

    async fn find_id_by_isbn(&self, isbn: &str) -> RepositoryResult<Option<i64>> {
        let id = on_pool!(&self.db, pool => {
            sqlx::query_scalar::<_, i64>(SELECT_ID_BY_ISBN)
                .bind(isbn)
                .fetch_optional(pool)
                .await?
        });
        Ok(id)
    }

    async fn insert(&self, book: &NewBook) -> RepositoryResult<InsertOutcome> {
        match &self.db {
            Database::MySql(pool) => {
                let result = sqlx::query(INSERT)
                    .bind(&book.nombre)
                    .bind(&book.autor)
                    .bind(&book.categoria)
                    .bind(book.anio_publicacion)
                    .bind(&book.isbn)
                    .execute(pool)
                    .await?;
                let id = result.last_insert_id();
                Ok(InsertOutcome {
                    affected_rows: result.rows_affected(),
                    id: i64::try_from(id).map_err(|_| RepositoryError::IdOutOfRange(id))?,
                })
            }
            Database::Sqlite(pool) => {
                let result = sqlx::query(INSERT)
                    .bind(&book.nombre)
                    .bind(&book.autor)
                    .bind(&book.categoria)
                    .bind(book.anio_publicacion)
                    .bind(&book.isbn)
                    .execute(pool)
                    .await?;
                Ok(InsertOutcome {
                    affected_rows: result.rows_affected(),
                    id: result.last_insert_rowid(),
                })
            }
        }
    }

    async fn delete_by_id(&self, id: i64) -> RepositoryResult<u64> {
        let deleted = on_pool!(&self.db, pool => {
            sqlx::query(DELETE_BY_ID)
                .bind(id)
                .execute(pool)
                .await?
                .rows_affected()
        });
        Ok(deleted)
    }

    async fn delete_by_isbn(&self, isbn: &str) -> RepositoryResult<u64> {
        let deleted = on_pool!(&self.db, pool => {
            sqlx::query(DELETE_BY_ISBN)
                .bind(isbn)
                .execute(pool)
                .await?
                .rows_affected()
        });
        Ok(deleted)
    }

    async fn update(&self, id: i64, changes: &BookChanges) -> RepositoryResult<u64> {
        let matched = on_pool!(&self.db, pool => {
            sqlx::query(UPDATE)
                .bind(&changes.nombre)
                .bind(&changes.autor)
                .bind(changes.categoria.is_some())
                .bind(changes.categoria.as_ref().and_then(|c| c.as_deref()))
                .bind(changes.anio_publicacion.is_some())
                .bind(changes.anio_publicacion.flatten())
                .bind(&changes.isbn)
                .bind(id)
                .execute(pool)
                .await?
                .rows_affected()
        });
        Ok(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use biblioteca_kernel::settings::DatabaseSettings;

    async fn repository() -> SqlBookRepository {
        let db = Database::connect(&DatabaseSettings::in_memory_sqlite())
            .await
            .unwrap();
        let repository = SqlBookRepository::new(db);
        repository.ensure_schema().await.unwrap();
        repository
    }

    fn dune() -> NewBook {
        NewBook {
            nombre: "Dune".to_string(),
            autor: "Herbert".to_string(),
            categoria: Some("SciFi".to_string()),
            anio_publicacion: Some(1965),
            isbn: "9780441013593".to_string(),
        }
    }

    #[tokio::test]
    async fn insert_then_find_round_trips_every_column() {
        let repository = repository().await;

        let outcome = repository.insert(&dune()).await.unwrap();
        assert_eq!(outcome.affected_rows, 1);
        assert!(outcome.id > 0);

        let book = repository.find_by_id(outcome.id).await.unwrap().unwrap();
        assert_eq!(book.nombre, "Dune");
        assert_eq!(book.categoria.as_deref(), Some("SciFi"));
        assert_eq!(book.anio_publicacion, Some(1965));
        assert_eq!(book.isbn, "9780441013593");

        assert_eq!(
            repository.find_id_by_isbn("9780441013593").await.unwrap(),
            Some(outcome.id)
        );
        assert_eq!(repository.find_id_by_isbn("0000000000000").await.unwrap(), None);
    }

    #[tokio::test]
    async fn ensure_schema_is_idempotent() {
        let repository = repository().await;
        repository.ensure_schema().await.unwrap();
        assert!(repository.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_isbn_is_a_unique_violation() {
        let repository = repository().await;
        repository.insert(&dune()).await.unwrap();

        let err = repository.insert(&dune()).await.unwrap_err();
        assert!(matches!(err, RepositoryError::UniqueViolation(_)));
        assert_eq!(repository.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_keeps_omitted_columns() {
        let repository = repository().await;
        let id = repository.insert(&dune()).await.unwrap().id;

        let changes = BookChanges {
            nombre: None,
            autor: Some("Frank Herbert".to_string()),
            categoria: None,
            anio_publicacion: None,
            isbn: "9780441013593".to_string(),
        };
        assert_eq!(repository.update(id, &changes).await.unwrap(), 1);
        assert_eq!(repository.update(id + 1, &changes).await.unwrap(), 0);

        let book = repository.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(book.nombre, "Dune");
        assert_eq!(book.autor, "Frank Herbert");
        assert_eq!(book.categoria.as_deref(), Some("SciFi"));
        assert_eq!(book.anio_publicacion, Some(1965));
    }

    #[tokio::test]
    async fn update_writes_explicit_nulls() {
        let repository = repository().await;
        let id = repository.insert(&dune()).await.unwrap().id;

        let changes = BookChanges {
            nombre: None,
            autor: None,
            categoria: Some(None),
            anio_publicacion: Some(None),
            isbn: "9780441013593".to_string(),
        };
        assert_eq!(repository.update(id, &changes).await.unwrap(), 1);

        let book = repository.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(book.nombre, "Dune");
        assert_eq!(book.categoria, None);
        assert_eq!(book.anio_publicacion, None);
    }

    #[tokio::test]
    async fn identical_update_still_counts_the_row() {
        let repository = repository().await;
        let id = repository.insert(&dune()).await.unwrap().id;

        let same = BookChanges {
            nombre: Some("Dune".to_string()),
            autor: Some("Herbert".to_string()),
            categoria: Some(Some("SciFi".to_string())),
            anio_publicacion: Some(Some(1965)),
            isbn: "9780441013593".to_string(),
        };
        assert_eq!(repository.update(id, &same).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn deletes_report_affected_rows() {
        let repository = repository().await;
        let id = repository.insert(&dune()).await.unwrap().id;

        assert_eq!(repository.delete_by_isbn("9780000000000").await.unwrap(), 0);
        assert_eq!(repository.delete_by_id(id).await.unwrap(), 1);
        assert_eq!(repository.delete_by_id(id).await.unwrap(), 0);
        assert!(repository.find_by_id(id).await.unwrap().is_none());
    }
}
