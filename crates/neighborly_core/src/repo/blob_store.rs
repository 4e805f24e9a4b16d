//! Named blob storage contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide load/save/delete of named text blobs.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Blob names are non-blank and compared verbatim.
//! - `save_blob` is an upsert; `updated_at` moves on every write.

use crate::db::DbError;
use crate::model::post::PostValidationError;
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by blob-backed repositories.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    InvalidBlobName(String),
    NotFound(String),
    InvalidData(String),
    Validation(PostValidationError),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidBlobName(name) => write!(f, "invalid blob name: `{name}`"),
            Self::NotFound(name) => write!(f, "record not found: {name}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::Validation(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::InvalidBlobName(_) | Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<PostValidationError> for RepoError {
    fn from(value: PostValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Abstract "load/save a named blob" storage.
pub trait BlobStore {
    fn load_blob(&self, name: &str) -> RepoResult<Option<String>>;
    fn save_blob(&self, name: &str, body: &str) -> RepoResult<()>;
    /// Returns whether a blob was removed.
    fn delete_blob(&self, name: &str) -> RepoResult<bool>;
    /// Names starting with `prefix`, sorted ascending.
    fn list_blob_names(&self, prefix: &str) -> RepoResult<Vec<String>>;
}

impl<S: BlobStore + ?Sized> BlobStore for &S {
    fn load_blob(&self, name: &str) -> RepoResult<Option<String>> {
        (**self).load_blob(name)
    }

    fn save_blob(&self, name: &str, body: &str) -> RepoResult<()> {
        (**self).save_blob(name, body)
    }

    fn delete_blob(&self, name: &str) -> RepoResult<bool> {
        (**self).delete_blob(name)
    }

    fn list_blob_names(&self, prefix: &str) -> RepoResult<Vec<String>> {
        (**self).list_blob_names(prefix)
    }
}

/// SQLite-backed blob store over the `blobs` table.
pub struct SqliteBlobStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBlobStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl BlobStore for SqliteBlobStore<'_> {
    fn load_blob(&self, name: &str) -> RepoResult<Option<String>> {
        let name = validate_blob_name(name)?;
        let body = self
            .conn
            .query_row("SELECT body FROM blobs WHERE name = ?1;", [name], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(body)
    }

    fn save_blob(&self, name: &str, body: &str) -> RepoResult<()> {
        let name = validate_blob_name(name)?;
        self.conn.execute(
            "INSERT INTO blobs (name, body) VALUES (?1, ?2)
             ON CONFLICT(name) DO UPDATE SET
                body = excluded.body,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![name, body],
        )?;
        Ok(())
    }

    fn delete_blob(&self, name: &str) -> RepoResult<bool> {
        let name = validate_blob_name(name)?;
        let changed = self
            .conn
            .execute("DELETE FROM blobs WHERE name = ?1;", [name])?;
        Ok(changed > 0)
    }

    fn list_blob_names(&self, prefix: &str) -> RepoResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM blobs
             WHERE substr(name, 1, length(?1)) = ?1
             ORDER BY name ASC;",
        )?;
        let mut rows = stmt.query([prefix])?;
        let mut names = Vec::new();
        while let Some(row) = rows.next()? {
            names.push(row.get::<_, String>(0)?);
        }
        Ok(names)
    }
}

fn validate_blob_name(name: &str) -> RepoResult<&str> {
    if name.trim().is_empty() {
        return Err(RepoError::InvalidBlobName(name.to_string()));
    }
    Ok(name)
}
