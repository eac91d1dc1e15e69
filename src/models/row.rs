use tokio_postgres::Row;

use crate::error::BookstoreDbError;

use super::{Author, AuthorBook, AuthorBookDetail, Book, BookWithPublisher, Publisher, PublisherBook};

/// Decode a model from a result row by column name.
///
/// Column names are the ones the queries select, so a mismatch here is a
/// schema drift and surfaces as a driver error rather than a panic.
pub trait FromPgRow: Sized {
    /// # Errors
    /// Returns `BookstoreDbError` if a column is missing or has the wrong type.
    fn from_row(row: &Row) -> Result<Self, BookstoreDbError>;
}

impl FromPgRow for Author {
    fn from_row(row: &Row) -> Result<Self, BookstoreDbError> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            bio: row.try_get("bio")?,
        })
    }
}

impl FromPgRow for Publisher {
    fn from_row(row: &Row) -> Result<Self, BookstoreDbError> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
        })
    }
}

impl FromPgRow for Book {
    fn from_row(row: &Row) -> Result<Self, BookstoreDbError> {
        Ok(Self {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            publisher_id: row.try_get("publisher_id")?,
        })
    }
}

impl FromPgRow for AuthorBook {
    fn from_row(row: &Row) -> Result<Self, BookstoreDbError> {
        Ok(Self {
            author_id: row.try_get("author_id")?,
            book_id: row.try_get("book_id")?,
        })
    }
}

impl FromPgRow for BookWithPublisher {
    fn from_row(row: &Row) -> Result<Self, BookstoreDbError> {
        Ok(Self {
            book_id: row.try_get("book_id")?,
            book_title: row.try_get("book_title")?,
            publisher_id: row.try_get("publisher_id")?,
            publisher_name: row.try_get("publisher_name")?,
        })
    }
}

impl FromPgRow for PublisherBook {
    fn from_row(row: &Row) -> Result<Self, BookstoreDbError> {
        Ok(Self {
            publisher_id: row.try_get("publisher_id")?,
            publisher_name: row.try_get("publisher_name")?,
            book_id: row.try_get("book_id")?,
            book_title: row.try_get("book_title")?,
        })
    }
}

impl FromPgRow for AuthorBookDetail {
    fn from_row(row: &Row) -> Result<Self, BookstoreDbError> {
        Ok(Self {
            author_id: row.try_get("author_id")?,
            author_name: row.try_get("author_name")?,
            author_bio: row.try_get("author_bio")?,
            book_id: row.try_get("book_id")?,
            book_title: row.try_get("book_title")?,
        })
    }
}

/// Decode every row, stopping at the first failure.
///
/// # Errors
/// Returns the first decoding error.
pub(crate) fn decode_all<T: FromPgRow>(rows: &[Row]) -> Result<Vec<T>, BookstoreDbError> {
    rows.iter().map(T::from_row).collect()
}
