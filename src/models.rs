//! Row and parameter types for the bookstore schema.
//!
//! Entities mirror the `author`, `publisher`, `book` and `author_book` tables.
//! Values are plain copies: nothing here holds a handle to the store.

mod ids;
mod row;

use serde::{Deserialize, Serialize};

pub use ids::{AuthorId, BookId, PublisherId};
pub use row::FromPgRow;
pub(crate) use row::decode_all;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: AuthorId,
    pub name: String,
    pub bio: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publisher {
    pub id: PublisherId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub publisher_id: PublisherId,
}

/// One row of the many-to-many link between authors and books. The pair is
/// also the key used to look an association up or delete it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AuthorBook {
    pub author_id: AuthorId,
    pub book_id: BookId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAuthorParams {
    pub id: AuthorId,
    pub name: String,
    pub bio: Option<String>,
}

/// Overwrites both mutable author fields; `bio: None` clears the biography.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateAuthorParams {
    pub id: AuthorId,
    pub name: String,
    pub bio: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePublisherParams {
    pub id: PublisherId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatePublisherParams {
    pub id: PublisherId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBookParams {
    pub id: BookId,
    pub title: String,
    pub publisher_id: PublisherId,
}

/// A book's publisher is fixed at creation; only the title is mutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateBookParams {
    pub id: BookId,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookWithPublisher {
    pub book_id: BookId,
    pub book_title: String,
    pub publisher_id: PublisherId,
    pub publisher_name: String,
}

/// One book of a publisher, with the publisher's fields repeated per row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublisherBook {
    pub publisher_id: PublisherId,
    pub publisher_name: String,
    pub book_id: BookId,
    pub book_title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorBookDetail {
    pub author_id: AuthorId,
    pub author_name: String,
    pub author_bio: Option<String>,
    pub book_id: BookId,
    pub book_title: String,
}

impl From<&Author> for CreateAuthorParams {
    fn from(author: &Author) -> Self {
        Self {
            id: author.id,
            name: author.name.clone(),
            bio: author.bio.clone(),
        }
    }
}

impl From<CreateAuthorParams> for Author {
    fn from(params: CreateAuthorParams) -> Self {
        Self {
            id: params.id,
            name: params.name,
            bio: params.bio,
        }
    }
}

impl From<CreatePublisherParams> for Publisher {
    fn from(params: CreatePublisherParams) -> Self {
        Self {
            id: params.id,
            name: params.name,
        }
    }
}

impl From<CreateBookParams> for Book {
    fn from(params: CreateBookParams) -> Self {
        Self {
            id: params.id,
            title: params.title,
            publisher_id: params.publisher_id,
        }
    }
}
