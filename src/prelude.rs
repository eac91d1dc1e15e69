//! Convenient imports for common functionality.
//!
//! Brings in the store handle, the transaction scopes, the query layer and
//! every model type.

pub use crate::config::DbConfig;
pub use crate::error::{BookstoreDbError, ConstraintKind};
pub use crate::migrations::{apply_migrations, latest_version};
pub use crate::models::{
    Author, AuthorBook, AuthorBookDetail, AuthorId, Book, BookId, BookWithPublisher,
    CreateAuthorParams, CreateBookParams, CreatePublisherParams, Publisher, PublisherBook,
    PublisherId, UpdateAuthorParams, UpdateBookParams, UpdatePublisherParams,
};
pub use crate::queries::Queries;
pub use crate::typed::{Db, Idle, InTx, PgConnection, Queryable, with_rollback, with_transaction};

pub use tokio_util::sync::CancellationToken;
