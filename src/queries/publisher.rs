use crate::error::BookstoreDbError;
use crate::models::{
    CreatePublisherParams, Publisher, PublisherBook, PublisherId, UpdatePublisherParams,
};

use super::Queries;

const CREATE_PUBLISHER: &str = "INSERT INTO publisher (id, name) VALUES ($1, $2)";

const GET_PUBLISHER: &str = "SELECT id, name FROM publisher WHERE id = $1";

const UPDATE_PUBLISHER: &str = "UPDATE publisher SET name = $2 WHERE id = $1";

const DELETE_PUBLISHER: &str = "DELETE FROM publisher WHERE id = $1";

const LIST_PUBLISHERS: &str = "SELECT id, name FROM publisher ORDER BY id";

const GET_PUBLISHER_WITH_BOOKS: &str = "\
SELECT p.id AS publisher_id, p.name AS publisher_name, b.id AS book_id, b.title AS book_title
FROM publisher p
JOIN book b ON b.publisher_id = p.id
WHERE p.id = $1
ORDER BY b.id";

impl Queries<'_> {
    /// # Errors
    /// `ConstraintViolation` (unique) if the id is taken.
    pub async fn create_publisher(
        &self,
        params: &CreatePublisherParams,
    ) -> Result<(), BookstoreDbError> {
        self.execute("create_publisher", CREATE_PUBLISHER, &[&params.id, &params.name])
            .await?;
        Ok(())
    }

    /// # Errors
    /// `NotFound` if no publisher has this id.
    pub async fn get_publisher(&self, id: PublisherId) -> Result<Publisher, BookstoreDbError> {
        self.fetch_one("get_publisher", GET_PUBLISHER, &[&id], "publisher", id)
            .await
    }

    /// Returns the number of rows changed; `0` means no publisher has this id.
    ///
    /// # Errors
    /// Driver errors only.
    pub async fn update_publisher(
        &self,
        params: &UpdatePublisherParams,
    ) -> Result<u64, BookstoreDbError> {
        self.execute("update_publisher", UPDATE_PUBLISHER, &[&params.id, &params.name])
            .await
    }

    /// Returns the number of rows removed.
    ///
    /// # Errors
    /// `ConstraintViolation` (foreign key) while any book still references the publisher.
    pub async fn delete_publisher(&self, id: PublisherId) -> Result<u64, BookstoreDbError> {
        self.execute("delete_publisher", DELETE_PUBLISHER, &[&id])
            .await
    }

    /// # Errors
    /// Driver errors only.
    pub async fn list_publishers(&self) -> Result<Vec<Publisher>, BookstoreDbError> {
        self.fetch_all("list_publishers", LIST_PUBLISHERS, &[])
            .await
    }

    /// The publisher joined with each of its books, one row per book.
    ///
    /// An unknown publisher and a publisher without books both yield an empty vec.
    ///
    /// # Errors
    /// Driver errors only.
    pub async fn get_publisher_with_books(
        &self,
        id: PublisherId,
    ) -> Result<Vec<PublisherBook>, BookstoreDbError> {
        self.fetch_all("get_publisher_with_books", GET_PUBLISHER_WITH_BOOKS, &[&id])
            .await
    }
}
