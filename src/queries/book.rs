use crate::error::BookstoreDbError;
use crate::models::{Book, BookId, BookWithPublisher, CreateBookParams, UpdateBookParams};

use super::Queries;

const CREATE_BOOK: &str = "INSERT INTO book (id, title, publisher_id) VALUES ($1, $2, $3)";

const GET_BOOK: &str = "SELECT id, title, publisher_id FROM book WHERE id = $1";

const UPDATE_BOOK: &str = "UPDATE book SET title = $2 WHERE id = $1";

const DELETE_BOOK: &str = "DELETE FROM book WHERE id = $1";

const LIST_BOOKS: &str = "SELECT id, title, publisher_id FROM book ORDER BY id";

const GET_BOOK_WITH_PUBLISHER: &str = "\
SELECT b.id AS book_id, b.title AS book_title, p.id AS publisher_id, p.name AS publisher_name
FROM book b
JOIN publisher p ON p.id = b.publisher_id
WHERE b.id = $1";

impl Queries<'_> {
    /// # Errors
    /// `ConstraintViolation` (foreign key) if the publisher does not exist, (unique)
    /// if the id is taken.
    pub async fn create_book(&self, params: &CreateBookParams) -> Result<(), BookstoreDbError> {
        self.execute(
            "create_book",
            CREATE_BOOK,
            &[&params.id, &params.title, &params.publisher_id],
        )
        .await?;
        Ok(())
    }

    /// # Errors
    /// `NotFound` if no book has this id.
    pub async fn get_book(&self, id: BookId) -> Result<Book, BookstoreDbError> {
        self.fetch_one("get_book", GET_BOOK, &[&id], "book", id).await
    }

    /// Overwrite the title. Returns the number of rows changed.
    ///
    /// # Errors
    /// Driver errors only.
    pub async fn update_book(&self, params: &UpdateBookParams) -> Result<u64, BookstoreDbError> {
        self.execute("update_book", UPDATE_BOOK, &[&params.id, &params.title])
            .await
    }

    /// Returns the number of rows removed.
    ///
    /// # Errors
    /// `ConstraintViolation` (foreign key) while the book is still linked to authors.
    pub async fn delete_book(&self, id: BookId) -> Result<u64, BookstoreDbError> {
        self.execute("delete_book", DELETE_BOOK, &[&id]).await
    }

    /// # Errors
    /// Driver errors only.
    pub async fn list_books(&self) -> Result<Vec<Book>, BookstoreDbError> {
        self.fetch_all("list_books", LIST_BOOKS, &[]).await
    }

    /// # Errors
    /// `NotFound` if no book has this id.
    pub async fn get_book_with_publisher(
        &self,
        id: BookId,
    ) -> Result<BookWithPublisher, BookstoreDbError> {
        self.fetch_one(
            "get_book_with_publisher",
            GET_BOOK_WITH_PUBLISHER,
            &[&id],
            "book",
            id,
        )
        .await
    }
}
