use crate::error::BookstoreDbError;
use crate::models::{AuthorBook, AuthorBookDetail};

use super::Queries;

const CREATE_AUTHOR_BOOK: &str = "INSERT INTO author_book (author_id, book_id) VALUES ($1, $2)";

const GET_AUTHOR_BOOK: &str =
    "SELECT author_id, book_id FROM author_book WHERE author_id = $1 AND book_id = $2";

const DELETE_AUTHOR_BOOK: &str = "DELETE FROM author_book WHERE author_id = $1 AND book_id = $2";

const LIST_AUTHOR_BOOKS_WITH_DETAILS: &str = "\
SELECT a.id AS author_id, a.name AS author_name, a.bio AS author_bio, b.id AS book_id, b.title AS book_title
FROM author_book ab
JOIN author a ON a.id = ab.author_id
JOIN book b ON b.id = ab.book_id
ORDER BY a.id, b.id";

impl Queries<'_> {
    /// Link an author to a book.
    ///
    /// # Errors
    /// `ConstraintViolation` (foreign key) if either side does not exist, (unique)
    /// if the pair is already linked.
    pub async fn create_author_book(&self, link: &AuthorBook) -> Result<(), BookstoreDbError> {
        self.execute(
            "create_author_book",
            CREATE_AUTHOR_BOOK,
            &[&link.author_id, &link.book_id],
        )
        .await?;
        Ok(())
    }

    /// # Errors
    /// `NotFound` if the pair is not linked.
    pub async fn get_author_book(&self, link: &AuthorBook) -> Result<AuthorBook, BookstoreDbError> {
        self.fetch_one(
            "get_author_book",
            GET_AUTHOR_BOOK,
            &[&link.author_id, &link.book_id],
            "author_book",
            format!("({}, {})", link.author_id, link.book_id),
        )
        .await
    }

    /// Returns the number of links removed; `0` means the pair was not linked.
    ///
    /// # Errors
    /// Driver errors only.
    pub async fn delete_author_book(&self, link: &AuthorBook) -> Result<u64, BookstoreDbError> {
        self.execute(
            "delete_author_book",
            DELETE_AUTHOR_BOOK,
            &[&link.author_id, &link.book_id],
        )
        .await
    }

    /// Every link with the author's fields and the book title, ordered by
    /// author id then book id.
    ///
    /// # Errors
    /// Driver errors only.
    pub async fn list_author_books_with_details(
        &self,
    ) -> Result<Vec<AuthorBookDetail>, BookstoreDbError> {
        self.fetch_all(
            "list_author_books_with_details",
            LIST_AUTHOR_BOOKS_WITH_DETAILS,
            &[],
        )
        .await
    }
}
