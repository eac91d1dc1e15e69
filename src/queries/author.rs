use crate::error::BookstoreDbError;
use crate::models::{Author, AuthorId, CreateAuthorParams, UpdateAuthorParams};

use super::Queries;

const CREATE_AUTHOR: &str = "INSERT INTO author (id, name, bio) VALUES ($1, $2, $3)";

const GET_AUTHOR: &str = "SELECT id, name, bio FROM author WHERE id = $1";

const UPDATE_AUTHOR: &str = "UPDATE author SET name = $2, bio = $3 WHERE id = $1";

const DELETE_AUTHOR: &str = "DELETE FROM author WHERE id = $1";

const LIST_AUTHORS: &str = "SELECT id, name, bio FROM author ORDER BY id";

impl Queries<'_> {
    /// Insert one author under the caller-chosen id.
    ///
    /// # Errors
    /// `ConstraintViolation` (unique) if the id is taken; driver errors otherwise.
    pub async fn create_author(&self, params: &CreateAuthorParams) -> Result<(), BookstoreDbError> {
        self.execute(
            "create_author",
            CREATE_AUTHOR,
            &[&params.id, &params.name, &params.bio],
        )
        .await?;
        Ok(())
    }

    /// # Errors
    /// `NotFound` if no author has this id.
    pub async fn get_author(&self, id: AuthorId) -> Result<Author, BookstoreDbError> {
        self.fetch_one("get_author", GET_AUTHOR, &[&id], "author", id)
            .await
    }

    /// Overwrite name and bio. Returns the number of rows changed; `0` means
    /// no author has this id.
    ///
    /// # Errors
    /// Driver errors only; a missing row is not an error.
    pub async fn update_author(&self, params: &UpdateAuthorParams) -> Result<u64, BookstoreDbError> {
        self.execute(
            "update_author",
            UPDATE_AUTHOR,
            &[&params.id, &params.name, &params.bio],
        )
        .await
    }

    /// Returns the number of rows removed; `0` means no author has this id.
    ///
    /// # Errors
    /// `ConstraintViolation` (foreign key) while the author is still linked to books.
    pub async fn delete_author(&self, id: AuthorId) -> Result<u64, BookstoreDbError> {
        self.execute("delete_author", DELETE_AUTHOR, &[&id]).await
    }

    /// All authors ordered by id.
    ///
    /// # Errors
    /// Driver errors only; an empty table yields an empty vec.
    pub async fn list_authors(&self) -> Result<Vec<Author>, BookstoreDbError> {
        self.fetch_all("list_authors", LIST_AUTHORS, &[]).await
    }
}
