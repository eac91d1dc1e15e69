#![cfg(feature = "test-utils")]

mod common;

use bookstore_db::prelude::*;
use common::{assert_constraint, author, book, publisher, with_store};

#[test]
fn link_get_unlink_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    with_store(async |db| {
        with_rollback(db.checkout().await?, async |tx| {
            let q = tx.queries();
            let a = author("author001", Some("author001"));
            let p = publisher("publisher001");
            let b = book("book001", p.id);
            q.create_author(&a).await?;
            q.create_publisher(&p).await?;
            q.create_book(&b).await?;

            let link = AuthorBook {
                author_id: a.id,
                book_id: b.id,
            };
            q.create_author_book(&link).await?;
            assert_eq!(q.get_author_book(&link).await?, link);

            assert_eq!(q.delete_author_book(&link).await?, 1);
            let err = q.get_author_book(&link).await.unwrap_err();
            assert!(err.is_not_found(), "unexpected error: {err:?}");
            assert_eq!(q.delete_author_book(&link).await?, 0);
            Ok(())
        })
        .await
    })
}

#[test]
fn list_with_details_covers_every_link() -> Result<(), Box<dyn std::error::Error>> {
    with_store(async |db| {
        with_rollback(db.checkout().await?, async |tx| {
            let q = tx.queries();
            let house = publisher("Prentice Hall");
            q.create_publisher(&house).await?;

            let authors = [
                author("Brian Kernighan", Some("Bell Labs")),
                author("Rob Pike", None),
            ];
            let books = [
                book("The UNIX Programming Environment", house.id),
                book("The Practice of Programming", house.id),
            ];
            for params in &authors {
                q.create_author(params).await?;
            }
            for params in &books {
                q.create_book(params).await?;
            }

            let mut expected = Vec::new();
            for a in &authors {
                for b in &books {
                    q.create_author_book(&AuthorBook {
                        author_id: a.id,
                        book_id: b.id,
                    })
                    .await?;
                    expected.push(AuthorBookDetail {
                        author_id: a.id,
                        author_name: a.name.clone(),
                        author_bio: a.bio.clone(),
                        book_id: b.id,
                        book_title: b.title.clone(),
                    });
                }
            }
            expected.sort_by_key(|d| (d.author_id, d.book_id));

            assert_eq!(q.list_author_books_with_details().await?, expected);
            Ok(())
        })
        .await
    })
}

#[test]
fn list_with_details_is_empty_without_links() -> Result<(), Box<dyn std::error::Error>> {
    with_store(async |db| {
        with_rollback(db.checkout().await?, async |tx| {
            let q = tx.queries();
            q.create_author(&author("unlinked", None)).await?;
            assert!(q.list_author_books_with_details().await?.is_empty());
            Ok(())
        })
        .await
    })
}

#[test]
fn link_to_unknown_author_or_book_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    with_store(async |db| {
        let conn = db.checkout().await?;
        let q = conn.queries();
        let kernighan = author("Brian Kernighan", None);
        let house = publisher("Prentice Hall");
        let k_and_r = book("The C Programming Language", house.id);
        q.create_author(&kernighan).await?;
        q.create_publisher(&house).await?;
        q.create_book(&k_and_r).await?;

        let unknown_book = AuthorBook {
            author_id: kernighan.id,
            book_id: BookId::new(),
        };
        assert_constraint(
            q.create_author_book(&unknown_book).await,
            ConstraintKind::ForeignKey,
        );

        let unknown_author = AuthorBook {
            author_id: AuthorId::new(),
            book_id: k_and_r.id,
        };
        assert_constraint(
            q.create_author_book(&unknown_author).await,
            ConstraintKind::ForeignKey,
        );

        assert!(q.list_author_books_with_details().await?.is_empty());
        Ok(())
    })
}

#[test]
fn duplicate_link_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    with_store(async |db| {
        let conn = db.checkout().await?;
        let q = conn.queries();
        let kernighan = author("Brian Kernighan", None);
        let house = publisher("Prentice Hall");
        let k_and_r = book("The C Programming Language", house.id);
        q.create_author(&kernighan).await?;
        q.create_publisher(&house).await?;
        q.create_book(&k_and_r).await?;

        let link = AuthorBook {
            author_id: kernighan.id,
            book_id: k_and_r.id,
        };
        q.create_author_book(&link).await?;
        assert_constraint(q.create_author_book(&link).await, ConstraintKind::Unique);

        assert_eq!(q.list_author_books_with_details().await?.len(), 1);
        Ok(())
    })
}

#[test]
fn deleting_linked_author_or_book_is_refused() -> Result<(), Box<dyn std::error::Error>> {
    with_store(async |db| {
        let conn = db.checkout().await?;
        let q = conn.queries();
        let kernighan = author("Brian Kernighan", None);
        let house = publisher("Prentice Hall");
        let k_and_r = book("The C Programming Language", house.id);
        q.create_author(&kernighan).await?;
        q.create_publisher(&house).await?;
        q.create_book(&k_and_r).await?;
        let link = AuthorBook {
            author_id: kernighan.id,
            book_id: k_and_r.id,
        };
        q.create_author_book(&link).await?;

        assert_constraint(
            q.delete_author(kernighan.id).await.map(|_| ()),
            ConstraintKind::ForeignKey,
        );
        assert_constraint(
            q.delete_book(k_and_r.id).await.map(|_| ()),
            ConstraintKind::ForeignKey,
        );

        // Unlinking first makes both deletes go through.
        assert_eq!(q.delete_author_book(&link).await?, 1);
        assert_eq!(q.delete_author(kernighan.id).await?, 1);
        assert_eq!(q.delete_book(k_and_r.id).await?, 1);
        Ok(())
    })
}
