//! Catalog service: books, their genre and author links, and the
//! showcase queries of the storefront.

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{
            Book, BookDetail, BookLookup, BookSales, CreateBook, LinkedBook, UpdateBook,
            SHOWCASE_LIMIT,
        },
        Author, Genre,
    },
    repository::{Repository, UnitOfWork},
};

use super::{authors, genres};

#[derive(Clone)]
pub struct CatalogService {
    repository: Arc<dyn Repository>,
}

fn book_not_found(book_id: i32) -> AppError {
    AppError::NotFound(format!("Book {} not found", book_id))
}

/// Genre the book is currently linked to, if any
async fn linked_genre(uow: &mut dyn UnitOfWork, book_id: i32) -> AppResult<Option<Genre>> {
    match uow.book_genre_active(book_id).await? {
        Some(link) => uow.genre_by_id(link.genre_id).await,
        None => Ok(None),
    }
}

/// Author the book is currently linked to, if any
async fn linked_author(uow: &mut dyn UnitOfWork, book_id: i32) -> AppResult<Option<Author>> {
    match uow.book_author_active(book_id).await? {
        Some(link) => uow.author_by_id(link.author_id).await,
        None => Ok(None),
    }
}

impl CatalogService {
    pub fn new(repository: Arc<dyn Repository>) -> Self {
        Self { repository }
    }

    /// Book detail. Deleted books are still returned.
    pub async fn get_book(&self, lookup: BookLookup) -> AppResult<BookDetail> {
        let BookLookup { book_id, user_id } = lookup;
        let mut uow = self.repository.begin().await?;

        let book = uow
            .book_by_id(book_id)
            .await?
            .ok_or_else(|| book_not_found(book_id))?;
        let genre = linked_genre(uow.as_mut(), book_id).await?;
        let author = linked_author(uow.as_mut(), book_id).await?;

        let wishlist = if user_id != 0 {
            let rating = uow.rating_by_pair(user_id, book_id).await?;
            Some(rating.map(|r| !r.deleted && r.wishlist).unwrap_or(false))
        } else {
            None
        };
        let comments = uow.ratings_active_by_book(book_id).await?;

        tracing::debug!("Book {} loaded with {} comments", book_id, comments.len());
        Ok(BookDetail {
            book,
            genre,
            author,
            wishlist,
            comments,
        })
    }

    /// Create a book and link it to its genre and author, both resolved by
    /// name and created when missing.
    pub async fn create_book(&self, request: CreateBook) -> AppResult<LinkedBook> {
        let mut uow = self.repository.begin().await?;

        if uow.book_by_title(request.fields.title.trim()).await?.is_some() {
            tracing::warn!("Rejected duplicate book title: {}", request.fields.title);
            return Err(AppError::Conflict(format!(
                "A book titled {} already exists",
                request.fields.title
            )));
        }

        let book = uow.book_insert(&request.fields).await?;

        let genre = genres::find_or_create(uow.as_mut(), &request.genre).await?;
        if genre.was_created() {
            tracing::info!("Genre created with book: {}", genre.get().name);
        }
        let genre = genre.into_inner();

        let author = authors::find_or_create(uow.as_mut(), &request.author).await?;
        if author.was_created() {
            tracing::info!("Author created with book: {}", author.get().name);
        }
        let author = author.into_inner();

        uow.book_genre_insert(book.book_id, genre.genre_id).await?;
        uow.book_author_insert(book.book_id, author.author_id).await?;
        uow.commit().await?;

        tracing::info!("Book created: id={} title={}", book.book_id, book.title);
        Ok(LinkedBook {
            book,
            genre,
            author,
        })
    }

    /// Rewrite a book and point its links at the given genre and author
    pub async fn update_book(&self, book_id: i32, request: UpdateBook) -> AppResult<LinkedBook> {
        let mut uow = self.repository.begin().await?;

        let genre = uow
            .genre_by_id(request.genre_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Genre {} not found", request.genre_id)))?;
        let author = uow
            .author_by_id(request.author_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Author {} not found", request.author_id)))?;

        if let Some(other) = uow.book_by_title(request.fields.title.trim()).await? {
            if other.book_id != book_id {
                return Err(AppError::Conflict(format!(
                    "A book titled {} already exists",
                    request.fields.title
                )));
            }
        }

        let book = uow
            .book_update(book_id, &request.fields)
            .await?
            .ok_or_else(|| book_not_found(book_id))?;

        // A deleted book keeps its deleted links untouched
        if uow.book_genre_repoint(book_id, genre.genre_id).await? == 0 && !book.deleted {
            uow.book_genre_insert(book_id, genre.genre_id).await?;
        }
        if uow.book_author_repoint(book_id, author.author_id).await? == 0 && !book.deleted {
            uow.book_author_insert(book_id, author.author_id).await?;
        }
        uow.commit().await?;

        tracing::info!("Book updated: id={}", book_id);
        Ok(LinkedBook {
            book,
            genre,
            author,
        })
    }

    /// Soft delete a book together with its genre and author links
    pub async fn delete_book(&self, book_id: i32) -> AppResult<Book> {
        let mut uow = self.repository.begin().await?;
        let book = uow
            .book_mark_deleted(book_id)
            .await?
            .ok_or_else(|| book_not_found(book_id))?;
        uow.book_genre_mark_deleted(book_id).await?;
        uow.book_author_mark_deleted(book_id).await?;
        uow.commit().await?;

        tracing::info!("Book deleted: id={}", book_id);
        Ok(book)
    }

    pub async fn list_all(&self) -> AppResult<Vec<Book>> {
        let mut uow = self.repository.begin().await?;
        uow.books_all().await
    }

    pub async fn list_active(&self) -> AppResult<Vec<Book>> {
        let mut uow = self.repository.begin().await?;
        uow.books_active().await
    }

    /// Active books of a publisher. An empty publisher matches every active book.
    pub async fn list_by_publisher(&self, publisher: &str) -> AppResult<Vec<Book>> {
        let publisher = publisher.trim();
        let mut uow = self.repository.begin().await?;
        if publisher.is_empty() {
            return uow.books_active().await;
        }
        uow.books_by_publisher(publisher).await
    }

    pub async fn list_publishers(&self) -> AppResult<Vec<String>> {
        let mut uow = self.repository.begin().await?;
        uow.publishers().await
    }

    pub async fn list_newest(&self) -> AppResult<Vec<Book>> {
        let mut uow = self.repository.begin().await?;
        uow.books_newest(SHOWCASE_LIMIT).await
    }

    pub async fn list_best_sellers(&self) -> AppResult<Vec<BookSales>> {
        let mut uow = self.repository.begin().await?;
        let books = uow.books_best_selling(SHOWCASE_LIMIT).await?;
        if books.is_empty() {
            return Err(AppError::NotFound("No books have been sold yet".to_string()));
        }
        Ok(books)
    }

    /// Books on a user's wishlist
    pub async fn wishlist_books(&self, user_id: i32) -> AppResult<Vec<Book>> {
        let mut uow = self.repository.begin().await?;
        let ratings = uow.ratings_wishlist_by_user(user_id).await?;

        let mut books = Vec::with_capacity(ratings.len());
        for rating in ratings {
            if let Some(book) = uow.book_by_id(rating.book_id).await? {
                books.push(book);
            }
        }
        tracing::debug!("User {} has {} wishlisted books", user_id, books.len());
        Ok(books)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::*;
    use crate::{
        models::{book::BookFields, rating::RatingValues},
        repository::MemoryRepository,
        services::test_support::{book_fields, create_book},
    };

    fn setup() -> (MemoryRepository, CatalogService) {
        let repo = MemoryRepository::new();
        let service = CatalogService::new(Arc::new(repo.clone()));
        (repo, service)
    }

    fn dated(title: &str, year: i32) -> CreateBook {
        let mut request = create_book(title, "Novela", "Isabel Allende");
        request.fields.pub_date = NaiveDate::from_ymd_opt(year, 1, 1).unwrap();
        request
    }

    #[tokio::test]
    async fn test_create_book_creates_genre_and_author_once() {
        let (repo, service) = setup();
        let created = service
            .create_book(create_book("La casa de los espíritus", "Novela", "Isabel Allende"))
            .await
            .unwrap();
        assert_eq!(created.genre.name, "Novela");

        let state = repo.snapshot().await;
        assert_eq!(state.genres.len(), 1);
        assert_eq!(state.authors.len(), 1);
        assert_eq!(state.book_genres.len(), 1);
        assert_eq!(state.book_authors.len(), 1);
        assert_eq!(state.book_genres[0].book_id, created.book.book_id);
        assert_eq!(state.book_authors[0].author_id, created.author.author_id);
    }

    #[tokio::test]
    async fn test_create_book_reuses_existing_names() {
        let (repo, service) = setup();
        let first = service
            .create_book(create_book("Eva Luna", "Novela", "Isabel Allende"))
            .await
            .unwrap();
        let second = service
            .create_book(create_book("Paula", "novela", "ISABEL ALLENDE"))
            .await
            .unwrap();

        assert_eq!(first.genre.genre_id, second.genre.genre_id);
        assert_eq!(first.author.author_id, second.author.author_id);
        let state = repo.snapshot().await;
        assert_eq!(state.genres.len(), 1);
        assert_eq!(state.authors.len(), 1);
        assert_eq!(state.book_genres.len(), 2);
    }

    #[tokio::test]
    async fn test_create_book_rejects_duplicate_title() {
        let (_, service) = setup();
        service
            .create_book(create_book("Eva Luna", "Novela", "Isabel Allende"))
            .await
            .unwrap();
        let result = service
            .create_book(create_book("eva luna", "Novela", "Isabel Allende"))
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_failed_create_leaves_nothing_behind() {
        let (repo, service) = setup();
        let result = service
            .create_book(create_book("Eva Luna", "Novela", "   "))
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let state = repo.snapshot().await;
        assert!(state.books.is_empty());
        assert!(state.genres.is_empty());
        assert!(state.book_genres.is_empty());
    }

    #[tokio::test]
    async fn test_get_book() {
        let (repo, service) = setup();
        let created = service
            .create_book(create_book("Eva Luna", "Novela", "Isabel Allende"))
            .await
            .unwrap();
        let book_id = created.book.book_id;

        {
            let mut uow = repo.begin().await.unwrap();
            let values = RatingValues {
                user_id: 7,
                book_id,
                score: 4,
                comment: "Muy bueno".to_string(),
                wishlist: true,
            };
            uow.rating_upsert_review(&values, false).await.unwrap();
            uow.commit().await.unwrap();
        }

        let anonymous = service
            .get_book(BookLookup { book_id, user_id: 0 })
            .await
            .unwrap();
        assert_eq!(anonymous.wishlist, None);
        assert_eq!(anonymous.genre.unwrap().name, "Novela");
        assert_eq!(anonymous.author.unwrap().name, "Isabel Allende");
        assert_eq!(anonymous.comments.len(), 1);

        let reader = service.get_book(BookLookup { book_id, user_id: 7 }).await.unwrap();
        assert_eq!(reader.wishlist, Some(true));
        let stranger = service.get_book(BookLookup { book_id, user_id: 8 }).await.unwrap();
        assert_eq!(stranger.wishlist, Some(false));

        let missing = service.get_book(BookLookup { book_id: 99, user_id: 0 }).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_book_marks_links() {
        let (repo, service) = setup();
        let created = service
            .create_book(create_book("Eva Luna", "Novela", "Isabel Allende"))
            .await
            .unwrap();
        let book_id = created.book.book_id;

        assert!(service.delete_book(book_id).await.unwrap().deleted);
        let state = repo.snapshot().await;
        assert!(state.book_genres.iter().all(|bg| bg.deleted));
        assert!(state.book_authors.iter().all(|ba| ba.deleted));

        let detail = service.get_book(BookLookup { book_id, user_id: 0 }).await.unwrap();
        assert!(detail.book.deleted);
        assert!(detail.genre.is_none());

        // Deleting twice succeeds again
        assert!(service.delete_book(book_id).await.is_ok());
        assert!(matches!(service.delete_book(99).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_book_repoints_links() {
        let (repo, service) = setup();
        let created = service
            .create_book(create_book("Eva Luna", "Novela", "Isabel Allende"))
            .await
            .unwrap();
        let other = service
            .create_book(create_book("Canto general", "Poesía", "Pablo Neruda"))
            .await
            .unwrap();

        let mut fields: BookFields = book_fields("Eva Luna", "Plaza & Janés");
        fields.price = Decimal::from(9990);
        let updated = service
            .update_book(
                created.book.book_id,
                UpdateBook {
                    fields,
                    genre_id: other.genre.genre_id,
                    author_id: created.author.author_id,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.book.publisher, "Plaza & Janés");
        assert_eq!(updated.genre.name, "Poesía");

        let state = repo.snapshot().await;
        assert_eq!(state.book_genres.len(), 2);
        let link = state
            .book_genres
            .iter()
            .find(|bg| bg.book_id == created.book.book_id)
            .unwrap();
        assert_eq!(link.genre_id, other.genre.genre_id);

        let missing_genre = service
            .update_book(
                created.book.book_id,
                UpdateBook {
                    fields: book_fields("Eva Luna", "Sudamericana"),
                    genre_id: 99,
                    author_id: created.author.author_id,
                },
            )
            .await;
        assert!(matches!(missing_genre, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_publisher_filter() {
        let (_, service) = setup();
        service
            .create_book(create_book("Eva Luna", "Novela", "Isabel Allende"))
            .await
            .unwrap();
        let mut request = create_book("Canto general", "Poesía", "Pablo Neruda");
        request.fields.publisher = "Losada".to_string();
        let deleted = service.create_book(request).await.unwrap();
        service
            .create_book(create_book("Paula", "Memorias", "Isabel Allende"))
            .await
            .unwrap();
        service.delete_book(deleted.book.book_id).await.unwrap();

        assert_eq!(
            service.list_by_publisher("").await.unwrap(),
            service.list_active().await.unwrap()
        );
        assert_eq!(service.list_by_publisher("Sudamericana").await.unwrap().len(), 2);
        assert!(service.list_by_publisher("Losada").await.unwrap().is_empty());
        assert_eq!(service.list_all().await.unwrap().len(), 3);
        assert_eq!(service.list_publishers().await.unwrap(), vec!["Sudamericana"]);
    }

    #[tokio::test]
    async fn test_newest_is_capped_and_ordered() {
        let (_, service) = setup();
        for year in 2000..2012 {
            service
                .create_book(dated(&format!("Libro {}", year), year))
                .await
                .unwrap();
        }
        let newest = service.list_newest().await.unwrap();
        assert_eq!(newest.len(), SHOWCASE_LIMIT);
        assert_eq!(newest[0].title, "Libro 2011");
        assert_eq!(newest[9].title, "Libro 2002");
    }

    #[tokio::test]
    async fn test_best_sellers() {
        let (repo, service) = setup();
        assert!(matches!(
            service.list_best_sellers().await,
            Err(AppError::NotFound(_))
        ));

        let a = service.create_book(dated("Uno", 2001)).await.unwrap().book;
        let b = service.create_book(dated("Dos", 2002)).await.unwrap().book;
        {
            let mut uow = repo.begin().await.unwrap();
            let order = uow.order_insert(1, Decimal::ZERO).await.unwrap();
            uow.order_item_insert(order.order_id, a.book_id, 1, a.price)
                .await
                .unwrap();
            uow.order_item_insert(order.order_id, b.book_id, 3, b.price)
                .await
                .unwrap();
            uow.commit().await.unwrap();
        }

        let sellers = service.list_best_sellers().await.unwrap();
        assert_eq!(sellers.len(), 2);
        assert_eq!(sellers[0].book.book_id, b.book_id);
        assert_eq!(sellers[0].quantity_sold, 3);
    }

    #[tokio::test]
    async fn test_wishlist_books() {
        let (repo, service) = setup();
        assert!(service.wishlist_books(5).await.unwrap().is_empty());

        let book = service.create_book(dated("Uno", 2001)).await.unwrap().book;
        {
            let mut uow = repo.begin().await.unwrap();
            let values = RatingValues {
                user_id: 5,
                book_id: book.book_id,
                score: 5,
                comment: String::new(),
                wishlist: true,
            };
            uow.rating_upsert_review(&values, false).await.unwrap();
            uow.commit().await.unwrap();
        }
        let books = service.wishlist_books(5).await.unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].title, "Uno");
    }
}
