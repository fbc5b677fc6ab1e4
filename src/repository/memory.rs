//! In-process repository.
//!
//! A unit of work holds the store lock for its whole lifetime and works on a
//! copy of the tables; `commit` swaps the copy in. Units of work are therefore
//! serialized, and a dropped one leaves the store untouched.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{
    AuthorStore, BookStore, GenreStore, OrderStore, RatingStore, Repository, UnitOfWork, UserStore,
};
use crate::{
    error::{AppError, AppResult},
    models::{
        author::{Author, BookAuthor},
        book::{Book, BookFields, BookSales},
        genre::{BookGenre, Genre},
        order::{Order, OrderItem},
        rating::{Rating, RatingValues},
        user::{NewUser, User},
        FindOrCreate,
    },
};

/// All tables of the in-process store
#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    pub users: Vec<User>,
    pub books: Vec<Book>,
    pub genres: Vec<Genre>,
    pub authors: Vec<Author>,
    pub book_genres: Vec<BookGenre>,
    pub book_authors: Vec<BookAuthor>,
    pub ratings: Vec<Rating>,
    pub orders: Vec<Order>,
    pub order_items: Vec<OrderItem>,
}

#[derive(Clone, Default)]
pub struct MemoryRepository {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the committed tables
    pub async fn snapshot(&self) -> MemoryState {
        self.state.lock().await.clone()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>> {
        let guard = self.state.clone().lock_owned().await;
        let work = guard.clone();
        Ok(Box::new(MemoryUnitOfWork { guard, work }))
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

pub struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<MemoryState>,
    work: MemoryState,
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn commit(self: Box<Self>) -> AppResult<()> {
        let MemoryUnitOfWork { mut guard, work } = *self;
        *guard = work;
        Ok(())
    }
}

fn next_id(len: usize) -> i32 {
    len as i32 + 1
}

impl MemoryUnitOfWork {
    fn push_rating(&mut self, values: &RatingValues) -> Rating {
        let now = Utc::now();
        let rating = Rating {
            rating_id: next_id(self.work.ratings.len()),
            user_id: values.user_id,
            book_id: values.book_id,
            score: values.score,
            comment: values.comment.clone(),
            wishlist: values.wishlist,
            deleted: false,
            created_at: now,
            updated_at: now,
        };
        self.work.ratings.push(rating.clone());
        rating
    }
}

fn same_name(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

fn book_from_fields(book_id: i32, fields: &BookFields) -> Book {
    Book {
        book_id,
        isbn: fields.isbn.clone(),
        img: fields.img.clone(),
        title: fields.title.clone(),
        description: fields.description.clone(),
        language: fields.language.clone(),
        pages: fields.pages,
        publisher: fields.publisher.clone(),
        pub_date: fields.pub_date,
        price: fields.price,
        stock: fields.stock,
        deleted: false,
    }
}

#[async_trait]
impl BookStore for MemoryUnitOfWork {
    async fn book_by_id(&mut self, book_id: i32) -> AppResult<Option<Book>> {
        Ok(self.work.books.iter().find(|b| b.book_id == book_id).cloned())
    }

    async fn book_by_title(&mut self, title: &str) -> AppResult<Option<Book>> {
        Ok(self.work.books.iter().find(|b| same_name(&b.title, title)).cloned())
    }

    async fn book_insert(&mut self, fields: &BookFields) -> AppResult<Book> {
        if self.work.books.iter().any(|b| same_name(&b.title, &fields.title)) {
            return Err(AppError::Conflict(format!("Book {} already exists", fields.title)));
        }
        let book = book_from_fields(next_id(self.work.books.len()), fields);
        self.work.books.push(book.clone());
        Ok(book)
    }

    async fn book_update(&mut self, book_id: i32, fields: &BookFields) -> AppResult<Option<Book>> {
        if self
            .work
            .books
            .iter()
            .any(|b| b.book_id != book_id && same_name(&b.title, &fields.title))
        {
            return Err(AppError::Conflict(format!("Book {} already exists", fields.title)));
        }
        Ok(self
            .work
            .books
            .iter_mut()
            .find(|b| b.book_id == book_id)
            .map(|book| {
                let deleted = book.deleted;
                *book = book_from_fields(book_id, fields);
                book.deleted = deleted;
                book.clone()
            }))
    }

    async fn book_mark_deleted(&mut self, book_id: i32) -> AppResult<Option<Book>> {
        Ok(self
            .work
            .books
            .iter_mut()
            .find(|b| b.book_id == book_id)
            .map(|book| {
                book.deleted = true;
                book.clone()
            }))
    }

    async fn book_take_stock(&mut self, book_id: i32, quantity: i32) -> AppResult<Option<Book>> {
        Ok(self
            .work
            .books
            .iter_mut()
            .find(|b| b.book_id == book_id && !b.deleted && b.stock >= quantity)
            .map(|book| {
                book.stock -= quantity;
                book.clone()
            }))
    }

    async fn books_all(&mut self) -> AppResult<Vec<Book>> {
        Ok(self.work.books.clone())
    }

    async fn books_active(&mut self) -> AppResult<Vec<Book>> {
        Ok(self.work.books.iter().filter(|b| !b.deleted).cloned().collect())
    }

    async fn books_by_publisher(&mut self, publisher: &str) -> AppResult<Vec<Book>> {
        Ok(self
            .work
            .books
            .iter()
            .filter(|b| !b.deleted && b.publisher == publisher)
            .cloned()
            .collect())
    }

    async fn books_newest(&mut self, limit: usize) -> AppResult<Vec<Book>> {
        let mut books: Vec<Book> = self.work.books.iter().filter(|b| !b.deleted).cloned().collect();
        books.sort_by(|a, b| b.pub_date.cmp(&a.pub_date).then(b.book_id.cmp(&a.book_id)));
        books.truncate(limit);
        Ok(books)
    }

    async fn books_best_selling(&mut self, limit: usize) -> AppResult<Vec<BookSales>> {
        let mut sales: Vec<BookSales> = self
            .work
            .books
            .iter()
            .filter(|b| !b.deleted)
            .filter_map(|book| {
                let sold: i64 = self
                    .work
                    .order_items
                    .iter()
                    .filter(|item| item.book_id == book.book_id)
                    .map(|item| item.quantity as i64)
                    .sum();
                let has_sales = self.work.order_items.iter().any(|item| item.book_id == book.book_id);
                has_sales.then(|| BookSales {
                    book: book.clone(),
                    quantity_sold: sold,
                })
            })
            .collect();
        sales.sort_by(|a, b| {
            b.quantity_sold
                .cmp(&a.quantity_sold)
                .then(a.book.book_id.cmp(&b.book.book_id))
        });
        sales.truncate(limit);
        Ok(sales)
    }

    async fn publishers(&mut self) -> AppResult<Vec<String>> {
        let mut publishers: Vec<String> = self
            .work
            .books
            .iter()
            .filter(|b| !b.deleted)
            .map(|b| b.publisher.clone())
            .collect();
        publishers.sort();
        publishers.dedup();
        Ok(publishers)
    }
}

#[async_trait]
impl GenreStore for MemoryUnitOfWork {
    async fn genre_by_id(&mut self, genre_id: i32) -> AppResult<Option<Genre>> {
        Ok(self.work.genres.iter().find(|g| g.genre_id == genre_id).cloned())
    }

    async fn genre_by_name(&mut self, name: &str) -> AppResult<Option<Genre>> {
        Ok(self.work.genres.iter().find(|g| same_name(&g.name, name)).cloned())
    }

    async fn genre_insert(&mut self, name: &str) -> AppResult<Genre> {
        if self.work.genres.iter().any(|g| same_name(&g.name, name)) {
            return Err(AppError::Conflict(format!("Genre {} already exists", name)));
        }
        let genre = Genre {
            genre_id: next_id(self.work.genres.len()),
            name: name.to_string(),
            deleted: false,
        };
        self.work.genres.push(genre.clone());
        Ok(genre)
    }

    async fn genre_find_or_insert(&mut self, name: &str) -> AppResult<FindOrCreate<Genre>> {
        if let Some(row) = self.work.genres.iter_mut().find(|row| same_name(&row.name, name)) {
            row.deleted = false;
            return Ok(FindOrCreate::Existing(row.clone()));
        }
        Ok(FindOrCreate::Created(self.genre_insert(name).await?))
    }

    async fn genre_rename(&mut self, genre_id: i32, name: &str) -> AppResult<Option<Genre>> {
        if self
            .work
            .genres
            .iter()
            .any(|g| g.genre_id != genre_id && same_name(&g.name, name))
        {
            return Err(AppError::Conflict(format!("Genre {} already exists", name)));
        }
        Ok(self
            .work
            .genres
            .iter_mut()
            .find(|g| g.genre_id == genre_id)
            .map(|genre| {
                genre.name = name.to_string();
                genre.clone()
            }))
    }

    async fn genre_set_deleted(&mut self, genre_id: i32, deleted: bool) -> AppResult<Option<Genre>> {
        Ok(self
            .work
            .genres
            .iter_mut()
            .find(|g| g.genre_id == genre_id)
            .map(|genre| {
                genre.deleted = deleted;
                genre.clone()
            }))
    }

    async fn genres_all(&mut self) -> AppResult<Vec<Genre>> {
        let mut genres = self.work.genres.clone();
        genres.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(genres)
    }

    async fn book_genre_active(&mut self, book_id: i32) -> AppResult<Option<BookGenre>> {
        Ok(self
            .work
            .book_genres
            .iter()
            .find(|bg| bg.book_id == book_id && !bg.deleted)
            .cloned())
    }

    async fn book_genre_insert(&mut self, book_id: i32, genre_id: i32) -> AppResult<BookGenre> {
        let row = BookGenre {
            book_genre_id: next_id(self.work.book_genres.len()),
            book_id,
            genre_id,
            deleted: false,
        };
        self.work.book_genres.push(row.clone());
        Ok(row)
    }

    async fn book_genre_repoint(&mut self, book_id: i32, genre_id: i32) -> AppResult<u64> {
        let mut touched = 0;
        for row in self
            .work
            .book_genres
            .iter_mut()
            .filter(|bg| bg.book_id == book_id && !bg.deleted)
        {
            row.genre_id = genre_id;
            touched += 1;
        }
        Ok(touched)
    }

    async fn book_genre_mark_deleted(&mut self, book_id: i32) -> AppResult<u64> {
        let mut touched = 0;
        for row in self.work.book_genres.iter_mut().filter(|bg| bg.book_id == book_id) {
            row.deleted = true;
            touched += 1;
        }
        Ok(touched)
    }
}

#[async_trait]
impl AuthorStore for MemoryUnitOfWork {
    async fn author_by_id(&mut self, author_id: i32) -> AppResult<Option<Author>> {
        Ok(self.work.authors.iter().find(|a| a.author_id == author_id).cloned())
    }

    async fn author_by_name(&mut self, name: &str) -> AppResult<Option<Author>> {
        Ok(self.work.authors.iter().find(|a| same_name(&a.name, name)).cloned())
    }

    async fn author_insert(&mut self, name: &str) -> AppResult<Author> {
        if self.work.authors.iter().any(|a| same_name(&a.name, name)) {
            return Err(AppError::Conflict(format!("Author {} already exists", name)));
        }
        let author = Author {
            author_id: next_id(self.work.authors.len()),
            name: name.to_string(),
            deleted: false,
        };
        self.work.authors.push(author.clone());
        Ok(author)
    }

    async fn author_find_or_insert(&mut self, name: &str) -> AppResult<FindOrCreate<Author>> {
        if let Some(row) = self.work.authors.iter_mut().find(|row| same_name(&row.name, name)) {
            row.deleted = false;
            return Ok(FindOrCreate::Existing(row.clone()));
        }
        Ok(FindOrCreate::Created(self.author_insert(name).await?))
    }

    async fn author_rename(&mut self, author_id: i32, name: &str) -> AppResult<Option<Author>> {
        if self
            .work
            .authors
            .iter()
            .any(|a| a.author_id != author_id && same_name(&a.name, name))
        {
            return Err(AppError::Conflict(format!("Author {} already exists", name)));
        }
        Ok(self
            .work
            .authors
            .iter_mut()
            .find(|a| a.author_id == author_id)
            .map(|author| {
                author.name = name.to_string();
                author.clone()
            }))
    }

    async fn author_set_deleted(&mut self, author_id: i32, deleted: bool) -> AppResult<Option<Author>> {
        Ok(self
            .work
            .authors
            .iter_mut()
            .find(|a| a.author_id == author_id)
            .map(|author| {
                author.deleted = deleted;
                author.clone()
            }))
    }

    async fn authors_all(&mut self) -> AppResult<Vec<Author>> {
        let mut authors = self.work.authors.clone();
        authors.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(authors)
    }

    async fn book_author_active(&mut self, book_id: i32) -> AppResult<Option<BookAuthor>> {
        Ok(self
            .work
            .book_authors
            .iter()
            .find(|ba| ba.book_id == book_id && !ba.deleted)
            .cloned())
    }

    async fn book_author_insert(&mut self, book_id: i32, author_id: i32) -> AppResult<BookAuthor> {
        let row = BookAuthor {
            book_author_id: next_id(self.work.book_authors.len()),
            book_id,
            author_id,
            deleted: false,
        };
        self.work.book_authors.push(row.clone());
        Ok(row)
    }

    async fn book_author_repoint(&mut self, book_id: i32, author_id: i32) -> AppResult<u64> {
        let mut touched = 0;
        for row in self
            .work
            .book_authors
            .iter_mut()
            .filter(|ba| ba.book_id == book_id && !ba.deleted)
        {
            row.author_id = author_id;
            touched += 1;
        }
        Ok(touched)
    }

    async fn book_author_mark_deleted(&mut self, book_id: i32) -> AppResult<u64> {
        let mut touched = 0;
        for row in self.work.book_authors.iter_mut().filter(|ba| ba.book_id == book_id) {
            row.deleted = true;
            touched += 1;
        }
        Ok(touched)
    }
}

#[async_trait]
impl RatingStore for MemoryUnitOfWork {
    async fn rating_by_id(&mut self, rating_id: i32) -> AppResult<Option<Rating>> {
        Ok(self.work.ratings.iter().find(|r| r.rating_id == rating_id).cloned())
    }

    async fn rating_by_pair(&mut self, user_id: i32, book_id: i32) -> AppResult<Option<Rating>> {
        Ok(self
            .work
            .ratings
            .iter()
            .find(|r| r.user_id == user_id && r.book_id == book_id)
            .cloned())
    }

    async fn rating_upsert_review(&mut self, values: &RatingValues, keep_wishlist: bool) -> AppResult<Rating> {
        let now = Utc::now();
        let pair = self
            .work
            .ratings
            .iter_mut()
            .find(|r| r.user_id == values.user_id && r.book_id == values.book_id);
        if let Some(rating) = pair {
            if !(keep_wishlist && !rating.deleted) {
                rating.wishlist = values.wishlist;
            }
            rating.score = values.score;
            rating.comment = values.comment.clone();
            rating.deleted = false;
            rating.updated_at = now;
            return Ok(rating.clone());
        }
        Ok(self.push_rating(values))
    }

    async fn rating_upsert_wishlist(&mut self, values: &RatingValues) -> AppResult<Rating> {
        let now = Utc::now();
        let pair = self
            .work
            .ratings
            .iter_mut()
            .find(|r| r.user_id == values.user_id && r.book_id == values.book_id);
        if let Some(rating) = pair {
            if rating.deleted {
                rating.score = values.score;
                rating.comment = values.comment.clone();
                rating.deleted = false;
            }
            rating.wishlist = values.wishlist;
            rating.updated_at = now;
            return Ok(rating.clone());
        }
        Ok(self.push_rating(values))
    }

    async fn rating_set_deleted(&mut self, rating_id: i32, deleted: bool) -> AppResult<Option<Rating>> {
        Ok(self
            .work
            .ratings
            .iter_mut()
            .find(|r| r.rating_id == rating_id)
            .map(|rating| {
                rating.deleted = deleted;
                rating.updated_at = Utc::now();
                rating.clone()
            }))
    }

    async fn ratings_active_by_book(&mut self, book_id: i32) -> AppResult<Vec<Rating>> {
        Ok(self
            .work
            .ratings
            .iter()
            .filter(|r| r.book_id == book_id && !r.deleted)
            .cloned()
            .collect())
    }

    async fn ratings_wishlist_by_user(&mut self, user_id: i32) -> AppResult<Vec<Rating>> {
        Ok(self
            .work
            .ratings
            .iter()
            .filter(|r| r.user_id == user_id && r.wishlist && !r.deleted)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl UserStore for MemoryUnitOfWork {
    async fn user_by_id(&mut self, user_id: i32) -> AppResult<Option<User>> {
        Ok(self.work.users.iter().find(|u| u.user_id == user_id).cloned())
    }

    async fn user_by_email(&mut self, email: &str) -> AppResult<Option<User>> {
        Ok(self.work.users.iter().find(|u| same_name(&u.email, email)).cloned())
    }

    async fn user_insert(&mut self, user: &NewUser) -> AppResult<User> {
        if self.work.users.iter().any(|u| same_name(&u.email, &user.email)) {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }
        let now = Utc::now();
        let row = User {
            user_id: next_id(self.work.users.len()),
            email: user.email.clone(),
            password: user.password_hash.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            phone: user.phone.clone(),
            address: user.address.clone(),
            admin: user.admin,
            deleted: false,
            created_at: now,
            updated_at: now,
        };
        self.work.users.push(row.clone());
        Ok(row)
    }

    async fn user_save(&mut self, user: &User) -> AppResult<Option<User>> {
        if self
            .work
            .users
            .iter()
            .any(|u| u.user_id != user.user_id && same_name(&u.email, &user.email))
        {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }
        Ok(self
            .work
            .users
            .iter_mut()
            .find(|u| u.user_id == user.user_id)
            .map(|row| {
                let deleted = row.deleted;
                let created_at = row.created_at;
                *row = user.clone();
                row.deleted = deleted;
                row.created_at = created_at;
                row.updated_at = Utc::now();
                row.clone()
            }))
    }

    async fn user_mark_deleted(&mut self, user_id: i32) -> AppResult<Option<User>> {
        Ok(self
            .work
            .users
            .iter_mut()
            .find(|u| u.user_id == user_id)
            .map(|row| {
                row.deleted = true;
                row.updated_at = Utc::now();
                row.clone()
            }))
    }
}

#[async_trait]
impl OrderStore for MemoryUnitOfWork {
    async fn order_insert(&mut self, user_id: i32, total: Decimal) -> AppResult<Order> {
        let order = Order {
            order_id: next_id(self.work.orders.len()),
            user_id,
            total,
            created_at: Utc::now(),
        };
        self.work.orders.push(order.clone());
        Ok(order)
    }

    async fn order_item_insert(
        &mut self,
        order_id: i32,
        book_id: i32,
        quantity: i32,
        price: Decimal,
    ) -> AppResult<OrderItem> {
        let item = OrderItem {
            order_item_id: next_id(self.work.order_items.len()),
            order_id,
            book_id,
            quantity,
            price,
        };
        self.work.order_items.push(item.clone());
        Ok(item)
    }

    async fn orders_by_user(&mut self, user_id: i32) -> AppResult<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .work
            .orders
            .iter()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then(b.order_id.cmp(&a.order_id))
        });
        Ok(orders)
    }

    async fn order_items_by_order(&mut self, order_id: i32) -> AppResult<Vec<OrderItem>> {
        Ok(self
            .work
            .order_items
            .iter()
            .filter(|item| item.order_id == order_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn fields(title: &str) -> BookFields {
        BookFields {
            isbn: "9789569545344".to_string(),
            img: None,
            title: title.to_string(),
            description: "Novela".to_string(),
            language: "Español".to_string(),
            pages: 500,
            publisher: "Sudamericana".to_string(),
            pub_date: NaiveDate::from_ymd_opt(1982, 1, 1).unwrap(),
            price: Decimal::from(13990),
            stock: 10,
        }
    }

    #[tokio::test]
    async fn test_commit_publishes_writes() {
        let repo = MemoryRepository::new();
        let mut uow = repo.begin().await.unwrap();
        uow.book_insert(&fields("Uno")).await.unwrap();
        uow.commit().await.unwrap();

        assert_eq!(repo.snapshot().await.books.len(), 1);
    }

    #[tokio::test]
    async fn test_drop_discards_writes() {
        let repo = MemoryRepository::new();
        {
            let mut uow = repo.begin().await.unwrap();
            uow.book_insert(&fields("Uno")).await.unwrap();
            uow.genre_insert("Novela").await.unwrap();
        }
        let state = repo.snapshot().await;
        assert!(state.books.is_empty());
        assert!(state.genres.is_empty());
    }

    #[tokio::test]
    async fn test_rating_pair_keeps_one_row() {
        let repo = MemoryRepository::new();
        let mut uow = repo.begin().await.unwrap();
        let mut values = RatingValues {
            user_id: 1,
            book_id: 1,
            score: 4,
            comment: String::new(),
            wishlist: true,
        };
        let first = uow.rating_upsert_review(&values, false).await.unwrap();

        values.score = 2;
        values.wishlist = false;
        let second = uow.rating_upsert_review(&values, true).await.unwrap();
        assert_eq!(second.rating_id, first.rating_id);
        assert_eq!(second.score, 2);
        assert!(second.wishlist);

        let third = uow.rating_upsert_wishlist(&values).await.unwrap();
        assert_eq!(third.rating_id, first.rating_id);
        assert_eq!(third.score, 2);
        assert!(!third.wishlist);
        uow.commit().await.unwrap();

        assert_eq!(repo.snapshot().await.ratings.len(), 1);
    }

    #[tokio::test]
    async fn test_take_stock_never_goes_negative() {
        let repo = MemoryRepository::new();
        let mut uow = repo.begin().await.unwrap();
        let book = uow.book_insert(&fields("Uno")).await.unwrap();

        assert_eq!(uow.book_take_stock(book.book_id, 4).await.unwrap().unwrap().stock, 6);
        assert!(uow.book_take_stock(book.book_id, 7).await.unwrap().is_none());
        uow.book_mark_deleted(book.book_id).await.unwrap();
        assert!(uow.book_take_stock(book.book_id, 1).await.unwrap().is_none());
        assert_eq!(uow.book_by_id(book.book_id).await.unwrap().unwrap().stock, 6);
    }

    #[tokio::test]
    async fn test_find_or_insert_reuses_rows() {
        let repo = MemoryRepository::new();
        let mut uow = repo.begin().await.unwrap();
        assert!(uow.genre_find_or_insert("Novela").await.unwrap().was_created());
        let again = uow.genre_find_or_insert("NOVELA").await.unwrap();
        assert!(!again.was_created());
        assert_eq!(again.get().name, "Novela");
        uow.book_insert(&fields("Uno")).await.unwrap();
        assert!(matches!(
            uow.book_insert(&fields("uno")).await,
            Err(AppError::Conflict(_))
        ));
    }
}
