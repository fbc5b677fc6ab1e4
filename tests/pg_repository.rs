//! Repository and service tests against a real Postgres database.
//!
//! They need `DATABASE_URL` pointing at a scratch database and run with
//! `cargo test -- --ignored`. Every test names its rows uniquely so runs can
//! share a database.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{postgres::PgPoolOptions, PgPool};

use bookstore_server::{
    config::AuthConfig,
    models::{
        book::{BookFields, CreateBook},
        order::{Checkout, CheckoutLine},
        rating::UpdateWishlist,
        user::CreateUser,
    },
    repository::{PgRepository, Repository},
    services::Services,
    AppError,
};

struct PgApp {
    pool: PgPool,
    repo: Arc<PgRepository>,
    services: Services,
}

async fn pg_app() -> PgApp {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPoolOptions::new()
        .max_connections(30)
        .connect(&url)
        .await
        .expect("Failed to connect to database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    let repo = Arc::new(PgRepository::new(pool.clone()));
    let services = Services::new(repo.clone(), AuthConfig::default());
    PgApp {
        pool,
        repo,
        services,
    }
}

fn unique(prefix: &str) -> String {
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    format!("{} {}-{}", prefix, std::process::id(), nanos)
}

fn fields(title: &str, publisher: &str, stock: i32) -> BookFields {
    BookFields {
        isbn: "9789569545344".to_string(),
        img: None,
        title: title.to_string(),
        description: "Novela".to_string(),
        language: "Español".to_string(),
        pages: 320,
        publisher: publisher.to_string(),
        pub_date: NaiveDate::from_ymd_opt(1987, 5, 1).unwrap(),
        price: Decimal::from(12990),
        stock,
    }
}

async fn register(app: &PgApp) -> i32 {
    let email = format!("{}@example.com", unique("reader").replace([' ', '-'], "."));
    app.services
        .users
        .register(CreateUser {
            email,
            password: "secreto123".to_string(),
            first_name: "Ana".to_string(),
            last_name: "Pérez".to_string(),
            phone: None,
            address: None,
        })
        .await
        .unwrap()
        .user_id
}

#[tokio::test]
#[ignore]
async fn test_concurrent_checkouts_never_oversell() {
    let app = pg_app().await;
    let user_id = register(&app).await;
    let book = app
        .services
        .catalog
        .create_book(CreateBook {
            fields: fields(&unique("Stock"), "Sudamericana", 5),
            genre: "Novela".to_string(),
            author: "Isabel Allende".to_string(),
        })
        .await
        .unwrap()
        .book;
    let book_id = book.book_id;

    let tasks: Vec<_> = (0..25)
        .map(|_| {
            let orders = app.services.orders.clone();
            tokio::spawn(async move {
                orders
                    .checkout(Checkout {
                        user_id,
                        items: vec![CheckoutLine {
                            book_id,
                            quantity: 1,
                        }],
                    })
                    .await
            })
        })
        .collect();

    let mut placed = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => placed += 1,
            Err(e) => assert!(matches!(e, AppError::Conflict(_)), "unexpected error: {}", e),
        }
    }
    assert_eq!(placed, 5);

    let stock: i32 = sqlx::query_scalar("SELECT stock FROM books WHERE book_id = $1")
        .bind(book.book_id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(stock, 0);

    let sold: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(quantity), 0)::bigint FROM order_items WHERE book_id = $1",
    )
    .bind(book.book_id)
    .fetch_one(&app.pool)
    .await
    .unwrap();
    assert_eq!(sold, 5);
}

#[tokio::test]
#[ignore]
async fn test_concurrent_creates_share_new_genre() {
    let app = pg_app().await;
    let genre = unique("Genre");
    let author = unique("Author");

    let tasks: Vec<_> = (0..10)
        .map(|i| {
            let catalog = app.services.catalog.clone();
            let request = CreateBook {
                fields: fields(&unique(&format!("Title {}", i)), "Sudamericana", 1),
                genre: genre.clone(),
                author: author.clone(),
            };
            tokio::spawn(async move { catalog.create_book(request).await })
        })
        .collect();

    let mut genre_ids = Vec::new();
    for task in tasks {
        genre_ids.push(task.await.unwrap().unwrap().genre.genre_id);
    }
    genre_ids.sort();
    genre_ids.dedup();
    assert_eq!(genre_ids.len(), 1);

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM genres WHERE LOWER(name) = LOWER($1)")
        .bind(&genre)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(rows, 1);
}

#[tokio::test]
#[ignore]
async fn test_concurrent_wishlist_updates_keep_one_row() {
    let app = pg_app().await;
    let user_id = register(&app).await;
    let book = app
        .services
        .catalog
        .create_book(CreateBook {
            fields: fields(&unique("Wishlist"), "Sudamericana", 1),
            genre: "Novela".to_string(),
            author: "Isabel Allende".to_string(),
        })
        .await
        .unwrap()
        .book;
    let book_id = book.book_id;

    let tasks: Vec<_> = (0..10)
        .map(|i| {
            let ratings = app.services.ratings.clone();
            tokio::spawn(async move {
                ratings
                    .update_wishlist(UpdateWishlist {
                        user_id,
                        book_id,
                        wishlist: i % 2 == 0,
                    })
                    .await
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let rows: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM ratings WHERE user_id = $1 AND book_id = $2")
            .bind(user_id)
            .bind(book.book_id)
            .fetch_one(&app.pool)
            .await
            .unwrap();
    assert_eq!(rows, 1);
}

#[tokio::test]
#[ignore]
async fn test_duplicate_title_is_rejected_by_index() {
    let app = pg_app().await;
    let title = unique("Duplicate");

    let mut uow = app.repo.begin().await.unwrap();
    uow.book_insert(&fields(&title, "Sudamericana", 1)).await.unwrap();
    let clash = uow
        .book_insert(&fields(&title.to_uppercase(), "Sudamericana", 1))
        .await
        .unwrap_err();
    assert_eq!(clash.status_code(), axum::http::StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore]
async fn test_best_sellers_and_publishers() {
    let app = pg_app().await;
    let user_id = register(&app).await;
    let publisher = unique("Publisher");
    let book = app
        .services
        .catalog
        .create_book(CreateBook {
            fields: fields(&unique("Seller"), &publisher, 4),
            genre: "Novela".to_string(),
            author: "Isabel Allende".to_string(),
        })
        .await
        .unwrap()
        .book;
    app.services
        .orders
        .checkout(Checkout {
            user_id,
            items: vec![CheckoutLine {
                book_id: book.book_id,
                quantity: 3,
            }],
        })
        .await
        .unwrap();

    let mut uow = app.repo.begin().await.unwrap();
    let sellers = uow.books_best_selling(10_000).await.unwrap();
    let sold = sellers
        .iter()
        .find(|s| s.book.book_id == book.book_id)
        .expect("book missing from best sellers");
    assert_eq!(sold.quantity_sold, 3);
    assert_eq!(sold.book.stock, 1);

    assert!(uow.publishers().await.unwrap().contains(&publisher));
    let by_publisher = uow.books_by_publisher(&publisher).await.unwrap();
    assert_eq!(by_publisher.len(), 1);
    assert_eq!(by_publisher[0].book_id, book.book_id);

    let orders = app.services.orders.orders_for_user(user_id).await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].order.total, Decimal::from(38970));
}
