//! Repository layer for database operations.
//!
//! Every logical operation opens one [`UnitOfWork`] through [`Repository::begin`],
//! runs its reads and writes on it, and calls [`UnitOfWork::commit`] once. A unit
//! of work dropped without committing discards all of its writes.

pub mod authors;
pub mod books;
pub mod genres;
pub mod memory;
pub mod orders;
pub mod postgres;
pub mod ratings;
pub mod users;

use async_trait::async_trait;

use crate::error::AppResult;

pub use authors::AuthorStore;
pub use books::BookStore;
pub use genres::GenreStore;
pub use memory::MemoryRepository;
pub use orders::OrderStore;
pub use postgres::PgRepository;
pub use ratings::RatingStore;
pub use users::UserStore;

/// Entry point of the data-access layer, shared by all services
#[async_trait]
pub trait Repository: Send + Sync {
    /// Open a unit of work (a transaction on Postgres)
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>>;

    /// Check that the underlying store answers
    async fn ping(&self) -> AppResult<()>;
}

/// One transaction scope covering a logical operation
#[async_trait]
pub trait UnitOfWork:
    BookStore + GenreStore + AuthorStore + RatingStore + UserStore + OrderStore + Send
{
    async fn commit(self: Box<Self>) -> AppResult<()>;
}
