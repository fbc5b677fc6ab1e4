//! Business logic services.
//!
//! Each public operation runs on a single unit of work. Writes commit once at
//! the end; read-only operations just drop theirs.

pub mod authors;
pub mod catalog;
pub mod genres;
pub mod orders;
pub mod ratings;
pub mod users;

use std::sync::Arc;

use crate::{config::AuthConfig, repository::Repository};

pub use crate::models::FindOrCreate;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub genres: genres::GenresService,
    pub authors: authors::AuthorsService,
    pub ratings: ratings::RatingsService,
    pub users: users::UsersService,
    pub orders: orders::OrdersService,
    repository: Arc<dyn Repository>,
}

impl Services {
    /// Create all services on top of the given repository
    pub fn new(repository: Arc<dyn Repository>, auth_config: AuthConfig) -> Self {
        Self {
            catalog: catalog::CatalogService::new(repository.clone()),
            genres: genres::GenresService::new(repository.clone()),
            authors: authors::AuthorsService::new(repository.clone()),
            ratings: ratings::RatingsService::new(repository.clone()),
            users: users::UsersService::new(repository.clone(), auth_config),
            orders: orders::OrdersService::new(repository.clone()),
            repository,
        }
    }

    /// Check the data store is reachable
    pub async fn ping(&self) -> crate::error::AppResult<()> {
        self.repository.ping().await
    }
}
