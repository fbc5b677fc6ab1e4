//! Genre maintenance service

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::genre::Genre,
    repository::{Repository, UnitOfWork},
};

use super::FindOrCreate;

#[derive(Clone)]
pub struct GenresService {
    repository: Arc<dyn Repository>,
}

/// Trimmed name, rejected when blank
fn clean_name(name: &str) -> AppResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("The genre is required".to_string()));
    }
    Ok(name)
}

/// Resolve a genre by name on an open unit of work, creating it when absent.
/// A soft-deleted genre with that name is reactivated and reused.
pub async fn find_or_create(uow: &mut dyn UnitOfWork, name: &str) -> AppResult<FindOrCreate<Genre>> {
    let name = clean_name(name)?;
    uow.genre_find_or_insert(name).await
}

fn not_found(genre_id: i32) -> AppError {
    AppError::NotFound(format!("Genre {} not found", genre_id))
}

impl GenresService {
    pub fn new(repository: Arc<dyn Repository>) -> Self {
        Self { repository }
    }

    pub async fn list(&self) -> AppResult<Vec<Genre>> {
        let mut uow = self.repository.begin().await?;
        uow.genres_all().await
    }

    pub async fn get(&self, genre_id: i32) -> AppResult<Genre> {
        let mut uow = self.repository.begin().await?;
        uow.genre_by_id(genre_id).await?.ok_or_else(|| not_found(genre_id))
    }

    pub async fn create(&self, name: &str) -> AppResult<Genre> {
        let name = clean_name(name)?;
        let mut uow = self.repository.begin().await?;
        if uow.genre_by_name(name).await?.is_some() {
            return Err(AppError::Conflict(format!("Genre {} already exists", name)));
        }
        let genre = uow.genre_insert(name).await?;
        uow.commit().await?;
        tracing::info!("Genre created: id={} name={}", genre.genre_id, genre.name);
        Ok(genre)
    }

    pub async fn rename(&self, genre_id: i32, name: &str) -> AppResult<Genre> {
        let name = clean_name(name)?;
        let mut uow = self.repository.begin().await?;
        if let Some(other) = uow.genre_by_name(name).await? {
            if other.genre_id != genre_id {
                return Err(AppError::Conflict(format!("Genre {} already exists", name)));
            }
        }
        let genre = uow
            .genre_rename(genre_id, name)
            .await?
            .ok_or_else(|| not_found(genre_id))?;
        uow.commit().await?;
        Ok(genre)
    }

    /// Soft delete. Books linked to the genre keep their join rows.
    pub async fn delete(&self, genre_id: i32) -> AppResult<Genre> {
        self.set_deleted(genre_id, true).await
    }

    pub async fn activate(&self, genre_id: i32) -> AppResult<Genre> {
        self.set_deleted(genre_id, false).await
    }

    async fn set_deleted(&self, genre_id: i32, deleted: bool) -> AppResult<Genre> {
        let mut uow = self.repository.begin().await?;
        let genre = uow
            .genre_set_deleted(genre_id, deleted)
            .await?
            .ok_or_else(|| not_found(genre_id))?;
        uow.commit().await?;
        tracing::info!("Genre {} deleted={}", genre_id, deleted);
        Ok(genre)
    }
}
