//! Author maintenance service

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::author::Author,
    repository::{Repository, UnitOfWork},
};

use super::FindOrCreate;

#[derive(Clone)]
pub struct AuthorsService {
    repository: Arc<dyn Repository>,
}

/// Trimmed name, rejected when blank
fn clean_name(name: &str) -> AppResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("The author is required".to_string()));
    }
    Ok(name)
}

/// Resolve an author by name on an open unit of work, creating it when absent.
/// A soft-deleted author with that name is reactivated and reused.
pub async fn find_or_create(uow: &mut dyn UnitOfWork, name: &str) -> AppResult<FindOrCreate<Author>> {
    let name = clean_name(name)?;
    uow.author_find_or_insert(name).await
}

fn not_found(author_id: i32) -> AppError {
    AppError::NotFound(format!("Author {} not found", author_id))
}

impl AuthorsService {
    pub fn new(repository: Arc<dyn Repository>) -> Self {
        Self { repository }
    }

    pub async fn list(&self) -> AppResult<Vec<Author>> {
        let mut uow = self.repository.begin().await?;
        uow.authors_all().await
    }

    pub async fn get(&self, author_id: i32) -> AppResult<Author> {
        let mut uow = self.repository.begin().await?;
        uow.author_by_id(author_id).await?.ok_or_else(|| not_found(author_id))
    }

    pub async fn create(&self, name: &str) -> AppResult<Author> {
        let name = clean_name(name)?;
        let mut uow = self.repository.begin().await?;
        if uow.author_by_name(name).await?.is_some() {
            return Err(AppError::Conflict(format!("Author {} already exists", name)));
        }
        let author = uow.author_insert(name).await?;
        uow.commit().await?;
        tracing::info!("Author created: id={} name={}", author.author_id, author.name);
        Ok(author)
    }

    pub async fn rename(&self, author_id: i32, name: &str) -> AppResult<Author> {
        let name = clean_name(name)?;
        let mut uow = self.repository.begin().await?;
        if let Some(other) = uow.author_by_name(name).await? {
            if other.author_id != author_id {
                return Err(AppError::Conflict(format!("Author {} already exists", name)));
            }
        }
        let author = uow
            .author_rename(author_id, name)
            .await?
            .ok_or_else(|| not_found(author_id))?;
        uow.commit().await?;
        Ok(author)
    }

    /// Soft delete, the book links are left alone.
    pub async fn delete(&self, author_id: i32) -> AppResult<Author> {
        self.set_deleted(author_id, true).await
    }

    pub async fn activate(&self, author_id: i32) -> AppResult<Author> {
        self.set_deleted(author_id, false).await
    }

    async fn set_deleted(&self, author_id: i32, deleted: bool) -> AppResult<Author> {
        let mut uow = self.repository.begin().await?;
        let author = uow
            .author_set_deleted(author_id, deleted)
            .await?
            .ok_or_else(|| not_found(author_id))?;
        uow.commit().await?;
        tracing::info!("Author {} deleted={}", author_id, deleted);
        Ok(author)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryRepository;

    #[tokio::test]
    async fn test_create_rejects_duplicate_name() {
        let service = AuthorsService::new(Arc::new(MemoryRepository::new()));
        service.create("Isabel Allende").await.unwrap();
        assert!(matches!(service.create(" isabel allende ").await, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_delete_and_activate() {
        let service = AuthorsService::new(Arc::new(MemoryRepository::new()));
        let author = service.create("Gabriela Mistral").await.unwrap();

        assert!(service.delete(author.author_id).await.unwrap().deleted);
        assert!(service.get(author.author_id).await.unwrap().deleted);
        assert!(!service.activate(author.author_id).await.unwrap().deleted);
        assert!(matches!(service.delete(99).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_find_or_create_reactivates_deleted_author() {
        let repo = MemoryRepository::new();
        let service = AuthorsService::new(Arc::new(repo.clone()));
        let author = service.create("Pablo Neruda").await.unwrap();
        service.delete(author.author_id).await.unwrap();

        let mut uow = repo.begin().await.unwrap();
        let found = find_or_create(uow.as_mut(), "PABLO NERUDA").await.unwrap();
        assert!(!found.was_created());
        assert_eq!(found.get().author_id, author.author_id);
        assert!(!found.get().deleted);
    }

    #[tokio::test]
    async fn test_blank_name_is_rejected() {
        let repo = MemoryRepository::new();
        let service = AuthorsService::new(Arc::new(repo.clone()));
        assert!(matches!(service.create("   ").await, Err(AppError::Validation(_))));

        let author = service.create("Gabriela Mistral").await.unwrap();
        assert!(matches!(
            service.rename(author.author_id, " \t ").await,
            Err(AppError::Validation(_))
        ));
        assert_eq!(repo.snapshot().await.authors.len(), 1);
        assert_eq!(service.get(author.author_id).await.unwrap().name, "Gabriela Mistral");
    }
}
