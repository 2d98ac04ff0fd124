//! Per-résumé notes and tags.
//!
//! Reads go through the metadata cache; every edit loads from the repository,
//! writes back, then invalidates the résumé's key.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use crate::caches::AppCaches;
use crate::error::ServiceError;
use crate::keys::resume_metadata_key;
use crate::models::{ResumeId, ResumeMetadata};
use crate::services::ResumeRepository;

#[derive(Clone)]
pub struct MetadataService {
    repo: Arc<dyn ResumeRepository>,
    caches: AppCaches,
}

impl MetadataService {
    pub fn new(repo: Arc<dyn ResumeRepository>, caches: AppCaches) -> Self {
        Self { repo, caches }
    }

    pub async fn get_metadata(&self, resume_id: ResumeId) -> Result<ResumeMetadata, ServiceError> {
        let repo = Arc::clone(&self.repo);
        self.caches
            .resume_metadata
            .compute_once(resume_metadata_key(resume_id), move || async move {
                repo.find_metadata(resume_id)
                    .await?
                    .ok_or(ServiceError::NotFound {
                        entity: "resume",
                        id: resume_id,
                    })
            })
            .await
    }

    pub async fn set_notes(
        &self,
        resume_id: ResumeId,
        notes: &str,
    ) -> Result<ResumeMetadata, ServiceError> {
        let notes = notes.to_string();
        self.update(resume_id, move |metadata| {
            metadata.notes = notes;
            Ok(())
        })
        .await
    }

    /// Adds a tag, normalized to trimmed lowercase.
    pub async fn add_tag(
        &self,
        resume_id: ResumeId,
        tag: &str,
    ) -> Result<ResumeMetadata, ServiceError> {
        let tag = normalize_tag(tag)?;
        self.update(resume_id, move |metadata| {
            metadata.tags.insert(tag);
            Ok(())
        })
        .await
    }

    pub async fn remove_tag(
        &self,
        resume_id: ResumeId,
        tag: &str,
    ) -> Result<ResumeMetadata, ServiceError> {
        let tag = normalize_tag(tag)?;
        self.update(resume_id, move |metadata| {
            metadata.tags.remove(&tag);
            Ok(())
        })
        .await
    }

    async fn update<F>(&self, resume_id: ResumeId, edit: F) -> Result<ResumeMetadata, ServiceError>
    where
        F: FnOnce(&mut ResumeMetadata) -> Result<(), ServiceError>,
    {
        let mut metadata = self
            .repo
            .find_metadata(resume_id)
            .await?
            .ok_or(ServiceError::NotFound {
                entity: "resume",
                id: resume_id,
            })?;
        edit(&mut metadata)?;
        metadata.updated_at = Utc::now();
        self.repo.save_metadata(metadata.clone()).await?;

        self.caches
            .resume_metadata
            .delete(&resume_metadata_key(resume_id));
        debug!(resume_id, "resume metadata updated");
        Ok(metadata)
    }
}

fn normalize_tag(tag: &str) -> Result<String, ServiceError> {
    let tag = tag.trim().to_lowercase();
    if tag.is_empty() {
        return Err(ServiceError::InvalidInput("tag cannot be empty".to_string()));
    }
    Ok(tag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::services::InMemoryRepository;

    async fn setup() -> (MetadataService, Arc<InMemoryRepository>) {
        let repo = Arc::new(InMemoryRepository::new());
        repo.save_metadata(ResumeMetadata::new(10, 1)).await.unwrap();
        let caches = AppCaches::from_config(&Config::default()).unwrap();
        (MetadataService::new(repo.clone(), caches), repo)
    }

    #[tokio::test]
    async fn test_get_metadata_is_cached() {
        let (service, repo) = setup().await;

        service.get_metadata(10).await.unwrap();
        service.get_metadata(10).await.unwrap();

        assert_eq!(repo.reads(), 1);
    }

    #[tokio::test]
    async fn test_edits_invalidate_cached_metadata() {
        let (service, _) = setup().await;
        assert!(service.get_metadata(10).await.unwrap().notes.is_empty());

        service.set_notes(10, "Tailored for platform roles").await.unwrap();
        service.add_tag(10, "  Rust ").await.unwrap();
        service.add_tag(10, "backend").await.unwrap();
        service.remove_tag(10, "BACKEND").await.unwrap();

        let metadata = service.get_metadata(10).await.unwrap();
        assert_eq!(metadata.notes, "Tailored for platform roles");
        assert_eq!(metadata.tags.into_iter().collect::<Vec<_>>(), vec!["rust"]);
    }

    #[tokio::test]
    async fn test_cached_copy_is_a_snapshot() {
        let (service, _) = setup().await;

        let mut copy = service.get_metadata(10).await.unwrap();
        copy.notes.push_str("local edit");

        assert!(service.get_metadata(10).await.unwrap().notes.is_empty());
    }

    #[tokio::test]
    async fn test_blank_tag_rejected() {
        let (service, _) = setup().await;
        assert!(matches!(
            service.add_tag(10, "  ").await,
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_resume() {
        let (service, _) = setup().await;
        assert!(matches!(
            service.set_notes(404, "x").await,
            Err(ServiceError::NotFound { entity: "resume", id: 404 })
        ));
    }
}
