//! Application tracking and per-user aggregate statistics.
//!
//! The statistics are recomputed from the full application list, so they sit
//! behind the short-TTL stats cache. Any write to an application invalidates
//! its owner's stats key.

use std::sync::Arc;

use tracing::debug;

use crate::caches::AppCaches;
use crate::error::ServiceError;
use crate::keys::application_stats_key;
use crate::models::{
    Application, ApplicationId, ApplicationStats, ApplicationStatus, NewApplication, UserId,
};
use crate::services::ResumeRepository;

#[derive(Clone)]
pub struct ApplicationService {
    repo: Arc<dyn ResumeRepository>,
    caches: AppCaches,
}

impl ApplicationService {
    pub fn new(repo: Arc<dyn ResumeRepository>, caches: AppCaches) -> Self {
        Self { repo, caches }
    }

    /// Aggregate statistics over all of `user_id`'s applications.
    pub async fn stats_for_user(&self, user_id: UserId) -> Result<ApplicationStats, ServiceError> {
        let repo = Arc::clone(&self.repo);
        self.caches
            .application_stats
            .compute_once(application_stats_key(user_id), move || async move {
                let applications = repo.list_applications(user_id).await?;
                Ok(ApplicationStats::from_applications(user_id, &applications))
            })
            .await
    }

    pub async fn record_application(
        &self,
        new: NewApplication,
    ) -> Result<Application, ServiceError> {
        if new.company.trim().is_empty() || new.position.trim().is_empty() {
            return Err(ServiceError::InvalidInput(
                "company and position are required".to_string(),
            ));
        }

        let application = self.repo.insert_application(new).await?;
        self.invalidate_stats(application.user_id);
        Ok(application)
    }

    pub async fn update_status(
        &self,
        id: ApplicationId,
        status: ApplicationStatus,
    ) -> Result<Application, ServiceError> {
        let mut application = self
            .repo
            .find_application(id)
            .await?
            .ok_or(ServiceError::NotFound {
                entity: "application",
                id,
            })?;
        application.status = status;
        self.repo.save_application(application.clone()).await?;

        self.invalidate_stats(application.user_id);
        Ok(application)
    }

    /// Deletes the application record entirely. A withdrawal that should
    /// stay in the history goes through `update_status` instead.
    pub async fn delete_application(
        &self,
        id: ApplicationId,
    ) -> Result<Application, ServiceError> {
        let removed = self
            .repo
            .delete_application(id)
            .await?
            .ok_or(ServiceError::NotFound {
                entity: "application",
                id,
            })?;

        self.invalidate_stats(removed.user_id);
        Ok(removed)
    }

    fn invalidate_stats(&self, user_id: UserId) {
        self.caches
            .application_stats
            .delete(&application_stats_key(user_id));
        debug!(user_id, "application stats invalidated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::config::Config;
    use crate::services::InMemoryRepository;
    use std::time::Duration;

    fn setup() -> (ApplicationService, Arc<InMemoryRepository>) {
        let repo = Arc::new(InMemoryRepository::new());
        let caches = AppCaches::from_config(&Config::default()).unwrap();
        (ApplicationService::new(repo.clone(), caches), repo)
    }

    fn new_application(user_id: UserId, company: &str) -> NewApplication {
        NewApplication {
            user_id,
            resume_id: 1,
            company: company.to_string(),
            position: "Platform Engineer".to_string(),
        }
    }

    #[tokio::test]
    async fn test_stats_are_cached_between_writes() {
        let (service, repo) = setup();
        service
            .record_application(new_application(1, "Acme"))
            .await
            .unwrap();

        let first = service.stats_for_user(1).await.unwrap();
        let second = service.stats_for_user(1).await.unwrap();

        assert_eq!(first.total, 1);
        assert_eq!(first, second);
        assert_eq!(repo.reads(), 1);
    }

    #[tokio::test]
    async fn test_every_write_invalidates_owner_stats() {
        let (service, _) = setup();

        let acme = service
            .record_application(new_application(1, "Acme"))
            .await
            .unwrap();
        assert_eq!(service.stats_for_user(1).await.unwrap().total, 1);

        let globex = service
            .record_application(new_application(1, "Globex"))
            .await
            .unwrap();
        assert_eq!(service.stats_for_user(1).await.unwrap().total, 2);

        service
            .update_status(acme.id, ApplicationStatus::Interviewing)
            .await
            .unwrap();
        let stats = service.stats_for_user(1).await.unwrap();
        assert_eq!(stats.count(ApplicationStatus::Interviewing), 1);
        assert!((stats.response_rate - 0.5).abs() < 1e-9);

        service.delete_application(globex.id).await.unwrap();
        assert_eq!(service.stats_for_user(1).await.unwrap().total, 1);
    }

    #[tokio::test]
    async fn test_withdrawn_status_kept_in_history() {
        let (service, _) = setup();
        let acme = service
            .record_application(new_application(1, "Acme"))
            .await
            .unwrap();
        let globex = service
            .record_application(new_application(1, "Globex"))
            .await
            .unwrap();
        service
            .update_status(globex.id, ApplicationStatus::Offer)
            .await
            .unwrap();
        assert!((service.stats_for_user(1).await.unwrap().response_rate - 0.5).abs() < 1e-9);

        service
            .update_status(acme.id, ApplicationStatus::Withdrawn)
            .await
            .unwrap();
        let stats = service.stats_for_user(1).await.unwrap();

        assert_eq!(stats.total, 2);
        assert_eq!(stats.count(ApplicationStatus::Withdrawn), 1);
        assert!((stats.response_rate - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_writes_leave_other_users_cached() {
        let (service, repo) = setup();
        service
            .record_application(new_application(2, "Initech"))
            .await
            .unwrap();
        service.stats_for_user(2).await.unwrap();
        let reads = repo.reads();

        service
            .record_application(new_application(1, "Acme"))
            .await
            .unwrap();
        service.stats_for_user(2).await.unwrap();

        assert_eq!(repo.reads(), reads);
    }

    #[tokio::test]
    async fn test_forgotten_invalidation_heals_after_ttl() {
        let clock = ManualClock::new();
        let repo = Arc::new(InMemoryRepository::new());
        let caches = AppCaches::with_clock(&Config::default(), Arc::new(clock.clone())).unwrap();
        let service = ApplicationService::new(repo.clone(), caches);

        assert_eq!(service.stats_for_user(1).await.unwrap().total, 0);

        // A write that bypasses the service never invalidates
        repo.insert_application(new_application(1, "Acme"))
            .await
            .unwrap();
        assert_eq!(service.stats_for_user(1).await.unwrap().total, 0);

        clock.advance(Duration::from_secs(31));
        assert_eq!(service.stats_for_user(1).await.unwrap().total, 1);
    }

    #[tokio::test]
    async fn test_concurrent_stats_requests_query_once() {
        let (service, repo) = setup();
        service
            .record_application(new_application(1, "Acme"))
            .await
            .unwrap();

        let requests = (0..10).map(|_| service.stats_for_user(1));
        let results = futures::future::join_all(requests).await;

        assert!(results.iter().all(|r| r.as_ref().map(|s| s.total) == Ok(1)));
        assert_eq!(repo.reads(), 1);
    }

    #[tokio::test]
    async fn test_validation_and_missing_records() {
        let (service, _) = setup();

        assert!(matches!(
            service.record_application(new_application(1, " ")).await,
            Err(ServiceError::InvalidInput(_))
        ));
        assert!(matches!(
            service.update_status(77, ApplicationStatus::Offer).await,
            Err(ServiceError::NotFound { entity: "application", id: 77 })
        ));
        assert!(matches!(
            service.delete_application(77).await,
            Err(ServiceError::NotFound { .. })
        ));
    }
}
