//! Persistence collaborator
//!
//! The services only need "load this entity" and "store this entity" from the
//! source of truth. [`InMemoryRepository`] backs tests and local runs.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::ServiceError;
use crate::models::{
    Application, ApplicationId, ApplicationStatus, NewApplication, ResumeId, ResumeMetadata, User,
    UserId,
};

pub type RepositoryResult<T> = std::result::Result<T, ServiceError>;

// == Repository Trait ==
/// Source of truth behind the named caches.
#[async_trait]
pub trait ResumeRepository: Send + Sync {
    async fn find_user(&self, id: UserId) -> RepositoryResult<Option<User>>;

    async fn save_user(&self, user: User) -> RepositoryResult<()>;

    /// Removes the user together with their applications and résumé
    /// metadata. Returns the ids of the removed résumés, or `None` when the
    /// user did not exist.
    async fn delete_user(&self, id: UserId) -> RepositoryResult<Option<Vec<ResumeId>>>;

    async fn find_metadata(&self, resume_id: ResumeId) -> RepositoryResult<Option<ResumeMetadata>>;

    async fn save_metadata(&self, metadata: ResumeMetadata) -> RepositoryResult<()>;

    async fn list_applications(&self, user_id: UserId) -> RepositoryResult<Vec<Application>>;

    async fn find_application(&self, id: ApplicationId) -> RepositoryResult<Option<Application>>;

    /// Stores a new application and returns it with its assigned id.
    async fn insert_application(&self, new: NewApplication) -> RepositoryResult<Application>;

    async fn save_application(&self, application: Application) -> RepositoryResult<()>;

    /// Returns the removed application, if any.
    async fn delete_application(&self, id: ApplicationId)
        -> RepositoryResult<Option<Application>>;
}

// == In-Memory Repository ==
#[derive(Debug, Default)]
struct Tables {
    users: HashMap<UserId, User>,
    metadata: HashMap<ResumeId, ResumeMetadata>,
    applications: BTreeMap<ApplicationId, Application>,
}

/// Repository kept in process memory.
///
/// Counts the reads it serves so tests can tell cache hits from source
/// lookups, and can be switched into a failing mode to simulate an outage.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    tables: RwLock<Tables>,
    next_application_id: AtomicU64,
    reads: AtomicU64,
    unavailable: AtomicBool,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of read queries served so far.
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }

    /// Makes every subsequent call fail until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> RepositoryResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ServiceError::Repository("database unavailable".to_string()));
        }
        Ok(())
    }

    fn begin_read(&self) -> RepositoryResult<()> {
        self.check_available()?;
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl ResumeRepository for InMemoryRepository {
    async fn find_user(&self, id: UserId) -> RepositoryResult<Option<User>> {
        self.begin_read()?;
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn save_user(&self, user: User) -> RepositoryResult<()> {
        self.check_available()?;
        self.tables.write().await.users.insert(user.id, user);
        Ok(())
    }

    async fn delete_user(&self, id: UserId) -> RepositoryResult<Option<Vec<ResumeId>>> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        if tables.users.remove(&id).is_none() {
            return Ok(None);
        }

        tables.applications.retain(|_, a| a.user_id != id);
        let mut removed = Vec::new();
        tables.metadata.retain(|&resume_id, m| {
            let owned = m.owner_id == id;
            if owned {
                removed.push(resume_id);
            }
            !owned
        });
        Ok(Some(removed))
    }

    async fn find_metadata(&self, resume_id: ResumeId) -> RepositoryResult<Option<ResumeMetadata>> {
        self.begin_read()?;
        Ok(self.tables.read().await.metadata.get(&resume_id).cloned())
    }

    async fn save_metadata(&self, metadata: ResumeMetadata) -> RepositoryResult<()> {
        self.check_available()?;
        self.tables
            .write()
            .await
            .metadata
            .insert(metadata.resume_id, metadata);
        Ok(())
    }

    async fn list_applications(&self, user_id: UserId) -> RepositoryResult<Vec<Application>> {
        self.begin_read()?;
        let tables = self.tables.read().await;
        Ok(tables
            .applications
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_application(&self, id: ApplicationId) -> RepositoryResult<Option<Application>> {
        self.begin_read()?;
        Ok(self.tables.read().await.applications.get(&id).cloned())
    }

    async fn insert_application(&self, new: NewApplication) -> RepositoryResult<Application> {
        self.check_available()?;
        let id = self.next_application_id.fetch_add(1, Ordering::SeqCst) + 1;
        let application = Application {
            id,
            user_id: new.user_id,
            resume_id: new.resume_id,
            company: new.company,
            position: new.position,
            status: ApplicationStatus::Applied,
            applied_at: Utc::now(),
        };
        self.tables
            .write()
            .await
            .applications
            .insert(id, application.clone());
        Ok(application)
    }

    async fn save_application(&self, application: Application) -> RepositoryResult<()> {
        self.check_available()?;
        self.tables
            .write()
            .await
            .applications
            .insert(application.id, application);
        Ok(())
    }

    async fn delete_application(
        &self,
        id: ApplicationId,
    ) -> RepositoryResult<Option<Application>> {
        self.check_available()?;
        Ok(self.tables.write().await.applications.remove(&id))
    }
}
