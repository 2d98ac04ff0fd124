//! Domain values held by the named caches
//!
//! Snapshots of the résumé service's entities. The cache hands out clones,
//! so a caller mutating its copy never affects other readers.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type UserId = u64;
pub type ResumeId = u64;
pub type ApplicationId = u64;

/// A user account as returned by a profile lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub display_name: String,
    pub updated_at: DateTime<Utc>,
}

/// Free-form notes and tags attached to one résumé version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeMetadata {
    pub resume_id: ResumeId,
    pub owner_id: UserId,
    pub notes: String,
    pub tags: BTreeSet<String>,
    pub updated_at: DateTime<Utc>,
}

impl ResumeMetadata {
    pub fn new(resume_id: ResumeId, owner_id: UserId) -> Self {
        Self {
            resume_id,
            owner_id,
            notes: String::new(),
            tags: BTreeSet::new(),
            updated_at: Utc::now(),
        }
    }
}

/// Where an application currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Applied,
    Interviewing,
    Offer,
    Rejected,
    Withdrawn,
}

impl ApplicationStatus {
    /// Whether the employer has answered in any way.
    pub fn is_response(self) -> bool {
        matches!(self, Self::Interviewing | Self::Offer | Self::Rejected)
    }
}

/// One tracked job application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub user_id: UserId,
    pub resume_id: ResumeId,
    pub company: String,
    pub position: String,
    pub status: ApplicationStatus,
    pub applied_at: DateTime<Utc>,
}

/// Fields supplied when a user records a new application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewApplication {
    pub user_id: UserId,
    pub resume_id: ResumeId,
    pub company: String,
    pub position: String,
}

/// Aggregate view over all of one user's applications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationStats {
    pub user_id: UserId,
    pub total: usize,
    pub by_status: BTreeMap<ApplicationStatus, usize>,
    /// Share of non-withdrawn applications that received any answer
    pub response_rate: f64,
    pub last_applied_at: Option<DateTime<Utc>>,
}

impl ApplicationStats {
    /// Aggregates `applications`, all of which belong to `user_id`.
    pub fn from_applications(user_id: UserId, applications: &[Application]) -> Self {
        let mut by_status = BTreeMap::new();
        for application in applications {
            *by_status.entry(application.status).or_insert(0) += 1;
        }

        let considered = applications
            .iter()
            .filter(|a| a.status != ApplicationStatus::Withdrawn)
            .count();
        let responded = applications
            .iter()
            .filter(|a| a.status.is_response())
            .count();
        let response_rate = if considered == 0 {
            0.0
        } else {
            responded as f64 / considered as f64
        };

        Self {
            user_id,
            total: applications.len(),
            by_status,
            response_rate,
            last_applied_at: applications.iter().map(|a| a.applied_at).max(),
        }
    }

    pub fn count(&self, status: ApplicationStatus) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }
}
