//! Collection status
//!
//! Progress counters for the annotation campaign, plus a health report that
//! folds store reachability into the same payload.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use crate::repository::PictureRepository;
use crate::store::PictureFilter;
use crate::types::Result;

/// Default bound on the health ping
pub const DEFAULT_HEALTH_TIMEOUT: Duration = Duration::from_secs(3);

/// Snapshot of the collection counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Status {
    /// Every picture
    pub total: u64,
    /// Pictures annotated by a human (recognizer proposals excluded)
    pub annotated: u64,
    /// Pictures marked unreadable
    pub unreadable: u64,
}

/// Status plus store reachability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    #[serde(rename = "isDBUp")]
    pub db_up: bool,
    #[serde(flatten)]
    pub status: Status,
}

#[derive(Clone)]
pub struct StatusAggregator {
    repo: PictureRepository,
    health_timeout: Duration,
}

impl StatusAggregator {
    pub fn new(repo: PictureRepository) -> Self {
        Self::with_health_timeout(repo, DEFAULT_HEALTH_TIMEOUT)
    }

    pub fn with_health_timeout(repo: PictureRepository, health_timeout: Duration) -> Self {
        Self {
            repo,
            health_timeout,
        }
    }

    /// Count total, human-annotated and unreadable pictures.
    ///
    /// The three counts are separate reads and are not a consistent snapshot
    /// under concurrent writes. Any failing count fails the whole call.
    pub async fn compute_status(&self) -> Result<Status> {
        let all = PictureFilter::all();
        let humans = PictureFilter::annotated_by_humans();
        let unreadable = PictureFilter::unreadable();

        let (total, annotated, unreadable) = tokio::try_join!(
            self.repo.count(&all),
            self.repo.count(&humans),
            self.repo.count(&unreadable),
        )?;

        let status = Status {
            total,
            annotated,
            unreadable,
        };
        debug!(?status, "Computed collection status");
        Ok(status)
    }

    /// Health report. Never fails: an unreachable store reports
    /// `isDBUp=false` with zeroed counters.
    pub async fn health(&self) -> HealthReport {
        if let Err(e) = self.repo.ping(self.health_timeout).await {
            warn!("Store is down: {}", e);
            return HealthReport {
                db_up: false,
                status: Status::default(),
            };
        }

        match self.compute_status().await {
            Ok(status) => HealthReport {
                db_up: true,
                status,
            },
            Err(e) => {
                warn!("Store answered ping but counting failed: {}", e);
                HealthReport {
                    db_up: false,
                    status: Status::default(),
                }
            }
        }
    }
}
