//! Échelle de repli relais × taille de page.
//!
//! Les tentatives sont une liste ordonnée consommée par une seule boucle :
//! la première tentative acceptée gagne, et en cas d'échec total seule
//! l'erreur de la dernière tentative est rapportée.

use std::time::Duration;

use tracing::{info, warn};

use daletou_db::models::DrawRecord;

use crate::config::SyncConfig;
use crate::error::{FetchError, SyncError};
use crate::live::{PageFetcher, parse_report, relay_url};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptPlan {
    pub relay: String,
    pub limit: u32,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Accepted(usize),
    Failed(FetchError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchAttempt {
    pub endpoint: String,
    pub size_limit: u32,
    pub outcome: AttemptOutcome,
}

#[derive(Debug, Clone)]
pub struct LadderReport {
    pub records: Vec<DrawRecord>,
    pub attempts: Vec<FetchAttempt>,
}

impl LadderReport {
    /// La tentative acceptée, toujours la dernière du journal.
    pub fn winner(&self) -> Option<&FetchAttempt> {
        self.attempts
            .last()
            .filter(|a| matches!(a.outcome, AttemptOutcome::Accepted(_)))
    }
}

pub fn build_ladder(config: &SyncConfig) -> Vec<AttemptPlan> {
    config
        .relays
        .iter()
        .flat_map(|relay| {
            config.limits.iter().map(move |&limit| AttemptPlan {
                relay: relay.clone(),
                limit,
                url: relay_url(relay, &config.target_url(limit)),
            })
        })
        .collect()
}

pub async fn run_ladder<F: PageFetcher + ?Sized>(
    fetcher: &F,
    plan: &[AttemptPlan],
    timeout: Duration,
    min_records: usize,
) -> Result<LadderReport, SyncError> {
    let mut attempts = Vec::with_capacity(plan.len());
    let mut last_error = None;

    for step in plan {
        match attempt(fetcher, step, timeout, min_records).await {
            Ok(records) => {
                info!(
                    "{} tirages récupérés via {} (limite {})",
                    records.len(),
                    step.relay,
                    step.limit
                );
                attempts.push(FetchAttempt {
                    endpoint: step.relay.clone(),
                    size_limit: step.limit,
                    outcome: AttemptOutcome::Accepted(records.len()),
                });
                return Ok(LadderReport { records, attempts });
            }
            Err(e) => {
                warn!("Tentative {} (limite {}) échouée : {}", step.relay, step.limit, e);
                attempts.push(FetchAttempt {
                    endpoint: step.relay.clone(),
                    size_limit: step.limit,
                    outcome: AttemptOutcome::Failed(e.clone()),
                });
                last_error = Some(e);
            }
        }
    }

    match last_error {
        Some(last) => Err(SyncError::Exhausted { last, attempts }),
        None => Err(SyncError::NoAttempts),
    }
}

async fn attempt<F: PageFetcher + ?Sized>(
    fetcher: &F,
    step: &AttemptPlan,
    timeout: Duration,
    min_records: usize,
) -> Result<Vec<DrawRecord>, FetchError> {
    let body = tokio::time::timeout(timeout, fetcher.fetch(&step.url))
        .await
        .map_err(|_| FetchError::Timeout { secs: timeout.as_secs() })??;

    let records = parse_report(&body);
    if records.len() <= min_records {
        return Err(FetchError::TooFewRecords {
            found: records.len(),
            min: min_records,
        });
    }
    Ok(records)
}
