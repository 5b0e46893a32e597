use std::time::Duration;

use tokio::sync::Mutex;
use tracing::info;

use daletou_db::db::HistoryStore;
use daletou_db::models::History;
use daletou_db::reconcile::{MergeSummary, Reconciler};

use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::ladder::{AttemptPlan, FetchAttempt, LadderReport, build_ladder, run_ladder};
use crate::live::PageFetcher;
use crate::static_source::read_static;

#[derive(Debug)]
pub enum SyncOutcome {
    Merged {
        summary: MergeSummary,
        attempts: Vec<FetchAttempt>,
    },
    /// Une synchronisation était déjà en cours ; rien n'a été fait.
    AlreadyRunning,
}

/// Synchronisation en vol unique : le réseau est interrogé hors verrou,
/// puis la fusion et la sauvegarde se font en une étape sous le verrou.
pub struct Synchronizer<F: PageFetcher, S: HistoryStore> {
    fetcher: F,
    plan: Vec<AttemptPlan>,
    timeout: Duration,
    min_records: usize,
    reconciler: Mutex<Reconciler<S>>,
    running: Mutex<()>,
}

impl<F: PageFetcher, S: HistoryStore> Synchronizer<F, S> {
    pub fn new(fetcher: F, reconciler: Reconciler<S>, config: &SyncConfig) -> Self {
        Self {
            fetcher,
            plan: build_ladder(config),
            timeout: config.timeout(),
            min_records: config.min_records,
            reconciler: Mutex::new(reconciler),
            running: Mutex::new(()),
        }
    }

    /// Démarrage : jeu statique + historique sauvegardé (ou jeu embarqué).
    pub async fn start(fetcher: F, store: S, config: &SyncConfig) -> anyhow::Result<Self> {
        let static_records = read_static(&config.static_path).await;
        let reconciler = Reconciler::bootstrap(store, static_records)?;
        Ok(Self::new(fetcher, reconciler, config))
    }

    pub async fn history(&self) -> History {
        self.reconciler.lock().await.history().clone()
    }

    pub async fn is_seeded(&self) -> bool {
        self.reconciler.lock().await.is_seeded()
    }

    pub fn plan(&self) -> &[AttemptPlan] {
        &self.plan
    }

    pub async fn sync(&self) -> Result<SyncOutcome, SyncError> {
        let Ok(_running) = self.running.try_lock() else {
            info!("Synchronisation déjà en cours, demande ignorée");
            return Ok(SyncOutcome::AlreadyRunning);
        };

        let LadderReport { records, attempts } =
            run_ladder(&self.fetcher, &self.plan, self.timeout, self.min_records).await?;

        let summary = self
            .reconciler
            .lock()
            .await
            .apply(records)
            .map_err(SyncError::Reconcile)?;

        Ok(SyncOutcome::Merged { summary, attempts })
    }

    pub fn into_reconciler(self) -> Reconciler<S> {
        self.reconciler.into_inner()
    }
}
