use crate::ladder::FetchAttempt;

/// Échec d'une tentative isolée de l'échelle de repli.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("Délai dépassé ({secs} s)")]
    Timeout { secs: u64 },

    #[error("Statut HTTP {0}")]
    Status(u16),

    #[error("Erreur réseau : {0}")]
    Transport(String),

    #[error("Trop peu de tirages : {found} (minimum {min})")]
    TooFewRecords { found: usize, min: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Seule l'erreur de la dernière tentative est rapportée.
    #[error("Toutes les tentatives ont échoué, dernière erreur : {last}")]
    Exhausted {
        #[source]
        last: FetchError,
        attempts: Vec<FetchAttempt>,
    },

    #[error("Aucune tentative configurée")]
    NoAttempts,

    #[error("Échec de la réconciliation : {0:#}")]
    Reconcile(anyhow::Error),
}
