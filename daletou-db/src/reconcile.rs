use std::collections::HashSet;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::codec::{decode, encode};
use crate::db::HistoryStore;
use crate::models::{DrawRecord, History};
use crate::seed::seed_records;

/// Écarte les tirages qui ne respectent pas les règles du jeu (5 de 1-35, 2 de 1-12).
pub fn sanitize(records: Vec<DrawRecord>) -> Vec<DrawRecord> {
    records
        .into_iter()
        .filter(|r| match r.validate() {
            Ok(()) => true,
            Err(e) => {
                warn!("Tirage {} écarté : {}", r.id, e);
                false
            }
        })
        .collect()
}

/// Fusion pure : `incoming` passe avant `existing`, donc la version entrante
/// d'un identifiant déjà connu l'emporte. Résultat trié par identifiant décroissant.
pub fn merge(existing: &History, incoming: Vec<DrawRecord>) -> History {
    let mut seen = HashSet::new();
    let mut merged: Vec<DrawRecord> = incoming
        .into_iter()
        .chain(existing.iter().cloned())
        .filter(|r| seen.insert(r.id.clone()))
        .collect();
    merged.sort_by(|a, b| b.id.cmp(&a.id));
    History::from_sorted(merged)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeSummary {
    pub received: usize,
    pub rejected: usize,
    pub added: usize,
    pub total: usize,
}

/// Unique écrivain de l'historique et de son stockage durable.
pub struct Reconciler<S: HistoryStore> {
    store: S,
    history: History,
    seeded: bool,
}

impl<S: HistoryStore> Reconciler<S> {
    /// Construit l'historique initial à partir du jeu statique et de la base.
    /// Si les deux sont vides, l'historique est amorcé avec le jeu embarqué
    /// (sans l'écrire en base). Une base illisible fait échouer l'amorçage
    /// sans qu'aucune écriture n'ait lieu.
    pub fn bootstrap(mut store: S, static_records: Vec<DrawRecord>) -> Result<Self> {
        let persisted = store
            .load_history()
            .context("Lecture de l'historique sauvegardé impossible")?
            .map(|text| decode(&text))
            .unwrap_or_default();
        debug!(
            "Amorçage : {} tirages statiques, {} sauvegardés",
            static_records.len(),
            persisted.len()
        );

        let mut combined = static_records;
        combined.extend(persisted);
        let combined = sanitize(combined);

        if combined.is_empty() {
            info!("Aucune donnée disponible, utilisation du jeu embarqué");
            let history = merge(&History::default(), seed_records());
            return Ok(Self { store, history, seeded: true });
        }

        let history = merge(&History::default(), combined);
        let encoded = encode(&history)?;
        store.save_history(&encoded)
            .context("Échec de la sauvegarde de l'historique initial")?;
        Ok(Self { store, history, seeded: false })
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn is_seeded(&self) -> bool {
        self.seeded
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Lecture-fusion-écriture en une étape. En cas d'échec de la sauvegarde,
    /// l'historique en mémoire reste inchangé.
    pub fn apply(&mut self, incoming: Vec<DrawRecord>) -> Result<MergeSummary> {
        let received = incoming.len();
        let incoming = sanitize(incoming);
        let rejected = received - incoming.len();

        let merged = merge(&self.history, incoming);
        let encoded = encode(&merged)?;
        self.store.save_history(&encoded)
            .context("Échec de la sauvegarde de l'historique")?;

        let summary = MergeSummary {
            received,
            rejected,
            added: merged.len().saturating_sub(self.history.len()),
            total: merged.len(),
        };
        info!(
            "Fusion : {} reçus, {} écartés, {} nouveaux, {} au total",
            summary.received, summary.rejected, summary.added, summary.total
        );
        self.history = merged;
        self.seeded = false;
        Ok(summary)
    }
}
