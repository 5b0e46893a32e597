use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_REPORT_URL: &str =
    "https://datachart.500.com/dlt/history/newinc/history.php?limit={limit}&sort=0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Relais essayés dans l'ordre ; l'URL cible encodée est ajoutée en suffixe.
    pub relays: Vec<String>,
    /// Tailles de page décroissantes essayées pour chaque relais.
    pub limits: Vec<u32>,
    /// Modèle d'URL du rapport, `{limit}` est remplacé par la taille de page.
    pub report_url: String,
    pub timeout_secs: u64,
    /// Une tentative n'est acceptée que si elle renvoie strictement plus de tirages.
    pub min_records: usize,
    pub static_path: PathBuf,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            relays: vec![
                "https://api.allorigins.win/raw?url=".to_string(),
                "https://corsproxy.io/?".to_string(),
                "https://thingproxy.freeboard.io/fetch/".to_string(),
            ],
            limits: vec![2000, 1000, 500, 100],
            report_url: DEFAULT_REPORT_URL.to_string(),
            timeout_secs: 20,
            min_records: 5,
            static_path: PathBuf::from("assets/history.csv"),
        }
    }
}

impl SyncConfig {
    pub fn target_url(&self, limit: u32) -> String {
        self.report_url.replace("{limit}", &limit.to_string())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
