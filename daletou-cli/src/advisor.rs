//! Service d'analyse externe (modèle de langage) : reçoit l'historique récent et
//! la somme prévue, renvoie une grille 5+2 et une justification. Sert aussi à
//! convertir un historique copié-collé en tirages.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use daletou_db::models::{DrawId, DrawRecord};

use crate::analysis::trend::sum_window;

const DEEPSEEK_URL: &str = "https://api.deepseek.com/chat/completions";
const DEEPSEEK_MODEL: &str = "deepseek-chat";
const API_KEY_VAR: &str = "DEEPSEEK_API_KEY";

/// Nombre de tirages transmis au service.
const CONTEXT_DRAWS: usize = 50;

pub const DEFAULT_RECOMMENDATION: [u8; 7] = [1, 8, 15, 22, 30, 5, 10];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    #[serde(default)]
    pub hot_numbers: Vec<u8>,
    #[serde(default)]
    pub cold_numbers: Vec<u8>,
    pub recommendation: Vec<u8>,
    #[serde(default)]
    pub explanation: String,
}

impl Analysis {
    pub fn fallback() -> Self {
        Self {
            hot_numbers: Vec::new(),
            cold_numbers: Vec::new(),
            recommendation: DEFAULT_RECOMMENDATION.to_vec(),
            explanation: "Service d'analyse indisponible, grille par défaut.".to_string(),
        }
    }

    /// Découpe la recommandation en zone avant / zone arrière, triées.
    /// `None` si le service n'a pas renvoyé exactement 7 numéros.
    pub fn split(&self) -> Option<([u8; 5], [u8; 2])> {
        let r = self.recommendation.as_slice();
        if r.len() != 7 {
            return None;
        }
        let mut front = [r[0], r[1], r[2], r[3], r[4]];
        let mut back = [r[5], r[6]];
        front.sort();
        back.sort();
        Some((front, back))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AdvisorError {
    #[error("Clé API absente (variable DEEPSEEK_API_KEY)")]
    MissingKey,

    #[error("Erreur HTTP : {0}")]
    Http(#[from] reqwest::Error),

    #[error("Le service a répondu {status} : {message}")]
    Api { status: u16, message: String },

    #[error("Réponse illisible : {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Réponse vide")]
    Empty,
}

#[async_trait]
pub trait AnalysisService: Send + Sync {
    async fn analyze(&self, history: &[DrawRecord], predicted_sum: u32) -> Result<Analysis, AdvisorError>;

    /// Convertit un texte libre (copié d'un site, d'un tableur...) en tirages.
    /// Les tirages renvoyés ne sont pas validés.
    async fn parse_history(&self, raw_text: &str) -> Result<Vec<DrawRecord>, AdvisorError>;
}

pub struct DeepSeekClient {
    http: reqwest::Client,
    api_key: Option<String>,
}

impl DeepSeekClient {
    pub fn from_env() -> Result<Self, AdvisorError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            http,
            api_key: std::env::var(API_KEY_VAR).ok().filter(|k| !k.is_empty()),
        })
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

impl DeepSeekClient {
    /// Une requête de conversation en mode JSON ; renvoie le contenu du premier choix.
    async fn complete(&self, system: &str, user: String) -> Result<String, AdvisorError> {
        let api_key = self.api_key.as_deref().ok_or(AdvisorError::MissingKey)?;

        let body = json!({
            "model": DEEPSEEK_MODEL,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user }
            ],
            "response_format": { "type": "json_object" },
            "temperature": 0.7
        });

        let response = self
            .http
            .post(DEEPSEEK_URL)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AdvisorError::Api { status: status.as_u16(), message });
        }

        let chat: ChatResponse = response.json().await?;
        chat.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(AdvisorError::Empty)
    }
}

#[async_trait]
impl AnalysisService for DeepSeekClient {
    async fn analyze(&self, history: &[DrawRecord], predicted_sum: u32) -> Result<Analysis, AdvisorError> {
        let content = self
            .complete(
                "Analyste de tendances de loterie. Répondre en JSON avec les champs hotNumbers, coldNumbers, recommendation, explanation.",
                build_prompt(history, predicted_sum),
            )
            .await?;
        parse_analysis(&content)
    }

    async fn parse_history(&self, raw_text: &str) -> Result<Vec<DrawRecord>, AdvisorError> {
        let content = self
            .complete(
                "Assistant de traitement de données de loterie. Convertir le texte fourni en JSON, sans rien inventer.",
                build_parse_prompt(raw_text),
            )
            .await?;
        parse_history_json(&content)
    }
}

pub fn parse_analysis(content: &str) -> Result<Analysis, AdvisorError> {
    Ok(serde_json::from_str(content)?)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(u64),
}

#[derive(Deserialize)]
struct RawDraw {
    id: RawId,
    #[serde(default)]
    date: String,
    front: Vec<u8>,
    back: Vec<u8>,
}

impl RawDraw {
    fn into_record(self) -> Option<DrawRecord> {
        let id = match self.id {
            RawId::Text(s) => DrawId::parse(&s).ok()?,
            RawId::Number(n) => DrawId::parse(&n.to_string()).ok()?,
        };
        Some(DrawRecord {
            id,
            date: self.date,
            front: self.front.try_into().ok()?,
            back: self.back.try_into().ok()?,
        })
    }
}

/// Lit la liste de tirages renvoyée par le service, nue ou sous une clé `data`.
/// Les éléments inexploitables sont ignorés un par un.
pub fn parse_history_json(content: &str) -> Result<Vec<DrawRecord>, AdvisorError> {
    let items = match serde_json::from_str::<Value>(content)? {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    let total = items.len();
    let records: Vec<DrawRecord> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<RawDraw>(item).ok()?.into_record())
        .collect();
    if records.len() < total {
        debug!("{} éléments ignorés dans la réponse", total - records.len());
    }
    Ok(records)
}

fn build_parse_prompt(raw_text: &str) -> String {
    format!(
        "Convertir les tirages du Super Lotto ci-dessous en JSON de la forme\n\
         {{\"data\": [{{\"id\": \"période\", \"date\": \"AAAA-MM-JJ\", \"front\": [5 numéros], \"back\": [2 numéros]}}]}}\n\n\
         Données brutes :\n{raw_text}"
    )
}

pub fn history_digest(history: &[DrawRecord]) -> String {
    history
        .iter()
        .take(CONTEXT_DRAWS)
        .map(|r| {
            let front: Vec<String> = r.front.iter().map(u8::to_string).collect();
            let back: Vec<String> = r.back.iter().map(u8::to_string).collect();
            format!("{}: {}+{}", r.id, front.join(","), back.join(","))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn build_prompt(history: &[DrawRecord], predicted_sum: u32) -> String {
    let (lo, hi) = sum_window(predicted_sum, 5);
    format!(
        "Derniers tirages du Super Lotto (zone avant 1-35, zone arrière 1-12).\n\
         Somme de la zone avant visée : {predicted_sum}, entre {lo} et {hi}.\n\
         Proposer 5 numéros avant puis 2 numéros arrière dans `recommendation`.\n\n{}",
        history_digest(history)
    )
}

/// Interroge le service ; toute erreur est journalisée et remplacée par la grille par défaut.
pub async fn analyze_or_default<A: AnalysisService + ?Sized>(
    service: &A,
    history: &[DrawRecord],
    predicted_sum: u32,
) -> Analysis {
    match service.analyze(history, predicted_sum).await {
        Ok(analysis) => analysis,
        Err(e) => {
            warn!("Analyse externe indisponible : {e}");
            Analysis::fallback()
        }
    }
}
