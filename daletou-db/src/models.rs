use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

use thiserror::Error;

pub const FRONT_MAX: u8 = 35;
pub const BACK_MAX: u8 = 12;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("Identifiant de tirage invalide : '{0}'")]
    InvalidId(String),
    #[error("Numéro avant {0} hors limites (1-35)")]
    FrontOutOfRange(u8),
    #[error("Numéro arrière {0} hors limites (1-12)")]
    BackOutOfRange(u8),
    #[error("Numéro avant en double : {0}")]
    DuplicateFront(u8),
    #[error("Numéro arrière en double : {0}")]
    DuplicateBack(u8),
}

/// Numéro de période d'un tirage (ex: "24001").
///
/// Ne se construit qu'à partir d'une chaîne non vide de chiffres, la clé
/// entière utilisée pour le tri est donc toujours disponible.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DrawId {
    raw: String,
    key: u64,
}

impl DrawId {
    pub fn parse(raw: &str) -> Result<Self, RecordError> {
        let raw = raw.trim();
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(RecordError::InvalidId(raw.to_string()));
        }
        let key = raw
            .parse::<u64>()
            .map_err(|_| RecordError::InvalidId(raw.to_string()))?;
        Ok(Self {
            raw: raw.to_string(),
            key,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn key(&self) -> u64 {
        self.key
    }
}

impl FromStr for DrawId {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DrawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl PartialOrd for DrawId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DrawId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key
            .cmp(&other.key)
            .then_with(|| self.raw.cmp(&other.raw))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawRecord {
    pub id: DrawId,
    pub date: String,
    pub front: [u8; 5],
    pub back: [u8; 2],
}

impl DrawRecord {
    pub fn validate(&self) -> Result<(), RecordError> {
        validate_draw(&self.front, &self.back)
    }

    pub fn front_sum(&self) -> u32 {
        self.front.iter().map(|&n| n as u32).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pool {
    Front,
    Back,
}

impl Pool {
    pub fn size(&self) -> usize {
        match self {
            Pool::Front => FRONT_MAX as usize,
            Pool::Back => BACK_MAX as usize,
        }
    }

    pub fn pick_count(&self) -> usize {
        match self {
            Pool::Front => 5,
            Pool::Back => 2,
        }
    }

    pub fn numbers_from<'a>(&self, draw: &'a DrawRecord) -> &'a [u8] {
        match self {
            Pool::Front => &draw.front,
            Pool::Back => &draw.back,
        }
    }
}

/// Historique réconcilié : unique par identifiant, trié du plus récent au plus ancien.
///
/// Seul le module `reconcile` en construit un non vide.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History(Vec<DrawRecord>);

impl History {
    pub(crate) fn from_sorted(records: Vec<DrawRecord>) -> Self {
        Self(records)
    }

    /// Les `n` tirages les plus récents.
    pub fn latest(&self, n: usize) -> &[DrawRecord] {
        &self.0[..n.min(self.0.len())]
    }

    pub fn get(&self, id: &str) -> Option<&DrawRecord> {
        self.0.iter().find(|r| r.id.as_str() == id)
    }

    pub fn into_records(self) -> Vec<DrawRecord> {
        self.0
    }
}

impl Deref for History {
    type Target = [DrawRecord];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

pub fn validate_draw(front: &[u8; 5], back: &[u8; 2]) -> Result<(), RecordError> {
    for &n in front {
        if !(1..=FRONT_MAX).contains(&n) {
            return Err(RecordError::FrontOutOfRange(n));
        }
    }
    for &n in back {
        if !(1..=BACK_MAX).contains(&n) {
            return Err(RecordError::BackOutOfRange(n));
        }
    }
    for i in 0..front.len() {
        for j in (i + 1)..front.len() {
            if front[i] == front[j] {
                return Err(RecordError::DuplicateFront(front[i]));
            }
        }
    }
    if back[0] == back[1] {
        return Err(RecordError::DuplicateBack(back[0]));
    }
    Ok(())
}

pub fn make_test_record(id: &str, front: [u8; 5], back: [u8; 2]) -> DrawRecord {
    DrawRecord {
        id: DrawId::parse(id).unwrap_or_else(|e| panic!("{e}")),
        date: "2024-01-01".to_string(),
        front,
        back,
    }
}

pub fn make_test_records(n: usize) -> Vec<DrawRecord> {
    (0..n)
        .map(|i| {
            let base = (i % 7) as u8;
            let mut record = make_test_record(
                &format!("{}", 24001 + i),
                [
                    base * 5 + 1,
                    base * 5 + 2,
                    base * 5 + 3,
                    base * 5 + 4,
                    base * 5 + 5,
                ],
                [base % 12 + 1, (base + 1) % 12 + 1],
            );
            record.date = format!("2024-01-{:02}", (i % 28) + 1);
            record
        })
        .rev()
        .collect()
}
