use serde::{Deserialize, Serialize};

use daletou_db::models::DrawRecord;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    /// Nombre de tirages récents pris en compte.
    pub window: usize,
    /// Valeur renvoyée pour un historique vide.
    pub default_sum: u32,
    /// Demi-largeur de la fourchette autour de la somme prévue.
    pub tolerance: u32,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            window: 30,
            default_sum: 90,
            tolerance: 5,
        }
    }
}

pub fn predict_sum(history: &[DrawRecord]) -> u32 {
    predict_sum_with(history, &TrendConfig::default())
}

/// Moyenne arrondie des sommes de la zone avant sur les `window` tirages les plus récents.
/// `history[0]` est le tirage le plus récent.
pub fn predict_sum_with(history: &[DrawRecord], config: &TrendConfig) -> u32 {
    let recent = &history[..config.window.min(history.len())];
    if recent.is_empty() {
        return config.default_sum;
    }
    let total: u32 = recent.iter().map(DrawRecord::front_sum).sum();
    (total as f64 / recent.len() as f64).round() as u32
}

pub fn sum_window(predicted: u32, tolerance: u32) -> (u32, u32) {
    (predicted.saturating_sub(tolerance), predicted.saturating_add(tolerance))
}

#[cfg(test)]
mod tests {
    use super::*;
    use daletou_db::models::make_test_record;

    #[test]
    fn test_empty_history_uses_default() {
        assert_eq!(predict_sum(&[]), 90);
        let config = TrendConfig { default_sum: 77, ..TrendConfig::default() };
        assert_eq!(predict_sum_with(&[], &config), 77);
    }

    #[test]
    fn test_single_record() {
        let history = vec![make_test_record("1", [3, 9, 17, 22, 30], [1, 2])];
        assert_eq!(predict_sum(&history), 81);
    }

    #[test]
    fn test_rounded_mean() {
        let history = vec![
            make_test_record("2", [1, 2, 3, 4, 5], [1, 2]),   // 15
            make_test_record("1", [1, 2, 3, 4, 6], [1, 2]),   // 16
        ];
        assert_eq!(predict_sum(&history), 16);
    }

    #[test]
    fn test_only_recent_window_counts() {
        let mut history = vec![make_test_record("3", [31, 32, 33, 34, 35], [1, 2])];
        history.push(make_test_record("2", [1, 2, 3, 4, 5], [1, 2]));
        history.push(make_test_record("1", [1, 2, 3, 4, 5], [1, 2]));
        let config = TrendConfig { window: 1, ..TrendConfig::default() };
        assert_eq!(predict_sum_with(&history, &config), 165);
    }

    #[test]
    fn test_sum_window() {
        assert_eq!(sum_window(90, 5), (85, 95));
        assert_eq!(sum_window(3, 5), (0, 8));
        assert_eq!(sum_window(90, u32::MAX), (0, u32::MAX));
    }
}
