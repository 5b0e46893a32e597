use std::collections::BTreeMap;

use daletou_db::models::DrawRecord;

/// Rang de gain et combinaisons (bons numéros avant, bons numéros arrière) qui y mènent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrizeTier {
    pub tier: u8,
    pub name: &'static str,
    pub patterns: &'static [(u8, u8)],
}

/// Grille des gains du Super Lotto (règles en vigueur depuis 2019).
pub const PRIZE_TIERS: &[PrizeTier] = &[
    PrizeTier { tier: 1, name: "1er rang", patterns: &[(5, 2)] },
    PrizeTier { tier: 2, name: "2e rang", patterns: &[(5, 1)] },
    PrizeTier { tier: 3, name: "3e rang", patterns: &[(5, 0)] },
    PrizeTier { tier: 4, name: "4e rang", patterns: &[(4, 2)] },
    PrizeTier { tier: 5, name: "5e rang", patterns: &[(4, 1)] },
    PrizeTier { tier: 6, name: "6e rang", patterns: &[(3, 2)] },
    PrizeTier { tier: 7, name: "7e rang", patterns: &[(4, 0)] },
    PrizeTier { tier: 8, name: "8e rang", patterns: &[(3, 1), (2, 2)] },
    PrizeTier { tier: 9, name: "9e rang", patterns: &[(3, 0), (1, 2), (2, 1), (0, 2)] },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrizeTierResult {
    pub tier: u8,
    pub name: String,
    pub count: u32,
}

pub fn tier_for(front_matches: usize, back_matches: usize) -> Option<&'static PrizeTier> {
    PRIZE_TIERS.iter().find(|t| {
        t.patterns
            .iter()
            .any(|&(f, b)| f as usize == front_matches && b as usize == back_matches)
    })
}

fn matches(candidate: &[u8], drawn: &[u8]) -> usize {
    drawn.iter().filter(|n| candidate.contains(n)).count()
}

/// Nombre de tirages de l'historique qui auraient rapporté chaque rang.
/// Seuls les rangs atteints au moins une fois sont renvoyés, par rang croissant.
pub fn backtest(front: &[u8; 5], back: &[u8; 2], history: &[DrawRecord]) -> Vec<PrizeTierResult> {
    let mut counts: BTreeMap<u8, u32> = BTreeMap::new();

    for record in history {
        let f = matches(front, &record.front);
        let b = matches(back, &record.back);
        if let Some(tier) = tier_for(f, b) {
            *counts.entry(tier.tier).or_default() += 1;
        }
    }

    PRIZE_TIERS
        .iter()
        .filter_map(|t| {
            counts.get(&t.tier).map(|&count| PrizeTierResult {
                tier: t.tier,
                name: t.name.to_string(),
                count,
            })
        })
        .collect()
}

/// Grille complète, rangs jamais atteints compris (compte à zéro).
pub fn full_table(results: &[PrizeTierResult]) -> Vec<PrizeTierResult> {
    PRIZE_TIERS
        .iter()
        .map(|t| PrizeTierResult {
            tier: t.tier,
            name: t.name.to_string(),
            count: results
                .iter()
                .find(|r| r.tier == t.tier)
                .map(|r| r.count)
                .unwrap_or(0),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use daletou_db::models::{make_test_record, make_test_records};

    #[test]
    fn test_tier_table_is_consistent() {
        let mut seen = Vec::new();
        for (i, tier) in PRIZE_TIERS.iter().enumerate() {
            assert_eq!(tier.tier as usize, i + 1);
            for &p in tier.patterns {
                assert!(p.0 <= 5 && p.1 <= 2);
                assert!(!seen.contains(&p), "combinaison {p:?} en double");
                seen.push(p);
            }
        }
        assert_eq!(seen.len(), 13);
    }

    #[test]
    fn test_tier_for() {
        assert_eq!(tier_for(5, 2).unwrap().tier, 1);
        assert_eq!(tier_for(4, 0).unwrap().tier, 7);
        assert_eq!(tier_for(2, 2).unwrap().tier, 8);
        assert_eq!(tier_for(0, 2).unwrap().tier, 9);
        assert!(tier_for(2, 0).is_none());
        assert!(tier_for(1, 1).is_none());
        assert!(tier_for(0, 0).is_none());
    }

    #[test]
    fn test_exact_match_hits_top_tier() {
        let history = vec![make_test_record("24001", [1, 2, 3, 4, 5], [1, 2])];
        let results = backtest(&[1, 2, 3, 4, 5], &[1, 2], &history);
        assert_eq!(
            results,
            vec![PrizeTierResult { tier: 1, name: "1er rang".to_string(), count: 1 }]
        );
    }

    #[test]
    fn test_no_match_is_empty() {
        let history = vec![make_test_record("24001", [1, 2, 3, 4, 5], [1, 2])];
        assert!(backtest(&[30, 31, 32, 33, 34], &[11, 12], &history).is_empty());
    }

    #[test]
    fn test_order_of_numbers_is_irrelevant() {
        let history = vec![make_test_record("24001", [5, 3, 1, 4, 2], [2, 1])];
        let results = backtest(&[1, 2, 3, 4, 5], &[1, 2], &history);
        assert_eq!(results[0].tier, 1);
    }

    #[test]
    fn test_counts_accumulate_and_sorted() {
        let history = vec![
            make_test_record("3", [1, 2, 3, 20, 21], [1, 9]),   // 3+1 -> 8
            make_test_record("2", [1, 2, 3, 4, 21], [9, 10]),   // 4+0 -> 7
            make_test_record("1", [1, 2, 22, 23, 24], [1, 2]),  // 2+2 -> 8
        ];
        let results = backtest(&[1, 2, 3, 4, 5], &[1, 2], &history);
        let summary: Vec<(u8, u32)> = results.iter().map(|r| (r.tier, r.count)).collect();
        assert_eq!(summary, vec![(7, 1), (8, 2)]);
    }

    #[test]
    fn test_history_order_does_not_matter() {
        let history = make_test_records(50);
        let mut shuffled = history.clone();
        shuffled.reverse();
        shuffled.rotate_left(17);

        let front = [1, 2, 3, 8, 9];
        let back = [1, 2];
        assert_eq!(backtest(&front, &back, &history), backtest(&front, &back, &shuffled));
        assert_eq!(backtest(&front, &back, &history), backtest(&front, &back, &history));
    }

    #[test]
    fn test_full_table() {
        let results = vec![PrizeTierResult { tier: 8, name: "8e rang".to_string(), count: 3 }];
        let table = full_table(&results);
        assert_eq!(table.len(), 9);
        assert_eq!(table[7].count, 3);
        assert_eq!(table.iter().map(|r| r.count).sum::<u32>(), 3);
    }
}
