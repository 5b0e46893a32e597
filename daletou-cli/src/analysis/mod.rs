pub mod backtest;
pub mod sampler;
pub mod trend;

use daletou_db::models::{DrawRecord, Pool};

#[derive(Debug, Clone)]
pub struct NumberStats {
    pub number: u8,
    pub frequency: u32,
    pub gap: u32,
}

/// Fréquence et retard (nombre de tirages depuis la dernière sortie) de chaque numéro.
/// `draws[0]` est le tirage le plus récent.
pub fn compute_stats(draws: &[DrawRecord], pool: Pool) -> Vec<NumberStats> {
    let mut stats: Vec<NumberStats> = (1..=pool.size() as u8)
        .map(|n| NumberStats {
            number: n,
            frequency: 0,
            gap: draws.len() as u32,
        })
        .collect();

    for (i, draw) in draws.iter().enumerate() {
        for &n in pool.numbers_from(draw) {
            let Some(stat) = stats.get_mut((n as usize).wrapping_sub(1)) else {
                continue;
            };
            if stat.frequency == 0 {
                stat.gap = i as u32;
            }
            stat.frequency += 1;
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use daletou_db::models::make_test_record;

    #[test]
    fn test_compute_stats() {
        let draws = vec![
            make_test_record("3", [1, 2, 3, 4, 5], [1, 2]),
            make_test_record("2", [1, 6, 7, 8, 9], [1, 3]),
            make_test_record("1", [10, 6, 7, 8, 9], [4, 3]),
        ];
        let front = compute_stats(&draws, Pool::Front);
        assert_eq!(front.len(), 35);
        assert_eq!((front[0].frequency, front[0].gap), (2, 0));
        assert_eq!((front[5].frequency, front[5].gap), (2, 1));
        assert_eq!((front[9].frequency, front[9].gap), (1, 2));
        assert_eq!((front[34].frequency, front[34].gap), (0, 3));

        let back = compute_stats(&draws, Pool::Back);
        assert_eq!(back.len(), 12);
        assert_eq!((back[2].frequency, back[2].gap), (2, 1));
    }
}
