use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::index;

use daletou_db::models::{BACK_MAX, FRONT_MAX};

/// Nombre de tirages aléatoires tentés par grille avant d'accepter hors fourchette.
const MAX_TRIES: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub front: [u8; 5],
    pub back: [u8; 2],
    pub in_window: bool,
}

impl Suggestion {
    pub fn front_sum(&self) -> u32 {
        self.front.iter().map(|&n| n as u32).sum()
    }
}

/// Grilles aléatoires dont la somme de la zone avant tombe, si possible, dans `window`.
pub fn generate_suggestions(count: usize, window: (u32, u32), seed: Option<u64>) -> Vec<Suggestion> {
    let mut rng: StdRng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_rng(&mut rand::rng()),
    };

    (0..count)
        .map(|_| {
            let mut candidate = random_grid(&mut rng);
            for _ in 1..MAX_TRIES {
                if in_window(&candidate, window) {
                    break;
                }
                candidate = random_grid(&mut rng);
            }
            candidate.in_window = in_window(&candidate, window);
            candidate
        })
        .collect()
}

fn in_window(s: &Suggestion, (lo, hi): (u32, u32)) -> bool {
    (lo..=hi).contains(&s.front_sum())
}

fn random_grid(rng: &mut StdRng) -> Suggestion {
    let mut front = [0u8; 5];
    for (slot, i) in front.iter_mut().zip(index::sample(rng, FRONT_MAX as usize, 5).iter()) {
        *slot = i as u8 + 1;
    }
    front.sort();

    let mut back = [0u8; 2];
    for (slot, i) in back.iter_mut().zip(index::sample(rng, BACK_MAX as usize, 2).iter()) {
        *slot = i as u8 + 1;
    }
    back.sort();

    Suggestion { front, back, in_window: false }
}
