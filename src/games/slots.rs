//! Slots payload renderer.
//!
//! Five reels drawn from a fixed alphabet. A win forces the three central
//! reels to one randomly chosen symbol; a loss leaves the reels
//! unconstrained but perturbs a central reel if the draw happens to form
//! the win pattern on its own.

use rand::seq::SliceRandom;
use rand::Rng;

use super::types::{GameData, SlotSymbol};

pub const REEL_COUNT: usize = 5;

/// Reels 1..=3 carry the win pattern
const CENTER: std::ops::Range<usize> = 1..4;

/// Render a slots round for a pre-computed decision. Returns the payout in
/// the bet currency and the reel payload.
pub fn render<R: Rng + ?Sized>(
    decision: bool,
    bet_amount: f64,
    multiplier: f64,
    rng: &mut R,
) -> (f64, GameData) {
    let mut reels = [SlotSymbol::Cherry; REEL_COUNT];
    for reel in reels.iter_mut() {
        *reel = draw(rng);
    }

    let payout = if decision {
        let winning = draw(rng);
        for idx in CENTER {
            reels[idx] = winning;
        }
        bet_amount * multiplier
    } else {
        // An unconstrained draw may accidentally satisfy the win pattern;
        // perturb the middle reel until it doesn't.
        while is_central_triple(&reels) {
            reels[2] = draw(rng);
        }
        0.0
    };

    (payout, GameData::Slots { reels })
}

fn draw<R: Rng + ?Sized>(rng: &mut R) -> SlotSymbol {
    *SlotSymbol::ALL.choose(rng).expect("symbol alphabet is non-empty")
}

fn is_central_triple(reels: &[SlotSymbol; REEL_COUNT]) -> bool {
    reels[1] == reels[2] && reels[2] == reels[3]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_win_forces_central_triple() {
        let mut rng = rand::thread_rng();
        for _ in 0..1_000 {
            let (payout, data) = render(true, 10.0, 1.1, &mut rng);
            assert!((payout - 11.0).abs() < 1e-9);
            let GameData::Slots { reels } = data else {
                panic!("wrong payload")
            };
            assert!(is_central_triple(&reels));
        }
    }

    #[test]
    fn test_loss_never_shows_win_pattern() {
        let mut rng = rand::thread_rng();
        for _ in 0..10_000 {
            let (payout, data) = render(false, 10.0, 1.1, &mut rng);
            assert_eq!(payout, 0.0);
            let GameData::Slots { reels } = data else {
                panic!("wrong payload")
            };
            assert!(!is_central_triple(&reels));
        }
    }
}
