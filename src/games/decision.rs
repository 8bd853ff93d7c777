//! The shared win/lose decision.
//!
//! Computed exactly once per round and then enforced onto whichever payload
//! renderer runs next. Two rules, in order: the win-lock ceiling (a balance
//! at or above the threshold, normalized to the reference currency, can
//! never win), then the flat global win probability.

use rand::Rng;

/// Decide whether this round wins.
///
/// `balance_reference` is the account's post-debit balance converted into
/// the reference currency.
pub fn decide<R: Rng + ?Sized>(
    balance_reference: f64,
    win_probability: f64,
    win_lock_threshold: f64,
    rng: &mut R,
) -> bool {
    if balance_reference >= win_lock_threshold {
        return false;
    }
    rng.gen::<f64>() < win_probability
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_win_lock_overrides_probability() {
        let mut rng = rand::thread_rng();
        for _ in 0..10_000 {
            assert!(!decide(150.0, 1.0, 150.0, &mut rng));
            assert!(!decide(5_000.0, 1.0, 150.0, &mut rng));
        }
    }

    #[test]
    fn test_probability_bounds() {
        let mut rng = rand::thread_rng();
        for _ in 0..1_000 {
            assert!(!decide(10.0, 0.0, 150.0, &mut rng));
            assert!(decide(10.0, 1.0, 150.0, &mut rng));
        }
    }

    #[test]
    fn test_win_rate_tracks_probability() {
        let mut rng = rand::thread_rng();
        let trials = 50_000;
        let wins = (0..trials)
            .filter(|_| decide(10.0, 0.45, 150.0, &mut rng))
            .count();
        let rate = wins as f64 / trials as f64;
        assert!((rate - 0.45).abs() < 0.02, "observed win rate {rate}");
    }
}
