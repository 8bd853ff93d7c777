//! Plinko payload renderers.
//!
//! Both variants share the fixed 16-bucket multiplier table. The fixed
//! variant picks a bucket directly from the set matching the decision; the
//! master variant additionally simulates the ball: a 16-row walk generated
//! as a binomial bridge onto the target bucket, so each row still looks
//! random but the ball lands where the decision requires. Unlike the other
//! games a payout is always returned, because sub-1.0 buckets still pay
//! partial value.

use rand::seq::SliceRandom;
use rand::Rng;

use super::types::{GameData, PathStep};
use crate::currency::round_to;

/// Symmetric bucket multipliers, outer buckets paying best
pub const BUCKET_MULTIPLIERS: [f64; 16] = [
    2.0, 1.8, 1.6, 1.4, 1.0, 0.8, 0.6, 0.4, 0.4, 0.6, 0.8, 1.0, 1.4, 1.6, 1.8, 2.0,
];

/// Rows of pegs the ball traverses
pub const ROWS: usize = 16;

/// Render a fixed-board plinko round for a pre-computed decision.
pub fn render_fixed<R: Rng + ?Sized>(
    decision: bool,
    bet_amount: f64,
    rng: &mut R,
) -> (f64, f64, GameData) {
    let bucket = pick_bucket(decision, rng);
    let multiplier = BUCKET_MULTIPLIERS[bucket];
    let payout = round_to(bet_amount * multiplier, 2);
    (payout, multiplier, GameData::Plinko { bucket, multiplier })
}

/// Render a simulated-path plinko round for a pre-computed decision.
pub fn render_master<R: Rng + ?Sized>(
    decision: bool,
    bet_amount: f64,
    rng: &mut R,
) -> (f64, f64, GameData) {
    let bucket = pick_bucket(decision, rng);
    let multiplier = BUCKET_MULTIPLIERS[bucket];
    let payout = round_to(bet_amount * multiplier, 2);
    let path = bridge_path(bucket, rng);
    (
        payout,
        multiplier,
        GameData::PlinkoMaster { path, bucket, multiplier },
    )
}

/// Uniform pick among the buckets matching the decision's sign
/// (multiplier >= 1.0 wins).
fn pick_bucket<R: Rng + ?Sized>(decision: bool, rng: &mut R) -> usize {
    let matching: Vec<usize> = (0..BUCKET_MULTIPLIERS.len())
        .filter(|&i| (BUCKET_MULTIPLIERS[i] >= 1.0) == decision)
        .collect();
    *matching.choose(rng).expect("both bucket sets are non-empty")
}

/// Walk the ball onto `target`: at each row the right-step probability is
/// the fraction of remaining rows that still must go right, which keeps
/// every trajectory plausible while pinning the landing bucket.
fn bridge_path<R: Rng + ?Sized>(target: usize, rng: &mut R) -> Vec<PathStep> {
    let mut path = Vec::with_capacity(ROWS);
    let mut rights_needed = target;

    for row in 0..ROWS {
        let remaining = ROWS - row;
        let p_right = rights_needed as f64 / remaining as f64;
        let step = if rng.gen::<f64>() < p_right {
            rights_needed -= 1;
            PathStep::Right
        } else {
            PathStep::Left
        };
        path.push(step);
    }

    path
}
