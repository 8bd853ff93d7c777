//! Dice payload renderer (100-sided die).
//!
//! The multiplier is `99 / win_chance` for a 99% theoretical return. The
//! renderer draws a natural roll first; when it contradicts the
//! pre-computed decision it redraws once from the sub-range matching the
//! intended outcome instead of reject-looping.

use rand::Rng;

use super::types::{DiceParams, GameData};

/// Render a dice round for a pre-computed decision. `params` must already
/// be validated. Returns the payout in the bet currency and the payload.
pub fn render<R: Rng + ?Sized>(
    decision: bool,
    bet_amount: f64,
    params: DiceParams,
    rng: &mut R,
) -> (f64, GameData) {
    let natural: u8 = rng.gen_range(1..=100);

    let roll = if wins(natural, params) == decision {
        natural
    } else {
        redraw(decision, params, rng)
    };

    let payout = if decision {
        bet_amount * params.multiplier()
    } else {
        0.0
    };

    (
        payout,
        GameData::Dice {
            roll,
            prediction: params.prediction,
            roll_over: params.roll_over,
        },
    )
}

fn wins(roll: u8, params: DiceParams) -> bool {
    if params.roll_over {
        roll >= params.prediction
    } else {
        roll <= params.prediction
    }
}

/// Draw from the sub-range that matches the intended outcome
fn redraw<R: Rng + ?Sized>(decision: bool, params: DiceParams, rng: &mut R) -> u8 {
    match (decision, params.roll_over) {
        (true, true) => rng.gen_range(params.prediction..=100),
        (true, false) => rng.gen_range(1..=params.prediction),
        (false, true) => rng.gen_range(1..params.prediction),
        (false, false) => rng.gen_range(params.prediction + 1..=100),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roll_always_matches_decision() {
        let mut rng = rand::thread_rng();
        for prediction in [2u8, 50, 98] {
            for roll_over in [true, false] {
                let params = DiceParams { prediction, roll_over };
                for decision in [true, false] {
                    for _ in 0..500 {
                        let (payout, data) = render(decision, 10.0, params, &mut rng);
                        let GameData::Dice { roll, .. } = data else {
                            panic!("wrong payload")
                        };
                        assert!((1..=100).contains(&roll));
                        assert_eq!(wins(roll, params), decision, "prediction {prediction}, over {roll_over}");
                        assert_eq!(payout > 0.0, decision);
                    }
                }
            }
        }
    }

    #[test]
    fn test_prediction_fifty_over() {
        let mut rng = rand::thread_rng();
        let params = DiceParams { prediction: 50, roll_over: true };

        for _ in 0..2_000 {
            let decision = rng.gen_bool(0.5);
            let (payout, data) = render(decision, 50.0, params, &mut rng);
            let GameData::Dice { roll, .. } = data else {
                panic!("wrong payload")
            };
            assert_eq!(decision, roll >= 50);
            if decision {
                assert!((payout - 50.0 * 99.0 / 50.0).abs() < 1e-9);
            }
        }
    }
}
