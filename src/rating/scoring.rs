// Actual score per placement, indexed by table size then placement - 1.
const TWO_PLAYER: [f64; 2] = [1.0, 0.0];
const THREE_PLAYER: [f64; 3] = [1.0, 0.5, 0.0];
const FOUR_PLAYER: [f64; 4] = [1.0, 0.67, 0.33, 0.0];

/// Score table for a table of `participants` players, or `None` for unsupported sizes.
pub fn placement_table(participants: usize) -> Option<&'static [f64]> {
    match participants {
        2 => Some(&TWO_PLAYER),
        3 => Some(&THREE_PLAYER),
        4 => Some(&FOUR_PLAYER),
        _ => None,
    }
}

pub fn actual_score(placement: u8, participants: usize) -> Option<f64> {
    let table = placement_table(participants)?;
    let index = usize::from(placement).checked_sub(1)?;
    table.get(index).copied()
}

pub fn expected_score(rating: f64, opponent_rating: f64) -> f64 {
    1.0 / (1.0 + 10.0_f64.powf((opponent_rating - rating) / 400.0))
}

/// Mean expected score against every opponent, so the result stays in [0, 1]
/// whatever the table size.
pub fn mean_expected_score(rating: f64, opponent_ratings: &[f64]) -> f64 {
    if opponent_ratings.is_empty() {
        return 0.5;
    }
    let total: f64 = opponent_ratings
        .iter()
        .map(|&opponent| expected_score(rating, opponent))
        .sum();
    total / opponent_ratings.len() as f64
}
