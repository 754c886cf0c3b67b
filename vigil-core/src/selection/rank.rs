//! Dense rank scoring shared by enemy and building selection.
//!
//! Values are sorted ascending (lower is better). The best value scores
//! `top`, and each strictly worse distinct value scores one less. Equal
//! values share a score and do not use up a level:
//!
//! ```text
//! values : 20  20  35  90
//! scores : 10  10   9   8
//! ```
//!
//! Scores bottom out at zero. NaN sorts last.

use ordered_float::OrderedFloat;

/// Score for the best value in a ranking.
pub const TOP_SCORE: u32 = 10;

/// Dense-rank `values`, returning one score per input position.
#[must_use]
pub fn dense_rank(values: &[f32], top: u32) -> Vec<u32> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by_key(|&i| OrderedFloat(values[i]));

    let mut scores = vec![0; values.len()];
    let mut level = top;
    let mut previous: Option<OrderedFloat<f32>> = None;
    for i in order {
        let value = OrderedFloat(values[i]);
        if previous.is_some_and(|p| p != value) {
            level = level.saturating_sub(1);
        }
        scores[i] = level;
        previous = Some(value);
    }
    scores
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ties_share_a_level_without_consuming_one() {
        assert_eq!(dense_rank(&[90.0, 20.0, 35.0, 20.0], TOP_SCORE), vec![8, 10, 9, 10]);
    }

    #[test]
    fn scores_floor_at_zero() {
        let values: Vec<f32> = (0..15).map(|i| i as f32).collect();
        let scores = dense_rank(&values, 3);
        assert_eq!(&scores[..5], &[3, 2, 1, 0, 0]);
        assert_eq!(scores[14], 0);
    }

    #[test]
    fn nan_ranks_last() {
        assert_eq!(dense_rank(&[f32::NAN, 1.0], TOP_SCORE), vec![9, 10]);
    }

    #[test]
    fn empty_input_is_empty() {
        assert!(dense_rank(&[], TOP_SCORE).is_empty());
    }
}
