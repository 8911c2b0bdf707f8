//! Turn-order lookahead for display
//!
//! A gauge simulation: every combatant fills a gauge at its speed and acts
//! when it reaches the threshold. This is an approximation for presentation
//! only and is not the algorithm that builds the real queue (see
//! `turn_queue`), so the two can disagree.

use ordered_float::OrderedFloat;

use crate::core::types::CombatantId;

/// Predict the next `count` actors from (id, speed) pairs in roster order
///
/// Zero-speed entries never fill their gauge and are left out. Ties go to
/// the entry listed first.
pub fn predict_turn_order(
    entries: &[(CombatantId, u32)],
    threshold: f64,
    count: usize,
) -> Vec<CombatantId> {
    let speeds: Vec<f64> = entries.iter().map(|(_, s)| *s as f64).collect();
    let mut gauges = vec![0.0_f64; entries.len()];
    let mut order = Vec::with_capacity(count);

    if threshold <= 0.0 || speeds.iter().all(|s| *s <= 0.0) {
        return order;
    }

    for _ in 0..count {
        let Some((next, time)) = speeds
            .iter()
            .enumerate()
            .filter(|(_, speed)| **speed > 0.0)
            .map(|(i, speed)| (i, ((threshold - gauges[i]) / speed).max(0.0)))
            .min_by_key(|(_, time)| OrderedFloat(*time))
        else {
            break;
        };

        for (gauge, speed) in gauges.iter_mut().zip(&speeds) {
            *gauge += speed * time;
        }
        gauges[next] = (gauges[next] - threshold).max(0.0);
        order.push(entries[next].0);
    }

    order
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[u32]) -> Vec<CombatantId> {
        raw.iter().map(|&i| CombatantId(i)).collect()
    }

    #[test]
    fn test_faster_acts_more_often() {
        let order = predict_turn_order(&[(CombatantId(0), 20), (CombatantId(1), 10)], 100.0, 6);
        assert_eq!(order.len(), 6);
        let fast = order.iter().filter(|id| **id == CombatantId(0)).count();
        assert_eq!(fast, 4);
    }

    #[test]
    fn test_equal_speed_ties_follow_order() {
        let order = predict_turn_order(&[(CombatantId(0), 10), (CombatantId(1), 10)], 100.0, 4);
        assert_eq!(order, ids(&[0, 1, 0, 1]));
    }

    #[test]
    fn test_zero_speed_and_empty() {
        let order = predict_turn_order(&[(CombatantId(0), 0), (CombatantId(1), 5)], 100.0, 3);
        assert_eq!(order, ids(&[1, 1, 1]));
        assert!(predict_turn_order(&[(CombatantId(0), 0)], 100.0, 3).is_empty());
        assert!(predict_turn_order(&[], 100.0, 3).is_empty());
    }

    #[test]
    fn test_can_differ_from_round_queue() {
        use crate::battle::turn_queue::build_round;
        let entries = [(CombatantId(0), 2), (CombatantId(1), 1)];
        let queue = build_round(&entries);
        let predicted = predict_turn_order(&entries, 100.0, queue.len());
        // Both give A two of three slots, in a different arrangement
        assert_eq!(queue, ids(&[0, 1, 0]));
        assert_eq!(predicted, ids(&[0, 0, 1]));
    }
}
