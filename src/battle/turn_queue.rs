//! Round construction by stride scheduling
//!
//! With total speed T, combatant i gets stride T / s_i and starts at phase
//! stride / 2. The round is T picks of the smallest phase, each pick
//! advancing the winner by its stride. Everyone appears exactly s_i times,
//! spread as evenly as the speeds allow.
//!
//! Phases are compared exactly: after k picks combatant i sits at
//! (2k + 1) * T / (2 * s_i), so comparing (2k_i + 1) * s_j with
//! (2k_j + 1) * s_i orders them without any floating point.

use std::cmp::Ordering;

use crate::core::types::CombatantId;

#[derive(Debug, Clone, Copy)]
struct Lane {
    id: CombatantId,
    speed: u64,
    picks: u64,
}

impl Lane {
    /// Order by current phase; callers break ties on input position
    fn cmp_phase(&self, other: &Lane) -> Ordering {
        let lhs = (2 * self.picks as u128 + 1) * other.speed as u128;
        let rhs = (2 * other.picks as u128 + 1) * self.speed as u128;
        lhs.cmp(&rhs)
    }
}

/// Build one round's queue from (id, speed) pairs given in roster order
///
/// Zero-speed entries never act. If every speed is zero, each entry acts
/// once in the order given so a round is never empty.
pub fn build_round(entries: &[(CombatantId, u32)]) -> Vec<CombatantId> {
    let mut lanes: Vec<Lane> = entries
        .iter()
        .filter(|(_, speed)| *speed > 0)
        .map(|&(id, speed)| Lane {
            id,
            speed: speed as u64,
            picks: 0,
        })
        .collect();

    if lanes.is_empty() {
        return entries.iter().map(|(id, _)| *id).collect();
    }

    let total: u64 = lanes.iter().map(|l| l.speed).sum();
    let mut queue = Vec::with_capacity(total as usize);

    for _ in 0..total {
        let mut best = 0;
        for (i, lane) in lanes.iter().enumerate().skip(1) {
            if lane.cmp_phase(&lanes[best]) == Ordering::Less {
                best = i;
            }
        }
        queue.push(lanes[best].id);
        lanes[best].picks += 1;
    }

    queue
}
