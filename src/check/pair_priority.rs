#[cfg(test)]
mod pair_priority_test;

use crate::control::Role;

/// Computes the candidate-pair priority (spec §3), grounded on `pjnath`'s
/// `CALC_CHECK_PRIO`: `G` is the controlling side's candidate priority, `D`
/// the controlled side's.
///
/// `pair_prio = 2^32 · min(G,D) + 2 · max(G,D) + (G > D ? 1 : 0)`
///
/// The formula is symmetric in the sense that both peers compute the exact
/// same value for a pair regardless of which side is "local" to them (spec
/// §8: "`pair_prio(A, B)` computed independently on both sides is
/// bit-identical"), because `role` fixes which of the two priorities plays
/// `G` and which plays `D`.
#[must_use]
pub fn pair_priority(role: Role, local_priority: u32, remote_priority: u32) -> u64 {
    let (g, d) = match role {
        Role::Controlling => (local_priority, remote_priority),
        Role::Controlled => (remote_priority, local_priority),
    };
    let min = u64::from(g.min(d));
    let max = u64::from(g.max(d));
    (1u64 << 32) * min + 2 * max + u64::from(g > d)
}
