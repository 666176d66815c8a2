use super::*;

#[test]
fn test_symmetric_across_roles() {
    let local = 2_113_929_471_u32;
    let remote = 1_694_498_815_u32;

    let controlling_side = pair_priority(Role::Controlling, local, remote);
    // The peer sees the same two priorities with the roles swapped (it holds
    // the opposite role and what was "local" to us is "remote" to it).
    let controlled_side = pair_priority(Role::Controlled, remote, local);

    assert_eq!(controlling_side, controlled_side);
}

#[test]
fn test_tie_break_favors_controlling_higher_priority() {
    let higher = pair_priority(Role::Controlling, 200, 100);
    let lower = pair_priority(Role::Controlling, 100, 200);
    assert_ne!(higher, lower);
}

#[test]
fn test_equal_priorities_has_no_tie_bit() {
    let a = pair_priority(Role::Controlling, 100, 100);
    assert_eq!(a, (1u64 << 32) * 100 + 2 * 100);
}
