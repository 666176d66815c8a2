use super::*;
use std::collections::HashSet;

#[test]
fn test_random_generator_collision() {
    const N: usize = 200;

    for (name, gen) in [
        ("pwd", generate_pwd as fn() -> String),
        ("ufrag", generate_ufrag),
        ("foundation", generate_unique_foundation),
    ] {
        let mut seen = HashSet::with_capacity(N);
        for _ in 0..N {
            let s = gen();
            assert!(seen.insert(s.clone()), "{name}: collision on {s}");
        }
    }
}

#[test]
fn test_generate_pwd_and_ufrag_lengths() {
    assert_eq!(generate_pwd().len(), LEN_PWD);
    assert_eq!(generate_ufrag().len(), LEN_UFRAG);
}

#[test]
fn test_unique_foundation_prefix() {
    assert!(generate_unique_foundation().starts_with("peer-"));
}
