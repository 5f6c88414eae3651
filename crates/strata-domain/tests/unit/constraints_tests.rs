//! Unit tests for the constraint bitmask

use strata_domain::Constraints;

#[test]
fn test_self_and_skip_self_contradict() {
    assert!((Constraints::SELF | Constraints::SKIP_SELF).is_contradictory());
    assert!(!Constraints::SELF.is_contradictory());
    assert!(!(Constraints::SKIP_SELF | Constraints::OPTIONAL).is_contradictory());
}

#[test]
fn test_recursion_follows_self_flag() {
    assert!(Constraints::empty().allows_recursion());
    assert!(Constraints::SKIP_SELF.allows_recursion());
    assert!(!Constraints::SELF.allows_recursion());
    assert!(!(Constraints::SELF | Constraints::MANY).allows_recursion());
}

#[test]
fn test_default_is_empty() {
    assert_eq!(Constraints::default(), Constraints::empty());
}
