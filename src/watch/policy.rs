//! Notification rules for a single (user, app) pair.

use serde::Deserialize;

/// What to do with the stored percentage when a discount ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountEndPolicy {
    /// Leave the last notified value in place. The same percentage
    /// coming back later will not notify again.
    #[default]
    KeepLast,
    /// Reset to 0 so that any later discount notifies.
    Reset,
}

/// What a repeated watch action does to an existing entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewatchPolicy {
    #[default]
    Preserve,
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// A new positive discount; notify and store `current`.
    Notify { previous: u8, current: u8 },
    /// Discount ended and the stored value was cleared.
    Reset { previous: u8 },
    Unchanged,
}

/// Compare the stored percentage with a fresh observation.
///
/// Notifies iff `observed > 0 && observed != stored`.
pub fn decide(stored: u8, observed: u8, on_end: DiscountEndPolicy) -> Decision {
    if observed > 0 && observed != stored {
        return Decision::Notify {
            previous: stored,
            current: observed,
        };
    }

    if observed == 0 && stored != 0 && on_end == DiscountEndPolicy::Reset {
        return Decision::Reset { previous: stored };
    }

    Decision::Unchanged
}

impl Decision {
    /// Value to store after applying this decision, if it changes.
    pub fn new_stored(&self) -> Option<u8> {
        match *self {
            Self::Notify { current, .. } => Some(current),
            Self::Reset { .. } => Some(0),
            Self::Unchanged => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEEP: DiscountEndPolicy = DiscountEndPolicy::KeepLast;

    #[test]
    fn test_first_discount_notifies() {
        assert_eq!(
            decide(0, 20, KEEP),
            Decision::Notify {
                previous: 0,
                current: 20
            }
        );
    }

    #[test]
    fn test_same_discount_is_silent() {
        assert_eq!(decide(20, 20, KEEP), Decision::Unchanged);
    }

    #[test]
    fn test_discount_end_keeps_stale_value() {
        let d = decide(20, 0, KEEP);
        assert_eq!(d, Decision::Unchanged);
        assert_eq!(d.new_stored(), None);
    }

    #[test]
    fn test_deeper_and_shallower_discounts_notify() {
        assert_eq!(decide(20, 50, KEEP).new_stored(), Some(50));
        assert_eq!(decide(50, 10, KEEP).new_stored(), Some(10));
    }

    #[test]
    fn test_zero_never_notifies() {
        for stored in [0u8, 5, 20, 90] {
            for policy in [DiscountEndPolicy::KeepLast, DiscountEndPolicy::Reset] {
                assert!(!matches!(
                    decide(stored, 0, policy),
                    Decision::Notify { .. }
                ));
            }
        }
    }

    #[test]
    fn test_reset_policy_clears_on_discount_end() {
        let d = decide(20, 0, DiscountEndPolicy::Reset);
        assert_eq!(d, Decision::Reset { previous: 20 });
        assert_eq!(d.new_stored(), Some(0));
        // Same percentage coming back now notifies again.
        assert!(matches!(
            decide(0, 20, DiscountEndPolicy::Reset),
            Decision::Notify { current: 20, .. }
        ));
    }

    #[test]
    fn test_reset_policy_noop_when_nothing_stored() {
        assert_eq!(decide(0, 0, DiscountEndPolicy::Reset), Decision::Unchanged);
    }

    #[test]
    fn test_policies_deserialize_snake_case() {
        #[derive(Deserialize)]
        struct Wrapper {
            end: DiscountEndPolicy,
            rewatch: RewatchPolicy,
        }
        let w: Wrapper = toml::from_str("end = \"keep_last\"\nrewatch = \"reset\"").unwrap();
        assert_eq!(w.end, DiscountEndPolicy::KeepLast);
        assert_eq!(w.rewatch, RewatchPolicy::Reset);
    }
}
