//! Property-based test generators using proptest.
//!
//! Provides strategies for generating values that stay inside the ranges
//! the wire formats can represent.

use cpsave_codec::PACKED_INT_MAX_MAGNITUDE;
use proptest::prelude::*;

/// Strategy for integers the packed encoding can represent.
pub fn packed_int_strategy() -> impl Strategy<Value = i64> {
    let max = PACKED_INT_MAX_MAGNITUDE as i64;
    prop_oneof![
        2 => -64i64..64,
        1 => -max..=max,
    ]
}

/// Strategy for integers too large for the packed encoding.
pub fn oversized_int_strategy() -> impl Strategy<Value = i64> {
    let max = PACKED_INT_MAX_MAGNITUDE as i64;
    prop_oneof![(max + 1)..=i64::MAX, i64::MIN..=-(max + 1)]
}

/// Strategy for strings short enough for any pool.
pub fn pool_string_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => prop::string::string_regex("[a-zA-Z0-9_.]{0,32}").expect("Invalid regex"),
        1 => "\\PC{0,24}",
    ]
}

/// Strategy for distinct strings in random order.
pub fn unique_strings_strategy(max_len: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set(pool_string_strategy(), 0..max_len)
        .prop_map(|set| set.into_iter().collect::<Vec<_>>())
        .prop_shuffle()
}

/// Strategy for one fixed-width record.
pub fn record_strategy(width: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), width)
}

/// Strategy for distinct fixed-width records in random order.
pub fn unique_records_strategy(width: usize, max_len: usize) -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::btree_set(record_strategy(width), 0..max_len)
        .prop_map(|set| set.into_iter().collect::<Vec<_>>())
        .prop_shuffle()
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn packed_ints_are_in_range(value in packed_int_strategy()) {
            prop_assert!(value.unsigned_abs() <= PACKED_INT_MAX_MAGNITUDE);
        }

        #[test]
        fn oversized_ints_are_out_of_range(value in oversized_int_strategy()) {
            prop_assert!(value.unsigned_abs() > PACKED_INT_MAX_MAGNITUDE);
        }

        #[test]
        fn unique_strings_are_unique(strings in unique_strings_strategy(16)) {
            let set: HashSet<_> = strings.iter().collect();
            prop_assert_eq!(set.len(), strings.len());
        }

        #[test]
        fn records_have_width(records in unique_records_strategy(12, 8)) {
            prop_assert!(records.iter().all(|r| r.len() == 12));
        }
    }
}
