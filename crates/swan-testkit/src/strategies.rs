//! Property test strategies for consent data
//!
//! Strategies generate values that the engine must accept: emails with a
//! non-blank local part, numeric salts, domain-like stop entries.

use proptest::prelude::*;

// Re-export proptest for convenience
pub use proptest;

use swan_core::Preferences;

/// Strategy for emails that survive canonicalisation unchanged in meaning
pub fn arb_email() -> impl Strategy<Value = String> {
    ("[a-zA-Z0-9._]{1,16}", "[a-z]{1,10}", "(com|org|net|example)")
        .prop_map(|(local, host, tld)| format!("{local}@{host}.{tld}"))
}

/// Strategy for numeric salts
pub fn arb_salt() -> impl Strategy<Value = String> {
    "[0-9]{1,8}"
}

/// Strategy for preferences
pub fn arb_preferences() -> impl Strategy<Value = Preferences> {
    any::<bool>().prop_map(|use_browsing_for_personalization| Preferences {
        use_browsing_for_personalization,
    })
}

/// Strategy for domain-like stop-list entries
pub fn arb_domain() -> impl Strategy<Value = String> {
    ("[a-z][a-z0-9-]{0,12}", "[a-z]{2,6}").prop_map(|(name, tld)| format!("{name}.{tld}"))
}

/// Strategy for stop lists of up to `max` entries, possibly with repeats
pub fn arb_stop_list(max: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(arb_domain(), 0..=max)
}

/// Strategy for retention periods in days
pub fn arb_retention_days() -> impl Strategy<Value = u32> {
    1u32..=400
}

/// Strategy for revalidation intervals in seconds
pub fn arb_revalidate_seconds() -> impl Strategy<Value = u64> {
    1u64..=(400 * 24 * 3600)
}
