//! The four matching strategies, run in priority order by
//! [`crate::orchestrator`]: whole-run hash, SPDX tag extraction, exact
//! Aho-Corasick substring matching, and approximate set-ranked alignment.

pub mod approx;
pub mod exact;
pub mod hash;
pub mod spdx;
