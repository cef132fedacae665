#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Forward-backward consistency of flow matches.
pub mod cross_check;

/// Error types for the matching module.
pub mod error;

/// Correspondences from flow fields.
pub mod flow;

/// Color based filtering of correspondences.
pub mod photometric;

pub use crate::cross_check::cross_check_matches;
pub use crate::error::MatchingError;
pub use crate::flow::{flow_to_matches, Correspondence, CorrespondenceSet, FlowMatches};
pub use crate::photometric::photometric_check;
