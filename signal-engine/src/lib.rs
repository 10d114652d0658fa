//! Filtering and feature derivation for digest posts.

pub mod annotate;
pub mod features;
pub mod filter;

pub use annotate::{AnnotatedComment, DigestEntry, PostFeatures};
pub use features::{
    catalyst_index, extract_show_name, Consensus, ConsensusKind, FeatureEngine, Freshness,
    Sentiment, UNKNOWN_HOURS_AGO,
};
pub use filter::{FilterEngine, FilterVerdict};
