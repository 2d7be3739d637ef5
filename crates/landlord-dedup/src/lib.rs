//! landlord-dedup: Record deduplication engine for property-owner contacts
//!
//! This library provides:
//! - Configurable text normalization for owner names, business names and addresses
//! - Similarity scoring (Dice, Levenshtein, token Jaccard) and threshold clustering
//! - Per-record combining of address and phone fields
//! - The contact merge pipeline that collapses records describing the same owner
//!
//! Enable the `parallel` feature to spread pairwise scoring across threads and
//! `toml-config` to load detector settings from TOML.

pub mod combine;
pub mod config;
pub mod deduplication;
pub mod error;
pub mod merge;

// Re-export main types for convenience
pub use combine::{collect_phones, format_address, ContactCombiner};
pub use config::{
    AlgorithmConfig, AlgorithmWeights, BlockingStrategy, DetectorConfig, DetectorOverrides,
    MergeConfig, NormalizationConfig, OutputConfig, SuffixMode,
};
pub use deduplication::{
    Cluster, ClusterMember, Comparison, DuplicateDetector, DuplicatePair, DuplicateReport,
    DuplicateStats, NameMatch, Normalizer, SimilarityResult,
};
pub use error::{ConfigError, DedupError, Result};
pub use merge::{completeness_score, deduplicate_contacts, ContactMerger};

pub use landlord_domain::{AddressBlock, Bbl, FormattedContact, MergedContact, RawContact};
