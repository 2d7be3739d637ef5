//! Deduplication algorithms for detecting duplicate owner names
//!
//! This module provides normalization, similarity scoring and clustering
//! to identify strings that refer to the same person, business or address.

mod cluster;
mod detector;
mod normalization;
mod similarity;

pub use cluster::UnionFind;
pub use detector::{
    Cluster, ClusterMember, Comparison, DuplicateDetector, DuplicatePair, DuplicateReport,
    DuplicateStats, NameForm, NameMatch,
};
pub use normalization::Normalizer;
pub use similarity::{
    dice_coefficient, levenshtein_similarity, token_similarity, SimilarityBreakdown,
    SimilarityResult, SimilarityScorer,
};
