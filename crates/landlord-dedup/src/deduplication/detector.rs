//! Duplicate detection over names
//!
//! Combines the normalizer and the similarity scorer into pairwise
//! comparison, one-to-many matching and full-set clustering.

use std::collections::{BTreeMap, HashMap};

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::cluster::UnionFind;
use super::normalization::Normalizer;
use super::similarity::{SimilarityResult, SimilarityScorer};
use crate::config::{BlockingStrategy, DetectorConfig};
use crate::error::Result;

/// A name in its original and normalized forms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameForm {
    pub original: String,
    pub normalized: String,
}

/// Result of comparing two names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub name1: NameForm,
    pub name2: NameForm,
    pub similarity: SimilarityResult,
    pub is_duplicate: bool,
}

/// A candidate that matched a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameMatch {
    pub name: String,
    pub normalized: String,
    pub score: f64,
    pub similarity: SimilarityResult,
}

/// One distinct input string inside a cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterMember {
    pub name: String,
    /// Present when `output.include_normalized` is set
    pub normalized: Option<String>,
    /// Exact repeats of `name` in the input
    pub occurrences: usize,
}

/// Distinct strings connected by above-threshold similarity edges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    /// Representative member: most occurrences, then shortest normalized
    /// form, then first appearance
    pub canonical: String,
    pub canonical_normalized: Option<String>,
    /// Members in first-appearance order
    pub members: Vec<ClusterMember>,
}

impl Cluster {
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|member| member.name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.members.iter().any(|member| member.name == name)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// An above-threshold pair, emitted when `output.include_pairs` is set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicatePair {
    pub name1: String,
    pub name2: String,
    pub similarity: SimilarityResult,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DuplicateStats {
    /// Input length, repeats included
    pub total_names: usize,
    pub unique_names: usize,
    pub duplicate_clusters: usize,
    /// Distinct names absorbed into some cluster
    pub names_in_clusters: usize,
}

/// Output of [`DuplicateDetector::find_duplicates`]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DuplicateReport {
    pub clusters: Vec<Cluster>,
    pub stats: DuplicateStats,
    pub pairs: Option<Vec<DuplicatePair>>,
}

impl DuplicateReport {
    /// Index of the cluster holding `name`
    pub fn cluster_of(&self, name: &str) -> Option<usize> {
        self.clusters.iter().position(|cluster| cluster.contains(name))
    }
}

/// Distinct input string with its bookkeeping
#[derive(Debug)]
struct Entry<'a> {
    original: &'a str,
    normalized: String,
    occurrences: usize,
}

#[derive(Debug)]
struct Edge {
    a: usize,
    b: usize,
    similarity: SimilarityResult,
}

/// Configured normalizer + scorer pair
#[derive(Debug)]
pub struct DuplicateDetector {
    config: DetectorConfig,
    normalizer: Normalizer,
    scorer: SimilarityScorer,
}

impl DuplicateDetector {
    /// Validate `config` and build the detector. Bad configuration fails
    /// here, never mid-batch.
    pub fn new(config: DetectorConfig) -> Result<Self> {
        config.validate()?;
        let normalizer = Normalizer::new(&config.normalization)?;
        let scorer = SimilarityScorer::new(config.algorithms.clone())?;
        debug!(
            threshold = config.threshold,
            blocking = ?config.blocking,
            "duplicate detector configured"
        );
        Ok(Self {
            config,
            normalizer,
            scorer,
        })
    }

    /// Default configuration with a different threshold
    pub fn with_threshold(threshold: f64) -> Result<Self> {
        Self::new(DetectorConfig::with_threshold(threshold))
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn threshold(&self) -> f64 {
        self.config.threshold
    }

    pub fn normalize(&self, text: &str) -> String {
        self.normalizer.normalize(text)
    }

    /// Score two already normalized strings
    pub fn calculate_similarity(&self, a: &str, b: &str) -> SimilarityResult {
        self.scorer.score(a, b)
    }

    pub fn compare(&self, name1: &str, name2: &str) -> Comparison {
        let normalized1 = self.normalize(name1);
        let normalized2 = self.normalize(name2);
        let similarity = self.scorer.score(&normalized1, &normalized2);
        let is_duplicate = self.accepts(&normalized1, &normalized2, similarity.score);

        Comparison {
            name1: NameForm {
                original: name1.to_string(),
                normalized: normalized1,
            },
            name2: NameForm {
                original: name2.to_string(),
                normalized: normalized2,
            },
            is_duplicate,
            similarity,
        }
    }

    /// Candidates scoring at or above the threshold, best first.
    /// Equal scores keep candidate order.
    pub fn find_matches<S: AsRef<str>>(&self, query: &str, candidates: &[S]) -> Vec<NameMatch> {
        let normalized_query = self.normalize(query);

        let mut matches: Vec<NameMatch> = candidates
            .iter()
            .filter_map(|candidate| {
                let candidate = candidate.as_ref();
                let normalized = self.normalize(candidate);
                let similarity = self.scorer.score(&normalized_query, &normalized);
                let accepted = self.accepts(&normalized_query, &normalized, similarity.score);
                accepted.then(|| NameMatch {
                    name: candidate.to_string(),
                    normalized,
                    score: similarity.score,
                    similarity,
                })
            })
            .collect();

        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        matches
    }

    /// Cluster `names` into connected components of the similarity graph.
    ///
    /// Vertices are the distinct input strings. Two vertices are joined
    /// when their score reaches the threshold; components of one vertex
    /// are dropped. Strings that normalize to nothing never join.
    pub fn find_duplicates<S: AsRef<str>>(&self, names: &[S]) -> DuplicateReport {
        let entries = self.distinct_entries(names);
        let blocks = self.blocks(&entries);
        let mut edges = self.discover_edges(&blocks, &entries);
        edges.sort_by_key(|edge| (edge.a, edge.b));

        let mut union_find = UnionFind::new(entries.len());
        for edge in &edges {
            union_find.union(edge.a, edge.b);
        }

        let include_normalized = self.config.output.include_normalized;
        let clusters: Vec<Cluster> = union_find
            .components()
            .into_iter()
            .map(|component| build_cluster(&component, &entries, include_normalized))
            .collect();

        let pairs = self.config.output.include_pairs.then(|| {
            edges
                .iter()
                .map(|edge| DuplicatePair {
                    name1: entries[edge.a].original.to_string(),
                    name2: entries[edge.b].original.to_string(),
                    similarity: edge.similarity,
                })
                .collect()
        });

        let stats = DuplicateStats {
            total_names: names.len(),
            unique_names: entries.len(),
            duplicate_clusters: clusters.len(),
            names_in_clusters: clusters.iter().map(Cluster::len).sum(),
        };
        debug!(
            total = stats.total_names,
            unique = stats.unique_names,
            edges = edges.len(),
            clusters = stats.duplicate_clusters,
            "find_duplicates complete"
        );

        DuplicateReport {
            clusters,
            stats,
            pairs,
        }
    }

    /// Collapse near-duplicate strings, keeping each cluster's canonical
    /// form at the position of its first member. Blank values are dropped
    /// and exact repeats collapse.
    pub fn dedupe_variants<S: AsRef<str>>(&self, values: &[S]) -> Vec<String> {
        let values: Vec<&str> = values
            .iter()
            .map(|value| value.as_ref())
            .filter(|value| !value.trim().is_empty())
            .collect();
        let report = self.find_duplicates(&values);

        let mut emitted_clusters = vec![false; report.clusters.len()];
        let mut seen: Vec<&str> = Vec::new();
        let mut result = Vec::new();

        for value in values {
            if seen.contains(&value) {
                continue;
            }
            seen.push(value);

            match report.cluster_of(value) {
                Some(idx) if emitted_clusters[idx] => {}
                Some(idx) => {
                    emitted_clusters[idx] = true;
                    result.push(report.clusters[idx].canonical.clone());
                }
                None => result.push(value.to_string()),
            }
        }
        result
    }

    /// Threshold check plus the digit-token guard when `match_numbers` is set
    fn accepts(&self, a: &str, b: &str, score: f64) -> bool {
        score >= self.config.threshold
            && (!self.config.match_numbers || numeric_tokens(a) == numeric_tokens(b))
    }

    fn distinct_entries<'a, S: AsRef<str>>(&self, names: &'a [S]) -> Vec<Entry<'a>> {
        let mut index_of: HashMap<&str, usize> = HashMap::new();
        let mut entries: Vec<Entry<'a>> = Vec::new();

        for name in names {
            let name = name.as_ref();
            match index_of.get(name) {
                Some(&idx) => entries[idx].occurrences += 1,
                None => {
                    index_of.insert(name, entries.len());
                    entries.push(Entry {
                        original: name,
                        normalized: self.normalize(name),
                        occurrences: 1,
                    });
                }
            }
        }
        entries
    }

    /// Groups of entry indices whose pairs get compared, ascending within
    /// each group
    fn blocks(&self, entries: &[Entry]) -> Vec<Vec<usize>> {
        let comparable = entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| !entry.normalized.is_empty());

        match self.config.blocking {
            BlockingStrategy::None => vec![comparable.map(|(idx, _)| idx).collect()],
            strategy => {
                let mut blocks: BTreeMap<String, Vec<usize>> = BTreeMap::new();
                for (idx, entry) in comparable {
                    blocks
                        .entry(blocking_key(&entry.normalized, strategy))
                        .or_default()
                        .push(idx);
                }
                trace!(blocks = blocks.len(), "blocking applied");
                blocks.into_values().collect()
            }
        }
    }

    /// Score every pair within each block. Rows are independent, so with
    /// the `parallel` feature they are spread across threads.
    fn discover_edges(&self, blocks: &[Vec<usize>], entries: &[Entry]) -> Vec<Edge> {
        let rows: Vec<(usize, usize)> = blocks
            .iter()
            .enumerate()
            .flat_map(|(block, members)| (0..members.len()).map(move |row| (block, row)))
            .collect();

        #[cfg(feature = "parallel")]
        let edges: Vec<Edge> = rows
            .par_iter()
            .flat_map_iter(|&(block, row)| self.row_edges(&blocks[block], row, entries))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let edges: Vec<Edge> = rows
            .iter()
            .flat_map(|&(block, row)| self.row_edges(&blocks[block], row, entries))
            .collect();

        edges
    }

    fn row_edges(&self, block: &[usize], row: usize, entries: &[Entry]) -> Vec<Edge> {
        let a = block[row];
        block[row + 1..]
            .iter()
            .filter_map(|&b| {
                let (left, right) = (&entries[a].normalized, &entries[b].normalized);
                let similarity = self.scorer.score(left, right);
                self.accepts(left, right, similarity.score)
                    .then_some(Edge { a, b, similarity })
            })
            .collect()
    }
}

/// Tokens containing a digit, sorted
fn numeric_tokens(normalized: &str) -> Vec<&str> {
    let mut tokens: Vec<&str> = normalized
        .split_whitespace()
        .filter(|token| token.chars().any(|c| c.is_ascii_digit()))
        .collect();
    tokens.sort_unstable();
    tokens
}

fn blocking_key(normalized: &str, strategy: BlockingStrategy) -> String {
    match strategy {
        BlockingStrategy::None => String::new(),
        BlockingStrategy::FirstWord => normalized
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_string(),
        BlockingStrategy::FirstNChars(n) => normalized.chars().take(n).collect(),
    }
}

fn build_cluster(component: &[usize], entries: &[Entry], include_normalized: bool) -> Cluster {
    // Component indices ascend, so min_by keeps the earliest on full ties
    let canonical = component
        .iter()
        .copied()
        .min_by(|&x, &y| {
            entries[y]
                .occurrences
                .cmp(&entries[x].occurrences)
                .then_with(|| {
                    entries[x]
                        .normalized
                        .chars()
                        .count()
                        .cmp(&entries[y].normalized.chars().count())
                })
        })
        .unwrap_or(component[0]);

    Cluster {
        canonical: entries[canonical].original.to_string(),
        canonical_normalized: include_normalized.then(|| entries[canonical].normalized.clone()),
        members: component
            .iter()
            .map(|&idx| ClusterMember {
                name: entries[idx].original.to_string(),
                normalized: include_normalized.then(|| entries[idx].normalized.clone()),
                occurrences: entries[idx].occurrences,
            })
            .collect(),
    }
}
