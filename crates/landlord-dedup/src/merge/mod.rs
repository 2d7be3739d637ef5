//! Contact merge pipeline
//!
//! Buckets formatted contacts by provenance, clusters them by owner name
//! (or by business name when no owner name is present) and merges every
//! cluster into one enriched contact. Output is sorted newest first.

use std::collections::HashMap;
use std::hash::Hash;

use landlord_domain::{FormattedContact, MergedContact, RawContact};
use tracing::{debug, info};

use crate::combine::ContactCombiner;
use crate::config::{DetectorConfig, MergeConfig};
use crate::deduplication::DuplicateDetector;
use crate::error::Result;

/// How complete a contact is; the most complete member of a cluster
/// supplies the merged record's scalar fields
pub fn completeness_score(contact: &FormattedContact) -> u32 {
    let mut score = 0;
    if contact.has_name() {
        score += 10;
    }
    if contact.has_business_name() {
        score += 5;
    }
    score += 3 * contact.owner_address.len() as u32;
    score += 2 * contact.owner_phone.len() as u32;
    if !contact.owner_type.trim().is_empty() {
        score += 2;
    }
    if !contact.owner_title.trim().is_empty() {
        score += 1;
    }
    score
}

/// Sort newest first; undated contacts go last, input order kept on ties
pub fn sort_by_date_desc(contacts: &mut [MergedContact]) {
    contacts.sort_by(|a, b| b.contact.date.cmp(&a.contact.date));
}

/// Deduplicate `contacts` with the default pipeline settings and a custom
/// name threshold
pub fn deduplicate_contacts(contacts: &[RawContact], threshold: f64) -> Result<Vec<MergedContact>> {
    let merger = ContactMerger::new(MergeConfig::with_name_threshold(threshold))?;
    Ok(merger.deduplicate(contacts))
}

/// Runs the full grouping, clustering and merging pipeline
#[derive(Debug)]
pub struct ContactMerger {
    config: MergeConfig,
    combiner: ContactCombiner,
    names: DuplicateDetector,
    business_names: DuplicateDetector,
}

impl ContactMerger {
    pub fn new(config: MergeConfig) -> Result<Self> {
        config.validate()?;
        let combiner = ContactCombiner::new(config.address_threshold)?;
        let names = DuplicateDetector::new(DetectorConfig::with_threshold(config.name_threshold))?;
        let business_names = DuplicateDetector::new(DetectorConfig::with_threshold(
            config.business_name_threshold,
        ))?;

        Ok(Self {
            config,
            combiner,
            names,
            business_names,
        })
    }

    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// Format, bucket, cluster and merge `contacts`.
    ///
    /// Contacts without a name or business name are dropped. Never fails
    /// on input data.
    pub fn deduplicate(&self, contacts: &[RawContact]) -> Vec<MergedContact> {
        let formatted: Vec<FormattedContact> = contacts
            .iter()
            .map(|raw| self.combiner.format_contact(raw))
            .collect();

        let buckets = group_in_order(formatted, |contact| self.bucket_key(contact));
        let bucket_count = buckets.len();

        let mut merged: Vec<MergedContact> = Vec::new();
        for (key, bucket) in buckets {
            let before = bucket.len();
            let output = self.deduplicate_bucket(bucket);
            debug!(bucket = %key, input = before, output = output.len(), "bucket merged");
            merged.extend(output);
        }

        sort_by_date_desc(&mut merged);
        info!(
            input = contacts.len(),
            buckets = bucket_count,
            output = merged.len(),
            "contact deduplication complete"
        );
        merged
    }

    /// Agencies in `shared_identity_agencies` bucket on the agency alone;
    /// every other agency keeps its sources apart
    pub fn bucket_key(&self, contact: &FormattedContact) -> String {
        let agency = contact.agency.trim().to_lowercase();
        let shared = self
            .config
            .shared_identity_agencies
            .iter()
            .any(|shared| shared.trim().eq_ignore_ascii_case(&agency));

        if shared {
            agency
        } else {
            format!("{}|{}", agency, contact.source.trim())
        }
    }

    fn deduplicate_bucket(&self, bucket: Vec<FormattedContact>) -> Vec<MergedContact> {
        let (named, business): (Vec<FormattedContact>, Vec<FormattedContact>) = bucket
            .into_iter()
            .filter(FormattedContact::has_identity)
            .partition(FormattedContact::has_name);

        let mut output = self.merge_named_track(named);
        output.extend(self.merge_business_track(business));
        output
    }

    /// Cluster on exact owner names; names outside every cluster that
    /// still repeat are merged as exact duplicates
    fn merge_named_track(&self, contacts: Vec<FormattedContact>) -> Vec<MergedContact> {
        let groups = group_in_order(contacts, |contact| contact.owner_full_name.clone());
        let groups: Vec<(String, Vec<MergedContact>)> = groups
            .into_iter()
            .map(|(name, members)| (name, members.into_iter().map(MergedContact::from).collect()))
            .collect();
        self.merge_clustered_groups(groups)
    }

    /// Collapse exact business-name repeats first, then cluster the
    /// remaining distinct business names
    fn merge_business_track(&self, contacts: Vec<FormattedContact>) -> Vec<MergedContact> {
        let groups = group_in_order(contacts, FormattedContact::business_key);
        let groups: Vec<(String, Vec<MergedContact>)> = groups
            .into_iter()
            .map(|(key, members)| {
                let members = members.into_iter().map(MergedContact::from).collect();
                (key, self.merge_contacts(members).into_iter().collect())
            })
            .collect();
        self.merge_clustered_groups(groups)
    }

    /// Merge groups whose keys fall in one cluster; groups outside any
    /// cluster merge only among themselves. Output follows the first
    /// appearance of each cluster or group.
    fn merge_clustered_groups(&self, groups: Vec<(String, Vec<MergedContact>)>) -> Vec<MergedContact> {
        let keys: Vec<&str> = groups.iter().map(|(key, _)| key.as_str()).collect();
        let report = self.names.find_duplicates(&keys);
        let cluster_of: Vec<Option<usize>> = keys.iter().map(|key| report.cluster_of(key)).collect();

        let mut pending: Vec<Vec<MergedContact>> = vec![Vec::new(); report.clusters.len()];
        let mut slot: Vec<Option<usize>> = vec![None; report.clusters.len()];
        let mut output: Vec<Option<MergedContact>> = Vec::new();

        for ((_, members), cluster) in groups.into_iter().zip(cluster_of) {
            match cluster {
                Some(idx) => {
                    if slot[idx].is_none() {
                        slot[idx] = Some(output.len());
                        output.push(None);
                    }
                    pending[idx].extend(members);
                }
                None => output.push(self.merge_contacts(members)),
            }
        }

        for (idx, members) in pending.into_iter().enumerate() {
            if let Some(position) = slot[idx] {
                output[position] = self.merge_contacts(members);
            }
        }

        output.into_iter().flatten().collect()
    }

    /// Merge contacts into one record.
    ///
    /// The most complete member is the master. Addresses, phones and
    /// business names are unioned with variant collapsing, the date is the
    /// latest present one, and provenance is accumulated. `None` for an
    /// empty input.
    pub fn merge_contacts(&self, mut members: Vec<MergedContact>) -> Option<MergedContact> {
        if members.len() <= 1 {
            return members.pop();
        }

        let master_idx = members
            .iter()
            .enumerate()
            .fold((0, None), |(best, best_score), (idx, member)| {
                let score = completeness_score(&member.contact);
                match best_score {
                    Some(current) if score <= current => (best, best_score),
                    _ => (idx, Some(score)),
                }
            })
            .0;

        // Master's collections lead the union
        let ordered: Vec<&MergedContact> = std::iter::once(&members[master_idx])
            .chain(
                members
                    .iter()
                    .enumerate()
                    .filter(|(idx, _)| *idx != master_idx)
                    .map(|(_, member)| member),
            )
            .collect();

        let addresses: Vec<&str> = ordered
            .iter()
            .flat_map(|m| m.contact.owner_address.iter().map(String::as_str))
            .collect();
        let business: Vec<&str> = ordered
            .iter()
            .flat_map(|m| m.contact.owner_business_name.iter().map(String::as_str))
            .collect();
        let phones: Vec<&str> = ordered
            .iter()
            .flat_map(|m| m.contact.owner_phone.iter().map(String::as_str))
            .collect();

        let date = members.iter().filter_map(|m| m.contact.date).max();
        let merged_count = members.iter().map(|m| m.merged_count).sum();
        let mut sources: Vec<String> = members
            .iter()
            .flat_map(|m| m.sources.iter().cloned())
            .collect();
        sources.sort();
        sources.dedup();

        let mut contact = members[master_idx].contact.clone();
        contact.owner_address = self.combiner.combine_addresses(&addresses);
        contact.owner_business_name = self.business_names.dedupe_variants(&business);
        contact.owner_phone = union_phones(&phones);
        contact.date = date;

        Some(MergedContact {
            contact,
            merged_count,
            sources,
        })
    }
}

/// Phones compared by their digits, first spelling kept
fn union_phones(phones: &[&str]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    let mut result = Vec::new();
    for phone in phones {
        let phone = phone.trim();
        if phone.is_empty() {
            continue;
        }
        let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
        let key = if digits.is_empty() {
            phone.to_lowercase()
        } else {
            digits
        };
        if !seen.contains(&key) {
            seen.push(key);
            result.push(phone.to_string());
        }
    }
    result
}

/// Group items by key, groups in order of first appearance
fn group_in_order<T, K, F>(items: Vec<T>, key: F) -> Vec<(K, Vec<T>)>
where
    K: Eq + Hash + Clone,
    F: Fn(&T) -> K,
{
    let mut index_of: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, Vec<T>)> = Vec::new();
    for item in items {
        let k = key(&item);
        match index_of.get(&k) {
            Some(&idx) => groups[idx].1.push(item),
            None => {
                index_of.insert(k.clone(), groups.len());
                groups.push((k, vec![item]));
            }
        }
    }
    groups
}
