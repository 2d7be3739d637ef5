//! Per-record cleanup of raw contacts
//!
//! Folds the disjoint address and phone fields of a [`RawContact`] into
//! ordered lists and drops near-duplicate address variants.

use landlord_domain::{AddressBlock, FormattedContact, RawContact};

use crate::config::{DetectorConfig, ADDRESS_THRESHOLD};
use crate::deduplication::DuplicateDetector;
use crate::error::Result;

/// Format an address block as `"street, city, state zip"`.
///
/// Empty components are omitted together with their separator; a block
/// with nothing in it yields `None`.
pub fn format_address(block: &AddressBlock) -> Option<String> {
    if block.is_blank() {
        return None;
    }

    let state_zip = [block.state.trim(), block.zip.trim()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    let formatted = [block.street.trim(), block.city.trim(), state_zip.as_str()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ");

    Some(formatted)
}

/// Trimmed, non-empty phones with exact repeats removed
pub fn collect_phones(raw: &RawContact) -> Vec<String> {
    let mut phones: Vec<String> = Vec::new();
    for phone in [&raw.owner_phone_1, &raw.owner_phone_2] {
        let phone = phone.trim();
        if !phone.is_empty() && !phones.iter().any(|p| p == phone) {
            phones.push(phone.to_string());
        }
    }
    phones
}

/// Builds [`FormattedContact`]s, collapsing address variants
#[derive(Debug)]
pub struct ContactCombiner {
    addresses: DuplicateDetector,
}

impl ContactCombiner {
    /// Address variants must also agree on every numbered token, so
    /// different house numbers never collapse however long the address
    pub fn new(address_threshold: f64) -> Result<Self> {
        let config = DetectorConfig {
            match_numbers: true,
            ..DetectorConfig::with_threshold(address_threshold)
        };
        Ok(Self {
            addresses: DuplicateDetector::new(config)?,
        })
    }

    pub fn with_default_threshold() -> Result<Self> {
        Self::new(ADDRESS_THRESHOLD)
    }

    /// Drop addresses that differ from an earlier one only in casing,
    /// punctuation or spacing
    pub fn combine_addresses<S: AsRef<str>>(&self, addresses: &[S]) -> Vec<String> {
        self.addresses.dedupe_variants(addresses)
    }

    pub fn format_contact(&self, raw: &RawContact) -> FormattedContact {
        let addresses: Vec<String> = [&raw.owner_address_1, &raw.owner_address_2]
            .into_iter()
            .filter_map(format_address)
            .collect();

        let business = raw.owner_business_name.trim();
        let owner_business_name = if business.is_empty() {
            Vec::new()
        } else {
            vec![business.to_string()]
        };

        FormattedContact {
            bbl: raw.bbl.clone(),
            owner_full_name: raw.finalized_full_name(),
            owner_business_name,
            owner_type: raw.owner_type.trim().to_string(),
            owner_title: raw.owner_title.trim().to_string(),
            owner_address: self.combine_addresses(&addresses),
            owner_phone: collect_phones(raw),
            date: raw.date,
            agency: raw.agency.trim().to_string(),
            source: raw.source.trim().to_string(),
        }
    }
}
