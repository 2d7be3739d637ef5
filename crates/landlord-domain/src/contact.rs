//! Owner contact records

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Borough/block/lot location key. The parts are opaque labels.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bbl {
    #[serde(default)]
    pub borough: String,
    #[serde(default)]
    pub block: String,
    #[serde(default)]
    pub lot: String,
}

/// One disjoint address block as delivered by an agency dataset
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressBlock {
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip: String,
}

impl AddressBlock {
    pub fn new(street: &str, city: &str, state: &str, zip: &str) -> Self {
        Self {
            street: street.to_string(),
            city: city.to_string(),
            state: state.to_string(),
            zip: zip.to_string(),
        }
    }

    /// True when every component is empty or whitespace
    pub fn is_blank(&self) -> bool {
        [&self.street, &self.city, &self.state, &self.zip]
            .iter()
            .all(|part| part.trim().is_empty())
    }
}

/// One observation of an owner from one data source
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawContact {
    pub bbl: Bbl,

    // Personal name parts
    pub owner_first_name: String,
    pub owner_middle_name: String,
    pub owner_last_name: String,
    pub owner_full_name: String,

    pub owner_business_name: String,
    pub owner_type: String,
    pub owner_title: String,

    pub owner_address_1: AddressBlock,
    pub owner_address_2: AddressBlock,
    pub owner_phone_1: String,
    pub owner_phone_2: String,

    /// Observation date
    pub date: Option<NaiveDate>,

    // Provenance
    pub agency: String,
    pub source: String,
}

impl RawContact {
    /// Create a contact carrying only provenance
    pub fn new(agency: &str, source: &str) -> Self {
        Self {
            agency: agency.to_string(),
            source: source.to_string(),
            ..Default::default()
        }
    }

    /// The full name, or one composed from first/middle/last when the
    /// full name is blank
    pub fn finalized_full_name(&self) -> String {
        let full = self.owner_full_name.trim();
        if !full.is_empty() {
            return full.to_string();
        }

        [
            &self.owner_first_name,
            &self.owner_middle_name,
            &self.owner_last_name,
        ]
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }
}

/// A RawContact after address/phone consolidation
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormattedContact {
    pub bbl: Bbl,
    pub owner_full_name: String,
    /// Singleton or empty
    pub owner_business_name: Vec<String>,
    pub owner_type: String,
    pub owner_title: String,
    pub owner_address: Vec<String>,
    pub owner_phone: Vec<String>,
    pub date: Option<NaiveDate>,
    pub agency: String,
    pub source: String,
}

impl FormattedContact {
    pub fn has_name(&self) -> bool {
        !self.owner_full_name.trim().is_empty()
    }

    pub fn has_business_name(&self) -> bool {
        self.owner_business_name
            .iter()
            .any(|name| !name.trim().is_empty())
    }

    /// A contact with neither a name nor a business name cannot be matched
    pub fn has_identity(&self) -> bool {
        self.has_name() || self.has_business_name()
    }

    /// Business names joined into a single grouping key
    pub fn business_key(&self) -> String {
        self.owner_business_name.join(" ")
    }
}

/// Output of merging every contact in one cluster
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MergedContact {
    #[serde(flatten)]
    pub contact: FormattedContact,
    /// Number of observations absorbed into this record
    pub merged_count: usize,
    /// Distinct sources seen across the absorbed observations, sorted
    pub sources: Vec<String>,
}

impl From<FormattedContact> for MergedContact {
    fn from(contact: FormattedContact) -> Self {
        let sources = if contact.source.is_empty() {
            Vec::new()
        } else {
            vec![contact.source.clone()]
        };
        Self {
            contact,
            merged_count: 1,
            sources,
        }
    }
}
