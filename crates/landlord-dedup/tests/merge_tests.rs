//! Contact merge pipeline integration tests

mod common;

use chrono::NaiveDate;
use common::fixtures::load_contacts;
use common::init_tracing;
use landlord_dedup::{
    deduplicate_contacts, AddressBlock, ContactMerger, MergeConfig, MergedContact, RawContact,
};

fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
}

fn contact(agency: &str, source: &str, name: &str) -> RawContact {
    let mut raw = RawContact::new(agency, source);
    raw.owner_full_name = name.to_string();
    raw
}

fn names(merged: &[MergedContact]) -> Vec<&str> {
    merged
        .iter()
        .map(|m| m.contact.owner_full_name.as_str())
        .collect()
}

#[test]
fn test_name_variants_merge_at_loose_threshold() {
    init_tracing();
    let contacts = vec![
        contact("hpd", "registrations", "John Doe"),
        contact("hpd", "registrations", "Jon Doe"),
        contact("hpd", "registrations", "Jane Smith"),
    ];

    let merged = deduplicate_contacts(&contacts, 0.65).unwrap();
    assert_eq!(merged.len(), 2);
    assert_eq!(names(&merged), vec!["John Doe", "Jane Smith"]);
    assert_eq!(merged[0].merged_count, 2);
    assert_eq!(merged[1].merged_count, 1);
}

#[test]
fn test_default_threshold_keeps_name_variants_apart() {
    let contacts = vec![
        contact("hpd", "registrations", "John Doe"),
        contact("hpd", "registrations", "Jon Doe"),
    ];
    let merger = ContactMerger::new(MergeConfig::default()).unwrap();
    assert_eq!(merger.deduplicate(&contacts).len(), 2);
}

#[test]
fn test_shared_identity_agency_merges_across_sources() {
    let contacts = load_contacts("provenance.json");
    let merged = deduplicate_contacts(&contacts, 0.85).unwrap();

    assert_eq!(merged.len(), 3);
    assert_eq!(names(&merged), vec!["JOHN SMITH", "MARY JONES", "MARY JONES"]);

    let dob = &merged[0];
    assert_eq!(dob.merged_count, 2);
    assert_eq!(dob.sources, vec!["permits", "violations"]);
    assert_eq!(dob.contact.date, date(2021, 1, 1));

    assert_eq!(merged[1].sources, vec!["registrations"]);
    assert_eq!(merged[2].sources, vec!["complaints"]);
}

#[test]
fn test_shared_identity_agencies_are_configurable() {
    let contacts = load_contacts("provenance.json");
    let config = MergeConfig {
        shared_identity_agencies: vec!["dob".to_string(), "HPD".to_string()],
        ..Default::default()
    };
    let merged = ContactMerger::new(config).unwrap().deduplicate(&contacts);
    assert_eq!(merged.len(), 2);
    assert_eq!(merged[1].merged_count, 2);
}

#[test]
fn test_contact_fixture_pipeline() {
    init_tracing();
    let contacts = load_contacts("contacts.json");
    let merged = deduplicate_contacts(&contacts, 0.65).unwrap();

    // The blank-identity record is dropped
    assert_eq!(merged.len(), 3);

    let doe = &merged[0];
    assert_eq!(doe.contact.owner_full_name, "John Doe");
    assert_eq!(doe.contact.date, date(2022, 1, 15));
    assert_eq!(
        doe.contact.owner_address,
        vec!["210 N. WASHINGTON STREET, Alexandria, VA 22314"]
    );
    assert_eq!(doe.contact.owner_phone, vec!["212-555-1234"]);
    assert_eq!(doe.merged_count, 2);

    let acme = &merged[1];
    assert!(acme.contact.owner_full_name.is_empty());
    assert_eq!(acme.contact.owner_business_name, vec!["ACME REALTY LLC"]);
    assert_eq!(acme.contact.owner_phone, vec!["718-555-0000"]);
    assert_eq!(acme.contact.owner_type, "CorporateOwner");
    assert_eq!(acme.contact.date, date(2020, 2, 2));
    assert_eq!(acme.merged_count, 2);

    let smith = &merged[2];
    assert_eq!(smith.contact.owner_full_name, "Jane Smith");
    assert_eq!(smith.contact.date, None);
    assert_eq!(
        smith.contact.owner_address,
        vec!["106 WASHINGTON PLACE, New York, NY 10014"]
    );
}

#[test]
fn test_merge_collapses_address_case_variants() {
    let mut first = contact("hpd", "registrations", "JOHN DOE");
    first.owner_address_1 =
        AddressBlock::new("210 N. WASHINGTON STREET", "Alexandria", "VA", "22314");
    let mut second = contact("hpd", "registrations", "JOHN DOE");
    second.owner_address_1 =
        AddressBlock::new("210 N. WASHINGTON STREET", "ALEXANDRIA", "VA", "22314");

    let merged = deduplicate_contacts(&[first, second], 0.85).unwrap();
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].contact.owner_address.len(), 1);
}

#[test]
fn test_merge_keeps_distinct_addresses() {
    let mut first = contact("hpd", "registrations", "JOHN DOE");
    first.owner_address_1 =
        AddressBlock::new("210 N. WASHINGTON STREET", "Alexandria", "VA", "22314");
    let mut second = contact("hpd", "registrations", "JOHN DOE");
    second.owner_address_1 = AddressBlock::new("106 WASHINGTON PLACE", "New York", "NY", "10014");

    let merged = deduplicate_contacts(&[first, second], 0.85).unwrap();
    assert_eq!(merged.len(), 1);
    assert_eq!(
        merged[0].contact.owner_address,
        vec![
            "210 N. WASHINGTON STREET, Alexandria, VA 22314",
            "106 WASHINGTON PLACE, New York, NY 10014",
        ]
    );
}

#[test]
fn test_merge_keeps_neighbouring_house_numbers() {
    let mut first = contact("hpd", "registrations", "JOHN DOE");
    first.owner_address_1 =
        AddressBlock::new("210 N. WASHINGTON STREET", "NEW YORK CITY", "NY", "10014");
    first.owner_address_2 =
        AddressBlock::new("350 EAST 45TH STREET APT 12B", "NEW YORK", "NY", "10017");
    let mut second = contact("hpd", "registrations", "JOHN DOE");
    second.owner_address_1 =
        AddressBlock::new("212 N. WASHINGTON STREET", "NEW YORK CITY", "NY", "10014");
    second.owner_address_2 =
        AddressBlock::new("352 EAST 45TH STREET APT 12B", "NEW YORK", "NY", "10017");

    let merged = deduplicate_contacts(&[first, second], 0.85).unwrap();
    assert_eq!(merged.len(), 1);
    assert_eq!(
        merged[0].contact.owner_address,
        vec![
            "210 N. WASHINGTON STREET, NEW YORK CITY, NY 10014",
            "350 EAST 45TH STREET APT 12B, NEW YORK, NY 10017",
            "212 N. WASHINGTON STREET, NEW YORK CITY, NY 10014",
            "352 EAST 45TH STREET APT 12B, NEW YORK, NY 10017",
        ]
    );
}

#[test]
fn test_master_is_most_complete_contact() {
    let sparse = contact("hpd", "registrations", "JOHN DOE");
    let mut rich = contact("hpd", "registrations", "JOHN DOE");
    rich.owner_title = "Head Officer".to_string();
    rich.owner_type = "IndividualOwner".to_string();
    rich.owner_phone_1 = "212-555-1234".to_string();

    let merged = deduplicate_contacts(&[sparse, rich], 0.85).unwrap();
    assert_eq!(merged[0].contact.owner_title, "Head Officer");
    assert_eq!(merged[0].contact.owner_type, "IndividualOwner");
}

#[test]
fn test_missing_date_never_suppresses_present_one() {
    let mut dated = contact("hpd", "registrations", "JOHN DOE");
    dated.date = date(2018, 3, 1);
    let undated = contact("hpd", "registrations", "JOHN DOE");

    let merged = deduplicate_contacts(&[undated, dated], 0.85).unwrap();
    assert_eq!(merged[0].contact.date, date(2018, 3, 1));
}

#[test]
fn test_output_sorted_newest_first_undated_last() {
    let inputs = [
        ("ALPHA OWNER", None),
        ("BRAVO OWNER", date(2019, 1, 1)),
        ("CHARLIE PERSON", None),
        ("DELTA HOLDER", date(2023, 7, 4)),
        ("ECHO RESIDENT", date(2021, 2, 2)),
    ];
    let contacts: Vec<RawContact> = inputs
        .iter()
        .map(|(name, when)| {
            let mut raw = contact("hpd", "registrations", name);
            raw.date = *when;
            raw
        })
        .collect();

    let merged = deduplicate_contacts(&contacts, 0.85).unwrap();
    assert_eq!(merged.len(), 5);
    assert_eq!(
        names(&merged),
        vec![
            "DELTA HOLDER",
            "ECHO RESIDENT",
            "BRAVO OWNER",
            "ALPHA OWNER",
            "CHARLIE PERSON"
        ]
    );
}

#[test]
fn test_full_name_composed_from_parts() {
    let mut parts = RawContact::new("hpd", "registrations");
    parts.owner_first_name = "John".to_string();
    parts.owner_middle_name = "Q".to_string();
    parts.owner_last_name = "Public".to_string();

    let merged = deduplicate_contacts(&[parts], 0.85).unwrap();
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].contact.owner_full_name, "John Q Public");
}

#[test]
fn test_empty_input() {
    assert!(deduplicate_contacts(&[], 0.85).unwrap().is_empty());
    assert!(deduplicate_contacts(&[RawContact::new("dob", "permits")], 0.85)
        .unwrap()
        .is_empty());
}

#[test]
fn test_invalid_threshold_rejected() {
    assert!(deduplicate_contacts(&[], 1.5).is_err());
}

#[test]
fn test_merged_output_serializes_flat() {
    let merged = deduplicate_contacts(&[contact("dob", "permits", "JOHN DOE")], 0.85).unwrap();
    let value = serde_json::to_value(&merged[0]).unwrap();
    assert_eq!(value["owner_full_name"], "JOHN DOE");
    assert_eq!(value["merged_count"], 1);
    assert_eq!(value["sources"][0], "permits");
}
