//! Owner contact domain types
//!
//! This crate provides the plain data models shared by the deduplication engine:
//! - RawContact: one observation of an owner from one agency dataset
//! - FormattedContact: a RawContact with addresses and phones consolidated
//! - MergedContact: the result of merging the contacts of one cluster
//! - Bbl: the borough/block/lot location key

pub mod contact;

pub use contact::*;
