//! Domain model for the publishing agency.
//!
//! Owns the registry ([`agency::Agency`]) plus the newspaper, issue, editor
//! and subscriber entities and their identifier-based relations. The crate
//! performs no I/O and no synchronization of its own; a transport layer
//! serializes access and maps outcomes onto its wire format.

pub mod agency;
pub mod reports;
pub mod types;
