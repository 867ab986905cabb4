//! Persistence layer for the busline server.
//!
//! Both stores are small JSON documents rewritten in full. The location
//! registry writes through on every upsert; the credential file is only
//! written when it has to be seeded.

pub mod credentials;
pub mod json_file;
pub mod locations;

pub use credentials::CredentialStore;
pub use locations::LocationRegistry;
