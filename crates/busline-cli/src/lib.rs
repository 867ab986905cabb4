//! Busline CLI - tools for exercising a busline server.
//!
//! - drive: logs in as a driver and streams simulated positions
//! - watch: polls the public location feed

pub mod client;
pub mod sim;

pub use client::BuslineClient;
