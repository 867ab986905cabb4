//! Shared library surface for the busline server and its tests.

pub mod api;
pub mod config;
pub mod persistence;
pub mod state;
