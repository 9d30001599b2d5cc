#![doc = "manual-job-core: core logic library for manual-job."]

//! This crate contains the discovery, filtering and delivery pipeline for manual transfer jobs.
//! Transport code (HTTP clients for the platform and the browsing service) is not included here;
//! it lives in the CLI crate and plugs in through the traits in [`contract`].
//!
//! # Usage
//! Add this as a dependency for all shared discovery, filtering and pipeline code.

pub mod contract;
pub mod discover;
pub mod error;
pub mod filter;
pub mod job;
pub mod pipeline;
pub mod portal;
pub mod source_file;
pub mod traverse;
