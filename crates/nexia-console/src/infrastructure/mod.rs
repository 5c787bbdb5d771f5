//! Infrastructure layer providing external integrations.
//!
//! This module contains the guest runtimes the console can mount and the
//! HTTP client for the Nexia backend.

pub mod clients;
pub mod runtimes;
