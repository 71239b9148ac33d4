//! # uas-core -- Foundational Types for UniFi Alias Sync
//!
//! Every other crate in the workspace depends on `uas-core`; it depends on
//! nothing internal.
//!
//! ## Contents
//!
//! - [`MacAddress`]: validated hardware address newtype. Parsing accepts
//!   colon- or dash-separated hex in any case and stores the canonical
//!   lowercase colon-separated form, so two spellings of one device compare
//!   equal everywhere downstream.
//! - [`Site`] and [`Client`]: the records the sync engine reconciles.
//! - Capability traits ([`SiteFetcher`], [`ClientFetcher`], [`AliasApplier`])
//!   that the engine depends on abstractly. The HTTP client implements them
//!   for a live controller; tests implement them in memory.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `uas-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod controller;
pub mod error;
pub mod mac;
pub mod model;

pub use controller::{AliasApplier, ClientFetcher, Controller, SiteFetcher};
pub use error::{ControllerError, ValidationError};
pub use mac::MacAddress;
pub use model::{Client, Site, DEFAULT_SITE_NAME};
