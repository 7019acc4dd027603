//! Async client for the Akvio IoT platform's v3 REST API.
//!
//! [`PlatformClient`] handles API-key auth, base-URL normalization, and
//! the device / topic / data-key listing endpoints. It implements
//! [`akvio_core::OptionProvider`], so it plugs straight into the
//! selection cascade as its candidate source.

pub mod client;
pub mod error;
pub mod provider;
pub mod types;

pub use client::PlatformClient;
pub use error::Error;
pub use types::{DeviceType, Page};
