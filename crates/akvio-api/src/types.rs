// Wire types for the platform's v3 REST API. Device payloads
// deserialize straight into [`akvio_core::Device`] since listings are
// requested with `fields=id,name,domain`.

use serde::Deserialize;

/// Paged listing envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    pub offset: i64,
    pub limit: i64,
    pub total: i64,
    pub data: Vec<T>,
}

/// A device type as returned by the platform.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceType {
    pub id: String,
    pub name: String,
}
