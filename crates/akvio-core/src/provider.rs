// ── Option provider seam ──
//
// The async collaborator that supplies candidate lists for each level.
// Kept as a dyn-compatible trait so the controller can be exercised
// against scripted providers in tests and the HTTP client in akvio-api.

use futures_core::future::BoxFuture;
use thiserror::Error;

use crate::model::Device;

/// A candidate-list fetch failed. The controller treats every failure
/// the same way (loading indicator off, state untouched), so the error
/// carries only a message for the logs.
#[derive(Debug, Error)]
#[error("option load failed: {0}")]
pub struct ProviderError(String);

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Narrowing applied to a device-candidate listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceFilter {
    /// Restrict to devices in this domain (the selected master's domain).
    pub domain_id: Option<String>,
    /// Restrict to devices attached to this master device.
    pub master_device_id: Option<String>,
}

impl DeviceFilter {
    /// Filter derived from a selected master device.
    pub fn for_master(master: &Device) -> Self {
        Self {
            domain_id: Some(master.domain.id.clone()),
            master_device_id: Some(master.id.clone()),
        }
    }
}

/// Async source of selectable candidates, one method per level.
pub trait OptionProvider: Send + Sync + 'static {
    /// Devices of the designated master device type, optionally narrowed
    /// by search text.
    fn list_master_candidates(
        &self,
        search: Option<String>,
    ) -> BoxFuture<'_, Result<Vec<Device>, ProviderError>>;

    /// Devices dependent on a master, narrowed by search text and filter.
    fn list_device_candidates(
        &self,
        search: Option<String>,
        filter: DeviceFilter,
    ) -> BoxFuture<'_, Result<Vec<Device>, ProviderError>>;

    /// Topics the given device has published on.
    fn list_topics(&self, device_id: String) -> BoxFuture<'_, Result<Vec<String>, ProviderError>>;

    /// Data keys seen on the given device + topic.
    fn list_data_keys(
        &self,
        device_id: String,
        topic: String,
    ) -> BoxFuture<'_, Result<Vec<String>, ProviderError>>;
}
