// OptionProvider over the platform client.
//
// Translates each cascade level's candidate fetch into the v3 REST
// calls: master candidates are devices of the designated master type,
// device candidates are devices in the master's domain.

use akvio_core::{Device, DeviceFilter, OptionProvider, ProviderError};
use futures_core::future::BoxFuture;
use serde_json::json;

use crate::client::PlatformClient;
use crate::error::Error;

fn provider_error(error: Error) -> ProviderError {
    ProviderError::new(error.to_string())
}

impl OptionProvider for PlatformClient {
    fn list_master_candidates(
        &self,
        search: Option<String>,
    ) -> BoxFuture<'_, Result<Vec<Device>, ProviderError>> {
        Box::pin(async move {
            let master_type = self.master_device_type().await.map_err(provider_error)?;
            let filter = json!({ "deviceType.id": master_type.id }).to_string();
            self.list_devices(search.as_deref(), Some(&filter), None)
                .await
                .map_err(provider_error)
        })
    }

    fn list_device_candidates(
        &self,
        search: Option<String>,
        filter: DeviceFilter,
    ) -> BoxFuture<'_, Result<Vec<Device>, ProviderError>> {
        Box::pin(async move {
            let domain_filter = filter
                .domain_id
                .as_ref()
                .map(|id| json!({ "domain.id": id }).to_string());
            self.list_devices(
                search.as_deref(),
                domain_filter.as_deref(),
                filter.master_device_id.as_deref(),
            )
            .await
            .map_err(provider_error)
        })
    }

    fn list_topics(&self, device_id: String) -> BoxFuture<'_, Result<Vec<String>, ProviderError>> {
        Box::pin(async move {
            PlatformClient::list_topics(self, &device_id)
                .await
                .map_err(provider_error)
        })
    }

    fn list_data_keys(
        &self,
        device_id: String,
        topic: String,
    ) -> BoxFuture<'_, Result<Vec<String>, ProviderError>> {
        Box::pin(async move {
            PlatformClient::list_data_keys(self, &device_id, &topic)
                .await
                .map_err(provider_error)
        })
    }
}
