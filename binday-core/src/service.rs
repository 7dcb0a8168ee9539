//! High-level service facade combining all councils.

use std::sync::Arc;

use tracing::debug;

use crate::model::{CouncilId, NormalizedSchedule, PropertyRef};
use crate::plugin::CouncilRegistry;
use crate::ports::PortError;

/// Public entry point for loading normalized collection schedules.
pub struct BindayService {
    registry: Arc<CouncilRegistry>,
}

impl BindayService {
    /// Create a new service bound to the provided registry.
    #[must_use]
    pub fn new(registry: Arc<CouncilRegistry>) -> Self {
        Self { registry }
    }

    /// List all available councils and their display names.
    #[must_use]
    pub fn councils(&self) -> Vec<(CouncilId, String)> {
        self.registry
            .councils()
            .into_iter()
            .map(|meta| (meta.id, meta.name))
            .collect()
    }

    /// Fetch the current services for a property and normalize them.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] if the council is unsupported, the fetch fails,
    /// or a service identifier has no category mapping.
    pub async fn collections_for(
        &self,
        council: &CouncilId,
        property: &PropertyRef,
    ) -> Result<NormalizedSchedule, PortError> {
        let plugin = self.registry.plugin(council)?;
        let records = plugin.schedule_port.services(property).await?;
        debug!(%council, %property, services = records.len(), "fetched collection services");
        Ok(plugin.normalizer.normalize(&records)?)
    }
}
