//! Registry for all council plugins and their ports.

use std::collections::HashMap;
use std::sync::Arc;

use crate::model::{CouncilId, CouncilMeta};
use crate::normalize::Normalizer;
use crate::ports::{PortError, SchedulePort};

/// Fetch port and normalization settings implementing a single council.
pub struct CouncilPlugin {
    /// Static metadata describing the council.
    pub meta: CouncilMeta,
    /// Implementation for fetching raw service records.
    pub schedule_port: Arc<dyn SchedulePort>,
    /// Category map and attribute projection for this council's services.
    pub normalizer: Normalizer,
}

impl CouncilPlugin {
    /// Replace the plugin's normalizer, e.g. with a deployment override.
    #[must_use]
    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }
}

/// Registry that resolves plugins by council identifier.
pub struct CouncilRegistry {
    plugins: HashMap<CouncilId, CouncilPlugin>,
}

impl CouncilRegistry {
    /// Build a registry from the provided plugin list.
    #[must_use]
    pub fn new(plugins: Vec<CouncilPlugin>) -> Self {
        let plugins_map = plugins
            .into_iter()
            .map(|plugin| (plugin.meta.id.clone(), plugin))
            .collect();
        Self {
            plugins: plugins_map,
        }
    }

    /// Return metadata for all registered councils.
    #[must_use]
    pub fn councils(&self) -> Vec<CouncilMeta> {
        let mut councils: Vec<CouncilMeta> = self
            .plugins
            .values()
            .map(|plugin| plugin.meta.clone())
            .collect();
        councils.sort_by(|left, right| left.id.0.cmp(&right.id.0));
        councils
    }

    /// Look up a plugin for the given council.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::UnsupportedCouncil`] when no plugin is registered.
    pub fn plugin(&self, council: &CouncilId) -> Result<&CouncilPlugin, PortError> {
        self.plugins.get(council).ok_or(PortError::UnsupportedCouncil)
    }
}
