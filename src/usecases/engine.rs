//! Metrics Engine - Host-Facing Facade
//!
//! Owns one registry per mapper plus any registries injected by the host,
//! and exposes the three operations a host invokes per request or poll
//! cycle. Each owned registry is long-lived and internally lock-guarded,
//! so repeated calls update the same scrape target.

use tracing::{info, instrument};

use crate::domain::{
    MetricsError, Registry, ServiceSnapshot, SharedRegistry, SystemOverviewSnapshot,
};

use super::merge::{self, MergeOptions, Merged};
use super::service::ServiceMapper;
use super::service_counters::CounterPolicy;
use super::system_overview::SystemOverviewMapper;

/// Construction options for [`MetricsEngine`].
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    /// How repeated counter values are combined.
    pub counter_policy: CounterPolicy,
    /// Externally built registries merged after the owned ones.
    pub registries: Vec<SharedRegistry>,
}

/// Mapping, merging and rendering entry points for a host.
#[derive(Debug)]
pub struct MetricsEngine {
    system_overview: SharedRegistry,
    service: SharedRegistry,
    injected: Vec<SharedRegistry>,
    overview_mapper: SystemOverviewMapper,
    service_mapper: ServiceMapper,
}

impl MetricsEngine {
    /// Create an engine with fresh owned registries.
    pub fn new(options: EngineOptions) -> Self {
        Self {
            system_overview: SharedRegistry::new(),
            service: SharedRegistry::new(),
            injected: options.registries,
            overview_mapper: SystemOverviewMapper::new(options.counter_policy),
            service_mapper: ServiceMapper::new(options.counter_policy),
        }
    }

    /// Handle to the registry written by the system-overview mapper.
    pub fn system_overview_registry(&self) -> SharedRegistry {
        self.system_overview.clone()
    }

    /// Handle to the registry written by the service mapper.
    pub fn service_registry(&self) -> SharedRegistry {
        self.service.clone()
    }

    /// Register another externally built registry for merging.
    pub fn inject_registry(&mut self, registry: SharedRegistry) {
        self.injected.push(registry);
    }

    /// Map a system-overview snapshot into the owned registry.
    ///
    /// # Errors
    /// `MissingParameter("systemOverviewMetrics")` for an absent snapshot,
    /// `Conflict` for clashing family metadata.
    pub fn process_system_overview_metrics(
        &self,
        snapshot: Option<&SystemOverviewSnapshot>,
    ) -> Result<SharedRegistry, MetricsError> {
        let mut registry = self.system_overview.write();
        self.overview_mapper.process(&mut registry, snapshot)?;
        Ok(self.system_overview.clone())
    }

    /// Map a service snapshot into the owned registry.
    ///
    /// # Errors
    /// `MissingParameter("serviceMetrics")` for an absent snapshot,
    /// `Conflict` for clashing family metadata.
    pub fn process_service_metrics(
        &self,
        snapshot: Option<&ServiceSnapshot>,
    ) -> Result<SharedRegistry, MetricsError> {
        let mut registry = self.service.write();
        self.service_mapper.process(&mut registry, snapshot)?;
        Ok(self.service.clone())
    }

    /// Merge the system-overview, service and injected registries, in
    /// that order, into a fresh registry.
    ///
    /// Each source is read-locked only while it is being copied.
    ///
    /// # Errors
    /// `Conflict` when two sources define a family differently.
    #[instrument(skip(self), fields(sources = self.injected.len() + 2))]
    pub fn merge_registries(&self, options: MergeOptions) -> Result<Merged, MetricsError> {
        let mut target = Registry::new();
        for source in self.sources() {
            merge::merge_into(&mut target, &source.read())?;
        }

        info!(
            families = target.len(),
            samples = target.sample_count(),
            "Merged metric registries"
        );

        Ok(merge::finish(target, options))
    }

    fn sources(&self) -> impl Iterator<Item = &SharedRegistry> {
        [&self.system_overview, &self.service]
            .into_iter()
            .chain(self.injected.iter())
    }
}
