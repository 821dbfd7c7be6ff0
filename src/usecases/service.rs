//! Service Mapper
//!
//! Translates per-service, per-instance request totals into counter
//! families labeled `{instance, service}`. Each (instance, service) pair
//! is its own series; how repeated calls combine is set by the
//! [`CounterPolicy`].

use tracing::{debug, instrument, warn};

use crate::domain::{MetricsError, Registry, ServiceSnapshot};

use super::service_counters::{self, CounterPolicy, ServiceCounts};

/// Name of the required input, as reported in the missing-parameter error.
pub const SERVICE_PARAM: &str = "serviceMetrics";

/// Maps [`ServiceSnapshot`]s into a registry.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServiceMapper {
    policy: CounterPolicy,
}

impl ServiceMapper {
    /// Create a mapper combining repeated values with `policy`.
    pub fn new(policy: CounterPolicy) -> Self {
        Self { policy }
    }

    /// Write the snapshot into `registry` and hand the registry back.
    ///
    /// # Errors
    /// `MissingParameter` when the snapshot is absent or has no services;
    /// registry errors on conflicting family metadata.
    #[instrument(skip_all, fields(policy = ?self.policy))]
    pub fn process<'r>(
        &self,
        registry: &'r mut Registry,
        snapshot: Option<&ServiceSnapshot>,
    ) -> Result<&'r mut Registry, MetricsError> {
        let Some(snapshot) = snapshot.filter(|s| !s.services.is_empty()) else {
            warn!(parameter = SERVICE_PARAM, "Service snapshot missing");
            return Err(MetricsError::MissingParameter(SERVICE_PARAM));
        };

        service_counters::register_request_families(registry, true)?;

        let mut series = 0usize;
        for record in &snapshot.services {
            for counters in &record.instances {
                service_counters::record_service_counters(
                    registry,
                    self.policy,
                    &counters.instance,
                    &record.service,
                    &ServiceCounts::from(counters),
                )?;
                series += 1;
            }
        }

        debug!(
            services = snapshot.services.len(),
            series,
            "Service metrics mapped"
        );

        Ok(registry)
    }
}
