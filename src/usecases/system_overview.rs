//! System-Overview Mapper
//!
//! Translates a fleet-level monitoring snapshot into per-instance gauge
//! families labeled `{instance}`, plus the legacy per-service request
//! counters the upstream still embeds in this payload.

use tracing::{debug, instrument, warn};

use crate::domain::{
    FamilyDesc, InstanceOverview, LabelSet, MetricsError, Registry, SystemOverviewSnapshot,
};

use super::service_counters::{self, CounterPolicy, ServiceCounts};

/// Name of the required input, as reported in the missing-parameter error.
pub const SYSTEM_OVERVIEW_PARAM: &str = "systemOverviewMetrics";

/// Instance CPU usage gauge.
pub const GATEWAY_INSTANCE_CPU: &str = "gateway_instance_cpu";
/// Instance disk usage gauge.
pub const GATEWAY_INSTANCE_DISK_USED: &str = "gateway_instance_disk_used";

struct InstanceGauge {
    name: &'static str,
    help: &'static str,
    read: fn(&InstanceOverview) -> Option<f64>,
}

const INSTANCE_GAUGES: &[InstanceGauge] = &[
    InstanceGauge {
        name: GATEWAY_INSTANCE_CPU,
        help: "Current CPU usage of the API-Gateway instance",
        read: |r| r.cpu_used,
    },
    InstanceGauge {
        name: "gateway_instance_cpu_avg",
        help: "Average CPU usage of the API-Gateway instance",
        read: |r| r.cpu_used_avg,
    },
    InstanceGauge {
        name: "gateway_instance_cpu_max",
        help: "Maximum CPU usage of the API-Gateway instance",
        read: |r| r.cpu_used_max,
    },
    InstanceGauge {
        name: "gateway_instance_system_memory_used",
        help: "System memory used on the API-Gateway host",
        read: |r| r.system_memory_used,
    },
    InstanceGauge {
        name: "gateway_instance_system_memory_total",
        help: "Total system memory of the API-Gateway host",
        read: |r| r.system_memory_total,
    },
    InstanceGauge {
        name: "gateway_instance_jvm_memory_used",
        help: "Memory used by the API-Gateway instance process",
        read: |r| r.memory_used,
    },
    InstanceGauge {
        name: GATEWAY_INSTANCE_DISK_USED,
        help: "Disk usage of the API-Gateway instance",
        read: |r| r.disk_used,
    },
    InstanceGauge {
        name: "gateway_instance_up",
        help: "Whether the API-Gateway instance is up (1) or down (0)",
        read: |r| r.status_up.map(|up| if up { 1.0 } else { 0.0 }),
    },
];

/// Maps [`SystemOverviewSnapshot`]s into a registry.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemOverviewMapper {
    policy: CounterPolicy,
}

impl SystemOverviewMapper {
    /// Create a mapper writing legacy service counters with `policy`.
    pub fn new(policy: CounterPolicy) -> Self {
        Self { policy }
    }

    /// Write the snapshot into `registry` and hand the registry back.
    ///
    /// Gauges are overwritten per instance; fields the upstream did not
    /// report are omitted rather than zero-filled.
    ///
    /// # Errors
    /// `MissingParameter` when the snapshot is absent or has no instances;
    /// registry errors if a family of the same name was registered with
    /// other metadata.
    #[instrument(skip_all)]
    pub fn process<'r>(
        &self,
        registry: &'r mut Registry,
        snapshot: Option<&SystemOverviewSnapshot>,
    ) -> Result<&'r mut Registry, MetricsError> {
        let Some(snapshot) = snapshot.filter(|s| !s.instances.is_empty()) else {
            warn!(parameter = SYSTEM_OVERVIEW_PARAM, "System overview snapshot missing");
            return Err(MetricsError::MissingParameter(SYSTEM_OVERVIEW_PARAM));
        };

        for gauge in INSTANCE_GAUGES {
            registry.register_family(
                FamilyDesc::gauge(gauge.name, gauge.help).labels(&["instance"]),
            )?;
        }
        service_counters::register_request_families(registry, false)?;

        let mut legacy_entries = 0usize;
        for record in &snapshot.instances {
            let labels = LabelSet::instance(&record.instance);
            for gauge in INSTANCE_GAUGES {
                if let Some(value) = (gauge.read)(record) {
                    registry.set_sample(gauge.name, labels.clone(), value)?;
                }
            }

            for entry in &record.services {
                let instance = entry.instance.as_deref().unwrap_or(&record.instance);
                service_counters::record_service_counters(
                    registry,
                    self.policy,
                    instance,
                    &entry.service,
                    &ServiceCounts::from(entry),
                )?;
                legacy_entries += 1;
            }
        }

        debug!(
            instances = snapshot.instances.len(),
            legacy_service_entries = legacy_entries,
            "System overview metrics mapped"
        );

        Ok(registry)
    }
}
