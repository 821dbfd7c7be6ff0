//! Service Request Counters - Shared Translation
//!
//! Both mappers write per-service request counters labeled
//! `{instance, service}`. The system-overview payload carries a copy of
//! these counters because of an upstream data-placement defect; routing
//! both paths through this module keeps their output identical in shape.
//! Once upstream stops embedding the counters in the overview payload,
//! the overview path can drop its call into here.

use serde::Deserialize;

use crate::domain::{
    FamilyDesc, LabelSet, LegacyServiceCounters, MetricsError, Registry,
    ServiceInstanceCounters,
};

/// Family holding all requests per service and instance.
pub const API_REQUESTS_TOTAL: &str = "api_requests_total";
/// Family holding successful requests per service and instance.
pub const API_REQUESTS_SUCCESS: &str = "api_requests_success";
/// Family holding failed requests per service and instance.
pub const API_REQUESTS_FAILURES: &str = "api_requests_failures";
/// Family holding requests that raised an exception.
pub const API_REQUESTS_EXCEPTIONS: &str = "api_requests_exceptions";

const SERVICE_LABELS: &[&str] = &["instance", "service"];

/// How a counter value from a new snapshot is combined with the stored one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CounterPolicy {
    /// The upstream already reports cumulative totals: replace the sample.
    #[default]
    Overwrite,
    /// The upstream reports deltas: add to the sample.
    Accumulate,
}

/// Request counts for one (instance, service) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceCounts {
    /// All requests, if reported.
    pub total: Option<u64>,
    /// Successful requests.
    pub successes: u64,
    /// Failed requests.
    pub failures: u64,
    /// Requests that raised an exception.
    pub exceptions: u64,
}

impl From<&LegacyServiceCounters> for ServiceCounts {
    fn from(entry: &LegacyServiceCounters) -> Self {
        Self {
            total: None,
            successes: entry.successes,
            failures: entry.failures,
            exceptions: entry.exceptions,
        }
    }
}

impl From<&ServiceInstanceCounters> for ServiceCounts {
    fn from(entry: &ServiceInstanceCounters) -> Self {
        Self {
            total: entry.total,
            successes: entry.successes,
            failures: entry.failures,
            exceptions: entry.exceptions,
        }
    }
}

/// Register the success / failure / exception counter families, plus the
/// total family when `with_total` is set.
pub fn register_request_families(
    registry: &mut Registry,
    with_total: bool,
) -> Result<(), MetricsError> {
    if with_total {
        registry.register_family(
            FamilyDesc::counter(API_REQUESTS_TOTAL, "Total number of API requests")
                .labels(SERVICE_LABELS),
        )?;
    }
    registry.register_family(
        FamilyDesc::counter(API_REQUESTS_SUCCESS, "Number of successful API requests")
            .labels(SERVICE_LABELS),
    )?;
    registry.register_family(
        FamilyDesc::counter(API_REQUESTS_FAILURES, "Number of failed API requests")
            .labels(SERVICE_LABELS),
    )?;
    registry.register_family(
        FamilyDesc::counter(
            API_REQUESTS_EXCEPTIONS,
            "Number of API requests that raised an exception",
        )
        .labels(SERVICE_LABELS),
    )?;
    Ok(())
}

/// Write the counters of one (instance, service) pair.
///
/// The families must have been registered with
/// [`register_request_families`]. `total` is only written when present.
pub fn record_service_counters(
    registry: &mut Registry,
    policy: CounterPolicy,
    instance: &str,
    service: &str,
    counts: &ServiceCounts,
) -> Result<(), MetricsError> {
    let labels = LabelSet::instance_service(instance, service);

    if let Some(total) = counts.total {
        write_counter(registry, policy, API_REQUESTS_TOTAL, labels.clone(), total)?;
    }
    write_counter(registry, policy, API_REQUESTS_SUCCESS, labels.clone(), counts.successes)?;
    write_counter(registry, policy, API_REQUESTS_FAILURES, labels.clone(), counts.failures)?;
    write_counter(registry, policy, API_REQUESTS_EXCEPTIONS, labels, counts.exceptions)
}

#[allow(clippy::cast_precision_loss)]
fn write_counter(
    registry: &mut Registry,
    policy: CounterPolicy,
    name: &str,
    labels: LabelSet,
    value: u64,
) -> Result<(), MetricsError> {
    let value = value as f64;
    match policy {
        CounterPolicy::Overwrite => registry.set_sample(name, labels, value),
        CounterPolicy::Accumulate => registry.inc_sample(name, labels, value),
    }
}
