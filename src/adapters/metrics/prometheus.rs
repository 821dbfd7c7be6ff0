//! Prometheus Crate Interop
//!
//! Hosts that already keep their own `prometheus::Registry` hand us the
//! output of `gather()`; this module turns that into a [`Registry`] so it
//! can be merged with the mapper registries, and converts back for hosts
//! that encode with the `prometheus` crate's `TextEncoder`.

use prometheus::proto::{self, LabelPair, MetricFamily, MetricType};
use tracing::debug;

use crate::domain::{FamilyDesc, LabelSet, MetricKind, MetricsError, Registry};

/// Build a registry from `prometheus::Registry::gather()` output.
///
/// Label names follow the label order of each family's first metric.
///
/// # Errors
/// `UnsupportedType` for anything but gauges and counters, plus the
/// usual registry errors for inconsistent families.
pub fn from_gathered(families: &[MetricFamily]) -> Result<Registry, MetricsError> {
    let mut registry = Registry::new();

    for mf in families {
        let kind = match mf.get_field_type() {
            MetricType::GAUGE => MetricKind::Gauge,
            MetricType::COUNTER => MetricKind::Counter,
            other => {
                return Err(MetricsError::UnsupportedType {
                    name: mf.get_name().to_string(),
                    kind: format!("{other:?}").to_lowercase(),
                });
            }
        };

        let label_names: Vec<&str> = mf
            .get_metric()
            .first()
            .map(|m| m.get_label().iter().map(LabelPair::get_name).collect())
            .unwrap_or_default();

        let desc = FamilyDesc {
            name: mf.get_name().to_string(),
            help: mf.get_help().to_string(),
            kind,
            label_names: Vec::new(),
        }
        .labels(&label_names);

        let family = registry.register_family(desc)?;
        for metric in mf.get_metric() {
            let labels: LabelSet = metric
                .get_label()
                .iter()
                .map(|pair| (pair.get_name(), pair.get_value()))
                .collect();
            let value = match kind {
                MetricKind::Gauge => metric.get_gauge().get_value(),
                MetricKind::Counter => metric.get_counter().get_value(),
            };
            family.set(labels, value)?;
        }
    }

    debug!(
        families = registry.len(),
        samples = registry.sample_count(),
        "Imported gathered prometheus families"
    );
    Ok(registry)
}

/// Convert a registry into `prometheus` protobuf families.
pub fn to_gathered(registry: &Registry) -> Vec<MetricFamily> {
    registry
        .families()
        .map(|family| {
            let mut mf = MetricFamily::default();
            mf.set_name(family.name().to_string());
            mf.set_help(family.help().to_string());
            mf.set_field_type(match family.kind() {
                MetricKind::Gauge => MetricType::GAUGE,
                MetricKind::Counter => MetricType::COUNTER,
            });

            for sample in family.samples() {
                let mut metric = proto::Metric::default();
                for key in family.label_names() {
                    let mut pair = LabelPair::default();
                    pair.set_name(key.clone());
                    pair.set_value(sample.labels.get(key).unwrap_or_default().to_string());
                    metric.mut_label().push(pair);
                }
                match family.kind() {
                    MetricKind::Gauge => {
                        let mut gauge = proto::Gauge::default();
                        gauge.set_value(sample.value);
                        metric.set_gauge(gauge);
                    }
                    MetricKind::Counter => {
                        let mut counter = proto::Counter::default();
                        counter.set_value(sample.value);
                        metric.set_counter(counter);
                    }
                }
                mf.mut_metric().push(metric);
            }
            mf
        })
        .collect()
}
