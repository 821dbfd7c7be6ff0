//! Metric Family Registry
//!
//! An addressable collection of named metric families. Each family holds
//! a gauge or counter value per label set. Families and samples keep
//! insertion order so the rendered exposition is stable across calls.
//!
//! Invariants:
//! - at most one family per name; re-registering the same type, help and
//!   set of label names is a no-op, anything else is a `Conflict`
//! - every sample in a family carries exactly the family's label names

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::error::MetricsError;

/// Metric type semantics of a family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    /// Value may go up and down (instantaneous readings).
    Gauge,
    /// Value is expected to be monotonically non-decreasing.
    Counter,
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gauge => write!(f, "gauge"),
            Self::Counter => write!(f, "counter"),
        }
    }
}

impl FromStr for MetricKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gauge" => Ok(Self::Gauge),
            "counter" => Ok(Self::Counter),
            other => Err(other.to_string()),
        }
    }
}

/// Label dimensions addressing one time series inside a family.
///
/// Equality and hashing ignore the order in which labels were added.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LabelSet(BTreeMap<String, String>);

impl LabelSet {
    /// Empty label set (for families without dimensions).
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// `{instance}` label set.
    pub fn instance(instance: &str) -> Self {
        Self::new().with("instance", instance)
    }

    /// `{instance, service}` label set.
    pub fn instance_service(instance: &str, service: &str) -> Self {
        Self::new()
            .with("instance", instance)
            .with("service", service)
    }

    /// Value of a label, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Whether a label with this key is present.
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of labels.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when there are no labels.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Label keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LabelSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl fmt::Display for LabelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (k, v)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{k}=\"{v}\"")?;
        }
        write!(f, "}}")
    }
}

/// Metadata identifying a metric family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyDesc {
    /// Unique family name.
    pub name: String,
    /// Help / description line.
    pub help: String,
    /// Gauge or counter.
    pub kind: MetricKind,
    /// Label names in exposition order.
    pub label_names: Vec<String>,
}

impl FamilyDesc {
    /// Gauge family without labels.
    pub fn gauge(name: impl Into<String>, help: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            kind: MetricKind::Gauge,
            label_names: Vec::new(),
        }
    }

    /// Counter family without labels.
    pub fn counter(name: impl Into<String>, help: impl Into<String>) -> Self {
        Self {
            kind: MetricKind::Counter,
            ..Self::gauge(name, help)
        }
    }

    /// Set the family's label names.
    #[must_use]
    pub fn labels(mut self, names: &[&str]) -> Self {
        self.label_names = names.iter().map(|n| (*n).to_string()).collect();
        self
    }
}

/// One labeled value in a family.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// The series' label set.
    pub labels: LabelSet,
    /// Current value.
    pub value: f64,
}

/// A named gauge or counter family and its samples.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricFamily {
    desc: FamilyDesc,
    samples: Vec<Sample>,
    index: HashMap<LabelSet, usize>,
}

impl MetricFamily {
    fn new(desc: FamilyDesc) -> Self {
        Self {
            desc,
            samples: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Family name.
    pub fn name(&self) -> &str {
        &self.desc.name
    }

    /// Help text.
    pub fn help(&self) -> &str {
        &self.desc.help
    }

    /// Gauge or counter.
    pub fn kind(&self) -> MetricKind {
        self.desc.kind
    }

    /// Declared label names, in exposition order.
    pub fn label_names(&self) -> &[String] {
        &self.desc.label_names
    }

    /// Full metadata.
    pub fn desc(&self) -> &FamilyDesc {
        &self.desc
    }

    /// Samples in insertion order.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Value for an exact label set.
    pub fn get(&self, labels: &LabelSet) -> Option<f64> {
        self.index.get(labels).map(|&i| self.samples[i].value)
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True when no sample has been set yet.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Insert or overwrite the value for `labels`.
    pub fn set(&mut self, labels: LabelSet, value: f64) -> Result<(), MetricsError> {
        self.check_labels(&labels)?;
        match self.index.get(&labels) {
            Some(&i) => self.samples[i].value = value,
            None => {
                self.index.insert(labels.clone(), self.samples.len());
                self.samples.push(Sample { labels, value });
            }
        }
        Ok(())
    }

    /// Add `delta` to the value for `labels`, starting from zero.
    pub fn inc(&mut self, labels: LabelSet, delta: f64) -> Result<(), MetricsError> {
        let current = self.get(&labels).unwrap_or(0.0);
        self.set(labels, current + delta)
    }

    fn check_labels(&self, labels: &LabelSet) -> Result<(), MetricsError> {
        let names = &self.desc.label_names;
        if labels.len() == names.len() && names.iter().all(|n| labels.contains(n)) {
            return Ok(());
        }
        Err(MetricsError::LabelMismatch {
            name: self.desc.name.clone(),
            expected: names.join(","),
            got: labels.keys().collect::<Vec<_>>().join(","),
        })
    }

    /// True when the family carries any information about its label names.
    ///
    /// A family parsed from a HELP/TYPE header with no samples has none.
    pub fn has_label_evidence(&self) -> bool {
        !self.desc.label_names.is_empty() || !self.samples.is_empty()
    }

    fn check_metadata(&self, desc: &FamilyDesc) -> Result<(), MetricsError> {
        let existing = &self.desc;
        if existing.kind != desc.kind {
            return Err(MetricsError::conflict(
                &desc.name,
                format!("type ({} vs {})", existing.kind, desc.kind),
            ));
        }
        if existing.help != desc.help {
            return Err(MetricsError::conflict(&desc.name, "help text"));
        }
        Ok(())
    }

    /// Label names are compared as a set; the first declared order is
    /// kept for rendering. A family without label evidence adopts the
    /// names of `desc`.
    fn check_compatible(&mut self, desc: &FamilyDesc) -> Result<(), MetricsError> {
        self.check_metadata(desc)?;
        if same_label_names(&self.desc.label_names, &desc.label_names) {
            return Ok(());
        }
        if !self.has_label_evidence() {
            self.desc.label_names.clone_from(&desc.label_names);
            return Ok(());
        }
        Err(MetricsError::conflict(
            &desc.name,
            format!(
                "label names ([{}] vs [{}])",
                self.desc.label_names.join(","),
                desc.label_names.join(",")
            ),
        ))
    }
}

fn same_label_names(a: &[String], b: &[String]) -> bool {
    a.len() == b.len() && a.iter().all(|name| b.contains(name))
}

fn has_duplicate_labels(names: &[String]) -> bool {
    let mut sorted: Vec<&String> = names.iter().collect();
    sorted.sort();
    sorted.windows(2).any(|pair| pair[0] == pair[1])
}

/// In-memory aggregate of metric families for one scrape snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Registry {
    families: Vec<MetricFamily>,
    index: HashMap<String, usize>,
}

impl Registry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the family if absent, or return the existing one when its
    /// metadata is identical.
    ///
    /// # Errors
    /// `Conflict` when a family of the same name differs in type, help or
    /// the set of label names. `LabelMismatch` when `desc` repeats a label name.
    pub fn register_family(
        &mut self,
        desc: FamilyDesc,
    ) -> Result<&mut MetricFamily, MetricsError> {
        if has_duplicate_labels(&desc.label_names) {
            return Err(MetricsError::LabelMismatch {
                name: desc.name.clone(),
                expected: "unique label names".to_string(),
                got: desc.label_names.join(","),
            });
        }

        if let Some(&i) = self.index.get(&desc.name) {
            self.families[i].check_compatible(&desc)?;
            return Ok(&mut self.families[i]);
        }

        let i = self.families.len();
        self.index.insert(desc.name.clone(), i);
        self.families.push(MetricFamily::new(desc));
        Ok(&mut self.families[i])
    }

    /// Register `source`'s family here and copy its samples, later
    /// values overwriting earlier ones under the same label set.
    ///
    /// A source family without label evidence only has to agree on type
    /// and help.
    ///
    /// # Errors
    /// `Conflict` on differing type, help or label names, `LabelMismatch`
    /// for samples that do not fit the merged family.
    pub fn merge_family(&mut self, source: &MetricFamily) -> Result<(), MetricsError> {
        let existing = self.index.get(source.name()).copied();
        let target = match existing {
            Some(i) if !source.has_label_evidence() => {
                let target = &mut self.families[i];
                target.check_metadata(source.desc())?;
                target
            }
            _ => self.register_family(source.desc().clone())?,
        };
        for sample in source.samples() {
            target.set(sample.labels.clone(), sample.value)?;
        }
        Ok(())
    }

    /// Insert or overwrite one sample of a registered family.
    ///
    /// # Errors
    /// `NotFound` for an unknown family, `LabelMismatch` for a label set
    /// that does not match the family's label names.
    pub fn set_sample(
        &mut self,
        name: &str,
        labels: LabelSet,
        value: f64,
    ) -> Result<(), MetricsError> {
        self.family_mut(name)?.set(labels, value)
    }

    /// Add to one sample of a registered family.
    ///
    /// # Errors
    /// Same as [`Registry::set_sample`].
    pub fn inc_sample(
        &mut self,
        name: &str,
        labels: LabelSet,
        delta: f64,
    ) -> Result<(), MetricsError> {
        self.family_mut(name)?.inc(labels, delta)
    }

    /// Value of one sample.
    ///
    /// # Errors
    /// `NotFound` for an unknown family, `SampleNotFound` for an unknown
    /// label set.
    pub fn get_sample(&self, name: &str, labels: &LabelSet) -> Result<f64, MetricsError> {
        let family = self.family(name).ok_or_else(|| MetricsError::not_found(name))?;
        family.get(labels).ok_or_else(|| MetricsError::SampleNotFound {
            name: name.to_string(),
            labels: labels.to_string(),
        })
    }

    /// Family by name.
    pub fn family(&self, name: &str) -> Option<&MetricFamily> {
        self.index.get(name).map(|&i| &self.families[i])
    }

    fn family_mut(&mut self, name: &str) -> Result<&mut MetricFamily, MetricsError> {
        match self.index.get(name) {
            Some(&i) => Ok(&mut self.families[i]),
            None => Err(MetricsError::not_found(name)),
        }
    }

    /// Families in registration order.
    pub fn families(&self) -> impl Iterator<Item = &MetricFamily> {
        self.families.iter()
    }

    /// Number of families.
    pub fn len(&self) -> usize {
        self.families.len()
    }

    /// True when no family is registered.
    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    /// Total number of samples across all families.
    pub fn sample_count(&self) -> usize {
        self.families.iter().map(MetricFamily::len).sum()
    }
}

/// Mutex-guarded registry handle for long-lived scrape targets.
///
/// Clones share the same underlying registry.
#[derive(Debug, Clone, Default)]
pub struct SharedRegistry(Arc<RwLock<Registry>>);

impl SharedRegistry {
    /// Fresh empty shared registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared read access.
    pub fn read(&self) -> RwLockReadGuard<'_, Registry> {
        self.0.read()
    }

    /// Exclusive write access.
    pub fn write(&self) -> RwLockWriteGuard<'_, Registry> {
        self.0.write()
    }

    /// Point-in-time copy of the registry.
    pub fn snapshot(&self) -> Registry {
        self.0.read().clone()
    }

    /// Whether two handles point at the same registry.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl From<Registry> for SharedRegistry {
    fn from(registry: Registry) -> Self {
        Self(Arc::new(RwLock::new(registry)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cpu_desc() -> FamilyDesc {
        FamilyDesc::gauge("gateway_instance_cpu", "CPU usage").labels(&["instance"])
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut registry = Registry::new();
        registry.register_family(cpu_desc()).unwrap();
        registry.register_family(cpu_desc()).unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_conflicting_help() {
        let mut registry = Registry::new();
        registry.register_family(cpu_desc()).unwrap();
        let other = FamilyDesc::gauge("gateway_instance_cpu", "Other").labels(&["instance"]);
        let err = registry.register_family(other).unwrap_err();
        assert!(matches!(err, MetricsError::Conflict { .. }));
    }

    #[test]
    fn test_register_conflicting_kind() {
        let mut registry = Registry::new();
        registry.register_family(cpu_desc()).unwrap();
        let other = FamilyDesc::counter("gateway_instance_cpu", "CPU usage").labels(&["instance"]);
        let err = registry.register_family(other).unwrap_err();
        assert!(err.to_string().contains("gauge vs counter"));
    }

    #[test]
    fn test_register_label_order_is_not_identity() {
        let mut registry = Registry::new();
        registry
            .register_family(FamilyDesc::gauge("g", "G").labels(&["zone", "app"]))
            .unwrap();
        let family = registry
            .register_family(FamilyDesc::gauge("g", "G").labels(&["app", "zone"]))
            .unwrap();
        assert_eq!(family.label_names(), ["zone", "app"]);
    }

    #[test]
    fn test_register_different_label_names_conflict() {
        let mut registry = Registry::new();
        registry.register_family(cpu_desc()).unwrap();
        let other = FamilyDesc::gauge("gateway_instance_cpu", "CPU usage").labels(&["pod"]);
        let err = registry.register_family(other).unwrap_err();
        assert!(matches!(err, MetricsError::Conflict { .. }));
    }

    #[test]
    fn test_header_only_family_adopts_label_names() {
        let mut registry = Registry::new();
        registry
            .register_family(FamilyDesc::gauge("gateway_instance_cpu", "CPU usage"))
            .unwrap();
        let family = registry.register_family(cpu_desc()).unwrap();
        assert_eq!(family.label_names(), ["instance"]);
        assert!(family.has_label_evidence());
    }

    #[test]
    fn test_merge_family_without_label_evidence_keeps_names() {
        let mut header_only = Registry::new();
        header_only
            .register_family(FamilyDesc::gauge("gateway_instance_cpu", "CPU usage"))
            .unwrap();

        let mut registry = Registry::new();
        registry.register_family(cpu_desc()).unwrap();
        registry
            .merge_family(header_only.family("gateway_instance_cpu").unwrap())
            .unwrap();
        assert_eq!(
            registry.family("gateway_instance_cpu").unwrap().label_names(),
            ["instance"]
        );
    }

    #[test]
    fn test_register_duplicate_label_names() {
        let mut registry = Registry::new();
        let desc = FamilyDesc::gauge("dup", "Dup").labels(&["a", "a"]);
        assert!(registry.register_family(desc).is_err());
    }

    #[test]
    fn test_set_overwrites_same_label_set() {
        let mut registry = Registry::new();
        registry.register_family(cpu_desc()).unwrap();
        let labels = LabelSet::instance("instance-1");
        registry.set_sample("gateway_instance_cpu", labels.clone(), 5.0).unwrap();
        registry.set_sample("gateway_instance_cpu", labels.clone(), 3.0).unwrap();

        let family = registry.family("gateway_instance_cpu").unwrap();
        assert_eq!(family.len(), 1);
        assert_eq!(registry.get_sample("gateway_instance_cpu", &labels).unwrap(), 3.0);
    }

    #[test]
    fn test_samples_keep_insertion_order() {
        let mut registry = Registry::new();
        registry.register_family(cpu_desc()).unwrap();
        for name in ["instance-50", "instance-1", "instance-7"] {
            registry
                .set_sample("gateway_instance_cpu", LabelSet::instance(name), 1.0)
                .unwrap();
        }
        let order: Vec<_> = registry
            .family("gateway_instance_cpu")
            .unwrap()
            .samples()
            .iter()
            .map(|s| s.labels.get("instance").unwrap().to_string())
            .collect();
        assert_eq!(order, ["instance-50", "instance-1", "instance-7"]);
    }

    #[test]
    fn test_label_set_equality_ignores_order() {
        let a = LabelSet::new().with("service", "Petstore").with("instance", "i-1");
        let b = LabelSet::instance_service("i-1", "Petstore");
        assert_eq!(a, b);
    }

    #[test]
    fn test_set_rejects_wrong_labels() {
        let mut registry = Registry::new();
        registry.register_family(cpu_desc()).unwrap();
        let err = registry
            .set_sample(
                "gateway_instance_cpu",
                LabelSet::instance_service("i-1", "Petstore"),
                1.0,
            )
            .unwrap_err();
        assert!(matches!(err, MetricsError::LabelMismatch { .. }));
    }

    #[test]
    fn test_get_sample_not_found() {
        let mut registry = Registry::new();
        assert!(matches!(
            registry.get_sample("missing", &LabelSet::new()),
            Err(MetricsError::NotFound { .. })
        ));
        registry.register_family(cpu_desc()).unwrap();
        assert!(matches!(
            registry.get_sample("gateway_instance_cpu", &LabelSet::instance("x")),
            Err(MetricsError::SampleNotFound { .. })
        ));
    }

    #[test]
    fn test_inc_starts_from_zero() {
        let mut registry = Registry::new();
        registry
            .register_family(FamilyDesc::counter("hits", "Hits").labels(&["instance"]))
            .unwrap();
        let labels = LabelSet::instance("i-1");
        registry.inc_sample("hits", labels.clone(), 2.0).unwrap();
        registry.inc_sample("hits", labels.clone(), 3.0).unwrap();
        assert_eq!(registry.get_sample("hits", &labels).unwrap(), 5.0);
    }

    #[test]
    fn test_shared_registry_clones_share_state() {
        let shared = SharedRegistry::new();
        let other = shared.clone();
        shared.write().register_family(cpu_desc()).unwrap();
        assert_eq!(other.read().len(), 1);
        assert!(shared.ptr_eq(&other));
    }
}
