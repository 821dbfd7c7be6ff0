//! Registry Merger
//!
//! Combines independently built registries into one registry for a
//! unified scrape. Sources are applied in order: a family seen again is
//! re-registered (identical metadata) or rejected (`Conflict`), and a
//! sample seen again under the exact same label set is overwritten by
//! the later source.

use tracing::{debug, instrument};

use crate::domain::{exposition, MetricsError, Registry};

/// Options recognised by [`merge_with_options`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOptions {
    /// Return the rendered exposition text instead of the registry.
    pub return_metrics: bool,
}

/// Result of a merge: the registry itself or its rendered text.
#[derive(Debug, Clone, PartialEq)]
pub enum Merged {
    /// The merged registry.
    Registry(Registry),
    /// The merged registry rendered in exposition format.
    Text(String),
}

impl Merged {
    /// The registry, when the merge was not asked to render.
    pub fn registry(&self) -> Option<&Registry> {
        match self {
            Self::Registry(registry) => Some(registry),
            Self::Text(_) => None,
        }
    }

    /// The rendered text, when the merge was asked to render.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Registry(_) => None,
            Self::Text(text) => Some(text),
        }
    }
}

/// Copy every family and sample of `source` into `target`.
///
/// # Errors
/// `Conflict` when `target` already holds a family of the same name with
/// different type, help or label names.
pub fn merge_into(target: &mut Registry, source: &Registry) -> Result<(), MetricsError> {
    for family in source.families() {
        target.merge_family(family)?;
    }
    Ok(())
}

/// Merge `sources` in order into a fresh registry.
///
/// # Errors
/// See [`merge_into`].
pub fn merge_registries<'a, I>(sources: I) -> Result<Registry, MetricsError>
where
    I: IntoIterator<Item = &'a Registry>,
{
    let mut target = Registry::new();
    for source in sources {
        merge_into(&mut target, source)?;
    }
    Ok(target)
}

/// Merge `sources` and optionally render the result.
///
/// # Errors
/// See [`merge_into`].
#[instrument(skip_all, fields(return_metrics = options.return_metrics))]
pub fn merge_with_options<'a, I>(sources: I, options: MergeOptions) -> Result<Merged, MetricsError>
where
    I: IntoIterator<Item = &'a Registry>,
{
    let merged = merge_registries(sources)?;
    debug!(
        families = merged.len(),
        samples = merged.sample_count(),
        "Registries merged"
    );
    Ok(finish(merged, options))
}

/// Wrap a merged registry according to `options`, rendering it when
/// `return_metrics` is set.
pub fn finish(merged: Registry, options: MergeOptions) -> Merged {
    if options.return_metrics {
        Merged::Text(exposition::render(&merged))
    } else {
        Merged::Registry(merged)
    }
}
