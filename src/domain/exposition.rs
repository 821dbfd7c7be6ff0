//! Text Exposition Format
//!
//! Renders a [`Registry`] into the line-oriented Prometheus text format
//! and parses that format back. Output order follows registry insertion
//! order only, so rendering the same state twice is byte-identical.
//!
//! ```text
//! # HELP gateway_instance_cpu CPU usage of the API-Gateway instance
//! # TYPE gateway_instance_cpu gauge
//! gateway_instance_cpu{instance="instance-1"} 1
//! ```

use std::collections::HashMap;

use super::error::MetricsError;
use super::registry::{FamilyDesc, LabelSet, MetricFamily, MetricKind, Registry};

/// Render every family of `registry`, in registration order.
///
/// Families without samples still emit their HELP and TYPE lines.
pub fn render(registry: &Registry) -> String {
    let mut out = String::new();
    for family in registry.families() {
        render_family(&mut out, family);
    }
    out
}

fn render_family(out: &mut String, family: &MetricFamily) {
    let name = family.name();
    out.push_str(&format!("# HELP {name} {}\n", escape_help(family.help())));
    out.push_str(&format!("# TYPE {name} {}\n", family.kind()));

    for sample in family.samples() {
        out.push_str(name);
        if !family.label_names().is_empty() {
            out.push('{');
            for (i, key) in family.label_names().iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                let value = sample.labels.get(key).unwrap_or_default();
                out.push_str(&format!("{key}=\"{}\"", escape_label_value(value)));
            }
            out.push('}');
        }
        out.push(' ');
        out.push_str(&format_value(sample.value));
        out.push('\n');
    }
}

fn escape_help(help: &str) -> String {
    help.replace('\\', "\\\\").replace('\n', "\\n")
}

fn escape_label_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "+Inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        format!("{value}")
    }
}

fn parse_value(token: &str) -> Option<f64> {
    match token {
        "NaN" => Some(f64::NAN),
        "+Inf" => Some(f64::INFINITY),
        "-Inf" => Some(f64::NEG_INFINITY),
        other => other.parse().ok(),
    }
}

#[derive(Default)]
struct PendingFamily {
    name: String,
    help: String,
    kind: Option<MetricKind>,
    first_line: usize,
    samples: Vec<(Vec<(String, String)>, f64)>,
}

/// Parse exposition text into a registry.
///
/// Only gauge and counter families are accepted. Label names are taken
/// from the first sample of each family, in the order they appear.
/// Comments other than HELP/TYPE, blank lines and sample timestamps are
/// ignored.
///
/// # Errors
/// `Parse` for malformed lines or samples of an undeclared family,
/// `UnsupportedType` for any other TYPE, and the registry errors for
/// inconsistent label sets.
pub fn parse(text: &str) -> Result<Registry, MetricsError> {
    let mut pending: Vec<PendingFamily> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    let mut entry = |name: &str, line: usize| -> usize {
        *index.entry(name.to_string()).or_insert_with(|| {
            pending.push(PendingFamily {
                name: name.to_string(),
                first_line: line,
                ..PendingFamily::default()
            });
            pending.len() - 1
        })
    };

    let mut samples: Vec<(usize, usize, Vec<(String, String)>, f64)> = Vec::new();
    let mut help: Vec<(usize, String)> = Vec::new();
    let mut kinds: Vec<(usize, usize, String)> = Vec::new();

    for (i, raw) in text.lines().enumerate() {
        let lineno = i + 1;
        let line = raw.trim_start();
        if line.trim_end().is_empty() {
            continue;
        }

        if let Some(rest) = line.strip_prefix("# HELP ") {
            // Help text keeps trailing whitespace.
            let (name, help_text) = rest.split_once(' ').unwrap_or((rest, ""));
            help.push((entry(name, lineno), unescape_help(help_text)));
            continue;
        }

        let line = line.trim_end();
        if let Some(rest) = line.strip_prefix("# TYPE ") {
            let (name, kind) = rest
                .split_once(' ')
                .ok_or_else(|| MetricsError::parse(lineno, "TYPE line without a type"))?;
            kinds.push((entry(name, lineno), lineno, kind.trim().to_string()));
        } else if line.starts_with('#') {
            continue;
        } else {
            let (name, labels, value) = parse_sample(line, lineno)?;
            samples.push((entry(&name, lineno), lineno, labels, value));
        }
    }

    for (family, help_text) in help {
        pending[family].help = help_text;
    }
    for (family, lineno, kind) in kinds {
        let parsed = kind
            .parse::<MetricKind>()
            .map_err(|kind| MetricsError::UnsupportedType {
                name: pending[family].name.clone(),
                kind,
            })?;
        if pending[family].kind.is_some_and(|k| k != parsed) {
            return Err(MetricsError::parse(lineno, "conflicting TYPE lines"));
        }
        pending[family].kind = Some(parsed);
    }
    for (family, lineno, labels, value) in samples {
        if pending[family].kind.is_none() {
            return Err(MetricsError::parse(
                lineno,
                format!("sample for undeclared family {}", pending[family].name),
            ));
        }
        pending[family].samples.push((labels, value));
    }

    let mut registry = Registry::new();
    for family in pending {
        let kind = family.kind.ok_or_else(|| {
            MetricsError::parse(
                family.first_line,
                format!("family {} has no TYPE line", family.name),
            )
        })?;
        let label_names: Vec<&str> = family
            .samples
            .first()
            .map(|(labels, _)| labels.iter().map(|(k, _)| k.as_str()).collect())
            .unwrap_or_default();

        let desc = FamilyDesc {
            name: family.name.clone(),
            help: family.help.clone(),
            kind,
            label_names: Vec::new(),
        }
        .labels(&label_names);

        let target = registry.register_family(desc)?;
        for (labels, value) in &family.samples {
            target.set(labels.iter().cloned().collect::<LabelSet>(), *value)?;
        }
    }

    Ok(registry)
}

fn unescape_help(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

type ParsedSample = (String, Vec<(String, String)>, f64);

fn parse_sample(line: &str, lineno: usize) -> Result<ParsedSample, MetricsError> {
    let name_end = line
        .find(|c: char| c == '{' || c.is_whitespace())
        .ok_or_else(|| MetricsError::parse(lineno, "sample without a value"))?;
    let name = &line[..name_end];
    if name.is_empty() {
        return Err(MetricsError::parse(lineno, "sample without a metric name"));
    }

    let mut rest = &line[name_end..];
    let mut labels = Vec::new();
    if let Some(inner) = rest.strip_prefix('{') {
        let (parsed, remaining) = parse_labels(inner, lineno)?;
        labels = parsed;
        rest = remaining;
    }

    let token = rest
        .split_whitespace()
        .next()
        .ok_or_else(|| MetricsError::parse(lineno, "sample without a value"))?;
    let value = parse_value(token)
        .ok_or_else(|| MetricsError::parse(lineno, format!("invalid sample value {token}")))?;

    Ok((name.to_string(), labels, value))
}

/// Parses `key="value",...}` and returns the pairs plus the text after `}`.
fn parse_labels(s: &str, lineno: usize) -> Result<(Vec<(String, String)>, &str), MetricsError> {
    let mut labels = Vec::new();
    let mut chars = s.char_indices().peekable();

    loop {
        while chars.next_if(|&(_, c)| c == ',' || c.is_whitespace()).is_some() {}

        let (start, c) = chars
            .next()
            .ok_or_else(|| MetricsError::parse(lineno, "unterminated label set"))?;
        if c == '}' {
            return Ok((labels, &s[start + 1..]));
        }

        let key_end = chars
            .by_ref()
            .find(|&(_, c)| c == '=')
            .map(|(i, _)| i)
            .ok_or_else(|| MetricsError::parse(lineno, "label without '='"))?;
        let key = s[start..key_end].trim();

        if chars.next().map(|(_, c)| c) != Some('"') {
            return Err(MetricsError::parse(lineno, format!("label {key} value is not quoted")));
        }

        let mut value = String::new();
        let mut closed = false;
        while let Some((_, c)) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, other)) => value.push(other),
                    None => break,
                },
                '"' => {
                    closed = true;
                    break;
                }
                other => value.push(other),
            }
        }
        if !closed {
            return Err(MetricsError::parse(lineno, format!("label {key} value is not terminated")));
        }

        labels.push((key.to_string(), value));
    }
}
