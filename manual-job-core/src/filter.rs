//! Inclusion/exclusion rules applied to every discovered file.
//!
//! Rules come from the `filters` section of the config as plain strings ([`FilterSection`])
//! and are compiled once into a [`FilterConfig`] before discovery starts. A bad pattern or
//! date is a configuration error, reported before any network call is made.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::source_file::SourceFile;

/// `filters` section as written in the config file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterSection {
    #[serde(default)]
    pub inclusions: Option<InclusionSection>,
    #[serde(default)]
    pub exclusions: Option<ExclusionSection>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InclusionSection {
    #[serde(default)]
    pub relative_file_path: Option<String>,
    #[serde(default)]
    pub last_modified_before: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExclusionSection {
    #[serde(default)]
    pub relative_file_path: Option<String>,
}

#[derive(Error, Debug)]
pub enum FilterConfigError {
    #[error("invalid relative_file_path pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid last_modified_before {value:?}: expected RFC 3339 or YYYY-MM-DD")]
    InvalidDate { value: String },
}

/// Compiled filter rules. Immutable for the whole run.
#[derive(Debug, Clone, Default)]
pub struct FilterConfig {
    pub inclusion: InclusionFilter,
    pub exclusion: ExclusionFilter,
}

#[derive(Debug, Clone, Default)]
pub struct InclusionFilter {
    pub relative_file_path: Option<Regex>,
    pub last_modified_before: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct ExclusionFilter {
    pub relative_file_path: Option<Regex>,
}

impl FilterConfig {
    /// Compile the raw config section. Empty strings count as "not configured".
    pub fn compile(section: &FilterSection) -> Result<Self, FilterConfigError> {
        let inclusions = section.inclusions.clone().unwrap_or_default();
        let exclusions = section.exclusions.clone().unwrap_or_default();

        Ok(FilterConfig {
            inclusion: InclusionFilter {
                relative_file_path: compile_pattern(inclusions.relative_file_path.as_deref())?,
                last_modified_before: match non_empty(inclusions.last_modified_before.as_deref()) {
                    Some(raw) => Some(parse_timestamp(raw)?),
                    None => None,
                },
            },
            exclusion: ExclusionFilter {
                relative_file_path: compile_pattern(exclusions.relative_file_path.as_deref())?,
            },
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn compile_pattern(pattern: Option<&str>) -> Result<Option<Regex>, FilterConfigError> {
    match pattern.filter(|p| !p.is_empty()) {
        Some(p) => Regex::new(p)
            .map(Some)
            .map_err(|source| FilterConfigError::InvalidPattern {
                pattern: p.to_string(),
                source,
            }),
        None => Ok(None),
    }
}

/// Parse a filter bound: RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS` (taken as UTC) or a bare
/// date (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, FilterConfigError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| FilterConfigError::InvalidDate {
            value: raw.to_string(),
        })
}

/// Decide whether `file` belongs in the delivery.
///
/// Exclusion is checked first and wins over inclusion. A file without a known
/// modification time is never rejected by the date bound.
pub fn include(file: &SourceFile, config: &FilterConfig) -> bool {
    if let Some(pattern) = &config.exclusion.relative_file_path {
        if pattern.is_match(&file.relative_path) {
            debug!(path = %file.relative_path, %pattern, "Excluded by exclusion pattern");
            return false;
        }
    }
    if let Some(pattern) = &config.inclusion.relative_file_path {
        if !pattern.is_match(&file.relative_path) {
            debug!(path = %file.relative_path, %pattern, "Excluded: inclusion pattern not matched");
            return false;
        }
    }
    if let (Some(bound), Some(modified)) = (
        config.inclusion.last_modified_before,
        file.last_modified_on,
    ) {
        if modified > bound {
            debug!(path = %file.relative_path, %modified, %bound, "Excluded: modified after bound");
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_file::normalize;

    fn section(include: Option<&str>, before: Option<&str>, exclude: Option<&str>) -> FilterSection {
        FilterSection {
            inclusions: Some(InclusionSection {
                relative_file_path: include.map(String::from),
                last_modified_before: before.map(String::from),
            }),
            exclusions: Some(ExclusionSection {
                relative_file_path: exclude.map(String::from),
            }),
        }
    }

    fn at(raw: &str) -> Option<DateTime<Utc>> {
        Some(parse_timestamp(raw).unwrap())
    }

    #[test]
    fn no_rules_accepts_everything() {
        let config = FilterConfig::compile(&FilterSection::default()).unwrap();
        assert!(include(&normalize("/anything.bin", 0, None), &config));
    }

    #[test]
    fn inclusion_pattern_is_unanchored() {
        let config = FilterConfig::compile(&section(Some("dailies"), None, None)).unwrap();
        assert!(include(&normalize("/show/dailies/a.mov", 1, None), &config));
        assert!(!include(&normalize("/show/finals/a.mov", 1, None), &config));
    }

    #[test]
    fn exclusion_wins_over_inclusion() {
        let config = FilterConfig::compile(&section(Some(r"\.mov$"), None, Some("/tmp/"))).unwrap();
        assert!(!include(&normalize("/tmp/a.mov", 1, None), &config));
        assert!(include(&normalize("/out/a.mov", 1, None), &config));
    }

    #[test]
    fn modified_before_bound() {
        let config = FilterConfig::compile(&section(None, Some("2024-01-01"), None)).unwrap();
        assert!(!include(&normalize("/new", 1, at("2024-06-01")), &config));
        assert!(include(&normalize("/old", 1, at("2023-01-01")), &config));
        // Exactly on the bound is not "after" it.
        assert!(include(&normalize("/edge", 1, at("2024-01-01T00:00:00Z")), &config));
        assert!(include(&normalize("/unknown", 1, None), &config));
    }

    #[test]
    fn empty_strings_mean_unconfigured() {
        let config = FilterConfig::compile(&section(Some(""), Some(" "), Some(""))).unwrap();
        assert!(config.inclusion.relative_file_path.is_none());
        assert!(config.inclusion.last_modified_before.is_none());
        assert!(config.exclusion.relative_file_path.is_none());
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let err = FilterConfig::compile(&section(Some("(unclosed"), None, None)).unwrap_err();
        assert!(matches!(err, FilterConfigError::InvalidPattern { .. }));
    }

    #[test]
    fn invalid_date_is_reported() {
        let err = FilterConfig::compile(&section(None, Some("last tuesday"), None)).unwrap_err();
        assert!(matches!(err, FilterConfigError::InvalidDate { .. }));
    }

    #[test]
    fn parses_offset_timestamps_to_utc() {
        let ts = parse_timestamp("2024-01-01T02:00:00+02:00").unwrap();
        assert_eq!(ts, parse_timestamp("2024-01-01").unwrap());
    }
}
