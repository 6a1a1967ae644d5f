//! Framework version parsing and ranges.
//!
//! Declared versions come from build metadata and are Maven-flavoured:
//! `0.6.2`, `1.0`, `2.0.0-rc9`, `1.3.0-SNAPSHOT`, `1.3.0.Final`. They are
//! read leniently into semver so they can be ordered.

use crate::error::{Error, Result};
use semver::{BuildMetadata, Prerelease, Version};
use std::fmt;

/// Newest `major.minor` series the built-in adapters were written against.
pub const MAX_SUPPORTED_SERIES: (u64, u64) = (4, 0);

/// Qualifiers Maven orders the same as a plain release.
const RELEASE_QUALIFIERS: &[&str] = &["final", "ga", "release"];

/// Parse a declared framework version.
///
/// Up to three leading numbers form `major.minor.patch`, missing ones are
/// zero. Whatever follows is the qualifier: a purely numeric tail such as
/// the `.1` of `1.0.0.1` becomes build metadata, `Final`/`GA`/`RELEASE` are
/// dropped, anything else becomes the pre-release. Only a version with no
/// leading number at all is rejected.
pub fn parse(raw: &str) -> Result<Version> {
    let raw = raw.trim();
    let invalid = |message: &str| Error::InvalidVersion {
        version: raw.to_string(),
        message: message.to_string(),
    };

    let mut numbers = Vec::with_capacity(3);
    let mut rest = raw;
    while numbers.len() < 3 {
        let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        if digits == 0 {
            break;
        }
        let number: u64 = rest[..digits]
            .parse()
            .map_err(|_| invalid(&format!("'{}' is out of range", &rest[..digits])))?;
        numbers.push(number);
        rest = &rest[digits..];
        match rest.strip_prefix('.') {
            Some(next) if next.starts_with(|c: char| c.is_ascii_digit()) => rest = next,
            _ => break,
        }
    }
    if numbers.is_empty() {
        return Err(invalid("no leading version number"));
    }

    let component = |i: usize| numbers.get(i).copied().unwrap_or(0);
    let mut version = Version::new(component(0), component(1), component(2));

    let identifiers = qualifier_identifiers(rest);
    if identifiers.is_empty() {
        return Ok(version);
    }
    let joined = identifiers.join(".");
    if identifiers
        .iter()
        .all(|id| id.chars().all(|c| c.is_ascii_digit()))
    {
        version.build = BuildMetadata::new(&joined).map_err(|e| invalid(&e.to_string()))?;
    } else if !RELEASE_QUALIFIERS
        .iter()
        .any(|q| joined.eq_ignore_ascii_case(q))
    {
        version.pre = Prerelease::new(&joined).map_err(|e| invalid(&e.to_string()))?;
    }
    Ok(version)
}

/// Split a qualifier into semver identifiers, e.g. `-rc.01` into `rc`, `1`.
fn qualifier_identifiers(qualifier: &str) -> Vec<String> {
    qualifier
        .split(['.', '-', '_', '+'])
        .map(|id| id.chars().filter(char::is_ascii_alphanumeric).collect::<String>())
        .filter(|id| !id.is_empty())
        .map(|id| {
            if id.chars().all(|c| c.is_ascii_digit()) {
                let trimmed = id.trim_start_matches('0');
                if trimmed.is_empty() { "0".to_string() } else { trimmed.to_string() }
            } else {
                id
            }
        })
        .collect()
}

/// Whether the built-in adapters are known to handle `version`.
#[must_use]
pub fn can_support_version(version: &Version) -> bool {
    (version.major, version.minor) <= MAX_SUPPORTED_SERIES
}

/// Human-readable form of [`MAX_SUPPORTED_SERIES`].
#[must_use]
pub fn max_supported_display() -> String {
    format!("{}.{}.x", MAX_SUPPORTED_SERIES.0, MAX_SUPPORTED_SERIES.1)
}

/// Half-open range of release versions, `[from, until)`.
///
/// Pre-release qualifiers are ignored when testing membership so that
/// `1.0.0-rc3` belongs to the same family as `1.0.0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    /// Inclusive lower bound.
    pub from: Version,
    /// Exclusive upper bound.
    pub until: Version,
}

impl VersionRange {
    /// Create a range from `major.minor` pairs.
    #[must_use]
    pub fn series(from: (u64, u64), until: (u64, u64)) -> Self {
        Self {
            from: Version::new(from.0, from.1, 0),
            until: Version::new(until.0, until.1, 0),
        }
    }

    /// Whether `version` falls into this range.
    #[must_use]
    pub fn contains(&self, version: &Version) -> bool {
        let base = release(version);
        base >= self.from && base < self.until
    }

    /// Whether `version` is at or past the upper bound.
    #[must_use]
    pub fn ends_before(&self, version: &Version) -> bool {
        release(version) >= self.until
    }

    /// Whether `version` is before the lower bound.
    #[must_use]
    pub fn starts_after(&self, version: &Version) -> bool {
        release(version) < self.from
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.from, self.until)
    }
}

fn release(version: &Version) -> Version {
    Version::new(version.major, version.minor, version.patch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_version() {
        assert_eq!(parse("0.6.2").unwrap(), Version::new(0, 6, 2));
    }

    #[test]
    fn test_parse_pads_missing_components() {
        assert_eq!(parse("1.0").unwrap(), Version::new(1, 0, 0));
        assert_eq!(parse("2").unwrap(), Version::new(2, 0, 0));
    }

    #[test]
    fn test_parse_qualifier() {
        let v = parse("1.3.0-SNAPSHOT").unwrap();
        assert_eq!((v.major, v.minor, v.patch), (1, 3, 0));
        assert_eq!(v.pre.as_str(), "SNAPSHOT");

        let rc = parse("2.0.0-rc9").unwrap();
        assert!(rc < Version::new(2, 0, 0));
    }

    #[test]
    fn test_parse_maven_qualifiers() {
        assert_eq!(parse("1.3.0.Final").unwrap(), Version::new(1, 3, 0));
        assert_eq!(parse("0.7.1-GA").unwrap(), Version::new(0, 7, 1));

        let rc = parse("2.0.0-rc.01").unwrap();
        assert_eq!((rc.major, rc.minor, rc.patch), (2, 0, 0));
        assert_eq!(rc.pre.as_str(), "rc.1");

        let fourth = parse("1.0.0.1").unwrap();
        assert_eq!((fourth.major, fourth.minor, fourth.patch), (1, 0, 0));
        assert_eq!(fourth.build.as_str(), "1");

        assert_eq!(parse("1.0-").unwrap(), Version::new(1, 0, 0));
        assert_eq!(parse("2.0.0rc1").unwrap().pre.as_str(), "rc1");
    }

    #[test]
    fn test_parse_rejects_versions_without_numbers() {
        assert!(parse("").is_err());
        assert!(parse("one.two").is_err());
        assert!(parse("latest").is_err());
        assert!(parse("99999999999999999999999").is_err());
    }

    #[test]
    fn test_can_support_version() {
        assert!(can_support_version(&Version::new(0, 6, 2)));
        assert!(can_support_version(&Version::new(4, 0, 12)));
        assert!(!can_support_version(&Version::new(4, 1, 0)));
        assert!(!can_support_version(&Version::new(5, 0, 0)));
        assert_eq!(max_supported_display(), "4.0.x");
    }

    #[test]
    fn test_range_contains_ignores_prerelease() {
        let range = VersionRange::series((1, 0), (4, 1));
        assert!(range.contains(&parse("1.0.0-rc3").unwrap()));
        assert!(range.contains(&Version::new(4, 0, 9)));
        assert!(!range.contains(&Version::new(4, 1, 0)));
        assert!(!range.contains(&Version::new(0, 9, 4)));
    }

    #[test]
    fn test_range_position() {
        let range = VersionRange::series((0, 7), (1, 0));
        assert!(range.starts_after(&Version::new(0, 6, 2)));
        assert!(range.ends_before(&Version::new(1, 0, 0)));
        assert!(!range.starts_after(&Version::new(0, 8, 0)));
        assert_eq!(range.to_string(), "[0.7.0, 1.0.0)");
    }
}
