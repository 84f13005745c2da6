//! Lenient, channel-aware version ordering.
//!
//! A version string is split at the first `-` into a numeric core and an
//! optional pre-release tag. Cores are compared component-wise with missing
//! trailing components read as `0`. At an equal core a stable version sorts
//! above any pre-release, and two pre-releases are ordered by the trailing
//! number of their tag (`beta.3` > `beta.2`, a bare `beta` counts as `0`).
//!
//! Parsing never fails: components that are not non-negative integers are
//! read as `0`. Build metadata after `+` is ignored.

use std::{cmp::Ordering, fmt};

/// A parsed version string, ordered by the rules described in the module docs.
///
/// Equality follows the ordering, so `"1.2"` and `"1.2.0"` compare equal even
/// though [`ReleaseVersion::as_str`] keeps the original spelling.
#[derive(Debug, Clone)]
pub struct ReleaseVersion {
    raw: String,
    core: Vec<u64>,
    pre_release: Option<PreRelease>,
}

/// The part of a version after the first `-`, e.g. `beta.3`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreRelease {
    tag: String,
    number: u64,
}

impl PreRelease {
    fn parse(tag: &str) -> Self {
        let digits_start = tag.trim_end_matches(|c: char| c.is_ascii_digit()).len();
        let number = tag[digits_start..].parse().unwrap_or(0);
        Self {
            tag: tag.to_string(),
            number,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Trailing number of the tag, `0` when there is none.
    pub fn number(&self) -> u64 {
        self.number
    }
}

impl ReleaseVersion {
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        let without_build = trimmed.split_once('+').map_or(trimmed, |(version, _)| version);
        let (core, tag) = match without_build.split_once('-') {
            Some((core, tag)) => (core, Some(tag)),
            None => (without_build, None),
        };

        let core = core
            .split('.')
            .map(|component| component.trim().parse::<u64>().unwrap_or(0))
            .collect();

        Self {
            raw: input.to_string(),
            core,
            pre_release: tag.map(PreRelease::parse),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn core(&self) -> &[u64] {
        &self.core
    }

    pub fn pre_release(&self) -> Option<&PreRelease> {
        self.pre_release.as_ref()
    }

    pub fn is_pre_release(&self) -> bool {
        self.pre_release.is_some()
    }

    pub fn is_newer_than(&self, baseline: &ReleaseVersion) -> bool {
        self.cmp(baseline) == Ordering::Greater
    }
}

fn compare_cores(left: &[u64], right: &[u64]) -> Ordering {
    let len = left.len().max(right.len());
    (0..len)
        .map(|i| {
            let l = left.get(i).copied().unwrap_or(0);
            let r = right.get(i).copied().unwrap_or(0);
            l.cmp(&r)
        })
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

impl Ord for ReleaseVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_cores(&self.core, &other.core).then_with(|| {
            match (&self.pre_release, &other.pre_release) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(left), Some(right)) => left.number.cmp(&right.number),
            }
        })
    }
}

impl PartialOrd for ReleaseVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ReleaseVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ReleaseVersion {}

impl fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for ReleaseVersion {
    fn from(value: &str) -> Self {
        ReleaseVersion::parse(value)
    }
}

/// Whether `candidate` should replace `baseline`. Equal versions are never newer.
pub fn is_newer(candidate: &str, baseline: &str) -> bool {
    ReleaseVersion::parse(candidate).is_newer_than(&ReleaseVersion::parse(baseline))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: &[&str] = &[
        "0.0.1",
        "1",
        "1.0",
        "1.0.0",
        "1.0.1",
        "1.1.0-beta",
        "1.1.0-beta.1",
        "1.1.0-beta.3",
        "1.1.0-alpha.2",
        "1.1.0",
        "1.2.0-beta.5",
        "1.2.0",
        "1.10.0",
        "2.0.0+build.7",
        "2.0.0",
        "garbage",
        "",
        "1.x.3",
    ];

    #[test]
    fn test_numeric_core_ordering() {
        assert!(is_newer("1.0.1", "1.0.0"));
        assert!(is_newer("1.10.0", "1.9.9"));
        assert!(is_newer("2.0.0", "1.99.99"));
        assert!(!is_newer("1.0.0", "1.0.1"));
    }

    #[test]
    fn test_missing_components_are_zero() {
        assert!(!is_newer("1.2", "1.2.0"));
        assert!(!is_newer("1.2.0", "1.2"));
        assert!(is_newer("1.2.1", "1.2"));
        assert_eq!(ReleaseVersion::parse("1"), ReleaseVersion::parse("1.0.0"));
    }

    #[test]
    fn test_stable_beats_beta_at_equal_core() {
        assert!(is_newer("1.2.0", "1.2.0-beta.5"));
        assert!(!is_newer("1.2.0-beta.5", "1.2.0"));
        assert!(!is_newer("1.2.0", "1.2.0"));
    }

    #[test]
    fn test_beta_ordering_uses_trailing_number() {
        assert!(is_newer("1.2.0-beta.3", "1.2.0-beta.2"));
        assert!(!is_newer("1.2.0-beta.2", "1.2.0-beta.3"));
        assert!(is_newer("1.2.0-beta.1", "1.2.0-beta"));
        assert!(!is_newer("1.2.0-beta", "1.2.0-beta.0"));
        assert!(is_newer("1.2.0-alpha.4", "1.2.0-beta.3"));
    }

    #[test]
    fn test_higher_core_beats_stable() {
        assert!(is_newer("1.3.0-beta.1", "1.2.0"));
        assert!(!is_newer("1.2.0", "1.3.0-beta.1"));
    }

    #[test]
    fn test_malformed_versions_do_not_panic() {
        assert!(!is_newer("garbage", "0.0.0"));
        assert!(is_newer("1.0.0", "garbage"));
        assert!(is_newer("1.x.3", "1.0.2"));
        assert!(!is_newer("", ""));
        assert!(!is_newer("99999999999999999999999", "0"));
    }

    #[test]
    fn test_build_metadata_is_ignored() {
        assert!(!is_newer("2.0.0+build.7", "2.0.0"));
        assert!(!is_newer("2.0.0", "2.0.0+build.7"));
        let version = ReleaseVersion::parse("1.0.0-rc.2+build-3");
        assert_eq!(version.pre_release().map(PreRelease::number), Some(2));
    }

    #[test]
    fn test_ordering_is_total() {
        for a in SAMPLES {
            for b in SAMPLES {
                let forward = is_newer(a, b);
                let backward = is_newer(b, a);
                let equal = ReleaseVersion::parse(a) == ReleaseVersion::parse(b);
                let holding = [forward, backward, equal].iter().filter(|h| **h).count();
                assert_eq!(holding, 1, "exactly one relation must hold for {a:?} vs {b:?}");
            }
        }
    }

    #[test]
    fn test_ordering_is_transitive_over_samples() {
        let mut versions: Vec<ReleaseVersion> =
            SAMPLES.iter().map(|v| ReleaseVersion::parse(v)).collect();
        versions.sort();
        for pair in versions.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
        assert_eq!(versions.last().map(|v| v.core().to_vec()), Some(vec![2, 0, 0]));
    }

    #[test]
    fn test_original_spelling_is_kept() {
        let version = ReleaseVersion::parse("1.1.0-beta.3");
        assert_eq!(version.to_string(), "1.1.0-beta.3");
        assert_eq!(version.pre_release().map(PreRelease::tag), Some("beta.3"));
        assert!(version.is_pre_release());
    }
}
