//! Upstream and Debian version parsing, ordering, and conversion.
//!
//! Upstream projects publish four kinds of versions, each with its own
//! grammar:
//!
//! - release:   `12.0.0`
//! - candidate: `12.0.0.0rc1` (the `.0` before `rc` is optional)
//! - beta:      `12.0.0.0b0` (likewise)
//! - snapshot:  `git describe --long --tags` output, `12.0.0-5-gabcdef`
//!
//! [`UpstreamVersion`] parses all four into one totally ordered value, and
//! converts each to the Debian upstream version used by the packaging
//! branches (`12.0.0~rc1`, `12.0.0+5-gabcdef.1-1ubuntu0`, ...).
//! [`DebianVersion`] implements native Debian ordering
//! (`epoch:upstream-revision`, `~` sorts before everything) for deciding
//! whether a resolved version is newer than what is already packaged.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::VersionError;

// ---------------------------------------------------------------------------
// Release types
// ---------------------------------------------------------------------------

/// The kind of upstream artifact to import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseType {
    Release,
    Candidate,
    Beta,
    Snapshot,
    /// Resolved to a concrete type at run time by probing resolvers in
    /// priority order (release > candidate > beta > snapshot).
    Auto,
}

impl ReleaseType {
    /// Concrete types in auto-probe priority order.
    pub const PRIORITY: [ReleaseType; 4] = [
        ReleaseType::Release,
        ReleaseType::Candidate,
        ReleaseType::Beta,
        ReleaseType::Snapshot,
    ];
}

impl fmt::Display for ReleaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Release => write!(f, "release"),
            Self::Candidate => write!(f, "candidate"),
            Self::Beta => write!(f, "beta"),
            Self::Snapshot => write!(f, "snapshot"),
            Self::Auto => write!(f, "auto"),
        }
    }
}

impl FromStr for ReleaseType {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "release" => Ok(Self::Release),
            "candidate" => Ok(Self::Candidate),
            "beta" => Ok(Self::Beta),
            "snapshot" => Ok(Self::Snapshot),
            "auto" => Ok(Self::Auto),
            other => Err(VersionError::InvalidFormat {
                kind: "release type".into(),
                raw: other.into(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Upstream versions
// ---------------------------------------------------------------------------

/// Pre-release / snapshot phase of a version, relative to its numeric
/// components. A snapshot sorts just after the tag it is anchored at, so a
/// snapshot on top of a candidate still sorts before the final release,
/// matching the Debian `~` ordering of the converted strings.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Phase {
    Beta(u64),
    Candidate(u64),
    Final,
    /// Development snapshot: the phase of the base tag, commits since it,
    /// and the abbreviated object hash from `git describe`.
    Snapshot {
        anchor: AnchorPhase,
        commits: u64,
        object: String,
    },
}

/// Phase of the tag a snapshot is anchored at.
#[derive(Debug, Clone, PartialEq, Eq)]
enum AnchorPhase {
    Beta(u64),
    Candidate(u64),
    Final,
}

impl Phase {
    /// Comparison key: anchor rank, anchor sequence, commits, object.
    fn key(&self) -> (u8, u64, u64, &str) {
        match self {
            Phase::Beta(n) => (0, *n, 0, ""),
            Phase::Candidate(n) => (1, *n, 0, ""),
            Phase::Final => (2, 0, 0, ""),
            Phase::Snapshot {
                anchor,
                commits,
                object,
            } => {
                let (rank, seq) = match anchor {
                    AnchorPhase::Beta(n) => (0, *n),
                    AnchorPhase::Candidate(n) => (1, *n),
                    AnchorPhase::Final => (2, 0),
                };
                (rank, seq, *commits, object)
            }
        }
    }
}

/// A parsed, comparable upstream version carrying its originating release
/// type and the raw string it was parsed from.
#[derive(Debug, Clone, Eq)]
pub struct UpstreamVersion {
    raw: String,
    release_type: ReleaseType,
    components: Vec<u64>,
    phase: Phase,
}

/// Equality must agree with [`Ord::cmp`], which pads missing trailing
/// components with zero (`1.2.3` equals `1.2.3.0`).
impl PartialEq for UpstreamVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl UpstreamVersion {
    /// Parse `raw` according to the grammar for `release_type`.
    ///
    /// `release_type` must be concrete; `Auto` is resolved by the caller
    /// before any version is parsed.
    pub fn parse(raw: &str, release_type: ReleaseType) -> Result<Self, VersionError> {
        let invalid = || VersionError::InvalidFormat {
            kind: release_type.to_string(),
            raw: raw.to_string(),
        };

        match release_type {
            ReleaseType::Release => {
                let re = Regex::new(r"^\d+(\.\d+)*$").unwrap();
                if !re.is_match(raw) {
                    return Err(invalid());
                }
                Ok(Self {
                    raw: raw.to_string(),
                    release_type,
                    components: parse_components(raw)?,
                    phase: Phase::Final,
                })
            }
            ReleaseType::Candidate | ReleaseType::Beta => {
                let marker = if release_type == ReleaseType::Candidate {
                    "rc"
                } else {
                    "b"
                };
                let re = Regex::new(&format!(r"^(\d+(?:\.\d+)*){marker}(\d+)$")).unwrap();
                let caps = re.captures(raw).ok_or_else(invalid)?;
                let components = parse_components(&caps[1])?;
                let seq: u64 = caps[2].parse().map_err(|_| invalid())?;
                let phase = if release_type == ReleaseType::Candidate {
                    Phase::Candidate(seq)
                } else {
                    Phase::Beta(seq)
                };
                Ok(Self {
                    raw: raw.to_string(),
                    release_type,
                    components,
                    phase,
                })
            }
            ReleaseType::Snapshot => {
                let (tag, commits, object) = split_describe(raw).ok_or_else(invalid)?;
                // The base tag may itself be a release, candidate, or beta;
                // its pre-release phase carries into the ordering.
                let base = detect_release_type(tag)
                    .and_then(|t| UpstreamVersion::parse(tag, t).ok())
                    .ok_or_else(invalid)?;
                let anchor = match base.phase {
                    Phase::Beta(n) => AnchorPhase::Beta(n),
                    Phase::Candidate(n) => AnchorPhase::Candidate(n),
                    _ => AnchorPhase::Final,
                };
                Ok(Self {
                    raw: raw.to_string(),
                    release_type,
                    components: base.components,
                    phase: Phase::Snapshot {
                        anchor,
                        commits,
                        object: object.to_string(),
                    },
                })
            }
            ReleaseType::Auto => Err(invalid()),
        }
    }

    /// The raw string this version was parsed from.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The release type this version was parsed as.
    pub fn release_type(&self) -> ReleaseType {
        self.release_type
    }

    /// Convert to the Debian upstream version string.
    ///
    /// `existing` is the Debian version already imported for this package,
    /// if any; it only affects snapshots, where re-importing the same
    /// describe output increments the counter after the object hash.
    pub fn to_debian(&self, existing: Option<&str>) -> Result<String, VersionError> {
        match self.release_type {
            ReleaseType::Release => Ok(convert_release_version(&self.raw)),
            ReleaseType::Candidate => convert_prerelease_version(&self.raw, "rc"),
            ReleaseType::Beta => convert_prerelease_version(&self.raw, "b"),
            ReleaseType::Snapshot => convert_snapshot_version(&self.raw, existing),
            ReleaseType::Auto => Err(VersionError::InvalidFormat {
                kind: "auto".into(),
                raw: self.raw.clone(),
            }),
        }
    }
}

impl fmt::Display for UpstreamVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl Ord for UpstreamVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_components(&self.components, &other.components)
            .then_with(|| self.phase.key().cmp(&other.phase.key()))
    }
}

impl PartialOrd for UpstreamVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Numeric component-by-component comparison; missing trailing components
/// compare as zero, so `1.2.3` equals `1.2.3.0`.
fn compare_components(a: &[u64], b: &[u64]) -> Ordering {
    let len = a.len().max(b.len());
    for i in 0..len {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        match x.cmp(&y) {
            Ordering::Equal => {}
            other => return other,
        }
    }
    Ordering::Equal
}

fn parse_components(s: &str) -> Result<Vec<u64>, VersionError> {
    s.split('.')
        .map(|c| {
            c.parse::<u64>().map_err(|_| VersionError::InvalidFormat {
                kind: "numeric".into(),
                raw: s.to_string(),
            })
        })
        .collect()
}

/// Split `git describe --long --tags` output into (tag, commits, object).
/// A leading `v` on the tag is dropped.
fn split_describe(raw: &str) -> Option<(&str, u64, &str)> {
    let re = Regex::new(r"^(.+?)-(\d+)-g([0-9a-f]+)$").unwrap();
    let caps = re.captures(raw)?;
    let tag = caps.get(1)?.as_str();
    let commits: u64 = caps.get(2)?.as_str().parse().ok()?;
    let object = caps.get(3)?.as_str();
    Some((tag.strip_prefix('v').unwrap_or(tag), commits, object))
}

// ---------------------------------------------------------------------------
// Debian conversion
// ---------------------------------------------------------------------------

/// `12.0.0.0` -> `12.0.0`; the trailing `.0` is dropped only when it is the
/// fourth component.
pub fn convert_release_version(upstream: &str) -> String {
    let parts: Vec<&str> = upstream.split('.').collect();
    if parts.len() == 4 && parts[3] == "0" {
        parts[..3].join(".")
    } else {
        upstream.to_string()
    }
}

/// `12.0.0.0rc1` -> `12.0.0~rc1`, `12.0.0b0` -> `12.0.0~b0`.
///
/// `marker` is `rc` or `b`. A `.0` fourth component before the marker is
/// dropped, matching the release conversion.
pub fn convert_prerelease_version(upstream: &str, marker: &str) -> Result<String, VersionError> {
    let re = Regex::new(&format!(r"^(.+?){marker}(\d+)$")).unwrap();
    let caps = re.captures(upstream).ok_or_else(|| VersionError::InvalidFormat {
        kind: if marker == "rc" { "candidate" } else { "beta" }.into(),
        raw: upstream.to_string(),
    })?;
    let version_part = &caps[1];
    let seq = &caps[2];

    let components: Vec<&str> = version_part.split('.').collect();
    let base = if components.len() >= 4 && components[components.len() - 1] == "0" {
        components[..components.len() - 1].join(".")
    } else {
        version_part.to_string()
    };
    Ok(format!("{base}~{marker}{seq}"))
}

/// Convert `git describe --long --tags` output to a Debian snapshot version:
/// `<tag>+<commits>-g<object>.<counter>-1ubuntu0`.
///
/// The counter starts at 1; when `existing` carries the same
/// `tag+commits-g<object>` stem its counter is incremented, so re-importing
/// the same snapshot yields a distinct, strictly newer Debian version.
pub fn convert_snapshot_version(
    describe: &str,
    existing: Option<&str>,
) -> Result<String, VersionError> {
    let (tag, commits, object) = split_describe(describe).ok_or_else(|| {
        VersionError::InvalidFormat {
            kind: "snapshot".into(),
            raw: describe.to_string(),
        }
    })?;

    // Pre-release markers in the tag carry over into the Debian form.
    let tag = if tag.contains('b') || tag.contains("rc") {
        convert_prerelease_version(tag, "rc")
            .or_else(|_| convert_prerelease_version(tag, "b"))
            .unwrap_or_else(|_| tag.to_string())
    } else {
        tag.to_string()
    };

    let stem = format!("{tag}+{commits}-g{object}");
    let mut counter: u64 = 1;
    if let Some(existing) = existing {
        if let Some(rest) = existing.strip_prefix(&stem) {
            // Counter appears right after the object hash, with or without
            // the separating dot (older imports lacked it).
            let re = Regex::new(r"^\.?(\d+)-").unwrap();
            if let Some(caps) = re.captures(rest) {
                counter = caps[1].parse::<u64>().unwrap_or(0) + 1;
            }
        }
    }

    Ok(format!("{stem}.{counter}-1ubuntu0"))
}

/// Detect the release type of an upstream tag, for auto probing.
///
/// Returns `None` when the tag does not look like any known version form.
pub fn detect_release_type(tag: &str) -> Option<ReleaseType> {
    let tag = tag.strip_prefix('v').unwrap_or(tag);
    if UpstreamVersion::parse(tag, ReleaseType::Beta).is_ok() {
        Some(ReleaseType::Beta)
    } else if UpstreamVersion::parse(tag, ReleaseType::Candidate).is_ok() {
        Some(ReleaseType::Candidate)
    } else if UpstreamVersion::parse(tag, ReleaseType::Release).is_ok() {
        Some(ReleaseType::Release)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Debian versions
// ---------------------------------------------------------------------------

/// A Debian package version: `[epoch:]upstream[-revision]`.
///
/// Comparison follows the native dpkg ordering: numeric epoch first, then
/// the upstream part, then the revision, each compared with the alternating
/// non-digit/digit split where `~` sorts before everything including the
/// empty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebianVersion {
    epoch: u64,
    upstream: String,
    revision: String,
}

impl DebianVersion {
    pub fn parse(raw: &str) -> Result<Self, VersionError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(VersionError::InvalidDebianVersion(raw.to_string()));
        }

        let (epoch, rest) = match raw.split_once(':') {
            Some((e, rest)) => {
                let epoch = e
                    .parse::<u64>()
                    .map_err(|_| VersionError::InvalidDebianVersion(raw.to_string()))?;
                (epoch, rest)
            }
            None => (0, raw),
        };

        let (upstream, revision) = match rest.rsplit_once('-') {
            Some((u, r)) => (u.to_string(), r.to_string()),
            None => (rest.to_string(), String::new()),
        };

        if upstream.is_empty() {
            return Err(VersionError::InvalidDebianVersion(raw.to_string()));
        }

        Ok(Self {
            epoch,
            upstream,
            revision,
        })
    }

    /// The upstream half, without epoch or revision.
    pub fn upstream(&self) -> &str {
        &self.upstream
    }
}

impl fmt::Display for DebianVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.epoch > 0 {
            write!(f, "{}:", self.epoch)?;
        }
        write!(f, "{}", self.upstream)?;
        if !self.revision.is_empty() {
            write!(f, "-{}", self.revision)?;
        }
        Ok(())
    }
}

impl Ord for DebianVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.epoch
            .cmp(&other.epoch)
            .then_with(|| verrevcmp(&self.upstream, &other.upstream))
            .then_with(|| verrevcmp(&self.revision, &other.revision))
    }
}

impl PartialOrd for DebianVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// dpkg comparison of two bare upstream version strings (no epoch, no
/// revision).
pub fn compare_upstream(a: &str, b: &str) -> Ordering {
    verrevcmp(a, b)
}

/// dpkg character weight: `~` before end-of-string, letters before
/// non-letters, everything else by code point.
fn char_order(c: Option<char>) -> i32 {
    match c {
        None => 0,
        Some('~') => -1,
        Some(c) if c.is_ascii_alphabetic() => c as i32,
        Some(c) => c as i32 + 256,
    }
}

/// The dpkg `verrevcmp` algorithm: alternate comparing the non-digit prefix
/// character-by-character and the digit run numerically.
fn verrevcmp(a: &str, b: &str) -> Ordering {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (mut i, mut j) = (0, 0);

    while i < a.len() || j < b.len() {
        // Non-digit part.
        while (i < a.len() && !a[i].is_ascii_digit()) || (j < b.len() && !b[j].is_ascii_digit()) {
            let x = char_order(a.get(i).copied().filter(|c| !c.is_ascii_digit()));
            let y = char_order(b.get(j).copied().filter(|c| !c.is_ascii_digit()));
            match x.cmp(&y) {
                Ordering::Equal => {}
                other => return other,
            }
            if i < a.len() && !a[i].is_ascii_digit() {
                i += 1;
            }
            if j < b.len() && !b[j].is_ascii_digit() {
                j += 1;
            }
        }

        // Digit run, compared numerically (leading zeros skipped).
        while i < a.len() && a[i] == '0' {
            i += 1;
        }
        while j < b.len() && b[j] == '0' {
            j += 1;
        }
        let start_a = i;
        let start_b = j;
        while i < a.len() && a[i].is_ascii_digit() {
            i += 1;
        }
        while j < b.len() && b[j].is_ascii_digit() {
            j += 1;
        }
        match (i - start_a).cmp(&(j - start_b)) {
            Ordering::Equal => {}
            other => return other,
        }
        for (x, y) in a[start_a..i].iter().zip(b[start_b..j].iter()) {
            match x.cmp(y) {
                Ordering::Equal => {}
                other => return other,
            }
        }
    }

    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(raw: &str, t: ReleaseType) -> UpstreamVersion {
        UpstreamVersion::parse(raw, t).unwrap()
    }

    #[test]
    fn test_release_parse_and_order() {
        assert!(v("1.10.0", ReleaseType::Release) > v("1.9.0", ReleaseType::Release));
        assert!(v("2.0.0", ReleaseType::Release) > v("1.99.99", ReleaseType::Release));
        assert_eq!(
            v("1.2.3", ReleaseType::Release),
            v("1.2.3.0", ReleaseType::Release)
        );
        assert!(UpstreamVersion::parse("1.2.x", ReleaseType::Release).is_err());
        assert!(UpstreamVersion::parse("12.0.0rc1", ReleaseType::Release).is_err());
    }

    #[test]
    fn test_prerelease_before_final() {
        let beta = v("12.0.0.0b0", ReleaseType::Beta);
        let rc = v("12.0.0.0rc1", ReleaseType::Candidate);
        let rel = v("12.0.0", ReleaseType::Release);
        let prev = v("11.0.0", ReleaseType::Release);
        let next = v("13.0.0", ReleaseType::Release);

        assert!(beta < rc);
        assert!(rc < rel);
        assert!(rel < next);
        assert!(prev < beta);
    }

    #[test]
    fn test_prerelease_sibling_order() {
        assert!(
            v("12.0.0.0rc1", ReleaseType::Candidate) < v("12.0.0.0rc2", ReleaseType::Candidate)
        );
        assert!(v("12.0.0.0b0", ReleaseType::Beta) < v("12.0.0.0b10", ReleaseType::Beta));
    }

    #[test]
    fn test_snapshot_order() {
        let rel = v("12.0.0", ReleaseType::Release);
        let snap5 = v("12.0.0-5-gabcdef", ReleaseType::Snapshot);
        let snap9 = v("12.0.0-9-g123abc", ReleaseType::Snapshot);
        let next = v("13.0.0", ReleaseType::Release);

        // A snapshot describes commits after its base tag.
        assert!(rel < snap5);
        assert!(snap5 < snap9);
        assert!(snap9 < next);
    }

    #[test]
    fn test_prerelease_snapshot_orders_before_final() {
        let rc = v("12.0.0.0rc1", ReleaseType::Candidate);
        let rc_snap = v("12.0.0.0rc1-3-gabcdef", ReleaseType::Snapshot);
        let rel = v("12.0.0", ReleaseType::Release);
        let beta_snap = v("12.0.0.0b0-2-g123abc", ReleaseType::Snapshot);

        // A snapshot on top of a pre-release tag stays before the final
        // release, like the Debian form it converts to.
        assert!(rc < rc_snap);
        assert!(rc_snap < rel);
        assert!(beta_snap < rc);
        assert_eq!(
            rc_snap.to_debian(None).unwrap(),
            "12.0.0~rc1+3-gabcdef.1-1ubuntu0"
        );
        assert_eq!(
            compare_upstream("12.0.0~rc1+3-gabcdef.1", "12.0.0"),
            Ordering::Less
        );
    }

    #[test]
    fn test_order_is_total() {
        // Antisymmetry and transitivity spot checks across types.
        let a = v("12.0.0.0b1", ReleaseType::Beta);
        let b = v("12.0.0.0rc1", ReleaseType::Candidate);
        let c = v("12.0.0", ReleaseType::Release);
        assert_eq!(a.cmp(&b), b.cmp(&a).reverse());
        assert!(a < b && b < c && a < c);
    }

    #[test]
    fn test_convert_release() {
        assert_eq!(convert_release_version("12.0.0"), "12.0.0");
        assert_eq!(convert_release_version("12.0.0.0"), "12.0.0");
        assert_eq!(convert_release_version("12.0"), "12.0");
        assert_eq!(convert_release_version("1.2.3"), "1.2.3");
    }

    #[test]
    fn test_convert_candidate() {
        assert_eq!(
            convert_prerelease_version("12.0.0.0rc0", "rc").unwrap(),
            "12.0.0~rc0"
        );
        assert_eq!(
            convert_prerelease_version("12.0.0rc1", "rc").unwrap(),
            "12.0.0~rc1"
        );
        assert_eq!(
            convert_prerelease_version("1.2.3.0rc10", "rc").unwrap(),
            "1.2.3~rc10"
        );
        assert!(convert_prerelease_version("12.0.0", "rc").is_err());
    }

    #[test]
    fn test_convert_beta() {
        assert_eq!(
            convert_prerelease_version("12.0.0.0b0", "b").unwrap(),
            "12.0.0~b0"
        );
        assert_eq!(
            convert_prerelease_version("12.0.0b1", "b").unwrap(),
            "12.0.0~b1"
        );
        assert_eq!(
            convert_prerelease_version("1.2.3.4.0b2", "b").unwrap(),
            "1.2.3.4~b2"
        );
        assert!(convert_prerelease_version("12.0.0", "b").is_err());
    }

    #[test]
    fn test_convert_snapshot() {
        assert_eq!(
            convert_snapshot_version("12.0.0-5-gabcdef", None).unwrap(),
            "12.0.0+5-gabcdef.1-1ubuntu0"
        );
        assert_eq!(
            convert_snapshot_version("v12.0.0-5-gabcdef", None).unwrap(),
            "12.0.0+5-gabcdef.1-1ubuntu0"
        );
        assert!(convert_snapshot_version("invalid-format", None).is_err());
    }

    #[test]
    fn test_convert_snapshot_counter() {
        // Existing version without an explicit counter restarts at 1.
        assert_eq!(
            convert_snapshot_version("12.0.0-5-gabcdef", Some("12.0.0+5-gabcdef-1ubuntu0"))
                .unwrap(),
            "12.0.0+5-gabcdef.1-1ubuntu0"
        );
        // Existing counter increments.
        assert_eq!(
            convert_snapshot_version("12.0.0-5-gabcdef", Some("12.0.0+5-gabcdef.2-1ubuntu0"))
                .unwrap(),
            "12.0.0+5-gabcdef.3-1ubuntu0"
        );
        // Different stem means a fresh snapshot.
        assert_eq!(
            convert_snapshot_version("12.0.0-6-g999999", Some("12.0.0+5-gabcdef.2-1ubuntu0"))
                .unwrap(),
            "12.0.0+6-g999999.1-1ubuntu0"
        );
    }

    #[test]
    fn test_to_debian_round_trip() {
        let rc = v("12.0.0.0rc1", ReleaseType::Candidate);
        assert_eq!(rc.to_debian(None).unwrap(), "12.0.0~rc1");

        let snap = v("12.0.0-5-gabcdef", ReleaseType::Snapshot);
        assert_eq!(snap.to_debian(None).unwrap(), "12.0.0+5-gabcdef.1-1ubuntu0");
    }

    #[test]
    fn test_detect_release_type() {
        assert_eq!(detect_release_type("12.0.0"), Some(ReleaseType::Release));
        assert_eq!(detect_release_type("v12.0.0"), Some(ReleaseType::Release));
        assert_eq!(
            detect_release_type("12.0.0.0rc1"),
            Some(ReleaseType::Candidate)
        );
        assert_eq!(detect_release_type("12.0.0.0b0"), Some(ReleaseType::Beta));
        assert_eq!(detect_release_type("not-a-version"), None);
    }

    #[test]
    fn test_debian_version_order() {
        let d = |s: &str| DebianVersion::parse(s).unwrap();

        // Numeric, not lexical.
        assert!(d("1.10") > d("1.9"));
        // Tilde sorts before the final release.
        assert!(d("12.0.0~rc1-1") < d("12.0.0-1"));
        assert!(d("12.0.0~b0") < d("12.0.0~rc0"));
        // Epoch dominates.
        assert!(d("1:0.1") > d("9.9"));
        // Revision breaks ties.
        assert!(d("12.0.0-2") > d("12.0.0-1ubuntu0"));
        // Snapshot versions sort after their base release.
        assert!(d("12.0.0+5-gabcdef.1-1ubuntu0") > d("12.0.0-1"));
        assert!(d("12.0.0+5-gabcdef.2-1ubuntu0") > d("12.0.0+5-gabcdef.1-1ubuntu0"));
    }

    #[test]
    fn test_debian_version_parse() {
        let v = DebianVersion::parse("2:12.0.0~rc1-0ubuntu1").unwrap();
        assert_eq!(v.upstream(), "12.0.0~rc1");
        assert_eq!(v.to_string(), "2:12.0.0~rc1-0ubuntu1");

        assert!(DebianVersion::parse("").is_err());
        assert!(DebianVersion::parse("x:1.0").is_err());
    }
}
