//! Version tags and release selection.
//!
//! Packages are released by pushing tags of the form `V<major>.<minor>.<patch>`.
//! Tags of any other shape are not versions and never take part in selection.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A three-component release version.
///
/// Field order gives the derived `Ord` lexicographic semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "V{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// A tag that is not of the form `V<major>.<minor>.<patch>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionParseError(pub String);

impl fmt::Display for VersionParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid version tag '{}'. Expected 'V<major>.<minor>.<patch>'.",
            self.0
        )
    }
}

impl std::error::Error for VersionParseError {}

impl FromStr for Version {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || VersionParseError(s.to_string());

        let body = s.strip_prefix('V').ok_or_else(invalid)?;
        let parts: Vec<&str> = body.split('.').collect();
        if parts.len() != 3 {
            return Err(invalid());
        }

        let mut numbers = [0u64; 3];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            // u64::from_str would also take a leading '+'
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            *slot = part.parse().map_err(|_| invalid())?;
        }

        Ok(Version::new(numbers[0], numbers[1], numbers[2]))
    }
}

/// A parsed version together with the raw tag it was read from.
///
/// Checkouts always use `tag`, since `V01.2.3` and `V1.2.3` parse to the
/// same version but name different refs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedVersion {
    pub version: Version,
    pub tag: String,
}

/// What the caller asked to install.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VersionRequest {
    /// Highest version among the forge tags
    #[default]
    Latest,
    /// Exactly this version
    Exact(Version),
}

/// Version resolver - pure functions over raw tag lists.
pub struct VersionResolver;

impl VersionResolver {
    /// Parse raw tags into versions, ascending.
    ///
    /// Tags that are not versions are dropped. Tags that parse to the same
    /// version are duplicates; the first one listed wins.
    pub fn parse_tags<S: AsRef<str>>(tags: &[S]) -> Vec<TaggedVersion> {
        let mut versions: BTreeMap<Version, String> = BTreeMap::new();
        for tag in tags {
            let tag = tag.as_ref();
            match tag.parse::<Version>() {
                Ok(version) => {
                    versions.entry(version).or_insert_with(|| tag.to_string());
                }
                Err(_) => log::debug!("Ignoring non-version tag {:?}", tag),
            }
        }
        versions
            .into_iter()
            .map(|(version, tag)| TaggedVersion { version, tag })
            .collect()
    }

    /// The highest version among `tags`.
    pub fn latest<S: AsRef<str>>(tags: &[S]) -> Option<TaggedVersion> {
        Self::parse_tags(tags).pop()
    }

    /// The tag carrying exactly `version`.
    pub fn find_exact<S: AsRef<str>>(tags: &[S], version: Version) -> Option<TaggedVersion> {
        Self::parse_tags(tags)
            .into_iter()
            .find(|t| t.version == version)
    }
}
