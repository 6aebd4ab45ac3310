use shared::{DEFAULT_CLUSTERS, MAX_CLUSTERS, MIN_CLUSTERS};
use std::fmt;

use super::validator::ValidationError;

/// The `image` part of the form as it arrived, before any checks.
#[derive(Debug, Clone)]
pub struct ImageField {
    pub data: Vec<u8>,
    pub content_type: Option<String>,
    // Client-supplied, informational only. Never used to build a path.
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RawUpload {
    pub image: Option<ImageField>,
    pub num_clusters: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadPolicy {
    pub max_bytes: usize,
    pub allow_default_clusters: bool,
}

/// Number of clusters requested, guaranteed to lie in `MIN_CLUSTERS..=MAX_CLUSTERS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterCount(u8);

impl ClusterCount {
    pub const DEFAULT: ClusterCount = ClusterCount(DEFAULT_CLUSTERS as u8);

    pub fn new(value: i64) -> Result<Self, ValidationError> {
        if (MIN_CLUSTERS..=MAX_CLUSTERS).contains(&value) {
            Ok(ClusterCount(value as u8))
        } else {
            Err(ValidationError::InvalidClusterCount(value.to_string()))
        }
    }

    /// Blank or missing input falls back to the default only when `allow_default` is set.
    pub fn parse(raw: Option<&str>, allow_default: bool) -> Result<Self, ValidationError> {
        let trimmed = raw.map(str::trim).filter(|s| !s.is_empty());
        match trimmed {
            None if allow_default => Ok(Self::DEFAULT),
            None => Err(ValidationError::InvalidClusterCount("missing".into())),
            Some(text) => {
                let value = text
                    .parse::<i64>()
                    .map_err(|_| ValidationError::InvalidClusterCount(text.to_string()))?;
                Self::new(value)
            }
        }
    }
}

impl fmt::Display for ClusterCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct ValidatedUpload {
    pub data: Vec<u8>,
    pub content_type: String,
    pub file_name: Option<String>,
    pub clusters: ClusterCount,
}
