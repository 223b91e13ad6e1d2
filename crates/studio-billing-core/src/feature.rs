//! Billable feature types.
//!
//! Every billed action carries a feature tag identifying which generation
//! capability was used. The tags are the wire strings the frontend and the
//! price table share.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CostError;

/// A billable generation feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FeatureType {
    /// Kling v2.5 turbo text-to-video.
    KlingT2v,

    /// Kling v2.5 turbo image-to-video (imagine).
    KlingI2vImagine,

    /// Seedream 3.0 text-to-image.
    SeedreamT2i,

    /// Face-merge image compositing.
    MergeFace,
}

impl FeatureType {
    /// All known feature types.
    pub const ALL: [Self; 4] = [
        Self::KlingT2v,
        Self::KlingI2vImagine,
        Self::SeedreamT2i,
        Self::MergeFace,
    ];

    /// The wire tag for this feature.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::KlingT2v => "kling_v25_t2v",
            Self::KlingI2vImagine => "kling_v25_i2v_imagine",
            Self::SeedreamT2i => "seedream_30_t2i",
            Self::MergeFace => "merge_face",
        }
    }
}

impl FromStr for FeatureType {
    type Err = CostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "kling_v25_t2v" => Ok(Self::KlingT2v),
            "kling_v25_i2v_imagine" => Ok(Self::KlingI2vImagine),
            "seedream_30_t2i" => Ok(Self::SeedreamT2i),
            "merge_face" => Ok(Self::MergeFace),
            other => Err(CostError::UnknownFeatureType(other.to_string())),
        }
    }
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for FeatureType {
    type Error = CostError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FeatureType> for String {
    fn from(feature: FeatureType) -> Self {
        feature.as_str().to_string()
    }
}
