//! Location keys.
//!
//! A location key identifies one block position in one world and is the sole
//! identity of a registered container. Its canonical form is
//! `world:x:y:z`, which is also the key used in the persisted state document.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when parsing an invalid [`LocationKey`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationKeyError {
    /// Fewer than four colon-separated parts.
    #[error("location key `{0}` must have the form world:x:y:z")]
    Shape(String),
    /// The world component was empty.
    #[error("location key `{0}` has an empty world name")]
    EmptyWorld(String),
    /// A coordinate was not an integer.
    #[error("location key `{key}` has an invalid {axis} coordinate")]
    Coordinate {
        /// Full input.
        key: String,
        /// Axis name (`x`, `y` or `z`).
        axis: &'static str,
    },
}

/// Block position qualified by world name.
///
/// Ordering is `(world, x, y, z)` and is stable across runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocationKey {
    /// World name.
    pub world: String,
    /// Block X.
    pub x: i32,
    /// Block Y.
    pub y: i32,
    /// Block Z.
    pub z: i32,
}

impl LocationKey {
    /// Create a key from its components.
    pub fn new(world: impl Into<String>, x: i32, y: i32, z: i32) -> Self {
        Self {
            world: world.into(),
            x,
            y,
            z,
        }
    }

    /// Parse the canonical `world:x:y:z` form.
    ///
    /// Coordinates are taken from the right, so a world name may itself
    /// contain colons.
    pub fn parse(input: &str) -> Result<Self, LocationKeyError> {
        let mut parts = input.rsplitn(4, ':');
        let (Some(z), Some(y), Some(x), Some(world)) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(LocationKeyError::Shape(input.to_string()));
        };

        if world.is_empty() {
            return Err(LocationKeyError::EmptyWorld(input.to_string()));
        }

        let coord = |value: &str, axis: &'static str| {
            value
                .parse::<i32>()
                .map_err(|_| LocationKeyError::Coordinate {
                    key: input.to_string(),
                    axis,
                })
        };

        Ok(Self {
            world: world.to_string(),
            x: coord(x, "x")?,
            y: coord(y, "y")?,
            z: coord(z, "z")?,
        })
    }

    /// Squared distance from this block's origin corner to a point.
    pub fn distance_squared(&self, x: f64, y: f64, z: f64) -> f64 {
        let dx = f64::from(self.x) - x;
        let dy = f64::from(self.y) - y;
        let dz = f64::from(self.z) - z;
        dx * dx + dy * dy + dz * dz
    }
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}:{}", self.world, self.x, self.y, self.z)
    }
}

impl FromStr for LocationKey {
    type Err = LocationKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for LocationKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for LocationKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(de::Error::custom)
    }
}
