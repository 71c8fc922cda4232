//! Movie entity and the runtime wire format

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::domain::concurrency::Versioned;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovieId(i64);

impl MovieId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for MovieId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid runtime format")]
pub struct RuntimeFormatError;

/// Running time in minutes, written on the wire as `"<n> mins"`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Runtime(pub i32);

impl Runtime {
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} mins", self.0)
    }
}

impl std::str::FromStr for Runtime {
    type Err = RuntimeFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (n, unit) = s.split_once(' ').ok_or(RuntimeFormatError)?;
        if unit != "mins" {
            return Err(RuntimeFormatError);
        }
        n.parse::<i32>().map(Runtime).map_err(|_| RuntimeFormatError)
    }
}

impl Serialize for Runtime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Runtime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Catalog entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Movie {
    pub id: MovieId,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
    pub title: String,
    #[serde(skip_serializing_if = "is_zero_year")]
    pub year: i32,
    #[serde(skip_serializing_if = "Runtime::is_zero")]
    pub runtime: Runtime,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub genres: Vec<String>,
    pub version: i32,
}

fn is_zero_year(year: &i32) -> bool {
    *year == 0
}

impl Versioned for Movie {
    type Id = MovieId;

    fn id(&self) -> MovieId {
        self.id
    }

    fn version(&self) -> i32 {
        self.version
    }

    fn set_version(&mut self, version: i32) {
        self.version = version;
    }
}

/// A movie that has not been stored yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewMovie {
    pub title: String,
    pub year: i32,
    pub runtime: Runtime,
    pub genres: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_wire_format() {
        assert_eq!(serde_json::to_string(&Runtime(102)).unwrap(), "\"102 mins\"");

        let parsed: Runtime = serde_json::from_str("\"107 mins\"").unwrap();
        assert_eq!(parsed, Runtime(107));
    }

    #[test]
    fn test_runtime_rejects_other_forms() {
        assert!(serde_json::from_str::<Runtime>("107").is_err());
        assert_eq!("107 minutes".parse::<Runtime>(), Err(RuntimeFormatError));
        assert_eq!("107mins".parse::<Runtime>(), Err(RuntimeFormatError));
        assert_eq!("abc mins".parse::<Runtime>(), Err(RuntimeFormatError));
    }

    #[test]
    fn test_movie_json_shape() {
        let movie = Movie {
            id: MovieId::new(1),
            created_at: Utc::now(),
            title: "Casablanca".into(),
            year: 0,
            runtime: Runtime(102),
            genres: vec![],
            version: 1,
        };

        let json = serde_json::to_value(&movie).unwrap();
        assert_eq!(json["runtime"], "102 mins");
        assert_eq!(json["version"], 1);
        assert!(json.get("year").is_none());
        assert!(json.get("genres").is_none());
        assert!(json.get("created_at").is_none());
    }
}
