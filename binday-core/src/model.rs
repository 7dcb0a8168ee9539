//! Domain data structures for councils, properties, and collection schedules.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Built-in councils supported by the application.
pub enum Councils {
    /// City of York Council, United Kingdom.
    York,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Identifier for a council known to binday.
pub struct CouncilId(pub String);

impl fmt::Display for Councils {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slug = match self {
            Councils::York => "york",
        };
        write!(formatter, "{slug}")
    }
}

impl fmt::Display for CouncilId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl From<Councils> for CouncilId {
    fn from(council: Councils) -> Self {
        CouncilId(council.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Metadata describing a council and its human-friendly name.
pub struct CouncilMeta {
    /// Unique identifier.
    pub id: CouncilId,
    /// Display name.
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Property reference (UPRN) used to query a council's schedule API.
pub struct PropertyRef(pub String);

impl fmt::Display for PropertyRef {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
/// Stable name a deployment uses for a collection service, e.g. `blackbin`.
pub struct Category(pub String);

impl Category {
    /// Borrow the category name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl From<&str> for Category {
    fn from(name: &str) -> Self {
        Category(name.to_owned())
    }
}

/// One entry of the upstream `services` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawServiceRecord {
    /// Upstream service identifier such as `REFUSE` or `RECYCLING`.
    pub service: String,
    /// Encoded date of the most recent collection.
    #[serde(rename = "lastCollected", default)]
    pub last_collected: Option<String>,
    /// Encoded date of the next collection.
    #[serde(rename = "nextCollection", default)]
    pub next_collection: Option<String>,
    /// Every other field the upstream sent, untouched.
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// A service record with decoded dates, tagged with its category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    /// Category the service identifier was mapped to.
    pub category: Category,
    /// Original upstream service identifier.
    pub service: String,
    /// Date of the most recent collection, if known.
    pub last: Option<NaiveDate>,
    /// Date of the next collection, if known.
    pub next: Option<NaiveDate>,
    /// Display icon configured for the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Projected upstream attributes, copied verbatim.
    #[serde(flatten)]
    pub attributes: BTreeMap<String, Value>,
}

/// Field names of [`NormalizedRecord`] that projected attributes may not shadow.
pub const RECORD_FIELDS: [&str; 5] = ["category", "service", "last", "next", "icon"];

/// Summary field names of [`NormalizedSchedule`] that categories may not shadow.
pub const SUMMARY_FIELDS: [&str; 3] = ["next_collection", "next_collection_categories", "updated"];

/// Normalized view of every service collected at a property.
///
/// Serializes flat: one key per category next to the three summary fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedSchedule {
    /// One record per category.
    #[serde(flatten)]
    pub collections: BTreeMap<Category, NormalizedRecord>,
    /// Earliest next-collection date across all records.
    pub next_collection: Option<NaiveDate>,
    /// Categories collected on `next_collection`, in input order.
    pub next_collection_categories: Vec<Category>,
    /// Instant the schedule was normalized.
    pub updated: DateTime<Utc>,
}

impl NormalizedSchedule {
    /// Look up the record for a category.
    #[must_use]
    pub fn get(&self, category: &Category) -> Option<&NormalizedRecord> {
        self.collections.get(category)
    }

    /// Whether the schedule holds no categories at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }
}
