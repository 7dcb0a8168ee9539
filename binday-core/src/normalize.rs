//! Schedule normalization: category mapping, date decoding, attribute
//! projection, and next-collection derivation.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, warn};

use crate::date::{EpochZone, extract_date_in};
use crate::model::{
    Category, NormalizedRecord, NormalizedSchedule, RECORD_FIELDS, RawServiceRecord,
    SUMMARY_FIELDS,
};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
/// Errors raised while building a normalizer or normalizing a schedule.
pub enum NormalizeError {
    /// A service identifier has no entry in the category map.
    #[error("Unknown service: {0}")]
    UnknownService(String),
    /// A category would shadow one of the schedule summary fields.
    #[error("Reserved category name: {0}")]
    ReservedCategory(String),
    /// A projected attribute would shadow one of the record fields.
    #[error("Reserved attribute name: {0}")]
    ReservedAttribute(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Category and display icon assigned to one service identifier.
pub struct ServiceMapping {
    /// Canonical category.
    pub category: Category,
    /// Optional icon, e.g. `mdi:recycle`.
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Lookup table from upstream service identifiers to categories.
pub struct CategoryMap {
    services: HashMap<String, ServiceMapping>,
}

impl CategoryMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from `(service, category)` pairs without icons.
    ///
    /// # Errors
    ///
    /// Returns [`NormalizeError::ReservedCategory`] if a category collides
    /// with a schedule summary field.
    pub fn from_pairs<I, S, C>(pairs: I) -> Result<Self, NormalizeError>
    where
        I: IntoIterator<Item = (S, C)>,
        S: Into<String>,
        C: Into<String>,
    {
        let mut map = Self::new();
        for (service, category) in pairs {
            map.insert(service, category, None::<String>)?;
        }
        Ok(map)
    }

    /// Add or replace the mapping for a service identifier.
    ///
    /// # Errors
    ///
    /// Returns [`NormalizeError::ReservedCategory`] if the category collides
    /// with a schedule summary field.
    pub fn insert<S, C, I>(
        &mut self,
        service: S,
        category: C,
        icon: Option<I>,
    ) -> Result<(), NormalizeError>
    where
        S: Into<String>,
        C: Into<String>,
        I: Into<String>,
    {
        let category = category.into();
        if SUMMARY_FIELDS.contains(&category.as_str()) {
            return Err(NormalizeError::ReservedCategory(category));
        }
        self.services.insert(
            service.into(),
            ServiceMapping {
                category: Category(category),
                icon: icon.map(Into::into),
            },
        );
        Ok(())
    }

    /// Attach an icon to an already mapped service. Returns `false` if the
    /// service is not mapped.
    pub fn set_icon<I: Into<String>>(&mut self, service: &str, icon: I) -> bool {
        match self.services.get_mut(service) {
            Some(mapping) => {
                mapping.icon = Some(icon.into());
                true
            }
            None => false,
        }
    }

    /// Resolve the mapping for a service identifier.
    ///
    /// # Errors
    ///
    /// Returns [`NormalizeError::UnknownService`] if the identifier is not mapped.
    pub fn resolve(&self, service: &str) -> Result<&ServiceMapping, NormalizeError> {
        self.services
            .get(service)
            .ok_or_else(|| NormalizeError::UnknownService(service.to_owned()))
    }

    /// Number of mapped service identifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Whether no service identifiers are mapped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

/// Normalizes raw service records with a fixed configuration.
#[derive(Debug, Clone)]
pub struct Normalizer {
    categories: CategoryMap,
    attributes: Vec<String>,
    zone: EpochZone,
}

impl Normalizer {
    /// Build a normalizer from a category map and an attribute projection.
    ///
    /// # Errors
    ///
    /// Returns [`NormalizeError::ReservedAttribute`] if an attribute name
    /// collides with a normalized record field.
    pub fn new(categories: CategoryMap, attributes: Vec<String>) -> Result<Self, NormalizeError> {
        check_attributes(&attributes)?;
        Ok(Self {
            categories,
            attributes,
            zone: EpochZone::default(),
        })
    }

    /// Read epoch timestamps in `zone` instead of UTC.
    #[must_use]
    pub fn with_epoch_zone(mut self, zone: EpochZone) -> Self {
        self.zone = zone;
        self
    }

    /// Category map in use.
    #[must_use]
    pub fn categories(&self) -> &CategoryMap {
        &self.categories
    }

    /// Attribute projection in use.
    #[must_use]
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    /// Normalize `records`, stamping the result with the current instant.
    ///
    /// # Errors
    ///
    /// Returns [`NormalizeError::UnknownService`] if any record carries an
    /// unmapped service identifier. No partial schedule is produced.
    pub fn normalize(
        &self,
        records: &[RawServiceRecord],
    ) -> Result<NormalizedSchedule, NormalizeError> {
        let (collections, next) =
            collect_records(records, &self.categories, &self.attributes, self.zone)?;
        Ok(next.into_schedule(collections, Utc::now()))
    }

    /// Normalize `records`, stamping the result with `updated`.
    ///
    /// # Errors
    ///
    /// See [`Normalizer::normalize`].
    pub fn normalize_at(
        &self,
        records: &[RawServiceRecord],
        updated: DateTime<Utc>,
    ) -> Result<NormalizedSchedule, NormalizeError> {
        let (collections, next) =
            collect_records(records, &self.categories, &self.attributes, self.zone)?;
        Ok(next.into_schedule(collections, updated))
    }
}

/// Normalize `records` with epoch timestamps read in UTC.
///
/// # Errors
///
/// Returns [`NormalizeError::ReservedAttribute`] for an attribute name that
/// shadows a record field, and [`NormalizeError::UnknownService`] for an
/// unmapped service identifier.
pub fn normalize(
    records: &[RawServiceRecord],
    category_map: &CategoryMap,
    attribute_list: &[String],
) -> Result<NormalizedSchedule, NormalizeError> {
    check_attributes(attribute_list)?;
    let (collections, next) =
        collect_records(records, category_map, attribute_list, EpochZone::Utc)?;
    Ok(next.into_schedule(collections, Utc::now()))
}

fn check_attributes(attributes: &[String]) -> Result<(), NormalizeError> {
    match attributes
        .iter()
        .find(|name| RECORD_FIELDS.contains(&name.as_str()))
    {
        Some(name) => Err(NormalizeError::ReservedAttribute(name.clone())),
        None => Ok(()),
    }
}

fn collect_records(
    records: &[RawServiceRecord],
    categories: &CategoryMap,
    attributes: &[String],
    zone: EpochZone,
) -> Result<(BTreeMap<Category, NormalizedRecord>, NextCollection), NormalizeError> {
    let mut collections = BTreeMap::new();
    let mut next = NextCollection::default();

    for record in records {
        let normalized = normalize_record(record, categories, attributes, zone)?;
        next.observe(normalized.next, &normalized.category);
        // later records for the same category replace earlier ones
        collections.insert(normalized.category.clone(), normalized);
    }

    debug!(
        records = records.len(),
        categories = collections.len(),
        next_collection = ?next.date,
        "normalized collection schedule"
    );

    Ok((collections, next))
}

fn normalize_record(
    record: &RawServiceRecord,
    categories: &CategoryMap,
    attributes: &[String],
    zone: EpochZone,
) -> Result<NormalizedRecord, NormalizeError> {
    let mapping = categories.resolve(&record.service)?;

    let last = decode_date(
        &record.service,
        "lastCollected",
        record.last_collected.as_deref(),
        zone,
    );
    let next = decode_date(
        &record.service,
        "nextCollection",
        record.next_collection.as_deref(),
        zone,
    );

    let attributes = attributes
        .iter()
        .filter_map(|name| {
            record
                .attributes
                .get(name)
                .map(|value| (name.clone(), value.clone()))
        })
        .collect();

    Ok(NormalizedRecord {
        category: mapping.category.clone(),
        service: record.service.clone(),
        last,
        next,
        icon: mapping.icon.clone(),
        attributes,
    })
}

fn decode_date(
    service: &str,
    field: &str,
    value: Option<&str>,
    zone: EpochZone,
) -> Option<NaiveDate> {
    let value = value?;
    let date = extract_date_in(value, zone);
    if date.is_none() && !value.trim().is_empty() {
        warn!(service, field, value, "unrecognised collection date, treating as absent");
    }
    date
}

/// Running minimum over next-collection dates, with ties kept in input order.
#[derive(Debug, Default)]
struct NextCollection {
    date: Option<NaiveDate>,
    categories: Vec<Category>,
}

impl NextCollection {
    fn observe(&mut self, next: Option<NaiveDate>, category: &Category) {
        let Some(next) = next else {
            return;
        };

        match self.date.map(|current| next.cmp(&current)) {
            Some(Ordering::Greater) => {}
            Some(Ordering::Equal) => {
                if !self.categories.contains(category) {
                    self.categories.push(category.clone());
                }
            }
            Some(Ordering::Less) | None => {
                self.date = Some(next);
                self.categories = vec![category.clone()];
            }
        }
    }

    fn into_schedule(
        self,
        collections: BTreeMap<Category, NormalizedRecord>,
        updated: DateTime<Utc>,
    ) -> NormalizedSchedule {
        NormalizedSchedule {
            collections,
            next_collection: self.date,
            next_collection_categories: self.categories,
            updated,
        }
    }
}
