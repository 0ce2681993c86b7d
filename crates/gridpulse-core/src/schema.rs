//! Grid schema
//!
//! Balancing authorities own series; series own timestamped observations.
//! [`Catalog`] keeps the rows in memory and enforces the uniqueness keys:
//! authority `code`, series `(ba_id, kind, subtype)` and observation
//! `(series_id, ts)`. Upserts never modify an existing row.

use crate::error::CatalogError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Row identifier
pub type Id = u64;

/// Regional grid operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalancingAuthority {
    /// Row ID
    pub id: Id,
    /// Operator code, unique (e.g. `PJM`)
    pub code: String,
    /// Display name
    pub name: String,
    /// IANA time zone
    pub timezone: String,
    /// Grid region
    pub region: Option<String>,
}

/// Insert payload for [`BalancingAuthority`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBalancingAuthority {
    /// Operator code
    pub code: String,
    /// Display name
    pub name: String,
    /// IANA time zone
    pub timezone: String,
    /// Grid region
    pub region: Option<String>,
}

/// Measurement family of a series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesKind {
    /// Total demand
    Demand,
    /// Generation, usually split by fuel subtype
    Generation,
    /// Net interchange with neighbors
    Interchange,
}

impl SeriesKind {
    /// Stored name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Demand => "demand",
            Self::Generation => "generation",
            Self::Interchange => "interchange",
        }
    }
}

impl fmt::Display for SeriesKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named time series scoped to one authority
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    /// Row ID
    pub id: Id,
    /// Owning authority
    pub ba_id: Id,
    /// Measurement family
    #[serde(rename = "type")]
    pub kind: SeriesKind,
    /// Fuel or other refinement
    pub subtype: Option<String>,
    /// Units of every observation
    pub units: String,
    /// Human description
    pub description: String,
    /// Upstream series identifier
    pub eia_series_id: String,
    /// Whether ingestion should update it
    pub is_active: bool,
}

/// Insert payload for [`Series`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSeries {
    /// Owning authority
    pub ba_id: Id,
    /// Measurement family
    pub kind: SeriesKind,
    /// Fuel or other refinement
    pub subtype: Option<String>,
    /// Units
    pub units: String,
    /// Human description
    pub description: String,
    /// Upstream series identifier
    pub eia_series_id: String,
}

/// Data quality of an observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityFlag {
    /// Reported value
    Good,
    /// Estimated or imputed
    Estimated,
    /// Placeholder for a gap
    Missing,
}

/// One reading of a series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    /// Owning series
    pub series_id: Id,
    /// Reading time
    pub ts: DateTime<Utc>,
    /// Reading
    pub value: f64,
    /// Data quality
    pub quality_flag: QualityFlag,
}

/// Result of an upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// A new row was inserted
    Created(Id),
    /// A row with the same unique key already existed and was left as is
    Existing(Id),
}

impl Upsert {
    /// ID of the row
    #[must_use]
    pub const fn id(self) -> Id {
        match self {
            Self::Created(id) | Self::Existing(id) => id,
        }
    }

    /// Whether the call inserted a row
    #[must_use]
    pub const fn created(self) -> bool {
        matches!(self, Self::Created(_))
    }
}

type SeriesKey = (Id, SeriesKind, String);

/// In-memory grid catalog
#[derive(Debug, Default)]
pub struct Catalog {
    authorities: Vec<BalancingAuthority>,
    series: Vec<Series>,
    observations: Vec<Observation>,
    authority_by_code: HashMap<String, Id>,
    series_by_key: HashMap<SeriesKey, Id>,
    observation_index: HashMap<(Id, DateTime<Utc>), usize>,
}

impl Catalog {
    /// Empty catalog
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an authority unless its code exists
    pub fn upsert_authority(
        &mut self,
        authority: NewBalancingAuthority,
    ) -> Result<Upsert, CatalogError> {
        if authority.code.trim().is_empty() {
            return Err(CatalogError::EmptyField("code"));
        }
        if let Some(&id) = self.authority_by_code.get(&authority.code) {
            return Ok(Upsert::Existing(id));
        }

        let id = next_id(self.authorities.len());
        self.authority_by_code.insert(authority.code.clone(), id);
        self.authorities.push(BalancingAuthority {
            id,
            code: authority.code,
            name: authority.name,
            timezone: authority.timezone,
            region: authority.region,
        });
        Ok(Upsert::Created(id))
    }

    /// Insert a series unless `(ba_id, kind, subtype)` exists
    ///
    /// A missing subtype and an empty one share a key.
    pub fn upsert_series(&mut self, series: NewSeries) -> Result<Upsert, CatalogError> {
        if self.authority(series.ba_id).is_none() {
            return Err(CatalogError::UnknownAuthority(series.ba_id));
        }
        let key = (
            series.ba_id,
            series.kind,
            series.subtype.clone().unwrap_or_default(),
        );
        if let Some(&id) = self.series_by_key.get(&key) {
            return Ok(Upsert::Existing(id));
        }

        let id = next_id(self.series.len());
        self.series_by_key.insert(key, id);
        self.series.push(Series {
            id,
            ba_id: series.ba_id,
            kind: series.kind,
            subtype: series.subtype,
            units: series.units,
            description: series.description,
            eia_series_id: series.eia_series_id,
            is_active: true,
        });
        Ok(Upsert::Created(id))
    }

    /// Insert an observation unless `(series_id, ts)` exists
    pub fn upsert_observation(&mut self, observation: Observation) -> Result<bool, CatalogError> {
        if self.series_by_id(observation.series_id).is_none() {
            return Err(CatalogError::UnknownSeries(observation.series_id));
        }
        let key = (observation.series_id, observation.ts);
        if self.observation_index.contains_key(&key) {
            return Ok(false);
        }
        self.observation_index.insert(key, self.observations.len());
        self.observations.push(observation);
        Ok(true)
    }

    /// Authority by ID
    #[must_use]
    pub fn authority(&self, id: Id) -> Option<&BalancingAuthority> {
        index_of(id).and_then(|i| self.authorities.get(i))
    }

    /// Authority by code
    #[must_use]
    pub fn authority_by_code(&self, code: &str) -> Option<&BalancingAuthority> {
        self.authority_by_code
            .get(code)
            .and_then(|&id| self.authority(id))
    }

    /// Series by ID
    #[must_use]
    pub fn series_by_id(&self, id: Id) -> Option<&Series> {
        index_of(id).and_then(|i| self.series.get(i))
    }

    /// Series of one authority, in insertion order
    pub fn series_for(&self, ba_id: Id) -> impl Iterator<Item = &Series> {
        self.series.iter().filter(move |s| s.ba_id == ba_id)
    }

    /// Observations of one series, in insertion order
    pub fn observations_for(&self, series_id: Id) -> impl Iterator<Item = &Observation> {
        self.observations
            .iter()
            .filter(move |o| o.series_id == series_id)
    }

    /// Observation by unique key
    #[must_use]
    pub fn observation(&self, series_id: Id, ts: DateTime<Utc>) -> Option<&Observation> {
        self.observation_index
            .get(&(series_id, ts))
            .and_then(|&i| self.observations.get(i))
    }

    /// All authorities
    #[must_use]
    pub fn authorities(&self) -> &[BalancingAuthority] {
        &self.authorities
    }

    /// All series
    #[must_use]
    pub fn series(&self) -> &[Series] {
        &self.series
    }

    /// All observations
    #[must_use]
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }
}

// IDs start at 1, like the database sequences they stand in for.
fn next_id(len: usize) -> Id {
    len as Id + 1
}

fn index_of(id: Id) -> Option<usize> {
    usize::try_from(id).ok()?.checked_sub(1)
}
