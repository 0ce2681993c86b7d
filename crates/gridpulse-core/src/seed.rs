//! Development seed catalog
//!
//! Five balancing authorities, eight series each, and the last 24 hours of
//! hourly demand per authority. Every write is an upsert, so seeding an
//! already-seeded catalog with the same clock changes nothing.

use crate::error::CatalogError;
use crate::schema::{
    Catalog, NewBalancingAuthority, NewSeries, Observation, QualityFlag, SeriesKind,
};
use chrono::{DateTime, Duration, Timelike, Utc};
use rand::Rng;

/// Hours of demand history seeded per authority
pub const HISTORY_HOURS: i64 = 24;

/// Base load used for an authority without a configured value, in MW
pub const DEFAULT_BASE_LOAD: f64 = 50_000.0;

struct AuthoritySeed {
    code: &'static str,
    name: &'static str,
    timezone: &'static str,
    region: &'static str,
}

const AUTHORITIES: [AuthoritySeed; 5] = [
    AuthoritySeed {
        code: "PJM",
        name: "PJM Interconnection",
        timezone: "America/New_York",
        region: "Eastern",
    },
    AuthoritySeed {
        code: "CAISO",
        name: "California ISO",
        timezone: "America/Los_Angeles",
        region: "Western",
    },
    AuthoritySeed {
        code: "MISO",
        name: "Midcontinent ISO",
        timezone: "America/Chicago",
        region: "Central",
    },
    AuthoritySeed {
        code: "ERCOT",
        name: "Electric Reliability Council of Texas",
        timezone: "America/Chicago",
        region: "Texas",
    },
    AuthoritySeed {
        code: "SPP",
        name: "Southwest Power Pool",
        timezone: "America/Chicago",
        region: "Central",
    },
];

const SERIES: [(SeriesKind, Option<&str>, &str); 8] = [
    (SeriesKind::Demand, None, "Total electricity demand"),
    (SeriesKind::Generation, Some("coal"), "Coal-fired generation"),
    (SeriesKind::Generation, Some("gas"), "Natural gas generation"),
    (SeriesKind::Generation, Some("nuclear"), "Nuclear generation"),
    (SeriesKind::Generation, Some("solar"), "Solar generation"),
    (SeriesKind::Generation, Some("wind"), "Wind generation"),
    (SeriesKind::Generation, Some("hydro"), "Hydroelectric generation"),
    (SeriesKind::Interchange, None, "Net interchange"),
];

/// Counts of rows written by one seeding run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    /// Authorities upserted
    pub authorities: usize,
    /// Series upserted
    pub series: usize,
    /// Observations upserted
    pub observations: usize,
    /// Rows that did not exist before
    pub created: usize,
}

/// Upstream series identifier: `EIA.<code>.<type>[.<subtype>]`
#[must_use]
pub fn eia_series_id(code: &str, kind: SeriesKind, subtype: Option<&str>) -> String {
    match subtype {
        Some(subtype) => format!("EIA.{code}.{kind}.{subtype}"),
        None => format!("EIA.{code}.{kind}"),
    }
}

/// Typical demand of an authority in MW
#[must_use]
pub fn base_load(code: &str) -> f64 {
    match code {
        "PJM" => 120_000.0,
        "CAISO" => 40_000.0,
        "MISO" => 90_000.0,
        "ERCOT" => 70_000.0,
        "SPP" => 30_000.0,
        _ => DEFAULT_BASE_LOAD,
    }
}

/// Daily shape: afternoon peak, daytime shoulder, night trough
#[must_use]
pub fn peak_factor(hour: u32) -> f64 {
    match hour {
        14..=18 => 1.2,
        10..=20 => 1.1,
        _ => 0.9,
    }
}

/// Demand reading for an hour, `random_factor` in `[0.95, 1.05)`
#[must_use]
pub fn demand_value(code: &str, hour: u32, random_factor: f64) -> f64 {
    (base_load(code) * peak_factor(hour) * random_factor).round()
}

/// Seed `catalog` relative to `now`
pub fn seed_catalog<R: Rng>(
    catalog: &mut Catalog,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Result<SeedSummary, CatalogError> {
    let mut summary = SeedSummary::default();

    for seed in &AUTHORITIES {
        let authority = catalog.upsert_authority(NewBalancingAuthority {
            code: seed.code.to_string(),
            name: seed.name.to_string(),
            timezone: seed.timezone.to_string(),
            region: Some(seed.region.to_string()),
        })?;
        summary.authorities += 1;
        summary.created += usize::from(authority.created());

        let mut demand_series = None;
        for (kind, subtype, description) in SERIES {
            let series = catalog.upsert_series(NewSeries {
                ba_id: authority.id(),
                kind,
                subtype: subtype.map(str::to_string),
                units: "MW".to_string(),
                description: description.to_string(),
                eia_series_id: eia_series_id(seed.code, kind, subtype),
            })?;
            summary.series += 1;
            summary.created += usize::from(series.created());
            if kind == SeriesKind::Demand {
                demand_series = Some(series.id());
            }
        }

        let Some(series_id) = demand_series else {
            continue;
        };
        for hours_ago in (0..HISTORY_HOURS).rev() {
            let ts = now - Duration::hours(hours_ago);
            let random_factor = 0.95 + rng.random::<f64>() * 0.1;
            let created = catalog.upsert_observation(Observation {
                series_id,
                ts,
                value: demand_value(seed.code, ts.hour(), random_factor),
                quality_flag: QualityFlag::Good,
            })?;
            summary.observations += 1;
            summary.created += usize::from(created);
        }
        tracing::debug!(code = seed.code, "Seeded balancing authority");
    }

    tracing::info!(
        authorities = summary.authorities,
        series = summary.series,
        observations = summary.observations,
        created = summary.created,
        "Seeded grid catalog"
    );
    Ok(summary)
}
