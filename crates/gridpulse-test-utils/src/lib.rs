//! Testing utilities for the GridPulse workspace
//!
//! Shared fixtures for the end-to-end scenarios, parameter sources and graph
//! lookups.

#![allow(missing_docs)]

use chrono::{DateTime, TimeZone, Utc};
use gridpulse_core::Catalog;
use gridpulse_infra::params::MapSource;
use gridpulse_infra::types::{Descriptor, DescriptorId, ResourceType};
use gridpulse_infra::{EnvironmentConfig, EnvironmentGraph, SupabaseConfig};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;

/// Scenario 1: managed Postgres with password `abc123`
pub fn managed_config() -> EnvironmentConfig {
    EnvironmentConfig::new("p", "prod", "t", "s").with_postgres_password("abc123")
}

pub fn scenario_supabase() -> SupabaseConfig {
    SupabaseConfig::new("x", "o", "n", "pw").with_region("us-east-1")
}

/// Scenario 2: Supabase only
pub fn supabase_config() -> EnvironmentConfig {
    EnvironmentConfig::new("p", "prod", "t", "s").with_supabase(scenario_supabase())
}

/// Scenario 3: both backends
pub fn ambiguous_config() -> EnvironmentConfig {
    managed_config().with_supabase(scenario_supabase())
}

/// Parameters satisfying the production stack with managed Postgres
pub fn production_source() -> MapSource {
    MapSource::new()
        .with("railway_token", "t")
        .with("project_id", "p")
        .with("session_secret", "s")
        .with("postgres_password", "abc123")
}

/// Parameters for the Supabase group
pub fn supabase_source() -> MapSource {
    MapSource::new()
        .with("railway_token", "t")
        .with("project_id", "p")
        .with("session_secret", "s")
        .with("supabase_access_token", "x")
        .with("supabase_organization_id", "o")
        .with("supabase_project_name", "n")
        .with("supabase_database_password", "pw")
}

pub fn service_id(name: &str) -> DescriptorId {
    DescriptorId::new(ResourceType::Service, name)
}

/// Exposed value of variable `name` on service `service`
pub fn variable(graph: &EnvironmentGraph, service: &str, name: &str) -> Option<String> {
    graph
        .variable(&service_id(service), name)
        .map(|value| value.expose())
}

/// Descriptor IDs in build order, as strings
pub fn ids(graph: &EnvironmentGraph) -> Vec<String> {
    graph.descriptors().map(|d| d.id().to_string()).collect()
}

/// Position of a descriptor in the creation order
pub fn position(graph: &EnvironmentGraph, id: &str) -> usize {
    graph
        .creation_order()
        .iter()
        .position(|candidate| candidate.to_string() == id)
        .unwrap_or_else(|| panic!("{id} not in creation order"))
}

pub fn descriptor<'a>(graph: &'a EnvironmentGraph, id: &str) -> &'a Descriptor {
    graph
        .descriptors()
        .find(|d| d.id().to_string() == id)
        .unwrap_or_else(|| panic!("{id} not in graph"))
}

/// Write a parameter file into a fresh temp directory
pub fn write_params(name: &str, contents: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    (dir, path)
}

/// Fixed clock for seed tests
pub fn seed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 15, 0, 0).unwrap()
}

pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Catalog seeded at [`seed_time`]
pub fn seeded_catalog() -> Catalog {
    let mut catalog = Catalog::new();
    gridpulse_core::seed_catalog(&mut catalog, seed_time(), &mut seeded_rng(42)).unwrap();
    catalog
}
