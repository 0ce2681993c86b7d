//! Health reporting
//!
//! Builds the status document served on `/health`. A failing database is
//! reported as `degraded`, never as an HTTP error, so the platform does not
//! restart the process over a transient outage.

use crate::error::ProbeError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Default time allowed for a database ping
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Status of a dependency or of the whole service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentStatus {
    /// URL present, not probed
    Configured,
    /// URL absent
    NotConfigured,
    /// Probe succeeded
    Connected,
    /// Probe failed or timed out
    Unreachable,
}

/// Overall service status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    /// Everything probed is reachable
    Healthy,
    /// The service runs but a dependency is unreachable
    Degraded,
}

/// `/health` response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    /// Time of the check
    pub timestamp: DateTime<Utc>,
    /// Reporting service (`web` or `worker`)
    pub service: String,
    /// Overall status
    pub status: ServiceStatus,
    /// Service version
    pub version: String,
    /// Runtime environment
    pub environment: String,
    /// Database status
    pub database: ComponentStatus,
    /// Cache status
    pub redis: ComponentStatus,
}

impl HealthReport {
    /// HTTP status to serve; always 200
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        200
    }

    /// Whether every probed dependency answered
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.status == ServiceStatus::Healthy
    }
}

/// Database connectivity check
#[async_trait]
pub trait DatabaseProbe: Send + Sync {
    /// Run a trivial query
    async fn ping(&self) -> Result<(), ProbeError>;
}

/// Produces [`HealthReport`]s for one service
#[derive(Clone)]
pub struct HealthChecker {
    service: String,
    version: String,
    environment: String,
    database_url: Option<String>,
    redis_url: Option<String>,
    probe: Option<Arc<dyn DatabaseProbe>>,
    timeout: Duration,
}

impl std::fmt::Debug for HealthChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthChecker")
            .field("service", &self.service)
            .field("version", &self.version)
            .field("environment", &self.environment)
            .field("database_configured", &self.database_url.is_some())
            .field("redis_configured", &self.redis_url.is_some())
            .field("probe", &self.probe.is_some())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl HealthChecker {
    /// Checker with no URLs configured
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            version: "unknown".to_string(),
            environment: "unknown".to_string(),
            database_url: None,
            redis_url: None,
            probe: None,
            timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    /// Checker configured from `DATABASE_URL`, `REDIS_URL` and `NODE_ENV`
    pub fn from_env(service: impl Into<String>) -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        let mut checker = Self::new(service).with_version(crate::VERSION);
        if let Some(environment) = var("NODE_ENV") {
            checker = checker.with_environment(environment);
        }
        checker.database_url = var("DATABASE_URL");
        checker.redis_url = var("REDIS_URL");
        checker
    }

    /// Set the reported version
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Set the reported environment
    #[must_use]
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    /// Set the database URL
    #[must_use]
    pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    /// Set the cache URL
    #[must_use]
    pub fn with_redis_url(mut self, url: impl Into<String>) -> Self {
        self.redis_url = Some(url.into());
        self
    }

    /// Ping the database on every check
    #[must_use]
    pub fn with_probe(mut self, probe: Arc<dyn DatabaseProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Time allowed for the ping
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run the checks
    pub async fn check(&self) -> HealthReport {
        let database = match (&self.database_url, &self.probe) {
            (None, _) => ComponentStatus::NotConfigured,
            (Some(_), None) => ComponentStatus::Configured,
            (Some(_), Some(probe)) => self.ping(probe.as_ref()).await,
        };
        let redis = if self.redis_url.is_some() {
            ComponentStatus::Configured
        } else {
            ComponentStatus::NotConfigured
        };
        let status = if database == ComponentStatus::Unreachable {
            ServiceStatus::Degraded
        } else {
            ServiceStatus::Healthy
        };

        HealthReport {
            timestamp: Utc::now(),
            service: self.service.clone(),
            status,
            version: self.version.clone(),
            environment: self.environment.clone(),
            database,
            redis,
        }
    }

    async fn ping(&self, probe: &dyn DatabaseProbe) -> ComponentStatus {
        match tokio::time::timeout(self.timeout, probe.ping()).await {
            Ok(Ok(())) => ComponentStatus::Connected,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Database health probe failed");
                ComponentStatus::Unreachable
            }
            Err(_) => {
                tracing::warn!(timeout = ?self.timeout, "Database health probe timed out");
                ComponentStatus::Unreachable
            }
        }
    }
}
