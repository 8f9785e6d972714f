//! Append-only JSON Lines log of computed conversion routes
//!
//! One record per successful computation, so rate quality and route
//! shapes can be reviewed after the fact.

use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use crate::config::ROUTE_LOG_ENV;
use crate::graph::BestRoute;

/// One computed route, as written to the log file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteRecord {
    pub timestamp: String,
    pub source: String,
    pub target: String,
    pub amount_in: u32,
    pub amount_out: i64,
    pub hops: usize,
    pub path: Vec<String>,
}

impl RouteRecord {
    pub fn new(source: &str, target: &str, amount_in: u32, route: &BestRoute) -> Self {
        Self {
            timestamp: Local::now().to_rfc3339(),
            source: source.to_string(),
            target: target.to_string(),
            amount_in,
            amount_out: route.rounded,
            hops: route.hops,
            path: route.path.clone(),
        }
    }
}

/// Route logger that appends to a JSON Lines file.
pub struct RouteLogger {
    file_path: PathBuf,
}

impl RouteLogger {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
        }
    }

    /// Logger configured through the `FX_ROUTE_LOG` env var, if set.
    pub fn from_env() -> Option<Self> {
        std::env::var(ROUTE_LOG_ENV).ok().map(Self::new)
    }

    /// Append one record as a JSON line. Logging must never fail the
    /// conversion itself, so errors only go to stderr.
    pub fn log_route(&self, record: &RouteRecord) {
        match OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)
        {
            Ok(file) => {
                let mut writer = BufWriter::new(file);
                if let Ok(json) = serde_json::to_string(record) {
                    let _ = writeln!(writer, "{}", json);
                }
            }
            Err(e) => {
                eprintln!("Failed to write route log: {}", e);
            }
        }
    }
}
