//! Event Table: known distribution events loaded from CSV.
//!
//! Expected columns: `EventName`, `GameCodes`, `Regions`, optional `Year`.
//! `GameCodes` and `Regions` hold comma-joined lists inside a single field.

use super::error::{CatalogError, Result};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

/// A known event and the game codes it is distributed for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub name: String,
    /// Destination codes in declared order, never empty.
    pub codes: Vec<String>,
    pub regions: Vec<String>,
    pub year: Option<String>,
}

impl Event {
    /// Build an event, dropping empty and duplicate codes/regions.
    ///
    /// Returns `None` when no code survives.
    pub fn new(
        name: impl Into<String>,
        codes: impl IntoIterator<Item = impl Into<String>>,
        regions: impl IntoIterator<Item = impl Into<String>>,
        year: Option<String>,
    ) -> Option<Self> {
        let codes = dedup_trimmed(codes);
        if codes.is_empty() {
            return None;
        }
        Some(Self {
            name: name.into(),
            codes,
            regions: dedup_trimmed(regions),
            year: year.map(|y| y.trim().to_string()).filter(|y| !y.is_empty()),
        })
    }
}

#[derive(Debug, Deserialize)]
struct EventRow {
    #[serde(rename = "EventName")]
    name: String,
    #[serde(rename = "GameCodes")]
    codes: String,
    #[serde(rename = "Regions", default)]
    regions: String,
    #[serde(rename = "Year", default)]
    year: Option<String>,
}

/// Read-only list of events in table order.
#[derive(Debug, Clone, Default)]
pub struct EventTable {
    events: Vec<Event>,
}

impl EventTable {
    pub fn new(events: Vec<Event>) -> Self {
        Self { events }
    }

    /// Load the events CSV, or an empty table when there is none.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path.filter(|p| !p.as_os_str().is_empty()) else {
            info!("No events CSV given; event matching disabled");
            return Ok(Self::default());
        };

        if !path.exists() {
            warn!("Events CSV {} not found; event matching disabled", path.display());
            return Ok(Self::default());
        }

        let file = std::fs::File::open(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::from_reader(file, path)?;
        info!("Loaded {} events from {}", table.len(), path.display());
        Ok(table)
    }

    /// Parse CSV from any reader. `origin` is only used in messages.
    pub fn from_reader<R: Read>(reader: R, origin: &Path) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let mut events = Vec::new();
        for (index, row) in csv_reader.deserialize::<EventRow>().enumerate() {
            let row = row.map_err(|source| CatalogError::Csv {
                path: origin.to_path_buf(),
                source,
            })?;
            let line = index + 2;
            match Event::new(
                row.name.clone(),
                split_list(&row.codes),
                split_list(&row.regions),
                row.year,
            ) {
                Some(event) => events.push(event),
                None => warn!(
                    "{}:{}: event '{}' has no game codes; skipped",
                    origin.display(),
                    line,
                    row.name
                ),
            }
        }

        Ok(Self { events })
    }

    pub fn all_events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn dedup_trimmed(items: impl IntoIterator<Item = impl Into<String>>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in items {
        let item = item.into().trim().to_string();
        if !item.is_empty() && !out.contains(&item) {
            out.push(item);
        }
    }
    out
}
