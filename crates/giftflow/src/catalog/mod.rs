//! Catalog - classification configuration
//!
//! The mapping rules and the event table are loaded once before any file is
//! classified and are never mutated afterwards. Workers share a `&Catalog`.

pub mod error;
pub mod events;
pub mod mapping;

pub use error::CatalogError;
pub use events::{Event, EventTable};
pub use mapping::{MappingRule, MappingStore, DEFAULT_GAMECODE};

use std::path::Path;

/// Immutable classification configuration.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    mapping: MappingStore,
    events: EventTable,
    mapping_override: bool,
}

impl Catalog {
    pub fn new(mapping: MappingStore, events: EventTable) -> Self {
        Self {
            mapping,
            events,
            mapping_override: false,
        }
    }

    /// Load both configuration files. Missing files yield empty sections.
    pub fn load(mapping_path: Option<&Path>, events_path: Option<&Path>) -> error::Result<Self> {
        let mapping = MappingStore::load(mapping_path)?;
        let events = EventTable::load(events_path)?;
        Ok(Self::new(mapping, events))
    }

    /// Record the mapping-override switch.
    ///
    /// The flag is carried for callers that want to audit it; classification
    /// precedence does not depend on it.
    pub fn with_mapping_override(mut self, enabled: bool) -> Self {
        self.mapping_override = enabled;
        self
    }

    pub fn mapping_override(&self) -> bool {
        self.mapping_override
    }

    pub fn lookup_rules(&self) -> &[MappingRule] {
        self.mapping.lookup_rules()
    }

    pub fn default_code(&self) -> &str {
        self.mapping.default_code()
    }

    pub fn all_events(&self) -> &[Event] {
        self.events.all_events()
    }
}
