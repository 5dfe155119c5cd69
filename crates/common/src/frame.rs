use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{Entity, EntityKind};

/// One complete snapshot of every renderable entity.
///
/// Decoded directly from the `update` payload. Entity order is paint order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Simulated date of the snapshot, if the source reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(rename = "characters")]
    pub entities: Vec<Entity>,
}

impl Frame {
    pub fn new(entities: Vec<Entity>) -> Self {
        Self {
            date: None,
            entities,
        }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Count entities per kind.
    pub fn census(&self) -> Census {
        let mut census = Census::default();
        for entity in &self.entities {
            match entity.kind {
                EntityKind::Human => census.humans += 1,
                EntityKind::Animal => census.animals += 1,
                EntityKind::Insect => census.insects += 1,
                EntityKind::Other(_) => census.other += 1,
            }
        }
        census
    }
}

/// Per-kind entity counts of a frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Census {
    pub humans: usize,
    pub animals: usize,
    pub insects: usize,
    pub other: usize,
}

impl Census {
    pub fn total(&self) -> usize {
        self.humans + self.animals + self.insects + self.other
    }
}

impl fmt::Display for Census {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "humans={} animals={} insects={} other={}",
            self.humans, self.animals, self.insects, self.other
        )
    }
}
