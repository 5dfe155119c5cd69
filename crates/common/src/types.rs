use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a renderable entity, decoded from the `type` field.
///
/// The set the simulation produces is closed (`human`, `animal`, `insect`), but
/// anything else is kept verbatim instead of failing the whole frame.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EntityKind {
    Human,
    Animal,
    Insect,
    Other(String),
}

impl EntityKind {
    pub fn as_str(&self) -> &str {
        match self {
            EntityKind::Human => "human",
            EntityKind::Animal => "animal",
            EntityKind::Insect => "insect",
            EntityKind::Other(name) => name,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, EntityKind::Other(_))
    }
}

impl From<String> for EntityKind {
    fn from(name: String) -> Self {
        match name.as_str() {
            "human" => EntityKind::Human,
            "animal" => EntityKind::Animal,
            "insect" => EntityKind::Insect,
            _ => EntityKind::Other(name),
        }
    }
}

impl From<&str> for EntityKind {
    fn from(name: &str) -> Self {
        EntityKind::from(name.to_owned())
    }
}

impl From<EntityKind> for String {
    fn from(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Other(name) => name,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One renderable record of a frame.
///
/// Only `kind` and `position` drive painting. The remaining fields mirror what
/// the simulation reports about each character and are informational.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(rename = "type")]
    pub kind: EntityKind,
    /// Position in grid cells.
    pub position: Vec2,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge: Option<f64>,
}

impl Entity {
    /// An entity with no metadata.
    pub fn new(kind: impl Into<EntityKind>, x: f32, y: f32) -> Self {
        Self {
            kind: kind.into(),
            position: Vec2::new(x, y),
            health: None,
            age: None,
            birth_date: None,
            knowledge: None,
        }
    }
}
