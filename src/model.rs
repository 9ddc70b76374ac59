//! Document Model - Canonical In-Memory Shapes
//!
//! Field declaration order in these structs is the canonical key order of
//! the serialized form. It is deliberately chosen (identity first, shape
//! second, children third, free-form metadata last) and is part of the
//! byte-stability contract - reordering fields changes every ledger hash.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::effects::Effect;

pub const TECH_TREE_SCHEMA_VERSION: u32 = 2;
pub const ROOM_BLUEPRINT_SCHEMA_VERSION: u32 = 2;

pub const TIER_MIN: i64 = 1;
pub const TIER_MAX: i64 = 256;
pub const DIMENSION_MIN: i64 = 16;
pub const DIMENSION_MAX: i64 = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    TechTree,
    RoomBlueprint,
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TechTree => write!(f, "tech_tree"),
            Self::RoomBlueprint => write!(f, "room_blueprint"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechTreeDocument {
    pub id: String,
    pub version: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_min_version: Option<String>,
    #[serde(default)]
    pub nodes: Vec<TechNode>,
    #[serde(default)]
    pub culture_tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechNode {
    pub id: String,
    pub title: String,
    pub tier: i64,
    #[serde(default)]
    pub display_order: i64,
    #[serde(default)]
    pub effects: Vec<Effect>,
    #[serde(default)]
    pub prerequisites: Vec<Prerequisite>,
    #[serde(default)]
    pub unlocks_structures: Vec<String>,
    #[serde(default)]
    pub unlocks_goods: Vec<String>,
    #[serde(default)]
    pub costs: Vec<Cost>,
}

/// One edge of the prerequisite graph. For tech trees `target` is a node
/// id inside the same document; for room blueprints it is a blueprint id
/// checked against the caller-supplied known-id set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prerequisite {
    pub target: String,
    #[serde(default)]
    pub relation: PrereqRelation,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PrereqRelation {
    #[default]
    Requires,
    Recommends,
}

impl PrereqRelation {
    pub const ALL: [PrereqRelation; 2] = [PrereqRelation::Requires, PrereqRelation::Recommends];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Requires => "requires",
            Self::Recommends => "recommends",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cost {
    pub resource: String,
    #[serde(default)]
    pub phase: CostPhase,
    pub amount: f64,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum CostPhase {
    #[default]
    Construction,
    Upkeep,
    Unlock,
}

impl CostPhase {
    pub const ALL: [CostPhase; 3] = [CostPhase::Construction, CostPhase::Upkeep, CostPhase::Unlock];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Construction => "construction",
            Self::Upkeep => "upkeep",
            Self::Unlock => "unlock",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomBlueprintDocument {
    pub id: String,
    pub version: u32,
    pub name: String,
    pub purpose: String,
    pub width: i64,
    pub height: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_min_version: Option<String>,
    /// Authored narrative order; never resorted.
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub hazards: Vec<String>,
    #[serde(default)]
    pub sockets: Vec<Socket>,
    #[serde(default)]
    pub prerequisites: Vec<Prerequisite>,
    #[serde(default)]
    pub culture_tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Socket {
    pub id: String,
    pub kind: String,
    pub position: Position,
    #[serde(default)]
    pub depends_on: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub x: i64,
    pub y: i64,
}

/// Declared schema version, used by the migration pipeline to find the
/// next applicable step.
pub trait Versioned {
    fn version(&self) -> u32;
}

impl Versioned for TechTreeDocument {
    fn version(&self) -> u32 {
        self.version
    }
}

impl Versioned for RoomBlueprintDocument {
    fn version(&self) -> u32 {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relation_defaults_to_requires() {
        let p: Prerequisite = serde_json::from_str(r#"{"target":"basic_power"}"#).unwrap();
        assert_eq!(p.relation, PrereqRelation::Requires);
    }

    #[test]
    fn cost_phase_defaults_to_construction() {
        let c: Cost =
            serde_json::from_str(r#"{"resource":"alloys","amount":12.0}"#).unwrap();
        assert_eq!(c.phase, CostPhase::Construction);
    }

    #[test]
    fn empty_metadata_is_omitted_from_canonical_output() {
        let doc = TechTreeDocument {
            id: "t".into(),
            version: TECH_TREE_SCHEMA_VERSION,
            name: "T".into(),
            engine_min_version: None,
            nodes: vec![],
            culture_tags: vec![],
            metadata: Map::new(),
        };
        let json = serde_json::to_string(&doc).unwrap();
        assert!(!json.contains("metadata"));
        assert!(!json.contains("engineMinVersion"));
    }
}
