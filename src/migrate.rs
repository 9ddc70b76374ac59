//! Migration Pipeline
//!
//! A version-indexed table of transforms. Starting from the document's
//! declared version, the step registered for that version is applied until
//! no step applies. A chain that has not stabilized after
//! [`MIGRATION_ITERATION_GUARD`] applications is a fatal loop: the engine
//! aborts rather than return a partially migrated document.

use std::collections::BTreeMap;
use thiserror::Error;

use crate::model::{
    RoomBlueprintDocument, TechTreeDocument, Versioned, ROOM_BLUEPRINT_SCHEMA_VERSION,
    TECH_TREE_SCHEMA_VERSION,
};
use crate::ident::normalize_ident;

pub const MIGRATION_ITERATION_GUARD: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "migration chain did not stabilize after {MIGRATION_ITERATION_GUARD} steps (stuck at version {version})"
)]
pub struct MigrationLoopError {
    pub version: u32,
}

/// Table of `version -> transform`. Each transform consumes the document
/// and must return one with a different version for the chain to advance.
pub struct MigrationTable<D: Versioned> {
    steps: BTreeMap<u32, fn(D) -> D>,
}

impl<D: Versioned> MigrationTable<D> {
    pub fn new() -> Self {
        Self {
            steps: BTreeMap::new(),
        }
    }

    pub fn register(&mut self, from_version: u32, step: fn(D) -> D) {
        self.steps.insert(from_version, step);
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn migrate(&self, mut document: D) -> Result<D, MigrationLoopError> {
        for _ in 0..MIGRATION_ITERATION_GUARD {
            let version = document.version();
            match self.steps.get(&version) {
                Some(step) => {
                    document = step(document);
                    tracing::warn!(
                        from = version,
                        to = document.version(),
                        "applied schema migration"
                    );
                }
                None => return Ok(document),
            }
        }
        if self.steps.contains_key(&document.version()) {
            return Err(MigrationLoopError {
                version: document.version(),
            });
        }
        Ok(document)
    }
}

impl<D: Versioned> Default for MigrationTable<D> {
    fn default() -> Self {
        Self::new()
    }
}

/// Shipped tech-tree migrations.
pub fn tech_tree_migrations() -> MigrationTable<TechTreeDocument> {
    let mut table = MigrationTable::new();
    table.register(1, tech_tree_v1_to_v2);
    table
}

/// v1 kept a single free-form `metadata.culture` string; v2 models culture
/// membership as the `cultureTags` collection.
fn tech_tree_v1_to_v2(mut doc: TechTreeDocument) -> TechTreeDocument {
    if let Some(serde_json::Value::String(culture)) = doc.metadata.shift_remove("culture") {
        let token = normalize_ident(&culture);
        if !token.is_empty() && !doc.culture_tags.contains(&token) {
            doc.culture_tags.push(token);
            doc.culture_tags.sort();
        }
    }
    doc.version = TECH_TREE_SCHEMA_VERSION;
    doc
}

/// Shipped room-blueprint migrations.
pub fn room_blueprint_migrations() -> MigrationTable<RoomBlueprintDocument> {
    let mut table = MigrationTable::new();
    table.register(1, room_blueprint_v1_to_v2);
    table
}

/// v1 used the retired hazard token `short_circuit`; v2 folds it into
/// `electrical`.
fn room_blueprint_v1_to_v2(mut doc: RoomBlueprintDocument) -> RoomBlueprintDocument {
    let mut renamed = false;
    for hazard in &mut doc.hazards {
        if hazard == "short_circuit" {
            *hazard = "electrical".to_string();
            renamed = true;
        }
    }
    if renamed {
        doc.hazards.sort();
        doc.hazards.dedup();
    }
    doc.version = ROOM_BLUEPRINT_SCHEMA_VERSION;
    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn tree(version: u32) -> TechTreeDocument {
        TechTreeDocument {
            id: "t".into(),
            version,
            name: "T".into(),
            engine_min_version: None,
            nodes: vec![],
            culture_tags: vec![],
            metadata: Map::new(),
        }
    }

    #[test]
    fn current_version_is_untouched() {
        let table = tech_tree_migrations();
        let migrated = table.migrate(tree(TECH_TREE_SCHEMA_VERSION)).unwrap();
        assert_eq!(migrated.version, TECH_TREE_SCHEMA_VERSION);
    }

    #[test]
    fn v1_culture_metadata_becomes_a_tag() {
        let mut doc = tree(1);
        doc.metadata
            .insert("culture".into(), serde_json::Value::String("Agrarian".into()));
        let migrated = tech_tree_migrations().migrate(doc).unwrap();
        assert_eq!(migrated.version, TECH_TREE_SCHEMA_VERSION);
        assert_eq!(migrated.culture_tags, vec!["agrarian"]);
        assert!(migrated.metadata.get("culture").is_none());
    }

    #[test]
    fn cyclic_table_trips_the_guard() {
        let mut table: MigrationTable<TechTreeDocument> = MigrationTable::new();
        table.register(7, |mut d| {
            d.version = 8;
            d
        });
        table.register(8, |mut d| {
            d.version = 7;
            d
        });
        let err = table.migrate(tree(7)).unwrap_err();
        assert!(err.version == 7 || err.version == 8);
    }

    #[test]
    fn non_advancing_step_trips_the_guard() {
        let mut table: MigrationTable<TechTreeDocument> = MigrationTable::new();
        table.register(3, |d| d);
        let err = table.migrate(tree(3)).unwrap_err();
        assert_eq!(err.version, 3);
    }

    #[test]
    fn short_circuit_hazard_is_folded_into_electrical() {
        let doc = RoomBlueprintDocument {
            id: "r".into(),
            version: 1,
            name: "R".into(),
            purpose: "P".into(),
            width: 32,
            height: 32,
            engine_min_version: None,
            features: vec!["bunk".into()],
            hazards: vec!["electrical".into(), "short_circuit".into()],
            sockets: vec![],
            prerequisites: vec![],
            culture_tags: vec![],
            metadata: Map::new(),
        };
        let migrated = room_blueprint_migrations().migrate(doc).unwrap();
        assert_eq!(migrated.hazards, vec!["electrical"]);
    }
}
