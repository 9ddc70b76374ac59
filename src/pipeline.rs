//! Canonicalization Pipeline - Single Entry Point
//!
//! CRITICAL: every import and export runs the full normalize -> migrate ->
//! validate -> order chain internally. No bypass.
//!
//! Failure contract: a result is a hard failure only when the report holds
//! error-severity issues, and the failure always carries the full report.
//! Warnings ride along with success. The one eager abort is a migration
//! loop, where continuing would produce misleading issue paths.

use serde_json::Value;
use std::collections::BTreeSet;
use thiserror::Error;

use crate::canonical::{compute_content_address, to_canonical_json};
use crate::issues::{ValidationIssue, ValidationReport};
use crate::migrate::{
    room_blueprint_migrations, tech_tree_migrations, MigrationLoopError, MigrationTable,
};
use crate::model::{DocumentKind, RoomBlueprintDocument, TechTreeDocument};
use crate::normalize::{
    normalize_room_blueprint, normalize_tech_tree, parse_payload, NormalizeOutcome, RawPayload,
    VocabularyMode,
};
use crate::order::{order_room_blueprint, order_tech_tree};
use crate::validate::{validate_room_blueprint, validate_tech_tree};
use crate::vocab::VocabularyRegistry;
use crate::ENGINE_VERSION;

#[cfg(feature = "test-hooks")]
use std::sync::atomic::{AtomicU32, Ordering};

#[cfg(feature = "test-hooks")]
static VALIDATION_CALL_COUNT: AtomicU32 = AtomicU32::new(0);

#[cfg(feature = "test-hooks")]
pub fn get_validation_call_count() -> u32 {
    VALIDATION_CALL_COUNT.load(Ordering::SeqCst)
}

#[cfg(feature = "test-hooks")]
pub fn reset_validation_call_count() {
    VALIDATION_CALL_COUNT.store(0, Ordering::SeqCst);
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("validation failed with {} error(s)", .report.error_count())]
    ValidationFailed { report: ValidationReport },

    #[error("{source}")]
    MigrationLoop {
        source: MigrationLoopError,
        report: ValidationReport,
    },

    #[error("caller contract violation: {0}")]
    Contract(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PipelineError {
    /// The report attached to this failure, when one exists.
    pub fn report(&self) -> Option<&ValidationReport> {
        match self {
            Self::ValidationFailed { report } | Self::MigrationLoop { report, .. } => {
                Some(report)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Collapse repeated hazard tokens into one entry. When false the
    /// duplicates are retained (still lexically ordered) with a warning.
    pub deduplicate_hazards: bool,
    pub vocabulary_mode: VocabularyMode,
    /// Ids a blueprint prerequisite may legally reference. Empty means the
    /// document is validated in isolation and referential checks are
    /// skipped.
    pub known_reference_ids: BTreeSet<String>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            deduplicate_hazards: true,
            vocabulary_mode: VocabularyMode::default(),
            known_reference_ids: BTreeSet::new(),
        }
    }
}

/// Successful import: the normalized document, its canonical ordering, and
/// everything the validator had to say.
#[derive(Debug, Clone)]
pub struct Import<D> {
    pub document: D,
    pub ordered_document: D,
    pub report: ValidationReport,
}

/// Successful export: canonical bytes plus the content address ledger
/// emitters hash against.
#[derive(Debug, Clone)]
pub struct Export<D> {
    pub json: String,
    pub ordered_document: D,
    pub content_hash: String,
    pub report: ValidationReport,
}

/// The canonicalization engine. Vocabularies and migration tables are
/// fixed at construction; all entry points are pure functions over them,
/// so one instance serves concurrent callers.
pub struct Engine {
    vocabularies: VocabularyRegistry,
    tech_tree_migrations: MigrationTable<TechTreeDocument>,
    room_blueprint_migrations: MigrationTable<RoomBlueprintDocument>,
}

impl Engine {
    pub fn new() -> Self {
        Self::with_registry(VocabularyRegistry::built_in())
    }

    pub fn with_registry(vocabularies: VocabularyRegistry) -> Self {
        Self {
            vocabularies,
            tech_tree_migrations: tech_tree_migrations(),
            room_blueprint_migrations: room_blueprint_migrations(),
        }
    }

    /// Embedder hook: swap in custom migration tables (SDK hosts register
    /// their own schema history).
    pub fn with_migrations(
        vocabularies: VocabularyRegistry,
        tech_tree_migrations: MigrationTable<TechTreeDocument>,
        room_blueprint_migrations: MigrationTable<RoomBlueprintDocument>,
    ) -> Self {
        Self {
            vocabularies,
            tech_tree_migrations,
            room_blueprint_migrations,
        }
    }

    pub fn vocabularies(&self) -> &VocabularyRegistry {
        &self.vocabularies
    }

    // --- Tech trees ---

    pub fn import_tech_tree(
        &self,
        payload: impl Into<RawPayload>,
        options: &EngineOptions,
    ) -> Result<Import<TechTreeDocument>, PipelineError> {
        let value = parse_to_value(payload.into())?;
        self.canonicalize_tech_tree(&value, options)
    }

    pub fn export_tech_tree(
        &self,
        document: &TechTreeDocument,
        options: &EngineOptions,
    ) -> Result<Export<TechTreeDocument>, PipelineError> {
        let value = serde_json::to_value(document)?;
        let imported = self.canonicalize_tech_tree(&value, options)?;
        let json = to_canonical_json(&imported.ordered_document)?;
        let content_hash =
            compute_content_address(DocumentKind::TechTree, ENGINE_VERSION, &json);
        tracing::debug!(document = %imported.ordered_document.id, %content_hash, "exported tech tree");
        Ok(Export {
            json,
            ordered_document: imported.ordered_document,
            content_hash,
            report: imported.report,
        })
    }

    /// One result per element of a JSON array payload. A non-array payload
    /// is a caller-contract violation, not a validation issue.
    pub fn import_tech_tree_batch(
        &self,
        payload: impl Into<RawPayload>,
        options: &EngineOptions,
    ) -> Result<Vec<Result<Import<TechTreeDocument>, PipelineError>>, PipelineError> {
        let items = batch_items(payload.into())?;
        Ok(items
            .iter()
            .map(|item| self.canonicalize_tech_tree(item, options))
            .collect())
    }

    fn canonicalize_tech_tree(
        &self,
        value: &Value,
        options: &EngineOptions,
    ) -> Result<Import<TechTreeDocument>, PipelineError> {
        #[cfg(feature = "test-hooks")]
        VALIDATION_CALL_COUNT.fetch_add(1, Ordering::SeqCst);

        let NormalizeOutcome {
            document,
            mut issues,
        } = normalize_tech_tree(value, &self.vocabularies, options.vocabulary_mode);

        issues.extend(check_engine_version(document.engine_min_version.as_deref()));

        let document = match self.tech_tree_migrations.migrate(document) {
            Ok(doc) => doc,
            Err(source) => return Err(migration_loop(source, issues)),
        };

        issues.extend(validate_tech_tree(&document));
        let report = ValidationReport::from_issues(issues);
        if report.has_errors() {
            return Err(PipelineError::ValidationFailed { report });
        }

        let ordered_document = order_tech_tree(&document);
        Ok(Import {
            document,
            ordered_document,
            report,
        })
    }

    // --- Room blueprints ---

    pub fn import_room_blueprint(
        &self,
        payload: impl Into<RawPayload>,
        options: &EngineOptions,
    ) -> Result<Import<RoomBlueprintDocument>, PipelineError> {
        let value = parse_to_value(payload.into())?;
        self.canonicalize_room_blueprint(&value, options)
    }

    pub fn export_room_blueprint(
        &self,
        document: &RoomBlueprintDocument,
        options: &EngineOptions,
    ) -> Result<Export<RoomBlueprintDocument>, PipelineError> {
        let value = serde_json::to_value(document)?;
        let imported = self.canonicalize_room_blueprint(&value, options)?;
        let json = to_canonical_json(&imported.ordered_document)?;
        let content_hash =
            compute_content_address(DocumentKind::RoomBlueprint, ENGINE_VERSION, &json);
        tracing::debug!(document = %imported.ordered_document.id, %content_hash, "exported room blueprint");
        Ok(Export {
            json,
            ordered_document: imported.ordered_document,
            content_hash,
            report: imported.report,
        })
    }

    pub fn import_room_blueprint_batch(
        &self,
        payload: impl Into<RawPayload>,
        options: &EngineOptions,
    ) -> Result<Vec<Result<Import<RoomBlueprintDocument>, PipelineError>>, PipelineError> {
        let items = batch_items(payload.into())?;
        Ok(items
            .iter()
            .map(|item| self.canonicalize_room_blueprint(item, options))
            .collect())
    }

    fn canonicalize_room_blueprint(
        &self,
        value: &Value,
        options: &EngineOptions,
    ) -> Result<Import<RoomBlueprintDocument>, PipelineError> {
        #[cfg(feature = "test-hooks")]
        VALIDATION_CALL_COUNT.fetch_add(1, Ordering::SeqCst);

        let NormalizeOutcome {
            document,
            mut issues,
        } = normalize_room_blueprint(
            value,
            &self.vocabularies,
            options.vocabulary_mode,
            options.deduplicate_hazards,
        );

        issues.extend(check_engine_version(document.engine_min_version.as_deref()));

        let document = match self.room_blueprint_migrations.migrate(document) {
            Ok(doc) => doc,
            Err(source) => return Err(migration_loop(source, issues)),
        };

        issues.extend(validate_room_blueprint(
            &document,
            &options.known_reference_ids,
        ));
        let report = ValidationReport::from_issues(issues);
        if report.has_errors() {
            return Err(PipelineError::ValidationFailed { report });
        }

        let ordered_document = order_room_blueprint(&document);
        Ok(Import {
            document,
            ordered_document,
            report,
        })
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_to_value(payload: RawPayload) -> Result<Value, PipelineError> {
    parse_payload(payload).map_err(|issue| PipelineError::ValidationFailed {
        report: ValidationReport::from_issues(vec![issue]),
    })
}

fn batch_items(payload: RawPayload) -> Result<Vec<Value>, PipelineError> {
    let value = parse_payload(payload)
        .map_err(|issue| PipelineError::Contract(format!("batch payload: {}", issue.message)))?;
    match value {
        Value::Array(items) => Ok(items),
        _ => Err(PipelineError::Contract(
            "batch payload must be a JSON array".to_string(),
        )),
    }
}

fn migration_loop(source: MigrationLoopError, mut issues: Vec<ValidationIssue>) -> PipelineError {
    issues.push(ValidationIssue::error("version", source.to_string()));
    PipelineError::MigrationLoop {
        source,
        report: ValidationReport::from_issues(issues),
    }
}

/// Documents may pin a minimum engine version; a document authored for a
/// newer engine is rejected before deeper validation can mislead.
fn check_engine_version(declared: Option<&str>) -> Vec<ValidationIssue> {
    let Some(raw) = declared else {
        return Vec::new();
    };
    let required = match semver::Version::parse(raw) {
        Ok(v) => v,
        Err(_) => {
            return vec![ValidationIssue::warning(
                "engineMinVersion",
                format!("\"{raw}\" is not a valid semantic version; ignoring"),
            )];
        }
    };
    match semver::Version::parse(ENGINE_VERSION) {
        Ok(current) if current < required => {
            vec![ValidationIssue::error(
                "engineMinVersion",
                format!("document requires engine >= {required}, current is {current}"),
            )]
        }
        Ok(_) => Vec::new(),
        Err(_) => vec![ValidationIssue::error(
            "engineMinVersion",
            "engine version is not valid semver",
        )],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn malformed_input_yields_a_report_not_a_panic() {
        let engine = Engine::new();
        let err = engine
            .import_tech_tree("{definitely not json", &EngineOptions::default())
            .unwrap_err();
        let report = err.report().expect("failure carries a report");
        assert!(report.has_errors());
        assert_eq!(report.issues()[0].path, "root");
    }

    #[test]
    fn warnings_never_block() {
        let engine = Engine::new();
        let value = json!({
            "id": "t", "version": 2, "name": "  Padded  ",
            "nodes": [{"id": "a", "title": "A", "tier": 1}]
        });
        let imported = engine
            .import_tech_tree(value, &EngineOptions::default())
            .unwrap();
        assert!(imported.report.warnings().count() > 0);
    }

    #[test]
    fn batch_rejects_non_array_payload() {
        let engine = Engine::new();
        let err = engine
            .import_tech_tree_batch(json!({"id": "t"}), &EngineOptions::default())
            .unwrap_err();
        assert!(matches!(err, PipelineError::Contract(_)));
    }

    #[test]
    fn future_engine_requirement_is_rejected() {
        let engine = Engine::new();
        let value = json!({
            "id": "t", "version": 2, "name": "T",
            "engineMinVersion": "99.0.0",
            "nodes": []
        });
        let err = engine
            .import_tech_tree(value, &EngineOptions::default())
            .unwrap_err();
        let report = err.report().unwrap();
        assert!(report
            .errors()
            .any(|i| i.path == "engineMinVersion" && i.message.contains("requires engine")));
    }
}
