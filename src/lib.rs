//! CanonForge Core - Document Canonicalization Engine
//!
//! # The Five Guarantees (Non-Negotiable)
//! 1. Canonical Output Is Byte-Stable
//! 2. Every Failure Is A Report
//! 3. Validation Is Never Bypassed
//! 4. Ordering Is Input-Independent
//! 5. Round-Trips Are Idempotent

pub mod canonical;
pub mod effects;
pub mod graph;
pub mod ident;
pub mod issues;
pub mod migrate;
pub mod model;
pub mod normalize;
pub mod order;
pub mod pipeline;
pub mod validate;
pub mod vocab;

pub use canonical::{compute_content_address, compute_document_hash, to_canonical_json};
pub use effects::{Effect, EffectKind};
pub use issues::{Severity, ValidationIssue, ValidationReport};
pub use migrate::{MigrationLoopError, MigrationTable, MIGRATION_ITERATION_GUARD};
pub use model::{
    DocumentKind, Prerequisite, RoomBlueprintDocument, Socket, TechNode, TechTreeDocument,
};
pub use normalize::{RawPayload, VocabularyMode};
pub use pipeline::{Engine, EngineOptions, Export, Import, PipelineError};
pub use vocab::{Vocabulary, VocabularyRegistry};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
