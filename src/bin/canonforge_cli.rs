//! CanonForge CLI - Bridge interface for SDK tooling
//!
//! Commands: vocabularies, validate, canonicalize, hash
//! Outputs JSON to stdout
//! Returns non-zero on validation failure

use clap::{Parser, Subcommand, ValueEnum};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::process::ExitCode;

use canonforge_core::{Engine, EngineOptions, PipelineError, VocabularyMode, VocabularyRegistry};

#[derive(Parser)]
#[command(name = "canonforge-cli")]
#[command(about = "CanonForge CLI - Document Canonicalization Engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a directory of vocabulary pack JSON files
    #[arg(short, long, default_value = "vocabularies")]
    vocab_dir: PathBuf,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    TechTree,
    RoomBlueprint,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Strict,
    Lenient,
}

impl From<ModeArg> for VocabularyMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Strict => VocabularyMode::Strict,
            ModeArg::Lenient => VocabularyMode::Lenient,
        }
    }
}

#[derive(clap::Args)]
struct DocumentArgs {
    /// Document kind
    #[arg(short, long, value_enum)]
    kind: KindArg,

    /// JSON payload
    #[arg(short, long)]
    payload: String,

    /// Vocabulary strictness
    #[arg(short, long, value_enum, default_value = "lenient")]
    mode: ModeArg,

    /// Retain duplicate hazard tokens instead of collapsing them
    #[arg(long)]
    keep_duplicate_hazards: bool,

    /// Blueprint id a prerequisite may reference (repeatable)
    #[arg(long = "known-id")]
    known_ids: Vec<String>,
}

impl DocumentArgs {
    fn options(&self) -> EngineOptions {
        EngineOptions {
            deduplicate_hazards: !self.keep_duplicate_hazards,
            vocabulary_mode: self.mode.into(),
            known_reference_ids: self.known_ids.iter().cloned().collect::<BTreeSet<_>>(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List registered vocabularies
    Vocabularies,

    /// Validate a document and print its report
    Validate(DocumentArgs),

    /// Print a document's canonical serialization
    Canonicalize(DocumentArgs),

    /// Print a document's content address
    Hash(DocumentArgs),
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut registry = VocabularyRegistry::built_in();
    if let Err(e) = registry.load_from_dir(&cli.vocab_dir) {
        eprintln!(r#"{{"error": "Failed to load vocabulary packs: {}"}}"#, e);
        return ExitCode::FAILURE;
    }
    let engine = Engine::with_registry(registry);

    match cli.command {
        Commands::Vocabularies => {
            let vocabularies: Vec<_> = engine
                .vocabularies()
                .list()
                .iter()
                .map(|v| {
                    serde_json::json!({
                        "name": v.name(),
                        "members": v.members().collect::<Vec<_>>(),
                    })
                })
                .collect();

            println!(
                "{}",
                serde_json::to_string_pretty(&vocabularies).unwrap_or_default()
            );
            ExitCode::SUCCESS
        }

        Commands::Validate(args) => {
            let options = args.options();
            let outcome = match args.kind {
                KindArg::TechTree => engine
                    .import_tech_tree(args.payload.as_str(), &options)
                    .map(|i| i.report),
                KindArg::RoomBlueprint => engine
                    .import_room_blueprint(args.payload.as_str(), &options)
                    .map(|i| i.report),
            };

            match outcome {
                Ok(report) => {
                    print_report(true, &report);
                    ExitCode::SUCCESS
                }
                Err(e) => match e.report() {
                    Some(report) => {
                        print_report(false, report);
                        ExitCode::from(2) // Validation failure
                    }
                    None => {
                        println!(r#"{{"valid": false, "error": "{}"}}"#, e);
                        ExitCode::FAILURE
                    }
                },
            }
        }

        Commands::Canonicalize(args) => match export(&engine, &args) {
            Ok((json, _)) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(code) => code,
        },

        Commands::Hash(args) => match export(&engine, &args) {
            Ok((_, content_hash)) => {
                println!(r#"{{"contentHash": "{content_hash}"}}"#);
                ExitCode::SUCCESS
            }
            Err(code) => code,
        },
    }
}

/// Import then export in one step, reducing either document kind to its
/// canonical bytes and content address.
fn export(engine: &Engine, args: &DocumentArgs) -> Result<(String, String), ExitCode> {
    let options = args.options();
    let result = match args.kind {
        KindArg::TechTree => engine
            .import_tech_tree(args.payload.as_str(), &options)
            .and_then(|i| engine.export_tech_tree(&i.ordered_document, &options))
            .map(|e| (e.json, e.content_hash)),
        KindArg::RoomBlueprint => engine
            .import_room_blueprint(args.payload.as_str(), &options)
            .and_then(|i| engine.export_room_blueprint(&i.ordered_document, &options))
            .map(|e| (e.json, e.content_hash)),
    };

    result.map_err(|e: PipelineError| match e.report() {
        Some(report) => {
            print_report(false, report);
            ExitCode::from(2) // Validation failure
        }
        None => {
            println!(r#"{{"valid": false, "error": "{}"}}"#, e);
            ExitCode::FAILURE
        }
    })
}

fn print_report(valid: bool, report: &canonforge_core::ValidationReport) {
    let output = serde_json::json!({
        "valid": valid,
        "issues": report.issues(),
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&output).unwrap_or_default()
    );
}
