//! Document Normalization
//!
//! Four stages per document kind: parse, coerce, default-fill,
//! alias-resolve. The raw payload is never mutated; every stage reads the
//! parsed value and writes into a fresh typed document, collecting issues
//! as it goes. A parse failure is itself an issue at path "root" - callers
//! always receive a report, even for garbage input.

use serde_json::{Map, Value};

use crate::effects::{Effect, EffectKind};
use crate::ident::normalize_ident;
use crate::issues::ValidationIssue;
use crate::model::{
    Cost, CostPhase, Position, PrereqRelation, Prerequisite, RoomBlueprintDocument, Socket,
    TechNode, TechTreeDocument, DIMENSION_MIN, ROOM_BLUEPRINT_SCHEMA_VERSION, TIER_MIN,
    TECH_TREE_SCHEMA_VERSION,
};
use crate::vocab::{
    Vocabulary, VocabularyRegistry, VOCAB_CULTURE_TAGS, VOCAB_GOODS, VOCAB_HAZARDS,
    VOCAB_RESOURCES, VOCAB_SOCKET_KINDS, VOCAB_STRUCTURES,
};

/// Whether unknown vocabulary tokens are errors (dropped) or warnings
/// (retained under their normalized spelling).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VocabularyMode {
    Strict,
    #[default]
    Lenient,
}

/// Input to an import entry point: raw text or a pre-parsed value.
#[derive(Debug, Clone)]
pub enum RawPayload {
    Text(String),
    Value(Value),
}

impl From<&str> for RawPayload {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for RawPayload {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Value> for RawPayload {
    fn from(v: Value) -> Self {
        Self::Value(v)
    }
}

pub fn parse_payload(payload: RawPayload) -> Result<Value, ValidationIssue> {
    match payload {
        RawPayload::Value(v) => Ok(v),
        RawPayload::Text(text) => serde_json::from_str(&text)
            .map_err(|e| ValidationIssue::parse_error(format!("invalid JSON: {e}"))),
    }
}

#[derive(Debug, Clone)]
pub struct NormalizeOutcome<D> {
    pub document: D,
    pub issues: Vec<ValidationIssue>,
}

// --- Field coercion helpers ---

fn lookup<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| obj.get(*k))
}

fn str_field(
    obj: &Map<String, Value>,
    keys: &[&str],
    path: &str,
    required: bool,
    issues: &mut Vec<ValidationIssue>,
) -> Option<String> {
    match lookup(obj, keys) {
        None => {
            if required {
                issues.push(ValidationIssue::schema_error(
                    path,
                    "missing required field",
                ));
            }
            None
        }
        Some(Value::String(raw)) => {
            let trimmed = raw.trim();
            if trimmed.len() != raw.len() {
                issues.push(ValidationIssue::warning(
                    path,
                    "leading/trailing whitespace was trimmed",
                ));
            }
            Some(trimmed.to_string())
        }
        Some(_) => {
            issues.push(ValidationIssue::schema_error(path, "must be a string"));
            None
        }
    }
}

fn token_field(
    obj: &Map<String, Value>,
    keys: &[&str],
    path: &str,
    issues: &mut Vec<ValidationIssue>,
) -> String {
    let raw = str_field(obj, keys, path, true, issues).unwrap_or_default();
    let token = normalize_ident(&raw);
    if token.is_empty() && lookup(obj, keys).is_some() {
        issues.push(ValidationIssue::schema_error(
            path,
            "identifier cannot be empty",
        ));
    }
    token
}

fn int_field(
    obj: &Map<String, Value>,
    keys: &[&str],
    path: &str,
    required: bool,
    default: i64,
    issues: &mut Vec<ValidationIssue>,
) -> i64 {
    match lookup(obj, keys) {
        None => {
            if required {
                issues.push(ValidationIssue::schema_error(
                    path,
                    "missing required field",
                ));
            }
            default
        }
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                i
            } else if let Some(f) = n.as_f64() {
                if !f.is_finite() {
                    issues.push(ValidationIssue::range_error(
                        path,
                        "must be a finite number",
                    ));
                    default
                } else {
                    issues.push(ValidationIssue::range_error(
                        path,
                        format!("must be an integer, got {f}"),
                    ));
                    default
                }
            } else {
                issues.push(ValidationIssue::range_error(path, "must be an integer"));
                default
            }
        }
        Some(Value::String(s)) => match s.trim().parse::<i64>() {
            Ok(i) => {
                issues.push(ValidationIssue::warning(
                    path,
                    format!("number coerced from string \"{s}\""),
                ));
                i
            }
            Err(_) => {
                issues.push(ValidationIssue::schema_error(path, "must be a number"));
                default
            }
        },
        Some(_) => {
            issues.push(ValidationIssue::schema_error(path, "must be a number"));
            default
        }
    }
}

fn float_field(
    obj: &Map<String, Value>,
    keys: &[&str],
    path: &str,
    required: bool,
    default: f64,
    issues: &mut Vec<ValidationIssue>,
) -> f64 {
    match lookup(obj, keys) {
        None => {
            if required {
                issues.push(ValidationIssue::schema_error(
                    path,
                    "missing required field",
                ));
            }
            default
        }
        Some(Value::Number(n)) => n.as_f64().unwrap_or_else(|| {
            issues.push(ValidationIssue::range_error(
                path,
                "must be a finite number",
            ));
            default
        }),
        Some(Value::String(s)) => match s.trim().parse::<f64>() {
            Ok(f) if f.is_finite() => {
                issues.push(ValidationIssue::warning(
                    path,
                    format!("number coerced from string \"{s}\""),
                ));
                f
            }
            _ => {
                issues.push(ValidationIssue::schema_error(path, "must be a number"));
                default
            }
        },
        Some(_) => {
            issues.push(ValidationIssue::schema_error(path, "must be a number"));
            default
        }
    }
}

fn version_field(obj: &Map<String, Value>, issues: &mut Vec<ValidationIssue>) -> u32 {
    let v = int_field(obj, &["version"], "version", false, 1, issues);
    if v < 0 {
        issues.push(ValidationIssue::range_error(
            "version",
            format!("version must be a non-negative integer, got {v}"),
        ));
        1
    } else {
        v as u32
    }
}

/// Raw string list; preserves input order, keeps empty-after-trim entries
/// for the structural validator to judge.
fn string_list(
    obj: &Map<String, Value>,
    keys: &[&str],
    path: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Vec<String> {
    match lookup(obj, keys) {
        None => Vec::new(),
        Some(Value::Array(items)) => {
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                match item {
                    Value::String(raw) => {
                        let trimmed = raw.trim();
                        if trimmed.len() != raw.len() {
                            issues.push(ValidationIssue::warning(
                                format!("{path}[{i}]"),
                                "leading/trailing whitespace was trimmed",
                            ));
                        }
                        out.push(trimmed.to_string());
                    }
                    _ => {
                        issues.push(ValidationIssue::schema_error(
                            format!("{path}[{i}]"),
                            "must be a string",
                        ));
                    }
                }
            }
            out
        }
        Some(_) => {
            issues.push(ValidationIssue::schema_error(path, "must be an array"));
            Vec::new()
        }
    }
}

/// Route a list-valued field through its vocabulary. Output is lexically
/// sorted and deduplicated per `dedup`; unknown tokens are dropped under
/// strict mode and retained (normalized) under lenient mode.
fn vocab_list(
    raw: &[String],
    vocab: &Vocabulary,
    path: &str,
    mode: VocabularyMode,
    dedup: bool,
    issues: &mut Vec<ValidationIssue>,
) -> Vec<String> {
    let batch = vocab.resolve_all(raw, dedup);

    for unknown in &batch.unknown {
        let element_path = format!("{path}[{}]", unknown.index);
        match mode {
            VocabularyMode::Strict => {
                issues.push(ValidationIssue::vocabulary_error(
                    element_path,
                    &unknown.raw,
                    vocab.name(),
                ));
            }
            VocabularyMode::Lenient => {
                issues.push(ValidationIssue::warning(
                    element_path,
                    format!(
                        "unknown {} token \"{}\" retained as \"{}\"",
                        vocab.name(),
                        unknown.raw,
                        unknown.normalized
                    ),
                ));
            }
        }
    }

    if !dedup {
        for token in &batch.duplicates {
            issues.push(ValidationIssue::warning(
                path,
                format!("duplicate token \"{token}\" retained"),
            ));
        }
    }

    match mode {
        VocabularyMode::Strict => batch
            .values
            .into_iter()
            .zip(batch.known)
            .filter(|(_, known)| *known)
            .map(|(value, _)| value)
            .collect(),
        VocabularyMode::Lenient => batch.values,
    }
}

/// Resolve a single vocabulary-bound token field (socket kind, cost
/// resource, effect target).
fn resolve_token(
    raw: &str,
    vocab: &Vocabulary,
    path: &str,
    mode: VocabularyMode,
    issues: &mut Vec<ValidationIssue>,
) -> String {
    let resolution = vocab.resolve(raw);
    if !resolution.known() {
        match mode {
            VocabularyMode::Strict => {
                issues.push(ValidationIssue::vocabulary_error(path, raw, vocab.name()));
            }
            VocabularyMode::Lenient => {
                issues.push(ValidationIssue::warning(
                    path,
                    format!(
                        "unknown {} token \"{}\" retained as \"{}\"",
                        vocab.name(),
                        raw,
                        resolution.normalized
                    ),
                ));
            }
        }
    }
    resolution.value().to_string()
}

fn metadata_field(obj: &Map<String, Value>, issues: &mut Vec<ValidationIssue>) -> Map<String, Value> {
    match obj.get("metadata") {
        None => Map::new(),
        Some(Value::Object(map)) => map.clone(),
        Some(_) => {
            issues.push(ValidationIssue::schema_error(
                "metadata",
                "must be an object",
            ));
            Map::new()
        }
    }
}

fn note_unrecognized_fields(
    obj: &Map<String, Value>,
    known: &[&str],
    issues: &mut Vec<ValidationIssue>,
) {
    for key in obj.keys() {
        if !known.contains(&key.as_str()) {
            issues.push(ValidationIssue::info(
                key.clone(),
                format!("unrecognized field \"{key}\" ignored"),
            ));
        }
    }
}

fn as_object<'a>(
    value: &'a Value,
    path: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Option<&'a Map<String, Value>> {
    match value {
        Value::Object(map) => Some(map),
        _ => {
            issues.push(ValidationIssue::schema_error(
                path,
                "must be a JSON object",
            ));
            None
        }
    }
}

// --- Prerequisites (shared by both document kinds) ---

fn prerequisites_field(
    obj: &Map<String, Value>,
    path: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Vec<Prerequisite> {
    let Some(value) = lookup(obj, &["prerequisites"]) else {
        return Vec::new();
    };
    let Value::Array(items) = value else {
        issues.push(ValidationIssue::schema_error(path, "must be an array"));
        return Vec::new();
    };

    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let element_path = format!("{path}[{i}]");
        match item {
            // Bare-string shorthand for a hard requirement.
            Value::String(raw) => {
                let target = normalize_ident(raw);
                if target.is_empty() {
                    issues.push(ValidationIssue::schema_error(
                        &element_path,
                        "identifier cannot be empty",
                    ));
                    continue;
                }
                out.push(Prerequisite {
                    target,
                    relation: PrereqRelation::Requires,
                });
            }
            Value::Object(entry) => {
                let target = token_field(
                    entry,
                    &["target", "targetId", "target_id"],
                    &format!("{element_path}.target"),
                    issues,
                );
                let relation = enum_token_field(
                    entry,
                    &["relation"],
                    &format!("{element_path}.relation"),
                    &PrereqRelation::ALL,
                    PrereqRelation::as_str,
                    PrereqRelation::default(),
                    issues,
                );
                if target.is_empty() {
                    continue;
                }
                out.push(Prerequisite { target, relation });
            }
            _ => {
                issues.push(ValidationIssue::schema_error(
                    element_path,
                    "must be a string or an object",
                ));
            }
        }
    }
    out
}

/// Coerce a closed-enum token field, defaulting and erroring with the
/// allowed values when the token is not a member.
fn enum_token_field<T: Copy>(
    obj: &Map<String, Value>,
    keys: &[&str],
    path: &str,
    all: &[T],
    as_str: fn(&T) -> &'static str,
    default: T,
    issues: &mut Vec<ValidationIssue>,
) -> T {
    let Some(raw) = str_field(obj, keys, path, false, issues) else {
        return default;
    };
    let token = normalize_ident(&raw);
    match all.iter().find(|v| as_str(v) == token) {
        Some(found) => *found,
        None => {
            let allowed: Vec<&str> = all.iter().map(as_str).collect();
            issues.push(
                ValidationIssue::schema_error(path, format!("unknown value \"{raw}\""))
                    .with_suggestion(format!("one of: {}", allowed.join(", "))),
            );
            default
        }
    }
}

// --- Tech tree ---

const TECH_TREE_KEYS: &[&str] = &[
    "id",
    "version",
    "name",
    "engineMinVersion",
    "engine_min_version",
    "nodes",
    "cultureTags",
    "culture_tags",
    "metadata",
];

pub fn normalize_tech_tree(
    value: &Value,
    registry: &VocabularyRegistry,
    mode: VocabularyMode,
) -> NormalizeOutcome<TechTreeDocument> {
    let mut issues = Vec::new();
    let Some(obj) = as_object(value, "root", &mut issues) else {
        return NormalizeOutcome {
            document: empty_tech_tree(),
            issues,
        };
    };

    note_unrecognized_fields(obj, TECH_TREE_KEYS, &mut issues);

    let id = token_field(obj, &["id"], "id", &mut issues);
    let version = version_field(obj, &mut issues);
    let name = str_field(obj, &["name"], "name", false, &mut issues).unwrap_or_default();
    let engine_min_version = str_field(
        obj,
        &["engineMinVersion", "engine_min_version"],
        "engineMinVersion",
        false,
        &mut issues,
    );

    let mut nodes = Vec::new();
    match lookup(obj, &["nodes"]) {
        None => {}
        Some(Value::Array(items)) => {
            for (i, item) in items.iter().enumerate() {
                let path = format!("nodes[{i}]");
                if let Some(entry) = as_object(item, &path, &mut issues) {
                    nodes.push(normalize_tech_node(entry, &path, registry, mode, &mut issues));
                }
            }
        }
        Some(_) => {
            issues.push(ValidationIssue::schema_error("nodes", "must be an array"));
        }
    }

    let culture_raw = string_list(obj, &["cultureTags", "culture_tags"], "cultureTags", &mut issues);
    let culture_tags = vocab_list(
        &culture_raw,
        registry.get(VOCAB_CULTURE_TAGS).expect("built-in vocabulary"),
        "cultureTags",
        mode,
        true,
        &mut issues,
    );

    let metadata = metadata_field(obj, &mut issues);

    tracing::debug!(
        document = %id,
        nodes = nodes.len(),
        issues = issues.len(),
        "normalized tech tree"
    );

    NormalizeOutcome {
        document: TechTreeDocument {
            id,
            version,
            name,
            engine_min_version,
            nodes,
            culture_tags,
            metadata,
        },
        issues,
    }
}

fn empty_tech_tree() -> TechTreeDocument {
    TechTreeDocument {
        id: String::new(),
        version: TECH_TREE_SCHEMA_VERSION,
        name: String::new(),
        engine_min_version: None,
        nodes: Vec::new(),
        culture_tags: Vec::new(),
        metadata: Map::new(),
    }
}

fn normalize_tech_node(
    obj: &Map<String, Value>,
    path: &str,
    registry: &VocabularyRegistry,
    mode: VocabularyMode,
    issues: &mut Vec<ValidationIssue>,
) -> TechNode {
    let id = token_field(obj, &["id"], &format!("{path}.id"), issues);
    let title = str_field(obj, &["title", "name"], &format!("{path}.title"), false, issues)
        .unwrap_or_default();
    let tier = {
        let p = format!("{path}.tier");
        int_field(obj, &["tier"], &p, true, TIER_MIN, issues)
    };
    let display_order = int_field(
        obj,
        &["displayOrder", "display_order"],
        &format!("{path}.displayOrder"),
        false,
        0,
        issues,
    );

    let mut effects = Vec::new();
    match lookup(obj, &["effects"]) {
        None => {}
        Some(Value::Array(items)) => {
            for (i, item) in items.iter().enumerate() {
                let effect_path = format!("{path}.effects[{i}]");
                let Some(entry) = as_object(item, &effect_path, issues) else {
                    continue;
                };
                if let Some(effect) =
                    normalize_effect(entry, &effect_path, registry, mode, issues)
                {
                    effects.push(effect);
                }
            }
        }
        Some(_) => {
            issues.push(ValidationIssue::schema_error(
                format!("{path}.effects"),
                "must be an array",
            ));
        }
    }

    let prerequisites = prerequisites_field(obj, &format!("{path}.prerequisites"), issues);

    let structures_raw = string_list(
        obj,
        &["unlocksStructures", "unlocks_structures"],
        &format!("{path}.unlocksStructures"),
        issues,
    );
    let unlocks_structures = vocab_list(
        &structures_raw,
        registry.get(VOCAB_STRUCTURES).expect("built-in vocabulary"),
        &format!("{path}.unlocksStructures"),
        mode,
        true,
        issues,
    );

    let goods_raw = string_list(
        obj,
        &["unlocksGoods", "unlocks_goods"],
        &format!("{path}.unlocksGoods"),
        issues,
    );
    let unlocks_goods = vocab_list(
        &goods_raw,
        registry.get(VOCAB_GOODS).expect("built-in vocabulary"),
        &format!("{path}.unlocksGoods"),
        mode,
        true,
        issues,
    );

    let costs = costs_field(obj, &format!("{path}.costs"), registry, mode, issues);

    TechNode {
        id,
        title,
        tier,
        display_order,
        effects,
        prerequisites,
        unlocks_structures,
        unlocks_goods,
        costs,
    }
}

fn normalize_effect(
    obj: &Map<String, Value>,
    path: &str,
    registry: &VocabularyRegistry,
    mode: VocabularyMode,
    issues: &mut Vec<ValidationIssue>,
) -> Option<Effect> {
    let raw_kind = str_field(obj, &["kind"], &format!("{path}.kind"), true, issues)?;
    let token = normalize_ident(&raw_kind);
    let Some(kind) = EffectKind::ALL.iter().copied().find(|k| k.as_str() == token) else {
        let allowed: Vec<&str> = EffectKind::ALL.iter().map(EffectKind::as_str).collect();
        issues.push(
            ValidationIssue::schema_error(
                format!("{path}.kind"),
                format!("unknown effect kind \"{raw_kind}\""),
            )
            .with_suggestion(format!("one of: {}", allowed.join(", "))),
        );
        return None;
    };

    let magnitude = float_field(obj, &["magnitude"], &format!("{path}.magnitude"), false, 1.0, issues);

    let target = str_field(obj, &["target"], &format!("{path}.target"), false, issues)
        .filter(|t| !t.is_empty())
        .map(|raw| match kind.target_vocabulary().and_then(|v| registry.get(v)) {
            Some(vocab) => resolve_token(&raw, vocab, &format!("{path}.target"), mode, issues),
            None => normalize_ident(&raw),
        });

    Some(Effect {
        kind,
        magnitude,
        target,
    })
}

fn costs_field(
    obj: &Map<String, Value>,
    path: &str,
    registry: &VocabularyRegistry,
    mode: VocabularyMode,
    issues: &mut Vec<ValidationIssue>,
) -> Vec<Cost> {
    let Some(value) = lookup(obj, &["costs"]) else {
        return Vec::new();
    };
    let Value::Array(items) = value else {
        issues.push(ValidationIssue::schema_error(path, "must be an array"));
        return Vec::new();
    };

    let resources = registry.get(VOCAB_RESOURCES).expect("built-in vocabulary");
    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let element_path = format!("{path}[{i}]");
        let Some(entry) = as_object(item, &element_path, issues) else {
            continue;
        };
        let raw_resource = str_field(
            entry,
            &["resource"],
            &format!("{element_path}.resource"),
            true,
            issues,
        )
        .unwrap_or_default();
        if raw_resource.is_empty() {
            continue;
        }
        let resource = resolve_token(
            &raw_resource,
            resources,
            &format!("{element_path}.resource"),
            mode,
            issues,
        );
        let phase = enum_token_field(
            entry,
            &["phase"],
            &format!("{element_path}.phase"),
            &CostPhase::ALL,
            CostPhase::as_str,
            CostPhase::default(),
            issues,
        );
        let amount = float_field(
            entry,
            &["amount"],
            &format!("{element_path}.amount"),
            true,
            0.0,
            issues,
        );
        out.push(Cost {
            resource,
            phase,
            amount,
        });
    }
    out
}

// --- Room blueprint ---

const ROOM_BLUEPRINT_KEYS: &[&str] = &[
    "id",
    "version",
    "name",
    "purpose",
    "width",
    "height",
    "engineMinVersion",
    "engine_min_version",
    "features",
    "hazards",
    "sockets",
    "prerequisites",
    "cultureTags",
    "culture_tags",
    "metadata",
];

pub fn normalize_room_blueprint(
    value: &Value,
    registry: &VocabularyRegistry,
    mode: VocabularyMode,
    deduplicate_hazards: bool,
) -> NormalizeOutcome<RoomBlueprintDocument> {
    let mut issues = Vec::new();
    let Some(obj) = as_object(value, "root", &mut issues) else {
        return NormalizeOutcome {
            document: empty_room_blueprint(),
            issues,
        };
    };

    note_unrecognized_fields(obj, ROOM_BLUEPRINT_KEYS, &mut issues);

    let id = token_field(obj, &["id"], "id", &mut issues);
    let version = version_field(obj, &mut issues);
    let name = str_field(obj, &["name"], "name", false, &mut issues).unwrap_or_default();
    let purpose = str_field(obj, &["purpose"], "purpose", false, &mut issues).unwrap_or_default();
    let width = int_field(obj, &["width"], "width", true, DIMENSION_MIN, &mut issues);
    let height = int_field(obj, &["height"], "height", true, DIMENSION_MIN, &mut issues);
    let engine_min_version = str_field(
        obj,
        &["engineMinVersion", "engine_min_version"],
        "engineMinVersion",
        false,
        &mut issues,
    );

    // Authored narrative order; trimmed but never resorted.
    let features = string_list(obj, &["features"], "features", &mut issues);

    let hazards_raw = string_list(obj, &["hazards"], "hazards", &mut issues);
    let hazards = vocab_list(
        &hazards_raw,
        registry.get(VOCAB_HAZARDS).expect("built-in vocabulary"),
        "hazards",
        mode,
        deduplicate_hazards,
        &mut issues,
    );

    let sockets = sockets_field(obj, registry, mode, &mut issues);
    let prerequisites = prerequisites_field(obj, "prerequisites", &mut issues);

    let culture_raw = string_list(obj, &["cultureTags", "culture_tags"], "cultureTags", &mut issues);
    let culture_tags = vocab_list(
        &culture_raw,
        registry.get(VOCAB_CULTURE_TAGS).expect("built-in vocabulary"),
        "cultureTags",
        mode,
        true,
        &mut issues,
    );

    let metadata = metadata_field(obj, &mut issues);

    tracing::debug!(
        document = %id,
        sockets = sockets.len(),
        issues = issues.len(),
        "normalized room blueprint"
    );

    NormalizeOutcome {
        document: RoomBlueprintDocument {
            id,
            version,
            name,
            purpose,
            width,
            height,
            engine_min_version,
            features,
            hazards,
            sockets,
            prerequisites,
            culture_tags,
            metadata,
        },
        issues,
    }
}

fn empty_room_blueprint() -> RoomBlueprintDocument {
    RoomBlueprintDocument {
        id: String::new(),
        version: ROOM_BLUEPRINT_SCHEMA_VERSION,
        name: String::new(),
        purpose: String::new(),
        width: DIMENSION_MIN,
        height: DIMENSION_MIN,
        engine_min_version: None,
        features: Vec::new(),
        hazards: Vec::new(),
        sockets: Vec::new(),
        prerequisites: Vec::new(),
        culture_tags: Vec::new(),
        metadata: Map::new(),
    }
}

fn sockets_field(
    obj: &Map<String, Value>,
    registry: &VocabularyRegistry,
    mode: VocabularyMode,
    issues: &mut Vec<ValidationIssue>,
) -> Vec<Socket> {
    let Some(value) = lookup(obj, &["sockets"]) else {
        return Vec::new();
    };
    let Value::Array(items) = value else {
        issues.push(ValidationIssue::schema_error("sockets", "must be an array"));
        return Vec::new();
    };

    let kinds = registry.get(VOCAB_SOCKET_KINDS).expect("built-in vocabulary");
    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let path = format!("sockets[{i}]");
        let Some(entry) = as_object(item, &path, issues) else {
            continue;
        };

        let id = token_field(entry, &["id"], &format!("{path}.id"), issues);
        let raw_kind = str_field(entry, &["kind"], &format!("{path}.kind"), true, issues)
            .unwrap_or_default();
        let kind = if raw_kind.is_empty() {
            String::new()
        } else {
            resolve_token(&raw_kind, kinds, &format!("{path}.kind"), mode, issues)
        };

        let position = match entry.get("position") {
            Some(Value::Object(pos)) => Position {
                x: int_field(pos, &["x"], &format!("{path}.position.x"), true, 0, issues),
                y: int_field(pos, &["y"], &format!("{path}.position.y"), true, 0, issues),
            },
            Some(_) => {
                issues.push(ValidationIssue::schema_error(
                    format!("{path}.position"),
                    "must be an object",
                ));
                Position { x: 0, y: 0 }
            }
            None => {
                issues.push(ValidationIssue::schema_error(
                    format!("{path}.position"),
                    "missing required field",
                ));
                Position { x: 0, y: 0 }
            }
        };

        let depends_raw = string_list(
            entry,
            &["dependsOn", "depends_on"],
            &format!("{path}.dependsOn"),
            issues,
        );
        let depends_on = depends_raw
            .iter()
            .map(|raw| normalize_ident(raw))
            .filter(|token| !token.is_empty())
            .collect();

        out.push(Socket {
            id,
            kind,
            position,
            depends_on,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> VocabularyRegistry {
        VocabularyRegistry::built_in()
    }

    #[test]
    fn parse_failure_is_an_issue_not_a_panic() {
        let err = parse_payload(RawPayload::from("{not json")).unwrap_err();
        assert_eq!(err.path, "root");
        assert!(err.message.contains("invalid JSON"));
    }

    #[test]
    fn missing_version_defaults_to_one() {
        let value = json!({"id": "t", "name": "T", "nodes": []});
        let outcome = normalize_tech_tree(&value, &registry(), VocabularyMode::Lenient);
        assert_eq!(outcome.document.version, 1);
    }

    #[test]
    fn absent_collections_become_empty() {
        let value = json!({"id": "t", "version": 2, "name": "T"});
        let outcome = normalize_tech_tree(&value, &registry(), VocabularyMode::Lenient);
        assert!(outcome.document.nodes.is_empty());
        assert!(outcome.document.culture_tags.is_empty());
    }

    #[test]
    fn whitespace_trim_is_surfaced() {
        let value = json!({"id": "t", "version": 2, "name": "  Frontier Tech  "});
        let outcome = normalize_tech_tree(&value, &registry(), VocabularyMode::Lenient);
        assert_eq!(outcome.document.name, "Frontier Tech");
        assert!(outcome
            .issues
            .iter()
            .any(|i| i.path == "name" && i.message.contains("whitespace")));
    }

    #[test]
    fn strict_mode_drops_unknown_hazards() {
        let value = json!({
            "id": "r", "version": 2, "name": "R", "purpose": "P",
            "width": 32, "height": 32, "features": ["bunk"],
            "hazards": ["fire", "phantom_hazard"]
        });
        let outcome =
            normalize_room_blueprint(&value, &registry(), VocabularyMode::Strict, true);
        assert_eq!(outcome.document.hazards, vec!["fire"]);
        assert!(outcome
            .issues
            .iter()
            .any(|i| i.path == "hazards[1]" && i.message.contains("phantom_hazard")));
    }

    #[test]
    fn lenient_mode_retains_unknown_hazards_normalized() {
        let value = json!({
            "id": "r", "version": 2, "name": "R", "purpose": "P",
            "width": 32, "height": 32, "features": ["bunk"],
            "hazards": ["Phantom Hazard"]
        });
        let outcome =
            normalize_room_blueprint(&value, &registry(), VocabularyMode::Lenient, true);
        assert_eq!(outcome.document.hazards, vec!["phantom_hazard"]);
    }

    #[test]
    fn bare_string_prerequisite_is_a_hard_requirement() {
        let value = json!({
            "id": "t", "version": 2, "name": "T",
            "nodes": [{"id": "b", "title": "B", "tier": 1, "prerequisites": ["A Node"]}]
        });
        let outcome = normalize_tech_tree(&value, &registry(), VocabularyMode::Lenient);
        let node = &outcome.document.nodes[0];
        assert_eq!(node.prerequisites[0].target, "a_node");
        assert_eq!(node.prerequisites[0].relation, PrereqRelation::Requires);
    }

    #[test]
    fn unrecognized_top_level_field_is_noted() {
        let value = json!({"id": "t", "version": 2, "name": "T", "colour": "blue"});
        let outcome = normalize_tech_tree(&value, &registry(), VocabularyMode::Lenient);
        assert!(outcome
            .issues
            .iter()
            .any(|i| i.path == "colour" && i.message.contains("unrecognized")));
    }
}
