//! Vocabularies and Alias Resolution
//!
//! A vocabulary is a closed set of canonical tokens for one field family
//! (hazards, goods, socket kinds, ...). An alias table maps human synonyms
//! ("Water ingress") onto canonical members (`flooding`). Both are indexed
//! once, by normalized token, and read-only afterwards.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::Path;

use crate::ident::normalize_ident;

pub const VOCAB_HAZARDS: &str = "hazards";
pub const VOCAB_STRUCTURES: &str = "structures";
pub const VOCAB_GOODS: &str = "goods";
pub const VOCAB_CULTURE_TAGS: &str = "culture_tags";
pub const VOCAB_SOCKET_KINDS: &str = "socket_kinds";
pub const VOCAB_RESOURCES: &str = "resources";

/// Outcome of resolving one input token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Canonical vocabulary member, when the token resolved.
    pub canonical: Option<String>,
    /// Normalized form of the input, carried forward as the best-effort
    /// identifier when the token is unknown.
    pub normalized: String,
}

impl Resolution {
    pub fn known(&self) -> bool {
        self.canonical.is_some()
    }

    /// Canonical value if known, normalized input otherwise.
    pub fn value(&self) -> &str {
        self.canonical.as_deref().unwrap_or(&self.normalized)
    }
}

/// An unknown token inside a batch, positioned by input index so issue
/// paths can address the offending element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownToken {
    pub index: usize,
    pub raw: String,
    pub normalized: String,
}

/// Result of resolving a whole list-valued field.
#[derive(Debug, Clone, Default)]
pub struct BatchResolution {
    /// Resolved values, lexically sorted; deduplicated per the caller's flag.
    /// Unknown tokens appear under their normalized spelling.
    pub values: Vec<String>,
    /// Per-value knownness, parallel to `values`.
    pub known: Vec<bool>,
    pub unknown: Vec<UnknownToken>,
    /// Tokens that occurred more than once in the input, sorted, one entry
    /// per distinct duplicated value.
    pub duplicates: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Vocabulary {
    name: String,
    members: BTreeSet<String>,
    /// normalized token -> canonical member. Canonical entries always win
    /// over aliases on conflict.
    index: HashMap<String, String>,
}

impl Vocabulary {
    pub fn new(name: impl Into<String>, members: &[&str]) -> Self {
        let name = name.into();
        let mut vocab = Self {
            name,
            members: BTreeSet::new(),
            index: HashMap::new(),
        };
        for member in members {
            vocab.add_member(member);
        }
        vocab
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(String::as_str)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.members.contains(token)
    }

    fn add_member(&mut self, member: &str) {
        let canonical = normalize_ident(member);
        if canonical.is_empty() {
            tracing::warn!(vocabulary = %self.name, raw = member, "skipping empty vocabulary member");
            return;
        }
        self.index.insert(canonical.clone(), canonical.clone());
        self.members.insert(canonical);
    }

    /// Register a synonym for an existing member. Aliases never displace a
    /// canonical entry, and an alias whose target is not a member is skipped.
    pub fn add_alias(&mut self, alias: &str, target: &str) {
        let target = normalize_ident(target);
        if !self.members.contains(&target) {
            tracing::warn!(
                vocabulary = %self.name,
                alias,
                target = %target,
                "alias target is not a vocabulary member; skipping"
            );
            return;
        }
        let key = normalize_ident(alias);
        if key.is_empty() {
            return;
        }
        self.index.entry(key).or_insert(target);
    }

    pub fn resolve(&self, raw: &str) -> Resolution {
        let normalized = normalize_ident(raw);
        Resolution {
            canonical: self.index.get(&normalized).cloned(),
            normalized,
        }
    }

    /// Resolve a list-valued field. Output is deduplicated per `dedup` and
    /// always lexically sorted, which is what makes list-valued fields
    /// order-independent of their input.
    pub fn resolve_all(&self, raw: &[String], dedup: bool) -> BatchResolution {
        let mut resolved: Vec<(String, bool)> = Vec::with_capacity(raw.len());
        let mut unknown = Vec::new();
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();

        for (index, token) in raw.iter().enumerate() {
            let resolution = self.resolve(token);
            let value = resolution.value().to_string();
            if !resolution.known() {
                unknown.push(UnknownToken {
                    index,
                    raw: token.clone(),
                    normalized: resolution.normalized.clone(),
                });
            }
            *counts.entry(value.clone()).or_insert(0) += 1;
            resolved.push((value, resolution.known()));
        }

        resolved.sort();
        if dedup {
            resolved.dedup();
        }

        let duplicates = counts
            .into_iter()
            .filter(|(_, n)| *n > 1)
            .map(|(value, _)| value)
            .collect();

        let (values, known) = resolved.into_iter().unzip();
        BatchResolution {
            values,
            known,
            unknown,
            duplicates,
        }
    }
}

/// On-disk extension format: `{ "name": ..., "values": [...], "aliases": {...} }`.
#[derive(Debug, Deserialize, Serialize)]
struct VocabularyPack {
    name: String,
    #[serde(default)]
    values: Vec<String>,
    #[serde(default)]
    aliases: BTreeMap<String, String>,
}

/// Registry of vocabularies, built once before the engine is constructed
/// and read-only afterwards.
pub struct VocabularyRegistry {
    vocabularies: HashMap<String, Vocabulary>,
}

impl VocabularyRegistry {
    // Registries always start from the built-in set, so lookups of built-in
    // vocabulary names cannot fail; packs and `register` only extend.
    fn empty() -> Self {
        Self {
            vocabularies: HashMap::new(),
        }
    }

    /// The built-in SDK vocabularies plus their shipped alias tables.
    pub fn built_in() -> Self {
        let mut registry = Self::empty();

        let mut hazards = Vocabulary::new(
            VOCAB_HAZARDS,
            &[
                "fire",
                "flooding",
                "electrical",
                "radiation",
                "vacuum_breach",
                "toxic_spill",
                "structural_collapse",
                "biohazard",
                "extreme_cold",
                "extreme_heat",
            ],
        );
        hazards.add_alias("Water ingress", "flooding");
        hazards.add_alias("Short circuit", "electrical");
        hazards.add_alias("Rad leak", "radiation");
        hazards.add_alias("Hull breach", "vacuum_breach");
        hazards.add_alias("Chemical spill", "toxic_spill");
        hazards.add_alias("Cave in", "structural_collapse");
        registry.register(hazards);

        let mut structures = Vocabulary::new(
            VOCAB_STRUCTURES,
            &[
                "habitat_dome",
                "solar_array",
                "fusion_plant",
                "hydroponics_bay",
                "water_reclaimer",
                "foundry",
                "fabricator",
                "research_lab",
                "medbay",
                "cargo_depot",
                "comms_tower",
                "recycler",
            ],
        );
        structures.add_alias("Hydroponics", "hydroponics_bay");
        structures.add_alias("Lab", "research_lab");
        structures.add_alias("Med bay", "medbay");
        registry.register(structures);

        let mut goods = Vocabulary::new(
            VOCAB_GOODS,
            &[
                "water",
                "oxygen",
                "biomass",
                "alloys",
                "polymers",
                "electronics",
                "medicine",
                "machine_parts",
                "rare_metals",
                "fuel",
            ],
        );
        goods.add_alias("O2", "oxygen");
        goods.add_alias("H2O", "water");
        goods.add_alias("Spare parts", "machine_parts");
        registry.register(goods);

        registry.register(Vocabulary::new(
            VOCAB_CULTURE_TAGS,
            &[
                "agrarian",
                "industrial",
                "scientific",
                "militarist",
                "mercantile",
                "spiritual",
                "nomadic",
                "communal",
            ],
        ));

        let mut socket_kinds = Vocabulary::new(
            VOCAB_SOCKET_KINDS,
            &[
                "door", "window", "vent", "power", "data", "fluid", "structural",
            ],
        );
        socket_kinds.add_alias("Hatch", "door");
        socket_kinds.add_alias("Duct", "vent");
        socket_kinds.add_alias("Conduit", "power");
        registry.register(socket_kinds);

        let mut resources = Vocabulary::new(
            VOCAB_RESOURCES,
            &["credits", "energy", "research", "alloys", "biomass", "labor"],
        );
        resources.add_alias("Money", "credits");
        resources.add_alias("Science", "research");
        registry.register(resources);

        registry
    }

    pub fn register(&mut self, vocabulary: Vocabulary) {
        self.vocabularies
            .insert(vocabulary.name.clone(), vocabulary);
    }

    pub fn get(&self, name: &str) -> Option<&Vocabulary> {
        self.vocabularies.get(name)
    }

    pub fn list(&self) -> Vec<&Vocabulary> {
        let mut all: Vec<_> = self.vocabularies.values().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    /// Merge vocabulary packs from a directory of JSON files. A pack whose
    /// name matches an existing vocabulary extends it; otherwise a new
    /// vocabulary is created. Unreadable files are skipped.
    pub fn load_from_dir(&mut self, dir: &Path) -> Result<(), std::io::Error> {
        if !dir.exists() {
            return Ok(());
        }
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.extension().map_or(false, |e| e == "json") {
                continue;
            }
            let Ok(content) = fs::read_to_string(&path) else {
                tracing::warn!(path = %path.display(), "unreadable vocabulary pack; skipping");
                continue;
            };
            let Ok(pack) = serde_json::from_str::<VocabularyPack>(&content) else {
                tracing::warn!(path = %path.display(), "malformed vocabulary pack; skipping");
                continue;
            };
            self.merge_pack(pack);
        }
        Ok(())
    }

    fn merge_pack(&mut self, pack: VocabularyPack) {
        let name = normalize_ident(&pack.name);
        let vocab = self
            .vocabularies
            .entry(name.clone())
            .or_insert_with(|| Vocabulary::new(name, &[]));
        for value in &pack.values {
            vocab.add_member(value);
        }
        for (alias, target) in &pack.aliases {
            vocab.add_alias(alias, target);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_member_resolves_to_itself() {
        let registry = VocabularyRegistry::built_in();
        let hazards = registry.get(VOCAB_HAZARDS).unwrap();
        let r = hazards.resolve("fire");
        assert_eq!(r.canonical.as_deref(), Some("fire"));
    }

    #[test]
    fn alias_resolves_through_normalization() {
        let registry = VocabularyRegistry::built_in();
        let hazards = registry.get(VOCAB_HAZARDS).unwrap();
        assert_eq!(
            hazards.resolve("Water ingress").canonical.as_deref(),
            Some("flooding")
        );
        assert_eq!(
            hazards.resolve("water-INGRESS").canonical.as_deref(),
            Some("flooding")
        );
    }

    #[test]
    fn canonical_entries_win_over_aliases() {
        let mut vocab = Vocabulary::new("test", &["fire", "flooding"]);
        // An alias that collides with a member's own token must not shadow it.
        vocab.add_alias("fire", "flooding");
        assert_eq!(vocab.resolve("fire").canonical.as_deref(), Some("fire"));
    }

    #[test]
    fn unknown_token_keeps_normalized_spelling() {
        let registry = VocabularyRegistry::built_in();
        let hazards = registry.get(VOCAB_HAZARDS).unwrap();
        let r = hazards.resolve("Phantom Hazard");
        assert!(!r.known());
        assert_eq!(r.value(), "phantom_hazard");
    }

    #[test]
    fn batch_is_sorted_and_deduplicated() {
        let registry = VocabularyRegistry::built_in();
        let hazards = registry.get(VOCAB_HAZARDS).unwrap();
        let raw = vec!["fire".into(), "electrical".into(), "fire".into()];

        let deduped = hazards.resolve_all(&raw, true);
        assert_eq!(deduped.values, vec!["electrical", "fire"]);
        assert_eq!(deduped.duplicates, vec!["fire"]);

        let kept = hazards.resolve_all(&raw, false);
        assert_eq!(kept.values, vec!["electrical", "fire", "fire"]);
    }

    #[test]
    fn alias_to_unknown_target_is_skipped() {
        let mut vocab = Vocabulary::new("test", &["fire"]);
        vocab.add_alias("ghost", "no_such_member");
        assert!(!vocab.resolve("ghost").known());
    }
}
