//! Tech Effects - Closed Variant Set, Static Dispatch
//!
//! Effect behavior lives in a compile-time table of `{validate, describe}`
//! function pairs keyed by [`EffectKind`]. Adding a kind means adding a
//! variant and a profile; the match in [`profile`] keeps the table
//! exhaustive. There is no runtime registration.

use serde::{Deserialize, Serialize};

use crate::issues::ValidationIssue;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    UnlockStructure,
    UnlockGood,
    ModifyYield,
    ModifyHazardResistance,
    GrantCultureTag,
}

impl EffectKind {
    pub const ALL: [EffectKind; 5] = [
        EffectKind::UnlockStructure,
        EffectKind::UnlockGood,
        EffectKind::ModifyYield,
        EffectKind::ModifyHazardResistance,
        EffectKind::GrantCultureTag,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnlockStructure => "unlock_structure",
            Self::UnlockGood => "unlock_good",
            Self::ModifyYield => "modify_yield",
            Self::ModifyHazardResistance => "modify_hazard_resistance",
            Self::GrantCultureTag => "grant_culture_tag",
        }
    }

    /// Vocabulary the effect's target is resolved against, if any.
    pub fn target_vocabulary(&self) -> Option<&'static str> {
        match self {
            Self::UnlockStructure => Some(crate::vocab::VOCAB_STRUCTURES),
            Self::UnlockGood | Self::ModifyYield => Some(crate::vocab::VOCAB_GOODS),
            Self::ModifyHazardResistance => Some(crate::vocab::VOCAB_HAZARDS),
            Self::GrantCultureTag => Some(crate::vocab::VOCAB_CULTURE_TAGS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Effect {
    pub kind: EffectKind,
    #[serde(default = "default_magnitude")]
    pub magnitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

fn default_magnitude() -> f64 {
    1.0
}

impl Effect {
    pub fn describe(&self) -> String {
        (profile(self.kind).describe)(self)
    }

    pub fn validate(&self, path: &str) -> Vec<ValidationIssue> {
        (profile(self.kind).validate)(self, path)
    }
}

pub struct EffectProfile {
    pub describe: fn(&Effect) -> String,
    pub validate: fn(&Effect, &str) -> Vec<ValidationIssue>,
}

pub fn profile(kind: EffectKind) -> &'static EffectProfile {
    match kind {
        EffectKind::UnlockStructure => &UNLOCK_STRUCTURE,
        EffectKind::UnlockGood => &UNLOCK_GOOD,
        EffectKind::ModifyYield => &MODIFY_YIELD,
        EffectKind::ModifyHazardResistance => &MODIFY_HAZARD_RESISTANCE,
        EffectKind::GrantCultureTag => &GRANT_CULTURE_TAG,
    }
}

static UNLOCK_STRUCTURE: EffectProfile = EffectProfile {
    describe: |e| format!("unlocks structure {}", target_or_placeholder(e)),
    validate: validate_targeted,
};

static UNLOCK_GOOD: EffectProfile = EffectProfile {
    describe: |e| format!("unlocks good {}", target_or_placeholder(e)),
    validate: validate_targeted,
};

static MODIFY_YIELD: EffectProfile = EffectProfile {
    describe: |e| {
        format!(
            "multiplies {} yield by {}",
            target_or_placeholder(e),
            e.magnitude
        )
    },
    validate: validate_scaled,
};

static MODIFY_HAZARD_RESISTANCE: EffectProfile = EffectProfile {
    describe: |e| {
        format!(
            "multiplies {} resistance by {}",
            target_or_placeholder(e),
            e.magnitude
        )
    },
    validate: validate_scaled,
};

static GRANT_CULTURE_TAG: EffectProfile = EffectProfile {
    describe: |e| format!("grants culture tag {}", target_or_placeholder(e)),
    validate: validate_targeted,
};

fn target_or_placeholder(effect: &Effect) -> String {
    effect
        .target
        .clone()
        .unwrap_or_else(|| "<missing target>".to_string())
}

fn validate_targeted(effect: &Effect, path: &str) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    if effect.target.as_deref().map_or(true, str::is_empty) {
        issues.push(
            ValidationIssue::schema_error(
                format!("{path}.target"),
                format!("{} effects must name a target", effect.kind.as_str()),
            )
            .with_suggestion("set \"target\" to a vocabulary token"),
        );
    }
    issues
}

fn validate_scaled(effect: &Effect, path: &str) -> Vec<ValidationIssue> {
    let mut issues = validate_targeted(effect, path);
    if !effect.magnitude.is_finite() {
        issues.push(ValidationIssue::range_error(
            format!("{path}.magnitude"),
            "magnitude must be a finite number",
        ));
    } else if effect.magnitude == 0.0 {
        issues.push(ValidationIssue::warning(
            format!("{path}.magnitude"),
            "magnitude 0 makes this effect a no-op",
        ));
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issues::Severity;

    #[test]
    fn missing_target_is_a_schema_error() {
        let effect = Effect {
            kind: EffectKind::UnlockStructure,
            magnitude: 1.0,
            target: None,
        };
        let issues = effect.validate("nodes[0].effects[0]");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Error);
        assert_eq!(issues[0].path, "nodes[0].effects[0].target");
    }

    #[test]
    fn zero_magnitude_warns() {
        let effect = Effect {
            kind: EffectKind::ModifyYield,
            magnitude: 0.0,
            target: Some("water".to_string()),
        };
        let issues = effect.validate("nodes[0].effects[1]");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Warning);
    }

    #[test]
    fn describe_names_the_target() {
        let effect = Effect {
            kind: EffectKind::UnlockGood,
            magnitude: 1.0,
            target: Some("oxygen".to_string()),
        };
        assert_eq!(effect.describe(), "unlocks good oxygen");
    }
}
