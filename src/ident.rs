//! Identifier Normalization
//!
//! Every identifier entering the engine is reduced to one canonical
//! `lower_snake_case` spelling, so that hand-edited variants
//! ("Solar Array", "solarArray", "solar-array") converge on `solar_array`.

/// Normalize an arbitrary string into a `[a-z0-9_]+` token.
///
/// Steps: trim, split camelCase at lower-to-upper letter boundaries,
/// collapse every run of non-alphanumeric characters into a single `_`,
/// strip leading/trailing `_`, lowercase.
///
/// An empty result is the caller's problem to report ("identifier cannot
/// be empty") - it is never silently replaced with a default.
pub fn normalize_ident(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 4);
    let mut prev: Option<char> = None;

    for ch in raw.trim().chars() {
        if ch.is_alphanumeric() {
            if let Some(p) = prev {
                if p.is_alphabetic() && p.is_lowercase() && ch.is_uppercase() {
                    out.push('_');
                }
            }
            for low in ch.to_lowercase() {
                out.push(low);
            }
            prev = Some(ch);
        } else {
            // Any separator run becomes a single underscore, never leading.
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            prev = None;
        }
    }

    while out.ends_with('_') {
        out.pop();
    }
    out
}

/// True when `token` is already in canonical form.
pub fn is_canonical(token: &str) -> bool {
    !token.is_empty() && normalize_ident(token) == token
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camel_case_splits() {
        assert_eq!(normalize_ident("solarArray"), "solar_array");
        assert_eq!(normalize_ident("FusionPlantMk2"), "fusion_plant_mk2");
    }

    #[test]
    fn separator_runs_collapse() {
        assert_eq!(normalize_ident("  Water --- ingress  "), "water_ingress");
        assert_eq!(normalize_ident("a__b...c"), "a_b_c");
    }

    #[test]
    fn edges_are_stripped() {
        assert_eq!(normalize_ident("--door--"), "door");
        assert_eq!(normalize_ident("___"), "");
    }

    #[test]
    fn acronyms_stay_joined() {
        // Only lower-to-upper boundaries split; runs of capitals do not.
        assert_eq!(normalize_ident("HTTPServer"), "httpserver");
        assert_eq!(normalize_ident("O2"), "o2");
    }

    #[test]
    fn already_canonical_is_stable() {
        assert!(is_canonical("vacuum_breach"));
        assert_eq!(normalize_ident("vacuum_breach"), "vacuum_breach");
    }
}
