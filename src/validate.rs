//! Structural Validation
//!
//! Pure functions from a normalized document to a list of issues. Nothing
//! here short-circuits: a single pass reports every problem it can see, and
//! only the pipeline boundary decides whether errors make the whole
//! operation fail.

use std::collections::{BTreeSet, HashSet};

use crate::graph::{find_cycle, Adjacency};
use crate::issues::ValidationIssue;
use crate::model::{
    RoomBlueprintDocument, TechTreeDocument, DIMENSION_MAX, DIMENSION_MIN, TIER_MAX, TIER_MIN,
};

/// Closed inclusive bound check; messages carry both the value and the
/// violated bound.
fn check_bounds(
    path: &str,
    label: &str,
    value: i64,
    min: i64,
    max: i64,
    issues: &mut Vec<ValidationIssue>,
) {
    if value < min {
        issues.push(ValidationIssue::range_error(
            path,
            format!("{label} {value} is below minimum of {min}"),
        ));
    } else if value > max {
        issues.push(ValidationIssue::range_error(
            path,
            format!("{label} {value} exceeds maximum of {max}"),
        ));
    }
}

fn check_non_empty(path: &str, value: &str, issues: &mut Vec<ValidationIssue>) {
    if value.trim().is_empty() {
        issues.push(ValidationIssue::schema_error(path, "must not be empty"));
    }
}

pub fn validate_tech_tree(doc: &TechTreeDocument) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    check_non_empty("name", &doc.name, &mut issues);

    let mut seen_ids: HashSet<&str> = HashSet::new();
    let node_ids: HashSet<&str> = doc.nodes.iter().map(|n| n.id.as_str()).collect();

    for (i, node) in doc.nodes.iter().enumerate() {
        let path = format!("nodes[{i}]");

        if !node.id.is_empty() && !seen_ids.insert(&node.id) {
            issues.push(ValidationIssue::error(
                format!("{path}.id"),
                format!("duplicate identifier \"{}\"", node.id),
            ));
        }

        check_non_empty(&format!("{path}.title"), &node.title, &mut issues);
        check_bounds(
            &format!("{path}.tier"),
            "tier",
            node.tier,
            TIER_MIN,
            TIER_MAX,
            &mut issues,
        );

        let mut seen_targets: HashSet<&str> = HashSet::new();
        for (j, prereq) in node.prerequisites.iter().enumerate() {
            let prereq_path = format!("{path}.prerequisites[{j}]");
            if !seen_targets.insert(&prereq.target) {
                issues.push(ValidationIssue::error(
                    &prereq_path,
                    format!("duplicate identifier \"{}\"", prereq.target),
                ));
                continue;
            }
            if !node_ids.contains(prereq.target.as_str()) {
                issues.push(ValidationIssue::reference_error(
                    format!("{prereq_path}.target"),
                    &prereq.target,
                ));
            }
        }

        for (j, effect) in node.effects.iter().enumerate() {
            issues.extend(effect.validate(&format!("{path}.effects[{j}]")));
        }

        for (j, cost) in node.costs.iter().enumerate() {
            let cost_path = format!("{path}.costs[{j}].amount");
            if !cost.amount.is_finite() {
                issues.push(ValidationIssue::range_error(
                    cost_path,
                    "must be a finite number",
                ));
            } else if cost.amount < 0.0 {
                issues.push(ValidationIssue::range_error(
                    cost_path,
                    format!("amount {} must be non-negative", cost.amount),
                ));
            }
        }
    }

    issues.extend(check_prerequisite_cycles(doc));
    issues
}

/// Cycle detection over the prerequisite graph, in document node order.
/// The reported node is where traversal first closed the loop, which is an
/// artifact of that order, not a statement about where the cycle "starts".
fn check_prerequisite_cycles(doc: &TechTreeDocument) -> Vec<ValidationIssue> {
    let adjacency: Adjacency = doc
        .nodes
        .iter()
        .map(|node| {
            (
                node.id.clone(),
                node.prerequisites
                    .iter()
                    .map(|p| p.target.clone())
                    .collect(),
            )
        })
        .collect();

    match find_cycle(&adjacency) {
        Some(node_id) => {
            let index = doc
                .nodes
                .iter()
                .position(|n| n.id == node_id)
                .unwrap_or(0);
            vec![ValidationIssue::cycle_error(
                format!("nodes[{index}].prerequisites"),
                &node_id,
            )]
        }
        None => Vec::new(),
    }
}

pub fn validate_room_blueprint(
    doc: &RoomBlueprintDocument,
    known_reference_ids: &BTreeSet<String>,
) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    check_non_empty("name", &doc.name, &mut issues);
    check_non_empty("purpose", &doc.purpose, &mut issues);

    check_bounds(
        "width",
        "width",
        doc.width,
        DIMENSION_MIN,
        DIMENSION_MAX,
        &mut issues,
    );
    check_bounds(
        "height",
        "height",
        doc.height,
        DIMENSION_MIN,
        DIMENSION_MAX,
        &mut issues,
    );

    validate_features(doc, &mut issues);
    validate_sockets(doc, &mut issues);

    let mut seen_targets: HashSet<&str> = HashSet::new();
    for (j, prereq) in doc.prerequisites.iter().enumerate() {
        let path = format!("prerequisites[{j}]");
        if !seen_targets.insert(&prereq.target) {
            issues.push(ValidationIssue::error(
                &path,
                format!("duplicate identifier \"{}\"", prereq.target),
            ));
            continue;
        }
        // An empty known-id set means the caller validates this blueprint
        // in isolation; referential checks are skipped, not passed.
        if !known_reference_ids.is_empty() && !known_reference_ids.contains(&prereq.target) {
            issues.push(ValidationIssue::reference_error(
                format!("{path}.target"),
                &prereq.target,
            ));
        }
    }

    issues
}

fn validate_features(doc: &RoomBlueprintDocument, issues: &mut Vec<ValidationIssue>) {
    if doc.features.is_empty() {
        issues.push(ValidationIssue::schema_error(
            "features",
            "at least one feature is required",
        ));
        return;
    }
    // An all-empty collection is functionally equivalent to a missing one
    // and gets one distinct error, not N per-element warnings.
    if doc.features.iter().all(|f| f.trim().is_empty()) {
        issues.push(ValidationIssue::schema_error(
            "features",
            "all feature entries are empty",
        ));
        return;
    }
    for (i, feature) in doc.features.iter().enumerate() {
        if feature.trim().is_empty() {
            issues.push(ValidationIssue::warning(
                format!("features[{i}]"),
                "empty entry",
            ));
        }
    }
}

fn validate_sockets(doc: &RoomBlueprintDocument, issues: &mut Vec<ValidationIssue>) {
    let bounds_known = (DIMENSION_MIN..=DIMENSION_MAX).contains(&doc.width)
        && (DIMENSION_MIN..=DIMENSION_MAX).contains(&doc.height);

    let socket_ids: HashSet<&str> = doc.sockets.iter().map(|s| s.id.as_str()).collect();
    let mut seen_ids: HashSet<&str> = HashSet::new();

    for (i, socket) in doc.sockets.iter().enumerate() {
        let path = format!("sockets[{i}]");

        if !socket.id.is_empty() && !seen_ids.insert(&socket.id) {
            issues.push(ValidationIssue::error(
                format!("{path}.id"),
                format!("duplicate identifier \"{}\"", socket.id),
            ));
        }

        // Positional bounds are checked only when the room's declared
        // dimensions are themselves valid; otherwise the check is skipped.
        if bounds_known {
            if socket.position.x < 0 || socket.position.x >= doc.width {
                issues.push(ValidationIssue::range_error(
                    format!("{path}.position.x"),
                    format!(
                        "x {} is outside [0, {})",
                        socket.position.x, doc.width
                    ),
                ));
            }
            if socket.position.y < 0 || socket.position.y >= doc.height {
                issues.push(ValidationIssue::range_error(
                    format!("{path}.position.y"),
                    format!(
                        "y {} is outside [0, {})",
                        socket.position.y, doc.height
                    ),
                ));
            }
        }

        for (j, dep) in socket.depends_on.iter().enumerate() {
            let dep_path = format!("{path}.dependsOn[{j}]");
            if dep == &socket.id {
                issues.push(ValidationIssue::error(
                    dep_path,
                    "socket cannot depend on itself",
                ));
            } else if !socket_ids.contains(dep.as_str()) {
                issues.push(ValidationIssue::reference_error(dep_path, dep));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Position, PrereqRelation, Prerequisite, Socket, TechNode};
    use serde_json::Map;

    fn tree_with_nodes(nodes: Vec<TechNode>) -> TechTreeDocument {
        TechTreeDocument {
            id: "t".into(),
            version: 2,
            name: "T".into(),
            engine_min_version: None,
            nodes,
            culture_tags: vec![],
            metadata: Map::new(),
        }
    }

    fn node(id: &str, tier: i64, prereqs: &[&str]) -> TechNode {
        TechNode {
            id: id.into(),
            title: id.to_uppercase(),
            tier,
            display_order: 0,
            effects: vec![],
            prerequisites: prereqs
                .iter()
                .map(|t| Prerequisite {
                    target: t.to_string(),
                    relation: PrereqRelation::Requires,
                })
                .collect(),
            unlocks_structures: vec![],
            unlocks_goods: vec![],
            costs: vec![],
        }
    }

    fn room() -> RoomBlueprintDocument {
        RoomBlueprintDocument {
            id: "r".into(),
            version: 2,
            name: "R".into(),
            purpose: "P".into(),
            width: 32,
            height: 32,
            engine_min_version: None,
            features: vec!["bunk".into()],
            hazards: vec![],
            sockets: vec![],
            prerequisites: vec![],
            culture_tags: vec![],
            metadata: Map::new(),
        }
    }

    #[test]
    fn tier_bounds_are_inclusive() {
        let ok = tree_with_nodes(vec![node("a", 1, &[]), node("b", 256, &[])]);
        assert!(validate_tech_tree(&ok).is_empty());

        let low = tree_with_nodes(vec![node("a", 0, &[])]);
        let issues = validate_tech_tree(&low);
        assert!(issues[0].message.contains("below minimum of 1"));
    }

    #[test]
    fn duplicate_node_ids_error_on_second_occurrence() {
        let doc = tree_with_nodes(vec![node("a", 1, &[]), node("a", 2, &[])]);
        let issues = validate_tech_tree(&doc);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path, "nodes[1].id");
        assert!(issues[0].message.contains("\"a\""));
    }

    #[test]
    fn dangling_prerequisite_is_a_reference_error() {
        let doc = tree_with_nodes(vec![node("a", 1, &["ghost"])]);
        let issues = validate_tech_tree(&doc);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path, "nodes[0].prerequisites[0].target");
        assert!(issues[0].message.contains("\"ghost\""));
    }

    #[test]
    fn cycle_produces_exactly_one_error() {
        let doc = tree_with_nodes(vec![
            node("a", 1, &["b"]),
            node("b", 1, &["c"]),
            node("c", 1, &["a"]),
        ]);
        let issues = validate_tech_tree(&doc);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("cycle"));
    }

    #[test]
    fn diamond_is_not_a_cycle() {
        let doc = tree_with_nodes(vec![
            node("a", 1, &[]),
            node("b", 1, &[]),
            node("c", 2, &["a", "b"]),
            node("d", 2, &["a", "b"]),
            node("e", 3, &["c", "d"]),
        ]);
        assert!(validate_tech_tree(&doc).is_empty());
    }

    #[test]
    fn dimension_bounds_match_contract() {
        for (value, expect_error) in [(15, true), (16, false), (512, false), (513, true)] {
            let mut doc = room();
            doc.width = value;
            let issues = validate_room_blueprint(&doc, &BTreeSet::new());
            let has_width_error = issues.iter().any(|i| i.path == "width");
            assert_eq!(has_width_error, expect_error, "width {value}");
        }
    }

    #[test]
    fn all_empty_features_is_one_distinct_error() {
        let mut doc = room();
        doc.features = vec!["  ".into(), "".into()];
        let issues = validate_room_blueprint(&doc, &BTreeSet::new());
        let feature_issues: Vec<_> =
            issues.iter().filter(|i| i.path.starts_with("features")).collect();
        assert_eq!(feature_issues.len(), 1);
        assert!(feature_issues[0].message.contains("all feature entries"));
    }

    #[test]
    fn socket_out_of_bounds_is_reported_with_bound() {
        let mut doc = room();
        doc.sockets = vec![Socket {
            id: "s".into(),
            kind: "door".into(),
            position: Position { x: 32, y: 5 },
            depends_on: vec![],
        }];
        let issues = validate_room_blueprint(&doc, &BTreeSet::new());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path, "sockets[0].position.x");
        assert!(issues[0].message.contains("[0, 32)"));
    }

    #[test]
    fn bounds_check_is_skipped_when_dimensions_invalid() {
        let mut doc = room();
        doc.width = 9999; // invalid, so position bounds are unknown
        doc.sockets = vec![Socket {
            id: "s".into(),
            kind: "door".into(),
            position: Position { x: 5000, y: 5 },
            depends_on: vec![],
        }];
        let issues = validate_room_blueprint(&doc, &BTreeSet::new());
        assert!(issues.iter().all(|i| !i.path.contains("position")));
    }

    #[test]
    fn empty_known_id_set_skips_referential_checks() {
        let mut doc = room();
        doc.prerequisites = vec![Prerequisite {
            target: "other_room".into(),
            relation: PrereqRelation::Requires,
        }];
        assert!(validate_room_blueprint(&doc, &BTreeSet::new()).is_empty());

        let known: BTreeSet<String> = ["this_room".to_string()].into();
        let issues = validate_room_blueprint(&doc, &known);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("other_room"));
    }
}
