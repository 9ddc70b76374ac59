//! Deterministic Ordering
//!
//! One total order per collection type, so canonical output is independent
//! of input array order:
//!
//! - nodes: (tier, displayOrder, id) - lexical id is the final tiebreak,
//!   never "whichever came first"
//! - vocabulary lists: lexical (already sorted at resolution; re-asserted)
//! - sockets: (y, x, kind, id) - top-to-bottom, left-to-right
//! - costs: (resource, phase); prerequisites: (target, relation);
//!   effects: (kind, target)
//! - room `features` hold authored narrative order and are exempt
//!
//! Metadata objects are exempt as well: they round-trip in authored key
//! order.

use crate::model::{RoomBlueprintDocument, TechTreeDocument};

pub fn order_tech_tree(document: &TechTreeDocument) -> TechTreeDocument {
    let mut doc = document.clone();

    doc.nodes.sort_by(|a, b| {
        (a.tier, a.display_order, &a.id).cmp(&(b.tier, b.display_order, &b.id))
    });

    for node in &mut doc.nodes {
        node.prerequisites
            .sort_by(|a, b| (&a.target, a.relation).cmp(&(&b.target, b.relation)));
        node.effects.sort_by(|a, b| {
            (a.kind, a.target.as_deref()).cmp(&(b.kind, b.target.as_deref()))
        });
        node.unlocks_structures.sort();
        node.unlocks_goods.sort();
        node.costs
            .sort_by(|a, b| (&a.resource, a.phase).cmp(&(&b.resource, b.phase)));
    }

    doc.culture_tags.sort();
    doc
}

pub fn order_room_blueprint(document: &RoomBlueprintDocument) -> RoomBlueprintDocument {
    let mut doc = document.clone();

    doc.sockets.sort_by(|a, b| {
        (a.position.y, a.position.x, &a.kind, &a.id).cmp(&(
            b.position.y,
            b.position.x,
            &b.kind,
            &b.id,
        ))
    });
    for socket in &mut doc.sockets {
        socket.depends_on.sort();
    }

    doc.hazards.sort();
    doc.prerequisites
        .sort_by(|a, b| (&a.target, a.relation).cmp(&(&b.target, b.relation)));
    doc.culture_tags.sort();
    // features intentionally untouched
    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Position, Socket, TechNode};
    use serde_json::Map;

    fn node(id: &str, tier: i64, display_order: i64) -> TechNode {
        TechNode {
            id: id.into(),
            title: id.to_uppercase(),
            tier,
            display_order,
            effects: vec![],
            prerequisites: vec![],
            unlocks_structures: vec![],
            unlocks_goods: vec![],
            costs: vec![],
        }
    }

    #[test]
    fn nodes_order_by_tier_then_display_order_then_id() {
        let mut doc = TechTreeDocument {
            id: "t".into(),
            version: 2,
            name: "T".into(),
            engine_min_version: None,
            nodes: vec![
                node("zeta_tail", 3, 5),
                node("alpha_head", 3, 1),
                node("same_slot_b", 2, 4),
                node("same_slot_a", 2, 4),
            ],
            culture_tags: vec![],
            metadata: Map::new(),
        };
        doc = order_tech_tree(&doc);
        let ids: Vec<_> = doc.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["same_slot_a", "same_slot_b", "alpha_head", "zeta_tail"]
        );
    }

    #[test]
    fn sockets_order_top_to_bottom_left_to_right() {
        let socket = |id: &str, x: i64, y: i64| Socket {
            id: id.into(),
            kind: "door".into(),
            position: Position { x, y },
            depends_on: vec![],
        };
        let mut doc = RoomBlueprintDocument {
            id: "r".into(),
            version: 2,
            name: "R".into(),
            purpose: "P".into(),
            width: 64,
            height: 64,
            engine_min_version: None,
            features: vec!["bunk".into()],
            hazards: vec![],
            sockets: vec![socket("c", 5, 9), socket("a", 9, 2), socket("b", 1, 2)],
            prerequisites: vec![],
            culture_tags: vec![],
            metadata: Map::new(),
        };
        doc = order_room_blueprint(&doc);
        let ids: Vec<_> = doc.sockets.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn features_keep_authored_order() {
        let doc = RoomBlueprintDocument {
            id: "r".into(),
            version: 2,
            name: "R".into(),
            purpose: "P".into(),
            width: 64,
            height: 64,
            engine_min_version: None,
            features: vec!["zero-g hammock".into(), "airlock bench".into()],
            hazards: vec![],
            sockets: vec![],
            prerequisites: vec![],
            culture_tags: vec![],
            metadata: Map::new(),
        };
        let ordered = order_room_blueprint(&doc);
        assert_eq!(ordered.features, doc.features);
    }
}
