// 🌊 Graph Transform - asset record → three-tier flow graph
//
// root (总资产) → category → item. Liability categories are left out: they
// only feed the liabilities total. Layout belongs to the renderer, which may
// write geometry back onto the nodes.

use crate::categories::{CategoryKind, CategoryRegistry};
use crate::field_key::encode;
use crate::record::AssetRecord;
use serde::{Deserialize, Serialize};

/// Minimum link weight handed to the renderer.
pub const LINK_FLOOR: f64 = 0.01;

pub const ROOT_NAME: &str = "总资产";

// ============================================================================
// NODES & LINKS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    Root,
    Liquid,
    Fixed,
    Investment,
    Receivable,
    Detail,
}

impl NodeRole {
    /// Role of a category node. Kinds without a flow role fall back to `Detail`.
    pub fn for_kind(kind: Option<CategoryKind>) -> Self {
        match kind {
            Some(CategoryKind::Liquid) => NodeRole::Liquid,
            Some(CategoryKind::Fixed) => NodeRole::Fixed,
            Some(CategoryKind::Investment) => NodeRole::Investment,
            Some(CategoryKind::Receivable) => NodeRole::Receivable,
            Some(CategoryKind::Liability) | None => NodeRole::Detail,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeRole::Root => "root",
            NodeRole::Liquid => "liquid",
            NodeRole::Fixed => "fixed",
            NodeRole::Investment => "investment",
            NodeRole::Receivable => "receivable",
            NodeRole::Detail => "detail",
        }
    }

    /// Fill colour used by renderers.
    pub fn color(&self) -> &'static str {
        match self {
            NodeRole::Root => "#4c78a8",
            NodeRole::Liquid => "#72b7b2",
            NodeRole::Fixed => "#eeca3b",
            NodeRole::Investment => "#f58518",
            NodeRole::Receivable => "#437c17",
            NodeRole::Detail => "#9d755d",
        }
    }

    pub const ALL: [NodeRole; 6] = [
        NodeRole::Root,
        NodeRole::Liquid,
        NodeRole::Fixed,
        NodeRole::Investment,
        NodeRole::Receivable,
        NodeRole::Detail,
    ];
}

/// Colour for an arbitrary role tag, `#999999` when the tag is unknown.
pub fn color_for_tag(tag: &str) -> &'static str {
    NodeRole::ALL
        .iter()
        .find(|r| r.as_str() == tag)
        .map(|r| r.color())
        .unwrap_or("#999999")
}

/// Position assigned by a renderer after layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeGeometry {
    pub x0: f64,
    pub x1: f64,
    pub y0: f64,
    pub y1: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: usize,
    pub name: String,
    pub role: NodeRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<NodeGeometry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphLink {
    pub source: usize,
    pub target: usize,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetGraph {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
}

impl AssetGraph {
    fn push_node(&mut self, name: &str, role: NodeRole) -> usize {
        let id = self.nodes.len();
        self.nodes.push(GraphNode {
            id,
            name: name.to_string(),
            role,
            geometry: None,
        });
        id
    }

    fn push_link(&mut self, source: usize, target: usize, amount: f64) {
        self.links.push(GraphLink {
            source,
            target,
            value: amount.max(LINK_FLOOR),
        });
    }

    /// Nothing to draw; renderers show an explicit "no data" state.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() || self.links.is_empty()
    }

    pub fn node(&self, id: usize) -> Option<&GraphNode> {
        self.nodes.get(id)
    }

    /// Links leaving `id`, in insertion order.
    pub fn outgoing(&self, id: usize) -> impl Iterator<Item = &GraphLink> {
        self.links.iter().filter(move |l| l.source == id)
    }

    pub fn set_geometry(&mut self, id: usize, geometry: NodeGeometry) -> bool {
        match self.nodes.get_mut(id) {
            Some(node) => {
                node.geometry = Some(geometry);
                true
            }
            None => false,
        }
    }
}

// ============================================================================
// TRANSFORM
// ============================================================================

/// Build the flow graph for `record` against the current registry.
///
/// Every non-liability category gets a node. A category with a positive sum
/// gets a root link; only items with a positive value get a node and link.
pub fn build_graph(record: &AssetRecord, registry: &CategoryRegistry) -> AssetGraph {
    let mut graph = AssetGraph::default();
    let root = graph.push_node(ROOT_NAME, NodeRole::Root);

    for category in registry.categories() {
        if category.kind.is_liability() {
            continue;
        }

        let category_id = graph.push_node(&category.name, NodeRole::for_kind(Some(category.kind)));

        let values: Vec<(String, f64)> = category
            .all_items()
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                let value = record.get(&encode(&category.name, &item, index));
                (item, value)
            })
            .collect();

        let category_value: f64 = values.iter().map(|(_, v)| v).sum();
        if category_value > 0.0 {
            graph.push_link(root, category_id, category_value);
        }

        for (item, value) in values {
            if value > 0.0 {
                let item_id = graph.push_node(&item, NodeRole::Detail);
                graph.push_link(category_id, item_id, value);
            }
        }
    }

    graph
}

// ============================================================================
// RENDER REQUEST
// ============================================================================

/// Everything a renderer needs: the graph, a canvas, and the role palette.
#[derive(Debug, Clone, Serialize)]
pub struct RenderRequest {
    pub graph: AssetGraph,
    pub width: u32,
    pub height: u32,
    pub palette: Vec<(&'static str, &'static str)>,
}

impl RenderRequest {
    pub fn new(graph: AssetGraph, width: u32, height: u32) -> Self {
        let palette = NodeRole::ALL.iter().map(|r| (r.as_str(), r.color())).collect();
        RenderRequest {
            graph,
            width,
            height,
            palette,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categories::{FIXED_ASSETS, INVESTMENTS, LIABILITIES, LIQUID_FUNDS, RECEIVABLES};

    fn names_with_role(graph: &AssetGraph, role: NodeRole) -> Vec<&str> {
        graph
            .nodes
            .iter()
            .filter(|n| n.role == role)
            .map(|n| n.name.as_str())
            .collect()
    }

    #[test]
    fn test_sample_graph_shape() {
        let registry = CategoryRegistry::with_defaults();
        let graph = build_graph(&AssetRecord::sample(), &registry);

        assert_eq!(graph.nodes[0].id, 0);
        assert_eq!(graph.nodes[0].name, ROOT_NAME);
        assert_eq!(graph.nodes[0].role, NodeRole::Root);

        let categories: Vec<&str> = graph
            .nodes
            .iter()
            .filter(|n| n.role != NodeRole::Root && n.role != NodeRole::Detail)
            .map(|n| n.name.as_str())
            .collect();
        assert_eq!(categories, vec![LIQUID_FUNDS, FIXED_ASSETS, INVESTMENTS, RECEIVABLES]);

        // receivable is 0, so 他人借款 gets no node
        assert_eq!(
            names_with_role(&graph, NodeRole::Detail),
            vec!["银行活期", "支付宝", "微信", "车辆价值", "房产价值", "定期存款", "股票基金"]
        );
        assert!(!graph.nodes.iter().any(|n| n.name == LIABILITIES));

        // 3 root links (应收款项 sums to 0) + 7 detail links
        assert_eq!(graph.links.len(), 10);
        let receivable_id = graph.nodes.iter().find(|n| n.name == RECEIVABLES).unwrap().id;
        assert_eq!(graph.outgoing(receivable_id).count(), 0);
        assert!(!graph.links.iter().any(|l| l.target == receivable_id));
    }

    #[test]
    fn test_category_link_carries_sum() {
        let registry = CategoryRegistry::with_defaults();
        let graph = build_graph(&AssetRecord::sample(), &registry);

        let liquid = graph.nodes.iter().find(|n| n.name == LIQUID_FUNDS).unwrap();
        let link = graph.links.iter().find(|l| l.target == liquid.id).unwrap();

        assert_eq!(link.source, 0);
        assert_eq!(link.value, 65_000.0);
        assert_eq!(liquid.role, NodeRole::Liquid);
    }

    #[test]
    fn test_link_weights_never_below_floor() {
        let mut registry = CategoryRegistry::with_defaults();
        registry.add_custom_item(LIQUID_FUNDS, "Coins").unwrap();
        let mut record = AssetRecord::new();
        record.set("_Coins_3", 0.001);
        record.set("wechat", 0.0);

        let graph = build_graph(&record, &registry);

        assert!(!graph.links.is_empty());
        assert!(graph.links.iter().all(|l| l.value >= LINK_FLOOR));
        assert_eq!(names_with_role(&graph, NodeRole::Detail), vec!["Coins"]);
    }

    #[test]
    fn test_all_zero_record_is_empty_graph() {
        let registry = CategoryRegistry::with_defaults();
        let graph = build_graph(&AssetRecord::new(), &registry);

        // root + 4 category nodes, but nothing to draw
        assert_eq!(graph.nodes.len(), 5);
        assert!(graph.links.is_empty());
        assert!(graph.is_empty());
    }

    #[test]
    fn test_duplicate_names_get_distinct_nodes() {
        let mut registry = CategoryRegistry::with_defaults();
        registry.add_custom_item(RECEIVABLES, "Tom").unwrap();
        registry.add_custom_item(RECEIVABLES, "Tom").unwrap();
        let record: AssetRecord = [("_Tom_1", 10.0), ("_Tom_2", 20.0)].into_iter().collect();

        let graph = build_graph(&record, &registry);

        let toms: Vec<&GraphNode> = graph.nodes.iter().filter(|n| n.name == "Tom").collect();
        assert_eq!(toms.len(), 2);
        assert_ne!(toms[0].id, toms[1].id);
    }

    #[test]
    fn test_liability_values_do_not_appear() {
        let registry = CategoryRegistry::with_defaults();
        let record: AssetRecord = [("mortgage", 1_000.0)].into_iter().collect();

        let graph = build_graph(&record, &registry);

        assert!(graph.is_empty());
        assert!(!graph.nodes.iter().any(|n| n.name == "房贷"));
    }

    #[test]
    fn test_palette() {
        assert_eq!(NodeRole::Root.color(), "#4c78a8");
        assert_eq!(color_for_tag("investment"), "#f58518");
        assert_eq!(color_for_tag("mystery"), "#999999");
        assert_eq!(NodeRole::for_kind(None), NodeRole::Detail);

        let request = RenderRequest::new(AssetGraph::default(), 800, 600);
        assert_eq!(request.palette.len(), 6);
    }

    #[test]
    fn test_geometry_write_back() {
        let registry = CategoryRegistry::with_defaults();
        let mut graph = build_graph(&AssetRecord::sample(), &registry);
        let geometry = NodeGeometry { x0: 0.0, x1: 10.0, y0: 5.0, y1: 50.0 };

        assert!(graph.set_geometry(0, geometry));
        assert!(!graph.set_geometry(999, geometry));
        assert_eq!(graph.node(0).unwrap().geometry, Some(geometry));
    }
}
