//! 运行时: 网的存储、可发生判定、发生规则以及诊断.
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Write as FmtWrite};
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::net::ids::NodeId;
use crate::net::structure::{Arc, ContextObject, Node, Place, Transition, Weight};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NetError {
    #[error("node {0:?} is not part of the net")]
    UnknownNode(NodeId),
    #[error("node {0:?} is already part of the net")]
    DuplicateNode(NodeId),
    #[error("node {0:?} is not a place")]
    NotAPlace(NodeId),
}

/// 连通性诊断报告
#[derive(Debug, Clone, Default)]
pub struct DiagnosticReport {
    /// 没有任何弧的节点
    pub isolated_nodes: Vec<(NodeId, String)>,
    /// 连接两个同类节点的弧
    pub non_bipartite_arcs: Vec<Arc>,
    /// 指向网外节点的弧
    pub dangling_arcs: Vec<Arc>,
    /// 无输入弧的迁移，始终可发生
    pub source_transitions: Vec<(NodeId, String)>,
    pub warnings: Vec<String>,
    pub total_places: usize,
    pub total_transitions: usize,
}

impl DiagnosticReport {
    pub fn has_issues(&self) -> bool {
        !self.isolated_nodes.is_empty()
            || !self.non_bipartite_arcs.is_empty()
            || !self.dangling_arcs.is_empty()
            || !self.warnings.is_empty()
    }
}

/// One configuration of a Petri net: the node arena, the arcs and the
/// marking currently held by every place.
///
/// Nodes are keyed by [`NodeId`] and iterated in id order. Two snapshots are
/// equal when they hold the same node ids and every place carries the same
/// number of markers; names, contexts and arcs are not compared.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(from = "NetRepr", into = "NetRepr")]
pub struct PetriNet {
    nodes: BTreeMap<NodeId, Node>,
    arcs: BTreeSet<Arc>,
}

#[derive(Clone, Serialize, Deserialize)]
struct NetRepr {
    nodes: Vec<Node>,
    #[serde(default)]
    arcs: Vec<Arc>,
}

impl From<NetRepr> for PetriNet {
    fn from(repr: NetRepr) -> Self {
        Self {
            nodes: repr.nodes.into_iter().map(|node| (node.id(), node)).collect(),
            arcs: repr.arcs.into_iter().collect(),
        }
    }
}

impl From<PetriNet> for NetRepr {
    fn from(net: PetriNet) -> Self {
        Self {
            nodes: net.nodes.into_values().collect(),
            arcs: net.arcs.into_iter().collect(),
        }
    }
}

impl PartialEq for PetriNet {
    fn eq(&self, other: &Self) -> bool {
        self.nodes.keys().eq(other.nodes.keys())
            && self.places_by_markers().eq(other.places_by_markers())
    }
}

impl Eq for PetriNet {}

impl Hash for PetriNet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for id in self.nodes.keys() {
            id.hash(state);
        }
        for (id, markers) in self.places_by_markers() {
            id.hash(state);
            markers.hash(state);
        }
    }
}

impl fmt::Debug for PetriNet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PetriNet")
            .field("marking", &self.marking())
            .field("arcs", &self.arcs)
            .finish()
    }
}

impl PetriNet {
    pub fn new() -> Self {
        Self::default()
    }

    /// One past the highest id in use, or the lowest free id once the top
    /// of the id space is taken.
    fn next_id(&self) -> NodeId {
        let Some(last) = self.nodes.keys().next_back() else {
            return NodeId::new(0);
        };
        if let Some(raw) = last.raw().checked_add(1) {
            return NodeId::new(raw);
        }
        match (0..=u32::MAX)
            .zip(self.nodes.keys())
            .find(|(expected, id)| id.raw() != *expected)
        {
            Some((free, _)) => NodeId::new(free),
            None => crate::unrecoverable!("node id space exhausted"),
        }
    }

    fn places_by_markers(&self) -> impl Iterator<Item = (NodeId, Weight)> + '_ {
        self.places().map(|place| (place.id, place.markers))
    }

    pub fn add_place(&mut self, name: impl Into<String>, markers: Weight) -> NodeId {
        let id = self.next_id();
        self.nodes
            .insert(id, Node::Place(Place::new(id, name, markers)));
        id
    }

    pub fn add_transition(&mut self, name: impl Into<String>, context: ContextObject) -> NodeId {
        let id = self.next_id();
        self.nodes.insert(
            id,
            Node::Transition(Transition::with_context(id, name, context)),
        );
        id
    }

    /// Inserts a node under its own id.
    pub fn insert_node(&mut self, node: impl Into<Node>) -> Result<NodeId, NetError> {
        let node = node.into();
        let id = node.id();
        if self.nodes.contains_key(&id) {
            return Err(NetError::DuplicateNode(id));
        }
        self.nodes.insert(id, node);
        Ok(id)
    }

    /// Adds `source -> target`. Both ends must already be in the net; the
    /// place/transition alternation is not checked here, see [`Self::diagnose`].
    pub fn add_arc(&mut self, source: NodeId, target: NodeId) -> Result<(), NetError> {
        for id in [source, target] {
            if !self.nodes.contains_key(&id) {
                return Err(NetError::UnknownNode(id));
            }
        }
        self.arcs.insert(Arc::new(source, target));
        Ok(())
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    pub fn arcs(&self) -> impl Iterator<Item = &Arc> {
        self.arcs.iter()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn place(&self, id: NodeId) -> Option<&Place> {
        self.node(id).and_then(Node::as_place)
    }

    pub fn transition(&self, id: NodeId) -> Option<&Transition> {
        self.node(id).and_then(Node::as_transition)
    }

    pub fn places(&self) -> impl Iterator<Item = &Place> {
        self.nodes.values().filter_map(Node::as_place)
    }

    pub fn transitions(&self) -> impl Iterator<Item = &Transition> {
        self.nodes.values().filter_map(Node::as_transition)
    }

    pub fn markers(&self, id: NodeId) -> Option<Weight> {
        self.place(id).map(|place| place.markers)
    }

    pub fn set_markers(&mut self, id: NodeId, markers: Weight) -> Result<(), NetError> {
        match self.nodes.get_mut(&id) {
            Some(Node::Place(place)) => {
                place.markers = markers;
                Ok(())
            }
            Some(Node::Transition(_)) => Err(NetError::NotAPlace(id)),
            None => Err(NetError::UnknownNode(id)),
        }
    }

    pub fn places_len(&self) -> usize {
        self.places().count()
    }

    pub fn transitions_len(&self) -> usize {
        self.transitions().count()
    }

    /// Arcs leaving `id`.
    pub fn source_arcs(&self, id: NodeId) -> impl Iterator<Item = &Arc> {
        self.arcs
            .range(Arc::new(id, NodeId::new(0))..=Arc::new(id, NodeId::new(u32::MAX)))
    }

    /// Arcs entering `id`.
    pub fn target_arcs(&self, id: NodeId) -> impl Iterator<Item = &Arc> {
        self.arcs.iter().filter(move |arc| arc.target == id)
    }

    pub fn input_places(&self, transition: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.target_arcs(transition).map(|arc| arc.source)
    }

    pub fn output_places(&self, transition: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.source_arcs(transition).map(|arc| arc.target)
    }

    /// Marker count of every place, in id order.
    pub fn marking(&self) -> Vec<(NodeId, Weight)> {
        self.places_by_markers().collect()
    }

    pub fn total_markers(&self) -> Weight {
        self.places().map(|place| place.markers).sum()
    }

    /// An independent copy: same ids, same markers, no shared state.
    pub fn deep_copy(&self) -> Self {
        self.clone()
    }

    /// A transition is enabled when every input place holds at least one
    /// marker. Without input arcs this holds vacuously.
    pub fn is_enabled(&self, id: NodeId) -> bool {
        match self.nodes.get(&id) {
            Some(Node::Transition(_)) => self.target_arcs(id).all(|arc| {
                matches!(self.nodes.get(&arc.source), Some(Node::Place(place)) if place.markers > 0)
            }),
            _ => false,
        }
    }

    pub fn enabled_transitions(&self) -> Vec<NodeId> {
        self.transitions()
            .map(|transition| transition.id)
            .filter(|&id| self.is_enabled(id))
            .collect()
    }

    /// Fires `transition` if it is enabled. Returns whether it fired.
    pub fn fire(&mut self, transition: NodeId) -> bool {
        if !self.is_enabled(transition) {
            return false;
        }

        let inputs: Vec<NodeId> = self.input_places(transition).collect();
        let outputs: Vec<NodeId> = self.output_places(transition).collect();

        for id in inputs {
            if let Some(place) = self.nodes.get_mut(&id).and_then(Node::as_place_mut) {
                place.markers -= 1;
            }
        }
        for id in outputs {
            if let Some(place) = self.nodes.get_mut(&id).and_then(Node::as_place_mut) {
                place.markers += 1;
            }
        }

        log::trace!("fired transition {}", transition);
        true
    }

    pub fn to_dot(&self) -> String {
        let mut dot = String::new();
        let _ = writeln!(&mut dot, "digraph PetriNet {{");
        let _ = writeln!(&mut dot, "    rankdir=LR;");
        let _ = writeln!(&mut dot, "    node [fontname=\"Helvetica\"];");

        for node in self.nodes.values() {
            match node {
                Node::Place(place) => {
                    let _ = writeln!(
                        &mut dot,
                        "    n{} [label=\"{}\\n{}\", shape=circle, style=filled, fillcolor=\"#e3f2fd\"];",
                        place.id,
                        escape_label(&place.name),
                        place.markers
                    );
                }
                Node::Transition(transition) => {
                    let _ = writeln!(
                        &mut dot,
                        "    n{} [label=\"{}\", shape=box, style=filled, fillcolor=\"#ffe0b2\"];",
                        transition.id,
                        escape_label(&transition.name)
                    );
                }
            }
        }

        for arc in &self.arcs {
            let _ = writeln!(&mut dot, "    n{} -> n{};", arc.source, arc.target);
        }

        let _ = writeln!(&mut dot, "}}");
        dot
    }

    pub fn write_dot<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_dot())
    }

    /// 检测孤立节点、非二分弧、悬空弧等结构问题
    pub fn diagnose(&self) -> DiagnosticReport {
        let mut report = DiagnosticReport {
            total_places: self.places_len(),
            total_transitions: self.transitions_len(),
            ..DiagnosticReport::default()
        };

        for arc in &self.arcs {
            match (self.nodes.get(&arc.source), self.nodes.get(&arc.target)) {
                (Some(source), Some(target)) => {
                    if source.is_place() == target.is_place() {
                        report.non_bipartite_arcs.push(*arc);
                    }
                }
                _ => report.dangling_arcs.push(*arc),
            }
        }

        for node in self.nodes.values() {
            let id = node.id();
            let has_input = self.target_arcs(id).next().is_some();
            let has_output = self.source_arcs(id).next().is_some();

            if !has_input && !has_output {
                report.isolated_nodes.push((id, node.name().to_string()));
                continue;
            }

            match node {
                Node::Transition(transition) if !has_input => {
                    report
                        .source_transitions
                        .push((id, transition.name.clone()));
                }
                Node::Place(place) if !has_input && place.markers == 0 => {
                    report.warnings.push(format!(
                        "place '{}' (id={}) has no input arc and no marker, it never holds a token",
                        place.name, id
                    ));
                }
                _ => {}
            }
        }

        report
    }

    pub fn log_diagnostics(&self) {
        let report = self.diagnose();

        if !report.has_issues() {
            log::info!(
                "net connectivity check passed: {} places, {} transitions",
                report.total_places,
                report.total_transitions
            );
            return;
        }

        log::warn!(
            "net diagnostics: {} places, {} transitions",
            report.total_places,
            report.total_transitions
        );
        for (id, name) in &report.isolated_nodes {
            log::warn!("  isolated node [{}] {}", id, name);
        }
        for arc in &report.non_bipartite_arcs {
            log::warn!("  non-bipartite arc {:?}", arc);
        }
        for arc in &report.dangling_arcs {
            log::warn!("  dangling arc {:?}", arc);
        }
        for warning in &report.warnings {
            log::warn!("  {}", warning);
        }
        for (id, name) in &report.source_transitions {
            log::debug!("  source transition [{}] {} is always enabled", id, name);
        }
    }
}

pub(crate) fn escape_label(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
