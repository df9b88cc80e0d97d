//! Synthetic call and cross-reference graphs.
//!
//! Flow charts cover one function; the graphs here cover relationships
//! *between* functions. They are built from an external [`XrefSource`]
//! collaborator — the crate knows nothing about how functions or
//! cross-references are discovered, mirroring the decode-oracle seam used
//! by the flow-chart builder.
//!
//! [`CallGraph`] implements [`FlowGraph`], so the same export bridge and
//! path queries work on it unchanged. Library functions excluded by the
//! caller are *hidden* rather than removed: their ids stay allocated but
//! [`FlowGraph::exists`] reports `false`, and every generic consumer skips
//! them through the node iterator.

use std::collections::HashMap;
use std::io::{self, Write};

use crate::{
    decode::AddrRange,
    graph::{Color, FlowGraph, NodeId, NodeSeq},
};

/// One function as reported by the xref source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncDesc {
    /// Entry address, also the function's identity.
    pub entry: u64,
    /// Display name.
    pub name: String,
    /// `true` for library/runtime functions.
    pub is_library: bool,
}

/// Kind of a cross-reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XrefKind {
    /// A call instruction.
    Call,
    /// A jump (tail call or thunk).
    Jump,
    /// A data reference.
    Data,
}

/// One directed cross-reference between two addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Xref {
    /// Referencing address.
    pub from: u64,
    /// Referenced address.
    pub to: u64,
    /// Reference kind.
    pub kind: XrefKind,
}

/// External collaborator enumerating functions and cross-references.
pub trait XrefSource {
    /// All known functions.
    fn functions(&self) -> Vec<FuncDesc>;

    /// The function whose entry is exactly `ea`, if any.
    fn function_at(&self, ea: u64) -> Option<FuncDesc>;

    /// References originating inside the function entered at `ea`.
    fn refs_from(&self, ea: u64) -> Vec<Xref>;

    /// References targeting `ea`.
    fn refs_to(&self, ea: u64) -> Vec<Xref>;
}

/// Inclusion policy for [`CallGraph::build_xrefs`].
///
/// Mirrors the cross-reference chart request flags: which directions to
/// expand, whether to recurse, and which references to ignore.
#[derive(Debug, Clone, Copy, Default)]
pub struct XrefConfig {
    /// Expand along references *to* discovered functions (their callers).
    pub referencing: bool,
    /// Expand along references *from* discovered functions (their callees).
    pub referenced: bool,
    /// Keep expanding from newly added functions.
    pub recursive: bool,
    /// When recursing, only continue in the direction that discovered the
    /// current function.
    pub follow_direction: bool,
    /// Ignore references to library functions.
    pub ignore_lib_to: bool,
    /// Ignore references from library functions.
    pub ignore_lib_from: bool,
    /// Ignore data references.
    pub ignore_data: bool,
    /// Recursion depth limit; `None` means unlimited.
    pub max_depth: Option<usize>,
}

/// One node of a [`CallGraph`].
#[derive(Debug, Clone)]
pub struct CallNode {
    /// Function entry address.
    pub ea: u64,
    /// Display name.
    pub name: String,
    /// `true` for library functions.
    pub is_library: bool,
    hidden: bool,
}

/// A function-level graph: nodes are functions, edges are references.
///
/// Built by [`build_simple`](Self::build_simple) (whole-program call graph)
/// or [`build_xrefs`](Self::build_xrefs) (cross-reference neighborhood of
/// an address range).
#[derive(Debug, Clone, Default)]
pub struct CallGraph {
    title: String,
    nodes: Vec<CallNode>,
    succ: Vec<NodeSeq>,
    pred: Vec<NodeSeq>,
    index: HashMap<u64, usize>,
}

/// Expansion direction used by the xref worklist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dir {
    Callers,
    Callees,
}

/// Applies the ignore filters to one reference; `true` means drop it.
fn ignored(config: &XrefConfig, from_func: &FuncDesc, to_func: &FuncDesc, xref: Xref) -> bool {
    if config.ignore_data && xref.kind == XrefKind::Data {
        return true;
    }
    if config.ignore_lib_from && from_func.is_library {
        return true;
    }
    if config.ignore_lib_to && to_func.is_library {
        return true;
    }
    false
}

impl CallGraph {
    fn new(title: impl Into<String>) -> Self {
        CallGraph {
            title: title.into(),
            ..CallGraph::default()
        }
    }

    /// Builds the whole-program call graph: one node per function reported
    /// by `source`, one edge per call or jump reference between functions.
    ///
    /// With `hide_libs`, library functions stay in the id space but are
    /// hidden from iteration and export.
    pub fn build_simple(title: impl Into<String>, source: &dyn XrefSource, hide_libs: bool) -> Self {
        let mut graph = CallGraph::new(title);

        for func in source.functions() {
            graph.add_func(&func);
        }
        for func in source.functions() {
            for xref in source.refs_from(func.entry) {
                if xref.kind == XrefKind::Data {
                    continue;
                }
                if let Some(callee) = source.function_at(xref.to) {
                    let from = graph.add_func(&func);
                    let to = graph.add_func(&callee);
                    graph.add_edge(from, to);
                }
            }
        }

        if hide_libs {
            graph.hide_libraries();
        }
        graph
    }

    /// Builds the cross-reference neighborhood of `range`.
    ///
    /// Functions whose entry lies in `range` seed a worklist which expands
    /// along callers and/or callees according to `config`; see
    /// [`XrefConfig`] for the individual knobs.
    pub fn build_xrefs(
        title: impl Into<String>,
        source: &dyn XrefSource,
        range: AddrRange,
        config: XrefConfig,
    ) -> Self {
        let mut graph = CallGraph::new(title);
        let mut work: Vec<(u64, usize, Option<Dir>)> = Vec::new();

        for func in source.functions() {
            if range.contains(func.entry) {
                graph.add_func(&func);
                work.push((func.entry, 0, None));
            }
        }

        while let Some((ea, depth, came_from)) = work.pop() {
            if depth > 0 && !config.recursive {
                continue;
            }
            if config.max_depth.is_some_and(|limit| depth >= limit) {
                continue;
            }
            let Some(this) = source.function_at(ea) else {
                continue;
            };
            let this_id = NodeId::new(graph.index[&ea]);

            let follow = |dir: Dir| -> bool {
                !config.follow_direction || came_from.is_none() || came_from == Some(dir)
            };

            if config.referenced && follow(Dir::Callees) {
                for xref in source.refs_from(ea) {
                    let Some(callee) = source.function_at(xref.to) else {
                        continue;
                    };
                    if ignored(&config, &this, &callee, xref) {
                        continue;
                    }
                    let fresh = !graph.index.contains_key(&callee.entry);
                    let to = graph.add_func(&callee);
                    graph.add_edge(this_id, to);
                    if fresh {
                        work.push((callee.entry, depth + 1, Some(Dir::Callees)));
                    }
                }
            }

            if config.referencing && follow(Dir::Callers) {
                for xref in source.refs_to(ea) {
                    let Some(caller) = source.function_at(xref.from) else {
                        continue;
                    };
                    if ignored(&config, &caller, &this, xref) {
                        continue;
                    }
                    let fresh = !graph.index.contains_key(&caller.entry);
                    let from = graph.add_func(&caller);
                    graph.add_edge(from, this_id);
                    if fresh {
                        work.push((caller.entry, depth + 1, Some(Dir::Callers)));
                    }
                }
            }
        }

        graph
    }

    /// Adds a node for `func`, or returns the existing id for its entry.
    fn add_func(&mut self, func: &FuncDesc) -> NodeId {
        if let Some(&i) = self.index.get(&func.entry) {
            return NodeId::new(i);
        }
        let id = self.nodes.len();
        self.nodes.push(CallNode {
            ea: func.entry,
            name: func.name.clone(),
            is_library: func.is_library,
            hidden: false,
        });
        self.succ.push(NodeSeq::new());
        self.pred.push(NodeSeq::new());
        self.index.insert(func.entry, id);
        NodeId::new(id)
    }

    fn add_edge(&mut self, from: NodeId, to: NodeId) {
        if self.succ[from.index()].add_unique(to) {
            self.pred[to.index()].add_unique(from);
        }
    }

    /// Hides every library node; ids stay allocated but the nodes vanish
    /// from iteration and export.
    pub fn hide_libraries(&mut self) {
        for node in &mut self.nodes {
            if node.is_library {
                node.hidden = true;
            }
        }
    }

    /// The graph title used in rendered output.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// All nodes, including hidden ones.
    #[must_use]
    pub fn nodes_data(&self) -> &[CallNode] {
        &self.nodes
    }

    /// Node id of the function entered at `ea`, if present.
    #[must_use]
    pub fn node_at(&self, ea: u64) -> Option<NodeId> {
        self.index.get(&ea).map(|&i| NodeId::new(i))
    }
}

impl FlowGraph for CallGraph {
    fn size(&self) -> usize {
        self.nodes.len()
    }

    fn node_qty(&self) -> usize {
        self.nodes.iter().filter(|n| !n.hidden).count()
    }

    fn exists(&self, node: NodeId) -> bool {
        !self.nodes[node.index()].hidden
    }

    fn nsucc(&self, node: NodeId) -> usize {
        self.succ[node.index()].len()
    }

    fn npred(&self, node: NodeId) -> usize {
        self.pred[node.index()].len()
    }

    fn succ(&self, node: NodeId, i: usize) -> NodeId {
        self.succ[node.index()][i]
    }

    fn pred(&self, node: NodeId, i: usize) -> NodeId {
        self.pred[node.index()][i]
    }

    fn node_label(&self, node: NodeId) -> Option<String> {
        Some(self.nodes[node.index()].name.clone())
    }

    fn node_color(&self, node: NodeId) -> Color {
        if self.nodes[node.index()].is_library {
            Color(0x00D8_D8D8)
        } else {
            Color::DEFAULT
        }
    }

    fn graph_attributes(&self, out: &mut dyn io::Write) -> io::Result<()> {
        writeln!(
            out,
            "title: \"{}\"",
            crate::render::escape_gdl(&self.title)
        )
    }
}


#[cfg(test)]
mod tests {
    use super::{tests_support::TableSource, *};

    fn sample() -> TableSource {
        TableSource::new(
            &[
                (0x100, "main", false),
                (0x200, "helper", false),
                (0x300, "memcpy", true),
            ],
            &[
                (0x100, 0x200, XrefKind::Call),
                (0x100, 0x300, XrefKind::Call),
                (0x200, 0x300, XrefKind::Call),
            ],
        )
    }

    #[test]
    fn test_simple_call_graph() {
        let graph = CallGraph::build_simple("calls", &sample(), false);

        assert_eq!(graph.size(), 3);
        assert_eq!(graph.node_qty(), 3);

        let main = graph.node_at(0x100).unwrap();
        let helper = graph.node_at(0x200).unwrap();
        let memcpy = graph.node_at(0x300).unwrap();
        assert_eq!(graph.nsucc(main), 2);
        assert_eq!(graph.npred(memcpy), 2);
        assert!(graph.path_exists(main, memcpy));
        assert!(!graph.path_exists(memcpy, main));
        assert_eq!(graph.node_label(helper), Some("helper".to_string()));
    }

    #[test]
    fn test_hidden_libraries_become_holes() {
        let graph = CallGraph::build_simple("calls", &sample(), true);

        assert_eq!(graph.size(), 3);
        assert_eq!(graph.node_qty(), 2);
        let memcpy = graph.node_at(0x300).unwrap();
        assert!(!graph.exists(memcpy));
        assert!(graph.nodes().all(|n| graph.exists(n)));
        assert_eq!(graph.nodes().count(), 2);
    }

    #[test]
    fn test_xref_graph_callees_only() {
        let graph = CallGraph::build_xrefs(
            "xrefs",
            &sample(),
            AddrRange::new(0x100, 0x101),
            XrefConfig {
                referenced: true,
                ..XrefConfig::default()
            },
        );

        // Seeds from main, expands one level of callees, no recursion.
        assert_eq!(graph.size(), 3);
        let main = graph.node_at(0x100).unwrap();
        assert_eq!(graph.nsucc(main), 2);
        let helper = graph.node_at(0x200).unwrap();
        assert_eq!(graph.nsucc(helper), 0);
    }

    #[test]
    fn test_xref_graph_recursive_with_depth_limit() {
        let chain = TableSource::new(
            &[
                (0x1, "a", false),
                (0x2, "b", false),
                (0x3, "c", false),
                (0x4, "d", false),
            ],
            &[
                (0x1, 0x2, XrefKind::Call),
                (0x2, 0x3, XrefKind::Call),
                (0x3, 0x4, XrefKind::Call),
            ],
        );

        let config = XrefConfig {
            referenced: true,
            recursive: true,
            max_depth: Some(2),
            ..XrefConfig::default()
        };
        let graph = CallGraph::build_xrefs("xrefs", &chain, AddrRange::new(0x1, 0x2), config);

        // Depth 2 reaches c but stops before d.
        assert!(graph.node_at(0x3).is_some());
        assert!(graph.node_at(0x4).is_none());
    }

    #[test]
    fn test_xref_graph_callers() {
        let graph = CallGraph::build_xrefs(
            "xrefs",
            &sample(),
            AddrRange::new(0x300, 0x301),
            XrefConfig {
                referencing: true,
                ..XrefConfig::default()
            },
        );

        let memcpy = graph.node_at(0x300).unwrap();
        assert_eq!(graph.npred(memcpy), 2);
    }

    #[test]
    fn test_xref_ignore_lib_to() {
        let graph = CallGraph::build_xrefs(
            "xrefs",
            &sample(),
            AddrRange::new(0x100, 0x101),
            XrefConfig {
                referenced: true,
                ignore_lib_to: true,
                ..XrefConfig::default()
            },
        );

        assert!(graph.node_at(0x300).is_none());
        assert!(graph.node_at(0x200).is_some());
    }
}
