//! The polymorphic graph capability contract.
//!
//! [`FlowGraph`] is the single surface every graph consumer programs
//! against: renderers, reachability queries and the node iterator all
//! operate on this trait and never on a concrete representation. Concrete
//! graphs implement the required adjacency methods and override the
//! defaulted hooks (labels, colors, custom records) only when they want
//! non-default rendering.
//!
//! # Contract
//!
//! - Node ids are dense in `[0, size())`; ids with `exists(id) == false`
//!   are holes left by node removal or filtering.
//! - `succ`/`pred` may only be indexed with `0..nsucc(n)` / `0..npred(n)`;
//!   indexing outside that range is a caller error and panics like any
//!   out-of-bounds slice access.
//! - None of the trait operations fail: every method returns a value for
//!   every reachable state, including empty and single-node graphs.
//!
//! Long-running consumers (export, path search over large graphs) take an
//! explicit [`CancelToken`](crate::CancelToken) instead of reading a
//! cancellation flag off the graph object.

use std::io;

use crate::graph::{algorithms, NodeId, NodeIter};

/// A background color attached to nodes and edges in rendered output.
///
/// Stored as `0x00RRGGBB`. [`Color::DEFAULT`] means "let the renderer pick";
/// the GDL writer omits the color attribute entirely for default-colored
/// nodes and edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(pub u32);

impl Color {
    /// The renderer-chosen default color.
    pub const DEFAULT: Color = Color(0xFFFF_FFFF);

    /// `true` if this is [`Color::DEFAULT`].
    #[must_use]
    pub const fn is_default(self) -> bool {
        self.0 == Color::DEFAULT.0
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::DEFAULT
    }
}

/// Capability contract for drawable, queryable flow graphs.
///
/// Required methods describe the node-id space and the adjacency structure;
/// everything else has a default body suitable for dense graphs with no
/// custom rendering. See the [module documentation](self) for the contract.
///
/// # Examples
///
/// A minimal two-node graph with one edge:
///
/// ```rust
/// use flowscope::graph::{FlowGraph, NodeId};
///
/// struct Pair;
///
/// impl FlowGraph for Pair {
///     fn size(&self) -> usize { 2 }
///     fn nsucc(&self, n: NodeId) -> usize { usize::from(n.index() == 0) }
///     fn npred(&self, n: NodeId) -> usize { usize::from(n.index() == 1) }
///     fn succ(&self, _n: NodeId, _i: usize) -> NodeId { NodeId::new(1) }
///     fn pred(&self, _n: NodeId, _i: usize) -> NodeId { NodeId::new(0) }
/// }
///
/// let g = Pair;
/// assert_eq!(g.node_qty(), 2);
/// assert!(g.path_exists(NodeId::new(0), NodeId::new(1)));
/// assert!(!g.path_exists(NodeId::new(1), NodeId::new(0)));
/// ```
pub trait FlowGraph {
    /// Upper bound of the node-id space. Not every id below this bound needs
    /// to be alive; see [`exists`](Self::exists).
    fn size(&self) -> usize;

    /// Number of alive nodes. Defaults to [`size`](Self::size) for graphs
    /// without holes; graphs that hide or remove nodes must override.
    fn node_qty(&self) -> usize {
        self.size()
    }

    /// `true` if `node` is currently alive. Defaults to `true` (dense
    /// graphs).
    fn exists(&self, node: NodeId) -> bool {
        let _ = node;
        true
    }

    /// The entry node. Defaults to id 0.
    fn entry(&self) -> NodeId {
        NodeId::new(0)
    }

    /// The exit node. Defaults to the highest id in the space.
    fn exit(&self) -> NodeId {
        NodeId::new(self.size().saturating_sub(1))
    }

    /// Number of successors of `node`.
    fn nsucc(&self, node: NodeId) -> usize;

    /// Number of predecessors of `node`. Graphs that do not track reverse
    /// edges report 0.
    fn npred(&self, node: NodeId) -> usize;

    /// The `i`-th successor of `node`, `i` in `0..nsucc(node)`.
    fn succ(&self, node: NodeId, i: usize) -> NodeId;

    /// The `i`-th predecessor of `node`, `i` in `0..npred(node)`.
    fn pred(&self, node: NodeId, i: usize) -> NodeId;

    /// `true` if the graph has no alive nodes.
    fn is_empty(&self) -> bool {
        self.node_qty() == 0
    }

    /// Edge count in the chosen direction; selects between
    /// [`nsucc`](Self::nsucc) and [`npred`](Self::npred).
    fn nedges(&self, node: NodeId, ispred: bool) -> usize {
        if ispred {
            self.npred(node)
        } else {
            self.nsucc(node)
        }
    }

    /// The `i`-th neighbor in the chosen direction; selects between
    /// [`succ`](Self::succ) and [`pred`](Self::pred).
    fn edge(&self, node: NodeId, i: usize, ispred: bool) -> NodeId {
        if ispred {
            self.pred(node, i)
        } else {
            self.succ(node, i)
        }
    }

    /// Label text for `node` in rendered output. Defaults to no label.
    fn node_label(&self, node: NodeId) -> Option<String> {
        let _ = node;
        None
    }

    /// Background color for `node`. Defaults to [`Color::DEFAULT`].
    fn node_color(&self, node: NodeId) -> Color {
        let _ = node;
        Color::DEFAULT
    }

    /// Color for the edge `src -> dst`. Defaults to [`Color::DEFAULT`].
    fn edge_color(&self, src: NodeId, dst: NodeId) -> Color {
        let _ = (src, dst);
        Color::DEFAULT
    }

    /// Writes additional graph-level attribute lines into the export header.
    /// Defaults to writing nothing.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors from `out`.
    fn graph_attributes(&self, out: &mut dyn io::Write) -> io::Result<()> {
        let _ = out;
        Ok(())
    }

    /// Writes a fully custom node record for `node`. Returning `false`
    /// (the default) makes the exporter emit its standard record built from
    /// [`node_label`](Self::node_label) and [`node_color`](Self::node_color).
    ///
    /// # Errors
    ///
    /// Propagates I/O errors from `out`.
    fn print_node(&self, out: &mut dyn io::Write, node: NodeId) -> io::Result<bool> {
        let _ = (out, node);
        Ok(false)
    }

    /// Writes a fully custom edge record for `src -> dst`. Returning `false`
    /// (the default) makes the exporter emit its standard record.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors from `out`.
    fn print_edge(&self, out: &mut dyn io::Write, src: NodeId, dst: NodeId) -> io::Result<bool> {
        let _ = (out, src, dst);
        Ok(false)
    }

    /// Writes extra attribute lines into the standard node record for
    /// `node`. Defaults to writing nothing.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors from `out`.
    fn node_attributes(&self, out: &mut dyn io::Write, node: NodeId) -> io::Result<()> {
        let _ = (out, node);
        Ok(())
    }

    /// Iterates the alive nodes of this graph in ascending id order.
    fn nodes(&self) -> NodeIter<'_, Self>
    where
        Self: Sized,
    {
        NodeIter::begin(self)
    }

    /// `true` if a directed path from `m` to `n` exists (including `m == n`).
    fn path_exists(&self, m: NodeId, n: NodeId) -> bool
    where
        Self: Sized,
    {
        algorithms::path_exists(self, m, n)
    }
}
