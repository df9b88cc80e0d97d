//! High-level "build and display" chart operations.
//!
//! These conveniences wire the three graph producers — function flow
//! charts, the simple call graph, and the complex cross-reference graph —
//! to the same GDL export path. They add no graph algorithm of their own,
//! only flag-driven node/edge inclusion policy.

use std::path::Path;

use bitflags::bitflags;

use crate::{
    callgraph::{CallGraph, XrefConfig, XrefSource},
    cancel::CancelToken,
    decode::{AddrRange, DecodeOracle},
    flowchart::{ChartFlags, FlowChart},
    graph::FlowGraph,
    render::{display_gdl, gen_gdl, ViewerConfig},
    Error, Result,
};

bitflags! {
    /// Render request flags for the chart conveniences.
    ///
    /// At least one of [`GEN_GDL`](Self::GEN_GDL),
    /// [`GEN_DOT`](Self::GEN_DOT) or
    /// [`LAUNCH_VIEWER`](Self::LAUNCH_VIEWER) must be set or the operation
    /// returns `Ok(false)` without producing anything.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct RenderFlags: u32 {
        /// References to the addresses in the range (their callers).
        const REFERENCING = 0x0001;
        /// References from the addresses in the range (their callees).
        const REFERENCED = 0x0002;
        /// Keep analyzing newly added functions.
        const RECURSIVE = 0x0004;
        /// Only follow references in the direction that discovered the
        /// current function.
        const FOLLOW_DIRECTION = 0x0008;
        /// Ignore data references.
        const IGNORE_DATA = 0x0020;
        /// Ignore references to library functions.
        const IGNORE_LIB_TO = 0x0040;
        /// Ignore references from library functions.
        const IGNORE_LIB_FROM = 0x0080;
        /// Don't include library functions in the graph.
        const NO_LIB_FUNCS = 0x0400;
        /// Print labels for each node.
        const PRINT_NAMES = 0x1000;
        /// Generate a .dot file (reserved, not implemented).
        const GEN_DOT = 0x2000;
        /// Generate a .gdl file.
        const GEN_GDL = 0x4000;
        /// Launch the external viewer on the produced file.
        const LAUNCH_VIEWER = 0x8000;
    }
}

impl RenderFlags {
    fn wants_output(self) -> bool {
        self.intersects(RenderFlags::GEN_GDL | RenderFlags::GEN_DOT | RenderFlags::LAUNCH_VIEWER)
    }
}

/// Exports `graph` and optionally launches the viewer on the result.
fn export_and_show<G: FlowGraph + ?Sized>(
    graph: &G,
    path: &Path,
    flags: RenderFlags,
    viewer: Option<&ViewerConfig>,
    cancel: &CancelToken,
) -> Result<bool> {
    if flags.contains(RenderFlags::GEN_DOT) {
        return Err(Error::NotSupported);
    }
    gen_gdl(graph, path, cancel)?;

    if flags.contains(RenderFlags::LAUNCH_VIEWER) {
        let Some(viewer) = viewer else {
            log::warn!("no graph viewer configured, leaving {}", path.display());
            return Ok(false);
        };
        let code = display_gdl(viewer, path);
        if code != 0 {
            log::warn!("graph viewer exited with code {code}");
            return Ok(false);
        }
    }
    Ok(true)
}

/// Builds a function flow chart over `ranges` and exports it.
///
/// Returns `Ok(false)` when `flags` request no output action or the viewer
/// could not display the result; `Ok(true)` on full success.
///
/// # Errors
///
/// Returns [`Error::NotSupported`] for [`RenderFlags::GEN_DOT`] and
/// [`Error::FileError`] when the export file cannot be written.
pub fn gen_flow_graph<O: DecodeOracle + ?Sized>(
    path: &Path,
    title: &str,
    oracle: &O,
    ranges: &[AddrRange],
    flags: RenderFlags,
    viewer: Option<&ViewerConfig>,
    cancel: &CancelToken,
) -> Result<bool> {
    if !flags.wants_output() {
        return Ok(false);
    }

    let mut cflags = ChartFlags::empty();
    if flags.contains(RenderFlags::PRINT_NAMES) {
        cflags |= ChartFlags::PRINT_NAMES;
    }
    let chart = FlowChart::build_multirange(title, oracle, ranges, cflags, cancel);
    export_and_show(&chart, path, flags, viewer, cancel)
}

/// Builds the whole-program call graph and exports it.
///
/// Returns `Ok(false)` when `flags` request no output action or the viewer
/// could not display the result; `Ok(true)` on full success.
///
/// # Errors
///
/// Returns [`Error::NotSupported`] for [`RenderFlags::GEN_DOT`] and
/// [`Error::FileError`] when the export file cannot be written.
pub fn gen_simple_call_chart(
    path: &Path,
    title: &str,
    source: &dyn XrefSource,
    flags: RenderFlags,
    viewer: Option<&ViewerConfig>,
    cancel: &CancelToken,
) -> Result<bool> {
    if !flags.wants_output() {
        return Ok(false);
    }

    let graph = CallGraph::build_simple(title, source, flags.contains(RenderFlags::NO_LIB_FUNCS));
    export_and_show(&graph, path, flags, viewer, cancel)
}

/// Builds the cross-reference graph around `range` and exports it.
///
/// `recursion_depth` limits the expansion; `None` means unlimited.
///
/// Returns `Ok(false)` when `flags` request no output action or the viewer
/// could not display the result; `Ok(true)` on full success.
///
/// # Errors
///
/// Returns [`Error::NotSupported`] for [`RenderFlags::GEN_DOT`] and
/// [`Error::FileError`] when the export file cannot be written.
pub fn gen_complex_call_chart(
    path: &Path,
    title: &str,
    source: &dyn XrefSource,
    range: AddrRange,
    flags: RenderFlags,
    recursion_depth: Option<usize>,
    viewer: Option<&ViewerConfig>,
    cancel: &CancelToken,
) -> Result<bool> {
    if !flags.wants_output() {
        return Ok(false);
    }

    let config = XrefConfig {
        referencing: flags.contains(RenderFlags::REFERENCING),
        referenced: flags.contains(RenderFlags::REFERENCED),
        recursive: flags.contains(RenderFlags::RECURSIVE),
        follow_direction: flags.contains(RenderFlags::FOLLOW_DIRECTION),
        ignore_lib_to: flags.contains(RenderFlags::IGNORE_LIB_TO),
        ignore_lib_from: flags.contains(RenderFlags::IGNORE_LIB_FROM),
        ignore_data: flags.contains(RenderFlags::IGNORE_DATA),
        max_depth: recursion_depth,
    };
    let mut graph = CallGraph::build_xrefs(title, source, range, config);
    if flags.contains(RenderFlags::NO_LIB_FUNCS) {
        graph.hide_libraries();
    }
    export_and_show(&graph, path, flags, viewer, cancel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callgraph::{tests_support::TableSource, XrefKind};
    use crate::decode::tests_support::MapOracle;
    use crate::decode::FlowKind;
    use crate::render::GdlDocument;

    fn read(path: &Path) -> GdlDocument {
        GdlDocument::parse(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn test_no_output_action_returns_false() {
        let oracle = MapOracle::new();
        let ok = gen_flow_graph(
            Path::new("/tmp/never-written.gdl"),
            "f",
            &oracle,
            &[AddrRange::new(0, 0)],
            RenderFlags::PRINT_NAMES,
            None,
            &CancelToken::new(),
        )
        .unwrap();
        assert!(!ok);
    }

    #[test]
    fn test_gen_dot_is_reserved() {
        let oracle = MapOracle::new().with(0, FlowKind::Return, 1, &[]);
        let err = gen_flow_graph(
            Path::new("/tmp/never-written.dot"),
            "f",
            &oracle,
            &[AddrRange::new(0, 1)],
            RenderFlags::GEN_DOT,
            None,
            &CancelToken::new(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::NotSupported));
    }

    #[test]
    fn test_flow_graph_export() {
        let oracle = MapOracle::new()
            .with(0, FlowKind::CondJump, 2, &[4])
            .with(2, FlowKind::Return, 2, &[])
            .with(4, FlowKind::Return, 2, &[]);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flow.gdl");
        let ok = gen_flow_graph(
            &path,
            "f",
            &oracle,
            &[AddrRange::new(0, 6)],
            RenderFlags::GEN_GDL | RenderFlags::PRINT_NAMES,
            None,
            &CancelToken::new(),
        )
        .unwrap();
        assert!(ok);

        let doc = read(&path);
        assert_eq!(doc.nodes.len(), 3);
        assert_eq!(doc.edges.len(), 2);
        assert!(doc.print_names);
        assert_eq!(doc.title.as_deref(), Some("f"));
    }

    #[test]
    fn test_simple_call_chart_skips_hidden_libs() {
        let source = TableSource::new(
            &[(0x1, "main", false), (0x2, "strlen", true)],
            &[(0x1, 0x2, XrefKind::Call)],
        );

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calls.gdl");
        let ok = gen_simple_call_chart(
            &path,
            "calls",
            &source,
            RenderFlags::GEN_GDL | RenderFlags::NO_LIB_FUNCS,
            None,
            &CancelToken::new(),
        )
        .unwrap();
        assert!(ok);

        let doc = read(&path);
        assert_eq!(doc.nodes.len(), 1);
        assert!(doc.edges.is_empty());
    }

    #[test]
    fn test_complex_chart_depth_limit() {
        let source = TableSource::new(
            &[(0x1, "a", false), (0x2, "b", false), (0x3, "c", false)],
            &[(0x1, 0x2, XrefKind::Call), (0x2, 0x3, XrefKind::Call)],
        );

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("xrefs.gdl");
        let ok = gen_complex_call_chart(
            &path,
            "xrefs",
            &source,
            AddrRange::new(0x1, 0x2),
            RenderFlags::GEN_GDL | RenderFlags::REFERENCED | RenderFlags::RECURSIVE,
            Some(1),
            None,
            &CancelToken::new(),
        )
        .unwrap();
        assert!(ok);

        let doc = read(&path);
        assert_eq!(doc.nodes.len(), 2);
    }

    #[test]
    fn test_viewer_failure_keeps_file() {
        let oracle = MapOracle::new().with(0, FlowKind::Return, 1, &[]);
        let viewer = ViewerConfig::new("/nonexistent/viewer-binary");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flow.gdl");
        let ok = gen_flow_graph(
            &path,
            "f",
            &oracle,
            &[AddrRange::new(0, 1)],
            RenderFlags::GEN_GDL | RenderFlags::LAUNCH_VIEWER,
            Some(&viewer),
            &CancelToken::new(),
        )
        .unwrap();

        assert!(!ok);
        assert_eq!(read(&path).nodes.len(), 1);
    }
}
