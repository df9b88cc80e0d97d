//! GDL serialization of abstract graphs.
//!
//! The writer walks any [`FlowGraph`] through the node iterator and emits a
//! line-oriented GDL description: a header block of graph attributes, one
//! node record per alive node, one edge record per successor edge. Writing
//! is append-only and single pass; graphs that need post-hoc attributes
//! must precompute them before export begins.
//!
//! [`GdlDocument`] is the minimal reader counterpart: it recovers node and
//! edge identity plus the two flow-chart header flags, which is exactly
//! what the round-trip contract requires. It is not a general GDL parser.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::{
    cancel::CancelToken,
    graph::{FlowGraph, NodeIter},
    Error, Result,
};

/// Escapes a string for use inside a quoted GDL attribute value.
#[must_use]
pub fn escape_gdl(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "")
}

/// Serializes `graph` as GDL into `out`.
///
/// Cancellation is checked once per node; a cancelled export leaves a
/// truncated but syntactically closed file.
///
/// # Errors
///
/// Returns [`Error::FileError`] when writing to `out` fails.
pub fn write_gdl<G, W>(graph: &G, mut out: W, cancel: &CancelToken) -> Result<()>
where
    G: FlowGraph + ?Sized,
    W: io::Write,
{
    writeln!(out, "graph: {{")?;
    graph.graph_attributes(&mut out)?;
    writeln!(out, "manhattan_edges: yes")?;
    writeln!(out, "layoutalgorithm: mindepth")?;
    writeln!(out, "finetuning: no")?;

    let mut cancelled = false;
    for node in NodeIter::begin(graph) {
        if cancel.is_cancelled() {
            cancelled = true;
            break;
        }
        if graph.print_node(&mut out, node)? {
            continue;
        }
        write!(out, "node: {{ title: \"{}\"", node.index())?;
        if let Some(label) = graph.node_label(node) {
            write!(out, " label: \"{}\"", escape_gdl(&label))?;
        }
        let color = graph.node_color(node);
        if !color.is_default() {
            write!(out, " color: {}", color.0)?;
        }
        graph.node_attributes(&mut out, node)?;
        writeln!(out, " }}")?;
    }

    if !cancelled {
        for node in NodeIter::begin(graph) {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            for i in 0..graph.nsucc(node) {
                let dst = graph.succ(node, i);
                if !graph.exists(dst) {
                    continue;
                }
                if graph.print_edge(&mut out, node, dst)? {
                    continue;
                }
                write!(
                    out,
                    "edge: {{ sourcename: \"{}\" targetname: \"{}\"",
                    node.index(),
                    dst.index()
                )?;
                let color = graph.edge_color(node, dst);
                if !color.is_default() {
                    write!(out, " color: {}", color.0)?;
                }
                writeln!(out, " }}")?;
            }
        }
    }

    if cancelled {
        log::debug!("gdl export cancelled");
    }
    writeln!(out, "}}")?;
    out.flush()?;
    Ok(())
}

/// Serializes `graph` as GDL into the file at `path`.
///
/// # Errors
///
/// Returns [`Error::FileError`] when the file cannot be created or written.
pub fn gen_gdl<G: FlowGraph + ?Sized>(graph: &G, path: &Path, cancel: &CancelToken) -> Result<()> {
    let file = File::create(path)?;
    write_gdl(graph, BufWriter::new(file), cancel)
}

/// Parsed skeleton of a GDL file: node/edge identity plus the two
/// flow-chart header flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GdlDocument {
    /// The graph title, if the header carried one.
    pub title: Option<String>,
    /// The `print_names` header flag.
    pub print_names: bool,
    /// The `preds` header flag ("has predecessors").
    pub preds: bool,
    /// Node ids, in file order.
    pub nodes: Vec<usize>,
    /// `(source, target)` pairs, in file order.
    pub edges: Vec<(usize, usize)>,
}

/// Returns the first quoted value following `key` in `line`.
fn quoted_after<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let rest = &line[line.find(key)? + key.len()..];
    let open = rest.find('"')?;
    let rest = &rest[open + 1..];
    let close = rest.find('"')?;
    Some(&rest[..close])
}

fn parse_id(line: &str, key: &str) -> Result<usize> {
    let value = quoted_after(line, key)
        .ok_or_else(|| Error::GraphError(format!("missing {key} in record: {line}")))?;
    value
        .parse()
        .map_err(|_| Error::GraphError(format!("non-numeric {key} in record: {line}")))
}

impl GdlDocument {
    /// Parses the skeleton of a GDL file produced by [`write_gdl`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::GraphError`] when a node or edge record lacks its
    /// identity attributes, and [`Error::Empty`] for input with no
    /// `graph:` block at all.
    pub fn parse(text: &str) -> Result<Self> {
        let mut doc = GdlDocument::default();
        let mut saw_graph = false;

        for line in text.lines().map(str::trim) {
            if line.starts_with("graph:") {
                saw_graph = true;
            } else if line.starts_with("node:") {
                doc.nodes.push(parse_id(line, "title:")?);
            } else if line.starts_with("edge:") {
                let src = parse_id(line, "sourcename:")?;
                let dst = parse_id(line, "targetname:")?;
                doc.edges.push((src, dst));
            } else if line.starts_with("title:") {
                doc.title = quoted_after(line, "title:").map(str::to_string);
            } else if let Some(value) = line.strip_prefix("// print_names:") {
                doc.print_names = value.trim() == "yes";
            } else if let Some(value) = line.strip_prefix("// preds:") {
                doc.preds = value.trim() == "yes";
            }
        }

        if !saw_graph {
            return Err(Error::Empty);
        }
        Ok(doc)
    }
}
