use std::{
    env::temp_dir,
    fs::File,
    io::{self, Write},
    path::{Path, PathBuf},
    process::Command,
};

use itertools::Itertools;
use thiserror::Error;

use crate::automaton::Automaton;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode {
    pub id: String,
    pub is_final: bool,
}

/// `label` is empty for epsilon transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphEdge {
    pub source: String,
    pub destination: String,
    pub label: String,
}

/// Renderer-facing view of a finished automaton.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphDescription {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub initial: String,
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("could not write graph: {0}")]
    Io(#[from] io::Error),
    #[error("dot exited with {0}")]
    Dot(std::process::ExitStatus),
}

const ENTRY_NODE: &str = "__entry";

impl GraphDescription {
    pub fn from_automaton(automaton: &Automaton) -> GraphDescription {
        let name = |id| format!("q{}", id);
        GraphDescription {
            nodes: automaton
                .states()
                .iter()
                .map(|state| GraphNode {
                    id: state.name(),
                    is_final: state.is_final(),
                })
                .collect(),
            edges: automaton
                .transitions()
                .map(|(src, symbol, dst)| GraphEdge {
                    source: name(src),
                    destination: name(dst),
                    label: symbol.label(),
                })
                .collect(),
            initial: name(automaton.initial()),
        }
    }

    /// Graphviz source: left to right, final states as double circles,
    /// epsilon edges dashed and an unlabeled arrow into the initial state.
    pub fn to_dot(&self) -> String {
        let nodes = self
            .nodes
            .iter()
            .map(|node| {
                let shape = if node.is_final {
                    "doublecircle"
                } else {
                    "circle"
                };
                format!("  {}[label=\"{}\" shape={}]", node.id, node.id, shape)
            })
            .join("\n");
        let edges = self
            .edges
            .iter()
            .map(|edge| {
                if edge.label.is_empty() {
                    format!("  {} -> {}[style=dashed]", edge.source, edge.destination)
                } else {
                    format!(
                        "  {} -> {}[label=\"{}\"]",
                        edge.source,
                        edge.destination,
                        escape(&edge.label)
                    )
                }
            })
            .join("\n");
        format!(
            "digraph G {{\n  rankdir=\"LR\"\n  node [fontname = \"verdana\"];\n  \
             edge [fontname = \"verdana\"];\n  {}[label=\"\" shape=none]\n{}\n  {} -> {}\n{}\n}}\n",
            ENTRY_NODE, nodes, ENTRY_NODE, self.initial, edges
        )
    }

    /// Writes the DOT source to the temp directory and runs `dot` to produce
    /// `output` in the given format (`png`, `svg`, `pdf`, ...).
    pub fn render(&self, format: &str, output: &Path) -> Result<PathBuf, ExportError> {
        let mut dot_path = temp_dir();
        dot_path.push("automaton.dot");
        let mut file = File::create(&dot_path)?;
        file.write_all(self.to_dot().as_bytes())?;
        log::debug!("wrote {}", dot_path.display());

        let status = Command::new("dot")
            .arg(format!("-T{}", format))
            .arg(&dot_path)
            .arg("-o")
            .arg(output)
            .status()?;
        if status.success() {
            log::info!("rendered automaton to {}", output.display());
            Ok(output.to_path_buf())
        } else {
            Err(ExportError::Dot(status))
        }
    }
}

fn escape(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}
