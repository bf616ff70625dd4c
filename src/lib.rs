//! Compiles a small regular-expression grammar (literals, `(` `)`, `|`, `*`,
//! `+`) into an ε-NFA and describes it for graph rendering.

pub mod automaton;
pub mod compiler;
mod descent;
pub mod export;
pub mod matching;
pub mod parser;
pub mod utils;
pub mod validator;

pub use automaton::{Automaton, AutomatonError, State, StateId, Symbol};
pub use compiler::{compile, CompileError, Compiler};
pub use export::{GraphDescription, GraphEdge, GraphNode};
pub use utils::{CompileFlags, CompileOptions};
