use colored::Colorize;
use thiserror::Error;

use crate::{
    automaton::{Automaton, AutomatonError, StateId, Symbol},
    descent::LegacyDescent,
    parser::{run_parse, visitor::Visitor, Data, Node, ParserError, Quantifier},
    utils::{CompileFlags, CompileOptions},
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompileError {
    #[error("malformed pattern: {0}")]
    MalformedPattern(ParserError),
    #[error("groups nested deeper than {limit}")]
    DepthLimitExceeded { limit: usize },
    #[error("pattern is {length} characters long, the limit is {limit}")]
    PatternTooLong { length: usize, limit: usize },
    #[error("internal error: transition references unknown state q{0}")]
    UnknownStateReference(StateId),
}

impl From<ParserError> for CompileError {
    fn from(error: ParserError) -> Self {
        match error {
            ParserError::DepthLimitExceeded { limit, .. } => {
                CompileError::DepthLimitExceeded { limit }
            }
            ParserError::PatternTooLong { length, limit } => {
                CompileError::PatternTooLong { length, limit }
            }
            malformed => CompileError::MalformedPattern(malformed),
        }
    }
}

impl From<AutomatonError> for CompileError {
    fn from(error: AutomatonError) -> Self {
        match error {
            AutomatonError::UnknownStateReference(id) => CompileError::UnknownStateReference(id),
        }
    }
}

impl CompileError {
    pub fn is_malformed(&self) -> bool {
        matches!(self, CompileError::MalformedPattern(_))
    }

    pub fn report(&self, pattern: &str) -> String {
        match self {
            CompileError::MalformedPattern(error) => error.report(pattern),
            other => format!("{} {}", "[error]".red().bold(), other),
        }
    }
}

/// Compiles patterns into fresh automata. Holds configuration only; every
/// call builds and returns its own [`Automaton`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Compiler {
    options: CompileOptions,
}

impl Compiler {
    pub fn new(options: CompileOptions) -> Compiler {
        Compiler { options }
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    pub fn compile(&self, pattern: &str) -> Result<Automaton, CompileError> {
        let pattern = if self.options.flags.contains(CompileFlags::TRIM) {
            pattern.trim()
        } else {
            pattern
        };
        log::debug!(
            "compiling {:?} ({})",
            pattern,
            if self.options.is_legacy() {
                "legacy descent"
            } else {
                "ast"
            }
        );

        let automaton = if self.options.is_legacy() {
            LegacyDescent::compile(pattern, &self.options)?
        } else {
            let root = run_parse(pattern, &self.options)?;
            log::trace!("parsed {:?} as {:?}", pattern, root);
            AstBuilder::compile(&root, self.options.strict_plus())?
        };

        log::debug!(
            "compiled {:?} into {} states, {} transitions",
            pattern,
            automaton.state_count(),
            automaton.transition_count()
        );
        Ok(automaton)
    }
}

/// Compiles `pattern` with the default options.
pub fn compile(pattern: &str) -> Result<Automaton, CompileError> {
    Compiler::default().compile(pattern)
}

/// Single bottom-up pass over the parsed tree. `entry` is the state the next
/// visited node starts from; `exclusive` tells whether nothing else will be
/// attached to `entry` besides that node and whatever follows it.
struct AstBuilder {
    automaton: Automaton,
    strict_plus: bool,
    entry: StateId,
    exclusive: bool,
}

impl AstBuilder {
    fn compile(root: &Node, strict_plus: bool) -> Result<Automaton, AutomatonError> {
        let mut automaton = Automaton::new();
        let initial = automaton.create_state();
        let mut builder = AstBuilder {
            automaton,
            strict_plus,
            entry: initial,
            exclusive: true,
        };
        let exit = builder.build(root, initial, true)?;
        builder.automaton.mark_final(exit)?;
        Ok(builder.automaton)
    }

    fn build(
        &mut self,
        node: &Node,
        entry: StateId,
        exclusive: bool,
    ) -> Result<StateId, AutomatonError> {
        self.entry = entry;
        self.exclusive = exclusive;
        node.accept(self)
    }

    fn build_sequence(
        &mut self,
        items: &[Node],
        entry: StateId,
        exclusive: bool,
    ) -> Result<StateId, AutomatonError> {
        let (mut current, mut exclusive) = (entry, exclusive);
        for item in items {
            let next = self.build(item, current, exclusive)?;
            // an item that consumed nothing leaves the entry's sharing as is
            exclusive = exclusive || next != current;
            current = next;
        }
        Ok(current)
    }

    /// Builds one alternative so that it ends in `merge`. A trailing literal
    /// goes straight into the merge state.
    fn build_branch(
        &mut self,
        branch: &Node,
        entry: StateId,
        merge: StateId,
    ) -> Result<(), AutomatonError> {
        match branch {
            Node::Literal(c) => self.automaton.add_transition(entry, Symbol::Char(*c), merge),
            Node::Concat(items) => match items.split_last() {
                Some((Node::Literal(c), prefix)) => {
                    let exit = self.build_sequence(prefix, entry, false)?;
                    self.automaton.add_transition(exit, Symbol::Char(*c), merge)
                }
                _ => {
                    let exit = self.build_sequence(items, entry, false)?;
                    self.automaton.add_epsilon(exit, merge)
                }
            },
            other => {
                let exit = self.build(other, entry, false)?;
                self.automaton.add_epsilon(exit, merge)
            }
        }
    }

    /// Zero or more repetitions of `item` starting at `entry`; returns the loop state.
    fn star(
        &mut self,
        item: &Node,
        entry: StateId,
        exclusive: bool,
    ) -> Result<StateId, AutomatonError> {
        let hub = if exclusive && !self.automaton.has_outgoing(entry) {
            entry
        } else {
            let hub = self.automaton.create_state();
            self.automaton.add_epsilon(entry, hub)?;
            hub
        };
        match item {
            Node::Literal(c) => self.automaton.add_transition(hub, Symbol::Char(*c), hub)?,
            _ => {
                let exit = self.build(item, hub, false)?;
                if exit != hub {
                    self.automaton.add_epsilon(exit, hub)?;
                }
            }
        }
        Ok(hub)
    }
}

impl Visitor for AstBuilder {
    type Result = Result<StateId, AutomatonError>;

    fn visit_empty(&mut self) -> Self::Result {
        Ok(self.entry)
    }

    fn visit_literal(&mut self, literal: char) -> Self::Result {
        let entry = self.entry;
        let next = self.automaton.create_state();
        self.automaton
            .add_transition(entry, Symbol::Char(literal), next)?;
        Ok(next)
    }

    fn visit_concat(&mut self, items: &[Node]) -> Self::Result {
        self.build_sequence(items, self.entry, self.exclusive)
    }

    fn visit_alternation(&mut self, branches: &[Node]) -> Self::Result {
        let entry = self.entry;
        let merge = self.automaton.create_state();
        for branch in branches {
            self.build_branch(branch, entry, merge)?;
        }
        Ok(merge)
    }

    fn visit_closure(&mut self, item: &Node, quantifier: Quantifier) -> Self::Result {
        let (entry, exclusive) = (self.entry, self.exclusive);
        match quantifier {
            Quantifier::OneOrMore if self.strict_plus => {
                let once = self.build(item, entry, exclusive)?;
                self.star(item, once, exclusive || once != entry)
            }
            _ => self.star(item, entry, exclusive),
        }
    }

    fn visit_group(&mut self, item: &Node) -> Self::Result {
        self.build(item, self.entry, self.exclusive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::Matcher;

    fn targets(automaton: &Automaton, src: StateId, symbol: Symbol) -> Vec<StateId> {
        automaton.states()[src].targets(symbol).collect()
    }

    #[test]
    fn single_literal() {
        let nfa = compile("a").unwrap();
        assert_eq!(nfa.state_count(), 2);
        let initial = nfa.initial();
        assert_eq!(nfa.states()[initial].transitions().len(), 1);
        let next = targets(&nfa, initial, Symbol::Char('a'));
        assert_eq!(next.len(), 1);
        assert_ne!(next[0], initial);
        assert_eq!(nfa.final_states(), next);
    }

    #[test]
    fn literal_chain() {
        let nfa = compile("ab").unwrap();
        assert_eq!(nfa.state_count(), 3);
        let q1 = targets(&nfa, nfa.initial(), Symbol::Char('a'));
        assert_eq!(q1.len(), 1);
        let q2 = targets(&nfa, q1[0], Symbol::Char('b'));
        assert_eq!(q2.len(), 1);
        assert_eq!(nfa.final_states(), q2);
        assert_eq!(nfa.transition_count(), 2);
    }

    #[test]
    fn alternation_shares_one_final_state() {
        let nfa = compile("a|b").unwrap();
        let via_a = targets(&nfa, nfa.initial(), Symbol::Char('a'));
        let via_b = targets(&nfa, nfa.initial(), Symbol::Char('b'));
        assert_eq!(via_a.len(), 1);
        assert_eq!(via_a, via_b);
        assert_eq!(nfa.final_states(), via_a);
        assert_eq!(nfa.state_count(), 2);
    }

    #[test]
    fn star_on_literal_is_a_self_loop() {
        let nfa = compile("a*").unwrap();
        assert_eq!(nfa.state_count(), 1);
        let initial = nfa.initial();
        assert_eq!(nfa.final_states(), vec![initial]);
        assert_eq!(targets(&nfa, initial, Symbol::Char('a')), vec![initial]);
    }

    #[test]
    fn star_on_group_forms_an_epsilon_cycle() {
        let nfa = compile("(ab)*").unwrap();
        let entry = nfa.initial();
        let q1 = targets(&nfa, entry, Symbol::Char('a'))[0];
        let q2 = targets(&nfa, q1, Symbol::Char('b'))[0];
        assert_eq!(targets(&nfa, q2, Symbol::Epsilon), vec![entry]);
        assert!(nfa.is_match(""));
        assert!(nfa.is_match("ab"));
        assert!(nfa.is_match("ababab"));
        assert!(!nfa.is_match("aba"));
    }

    #[test]
    fn empty_pattern() {
        let nfa = compile("").unwrap();
        assert_eq!(nfa.state_count(), 1);
        assert_eq!(nfa.final_states(), vec![nfa.initial()]);
        assert_eq!(nfa.transition_count(), 0);
        assert!(nfa.is_match(""));
        assert!(!nfa.is_match("a"));
    }

    #[test]
    fn compiling_twice_gives_the_same_graph() {
        for pattern in ["a(b|c)*d", "((a|b)+c)*", "x|y|(z)"] {
            assert_eq!(compile(pattern), compile(pattern));
        }
    }

    #[test]
    fn malformed_patterns_are_rejected() {
        for pattern in ["(ab", "ab)", "*a", "(|+)", "a(b", ")("] {
            let error = compile(pattern).unwrap_err();
            assert!(error.is_malformed(), "{} gave {:?}", pattern, error);
        }
    }

    #[test]
    fn limits_are_reported() {
        let compiler = Compiler::new(CompileOptions::default().with_max_depth(1));
        assert_eq!(
            compiler.compile("((a))"),
            Err(CompileError::DepthLimitExceeded { limit: 1 })
        );
        let compiler = Compiler::new(CompileOptions::default().with_max_pattern_length(2));
        assert_eq!(
            compiler.compile("abc"),
            Err(CompileError::PatternTooLong {
                length: 3,
                limit: 2
            })
        );
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        assert_eq!(compile("  ab \n"), compile("ab"));
        let compiler = Compiler::new(CompileOptions::default().with_flags(CompileFlags::NO_FLAG));
        assert!(compiler.compile(" a").unwrap().is_match(" a"));
    }

    #[test]
    fn strict_plus_requires_one_repetition() {
        let nfa = compile("a+").unwrap();
        assert!(!nfa.is_match(""));
        assert!(nfa.is_match("a"));
        assert!(nfa.is_match("aaa"));

        let lax = Compiler::new(CompileOptions::default().with_flags(CompileFlags::NO_FLAG));
        let nfa = lax.compile("a+").unwrap();
        assert!(nfa.is_match(""));
        assert!(nfa.is_match("aa"));
    }

    #[test]
    fn alternation_composes_with_concatenation() {
        let nfa = compile("(a|b)c").unwrap();
        assert!(nfa.is_match("ac"));
        assert!(nfa.is_match("bc"));
        assert!(!nfa.is_match("a"));
        assert!(!nfa.is_match("c"));
    }

    #[test]
    fn loops_do_not_leak_into_neighbouring_branches() {
        let nfa = compile("b*|c").unwrap();
        assert!(nfa.is_match("bbb"));
        assert!(nfa.is_match("c"));
        assert!(!nfa.is_match("bc"));

        let nfa = compile("()b*|c").unwrap();
        assert!(!nfa.is_match("bc"));

        let nfa = compile("(a*b)*c").unwrap();
        assert!(nfa.is_match("c"));
        assert!(nfa.is_match("aabbc"));
        assert!(!nfa.is_match("ac"));
    }

    #[test]
    fn every_transition_targets_a_known_state() {
        let nfa = compile("(a(b|c)*)+|d(e+f)*").unwrap();
        for (src, _, dst) in nfa.transitions() {
            assert!(src < nfa.state_count());
            assert!(dst < nfa.state_count());
        }
        assert!(!nfa.final_states().is_empty());
    }

    #[test]
    fn legacy_flag_selects_descent_engine() {
        let compiler = Compiler::new(CompileOptions::legacy());
        let nfa = compiler.compile("a*").unwrap();
        assert_eq!(nfa.state_count(), 2);
        assert!(!nfa.is_match(""));
    }

    #[test]
    fn report_uses_parser_caret() {
        colored::control::set_override(false);
        let error = compile("ab)").unwrap_err();
        assert!(error.report("ab)").ends_with(" | ab)\n |   ^"));
    }
}
