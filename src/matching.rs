use std::collections::BTreeSet;

use crate::automaton::{Automaton, StateId, Symbol};

/// Whole-input acceptance over an ε-NFA.
pub trait Matcher {
    fn epsilon_closure(&self, states: &BTreeSet<StateId>) -> BTreeSet<StateId>;
    fn step(&self, states: &BTreeSet<StateId>, c: char) -> BTreeSet<StateId>;
    fn is_match(&self, text: &str) -> bool;
}

impl Matcher for Automaton {
    fn epsilon_closure(&self, states: &BTreeSet<StateId>) -> BTreeSet<StateId> {
        let mut closure = states.clone();
        let mut stack: Vec<StateId> = states.iter().copied().collect();
        while let Some(state) = stack.pop() {
            if let Some(state) = self.state(state) {
                for next in state.targets(Symbol::Epsilon) {
                    if closure.insert(next) {
                        stack.push(next);
                    }
                }
            }
        }
        closure
    }

    fn step(&self, states: &BTreeSet<StateId>, c: char) -> BTreeSet<StateId> {
        let moved: BTreeSet<StateId> = states
            .iter()
            .filter_map(|id| self.state(*id))
            .flat_map(|state| state.targets(Symbol::Char(c)))
            .collect();
        self.epsilon_closure(&moved)
    }

    fn is_match(&self, text: &str) -> bool {
        let mut current = self.epsilon_closure(&BTreeSet::from([self.initial()]));
        for c in text.chars() {
            if current.is_empty() {
                return false;
            }
            current = self.step(&current, c);
        }
        current
            .iter()
            .any(|id| self.state(*id).map_or(false, |state| state.is_final()))
    }
}
