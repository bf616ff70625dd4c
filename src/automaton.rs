use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::Display,
};

use itertools::Itertools;
use thiserror::Error;

pub type StateId = usize;

#[derive(Hash, Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub enum Symbol {
    Epsilon,
    Char(char),
}

impl Symbol {
    pub fn is_epsilon(&self) -> bool {
        matches!(self, Symbol::Epsilon)
    }

    /// Edge label as handed to the graph renderer: empty for epsilon.
    pub fn label(&self) -> String {
        match self {
            Symbol::Epsilon => String::new(),
            Symbol::Char(c) => c.to_string(),
        }
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Symbol::Epsilon => write!(f, "ε"),
            Symbol::Char(c) => write!(f, "{}", c),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AutomatonError {
    #[error("transition references unknown state q{0}")]
    UnknownStateReference(StateId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    id: StateId,
    transitions: BTreeMap<Symbol, BTreeSet<StateId>>,
    is_final: bool,
}

impl State {
    fn new(id: StateId) -> State {
        State {
            id,
            transitions: BTreeMap::new(),
            is_final: false,
        }
    }

    pub fn id(&self) -> StateId {
        self.id
    }

    /// Display name, `q{id}`.
    pub fn name(&self) -> String {
        format!("q{}", self.id)
    }

    pub fn is_final(&self) -> bool {
        self.is_final
    }

    pub fn transitions(&self) -> &BTreeMap<Symbol, BTreeSet<StateId>> {
        &self.transitions
    }

    pub fn targets(&self, symbol: Symbol) -> impl Iterator<Item = StateId> + '_ {
        self.transitions
            .get(&symbol)
            .into_iter()
            .flat_map(|targets| targets.iter().copied())
    }

    pub fn has_outgoing(&self) -> bool {
        !self.transitions.is_empty()
    }
}

/// An ε-NFA. States live in an arena and are addressed by their index, so
/// the id counter and the arena length always agree.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Automaton {
    states: Vec<State>,
    initial: StateId,
    state_counter: usize,
}

impl Automaton {
    pub fn new() -> Automaton {
        Automaton::default()
    }

    pub fn create_state(&mut self) -> StateId {
        let id = self.state_counter;
        self.state_counter += 1;
        self.states.push(State::new(id));
        log::trace!("created state q{}", id);
        id
    }

    fn check(&self, id: StateId) -> Result<(), AutomatonError> {
        if id < self.states.len() {
            Ok(())
        } else {
            Err(AutomatonError::UnknownStateReference(id))
        }
    }

    pub fn add_transition(
        &mut self,
        src: StateId,
        symbol: Symbol,
        dst: StateId,
    ) -> Result<(), AutomatonError> {
        self.check(dst)?;
        let state = self
            .states
            .get_mut(src)
            .ok_or(AutomatonError::UnknownStateReference(src))?;
        state.transitions.entry(symbol).or_default().insert(dst);
        Ok(())
    }

    pub fn add_epsilon(&mut self, src: StateId, dst: StateId) -> Result<(), AutomatonError> {
        self.add_transition(src, Symbol::Epsilon, dst)
    }

    pub fn mark_final(&mut self, id: StateId) -> Result<(), AutomatonError> {
        let state = self
            .states
            .get_mut(id)
            .ok_or(AutomatonError::UnknownStateReference(id))?;
        state.is_final = true;
        Ok(())
    }

    pub fn initial(&self) -> StateId {
        self.initial
    }

    pub fn state(&self, id: StateId) -> Option<&State> {
        self.states.get(id)
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn final_states(&self) -> Vec<StateId> {
        self.states
            .iter()
            .filter(|state| state.is_final)
            .map(State::id)
            .collect()
    }

    /// Every transition as `(source, symbol, destination)`, ordered by source
    /// then symbol then destination.
    pub fn transitions(&self) -> impl Iterator<Item = (StateId, Symbol, StateId)> + '_ {
        self.states.iter().flat_map(|state| {
            state.transitions.iter().flat_map(move |(symbol, targets)| {
                targets.iter().map(move |target| (state.id, *symbol, *target))
            })
        })
    }

    pub fn transition_count(&self) -> usize {
        self.transitions().count()
    }

    /// Literal symbols used by any transition.
    pub fn alphabet(&self) -> BTreeSet<char> {
        self.transitions()
            .filter_map(|(_, symbol, _)| match symbol {
                Symbol::Char(c) => Some(c),
                Symbol::Epsilon => None,
            })
            .collect()
    }

    pub fn has_outgoing(&self, id: StateId) -> bool {
        self.state(id).map_or(false, State::has_outgoing)
    }
}

impl Display for Automaton {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let finals = self.final_states().iter().map(|id| format!("q{}", id)).join(", ");
        writeln!(f, "initial: q{}  final: {{{}}}", self.initial, finals)?;
        for (src, symbol, dst) in self.transitions() {
            writeln!(f, "  q{} --{}--> q{}", src, symbol, dst)?;
        }
        Ok(())
    }
}
