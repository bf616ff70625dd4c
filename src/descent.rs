//! Textual recursive descent, kept for compatibility with automata drawn by
//! earlier versions of the tool.
//!
//! Known behaviour, preserved on purpose:
//! - the first `|` of a subexpression turns the *whole* subexpression into
//!   one union, split on every `|` regardless of nesting; parentheses and
//!   operators inside a branch become literal symbols and nothing after the
//!   union is processed again;
//! - a closure on a group recompiles the group's text from the current state
//!   instead of reusing the states built for it;
//! - `*` and `+` behave the same.

use crate::{
    automaton::{Automaton, StateId, Symbol},
    compiler::CompileError,
    parser::ParserError,
    utils::CompileOptions,
};

pub(crate) struct LegacyDescent {
    automaton: Automaton,
}

impl LegacyDescent {
    pub(crate) fn compile(pattern: &str, options: &CompileOptions) -> Result<Automaton, CompileError> {
        let chars: Vec<char> = pattern.chars().collect();
        if chars.len() > options.max_pattern_length {
            return Err(CompileError::PatternTooLong {
                length: chars.len(),
                limit: options.max_pattern_length,
            });
        }
        validate(&chars, options.max_depth)?;

        let mut descent = LegacyDescent {
            automaton: Automaton::new(),
        };
        let initial = descent.automaton.create_state();
        let exit = descent.subexpression(initial, &chars)?;
        descent.automaton.mark_final(exit)?;
        Ok(descent.automaton)
    }

    fn subexpression(&mut self, entry: StateId, chars: &[char]) -> Result<StateId, CompileError> {
        let mut current = entry;
        let mut i = 0;
        while i < chars.len() {
            match chars[i] {
                '|' => {
                    current = self.union(entry, chars)?;
                    break;
                }
                '(' => {
                    let close = matching_close(chars, i)?;
                    current = self.subexpression(current, &chars[i + 1..close])?;
                    i = close + 1;
                }
                '*' | '+' => {
                    current = self.closure(current, chars, i)?;
                    i += 1;
                }
                c => {
                    let next = self.automaton.create_state();
                    self.automaton.add_transition(current, Symbol::Char(c), next)?;
                    current = next;
                    i += 1;
                }
            }
        }
        Ok(current)
    }

    fn closure(
        &mut self,
        current: StateId,
        chars: &[char],
        operator: usize,
    ) -> Result<StateId, CompileError> {
        let dangling = || ParserError::DanglingQuantifier {
            quantifier: chars[operator],
            position: operator,
        };
        let previous = operator.checked_sub(1).ok_or_else(dangling)?;
        match chars[previous] {
            ')' => {
                let open = matching_open(chars, previous)?;
                let exit = self.subexpression(current, &chars[open + 1..previous])?;
                self.automaton.add_epsilon(exit, current)?;
                Ok(exit)
            }
            '(' | '|' | '*' | '+' => Err(dangling().into()),
            symbol => {
                self.automaton
                    .add_transition(current, Symbol::Char(symbol), current)?;
                Ok(current)
            }
        }
    }

    fn union(&mut self, entry: StateId, chars: &[char]) -> Result<StateId, CompileError> {
        let merge = self.automaton.create_state();
        for branch in chars.split(|c| *c == '|') {
            let mut current = entry;
            for (index, symbol) in branch.iter().enumerate() {
                let next = if index + 1 == branch.len() {
                    merge
                } else {
                    self.automaton.create_state()
                };
                self.automaton
                    .add_transition(current, Symbol::Char(*symbol), next)?;
                current = next;
            }
        }
        Ok(merge)
    }
}

/// Rejects what the descent cannot handle: unbalanced parentheses, closures
/// without an atom before them and nesting beyond `max_depth`.
fn validate(chars: &[char], max_depth: usize) -> Result<(), ParserError> {
    let mut open: Vec<usize> = Vec::new();
    for (position, c) in chars.iter().enumerate() {
        match c {
            '(' => {
                open.push(position);
                if open.len() > max_depth {
                    return Err(ParserError::DepthLimitExceeded {
                        limit: max_depth,
                        position,
                    });
                }
            }
            ')' => {
                if open.pop().is_none() {
                    return Err(ParserError::UnexpectedClosingParenthesis { position });
                }
            }
            '*' | '+' => {
                let has_atom = position
                    .checked_sub(1)
                    .map_or(false, |previous| !matches!(chars[previous], '(' | '|' | '*' | '+'));
                if !has_atom {
                    return Err(ParserError::DanglingQuantifier {
                        quantifier: *c,
                        position,
                    });
                }
            }
            _ => {}
        }
    }
    match open.last() {
        Some(&position) => Err(ParserError::UnbalancedParenthesis { position }),
        None => Ok(()),
    }
}

fn matching_close(chars: &[char], open: usize) -> Result<usize, ParserError> {
    let mut level = 0;
    for (index, c) in chars.iter().enumerate().skip(open) {
        match c {
            '(' => level += 1,
            ')' => {
                level -= 1;
                if level == 0 {
                    return Ok(index);
                }
            }
            _ => {}
        }
    }
    Err(ParserError::UnbalancedParenthesis { position: open })
}

fn matching_open(chars: &[char], close: usize) -> Result<usize, ParserError> {
    let mut level = 0;
    for index in (0..=close).rev() {
        match chars[index] {
            ')' => level += 1,
            '(' => {
                level -= 1;
                if level == 0 {
                    return Ok(index);
                }
            }
            _ => {}
        }
    }
    Err(ParserError::UnexpectedClosingParenthesis { position: close })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::Matcher;

    fn legacy(pattern: &str) -> Result<Automaton, CompileError> {
        LegacyDescent::compile(pattern, &CompileOptions::legacy())
    }

    fn edges(automaton: &Automaton) -> Vec<(StateId, String, StateId)> {
        automaton
            .transitions()
            .map(|(src, symbol, dst)| (src, symbol.label(), dst))
            .collect()
    }

    #[test]
    fn literal_chain() {
        let nfa = legacy("ab").unwrap();
        assert_eq!(
            edges(&nfa),
            vec![(0, "a".to_string(), 1), (1, "b".to_string(), 2)]
        );
        assert_eq!(nfa.final_states(), vec![2]);
    }

    #[test]
    fn empty_pattern() {
        let nfa = legacy("").unwrap();
        assert_eq!(nfa.state_count(), 1);
        assert_eq!(nfa.final_states(), vec![0]);
    }

    #[test]
    fn union_reconverges_on_merge_state() {
        let nfa = legacy("a|b").unwrap();
        // the 'a' scanned before the '|' stays behind as a dead branch
        assert_eq!(
            edges(&nfa),
            vec![
                (0, "a".to_string(), 1),
                (0, "a".to_string(), 2),
                (0, "b".to_string(), 2)
            ]
        );
        assert_eq!(nfa.final_states(), vec![2]);
    }

    #[test]
    fn union_branch_states() {
        let nfa = legacy("xy|z").unwrap();
        // x, y scanned first (q1, q2), merge q3, branch state q4
        assert_eq!(nfa.state_count(), 5);
        assert!(nfa.is_match("xy"));
        assert!(nfa.is_match("z"));
        assert!(!nfa.is_match("x"));
        assert_eq!(nfa.final_states(), vec![3]);
    }

    #[test]
    fn union_ignores_nesting_inside_branches() {
        let nfa = legacy("a|(b)").unwrap();
        assert!(nfa.is_match("(b)"));
        assert!(!nfa.is_match("b"));
    }

    #[test]
    fn union_stops_processing() {
        let nfa = legacy("(a|b)c").unwrap();
        assert!(nfa.is_match("ac"));
        assert!(nfa.is_match("bc"));

        let nfa = legacy("a|b*").unwrap();
        assert!(nfa.is_match("b*"));
    }

    #[test]
    fn literal_closure_loops_on_current_state() {
        let nfa = legacy("a*").unwrap();
        assert_eq!(
            edges(&nfa),
            vec![(0, "a".to_string(), 1), (1, "a".to_string(), 1)]
        );
        assert!(!nfa.is_match(""));
        assert!(nfa.is_match("aaa"));
    }

    #[test]
    fn group_closure_rebuilds_the_group() {
        let nfa = legacy("(ab)*").unwrap();
        assert_eq!(nfa.state_count(), 5);
        assert_eq!(
            edges(&nfa),
            vec![
                (0, "a".to_string(), 1),
                (1, "b".to_string(), 2),
                (2, "a".to_string(), 3),
                (3, "b".to_string(), 4),
                (4, "".to_string(), 2),
            ]
        );
        assert_eq!(nfa.final_states(), vec![4]);
        assert!(nfa.is_match("abab"));
        assert!(nfa.is_match("ababab"));
    }

    #[test]
    fn plus_is_the_same_as_star() {
        assert_eq!(legacy("(ab)+"), legacy("(ab)*"));
        assert_eq!(legacy("a+"), legacy("a*"));
    }

    #[test]
    fn malformed_patterns() {
        let malformed = |pattern: &str| legacy(pattern).map_err(|e| e.is_malformed());
        assert_eq!(malformed("(ab").unwrap_err(), true);
        assert_eq!(malformed("ab)").unwrap_err(), true);
        assert_eq!(malformed("*").unwrap_err(), true);
        assert_eq!(malformed("(+a)").unwrap_err(), true);
        assert_eq!(malformed("a|*").unwrap_err(), true);
        assert_eq!(malformed("a**").unwrap_err(), true);
    }

    #[test]
    fn depth_limit() {
        let options = CompileOptions::legacy().with_max_depth(2);
        assert_eq!(
            LegacyDescent::compile("(((a)))", &options),
            Err(CompileError::DepthLimitExceeded { limit: 2 })
        );
        assert!(LegacyDescent::compile("((a))", &options).is_ok());
    }

    #[test]
    fn matching_parentheses() {
        let chars: Vec<char> = "(a(b))c".chars().collect();
        assert_eq!(matching_close(&chars, 0), Ok(5));
        assert_eq!(matching_close(&chars, 2), Ok(4));
        assert_eq!(matching_open(&chars, 5), Ok(0));
        assert_eq!(matching_open(&chars, 4), Ok(2));
    }
}
