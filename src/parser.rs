use colored::Colorize;
use itertools::Itertools;
use std::fmt::Display;
use thiserror::Error;

use crate::utils::CompileOptions;

use self::{parser::Parser, visitor::Visitor};

mod parser {
    // we take a parsing state and return either a valid node or an error

    use std::str::Chars;

    use itertools::{peek_nth, PeekNth};

    use super::ParserError;

    #[derive(Debug)]
    pub struct Parser<'a> {
        regex_iter: PeekNth<Chars<'a>>,
        consumed: usize,
        depth: usize,
        max_depth: usize,
    }

    impl<'a> Parser<'a> {
        pub fn new(input: &'a str, max_depth: usize) -> Parser<'a> {
            Parser {
                regex_iter: peek_nth(input.chars()),
                consumed: 0,
                depth: 0,
                max_depth,
            }
        }

        pub fn peek(&mut self) -> Option<char> {
            self.regex_iter.peek().copied()
        }

        pub fn position(&self) -> usize {
            self.consumed
        }

        pub fn consume(&mut self, expected: char) -> bool {
            if self.matches(expected) {
                self.advance();
                true
            } else {
                false
            }
        }

        pub fn consume_unseen(&mut self) -> Option<char> {
            let c = self.regex_iter.next()?;
            self.consumed += 1;
            Some(c)
        }

        pub fn advance(&mut self) {
            self.consume_unseen();
        }

        pub fn matches(&mut self, expected: char) -> bool {
            self.peek() == Some(expected)
        }

        pub fn within_bounds(&mut self) -> bool {
            self.regex_iter.peek().is_some()
        }

        pub fn can_parse_group(&mut self) -> bool {
            self.matches('(')
        }

        pub fn can_parse_quantifier(&mut self) -> bool {
            matches!(self.peek(), Some('*' | '+'))
        }

        pub fn can_parse_sequence_item(&mut self) -> bool {
            !matches!(self.peek(), None | Some('|' | ')'))
        }

        pub fn enter_group(&mut self) -> Result<(), ParserError> {
            self.depth += 1;
            if self.depth > self.max_depth {
                Err(ParserError::DepthLimitExceeded {
                    limit: self.max_depth,
                    position: self.consumed,
                })
            } else {
                Ok(())
            }
        }

        pub fn exit_group(&mut self) {
            self.depth -= 1;
        }
    }
}

#[derive(Debug, Hash, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    ZeroOrMore,
    OneOrMore,
}

impl Quantifier {
    fn from_char(c: char) -> Option<Quantifier> {
        match c {
            '*' => Some(Quantifier::ZeroOrMore),
            '+' => Some(Quantifier::OneOrMore),
            _ => None,
        }
    }
}

impl Display for Quantifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroOrMore => write!(f, "*"),
            Self::OneOrMore => write!(f, "+"),
        }
    }
}

#[derive(Debug, Hash, Clone, PartialEq, Eq)]
pub enum Node {
    Empty,
    Literal(char),
    Concat(Vec<Node>),
    Alternation(Vec<Node>),
    Closure(Box<Node>, Quantifier),
    Group(Box<Node>),
}

pub(crate) trait Data {
    fn accept<V: Visitor>(&self, visitor: &mut V) -> V::Result;
}

impl Data for Node {
    fn accept<V: Visitor>(&self, visitor: &mut V) -> V::Result {
        match self {
            Self::Empty => visitor.visit_empty(),
            Self::Literal(c) => visitor.visit_literal(*c),
            Self::Concat(items) => visitor.visit_concat(items),
            Self::Alternation(branches) => visitor.visit_alternation(branches),
            Self::Closure(item, quantifier) => visitor.visit_closure(item, *quantifier),
            Self::Group(item) => visitor.visit_group(item),
        }
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, ""),
            Self::Literal(c) => write!(f, "{}", c),
            Self::Concat(items) => write!(f, "{}", items.iter().join("")),
            Self::Alternation(branches) => write!(f, "{}", branches.iter().join("|")),
            Self::Closure(item, quantifier) => write!(f, "{}{}", item, quantifier),
            Self::Group(item) => write!(f, "({})", item),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ParserError {
    #[error("unbalanced parenthesis: '(' at position {position} is never closed")]
    UnbalancedParenthesis { position: usize },
    #[error("unexpected ')' at position {position}")]
    UnexpectedClosingParenthesis { position: usize },
    #[error("'{quantifier}' at position {position} has no preceding atom")]
    DanglingQuantifier { quantifier: char, position: usize },
    #[error("groups nested deeper than {limit} at position {position}")]
    DepthLimitExceeded { limit: usize, position: usize },
    #[error("pattern is {length} characters long, the limit is {limit}")]
    PatternTooLong { length: usize, limit: usize },
}

impl ParserError {
    pub fn position(&self) -> Option<usize> {
        match *self {
            Self::UnbalancedParenthesis { position }
            | Self::UnexpectedClosingParenthesis { position }
            | Self::DanglingQuantifier { position, .. }
            | Self::DepthLimitExceeded { position, .. } => Some(position),
            Self::PatternTooLong { .. } => None,
        }
    }

    fn code(&self) -> u8 {
        match self {
            Self::UnbalancedParenthesis { .. } => 1,
            Self::UnexpectedClosingParenthesis { .. } => 2,
            Self::DanglingQuantifier { .. } => 3,
            Self::DepthLimitExceeded { .. } => 4,
            Self::PatternTooLong { .. } => 5,
        }
    }

    /// Terminal diagnostic with a caret under the offending character.
    pub fn report(&self, pattern: &str) -> String {
        let header = format!(
            "{} {}",
            format!("[{:0>3}]", self.code()).red().bold(),
            self
        );
        match self.position() {
            Some(position) => format!(
                "{}:\n | {}\n | {}{}",
                header,
                pattern,
                " ".repeat(position),
                "^".green()
            ),
            None => header,
        }
    }
}

pub fn run_parse(input: &str, options: &CompileOptions) -> Result<Node, ParserError> {
    let length = input.chars().count();
    if length > options.max_pattern_length {
        return Err(ParserError::PatternTooLong {
            length,
            limit: options.max_pattern_length,
        });
    }
    let mut parser = Parser::new(input, options.max_depth);
    let expr = parse_expression(&mut parser)?;
    if parser.within_bounds() {
        // parse_expression only stops early on an unmatched ')'
        Err(ParserError::UnexpectedClosingParenthesis {
            position: parser.position(),
        })
    } else {
        Ok(expr)
    }
}

fn parse_expression(parser: &mut Parser) -> Result<Node, ParserError> {
    let mut branches = vec![parse_sequence(parser)?];
    while parser.consume('|') {
        branches.push(parse_sequence(parser)?);
    }
    if branches.len() == 1 {
        Ok(branches.remove(0))
    } else {
        Ok(Node::Alternation(branches))
    }
}

fn parse_sequence(parser: &mut Parser) -> Result<Node, ParserError> {
    let mut items: Vec<Node> = Vec::new();
    while parser.can_parse_sequence_item() {
        items.push(parse_repetition(parser)?);
    }
    Ok(match items.len() {
        0 => Node::Empty,
        1 => items.remove(0),
        _ => Node::Concat(items),
    })
}

fn parse_repetition(parser: &mut Parser) -> Result<Node, ParserError> {
    if parser.can_parse_quantifier() {
        let position = parser.position();
        let quantifier = parser.peek().unwrap_or('*');
        return Err(ParserError::DanglingQuantifier {
            quantifier,
            position,
        });
    }
    let mut item = parse_atom(parser)?;
    while let Some(quantifier) = parser.peek().and_then(Quantifier::from_char) {
        parser.advance();
        item = apply_quantifier(item, quantifier);
    }
    Ok(item)
}

// x** == x*, x+* == x*, x*+ == x*, x++ == x+
fn apply_quantifier(item: Node, quantifier: Quantifier) -> Node {
    match item {
        Node::Closure(inner, previous) => {
            let merged = if previous == Quantifier::OneOrMore && quantifier == Quantifier::OneOrMore
            {
                Quantifier::OneOrMore
            } else {
                Quantifier::ZeroOrMore
            };
            Node::Closure(inner, merged)
        }
        other => Node::Closure(Box::new(other), quantifier),
    }
}

fn parse_atom(parser: &mut Parser) -> Result<Node, ParserError> {
    if parser.can_parse_group() {
        parse_group(parser)
    } else {
        // callers only reach here with a character available
        let position = parser.position();
        parser
            .consume_unseen()
            .map(Node::Literal)
            .ok_or(ParserError::UnbalancedParenthesis { position })
    }
}

fn parse_group(parser: &mut Parser) -> Result<Node, ParserError> {
    let open = parser.position();
    parser.enter_group()?;
    parser.advance();
    let expression = parse_expression(parser)?;
    if !parser.consume(')') {
        return Err(ParserError::UnbalancedParenthesis { position: open });
    }
    parser.exit_group();
    Ok(Node::Group(Box::new(expression)))
}

pub mod visitor {
    use super::{Node, Quantifier};

    pub trait Visitor {
        type Result;
        fn visit_empty(&mut self) -> Self::Result;
        fn visit_literal(&mut self, literal: char) -> Self::Result;
        fn visit_concat(&mut self, items: &[Node]) -> Self::Result;
        fn visit_alternation(&mut self, branches: &[Node]) -> Self::Result;
        fn visit_closure(&mut self, item: &Node, quantifier: Quantifier) -> Self::Result;
        fn visit_group(&mut self, item: &Node) -> Self::Result;
    }
}
