use itertools::Itertools;
use regex::Regex;

/// Stored patterns checked with the `regex` crate. Matching is anchored at
/// the start of the input only, so `ab` accepts `abc`.
#[derive(Debug, Default)]
pub struct PatternSet {
    patterns: Vec<Regex>,
}

impl PatternSet {
    pub fn new() -> PatternSet {
        PatternSet::default()
    }

    /// Stores `pattern` if the `regex` crate accepts it.
    pub fn set_pattern(&mut self, pattern: &str) -> bool {
        match Regex::new(pattern) {
            Ok(regex) => {
                self.patterns.push(regex);
                true
            }
            Err(err) => {
                log::debug!("rejected pattern {:?}: {}", pattern, err);
                false
            }
        }
    }

    pub fn patterns(&self) -> Vec<&str> {
        self.patterns.iter().map(Regex::as_str).collect()
    }

    pub fn clear(&mut self) {
        self.patterns.clear();
    }

    /// Trims inputs, drops blank ones, then checks every input against every
    /// stored pattern in order. Without patterns each input is reported once
    /// as not matching.
    pub fn validate_strings<S: AsRef<str>>(&self, strings: &[S]) -> Vec<(String, bool)> {
        let cleaned: Vec<&str> = strings
            .iter()
            .map(|s| s.as_ref().trim())
            .filter(|s| !s.is_empty())
            .collect();
        if self.patterns.is_empty() {
            return cleaned.into_iter().map(|s| (s.to_string(), false)).collect();
        }
        self.patterns
            .iter()
            .cartesian_product(cleaned.iter())
            .map(|(regex, s)| (s.to_string(), matches_at_start(regex, s)))
            .collect()
    }

    /// Plain-language reading of every stored pattern, one token per
    /// character.
    pub fn explain(&self) -> String {
        if self.patterns.is_empty() {
            return "No regular expression patterns are set.".to_string();
        }
        self.patterns
            .iter()
            .map(|regex| {
                let tokens = regex.as_str().chars().map(explain_char).join(" ");
                format!("Pattern: {} {}", regex.as_str(), tokens)
            })
            .join("\n")
    }
}

fn matches_at_start(regex: &Regex, text: &str) -> bool {
    // leftmost-first: a match starting at 0 is reported if one exists
    regex.find(text).map_or(false, |m| m.start() == 0)
}

fn explain_char(c: char) -> String {
    match c {
        '.' => "any character except a newline".to_string(),
        '*' => "zero or more repetitions of the previous item".to_string(),
        '+' => "one or more repetitions of the previous item".to_string(),
        '?' => "zero or one repetition of the previous item".to_string(),
        '^' => "start of the string".to_string(),
        '$' => "end of the string".to_string(),
        '|' => "or".to_string(),
        '(' => "start of group".to_string(),
        ')' => "end of group".to_string(),
        other => format!("'{}'", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_patterns() {
        let mut set = PatternSet::new();
        assert!(!set.set_pattern("(ab"));
        assert!(set.patterns().is_empty());
        assert!(set.set_pattern("a(b|c)*"));
        assert_eq!(set.patterns(), vec!["a(b|c)*"]);
    }

    #[test]
    fn validates_trimmed_nonblank_strings() {
        let mut set = PatternSet::new();
        set.set_pattern("ab+");
        let results = set.validate_strings(&["  abb ", "", "   ", "xab", "abc"]);
        assert_eq!(
            results,
            vec![
                ("abb".to_string(), true),
                ("xab".to_string(), false),
                ("abc".to_string(), true),
            ]
        );
    }

    #[test]
    fn without_patterns_nothing_matches() {
        let set = PatternSet::new();
        assert_eq!(
            set.validate_strings(&["a", " "]),
            vec![("a".to_string(), false)]
        );
    }

    #[test]
    fn every_pattern_is_checked() {
        let mut set = PatternSet::new();
        set.set_pattern("a");
        set.set_pattern("b");
        assert_eq!(
            set.validate_strings(&["a", "b"]),
            vec![
                ("a".to_string(), true),
                ("b".to_string(), false),
                ("a".to_string(), false),
                ("b".to_string(), true),
            ]
        );
        set.clear();
        assert!(set.patterns().is_empty());
    }

    #[test]
    fn explains_metacharacters() {
        let mut set = PatternSet::new();
        assert_eq!(set.explain(), "No regular expression patterns are set.");
        set.set_pattern("a*");
        assert_eq!(
            set.explain(),
            "Pattern: a* 'a' zero or more repetitions of the previous item"
        );
    }
}
