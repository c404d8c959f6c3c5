use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

const DEFAULT_AXIOM: &str = "F";
const DEFAULT_ANGLE: i64 = 90;
const DEFAULT_ITERATIONS: u32 = 2;

/// A parsed L-system grammar: axiom, turn angle, iteration count, and the
/// production rules keyed by a single uppercase symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grammar {
    pub axiom: String,
    pub angle: i64,
    pub iterations: u32,
    pub rules: HashMap<char, String>,
}

impl Default for Grammar {
    fn default() -> Self {
        Grammar {
            axiom: DEFAULT_AXIOM.to_string(),
            angle: DEFAULT_ANGLE,
            iterations: DEFAULT_ITERATIONS,
            rules: HashMap::new(),
        }
    }
}

impl Grammar {
    /// Loads and parses a grammar file from disk. Read failure is the only
    /// fatal error here; malformed individual lines are logged and skipped.
    pub fn load(path: &Path) -> Result<Grammar> {
        let text = fs::read_to_string(path).map_err(|source| Error::Grammar {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::parse(&text))
    }

    fn parse(text: &str) -> Grammar {
        let mut grammar = Grammar::default();
        let mut saw_axiom = false;
        let mut saw_angle = false;
        let mut saw_iterations = false;

        for (line_no, raw_line) in text.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(rest) = line.strip_prefix("axiom:") {
                grammar.axiom = rest.trim().to_string();
                saw_axiom = true;
            } else if let Some(rest) = line.strip_prefix("angle:") {
                match rest.trim().parse::<i64>() {
                    Ok(v) => {
                        grammar.angle = v;
                        saw_angle = true;
                    }
                    Err(_) => log::warn!("line {}: malformed angle directive: {:?}", line_no + 1, raw_line),
                }
            } else if let Some(rest) = line.strip_prefix("iterations:") {
                match rest.trim().parse::<u32>() {
                    Ok(v) => {
                        grammar.iterations = v;
                        saw_iterations = true;
                    }
                    Err(_) => log::warn!(
                        "line {}: malformed iterations directive: {:?}",
                        line_no + 1,
                        raw_line
                    ),
                }
            } else if let Some(rest) = line.strip_prefix("rule:") {
                match parse_rule(rest) {
                    Some((symbol, rhs)) => {
                        grammar.rules.insert(symbol, rhs);
                    }
                    None => log::warn!("line {}: malformed rule directive: {:?}", line_no + 1, raw_line),
                }
            } else {
                log::warn!("line {}: unrecognized directive: {:?}", line_no + 1, raw_line);
            }
        }

        if !saw_axiom {
            log::debug!("grammar file omitted axiom, defaulting to {:?}", grammar.axiom);
        }
        if !saw_angle {
            log::debug!("grammar file omitted angle, defaulting to {}", grammar.angle);
        }
        if !saw_iterations {
            log::debug!("grammar file omitted iterations, defaulting to {}", grammar.iterations);
        }

        grammar
    }
}

/// Parses the RHS of a `rule:` directive of the form `X -> <replacement>`.
/// Returns `None` if the symbol isn't a single uppercase letter or the `->`
/// separator is missing.
fn parse_rule(rest: &str) -> Option<(char, String)> {
    let (lhs, rhs) = rest.split_once("->")?;
    let lhs = lhs.trim();
    let mut chars = lhs.chars();
    let symbol = chars.next()?;
    if chars.next().is_some() || !symbol.is_ascii_uppercase() {
        return None;
    }
    Some((symbol, rhs.trim().to_string()))
}

#[cfg(test)]
mod grammar_test {
    use super::*;

    #[test]
    fn defaults_when_file_is_empty() {
        let g = Grammar::parse("");
        assert_eq!(g, Grammar::default());
    }

    #[test]
    fn parses_koch_like_grammar() {
        let text = "axiom: F\nangle: 90\niterations: 2\nrule: F -> F+F-F-F+F\n";
        let g = Grammar::parse(text);
        assert_eq!(g.axiom, "F");
        assert_eq!(g.angle, 90);
        assert_eq!(g.iterations, 2);
        assert_eq!(g.rules.get(&'F'), Some(&"F+F-F-F+F".to_string()));
    }

    #[test]
    fn ignores_comments_and_blank_lines() {
        let text = "# a comment\n\naxiom: FF\n\n# trailing\n";
        let g = Grammar::parse(text);
        assert_eq!(g.axiom, "FF");
    }

    #[test]
    fn skips_malformed_rule_line() {
        let text = "rule: Ff -> G\nrule: F -> FF\n";
        let g = Grammar::parse(text);
        assert_eq!(g.rules.len(), 1);
        assert_eq!(g.rules.get(&'F'), Some(&"FF".to_string()));
    }

    #[test]
    fn skips_rule_missing_arrow() {
        let text = "rule: F FF\n";
        let g = Grammar::parse(text);
        assert!(g.rules.is_empty());
    }

    #[test]
    fn tolerates_surrounding_whitespace() {
        let text = "  axiom:   F  \n  angle:  45 \n";
        let g = Grammar::parse(text);
        assert_eq!(g.axiom, "F");
        assert_eq!(g.angle, 45);
    }
}
