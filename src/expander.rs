use crate::grammar::Grammar;

/// Hard ceiling on the expanded string's length. Expansion halts mid-iteration
/// rather than ever writing a partial rule replacement past this bound.
pub const L_SYSTEM_MAX_LEN: usize = 100_000;

/// Expands `grammar`'s axiom for `grammar.iterations` passes, applying every
/// rule exactly once per symbol per pass (single-pass-per-iteration: a rule's
/// own output is never re-expanded until the following iteration).
///
/// Expansion stops as soon as appending the next replacement would exceed
/// `L_SYSTEM_MAX_LEN - 1` bytes; the string produced so far is returned
/// unmodified, with no partial RHS appended.
pub fn expand(grammar: &Grammar) -> String {
    let mut current = grammar.axiom.clone();
    let bound = L_SYSTEM_MAX_LEN - 1;

    for _ in 0..grammar.iterations {
        let mut next = String::with_capacity(current.len());
        let mut truncated = false;

        for symbol in current.chars() {
            if let Some(rhs) = grammar.rules.get(&symbol) {
                if next.len() + rhs.len() > bound {
                    truncated = true;
                    break;
                }
                next.push_str(rhs);
            } else {
                if next.len() + symbol.len_utf8() > bound {
                    truncated = true;
                    break;
                }
                next.push(symbol);
            }
        }

        current = next;
        if truncated {
            log::debug!("expansion truncated at {} bytes (L_SYSTEM_MAX_LEN)", current.len());
            break;
        }
    }

    current
}

#[cfg(test)]
mod expander_test {
    use super::*;
    use crate::grammar::Grammar;
    use std::collections::HashMap;

    fn grammar(axiom: &str, iterations: u32, rules: &[(char, &str)]) -> Grammar {
        let mut map = HashMap::new();
        for (k, v) in rules {
            map.insert(*k, v.to_string());
        }
        Grammar {
            axiom: axiom.to_string(),
            angle: 90,
            iterations,
            rules: map,
        }
    }

    #[test]
    fn zero_iterations_returns_axiom() {
        let g = grammar("F", 0, &[('F', "F+F-F-F+F")]);
        assert_eq!(expand(&g), "F");
    }

    #[test]
    fn single_iteration_applies_rule_once() {
        let g = grammar("F", 1, &[('F', "F+F-F-F+F")]);
        assert_eq!(expand(&g), "F+F-F-F+F");
    }

    #[test]
    fn two_iterations_does_not_reexpand_within_a_pass() {
        let g = grammar("F", 2, &[('F', "F+F-F-F+F")]);
        let s = expand(&g);
        assert_eq!(s.len(), 41);
        assert_eq!(s.matches('F').count(), 9 * 5);
    }

    #[test]
    fn symbols_without_a_rule_are_copied_verbatim() {
        let g = grammar("F+F", 1, &[('F', "FF")]);
        assert_eq!(expand(&g), "FF+FF");
    }

    #[test]
    fn truncates_without_partial_rhs() {
        let mut map = HashMap::new();
        map.insert('F', "FFFFFFFFFF".to_string());
        let g = Grammar {
            axiom: "F".repeat(L_SYSTEM_MAX_LEN - 5),
            angle: 90,
            iterations: 1,
            rules: map,
        };
        let s = expand(&g);
        assert!(s.len() <= L_SYSTEM_MAX_LEN);
        assert_eq!(s.len() % 10, 0);
    }
}
