//! Branch selection by glob patterns.
//!
//! A selection spec is a comma-separated list of glob patterns, each
//! optionally prefixed with `+` (include) or `-` (exclude); a bare pattern
//! includes. An empty spec accepts every branch. Otherwise a branch starts
//! rejected, or accepted when the spec has no include patterns at all, and
//! every matching pattern, left to right, sets the decision to its
//! polarity, so the last match wins.
//!
//! Globs follow the usual filesystem rules: `*` and `?` match anything but
//! `/`, `[...]` / `[^...]` are character classes, `\` escapes. A pattern
//! matches a branch when it matches the name or a leading part of it, so
//! `-ab` also drops `abc`. A malformed or empty pattern never matches.

use regex::Regex;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone)]
struct Rule {
    include: bool,
    source: String,
    /// `None` when the glob is malformed
    pattern: Option<Regex>,
}

/// Parsed branch selection spec.
#[derive(Debug, Clone)]
pub struct BranchSelection {
    spec: String,
    rules: Vec<Rule>,
    /// Decision before any pattern matches
    default_accept: bool,
}

impl BranchSelection {
    /// Selection that accepts every branch.
    pub fn all() -> Self {
        Self {
            spec: String::new(),
            rules: Vec::new(),
            default_accept: true,
        }
    }

    /// Parse a selection spec. Never fails; malformed globs are kept as
    /// rules that match nothing.
    pub fn parse(spec: &str) -> Self {
        let rules = spec
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                let (include, glob) = match entry.as_bytes()[0] {
                    b'+' => (true, &entry[1..]),
                    b'-' => (false, &entry[1..]),
                    _ => (true, entry),
                };
                Rule {
                    include,
                    source: glob.to_string(),
                    pattern: glob_to_regex(glob),
                }
            })
            .collect::<Vec<Rule>>();

        let trimmed = spec.trim();
        Self {
            default_accept: trimmed.is_empty() || rules.iter().all(|rule| !rule.include),
            spec: trimmed.to_string(),
            rules,
        }
    }

    /// Whether the branch `name` is selected.
    pub fn accepts(&self, name: &str) -> bool {
        let mut accept = self.default_accept;
        for rule in &self.rules {
            if rule.pattern.as_ref().is_some_and(|re| re.is_match(name)) {
                accept = rule.include;
            }
        }
        accept
    }

    /// Patterns that could not be compiled.
    pub fn malformed(&self) -> impl Iterator<Item = &str> {
        self.rules
            .iter()
            .filter(|rule| rule.pattern.is_none())
            .map(|rule| rule.source.as_str())
    }
}

impl Default for BranchSelection {
    fn default() -> Self {
        Self::all()
    }
}

impl FromStr for BranchSelection {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for BranchSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.spec.is_empty() {
            f.write_str("<all>")
        } else {
            f.write_str(&self.spec)
        }
    }
}

/// Translate a glob into a regular expression anchored at the start.
fn glob_to_regex(glob: &str) -> Option<Regex> {
    if glob.is_empty() {
        return None;
    }
    let mut out = String::with_capacity(glob.len() * 2 + 2);
    out.push('^');

    let mut chars = glob.chars();
    while let Some(c) = chars.next() {
        match c {
            '*' => out.push_str("[^/]*"),
            '?' => out.push_str("[^/]"),
            '\\' => out.push_str(&regex::escape(&chars.next()?.to_string())),
            '[' => {
                out.push('[');
                if chars.as_str().starts_with('^') {
                    chars.next();
                    out.push('^');
                }
                let mut ranges = 0;
                loop {
                    let lo = class_char(&mut chars)?;
                    let Some(lo) = lo else {
                        break;
                    };
                    out.push_str(&regex::escape(&lo.to_string()));
                    if chars.as_str().starts_with('-') {
                        chars.next();
                        let hi = class_char(&mut chars)??;
                        if hi < lo {
                            return None;
                        }
                        out.push('-');
                        out.push_str(&regex::escape(&hi.to_string()));
                    }
                    ranges += 1;
                }
                if ranges == 0 {
                    return None;
                }
                out.push(']');
            },
            other => out.push_str(&regex::escape(&other.to_string())),
        }
    }

    Regex::new(&out).ok()
}

/// Next character inside a class: `Some(Some(c))` for a member,
/// `Some(None)` at the closing `]`, `None` when malformed.
fn class_char(chars: &mut std::str::Chars<'_>) -> Option<Option<char>> {
    match chars.next()? {
        ']' => Some(None),
        '-' => None,
        '\\' => chars.next().map(Some),
        c => Some(Some(c)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_spec_accepts_all() {
        let sel = BranchSelection::parse("");
        assert!(sel.accepts("anything"));
        assert!(sel.accepts(""));
        assert!(BranchSelection::all().accepts("x"));
        assert!(BranchSelection::default().accepts("x"));
    }

    #[test]
    fn test_include_then_exclude() {
        let sel = BranchSelection::parse("+a*,-ab");
        assert!(!sel.accepts("abc"));
        assert!(!sel.accepts("ab"));
        assert!(sel.accepts("axc"));
        assert!(!sel.accepts("zz"));
    }

    #[test]
    fn test_patterns_match_leading_part() {
        let sel = BranchSelection::parse("+el");
        assert!(sel.accepts("electron_pt"));
        assert!(!sel.accepts("mu_el"));
    }

    #[test]
    fn test_last_match_wins() {
        let sel = BranchSelection::parse("-el_*,+el_pt");
        assert!(sel.accepts("el_pt"));
        assert!(!sel.accepts("el_eta"));

        let sel = BranchSelection::parse("+el_pt,-el_*");
        assert!(!sel.accepts("el_pt"));
    }

    #[test]
    fn test_bare_pattern_includes() {
        let sel = BranchSelection::parse("mu_*");
        assert!(sel.accepts("mu_pt"));
        assert!(!sel.accepts("el_pt"));
    }

    #[test]
    fn test_exclude_only_keeps_the_rest() {
        let sel = BranchSelection::parse("-internal*");
        assert!(!sel.accepts("internal_flag"));
        assert!(sel.accepts("data"));

        let sel = BranchSelection::parse("-internal*,-tmp_?");
        assert!(sel.accepts("data"));
        assert!(!sel.accepts("tmp_1"));
    }

    #[test]
    fn test_any_include_starts_rejected() {
        let sel = BranchSelection::parse("-internal*,+el_*");
        assert!(!sel.accepts("data"));
        assert!(sel.accepts("el_pt"));

        // A malformed include still counts as an include.
        let sel = BranchSelection::parse("-internal*,+[");
        assert!(!sel.accepts("data"));
    }

    #[test]
    fn test_empty_glob_never_matches() {
        let sel = BranchSelection::parse("data,-");
        assert!(sel.accepts("data"));
        assert!(!sel.accepts("other"));
        assert_eq!(sel.malformed().collect::<Vec<_>>(), vec![""]);

        let sel = BranchSelection::parse("+,mu");
        assert!(!sel.accepts("el_pt"));
        assert!(sel.accepts("mu"));
    }

    #[test]
    fn test_glob_features() {
        let sel = BranchSelection::parse("jet_?,[mM]et,n[^0-9]x,lit\\*");
        assert!(sel.accepts("jet_1"));
        assert!(!sel.accepts("jets"));
        assert!(sel.accepts("Met"));
        assert!(sel.accepts("met"));
        assert!(sel.accepts("nax"));
        assert!(!sel.accepts("n5x"));
        assert!(sel.accepts("lit*"));
        assert!(!sel.accepts("litx"));
    }

    #[test]
    fn test_wildcards_do_not_cross_separators() {
        let sel = BranchSelection::parse("a*c");
        assert!(sel.accepts("abc"));
        assert!(!sel.accepts("a/c"));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        let sel = BranchSelection::parse("el.pt");
        assert!(sel.accepts("el.pt"));
        assert!(!sel.accepts("elxpt"));
    }

    #[test]
    fn test_malformed_patterns_never_match() {
        let sel = BranchSelection::parse("[abc,x\\,[],[z-a]");
        assert!(!sel.accepts("a"));
        assert!(!sel.accepts("[abc"));
        assert_eq!(sel.malformed().count(), 4);
    }

    #[test]
    fn test_malformed_pattern_does_not_poison_others() {
        let sel = BranchSelection::parse("[,-data,+da*");
        assert!(sel.accepts("data"));
    }

    proptest! {
        #[test]
        fn prop_literal_names_select_themselves(name in "[a-z][a-z0-9_]{0,15}") {
            let sel = BranchSelection::parse(&name);
            prop_assert!(sel.accepts(&name));
            let excluded = BranchSelection::parse(&format!("*,-{}", name));
            prop_assert!(!excluded.accepts(&name));
        }
    }
}
