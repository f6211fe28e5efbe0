//! Dependency tracking between named variables

use crate::lexer::{tokenize, Keyword, TokenKind};
use ahash::{AHashMap, AHashSet};
use std::collections::BTreeSet;
use tallypad_core::{units, CurrencyCode, DurationUnit};

static NO_EDGES: BTreeSet<String> = BTreeSet::new();

/// Dependency graph for variables
///
/// Edges are keyed by normalized name and may point at names that are not
/// (or no longer) defined, so that defining them later wakes their
/// dependents up.
#[derive(Debug, Default, Clone)]
pub struct DependencyGraph {
    /// Name → names that depend on it (dependents)
    dependents: AHashMap<String, BTreeSet<String>>,
    /// Name → names it depends on (precedents)
    precedents: AHashMap<String, BTreeSet<String>>,
}

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dependency: dependent depends on precedent
    pub fn add_dependency(&mut self, precedent: &str, dependent: &str) {
        self.dependents
            .entry(precedent.to_string())
            .or_default()
            .insert(dependent.to_string());
        self.precedents
            .entry(dependent.to_string())
            .or_default()
            .insert(precedent.to_string());
    }

    /// Remove the edges from `name` to what it depends on
    ///
    /// Edges from other variables to `name` stay in place.
    pub fn detach_outgoing(&mut self, name: &str) {
        if let Some(precedents) = self.precedents.remove(name) {
            for precedent in precedents {
                if let Some(deps) = self.dependents.get_mut(&precedent) {
                    deps.remove(name);
                    if deps.is_empty() {
                        self.dependents.remove(&precedent);
                    }
                }
            }
        }
    }

    /// Names that depend on `name`
    pub fn dependents(&self, name: &str) -> &BTreeSet<String> {
        self.dependents.get(name).unwrap_or(&NO_EDGES)
    }

    /// Names `name` depends on
    pub fn precedents(&self, name: &str) -> &BTreeSet<String> {
        self.precedents.get(name).unwrap_or(&NO_EDGES)
    }

    /// Find a cycle through `start`
    ///
    /// Returns the path following dependencies from `start` back to itself,
    /// e.g. `[a, b, a]` when `a` depends on `b` and `b` on `a`.
    pub fn find_cycle(&self, start: &str) -> Option<Vec<String>> {
        let mut visited: AHashSet<&str> = AHashSet::new();
        let mut path: Vec<&str> = vec![start];
        let mut stack = vec![self.precedents(start).iter()];
        visited.insert(start);

        loop {
            let next = match stack.last_mut() {
                Some(iter) => iter.next(),
                None => return None,
            };
            match next {
                Some(name) if name == start => {
                    let mut cycle: Vec<String> = path.iter().map(|s| s.to_string()).collect();
                    cycle.push(start.to_string());
                    return Some(cycle);
                }
                Some(name) => {
                    if visited.insert(name.as_str()) {
                        path.push(name.as_str());
                        stack.push(self.precedents(name).iter());
                    }
                }
                None => {
                    stack.pop();
                    path.pop();
                }
            }
        }
    }

    /// Order `members` so every name comes after the members it depends on
    ///
    /// Kahn's algorithm; ties are broken by name. Members that cannot be
    /// ordered (they sit on or behind a cycle inside `members`) are returned
    /// second.
    pub fn topological_order(&self, members: &BTreeSet<String>) -> (Vec<String>, Vec<String>) {
        let mut in_degree: AHashMap<&str, usize> = members
            .iter()
            .map(|name| {
                let count = self
                    .precedents(name)
                    .iter()
                    .filter(|p| members.contains(*p))
                    .count();
                (name.as_str(), count)
            })
            .collect();

        let mut ready: BTreeSet<&str> = in_degree
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(name, _)| *name)
            .collect();

        let mut order = Vec::with_capacity(members.len());
        while let Some(name) = ready.pop_first() {
            order.push(name.to_string());
            for dependent in self.dependents(name) {
                if let Some(count) = in_degree.get_mut(dependent.as_str()) {
                    *count -= 1;
                    if *count == 0 {
                        ready.insert(dependent.as_str());
                    }
                }
            }
        }

        let ordered: AHashSet<&str> = order.iter().map(String::as_str).collect();
        let leftover = members
            .iter()
            .filter(|name| !ordered.contains(name.as_str()))
            .cloned()
            .collect();
        (order, leftover)
    }

    /// Clear the entire graph
    pub fn clear(&mut self) {
        self.dependents.clear();
        self.precedents.clear();
    }
}

/// Names of the variables an expression refers to
///
/// Identifier tokens count, except function names, unit, duration and
/// currency words attached to a number, currency codes written before an
/// amount, and conversion targets. Text that does not tokenize has no
/// dependencies.
pub fn extract_dependencies(text: &str) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    let Ok(tokens) = tokenize(text) else {
        return names;
    };

    let mut in_target = false;
    let mut in_unit = false;
    for (i, token) in tokens.iter().enumerate() {
        let prev = i.checked_sub(1).map(|p| &tokens[p].kind);
        let next = tokens.get(i + 1).map(|t| &t.kind);

        match &token.kind {
            TokenKind::Keyword(k) if k.is_conversion() => {
                in_target = true;
                continue;
            }
            TokenKind::RightParen | TokenKind::Comma | TokenKind::RightBracket => {
                in_target = false;
                in_unit = false;
                continue;
            }
            TokenKind::Identifier(_) => {}
            TokenKind::Caret | TokenKind::Slash | TokenKind::Star | TokenKind::Keyword(Keyword::Per) => continue,
            TokenKind::Number(_) if matches!(prev, Some(TokenKind::Caret | TokenKind::Minus)) => continue,
            _ => {
                in_unit = false;
                continue;
            }
        }

        let TokenKind::Identifier(name) = &token.kind else {
            continue;
        };
        if in_target || next == Some(&TokenKind::LeftParen) {
            continue;
        }
        if CurrencyCode::from_code(name).is_some() && matches!(next, Some(TokenKind::Number(_))) {
            continue;
        }

        let after_number = matches!(prev, Some(TokenKind::Number(_)));
        let suffix = DurationUnit::from_word(name).is_some()
            || CurrencyCode::from_code(name).is_some()
            || units::is_unit(name);
        if after_number && suffix {
            in_unit = true;
            continue;
        }
        // `5 km/h`: the units after a quantity's operator
        if in_unit
            && units::is_unit(name)
            && matches!(prev, Some(TokenKind::Slash | TokenKind::Star | TokenKind::Keyword(Keyword::Per)))
        {
            continue;
        }

        in_unit = false;
        names.insert(name.clone());
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn deps(text: &str) -> Vec<String> {
        extract_dependencies(text).into_iter().collect()
    }

    #[test]
    fn test_add_dependency() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency("a", "b");

        assert!(graph.dependents("a").contains("b"));
        assert!(graph.precedents("b").contains("a"));
        assert!(graph.dependents("b").is_empty());
    }

    #[test]
    fn test_detach_keeps_incoming_edges() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency("a", "b");
        graph.add_dependency("b", "c");

        graph.detach_outgoing("b");

        assert!(graph.precedents("b").is_empty());
        assert!(graph.dependents("a").is_empty());
        assert!(graph.dependents("b").contains("c"));
    }

    #[test]
    fn test_circular_reference() {
        let mut graph = DependencyGraph::new();

        // a -> b -> c -> a
        graph.add_dependency("a", "b");
        graph.add_dependency("b", "c");
        graph.add_dependency("c", "a");

        assert_eq!(
            graph.find_cycle("a"),
            Some(vec!["a".to_string(), "c".to_string(), "b".to_string(), "a".to_string()])
        );
        assert!(graph.find_cycle("b").is_some());
        assert!(graph.find_cycle("c").is_some());
    }

    #[test]
    fn test_no_cycle_behind_a_cycle() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency("a", "b");
        graph.add_dependency("b", "a");
        graph.add_dependency("a", "total");

        assert!(graph.find_cycle("total").is_none());
        assert!(graph.find_cycle("a").is_some());
    }

    #[test]
    fn test_self_reference() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency("x", "x");
        assert_eq!(graph.find_cycle("x"), Some(vec!["x".to_string(), "x".to_string()]));
    }

    #[test]
    fn test_topological_order() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency("price", "total");
        graph.add_dependency("qty", "total");
        graph.add_dependency("total", "tax");

        let members: BTreeSet<String> = ["tax", "total", "qty", "price"].iter().map(|s| s.to_string()).collect();
        let (order, leftover) = graph.topological_order(&members);

        assert_eq!(order, vec!["price", "qty", "total", "tax"]);
        assert!(leftover.is_empty());
    }

    #[test]
    fn test_topological_order_leaves_cycles_out() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency("a", "b");
        graph.add_dependency("b", "a");
        graph.add_dependency("b", "c");

        let members: BTreeSet<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        let (order, leftover) = graph.topological_order(&members);

        assert_eq!(order, vec!["d"]);
        assert_eq!(leftover, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_extract_plain_names() {
        assert_eq!(deps("a + b * 2"), vec!["a", "b"]);
        assert_eq!(deps("monthly rent * 12"), vec!["monthly rent"]);
        assert_eq!(deps("2 x"), vec!["x"]);
    }

    #[test]
    fn test_extract_skips_calls_and_suffixes() {
        assert_eq!(deps("sum(costs) + 5 kg"), vec!["costs"]);
        assert_eq!(deps("speed * 2 hours"), vec!["speed"]);
        assert_eq!(deps("distance / 5 km/h"), vec!["distance"]);
        assert_eq!(deps("USD 12 + fee"), vec!["fee"]);
        assert_eq!(deps("30 EUR + fee"), vec!["fee"]);
    }

    #[test]
    fn test_extract_skips_conversion_targets() {
        assert_eq!(deps("distance to km"), vec!["distance"]);
        assert_eq!(deps("sum(a to m, b)"), vec!["a", "b"]);
        assert_eq!(deps("speed in km/h"), vec!["speed"]);
    }

    #[test]
    fn test_extract_unreadable() {
        assert!(deps("a + ?").is_empty());
    }
}
