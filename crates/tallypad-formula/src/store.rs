//! Reactive variable store
//!
//! Every assignment re-derives the dependency edges of the assigned name,
//! re-checks the graph for cycles and recomputes all values in dependency
//! order. Variables on a cycle hold a runtime error instead of a value;
//! the rest of the store keeps working.

use crate::dependency::{extract_dependencies, DependencyGraph};
use crate::evaluator::{evaluate_expression, Layered, Scope};
use crate::lexer::Keyword;
use std::collections::{BTreeMap, BTreeSet};
use tallypad_core::{EngineOptions, Value, ValueError};
use thiserror::Error;
use tracing::{debug, trace, warn};

/// Why an assignment did not produce a value
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// Not a valid variable name
    #[error("invalid variable name '{0}'")]
    InvalidName(String),

    /// The name contains a reserved word
    #[error("'{name}' cannot be used as a name: '{word}' is a reserved word")]
    ReservedWord { name: String, word: String },

    /// The variable sits on a dependency cycle
    #[error("circular dependency: {cycle}")]
    Circular { cycle: String },

    /// The definition evaluated to an error
    #[error("{0}")]
    Evaluation(ValueError),
}

/// Result of [`VariableStore::set_variable`]
#[derive(Debug, Clone, PartialEq)]
pub struct SetOutcome {
    /// The variable now holds a non-error value
    pub success: bool,
    pub error: Option<StoreError>,
}

impl SetOutcome {
    fn rejected(error: StoreError) -> Self {
        Self {
            success: false,
            error: Some(error),
        }
    }
}

/// A defined variable and its bookkeeping
#[derive(Debug, Clone)]
pub struct VariableNode {
    /// Normalized name
    pub name: String,
    /// Definition as entered
    pub raw: String,
    /// Names referenced by the definition
    pub dependencies: BTreeSet<String>,
    /// On a dependency cycle
    pub circular: bool,
    /// Last computed value
    pub value: Value,
}

/// A variable as reported by [`VariableStore::get_all_variables`]
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub raw: String,
    pub value: Value,
}

/// Named variables with automatic recomputation
#[derive(Debug, Default)]
pub struct VariableStore {
    nodes: BTreeMap<String, VariableNode>,
    graph: DependencyGraph,
    options: EngineOptions,
}

/// Trim and collapse internal whitespace
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Check a normalized name: one or more words of letters, digits and `_`,
/// none starting with a digit and none a reserved word
pub fn validate_name(name: &str) -> Result<(), StoreError> {
    if name.is_empty() {
        return Err(StoreError::InvalidName(name.to_string()));
    }
    for word in name.split(' ') {
        let mut chars = word.chars();
        let starts_well = chars.next().is_some_and(|c| c.is_alphabetic() || c == '_');
        if !starts_well || !chars.all(|c| c.is_alphanumeric() || c == '_') {
            return Err(StoreError::InvalidName(name.to_string()));
        }
        if let Some(keyword) = Keyword::from_word(word) {
            return Err(StoreError::ReservedWord {
                name: name.to_string(),
                word: keyword.as_str().to_string(),
            });
        }
    }
    Ok(())
}

fn cycle_error(cycle: &[String]) -> ValueError {
    ValueError::runtime(format!("circular dependency: {}", cycle.join(" → ")))
}

impl VariableStore {
    /// Create an empty store with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store with the given options
    pub fn with_options(options: EngineOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Define or redefine a variable and recompute everything that depends
    /// on it
    pub fn set_variable(&mut self, name: &str, raw: &str) -> SetOutcome {
        let name = normalize_name(name);
        if let Err(e) = validate_name(&name) {
            debug!(name = %name, error = %e, "rejected assignment");
            return SetOutcome::rejected(e);
        }

        let raw = raw.trim().to_string();
        let dependencies = extract_dependencies(&raw);
        debug!(name = %name, raw = %raw, ?dependencies, "assign");

        self.graph.detach_outgoing(&name);
        for dependency in &dependencies {
            self.graph.add_dependency(dependency, &name);
        }
        self.nodes.insert(
            name.clone(),
            VariableNode {
                name: name.clone(),
                raw,
                dependencies,
                circular: false,
                value: Value::symbolic(name.as_str()),
            },
        );

        self.recompute();
        self.outcome(&name)
    }

    fn outcome(&self, name: &str) -> SetOutcome {
        let Some(node) = self.nodes.get(name) else {
            return SetOutcome::rejected(StoreError::InvalidName(name.to_string()));
        };
        match &node.value {
            Value::Error(_) if node.circular => SetOutcome {
                success: false,
                error: Some(StoreError::Circular {
                    cycle: self
                        .graph
                        .find_cycle(name)
                        .map(|c| c.join(" → "))
                        .unwrap_or_else(|| name.to_string()),
                }),
            },
            Value::Error(e) => SetOutcome {
                success: false,
                error: Some(StoreError::Evaluation(e.clone())),
            },
            _ => SetOutcome {
                success: true,
                error: None,
            },
        }
    }

    /// Current value of a variable
    pub fn get_variable(&self, name: &str) -> Option<&Value> {
        self.nodes.get(&normalize_name(name)).map(|node| &node.value)
    }

    /// The full node for a variable
    pub fn variable(&self, name: &str) -> Option<&VariableNode> {
        self.nodes.get(&normalize_name(name))
    }

    /// All variables, sorted by name
    pub fn get_all_variables(&self) -> Vec<Variable> {
        self.nodes
            .values()
            .map(|node| Variable {
                name: node.name.clone(),
                raw: node.raw.clone(),
                value: node.value.clone(),
            })
            .collect()
    }

    /// Remove a variable; its dependents recompute without it
    pub fn delete_variable(&mut self, name: &str) -> bool {
        let name = normalize_name(name);
        if self.nodes.remove(&name).is_none() {
            return false;
        }
        debug!(name = %name, "delete");
        self.graph.detach_outgoing(&name);
        self.recompute();
        true
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Remove every variable
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.graph.clear();
    }

    /// Evaluate an expression against the current values without storing it
    pub fn evaluate(&self, expression: &str) -> Value {
        self.evaluate_in(expression, self)
    }

    /// Evaluate with extra names bound on top of the stored variables
    pub fn evaluate_with(&self, expression: &str, bindings: &[(&str, Value)]) -> Value {
        let scope = bindings
            .iter()
            .fold(Layered::new(self), |scope, (name, value)| {
                scope.bind(normalize_name(name), value.clone())
            });
        self.evaluate_in(expression, &scope)
    }

    /// A plain literal is read directly; anything else is an expression
    fn evaluate_in(&self, text: &str, scope: &dyn Scope) -> Value {
        let literal = tallypad_core::parse(text);
        if literal.is_error() {
            evaluate_expression(text, scope)
        } else {
            literal
        }
    }

    /// Re-check cycles and recompute every variable in dependency order
    pub fn recompute(&mut self) {
        self.refresh_cycles();

        let members: BTreeSet<String> = self
            .nodes
            .values()
            .filter(|node| !node.circular)
            .map(|node| node.name.clone())
            .collect();
        let (order, leftover) = self.graph.topological_order(&members);

        for name in leftover {
            warn!(name = %name, "variable could not be ordered");
            if let Some(node) = self.nodes.get_mut(&name) {
                node.circular = true;
                node.value = Value::Error(cycle_error(std::slice::from_ref(&name)));
            }
        }

        for name in order {
            let Some(raw) = self.nodes.get(&name).map(|node| node.raw.clone()) else {
                continue;
            };
            let value = self.evaluate_in(&raw, self);
            trace!(name = %name, value = %value, "recomputed");
            if let Some(node) = self.nodes.get_mut(&name) {
                node.value = value;
            }
        }
    }

    /// Set or clear each node's circular flag from a fresh cycle search
    fn refresh_cycles(&mut self) {
        let names: Vec<String> = self.nodes.keys().cloned().collect();
        for name in names {
            let cycle = self.graph.find_cycle(&name);
            let Some(node) = self.nodes.get_mut(&name) else {
                continue;
            };
            match cycle {
                Some(cycle) => {
                    if !node.circular {
                        warn!(name = %name, cycle = %cycle.join(" → "), "circular dependency");
                    }
                    node.circular = true;
                    node.value = Value::Error(cycle_error(&cycle));
                }
                None => {
                    if node.circular {
                        debug!(name = %name, "no longer circular");
                    }
                    node.circular = false;
                }
            }
        }
    }
}

impl Scope for VariableStore {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.nodes.get(name).map(|node| node.value.clone())
    }

    fn options(&self) -> &EngineOptions {
        &self.options
    }
}
