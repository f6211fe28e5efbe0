//! Built-in functions

pub mod date;
pub mod math;
pub mod statistical;

use crate::error::{FormulaError, FormulaResult};
use ahash::AHashMap;
use std::sync::OnceLock;
use tallypad_core::{EngineOptions, Value};

/// Function implementation signature
///
/// Arguments arrive evaluated; value-level failures are returned as
/// [`Value::Error`], misuse of the function itself as a [`FormulaError`].
pub type FunctionImpl = fn(&[Value], &EngineOptions) -> FormulaResult<Value>;

/// Function definition
pub struct FunctionDef {
    /// Function name (uppercase)
    pub name: &'static str,
    /// Minimum arguments
    pub min_args: usize,
    /// Maximum arguments (None = unlimited)
    pub max_args: Option<usize>,
    /// Implementation
    pub implementation: FunctionImpl,
    /// Result depends on more than the arguments (the clock)
    pub volatile: bool,
}

impl FunctionDef {
    /// Check an argument count against this definition
    pub fn check_arity(&self, actual: usize) -> FormulaResult<()> {
        let too_few = actual < self.min_args;
        let too_many = self.max_args.is_some_and(|max| actual > max);
        if !too_few && !too_many {
            return Ok(());
        }
        let expected = match self.max_args {
            Some(max) if max == self.min_args => format!("{}", max),
            Some(max) => format!("{} to {}", self.min_args, max),
            None => format!("at least {}", self.min_args),
        };
        Err(FormulaError::ArgumentCount {
            function: self.name.to_lowercase(),
            expected,
            actual,
        })
    }
}

/// Function registry
pub struct FunctionRegistry {
    functions: AHashMap<String, FunctionDef>,
}

static REGISTRY: OnceLock<FunctionRegistry> = OnceLock::new();

/// The shared registry of built-in functions
pub fn registry() -> &'static FunctionRegistry {
    REGISTRY.get_or_init(FunctionRegistry::new)
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FunctionRegistry {
    /// Create a new registry with all built-in functions
    pub fn new() -> Self {
        let mut registry = Self {
            functions: AHashMap::new(),
        };

        registry.register_statistical_functions();
        registry.register_math_functions();
        registry.register_date_functions();

        registry
    }

    /// Look up a function by name, ignoring case
    pub fn get(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.get(&name.to_uppercase())
    }

    /// Check if a name is a volatile function
    pub fn is_volatile(&self, name: &str) -> bool {
        self.get(name).is_some_and(|def| def.volatile)
    }

    /// Registered names, lowercase and sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.functions.keys().map(|n| n.to_lowercase()).collect();
        names.sort();
        names
    }

    /// Register a function
    pub fn register(&mut self, def: FunctionDef) {
        self.functions.insert(def.name.to_uppercase(), def);
    }

    fn register_fixed(&mut self, name: &'static str, min_args: usize, max_args: Option<usize>, implementation: FunctionImpl) {
        self.register(FunctionDef {
            name,
            min_args,
            max_args,
            implementation,
            volatile: false,
        });
    }

    fn register_statistical_functions(&mut self) {
        for name in ["SUM", "TOTAL"] {
            self.register_fixed(name, 1, None, statistical::fn_sum);
        }
        for name in ["MEAN", "AVG", "AVERAGE"] {
            self.register_fixed(name, 1, None, statistical::fn_mean);
        }
        self.register_fixed("MEDIAN", 1, None, statistical::fn_median);
        self.register_fixed("STDDEV", 1, None, statistical::fn_stddev);
        self.register_fixed("MIN", 1, None, statistical::fn_min);
        self.register_fixed("MAX", 1, None, statistical::fn_max);
        self.register_fixed("RANGE", 1, None, statistical::fn_range);
        self.register_fixed("COUNT", 1, None, statistical::fn_count);
        self.register_fixed("SORT", 1, Some(2), statistical::fn_sort);
    }

    fn register_math_functions(&mut self) {
        self.register_fixed("SQRT", 1, Some(1), math::fn_sqrt);
        self.register_fixed("ABS", 1, Some(1), math::fn_abs);
        self.register_fixed("ROUND", 1, Some(2), math::fn_round);
        self.register_fixed("FLOOR", 1, Some(1), math::fn_floor);
        self.register_fixed("CEIL", 1, Some(1), math::fn_ceil);
        self.register_fixed("LN", 1, Some(1), math::fn_ln);
        self.register_fixed("LOG", 1, Some(2), math::fn_log);
        self.register_fixed("EXP", 1, Some(1), math::fn_exp);
    }

    fn register_date_functions(&mut self) {
        // TODAY (volatile)
        self.register(FunctionDef {
            name: "TODAY",
            min_args: 0,
            max_args: Some(0),
            implementation: date::fn_today,
            volatile: true,
        });

        // NOW (volatile)
        self.register(FunctionDef {
            name: "NOW",
            min_args: 0,
            max_args: Some(0),
            implementation: date::fn_now,
            volatile: true,
        });
    }
}
