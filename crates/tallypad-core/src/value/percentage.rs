use super::Value;

/// How a percentage combines with a base value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PercentContext {
    /// A bare percentage (`20%`)
    #[default]
    Standalone,
    /// `20% of x`: the portion of the base
    Of,
    /// `20% on x`: the base increased by the portion
    On,
    /// `20% off x`: the base decreased by the portion
    Off,
}

impl PercentContext {
    pub fn keyword(&self) -> Option<&'static str> {
        match self {
            PercentContext::Standalone => None,
            PercentContext::Of => Some("of"),
            PercentContext::On => Some("on"),
            PercentContext::Off => Some("off"),
        }
    }
}

/// A percentage, stored in display form (`20` for `20%`)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Percentage {
    display: f64,
    context: PercentContext,
}

impl Percentage {
    pub fn new(display: f64) -> Self {
        Self {
            display,
            context: PercentContext::Standalone,
        }
    }

    /// Create from the decimal form (`0.2` → `20%`)
    pub fn from_decimal(decimal: f64) -> Self {
        Self::new(decimal * 100.0)
    }

    pub fn with_context(mut self, context: PercentContext) -> Self {
        self.context = context;
        self
    }

    /// The number shown before the `%` sign
    pub fn display_value(&self) -> f64 {
        self.display
    }

    /// The fraction this percentage stands for
    pub fn decimal(&self) -> f64 {
        self.display / 100.0
    }

    pub fn context(&self) -> PercentContext {
        self.context
    }

    /// The portion of `base` (`20% of 50 = 10`)
    pub fn of(&self, base: &Value) -> Value {
        match base {
            // a percentage of a percentage stays a percentage
            Value::Percentage(p) => Value::Percentage(Percentage::new(p.display * self.decimal())),
            _ => base.multiply(&Value::Number(self.decimal())),
        }
    }

    /// `base` increased by this percentage of itself
    pub fn on(&self, base: &Value) -> Value {
        base.add(&self.of(base))
    }

    /// `base` decreased by this percentage of itself
    pub fn off(&self, base: &Value) -> Value {
        base.subtract(&self.of(base))
    }

    /// Combine with `base` according to the usage context; a standalone
    /// percentage takes its portion.
    pub fn apply(&self, base: &Value) -> Value {
        match self.context {
            PercentContext::Standalone | PercentContext::Of => self.of(base),
            PercentContext::On => self.on(base),
            PercentContext::Off => self.off(base),
        }
    }
}
