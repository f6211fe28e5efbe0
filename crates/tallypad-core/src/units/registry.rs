//! Unit registry
//!
//! Every unit is defined by its factor to the coherent SI unit of its
//! dimension (and an offset for temperature scales). Lookup accepts the
//! canonical symbol, any alias, or an SI prefix in front of a prefixable
//! symbol (`kN`, `µs`, `GW`).

use super::dimension::Dimension;
use ahash::AHashMap;
use once_cell::sync::Lazy;

/// A registered unit definition
#[derive(Debug, Clone, Copy)]
pub struct UnitDef {
    /// Canonical symbol
    pub symbol: &'static str,
    /// Alternative spellings (long names, plurals)
    pub aliases: &'static [&'static str],
    /// Multiply by this to reach the SI unit
    pub factor: f64,
    /// Added before applying `factor` (temperature scales only)
    pub offset: f64,
    pub dimension: Dimension,
    /// Accepts SI prefixes
    pub prefixable: bool,
}

/// A unit resolved from text, possibly prefixed
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedUnit {
    pub symbol: String,
    pub factor: f64,
    pub offset: f64,
    pub dimension: Dimension,
}

const L: Dimension = Dimension::LENGTH;
const M: Dimension = Dimension::MASS;
const T: Dimension = Dimension::TIME;
const I: Dimension = Dimension::CURRENT;
const K: Dimension = Dimension::TEMPERATURE;
const D: Dimension = Dimension::INFORMATION;

const fn def(
    symbol: &'static str,
    aliases: &'static [&'static str],
    factor: f64,
    dimension: Dimension,
    prefixable: bool,
) -> UnitDef {
    UnitDef {
        symbol,
        aliases,
        factor,
        offset: 0.0,
        dimension,
        prefixable,
    }
}

fn area() -> Dimension {
    L * L
}

fn volume() -> Dimension {
    L * L * L
}

fn force() -> Dimension {
    M * L / (T * T)
}

fn energy() -> Dimension {
    force() * L
}

fn power() -> Dimension {
    energy() / T
}

fn unit_table() -> Vec<UnitDef> {
    vec![
        // Length
        def("m", &["meter", "meters", "metre", "metres"], 1.0, L, true),
        def("km", &["kilometer", "kilometers", "kilometre", "kilometres"], 1e3, L, false),
        def("cm", &["centimeter", "centimeters", "centimetre", "centimetres"], 1e-2, L, false),
        def("mm", &["millimeter", "millimeters", "millimetre", "millimetres"], 1e-3, L, false),
        def("in", &["inch", "inches"], 0.0254, L, false),
        def("ft", &["foot", "feet"], 0.3048, L, false),
        def("yd", &["yard", "yards"], 0.9144, L, false),
        def("mi", &["mile", "miles"], 1609.344, L, false),
        // Mass
        def("g", &["gram", "grams"], 1e-3, M, true),
        def("kg", &["kilogram", "kilograms", "kilo", "kilos"], 1.0, M, false),
        def("mg", &["milligram", "milligrams"], 1e-6, M, false),
        def("t", &["tonne", "tonnes"], 1e3, M, false),
        def("lb", &["lbs", "pound", "pounds"], 0.453_592_37, M, false),
        def("oz", &["ounce", "ounces"], 0.028_349_523_125, M, false),
        // Time
        def("s", &["sec", "secs", "second", "seconds"], 1.0, T, true),
        def("ms", &["millisecond", "milliseconds"], 1e-3, T, false),
        def("min", &["mins", "minute", "minutes"], 60.0, T, false),
        def("h", &["hr", "hrs", "hour", "hours"], 3600.0, T, false),
        def("d", &["day", "days"], 86_400.0, T, false),
        def("wk", &["week", "weeks"], 604_800.0, T, false),
        def("yr", &["year", "years"], 31_557_600.0, T, false),
        // Current, amount
        def("A", &["amp", "amps", "ampere", "amperes"], 1.0, I, true),
        def("mol", &["mole", "moles"], 1.0, Dimension::AMOUNT, true),
        def("cd", &["candela"], 1.0, Dimension::LUMINOSITY, false),
        // Area, volume
        def("ha", &["hectare", "hectares"], 1e4, area(), false),
        def("acre", &["acres"], 4_046.856_422_4, area(), false),
        def("L", &["l", "liter", "liters", "litre", "litres"], 1e-3, volume(), true),
        def("mL", &["ml", "milliliter", "milliliters", "millilitre", "millilitres"], 1e-6, volume(), false),
        def("gal", &["gallon", "gallons"], 0.003_785_411_784, volume(), false),
        // Speed
        def("mph", &[], 0.447_04, L / T, false),
        def("kph", &["kmh"], 1.0 / 3.6, L / T, false),
        // Mechanics
        def("N", &["newton", "newtons"], 1.0, force(), true),
        def("Pa", &["pascal", "pascals"], 1.0, force() / area(), true),
        def("bar", &[], 1e5, force() / area(), false),
        def("psi", &[], 6_894.757_293_168, force() / area(), false),
        def("J", &["joule", "joules"], 1.0, energy(), true),
        def("cal", &["calorie", "calories"], 4.184, energy(), false),
        def("kcal", &["kilocalorie", "kilocalories"], 4_184.0, energy(), false),
        def("Wh", &[], 3_600.0, energy(), true),
        def("kWh", &[], 3.6e6, energy(), false),
        def("W", &["watt", "watts"], 1.0, power(), true),
        def("hp", &["horsepower"], 745.699_872, power(), false),
        def("Hz", &["hertz"], 1.0, Dimension::DIMENSIONLESS / T, true),
        def("V", &["volt", "volts"], 1.0, power() / I, true),
        // Information
        def("B", &["byte", "bytes"], 8.0, D, true),
        def("bit", &["bits"], 1.0, D, true),
        def("kB", &["kilobyte", "kilobytes"], 8e3, D, false),
        def("MB", &["megabyte", "megabytes"], 8e6, D, false),
        def("GB", &["gigabyte", "gigabytes"], 8e9, D, false),
        def("TB", &["terabyte", "terabytes"], 8e12, D, false),
        // Temperature
        UnitDef {
            symbol: "K",
            aliases: &["kelvin"],
            factor: 1.0,
            offset: 0.0,
            dimension: K,
            prefixable: false,
        },
        UnitDef {
            symbol: "°C",
            aliases: &["degC", "celsius", "C"],
            factor: 1.0,
            offset: 273.15,
            dimension: K,
            prefixable: false,
        },
        UnitDef {
            symbol: "°F",
            aliases: &["degF", "fahrenheit", "F"],
            factor: 5.0 / 9.0,
            offset: 459.67,
            dimension: K,
            prefixable: false,
        },
    ]
}

const PREFIXES: &[(&str, f64)] = &[
    ("k", 1e3),
    ("M", 1e6),
    ("G", 1e9),
    ("T", 1e12),
    ("c", 1e-2),
    ("m", 1e-3),
    ("µ", 1e-6),
    ("u", 1e-6),
    ("n", 1e-9),
];

struct Registry {
    by_name: AHashMap<&'static str, UnitDef>,
}

impl Registry {
    fn new() -> Self {
        let mut by_name = AHashMap::new();
        for unit in unit_table() {
            by_name.insert(unit.symbol, unit);
            for alias in unit.aliases {
                by_name.insert(*alias, unit);
            }
        }
        Self { by_name }
    }

    fn resolve(&self, name: &str) -> Option<ResolvedUnit> {
        if let Some(def) = self.by_name.get(name) {
            return Some(ResolvedUnit {
                symbol: def.symbol.to_string(),
                factor: def.factor,
                offset: def.offset,
                dimension: def.dimension,
            });
        }

        // Case-insensitive match on long names only ("Meters", "KILOGRAMS")
        if name.chars().count() > 3 {
            let lower = name.to_lowercase();
            if let Some(def) = self.by_name.get(lower.as_str()) {
                return self.resolve(def.symbol);
            }
        }

        for (prefix, scale) in PREFIXES {
            if let Some(rest) = name.strip_prefix(prefix) {
                if let Some(def) = self.by_name.get(rest) {
                    if def.prefixable && def.symbol == rest {
                        return Some(ResolvedUnit {
                            symbol: format!("{}{}", prefix, def.symbol),
                            factor: def.factor * scale,
                            offset: 0.0,
                            dimension: def.dimension,
                        });
                    }
                }
            }
        }
        None
    }
}

static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

/// Resolve a unit name (symbol, alias, or prefixed symbol)
pub fn lookup(name: &str) -> Option<ResolvedUnit> {
    REGISTRY.resolve(name.trim())
}

/// Check if a name denotes a unit
pub fn is_unit(name: &str) -> bool {
    lookup(name).is_some()
}

/// Units considered by the best-display-unit heuristic, smallest first.
/// A unit belongs to at most one family.
pub(crate) const DISPLAY_FAMILIES: &[&[&str]] = &[
    &["mm", "cm", "m", "km"],
    &["in", "ft", "mi"],
    &["mg", "g", "kg", "t"],
    &["oz", "lb"],
    &["ms", "s", "min", "h", "d"],
    &["mL", "L"],
    &["B", "kB", "MB", "GB", "TB"],
    &["J", "kJ", "MJ"],
    &["Wh", "kWh"],
    &["W", "kW", "MW", "GW"],
    &["Hz", "kHz", "MHz", "GHz"],
];
