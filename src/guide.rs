//! Generation guides: per-field constraints attached to schema nodes.
use std::fmt;

use indexmap::IndexSet;
use ordered_float::OrderedFloat;
use regex::Regex;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{Result, SchemaError};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GuideKind {
    Range,
    Pattern,
    Count,
    Choices,
}

/// A literal allowed by a `choices` guide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Literal {
    String(String),
    Number(OrderedFloat<f64>),
    Boolean(bool),
}

/// A regex compiled once at construction; always matched against the whole string.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    anchored: Regex,
}

/// Guides are immutable once built; inconsistent parameters never construct.
#[derive(Debug, Clone, PartialEq)]
pub enum Guide {
    /// Inclusive numeric bounds, at least one present.
    Range { min: Option<f64>, max: Option<f64> },
    Pattern(Pattern),
    /// Inclusive element-count bounds, at least one present.
    Count { min: Option<usize>, max: Option<usize> },
    /// Non-empty literal set, first-occurrence order kept.
    Choices(IndexSet<Literal>),
}

// ————————————————————————————————————————————————————————————————————————————
// CONSTRUCTION
// ————————————————————————————————————————————————————————————————————————————

impl Guide {
    pub fn range(min: f64, max: f64) -> Result<Self> {
        Self::range_bounds(Some(min), Some(max))
    }
    pub fn minimum(min: f64) -> Result<Self> {
        Self::range_bounds(Some(min), None)
    }
    pub fn maximum(max: f64) -> Result<Self> {
        Self::range_bounds(None, Some(max))
    }
    pub fn range_bounds(min: Option<f64>, max: Option<f64>) -> Result<Self> {
        let invalid = |reason: String| SchemaError::InvalidGuide { kind: GuideKind::Range, reason };
        if min.is_none() && max.is_none() {
            return Err(invalid("at least one bound is required".into()));
        }
        for bound in [min, max].into_iter().flatten() {
            if !bound.is_finite() {
                return Err(invalid(format!("bound {bound} must be finite")));
            }
        }
        if let (Some(lo), Some(hi)) = (min, max) {
            if lo > hi {
                return Err(invalid(format!("min {lo} is greater than max {hi}")));
            }
        }
        Ok(Guide::Range { min, max })
    }

    pub fn pattern(source: &str) -> Result<Self> {
        Ok(Guide::Pattern(Pattern::new(source)?))
    }

    pub fn count(min: i64, max: i64) -> Result<Self> {
        Self::count_bounds(Some(min), Some(max))
    }
    pub fn count_at_least(min: i64) -> Result<Self> {
        Self::count_bounds(Some(min), None)
    }
    pub fn count_at_most(max: i64) -> Result<Self> {
        Self::count_bounds(None, Some(max))
    }
    pub fn exact_count(n: i64) -> Result<Self> {
        Self::count_bounds(Some(n), Some(n))
    }
    pub fn count_bounds(min: Option<i64>, max: Option<i64>) -> Result<Self> {
        let invalid = |reason: String| SchemaError::InvalidGuide { kind: GuideKind::Count, reason };
        if min.is_none() && max.is_none() {
            return Err(invalid("at least one bound is required".into()));
        }
        let to_usize = |bound: i64| {
            usize::try_from(bound).map_err(|_| invalid(format!("bound {bound} must not be negative")))
        };
        let min = min.map(to_usize).transpose()?;
        let max = max.map(to_usize).transpose()?;
        if let (Some(lo), Some(hi)) = (min, max) {
            if lo > hi {
                return Err(invalid(format!("min {lo} is greater than max {hi}")));
            }
        }
        Ok(Guide::Count { min, max })
    }

    pub fn choices<I, L>(literals: I) -> Result<Self>
    where
        I: IntoIterator<Item = L>,
        L: Into<Literal>,
    {
        let mut set = IndexSet::new();
        for literal in literals {
            let literal = literal.into();
            if let Literal::Number(n) = &literal {
                if !n.is_finite() {
                    return Err(SchemaError::InvalidGuide {
                        kind: GuideKind::Choices,
                        reason: format!("numeric choice {n} must be finite"),
                    });
                }
            }
            set.insert(literal);
        }
        if set.is_empty() {
            return Err(SchemaError::InvalidGuide {
                kind: GuideKind::Choices,
                reason: "at least one choice is required".into(),
            });
        }
        Ok(Guide::Choices(set))
    }
}

impl Pattern {
    pub fn new(source: &str) -> Result<Self> {
        let anchored = Regex::new(&format!("^(?:{source})$")).map_err(|error| {
            SchemaError::InvalidGuide { kind: GuideKind::Pattern, reason: error.to_string() }
        })?;
        Ok(Self { source: source.to_string(), anchored })
    }
    pub fn as_str(&self) -> &str {
        &self.source
    }
    pub fn is_match(&self, text: &str) -> bool {
        self.anchored.is_match(text)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

// ————————————————————————————————————————————————————————————————————————————
// QUERIES
// ————————————————————————————————————————————————————————————————————————————

impl Guide {
    pub fn kind(&self) -> GuideKind {
        match self {
            Guide::Range { .. } => GuideKind::Range,
            Guide::Pattern(_) => GuideKind::Pattern,
            Guide::Count { .. } => GuideKind::Count,
            Guide::Choices(_) => GuideKind::Choices,
        }
    }

    pub fn admits_number(&self, x: f64) -> bool {
        match self {
            Guide::Range { min, max } => {
                min.is_none_or(|lo| x >= lo) && max.is_none_or(|hi| x <= hi)
            }
            Guide::Choices(set) => set.contains(&Literal::Number(OrderedFloat(x))),
            _ => true,
        }
    }

    /// Like [`Guide::admits_number`], compared without rounding `i` to `f64`.
    pub fn admits_integer(&self, i: i64) -> bool {
        match self {
            Guide::Range { min, max } => {
                min.is_none_or(|lo| at_least(i, lo)) && max.is_none_or(|hi| at_most(i, hi))
            }
            Guide::Choices(set) => set.iter().any(|literal| match literal {
                Literal::Number(n) => at_least(i, n.0) && at_most(i, n.0),
                _ => false,
            }),
            _ => true,
        }
    }

    pub fn admits_string(&self, text: &str) -> bool {
        match self {
            Guide::Pattern(pattern) => pattern.is_match(text),
            Guide::Choices(set) => set.contains(&Literal::String(text.to_string())),
            _ => true,
        }
    }

    pub fn admits_bool(&self, b: bool) -> bool {
        match self {
            Guide::Choices(set) => set.contains(&Literal::Boolean(b)),
            _ => true,
        }
    }

    pub fn admits_len(&self, len: usize) -> bool {
        match self {
            Guide::Count { min, max } => {
                min.is_none_or(|lo| len >= lo) && max.is_none_or(|hi| len <= hi)
            }
            _ => true,
        }
    }

    /// JSON-Schema style keywords for this guide (`minimum`, `pattern`, `minItems`, `enum`).
    pub fn keywords(&self) -> Map<String, Value> {
        let mut out = Map::new();
        match self {
            Guide::Range { min, max } => {
                if let Some(lo) = min {
                    out.insert("minimum".into(), number_value(*lo));
                }
                if let Some(hi) = max {
                    out.insert("maximum".into(), number_value(*hi));
                }
            }
            Guide::Pattern(pattern) => {
                out.insert("pattern".into(), Value::from(pattern.as_str()));
            }
            Guide::Count { min, max } => {
                if let Some(lo) = min {
                    out.insert("minItems".into(), Value::from(*lo));
                }
                if let Some(hi) = max {
                    out.insert("maxItems".into(), Value::from(*hi));
                }
            }
            Guide::Choices(set) => {
                out.insert("enum".into(), Value::Array(set.iter().map(Literal::to_value).collect()));
            }
        }
        out
    }
}

impl Literal {
    pub fn to_value(&self) -> Value {
        match self {
            Literal::String(s) => Value::from(s.as_str()),
            Literal::Number(n) => number_value(n.0),
            Literal::Boolean(b) => Value::from(*b),
        }
    }

    /// Literal from a JSON scalar; `None` for null, arrays and objects.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Literal::String(s.clone())),
            Value::Bool(b) => Some(Literal::Boolean(*b)),
            Value::Number(n) => n.as_f64().map(|f| Literal::Number(OrderedFloat(f))),
            _ => None,
        }
    }
}

// 2^63 as f64; every integral float in [-2^63, 2^63) converts to i64 exactly.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

fn at_least(i: i64, lo: f64) -> bool {
    let lo = lo.ceil();
    if lo >= I64_BOUND {
        false
    } else if lo < -I64_BOUND {
        true
    } else {
        i >= lo as i64
    }
}

fn at_most(i: i64, hi: f64) -> bool {
    let hi = hi.floor();
    if hi >= I64_BOUND {
        true
    } else if hi < -I64_BOUND {
        false
    } else {
        i <= hi as i64
    }
}

/// Prefer an integer JSON number when the float is integral.
pub(crate) fn number_value(x: f64) -> Value {
    if x.fract() == 0.0 && x.is_finite() && x.abs() < (i64::MAX as f64) {
        Value::from(x as i64)
    } else {
        Value::from(x)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// CONVERSIONS & DISPLAY
// ————————————————————————————————————————————————————————————————————————————

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Literal::String(s.to_string())
    }
}
impl From<String> for Literal {
    fn from(s: String) -> Self {
        Literal::String(s)
    }
}
impl From<f64> for Literal {
    fn from(x: f64) -> Self {
        Literal::Number(OrderedFloat(x))
    }
}
impl From<i64> for Literal {
    fn from(x: i64) -> Self {
        Literal::Number(OrderedFloat(x as f64))
    }
}
impl From<bool> for Literal {
    fn from(b: bool) -> Self {
        Literal::Boolean(b)
    }
}

impl fmt::Display for GuideKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GuideKind::Range => "range",
            GuideKind::Pattern => "pattern",
            GuideKind::Count => "count",
            GuideKind::Choices => "choices",
        })
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_value())
    }
}

impl fmt::Display for Guide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn bound<T: fmt::Display>(b: &Option<T>) -> String {
            b.as_ref().map(|x| x.to_string()).unwrap_or_else(|| "..".into())
        }
        match self {
            Guide::Range { min, max } => write!(f, "range({}, {})", bound(min), bound(max)),
            Guide::Pattern(p) => write!(f, "pattern(/{}/)", p.as_str()),
            Guide::Count { min, max } => write!(f, "count({}, {})", bound(min), bound(max)),
            Guide::Choices(set) => {
                let items: Vec<String> = set.iter().map(|l| l.to_string()).collect();
                write!(f, "choices([{}])", items.join(", "))
            }
        }
    }
}

impl Serialize for GuideKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl Serialize for Guide {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.keywords().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inconsistent_parameters_are_rejected() {
        assert!(matches!(
            Guide::range(10.0, 5.0),
            Err(SchemaError::InvalidGuide { kind: GuideKind::Range, .. })
        ));
        assert!(matches!(
            Guide::count(-1, 3),
            Err(SchemaError::InvalidGuide { kind: GuideKind::Count, .. })
        ));
        assert!(matches!(
            Guide::choices(Vec::<Literal>::new()),
            Err(SchemaError::InvalidGuide { kind: GuideKind::Choices, .. })
        ));
        assert!(matches!(
            Guide::pattern("[unclosed"),
            Err(SchemaError::InvalidGuide { kind: GuideKind::Pattern, .. })
        ));
        assert!(Guide::range_bounds(None, None).is_err());
        assert!(Guide::range(f64::NAN, 1.0).is_err());
        assert!(Guide::minimum(f64::NEG_INFINITY).is_err());
        assert!(Guide::maximum(f64::INFINITY).is_err());
        assert!(Guide::choices([f64::INFINITY]).is_err());
    }

    #[test]
    fn integer_bounds_compare_without_rounding() {
        let range = Guide::range(0.0, 9_007_199_254_740_992.0).unwrap();
        assert!(range.admits_integer(9_007_199_254_740_992));
        assert!(!range.admits_integer(9_007_199_254_740_993));
        assert!(!range.admits_integer(-1));

        let fractional = Guide::range(0.5, 2.5).unwrap();
        assert!(!fractional.admits_integer(0));
        assert!(fractional.admits_integer(1));
        assert!(fractional.admits_integer(2));
        assert!(!fractional.admits_integer(3));

        let open = Guide::minimum(-1e300).unwrap();
        assert!(open.admits_integer(i64::MIN));
        assert!(!Guide::minimum(1e300).unwrap().admits_integer(i64::MAX));

        let choices = Guide::choices([Literal::from(1_i64), Literal::from(2.5)]).unwrap();
        assert!(choices.admits_integer(1));
        assert!(!choices.admits_integer(2));
    }

    #[test]
    fn pattern_matches_whole_string() {
        let guide = Guide::pattern("[A-Z]{3}-\\d+").unwrap();
        assert!(guide.admits_string("INV-42"));
        assert!(!guide.admits_string("xINV-42"));
        assert!(!guide.admits_string("INV-42 "));
    }

    #[test]
    fn choices_collapse_duplicates_in_order() {
        let guide = Guide::choices(["red", "green", "red"]).unwrap();
        let Guide::Choices(set) = &guide else { unreachable!() };
        let names: Vec<String> = set.iter().map(|l| l.to_string()).collect();
        assert_eq!(names, vec!["\"red\"", "\"green\""]);
    }

    #[test]
    fn bounds_are_inclusive() {
        let range = Guide::range(0.0, 10.0).unwrap();
        assert!(range.admits_number(0.0));
        assert!(range.admits_number(10.0));
        assert!(!range.admits_number(10.5));
        let count = Guide::count_at_least(2).unwrap();
        assert!(!count.admits_len(1));
        assert!(count.admits_len(200));
    }

    #[test]
    fn keywords_prefer_integers() {
        let range = Guide::range(0.0, 2.5).unwrap();
        assert_eq!(
            Value::Object(range.keywords()),
            serde_json::json!({ "minimum": 0, "maximum": 2.5 })
        );
    }
}
