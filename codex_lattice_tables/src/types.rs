// Scalar values stored in cyclic tables and derived record attributes.
//
// A `Scalar` is the only value shape the lattice deals in: an integer, a
// float, or a piece of text. Tables in `data/codex_tables.json` mix all
// three (solfeggio frequencies are integers, palettes are strings), so the
// JSON form is untagged: `1` parses as `Int`, `1.5` as `Float`, `"a"` as
// `Text`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One table cell or derived attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    /// Numeric view of the value. Integers widen to `f64`; text has none.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(v) => Some(*v as f64),
            Scalar::Float(v) => Some(*v),
            Scalar::Text(_) => None,
        }
    }

    /// Integer view of the value. Only `Int` qualifies; floats are never
    /// truncated implicitly.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int(v) => write!(f, "{v}"),
            Scalar::Float(v) => write!(f, "{v}"),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float(v)
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untagged_json_picks_narrowest_variant() {
        let values: Vec<Scalar> = serde_json::from_str(r#"[396, 1.5, "Earth"]"#).unwrap();
        assert_eq!(
            values,
            vec![Scalar::Int(396), Scalar::Float(1.5), Scalar::Text("Earth".into())]
        );
    }

    #[test]
    fn numeric_views() {
        assert_eq!(Scalar::Int(3).as_f64(), Some(3.0));
        assert_eq!(Scalar::Float(2.5).as_i64(), None);
        assert_eq!(Scalar::from("Fire").as_f64(), None);
        assert_eq!(Scalar::from("Fire").as_str(), Some("Fire"));
    }

    #[test]
    fn display_renders_bare_values() {
        assert_eq!(Scalar::Int(528).to_string(), "528");
        assert_eq!(Scalar::Float(0.25).to_string(), "0.25");
        assert_eq!(Scalar::from("Water").to_string(), "Water");
    }
}
