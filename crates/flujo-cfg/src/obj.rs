//! The configuration tree model.
//!
//! Nodes are immutable once parsed and shared via [`Arc`]. Dictionary
//! members preserve source order, which downstream consumers rely on for
//! deterministic construction order.

use std::fmt::Write as _;
use std::sync::Arc;

use crate::error::CfgError;

/// A scalar leaf of the configuration tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// `true` / `false`.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Unsigned integer (`u` suffix or hex literal).
    UInt(u64),
    /// Single-precision float (`f` suffix).
    Float(f32),
    /// Double-precision float.
    Double(f64),
    /// Quoted string.
    Str(String),
}

/// A node of the configuration tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Obj {
    /// Ordered `label: value` pairs.
    Dict(Vec<(String, Arc<Obj>)>),
    /// Ordered values.
    List(Vec<Arc<Obj>>),
    /// A scalar leaf.
    Scalar(Scalar),
}

impl Obj {
    // --- Builders (used by tests and programmatic configuration) ---

    /// Builds a dictionary node.
    pub fn dict(pairs: Vec<(&str, Arc<Obj>)>) -> Arc<Obj> {
        Arc::new(Obj::Dict(
            pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
        ))
    }

    /// Builds a list node.
    pub fn list(items: Vec<Arc<Obj>>) -> Arc<Obj> {
        Arc::new(Obj::List(items))
    }

    /// Builds a bool leaf.
    pub fn bool(v: bool) -> Arc<Obj> {
        Arc::new(Obj::Scalar(Scalar::Bool(v)))
    }

    /// Builds a signed-integer leaf.
    pub fn int(v: i64) -> Arc<Obj> {
        Arc::new(Obj::Scalar(Scalar::Int(v)))
    }

    /// Builds an unsigned-integer leaf.
    pub fn uint(v: u64) -> Arc<Obj> {
        Arc::new(Obj::Scalar(Scalar::UInt(v)))
    }

    /// Builds a single-precision leaf.
    pub fn float(v: f32) -> Arc<Obj> {
        Arc::new(Obj::Scalar(Scalar::Float(v)))
    }

    /// Builds a double-precision leaf.
    pub fn double(v: f64) -> Arc<Obj> {
        Arc::new(Obj::Scalar(Scalar::Double(v)))
    }

    /// Builds a string leaf.
    pub fn str(v: &str) -> Arc<Obj> {
        Arc::new(Obj::Scalar(Scalar::Str(v.to_string())))
    }

    // --- Kind queries ---

    /// True if this node is a dictionary.
    pub fn is_dict(&self) -> bool {
        matches!(self, Obj::Dict(_))
    }

    /// True if this node is a list.
    pub fn is_list(&self) -> bool {
        matches!(self, Obj::List(_))
    }

    /// True if this node is a scalar leaf.
    pub fn is_scalar(&self) -> bool {
        matches!(self, Obj::Scalar(_))
    }

    // --- Dictionary access ---

    /// Looks up a dictionary member, `None` if absent or not a dict.
    pub fn member(&self, label: &str) -> Option<&Arc<Obj>> {
        match self {
            Obj::Dict(pairs) => pairs.iter().find(|(k, _)| k == label).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Looks up a required dictionary member.
    pub fn get(&self, label: &str) -> Result<&Arc<Obj>, CfgError> {
        self.member(label)
            .ok_or_else(|| CfgError::NotFound(label.to_string()))
    }

    /// Iterates `(label, value)` pairs of a dictionary in source order.
    pub fn dict_iter(&self) -> impl Iterator<Item = (&str, &Arc<Obj>)> {
        let pairs: &[(String, Arc<Obj>)] = match self {
            Obj::Dict(pairs) => pairs,
            _ => &[],
        };
        pairs.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterates the elements of a list in order.
    pub fn list_iter(&self) -> impl Iterator<Item = &Arc<Obj>> {
        let items: &[Arc<Obj>] = match self {
            Obj::List(items) => items,
            _ => &[],
        };
        items.iter()
    }

    /// Member / element count of a container, 0 for scalars.
    pub fn len(&self) -> usize {
        match self {
            Obj::Dict(pairs) => pairs.len(),
            Obj::List(items) => items.len(),
            Obj::Scalar(_) => 0,
        }
    }

    /// True if this node is an empty container or a scalar.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // --- Scalar access (numeric kinds coerce among each other) ---

    /// Reads this leaf as `bool`.
    pub fn as_bool(&self) -> Result<bool, CfgError> {
        match self {
            Obj::Scalar(Scalar::Bool(v)) => Ok(*v),
            Obj::Scalar(Scalar::Int(v)) => Ok(*v != 0),
            Obj::Scalar(Scalar::UInt(v)) => Ok(*v != 0),
            other => Err(other.wrong_type("bool")),
        }
    }

    /// Reads this leaf as `i64`.
    pub fn as_i64(&self) -> Result<i64, CfgError> {
        match self {
            Obj::Scalar(Scalar::Int(v)) => Ok(*v),
            Obj::Scalar(Scalar::UInt(v)) => Ok(*v as i64),
            Obj::Scalar(Scalar::Bool(v)) => Ok(i64::from(*v)),
            Obj::Scalar(Scalar::Float(v)) => Ok(*v as i64),
            Obj::Scalar(Scalar::Double(v)) => Ok(*v as i64),
            other => Err(other.wrong_type("int")),
        }
    }

    /// Reads this leaf as `u64`.
    pub fn as_u64(&self) -> Result<u64, CfgError> {
        match self {
            Obj::Scalar(Scalar::UInt(v)) => Ok(*v),
            Obj::Scalar(Scalar::Int(v)) if *v >= 0 => Ok(*v as u64),
            Obj::Scalar(Scalar::Bool(v)) => Ok(u64::from(*v)),
            other => Err(other.wrong_type("uint")),
        }
    }

    /// Reads this leaf as `f32`.
    pub fn as_f32(&self) -> Result<f32, CfgError> {
        Ok(self.as_f64()? as f32)
    }

    /// Reads this leaf as `f64`.
    pub fn as_f64(&self) -> Result<f64, CfgError> {
        match self {
            Obj::Scalar(Scalar::Double(v)) => Ok(*v),
            Obj::Scalar(Scalar::Float(v)) => Ok(f64::from(*v)),
            Obj::Scalar(Scalar::Int(v)) => Ok(*v as f64),
            Obj::Scalar(Scalar::UInt(v)) => Ok(*v as f64),
            Obj::Scalar(Scalar::Bool(v)) => Ok(f64::from(u8::from(*v))),
            other => Err(other.wrong_type("double")),
        }
    }

    /// Reads this leaf as a string slice.
    pub fn as_str(&self) -> Result<&str, CfgError> {
        match self {
            Obj::Scalar(Scalar::Str(v)) => Ok(v.as_str()),
            other => Err(other.wrong_type("string")),
        }
    }

    // --- Typed member shorthands ---

    /// Reads a required `bool` member of a dictionary.
    pub fn get_bool(&self, label: &str) -> Result<bool, CfgError> {
        self.get(label)?.as_bool()
    }

    /// Reads a required `i64` member of a dictionary.
    pub fn get_i64(&self, label: &str) -> Result<i64, CfgError> {
        self.get(label)?.as_i64()
    }

    /// Reads a required `u64` member of a dictionary.
    pub fn get_u64(&self, label: &str) -> Result<u64, CfgError> {
        self.get(label)?.as_u64()
    }

    /// Reads a required `f64` member of a dictionary.
    pub fn get_f64(&self, label: &str) -> Result<f64, CfgError> {
        self.get(label)?.as_f64()
    }

    /// Reads a required string member of a dictionary.
    pub fn get_str(&self, label: &str) -> Result<&str, CfgError> {
        self.get(label)?.as_str()
    }

    // --- Serialization ---

    /// Serializes the tree to text that re-parses structurally equal.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        self.write(&mut out, 0);
        out.push('\n');
        out
    }

    fn write(&self, out: &mut String, indent: usize) {
        match self {
            Obj::Scalar(s) => s.write(out),
            Obj::List(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    item.write(out, indent);
                }
                out.push(']');
            }
            Obj::Dict(pairs) => {
                if pairs.is_empty() {
                    out.push_str("{}");
                    return;
                }
                out.push_str("{\n");
                for (k, v) in pairs {
                    for _ in 0..=indent {
                        out.push_str("  ");
                    }
                    if is_bare_ident(k) {
                        out.push_str(k);
                    } else {
                        write_escaped(out, k);
                    }
                    out.push_str(": ");
                    v.write(out, indent + 1);
                    out.push_str(",\n");
                }
                for _ in 0..indent {
                    out.push_str("  ");
                }
                out.push('}');
            }
        }
    }

    fn wrong_type(&self, want: &str) -> CfgError {
        let got = match self {
            Obj::Dict(_) => "dict",
            Obj::List(_) => "list",
            Obj::Scalar(Scalar::Bool(_)) => "bool",
            Obj::Scalar(Scalar::Int(_)) => "int",
            Obj::Scalar(Scalar::UInt(_)) => "uint",
            Obj::Scalar(Scalar::Float(_)) => "float",
            Obj::Scalar(Scalar::Double(_)) => "double",
            Obj::Scalar(Scalar::Str(_)) => "string",
        };
        CfgError::WrongType(format!("expected {want}, found {got}"))
    }
}

impl Scalar {
    fn write(&self, out: &mut String) {
        match self {
            Scalar::Bool(v) => {
                let _ = write!(out, "{v}");
            }
            Scalar::Int(v) => {
                let _ = write!(out, "{v}");
            }
            Scalar::UInt(v) => {
                let _ = write!(out, "{v}u");
            }
            Scalar::Float(v) => {
                write_real(out, f64::from(*v));
                out.push('f');
            }
            Scalar::Double(v) => write_real(out, *v),
            Scalar::Str(v) => write_escaped(out, v),
        }
    }
}

/// Writes a real number so it lexes back as a real (never a bare integer).
fn write_real(out: &mut String, v: f64) {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1.0e15 {
        let _ = write!(out, "{v:.1}");
    } else {
        let _ = write!(out, "{v}");
    }
}

fn write_escaped(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            other => out.push(other),
        }
    }
    out.push('"');
}

fn is_bare_ident(s: &str) -> bool {
    // "true"/"false" lex as bool tokens, so they must stay quoted.
    if s == "true" || s == "false" {
        return false;
    }
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Arc<Obj> {
        Obj::dict(vec![
            (
                "main",
                Obj::dict(vec![
                    (
                        "osc",
                        Obj::dict(vec![
                            ("class", Obj::str("sine_osc")),
                            ("hz", Obj::double(440.0)),
                            ("gain", Obj::float(0.5)),
                            ("on", Obj::bool(true)),
                        ]),
                    ),
                    ("order", Obj::list(vec![Obj::int(1), Obj::int(2)])),
                ]),
            ),
            ("count", Obj::uint(3)),
        ])
    }

    #[test]
    fn test_member_lookup() {
        let root = sample();
        let osc = root.get("main").unwrap().get("osc").unwrap();
        assert_eq!(osc.get_str("class").unwrap(), "sine_osc");
        assert_eq!(osc.get_f64("hz").unwrap(), 440.0);
        assert!(osc.get("missing").is_err());
    }

    #[test]
    fn test_dict_order_preserved() {
        let root = sample();
        let main = root.get("main").unwrap();
        let keys: Vec<&str> = main.dict_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["osc", "order"]);
    }

    #[test]
    fn test_numeric_coercion_on_read() {
        let n = Obj::int(3);
        assert_eq!(n.as_f64().unwrap(), 3.0);
        assert_eq!(n.as_u64().unwrap(), 3);
        assert!(Obj::int(-1).as_u64().is_err());
        assert!(Obj::str("x").as_f64().is_err());
    }

    #[test]
    fn test_serialize_reparse_equal() {
        let root = sample();
        let text = root.to_text();
        let back = crate::parse(&text).unwrap();
        assert_eq!(*root, *back);
    }

    #[test]
    fn test_real_serialization_keeps_kind() {
        // A whole-valued double must not re-lex as an integer.
        let root = Obj::dict(vec![("x", Obj::double(2.0)), ("y", Obj::float(4.0))]);
        let back = crate::parse(&root.to_text()).unwrap();
        assert_eq!(*root, *back);
    }
}
