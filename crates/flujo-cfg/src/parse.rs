//! Recursive-descent parser over the token stream.
//!
//! The grammar is permissive about separators: commas between dictionary
//! pairs and list elements are accepted but not required, and a trailing
//! comma is fine. The root of a file is a dictionary, with or without the
//! surrounding braces.

use std::sync::Arc;

use crate::error::CfgError;
use crate::obj::{Obj, Scalar};
use crate::token::{Token, TokenKind, lex};

/// Parses configuration text into a tree.
///
/// The root is always a dictionary node.
pub fn parse(src: &str) -> Result<Arc<Obj>, CfgError> {
    let tokens = lex(src)?;
    let mut p = Parser { tokens, pos: 0 };

    let root = if p.peek() == &TokenKind::LBrace {
        let v = p.value()?;
        if !v.is_dict() {
            // Unreachable: an LBrace always parses to a dict.
            return Err(p.err_here("expected dictionary at root"));
        }
        v
    } else {
        Arc::new(Obj::Dict(p.dict_body(&TokenKind::Eof)?))
    };

    p.expect(&TokenKind::Eof)?;
    Ok(root)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &TokenKind {
        &self.tokens[self.pos].kind
    }

    fn bump(&mut self) -> TokenKind {
        let t = self.tokens[self.pos].kind.clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        t
    }

    fn here(&self) -> (u32, u32) {
        let t = &self.tokens[self.pos];
        (t.line, t.col)
    }

    fn err_here(&self, msg: impl Into<String>) -> CfgError {
        let (line, col) = self.here();
        CfgError::syntax(line, col, msg)
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<(), CfgError> {
        if self.peek() == kind {
            self.bump();
            Ok(())
        } else {
            Err(self.err_here(format!("expected {kind:?}, found {:?}", self.peek())))
        }
    }

    fn eat_comma(&mut self) {
        if self.peek() == &TokenKind::Comma {
            self.bump();
        }
    }

    /// Parses `label: value` pairs until the terminator token.
    fn dict_body(&mut self, term: &TokenKind) -> Result<Vec<(String, Arc<Obj>)>, CfgError> {
        let mut pairs: Vec<(String, Arc<Obj>)> = Vec::new();

        while self.peek() != term {
            let label = match self.bump() {
                TokenKind::Ident(s) | TokenKind::Str(s) => s,
                other => {
                    return Err(self.err_here(format!(
                        "expected dictionary label, found {other:?}"
                    )));
                }
            };

            if pairs.iter().any(|(k, _)| k == &label) {
                return Err(self.err_here(format!("duplicate dictionary label '{label}'")));
            }

            self.expect(&TokenKind::Colon)?;
            let value = self.value()?;
            pairs.push((label, value));
            self.eat_comma();
        }

        Ok(pairs)
    }

    fn value(&mut self) -> Result<Arc<Obj>, CfgError> {
        match self.bump() {
            TokenKind::LBrace => {
                let pairs = self.dict_body(&TokenKind::RBrace)?;
                self.expect(&TokenKind::RBrace)?;
                Ok(Arc::new(Obj::Dict(pairs)))
            }
            TokenKind::LBracket => {
                let mut items = Vec::new();
                while self.peek() != &TokenKind::RBracket {
                    items.push(self.value()?);
                    self.eat_comma();
                }
                self.expect(&TokenKind::RBracket)?;
                Ok(Arc::new(Obj::List(items)))
            }
            TokenKind::Bool(v) => Ok(Arc::new(Obj::Scalar(Scalar::Bool(v)))),
            TokenKind::Int(v) => Ok(Arc::new(Obj::Scalar(Scalar::Int(v)))),
            TokenKind::UInt(v) => Ok(Arc::new(Obj::Scalar(Scalar::UInt(v)))),
            TokenKind::Float(v) => Ok(Arc::new(Obj::Scalar(Scalar::Float(v)))),
            TokenKind::Double(v) => Ok(Arc::new(Obj::Scalar(Scalar::Double(v)))),
            TokenKind::Str(v) => Ok(Arc::new(Obj::Scalar(Scalar::Str(v)))),
            // A bare identifier in value position reads as a string; network
            // configurations use this for class labels and source references.
            TokenKind::Ident(v) => Ok(Arc::new(Obj::Scalar(Scalar::Str(v)))),
            other => Err(self.err_here(format!("expected value, found {other:?}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_braced_and_bare_root() {
        let a = parse("{ a: 1, b: 2 }").unwrap();
        let b = parse("a: 1\nb: 2").unwrap();
        assert_eq!(*a, *b);
    }

    #[test]
    fn test_nested_containers() {
        let root = parse("main: { osc: { hz: 440.0, taps: [1, 2, 3] } }").unwrap();
        let osc = root.get("main").unwrap().get("osc").unwrap();
        assert_eq!(osc.get_f64("hz").unwrap(), 440.0);
        let taps: Vec<i64> = osc
            .get("taps")
            .unwrap()
            .list_iter()
            .map(|o| o.as_i64().unwrap())
            .collect();
        assert_eq!(taps, vec![1, 2, 3]);
    }

    #[test]
    fn test_bare_ident_value_is_string() {
        let root = parse("class: sine_osc").unwrap();
        assert_eq!(root.get_str("class").unwrap(), "sine_osc");
    }

    #[test]
    fn test_optional_commas() {
        let a = parse("{ a: 1 b: 2 c: [1 2] }").unwrap();
        let b = parse("{ a: 1, b: 2, c: [1, 2], }").unwrap();
        assert_eq!(*a, *b);
    }

    #[test]
    fn test_duplicate_label_rejected() {
        assert!(matches!(
            parse("a: 1, a: 2").unwrap_err(),
            CfgError::Syntax { .. }
        ));
    }

    #[test]
    fn test_missing_colon_position() {
        let err = parse("a 1").unwrap_err();
        match err {
            CfgError::Syntax { line, col, .. } => {
                assert_eq!(line, 1);
                assert!(col >= 3);
            }
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn test_scalar_kinds_survive() {
        let root = parse("a: 1, b: 1u, c: 1.0f, d: 1.0, e: true, f: \"s\"").unwrap();
        assert!(matches!(**root.get("a").unwrap(), Obj::Scalar(Scalar::Int(1))));
        assert!(matches!(**root.get("b").unwrap(), Obj::Scalar(Scalar::UInt(1))));
        assert!(matches!(
            **root.get("c").unwrap(),
            Obj::Scalar(Scalar::Float(_))
        ));
        assert!(matches!(
            **root.get("d").unwrap(),
            Obj::Scalar(Scalar::Double(_))
        ));
        assert!(matches!(
            **root.get("e").unwrap(),
            Obj::Scalar(Scalar::Bool(true))
        ));
        assert!(matches!(**root.get("f").unwrap(), Obj::Scalar(Scalar::Str(_))));
    }
}
