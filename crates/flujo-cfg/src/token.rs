//! Lexer for the configuration text format.
//!
//! Produces a flat token stream with source positions. Comments are
//! consumed here so the parser never sees them.

use crate::error::CfgError;

/// One lexical token with its source position.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// Token payload.
    pub kind: TokenKind,
    /// 1-based source line.
    pub line: u32,
    /// 1-based source column.
    pub col: u32,
}

/// The payload of a [`Token`].
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `:`
    Colon,
    /// `,`
    Comma,
    /// Bare identifier (`[A-Za-z_][A-Za-z0-9_.]*`).
    Ident(String),
    /// Quoted string, escapes already resolved.
    Str(String),
    /// `true` / `false`.
    Bool(bool),
    /// Signed integer literal.
    Int(i64),
    /// `u`-suffixed or hex unsigned literal.
    UInt(u64),
    /// `f`-suffixed single-precision literal.
    Float(f32),
    /// Double-precision literal (decimal point or exponent, no suffix).
    Double(f64),
    /// End of input.
    Eof,
}

/// Character cursor with line/column tracking.
struct Cursor<'a> {
    src: &'a [u8],
    pos: usize,
    line: u32,
    col: u32,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Cursor {
            src: src.as_bytes(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn peek2(&self) -> Option<u8> {
        self.src.get(self.pos + 1).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let c = self.peek()?;
        self.pos += 1;
        if c == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn err(&self, msg: impl Into<String>) -> CfgError {
        CfgError::syntax(self.line, self.col, msg)
    }
}

/// Tokenizes `src`, returning the full stream terminated by `Eof`.
pub fn lex(src: &str) -> Result<Vec<Token>, CfgError> {
    let mut cur = Cursor::new(src);
    let mut out = Vec::new();

    loop {
        skip_space_and_comments(&mut cur)?;
        let (line, col) = (cur.line, cur.col);

        let Some(c) = cur.peek() else {
            out.push(Token {
                kind: TokenKind::Eof,
                line,
                col,
            });
            return Ok(out);
        };

        let kind = match c {
            b'{' => {
                cur.bump();
                TokenKind::LBrace
            }
            b'}' => {
                cur.bump();
                TokenKind::RBrace
            }
            b'[' => {
                cur.bump();
                TokenKind::LBracket
            }
            b']' => {
                cur.bump();
                TokenKind::RBracket
            }
            b':' => {
                cur.bump();
                TokenKind::Colon
            }
            b',' => {
                cur.bump();
                TokenKind::Comma
            }
            b'"' => lex_string(&mut cur)?,
            c if c.is_ascii_digit() || c == b'-' || c == b'+' || c == b'.' => lex_number(&mut cur)?,
            c if c.is_ascii_alphabetic() || c == b'_' => lex_ident(&mut cur),
            other => {
                return Err(cur.err(format!("unexpected character '{}'", other as char)));
            }
        };

        out.push(Token { kind, line, col });
    }
}

fn skip_space_and_comments(cur: &mut Cursor) -> Result<(), CfgError> {
    loop {
        match cur.peek() {
            Some(c) if c.is_ascii_whitespace() => {
                cur.bump();
            }
            Some(b'/') if cur.peek2() == Some(b'/') => {
                while let Some(c) = cur.peek() {
                    if c == b'\n' {
                        break;
                    }
                    cur.bump();
                }
            }
            Some(b'/') if cur.peek2() == Some(b'*') => {
                let (line, col) = (cur.line, cur.col);
                cur.bump();
                cur.bump();
                loop {
                    match cur.peek() {
                        Some(b'*') if cur.peek2() == Some(b'/') => {
                            cur.bump();
                            cur.bump();
                            break;
                        }
                        Some(_) => {
                            cur.bump();
                        }
                        None => {
                            return Err(CfgError::syntax(line, col, "unterminated block comment"));
                        }
                    }
                }
            }
            _ => return Ok(()),
        }
    }
}

fn lex_ident(cur: &mut Cursor) -> TokenKind {
    let mut s = String::new();
    while let Some(c) = cur.peek() {
        if c.is_ascii_alphanumeric() || c == b'_' || c == b'.' {
            s.push(c as char);
            cur.bump();
        } else {
            break;
        }
    }
    match s.as_str() {
        "true" => TokenKind::Bool(true),
        "false" => TokenKind::Bool(false),
        _ => TokenKind::Ident(s),
    }
}

fn lex_string(cur: &mut Cursor) -> Result<TokenKind, CfgError> {
    let (line, col) = (cur.line, cur.col);
    cur.bump(); // opening quote
    let mut bytes = Vec::new();
    loop {
        match cur.bump() {
            None => return Err(CfgError::syntax(line, col, "unterminated string")),
            Some(b'"') => {
                let s = String::from_utf8(bytes)
                    .map_err(|_| CfgError::syntax(line, col, "string is not valid UTF-8"))?;
                return Ok(TokenKind::Str(s));
            }
            Some(b'\\') => {
                let esc = cur
                    .bump()
                    .ok_or_else(|| CfgError::syntax(line, col, "unterminated escape"))?;
                bytes.push(match esc {
                    b'n' => b'\n',
                    b't' => b'\t',
                    b'r' => b'\r',
                    b'b' => 0x08,
                    b'f' => 0x0c,
                    b'"' => b'"',
                    b'\\' => b'\\',
                    other => {
                        return Err(cur.err(format!("unknown escape '\\{}'", other as char)));
                    }
                });
            }
            Some(c) => bytes.push(c),
        }
    }
}

fn lex_number(cur: &mut Cursor) -> Result<TokenKind, CfgError> {
    let (line, col) = (cur.line, cur.col);
    let mut s = String::new();

    if let Some(c @ (b'-' | b'+')) = cur.peek() {
        cur.bump();
        s.push(c as char);
    }

    // Hex literal.
    if cur.peek() == Some(b'0') && matches!(cur.peek2(), Some(b'x') | Some(b'X')) {
        cur.bump();
        cur.bump();
        let mut hex = String::new();
        while let Some(c) = cur.peek() {
            if c.is_ascii_hexdigit() {
                hex.push(c as char);
                cur.bump();
            } else {
                break;
            }
        }
        if hex.is_empty() {
            return Err(CfgError::syntax(line, col, "empty hex literal"));
        }
        let v = u64::from_str_radix(&hex, 16)
            .map_err(|_| CfgError::syntax(line, col, "hex literal out of range"))?;
        // An optional trailing 'u' is accepted; hex is unsigned either way.
        if cur.peek() == Some(b'u') {
            cur.bump();
        }
        if s.starts_with('-') {
            return Err(CfgError::syntax(line, col, "negative hex literal"));
        }
        return Ok(TokenKind::UInt(v));
    }

    let mut is_real = false;
    while let Some(c) = cur.peek() {
        match c {
            b'0'..=b'9' => {
                s.push(c as char);
                cur.bump();
            }
            b'.' => {
                is_real = true;
                s.push('.');
                cur.bump();
            }
            b'e' | b'E' => {
                is_real = true;
                s.push('e');
                cur.bump();
                if let Some(c @ (b'-' | b'+')) = cur.peek() {
                    cur.bump();
                    s.push(c as char);
                }
            }
            _ => break,
        }
    }

    if s.is_empty() || s == "-" || s == "+" || s == "." {
        return Err(CfgError::syntax(line, col, "malformed number"));
    }

    match cur.peek() {
        Some(b'f') => {
            cur.bump();
            let v: f32 = s
                .parse()
                .map_err(|_| CfgError::syntax(line, col, "malformed float literal"))?;
            Ok(TokenKind::Float(v))
        }
        Some(b'u') => {
            cur.bump();
            if is_real || s.starts_with('-') {
                return Err(CfgError::syntax(line, col, "malformed unsigned literal"));
            }
            let v: u64 = s
                .parse()
                .map_err(|_| CfgError::syntax(line, col, "unsigned literal out of range"))?;
            Ok(TokenKind::UInt(v))
        }
        _ if is_real => {
            let v: f64 = s
                .parse()
                .map_err(|_| CfgError::syntax(line, col, "malformed double literal"))?;
            Ok(TokenKind::Double(v))
        }
        _ => {
            let v: i64 = s
                .parse()
                .map_err(|_| CfgError::syntax(line, col, "integer literal out of range"))?;
            Ok(TokenKind::Int(v))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        lex(src).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_punctuation_and_idents() {
        assert_eq!(
            kinds("{ a: b }"),
            vec![
                TokenKind::LBrace,
                TokenKind::Ident("a".into()),
                TokenKind::Colon,
                TokenKind::Ident("b".into()),
                TokenKind::RBrace,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_number_kinds() {
        assert_eq!(kinds("42"), vec![TokenKind::Int(42), TokenKind::Eof]);
        assert_eq!(kinds("-7"), vec![TokenKind::Int(-7), TokenKind::Eof]);
        assert_eq!(kinds("42u"), vec![TokenKind::UInt(42), TokenKind::Eof]);
        assert_eq!(kinds("0x1f"), vec![TokenKind::UInt(31), TokenKind::Eof]);
        assert_eq!(kinds("1.5f"), vec![TokenKind::Float(1.5), TokenKind::Eof]);
        assert_eq!(kinds("1.5"), vec![TokenKind::Double(1.5), TokenKind::Eof]);
        assert_eq!(
            kinds("1e3"),
            vec![TokenKind::Double(1000.0), TokenKind::Eof]
        );
        assert_eq!(
            kinds("2.5e-2"),
            vec![TokenKind::Double(0.025), TokenKind::Eof]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            kinds(r#""a\nb\t\"c\\""#),
            vec![TokenKind::Str("a\nb\t\"c\\".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn test_comments_skipped() {
        assert_eq!(
            kinds("1 // line\n /* block\n spans */ 2"),
            vec![TokenKind::Int(1), TokenKind::Int(2), TokenKind::Eof]
        );
    }

    #[test]
    fn test_bool_keywords() {
        assert_eq!(
            kinds("true false truthy"),
            vec![
                TokenKind::Bool(true),
                TokenKind::Bool(false),
                TokenKind::Ident("truthy".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_dotted_ident() {
        assert_eq!(
            kinds("osc.out"),
            vec![TokenKind::Ident("osc.out".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn test_error_positions() {
        let err = lex("a:\n  @").unwrap_err();
        assert_eq!(
            err,
            CfgError::syntax(2, 3, "unexpected character '@'".to_string())
        );
    }

    #[test]
    fn test_unterminated_string() {
        assert!(matches!(
            lex("\"abc").unwrap_err(),
            CfgError::Syntax { .. }
        ));
    }

    #[test]
    fn test_unterminated_block_comment() {
        assert!(matches!(
            lex("/* nope").unwrap_err(),
            CfgError::Syntax { .. }
        ));
    }
}
