//! Lexer and recursive-descent parser for the restricted expression grammar.
//!
//! Input arrives as template segments: literal text to be tokenized, and
//! placeholders that have already been turned into column references. The
//! lexer only knows literals, operators, parentheses, commas and the
//! [`Function`] allowlist; anything else is rejected with
//! [`Error::UnsupportedExpressionToken`]. Precedence, lowest first:
//!
//! ```text
//! or  ->  and  ->  not  ->  comparison  ->  + -  ->  * / // %  ->  unary -  ->  **  ->  atom
//! ```
//!
//! Nesting (parentheses, call arguments, prefix operators, exponents) is
//! limited to [`MAX_NESTING`] levels.

use crate::error::{Error, Result};
use crate::expr::{arity_text, BinOp, Expr, Function, UnaryOp};
use crate::template::Segment;
use crate::types::Scalar;

/// Deepest nesting the parser accepts before reporting a syntax error.
pub const MAX_NESTING: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Column(String),
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Null,
    Func(Function),
    LParen,
    RParen,
    Comma,
    Op(BinOp),
    Not,
}

/// A token and the byte offset in the template where it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub position: usize,
}

/// Tokenize a scanned template.
pub fn tokenize(segments: &[Segment<'_>]) -> Result<Vec<Spanned>> {
    let mut out = Vec::new();
    for seg in segments {
        match seg {
            Segment::Text { text, offset } => lex_text(text, *offset, &mut out)?,
            Segment::Placeholder { name, offset } => out.push(Spanned {
                token: Token::Column((*name).to_string()),
                position: *offset,
            }),
        }
    }
    Ok(out)
}

/// Parse a scanned template into an expression tree.
pub fn parse_segments(segments: &[Segment<'_>]) -> Result<Expr> {
    let tokens = tokenize(segments)?;
    let end = segments
        .last()
        .map(|s| match s {
            Segment::Text { text, offset } => offset + text.len(),
            Segment::Placeholder { name, offset } => offset + name.len() + 2,
        })
        .unwrap_or(0);
    let mut parser = Parser {
        tokens,
        pos: 0,
        end,
        depth: 0,
    };
    if parser.tokens.is_empty() {
        return Err(syntax(0, "empty expression"));
    }
    let expr = parser.parse_or()?;
    if let Some(tok) = parser.peek() {
        return Err(syntax(
            tok.position,
            format!("unexpected {} after complete expression", describe(&tok.token)),
        ));
    }
    Ok(expr)
}

fn syntax(position: usize, message: impl Into<String>) -> Error {
    Error::ExpressionSyntax {
        position,
        message: message.into(),
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn lex_text(text: &str, base: usize, out: &mut Vec<Spanned>) -> Result<()> {
    let mut i = 0;
    while let Some(c) = text[i..].chars().next() {
        let rest = &text[i..];
        let position = base + i;

        if c.is_whitespace() {
            i += c.len_utf8();
            continue;
        }

        let (token, len) = if c.is_ascii_digit() {
            lex_number(rest, position)?
        } else if c == '\'' || c == '"' {
            lex_string(rest, position)?
        } else if c.is_alphabetic() || c == '_' {
            let len = rest.find(|ch: char| !is_ident_char(ch)).unwrap_or(rest.len());
            (lex_word(&rest[..len], position)?, len)
        } else if let Some(two) = rest.get(..2).and_then(BinOp::parse) {
            (Token::Op(two), 2)
        } else {
            let token = match c {
                '(' => Token::LParen,
                ')' => Token::RParen,
                ',' => Token::Comma,
                '!' | '~' => Token::Not,
                _ => match BinOp::parse(&rest[..c.len_utf8()]) {
                    Some(op) => Token::Op(op),
                    None => {
                        return Err(Error::UnsupportedExpressionToken {
                            token: c.to_string(),
                            position,
                        })
                    }
                },
            };
            (token, c.len_utf8())
        };
        out.push(Spanned { token, position });
        i += len;
    }
    Ok(())
}

fn lex_word(word: &str, position: usize) -> Result<Token> {
    match word {
        "true" | "True" => return Ok(Token::Bool(true)),
        "false" | "False" => return Ok(Token::Bool(false)),
        "null" | "None" => return Ok(Token::Null),
        _ => {}
    }
    if word.eq_ignore_ascii_case("not") {
        return Ok(Token::Not);
    }
    if let Some(op) = BinOp::parse(word) {
        return Ok(Token::Op(op));
    }
    Function::lookup(word)
        .map(Token::Func)
        .ok_or_else(|| Error::UnsupportedExpressionToken {
            token: word.to_string(),
            position,
        })
}

fn lex_number(rest: &str, position: usize) -> Result<(Token, usize)> {
    let bytes = rest.as_bytes();
    let digits = |from: usize| {
        bytes[from..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };

    let mut len = digits(0);
    let mut is_float = false;
    if bytes.get(len) == Some(&b'.') && bytes.get(len + 1).is_some_and(u8::is_ascii_digit) {
        len += 1 + digits(len + 1);
        is_float = true;
    }
    if matches!(bytes.get(len), Some(b'e' | b'E')) {
        let sign = usize::from(matches!(bytes.get(len + 1), Some(b'+' | b'-')));
        let exp = digits(len + 1 + sign);
        if exp > 0 {
            len += 1 + sign + exp;
            is_float = true;
        }
    }

    let text = &rest[..len];
    let token = if is_float {
        Token::Float(
            text.parse()
                .map_err(|_| syntax(position, format!("invalid float literal '{text}'")))?,
        )
    } else {
        Token::Int(
            text.parse()
                .map_err(|_| syntax(position, format!("integer literal '{text}' out of range")))?,
        )
    };
    Ok((token, len))
}

fn lex_string(rest: &str, position: usize) -> Result<(Token, usize)> {
    let mut chars = rest.char_indices();
    let quote = match chars.next() {
        Some((_, q)) => q,
        None => return Err(syntax(position, "empty string literal")),
    };
    let mut value = String::new();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => {
                let escaped = match chars.next() {
                    Some((_, 'n')) => '\n',
                    Some((_, 't')) => '\t',
                    Some((_, 'r')) => '\r',
                    Some((_, '0')) => '\0',
                    Some((_, ch @ ('\\' | '\'' | '"'))) => ch,
                    Some((j, other)) => {
                        return Err(syntax(
                            position + j,
                            format!("unknown escape sequence '\\{other}'"),
                        ))
                    }
                    None => break,
                };
                value.push(escaped);
            }
            c if c == quote => return Ok((Token::Str(value), i + c.len_utf8())),
            c => value.push(c),
        }
    }
    Err(syntax(position, "unterminated string literal"))
}

fn describe(token: &Token) -> String {
    match token {
        Token::Column(name) => format!("column {{{name}}}"),
        Token::Int(v) => format!("integer {v}"),
        Token::Float(v) => format!("float {v}"),
        Token::Str(s) => format!("string {s:?}"),
        Token::Bool(b) => format!("boolean {b}"),
        Token::Null => "null".into(),
        Token::Func(f) => format!("function '{}'", f.name()),
        Token::LParen => "'('".into(),
        Token::RParen => "')'".into(),
        Token::Comma => "','".into(),
        Token::Op(op) => format!("operator '{}'", op.symbol()),
        Token::Not => "'not'".into(),
    }
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    end: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Spanned> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Spanned> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn peek_op(&self) -> Option<BinOp> {
        match self.peek() {
            Some(Spanned {
                token: Token::Op(op),
                ..
            }) => Some(*op),
            _ => None,
        }
    }

    fn expect(&mut self, want: Token, what: &str) -> Result<()> {
        match self.next() {
            Some(tok) if tok.token == want => Ok(()),
            Some(tok) => Err(syntax(
                tok.position,
                format!("expected {what}, found {}", describe(&tok.token)),
            )),
            None => Err(syntax(self.end, format!("expected {what}, found end of input"))),
        }
    }

    /// Run `parse` one nesting level deeper.
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= MAX_NESTING {
            let position = self.peek().map_or(self.end, |t| t.position);
            return Err(syntax(
                position,
                format!("expression nests deeper than {MAX_NESTING} levels"),
            ));
        }
        self.depth += 1;
        let out = parse(self);
        self.depth -= 1;
        out
    }

    /// Parse a left-associative chain of the given operators.
    fn binary_chain(
        &mut self,
        ops: &[BinOp],
        operand: fn(&mut Self) -> Result<Expr>,
    ) -> Result<Expr> {
        let mut left = operand(self)?;
        while let Some(op) = self.peek_op().filter(|op| ops.contains(op)) {
            self.pos += 1;
            let right = operand(self)?;
            left = Expr::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_or(&mut self) -> Result<Expr> {
        self.nested(|p| p.binary_chain(&[BinOp::Or], Self::parse_and))
    }

    fn parse_and(&mut self) -> Result<Expr> {
        self.binary_chain(&[BinOp::And], Self::parse_not)
    }

    fn parse_not(&mut self) -> Result<Expr> {
        if matches!(self.peek(), Some(Spanned { token: Token::Not, .. })) {
            self.pos += 1;
            let arg = self.nested(Self::parse_not)?;
            return Ok(Expr::UnaryOp {
                op: UnaryOp::Not,
                arg: Box::new(arg),
            });
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr> {
        let left = self.parse_additive()?;
        let Some(op) = self.peek_op().filter(BinOp::is_comparison) else {
            return Ok(left);
        };
        self.pos += 1;
        let right = self.parse_additive()?;
        if let Some(tok) = self.peek() {
            if matches!(&tok.token, Token::Op(next) if next.is_comparison()) {
                return Err(syntax(
                    tok.position,
                    "chained comparisons are not supported; combine them with 'and'",
                ));
            }
        }
        Ok(Expr::binary(op, left, right))
    }

    fn parse_additive(&mut self) -> Result<Expr> {
        self.binary_chain(&[BinOp::Add, BinOp::Sub], Self::parse_multiplicative)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr> {
        self.binary_chain(
            &[BinOp::Mul, BinOp::Div, BinOp::FloorDiv, BinOp::Mod],
            Self::parse_unary,
        )
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        match self.peek_op() {
            Some(BinOp::Sub) => {
                self.pos += 1;
                let arg = self.nested(Self::parse_unary)?;
                Ok(Expr::UnaryOp {
                    op: UnaryOp::Neg,
                    arg: Box::new(arg),
                })
            }
            Some(BinOp::Add) => {
                self.pos += 1;
                self.nested(Self::parse_unary)
            }
            _ => self.parse_power(),
        }
    }

    fn parse_power(&mut self) -> Result<Expr> {
        let base = self.parse_atom()?;
        if self.peek_op() == Some(BinOp::Pow) {
            self.pos += 1;
            // Right-associative, and binds tighter than a unary minus on its left.
            let exponent = self.nested(Self::parse_unary)?;
            return Ok(Expr::binary(BinOp::Pow, base, exponent));
        }
        Ok(base)
    }

    fn parse_atom(&mut self) -> Result<Expr> {
        let Some(Spanned { token, position }) = self.next() else {
            return Err(syntax(self.end, "unexpected end of expression"));
        };
        match token {
            Token::Column(name) => Ok(Expr::Column(name)),
            Token::Int(v) => Ok(Expr::Literal(Scalar::I64(v))),
            Token::Float(v) => Ok(Expr::Literal(Scalar::F64(v))),
            Token::Str(s) => Ok(Expr::Literal(Scalar::Str(s))),
            Token::Bool(b) => Ok(Expr::Literal(Scalar::Bool(b))),
            Token::Null => Ok(Expr::Literal(Scalar::Null)),
            Token::LParen => {
                let inner = self.parse_or()?;
                self.expect(Token::RParen, "')'")?;
                Ok(inner)
            }
            Token::Func(func) => self.parse_call(func, position),
            other => Err(syntax(
                position,
                format!("unexpected {}", describe(&other)),
            )),
        }
    }

    fn parse_call(&mut self, func: Function, position: usize) -> Result<Expr> {
        self.expect(Token::LParen, &format!("'(' after '{}'", func.name()))?;
        let mut args = Vec::new();
        if matches!(self.peek(), Some(Spanned { token: Token::RParen, .. })) {
            self.pos += 1;
        } else {
            loop {
                args.push(self.parse_or()?);
                match self.next() {
                    Some(Spanned {
                        token: Token::Comma,
                        ..
                    }) => continue,
                    Some(Spanned {
                        token: Token::RParen,
                        ..
                    }) => break,
                    Some(tok) => {
                        return Err(syntax(
                            tok.position,
                            format!("expected ',' or ')', found {}", describe(&tok.token)),
                        ))
                    }
                    None => return Err(syntax(self.end, "unclosed function call")),
                }
            }
        }

        let (min, max) = func.arity();
        if args.len() < min || max.is_some_and(|max| args.len() > max) {
            return Err(syntax(
                position,
                format!(
                    "{}() takes {} argument(s), got {}",
                    func.name(),
                    arity_text(min, max),
                    args.len()
                ),
            ));
        }
        Ok(Expr::Call { func, args })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Expr> {
        parse_segments(&[Segment::Text { text, offset: 0 }])
    }

    #[test]
    fn precedence() {
        let e = parse("1 + 2 * 3").unwrap();
        assert_eq!(
            e,
            Expr::binary(
                BinOp::Add,
                Expr::lit(1i64),
                Expr::binary(BinOp::Mul, Expr::lit(2i64), Expr::lit(3i64))
            )
        );
    }

    #[test]
    fn power_binds_tighter_than_negation() {
        let e = parse("-2 ** 2").unwrap();
        assert_eq!(
            e,
            Expr::UnaryOp {
                op: UnaryOp::Neg,
                arg: Box::new(Expr::binary(BinOp::Pow, Expr::lit(2i64), Expr::lit(2i64))),
            }
        );
    }

    #[test]
    fn keywords_and_aliases() {
        assert_eq!(parse("true and not false").unwrap(), parse("True & ~False").unwrap());
        assert_eq!(parse("1 = 1").unwrap(), parse("1 == 1").unwrap());
    }

    #[test]
    fn numbers_and_strings() {
        let toks = tokenize(&[Segment::Text {
            text: "12 1.5 2e3 'a\\'b' \"c\"",
            offset: 0,
        }])
        .unwrap();
        let kinds: Vec<_> = toks.into_iter().map(|t| t.token).collect();
        assert_eq!(
            kinds,
            vec![
                Token::Int(12),
                Token::Float(1.5),
                Token::Float(2000.0),
                Token::Str("a'b".into()),
                Token::Str("c".into()),
            ]
        );
    }

    #[test]
    fn rejects_identifiers_outside_the_allowlist() {
        for (text, bad) in [
            ("__import__('os')", "__import__"),
            ("pl.col('a')", "pl"),
            ("1 ; 2", ";"),
            ("abs(1).x", "."),
            ("[1]", "["),
        ] {
            match parse(text) {
                Err(Error::UnsupportedExpressionToken { token, .. }) => assert_eq!(token, bad),
                other => panic!("{text}: unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn structural_errors() {
        for text in ["", "1 +", "(1", "abs 1", "abs()", "pow(1)", "1 < 2 < 3", "'open", "1 2"] {
            assert!(
                matches!(parse(text), Err(Error::ExpressionSyntax { .. })),
                "{text}"
            );
        }
    }

    #[test]
    fn positions_account_for_segment_offsets() {
        let err = parse_segments(&[
            Segment::Placeholder {
                name: "a",
                offset: 0,
            },
            Segment::Text {
                text: " $ 1",
                offset: 3,
            },
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedExpressionToken { position: 4, .. }
        ));
    }

    #[test]
    fn power_is_right_associative() {
        assert_eq!(
            parse("2 ** 3 ** 2").unwrap(),
            Expr::binary(
                BinOp::Pow,
                Expr::lit(2i64),
                Expr::binary(BinOp::Pow, Expr::lit(3i64), Expr::lit(2i64))
            )
        );
    }

    #[test]
    fn nesting_limit() {
        let ok = format!("{}1{}", "(".repeat(100), ")".repeat(100));
        assert_eq!(parse(&ok).unwrap(), Expr::lit(1i64));

        for text in [
            format!("{}1{}", "(".repeat(300), ")".repeat(300)),
            format!("{}true", "not ".repeat(300)),
            format!("{}1", "-".repeat(300)),
            format!("{}1{}", "abs(".repeat(300), ")".repeat(300)),
            vec!["2"; 300].join(" ** "),
        ] {
            match parse(&text) {
                Err(Error::ExpressionSyntax { message, .. }) => {
                    assert!(message.contains("nests deeper"), "{message}")
                }
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn deep_input_does_not_overflow() {
        let text = "(".repeat(50_000);
        assert!(matches!(parse(&text), Err(Error::ExpressionSyntax { .. })));
    }
}
