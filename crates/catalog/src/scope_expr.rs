//! Boolean expressions selecting scope overrides.
//!
//! Grammar (parsed once, at catalog load):
//!
//! ```text
//! expr    := and ('||' and)*
//! and     := unary ('&&' unary)*
//! unary   := '!' unary | '(' expr ')' | ident ('==' | '!=') literal
//! ident   := 'type' | 'widgetType' | 'mode'
//! literal := '...' | "..."
//! ```

use serde::Serialize;
use std::fmt;

/// Scope key an expression can test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeKey {
    /// Effective widget `type`.
    Type,
    /// Effective widget `mode`.
    Mode,
}

impl ScopeKey {
    /// Resolve a scope key from a setting name (`type`, `widgetType`, `mode`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "type" | "widgetType" | "widgettype" => Some(ScopeKey::Type),
            "mode" => Some(ScopeKey::Mode),
            _ => None,
        }
    }

    /// Setting name carrying this key.
    pub fn setting_name(self) -> &'static str {
        match self {
            ScopeKey::Type => "type",
            ScopeKey::Mode => "mode",
        }
    }
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.setting_name())
    }
}

/// Effective `{type, mode}` pair visible at a point of a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Scope {
    /// Widget type, lower-cased.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub widget_type: Option<String>,
    /// Widget mode, lower-cased.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

impl Scope {
    /// Build a scope from optional type and mode values.
    pub fn new(widget_type: Option<&str>, mode: Option<&str>) -> Self {
        Self {
            widget_type: widget_type.map(str::to_ascii_lowercase),
            mode: mode.map(str::to_ascii_lowercase),
        }
    }

    /// Value bound to `key`, if any.
    pub fn get(&self, key: ScopeKey) -> Option<&str> {
        match key {
            ScopeKey::Type => self.widget_type.as_deref(),
            ScopeKey::Mode => self.mode.as_deref(),
        }
    }

    /// Bind `key` to `value` (stored lower-cased).
    pub fn set(&mut self, key: ScopeKey, value: &str) {
        let value = Some(value.to_ascii_lowercase());
        match key {
            ScopeKey::Type => self.widget_type = value,
            ScopeKey::Mode => self.mode = value,
        }
    }
}

/// Parsed scope expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeExpr {
    /// `key == 'literal'`
    Eq(ScopeKey, String),
    /// `key != 'literal'`
    Ne(ScopeKey, String),
    /// `!expr`
    Not(Box<ScopeExpr>),
    /// `a && b`
    And(Box<ScopeExpr>, Box<ScopeExpr>),
    /// `a || b`
    Or(Box<ScopeExpr>, Box<ScopeExpr>),
}

impl ScopeExpr {
    /// Parse an expression.
    ///
    /// Returns a human-readable reason on failure.
    pub fn parse(source: &str) -> Result<Self, String> {
        let tokens = tokenize(source)?;
        let mut parser = Parser { tokens, pos: 0 };
        let expr = parser.or()?;
        match parser.tokens.get(parser.pos) {
            None => Ok(expr),
            Some(tok) => Err(format!("unexpected {tok} after expression")),
        }
    }

    /// Evaluate against a scope. An unset key compares unequal to every literal.
    pub fn eval(&self, scope: &Scope) -> bool {
        match self {
            ScopeExpr::Eq(key, lit) => scope.get(*key).is_some_and(|v| v.eq_ignore_ascii_case(lit)),
            ScopeExpr::Ne(key, lit) => !scope.get(*key).is_some_and(|v| v.eq_ignore_ascii_case(lit)),
            ScopeExpr::Not(inner) => !inner.eval(scope),
            ScopeExpr::And(a, b) => a.eval(scope) && b.eval(scope),
            ScopeExpr::Or(a, b) => a.eval(scope) || b.eval(scope),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Literal(String),
    EqEq,
    NotEq,
    Not,
    AndAnd,
    OrOr,
    LParen,
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(s) => write!(f, "identifier `{s}`"),
            Token::Literal(s) => write!(f, "literal '{s}'"),
            Token::EqEq => f.write_str("`==`"),
            Token::NotEq => f.write_str("`!=`"),
            Token::Not => f.write_str("`!`"),
            Token::AndAnd => f.write_str("`&&`"),
            Token::OrOr => f.write_str("`||`"),
            Token::LParen => f.write_str("`(`"),
            Token::RParen => f.write_str("`)`"),
        }
    }
}

fn tokenize(source: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();
    while let Some((at, c)) = chars.next() {
        let token = match c {
            c if c.is_whitespace() => continue,
            '(' => Token::LParen,
            ')' => Token::RParen,
            '=' if chars.next_if(|(_, n)| *n == '=').is_some() => Token::EqEq,
            '!' if chars.next_if(|(_, n)| *n == '=').is_some() => Token::NotEq,
            '!' => Token::Not,
            '&' if chars.next_if(|(_, n)| *n == '&').is_some() => Token::AndAnd,
            '|' if chars.next_if(|(_, n)| *n == '|').is_some() => Token::OrOr,
            '\'' | '"' => {
                let mut lit = String::new();
                loop {
                    match chars.next() {
                        Some((_, q)) if q == c => break,
                        Some((_, ch)) => lit.push(ch),
                        None => return Err(format!("unterminated literal at offset {at}")),
                    }
                }
                Token::Literal(lit)
            }
            c if c.is_ascii_alphabetic() => {
                let mut ident = String::from(c);
                while let Some((_, ch)) = chars.next_if(|(_, n)| n.is_ascii_alphanumeric() || *n == '_') {
                    ident.push(ch);
                }
                Token::Ident(ident)
            }
            other => return Err(format!("unexpected character `{other}` at offset {at}")),
        };
        tokens.push(token);
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        tok
    }

    fn or(&mut self) -> Result<ScopeExpr, String> {
        let mut lhs = self.and()?;
        while self.peek() == Some(&Token::OrOr) {
            self.pos += 1;
            let rhs = self.and()?;
            lhs = ScopeExpr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn and(&mut self) -> Result<ScopeExpr, String> {
        let mut lhs = self.unary()?;
        while self.peek() == Some(&Token::AndAnd) {
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = ScopeExpr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<ScopeExpr, String> {
        match self.next() {
            Some(Token::Not) => Ok(ScopeExpr::Not(Box::new(self.unary()?))),
            Some(Token::LParen) => {
                let inner = self.or()?;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    Some(tok) => Err(format!("expected `)`, found {tok}")),
                    None => Err("expected `)`, found end of expression".into()),
                }
            }
            Some(Token::Ident(name)) => {
                let key = ScopeKey::from_name(&name)
                    .ok_or_else(|| format!("unknown scope key `{name}`"))?;
                let negated = match self.next() {
                    Some(Token::EqEq) => false,
                    Some(Token::NotEq) => true,
                    Some(tok) => return Err(format!("expected `==` or `!=`, found {tok}")),
                    None => return Err("expected `==` or `!=`, found end of expression".into()),
                };
                let lit = match self.next() {
                    Some(Token::Literal(lit)) => lit,
                    Some(tok) => return Err(format!("expected literal, found {tok}")),
                    None => return Err("expected literal, found end of expression".into()),
                };
                Ok(if negated {
                    ScopeExpr::Ne(key, lit)
                } else {
                    ScopeExpr::Eq(key, lit)
                })
            }
            Some(tok) => Err(format!("unexpected {tok}")),
            None => Err("unexpected end of expression".into()),
        }
    }
}
