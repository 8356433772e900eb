//! In-process arithmetic evaluation
//!
//! A small tokenizer and recursive-descent parser over plain arithmetic,
//! percentages ("15% of 1500") and spelled-out operators ("3 times 4").
//! Evaluation happens entirely in-process, so the calculator path never
//! leaves the worker.

use super::{ToolAdapter, ToolError, ToolOptions};
use async_trait::async_trait;
use relay_core::{Evidence, ToolKind};
use thiserror::Error;

/// Errors from expression parsing and evaluation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    /// Input is not an arithmetic expression
    #[error("not an arithmetic expression: {0}")]
    Parse(String),
    /// Division by zero or a non-finite intermediate
    #[error("expression is not computable: {0}")]
    Math(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Percent,
    Of,
    LParen,
    RParen,
}

/// Replace spelled-out operators and strip question phrasing
fn normalize(input: &str) -> String {
    let mut text = input.trim().to_lowercase();
    for prefix in [
        "what is",
        "what's",
        "whats",
        "how much is",
        "calculate",
        "compute",
        "evaluate",
    ] {
        if let Some(rest) = text.strip_prefix(prefix) {
            text = rest.trim().to_string();
            break;
        }
    }
    let text = text.trim_end_matches(['?', '.', '=', ' ']);

    text.replace("plus", " + ")
        .replace("minus", " - ")
        .replace("times", " * ")
        .replace("multiplied by", " * ")
        .replace("divided by", " / ")
        .replace("percent", "%")
        .replace("to the power of", " ^ ")
}

fn tokenize(text: &str) -> Result<Vec<Token>, CalcError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | ',' => i += 1,
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' | 'x' | '×' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' | '÷' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '^' => {
                tokens.push(Token::Caret);
                i += 1;
            }
            '%' => {
                tokens.push(Token::Percent);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            'o' if chars.get(i + 1) == Some(&'f') => {
                tokens.push(Token::Of);
                i += 2;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let literal: String = chars[start..i].iter().collect();
                let value = literal
                    .parse::<f64>()
                    .map_err(|_| CalcError::Parse(format!("bad number {literal}")))?;
                tokens.push(Token::Number(value));
            }
            other => return Err(CalcError::Parse(format!("unexpected character '{other}'"))),
        }
    }

    if tokens.is_empty() {
        return Err(CalcError::Parse("empty expression".to_string()));
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.position).copied()
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.peek();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    /// expr := term (('+' | '-') term)*
    fn expr(&mut self) -> Result<f64, CalcError> {
        let mut value = self.term()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Plus => {
                    self.advance();
                    value += self.term()?;
                }
                Token::Minus => {
                    self.advance();
                    value -= self.term()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    /// term := power (('*' | '/' | 'of') power)*
    fn term(&mut self) -> Result<f64, CalcError> {
        let mut value = self.power()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Star | Token::Of => {
                    self.advance();
                    value *= self.power()?;
                }
                Token::Slash => {
                    self.advance();
                    let divisor = self.power()?;
                    if divisor == 0.0 {
                        return Err(CalcError::Math("division by zero".to_string()));
                    }
                    value /= divisor;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    /// power := unary ('^' power)?   (right associative)
    fn power(&mut self) -> Result<f64, CalcError> {
        let base = self.unary()?;
        if self.peek() == Some(Token::Caret) {
            self.advance();
            let exponent = self.power()?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    /// unary := '-' unary | primary ('%')?
    fn unary(&mut self) -> Result<f64, CalcError> {
        if self.peek() == Some(Token::Minus) {
            self.advance();
            return Ok(-self.unary()?);
        }
        let mut value = self.primary()?;
        if self.peek() == Some(Token::Percent) {
            self.advance();
            value /= 100.0;
        }
        Ok(value)
    }

    /// primary := number | '(' expr ')'
    fn primary(&mut self) -> Result<f64, CalcError> {
        match self.advance() {
            Some(Token::Number(value)) => Ok(value),
            Some(Token::LParen) => {
                let value = self.expr()?;
                if self.advance() != Some(Token::RParen) {
                    return Err(CalcError::Parse("missing closing parenthesis".to_string()));
                }
                Ok(value)
            }
            other => Err(CalcError::Parse(format!("unexpected token {other:?}"))),
        }
    }
}

/// Evaluate an arithmetic query
pub fn evaluate(input: &str) -> Result<f64, CalcError> {
    let normalized = normalize(input);
    let tokens = tokenize(&normalized)?;
    let mut parser = Parser {
        tokens,
        position: 0,
    };
    let value = parser.expr()?;

    if parser.position != parser.tokens.len() {
        return Err(CalcError::Parse("trailing input".to_string()));
    }
    if !value.is_finite() {
        return Err(CalcError::Math("result is not finite".to_string()));
    }
    Ok(value)
}

/// Whether the input parses as an arithmetic expression
pub fn parses(input: &str) -> bool {
    evaluate(input).is_ok()
}

/// Render a result without trailing noise ("225" rather than "225.000")
pub fn format_result(value: f64) -> String {
    if value.fract().abs() < 1e-9 && value.abs() < 1e15 {
        format!("{}", value.round() as i64)
    } else {
        let formatted = format!("{:.6}", value);
        formatted.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Adapter exposing the evaluator through the tool interface
#[derive(Default)]
pub struct CalculatorAdapter;

impl CalculatorAdapter {
    /// Create the adapter
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ToolAdapter for CalculatorAdapter {
    fn kind(&self) -> ToolKind {
        ToolKind::Calculator
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn execute(
        &self,
        query: &str,
        _options: &ToolOptions,
    ) -> Result<Vec<Evidence>, ToolError> {
        let value = evaluate(query).map_err(|e| ToolError::InvalidInput(e.to_string()))?;
        Ok(vec![Evidence::new(format_result(value), "calculator")])
    }
}
