// ABOUTME: Single-pass lexer for dice notation expressions.
// ABOUTME: Tokenizes strings like "1d20 advantage + 5 >= 15 crit 20" into a positioned token stream.

use crate::error::ParseError;
use crate::token::{classify_identifier, CompareOp, DiceMarker, Operator, PositionedToken, Token};

/// A lexer over dice notation. Total and deterministic: every input either
/// produces a token stream terminated by `Eof` or a `ParseError`.
pub struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    len: usize,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.char_indices().peekable(),
            len: input.len(),
            pos: 0,
        }
    }

    /// Peek at the next token without consuming it.
    pub fn peek(&mut self) -> Result<PositionedToken, ParseError> {
        let saved_chars = self.chars.clone();
        let saved_pos = self.pos;
        let token = self.next_token()?;
        self.chars = saved_chars;
        self.pos = saved_pos;
        Ok(token)
    }

    /// Get the next token from the input, along with its starting position.
    pub fn next_token(&mut self) -> Result<PositionedToken, ParseError> {
        self.skip_whitespace();

        let Some(&(pos, ch)) = self.chars.peek() else {
            return Ok(PositionedToken {
                token: Token::Eof,
                pos: self.len,
            });
        };
        self.pos = pos;

        let token = match ch {
            '0'..='9' => self.number()?,
            c if c.is_alphabetic() => self.identifier()?,
            '%' => self.placeholder(pos)?,
            '+' => self.single(Token::Operator(Operator::Plus)),
            '-' => self.single(Token::Operator(Operator::Minus)),
            '*' => self.single(Token::Operator(Operator::Star)),
            '/' => self.single(Token::Operator(Operator::Slash)),
            '(' => self.single(Token::LParen),
            ')' => self.single(Token::RParen),
            ',' => self.single(Token::Comma),
            '>' => {
                self.chars.next();
                if self.eat_char('=') {
                    Token::Comparison(CompareOp::Ge)
                } else {
                    Token::Comparison(CompareOp::Gt)
                }
            }
            '<' => {
                self.chars.next();
                if self.eat_char('=') {
                    Token::Comparison(CompareOp::Le)
                } else {
                    Token::Comparison(CompareOp::Lt)
                }
            }
            '=' => {
                self.chars.next();
                // standalone '=' combines with a following '=' into '=='.
                // a single '=' is lexed as Eq too and rejected downstream by
                // the parser, per the spec's "standalone = is rejected" rule.
                self.eat_char('=');
                Token::Comparison(CompareOp::Eq)
            }
            other => return Err(ParseError::UnexpectedChar { ch: other, pos }),
        };

        Ok(PositionedToken { token, pos })
    }

    fn single(&mut self, token: Token) -> Token {
        self.chars.next();
        token
    }

    fn eat_char(&mut self, expected: char) -> bool {
        if let Some(&(_, ch)) = self.chars.peek() {
            if ch == expected {
                self.chars.next();
                return true;
            }
        }
        false
    }

    fn skip_whitespace(&mut self) {
        while let Some(&(_, ch)) = self.chars.peek() {
            if ch.is_whitespace() {
                self.chars.next();
            } else {
                break;
            }
        }
    }

    fn number(&mut self) -> Result<Token, ParseError> {
        let mut value: i64 = 0;
        while let Some(&(_, ch)) = self.chars.peek() {
            if let Some(digit) = ch.to_digit(10) {
                self.chars.next();
                value = value.saturating_mul(10).saturating_add(digit as i64);
            } else {
                break;
            }
        }
        Ok(Token::Number(value))
    }

    fn identifier(&mut self) -> Result<Token, ParseError> {
        let mut ident = String::new();
        while let Some(&(_, ch)) = self.chars.peek() {
            if ch.is_alphabetic() {
                ident.push(ch);
                self.chars.next();
            } else {
                break;
            }
        }
        let lower = ident.to_lowercase();

        // "d" (or "D") immediately followed by '%' (no whitespace) is the
        // d% marker; any other identifier is classified normally.
        if lower == "d" {
            if let Some(&(_, '%')) = self.chars.peek() {
                self.chars.next();
                return Ok(Token::DiceMarker(DiceMarker::DPercent));
            }
        }
        Ok(classify_identifier(&lower))
    }

    fn placeholder(&mut self, start: usize) -> Result<Token, ParseError> {
        self.chars.next(); // consume opening '%'
        let mut name = String::new();
        loop {
            match self.chars.peek().copied() {
                None => return Err(ParseError::UnterminatedPlaceholder { pos: start }),
                Some((_, '%')) => {
                    self.chars.next();
                    break;
                }
                Some((_, ch)) if ch.is_ascii_alphanumeric() || ch == '_' => {
                    name.push(ch);
                    self.chars.next();
                }
                Some((p, ch)) => return Err(ParseError::UnexpectedChar { ch, pos: p }),
            }
        }
        if name.is_empty() {
            return Err(ParseError::EmptyPlaceholderName { pos: start });
        }
        Ok(Token::Placeholder(name))
    }
}
