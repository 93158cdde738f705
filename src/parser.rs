// ABOUTME: Recursive-descent parser for dice expressions.
// ABOUTME: Produces an arithmetic AST with at most one dice node, a separate modifier bundle, and an optional comparison clause.

use std::collections::HashMap;

use crate::ast::{AstNode, BinOp, DiceSpecification, DiceType, FuncName};
use crate::error::{Error, ParseError};
use crate::lexer::Lexer;
use crate::modifiers::{
    ExplosionClause, KeepClause, RerollClause, RollModifiers, SuccessClause,
    DEFAULT_EXPLOSION_LIMIT, DEFAULT_REROLL_LIMIT,
};
use crate::token::{CompareOp, DiceMarker, Keyword, Operator, Token};
use crate::validator;

/// The output of parsing, before statistics are attached.
#[derive(Debug, Clone)]
pub struct ParseOutput {
    pub ast: AstNode,
    pub spec: DiceSpecification,
    pub modifiers: RollModifiers,
    pub comparison_op: Option<CompareOp>,
    pub comparison_threshold: Option<i64>,
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    current_pos: usize,
    variables: &'a HashMap<String, i64>,
    dice_spec: Option<(DiceSpecification, usize)>,
    resolved_variables: HashMap<String, i64>,
}

type PResult<T> = Result<T, Error>;

impl<'a> Parser<'a> {
    pub fn new(input: &'a str, variables: &'a HashMap<String, i64>) -> PResult<Self> {
        let lexer = Lexer::new(input);
        let mut parser = Self {
            lexer,
            current: Token::Eof,
            current_pos: 0,
            variables,
            dice_spec: None,
            resolved_variables: HashMap::new(),
        };
        let (first, pos) = parser.read_token()?;
        parser.current = first;
        parser.current_pos = pos;
        Ok(parser)
    }

    /// Pulls the next token from the lexer, resolving placeholders in place
    /// and recording each resolution for idempotent re-parsing.
    fn read_token(&mut self) -> PResult<(Token, usize)> {
        let positioned = self.lexer.next_token().map_err(Error::from)?;
        match positioned.token {
            Token::Placeholder(name) => match self.variables.get(&name) {
                Some(&value) => {
                    self.resolved_variables.insert(name, value);
                    Ok((Token::Number(value), positioned.pos))
                }
                None => Err(Error::from(ParseError::UnresolvedPlaceholder {
                    name,
                    pos: positioned.pos,
                })),
            },
            other => Ok((other, positioned.pos)),
        }
    }

    fn advance(&mut self) -> PResult<Token> {
        let (next, pos) = self.read_token()?;
        let prev = std::mem::replace(&mut self.current, next);
        self.current_pos = pos;
        Ok(prev)
    }

    fn unexpected(&self, expected: &str) -> Error {
        Error::from(ParseError::UnexpectedToken {
            expected: expected.to_string(),
            found: format!("{:?}", self.current),
            pos: self.current_pos,
        })
    }

    fn expect_number(&mut self) -> PResult<i64> {
        if let Token::Number(n) = self.current {
            self.advance()?;
            Ok(n)
        } else {
            Err(self.unexpected("number"))
        }
    }

    /// Parses the full expression: arithmetic, then modifier clauses, then
    /// an optional tail comparison.
    pub fn parse(mut self) -> PResult<ParseOutput> {
        let ast = self.expression()?;
        validator::validate_no_literal_division_by_zero(&ast)?;

        let (spec, _pos) = self.dice_spec.ok_or_else(|| {
            Error::from(ParseError::UnexpectedToken {
                expected: "exactly one dice term".to_string(),
                found: "no dice term".to_string(),
                pos: self.current_pos,
            })
        })?;

        let mut modifiers = RollModifiers::default();
        let separated = !matches!(ast, AstNode::Dice(_));
        self.modifier_clauses(&spec, &mut modifiers, separated)?;
        modifiers.resolved_variables = self.resolved_variables.clone();

        let (comparison_op, comparison_threshold) = if let Token::Comparison(op) = self.current {
            self.advance()?;
            let threshold = self.expect_number()?;
            (Some(op), Some(threshold))
        } else {
            (None, None)
        };

        if self.current != Token::Eof {
            return Err(self.unexpected("end of input"));
        }

        validator::validate_modifiers(&spec, &modifiers)?;

        Ok(ParseOutput {
            ast,
            spec,
            modifiers,
            comparison_op,
            comparison_threshold,
        })
    }

    fn modifier_clauses(
        &mut self,
        spec: &DiceSpecification,
        modifiers: &mut RollModifiers,
        separated: bool,
    ) -> PResult<()> {
        let mut first_slot = true;

        loop {
            match self.current {
                Token::Keyword(Keyword::Advantage) => {
                    self.advance()?;
                    modifiers.advantage_count = Some(1);
                    modifiers.keep = Some(KeepClause::Highest(spec.count));
                    first_slot = false;
                }
                Token::Keyword(Keyword::Disadvantage) => {
                    self.advance()?;
                    modifiers.advantage_count = Some(1);
                    modifiers.keep = Some(KeepClause::Lowest(spec.count));
                    first_slot = false;
                }
                Token::Keyword(Keyword::Keep) => {
                    self.advance()?;
                    let n = self.expect_number()? as u32;
                    let clause = match self.current {
                        Token::Keyword(Keyword::Highest) => {
                            self.advance()?;
                            KeepClause::Highest(n)
                        }
                        Token::Keyword(Keyword::Lowest) => {
                            self.advance()?;
                            KeepClause::Lowest(n)
                        }
                        _ => return Err(self.unexpected("'highest' or 'lowest'")),
                    };
                    modifiers.keep = Some(clause);
                    first_slot = false;
                }
                Token::Keyword(Keyword::Reroll) => {
                    self.advance()?;
                    let limit = self.optional_limit(DEFAULT_REROLL_LIMIT)?;
                    let operator = self.expect_compare_op()?;
                    let threshold = self.expect_number()?;
                    modifiers.reroll = Some(RerollClause {
                        operator,
                        threshold,
                        limit,
                    });
                    first_slot = false;
                }
                Token::Keyword(Keyword::Explode) => {
                    self.advance()?;
                    let limit = self.optional_limit(DEFAULT_EXPLOSION_LIMIT)?;
                    let (operator, threshold) = self.optional_compare_clause()?.unwrap_or((
                        CompareOp::Ge,
                        spec.max_face(),
                    ));
                    modifiers.explosion = Some(ExplosionClause {
                        operator,
                        threshold,
                        limit,
                    });
                    first_slot = false;
                }
                Token::Keyword(Keyword::Crit) | Token::Keyword(Keyword::Critical) => {
                    self.advance()?;
                    modifiers.critical_success = Some(self.expect_number()?);
                    first_slot = false;
                }
                Token::Keyword(Keyword::Glitch) | Token::Keyword(Keyword::Failure) => {
                    self.advance()?;
                    modifiers.critical_failure = Some(self.expect_number()?);
                    first_slot = false;
                }
                Token::Comparison(op @ (CompareOp::Ge | CompareOp::Gt))
                    if first_slot && !separated =>
                {
                    self.advance()?;
                    let threshold = self.expect_number()?;
                    modifiers.success = Some(SuccessClause {
                        operator: op,
                        threshold,
                    });
                    first_slot = false;
                }
                _ => break,
            }
        }

        Ok(())
    }

    fn optional_limit(&mut self, default: u32) -> PResult<u32> {
        if let Token::Number(n) = self.current {
            self.advance()?;
            Ok(n as u32)
        } else {
            Ok(default)
        }
    }

    fn expect_compare_op(&mut self) -> PResult<CompareOp> {
        if let Token::Comparison(op) = self.current {
            self.advance()?;
            Ok(op)
        } else {
            Err(self.unexpected("comparison operator"))
        }
    }

    fn optional_compare_clause(&mut self) -> PResult<Option<(CompareOp, i64)>> {
        if let Token::Comparison(op) = self.current {
            self.advance()?;
            let threshold = self.expect_number()?;
            Ok(Some((op, threshold)))
        } else {
            Ok(None)
        }
    }

    /// `expr := add`
    fn expression(&mut self) -> PResult<AstNode> {
        self.add()
    }

    /// `add := mul (('+'|'-') mul)*`
    fn add(&mut self) -> PResult<AstNode> {
        let mut left = self.mul()?;
        loop {
            let op = match self.current {
                Token::Operator(Operator::Plus) => BinOp::Add,
                Token::Operator(Operator::Minus) => BinOp::Sub,
                _ => break,
            };
            self.advance()?;
            let right = self.mul()?;
            left = AstNode::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    /// `mul := unary (('*'|'/') unary)*`
    fn mul(&mut self) -> PResult<AstNode> {
        let mut left = self.unary()?;
        loop {
            let op = match self.current {
                Token::Operator(Operator::Star) => BinOp::Mul,
                Token::Operator(Operator::Slash) => BinOp::Div,
                _ => break,
            };
            self.advance()?;
            let right = self.unary()?;
            left = AstNode::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    /// `unary := ('-' unary) | primary`
    fn unary(&mut self) -> PResult<AstNode> {
        if self.current == Token::Operator(Operator::Minus) {
            self.advance()?;
            let inner = self.unary()?;
            Ok(AstNode::BinaryOp {
                op: BinOp::Sub,
                left: Box::new(AstNode::Number(0.0)),
                right: Box::new(inner),
            })
        } else {
            self.primary()
        }
    }

    /// `primary := Number | funcCall | '(' expr ')' | diceTerm`
    fn primary(&mut self) -> PResult<AstNode> {
        match self.current.clone() {
            Token::Function(name) => {
                self.advance()?;
                if self.current != Token::LParen {
                    return Err(self.unexpected("'(' after function name"));
                }
                self.advance()?;
                let arg = self.expression()?;
                if self.current != Token::RParen {
                    return Err(self.unexpected("')'"));
                }
                self.advance()?;
                let func = match name {
                    crate::token::FuncName::Floor => FuncName::Floor,
                    crate::token::FuncName::Ceil => FuncName::Ceil,
                    crate::token::FuncName::Round => FuncName::Round,
                };
                Ok(AstNode::Function {
                    name: func,
                    arg: Box::new(arg),
                })
            }
            Token::LParen => {
                self.advance()?;
                let inner = self.expression()?;
                if self.current != Token::RParen {
                    return Err(self.unexpected("')'"));
                }
                self.advance()?;
                Ok(inner)
            }
            Token::DiceMarker(marker) => {
                let pos = self.current_pos;
                self.dice_term(1, marker, pos, false)
            }
            Token::Number(n) => {
                let pos = self.current_pos;
                self.advance()?;
                if let Token::DiceMarker(marker) = self.current {
                    self.dice_term(n as u32, marker, pos, true)
                } else {
                    Ok(AstNode::Number(n as f64))
                }
            }
            _ => Err(self.unexpected("number, dice term, function call, or '('")),
        }
    }

    /// `diceTerm := [Number] ('d' Integer | 'dF' | 'd%')`
    ///
    /// `explicit_count` tells us whether a leading count was actually
    /// written; standard `d` dice require one (`d6` is rejected, unlike
    /// `d%`/`dF` which default their count to 1).
    fn dice_term(
        &mut self,
        count: u32,
        marker: DiceMarker,
        pos: usize,
        explicit_count: bool,
    ) -> PResult<AstNode> {
        self.advance()?; // consume the marker

        let dice_type = match marker {
            DiceMarker::D => {
                if !explicit_count {
                    return Err(self.unexpected("a dice count before 'd'"));
                }
                DiceType::Standard
            }
            DiceMarker::DFudge => DiceType::Fudge,
            DiceMarker::DPercent => DiceType::Percentile,
        };

        let sides = match dice_type {
            DiceType::Standard => {
                if let Token::Number(n) = self.current {
                    self.advance()?;
                    n as u32
                } else {
                    return Err(Error::from(ParseError::MissingSides { pos }));
                }
            }
            DiceType::Fudge => 3,
            DiceType::Percentile => 100,
        };

        let spec = DiceSpecification {
            count,
            sides,
            dice_type,
        };
        validator::validate_dice_spec(&spec)?;

        if self.dice_spec.is_some() {
            return Err(Error::from(ParseError::DuplicateDicePool { pos }));
        }
        self.dice_spec = Some((spec, pos));

        Ok(AstNode::Dice(spec))
    }
}

/// Parses a dice expression with no placeholder variables.
pub fn parse(input: &str) -> Result<ParseOutput, Error> {
    let empty = HashMap::new();
    parse_with_variables(input, &empty)
}

/// Parses a dice expression, resolving `%name%` placeholders against `variables`.
pub fn parse_with_variables(
    input: &str,
    variables: &HashMap<String, i64>,
) -> Result<ParseOutput, Error> {
    validator::validate_pre_parse(input)?;
    Parser::new(input, variables)?.parse()
}
