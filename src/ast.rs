// ABOUTME: Abstract Syntax Tree types for dice expressions.
// ABOUTME: Represents parsed arithmetic like "(1d20 + 5) * 2", with dice mechanics kept out of the tree.

use std::fmt;

/// The kind of dice a pool is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiceType {
    /// A die with `sides` faces, values `1..=sides`.
    Standard,
    /// A fudge die: values `{-1, 0, 1}`, sides fixed at 3.
    Fudge,
    /// A percentile die: values `1..=100`, sides fixed at 100.
    Percentile,
}

impl fmt::Display for DiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiceType::Standard => write!(f, "d"),
            DiceType::Fudge => write!(f, "dF"),
            DiceType::Percentile => write!(f, "d%"),
        }
    }
}

/// The shape of the single dice pool referenced by an accepted expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiceSpecification {
    pub count: u32,
    pub sides: u32,
    pub dice_type: DiceType,
}

impl DiceSpecification {
    pub fn min_face(&self) -> i64 {
        match self.dice_type {
            DiceType::Fudge => -1,
            DiceType::Standard | DiceType::Percentile => 1,
        }
    }

    pub fn max_face(&self) -> i64 {
        match self.dice_type {
            DiceType::Fudge => 1,
            DiceType::Standard | DiceType::Percentile => self.sides as i64,
        }
    }

    /// The face values a single die of this specification can show.
    pub fn faces(&self) -> Vec<i64> {
        match self.dice_type {
            DiceType::Fudge => vec![-1, 0, 1],
            DiceType::Standard | DiceType::Percentile => (1..=self.sides as i64).collect(),
        }
    }
}

/// A binary arithmetic operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
        };
        write!(f, "{s}")
    }
}

/// The built-in functions an expression may apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuncName {
    Floor,
    Ceil,
    Round,
}

/// An arithmetic expression node. Mechanics (keep/reroll/explode/success)
/// never live here; they apply to the single `Dice` node via `RollModifiers`.
/// At most one `Dice` node appears across the whole tree of any accepted
/// expression.
#[derive(Debug, Clone, PartialEq)]
pub enum AstNode {
    Number(f64),
    /// The primary dice pool; its evaluated value is the post-mechanics
    /// pool total, substituted in by the roll engine before evaluation.
    Dice(DiceSpecification),
    BinaryOp {
        op: BinOp,
        left: Box<AstNode>,
        right: Box<AstNode>,
    },
    Function {
        name: FuncName,
        arg: Box<AstNode>,
    },
}

impl AstNode {
    /// True if this subtree contains a `Dice` node.
    pub fn contains_dice(&self) -> bool {
        self.dice_count() > 0
    }

    /// Count of `Dice` nodes in this subtree (used to enforce the
    /// single-pool invariant while building the tree).
    pub fn dice_count(&self) -> usize {
        match self {
            AstNode::Number(_) => 0,
            AstNode::Dice(_) => 1,
            AstNode::BinaryOp { left, right, .. } => left.dice_count() + right.dice_count(),
            AstNode::Function { arg, .. } => arg.dice_count(),
        }
    }

    /// Evaluate the tree, substituting `pool_total` for the `Dice` node.
    /// Returns an error on division by a zero-valued right subtree
    /// (validation makes this unreachable for statically-zero literals;
    /// a dice-dependent divisor can still evaluate to zero at roll time).
    pub fn eval(&self, pool_total: f64) -> Result<f64, crate::error::ValidationError> {
        use crate::error::{Field, ValidationError};
        match self {
            AstNode::Number(n) => Ok(*n),
            AstNode::Dice(_) => Ok(pool_total),
            AstNode::BinaryOp { op, left, right } => {
                let l = left.eval(pool_total)?;
                let r = right.eval(pool_total)?;
                match op {
                    BinOp::Add => Ok(l + r),
                    BinOp::Sub => Ok(l - r),
                    BinOp::Mul => Ok(l * r),
                    BinOp::Div => {
                        if r == 0.0 {
                            return Err(ValidationError::new(
                                Field::Operator,
                                "division by zero",
                            ));
                        }
                        Ok(l / r)
                    }
                }
            }
            AstNode::Function { name, arg } => {
                let v = arg.eval(pool_total)?;
                Ok(match name {
                    FuncName::Floor => v.floor(),
                    FuncName::Ceil => v.ceil(),
                    FuncName::Round => round_half_to_even(v),
                })
            }
        }
    }
}

/// Round half-to-even (banker's rounding), per the analyzer's `round` contract.
pub fn round_half_to_even(v: f64) -> f64 {
    let floor = v.floor();
    let diff = v - floor;
    if diff < 0.5 {
        floor
    } else if diff > 0.5 {
        floor + 1.0
    } else if (floor as i64) % 2 == 0 {
        floor
    } else {
        floor + 1.0
    }
}
