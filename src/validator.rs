// ABOUTME: Pure structural and numeric constraint checks, invoked at three points during parsing.
// ABOUTME: Every failure here raises a ValidationError carrying a field tag (never a ParseError).

use crate::ast::{AstNode, BinOp, DiceSpecification, DiceType};
use crate::error::{Field, ValidationError};
use crate::modifiers::RollModifiers;

/// Checked before lexing/parsing begins: the expression must be non-empty
/// and parentheses must balance by simple depth count. Placeholder bodies
/// (`%name%`) can never contain parens, so a raw character scan is safe.
pub fn validate_pre_parse(text: &str) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        return Err(ValidationError::new(Field::Parentheses, "expression is empty"));
    }

    let mut depth: i32 = 0;
    for ch in text.chars() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return Err(ValidationError::new(
                        Field::Parentheses,
                        "unbalanced parentheses: unmatched ')'",
                    ));
                }
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(ValidationError::new(
            Field::Parentheses,
            "unbalanced parentheses: unmatched '('",
        ));
    }
    Ok(())
}

/// Checked right after a `DiceSpecification` is extracted from the dice term.
pub fn validate_dice_spec(spec: &DiceSpecification) -> Result<(), ValidationError> {
    if spec.count < 1 || spec.count > 100 {
        return Err(ValidationError::new(
            Field::Count,
            format!("dice count must be between 1 and 100, got {}", spec.count),
        ));
    }
    match spec.dice_type {
        DiceType::Standard => {
            if spec.sides < 2 || spec.sides > 100 {
                return Err(ValidationError::new(
                    Field::Sides,
                    format!("dice sides must be between 2 and 100, got {}", spec.sides),
                ));
            }
        }
        DiceType::Percentile => {
            if spec.sides != 100 {
                return Err(ValidationError::new(
                    Field::Sides,
                    "percentile dice must have 100 sides",
                ));
            }
        }
        DiceType::Fudge => {
            if spec.sides != 3 {
                return Err(ValidationError::new(
                    Field::Sides,
                    "fudge dice must have 3 sides",
                ));
            }
        }
    }
    Ok(())
}

/// Checked once the modifier clauses for the primary pool are fully parsed.
pub fn validate_modifiers(
    spec: &DiceSpecification,
    modifiers: &RollModifiers,
) -> Result<(), ValidationError> {
    let pool_size = spec.count + modifiers.advantage_count.unwrap_or(0);

    if let Some(keep) = modifiers.keep {
        if keep.count() > pool_size {
            return Err(ValidationError::new(
                Field::Keep,
                format!(
                    "cannot keep {} dice from a pool of {}",
                    keep.count(),
                    pool_size
                ),
            ));
        }
    }

    let faces = spec.faces();

    if let Some(reroll) = modifiers.reroll {
        let excluded = faces
            .iter()
            .filter(|&&v| !reroll.operator.check(v, reroll.threshold))
            .count();
        if excluded == 0 {
            return Err(ValidationError::new(
                Field::Reroll,
                "reroll condition must exclude at least one face",
            ));
        }
    }

    if let Some(explosion) = modifiers.explosion {
        let excluded = faces
            .iter()
            .filter(|&&v| !explosion.operator.check(v, explosion.threshold))
            .count();
        if excluded == 0 {
            return Err(ValidationError::new(
                Field::Explode,
                "explosion condition must exclude at least one face",
            ));
        }
    }

    let pool_is_single_die = pool_size == 1;
    if let Some(threshold) = modifiers.critical_success {
        if !pool_is_single_die {
            return Err(ValidationError::new(
                Field::Critical,
                "critical thresholds require a single-die pool",
            ));
        }
        if threshold < spec.min_face() || threshold > spec.max_face() {
            return Err(ValidationError::new(
                Field::Critical,
                format!(
                    "critical success threshold {} out of range [{}, {}]",
                    threshold,
                    spec.min_face(),
                    spec.max_face()
                ),
            ));
        }
    }
    if let Some(threshold) = modifiers.critical_failure {
        if !pool_is_single_die {
            return Err(ValidationError::new(
                Field::Critical,
                "critical thresholds require a single-die pool",
            ));
        }
        if threshold < spec.min_face() || threshold > spec.max_face() {
            return Err(ValidationError::new(
                Field::Critical,
                format!(
                    "critical failure threshold {} out of range [{}, {}]",
                    threshold,
                    spec.min_face(),
                    spec.max_face()
                ),
            ));
        }
    }

    Ok(())
}

/// Rejects a literal `x / 0` written directly in the arithmetic (as opposed
/// to a dice-dependent divisor that merely evaluates to zero at roll time).
pub fn validate_no_literal_division_by_zero(node: &AstNode) -> Result<(), ValidationError> {
    match node {
        AstNode::Number(_) | AstNode::Dice(_) => Ok(()),
        AstNode::BinaryOp { op, left, right } => {
            if *op == BinOp::Div {
                if let AstNode::Number(n) = right.as_ref() {
                    if *n == 0.0 {
                        return Err(ValidationError::new(
                            Field::Arithmetic,
                            "division by literal zero",
                        ));
                    }
                }
            }
            validate_no_literal_division_by_zero(left)?;
            validate_no_literal_division_by_zero(right)
        }
        AstNode::Function { arg, .. } => validate_no_literal_division_by_zero(arg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::DiceType;

    #[test]
    fn rejects_empty_expression() {
        assert!(validate_pre_parse("").is_err());
        assert!(validate_pre_parse("   ").is_err());
    }

    #[test]
    fn rejects_unbalanced_parens() {
        assert!(validate_pre_parse("(3d6").is_err());
        assert!(validate_pre_parse("3d6)").is_err());
        assert!(validate_pre_parse("((3d6)").is_err());
    }

    #[test]
    fn accepts_balanced_parens() {
        assert!(validate_pre_parse("(3d6 + 2) * 2").is_ok());
    }

    #[test]
    fn rejects_out_of_range_count_and_sides() {
        let mk = |count, sides| DiceSpecification {
            count,
            sides,
            dice_type: DiceType::Standard,
        };
        assert!(validate_dice_spec(&mk(0, 6)).is_err());
        assert!(validate_dice_spec(&mk(101, 6)).is_err());
        assert!(validate_dice_spec(&mk(3, 1)).is_err());
        assert!(validate_dice_spec(&mk(3, 101)).is_err());
        assert!(validate_dice_spec(&mk(3, 6)).is_ok());
    }

    #[test]
    fn rejects_keep_larger_than_pool() {
        let spec = DiceSpecification {
            count: 3,
            sides: 6,
            dice_type: DiceType::Standard,
        };
        let mut modifiers = RollModifiers::default();
        modifiers.keep = Some(crate::modifiers::KeepClause::Highest(4));
        assert!(validate_modifiers(&spec, &modifiers).is_err());
    }

    #[test]
    fn rejects_reroll_spanning_all_faces() {
        let spec = DiceSpecification {
            count: 1,
            sides: 6,
            dice_type: DiceType::Standard,
        };
        let mut modifiers = RollModifiers::default();
        modifiers.reroll = Some(crate::modifiers::RerollClause {
            operator: crate::token::CompareOp::Ge,
            threshold: 1,
            limit: 100,
        });
        assert!(validate_modifiers(&spec, &modifiers).is_err());
    }

    #[test]
    fn rejects_critical_on_multi_die_pool() {
        let spec = DiceSpecification {
            count: 2,
            sides: 20,
            dice_type: DiceType::Standard,
        };
        let mut modifiers = RollModifiers::default();
        modifiers.critical_success = Some(20);
        assert!(validate_modifiers(&spec, &modifiers).is_err());
    }
}
