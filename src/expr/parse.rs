//! Expression text → [`Expr`], using meval's tokenizer and shunting-yard pass.

use meval::tokenizer::{Operation, Token};
use thiserror::Error;

use super::{BinaryOp, Expr, UnaryOp};

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("empty expression")]
    Empty,
    #[error("could not parse `{text}`: {reason}")]
    Syntax { text: String, reason: String },
    #[error("unexpected token in `{text}`: {token}")]
    UnexpectedToken { text: String, token: String },
}

/// Parses an expression as written in an instrument description.
///
/// Quoted text (`"mid"`) becomes [`Expr::Text`]; everything else goes through
/// meval and is folded on the way in.
pub fn parse_expr(source: &str) -> Result<Expr, ParseError> {
    let trimmed = source.trim().trim_end_matches(';').trim_end();
    if trimmed.is_empty() {
        return Err(ParseError::Empty);
    }

    if let Some(text) = quoted(trimmed) {
        return Ok(Expr::text(text));
    }

    let parsed: meval::Expr = trimmed.parse().map_err(|error: meval::Error| ParseError::Syntax {
        text: trimmed.to_owned(),
        reason: error.to_string(),
    })?;

    from_rpn(trimmed, &parsed)
}

fn quoted(text: &str) -> Option<&str> {
    for quote in ['"', '\''] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            return Some(&text[1..text.len() - 1]);
        }
    }
    None
}

fn from_rpn(text: &str, tokens: &[Token]) -> Result<Expr, ParseError> {
    let unexpected = |token: &Token| ParseError::UnexpectedToken {
        text: text.to_owned(),
        token: format!("{token:?}"),
    };
    let underflow = || ParseError::Syntax {
        text: text.to_owned(),
        reason: "missing operand".to_owned(),
    };

    let mut stack: Vec<Expr> = Vec::new();
    for token in tokens {
        match token {
            Token::Number(value) => stack.push(Expr::number(*value)),
            Token::Var(name) => stack.push(Expr::ident(name.clone())),
            Token::Unary(op) => {
                let operand = stack.pop().ok_or_else(underflow)?;
                let expr = match op {
                    Operation::Plus => operand,
                    Operation::Minus => Expr::unary(UnaryOp::Neg, operand),
                    _ => return Err(unexpected(token)),
                };
                stack.push(expr);
            }
            Token::Binary(op) => {
                let rhs = stack.pop().ok_or_else(underflow)?;
                let lhs = stack.pop().ok_or_else(underflow)?;
                let op = match op {
                    Operation::Plus => BinaryOp::Add,
                    Operation::Minus => BinaryOp::Sub,
                    Operation::Times => BinaryOp::Mul,
                    Operation::Div => BinaryOp::Div,
                    Operation::Rem => BinaryOp::Rem,
                    Operation::Pow => BinaryOp::Pow,
                    _ => return Err(unexpected(token)),
                };
                stack.push(Expr::binary(op, lhs, rhs));
            }
            Token::Func(name, arity) => {
                let arity = arity.unwrap_or(0);
                if stack.len() < arity {
                    return Err(underflow());
                }
                let args = stack.split_off(stack.len() - arity);
                stack.push(Expr::call(name.clone(), args));
            }
            Token::LParen | Token::RParen | Token::Comma => return Err(unexpected(token)),
        }
    }

    match (stack.pop(), stack.is_empty()) {
        (Some(expr), true) => Ok(expr),
        (None, _) => Err(ParseError::Empty),
        (Some(_), false) => Err(ParseError::Syntax {
            text: text.to_owned(),
            reason: "dangling operands".to_owned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_fold_immediately() {
        assert_eq!(parse_expr("2 * 3 + 1").unwrap(), Expr::Number(7.0));
        assert_eq!(parse_expr("-0.56").unwrap(), Expr::Number(-0.56));
        assert_eq!(parse_expr("1e-3;").unwrap(), Expr::Number(0.001));
    }

    #[test]
    fn identifiers_stay_symbolic() {
        let expr = parse_expr("L_guide / 2").unwrap();
        assert_eq!(expr, Expr::ident("L_guide") / Expr::number(2.0));
        assert!(expr.depends_on("L_guide"));
    }

    #[test]
    fn function_calls_keep_their_arguments() {
        let expr = parse_expr("atan2(dx, 1)").unwrap();
        match expr {
            Expr::Call(name, args) => {
                assert_eq!(name, "atan2");
                assert_eq!(args, vec![Expr::ident("dx"), Expr::one()]);
            }
            other => panic!("expected call, got {other:?}"),
        }
    }

    #[test]
    fn quoted_text_is_a_string_literal() {
        assert_eq!(parse_expr("\"mid\"").unwrap(), Expr::text("mid"));
        assert_eq!(parse_expr("'entrance'").unwrap(), Expr::text("entrance"));
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(parse_expr("   "), Err(ParseError::Empty));
        assert!(matches!(parse_expr("2 +"), Err(ParseError::Syntax { .. })));
    }
}
