//! Shunting-Yard compilation and postfix evaluation of arithmetic expressions

use super::EvalError;
use super::token::{Token, tokenize};
use core::fmt;
use std::collections::BTreeMap;

/// Flat map of named numeric values an expression is evaluated against
pub type Variables = BTreeMap<String, f64>;

/// An arithmetic expression compiled to postfix form
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    text: String,
    postfix: Vec<Token>,
}

impl Expression {
    /// Parse an expression, converting it to postfix order.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::Syntax`] on invalid characters, mismatched parentheses, or a token
    /// sequence that would underflow the evaluation stack.
    pub fn parse(text: &str) -> Result<Self, EvalError> {
        let tokens = tokenize(text)?;
        if tokens.is_empty() {
            return Err(EvalError::syntax(text, "empty expression"));
        }

        let mut postfix = Vec::with_capacity(tokens.len());
        let mut stack: Vec<Token> = Vec::new();

        for token in tokens {
            match token {
                Token::Number(_) | Token::Identifier(_) => postfix.push(token),
                Token::Operator(op) => {
                    while let Some(Token::Operator(top)) = stack.last() {
                        let pops = if op.is_right_associative() {
                            top.precedence() > op.precedence()
                        } else {
                            top.precedence() >= op.precedence()
                        };

                        if !pops {
                            break;
                        }

                        postfix.extend(stack.pop());
                    }
                    stack.push(Token::Operator(op));
                }
                Token::LeftParen => stack.push(Token::LeftParen),
                Token::RightParen => loop {
                    match stack.pop() {
                        Some(Token::LeftParen) => break,
                        Some(top) => postfix.push(top),
                        None => return Err(EvalError::syntax(text, "mismatched parentheses")),
                    }
                },
            }
        }

        while let Some(top) = stack.pop() {
            if top == Token::LeftParen {
                return Err(EvalError::syntax(text, "mismatched parentheses"));
            }
            postfix.push(top);
        }

        check_arity(text, &postfix)?;

        Ok(Self {
            text: text.to_string(),
            postfix,
        })
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Identifiers referenced by the expression, in order of first appearance
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        let mut seen = Vec::new();
        for token in &self.postfix {
            if let Token::Identifier(name) = token
                && !seen.contains(&name.as_str())
            {
                seen.push(name.as_str());
            }
        }
        seen.into_iter()
    }

    /// Evaluate against a variable map.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::MissingVariable`] naming the first referenced identifier that is
    /// absent from `variables` or holds a non-finite number.
    pub fn evaluate(&self, variables: &Variables) -> Result<f64, EvalError> {
        self.evaluate_with(|name| variables.get(name).copied())
    }

    /// Evaluate using an arbitrary lookup for identifiers.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::MissingVariable`] when `lookup` yields nothing or a non-finite value.
    pub fn evaluate_with(&self, lookup: impl Fn(&str) -> Option<f64>) -> Result<f64, EvalError> {
        let mut stack: Vec<f64> = Vec::with_capacity(self.postfix.len());

        for token in &self.postfix {
            match token {
                Token::Number(value) => stack.push(*value),
                Token::Identifier(name) => {
                    let value = lookup(name)
                        .filter(|v| v.is_finite())
                        .ok_or_else(|| EvalError::MissingVariable(name.clone()))?;
                    stack.push(value);
                }
                Token::Operator(op) => {
                    let (Some(rhs), Some(lhs)) = (stack.pop(), stack.pop()) else {
                        return Err(EvalError::syntax(&self.text, "stack underflow"));
                    };
                    stack.push(op.apply(lhs, rhs));
                }
                Token::LeftParen | Token::RightParen => {
                    return Err(EvalError::syntax(&self.text, "mismatched parentheses"));
                }
            }
        }

        match stack.as_slice() {
            [value] => Ok(*value),
            _ => Err(EvalError::syntax(&self.text, "stack underflow")),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Walk the postfix sequence tracking stack depth so malformed input is rejected at parse time.
fn check_arity(text: &str, postfix: &[Token]) -> Result<(), EvalError> {
    let mut depth = 0_usize;
    for token in postfix {
        match token {
            Token::Number(_) | Token::Identifier(_) => depth += 1,
            Token::Operator(_) => {
                if depth < 2 {
                    return Err(EvalError::syntax(text, "stack underflow"));
                }
                depth -= 1;
            }
            Token::LeftParen | Token::RightParen => return Err(EvalError::syntax(text, "mismatched parentheses")),
        }
    }

    if depth == 1 {
        Ok(())
    } else {
        Err(EvalError::syntax(text, "operands without an operator"))
    }
}

/// Parse and evaluate `expression` in one step.
///
/// # Errors
///
/// Returns [`EvalError::Syntax`] for malformed input and [`EvalError::MissingVariable`] when a
/// referenced identifier cannot be resolved to a finite number.
pub fn evaluate(expression: &str, variables: &Variables) -> Result<f64, EvalError> {
    Expression::parse(expression)?.evaluate(variables)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, f64)]) -> Variables {
        pairs.iter().map(|(k, v)| ((*k).to_string(), *v)).collect()
    }

    #[test]
    fn test_precedence() {
        assert_eq!(evaluate("2 + 3 * 4", &Variables::new()).unwrap(), 14.0);
        assert_eq!(evaluate("(2 + 3) * 4", &Variables::new()).unwrap(), 20.0);
    }

    #[test]
    fn test_left_associativity() {
        assert_eq!(evaluate("10 - 4 - 3", &Variables::new()).unwrap(), 3.0);
        assert_eq!(evaluate("64 / 4 / 2", &Variables::new()).unwrap(), 8.0);
    }

    #[test]
    fn test_variables() {
        let v = vars(&[("COGS", 1200.0), ("InventoryBegin", 100.0), ("InventoryEnd", 300.0)]);
        let result = evaluate("COGS / ((InventoryBegin + InventoryEnd) / 2)", &v).unwrap();
        assert_eq!(result, 6.0);
    }

    #[test]
    fn test_unary_minus() {
        let v = vars(&[("x", 5.0)]);
        assert_eq!(evaluate("-x", &v).unwrap(), -5.0);
        assert_eq!(evaluate("-x * 2", &v).unwrap(), -10.0);
        assert_eq!(evaluate("2 * -x", &v).unwrap(), -10.0);
        assert_eq!(evaluate("3 - -x", &v).unwrap(), 8.0);
        assert_eq!(evaluate("(-x + 1)", &v).unwrap(), -4.0);
        assert_eq!(evaluate("--x", &v).unwrap(), 5.0);
    }

    #[test]
    fn test_missing_variable_named() {
        let v = vars(&[("a", 1.0)]);
        let err = evaluate("a + b", &v).unwrap_err();
        assert_eq!(err, EvalError::MissingVariable("b".into()));
    }

    #[test]
    fn test_non_finite_variable_is_missing() {
        let v = vars(&[("a", f64::NAN), ("b", f64::INFINITY)]);
        assert_eq!(evaluate("a", &v).unwrap_err(), EvalError::MissingVariable("a".into()));
        assert_eq!(evaluate("b", &v).unwrap_err(), EvalError::MissingVariable("b".into()));
    }

    #[test]
    fn test_division_by_zero_is_not_rejected() {
        assert!(evaluate("1 / 0", &Variables::new()).unwrap().is_infinite());
        assert!(evaluate("0 / 0", &Variables::new()).unwrap().is_nan());
    }

    #[test]
    fn test_mismatched_parentheses() {
        for text in ["(a + b", "a + b)", ")(", "((1)"] {
            let err = Expression::parse(text).unwrap_err();
            assert!(
                matches!(&err, EvalError::Syntax { reason, .. } if reason == "mismatched parentheses"),
                "{text}: {err}"
            );
        }
    }

    #[test]
    fn test_stack_underflow() {
        for text in ["a +", "* b", "1 + * 2", "()"] {
            let err = Expression::parse(text).unwrap_err();
            assert!(matches!(err, EvalError::Syntax { .. }), "{text}");
        }
    }

    #[test]
    fn test_operands_without_operator() {
        let err = Expression::parse("a b").unwrap_err();
        assert!(matches!(err, EvalError::Syntax { .. }));
    }

    #[test]
    fn test_empty_expression() {
        let err = Expression::parse("   ").unwrap_err();
        assert_eq!(err, EvalError::syntax("   ", "empty expression"));
    }

    #[test]
    fn test_identifiers_in_order() {
        let expr = Expression::parse("b * (a + b) / c").unwrap();
        let ids: Vec<_> = expr.identifiers().collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_deterministic() {
        let expr = Expression::parse("x / 3").unwrap();
        let v = vars(&[("x", 10.0)]);
        let first = expr.evaluate(&v).unwrap();
        let second = expr.evaluate(&v).unwrap();
        assert_eq!(first.to_bits(), second.to_bits());
    }

    #[test]
    fn test_display_keeps_source_text() {
        let expr = Expression::parse("a+b").unwrap();
        assert_eq!(expr.to_string(), "a+b");
        assert_eq!(expr.text(), "a+b");
    }
}
