use super::EvalError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,

    /// Unary minus. Evaluated as `0 - x` against a synthesized zero operand, but binds tighter
    /// than any binary operator and associates to the right.
    Negate,
}

impl Operator {
    const fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Self::Add),
            '-' => Some(Self::Subtract),
            '*' => Some(Self::Multiply),
            '/' => Some(Self::Divide),
            _ => None,
        }
    }

    pub const fn precedence(self) -> u8 {
        match self {
            Self::Add | Self::Subtract => 1,
            Self::Multiply | Self::Divide => 2,
            Self::Negate => 3,
        }
    }

    pub const fn is_right_associative(self) -> bool {
        matches!(self, Self::Negate)
    }

    /// Division is plain IEEE division, so a zero divisor yields infinity or NaN.
    pub fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            Self::Add => lhs + rhs,
            Self::Subtract | Self::Negate => lhs - rhs,
            Self::Multiply => lhs * rhs,
            Self::Divide => lhs / rhs,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Identifier(String),
    Operator(Operator),
    LeftParen,
    RightParen,
}

impl Token {
    /// Whether a `-` following this token starts a new operand rather than subtracting.
    const fn expects_operand_after(&self) -> bool {
        matches!(self, Self::Operator(_) | Self::LeftParen)
    }
}

/// Split an expression into tokens, left to right.
///
/// A `-` at the start of the expression, right after another operator, or right after `(` is
/// unary: it is emitted as a synthesized `0` operand followed by [`Operator::Negate`].
pub fn tokenize(expression: &str) -> Result<Vec<Token>, EvalError> {
    let mut tokens: Vec<Token> = Vec::new();
    let mut chars = expression.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            let _ = chars.next();
            continue;
        }

        if c.is_ascii_digit() || c == '.' {
            let mut end = start;
            while let Some(&(i, d)) = chars.peek() {
                if d.is_ascii_digit() || d == '.' {
                    end = i + d.len_utf8();
                    let _ = chars.next();
                } else {
                    break;
                }
            }

            let literal = expression.get(start..end).unwrap_or_default();
            let value = literal
                .parse::<f64>()
                .map_err(|_e| EvalError::syntax(expression, format!("invalid numeric literal '{literal}'")))?;
            tokens.push(Token::Number(value));
            continue;
        }

        if c.is_ascii_alphabetic() || c == '_' {
            let mut end = start;
            while let Some(&(i, d)) = chars.peek() {
                if d.is_ascii_alphanumeric() || d == '_' {
                    end = i + d.len_utf8();
                    let _ = chars.next();
                } else {
                    break;
                }
            }

            tokens.push(Token::Identifier(expression.get(start..end).unwrap_or_default().to_string()));
            continue;
        }

        let _ = chars.next();
        match c {
            '(' => tokens.push(Token::LeftParen),
            ')' => tokens.push(Token::RightParen),
            '-' if tokens.last().is_none_or(Token::expects_operand_after) => {
                tokens.push(Token::Number(0.0));
                tokens.push(Token::Operator(Operator::Negate));
            }
            _ => match Operator::from_char(c) {
                Some(op) => tokens.push(Token::Operator(op)),
                None => return Err(EvalError::syntax(expression, format!("invalid character '{c}'"))),
            },
        }
    }

    Ok(tokens)
}
