use std::fmt;

use serde::{Deserialize, Serialize};

use crate::token::{Channel, Operand, Operator, Token, TokenError};

/// Hard cap on operators in one expression.
pub const MAX_OPERATORS: usize = 16;
/// One leading channel plus an operand/operator pair per operator.
pub const MAX_TOKENS: usize = 2 * MAX_OPERATORS + 1;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExpressionError {
    #[error("expression has no tokens")]
    Empty,
    #[error("expression length {0} is even; expected a channel followed by operand/operator pairs")]
    EvenLength(usize),
    #[error("expression has {0} tokens; at most {MAX_TOKENS} are allowed")]
    TooLong(usize),
    #[error("expression must start with a channel operand, found {0}")]
    HeadNotChannel(Token),
    #[error("token {index} ({token}) should be an operand")]
    ExpectedOperand { index: usize, token: Token },
    #[error("token {index} ({token}) should be an operator")]
    ExpectedOperator { index: usize, token: Token },
    #[error(transparent)]
    Token(#[from] TokenError),
}

/// One operand/operator pair following the leading channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Step {
    pub operand: Operand,
    pub operator: Operator,
}

/// A right-leaning formula: `((head op1 a1) op2 a2) ...`.
///
/// Stored already split into its leading channel and operand/operator pairs so
/// compiling never has to re-check token kinds. The flat token form is what
/// gets serialised.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Token>", into = "Vec<Token>")]
pub struct Expression {
    head: Channel,
    steps: Vec<Step>,
}

impl Expression {
    /// A bare channel sample with no operators.
    pub fn channel(head: Channel) -> Self {
        Self {
            head,
            steps: Vec::new(),
        }
    }

    pub fn new(head: Channel, steps: Vec<Step>) -> Result<Self, ExpressionError> {
        if steps.len() > MAX_OPERATORS {
            return Err(ExpressionError::TooLong(1 + 2 * steps.len()));
        }
        Ok(Self { head, steps })
    }

    pub fn from_tokens(tokens: &[Token]) -> Result<Self, ExpressionError> {
        let Some((&first, rest)) = tokens.split_first() else {
            return Err(ExpressionError::Empty);
        };
        if tokens.len() % 2 == 0 {
            return Err(ExpressionError::EvenLength(tokens.len()));
        }
        if tokens.len() > MAX_TOKENS {
            return Err(ExpressionError::TooLong(tokens.len()));
        }
        let Token::Operand(Operand::Channel(head)) = first else {
            return Err(ExpressionError::HeadNotChannel(first));
        };

        let mut steps = Vec::with_capacity(rest.len() / 2);
        for (pair_index, pair) in rest.chunks_exact(2).enumerate() {
            let index = 1 + pair_index * 2;
            let operand = match pair[0] {
                Token::Operand(operand) => operand,
                token => return Err(ExpressionError::ExpectedOperand { index, token }),
            };
            let operator = match pair[1] {
                Token::Operator(operator) => operator,
                token => {
                    return Err(ExpressionError::ExpectedOperator {
                        index: index + 1,
                        token,
                    })
                }
            };
            steps.push(Step { operand, operator });
        }

        Ok(Self { head, steps })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ExpressionError> {
        let tokens = bytes
            .iter()
            .map(|byte| Token::from_byte(*byte))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_tokens(&tokens)
    }

    pub(crate) fn from_parts(head: Channel, steps: Vec<Step>) -> Self {
        debug_assert!(steps.len() <= MAX_OPERATORS);
        Self { head, steps }
    }

    pub fn head(&self) -> Channel {
        self.head
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn operator_count(&self) -> usize {
        self.steps.len()
    }

    /// Token count; always odd, so never empty.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        1 + 2 * self.steps.len()
    }

    pub fn tokens(&self) -> impl Iterator<Item = Token> + '_ {
        std::iter::once(Token::Operand(Operand::Channel(self.head))).chain(
            self.steps
                .iter()
                .flat_map(|step| [Token::Operand(step.operand), Token::Operator(step.operator)]),
        )
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.tokens().map(Token::to_byte).collect()
    }

    /// Same formula with every channel operand shifted R→G→B→R.
    pub fn rotate_channels(&self) -> Self {
        Self {
            head: self.head.rotated(),
            steps: self
                .steps
                .iter()
                .map(|step| Step {
                    operand: step.operand.rotated(),
                    operator: step.operator,
                })
                .collect(),
        }
    }
}

impl TryFrom<Vec<Token>> for Expression {
    type Error = ExpressionError;

    fn try_from(value: Vec<Token>) -> Result<Self, Self::Error> {
        Expression::from_tokens(&value)
    }
}

impl From<Expression> for Vec<Token> {
    fn from(value: Expression) -> Self {
        value.tokens().collect()
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, token) in self.tokens().enumerate() {
            if index > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{token}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_channel_operand_operator_sequence() {
        let expr = Expression::from_bytes(&[0x10, 0x20, 0x00, 0x12, 0x07]).unwrap();
        assert_eq!(expr.head(), Channel::Red);
        assert_eq!(expr.operator_count(), 2);
        assert_eq!(expr.len(), 5);
        assert_eq!(expr.to_bytes(), vec![0x10, 0x20, 0x00, 0x12, 0x07]);
        assert_eq!(expr.to_string(), "10 20 00 12 07");
    }

    #[test]
    fn rejects_malformed_sequences() {
        assert_eq!(Expression::from_bytes(&[]), Err(ExpressionError::Empty));
        assert_eq!(
            Expression::from_bytes(&[0x10, 0x20]),
            Err(ExpressionError::EvenLength(2))
        );
        assert!(matches!(
            Expression::from_bytes(&[0x20]),
            Err(ExpressionError::HeadNotChannel(_))
        ));
        assert!(matches!(
            Expression::from_bytes(&[0x10, 0x00, 0x00]),
            Err(ExpressionError::ExpectedOperand { index: 1, .. })
        ));
        assert!(matches!(
            Expression::from_bytes(&[0x10, 0x20, 0x11]),
            Err(ExpressionError::ExpectedOperator { index: 2, .. })
        ));
        assert!(matches!(
            Expression::from_bytes(&[0x10, 0x20, 0x09]),
            Err(ExpressionError::Token(TokenError::ReservedOperator(0x09)))
        ));
    }

    #[test]
    fn rejects_more_than_sixteen_operators() {
        let mut bytes = vec![0x10];
        for _ in 0..=MAX_OPERATORS {
            bytes.extend([0x21, 0x02]);
        }
        assert_eq!(
            Expression::from_bytes(&bytes),
            Err(ExpressionError::TooLong(MAX_TOKENS + 2))
        );
        bytes.truncate(MAX_TOKENS);
        assert!(Expression::from_bytes(&bytes).is_ok());
    }

    #[test]
    fn rotation_leaves_constants_and_operators_alone() {
        let expr = Expression::from_bytes(&[0x12, 0x11, 0x01, 0x2a, 0x05]).unwrap();
        let rotated = expr.rotate_channels();
        assert_eq!(rotated.to_bytes(), vec![0x10, 0x12, 0x01, 0x2a, 0x05]);
    }
}
