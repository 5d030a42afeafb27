use rand::Rng;

use crate::expression::{Expression, Step, MAX_OPERATORS};
use crate::token::{Channel, Constant, Operand, Operator};

/// Draws random formulas whose operator count is geometric with p = 0.5.
///
/// `P(at most k operators) = 1 - 2^-(k+1)`, truncated at `max_operators`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpressionGenerator {
    max_operators: usize,
}

impl Default for ExpressionGenerator {
    fn default() -> Self {
        Self {
            max_operators: MAX_OPERATORS,
        }
    }
}

impl ExpressionGenerator {
    /// Caps at [`MAX_OPERATORS`] regardless of the request.
    pub fn new(max_operators: usize) -> Self {
        Self {
            max_operators: max_operators.min(MAX_OPERATORS),
        }
    }

    pub fn max_operators(&self) -> usize {
        self.max_operators
    }

    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Expression {
        let head = random_channel(rng);
        let mut steps = Vec::new();
        while steps.len() < self.max_operators && rng.gen_bool(0.5) {
            let operand = if rng.gen_bool(0.5) {
                Operand::Channel(random_channel(rng))
            } else {
                Operand::Constant(random_constant(rng))
            };
            let operator = Operator::ALL[rng.gen_range(0..Operator::ALL.len())];
            steps.push(Step { operand, operator });
        }
        Expression::from_parts(head, steps)
    }
}

fn random_channel<R: Rng + ?Sized>(rng: &mut R) -> Channel {
    Channel::ALL[rng.gen_range(0..Channel::ALL.len())]
}

fn random_constant<R: Rng + ?Sized>(rng: &mut R) -> Constant {
    Constant::from_low_nibble(rng.gen_range(0..Constant::COUNT as u8))
}
