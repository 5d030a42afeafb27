//! Random pixel formulas and their GLSL rendering.
//!
//! A formula is a short byte string: a channel sample followed by
//! operand/operator pairs, read as a right-leaning tree. [`ExpressionGenerator`]
//! draws them, [`compile`] turns one into normalised GLSL for a single output
//! channel, and [`Formula`] ties three channels (or a fixed preview) together
//! into the fragment body the renderer consumes.

mod compiler;
mod expression;
mod formula;
mod generator;
mod preview;
mod token;
mod writer;

pub use compiler::{capacity_for, compile, ShaderExpression};
pub use expression::{Expression, ExpressionError, Step, MAX_OPERATORS, MAX_TOKENS};
pub use formula::{ChannelExpressions, Formula, FormulaFactory, FragmentBody};
pub use generator::ExpressionGenerator;
pub use preview::PreviewFormula;
pub use token::{Arity, Channel, Constant, Operand, Operator, OperatorSyntax, Token, TokenError};
pub use writer::{CapacityError, TwoEndedWriter};
