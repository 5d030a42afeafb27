//! Expression → GLSL text.
//!
//! Pairs are consumed from the end of the expression, so the outermost
//! operator is written first: its prefix goes to the head of the buffer, its
//! suffix, operand, and infix are pushed onto the tail. Once every pair is
//! written the leading channel lands on the head side and the two halves are
//! joined. Nothing is built as a tree and the buffer is sized once.

use std::fmt;

use crate::expression::Expression;
use crate::token::{Arity, Channel};
use crate::writer::{CapacityError, TwoEndedWriter};

/// GLSL source for one normalised output channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShaderExpression(String);

impl ShaderExpression {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for ShaderExpression {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShaderExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

struct Wrapper {
    open: &'static str,
    close: &'static str,
}

fn wrapper(output: Channel) -> Wrapper {
    match output {
        Channel::Red => Wrapper {
            open: "normalizeMult.r * (",
            close: ") + normalizeAdd.r",
        },
        Channel::Green => Wrapper {
            open: "normalizeMult.g * (",
            close: ") + normalizeAdd.g",
        },
        Channel::Blue => Wrapper {
            open: "normalizeMult.b * (",
            close: ") + normalizeAdd.b",
        },
    }
}

/// Worst-case byte length of `compile(expression, output)`.
pub fn capacity_for(expression: &Expression, output: Channel) -> usize {
    let wrapper = wrapper(output);
    let tokens: usize = expression.tokens().map(|token| token.max_text_len()).sum();
    wrapper.open.len() + wrapper.close.len() + tokens
}

/// Compiles `expression` into the affine-normalised formula for `output`.
///
/// # Panics
///
/// Panics if the per-token length table under-estimates the text written,
/// which would mean the table and the operator syntax have drifted apart.
pub fn compile(expression: &Expression, output: Channel) -> ShaderExpression {
    let mut writer = TwoEndedWriter::with_capacity(capacity_for(expression, output));
    if let Err(err) = write_expression(&mut writer, expression, &wrapper(output)) {
        panic!("formula text outgrew its precomputed capacity: {err}");
    }
    ShaderExpression(writer.finish())
}

fn write_expression(
    writer: &mut TwoEndedWriter,
    expression: &Expression,
    wrapper: &Wrapper,
) -> Result<(), CapacityError> {
    writer.append_front(wrapper.open)?;
    writer.append_back(wrapper.close)?;

    for step in expression.steps().iter().rev() {
        let syntax = step.operator.syntax();
        writer.append_front(syntax.prefix)?;
        writer.append_back(syntax.suffix)?;
        if syntax.arity == Arity::Binary {
            writer.append_back(step.operand.text())?;
            writer.append_back(syntax.infix)?;
        }
    }

    writer.append_front(expression.head().sample_text())
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::generator::ExpressionGenerator;

    fn max_depth(text: &str) -> usize {
        let mut depth = 0usize;
        let mut deepest = 0usize;
        for ch in text.chars() {
            match ch {
                '(' => {
                    depth += 1;
                    deepest = deepest.max(depth);
                }
                ')' => {
                    depth = depth.checked_sub(1).expect("closing parenthesis without opener");
                }
                _ => {}
            }
        }
        assert_eq!(depth, 0, "unbalanced parentheses in {text}");
        deepest
    }

    #[test]
    fn bare_channel_is_wrapped_directly() {
        let expr = Expression::from_bytes(&[0x10]).unwrap();
        let text = compile(&expr, Channel::Red);
        assert_eq!(
            text.as_str(),
            "normalizeMult.r * (texture(t,UV).r) + normalizeAdd.r"
        );
    }

    #[test]
    fn add_of_constant_nests_inside_wrapper() {
        let expr = Expression::from_bytes(&[0x10, 0x20, 0x00]).unwrap();
        let text = compile(&expr, Channel::Red);
        assert_eq!(
            text.as_str(),
            "normalizeMult.r * ((texture(t,UV).r+0.1)) + normalizeAdd.r"
        );
    }

    #[test]
    fn outermost_operator_is_last_in_sequence() {
        // (((r / g) pow 2.5) sin)
        let expr = Expression::from_bytes(&[0x10, 0x11, 0x03, 0x25, 0x04, 0x22, 0x07]).unwrap();
        let text = compile(&expr, Channel::Blue);
        assert_eq!(
            text.as_str(),
            "normalizeMult.b * (sin(pow(abs((texture(t,UV).r/texture(t,UV).g)),abs(2.5)))) + normalizeAdd.b"
        );
    }

    #[test]
    fn unary_operators_skip_their_paired_operand() {
        let expr = Expression::from_bytes(&[0x11, 0x2f, 0x05]).unwrap();
        let text = compile(&expr, Channel::Green);
        assert_eq!(
            text.as_str(),
            "normalizeMult.g * (log(abs(texture(t,UV).g))) + normalizeAdd.g"
        );
        assert!(!text.as_str().contains("-10.0"));
    }

    #[test]
    fn negative_constant_keeps_minus_signs_apart() {
        let expr = Expression::from_bytes(&[0x10, 0x28, 0x01]).unwrap();
        let text = compile(&expr, Channel::Red);
        assert!(text.as_str().contains("texture(t,UV).r- -0.1"));
    }

    #[test]
    fn generated_formulas_stay_balanced_and_within_capacity() {
        let generator = ExpressionGenerator::default();
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..2_000 {
            let expr = generator.generate(&mut rng);
            let text = compile(&expr, Channel::Red);
            assert!(text.as_str().len() <= capacity_for(&expr, Channel::Red));
            let nesting: usize = expr.steps().iter().map(|step| step.operator.nesting()).sum();
            // wrapper paren + operator nesting + the head channel's texture() call
            assert_eq!(max_depth(text.as_str()), 1 + nesting + 1, "{expr}");
        }
    }

    #[test]
    fn compiling_twice_is_byte_identical() {
        let generator = ExpressionGenerator::default();
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..200 {
            let expr = generator.generate(&mut rng);
            assert_eq!(compile(&expr, Channel::Green), compile(&expr, Channel::Green));
        }
    }
}
