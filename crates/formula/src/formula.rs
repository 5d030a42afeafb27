use std::fmt;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::compiler::{compile, ShaderExpression};
use crate::expression::Expression;
use crate::generator::ExpressionGenerator;
use crate::preview::PreviewFormula;
use crate::token::Channel;

/// Per-channel token sequences behind one generated image.
///
/// Only red is drawn at random; green and blue are red with its channel
/// operands rotated once and twice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelExpressions {
    pub red: Expression,
    pub green: Expression,
    pub blue: Expression,
}

impl ChannelExpressions {
    pub fn from_red(red: Expression) -> Self {
        let green = red.rotate_channels();
        let blue = green.rotate_channels();
        Self { red, green, blue }
    }

    pub fn get(&self, channel: Channel) -> &Expression {
        match channel {
            Channel::Red => &self.red,
            Channel::Green => &self.green,
            Channel::Blue => &self.blue,
        }
    }

    pub fn compile(&self, channel: Channel) -> ShaderExpression {
        compile(self.get(channel), channel)
    }
}

/// A `vec3` GLSL expression ready to drop into the fragment template.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FragmentBody(String);

impl FragmentBody {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FragmentBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything needed to rebuild a gallery image from scratch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Formula {
    Preview { index: PreviewFormula },
    Generated(ChannelExpressions),
}

impl Formula {
    pub fn fragment_body(&self) -> FragmentBody {
        match self {
            Formula::Preview { index } => FragmentBody(format!(
                "normalizeMult.rgb * ({}) + normalizeAdd.rgb",
                index.source()
            )),
            Formula::Generated(channels) => FragmentBody(format!(
                "vec3({}, {}, {})",
                channels.compile(Channel::Red),
                channels.compile(Channel::Green),
                channels.compile(Channel::Blue)
            )),
        }
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Formula::Preview { index } => write!(f, "preview #{}", index.index()),
            Formula::Generated(channels) => write!(f, "[{}]", channels.red),
        }
    }
}

/// Source of formulas for gallery ordinals.
///
/// Owns its RNG so a seed fixes the whole sequence of generated images.
#[derive(Debug, Clone)]
pub struct FormulaFactory {
    generator: ExpressionGenerator,
    rng: StdRng,
    previews: bool,
}

impl FormulaFactory {
    pub fn new(generator: ExpressionGenerator, seed: u64, previews: bool) -> Self {
        Self {
            generator,
            rng: StdRng::seed_from_u64(seed),
            previews,
        }
    }

    pub fn formula_for(&mut self, ordinal: usize) -> Formula {
        if self.previews {
            if let Some(index) = PreviewFormula::for_ordinal(ordinal) {
                return Formula::Preview { index };
            }
        }
        self.generate()
    }

    /// A fresh generated formula, regardless of preview mode.
    pub fn generate(&mut self) -> Formula {
        Formula::Generated(ChannelExpressions::from_red(
            self.generator.generate(&mut self.rng),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swizzled_channels_rotate_red() {
        let red = Expression::from_bytes(&[0x10, 0x12, 0x02]).unwrap();
        let channels = ChannelExpressions::from_red(red);
        assert_eq!(channels.green.to_bytes(), vec![0x11, 0x10, 0x02]);
        assert_eq!(channels.blue.to_bytes(), vec![0x12, 0x11, 0x02]);
    }

    #[test]
    fn generated_body_assembles_three_channels() {
        let formula = Formula::Generated(ChannelExpressions::from_red(
            Expression::from_bytes(&[0x10]).unwrap(),
        ));
        assert_eq!(
            formula.fragment_body().as_str(),
            "vec3(normalizeMult.r * (texture(t,UV).r) + normalizeAdd.r, \
             normalizeMult.g * (texture(t,UV).g) + normalizeAdd.g, \
             normalizeMult.b * (texture(t,UV).b) + normalizeAdd.b)"
        );
    }

    #[test]
    fn preview_body_wraps_table_entry() {
        let formula = Formula::Preview {
            index: PreviewFormula::for_ordinal(3).unwrap(),
        };
        assert_eq!(
            formula.fragment_body().as_str(),
            "normalizeMult.rgb * (texture(t,UV).bgr) + normalizeAdd.rgb"
        );
    }

    #[test]
    fn factory_uses_previews_only_when_enabled() {
        let mut with_previews = FormulaFactory::new(ExpressionGenerator::default(), 1, true);
        assert!(matches!(
            with_previews.formula_for(0),
            Formula::Preview { .. }
        ));
        assert!(matches!(
            with_previews.formula_for(PreviewFormula::COUNT),
            Formula::Generated(_)
        ));

        let mut plain = FormulaFactory::new(ExpressionGenerator::default(), 1, false);
        assert!(matches!(plain.formula_for(0), Formula::Generated(_)));
        assert!(matches!(with_previews.generate(), Formula::Generated(_)));
    }

    #[test]
    fn same_seed_yields_same_formulas() {
        let mut a = FormulaFactory::new(ExpressionGenerator::default(), 77, false);
        let mut b = FormulaFactory::new(ExpressionGenerator::default(), 77, false);
        for ordinal in 0..32 {
            assert_eq!(a.formula_for(ordinal), b.formula_for(ordinal));
        }
    }
}
