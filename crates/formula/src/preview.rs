use serde::{Deserialize, Serialize};

/// Hand-written `vec3` formulas shown in the first gallery slots when preview
/// mode is on. Each is wrapped in the same per-channel normalisation as
/// generated formulas.
const PREVIEW_SOURCES: [&str; 20] = [
    "vec3(texture(t,UV).rg, 1.0)",
    "vec3(texture(t,UV).r, 1.0, texture(t,UV).b)",
    "vec3(1.0, texture(t,UV).gb)",
    "texture(t,UV).bgr",
    "texture(t,UV).rrr",
    "texture(t,UV).ggg",
    "texture(t,UV).bbb",
    "texture(t,UV).gbr",
    "texture(t,UV).brg",
    "texture(t,UV).grb",
    "texture(t,UV).rbr",
    "texture(t,UV).gbg",
    "texture(t,UV).brb",
    "texture(t,UV).bgb",
    "trunc(texture(t,UV).rgb * 8.0)",
    "log(texture(t,UV).rgb)",
    "vec3(texture(t,UV).r / 2.0, texture(t,UV).g / 3.0, texture(t,UV).b / 4.0)",
    "texture(t,UV).rgb * texture(t,UV).rgb",
    "mod(texture(t,UV).rgb, vec3(0.5))",
    "sin(texture(t,UV).rgb * 6.2831853)",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct PreviewFormula(usize);

impl PreviewFormula {
    pub const COUNT: usize = PREVIEW_SOURCES.len();

    /// The preview shown at gallery position `ordinal`, if any.
    pub fn for_ordinal(ordinal: usize) -> Option<Self> {
        (ordinal < Self::COUNT).then_some(Self(ordinal))
    }

    pub fn index(self) -> usize {
        self.0
    }

    pub fn source(self) -> &'static str {
        PREVIEW_SOURCES[self.0]
    }
}

impl TryFrom<usize> for PreviewFormula {
    type Error = String;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        PreviewFormula::for_ordinal(value).ok_or_else(|| {
            format!(
                "preview formula {value} does not exist (have {})",
                PreviewFormula::COUNT
            )
        })
    }
}

impl From<PreviewFormula> for usize {
    fn from(value: PreviewFormula) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn previews_cover_the_first_ordinals_only() {
        assert_eq!(PreviewFormula::for_ordinal(0).unwrap().index(), 0);
        assert!(PreviewFormula::for_ordinal(PreviewFormula::COUNT - 1).is_some());
        assert!(PreviewFormula::for_ordinal(PreviewFormula::COUNT).is_none());
    }

    #[test]
    fn preview_sources_are_balanced() {
        for index in 0..PreviewFormula::COUNT {
            let source = PreviewFormula::for_ordinal(index).unwrap().source();
            assert_eq!(
                source.matches('(').count(),
                source.matches(')').count(),
                "{source}"
            );
        }
    }
}
