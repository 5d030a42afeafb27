//! Byte-tagged formula tokens.
//!
//! The high nibble of a token byte selects its kind: `0x0_` operators, `0x1_`
//! channel operands, `0x2_`/`0x3_` constant operands. Decoding goes through
//! [`Token::from_byte`], which rejects reserved codes instead of indexing past
//! a table.

use std::fmt;

use serde::{Deserialize, Serialize};

const OPERATOR_BASE: u8 = 0x00;
const CHANNEL_BASE: u8 = 0x10;
const CONSTANT_BASE: u8 = 0x20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("operator code {0:#04x} is reserved")]
    ReservedOperator(u8),
    #[error("channel code {0:#04x} is reserved")]
    ReservedChannel(u8),
    #[error("byte {0:#04x} is not a formula token")]
    Unknown(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Unary,
    Binary,
}

/// Text emitted around an operator's operands.
///
/// Binary operators render as `prefix lhs infix rhs suffix`; unary ones as
/// `prefix lhs suffix` with an empty infix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorSyntax {
    pub prefix: &'static str,
    pub infix: &'static str,
    pub suffix: &'static str,
    pub arity: Arity,
}

impl OperatorSyntax {
    const fn binary(prefix: &'static str, infix: &'static str, suffix: &'static str) -> Self {
        Self {
            prefix,
            infix,
            suffix,
            arity: Arity::Binary,
        }
    }

    const fn unary(prefix: &'static str, suffix: &'static str) -> Self {
        Self {
            prefix,
            infix: "",
            suffix,
            arity: Arity::Unary,
        }
    }

    pub fn text_len(&self) -> usize {
        self.prefix.len() + self.infix.len() + self.suffix.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    /// `pow(abs(a), abs(b))`
    Pow,
    /// `log(abs(a))`
    Log,
    Mod,
    Sin,
}

impl Operator {
    pub const ALL: [Operator; 8] = [
        Operator::Add,
        Operator::Sub,
        Operator::Mul,
        Operator::Div,
        Operator::Pow,
        Operator::Log,
        Operator::Mod,
        Operator::Sin,
    ];

    pub fn code(self) -> u8 {
        OPERATOR_BASE
            + match self {
                Operator::Add => 0,
                Operator::Sub => 1,
                Operator::Mul => 2,
                Operator::Div => 3,
                Operator::Pow => 4,
                Operator::Log => 5,
                Operator::Mod => 6,
                Operator::Sin => 7,
            }
    }

    pub fn syntax(self) -> OperatorSyntax {
        match self {
            Operator::Add => OperatorSyntax::binary("(", "+", ")"),
            Operator::Sub => OperatorSyntax::binary("(", "-", ")"),
            Operator::Mul => OperatorSyntax::binary("(", "*", ")"),
            Operator::Div => OperatorSyntax::binary("(", "/", ")"),
            Operator::Pow => OperatorSyntax::binary("pow(abs(", "),abs(", "))"),
            Operator::Log => OperatorSyntax::unary("log(abs(", "))"),
            Operator::Mod => OperatorSyntax::binary("mod(", ",", ")"),
            Operator::Sin => OperatorSyntax::unary("sin(", ")"),
        }
    }

    pub fn arity(self) -> Arity {
        self.syntax().arity
    }

    /// How many parentheses deeper the left operand sits once this operator wraps it.
    pub fn nesting(self) -> usize {
        self.syntax().prefix.matches('(').count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Red,
    Green,
    Blue,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Red, Channel::Green, Channel::Blue];

    pub fn code(self) -> u8 {
        CHANNEL_BASE + self.index() as u8
    }

    pub fn index(self) -> usize {
        match self {
            Channel::Red => 0,
            Channel::Green => 1,
            Channel::Blue => 2,
        }
    }

    /// GLSL swizzle component for this channel.
    pub fn component(self) -> char {
        match self {
            Channel::Red => 'r',
            Channel::Green => 'g',
            Channel::Blue => 'b',
        }
    }

    pub fn sample_text(self) -> &'static str {
        match self {
            Channel::Red => "texture(t,UV).r",
            Channel::Green => "texture(t,UV).g",
            Channel::Blue => "texture(t,UV).b",
        }
    }

    /// Red becomes green, green becomes blue, blue wraps to red.
    pub fn rotated(self) -> Self {
        match self {
            Channel::Red => Channel::Green,
            Channel::Green => Channel::Blue,
            Channel::Blue => Channel::Red,
        }
    }
}

/// Float literals use an explicit decimal point so no operator sees an integer
/// operand. Negated values carry a leading space to keep `-` infixes from
/// fusing into `--`.
const CONSTANT_LITERALS: [&str; 16] = [
    "0.1", "0.3", "0.7", "0.9", "1.5", "2.5", "6.0", "10.0", " -0.1", " -0.3", " -0.7", " -0.9",
    " -1.5", " -2.5", " -6.0", " -10.0",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Constant(u8);

impl Constant {
    pub const COUNT: usize = CONSTANT_LITERALS.len();

    pub fn new(index: u8) -> Option<Self> {
        (usize::from(index) < Self::COUNT).then_some(Self(index))
    }

    /// Any byte maps onto the table through its low nibble.
    pub(crate) fn from_low_nibble(byte: u8) -> Self {
        Self(byte & 0x0F)
    }

    pub fn index(self) -> u8 {
        self.0
    }

    pub fn code(self) -> u8 {
        CONSTANT_BASE | self.0
    }

    pub fn literal(self) -> &'static str {
        CONSTANT_LITERALS[usize::from(self.0)]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operand {
    Channel(Channel),
    Constant(Constant),
}

impl Operand {
    pub fn text(self) -> &'static str {
        match self {
            Operand::Channel(channel) => channel.sample_text(),
            Operand::Constant(constant) => constant.literal(),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Operand::Channel(channel) => channel.code(),
            Operand::Constant(constant) => constant.code(),
        }
    }

    pub(crate) fn rotated(self) -> Self {
        match self {
            Operand::Channel(channel) => Operand::Channel(channel.rotated()),
            constant @ Operand::Constant(_) => constant,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Token {
    Operator(Operator),
    Operand(Operand),
}

impl Token {
    pub fn from_byte(byte: u8) -> Result<Self, TokenError> {
        match byte & 0xF0 {
            0x00 => Operator::ALL
                .get(usize::from(byte))
                .map(|op| Token::Operator(*op))
                .ok_or(TokenError::ReservedOperator(byte)),
            0x10 => Channel::ALL
                .get(usize::from(byte - CHANNEL_BASE))
                .map(|channel| Token::Operand(Operand::Channel(*channel)))
                .ok_or(TokenError::ReservedChannel(byte)),
            0x20 | 0x30 => Ok(Token::Operand(Operand::Constant(
                Constant::from_low_nibble(byte),
            ))),
            _ => Err(TokenError::Unknown(byte)),
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            Token::Operator(op) => op.code(),
            Token::Operand(operand) => operand.code(),
        }
    }

    /// Upper bound on the text this token contributes to a compiled formula.
    pub fn max_text_len(self) -> usize {
        match self {
            Token::Operator(op) => op.syntax().text_len(),
            Token::Operand(operand) => operand.text().len(),
        }
    }
}

impl TryFrom<u8> for Token {
    type Error = TokenError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Token::from_byte(value)
    }
}

impl From<Token> for u8 {
    fn from(value: Token) -> Self {
        value.to_byte()
    }
}

impl From<Operand> for Token {
    fn from(value: Operand) -> Self {
        Token::Operand(value)
    }
}

impl From<Operator> for Token {
    fn from(value: Operator) -> Self {
        Token::Operator(value)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}", self.to_byte())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_every_implemented_code() {
        for code in 0x00..=0x07 {
            assert!(matches!(Token::from_byte(code), Ok(Token::Operator(_))));
        }
        for code in 0x10..=0x12 {
            assert!(matches!(
                Token::from_byte(code),
                Ok(Token::Operand(Operand::Channel(_)))
            ));
        }
        for code in 0x20..=0x3F {
            assert!(matches!(
                Token::from_byte(code),
                Ok(Token::Operand(Operand::Constant(_)))
            ));
        }
    }

    #[test]
    fn rejects_reserved_and_unknown_codes() {
        assert_eq!(Token::from_byte(0x08), Err(TokenError::ReservedOperator(0x08)));
        assert_eq!(Token::from_byte(0x0F), Err(TokenError::ReservedOperator(0x0F)));
        assert_eq!(Token::from_byte(0x13), Err(TokenError::ReservedChannel(0x13)));
        assert_eq!(Token::from_byte(0x40), Err(TokenError::Unknown(0x40)));
        assert_eq!(Token::from_byte(0xFF), Err(TokenError::Unknown(0xFF)));
    }

    #[test]
    fn constant_aliases_share_the_low_nibble() {
        let canonical = Token::from_byte(0x25).unwrap();
        let alias = Token::from_byte(0x35).unwrap();
        assert_eq!(canonical, alias);
        assert_eq!(alias.to_byte(), 0x25);
    }

    #[test]
    fn constant_table_matches_magnitudes() {
        assert_eq!(Constant::new(0).unwrap().literal(), "0.1");
        assert_eq!(Constant::new(7).unwrap().literal(), "10.0");
        assert_eq!(Constant::new(8).unwrap().literal(), " -0.1");
        assert_eq!(Constant::new(15).unwrap().literal(), " -10.0");
        assert!(Constant::new(16).is_none());
    }

    #[test]
    fn arity_split_matches_operator_set() {
        let unary: Vec<_> = Operator::ALL
            .iter()
            .filter(|op| op.arity() == Arity::Unary)
            .collect();
        assert_eq!(unary, vec![&Operator::Log, &Operator::Sin]);
        assert_eq!(Operator::Pow.nesting(), 2);
        assert_eq!(Operator::Add.nesting(), 1);
    }

    #[test]
    fn rotation_cycles_through_channels() {
        let mut channel = Channel::Red;
        for expected in [Channel::Green, Channel::Blue, Channel::Red] {
            channel = channel.rotated();
            assert_eq!(channel, expected);
        }
    }
}
