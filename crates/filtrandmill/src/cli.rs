use std::path::PathBuf;

use clap::{Parser, Subcommand};
use formula::Expression;

#[derive(Parser, Debug)]
#[command(
    name = "filtrandmill",
    author,
    version,
    about = "Scrollable gallery of randomly generated image filters",
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Parser, Debug, Default)]
pub struct RunArgs {
    /// Configuration file to use instead of the discovered `gallery.toml`.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Image every formula filters (overrides `input.image`).
    #[arg(long, value_name = "FILE")]
    pub image: Option<PathBuf>,

    /// Fix the generator seed so the gallery is reproducible.
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Initial window size (e.g. `1280x900`).
    #[arg(long, value_name = "WIDTHxHEIGHT")]
    pub size: Option<String>,

    /// Fill the first slots with the hand-written preview formulas.
    #[arg(long)]
    pub preview_formulas: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print generated or supplied expressions with their shader code.
    Formula(FormulaArgs),
    /// Print the effective configuration as TOML.
    Config,
}

#[derive(Parser, Debug)]
pub struct FormulaArgs {
    /// Generator seed; defaults to `generator.seed` or a random one.
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// How many expressions to generate.
    #[arg(long, value_name = "K", default_value_t = 1)]
    pub count: usize,

    /// Compile this token sequence instead of generating (repeatable).
    #[arg(long = "tokens", value_name = "HEX,...", value_parser = parse_expression)]
    pub tokens: Vec<Expression>,

    /// Emit JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

pub fn parse() -> Cli {
    Cli::parse()
}

/// Parses token bytes written as hex, separated by commas or whitespace
/// (`10,20,00` or `0x10 0x20 0x00`).
pub fn parse_expression(value: &str) -> Result<Expression, String> {
    let bytes = value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let digits = part
                .strip_prefix("0x")
                .or_else(|| part.strip_prefix("0X"))
                .unwrap_or(part);
            u8::from_str_radix(digits, 16).map_err(|_| format!("invalid token byte '{part}'"))
        })
        .collect::<Result<Vec<u8>, String>>()?;
    Expression::from_bytes(&bytes).map_err(|err| err.to_string())
}

pub fn parse_window_size(value: &str) -> Result<(u32, u32), String> {
    let (width, height) = value
        .trim()
        .split_once(['x', 'X', '×'])
        .ok_or_else(|| "expected WxH format, e.g. 1280x900".to_string())?;
    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| "invalid width in size specification".to_string())?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| "invalid height in size specification".to_string())?;
    if width == 0 || height == 0 {
        return Err("window dimensions must be greater than zero".to_string());
    }
    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_token_lists() {
        let expr = parse_expression("10,20,00").unwrap();
        assert_eq!(expr.to_bytes(), vec![0x10, 0x20, 0x00]);

        let spaced = parse_expression("0x10 0x21 0x03").unwrap();
        assert_eq!(spaced.to_bytes(), vec![0x10, 0x21, 0x03]);
    }

    #[test]
    fn rejects_bad_token_lists() {
        assert!(parse_expression("").is_err());
        assert!(parse_expression("zz").is_err());
        assert!(parse_expression("10,20").is_err());
        assert!(parse_expression("20").is_err());
    }

    #[test]
    fn parses_window_sizes() {
        assert_eq!(parse_window_size("1280x900").unwrap(), (1280, 900));
        assert_eq!(parse_window_size(" 640 X 480 ").unwrap(), (640, 480));
        assert!(parse_window_size("1280").is_err());
        assert!(parse_window_size("0x900").is_err());
    }

    #[test]
    fn subcommands_parse() {
        let cli = Cli::try_parse_from([
            "filtrandmill",
            "formula",
            "--count",
            "3",
            "--tokens",
            "10,20,00",
            "--json",
        ])
        .unwrap();
        match cli.command {
            Some(Command::Formula(args)) => {
                assert_eq!(args.count, 3);
                assert_eq!(args.tokens.len(), 1);
                assert!(args.json);
            }
            other => panic!("unexpected command: {other:?}"),
        }

        let cli = Cli::try_parse_from(["filtrandmill", "config", "--config", "x.toml"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Config)));
        assert_eq!(cli.run.config, Some(PathBuf::from("x.toml")));
    }
}
