use anyhow::Result;
use formula::{Channel, ChannelExpressions, ExpressionGenerator, Formula, FormulaFactory};
use serde::Serialize;

use crate::cli::{FormulaArgs, RunArgs};
use crate::run::effective_config;

/// One printed expression: its tokens plus the GLSL each channel compiles to.
#[derive(Debug, Serialize)]
pub struct FormulaReport {
    pub index: usize,
    pub formula: Formula,
    pub red: String,
    pub green: String,
    pub blue: String,
}

impl FormulaReport {
    pub fn new(index: usize, channels: ChannelExpressions) -> Self {
        let red = channels.compile(Channel::Red).into_string();
        let green = channels.compile(Channel::Green).into_string();
        let blue = channels.compile(Channel::Blue).into_string();
        Self {
            index,
            formula: Formula::Generated(channels),
            red,
            green,
            blue,
        }
    }
}

pub fn print_formulas(run_args: &RunArgs, args: FormulaArgs) -> Result<()> {
    let config = effective_config(run_args)?;
    let seed = args
        .seed
        .or(config.generator.seed)
        .unwrap_or_else(rand::random);
    let reports = build_reports(&args, seed, config.generator.max_operators);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        if args.tokens.is_empty() {
            println!("seed: {seed}");
        }
        for report in &reports {
            print_report(report);
        }
    }
    Ok(())
}

/// Supplied token sequences win over generation.
pub fn build_reports(args: &FormulaArgs, seed: u64, max_operators: usize) -> Vec<FormulaReport> {
    if !args.tokens.is_empty() {
        return args
            .tokens
            .iter()
            .cloned()
            .enumerate()
            .map(|(index, red)| FormulaReport::new(index, ChannelExpressions::from_red(red)))
            .collect();
    }

    let mut factory = FormulaFactory::new(ExpressionGenerator::new(max_operators), seed, false);
    (0..args.count)
        .filter_map(|index| match factory.formula_for(index) {
            Formula::Generated(channels) => Some(FormulaReport::new(index, channels)),
            Formula::Preview { .. } => None,
        })
        .collect()
}

fn print_report(report: &FormulaReport) {
    print!("{}", render_report(report));
}

/// `Formula`'s display already brackets the token listing.
fn render_report(report: &FormulaReport) -> String {
    format!(
        "#{} {}\n  red:   {}\n  green: {}\n  blue:  {}\n",
        report.index, report.formula, report.red, report.green, report.blue
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::parse_expression;

    fn args(count: usize, tokens: &[&str]) -> FormulaArgs {
        FormulaArgs {
            seed: None,
            count,
            tokens: tokens
                .iter()
                .map(|value| parse_expression(value).unwrap())
                .collect(),
            json: false,
        }
    }

    #[test]
    fn same_seed_prints_same_formulas() {
        let first = build_reports(&args(4, &[]), 42, 16);
        let second = build_reports(&args(4, &[]), 42, 16);

        assert_eq!(first.len(), 4);
        let texts = |reports: &[FormulaReport]| -> Vec<String> {
            reports.iter().map(|r| r.red.clone()).collect()
        };
        assert_eq!(texts(&first), texts(&second));
    }

    #[test]
    fn supplied_tokens_skip_generation() {
        let reports = build_reports(&args(10, &["10,20,00"]), 1, 16);

        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].index, 0);
        let Formula::Generated(channels) = &reports[0].formula else {
            panic!("supplied tokens must produce a generated formula");
        };
        assert_eq!(channels.red.to_bytes(), vec![0x10, 0x20, 0x00]);
        assert_eq!(channels.green.to_bytes(), vec![0x11, 0x20, 0x00]);
        assert_eq!(channels.blue.to_bytes(), vec![0x12, 0x20, 0x00]);
    }

    #[test]
    fn report_header_brackets_tokens_once() {
        let reports = build_reports(&args(2, &["10,20,00", "12"]), 1, 16);

        let first = render_report(&reports[0]);
        assert!(first.starts_with("#0 [10 20 00]\n"), "got {first:?}");
        assert!(render_report(&reports[1]).starts_with("#1 [12]\n"));
        assert!(!first.contains("[["));
    }

    #[test]
    fn reports_serialise_tokens_and_code() {
        let reports = build_reports(&args(1, &["10"]), 1, 16);
        let json = serde_json::to_value(&reports).unwrap();

        assert_eq!(json[0]["index"], 0);
        assert_eq!(json[0]["formula"]["kind"], "generated");
        assert_eq!(json[0]["formula"]["red"], serde_json::json!([16]));
        assert_eq!(json[0]["red"], reports[0].red);
    }
}
