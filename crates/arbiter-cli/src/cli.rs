//! Command-line arguments.

use std::path::PathBuf;

use arbiter_core::EvaluatorMode;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "arbiter", version, about = "Judge RAG answers for relevancy and factual support")]
pub struct Cli {
    /// Evaluator mode; overrides the mode in any configuration file
    /// (relevancy when neither is given)
    #[arg(long, global = true, value_parser = parse_mode)]
    pub mode: Option<EvaluatorMode>,

    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the judge prompt for a request
    Render {
        /// Harness configuration (YAML or JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Request file (YAML or JSON)
        #[arg(short, long)]
        request: PathBuf,
    },

    /// Classify a judge reply and print the resulting response
    Classify {
        /// Harness configuration (YAML or JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// The judge reply
        reply: String,
    },

    /// Evaluate one request or a list of requests
    Evaluate {
        /// Request file holding one request or a list (YAML or JSON)
        #[arg(short, long)]
        request: PathBuf,

        /// Runtime configuration with harness and provider settings
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Use this reply instead of calling the configured provider
        #[arg(long)]
        reply: Option<String>,
    },
}

fn parse_mode(value: &str) -> Result<EvaluatorMode, String> {
    value.parse().map_err(|e: arbiter_core::ConfigurationError| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_evaluate_with_reply() {
        let cli = Cli::try_parse_from([
            "arbiter",
            "--mode",
            "factchecking",
            "evaluate",
            "--request",
            "req.json",
            "--reply",
            "NO",
        ])
        .unwrap();
        assert_eq!(cli.mode, Some(EvaluatorMode::FactChecking));
        assert!(matches!(cli.command, Command::Evaluate { reply: Some(ref r), .. } if r == "NO"));
    }

    #[test]
    fn test_mode_is_unset_by_default() {
        let cli = Cli::try_parse_from(["arbiter", "classify", "YES"]).unwrap();
        assert_eq!(cli.mode, None);
    }

    #[test]
    fn test_mode_accepted_after_subcommand() {
        let cli = Cli::try_parse_from([
            "arbiter",
            "evaluate",
            "--config",
            "runtime.yaml",
            "--request",
            "req.json",
            "--mode",
            "fact_checking",
        ])
        .unwrap();
        assert_eq!(cli.mode, Some(EvaluatorMode::FactChecking));
        assert!(matches!(cli.command, Command::Evaluate { config: Some(_), reply: None, .. }));
    }

    #[test]
    fn test_unknown_mode_rejected() {
        assert!(Cli::try_parse_from(["arbiter", "--mode", "vibes", "classify", "YES"]).is_err());
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
