//! Command-line interface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Hand-gesture sequence recognizer: classify tracked hands and fire
/// commands for timed gesture sequences.
#[derive(Parser, Debug)]
#[command(name = "holo-gesture")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Feed frames through the classifier and sequencer
    Run(RunArgs),

    /// Classify every frame of a JSON-lines recording
    Classify {
        /// Recording to read
        frames: PathBuf,

        /// Print per-digit verdicts for each frame
        #[arg(long)]
        explain: bool,

        /// Print one JSON object per frame instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Print the active sequence table
    Sequences {
        /// Standalone sequences file overriding the config
        #[arg(long)]
        sequences: Option<PathBuf>,
    },

    /// Write a default config file
    InitConfig {
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Text script of `<t_ms> <LABEL|NONE|LOST|RESET>` lines
    #[arg(long, group = "input")]
    pub script: Option<PathBuf>,

    /// JSON-lines frame recording
    #[arg(long, group = "input")]
    pub replay: Option<PathBuf>,

    /// Keyboard simulator window
    #[cfg(feature = "window")]
    #[arg(long, group = "input")]
    pub window: bool,

    /// Pace script/replay frames at their recorded times
    #[arg(long)]
    pub realtime: bool,

    /// Save every processed frame to this JSON-lines file
    #[arg(long)]
    pub record: Option<PathBuf>,

    /// Standalone sequences file overriding the config
    #[arg(long)]
    pub sequences: Option<PathBuf>,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_with_script() {
        let cli = Cli::try_parse_from(["holo-gesture", "-v", "run", "--script", "demo.txt", "--realtime"]).unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.script, Some(PathBuf::from("demo.txt")));
                assert!(args.realtime);
                assert!(args.replay.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn script_and_replay_conflict() {
        let res = Cli::try_parse_from(["holo-gesture", "run", "--script", "a", "--replay", "b"]);
        assert!(res.is_err());
    }

    #[test]
    fn global_config_after_subcommand() {
        let cli = Cli::try_parse_from(["holo-gesture", "sequences", "--config", "x.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
    }

    #[test]
    fn classify_and_init_config() {
        let cli = Cli::try_parse_from(["holo-gesture", "classify", "f.jsonl", "--explain"]).unwrap();
        assert!(matches!(cli.command, Commands::Classify { explain: true, json: false, .. }));

        let cli = Cli::try_parse_from(["holo-gesture", "init-config", "out.toml", "--force"]).unwrap();
        assert!(matches!(cli.command, Commands::InitConfig { force: true, .. }));
    }
}
