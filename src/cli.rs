//! CLI definition for the `canonical-pages` binary

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::CliOverrides;

/// Exit codes
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const INVALID_ARGS: i32 = 2;
    pub const INPUT_NOT_FOUND: i32 = 3;
}

/// Canonical page numbering for indexed PDF projects
#[derive(Parser, Debug)]
#[command(name = "canonical-pages")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute canonical pages and print segments
    Compute(ComputeArgs),
    /// Print the derivation cache key of a snapshot
    CacheKey(SnapshotArgs),
    /// Print the pages each region applies to
    Pages(SnapshotArgs),
    /// Convert a bounding box between coordinate systems
    ConvertBbox(ConvertBboxArgs),
    /// Check whether two extraction boxes overlap
    Overlap(OverlapArgs),
}

#[derive(Args, Debug)]
pub struct SnapshotArgs {
    /// Project snapshot JSON file
    pub input: PathBuf,
}

#[derive(Args, Debug)]
pub struct ComputeArgs {
    /// Project snapshot JSON file
    pub input: PathBuf,

    /// Print the page map and segments as JSON
    #[arg(long)]
    pub json: bool,

    /// Skip the derivation cache
    #[arg(long)]
    pub no_cache: bool,

    /// Cache directory
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Concurrent text-access calls
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,

    /// Per-call text-access timeout in milliseconds (0 disables)
    #[arg(long)]
    pub timeout_ms: Option<u64>,
}

impl ComputeArgs {
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            concurrency: self.concurrency,
            text_timeout_ms: self.timeout_ms,
            no_cache: self.no_cache,
            cache_dir: self.cache_dir.clone(),
        }
    }
}

#[derive(Args, Debug)]
pub struct ConvertBboxArgs {
    /// Box values: x0 y0 x1 y1 (extraction) or x y width height with --inverse
    #[arg(num_args = 4, value_names = ["A", "B", "C", "D"], allow_negative_numbers = true)]
    pub values: Vec<f64>,

    /// Unscaled page height in points
    #[arg(long)]
    pub page_height: f64,

    /// Render scale
    #[arg(long, default_value_t = 1.0)]
    pub scale: f64,

    /// Page rotation in degrees (0, 90, 180, 270)
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub rotation: i32,

    /// Convert a render box back to extraction coordinates
    #[arg(long)]
    pub inverse: bool,
}

#[derive(Args, Debug)]
pub struct OverlapArgs {
    /// First box: x0 y0 x1 y1
    #[arg(long, num_args = 4, value_names = ["X0", "Y0", "X1", "Y1"], allow_negative_numbers = true)]
    pub a: Vec<f64>,

    /// Second box: x0 y0 x1 y1
    #[arg(long, num_args = 4, value_names = ["X0", "Y0", "X1", "Y1"], allow_negative_numbers = true)]
    pub b: Vec<f64>,

    /// Minimum overlap ratio (defaults to the configured threshold)
    #[arg(long)]
    pub threshold: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_compute() {
        let cli = Cli::try_parse_from([
            "canonical-pages",
            "-vv",
            "compute",
            "project.json",
            "--json",
            "--no-cache",
            "-j",
            "8",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Compute(args) => {
                assert!(args.json);
                let overrides = args.overrides();
                assert!(overrides.no_cache);
                assert_eq!(overrides.concurrency, Some(8));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_convert_bbox() {
        let cli = Cli::try_parse_from([
            "canonical-pages",
            "convert-bbox",
            "10",
            "20",
            "110",
            "70",
            "--page-height",
            "792",
            "--rotation",
            "90",
        ])
        .unwrap();
        match cli.command {
            Commands::ConvertBbox(args) => {
                assert_eq!(args.values, vec![10.0, 20.0, 110.0, 70.0]);
                assert_eq!(args.scale, 1.0);
                assert_eq!(args.rotation, 90);
                assert!(!args.inverse);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_overlap() {
        let cli = Cli::try_parse_from([
            "canonical-pages",
            "overlap",
            "--a",
            "0",
            "0",
            "10",
            "10",
            "--b",
            "5",
            "5",
            "15",
            "15",
        ])
        .unwrap();
        match cli.command {
            Commands::Overlap(args) => {
                assert_eq!(args.a, vec![0.0, 0.0, 10.0, 10.0]);
                assert_eq!(args.b, vec![5.0, 5.0, 15.0, 15.0]);
                assert_eq!(args.threshold, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_convert_bbox_needs_four_values() {
        assert!(Cli::try_parse_from([
            "canonical-pages",
            "convert-bbox",
            "10",
            "20",
            "--page-height",
            "792",
        ])
        .is_err());
    }
}
