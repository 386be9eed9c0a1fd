use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use beamfind_core::center::{ProfileConfig, RefineConfig};
use beamfind_core::consts::{DEFAULT_ROI_MAX, DEFAULT_SKIP_TOLERANCE};
use beamfind_core::io::mask::MaskSource;
use beamfind_core::schedule::config::{
    Chunking, FaultPolicy, IndexPolicy, RegionOfInterest, RunConfig, SamplingConfig,
    SchedulerConfig, TableLayout,
};
use beamfind_core::schedule::{run_centering_reported, CancelToken, ProgressReporter, RunStage};

use crate::summary::{print_result_summary, print_run_summary};

const DEFAULT_OUTPUT: &str = "centers.csv";

#[derive(Clone, Copy, ValueEnum)]
pub enum IndexPolicyArg {
    Strict,
    Fallback,
}

impl From<IndexPolicyArg> for IndexPolicy {
    fn from(arg: IndexPolicyArg) -> Self {
        match arg {
            IndexPolicyArg::Strict => IndexPolicy::Strict,
            IndexPolicyArg::Fallback => IndexPolicy::FallbackToFrameNumber,
        }
    }
}

/// Per-frame centering options shared by `run` and `frame`.
#[derive(Args)]
pub struct CenterArgs {
    /// Mask image (nonzero = valid pixel); all pixels valid when omitted
    #[arg(long)]
    pub mask: Option<PathBuf>,

    /// Number of angular wedges (even)
    #[arg(long, default_value = "4")]
    pub wedges: usize,

    /// Number of radial bins
    #[arg(long, default_value = "100")]
    pub bins: usize,

    /// Inner radius of the radial profiles in pixels
    #[arg(long, default_value = "0")]
    pub r_min: f64,

    /// Outer radius of the radial profiles (half the shorter side when omitted)
    #[arg(long)]
    pub r_max: Option<f64>,

    /// Optimizer position tolerance in pixels
    #[arg(long, default_value = "0.01")]
    pub xatol: f64,

    /// Optimizer metric tolerance
    #[arg(long, default_value = "10")]
    pub fatol: f64,

    /// Skip refinement when the initial metric is below this value
    #[arg(long, default_value_t = DEFAULT_SKIP_TOLERANCE)]
    pub skip_tol: f64,

    /// Maximum optimizer iterations per frame
    #[arg(long, default_value = "300")]
    pub max_iter: usize,

    /// Accepted region for centers: xmin,xmax,ymin,ymax
    #[arg(long)]
    pub roi: Option<String>,

    /// What to do when the stack has no data index
    #[arg(long, value_enum, default_value = "strict")]
    pub index_policy: IndexPolicyArg,
}

impl CenterArgs {
    pub fn mask_source(&self) -> MaskSource {
        self.mask
            .as_ref()
            .map_or(MaskSource::AllValid, |p| MaskSource::File(p.clone()))
    }

    pub fn profile(&self) -> ProfileConfig {
        ProfileConfig {
            n_wedges: self.wedges,
            n_rad_bins: self.bins,
            r_min: self.r_min,
            r_max: self.r_max,
        }
    }

    pub fn refine(&self) -> RefineConfig {
        RefineConfig {
            xatol: self.xatol,
            fatol: self.fatol,
            skip_tolerance: self.skip_tol,
            max_iterations: self.max_iter,
            ..Default::default()
        }
    }

    pub fn roi(&self) -> Result<RegionOfInterest> {
        let Some(ref raw) = self.roi else {
            return Ok(RegionOfInterest::new(0.0, DEFAULT_ROI_MAX, 0.0, DEFAULT_ROI_MAX));
        };
        let bounds: Vec<f64> = raw
            .split(',')
            .map(|s| s.trim().parse::<f64>())
            .collect::<std::result::Result<_, _>>()
            .with_context(|| format!("Invalid --roi '{raw}'"))?;
        match bounds[..] {
            [xmin, xmax, ymin, ymax] => Ok(RegionOfInterest::new(xmin, xmax, ymin, ymax)),
            _ => bail!("--roi needs four values xmin,xmax,ymin,ymax, got '{raw}'"),
        }
    }
}

#[derive(Args)]
pub struct RunArgs {
    /// Input frame stack
    pub file: PathBuf,

    /// Run config file (TOML); replaces all other options except the input,
    /// `-o` and `-v`
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub center: CenterArgs,

    /// Process every Nth frame (plus the first and last)
    #[arg(long, default_value = "10")]
    pub interval: usize,

    /// Worker threads (all cores when omitted)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Sampled frames per work item
    #[arg(long, default_value = "100")]
    pub chunk_size: usize,

    /// Dispatch every frame as its own work item
    #[arg(long)]
    pub unchunked: bool,

    /// Record failing frames as sentinel rows instead of aborting
    #[arg(long)]
    pub keep_going: bool,

    /// Include every frame in the table, unsampled ones as sentinel rows
    #[arg(long)]
    pub dense: bool,

    /// Reject frames whose optimizer ran out of iterations
    #[arg(long)]
    pub reject_unconverged: bool,

    /// Output table (.csv or .json) [default: centers.csv]
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Progress bar driven by the core's stage callbacks.
struct BarReporter {
    pb: ProgressBar,
}

impl ProgressReporter for BarReporter {
    fn begin_stage(&self, stage: RunStage, total_items: Option<usize>) {
        self.pb.set_message(stage.to_string());
        self.pb.set_length(total_items.unwrap_or(1) as u64);
        self.pb.set_position(0);
    }

    fn advance(&self, items_done: usize) {
        self.pb.set_position(items_done as u64);
    }

    fn finish_stage(&self) {
        if let Some(len) = self.pb.length() {
            self.pb.set_position(len);
        }
    }
}

pub fn run(args: &RunArgs, verbose: bool) -> Result<()> {
    let config = resolve_config(args, verbose)?;

    print_run_summary(&config);

    let pb = ProgressBar::new(1);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg:20} [{bar:40}] {pos}/{len}")?
            .progress_chars("=> "),
    );
    let reporter = Arc::new(BarReporter { pb: pb.clone() });

    let table = run_centering_reported(&config, reporter, &CancelToken::new())
        .with_context(|| format!("Centering failed for {}", config.input.display()))?;

    pb.finish_with_message("Done");
    print_result_summary(&table, &config.output);

    Ok(())
}

/// Load `--config` when given, with the positional input, `-o` and `-v`
/// applied on top; otherwise build the config from flags.
fn resolve_config(args: &RunArgs, verbose: bool) -> Result<RunConfig> {
    let Some(ref config_path) = args.config else {
        return build_config_from_args(args, verbose);
    };
    let contents = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config {}", config_path.display()))?;
    let mut config: RunConfig = toml::from_str(&contents).context("Invalid run config")?;
    config.input = args.file.clone();
    if let Some(ref output) = args.output {
        config.output = output.clone();
    }
    config.verbose |= verbose;
    info!(path = %config_path.display(), "Loaded run config");
    Ok(config)
}

fn build_config_from_args(args: &RunArgs, verbose: bool) -> Result<RunConfig> {
    let chunking = if args.unchunked {
        Chunking::Unchunked
    } else {
        Chunking::FixedChunk(args.chunk_size)
    };

    Ok(RunConfig {
        input: args.file.clone(),
        output: args
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT)),
        mask: args.center.mask_source(),
        verbose,
        sampling: SamplingConfig {
            frame_interval: args.interval,
        },
        profile: args.center.profile(),
        refine: args.center.refine(),
        roi: args.center.roi()?,
        scheduler: SchedulerConfig {
            workers: args.workers,
            chunking,
            index_policy: args.center.index_policy.into(),
            fault_policy: if args.keep_going {
                FaultPolicy::Sentinel
            } else {
                FaultPolicy::Abort
            },
            layout: if args.dense {
                TableLayout::Dense
            } else {
                TableLayout::SampledOnly
            },
            reject_unconverged: args.reject_unconverged,
            ..Default::default()
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::path::Path;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        run: RunArgs,
    }

    fn parse(argv: &[&str]) -> RunArgs {
        TestCli::try_parse_from(std::iter::once("beamfind").chain(argv.iter().copied()))
            .unwrap()
            .run
    }

    fn write_config(dir: &Path, verbose: bool) -> PathBuf {
        let mut config = RunConfig::new("ignored.fstk", "from_config.json");
        config.verbose = verbose;
        config.sampling.frame_interval = 7;
        let path = dir.join("run.toml");
        std::fs::write(&path, toml::to_string_pretty(&config).unwrap()).unwrap();
        path
    }

    #[test]
    fn test_flags_without_config_use_default_output() {
        let config = resolve_config(&parse(&["frames.fstk"]), false).unwrap();
        assert_eq!(config.input, PathBuf::from("frames.fstk"));
        assert_eq!(config.output, PathBuf::from(DEFAULT_OUTPUT));
        assert!(!config.verbose);
    }

    #[test]
    fn test_config_file_keeps_its_output_and_verbosity() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), true);
        let args = parse(&["frames.fstk", "--config", path.to_str().unwrap()]);

        let config = resolve_config(&args, false).unwrap();
        assert_eq!(config.input, PathBuf::from("frames.fstk"));
        assert_eq!(config.output, PathBuf::from("from_config.json"));
        assert_eq!(config.sampling.frame_interval, 7);
        assert!(config.verbose);
    }

    #[test]
    fn test_output_and_verbose_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), false);
        let args = parse(&[
            "frames.fstk",
            "--config",
            path.to_str().unwrap(),
            "-o",
            "override.csv",
        ]);

        let config = resolve_config(&args, true).unwrap();
        assert_eq!(config.output, PathBuf::from("override.csv"));
        assert!(config.verbose);
        assert_eq!(config.sampling.frame_interval, 7);
    }
}
