use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use beamfind_core::frame::Frame;
use beamfind_core::io::mask::resolve_mask;
use beamfind_core::io::stack::StackReader;
use beamfind_core::schedule::config::RunConfig;
use beamfind_core::schedule::{center_frame, resolve_data_indices};

use super::run::CenterArgs;

#[derive(Args)]
pub struct FrameArgs {
    /// Input frame stack
    pub file: PathBuf,

    /// Frame number to center (0-based)
    pub frame_number: usize,

    #[command(flatten)]
    pub center: CenterArgs,
}

pub fn run(args: &FrameArgs, verbose: bool) -> Result<()> {
    let reader = StackReader::open(&args.file)
        .with_context(|| format!("Failed to open {}", args.file.display()))?;
    let (rows, cols) = reader.shape();

    let mut config = RunConfig::new(&args.file, "");
    config.mask = args.center.mask_source();
    config.verbose = verbose;
    config.profile = args.center.profile();
    config.refine = args.center.refine();
    config.roi = args.center.roi()?;
    config.scheduler.index_policy = args.center.index_policy.into();
    config.validate()?;

    let mask = resolve_mask(&config.mask, rows, cols)?;
    let indices = resolve_data_indices(&reader, config.scheduler.index_policy)?;
    let data = reader.read_frame(args.frame_number)?;
    let data_index = indices[args.frame_number];

    let frame = Frame::new(data, args.frame_number, data_index);
    let report = center_frame(&frame, &mask, &config);

    println!("Frame:          {}", args.frame_number);
    println!("Data index:     {}", data_index);
    println!("Initial guess:  {}", report.initial);
    if let Some(ref outcome) = report.refine {
        println!("Initial metric: {:.4}", outcome.initial_metric);
        println!("Refined center: {}", outcome.center);
        println!("Final metric:   {:.4}", outcome.metric);
        println!("Refiner:        {}", outcome.status);
        println!(
            "Iterations:     {} ({} metric evaluations)",
            outcome.iterations, outcome.evaluations
        );
    } else {
        println!("Refiner:        not run (initial guess outside {})", config.roi);
    }
    println!("Status:         {}", report.record.status);

    Ok(())
}
