use std::path::Path;

use console::Style;
use beamfind_core::io::mask::MaskSource;
use beamfind_core::schedule::config::RunConfig;
use beamfind_core::schedule::{FrameStatus, ResultTable};

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    disabled: Style,
    path: Style,
    good: Style,
    bad: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
            good: Style::new().green().bold(),
            bad: Style::new().red().bold(),
        }
    }
}

pub fn print_run_summary(config: &RunConfig) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("Beam Center Finder"));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(18)));
    println!();

    println!(
        "  {:<14}{}",
        s.label.apply_to("Input"),
        s.path.apply_to(config.input.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Output"),
        s.path.apply_to(config.output.display())
    );
    match config.mask {
        MaskSource::AllValid => println!(
            "  {:<14}{}",
            s.label.apply_to("Mask"),
            s.disabled.apply_to("none (all pixels valid)")
        ),
        MaskSource::File(ref path) => println!(
            "  {:<14}{}",
            s.label.apply_to("Mask"),
            s.path.apply_to(path.display())
        ),
    }
    println!();

    println!("  {}", s.header.apply_to("Profiles"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Wedges"),
        s.value.apply_to(config.profile.n_wedges)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Bins"),
        s.value.apply_to(config.profile.n_rad_bins)
    );
    let r_max = config
        .profile
        .r_max
        .map_or_else(|| "auto".to_string(), |r| format!("{r}"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Radius"),
        s.value.apply_to(format!("{} .. {}", config.profile.r_min, r_max))
    );
    println!();

    println!("  {}", s.header.apply_to("Refinement"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Tolerance"),
        s.value.apply_to(format!(
            "xatol {} fatol {}",
            config.refine.xatol, config.refine.fatol
        ))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Skip below"),
        s.value.apply_to(config.refine.skip_tolerance)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("ROI"),
        s.value.apply_to(config.roi)
    );
    println!();

    let sched = &config.scheduler;
    println!("  {}", s.header.apply_to("Scheduling"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Interval"),
        s.value.apply_to(config.sampling.frame_interval)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Workers"),
        s.value.apply_to(sched.resolved_workers())
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Chunking"),
        s.method.apply_to(sched.chunking)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Index"),
        s.method.apply_to(sched.index_policy)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("On failure"),
        s.method.apply_to(sched.fault_policy)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Table"),
        s.method.apply_to(sched.layout)
    );
    println!();
}

pub fn print_result_summary(table: &ResultTable, output: &Path) {
    let s = Styles::new();
    let resolved = table.resolved_count();
    let not_sampled = table.count_status(FrameStatus::NotSampled);
    let unresolved = table.len() - resolved - not_sampled;

    println!();
    println!("  {}", s.header.apply_to("Results"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Resolved"),
        s.good.apply_to(resolved)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Unresolved"),
        if unresolved > 0 {
            s.bad.apply_to(unresolved)
        } else {
            s.value.apply_to(unresolved)
        }
    );

    for status in [
        FrameStatus::Refined,
        FrameStatus::Skipped,
        FrameStatus::IterationLimit,
        FrameStatus::Unconverged,
        FrameStatus::OutOfBounds,
        FrameStatus::NumericFailure,
        FrameStatus::Fault,
    ] {
        let n = table.count_status(status);
        if n > 0 {
            println!(
                "      {:<18}{}",
                s.label.apply_to(status),
                s.value.apply_to(n)
            );
        }
    }
    println!();
    println!(
        "  {:<14}{}",
        s.label.apply_to("Saved to"),
        s.path.apply_to(output.display())
    );
}
