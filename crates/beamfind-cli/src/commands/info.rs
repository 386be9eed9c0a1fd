use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use beamfind_core::io::stack::StackReader;

#[derive(Args)]
pub struct InfoArgs {
    /// Input frame stack
    pub file: PathBuf,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    let reader = StackReader::open(&args.file)?;
    let info = reader.stack_info(&args.file);

    println!("File:        {}", info.filename.display());
    println!("Frames:      {}", info.total_frames);
    println!("Dimensions:  {}x{}", info.width, info.height);
    println!("Pixel type:  {}", info.pixel_format);
    println!(
        "Data index:  {}",
        if info.has_index { "present" } else { "absent" }
    );

    if let Some(indices) = reader.data_indices() {
        if let (Some(first), Some(last)) = (indices.first(), indices.last()) {
            println!("Index range: {} .. {}", first, last);
        }
    }

    let frame_bytes = reader.header.frame_byte_size().unwrap_or(0);
    let total_mb = (frame_bytes * info.total_frames) as f64 / (1024.0 * 1024.0);
    println!("Data size:   {:.1} MB", total_mb);

    Ok(())
}
