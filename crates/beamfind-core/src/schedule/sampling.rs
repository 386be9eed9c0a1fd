use crate::error::{CenterError, Result};

use super::config::Chunking;

/// Frames to process: the first, the last, and every multiple of
/// `frame_interval`, ascending and without duplicates.
pub fn sampled_frames(total_frames: usize, frame_interval: usize) -> Result<Vec<usize>> {
    if total_frames == 0 {
        return Err(CenterError::EmptySequence);
    }
    if frame_interval == 0 {
        return Err(CenterError::InvalidConfig(
            "frame_interval must be at least 1".into(),
        ));
    }

    let last = total_frames - 1;
    let mut frames: Vec<usize> = (0..total_frames).step_by(frame_interval).collect();
    if frames.last() != Some(&last) {
        frames.push(last);
    }
    Ok(frames)
}

/// Group sampled frames into dispatchable work items.
pub fn work_items(frames: &[usize], chunking: Chunking) -> Result<Vec<Vec<usize>>> {
    match chunking {
        Chunking::Unchunked => Ok(frames.iter().map(|&f| vec![f]).collect()),
        Chunking::FixedChunk(0) => Err(CenterError::InvalidConfig(
            "chunk size must be at least 1".into(),
        )),
        Chunking::FixedChunk(size) => Ok(frames.chunks(size).map(|c| c.to_vec()).collect()),
    }
}
