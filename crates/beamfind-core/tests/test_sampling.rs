use beamfind_core::error::CenterError;
use beamfind_core::schedule::config::Chunking;
use beamfind_core::schedule::sampling::{sampled_frames, work_items};

// ---------------------------------------------------------------------------
// Sampling
// ---------------------------------------------------------------------------

#[test]
fn test_thousand_frames_every_hundredth() {
    let frames = sampled_frames(1000, 100).unwrap();
    assert_eq!(frames.len(), 11);
    assert_eq!(frames, vec![0, 100, 200, 300, 400, 500, 600, 700, 800, 900, 999]);
}

#[test]
fn test_last_frame_on_interval_is_not_duplicated() {
    let frames = sampled_frames(1001, 100).unwrap();
    assert_eq!(frames.len(), 11);
    assert_eq!(frames.last(), Some(&1000));
}

#[test]
fn test_interval_one_takes_every_frame() {
    assert_eq!(sampled_frames(5, 1).unwrap(), vec![0, 1, 2, 3, 4]);
}

#[test]
fn test_interval_larger_than_sequence() {
    assert_eq!(sampled_frames(7, 50).unwrap(), vec![0, 6]);
}

#[test]
fn test_single_frame_sequence() {
    assert_eq!(sampled_frames(1, 10).unwrap(), vec![0]);
}

#[test]
fn test_sampled_frames_strictly_ascending() {
    for (total, interval) in [(10, 3), (99, 7), (2, 1), (64, 64), (65, 64)] {
        let frames = sampled_frames(total, interval).unwrap();
        assert!(frames.windows(2).all(|w| w[0] < w[1]), "{frames:?}");
        assert_eq!(frames[0], 0);
        assert_eq!(*frames.last().unwrap(), total - 1);
    }
}

#[test]
fn test_empty_sequence_is_an_error() {
    assert!(matches!(sampled_frames(0, 10), Err(CenterError::EmptySequence)));
}

#[test]
fn test_zero_interval_is_an_error() {
    assert!(matches!(sampled_frames(10, 0), Err(CenterError::InvalidConfig(_))));
}

// ---------------------------------------------------------------------------
// Work items
// ---------------------------------------------------------------------------

#[test]
fn test_unchunked_gives_one_frame_per_item() {
    let items = work_items(&[0, 10, 20], Chunking::Unchunked).unwrap();
    assert_eq!(items, vec![vec![0], vec![10], vec![20]]);
}

#[test]
fn test_fixed_chunks_keep_order() {
    let frames = sampled_frames(1000, 100).unwrap();
    let items = work_items(&frames, Chunking::FixedChunk(4)).unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0].len(), 4);
    assert_eq!(items[2].len(), 3);
    let flat: Vec<usize> = items.concat();
    assert_eq!(flat, frames);
}

#[test]
fn test_zero_chunk_is_an_error() {
    assert!(matches!(
        work_items(&[0, 1], Chunking::FixedChunk(0)),
        Err(CenterError::InvalidConfig(_))
    ));
}
