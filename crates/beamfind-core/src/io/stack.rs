use std::fs::File;
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use memmap2::Mmap;
use ndarray::Array2;

use crate::error::{CenterError, Result};
use crate::frame::{PixelFormat, StackInfo};

pub const STACK_HEADER_SIZE: usize = 64;
pub const STACK_MAGIC: &[u8; 8] = b"FRMSTACK";
pub const STACK_VERSION: u32 = 1;

/// Header flag: an `i64` data index per frame follows the frame data.
pub const FLAG_HAS_INDEX: u32 = 1;

/// Frame-stack header (64 bytes).
#[derive(Clone, Debug, PartialEq)]
pub struct StackHeader {
    pub version: u32,
    pub pixel_format: PixelFormat,
    pub width: u32,
    pub height: u32,
    pub frame_count: u64,
    pub flags: u32,
}

impl StackHeader {
    pub fn new(width: u32, height: u32, pixel_format: PixelFormat, frame_count: u64) -> Self {
        Self {
            version: STACK_VERSION,
            pixel_format,
            width,
            height,
            frame_count,
            flags: 0,
        }
    }

    pub fn with_index(mut self) -> Self {
        self.flags |= FLAG_HAS_INDEX;
        self
    }

    pub fn has_index(&self) -> bool {
        self.flags & FLAG_HAS_INDEX != 0
    }

    /// Total bytes per frame, `None` on overflow.
    pub fn frame_byte_size(&self) -> Option<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)?
            .checked_mul(self.pixel_format.bytes_per_pixel())
    }

    /// Bytes the header, frames and optional index trailer occupy.
    pub fn expected_file_size(&self) -> Option<usize> {
        let frames = self
            .frame_byte_size()?
            .checked_mul(usize::try_from(self.frame_count).ok()?)?;
        let index = if self.has_index() {
            usize::try_from(self.frame_count).ok()?.checked_mul(8)?
        } else {
            0
        };
        STACK_HEADER_SIZE.checked_add(frames)?.checked_add(index)
    }
}

/// Memory-mapped frame-stack reader.
///
/// Read-only and `Sync`; every scheduler worker opens its own.
pub struct StackReader {
    mmap: Mmap,
    pub header: StackHeader,
    frame_bytes: usize,
}

impl StackReader {
    /// Open a frame stack and validate its header against the file size.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };

        if mmap.len() < STACK_HEADER_SIZE {
            return Err(CenterError::InvalidStack(
                "File too small for frame-stack header".into(),
            ));
        }

        if &mmap[0..8] != STACK_MAGIC {
            return Err(CenterError::InvalidStack("Missing FRMSTACK magic".into()));
        }

        let header = parse_header(&mmap[..STACK_HEADER_SIZE])?;
        let frame_bytes = header
            .frame_byte_size()
            .ok_or_else(|| CenterError::InvalidStack("Frame size overflow".into()))?;
        let expected = header
            .expected_file_size()
            .ok_or_else(|| CenterError::InvalidStack("Stack size overflow".into()))?;
        if mmap.len() < expected {
            return Err(CenterError::InvalidStack(format!(
                "File truncated: expected at least {} bytes, got {}",
                expected,
                mmap.len()
            )));
        }

        Ok(Self {
            mmap,
            header,
            frame_bytes,
        })
    }

    pub fn frame_count(&self) -> usize {
        self.header.frame_count as usize
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        (self.header.height as usize, self.header.width as usize)
    }

    /// Raw bytes of a single frame (zero-copy from the mmap).
    pub fn frame_raw(&self, index: usize) -> Result<&[u8]> {
        let count = self.frame_count();
        if index >= count {
            return Err(CenterError::FrameIndexOutOfRange {
                index,
                total: count,
            });
        }
        let offset = STACK_HEADER_SIZE + index * self.frame_bytes;
        Ok(&self.mmap[offset..offset + self.frame_bytes])
    }

    /// Read a single frame as raw counts in f32.
    pub fn read_frame(&self, index: usize) -> Result<Array2<f32>> {
        let raw = self.frame_raw(index)?;
        let (h, w) = self.shape();
        decode_plane(raw, h, w, self.header.pixel_format)
    }

    /// The per-frame data index trailer, if the stack carries one.
    pub fn data_indices(&self) -> Option<Vec<i64>> {
        if !self.header.has_index() {
            return None;
        }
        let start = STACK_HEADER_SIZE + self.frame_bytes * self.frame_count();
        let trailer = &self.mmap[start..start + self.frame_count() * 8];
        Some(
            trailer
                .chunks_exact(8)
                .map(|b| i64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
                .collect(),
        )
    }

    pub fn stack_info(&self, path: &Path) -> StackInfo {
        StackInfo {
            filename: path.to_path_buf(),
            total_frames: self.frame_count(),
            width: self.header.width,
            height: self.header.height,
            pixel_format: self.header.pixel_format,
            has_index: self.header.has_index(),
        }
    }
}

fn parse_header(buf: &[u8]) -> Result<StackHeader> {
    let mut cursor = std::io::Cursor::new(&buf[8..]); // skip magic

    let version = cursor.read_u32::<LittleEndian>()?;
    let format_code = cursor.read_u32::<LittleEndian>()?;
    let width = cursor.read_u32::<LittleEndian>()?;
    let height = cursor.read_u32::<LittleEndian>()?;
    let frame_count = cursor.read_u64::<LittleEndian>()?;
    let flags = cursor.read_u32::<LittleEndian>()?;

    if version != STACK_VERSION {
        return Err(CenterError::InvalidStack(format!(
            "Unsupported version {version}"
        )));
    }

    let pixel_format = PixelFormat::from_code(format_code).ok_or_else(|| {
        CenterError::InvalidStack(format!("Unknown pixel format code {format_code}"))
    })?;

    if width == 0 || height == 0 {
        return Err(CenterError::InvalidDimensions { width, height });
    }

    Ok(StackHeader {
        version,
        pixel_format,
        width,
        height,
        frame_count,
        flags,
    })
}

fn decode_plane(raw: &[u8], height: usize, width: usize, format: PixelFormat) -> Result<Array2<f32>> {
    let bpp = format.bytes_per_pixel();
    let values: Vec<f32> = raw
        .chunks_exact(bpp)
        .map(|b| match format {
            PixelFormat::U8 => b[0] as f32,
            PixelFormat::U16 => u16::from_le_bytes([b[0], b[1]]) as f32,
            PixelFormat::U32 => u32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f32,
            PixelFormat::F32 => f32::from_le_bytes([b[0], b[1], b[2], b[3]]),
        })
        .collect();

    Array2::from_shape_vec((height, width), values)
        .map_err(|e| CenterError::InvalidStack(format!("Frame shape error: {e}")))
}
