use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use ndarray::Array2;

use crate::error::{CenterError, Result};
use crate::frame::PixelFormat;
use crate::io::stack::{StackHeader, STACK_HEADER_SIZE, STACK_MAGIC};

/// Writes a frame stack: header, frames in order, then the optional index.
pub struct StackWriter {
    writer: BufWriter<File>,
    header: StackHeader,
    frames_written: u64,
    index_written: bool,
}

impl StackWriter {
    /// Create a new stack file and write the header.
    pub fn create(path: &Path, header: &StackHeader) -> Result<Self> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        write_header(&mut writer, header)?;
        Ok(Self {
            writer,
            header: header.clone(),
            frames_written: 0,
            index_written: false,
        })
    }

    /// Encode and write one frame. Integer formats round and saturate.
    pub fn write_frame(&mut self, data: &Array2<f32>) -> Result<()> {
        let (rows, cols) = data.dim();
        if rows != self.header.height as usize || cols != self.header.width as usize {
            return Err(CenterError::InvalidDimensions {
                width: cols as u32,
                height: rows as u32,
            });
        }
        self.check_room()?;
        for &v in data.iter() {
            match self.header.pixel_format {
                PixelFormat::U8 => self.writer.write_all(&[v.round() as u8])?,
                PixelFormat::U16 => self.writer.write_all(&(v.round() as u16).to_le_bytes())?,
                PixelFormat::U32 => self.writer.write_all(&(v.round() as u32).to_le_bytes())?,
                PixelFormat::F32 => self.writer.write_all(&v.to_le_bytes())?,
            }
        }
        self.frames_written += 1;
        Ok(())
    }

    /// Write a single pre-encoded frame.
    pub fn write_raw_frame(&mut self, data: &[u8]) -> Result<()> {
        if Some(data.len()) != self.header.frame_byte_size() {
            return Err(CenterError::InvalidStack(format!(
                "Raw frame has {} bytes, header expects {:?}",
                data.len(),
                self.header.frame_byte_size()
            )));
        }
        self.check_room()?;
        self.writer.write_all(data)?;
        self.frames_written += 1;
        Ok(())
    }

    /// Write the data index trailer (one i64 per frame, little-endian).
    /// Only valid once every frame has been written.
    pub fn write_index(&mut self, indices: &[i64]) -> Result<()> {
        if !self.header.has_index() {
            return Err(CenterError::InvalidStack(
                "Header does not declare an index trailer".into(),
            ));
        }
        if self.frames_written != self.header.frame_count
            || indices.len() as u64 != self.header.frame_count
        {
            return Err(CenterError::InvalidStack(format!(
                "Index needs {} entries after all frames (frames written: {}, entries: {})",
                self.header.frame_count,
                self.frames_written,
                indices.len()
            )));
        }
        for &idx in indices {
            self.writer.write_all(&idx.to_le_bytes())?;
        }
        self.index_written = true;
        Ok(())
    }

    /// Flush and finalize the file.
    pub fn finalize(mut self) -> Result<()> {
        if self.frames_written != self.header.frame_count {
            return Err(CenterError::InvalidStack(format!(
                "Header declares {} frames, {} written",
                self.header.frame_count, self.frames_written
            )));
        }
        if self.header.has_index() && !self.index_written {
            return Err(CenterError::InvalidStack(
                "Header declares an index trailer that was never written".into(),
            ));
        }
        self.writer.flush()?;
        Ok(())
    }

    fn check_room(&self) -> Result<()> {
        if self.frames_written >= self.header.frame_count {
            return Err(CenterError::InvalidStack(format!(
                "Header declares only {} frames",
                self.header.frame_count
            )));
        }
        Ok(())
    }
}

fn write_header(w: &mut impl Write, header: &StackHeader) -> Result<()> {
    // Magic (8 bytes)
    w.write_all(STACK_MAGIC)?;
    // Version (4 bytes)
    w.write_all(&header.version.to_le_bytes())?;
    // Pixel format (4 bytes)
    w.write_all(&header.pixel_format.code().to_le_bytes())?;
    // Width, height (4 bytes each)
    w.write_all(&header.width.to_le_bytes())?;
    w.write_all(&header.height.to_le_bytes())?;
    // Frame count (8 bytes)
    w.write_all(&header.frame_count.to_le_bytes())?;
    // Flags (4 bytes)
    w.write_all(&header.flags.to_le_bytes())?;
    // Reserved
    w.write_all(&[0u8; 28])?;

    debug_assert_eq!(8 + 4 + 4 + 4 + 4 + 8 + 4 + 28, STACK_HEADER_SIZE);
    Ok(())
}
