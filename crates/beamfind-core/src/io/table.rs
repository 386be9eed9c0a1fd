//! Result table persistence.
//!
//! CSV is the primary format: one header line, then one row per record in
//! frame order. Undetermined centers are written as the literal `NaN`.
//! JSON output writes the same records as an array; NaN becomes `null`.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{CenterError, Result};
use crate::schedule::{FrameStatus, ResultRecord, ResultTable};

pub const CSV_HEADER: &str = "frame_number,data_index,center_x,center_y,status";

/// Write `table` as CSV.
pub fn write_csv<W: Write>(table: &ResultTable, writer: &mut W) -> Result<()> {
    writeln!(writer, "{CSV_HEADER}")?;
    for r in table {
        writeln!(
            writer,
            "{},{},{},{},{}",
            r.frame_number, r.data_index, r.center_x, r.center_y, r.status
        )?;
    }
    Ok(())
}

/// Write `table` as a pretty-printed JSON array.
pub fn write_json<W: Write>(table: &ResultTable, writer: &mut W) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, table)?;
    writeln!(writer)?;
    Ok(())
}

/// Save `table` to `path`. A `.json` extension selects JSON, anything
/// else CSV.
pub fn save_table(table: &ResultTable, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if is_json {
        write_json(table, &mut writer)?;
    } else {
        write_csv(table, &mut writer)?;
    }
    writer.flush()?;
    Ok(())
}

/// Parse a CSV table written by [`write_csv`].
pub fn read_csv<R: BufRead>(reader: R) -> Result<ResultTable> {
    let mut lines = reader.lines().enumerate();
    let header = match lines.next() {
        Some((_, header)) => header?,
        None => String::new(),
    };
    if header.trim() != CSV_HEADER {
        return Err(CenterError::InvalidTable {
            line: 1,
            reason: format!("expected header '{CSV_HEADER}'"),
        });
    }

    let mut records = Vec::new();
    for (i, line) in lines {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(parse_row(&line).map_err(|reason| CenterError::InvalidTable {
            line: i + 1,
            reason,
        })?);
    }
    Ok(ResultTable::from_records(records))
}

pub fn load_csv(path: &Path) -> Result<ResultTable> {
    read_csv(BufReader::new(File::open(path)?))
}

fn parse_row(line: &str) -> std::result::Result<ResultRecord, String> {
    let fields: Vec<&str> = line.trim().split(',').collect();
    if fields.len() != 5 {
        return Err(format!("expected 5 fields, found {}", fields.len()));
    }
    let frame_number = fields[0]
        .parse::<usize>()
        .map_err(|e| format!("frame_number: {e}"))?;
    let data_index = fields[1]
        .parse::<i64>()
        .map_err(|e| format!("data_index: {e}"))?;
    let center_x = fields[2]
        .parse::<f64>()
        .map_err(|e| format!("center_x: {e}"))?;
    let center_y = fields[3]
        .parse::<f64>()
        .map_err(|e| format!("center_y: {e}"))?;
    let status = fields[4].parse::<FrameStatus>()?;
    Ok(ResultRecord {
        frame_number,
        data_index,
        center_x,
        center_y,
        status,
    })
}
