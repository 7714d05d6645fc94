//! CSV output sink in the Data Extract layout (BOM, CRLF, header row)

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

/// UTF-8 byte-order marker prefixed to every output file
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Buffered CSV writer with atomic tmp→rename
pub struct CsvSink {
    writer: csv::Writer<BufWriter<File>>,
    tmp_path: PathBuf,
    final_path: PathBuf,
    row_count: usize,
}

impl std::fmt::Debug for CsvSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsvSink")
            .field("final_path", &self.final_path)
            .field("row_count", &self.row_count)
            .finish_non_exhaustive()
    }
}

impl CsvSink {
    /// Create a sink writing `filename` under `output_dir` via a temporary file.
    ///
    /// The header row is written immediately so an empty table still has one.
    pub fn new(output_dir: &Path, filename: &str, header: &[&str]) -> io::Result<Self> {
        let final_path = output_dir.join(filename);
        let tmp_path = output_dir.join(format!("{filename}.tmp"));

        // Clean up stale tmp file
        if tmp_path.exists() {
            fs::remove_file(&tmp_path)?;
        }

        let mut file = BufWriter::new(File::create(&tmp_path)?);
        file.write_all(UTF8_BOM)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::CRLF)
            .from_writer(file);
        writer.write_record(header).map_err(io::Error::other)?;

        Ok(Self {
            writer,
            tmp_path,
            final_path,
            row_count: 0,
        })
    }

    /// Write one row; field order follows the struct's field order
    pub fn write_row<S: Serialize>(&mut self, row: &S) -> io::Result<()> {
        self.writer.serialize(row).map_err(io::Error::other)?;
        self.row_count += 1;
        Ok(())
    }

    /// Finalize: flush and atomically rename tmp → final
    pub fn finalize(mut self) -> io::Result<usize> {
        self.writer.flush()?;
        drop(self.writer);
        fs::rename(&self.tmp_path, &self.final_path)?;
        Ok(self.row_count)
    }

    pub fn path(&self) -> &Path {
        &self.final_path
    }
}

/// Remove stale .tmp files in the output directory
pub fn cleanup_tmp_files(output_dir: &Path) -> io::Result<()> {
    for entry in fs::read_dir(output_dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "tmp") {
            log::warn!("Removing stale tmp file: {}", path.display());
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}
