use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Summary of one completed batch.
///
/// Written as a single line with fields in this order: every raw rate
/// sample, rate mean, rate stddev, the per-dimension means, then the
/// per-dimension stddevs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OutputRow {
    /// Instantaneous arrival frequencies, in observation order (Hz).
    pub rate_samples: Vec<f64>,
    /// Mean arrival frequency (Hz).
    pub rate_mean: f64,
    /// Standard deviation of the arrival frequency (Hz).
    pub rate_stddev: f64,
    /// Mean of each vector dimension, by dimension index.
    pub dim_means: Vec<f64>,
    /// Standard deviation of each vector dimension, by dimension index.
    pub dim_stddevs: Vec<f64>,
}

impl OutputRow {
    /// All fields in output order.
    pub fn fields(&self) -> impl Iterator<Item = f64> + '_ {
        self.rate_samples
            .iter()
            .copied()
            .chain([self.rate_mean, self.rate_stddev])
            .chain(self.dim_means.iter().copied())
            .chain(self.dim_stddevs.iter().copied())
    }

    /// Number of fields the row renders to.
    pub fn field_count(&self) -> usize {
        self.rate_samples.len() + 2 + self.dim_means.len() + self.dim_stddevs.len()
    }

    /// Comma-separated rendering without the line terminator.
    ///
    /// `f64`'s `Display` prints the shortest text that parses back to the
    /// same value, so no precision is lost.
    pub fn to_csv_line(&self) -> String {
        let mut line = String::with_capacity(self.field_count() * 20);
        for (i, value) in self.fields().enumerate() {
            if i > 0 {
                line.push(',');
            }
            line.push_str(&value.to_string());
        }
        line
    }
}

/// Destination for summary rows. A row must be visible to readers once
/// `append_row` returns.
pub trait RowSink {
    /// Appends one row.
    fn append_row(&mut self, row: &OutputRow) -> io::Result<()>;
}

/// Keeps rows in memory.
impl RowSink for Vec<OutputRow> {
    fn append_row(&mut self, row: &OutputRow) -> io::Result<()> {
        self.push(row.clone());
        Ok(())
    }
}

impl<S: RowSink + ?Sized> RowSink for &mut S {
    fn append_row(&mut self, row: &OutputRow) -> io::Result<()> {
        (**self).append_row(row)
    }
}

/// Writes rows as CSV lines, flushing after every row.
///
/// No header line is written; the vector width is only known once the first
/// vector arrives.
#[derive(Debug)]
pub struct CsvFileSink {
    path: PathBuf,
    writer: BufWriter<File>,
    rows_written: u64,
}

impl CsvFileSink {
    /// Creates (or truncates) the file at `path`.
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;
        tracing::info!("Opening output {}", path.display());
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            rows_written: 0,
        })
    }

    /// Path of the output file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rows appended so far.
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Flushes buffered output.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl RowSink for CsvFileSink {
    fn append_row(&mut self, row: &OutputRow) -> io::Result<()> {
        writeln!(self.writer, "{}", row.to_csv_line())?;
        self.writer.flush()?;
        self.rows_written += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_row() -> OutputRow {
        OutputRow {
            rate_samples: vec![0.0, 100.0],
            rate_mean: 50.0,
            rate_stddev: 50.0,
            dim_means: vec![1.5, 0.1],
            dim_stddevs: vec![0.5, 1.0 / 3.0],
        }
    }

    #[test]
    fn test_field_order() {
        let row = sample_row();
        let fields: Vec<f64> = row.fields().collect();
        assert_eq!(fields, vec![0.0, 100.0, 50.0, 50.0, 1.5, 0.1, 0.5, 1.0 / 3.0]);
        assert_eq!(row.field_count(), fields.len());
    }

    #[test]
    fn test_csv_line_round_trips_full_precision() {
        let row = sample_row();
        let line = row.to_csv_line();
        let parsed: Vec<f64> = line.split(',').map(|f| f.parse().unwrap()).collect();
        assert_eq!(parsed, row.fields().collect::<Vec<_>>());
    }

    #[test]
    fn test_file_sink_rows_visible_after_append() {
        let dir = tempdir().expect("Failed to create temporary directory");
        let path = dir.path().join("nested").join("out.csv");
        let mut sink = CsvFileSink::create(&path).unwrap();

        sink.append_row(&sample_row()).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, format!("{}\n", sample_row().to_csv_line()));

        sink.append_row(&sample_row()).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
        assert_eq!(sink.rows_written(), 2);
    }

    #[test]
    fn test_vec_sink_collects_rows() {
        let mut rows: Vec<OutputRow> = Vec::new();
        rows.append_row(&sample_row()).unwrap();
        assert_eq!(rows, vec![sample_row()]);
    }
}
