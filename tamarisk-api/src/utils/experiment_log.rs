use crate::error::ExperimentError;
use std::{
    fs::{File, OpenOptions},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};
use tamarisk_core::utils::return_stats::Summary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyLabel {
    Invasive,
    Heuristic,
}

impl PolicyLabel {
    pub fn name(self) -> &'static str {
        match self {
            Self::Invasive => "INVASIVE AGENT",
            Self::Heuristic => "HEURISTIC AGENT",
        }
    }
}

/// Append-only results file. Every line is flushed as soon as it is written, the file is
/// closed when the log is dropped.
pub struct ExperimentLog {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl ExperimentLog {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ExperimentError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| ExperimentError::Log {
                path: path.clone(),
                source,
            })?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn begin_run(&mut self, budget: u32) -> Result<(), ExperimentError> {
        self.write_str(&format!("\n--> budget = {budget} \n"))
    }

    pub fn record(&mut self, label: PolicyLabel, summary: &Summary) -> Result<(), ExperimentError> {
        self.write_str(&format!(
            "    {:<15} :   mean: {:?} , std: {:?}\n",
            label.name(),
            summary.mean,
            summary.std
        ))
    }

    /// Flushes and closes, surfacing errors that a plain drop would swallow.
    pub fn close(mut self) -> Result<(), ExperimentError> {
        self.writer
            .flush()
            .and_then(|_| self.writer.get_ref().sync_all())
            .map_err(|source| self.log_error(source))
    }

    fn write_str(&mut self, text: &str) -> Result<(), ExperimentError> {
        self.writer
            .write_all(text.as_bytes())
            .and_then(|_| self.writer.flush())
            .map_err(|source| self.log_error(source))
    }

    fn log_error(&self, source: io::Error) -> ExperimentError {
        ExperimentError::Log {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod test {
    use super::{ExperimentLog, PolicyLabel};
    use tamarisk_core::utils::return_stats::Summary;

    fn summary(mean: f64, std: f64) -> Summary {
        Summary {
            n: 10,
            mean,
            variance: std * std,
            std,
        }
    }

    #[test]
    fn block_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("experiments.txt");
        let mut log = ExperimentLog::open(&path).unwrap();
        log.begin_run(20).unwrap();
        log.record(PolicyLabel::Invasive, &summary(-1500.25, 120.5))
            .unwrap();
        log.record(PolicyLabel::Heuristic, &summary(-2000., 0.))
            .unwrap();
        log.close().unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "\n--> budget = 20 \n\
             \x20   INVASIVE AGENT  :   mean: -1500.25 , std: 120.5\n\
             \x20   HEURISTIC AGENT :   mean: -2000.0 , std: 0.0\n"
        );
    }

    #[test]
    fn lines_are_on_disk_before_close() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("experiments.txt");
        let mut log = ExperimentLog::open(&path).unwrap();
        log.begin_run(20).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "\n--> budget = 20 \n");
    }

    #[test]
    fn missing_directory_is_a_log_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("experiments.txt");
        assert!(ExperimentLog::open(path).is_err());
    }
}
