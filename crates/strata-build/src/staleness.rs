//! Staleness check against outputs and the persisted build record
//!
//! Checks run in a fixed order and stop at the first failure:
//! inputs exist, outputs exist, outputs newer than inputs, outputs newer
//! than configuration, build record present with a matching version and
//! free of errors.

use crate::backend::CompilerBackend;
use crate::error::{BuildError, BuildResult};
use filetime::FileTime;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use strata_config::ProjectDescriptor;

/// Outcome of a staleness check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Staleness {
    UpToDate,
    Stale(StaleReason),
}

impl Staleness {
    pub fn is_up_to_date(&self) -> bool {
        matches!(self, Staleness::UpToDate)
    }
}

/// Why a project needs a rebuild
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaleReason {
    MissingOutput(PathBuf),
    OutputOlderThanInput { output: PathBuf, input: PathBuf },
    OutputOlderThanConfig { output: PathBuf, config: PathBuf },
    MissingBuildRecord,
    VersionMismatch { found: String, expected: String },
    /// The recorded build reported diagnostics
    PreviousBuildFailed,
}

impl fmt::Display for StaleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaleReason::MissingOutput(output) => {
                write!(f, "output {} does not exist", output.display())
            }
            StaleReason::OutputOlderThanInput { output, input } => write!(
                f,
                "output {} is older than input {}",
                output.display(),
                input.display()
            ),
            StaleReason::OutputOlderThanConfig { output, config } => write!(
                f,
                "output {} is older than config {}",
                output.display(),
                config.display()
            ),
            StaleReason::MissingBuildRecord => write!(f, "no usable build record"),
            StaleReason::VersionMismatch { found, expected } => write!(
                f,
                "build record was written by version {} (current {})",
                found, expected
            ),
            StaleReason::PreviousBuildFailed => write!(f, "previous build reported errors"),
        }
    }
}

fn modified(path: &Path) -> BuildResult<FileTime> {
    let metadata = fs::metadata(path).map_err(|e| BuildError::io(path, e))?;
    Ok(FileTime::from_last_modification_time(&metadata))
}

/// Decide whether the outputs of `root_files` still reflect the inputs.
///
/// A project without root files is always up to date. A root file that
/// does not exist is an error, not a stale result.
pub fn check_staleness<B: CompilerBackend>(
    descriptor: &ProjectDescriptor,
    root_files: &[PathBuf],
    backend: &B,
) -> BuildResult<Staleness> {
    if root_files.is_empty() {
        return Ok(Staleness::UpToDate);
    }

    let mut newest_input: Option<(FileTime, &PathBuf)> = None;
    for input in root_files {
        if !input.is_file() {
            return Err(BuildError::MissingInputFile(input.clone()));
        }
        let time = modified(input)?;
        if newest_input.map_or(true, |(newest, _)| time > newest) {
            newest_input = Some((time, input));
        }
    }

    let outputs = backend.expected_outputs(&descriptor.options, root_files);
    let mut oldest_output: Option<(FileTime, &PathBuf)> = None;
    for output in &outputs {
        if !output.is_file() {
            return Ok(Staleness::Stale(StaleReason::MissingOutput(output.clone())));
        }
        let time = modified(output)?;
        if let Some((input_time, input)) = newest_input {
            if time < input_time {
                return Ok(Staleness::Stale(StaleReason::OutputOlderThanInput {
                    output: output.clone(),
                    input: input.clone(),
                }));
            }
        }
        if oldest_output.map_or(true, |(oldest, _)| time < oldest) {
            oldest_output = Some((time, output));
        }
    }

    if let Some((output_time, output)) = oldest_output {
        for config in descriptor.config_files() {
            // A vanished extended config counts as infinitely old
            let Ok(config_time) = modified(config) else {
                continue;
            };
            if output_time < config_time {
                return Ok(Staleness::Stale(StaleReason::OutputOlderThanConfig {
                    output: output.clone(),
                    config: config.to_path_buf(),
                }));
            }
        }
    }

    let Some(record) = backend.read_build_record(&descriptor.options) else {
        return Ok(Staleness::Stale(StaleReason::MissingBuildRecord));
    };
    if record.version != backend.version() {
        return Ok(Staleness::Stale(StaleReason::VersionMismatch {
            found: record.version,
            expected: backend.version().to_string(),
        }));
    }
    if record.has_errors() {
        return Ok(Staleness::Stale(StaleReason::PreviousBuildFailed));
    }

    Ok(Staleness::UpToDate)
}
