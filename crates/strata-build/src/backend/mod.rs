//! Compiler backend interface
//!
//! The orchestrator never looks inside a program. It asks the backend to
//! create one from a set of root files, reads the first error, and emits.

mod compiler;
mod diagnostic;
mod syntax;

pub use compiler::{StrataCompiler, StrataProgram};
pub use diagnostic::{Diagnostic, DiagnosticCategory};
pub use syntax::{Export, Import, SourceSyntax};

use crate::build_record::BuildRecord;
use crate::cache::CompilerHost;
use crate::error::BuildResult;
use std::path::{Path, PathBuf};
use strata_config::{CompilerOptions, ProjectDescriptor};

/// What a referencing project needs to know about a referenced one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferencedProject {
    pub config_path: PathBuf,
    pub package_name: Option<String>,
    pub base_dir: PathBuf,
    pub out_dir: PathBuf,
}

impl From<&ProjectDescriptor> for ReferencedProject {
    fn from(descriptor: &ProjectDescriptor) -> Self {
        Self {
            config_path: descriptor.config_path.clone(),
            package_name: descriptor.package_name.clone(),
            base_dir: descriptor.base_dir().to_path_buf(),
            out_dir: descriptor.options.out_dir.clone(),
        }
    }
}

/// Inputs of one program creation
#[derive(Debug, Clone, Copy)]
pub struct ProgramRequest<'a> {
    pub root_files: &'a [PathBuf],
    pub options: &'a CompilerOptions,
    pub references: &'a [ReferencedProject],
    /// Set when exactly one file changed since the previous program
    pub changed_file: Option<&'a Path>,
    /// Persisted record of the last build, offered when there is no
    /// previous program in this process
    pub previous_record: Option<&'a BuildRecord>,
}

/// A file written by [`CompilerBackend::emit`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub path: PathBuf,
    pub source: PathBuf,
}

/// A single-project compiler
pub trait CompilerBackend: Sized {
    /// Parse result cached per source file
    type Syntax;
    /// Checked compilation unit, exclusively owned by one project
    type Program;

    /// Version tag stored in build records
    fn version(&self) -> &str;

    /// Extensions of compilable source files, without the leading dot
    fn source_extensions(&self) -> &[&'static str];

    /// Extension of declaration outputs, without the leading dot
    fn declaration_extension(&self) -> &'static str;

    fn parse(&self, path: &Path, text: &str) -> Self::Syntax;

    /// Create a program, reusing whatever `previous` (or, without one,
    /// `request.previous_record`) still has valid
    fn create_program(
        &self,
        request: ProgramRequest<'_>,
        host: &mut CompilerHost<'_, Self>,
        previous: Option<&Self::Program>,
    ) -> BuildResult<Self::Program>;

    /// First diagnostic of the program, syntactic before semantic
    fn first_error(&self, program: &Self::Program) -> Option<Diagnostic>;

    /// Write every output of the program
    fn emit(&self, program: &Self::Program) -> BuildResult<Vec<OutputFile>>;

    /// Output paths a build of `root_files` produces
    fn expected_outputs(&self, options: &CompilerOptions, root_files: &[PathBuf]) -> Vec<PathBuf>;

    /// Incremental metadata describing the program
    fn build_record(&self, program: &Self::Program) -> BuildRecord;

    /// Read the persisted build record; unreadable records count as missing
    fn read_build_record(&self, options: &CompilerOptions) -> Option<BuildRecord> {
        match BuildRecord::load(&options.build_info_file) {
            Ok(record) => record,
            Err(e) => {
                tracing::debug!(error = %e, "ignoring unreadable build record");
                None
            }
        }
    }

    /// Whether `path` is a declaration output
    fn is_declaration(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(&format!(".{}", self.declaration_extension())))
    }
}
