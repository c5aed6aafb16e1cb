//! Reference compiler backend
//!
//! Checks imports against the exports of the imported module and emits two
//! files per root source file: the body text (`.out`) and, when
//! declarations are enabled, the export list (`.d.st`).

use super::syntax::{self, SourceSyntax};
use super::{CompilerBackend, Diagnostic, OutputFile, ProgramRequest};
use crate::build_record::{BuildRecord, FileRecord};
use crate::cache::{CompilerHost, SourceFile};
use crate::error::{BuildError, BuildResult};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use strata_config::CompilerOptions;

const SOURCE_EXTENSIONS: &[&str] = &["st"];
const DECLARATION_EXTENSION: &str = "d.st";
const OUTPUT_EXTENSION: &str = "out";

const CANNOT_FIND_MODULE: &str = "S2307";
const MISSING_EXPORT: &str = "S2305";
const DUPLICATE_EXPORT: &str = "S2300";

type Source = Rc<SourceFile<SourceSyntax>>;

/// The Strata module compiler
#[derive(Debug, Clone)]
pub struct StrataCompiler {
    version: String,
}

impl StrataCompiler {
    pub fn new() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Override the version tag written to build records
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    fn output_stem(options: &CompilerOptions, source: &Path) -> PathBuf {
        let relative = source
            .strip_prefix(&options.root_dir)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| source.file_name().map(PathBuf::from).unwrap_or_default());
        options.out_dir.join(relative)
    }

    fn is_declaration_file(path: &Path) -> bool {
        path.to_string_lossy()
            .ends_with(&format!(".{}", DECLARATION_EXTENSION))
    }

    fn check_file(&self, file: &Source, imports: &[Option<Source>]) -> Vec<Diagnostic> {
        let syntax = &file.syntax;
        let mut diagnostics = syntax.errors.clone();

        let mut seen = BTreeSet::new();
        for export in &syntax.exports {
            if !seen.insert(export.name.as_str()) {
                diagnostics.push(
                    Diagnostic::semantic(
                        DUPLICATE_EXPORT,
                        format!("Duplicate export '{}'", export.name),
                    )
                    .with_file(&file.path)
                    .at(export.line, export.column, export.name.len())
                    .with_snippet(&export.snippet),
                );
            }
        }

        for (import, resolved) in syntax.imports.iter().zip(imports) {
            let Some(target) = resolved else {
                diagnostics.push(
                    Diagnostic::semantic(
                        CANNOT_FIND_MODULE,
                        format!("Cannot find module '{}'", import.specifier),
                    )
                    .with_file(&file.path)
                    .at(import.line, import.column, import.specifier.len() + 2)
                    .with_snippet(&import.snippet),
                );
                continue;
            };

            for name in &import.names {
                if !target.syntax.exports.iter().any(|e| &e.name == name) {
                    diagnostics.push(
                        Diagnostic::semantic(
                            MISSING_EXPORT,
                            format!(
                                "Module '{}' has no exported member '{}'",
                                import.specifier, name
                            ),
                        )
                        .with_file(&file.path)
                        .at(import.line, import.column, import.specifier.len() + 2)
                        .with_snippet(&import.snippet),
                    );
                }
            }
        }

        diagnostics
    }
}

impl Default for StrataCompiler {
    fn default() -> Self {
        Self::new()
    }
}

/// A checked file and what it was checked against
#[derive(Debug)]
struct CheckedFile {
    source: Source,
    resolutions: Vec<Option<PathBuf>>,
    imports: Vec<Option<Source>>,
    diagnostics: Vec<Diagnostic>,
}

impl CheckedFile {
    /// Whether the previous check still holds for the current sources
    fn is_reusable(&self, source: &Source, resolutions: &[Option<PathBuf>], imports: &[Option<Source>]) -> bool {
        Rc::ptr_eq(&self.source, source)
            && self.resolutions == resolutions
            && self.imports.iter().zip(imports).all(|(old, new)| match (old, new) {
                (Some(old), Some(new)) => Rc::ptr_eq(old, new),
                (None, None) => true,
                _ => false,
            })
    }
}

/// A checked set of Strata modules
#[derive(Debug)]
pub struct StrataProgram {
    options: CompilerOptions,
    root_files: Vec<PathBuf>,
    files: BTreeMap<PathBuf, CheckedFile>,
    diagnostics: Vec<Diagnostic>,
    reused: usize,
}

impl StrataProgram {
    /// Every file that took part, root files and imports
    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.files.keys().map(PathBuf::as_path)
    }

    pub fn root_files(&self) -> &[PathBuf] {
        &self.root_files
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Number of files whose check was carried over from the previous program
    pub fn reused_files(&self) -> usize {
        self.reused
    }
}

impl CompilerBackend for StrataCompiler {
    type Syntax = SourceSyntax;
    type Program = StrataProgram;

    fn version(&self) -> &str {
        &self.version
    }

    fn source_extensions(&self) -> &[&'static str] {
        SOURCE_EXTENSIONS
    }

    fn declaration_extension(&self) -> &'static str {
        DECLARATION_EXTENSION
    }

    fn parse(&self, path: &Path, text: &str) -> SourceSyntax {
        syntax::parse(path, text)
    }

    fn create_program(
        &self,
        request: ProgramRequest<'_>,
        host: &mut CompilerHost<'_, Self>,
        previous: Option<&StrataProgram>,
    ) -> BuildResult<StrataProgram> {
        if let Some(changed) = request.changed_file {
            tracing::debug!(file = %changed.display(), "single file change");
        }

        // Load the root files and everything they import
        let mut loaded: BTreeMap<PathBuf, (Source, Vec<Option<PathBuf>>)> = BTreeMap::new();
        let mut pending: VecDeque<PathBuf> = request.root_files.iter().cloned().collect();
        while let Some(path) = pending.pop_front() {
            if loaded.contains_key(&path) {
                continue;
            }
            let source = host.source_file(&path)?;
            let resolutions: Vec<Option<PathBuf>> = source
                .syntax
                .imports
                .iter()
                .map(|import| host.resolve_module(&import.specifier, &path))
                .collect();
            pending.extend(resolutions.iter().flatten().cloned());
            loaded.insert(path, (source, resolutions));
        }

        let mut files = BTreeMap::new();
        let mut reused = 0;
        for (path, (source, resolutions)) in &loaded {
            let imports: Vec<Option<Source>> = resolutions
                .iter()
                .map(|r| r.as_ref().and_then(|p| loaded.get(p)).map(|(s, _)| Rc::clone(s)))
                .collect();

            let carried = match previous {
                Some(previous) => previous
                    .files
                    .get(path)
                    .filter(|old| old.is_reusable(source, resolutions, &imports))
                    .map(|old| old.diagnostics.clone()),
                None => request
                    .previous_record
                    .filter(|record| record.version == self.version)
                    .and_then(|record| recorded_check(record, path, source, resolutions, &loaded)),
            };
            let diagnostics = match carried {
                Some(diagnostics) => {
                    reused += 1;
                    diagnostics
                }
                None => self.check_file(source, &imports),
            };

            files.insert(
                path.clone(),
                CheckedFile {
                    source: Rc::clone(source),
                    resolutions: resolutions.clone(),
                    imports,
                    diagnostics,
                },
            );
        }

        let mut diagnostics: Vec<Diagnostic> = files
            .values()
            .flat_map(|f| f.diagnostics.iter().cloned())
            .collect();
        // Stable: file order within each category is kept
        diagnostics.sort_by_key(|d| d.category);

        tracing::debug!(files = files.len(), reused, "created program");

        Ok(StrataProgram {
            options: request.options.clone(),
            root_files: request.root_files.to_vec(),
            files,
            diagnostics,
            reused,
        })
    }

    fn first_error(&self, program: &StrataProgram) -> Option<Diagnostic> {
        program.diagnostics.first().cloned()
    }

    fn emit(&self, program: &StrataProgram) -> BuildResult<Vec<OutputFile>> {
        let mut outputs = Vec::new();

        for root in &program.root_files {
            if Self::is_declaration_file(root) {
                continue;
            }
            let Some(file) = program.files.get(root) else {
                continue;
            };
            let stem = Self::output_stem(&program.options, root);

            let mut body = file.source.syntax.body.join("\n");
            body.push('\n');
            let mut written = vec![(stem.with_extension(OUTPUT_EXTENSION), body)];

            if program.options.declaration {
                let declarations: String = file
                    .source
                    .syntax
                    .exports
                    .iter()
                    .map(|e| format!("export {}\n", e.name))
                    .collect();
                written.push((stem.with_extension(DECLARATION_EXTENSION), declarations));
            }

            for (path, content) in written {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent).map_err(|e| BuildError::io(parent, e))?;
                }
                fs::write(&path, content).map_err(|e| BuildError::io(&path, e))?;
                outputs.push(OutputFile {
                    path,
                    source: root.clone(),
                });
            }
        }

        Ok(outputs)
    }

    fn expected_outputs(&self, options: &CompilerOptions, root_files: &[PathBuf]) -> Vec<PathBuf> {
        let mut outputs = Vec::new();
        for root in root_files {
            if Self::is_declaration_file(root) {
                continue;
            }
            let stem = Self::output_stem(options, root);
            outputs.push(stem.with_extension(OUTPUT_EXTENSION));
            if options.declaration {
                outputs.push(stem.with_extension(DECLARATION_EXTENSION));
            }
        }
        outputs
    }

    fn build_record(&self, program: &StrataProgram) -> BuildRecord {
        program.files.iter().fold(
            BuildRecord::new(&self.version, program.root_files.clone()),
            |record, (path, file)| {
                record.with_file(
                    path,
                    FileRecord {
                        version: file.source.version.clone(),
                        resolutions: file.resolutions.clone(),
                        diagnostics: file.diagnostics.clone(),
                    },
                )
            },
        )
    }
}

/// Diagnostics of `path` from a persisted record, when neither the file nor
/// anything it imports changed since
fn recorded_check(
    record: &BuildRecord,
    path: &Path,
    source: &Source,
    resolutions: &[Option<PathBuf>],
    loaded: &BTreeMap<PathBuf, (Source, Vec<Option<PathBuf>>)>,
) -> Option<Vec<Diagnostic>> {
    let entry = record.files.get(path)?;
    if entry.version != source.version || entry.resolutions != resolutions {
        return None;
    }
    let imports_unchanged = resolutions.iter().flatten().all(|import| {
        match (record.files.get(import), loaded.get(import)) {
            (Some(old), Some((current, _))) => old.version == current.version,
            _ => false,
        }
    });
    imports_unchanged.then(|| entry.diagnostics.clone())
}
