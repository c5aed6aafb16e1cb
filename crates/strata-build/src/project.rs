//! Per-project build state machine
//!
//! A [`ProjectBuildUnit`] owns the root files and the compiled program of
//! one project. Each pass it first updates its status from the change set
//! and the statuses of its references, then builds when needed.
//!
//! ```text
//!             delta / updated reference
//! Unchanged ─────────────────────────────▶ OutOfDate
//!     ▲                                     │ build()
//!     │ nothing changed                     ├──────────▶ Updated / UpdatedOneFile
//!     │                                     └──────────▶ Unbuildable (sticky)
//! ```
//!
//! Deleting outputs is a change dependents see: a unit that removed outputs
//! in a pass makes its dependents out of date even when its own status is
//! not an update.

use crate::backend::{CompilerBackend, Diagnostic, ProgramRequest, ReferencedProject};
use crate::build_record::BuildRecord;
use crate::cache::{CompilerHost, CompilerHostCache};
use crate::error::{BuildError, BuildResult};
use crate::events::ChangeSet;
use crate::module_resolver::invalidate_module_resolution;
use crate::output::{format_diagnostic, Logger};
use crate::staleness::{check_staleness, Staleness};
use crate::status::{BuildStatus, StatusLookup};
use filetime::FileTime;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use strata_config::ProjectDescriptor;

/// Root files of a project, changed only through [`RootFileSet::apply_change_set`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RootFileSet {
    files: BTreeSet<PathBuf>,
}

/// Root files touched by one change set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RootFileDelta {
    /// Root files created or modified
    pub updated: Vec<PathBuf>,
    /// Former root files that were deleted
    pub deleted: Vec<PathBuf>,
}

impl RootFileDelta {
    pub fn is_empty(&self) -> bool {
        self.updated.is_empty() && self.deleted.is_empty()
    }

    /// The updated file when it is the only change
    pub fn single_update(&self) -> Option<&Path> {
        match (self.updated.as_slice(), self.deleted.is_empty()) {
            ([only], true) => Some(only),
            _ => None,
        }
    }

    /// Updated and deleted files together
    pub fn files(&self) -> Vec<PathBuf> {
        self.updated.iter().chain(&self.deleted).cloned().collect()
    }
}

impl RootFileSet {
    pub fn new(files: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            files: files.into_iter().collect(),
        }
    }

    /// Apply a change set and return the part of it that concerns this set.
    ///
    /// Deleted paths leave the set. Updated paths join it when they already
    /// are root files or `is_included` accepts them.
    pub fn apply_change_set(
        &mut self,
        changes: &ChangeSet,
        is_included: impl Fn(&Path) -> bool,
    ) -> RootFileDelta {
        let mut delta = RootFileDelta::default();

        for path in &changes.deleted {
            if self.files.remove(path) {
                delta.deleted.push(path.clone());
            }
        }

        for path in &changes.updated {
            if self.files.contains(path) || is_included(path) {
                self.files.insert(path.clone());
                delta.updated.push(path.clone());
            }
        }

        delta
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.contains(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.files.iter()
    }

    /// Sorted root files
    pub fn to_vec(&self) -> Vec<PathBuf> {
        self.files.iter().cloned().collect()
    }
}

/// Shared collaborators lent to a unit for one operation
pub struct BuildContext<'a, B: CompilerBackend> {
    pub backend: &'a B,
    pub cache: &'a mut CompilerHostCache<B::Syntax>,
    pub statuses: &'a dyn StatusLookup,
    pub logger: &'a dyn Logger,
}

/// One project and its build state
pub struct ProjectBuildUnit<B: CompilerBackend> {
    descriptor: ProjectDescriptor,
    references: Vec<ReferencedProject>,
    root_files: RootFileSet,
    status: BuildStatus,
    program: Option<B::Program>,
    last_error: Option<Diagnostic>,
    delta: RootFileDelta,
    /// Record of the last build, seeds the first program of this process
    record: Option<BuildRecord>,
    removed_outputs: bool,
}

impl<B: CompilerBackend> ProjectBuildUnit<B> {
    /// Create the unit and run its initial build when the outputs on disk
    /// are stale or a reference was already updated in this pass.
    pub fn new(
        descriptor: ProjectDescriptor,
        references: Vec<ReferencedProject>,
        ctx: &mut BuildContext<'_, B>,
    ) -> Self {
        let mut unit = Self {
            root_files: RootFileSet::new(descriptor.root_files.iter().cloned()),
            record: ctx.backend.read_build_record(&descriptor.options),
            descriptor,
            references,
            status: BuildStatus::Unchanged,
            program: None,
            last_error: None,
            delta: RootFileDelta::default(),
            removed_outputs: false,
        };

        unit.remove_orphaned_outputs(ctx);

        if unit.root_files.is_empty() {
            tracing::debug!(project = %unit.name(), "no root files, nothing to build");
            return unit;
        }

        let root_files = unit.root_files.to_vec();
        let needs_build = match check_staleness(&unit.descriptor, &root_files, ctx.backend) {
            Ok(Staleness::Stale(reason)) => {
                tracing::debug!(project = %unit.name(), %reason, "project is stale");
                true
            }
            Ok(Staleness::UpToDate) if unit.removed_outputs => {
                tracing::debug!(project = %unit.name(), "outputs of former root files removed");
                true
            }
            Ok(Staleness::UpToDate) => unit.reference_changed(ctx.statuses),
            Err(e) => {
                ctx.logger.error(&e.to_string());
                unit.status = BuildStatus::Unbuildable;
                return unit;
            }
        };

        if needs_build {
            unit.status = BuildStatus::OutOfDate;
            unit.build(ctx);
        } else {
            tracing::debug!(project = %unit.name(), "project is up to date");
        }

        unit
    }

    /// Apply a change set and recompute the status.
    ///
    /// Must run after every referenced project updated its status for the
    /// current pass.
    pub fn update_status(&mut self, changes: &ChangeSet, ctx: &mut BuildContext<'_, B>) -> BuildStatus {
        let descriptor = &self.descriptor;
        let delta = self
            .root_files
            .apply_change_set(changes, |path| descriptor.is_included(path));

        self.removed_outputs =
            !delta.deleted.is_empty() && self.remove_outputs(&delta.deleted, ctx) > 0;
        invalidate_module_resolution(
            &delta.files(),
            self.descriptor.package_name.as_deref(),
            &mut ctx.cache.project_resolution,
            self.descriptor.base_dir(),
            &self.descriptor.options,
            ctx.backend,
        );

        self.status = if !delta.is_empty() {
            BuildStatus::OutOfDate
        } else if self.status == BuildStatus::Unbuildable {
            BuildStatus::Unbuildable
        } else if self.reference_changed(ctx.statuses) {
            BuildStatus::OutOfDate
        } else {
            BuildStatus::Unchanged
        };

        if !delta.is_empty() {
            tracing::debug!(
                project = %self.name(),
                updated = delta.updated.len(),
                deleted = delta.deleted.len(),
                "root files changed"
            );
        }
        self.delta = delta;
        self.status
    }

    /// Build when out of date, unbuildable, or a reference was updated or
    /// removed outputs
    pub fn build(&mut self, ctx: &mut BuildContext<'_, B>) -> BuildStatus {
        if !self.status.needs_build() && !self.reference_changed(ctx.statuses) {
            return self.status;
        }

        if self.root_files.is_empty() {
            tracing::debug!(project = %self.name(), "no root files left, skipping build");
            self.status = BuildStatus::OutOfDate;
            return self.status;
        }

        let root_files = self.root_files.to_vec();
        if let Some(missing) = root_files.iter().find(|p| !p.is_file()) {
            return self.fail(&BuildError::MissingInputFile(missing.clone()), ctx);
        }

        let changed_file = self.delta.single_update().map(Path::to_path_buf);
        let request = ProgramRequest {
            root_files: &root_files,
            options: &self.descriptor.options,
            references: &self.references,
            changed_file: changed_file.as_deref(),
            previous_record: match self.program {
                Some(_) => None,
                None => self.record.as_ref(),
            },
        };
        let program = {
            let mut host = CompilerHost::new(
                ctx.backend,
                &mut *ctx.cache,
                &self.descriptor.options.target,
                &self.references,
            );
            ctx.backend
                .create_program(request, &mut host, self.program.as_ref())
        };
        let program = match program {
            Ok(program) => program,
            Err(e) => return self.fail(&e, ctx),
        };

        if let Some(diagnostic) = ctx.backend.first_error(&program) {
            ctx.logger
                .error(&format_diagnostic(&diagnostic, self.descriptor.base_dir()));
            self.save_record(ctx.backend.build_record(&program), ctx);
            self.last_error = Some(diagnostic);
            self.status = BuildStatus::Unbuildable;
            return self.status;
        }

        let outputs = match ctx.backend.emit(&program) {
            Ok(outputs) => outputs,
            Err(e) => return self.fail(&e, ctx),
        };
        for output in &outputs {
            ctx.cache.invalidate(&output.path);
        }
        self.touch_outputs(&root_files, ctx);
        self.save_record(ctx.backend.build_record(&program), ctx);

        tracing::debug!(project = %self.name(), outputs = outputs.len(), "emitted");
        self.program = Some(program);
        self.last_error = None;
        self.status = if changed_file.is_some() {
            BuildStatus::UpdatedOneFile
        } else {
            BuildStatus::Updated
        };
        self.delta = RootFileDelta::default();
        self.status
    }

    /// Delete every output and the build record of this project
    pub fn clean(&self, ctx: &mut BuildContext<'_, B>) -> BuildResult<Vec<PathBuf>> {
        let removed = clean_project(&self.descriptor, &self.root_files.to_vec(), ctx.backend)?;
        for path in &removed {
            ctx.cache.invalidate(path);
        }
        Ok(removed)
    }

    pub fn status(&self) -> BuildStatus {
        self.status
    }

    pub fn descriptor(&self) -> &ProjectDescriptor {
        &self.descriptor
    }

    pub fn config_path(&self) -> &Path {
        &self.descriptor.config_path
    }

    pub fn name(&self) -> String {
        self.descriptor.name()
    }

    pub fn root_files(&self) -> &RootFileSet {
        &self.root_files
    }

    /// First error of the last failed build
    pub fn last_error(&self) -> Option<&Diagnostic> {
        self.last_error.as_ref()
    }

    /// Program of the last successful build in this process
    pub fn program(&self) -> Option<&B::Program> {
        self.program.as_ref()
    }

    /// Whether outputs were deleted in the current pass
    pub fn removed_outputs(&self) -> bool {
        self.removed_outputs
    }

    fn reference_changed(&self, statuses: &dyn StatusLookup) -> bool {
        self.descriptor.references.iter().any(|reference| {
            statuses.status_of(reference).is_updated() || statuses.removed_outputs(reference)
        })
    }

    fn fail(&mut self, error: &BuildError, ctx: &BuildContext<'_, B>) -> BuildStatus {
        ctx.logger.error(&error.to_string());
        self.status = BuildStatus::Unbuildable;
        self.status
    }

    /// Remove outputs of files the last build record lists as root files
    /// but which no longer are
    fn remove_orphaned_outputs(&mut self, ctx: &mut BuildContext<'_, B>) {
        let Some(record) = &self.record else {
            return;
        };
        let orphaned: Vec<PathBuf> = record
            .root_files
            .iter()
            .filter(|path| !self.root_files.contains(path))
            .cloned()
            .collect();
        if orphaned.is_empty() {
            return;
        }

        tracing::debug!(project = %self.name(), files = orphaned.len(), "removing outputs of former root files");
        self.removed_outputs = self.remove_outputs(&orphaned, ctx) > 0;
        invalidate_module_resolution(
            &orphaned,
            self.descriptor.package_name.as_deref(),
            &mut ctx.cache.project_resolution,
            self.descriptor.base_dir(),
            &self.descriptor.options,
            ctx.backend,
        );
    }

    /// Delete the outputs of `sources`; returns how many existed
    fn remove_outputs(&self, sources: &[PathBuf], ctx: &mut BuildContext<'_, B>) -> usize {
        let mut removed = 0;
        for output in ctx.backend.expected_outputs(&self.descriptor.options, sources) {
            ctx.cache.invalidate(&output);
            match fs::remove_file(&output) {
                Ok(()) => {
                    tracing::debug!(output = %output.display(), "removed output");
                    removed += 1;
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => ctx
                    .logger
                    .warn(&format!("Could not remove {}: {}", output.display(), e)),
            }
        }
        removed
    }

    /// Mark every expected output as newer than any input
    fn touch_outputs(&self, root_files: &[PathBuf], ctx: &BuildContext<'_, B>) {
        let now = FileTime::now();
        for output in ctx.backend.expected_outputs(&self.descriptor.options, root_files) {
            if let Err(e) = filetime::set_file_mtime(&output, now) {
                tracing::debug!(output = %output.display(), error = %e, "could not update timestamp");
            }
        }
    }

    /// Persist `record` unless the one on disk describes the same build
    fn save_record(&mut self, record: BuildRecord, ctx: &BuildContext<'_, B>) {
        let on_disk = ctx.backend.read_build_record(&self.descriptor.options);
        if on_disk.is_some_and(|old| old.same_build(&record)) {
            tracing::debug!(project = %self.name(), "build record unchanged");
        } else if let Err(e) = record.save(&self.descriptor.options.build_info_file) {
            ctx.logger.warn(&e.to_string());
        }
        self.record = Some(record);
    }
}

/// Delete the expected outputs of `root_files` and of the root files the
/// build record remembers, plus the build record itself. Returns the paths
/// removed.
pub fn clean_project<B: CompilerBackend>(
    descriptor: &ProjectDescriptor,
    root_files: &[PathBuf],
    backend: &B,
) -> BuildResult<Vec<PathBuf>> {
    let mut sources: BTreeSet<PathBuf> = root_files.iter().cloned().collect();
    if let Some(record) = backend.read_build_record(&descriptor.options) {
        sources.extend(record.root_files);
    }
    let sources: Vec<PathBuf> = sources.into_iter().collect();

    let mut targets = backend.expected_outputs(&descriptor.options, &sources);
    targets.push(descriptor.options.build_info_file.clone());

    let mut removed = Vec::new();
    for path in targets {
        match fs::remove_file(&path) {
            Ok(()) => removed.push(path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(BuildError::io(&path, e)),
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{SourceSyntax, StrataCompiler};
    use crate::cache::SourceFile;
    use crate::events::FsEvent;
    use crate::output::{CapturingLogger, LogLevel};
    use crate::status::BuildStatusRegistry;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    struct Fixture {
        _temp: TempDir,
        root: PathBuf,
        backend: StrataCompiler,
        cache: CompilerHostCache<SourceSyntax>,
        statuses: BuildStatusRegistry,
        logger: CapturingLogger,
    }

    impl Fixture {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let root = temp.path().canonicalize().unwrap();
            fs::write(root.join("strata.toml"), "").unwrap();
            let mut statuses = BuildStatusRegistry::new();
            statuses.begin_pass();
            Self {
                _temp: temp,
                root,
                backend: StrataCompiler::new(),
                cache: CompilerHostCache::new(),
                statuses,
                logger: CapturingLogger::new(),
            }
        }

        fn write(&self, relative: &str, content: &str) -> PathBuf {
            let path = self.root.join(relative);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, content).unwrap();
            path
        }

        fn descriptor(&self) -> ProjectDescriptor {
            strata_config::ConfigLoader::new().load(&self.root).unwrap()
        }

        fn ctx(&mut self) -> BuildContext<'_, StrataCompiler> {
            BuildContext {
                backend: &self.backend,
                cache: &mut self.cache,
                statuses: &self.statuses,
                logger: &self.logger,
            }
        }

        fn unit(&mut self) -> ProjectBuildUnit<StrataCompiler> {
            let descriptor = self.descriptor();
            ProjectBuildUnit::new(descriptor, Vec::new(), &mut self.ctx())
        }
    }

    #[test]
    fn test_root_file_set_delta() {
        let mut set = RootFileSet::new([PathBuf::from("/p/a.st"), PathBuf::from("/p/b.st")]);
        let changes = ChangeSet::from_events(&[
            FsEvent::deleted("/p/a.st"),
            FsEvent::created("/p/c.st"),
            FsEvent::updated("/p/b.st"),
            FsEvent::created("/p/notes.md"),
            FsEvent::deleted("/p/unrelated.st"),
        ]);

        let delta = set.apply_change_set(&changes, |p| p.extension().is_some_and(|e| e == "st"));

        assert_eq!(delta.deleted, vec![PathBuf::from("/p/a.st")]);
        assert_eq!(
            delta.updated,
            vec![PathBuf::from("/p/b.st"), PathBuf::from("/p/c.st")]
        );
        assert_eq!(
            set.to_vec(),
            vec![PathBuf::from("/p/b.st"), PathBuf::from("/p/c.st")]
        );
        assert_eq!(delta.single_update(), None);
    }

    #[test]
    fn test_no_root_files_never_builds() {
        let mut fixture = Fixture::new();
        let unit = fixture.unit();

        assert_eq!(unit.status(), BuildStatus::Unchanged);
        assert!(!fixture.root.join(".strata-buildinfo").exists());
    }

    #[test]
    fn test_initial_build_then_up_to_date() {
        let mut fixture = Fixture::new();
        fixture.write("a.st", "export a\nbody\n");

        let unit = fixture.unit();
        assert_eq!(unit.status(), BuildStatus::Updated);
        assert!(unit.program().is_some());
        assert!(fixture.root.join("dist/a.out").is_file());
        assert!(fixture.root.join(".strata-buildinfo").is_file());

        // A fresh process sees up-to-date outputs
        let again = fixture.unit();
        assert_eq!(again.status(), BuildStatus::Unchanged);
        assert!(again.program().is_none());
    }

    #[test]
    fn test_compiler_error_keeps_previous_outputs() {
        let mut fixture = Fixture::new();
        let a = fixture.write("a.st", "export a\n");
        let mut unit = fixture.unit();
        let declaration = fixture.root.join("dist/a.d.st");
        assert_eq!(fs::read_to_string(&declaration).unwrap(), "export a\n");

        fixture.write("a.st", "export a\nexport a\n");
        fixture.cache.invalidate(&a);
        let changes = ChangeSet::from_events(&[FsEvent::updated(&a)]);
        fixture.statuses.begin_pass();
        assert_eq!(unit.update_status(&changes, &mut fixture.ctx()), BuildStatus::OutOfDate);
        assert_eq!(unit.build(&mut fixture.ctx()), BuildStatus::Unbuildable);

        assert_eq!(unit.last_error().unwrap().code, "S2300");
        assert_eq!(fs::read_to_string(&declaration).unwrap(), "export a\n");
        assert!(unit.program().is_some());
        let errors = fixture.logger.messages(LogLevel::Error);
        assert!(errors[0].starts_with("a.st:2:8 - error S2300"), "{}", errors[0]);

        // Unbuildable is sticky while nothing changes
        fixture.statuses.begin_pass();
        assert_eq!(
            unit.update_status(&ChangeSet::empty(), &mut fixture.ctx()),
            BuildStatus::Unbuildable
        );
    }

    #[test]
    fn test_single_update_reports_one_file() {
        let mut fixture = Fixture::new();
        let a = fixture.write("a.st", "export a\n");
        fixture.write("b.st", "export b\n");
        let mut unit = fixture.unit();

        fixture.write("a.st", "export a2\n");
        fixture.cache.invalidate(&a);
        fixture.statuses.begin_pass();
        unit.update_status(&ChangeSet::from_events(&[FsEvent::updated(&a)]), &mut fixture.ctx());

        assert_eq!(unit.build(&mut fixture.ctx()), BuildStatus::UpdatedOneFile);
        assert!(unit.status().is_updated());
    }

    #[test]
    fn test_deleted_root_file_removes_outputs() {
        let mut fixture = Fixture::new();
        let a = fixture.write("a.st", "export a\n");
        fixture.write("b.st", "export b\n");
        let mut unit = fixture.unit();
        assert!(fixture.root.join("dist/a.out").is_file());

        fs::remove_file(&a).unwrap();
        fixture.statuses.begin_pass();
        let status = unit.update_status(&ChangeSet::from_events(&[FsEvent::deleted(&a)]), &mut fixture.ctx());

        assert_eq!(status, BuildStatus::OutOfDate);
        assert!(!unit.root_files().contains(&a));
        assert!(!fixture.root.join("dist/a.out").exists());
        assert!(!fixture.root.join("dist/a.d.st").exists());
        assert_eq!(unit.build(&mut fixture.ctx()), BuildStatus::Updated);
    }

    #[test]
    fn test_last_root_file_deleted_stays_out_of_date() {
        let mut fixture = Fixture::new();
        let a = fixture.write("a.st", "export a\n");
        let mut unit = fixture.unit();

        fs::remove_file(&a).unwrap();
        fixture.statuses.begin_pass();
        unit.update_status(&ChangeSet::from_events(&[FsEvent::deleted(&a)]), &mut fixture.ctx());

        assert_eq!(unit.build(&mut fixture.ctx()), BuildStatus::OutOfDate);
        assert!(unit.root_files().is_empty());
    }

    #[test]
    fn test_missing_input_at_construction_is_unbuildable() {
        let mut fixture = Fixture::new();
        let a = fixture.write("a.st", "export a\n");
        let descriptor = fixture.descriptor();
        fs::remove_file(&a).unwrap();

        let unit = ProjectBuildUnit::new(descriptor, Vec::new(), &mut fixture.ctx());

        assert_eq!(unit.status(), BuildStatus::Unbuildable);
        assert!(fixture.logger.messages(LogLevel::Error)[0].contains("does not exist"));
    }

    #[test]
    fn test_outputs_of_former_root_files_removed_at_startup() {
        let mut fixture = Fixture::new();
        let a = fixture.write("a.st", "export a\n");
        fixture.write("b.st", "export b\n");
        fixture.unit();

        // Removed while no process was watching
        fs::remove_file(&a).unwrap();
        let unit = fixture.unit();

        assert!(!fixture.root.join("dist/a.out").exists());
        assert!(fixture.root.join("dist/b.out").exists());
        assert!(unit.removed_outputs());
        assert_eq!(unit.status(), BuildStatus::Updated);

        // Nothing left to remove on the next start
        let again = fixture.unit();
        assert!(!again.removed_outputs());
        assert_eq!(again.status(), BuildStatus::Unchanged);
    }

    #[test]
    fn test_outputs_of_last_root_file_removed_at_startup() {
        let mut fixture = Fixture::new();
        let a = fixture.write("a.st", "export a\n");
        fixture.unit();

        fs::remove_file(&a).unwrap();
        let unit = fixture.unit();

        assert!(unit.root_files().is_empty());
        assert!(unit.removed_outputs());
        assert_eq!(unit.status(), BuildStatus::Unchanged);
        assert!(!fixture.root.join("dist/a.d.st").exists());
    }

    #[test]
    fn test_failed_retry_keeps_identical_record() {
        let mut fixture = Fixture::new();
        fixture.write("a.st", "export a\nexport a\n");
        let mut unit = fixture.unit();
        assert_eq!(unit.status(), BuildStatus::Unbuildable);

        let record = fixture.root.join(".strata-buildinfo");
        let earlier = FileTime::from_unix_time(FileTime::now().unix_seconds() - 60, 0);
        filetime::set_file_mtime(&record, earlier).unwrap();

        fixture.statuses.begin_pass();
        unit.update_status(&ChangeSet::empty(), &mut fixture.ctx());
        assert_eq!(unit.build(&mut fixture.ctx()), BuildStatus::Unbuildable);

        let modified = FileTime::from_last_modification_time(&fs::metadata(&record).unwrap());
        assert_eq!(modified, earlier);
    }

    #[test]
    fn test_restart_reuses_checks_from_record() {
        let mut fixture = Fixture::new();
        let a = fixture.write("a.st", "export a\n");
        fixture.write("b.st", "export b\n");
        fixture.write("c.st", "import { b } from \"./b\"\n");
        fixture.unit();

        fixture.write("a.st", "export a2\n");
        let later = FileTime::from_unix_time(FileTime::now().unix_seconds() + 10, 0);
        filetime::set_file_mtime(&a, later).unwrap();
        fixture.cache = CompilerHostCache::new();
        let unit = fixture.unit();

        assert_eq!(unit.status(), BuildStatus::Updated);
        assert_eq!(unit.program().unwrap().reused_files(), 2);
    }

    #[test]
    fn test_deleted_root_file_invalidates_derived_cache_entries() {
        let mut fixture = Fixture::new();
        fs::write(fixture.root.join("strata.toml"), "[package]\nname = \"pkg\"\n").unwrap();
        let a = fixture.write("a.st", "export a\n");
        fixture.write("b.st", "export b\n");
        let mut unit = fixture.unit();

        let declaration = fixture.root.join("dist/a.d.st");
        fixture
            .cache
            .sources
            .get_or_load("latest", &declaration, |p| {
                Ok(SourceFile::new(p, "latest", String::new(), SourceSyntax::default()))
            })
            .unwrap();
        fixture
            .cache
            .project_resolution
            .insert("pkg/dist/a", Some(declaration.clone()));
        fixture.cache.project_resolution.insert("pkg", None);

        fs::remove_file(&a).unwrap();
        fixture.statuses.begin_pass();
        unit.update_status(&ChangeSet::from_events(&[FsEvent::deleted(&a)]), &mut fixture.ctx());

        assert!(fixture.cache.sources.get("latest", &declaration).is_none());
        assert!(!fixture.cache.project_resolution.contains("pkg/dist/a"));
        assert!(!fixture.cache.project_resolution.contains("pkg"));
        assert!(unit.removed_outputs());
    }

    #[test]
    fn test_clean_project() {
        let mut fixture = Fixture::new();
        fixture.write("a.st", "export a\n");
        let unit = fixture.unit();

        let removed = unit.clean(&mut fixture.ctx()).unwrap();

        assert_eq!(removed.len(), 3);
        assert!(!fixture.root.join("dist/a.out").exists());
        assert!(!fixture.root.join(".strata-buildinfo").exists());
    }
}
