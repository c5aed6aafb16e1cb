//! Watch mode - rebuild incrementally on file changes

use anyhow::{Context, Result};
use notify::event::{EventKind, ModifyKind, RenameMode};
use notify::{RecursiveMode, Watcher};
use std::path::Path;
use std::sync::mpsc::channel;
use std::time::Duration;
use strata_build::{ChangeSet, ConsoleLogger, FsEvent, Logger, Runner, StrataCompiler};

/// Quiet period that closes a batch of events
const DEBOUNCE_MS: u64 = 100;

/// Build once, then rebuild on every batch of changes until the watcher
/// shuts down
pub fn run_watch(project: &Path, no_color: bool) -> Result<()> {
    let graph = super::load_graph(project)?;
    let logger = ConsoleLogger::new().with_no_color(no_color);
    let mut runner =
        Runner::new(graph, StrataCompiler::new(), logger).context("Failed to start build")?;
    let watch_root = runner.watch_root();

    let (tx, rx) = channel();
    let mut watcher = notify::recommended_watcher(tx).context("Failed to create file watcher")?;
    watcher
        .watch(&watch_root, RecursiveMode::Recursive)
        .with_context(|| format!("Failed to watch {}", watch_root.display()))?;

    runner
        .logger()
        .info(&format!("Watching {} for changes", watch_root.display()));

    let debounce = Duration::from_millis(DEBOUNCE_MS);
    while let Ok(first) = rx.recv() {
        let mut events = Vec::new();
        collect(first, &mut events);
        // Ends on timeout or when the watcher goes away
        while let Ok(next) = rx.recv_timeout(debounce) {
            collect(next, &mut events);
        }

        if events.is_empty() {
            continue;
        }
        runner.build(&ChangeSet::from_events(&events));
    }

    Ok(())
}

fn collect(result: notify::Result<notify::Event>, events: &mut Vec<FsEvent>) {
    match result {
        Ok(event) => events.extend(translate(&event)),
        Err(e) => tracing::warn!(error = %e, "file watcher error"),
    }
}

/// Map a watcher notification to filesystem events. Access notifications
/// are dropped; ambiguous ones are resolved by checking the disk.
pub fn translate(event: &notify::Event) -> Vec<FsEvent> {
    match event.kind {
        EventKind::Access(_) => Vec::new(),
        EventKind::Create(_) => event.paths.iter().map(FsEvent::created).collect(),
        EventKind::Remove(_) => event.paths.iter().map(FsEvent::deleted).collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            event.paths.iter().map(FsEvent::deleted).collect()
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            event.paths.iter().map(FsEvent::created).collect()
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) if event.paths.len() == 2 => {
            vec![
                FsEvent::deleted(&event.paths[0]),
                FsEvent::created(&event.paths[1]),
            ]
        }
        EventKind::Modify(ModifyKind::Name(_)) | EventKind::Any | EventKind::Other => event
            .paths
            .iter()
            .map(|path| {
                if path.exists() {
                    FsEvent::updated(path)
                } else {
                    FsEvent::deleted(path)
                }
            })
            .collect(),
        EventKind::Modify(_) => event.paths.iter().map(FsEvent::updated).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, RemoveKind};
    use std::path::PathBuf;

    fn event(kind: EventKind, paths: &[&str]) -> notify::Event {
        paths
            .iter()
            .fold(notify::Event::new(kind), |e, p| e.add_path(PathBuf::from(p)))
    }

    #[test]
    fn test_translate_basic_kinds() {
        assert_eq!(
            translate(&event(EventKind::Create(CreateKind::File), &["/p/a.st"])),
            vec![FsEvent::created("/p/a.st")]
        );
        assert_eq!(
            translate(&event(
                EventKind::Modify(ModifyKind::Data(DataChange::Content)),
                &["/p/a.st"]
            )),
            vec![FsEvent::updated("/p/a.st")]
        );
        assert_eq!(
            translate(&event(EventKind::Remove(RemoveKind::File), &["/p/a.st"])),
            vec![FsEvent::deleted("/p/a.st")]
        );
        assert!(translate(&event(EventKind::Access(AccessKind::Any), &["/p/a.st"])).is_empty());
    }

    #[test]
    fn test_translate_rename() {
        assert_eq!(
            translate(&event(
                EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
                &["/p/old.st", "/p/new.st"]
            )),
            vec![FsEvent::deleted("/p/old.st"), FsEvent::created("/p/new.st")]
        );
        assert_eq!(
            translate(&event(
                EventKind::Modify(ModifyKind::Name(RenameMode::From)),
                &["/p/old.st"]
            )),
            vec![FsEvent::deleted("/p/old.st")]
        );
    }

    #[test]
    fn test_translate_ambiguous_checks_disk() {
        let temp = tempfile::TempDir::new().unwrap();
        let present = temp.path().join("a.st");
        std::fs::write(&present, "").unwrap();
        let missing = temp.path().join("b.st");

        let mut notification = notify::Event::new(EventKind::Any);
        notification = notification.add_path(present.clone()).add_path(missing.clone());

        assert_eq!(
            translate(&notification),
            vec![FsEvent::updated(present), FsEvent::deleted(missing)]
        );
    }
}
