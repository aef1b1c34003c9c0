use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use dirsync::{
    sync, Action, Entry, EntryKind, FsSource, Instruction, Reporter, SilentReporter, Source,
    SyncError,
};

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

fn write(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

fn touch(path: &Path, secs: u64) {
    let time = SystemTime::UNIX_EPOCH + Duration::from_secs(1_600_000_000 + secs);
    fs::File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(time)
        .unwrap();
}

/// Every path under `root`, relative, with a trailing `/` on directories.
fn snapshot(root: &Path) -> Vec<String> {
    let mut out: Vec<String> = walkdir::WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .map(|e| {
            let e = e.unwrap();
            let rel = e.path().strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/");
            if e.file_type().is_dir() { format!("{rel}/") } else { rel }
        })
        .collect();
    out.sort();
    out
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

/// Source and target trees for the end-to-end scenarios.
///
/// ```text
/// src/                         dst/
///   new.txt                      stale.txt        (older than src)
///   stale.txt                    fresh.txt        (newer than src)
///   fresh.txt                    orphan.txt
///   nested/                      nested/
///     deep/                        old.txt
///       leaf.txt                 swap            (directory)
///     inner.txt                    junk.txt
///   swap                         keep/
///                                  note.txt
/// ```
fn setup() -> (tempfile::TempDir, tempfile::TempDir) {
    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    let s = src.path();
    let d = dst.path();

    write(&s.join("new.txt"), "new");
    write(&s.join("stale.txt"), "source stale");
    write(&s.join("fresh.txt"), "source fresh");
    write(&s.join("nested/inner.txt"), "inner");
    write(&s.join("nested/deep/leaf.txt"), "leaf");
    write(&s.join("swap"), "swap file");

    write(&d.join("stale.txt"), "target stale");
    write(&d.join("fresh.txt"), "target fresh");
    write(&d.join("orphan.txt"), "orphan");
    write(&d.join("nested/old.txt"), "old");
    write(&d.join("swap/junk.txt"), "junk");
    write(&d.join("keep/note.txt"), "note");

    touch(&s.join("stale.txt"), 200);
    touch(&d.join("stale.txt"), 100);
    touch(&s.join("fresh.txt"), 100);
    touch(&d.join("fresh.txt"), 200);

    (src, dst)
}

/// Records the trace as `action path` lines.
#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<String>>>);

impl Recorder {
    fn lines(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

impl Reporter for Recorder {
    fn instruction(&self, instruction: &Instruction, target: &Path) {
        self.0.lock().unwrap().push(format!("{} {}", instruction.action, target.display()));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn additive_sync_copies_new_and_newer() {
    let (src, dst) = setup();
    let report = sync()
        .source(src.path())
        .target(dst.path())
        .reporter(SilentReporter)
        .run()
        .unwrap();

    assert!(report.is_clean());
    assert_eq!(read(&dst.path().join("new.txt")), "new");
    assert_eq!(read(&dst.path().join("stale.txt")), "source stale");
    assert_eq!(read(&dst.path().join("fresh.txt")), "target fresh");
    assert_eq!(read(&dst.path().join("nested/inner.txt")), "inner");
    assert_eq!(read(&dst.path().join("nested/deep/leaf.txt")), "leaf");

    // Nothing is deleted, and the type mismatch is left alone.
    assert!(dst.path().join("orphan.txt").exists());
    assert!(dst.path().join("nested/old.txt").exists());
    assert!(dst.path().join("swap").is_dir());
}

#[test]
fn mirror_makes_target_match_source() {
    let (src, dst) = setup();
    let report = sync()
        .source(src.path())
        .target(dst.path())
        .mirror(true)
        .only_copy_if_newer(false)
        .reporter(SilentReporter)
        .run()
        .unwrap();

    assert!(report.is_clean(), "failures: {:?}", report.failures);
    assert_eq!(snapshot(dst.path()), snapshot(src.path()));
    assert_eq!(read(&dst.path().join("fresh.txt")), "source fresh");
    assert_eq!(read(&dst.path().join("swap")), "swap file");
}

#[test]
fn do_not_delete_protects_subtree() {
    let (src, dst) = setup();
    let keep = format!("{}/keep", dst.path().display());

    let report = sync()
        .source(src.path())
        .target(dst.path())
        .mirror(true)
        .do_not_delete([keep])
        .reporter(SilentReporter)
        .run()
        .unwrap();

    assert!(report.is_clean());
    assert!(dst.path().join("keep/note.txt").exists());
    assert!(!dst.path().join("orphan.txt").exists());
}

#[test]
fn do_not_copy_excludes_files_and_subtrees() {
    let (src, dst) = setup();
    let report = sync()
        .source(src.path())
        .target(dst.path())
        .do_not_copy(["**/new.txt", "**/deep"])
        .reporter(SilentReporter)
        .run()
        .unwrap();

    assert!(report.is_clean());
    assert!(!dst.path().join("new.txt").exists());
    assert!(!dst.path().join("nested/deep").exists());
    assert!(dst.path().join("nested/inner.txt").exists());
}

#[test]
fn preview_changes_nothing_and_traces_like_a_real_run() {
    let (src, dst) = setup();
    let before = snapshot(dst.path());

    let preview = Recorder::default();
    let report = sync()
        .source(src.path())
        .target(dst.path())
        .mirror(true)
        .preview(true)
        .reporter(preview.clone())
        .run()
        .unwrap();

    assert!(report.is_clean());
    assert_eq!(snapshot(dst.path()), before, "preview must not touch the target");

    let real = Recorder::default();
    sync()
        .source(src.path())
        .target(dst.path())
        .mirror(true)
        .reporter(real.clone())
        .run()
        .unwrap();

    // `nested/deep` does not exist in the target yet, so the preview reports
    // creating it but cannot list what would land inside.
    let leaf = format!("new-file {}", dst.path().join("nested").join("deep").join("leaf.txt").display());
    let expected: Vec<String> = real.lines().into_iter().filter(|l| *l != leaf).collect();

    assert_eq!(real.lines().len(), expected.len() + 1);
    assert_eq!(preview.lines(), expected);
}

#[test]
fn preview_stops_at_directories_it_would_create() {
    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    write(&src.path().join("a/b/c.txt"), "c");

    let trace = Recorder::default();
    let report = sync()
        .source(src.path())
        .target(dst.path())
        .preview(true)
        .reporter(trace.clone())
        .run()
        .unwrap();

    let d = dst.path();
    assert_eq!(trace.lines(), vec![format!("new-dir {}", d.join("a").display())]);
    assert_eq!(report.stats.planned, 1);
    assert_eq!(report.stats.applied, 1);
    assert_eq!(report.stats.directories, 2);
    assert!(snapshot(d).is_empty());
}

#[test]
fn deletes_are_traced_before_creations() {
    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    write(&src.path().join("x"), "file");
    write(&dst.path().join("x/inside.txt"), "dir");

    let trace = Recorder::default();
    sync()
        .source(src.path())
        .target(dst.path())
        .mirror(true)
        .reporter(trace.clone())
        .run()
        .unwrap();

    let x = dst.path().join("x");
    assert_eq!(
        trace.lines(),
        vec![format!("delete-dir {}", x.display()), format!("new-file {}", x.display())]
    );
    assert_eq!(read(&x), "file");
}

/// Lists the real filesystem but also reports a source file that does not exist.
struct PhantomSource {
    phantom_in: PathBuf,
}

impl Source for PhantomSource {
    fn list(&self, dir: &Path) -> Result<Vec<Entry>, SyncError> {
        let mut entries = FsSource.list(dir)?;
        if dir == self.phantom_in {
            entries.insert(0, Entry {
                name:     "ghost.txt".into(),
                path:     dir.join("ghost.txt"),
                kind:     EntryKind::File,
                modified: SystemTime::now(),
            });
        }
        Ok(entries)
    }
}

#[test]
fn failed_instruction_is_recorded_and_run_continues() {
    let (src, dst) = setup();
    let report = sync()
        .source(src.path())
        .target(dst.path())
        .lister(PhantomSource { phantom_in: src.path().to_path_buf() })
        .reporter(SilentReporter)
        .run()
        .unwrap();

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.stats.failed, 1);
    let failure = &report.failures[0];
    assert_eq!(failure.instruction, Instruction::new(Action::NewFile, "ghost.txt"));
    assert_eq!(failure.path, dst.path().join("ghost.txt"));
    assert!(failure.error.is_recoverable());

    // Later instructions and deeper levels still ran.
    assert!(dst.path().join("new.txt").exists());
    assert!(dst.path().join("nested/deep/leaf.txt").exists());
}

/// Fails to list one specific directory.
struct Unreadable(PathBuf);

impl Source for Unreadable {
    fn list(&self, dir: &Path) -> Result<Vec<Entry>, SyncError> {
        if dir == self.0 {
            return Err(SyncError::PermissionDenied(dir.to_path_buf()));
        }
        FsSource.list(dir)
    }
}

#[test]
fn listing_failure_is_fatal_outside_preview() {
    let (src, dst) = setup();
    let err = sync()
        .source(src.path())
        .target(dst.path())
        .lister(Unreadable(src.path().join("nested")))
        .reporter(SilentReporter)
        .run()
        .unwrap_err();

    assert!(matches!(err, SyncError::PermissionDenied(ref p) if p.ends_with("nested")));
}

#[test]
fn listing_failure_degrades_to_empty_in_preview() {
    let (src, dst) = setup();
    let trace = Recorder::default();
    let report = sync()
        .source(src.path())
        .target(dst.path())
        .mirror(true)
        .preview(true)
        .lister(Unreadable(src.path().join("nested")))
        .reporter(trace.clone())
        .run()
        .unwrap();

    assert!(report.is_clean());

    // An unreadable source level plans nothing: no deletes of the target's
    // `nested/old.txt`, no creates of `nested/inner.txt` or `nested/deep`.
    let nested = dst.path().join("nested");
    let lines = trace.lines();
    assert!(!lines.is_empty(), "root level is still previewed");
    assert!(
        lines.iter().all(|l| !l.contains(&*nested.join("").to_string_lossy())),
        "unexpected nested instruction in {lines:?}"
    );
}

#[test]
fn missing_root_is_rejected_up_front() {
    let src = tempfile::tempdir().unwrap();
    let err = sync()
        .source(src.path())
        .target(src.path().join("does-not-exist"))
        .reporter(SilentReporter)
        .run()
        .unwrap_err();

    assert!(matches!(err, SyncError::NotFound(_)));
    assert!(err.path().is_some());
}

#[test]
fn file_root_is_rejected_up_front() {
    let src = tempfile::tempdir().unwrap();
    let file = src.path().join("plain.txt");
    write(&file, "x");

    let err = sync()
        .source(&file)
        .target(src.path())
        .reporter(SilentReporter)
        .run()
        .unwrap_err();

    assert!(matches!(err, SyncError::NotADirectory(_)));
}

#[test]
fn invalid_pattern_is_rejected_up_front() {
    let (src, dst) = setup();
    let err = sync()
        .source(src.path())
        .target(dst.path())
        .do_not_copy(["["])
        .reporter(SilentReporter)
        .run()
        .unwrap_err();

    assert!(matches!(err, SyncError::InvalidPattern { .. }));
    assert!(!err.is_recoverable());
}

#[test]
fn fs_source_lists_one_level_sorted() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("b.txt"), "b");
    write(&dir.path().join("a/nested.txt"), "n");

    let entries = FsSource.list(dir.path()).unwrap();
    let names: Vec<_> = entries.iter().map(|e| (e.name.to_str().unwrap(), e.kind)).collect();

    assert_eq!(names, vec![("a", EntryKind::Dir), ("b.txt", EntryKind::File)]);
    assert_eq!(entries[1].path, dir.path().join("b.txt"));
}

#[test]
fn fs_source_rejects_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let err = FsSource.list(&dir.path().join("nope")).unwrap_err();
    assert!(matches!(err, SyncError::NotFound(_)));
}

#[test]
fn second_run_is_a_no_op() {
    let (src, dst) = setup();
    let run = || {
        sync()
            .source(src.path())
            .target(dst.path())
            .mirror(true)
            .reporter(SilentReporter)
            .run()
            .unwrap()
    };

    run();
    let again = run();
    assert_eq!(again.stats.planned, 0);
}

/// Lists the real filesystem but leaves out one path.
struct Hiding(PathBuf);

impl Source for Hiding {
    fn list(&self, dir: &Path) -> Result<Vec<Entry>, SyncError> {
        let mut entries = FsSource.list(dir)?;
        entries.retain(|e| e.path != self.0);
        Ok(entries)
    }
}

#[test]
fn new_file_never_overwrites_an_existing_target() {
    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    write(&src.path().join("clash.txt"), "source");
    write(&src.path().join("other.txt"), "other");
    write(&dst.path().join("clash.txt"), "target");

    // The planner does not see the target file, so it plans a create.
    let report = sync()
        .source(src.path())
        .target(dst.path())
        .lister(Hiding(dst.path().join("clash.txt")))
        .reporter(SilentReporter)
        .run()
        .unwrap();

    assert_eq!(report.failures.len(), 1);
    let failure = &report.failures[0];
    assert_eq!(failure.instruction, Instruction::new(Action::NewFile, "clash.txt"));
    assert!(matches!(failure.error, SyncError::Io { ref source, .. } if source.kind() == std::io::ErrorKind::AlreadyExists));

    assert_eq!(read(&dst.path().join("clash.txt")), "target");
    assert_eq!(read(&dst.path().join("other.txt")), "other");
}

/// Reports one source directory as a plain file.
#[cfg(target_os = "linux")]
struct DirAsFile(PathBuf);

#[cfg(target_os = "linux")]
impl Source for DirAsFile {
    fn list(&self, dir: &Path) -> Result<Vec<Entry>, SyncError> {
        let mut entries = FsSource.list(dir)?;
        for e in entries.iter_mut().filter(|e| e.path == self.0) {
            e.kind = EntryKind::File;
        }
        Ok(entries)
    }
}

#[cfg(target_os = "linux")]
#[test]
fn failed_new_file_leaves_no_partial_copy() {
    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    write(&src.path().join("folder/inside.txt"), "x");

    // Opening a directory succeeds on Linux but reading it does not, so the
    // copy fails after the target file was created.
    let report = sync()
        .source(src.path())
        .target(dst.path())
        .lister(DirAsFile(src.path().join("folder")))
        .reporter(SilentReporter)
        .run()
        .unwrap();

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].instruction, Instruction::new(Action::NewFile, "folder"));
    assert!(!dst.path().join("folder").exists(), "partial copy left behind");
}

#[cfg(target_os = "linux")]
#[test]
fn non_utf8_names_are_copied_verbatim() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    let latin1 = OsStr::from_bytes(b"caf\xe9");
    let other = OsStr::from_bytes(b"caf\xe8");

    write(&src.path().join(latin1).join("x.txt"), "x");
    write(&src.path().join(other), "y");
    write(&src.path().join("ok.txt"), "ok");

    let report = sync()
        .source(src.path())
        .target(dst.path())
        .reporter(SilentReporter)
        .run()
        .unwrap();

    assert!(report.is_clean(), "failures: {:?}", report.failures);
    assert_eq!(read(&dst.path().join(latin1).join("x.txt")), "x");
    assert_eq!(read(&dst.path().join(other)), "y");
    assert_eq!(read(&dst.path().join("ok.txt")), "ok");
    assert_eq!(fs::read_dir(dst.path()).unwrap().count(), 3);
}
