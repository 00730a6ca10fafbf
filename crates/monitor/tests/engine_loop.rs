#![forbid(unsafe_code)]

use monitor::{
    InotifyWatcher, MonitorEngine, ObservationSink, ProcessObservation, ProcfsScanner,
    SeenRegistry,
};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread::sleep;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

#[derive(Clone, Default)]
struct SharedSink(Arc<Mutex<Vec<ProcessObservation>>>);

impl SharedSink {
    fn pids(&self) -> Vec<u32> {
        let mut pids: Vec<u32> = self.0.lock().unwrap().iter().map(|o| o.pid).collect();
        pids.sort_unstable();
        pids
    }
}

impl ObservationSink for SharedSink {
    fn emit(&mut self, observation: &ProcessObservation) -> std::io::Result<()> {
        self.0.lock().unwrap().push(observation.clone());
        Ok(())
    }
}

fn wait_until(deadline: Duration, mut check: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < deadline {
        if check() {
            return true;
        }
        sleep(Duration::from_millis(10));
    }
    check()
}

#[cfg(target_os = "linux")]
#[test]
fn timeout_fallback_scans_and_cancellation_is_prompt() {
    let proc_root = tempfile::tempdir().unwrap();
    std::fs::create_dir(proc_root.path().join("5")).unwrap();
    let watch_dir = tempfile::tempdir().unwrap();

    let scanner = ProcfsScanner::with_root(proc_root.path(), SeenRegistry::new(100), 125);
    // One unwatchable path: registration degrades with a warning and the
    // loop must still reach its wait and scan on timeout.
    let watcher =
        InotifyWatcher::register_all([watch_dir.path(), Path::new("/does/not/exist")]).unwrap();
    assert_eq!(watcher.registered_count(), 1);

    let sink = SharedSink::default();
    let mut engine = MonitorEngine::from_parts(
        Duration::from_millis(25),
        scanner,
        watcher,
        Box::new(sink.clone()),
    );

    let cancel = CancellationToken::new();
    let run_cancel = cancel.clone();
    let handle = std::thread::spawn(move || engine.run(&run_cancel));

    // The pre-existing process is reported by the startup pass.
    assert!(
        wait_until(Duration::from_secs(2), || sink.pids() == vec![5]),
        "startup scan never observed the pre-existing process: {:?}",
        sink.pids()
    );

    // A process appearing afterwards is picked up by a timeout scan; no
    // watch events are raised in this test.
    std::fs::create_dir(proc_root.path().join("42")).unwrap();
    assert!(
        wait_until(Duration::from_secs(2), || sink.pids() == vec![5, 42]),
        "timeout scans never observed the new process: {:?}",
        sink.pids()
    );

    cancel.cancel();
    assert!(
        wait_until(Duration::from_secs(2), || handle.is_finished()),
        "engine did not stop within one interval of cancellation"
    );
    handle.join().unwrap().unwrap();

    // No scans after cancellation: a process appearing now stays unseen.
    std::fs::create_dir(proc_root.path().join("77")).unwrap();
    sleep(Duration::from_millis(100));
    assert_eq!(sink.pids(), vec![5, 42]);
}

#[cfg(target_os = "linux")]
#[test]
fn startup_scan_reports_existing_processes_before_any_trigger() {
    let proc_root = tempfile::tempdir().unwrap();
    std::fs::create_dir(proc_root.path().join("5")).unwrap();
    let watch_dir = tempfile::tempdir().unwrap();

    let scanner = ProcfsScanner::with_root(proc_root.path(), SeenRegistry::new(100), 125);
    let watcher = InotifyWatcher::register_all([watch_dir.path()]).unwrap();

    let sink = SharedSink::default();
    // With this interval no timeout fires inside the test window, and no
    // watch events are raised: any report must come from the startup pass.
    let mut engine = MonitorEngine::from_parts(
        Duration::from_secs(30),
        scanner,
        watcher,
        Box::new(sink.clone()),
    );

    let cancel = CancellationToken::new();
    let run_cancel = cancel.clone();
    let handle = std::thread::spawn(move || engine.run(&run_cancel));

    assert!(
        wait_until(Duration::from_secs(2), || sink.pids() == vec![5]),
        "startup scan did not report the existing process: {:?}",
        sink.pids()
    );

    // A directory-open event wakes the long wait so cancellation is seen.
    cancel.cancel();
    let _ = std::fs::read_dir(watch_dir.path()).unwrap().count();
    assert!(wait_until(Duration::from_secs(2), || handle.is_finished()));
    handle.join().unwrap().unwrap();
}

#[cfg(target_os = "linux")]
#[test]
fn file_open_triggers_rescan_but_directory_events_do_not() {
    let proc_root = tempfile::tempdir().unwrap();
    let watch_dir = tempfile::tempdir().unwrap();
    let trigger_file = watch_dir.path().join("ld.so.cache");
    std::fs::write(&trigger_file, b"x").unwrap();

    let scanner = ProcfsScanner::with_root(proc_root.path(), SeenRegistry::new(100), 125);
    let watcher = InotifyWatcher::register_all([watch_dir.path()]).unwrap();

    let sink = SharedSink::default();
    // Interval long enough that any observation inside the test window
    // must come from the event path, not the timeout fallback.
    let mut engine = MonitorEngine::from_parts(
        Duration::from_secs(30),
        scanner,
        watcher,
        Box::new(sink.clone()),
    );

    let cancel = CancellationToken::new();
    let run_cancel = cancel.clone();
    let handle = std::thread::spawn(move || engine.run(&run_cancel));
    sleep(Duration::from_millis(100));

    // The process appears only after the startup pass, so reporting it
    // requires a rescan.
    std::fs::create_dir(proc_root.path().join("9")).unwrap();

    // Opening the watched directory itself raises a directory event,
    // which must not trigger a scan.
    let _ = std::fs::read_dir(watch_dir.path()).unwrap().count();
    sleep(Duration::from_millis(200));
    assert!(sink.pids().is_empty(), "directory event triggered a scan");

    // Opening a file under the watched directory is the trigger signal.
    let _ = std::fs::read(&trigger_file).unwrap();
    assert!(
        wait_until(Duration::from_secs(2), || sink.pids() == vec![9]),
        "file-open event did not trigger a rescan: {:?}",
        sink.pids()
    );

    // The loop only notices cancellation at an iteration boundary; a
    // final event wakes the long wait.
    cancel.cancel();
    let _ = std::fs::read(&trigger_file).unwrap();
    assert!(wait_until(Duration::from_secs(2), || handle.is_finished()));
    handle.join().unwrap().unwrap();
}
