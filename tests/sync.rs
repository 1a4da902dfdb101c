//! Sync scheduler behavior against an in-memory backend.

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use common::*;
use glock::backend::RepoBackend;
use glock::sync::{SyncOptions, SyncSummary, sync};
use glock::{GlockError, StatusStyle};

fn run(
    backend: &Arc<FakeBackend>,
    toolchain: &FakeToolchain,
    lock: &glock::LockFile,
    max_concurrent: usize,
) -> (glock::Result<SyncSummary>, String) {
    let dyn_backend: Arc<dyn RepoBackend> = backend.clone();
    let mut out = Vec::new();
    let options = SyncOptions {
        max_concurrent,
        style: StatusStyle::plain(),
    };
    let result = sync(lock, &dyn_backend, toolchain, options, &mut out);
    (result, String::from_utf8(out).unwrap())
}

#[test]
fn matching_prefix_is_ok_without_checkout() {
    let backend = Arc::new(FakeBackend::new().with_local("github.com/x/y", "abc123def4567890ffff"));
    let lock = lock(&[("github.com/x/y", "abc123def456")], &[]);

    let (result, out) = run(&backend, &FakeToolchain::default(), &lock, 25);

    assert_eq!(
        result.unwrap(),
        SyncSummary {
            up_to_date: 1,
            ..SyncSummary::default()
        }
    );
    assert_eq!(out, status_line("github.com/x/y", "abc123def456", "OK"));
    assert_eq!(
        backend.calls(),
        vec![
            Call::Resolve("github.com/x/y".to_owned()),
            Call::Head("github.com/x/y".to_owned()),
        ]
    );
}

#[test]
fn mismatch_fetches_before_checkout() {
    let backend = Arc::new(FakeBackend::new().with_local("github.com/x/y", "111111111111aaaa"));
    let lock = lock(&[("github.com/x/y", "222222222222bbbb")], &[]);

    let (result, out) = run(&backend, &FakeToolchain::default(), &lock, 25);

    assert_eq!(result.unwrap().checked_out, 1);
    assert_eq!(
        out,
        status_line("github.com/x/y", "111111111111", "checkout 222222222222")
    );
    assert_eq!(
        backend.calls(),
        vec![
            Call::Resolve("github.com/x/y".to_owned()),
            Call::Head("github.com/x/y".to_owned()),
            Call::Fetch("github.com/x/y".to_owned()),
            Call::Checkout("github.com/x/y".to_owned(), "222222222222bbbb".to_owned()),
        ]
    );
    // The full revision is checked out, not the display prefix.
    assert_eq!(
        backend.head_of("github.com/x/y").as_deref(),
        Some("222222222222bbbb")
    );
}

#[test]
fn missing_repository_is_fetched_once() {
    let backend = Arc::new(
        FakeBackend::new().with_remote("github.com/new/dep", "deadbeefcafe0001"),
    );
    let lock = lock(&[("github.com/new/dep", "deadbeefcafe0001")], &[]);

    let (result, out) = run(&backend, &FakeToolchain::default(), &lock, 25);

    let summary = result.unwrap();
    assert_eq!(summary.fetched, 1);
    assert_eq!(summary.up_to_date, 1);
    assert_eq!(out, status_line("github.com/new/dep", "deadbeefcafe", "get OK"));
    let fetches = backend
        .calls()
        .iter()
        .filter(|c| matches!(c, Call::Fetch(_)))
        .count();
    assert_eq!(fetches, 1);
}

#[test]
fn missing_repository_at_other_revision_is_fetched_then_checked_out() {
    let backend = Arc::new(
        FakeBackend::new().with_remote("github.com/new/dep", "0000000000001111"),
    );
    let lock = lock(&[("github.com/new/dep", "ffffffffffff2222")], &[]);

    let (result, out) = run(&backend, &FakeToolchain::default(), &lock, 25);

    assert_eq!(
        result.unwrap(),
        SyncSummary {
            fetched: 1,
            checked_out: 1,
            ..SyncSummary::default()
        }
    );
    assert_eq!(
        out,
        status_line("github.com/new/dep", "000000000000", "get checkout ffffffffffff")
    );
    assert_eq!(
        backend.calls(),
        vec![
            Call::Resolve("github.com/new/dep".to_owned()),
            Call::Fetch("github.com/new/dep".to_owned()),
            Call::Resolve("github.com/new/dep".to_owned()),
            Call::Head("github.com/new/dep".to_owned()),
            Call::Checkout("github.com/new/dep".to_owned(), "ffffffffffff2222".to_owned()),
        ]
    );
}

#[test]
fn unknown_repository_is_fatal() {
    let backend = Arc::new(FakeBackend::new());
    let lock = lock(&[("github.com/gone/away", "abc")], &[]);
    let (result, out) = run(&backend, &FakeToolchain::default(), &lock, 25);
    assert!(matches!(result, Err(GlockError::RepoNotFound { .. })));
    assert_eq!(out, status_line("github.com/gone/away", "", "error"));
}

#[test]
fn output_follows_lock_order_not_completion_order() {
    let mut fake = FakeBackend::new();
    let names: Vec<String> = (0..6).map(|i| format!("github.com/x/r{i}")).collect();
    for (i, name) in names.iter().enumerate() {
        fake = fake.with_local(name, "aaaaaaaaaaaa");
        // Earlier entries take longer.
        fake.delays
            .insert(name.clone(), Duration::from_millis(10 * (6 - i as u64)));
    }
    let backend = Arc::new(fake);
    let pairs: Vec<(&str, &str)> = names.iter().map(|n| (n.as_str(), "aaaaaaaaaaaa")).collect();
    let lock = lock(&pairs, &[]);

    let (result, out) = run(&backend, &FakeToolchain::default(), &lock, 6);

    assert_eq!(result.unwrap().up_to_date, 6);
    let expected: String = names
        .iter()
        .map(|n| status_line(n, "aaaaaaaaaaaa", "OK"))
        .collect();
    assert_eq!(out, expected);
}

#[test]
fn admission_limit_bounds_concurrent_commands() {
    for limit in [1, 4] {
        let mut fake = FakeBackend::new();
        fake.default_delay = Duration::from_millis(5);
        let names: Vec<String> = (0..20).map(|i| format!("github.com/x/r{i}")).collect();
        for name in &names {
            fake = fake.with_local(name, "000000000000");
        }
        let backend = Arc::new(fake);
        // Every entry needs fetch + checkout, three commands each.
        let pairs: Vec<(&str, &str)> = names.iter().map(|n| (n.as_str(), "111111111111")).collect();
        let lock = lock(&pairs, &[]);

        let (result, _) = run(&backend, &FakeToolchain::default(), &lock, limit);

        assert_eq!(result.unwrap().checked_out, 20);
        let max = backend.max_active.load(Ordering::SeqCst);
        assert!(max >= 1 && max <= limit, "limit {limit}, observed {max}");
    }
}

#[test]
fn first_failure_is_reported_and_stops_output() {
    let mut fake = FakeBackend::new()
        .with_local("github.com/x/a", "aaaaaaaaaaaa")
        .with_local("github.com/x/b", "bbbbbbbbbbbb")
        .with_local("github.com/x/c", "cccccccccccc");
    fake.broken.insert("github.com/x/b".to_owned());
    let backend = Arc::new(fake);
    let lock = lock(
        &[
            ("github.com/x/a", "aaaaaaaaaaaa"),
            ("github.com/x/b", "bbbbbbbbbbbb"),
            ("github.com/x/c", "cccccccccccc"),
        ],
        &["tools.org/cmd/never"],
    );
    let toolchain = FakeToolchain::default();

    let (result, out) = run(&backend, &toolchain, &lock, 1);

    assert!(matches!(result, Err(GlockError::VcsCommandFailed { .. })));
    assert_eq!(
        out,
        format!(
            "{}{}",
            status_line("github.com/x/a", "aaaaaaaaaaaa", "OK"),
            status_line("github.com/x/b", "", "error"),
        )
    );
    assert!(toolchain.installs.lock().unwrap().is_empty());
}

#[test]
fn commands_run_after_dependencies_in_order() {
    let backend = Arc::new(FakeBackend::new().with_local("github.com/x/y", "aaaaaaaaaaaa"));
    let lock = lock(
        &[("github.com/x/y", "aaaaaaaaaaaa")],
        &["tools.org/cmd/b", "tools.org/cmd/a"],
    );
    let toolchain = FakeToolchain {
        built: ["tools.org/cmd/b".to_owned()].into(),
        ..FakeToolchain::default()
    };

    let (result, out) = run(&backend, &toolchain, &lock, 25);

    assert_eq!(result.unwrap().commands_built, 1);
    let expected = format!(
        "{}cmd {:<59.58}\t[OK]\ncmd {:<59.58}\t[built]\n",
        status_line("github.com/x/y", "aaaaaaaaaaaa", "OK"),
        "tools.org/cmd/a",
        "tools.org/cmd/b",
    );
    assert_eq!(out, expected);
}

#[test]
fn failing_command_is_fatal() {
    let backend = Arc::new(FakeBackend::new());
    let lock = lock(&[], &["tools.org/cmd/a", "tools.org/cmd/z"]);
    let toolchain = FakeToolchain {
        failing: ["tools.org/cmd/a".to_owned()].into(),
        ..FakeToolchain::default()
    };

    let (result, out) = run(&backend, &toolchain, &lock, 25);

    assert!(matches!(result, Err(GlockError::CommandBuildFailed { .. })));
    assert!(out.ends_with("[error]\n"));
    assert_eq!(*toolchain.installs.lock().unwrap(), vec!["tools.org/cmd/a"]);
}

#[test]
fn empty_lock_file_is_a_no_op() {
    let backend = Arc::new(FakeBackend::new());
    let (result, out) = run(&backend, &FakeToolchain::default(), &lock(&[], &[]), 25);
    assert_eq!(result.unwrap(), SyncSummary::default());
    assert!(out.is_empty());
}
