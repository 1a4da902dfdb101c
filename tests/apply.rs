//! Diff text through the plan compiler and into `apply`.

mod common;

use std::io::Cursor;

use common::*;
use glock::apply::{ApplySummary, apply};
use glock::plan::compile_stream;
use glock::{GlockError, LockFile, StatusStyle};

const PULL_LOG: &str = "\
25b4da1 bump deps
diff --git a/GLOCKFILE b/GLOCKFILE
index 82ef4f5..efc84fa 100644
--- a/GLOCKFILE
+++ b/GLOCKFILE
@@ -1,0 +1,1 @@
+cmd tools.org/cmd/gen
@@ -3 +4 @@
-github.com/x/up 2222aaaa
+github.com/x/up 3333bbbb
@@ -5 +6 @@
+github.com/x/new 4444cccc
-github.com/x/old 5555dddd
";

fn remote_backend() -> FakeBackend {
    FakeBackend::new()
        .with_local("github.com/x/up", "2222aaaa")
        .with_local("github.com/x/old", "5555dddd")
        .with_remote("github.com/x/new", "0000ffff")
}

#[test]
fn pull_log_moves_every_pin() {
    let backend = remote_backend();
    let toolchain = FakeToolchain::default();
    let plan = compile_stream(Cursor::new(PULL_LOG)).unwrap();

    let mut out = Vec::new();
    let summary = apply(&plan, &backend, &toolchain, StatusStyle::plain(), &mut out).unwrap();

    assert_eq!(
        summary,
        ApplySummary {
            updated: 2,
            removed: 1,
            commands_built: 0,
        }
    );
    let expected = format!(
        "{}{}github.com/x/old is no longer in use.\ncmd {:<59.58}\t[OK]\n",
        status_line("github.com/x/up", "3333bbbb", "checkout OK"),
        status_line("github.com/x/new", "4444cccc", "get OK"),
        "tools.org/cmd/gen",
    );
    assert_eq!(String::from_utf8(out).unwrap(), expected);
    assert_eq!(backend.head_of("github.com/x/up").as_deref(), Some("3333bbbb"));
    assert_eq!(backend.head_of("github.com/x/new").as_deref(), Some("4444cccc"));
    // Removal only reports; the repository is left alone.
    assert_eq!(backend.head_of("github.com/x/old").as_deref(), Some("5555dddd"));
    assert_eq!(*toolchain.installs.lock().unwrap(), vec!["tools.org/cmd/gen"]);
}

#[test]
fn failures_are_reported_and_the_rest_still_applied() {
    let backend = FakeBackend::new().with_local("github.com/x/up", "2222aaaa");
    let toolchain = FakeToolchain {
        failing: ["tools.org/cmd/gen".to_owned()].into(),
        ..FakeToolchain::default()
    };
    let plan = compile_stream(Cursor::new(PULL_LOG)).unwrap();

    let mut out = Vec::new();
    let err = apply(&plan, &backend, &toolchain, StatusStyle::plain(), &mut out).unwrap_err();

    // The new repository has no remote and the command fails to build.
    assert!(matches!(err, GlockError::ApplyIncomplete { failed: 2 }));
    let out = String::from_utf8(out).unwrap();
    assert_eq!(out.matches("[error]").count(), 2);
    assert!(out.contains("github.com/x/old is no longer in use."));
    assert_eq!(backend.head_of("github.com/x/up").as_deref(), Some("3333bbbb"));
}

#[test]
fn applying_a_lock_diff_converges_to_the_new_pins() {
    let old = lock(
        &[
            ("github.com/x/a", "aaaa0001"),
            ("github.com/x/b", "bbbb0001"),
            ("github.com/x/gone", "dddd0001"),
        ],
        &[],
    );
    let new = lock(
        &[
            ("github.com/x/a", "aaaa0002"),
            ("github.com/x/b", "bbbb0001"),
            ("github.com/x/c", "cccc0001"),
        ],
        &["tools.org/cmd/gen"],
    );
    let mut backend = FakeBackend::new();
    for entry in &old.entries {
        backend = backend.with_local(&entry.import_path, entry.revision.as_str());
    }
    backend = backend.with_remote("github.com/x/c", "cccc0000");

    let diff = LockFile::diff(&old, &new).join("\n");
    let plan = compile_stream(Cursor::new(diff)).unwrap();
    apply(
        &plan,
        &backend,
        &FakeToolchain::default(),
        StatusStyle::plain(),
        &mut Vec::new(),
    )
    .unwrap();

    for (path, rev) in new.pins() {
        assert_eq!(backend.head_of(path).as_deref(), Some(rev.as_str()), "{path}");
    }

    // Nothing left to do once converged.
    let again = LockFile::diff(&new, &new).join("\n");
    assert!(compile_stream(Cursor::new(again)).unwrap().is_empty());
}

#[test]
fn colored_output_wraps_verdicts() {
    let backend = remote_backend();
    let plan = compile_stream(Cursor::new("+github.com/x/new 4444cccc\n")).unwrap();

    let mut out = Vec::new();
    apply(
        &plan,
        &backend,
        &FakeToolchain::default(),
        StatusStyle::colored(),
        &mut out,
    )
    .unwrap();

    let out = String::from_utf8(out).unwrap();
    assert!(out.contains(&format!("[{}]", StatusStyle::colored().info("get OK"))));
}
