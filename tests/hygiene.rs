//! Workspace hygiene, checked at test time.
//!
//! Scans the production sources of every crate in this repo (host, frames,
//! scene, client) for patterns that break project rules. Test files and
//! `test_support.rs` are skipped. Budgets only go down.
//!
//! RULES
//! =====
//! - No panic paths outside tests. Server frames and window traffic are
//!   untrusted input for both the host and the page.
//! - The scene crate has no side effects of its own. It does not log or
//!   print, and it never reaches frames or the session. Everything it wants
//!   done leaves as an `Action`.
//! - The host logs through `tracing`, the browser crates through `log`.
#![allow(clippy::absurd_extreme_comparisons)]

use std::fs;
use std::path::{Path, PathBuf};

const HOST: &str = "src";
const FRAMES: &str = "frames/src";
const SCENE: &str = "scene/src";
const CLIENT: &str = "client/src";
const ALL: [&str; 4] = [HOST, FRAMES, SCENE, CLIENT];

// `.ok()` conversions in use today: env parsing, DOM getters, reply decoding.
const MAX_DOT_OK_HOST: usize = 4;
const MAX_DOT_OK_CLIENT: usize = 6;

struct SourceFile {
    path: String,
    content: String,
}

fn root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

fn production_files(crates: &[&str]) -> Vec<SourceFile> {
    let mut files = Vec::new();
    for src in crates {
        collect(&root().join(src), &mut files);
    }
    assert!(!files.is_empty(), "no sources found under {crates:?}");
    files
}

fn collect(dir: &Path, out: &mut Vec<SourceFile>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect(&path, out);
            continue;
        }
        let name = path.file_name().unwrap_or_default().to_string_lossy();
        let is_test = name.ends_with("_test.rs") || name == "test_support.rs";
        if is_test || path.extension().is_none_or(|e| e != "rs") {
            continue;
        }
        if let Ok(content) = fs::read_to_string(&path) {
            let path = path.strip_prefix(root()).unwrap_or(&path).display().to_string();
            out.push(SourceFile { path, content });
        }
    }
}

/// Lines containing `pattern`, as `path:line` locations.
fn hits(files: &[SourceFile], pattern: &str) -> Vec<String> {
    files
        .iter()
        .flat_map(|file| {
            file.content
                .lines()
                .enumerate()
                .filter(|(_, line)| line.contains(pattern))
                .map(|(n, _)| format!("{}:{}", file.path, n + 1))
        })
        .collect()
}

fn assert_budget(files: &[SourceFile], pattern: &str, max: usize) {
    let found = hits(files, pattern);
    assert!(
        found.len() <= max,
        "`{pattern}` budget exceeded: found {}, max {max}.\n  {}",
        found.len(),
        found.join("\n  ")
    );
}

// =============================================================================
// PANIC PATHS
// =============================================================================

#[test]
fn no_panic_paths_in_production_code() {
    let files = production_files(&ALL);
    for pattern in [".unwrap()", ".expect(", "panic!(", "unreachable!(", "todo!(", "unimplemented!("] {
        assert_budget(&files, pattern, 0);
    }
}

#[test]
fn dot_ok_discards_stay_within_budget() {
    assert_budget(&production_files(&[HOST]), ".ok()", MAX_DOT_OK_HOST);
    assert_budget(&production_files(&[CLIENT]), ".ok()", MAX_DOT_OK_CLIENT);
    assert_budget(&production_files(&[FRAMES, SCENE]), ".ok()", 0);
}

#[test]
fn no_silent_discards() {
    assert_budget(&production_files(&ALL), "let _ =", 0);
}

// =============================================================================
// SCENE SIDE EFFECTS
// =============================================================================

#[test]
fn scene_reports_only_through_actions() {
    let files = production_files(&[SCENE]);
    for pattern in ["log::", "tracing::", "println!(", "eprintln!(", "console::", "frames::", "Storage"] {
        assert_budget(&files, pattern, 0);
    }
}

#[test]
fn scene_does_not_depend_on_transport_or_session_crates() {
    let manifest = fs::read_to_string(root().join("scene/Cargo.toml")).expect("scene manifest");
    for dependency in ["frames", "client", "log ", "tracing"] {
        assert!(!manifest.contains(dependency), "scene/Cargo.toml pulls in `{dependency}`");
    }
}

// =============================================================================
// LOGGING FACADES
// =============================================================================

#[test]
fn host_logs_through_tracing() {
    let files = production_files(&[HOST]);
    assert_budget(&files, "log::", 0);
    assert_budget(&files, "println!(", 0);
    assert_budget(&files, "eprintln!(", 0);
}

#[test]
fn browser_crates_log_through_log() {
    let files = production_files(&[CLIENT, FRAMES]);
    assert_budget(&files, "tracing", 0);
    assert_budget(&files, "println!(", 0);
}
