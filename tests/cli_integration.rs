//! Integration tests for the `vesper` CLI.
//!
//! Each test creates a temp project directory and a temp settings home,
//! runs `vesper` as a subprocess, and verifies stdout and/or file contents.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use pretty_assertions::assert_eq;
use serde_json::Value;
use tempfile::TempDir;

struct Env {
    home: TempDir,
    project: TempDir,
}

impl Env {
    fn new() -> Self {
        Env {
            home: TempDir::new().unwrap(),
            project: TempDir::new().unwrap(),
        }
    }

    fn root(&self) -> &Path {
        self.project.path()
    }

    /// Run vesper against the project and return the raw output.
    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_vesper"))
            .arg("-C")
            .arg(self.root())
            .args(args)
            .env("VESPER_HOME", self.home.path())
            .output()
            .expect("failed to run vesper")
    }

    /// Run and assert success; returns stdout.
    fn ok(&self, args: &[&str]) -> String {
        let out = self.run(args);
        assert!(
            out.status.success(),
            "vesper {:?} failed: {}",
            args,
            String::from_utf8_lossy(&out.stderr)
        );
        String::from_utf8(out.stdout).unwrap()
    }

    /// Run and assert failure; returns stderr.
    fn err(&self, args: &[&str]) -> String {
        let out = self.run(args);
        assert_eq!(out.status.code(), Some(1), "vesper {:?} should fail", args);
        String::from_utf8(out.stderr).unwrap()
    }

    fn json(&self, args: &[&str]) -> Value {
        let mut full = vec!["--json"];
        full.extend_from_slice(args);
        serde_json::from_str(&self.ok(&full)).unwrap()
    }

    fn initialized() -> Self {
        let env = Env::new();
        env.ok(&["init"]);
        env
    }

    /// Ids of the top-level beats, in order
    fn beat_ids(&self) -> Vec<String> {
        self.json(&["tree"])
            .as_array()
            .unwrap()
            .iter()
            .map(|b| b["id"].as_str().unwrap().to_string())
            .collect()
    }
}

fn titles(rows: &Value) -> Vec<String> {
    rows.as_array()
        .unwrap()
        .iter()
        .map(|r| r["title"].as_str().unwrap().to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// init
// ---------------------------------------------------------------------------

#[test]
fn init_seeds_three_beats() {
    let env = Env::new();
    let out = env.ok(&["init"]);
    assert!(out.contains("Initialized outline in"));
    assert!(env.root().join("outline.json").exists());

    let tree = env.json(&["tree"]);
    assert_eq!(titles(&tree), vec!["Beginning", "Middle", "End"]);
    assert!(
        tree.as_array()
            .unwrap()
            .iter()
            .all(|b| b["kind"] == "beat")
    );
}

#[test]
fn init_refuses_to_overwrite_without_force() {
    let env = Env::initialized();
    let id = env.beat_ids()[0].clone();
    env.ok(&["rename", &id, "Opening"]);

    let stderr = env.err(&["init"]);
    assert!(stderr.starts_with("error: outline already exists"));
    assert_eq!(titles(&env.json(&["tree"]))[0], "Opening");

    env.ok(&["init", "--force"]);
    assert_eq!(titles(&env.json(&["tree"]))[0], "Beginning");
}

#[test]
fn init_creates_missing_directory() {
    let env = Env::new();
    let nested = env.root().join("novel");
    let out = Command::new(env!("CARGO_BIN_EXE_vesper"))
        .arg("-C")
        .arg(&nested)
        .arg("init")
        .env("VESPER_HOME", env.home.path())
        .output()
        .unwrap();
    assert!(out.status.success());
    assert!(nested.join("outline.json").exists());
}

#[test]
fn init_remembers_project() {
    let env = Env::initialized();
    let settings = fs::read_to_string(env.home.path().join("settings.json")).unwrap();
    let settings: Value = serde_json::from_str(&settings).unwrap();
    let remembered = settings["last_project"].as_str().unwrap();
    assert_eq!(
        Path::new(remembered),
        fs::canonicalize(env.root()).unwrap().as_path()
    );
}

// ---------------------------------------------------------------------------
// read commands
// ---------------------------------------------------------------------------

#[test]
fn commands_fail_without_outline() {
    let env = Env::new();
    let stderr = env.err(&["tree"]);
    assert!(stderr.contains("no outline in"));
    assert!(stderr.contains("vesper init"));
}

#[test]
fn tree_prints_ids_and_kinds() {
    let env = Env::initialized();
    let ids = env.beat_ids();
    let out = env.ok(&["tree"]);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], format!("[B] Beginning ({})", ids[0]));
}

#[test]
fn show_unknown_id_fails() {
    let env = Env::initialized();
    let stderr = env.err(&["show", "nope"]);
    assert!(stderr.contains("item not found: nope"));
}

// ---------------------------------------------------------------------------
// editing
// ---------------------------------------------------------------------------

#[test]
fn outdent_scenario_recomputes_kinds_and_board() {
    let env = Env::initialized();
    let beginning = env.beat_ids()[0].clone();

    let ch1 = env.ok(&["add", "Ch1", "--under", &beginning]).trim().to_string();
    let created = env.json(&["add", "M1", "--under", &ch1, "--plot", "p"]);
    assert_eq!(created["kind"], "milestone");
    let m1 = created["id"].as_str().unwrap().to_string();

    let shown = env.json(&["show", &m1]);
    assert_eq!(shown["notes"]["plot"], "p");
    assert_eq!(shown["depth"], 3);

    let moved = env.json(&["outdent", &ch1]);
    assert_eq!(moved["kind"], "beat");
    assert_eq!(moved["depth"], 1);
    assert_eq!(moved["children"][0]["kind"], "chapter");

    let tree = env.json(&["tree"]);
    assert_eq!(titles(&tree), vec!["Beginning", "Ch1", "Middle", "End"]);

    let rows = env.json(&["board"]);
    assert_eq!(
        titles(&rows),
        vec!["Beginning", "Ch1", "M1", "Middle", "End"]
    );
    assert_eq!(rows[2]["level"], "chapter");
    assert_eq!(rows[2]["plot"], "");
}

#[test]
fn notes_on_non_milestone_fail() {
    let env = Env::initialized();
    let beginning = env.beat_ids()[0].clone();
    let stderr = env.err(&["notes", &beginning, "--plot", "x"]);
    assert!(stderr.contains("only milestones have notes"));
}

#[test]
fn notes_merge_with_existing_fields() {
    let env = Env::initialized();
    let beginning = env.beat_ids()[0].clone();
    let ch = env.ok(&["add", "Arrival", "--under", &beginning]).trim().to_string();
    let m = env
        .ok(&["add", "Storm", "--under", &ch, "--plot", "wreck"])
        .trim()
        .to_string();

    env.ok(&["notes", &m, "--theme", "trust"]);
    let shown = env.json(&["show", &m]);
    assert_eq!(shown["notes"]["plot"], "wreck");
    assert_eq!(shown["notes"]["theme"], "trust");
}

#[test]
fn empty_title_is_rejected() {
    let env = Env::initialized();
    let stderr = env.err(&["add", "   "]);
    assert!(stderr.contains("title cannot be empty"));
    assert_eq!(env.beat_ids().len(), 3);
}

#[test]
fn structural_boundaries_report_errors() {
    let env = Env::initialized();
    let ids = env.beat_ids();

    assert!(env.err(&["indent", &ids[0]]).contains("nothing above to indent under"));
    assert!(env.err(&["outdent", &ids[0]]).contains("already at top level"));
    assert!(env.err(&["up", &ids[0]]).contains("cannot move any further"));
    assert!(env.err(&["down", &ids[2]]).contains("cannot move any further"));
}

#[test]
fn indent_then_move_keeps_ids() {
    let env = Env::initialized();
    let ids = env.beat_ids();

    env.ok(&["indent", &ids[1]]);
    let tree = env.json(&["tree"]);
    assert_eq!(tree[0]["children"][0]["id"], ids[1].as_str());
    assert_eq!(tree[0]["children"][0]["kind"], "chapter");

    env.ok(&["down", &ids[1]]);
    let tree = env.json(&["tree"]);
    // hopped to the start of the next beat
    assert_eq!(tree[1]["id"], ids[2].as_str());
    assert_eq!(tree[1]["children"][0]["id"], ids[1].as_str());
}

#[test]
fn add_sibling_appends_to_reference_parent() {
    let env = Env::initialized();
    let ids = env.beat_ids();
    let ch = env.ok(&["add", "Arrival", "--under", &ids[0]]).trim().to_string();
    env.ok(&["add", "Departure", "--sibling-of", &ch]);
    env.ok(&["add", "Turn", "--sibling-of", &ids[0]]);

    let tree = env.json(&["tree"]);
    assert_eq!(titles(&tree), vec!["Beginning", "Middle", "End", "Turn"]);
    assert_eq!(tree[0]["children"][1]["title"], "Departure");
    assert_eq!(tree[0]["children"][1]["kind"], "chapter");
}

// ---------------------------------------------------------------------------
// delete + recovery log
// ---------------------------------------------------------------------------

#[test]
fn delete_logs_subtree_to_recovery() {
    let env = Env::initialized();
    let beginning = env.beat_ids()[0].clone();
    env.ok(&["add", "Arrival", "--under", &beginning]);

    let out = env.ok(&["delete", &beginning]);
    assert!(out.contains("deleted (2 items)"));
    assert_eq!(titles(&env.json(&["tree"])), vec!["Middle", "End"]);

    let log = fs::read_to_string(env.root().join(".vesper/recovery.log")).unwrap();
    assert!(log.contains("Arrival"));

    let entries = env.json(&["recovery"]);
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["category"], "delete");
    assert_eq!(entries[0]["fields"]["Item"], beginning.as_str());
    assert!(entries[0]["body"].as_str().unwrap().contains("Arrival"));
}

#[test]
fn recovery_prune_all_empties_log() {
    let env = Env::initialized();
    let id = env.beat_ids()[2].clone();
    env.ok(&["delete", &id]);

    let out = env.ok(&["recovery", "prune", "--all"]);
    assert!(out.contains("removed 1 entry"));
    assert!(env.ok(&["recovery"]).contains("recovery log is empty"));
}

#[test]
fn recovery_path_points_into_project() {
    let env = Env::initialized();
    let out = env.ok(&["recovery", "path"]);
    assert!(out.trim().ends_with(".vesper/recovery.log"));
}
