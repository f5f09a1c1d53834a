//! End-to-end tests for the `run` command.
//!
//! These tests invoke the actual CLI binary against a temporary workspace.
//! Every run passes `--skip-tasks` so no package manager is started.

mod common;
use common::prelude::*;

#[test]
fn test_run_plugin_writes_workspace() {
    let fixture = TestFixture::new().with_config(configs::PLUGIN);

    fixture
        .command()
        .arg("run")
        .arg("--skip-tasks")
        .assert()
        .success()
        .stdout(predicate::str::contains("CREATE workspace.json"))
        .stdout(predicate::str::contains("CREATE libs/my-plugin/package.json"))
        .stdout(predicate::str::contains("[SKIP] Skipped task: npm install"));

    fixture
        .child("libs/my-plugin/src/generators/my-plugin/generator.ts")
        .assert(predicate::path::exists());
    fixture
        .child("libs/my-plugin/src/executors/build/executor.ts")
        .assert(predicate::path::exists());

    let workspace = read_json(fixture.path(), "workspace.json");
    assert_eq!(workspace["projects"]["my-plugin"]["root"], "libs/my-plugin");
}

#[test]
fn test_run_mixed_formats() {
    let fixture = TestFixture::new().with_config(configs::PLUGIN_AND_EXECUTOR);

    fixture
        .command()
        .arg("run")
        .arg("--skip-tasks")
        .assert()
        .success();

    let executors = read_json(fixture.path(), "libs/my-plugin/executors.json");
    assert_eq!(
        executors["executors"]["echo"]["implementation"],
        "./src/executors/echo/executor"
    );
    fixture
        .child("libs/my-plugin/src/generators")
        .assert(predicate::path::missing());
}

#[test]
fn test_run_dry_run_writes_nothing() {
    let fixture = TestFixture::new().with_config(configs::PLUGIN);

    fixture
        .command()
        .arg("run")
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("CREATE libs/my-plugin/package.json"))
        .stdout(predicate::str::contains("Dry run: nothing was written"));

    fixture
        .child("workspace.json")
        .assert(predicate::path::missing());
    fixture.child("libs").assert(predicate::path::missing());
}

#[test]
fn test_run_formats_json_unless_skipped() {
    let fixture = TestFixture::new().with_config(configs::PLUGIN);
    fixture
        .command()
        .arg("run")
        .arg("--skip-tasks")
        .assert()
        .success();

    let workspace = std::fs::read_to_string(fixture.path().join("workspace.json")).unwrap();
    assert!(workspace.ends_with("}\n"));
    assert!(workspace.contains("\n  \"projects\""));
}

#[test]
fn test_run_failing_step_leaves_workspace_untouched() {
    let fixture = TestFixture::new()
        .with_config(configs::DUPLICATE_LIBRARY)
        .with_file("README.md", "# Workspace\n");

    fixture
        .command()
        .arg("run")
        .arg("--skip-tasks")
        .assert()
        .failure()
        .stderr(predicate::str::contains("in step: library"))
        .stderr(predicate::str::contains("Project already exists: shared"));

    fixture
        .child("workspace.json")
        .assert(predicate::path::missing());
    fixture.child("libs").assert(predicate::path::missing());
    fixture.child("README.md").assert("# Workspace\n");
}

#[test]
fn test_run_unknown_generator() {
    let fixture = TestFixture::new().with_config(configs::UNKNOWN_GENERATOR);

    fixture
        .command()
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Generator not found: plugn"));
}

#[test]
fn test_run_missing_config() {
    let fixture = TestFixture::new();

    fixture
        .command()
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invocation file not found"))
        .stderr(predicate::str::contains("hint: Create a .treegen.yaml file"));
}

#[test]
fn test_run_invalid_yaml() {
    let fixture = TestFixture::new().with_config(configs::INVALID_YAML);

    fixture
        .command()
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration parsing error"));
}

#[test]
fn test_run_config_from_env() {
    let fixture = TestFixture::new().with_file("steps/custom.yaml", configs::PLUGIN);

    fixture
        .command()
        .env("TREEGEN_CONFIG", fixture.path().join("steps/custom.yaml"))
        .arg("run")
        .arg("--skip-tasks")
        .assert()
        .success();

    fixture
        .child("libs/my-plugin/package.json")
        .assert(predicate::path::exists());
}

#[test]
fn test_run_with_root_flag() {
    let fixture = TestFixture::new().with_file("ws/.treegen.yaml", configs::PLUGIN);

    fixture
        .command()
        .arg("run")
        .arg("--root")
        .arg(fixture.path().join("ws"))
        .arg("--skip-tasks")
        .assert()
        .success();

    fixture
        .child("ws/libs/my-plugin/package.json")
        .assert(predicate::path::exists());
    fixture.child("libs").assert(predicate::path::missing());
}

#[test]
fn test_run_root_not_found() {
    let fixture = TestFixture::new();

    fixture
        .command()
        .arg("run")
        .arg("--root")
        .arg(fixture.path().join("missing"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Workspace directory not found"));
}
