//! Integration tests for the Stagecraft CLI
//!
//! These tests exercise the CLI commands end-to-end using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Helper to get a stagecraft command with a fixed author
fn stagecraft() -> Command {
    let mut cmd = Command::cargo_bin("stagecraft").unwrap();
    cmd.env("STAGECRAFT_AUTHOR", "Test Author");
    cmd.env_remove("STAGECRAFT_LOG");
    cmd
}

/// Helper to create a test project in a temp directory
fn setup_test_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    stagecraft().current_dir(tmp.path()).arg("init").assert().success();
    tmp
}

/// Field assignments for an event that passes every step
fn complete_event(title: &str) -> Vec<String> {
    vec![
        format!("title={}", title),
        "category=concert".to_string(),
        "start_date=2026-11-14".to_string(),
        "venue=Old Hall".to_string(),
        "city=Lyon".to_string(),
        r#"artists=["Quartet Nova"]"#.to_string(),
        r#"partners=[{"name":"Strings Society","role":"organizer"}]"#.to_string(),
        "confirmed=true".to_string(),
    ]
}

fn set_args(assignments: &[String]) -> Vec<String> {
    assignments
        .iter()
        .flat_map(|a| ["--set".to_string(), a.clone()])
        .collect()
}

/// Helper to publish an event headlessly and return its ID
fn create_test_event(tmp: &TempDir, assignments: &[String]) -> String {
    let output = stagecraft()
        .current_dir(tmp.path())
        .args(["event", "new", "--no-input", "--format", "id"])
        .args(set_args(assignments))
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "event new failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn event_file(tmp: &TempDir, id: &str) -> PathBuf {
    tmp.path().join("events").join(format!("{}.yaml", id))
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_help_displays() {
    stagecraft()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("multi-step wizards"))
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn test_version_displays() {
    stagecraft()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("stagecraft"));
}

#[test]
fn test_unknown_command_fails() {
    stagecraft()
        .arg("unknown-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

// ============================================================================
// Init Command Tests
// ============================================================================

#[test]
fn test_init_creates_project_structure() {
    let tmp = TempDir::new().unwrap();

    stagecraft()
        .current_dir(tmp.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized Stagecraft project"));

    assert!(tmp.path().join(".stagecraft/config.yaml").is_file());
    assert!(tmp.path().join(".stagecraft/wizards").is_dir());
    assert!(tmp.path().join("events").is_dir());
}

#[test]
fn test_init_reports_existing_project() {
    let tmp = setup_test_project();

    stagecraft()
        .current_dir(tmp.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn test_commands_outside_project_fail() {
    let tmp = TempDir::new().unwrap();

    stagecraft()
        .current_dir(tmp.path())
        .args(["event", "list"])
        .assert()
        .failure();
}

// ============================================================================
// Event Creation Tests
// ============================================================================

#[test]
fn test_event_new_publishes_record() {
    let tmp = setup_test_project();

    stagecraft()
        .current_dir(tmp.path())
        .args(["event", "new", "--no-input"])
        .args(set_args(&complete_event("Night of Strings")))
        .assert()
        .success()
        .stdout(predicate::str::contains("Created event EVT-"));

    let files: Vec<_> = fs::read_dir(tmp.path().join("events"))
        .unwrap()
        .filter_map(|e| e.ok())
        .collect();
    assert_eq!(files.len(), 1);

    let content = fs::read_to_string(files[0].path()).unwrap();
    assert!(content.contains("title: Night of Strings"));
    assert!(content.contains("status: published"));
    assert!(content.contains("author: Test Author"));
    assert!(!content.contains("confirmed"));
}

#[test]
fn test_event_new_missing_field_names_step() {
    let tmp = setup_test_project();

    let assignments: Vec<String> = complete_event("Night of Strings")
        .into_iter()
        .filter(|a| !a.starts_with("venue="))
        .collect();

    stagecraft()
        .current_dir(tmp.path())
        .args(["event", "new", "--no-input"])
        .args(set_args(&assignments))
        .assert()
        .failure()
        .stderr(predicate::str::contains("step 2 (Date & place) is incomplete"))
        .stderr(predicate::str::contains("venue"));

    assert_eq!(fs::read_dir(tmp.path().join("events")).unwrap().count(), 0);
}

#[test]
fn test_event_new_invalid_date_rejected() {
    let tmp = setup_test_project();

    let mut assignments = complete_event("Night of Strings");
    assignments.push("start_date=2026-02-30".to_string());

    stagecraft()
        .current_dir(tmp.path())
        .args(["event", "new", "--no-input"])
        .args(set_args(&assignments))
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a valid date"));
}

#[test]
fn test_paid_ticketing_requires_price_and_url() {
    let tmp = setup_test_project();

    let mut assignments = complete_event("Night of Strings");
    assignments.push("ticketing=paid".to_string());

    stagecraft()
        .current_dir(tmp.path())
        .args(["event", "new", "--no-input"])
        .args(set_args(&assignments))
        .assert()
        .failure()
        .stderr(predicate::str::contains("step 3 (Line-up & tickets) is incomplete"))
        .stderr(predicate::str::contains("ticket_url"))
        .stderr(predicate::str::contains("price"));

    assignments.push("ticket_url=https://tickets.example/strings".to_string());
    assignments.push("price=15".to_string());
    let id = create_test_event(&tmp, &assignments);

    let content = fs::read_to_string(event_file(&tmp, &id)).unwrap();
    assert!(content.contains("ticketing: paid"));
    assert!(content.contains("price: 15"));
}

#[test]
fn test_filled_optional_fields_are_validated() {
    let tmp = setup_test_project();

    let cases = [
        ("start_time=99:99", "step 2 (Date & place) is incomplete", "start_time"),
        ("end_date=tomorrow", "step 2 (Date & place) is incomplete", "end_date"),
        ("partners=bad:role", "step 3 (Line-up & tickets) is incomplete", "partners"),
    ];

    for (assignment, step, field) in cases {
        let mut assignments = complete_event("Night of Strings");
        assignments.push(assignment.to_string());

        stagecraft()
            .current_dir(tmp.path())
            .args(["event", "new", "--no-input"])
            .args(set_args(&assignments))
            .assert()
            .failure()
            .stderr(predicate::str::contains(step))
            .stderr(predicate::str::contains(field));
    }

    let mut long_summary = complete_event("Night of Strings");
    long_summary.push(format!("summary={}", "x".repeat(400)));
    stagecraft()
        .current_dir(tmp.path())
        .args(["event", "new", "--no-input"])
        .args(set_args(&long_summary))
        .assert()
        .failure()
        .stderr(predicate::str::contains("step 1 (Basics) is incomplete"));

    let events = fs::read_dir(tmp.path().join("events")).unwrap().count();
    assert_eq!(events, 0);
}

#[test]
fn test_published_event_with_optional_fields_passes_validate() {
    let tmp = setup_test_project();

    let mut assignments = complete_event("Night of Strings");
    assignments.extend([
        "summary=Four strings, one night".to_string(),
        "description=Late Beethoven quartets by candlelight.".to_string(),
        "end_date=2026-11-15".to_string(),
        "start_time=20:30".to_string(),
        "partners=Strings Society:organizer, Brewery:sponsor:https://brew.example".to_string(),
    ]);
    create_test_event(&tmp, &assignments);

    stagecraft()
        .current_dir(tmp.path())
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("All files passed validation"));
}

#[test]
fn test_set_keeps_numeric_looking_text() {
    let tmp = setup_test_project();

    let mut assignments = complete_event("1984");
    assignments.push("venue=1930".to_string());
    let id = create_test_event(&tmp, &assignments);

    let content = fs::read_to_string(event_file(&tmp, &id)).unwrap();
    assert!(content.contains("1984"));
    assert!(content.contains("1930"));
}

#[test]
fn test_editor_pick_requires_reasons() {
    let tmp = setup_test_project();

    let mut assignments = complete_event("Paper Worlds");
    assignments.push("highlight_type=editor_pick".to_string());

    stagecraft()
        .current_dir(tmp.path())
        .args(["event", "new", "--no-input"])
        .args(set_args(&assignments))
        .assert()
        .failure()
        .stderr(predicate::str::contains("selection_reasons"));

    assignments.push(r#"selection_reasons=["Rare print collection"]"#.to_string());
    let id = create_test_event(&tmp, &assignments);
    let content = fs::read_to_string(event_file(&tmp, &id)).unwrap();
    assert!(content.contains("Rare print collection"));
}

#[test]
fn test_event_new_from_data_file() {
    let tmp = setup_test_project();
    let data = tmp.path().join("gala.yaml");
    fs::write(
        &data,
        r#"title: Winter Gala
category: theatre
start_date: 2026-12-20
venue: Grand Theatre
artists: [Company Lune]
confirmed: true
"#,
    )
    .unwrap();

    stagecraft()
        .current_dir(tmp.path())
        .args(["event", "new", "--no-input", "--data"])
        .arg(&data)
        .args(["--set", "venue=Small Theatre"])
        .assert()
        .success();

    stagecraft()
        .current_dir(tmp.path())
        .args(["event", "list", "--format", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Winter Gala"))
        .stdout(predicate::str::contains("Small Theatre"));
}

// ============================================================================
// Event Browsing Tests
// ============================================================================

#[test]
fn test_event_list_and_filters() {
    let tmp = setup_test_project();
    create_test_event(&tmp, &complete_event("Night of Strings"));
    let mut expo = complete_event("Paper Worlds");
    expo.push("category=exhibition".to_string());
    expo.push(r#"artists=["Studio Ink"]"#.to_string());
    create_test_event(&tmp, &expo);

    stagecraft()
        .current_dir(tmp.path())
        .args(["event", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Night of Strings"))
        .stdout(predicate::str::contains("Paper Worlds"))
        .stdout(predicate::str::contains("2 event(s) found"));

    stagecraft()
        .current_dir(tmp.path())
        .args(["event", "list", "--category", "exhibition", "--count"])
        .assert()
        .success()
        .stdout("1\n");

    stagecraft()
        .current_dir(tmp.path())
        .args(["event", "list", "--search", "ink", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"title\": \"Paper Worlds\""))
        .stdout(predicate::str::contains("Night of Strings").not());
}

#[test]
fn test_event_show_by_partial_id() {
    let tmp = setup_test_project();
    let id = create_test_event(&tmp, &complete_event("Night of Strings"));
    let partial = &id[..12];

    stagecraft()
        .current_dir(tmp.path())
        .args(["event", "show", partial])
        .assert()
        .success()
        .stdout(predicate::str::contains("Night of Strings"))
        .stdout(predicate::str::contains("Old Hall, Lyon"))
        .stdout(predicate::str::contains("Strings Society"));

    stagecraft()
        .current_dir(tmp.path())
        .args(["event", "show", &id, "--format", "yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("id: {}", id)));
}

#[test]
fn test_event_show_not_found() {
    let tmp = setup_test_project();

    stagecraft()
        .current_dir(tmp.path())
        .args(["event", "show", "EVT-NOPE"])
        .assert()
        .failure();
}

// ============================================================================
// Edit Tests
// ============================================================================

#[test]
fn test_event_edit_requires_new_confirmation() {
    let tmp = setup_test_project();
    let id = create_test_event(&tmp, &complete_event("Night of Strings"));

    stagecraft()
        .current_dir(tmp.path())
        .args(["event", "edit", &id, "--no-input", "--set", "venue=New Hall"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Review & publish"));

    stagecraft()
        .current_dir(tmp.path())
        .args([
            "event",
            "edit",
            &id,
            "--no-input",
            "--set",
            "venue=New Hall",
            "--set",
            "confirmed=true",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated event"));

    let content = fs::read_to_string(event_file(&tmp, &id)).unwrap();
    assert!(content.contains("venue: New Hall"));
    assert!(content.contains("updated:"));
    assert!(content.contains("author: Test Author"));
}

#[test]
fn test_event_edit_without_changes_warns() {
    let tmp = setup_test_project();
    let id = create_test_event(&tmp, &complete_event("Night of Strings"));

    stagecraft()
        .current_dir(tmp.path())
        .args(["event", "edit", &id, "--no-input", "--set", "confirmed=true"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No fields changed"));
}

// ============================================================================
// Wizard Command Tests
// ============================================================================

#[test]
fn test_wizard_steps_lists_builtin() {
    stagecraft()
        .args(["wizard", "steps"])
        .assert()
        .success()
        .stdout(predicate::str::contains("event"));

    stagecraft()
        .args(["wizard", "steps", "event"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Line-up & tickets"))
        .stdout(predicate::str::contains("ticket_url if ticketing"));
}

#[test]
fn test_wizard_check_reports_each_step() {
    let tmp = TempDir::new().unwrap();
    let form = tmp.path().join("form.yaml");
    fs::write(
        &form,
        "title: Night of Strings\nstart_date: 2026-11-14\nvenue: Old Hall\n",
    )
    .unwrap();

    stagecraft()
        .current_dir(tmp.path())
        .args(["wizard", "check"])
        .arg(&form)
        .assert()
        .failure()
        .stdout(predicate::str::contains("✓ 1. Basics"))
        .stdout(predicate::str::contains("✗ 3. Line-up & tickets"))
        .stderr(predicate::str::contains("2 of 5 step(s) incomplete"));

    fs::write(
        &form,
        "title: Night of Strings\nstart_date: 2026-11-14\nvenue: Old Hall\nartists: [Quartet Nova]\nconfirmed: true\n",
    )
    .unwrap();

    stagecraft()
        .current_dir(tmp.path())
        .args(["wizard", "check"])
        .arg(&form)
        .assert()
        .success()
        .stdout(predicate::str::contains("ready to publish"));
}

#[test]
fn test_project_wizard_overrides_builtin() {
    let tmp = setup_test_project();
    fs::write(
        tmp.path().join(".stagecraft/wizards/quick.yaml"),
        r#"name: quick
schema: event.form
steps:
  - id: all
    title: Everything
    fields: [title, category, start_date, venue, artists]
    required: [title, start_date, venue]
  - id: publish
    title: Publish
    required: [confirmed]
"#,
    )
    .unwrap();

    stagecraft()
        .current_dir(tmp.path())
        .args(["wizard", "steps"])
        .assert()
        .success()
        .stdout(predicate::str::contains("quick"));

    stagecraft()
        .current_dir(tmp.path())
        .args([
            "event",
            "new",
            "--no-input",
            "--wizard",
            "quick",
            "--set",
            "title=Late Show",
            "--set",
            "start_date=2026-10-31",
            "--set",
            "venue=Cellar",
            "--set",
            "confirmed=true",
        ])
        .assert()
        .success();
}

// ============================================================================
// Validate Tests
// ============================================================================

#[test]
fn test_validate_published_events() {
    let tmp = setup_test_project();
    create_test_event(&tmp, &complete_event("Night of Strings"));

    stagecraft()
        .current_dir(tmp.path())
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("All files passed validation"));
}

#[test]
fn test_validate_reports_broken_record() {
    let tmp = setup_test_project();
    let id = create_test_event(&tmp, &complete_event("Night of Strings"));
    let path = event_file(&tmp, &id);
    let content = fs::read_to_string(&path).unwrap();
    fs::write(&path, content.replace("category: concert", "category: rave")).unwrap();

    stagecraft()
        .current_dir(tmp.path())
        .arg("validate")
        .assert()
        .failure()
        .stdout(predicate::str::contains("1 error(s)"));
}

// ============================================================================
// Import Tests
// ============================================================================

#[test]
fn test_import_dry_run_creates_nothing() {
    let tmp = setup_test_project();
    let csv = tmp.path().join("events.csv");
    fs::write(
        &csv,
        "title,start_date,venue,artists,partners\n\
         Night of Strings,2026-11-14,Old Hall,Quartet Nova;Solo Cello,Strings Society:organizer\n\
         Paper Worlds,2026-12-01,Gallery 9,Studio Ink,\n",
    )
    .unwrap();

    stagecraft()
        .current_dir(tmp.path())
        .args(["import", "--dry-run"])
        .arg(&csv)
        .assert()
        .success()
        .stdout(predicate::str::contains("Would create"))
        .stdout(predicate::str::contains("Events created: 2"));

    assert_eq!(fs::read_dir(tmp.path().join("events")).unwrap().count(), 0);
}

#[test]
fn test_import_creates_events_and_skips_bad_rows() {
    let tmp = setup_test_project();
    let csv = tmp.path().join("events.csv");
    fs::write(
        &csv,
        "title,start_date,venue,artists,ticketing\n\
         Night of Strings,2026-11-14,Old Hall,Quartet Nova,free\n\
         Paid Without Price,2026-11-15,Old Hall,Solo,paid\n",
    )
    .unwrap();

    stagecraft()
        .current_dir(tmp.path())
        .args(["import", "--skip-errors"])
        .arg(&csv)
        .assert()
        .success()
        .stderr(predicate::str::contains("Row 3"));

    stagecraft()
        .current_dir(tmp.path())
        .args(["event", "list", "--count"])
        .assert()
        .success()
        .stdout("1\n");
}

#[test]
fn test_import_template_prints_headers() {
    let tmp = setup_test_project();

    stagecraft()
        .current_dir(tmp.path())
        .args(["import", "--template"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("title,category,"))
        .stdout(predicate::str::contains("confirmed").not());
}

// ============================================================================
// Schema & Completions Tests
// ============================================================================

#[test]
fn test_schema_lists_and_shows() {
    stagecraft()
        .arg("schema")
        .assert()
        .success()
        .stdout(predicate::str::contains("event.form"))
        .stdout(predicate::str::contains("event.record"));

    stagecraft()
        .args(["schema", "event.form"])
        .assert()
        .success()
        .stdout(predicate::str::contains("highlight_type"))
        .stdout(predicate::str::contains("editor_pick"));

    stagecraft()
        .args(["schema", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown schema"));
}

#[test]
fn test_completions_bash() {
    stagecraft()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("stagecraft"));
}
