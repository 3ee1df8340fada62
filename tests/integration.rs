use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tempfile::TempDir;

fn codemark_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("codemark");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let data_dir = root.join("data");
    fs::create_dir_all(&data_dir).unwrap();

    // One interview answer per line
    fs::write(
        data_dir.join("corpus.txt"),
        "The rota changes every week and nobody tells us.\n\
         \n\
         Pay is fine but   training was rushed.\n\
         I trust my manager <mostly> & the team.\n",
    )
    .unwrap();

    let config_content = format!(
        r#"[corpus]
path = "{root}/data/corpus.txt"
format = "lines"

[codebook]
path = "{root}/data/codebook.csv"

[render]
mark_class = "extract"
anchor_id = "latest-extract"
scroll_threshold = 600
"#,
        root = root.display()
    );

    let config_path = config_dir.join("codemark.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_codemark(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = codemark_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run codemark binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

fn codebook_path(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("data/codebook.csv")
}

#[test]
fn test_render_without_codebook() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_codemark(&config_path, &["render", "2"]);
    assert!(success, "render failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Document 2/3 (0 extracts)"));
    assert!(stdout.contains("Pay is fine but training was rushed."));
    assert!(!stdout.contains("<mark"));
}

#[test]
fn test_add_writes_codebook() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_codemark(
        &config_path,
        &["add", "training  was\nrushed", "--doc", "2", "--code", "Training"],
    );
    assert!(success, "add failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Added row 1"));

    let csv = fs::read_to_string(codebook_path(&config_path)).unwrap();
    let mut lines = csv.lines();
    assert_eq!(
        lines.next().unwrap(),
        "Theme,Code,Extract,Document_ID,Timestamp"
    );
    let row = lines.next().unwrap();
    assert!(row.starts_with(",Training,training was rushed,2,"), "row: {}", row);
}

#[test]
fn test_add_rejects_text_not_in_document() {
    let (_tmp, config_path) = setup_test_env();

    let (_, stderr, success) = run_codemark(&config_path, &["add", "salary", "--doc", "2"]);
    assert!(!success);
    assert!(stderr.contains("not found"));
    assert!(!codebook_path(&config_path).exists());
}

#[test]
fn test_render_highlights_and_escapes() {
    let (_tmp, config_path) = setup_test_env();

    run_codemark(&config_path, &["add", "my manager <mostly>", "--doc", "3"]);
    let (stdout, _, success) = run_codemark(&config_path, &["render", "3"]);
    assert!(success);
    assert!(stdout.contains(
        "I trust <mark class=\"extract\">my manager &lt;mostly&gt;</mark> &amp; the team."
    ));
}

#[test]
fn test_render_json() {
    let (_tmp, config_path) = setup_test_env();

    run_codemark(&config_path, &["add", "The rota", "--doc", "1"]);
    let (stdout, _, success) = run_codemark(&config_path, &["render", "1", "--json"]);
    assert!(success);
    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(value["index"], 1);
    assert_eq!(value["spans"][0]["start"], 0);
    assert_eq!(value["spans"][0]["end"], 8);
    assert_eq!(value["spans"][0]["is_latest"], true);
}

#[test]
fn test_render_out_of_range() {
    let (_tmp, config_path) = setup_test_env();

    let (_, stderr, success) = run_codemark(&config_path, &["render", "9"]);
    assert!(!success);
    assert!(stderr.contains("No document 9"));
}

#[test]
fn test_counter_rename_and_list() {
    let (_tmp, config_path) = setup_test_env();

    run_codemark(&config_path, &["add", "rota changes", "--doc", "1", "--code", "Sched"]);
    run_codemark(&config_path, &["add", "nobody tells us", "--doc", "1", "--code", "Comms"]);
    run_codemark(&config_path, &["add", "training", "--doc", "2", "--code", "Sched"]);

    let (stdout, _, success) = run_codemark(&config_path, &["rename", "Sched", "Workload"]);
    assert!(success);
    assert!(stdout.contains("Renamed 2 rows"));

    let (stdout, _, _) = run_codemark(&config_path, &["counter"]);
    let workload = stdout.lines().position(|l| l.contains("Workload")).unwrap();
    let comms = stdout.lines().position(|l| l.contains("Comms")).unwrap();
    assert!(workload < comms);

    let (stdout, _, _) = run_codemark(&config_path, &["list"]);
    assert!(stdout.contains("nobody tells us"));
    assert!(!stdout.contains("Sched "));
}

#[test]
fn test_delete_and_edit() {
    let (_tmp, config_path) = setup_test_env();

    run_codemark(&config_path, &["add", "rota", "--doc", "1"]);
    run_codemark(&config_path, &["add", "Pay is fine", "--doc", "2"]);

    let (_, stderr, success) = run_codemark(&config_path, &["edit", "2", "Document_ID", "7"]);
    assert!(!success, "out-of-corpus Document_ID accepted: {}", stderr);

    let (_, _, success) = run_codemark(&config_path, &["edit", "1", "Theme", "Work"]);
    assert!(success);

    let (stdout, _, success) = run_codemark(&config_path, &["delete", "2"]);
    assert!(success);
    assert!(stdout.contains("Deleted row 2: \"Pay is fine\""));

    let (_, stderr, success) = run_codemark(&config_path, &["delete", "5"]);
    assert!(!success);
    assert!(stderr.contains("No row 5"));

    let csv = fs::read_to_string(codebook_path(&config_path)).unwrap();
    assert_eq!(csv.lines().count(), 2);
    assert!(csv.lines().nth(1).unwrap().starts_with("Work,,rota,1,"));
}

#[test]
fn test_columns() {
    let (_tmp, config_path) = setup_test_env();

    run_codemark(&config_path, &["add", "rota", "--doc", "1"]);
    let (stdout, _, success) =
        run_codemark(&config_path, &["column", "add", "--default", "todo"]);
    assert!(success);
    assert!(stdout.contains("Added column Notes"));

    let csv = fs::read_to_string(codebook_path(&config_path)).unwrap();
    assert!(csv.starts_with("Theme,Code,Extract,Document_ID,Timestamp,Notes\n"));
    assert!(csv.lines().nth(1).unwrap().ends_with(",todo"));

    let (_, _, success) = run_codemark(&config_path, &["column", "remove", "Code"]);
    assert!(!success, "core column removed");

    let (_, _, success) = run_codemark(&config_path, &["column", "remove", "Notes"]);
    assert!(success);
    let csv = fs::read_to_string(codebook_path(&config_path)).unwrap();
    assert!(csv.starts_with("Theme,Code,Extract,Document_ID,Timestamp\n"));
}

#[test]
fn test_export_newest_first() {
    let (tmp, config_path) = setup_test_env();

    // Timestamps have one-second resolution; write the codebook directly.
    fs::write(
        codebook_path(&config_path),
        "Theme,Code,Extract,Document_ID,Timestamp\n\
         ,A,rota,1,2024-01-01 09:00:00\n\
         ,B,Pay,2,2024-03-01 09:00:00\n\
         ,A,team,3,2024-02-01 09:00:00\n",
    )
    .unwrap();

    let (stdout, _, success) = run_codemark(&config_path, &["export"]);
    assert!(success);
    let extracts: Vec<&str> = stdout
        .lines()
        .skip(1)
        .map(|l| l.split(',').nth(2).unwrap())
        .collect();
    assert_eq!(extracts, vec!["Pay", "team", "rota"]);

    let out = tmp.path().join("exports/coded.csv");
    let (_, stderr, success) =
        run_codemark(&config_path, &["export", "--output", out.to_str().unwrap()]);
    assert!(success);
    assert!(stderr.contains("Exported 3 extracts"));
    assert!(out.exists());
}

#[test]
fn test_stats_json() {
    let (_tmp, config_path) = setup_test_env();

    run_codemark(&config_path, &["add", "rota", "--doc", "1", "--code", "Sched"]);
    run_codemark(&config_path, &["add", "team", "--doc", "3"]);

    let (stdout, stderr, success) = run_codemark(&config_path, &["stats", "--json"]);
    assert!(success, "stats failed: {}", stderr);
    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(value["documents"], 3);
    assert_eq!(value["extracts"], 2);
    assert_eq!(value["distinct_codes"], 1);
    assert_eq!(value["uncoded_extracts"], 1);
    assert_eq!(value["coded_documents"], 2);
}

#[test]
fn test_shell_script() {
    let (tmp, config_path) = setup_test_env();

    let themes_out = tmp.path().join("themes.csv");
    let script = tmp.path().join("session.txt");
    fs::write(
        &script,
        format!(
            "# code the first answer\n\
             add \"rota changes\"\n\
             edit 1 Code Sched\n\
             select Sched\n\
             jump 3\n\
             add \"trust my manager\"\n\
             themes set Sched \"\"\n\
             themes rename 1 Work\n\
             themes apply\n\
             themes export {}\n\
             list\n",
            themes_out.display()
        ),
    )
    .unwrap();

    let (stdout, stderr, success) = run_codemark(
        &config_path,
        &["shell", "--script", script.to_str().unwrap()],
    );
    assert!(success, "shell failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("added row 2"));
    assert!(stdout.contains("themed 2 rows"));

    let csv = fs::read_to_string(codebook_path(&config_path)).unwrap();
    let rows: Vec<&str> = csv.lines().skip(1).collect();
    assert!(rows[0].starts_with("Work,Sched,rota changes,1,"));
    assert!(rows[1].starts_with("Work,Sched,trust my manager,3,"));

    let themes = fs::read_to_string(&themes_out).unwrap();
    assert_eq!(themes, "Work,Theme 2\nSched,\n");
}

#[test]
fn test_shell_stdin() {
    let (_tmp, config_path) = setup_test_env();

    let mut child = Command::new(codemark_binary())
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .arg("shell")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"next\nshow\nfrobnicate\nquit\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("Document 2/3"));
    assert!(stdout.contains("unknown command"));
}

#[test]
fn test_missing_config_fails() {
    let tmp = TempDir::new().unwrap();
    let (_, stderr, success) = run_codemark(&tmp.path().join("nope.toml"), &["counter"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"));
}

#[test]
fn test_completions_without_config() {
    let tmp = TempDir::new().unwrap();
    let (stdout, _, success) =
        run_codemark(&tmp.path().join("nope.toml"), &["completions", "bash"]);
    assert!(success);
    assert!(stdout.contains("codemark"));
}
