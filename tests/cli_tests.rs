//! CLI Integration Tests for Parlor
//!
//! Tests the command-line interface functionality including the init command,
//! the route command and session-guarded commands run without a server.

use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

/// Run the parlor binary in `working_dir` with a clean environment
fn run_parlor(args: &[&str], working_dir: Option<&Path>) -> std::process::Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_parlor"));
    cmd.args(args)
        .env_remove("PARLOR_API_URL")
        .env_remove("PARLOR_PASSWORD")
        .env_remove("RUST_LOG");

    if let Some(dir) = working_dir {
        cmd.current_dir(dir);
    }

    cmd.output().expect("Failed to execute command")
}

/// Write a parlor.toml pointing at a closed port, with credentials kept in
/// the temp dir
fn offline_config(dir: &Path) {
    let credentials = dir.join("credentials.json");
    let content = format!(
        r#"[api]
base_url = "http://127.0.0.1:9/api"
timeout_secs = 2

[session]
credentials_file = "{}"
"#,
        credentials.display().to_string().replace('\\', "/")
    );
    fs::write(dir.join("parlor.toml"), content).expect("Failed to write parlor.toml");
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_command() {
    let output = run_parlor(&["--help"], None);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(stdout.contains("Parlor"));
    assert!(stdout.contains("USAGE") || stdout.contains("Usage"));
    assert!(stdout.contains("init"));
    assert!(stdout.contains("login"));
    assert!(stdout.contains("chats"));
    assert!(stdout.contains("admin"));
}

#[test]
fn test_version_command() {
    let output = run_parlor(&["--version"], None);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("parlor"));
}

#[test]
fn test_init_help() {
    let output = run_parlor(&["init", "--help"], None);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--force"));
    assert!(stdout.contains("--api-url"));
}

#[test]
fn test_missing_subcommand_fails() {
    let output = run_parlor(&[], None);
    assert!(!output.status.success());
}

// =============================================================================
// Init Command Tests
// =============================================================================

#[test]
fn test_init_creates_parlor_toml() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let temp_path = temp_dir.path().to_str().unwrap();

    let output = run_parlor(&["init", temp_path, "--no-color"], None);
    assert!(output.status.success(), "Init command failed: {:?}", output);

    let config_path = temp_dir.path().join("parlor.toml");
    assert!(config_path.exists(), "parlor.toml was not created");

    let content = fs::read_to_string(&config_path).expect("Failed to read parlor.toml");
    assert!(content.contains("[api]"));
    assert!(content.contains("[limits]"));
    assert!(content.contains("base_url = \"http://localhost:3000/api\""));
}

#[test]
fn test_init_creates_env_example_and_gitignore() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let temp_path = temp_dir.path().to_str().unwrap();

    let output = run_parlor(&["init", temp_path], None);
    assert!(output.status.success());

    let env = fs::read_to_string(temp_dir.path().join(".env.example"))
        .expect("Failed to read .env.example");
    assert!(env.contains("CLOUDINARY_CLOUD_NAME"));
    assert!(env.contains("CLOUDINARY_UPLOAD_PRESET"));

    let gitignore =
        fs::read_to_string(temp_dir.path().join(".gitignore")).expect("Failed to read .gitignore");
    assert!(gitignore.contains(".env"));
}

#[test]
fn test_init_with_custom_api_url() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let temp_path = temp_dir.path().to_str().unwrap();

    let output = run_parlor(
        &["init", temp_path, "--api-url", "https://chat.example.com/api"],
        None,
    );
    assert!(output.status.success());

    let content = fs::read_to_string(temp_dir.path().join("parlor.toml")).unwrap();
    assert!(content.contains("base_url = \"https://chat.example.com/api\""));
}

#[test]
fn test_init_keeps_existing_file_without_force() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let temp_path = temp_dir.path().to_str().unwrap();
    let config_path = temp_dir.path().join("parlor.toml");
    fs::write(&config_path, "# mine\n").unwrap();

    let output = run_parlor(&["init", temp_path, "--no-color"], None);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("already exists"));

    assert_eq!(fs::read_to_string(&config_path).unwrap(), "# mine\n");
}

#[test]
fn test_init_with_force_overwrites() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let temp_path = temp_dir.path().to_str().unwrap();
    let config_path = temp_dir.path().join("parlor.toml");
    fs::write(&config_path, "# mine\n").unwrap();

    let output = run_parlor(&["init", temp_path, "--force"], None);
    assert!(output.status.success());

    let content = fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("[api]"));
}

// =============================================================================
// Config Tests
// =============================================================================

#[test]
fn test_invalid_config_is_reported() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    fs::write(
        temp_dir.path().join("parlor.toml"),
        "[api]\nbase_url = \"ftp://nope\"\n",
    )
    .unwrap();

    let output = run_parlor(&["--no-color", "whoami"], Some(temp_dir.path()));
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("parlor.toml"), "stderr: {}", stderr);
}

// =============================================================================
// Guarded Command Tests (no server)
// =============================================================================

#[test]
fn test_route_redirects_to_login_without_session() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    offline_config(temp_dir.path());

    let output = run_parlor(&["--no-color", "route", "/"], Some(temp_dir.path()));
    assert!(output.status.success(), "route failed: {:?}", output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Redirects to /login"), "stdout: {}", stdout);
}

#[test]
fn test_route_renders_guest_page() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    offline_config(temp_dir.path());

    let output = run_parlor(&["--no-color", "route", "/register"], Some(temp_dir.path()));
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Renders /register"), "stdout: {}", stdout);
}

#[test]
fn test_whoami_without_session() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    offline_config(temp_dir.path());

    let output = run_parlor(&["--no-color", "whoami"], Some(temp_dir.path()));
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Not signed in"));
}

#[test]
fn test_unreachable_server_keeps_saved_token() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    offline_config(temp_dir.path());

    let credentials = temp_dir.path().join("credentials.json");
    let saved = r#"{
  "token": "tok-offline",
  "base_url": "http://127.0.0.1:9/api",
  "saved_at": "2024-01-01T00:00:00Z"
}"#;
    fs::write(&credentials, saved).unwrap();

    let output = run_parlor(&["--no-color", "whoami"], Some(temp_dir.path()));
    assert!(output.status.success(), "whoami failed: {:?}", output);

    assert!(
        credentials.exists(),
        "credentials were removed after a connection failure"
    );
    assert_eq!(fs::read_to_string(&credentials).unwrap(), saved);
}

#[tokio::test]
async fn test_rejected_token_is_forgotten() {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(serde_json::json!({"message": "Token expired"})),
        )
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let base_url = format!("{}/api", server.uri());
    let credentials = temp_dir.path().join("credentials.json");
    fs::write(
        temp_dir.path().join("parlor.toml"),
        format!(
            "[api]\nbase_url = \"{}\"\n\n[session]\ncredentials_file = \"{}\"\n",
            base_url,
            credentials.display().to_string().replace('\\', "/")
        ),
    )
    .unwrap();
    fs::write(
        &credentials,
        serde_json::json!({
            "token": "tok-expired",
            "base_url": base_url,
            "saved_at": "2024-01-01T00:00:00Z"
        })
        .to_string(),
    )
    .unwrap();

    let dir = temp_dir.path().to_path_buf();
    let output = tokio::task::spawn_blocking(move || {
        run_parlor(&["--no-color", "whoami"], Some(&dir))
    })
    .await
    .unwrap();

    assert!(output.status.success(), "whoami failed: {:?}", output);
    assert!(!credentials.exists(), "rejected token was kept");
}

#[test]
fn test_chats_requires_login() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    offline_config(temp_dir.path());

    let output = run_parlor(&["--no-color", "chats"], Some(temp_dir.path()));
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("parlor login"), "stderr: {}", stderr);
}

#[test]
fn test_new_group_requires_members() {
    let output = run_parlor(&["new-group", "Team"], None);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--members"));
}
