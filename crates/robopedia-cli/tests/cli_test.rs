#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

/// A command isolated in `work`, storing data under `data`.
fn robopedia(work: &Path, data: &Path) -> Command {
    let mut cmd = Command::new(cargo_bin("robopedia"));
    cmd.current_dir(work)
        .env("ROBOPEDIA_BACKEND", "local")
        .env("ROBOPEDIA_DATA_DIR", data.as_os_str())
        .env_remove("ROBOPEDIA_ADMIN_EMAIL")
        .env_remove("ROBOPEDIA_ADMIN_PASSWORD")
        .env_remove("ROBOPEDIA_USER_PASSWORD")
        .env_remove("RUST_LOG");
    cmd
}

fn setup() -> (TempDir, std::path::PathBuf) {
    let temp = TempDir::new().unwrap();
    let data = temp.path().join("data");
    (temp, data)
}

#[test]
fn test_lists_bundled_robots_on_a_fresh_install() {
    let (temp, data) = setup();
    robopedia(temp.path(), &data)
        .args(["robots", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Atlas"))
        .stdout(predicate::str::contains("Spot"));
}

#[test]
fn test_create_show_and_audit_a_robot() {
    let (temp, data) = setup();
    robopedia(temp.path(), &data)
        .args([
            "robots", "create", "--name", "Digit", "--manufacturer", "Agility Robotics",
            "--year", "2019", "--spec", "height=1.75 m",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created robot: Digit"));

    assert!(data.join("robots.json").exists());

    robopedia(temp.path(), &data)
        .args(["robots", "show", "digit"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Agility Robotics"))
        .stdout(predicate::str::contains("height: 1.75 m"));

    robopedia(temp.path(), &data)
        .args(["activity"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created robot 'Digit'"));
}

#[test]
fn test_duplicate_slug_is_rejected() {
    let (temp, data) = setup();
    robopedia(temp.path(), &data)
        .args(["robots", "create", "--name", "Atlas"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    robopedia(temp.path(), &data)
        .args(["activity"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No activity recorded"));
}

#[test]
fn test_search_matches_manufacturer() {
    let (temp, data) = setup();
    robopedia(temp.path(), &data)
        .args(["robots", "search", "hanson"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Sophia"))
        .stdout(predicate::str::contains("Atlas").not());
}

#[test]
fn test_missing_records_exit_non_zero() {
    let (temp, data) = setup();
    robopedia(temp.path(), &data)
        .args(["robots", "delete", "robot-999"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Robot not found"));

    robopedia(temp.path(), &data)
        .args(["news", "show", "no-such-article"])
        .assert()
        .failure();
}

#[test]
fn test_gzip_backup_restores_into_a_fresh_install() {
    let (temp, data) = setup();
    let backup = temp.path().join("backup.json.gz");

    robopedia(temp.path(), &data)
        .args(["robots", "create", "--name", "Digit"])
        .assert()
        .success();
    robopedia(temp.path(), &data)
        .args(["export", backup.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported"));

    let fresh = temp.path().join("fresh");
    robopedia(temp.path(), &fresh)
        .args(["import", backup.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported"));
    robopedia(temp.path(), &fresh)
        .args(["robots", "show", "digit"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Digit"));
}

#[test]
fn test_users_sign_in_with_their_password() {
    let (temp, data) = setup();
    robopedia(temp.path(), &data)
        .args(["users", "add", "--email", "Ada@Example.com", "--name", "Ada"])
        .env("ROBOPEDIA_USER_PASSWORD", "correct horse")
        .assert()
        .success();

    let stored = std::fs::read_to_string(data.join("users.json")).unwrap();
    assert!(!stored.contains("correct horse"));

    robopedia(temp.path(), &data)
        .args(["users", "login", "--email", "ada@example.com", "--password", "correct horse"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Signed in as Ada"));

    robopedia(temp.path(), &data)
        .args(["users", "login", "--email", "ada@example.com", "--password", "wrong"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid email or password"));
}

#[test]
fn test_settings_round_trip_through_the_backend() {
    let (temp, data) = setup();
    robopedia(temp.path(), &data)
        .args(["settings", "perPage", "12"])
        .assert()
        .success();
    robopedia(temp.path(), &data)
        .args(["settings", "perPage"])
        .assert()
        .success()
        .stdout("12\n");
    robopedia(temp.path(), &data)
        .args(["settings", "perPage", "--remove"])
        .assert()
        .success();
    robopedia(temp.path(), &data)
        .args(["settings", "perPage"])
        .assert()
        .failure();
}

#[test]
fn test_assistant_answers_by_keyword() {
    let (temp, data) = setup();
    robopedia(temp.path(), &data)
        .args(["ask", "which", "robot", "dog", "is", "best?"])
        .assert()
        .success()
        .stdout(predicate::str::contains("quadruped"));
}

#[test]
fn test_project_config_file_is_read() {
    let (temp, data) = setup();
    std::fs::write(temp.path().join("robopedia.toml"), "backend = \"github\"\n").unwrap();

    // github without owner/repo is a configuration error
    Command::new(cargo_bin("robopedia"))
        .current_dir(temp.path())
        .env_remove("ROBOPEDIA_BACKEND")
        .env("ROBOPEDIA_DATA_DIR", data.as_os_str())
        .args(["robots", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("github.owner"));
}

#[test]
fn test_flush_pushes_changes_a_remote_never_received() {
    let (temp, data) = setup();
    // Nothing listens on port 9 and there is no token: every remote call fails fast
    std::fs::write(
        temp.path().join("robopedia.toml"),
        "backend = \"github\"\n\n[github]\nowner = \"acme\"\nrepo = \"wiki\"\napi_base = \"http://127.0.0.1:9\"\n",
    )
    .unwrap();
    let remote = |args: &[&str]| {
        let mut cmd = robopedia(temp.path(), &data);
        cmd.env_remove("ROBOPEDIA_BACKEND")
            .env_remove("ROBOPEDIA_GITHUB_OWNER")
            .env_remove("ROBOPEDIA_GITHUB_REPO")
            .env_remove("GITHUB_TOKEN")
            .args(args);
        cmd
    };

    remote(&["robots", "create", "--name", "Digit"])
        .assert()
        .success()
        .stdout(predicate::str::contains("could not be saved to github"));
    assert!(data.join("pendingSync.json").exists());

    remote(&["flush"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Could not save robots"))
        .stderr(predicate::str::contains("could not be saved"));

    // The local copy is still served and still marked for the next flush
    remote(&["robots", "show", "digit"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Digit"));
    let pending = std::fs::read_to_string(data.join("pendingSync.json")).unwrap();
    assert!(pending.contains("robots"));
}
