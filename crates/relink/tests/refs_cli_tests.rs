//! Integration tests for the `refs` command: interactive review, auto mode,
//! dry runs and backups.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Blog folder inside a temp dir, with backups configured next to it
fn setup_blog() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let blog = temp_dir.path().join("blog");
    fs::create_dir_all(blog.join("posts")).unwrap();
    let backups = temp_dir.path().join("backups");
    fs::write(
        blog.join(".relink.toml"),
        format!("[backup]\ndir = {:?}\n", backups.to_string_lossy()),
    )
    .unwrap();
    (temp_dir, blog)
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn read(root: &Path, rel: &str) -> String {
    fs::read_to_string(root.join(rel)).unwrap()
}

fn relink() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("relink"));
    cmd.env_remove("RELINK_CONFIG").env_remove("RUST_LOG");
    cmd
}

fn backups(temp_dir: &TempDir) -> Vec<PathBuf> {
    let dir = temp_dir.path().join("backups");
    if !dir.exists() {
        return Vec::new();
    }
    let mut entries: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    entries.sort();
    entries
}

#[test]
fn test_refs_auto_rewrites_standard_link() {
    let (temp_dir, blog) = setup_blog();
    write(&blog, "posts/logo.webp", "");
    write(&blog, "posts/hello.md", "# Hi\n\n![logo](logo.jpg)\n");

    relink()
        .args(["refs", "--auto"])
        .arg(&blog)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 of 1 document(s) changed"));

    assert_eq!(read(&blog, "posts/hello.md"), "# Hi\n\n![logo](logo.webp)\n");
    assert_eq!(backups(&temp_dir).len(), 1);
}

#[test]
fn test_refs_backup_holds_original_text() {
    let (temp_dir, blog) = setup_blog();
    write(&blog, "posts/logo.webp", "");
    write(&blog, "posts/hello.md", "![logo](logo.jpg)\n");

    relink().args(["refs", "--auto"]).arg(&blog).assert().success();

    let backup = &backups(&temp_dir)[0];
    assert!(backup
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("backup_"));
    assert_eq!(read(backup, "posts/hello.md"), "![logo](logo.jpg)\n");
}

#[test]
fn test_refs_no_backup_flag() {
    let (temp_dir, blog) = setup_blog();
    write(&blog, "posts/logo.webp", "");
    write(&blog, "posts/hello.md", "![logo](logo.jpg)\n");

    relink()
        .args(["refs", "--auto", "--no-backup"])
        .arg(&blog)
        .assert()
        .success();

    assert!(backups(&temp_dir).is_empty());
    assert_eq!(read(&blog, "posts/hello.md"), "![logo](logo.webp)\n");
}

#[test]
fn test_refs_interactive_answers_in_order() {
    let (_temp_dir, blog) = setup_blog();
    write(&blog, "posts/a.webp", "");
    write(&blog, "posts/b.webp", "");
    write(&blog, "posts/hello.md", "![a](a.png)\n![b](b.png)\n");

    relink()
        .args(["refs", "--no-backup"])
        .arg(&blog)
        .write_stdin("n\ny\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("Replace?"));

    assert_eq!(read(&blog, "posts/hello.md"), "![a](a.png)\n![b](b.webp)\n");
}

#[test]
fn test_refs_closed_stdin_declines_everything() {
    let (_temp_dir, blog) = setup_blog();
    write(&blog, "posts/a.webp", "");
    write(&blog, "posts/hello.md", "![a](a.png)\n");

    relink()
        .args(["refs", "--no-backup"])
        .arg(&blog)
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains("0 of 1 document(s) changed"));

    assert_eq!(read(&blog, "posts/hello.md"), "![a](a.png)\n");
}

#[test]
fn test_refs_gg_switches_to_auto_for_rest_of_document() {
    let (_temp_dir, blog) = setup_blog();
    write(&blog, "posts/a.webp", "");
    write(&blog, "posts/b.webp", "");
    write(
        &blog,
        "posts/hello.md",
        "---\nimage: a.png\n---\n![b](b.png) <img src=\"a.png\">\n",
    );

    relink()
        .args(["refs", "--no-backup"])
        .arg(&blog)
        .write_stdin("gg\n")
        .assert()
        .success();

    assert_eq!(
        read(&blog, "posts/hello.md"),
        "---\nimage: a.webp\n---\n![b](b.webp) <img src=\"a.webp\">\n"
    );
}

#[test]
fn test_refs_each_document_restarts_confirming() {
    let (_temp_dir, blog) = setup_blog();
    write(&blog, "posts/a.webp", "");
    write(&blog, "posts/one.md", "![a](a.png)\n");
    write(&blog, "posts/two.md", "![a](a.png)\n");

    relink()
        .args(["refs", "--no-backup"])
        .arg(&blog)
        .write_stdin("gg\nn\n")
        .assert()
        .success();

    assert_eq!(read(&blog, "posts/one.md"), "![a](a.webp)\n");
    assert_eq!(read(&blog, "posts/two.md"), "![a](a.png)\n");
}

#[test]
fn test_refs_sticky_auto_carries_over() {
    let (_temp_dir, blog) = setup_blog();
    write(&blog, "posts/a.webp", "");
    write(&blog, "posts/one.md", "![a](a.png)\n");
    write(&blog, "posts/two.md", "![a](a.png)\n");

    relink()
        .args(["refs", "--no-backup", "--sticky-auto"])
        .arg(&blog)
        .write_stdin("gg\n")
        .assert()
        .success();

    assert_eq!(read(&blog, "posts/one.md"), "![a](a.webp)\n");
    assert_eq!(read(&blog, "posts/two.md"), "![a](a.webp)\n");
}

#[test]
fn test_refs_auto_risky_gate_shows_example() {
    let (_temp_dir, blog) = setup_blog();
    write(&blog, "posts/555.webp", "");
    write(&blog, "posts/logo.webp", "");
    write(
        &blog,
        "posts/hello.md",
        "![logo](logo.jpg)\nphoto 555.jpg is great\n",
    );

    relink()
        .args(["refs", "--auto", "--no-backup"])
        .arg(&blog)
        .write_stdin("n\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("...hoto 555.jpg is g..."))
        .stderr(predicate::str::contains("...hoto 555.webp is g..."));

    assert_eq!(
        read(&blog, "posts/hello.md"),
        "![logo](logo.webp)\nphoto 555.jpg is great\n"
    );
}

#[test]
fn test_refs_accept_risky_never_prompts() {
    let (_temp_dir, blog) = setup_blog();
    write(&blog, "posts/555.webp", "");
    write(&blog, "posts/hello.md", "photo 555.jpg is great\n");

    relink()
        .args(["refs", "--auto", "--accept-risky", "--no-backup"])
        .arg(&blog)
        .write_stdin("")
        .assert()
        .success()
        .stderr(predicate::str::contains("contains bare file names").not());

    assert_eq!(read(&blog, "posts/hello.md"), "photo 555.webp is great\n");
}

#[test]
fn test_refs_bare_path_without_sibling_untouched() {
    let (_temp_dir, blog) = setup_blog();
    write(&blog, "posts/hello.md", "photo 555.jpg is great\n");

    relink()
        .args(["refs", "--auto", "--accept-risky", "--no-backup"])
        .arg(&blog)
        .assert()
        .success();

    assert_eq!(read(&blog, "posts/hello.md"), "photo 555.jpg is great\n");
}

#[test]
fn test_refs_shortcode_list_partial() {
    let (_temp_dir, blog) = setup_blog();
    write(&blog, "posts/a.webp", "");
    write(&blog, "posts/hello.md", "{{< imgrow \"a.jpg\" \"b.jpg\" >}}\n");

    relink()
        .args(["refs", "--auto", "--accept-risky", "--no-backup"])
        .arg(&blog)
        .assert()
        .success();

    assert_eq!(
        read(&blog, "posts/hello.md"),
        "{{< imgrow \"a.webp\" \"b.jpg\" >}}\n"
    );
}

#[test]
fn test_refs_dry_run_prints_diff_and_writes_nothing() {
    let (temp_dir, blog) = setup_blog();
    write(&blog, "posts/logo.webp", "");
    write(&blog, "posts/hello.md", "![logo](logo.jpg)\n");

    relink()
        .args(["refs", "--auto", "--dry-run"])
        .arg(&blog)
        .assert()
        .success()
        .stdout(predicate::str::contains("-![logo](logo.jpg)"))
        .stdout(predicate::str::contains("+![logo](logo.webp)"))
        .stdout(predicate::str::contains("would change"));

    assert_eq!(read(&blog, "posts/hello.md"), "![logo](logo.jpg)\n");
    assert!(backups(&temp_dir).is_empty());
}

#[test]
fn test_refs_json_report() {
    let (_temp_dir, blog) = setup_blog();
    write(&blog, "posts/logo.webp", "");
    write(&blog, "posts/hello.md", "![logo](logo.jpg)\n");

    let output = relink()
        .args(["--json", "refs", "--auto", "--no-backup"])
        .arg(&blog)
        .output()
        .unwrap();

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["metadata"]["command"], "refs");
    assert_eq!(json["data"]["documents_changed"], 1);
    assert_eq!(json["data"]["references_applied"], 1);
    assert_eq!(
        json["data"]["documents"][0]["applied"][0]["kind"],
        "standard_link"
    );
}

#[test]
fn test_refs_all_occurrences_rewrites_declined_copy() {
    let (_temp_dir, blog) = setup_blog();
    write(&blog, "posts/555.webp", "");
    write(&blog, "posts/hello.md", "first 555.jpg then 555.jpg\n");

    relink()
        .args(["refs", "--no-backup"])
        .arg(&blog)
        .write_stdin("n\ny\n")
        .assert()
        .success();
    assert_eq!(
        read(&blog, "posts/hello.md"),
        "first 555.jpg then 555.webp\n"
    );

    write(&blog, "posts/hello.md", "first 555.jpg then 555.jpg\n");
    relink()
        .args(["refs", "--no-backup", "--all-occurrences"])
        .arg(&blog)
        .write_stdin("n\ny\n")
        .assert()
        .success();
    assert_eq!(
        read(&blog, "posts/hello.md"),
        "first 555.webp then 555.webp\n"
    );
}

#[test]
fn test_refs_second_run_changes_nothing() {
    let (_temp_dir, blog) = setup_blog();
    write(&blog, "posts/logo.webp", "");
    write(&blog, "posts/hello.md", "---\nimage: logo.jpg\n---\n![logo](logo.jpg)\n");

    relink()
        .args(["refs", "--auto", "--no-backup"])
        .arg(&blog)
        .assert()
        .success();
    let first = read(&blog, "posts/hello.md");

    relink()
        .args(["refs", "--auto", "--no-backup"])
        .arg(&blog)
        .assert()
        .success()
        .stdout(predicate::str::contains("0 of 1 document(s) changed"));
    assert_eq!(read(&blog, "posts/hello.md"), first);
}
