use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn docgrep() -> Command {
    Command::cargo_bin("docgrep").expect("binary builds")
}

#[test]
fn basic_search_prints_located_matches() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("notes.txt"),
        "the quick brown fox\njumps over the lazy dog\n",
    )
    .unwrap();

    docgrep()
        .arg("quick")
        .arg("--path")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("notes.txt"))
        .stdout(predicate::str::contains("Line 1:"))
        .stdout(predicate::str::contains("Found"));
}

#[test]
fn no_matches_is_reported_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("notes.txt"), "nothing relevant here\n").unwrap();

    docgrep()
        .arg("unicorn")
        .arg("--path")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No matches found"));
}

#[test]
fn invalid_regex_fails_before_scanning() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("notes.txt"), "content\n").unwrap();

    docgrep()
        .arg("[invalid")
        .arg("--regex")
        .arg("--path")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("InvalidPattern"));
}

#[test]
fn whole_word_flag_excludes_embedded_hits() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("words.txt"), "category cat\n").unwrap();

    docgrep()
        .arg("cat")
        .arg("--whole-word")
        .arg("--path")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Found"))
        .stdout(predicate::str::contains(" 1 "));
}

#[test]
fn extension_filter_restricts_the_scan() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "shared term\n").unwrap();
    fs::write(dir.path().join("b.log"), "shared term\n").unwrap();

    docgrep()
        .arg("shared")
        .arg("--extensions")
        .arg("txt")
        .arg("--path")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("a.txt"))
        .stdout(predicate::str::contains("b.log").not());
}

#[test]
fn recursive_flag_reaches_nested_directories() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("sub/deeper")).unwrap();
    fs::write(dir.path().join("sub/deeper/leaf.txt"), "buried term\n").unwrap();

    docgrep()
        .arg("buried")
        .arg("--path")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No matches found"));

    docgrep()
        .arg("buried")
        .arg("--recursive")
        .arg("--path")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("leaf.txt"));
}
