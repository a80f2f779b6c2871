use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn command_decompose_balanced() -> anyhow::Result<()> {
    let mut cmd = cargo_bin_cmd!("divmsa");
    cmd.arg("decompose")
        .arg("stdin")
        .arg("-A")
        .arg("2")
        .write_stdin("((A,B),(C,D));");
    cmd.assert()
        .success()
        .stdout(predicate::eq("0\tA\n0\tB\n1\tC\n1\tD\n"));

    Ok(())
}

#[test]
fn command_decompose_small_tree() -> anyhow::Result<()> {
    let mut cmd = cargo_bin_cmd!("divmsa");
    let output = cmd
        .arg("decompose")
        .arg("stdin")
        .arg("-A")
        .arg("10")
        .write_stdin("((A,B),(C,D),E);")
        .output()?;
    let stdout = String::from_utf8(output.stdout)?;

    assert_eq!(stdout.lines().count(), 5);
    assert!(stdout.lines().all(|l| l.starts_with("0\t")));

    Ok(())
}

#[test]
fn command_decompose_bounded() -> anyhow::Result<()> {
    let mut cmd = cargo_bin_cmd!("divmsa");
    let output = cmd
        .arg("decompose")
        .arg("stdin")
        .arg("-A")
        .arg("3")
        .write_stdin("(((A,B),(C,D)),((E,F),(G,(H,I))));")
        .output()?;
    let stdout = String::from_utf8(output.stdout)?;

    let mut names: Vec<&str> = stdout
        .lines()
        .map(|l| l.split('\t').nth(1).unwrap())
        .collect();
    names.sort_unstable();
    assert_eq!(names, vec!["A", "B", "C", "D", "E", "F", "G", "H", "I"]);

    let mut counts = std::collections::BTreeMap::new();
    for line in stdout.lines() {
        *counts.entry(line.split('\t').next().unwrap()).or_insert(0) += 1;
    }
    assert!(counts.values().all(|&c| c <= 3));

    Ok(())
}

#[test]
fn command_decompose_zero() -> anyhow::Result<()> {
    let mut cmd = cargo_bin_cmd!("divmsa");
    cmd.arg("decompose")
        .arg("stdin")
        .arg("-A")
        .arg("0")
        .write_stdin("((A,B),(C,D));");
    cmd.assert().failure();

    Ok(())
}
