use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

const TREE: &str = "((A:0.1,B:0.1):0.1,(C:0.1,D:5.0):0.1);";
const BACKBONE: &str = ">A\nAC-GT\n>B\nAC-GA\n>C\nACTGT\n>D\nAC-TT\n";

#[test]
fn command_filter_tree() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let list = temp.path().join("removed.txt");

    let mut cmd = cargo_bin_cmd!("divmsa");
    cmd.arg("filter")
        .arg("stdin")
        .arg("-l")
        .arg("5")
        .arg("--list")
        .arg(&list)
        .write_stdin(TREE);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("D").not())
        .stdout(predicate::str::contains("(A:0.1,B:0.1)"));

    assert_eq!(std::fs::read_to_string(&list)?, "D\n");

    Ok(())
}

#[test]
fn command_filter_alignment() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let aln = temp.path().join("backbone.fa");
    std::fs::write(&aln, BACKBONE)?;
    let kept = temp.path().join("kept.fa");
    let demoted = temp.path().join("demoted.fa");

    let mut cmd = cargo_bin_cmd!("divmsa");
    cmd.arg("filter")
        .arg("stdin")
        .arg("-l")
        .arg("5")
        .arg("-a")
        .arg(&aln)
        .arg("--backbone")
        .arg(&kept)
        .arg("--demoted")
        .arg(&demoted)
        .write_stdin(TREE);
    cmd.assert().success();

    let kept = std::fs::read_to_string(&kept)?;
    assert!(kept.contains(">C\nACTGT"));
    assert!(!kept.contains(">D"));
    assert_eq!(std::fs::read_to_string(&demoted)?, ">D\nACTT\n");

    Ok(())
}

#[test]
fn command_filter_nothing_long() -> anyhow::Result<()> {
    let mut cmd = cargo_bin_cmd!("divmsa");
    cmd.arg("filter")
        .arg("stdin")
        .arg("-l")
        .arg("100")
        .write_stdin(TREE);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("D:5"));

    Ok(())
}

#[test]
fn command_filter_bad_threshold() -> anyhow::Result<()> {
    let mut cmd = cargo_bin_cmd!("divmsa");
    cmd.arg("filter")
        .arg("stdin")
        .arg("-l")
        .arg("0")
        .write_stdin(TREE);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("must be positive"));

    Ok(())
}
