use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

const DIVERGENT: &str = ">A\nAAAA\n>B\nCCCC\n>C\nGGGG\n>D\nTTTT\n";

#[test]
fn command_size_divergent() -> anyhow::Result<()> {
    let mut cmd = cargo_bin_cmd!("divmsa");
    cmd.arg("size").arg("stdin").write_stdin(DIVERGENT);
    // too few taxa to grow past the base size
    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with("10\t1.0000\t1.0000"));

    Ok(())
}

#[test]
fn command_size_similar() -> anyhow::Result<()> {
    let mut cmd = cargo_bin_cmd!("divmsa");
    cmd.arg("size")
        .arg("stdin")
        .write_stdin(">A\nACGT\n>B\nACGT\n>C\nACGA\n");
    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with("10\t"));

    Ok(())
}

#[test]
fn command_size_amino() -> anyhow::Result<()> {
    let mut cmd = cargo_bin_cmd!("divmsa");
    cmd.arg("size")
        .arg("stdin")
        .arg("-m")
        .arg("amino")
        .write_stdin(DIVERGENT);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("10\tNA\tNA"));

    Ok(())
}

#[test]
fn command_size_bad_molecule() -> anyhow::Result<()> {
    let mut cmd = cargo_bin_cmd!("divmsa");
    cmd.arg("size")
        .arg("stdin")
        .arg("-m")
        .arg("rock")
        .write_stdin(DIVERGENT);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Unknown molecule type"));

    Ok(())
}
