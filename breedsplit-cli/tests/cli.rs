use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn breedsplit(input: &Path, output: &Path, extra: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_breedsplit"))
        .arg("--input-dir")
        .arg(input)
        .arg("--output-dir")
        .arg(output)
        .arg("--mapping")
        .arg(input.join("split_plink.txt"))
        .arg("--exclude")
        .arg(input.join("exclude_chipid.txt"))
        .args(extra)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run breedsplit")
}

fn write_batch(dir: &Path) {
    fs::write(dir.join("chip.map"), "1\tM1\t0\t100\n1\tM2\t0\t200\n").unwrap();
    fs::write(
        dir.join("chip.ped"),
        "F\tS1\t0\t0\t1\t-9\tA\tA\tC\tC\nF\tS2\t0\t0\t2\t-9\tA\tG\tC\tT\n",
    )
    .unwrap();
    fs::write(
        dir.join("split_plink.txt"),
        "S1\tAlice\tBreedA\nS2\tBob\tBreedB\n",
    )
    .unwrap();
}

fn zips(dir: &Path) -> Vec<String> {
    let mut names: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .filter(|n| n.ends_with(".zip"))
        .collect();
    names.sort();
    names
}

#[test]
fn splits_batch_into_one_archive_per_group() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_batch(input.path());

    let out = breedsplit(input.path(), output.path(), &["--site-code", "ABCD"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert!(String::from_utf8_lossy(&out.stdout).contains("2 bundle(s)"));

    let names = zips(output.path());
    assert_eq!(names.len(), 2);
    assert!(names[0].starts_with("BreedA_") && names[1].starts_with("BreedB_"));
}

#[test]
fn site_code_is_read_from_stdin() {
    use std::io::Write;
    use std::process::Stdio;

    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_batch(input.path());

    let mut child = Command::new(env!("CARGO_BIN_EXE_breedsplit"))
        .arg("--input-dir")
        .arg(input.path())
        .arg("--output-dir")
        .arg(output.path())
        .arg("--mapping")
        .arg(input.path().join("split_plink.txt"))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"toolong\nWXYZ\n")
        .unwrap();
    let out = child.wait_with_output().unwrap();

    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert!(String::from_utf8_lossy(&out.stderr).contains("must be exactly 4 characters"));
    assert_eq!(zips(output.path()).len(), 2);
}

#[test]
fn missing_mapping_table_exits_with_failure() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_batch(input.path());
    fs::remove_file(input.path().join("split_plink.txt")).unwrap();

    let out = breedsplit(input.path(), output.path(), &["--site-code", "ABCD"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("mapping table"));
    assert!(zips(output.path()).is_empty());
}

#[test]
fn bad_site_code_flag_is_rejected() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_batch(input.path());

    let out = breedsplit(input.path(), output.path(), &["--site-code", "AB"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(zips(output.path()).is_empty());
}

#[test]
fn unknown_flag_is_a_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let out = breedsplit(dir.path(), dir.path(), &["--no-such-flag"]);
    assert_eq!(out.status.code(), Some(2));
}
