//! Integration tests for the superzip binary

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::thread;
use std::time::Duration;

use tempfile::TempDir;

fn superzip() -> Command {
    Command::new(env!("CARGO_BIN_EXE_superzip"))
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_help() {
    let output = superzip().arg("--help").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--raw-copy-rename"));
    assert!(stdout.contains("ENTRY_POINT"));
}

#[test]
fn test_missing_arguments() {
    let output = superzip().output().unwrap();
    assert!(!output.status.success());
}

#[test]
fn test_invalid_entry_point() {
    let output = superzip()
        .args(["--color", "never", "six", "not-an-entry-point"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr_of(&output).contains("Invalid entry point"));
}

#[test]
fn test_no_packages_and_no_output() {
    let output = superzip()
        .args(["--color", "never", "tinyscript.main:run"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr_of(&output).contains("No output file or packages specified"));
}

#[test]
fn test_virtualenv_unavailable() {
    let temp = TempDir::new().unwrap();
    let output = superzip()
        .env("PATH", temp.path())
        .args(["--color", "never", "-o"])
        .arg(temp.path().join("out.sz"))
        .args(["six", "tinyscript.main:run"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr_of(&output).contains("virtualenv"));
    assert!(!temp.path().join("out.sz").exists());
}

/// Run `program`, retrying while another test's child briefly holds the
/// freshly written executable open.
#[cfg(unix)]
fn run_retrying<S: AsRef<OsStr>>(program: &Path, args: &[S]) -> Output {
    let mut attempts = 0;
    loop {
        match Command::new(program).args(args).output() {
            Err(e) if e.raw_os_error() == Some(26) && attempts < 20 => {
                attempts += 1;
                thread::sleep(Duration::from_millis(50));
            }
            result => return result.unwrap(),
        }
    }
}

/// Bundle whose interpreter is a shell script that prints the search path
/// and the first program argument, then exits with status 42. `directives`
/// are written into site-packages next to `extra.pth`.
#[cfg(unix)]
fn fake_interpreter_bundle(temp: &TempDir, directives: &[(&str, &[u8])]) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let interpreter = temp.path().join("fake-python");
    fs::write(
        &interpreter,
        "#!/bin/sh\nprintf '%s\\n' \"$FAKE_SEARCH_PATH\"\nprintf '%s\\n' \"$3\"\nexit 42\n",
    )
    .unwrap();
    fs::set_permissions(&interpreter, fs::Permissions::from_mode(0o755)).unwrap();

    let tree = temp.path().join("tree");
    let site = tree.join("site-packages");
    fs::create_dir_all(site.join("tinyscript")).unwrap();
    fs::create_dir_all(site.join("extra")).unwrap();
    fs::write(site.join("tinyscript/main.py"), "def run():\n    pass\n").unwrap();
    fs::write(site.join("extra.pth"), "extra\n").unwrap();
    for (name, content) in directives {
        fs::write(site.join(name), content).unwrap();
    }
    fs::write(
        tree.join("superzip.toml"),
        format!(
            "entry_point = \"tinyscript.main:run\"\n\n[host]\nprogram = \"{}\"\npath_variable = \"FAKE_SEARCH_PATH\"\n",
            interpreter.display()
        ),
    )
    .unwrap();

    let bundle = temp.path().join("tinyscript.sz");
    superzip_core::write_bundle(Path::new(env!("CARGO_BIN_EXE_superzip")), &tree, &bundle).unwrap();
    fs::set_permissions(&bundle, fs::Permissions::from_mode(0o755)).unwrap();
    bundle
}

#[cfg(unix)]
#[test]
fn test_launch_mode() {
    let temp = TempDir::new().unwrap();
    let bundle = fake_interpreter_bundle(&temp, &[]);

    let output = run_retrying(&bundle, &["hello"]);
    assert_eq!(output.status.code(), Some(42), "stderr: {}", stderr_of(&output));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut lines = stdout.lines();
    let search_path = lines.next().unwrap();
    let bundle = fs::canonicalize(&bundle).unwrap();
    assert_eq!(
        search_path,
        format!("{0}/site-packages:{0}/site-packages/extra", bundle.display())
    );
    assert_eq!(lines.next(), Some("hello"));
}

#[cfg(unix)]
#[test]
fn test_launch_mode_forwards_non_utf8_arguments() {
    use std::os::unix::ffi::OsStrExt;

    let temp = TempDir::new().unwrap();
    let bundle = fake_interpreter_bundle(&temp, &[]);

    let arg = OsStr::from_bytes(b"caf\xe9");
    let output = run_retrying(&bundle, &[arg]);
    assert_eq!(output.status.code(), Some(42), "stderr: {}", stderr_of(&output));

    let forwarded = output.stdout.split(|&b| b == b'\n').nth(1).unwrap();
    assert_eq!(forwarded, b"caf\xe9");
}

#[cfg(unix)]
#[test]
fn test_launch_mode_reports_directive_fault_once() {
    let temp = TempDir::new().unwrap();
    let bundle = fake_interpreter_bundle(&temp, &[("broken.pth", &b"\xff\n"[..])]);

    let output = run_retrying::<&str>(&bundle, &[]);
    assert_eq!(output.status.code(), Some(42), "stderr: {}", stderr_of(&output));

    let stderr = stderr_of(&output);
    assert_eq!(stderr.matches("Error processing line 1 of").count(), 1, "{}", stderr);
    assert_eq!(stderr.matches("line is not valid UTF-8").count(), 1, "{}", stderr);
    assert!(stderr.contains("Remainder of file ignored"));
}

#[cfg(unix)]
#[test]
fn test_launch_mode_missing_entry_module() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let tree = temp.path().join("tree");
    fs::create_dir_all(tree.join("site-packages")).unwrap();
    fs::write(tree.join("superzip.toml"), "entry_point = \"gone:main\"\n").unwrap();

    let bundle = temp.path().join("gone.sz");
    superzip_core::write_bundle(Path::new(env!("CARGO_BIN_EXE_superzip")), &tree, &bundle).unwrap();
    fs::set_permissions(&bundle, fs::Permissions::from_mode(0o755)).unwrap();

    let output = run_retrying::<&str>(&bundle, &[]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr_of(&output).contains("Cannot find module 'gone'"));
}
