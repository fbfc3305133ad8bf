//! End-to-end tests for the cellpower binary

use std::io::Write;
use std::process::Command;

const BUF_LIB: &str = r#"
library(cli_lib) {
    time_unit : "1ns";
    capacitive_load_unit (1, pf);
    leakage_power_unit : "1nW";

    power_lut_template (power_1d) {
        variable_1 : input_transition_time;
        index_1 ("0.1, 0.3");
    }

    cell (BUF_X1) {
        pin (A) { direction : input; }
        pin (Y) {
            direction : output;
            internal_power () {
                related_pin : "A";
                power (power_1d) {
                    values ("2.0, 4.0");
                }
            }
        }
    }
}
"#;

fn write_library() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(BUF_LIB.as_bytes()).unwrap();
    file
}

fn cellpower() -> Command {
    Command::new(env!("CARGO_BIN_EXE_cellpower"))
}

#[test]
fn test_report_both_edges() {
    let lib = write_library();
    let output = cellpower()
        .arg("report")
        .arg(lib.path())
        .args(["--cell", "BUF_X1", "--slew", "0.2", "--load", "0.01", "--digits", "1"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(
        stdout,
        "BUF_X1 Y <- A\n rise:\n  input_transition_time = 0.2ns\nPower = 3.0nW\n \
         fall:\n  input_transition_time = 0.2ns\nPower = 3.0nW\n"
    );
}

#[test]
fn test_report_digits_from_config() {
    let lib = write_library();
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("cellpower.toml");
    std::fs::write(&config, "[report]\ndigits = 0\n").unwrap();

    let output = cellpower()
        .arg("report")
        .arg(lib.path())
        .args(["-c", "BUF_X1", "-s", "0.3", "-l", "0.0"])
        .arg("--config")
        .arg(&config)
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("Power = 4nW\n"));
}

#[test]
fn test_check_lists_tables() {
    let lib = write_library();
    let output = cellpower().arg("check").arg(lib.path()).output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(
        stdout,
        "BUF_X1 Y <- A rise: input_transition_time (ok)\n\
         BUF_X1 Y <- A fall: input_transition_time (ok)\n"
    );
}

#[test]
fn test_missing_library_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = cellpower()
        .arg("check")
        .arg(dir.path().join("missing.lib"))
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Failed to load library"));
}
