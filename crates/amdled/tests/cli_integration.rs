//! Integration tests for the `amdled` binary.
//!
//! Every test passes `--config` pointing into a temp dir so results do not
//! depend on the host's DMI data or a user config file.

use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

fn cli() -> assert_cmd::Command {
    cargo_bin_cmd!("amdled")
}

/// Write `contents` as the config file in `dir` and return its path.
fn write_config(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("config.toml");
    std::fs::write(&path, contents).unwrap();
    path
}

fn stdout_json(cmd: &mut assert_cmd::Command) -> serde_json::Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).expect("--json should produce valid JSON")
}

#[test]
fn cli_help_succeeds() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("amdled"));
}

#[test]
fn cli_version_prints_version() {
    cli()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn cli_set_help_lists_patterns() {
    cli()
        .args(["set", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("failed-drive"));
}

// ── config ──

#[test]
fn cli_config_json_produces_valid_json() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "product_name = \"DAYTONA_X\"\n");
    let json = stdout_json(cli().arg("--config").arg(&config).args(["--json", "config"]));

    assert!(json["settings"].is_object());
    assert_eq!(json["config_file_exists"], true);
    assert_eq!(json["settings"]["product_name"], "DAYTONA_X");
    assert_eq!(json["errors"].as_array().unwrap().len(), 0);
}

#[test]
fn cli_config_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    cli()
        .arg("--config")
        .arg(dir.path().join("absent.toml"))
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("not found, using defaults"));
}

#[test]
fn cli_config_lists_validation_problems() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "max_scan_depth = 0\n");
    cli()
        .arg("--config")
        .arg(&config)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("max_scan_depth must be at least 1"));
}

#[test]
fn cli_invalid_config_rejected_for_commands() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "[ipmi]\ntool = \"\"\n");
    cli()
        .arg("--config")
        .arg(&config)
        .arg("platform")
        .assert()
        .failure()
        .stderr(predicate::str::contains("ipmi.tool cannot be empty"));
}

// ── --verbose flag ──

#[test]
fn cli_verbose_flag_accepted() {
    let dir = tempfile::tempdir().unwrap();
    cli()
        .arg("--config")
        .arg(dir.path().join("config.toml"))
        .args(["-v", "config"])
        .assert()
        .success();
}

// ── platform ──

#[test]
fn cli_platform_uses_configured_product() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "product_name = \"DAYTONA_X\"\n");
    let json = stdout_json(cli().arg("--config").arg(&config).args(["--json", "platform"]));

    assert_eq!(json["product_name"], "DAYTONA_X");
    assert_eq!(json["interface"], "ipmi");
    assert_eq!(json["platform"], "daytona_x");
    assert_eq!(json["channel"], 0x17);
    assert_eq!(json["nvme_port_offset"], 2);
}

#[test]
fn cli_platform_unknown_product_is_sgpio() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "product_name = \"SOME_OTHER_BOARD\"\n");
    let json = stdout_json(cli().arg("--config").arg(&config).args(["--json", "platform"]));

    assert_eq!(json["interface"], "sgpio");
    assert_eq!(json["platform"], "other");
    assert!(json["channel"].is_null());
}

// ── locate ──

#[test]
fn cli_locate_sata_from_path() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "product_name = \"ETHANOL_X\"\n");
    let json = stdout_json(
        cli()
            .arg("--config")
            .arg(&config)
            .args(["--json", "locate", "/nonexistent/pci0000:00/ata5/host4"]),
    );

    assert_eq!(json["platform"], "ethanol_x");
    assert_eq!(json["drive"]["port"], 5);
    assert_eq!(json["drive"]["drive_bay"], 16);
    assert_eq!(json["drive"]["kind"], "sata");
    assert_eq!(json["channel"], 0x0d);
    assert_eq!(json["slave_address"], 0xc0);
    assert_eq!(json["register_mask"], 16);
}

#[test]
fn cli_locate_nvme_through_slots() {
    let dir = tempfile::tempdir().unwrap();
    let cntrl = dir.path().join("devices/pci0000:e0/0000:e0:03.3");
    std::fs::create_dir_all(cntrl.join("0000:e3:00.0/nvme/nvme0")).unwrap();
    let slots = dir.path().join("slots");
    std::fs::create_dir_all(slots.join("19")).unwrap();
    std::fs::write(slots.join("19/address"), "0000:e3:00\n").unwrap();
    let config = write_config(
        dir.path(),
        &format!(
            "product_name = \"ETHANOL_X\"\n[sysfs]\npci_slots = \"{}\"\n",
            slots.display()
        ),
    );

    let json = stdout_json(
        cli()
            .arg("--config")
            .arg(&config)
            .args(["--json", "locate"])
            .arg(&cntrl),
    );
    assert_eq!(json["drive"]["kind"], "nvme");
    assert_eq!(json["drive"]["port"], 12);
    assert_eq!(json["drive"]["drive_bay"], 1 << 11);
    // Ethanol-X has a single chip: bay 12 has no LED bit to drive.
    assert!(json["register_mask"].is_null());
}

#[test]
fn cli_locate_rejects_bad_path() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "product_name = \"ETHANOL_X\"\n");
    cli()
        .arg("--config")
        .arg(&config)
        .args(["locate", "/nonexistent/pci0000:00/host0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid topology"));
}

// ── path ──

#[test]
fn cli_path_finds_em_buffer() {
    let dir = tempfile::tempdir().unwrap();
    let host = dir.path().join("0000:00:11.4/ata1/host0/scsi_host/host0");
    std::fs::create_dir_all(&host).unwrap();
    std::fs::write(host.join("em_buffer"), "").unwrap();
    let config = write_config(dir.path(), "product_name = \"GRANDSTAND\"\n");

    let json = stdout_json(
        cli()
            .arg("--config")
            .arg(&config)
            .args(["--json", "path"])
            .arg(dir.path().join("0000:00:11.4")),
    );
    assert_eq!(json["interface"], "sgpio");
    assert_eq!(
        json["led_path"],
        host.join("em_buffer").display().to_string()
    );
}

#[test]
fn cli_path_missing_em_buffer_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "product_name = \"GRANDSTAND\"\n");
    cli()
        .arg("--config")
        .arg(&config)
        .arg("path")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not found"));
}

#[test]
fn cli_path_ipmi_sata_key() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "product_name = \"DAYTONA_X\"\n");
    let json = stdout_json(cli().arg("--config").arg(&config).args([
        "--json",
        "path",
        "/nonexistent/pci0000:00/ata5/host4/target4:0:0",
        "--sysfs-path",
        "/sys/block/sdb",
    ]));
    assert_eq!(json["interface"], "ipmi");
    assert_eq!(json["led_path"], "/nonexistent/pci0000:00/ata5/");
}

// ── probe ──

#[test]
fn cli_probe_without_ipmitool_is_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        "product_name = \"ETHANOL_X\"\n[ipmi]\ntool = \"/nonexistent/ipmitool\"\n",
    );
    let json = stdout_json(cli().arg("--config").arg(&config).args(["--json", "probe"]));
    assert_eq!(json["interface"], "ipmi");
    assert_eq!(json["enabled"], false);
}

// ── set ──

#[test]
fn cli_set_without_ipmitool_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        "product_name = \"ETHANOL_X\"\n[ipmi]\ntool = \"/nonexistent/ipmitool\"\n",
    );
    cli()
        .arg("--config")
        .arg(&config)
        .args(["set", "/nonexistent/pci0000:00/ata5/host4", "locate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("IPMI transport unavailable"));
}

#[test]
fn cli_set_same_as_previous_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        "product_name = \"ETHANOL_X\"\n[ipmi]\ntool = \"/nonexistent/ipmitool\"\n",
    );
    cli()
        .arg("--config")
        .arg(&config)
        .args([
            "set",
            "/nonexistent/pci0000:00/ata5/host4",
            "rebuild",
            "--previous",
            "rebuild",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("rebuild applied"));
}

#[test]
fn cli_set_unmapped_pattern_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        "product_name = \"ETHANOL_X\"\n[ipmi]\ntool = \"/nonexistent/ipmitool\"\n",
    );
    cli()
        .arg("--config")
        .arg(&config)
        .args(["set", "/nonexistent/pci0000:00/ata5/host4", "degraded"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No LED register"));
}

#[test]
fn cli_set_sgpio_without_backend_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "product_name = \"GRANDSTAND\"\n");
    cli()
        .arg("--config")
        .arg(&config)
        .args(["set", "/nonexistent/pci0000:00/ata5/host4", "locate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not supported"));
}

#[test]
fn cli_set_rejects_unknown_pattern() {
    cli()
        .args(["set", "/sys/devices/pci0000:00/ata5/host4", "sparkle"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("sparkle"));
}
