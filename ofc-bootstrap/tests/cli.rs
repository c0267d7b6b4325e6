//! Exit-code behavior of the ofc-bootstrap binary

use assert_cmd::Command;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn bin() -> Command {
    let mut cmd = Command::cargo_bin("ofc-bootstrap").unwrap();
    cmd.env_remove("OFC_BOOTSTRAP_YAML");
    cmd
}

fn stdout_of(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[cfg(unix)]
fn write_script(path: &Path, body: &str) {
    use std::os::unix::fs::PermissionsExt;

    fs::write(path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

/// Workspace with install scripts, an optional stack template and settings
#[cfg(unix)]
fn kubernetes_workspace(with_stack_template: bool) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let scripts = dir.path().join("scripts");
    let templates = dir.path().join("templates");
    fs::create_dir_all(&scripts).unwrap();
    fs::create_dir_all(&templates).unwrap();

    write_script(&scripts.join("create-namespaces.sh"), "echo namespaces");
    write_script(&scripts.join("install-certmanager.sh"), "echo cert-manager >&2; exit 1");
    write_script(&scripts.join("install-openfaas.sh"), "echo openfaas");
    if with_stack_template {
        fs::write(
            templates.join("stack.yml"),
            "provider:\n  gateway: https://gateway.{{ root_domain }}\n",
        )
        .unwrap();
    }

    fs::write(
        dir.path().join("settings.toml"),
        format!(
            "scripts_dir = \"{}\"\ntemplates_dir = \"{}\"\noutput_dir = \"{}\"\nstep_timeout_secs = 30\n",
            scripts.display(),
            templates.display(),
            dir.path().join("tmp").display()
        ),
    )
    .unwrap();
    fs::write(
        dir.path().join("plan.yml"),
        "orchestration: kubernetes\nroot_domain: o6s.io\nsecrets: []\n",
    )
    .unwrap();

    dir
}

#[test]
fn test_missing_yaml_flag_exits_one() {
    let output = bin().output().unwrap();
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_help_exits_zero() {
    let output = bin().arg("--help").output().unwrap();
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout_of(&output).contains("--yaml"));
}

#[test]
fn test_unreadable_plan_exits_one() {
    let output = bin()
        .args(["--yaml", "/nonexistent/plan.yml"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to read plan"));
}

#[test]
fn test_unparseable_plan_exits_one() {
    let dir = tempfile::tempdir().unwrap();
    let plan = dir.path().join("plan.yml");
    fs::write(&plan, "orchestration: nomad\n").unwrap();

    let output = bin().arg("--yaml").arg(&plan).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_swarm_plan_without_secrets_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let plan = dir.path().join("plan.yml");
    fs::write(&plan, "orchestration: swarm\nsecrets: []\n").unwrap();

    let output = bin().arg("--yaml").arg(&plan).output().unwrap();

    assert_eq!(output.status.code(), Some(0));
    let stdout = stdout_of(&output);
    assert!(stdout.contains("Plan loaded from"));
    assert!(stdout.contains("Plan completed in"));
}

#[cfg(unix)]
#[test]
fn test_kubernetes_run_continues_past_best_effort_failures() {
    let dir = kubernetes_workspace(true);
    let report = dir.path().join("out/report.toml");

    let output = bin()
        .current_dir(dir.path())
        .arg("--yaml")
        .arg(dir.path().join("plan.yml"))
        .arg("--config")
        .arg(dir.path().join("settings.toml"))
        .arg("--report")
        .arg(&report)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0), "{}", stdout_of(&output));

    let stack = fs::read_to_string(dir.path().join("tmp/stack.yml")).unwrap();
    assert!(stack.contains("https://gateway.o6s.io"));

    let report = fs::read_to_string(report).unwrap();
    assert!(report.contains("success = true"));
    assert!(report.contains("step = \"install-cert-manager\""));
    assert!(report.contains("status = \"failed\""));
}

#[cfg(unix)]
#[test]
fn test_kubernetes_stack_failure_exits_one_with_elapsed_time() {
    let dir = kubernetes_workspace(false);

    let output = bin()
        .current_dir(dir.path())
        .arg("--yaml")
        .arg(dir.path().join("plan.yml"))
        .arg("--config")
        .arg(dir.path().join("settings.toml"))
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stdout = stdout_of(&output);
    assert!(stdout.contains("Plan failed after"), "{stdout}");
    assert!(stdout.contains("stack apply failed"), "{stdout}");
}
