use anyhow::{Context, Result};
use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Path of the compiled inventory binary under test.
pub fn inventory_binary() -> &'static str {
    env!("CARGO_BIN_EXE_tf-ansible-inventory")
}

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn fixture_bytes(name: &str) -> Vec<u8> {
    let path = fixture_path(name);
    fs::read(&path).unwrap_or_else(|err| panic!("unable to read {}: {err}", path.display()))
}

/// Create a scratch state directory whose fake `terraform` prints `payload`
/// for `state pull`.
pub fn fake_state_dir(payload: &[u8]) -> Result<TempDir> {
    let dir = TempDir::new().context("failed to allocate state dir")?;
    let payload_path = dir.path().join("pulled.tfstate");
    fs::write(&payload_path, payload).context("failed to write state payload")?;
    install_fake_provider(
        dir.path(),
        "terraform",
        &format!("#!/bin/sh\nexec cat \"{}\"\n", payload_path.display()),
    )?;
    Ok(dir)
}

/// Create a scratch state directory whose fake `terraform` exits non-zero.
pub fn failing_state_dir(message: &str) -> Result<TempDir> {
    let dir = TempDir::new().context("failed to allocate state dir")?;
    install_fake_provider(
        dir.path(),
        "terraform",
        &format!("#!/bin/sh\necho \"{message}\" >&2\nexit 1\n"),
    )?;
    Ok(dir)
}

/// Drop an executable provider script named `program` into `dir`.
pub fn install_fake_provider(dir: &Path, program: &str, script: &str) -> Result<()> {
    let path = dir.join(program);
    fs::write(&path, script)
        .with_context(|| format!("failed to write fake provider {}", path.display()))?;
    make_executable(&path)
}

pub fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)
        .with_context(|| format!("missing fake provider {}", path.display()))?
        .permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms)
        .with_context(|| format!("failed to mark {} executable", path.display()))
}

/// Run the inventory binary with the given args against a fake state dir.
///
/// The fake provider is found by prepending the state dir to PATH; TF_STATE
/// points the pull at the same directory.
pub fn run_inventory(state_dir: &Path, args: &[&str]) -> Result<Output> {
    let output = Command::new(inventory_binary())
        .args(args)
        .env("TF_STATE", state_dir)
        .env("PATH", prepend_path(state_dir)?)
        .env_remove("TF_TERRAGRUNT")
        .output()
        .context("failed to run tf-ansible-inventory")?;
    Ok(output)
}

pub fn run_list(state_dir: &Path) -> Result<Output> {
    run_inventory(state_dir, &["--list"])
}

pub fn prepend_path(dir: &Path) -> Result<OsString> {
    let current = env::var_os("PATH").unwrap_or_default();
    let mut paths = vec![dir.to_path_buf()];
    paths.extend(env::split_paths(&current));
    env::join_paths(paths).context("unable to rebuild PATH")
}
