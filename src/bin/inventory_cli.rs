//! Ansible dynamic-inventory entry point.
//!
//! Keeps the inventory-script surface (`--list`) stable while resolving the
//! ambient configuration (`TF_STATE`, `TF_TERRAGRUNT`) up front and threading
//! it into the library as plain values. Stdout carries nothing but the
//! inventory document; every diagnostic goes to stderr.

use anyhow::{Context, Result, bail};
use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;
use std::process::exit;
use tf_ansible_inventory::{StateCommand, build_inventory, decode_state, pull_state};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:#}");
        exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse()?;
    if !cli.list {
        return Ok(());
    }

    let dir = state_dir(env::var_os("TF_STATE"));
    let path = fs::canonicalize(&dir)
        .with_context(|| format!("Error determining directory: {}", dir.display()))?;
    if !path.is_dir() {
        bail!("Invalid directory: {}", dir.display());
    }

    let terragrunt = env::var("TF_TERRAGRUNT").ok();
    let command = StateCommand::from_override(terragrunt.as_deref());

    let bytes = pull_state(command, &path)?;
    match decode_state(&bytes)? {
        None => {
            // Distinguished "nothing to report" outcome, not an error: no
            // document is emitted and the run still succeeds.
            eprintln!("No state was found");
            Ok(())
        }
        Some(state) => {
            let inventory = build_inventory(&state)?;
            println!("{}", inventory.to_json()?);
            Ok(())
        }
    }
}

struct Cli {
    list: bool,
}

impl Cli {
    fn parse() -> Result<Self> {
        let mut list = false;
        for arg in env::args_os().skip(1) {
            let Some(flag) = arg.to_str() else {
                bail!("Invalid UTF-8 in command flag");
            };
            match flag {
                "--list" | "-l" => list = true,
                "--help" | "-h" => usage(0),
                _ => usage(1),
            }
        }
        Ok(Self { list })
    }
}

fn usage(code: i32) -> ! {
    let text = "\
Usage: tf-ansible-inventory --list

  --list, -l   pull state and emit the inventory document on stdout
  --help, -h   show this message

Environment:
  TF_STATE       directory to pull state from (default \".\")
  TF_TERRAGRUNT  when non-empty, pull state with terragrunt instead of terraform
";
    if code == 0 {
        print!("{text}");
    } else {
        eprint!("{text}");
    }
    exit(code);
}

fn state_dir(setting: Option<OsString>) -> PathBuf {
    match setting {
        Some(value) if !value.is_empty() => PathBuf::from(value),
        _ => PathBuf::from("."),
    }
}
