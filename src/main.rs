use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use bundlecheck::bundle::{self, CONFIG_FILE, RUNTIME_FILE};
use bundlecheck::descriptor::Target;
use bundlecheck::policy::ValidationPolicy;
use bundlecheck::{report, Outcome};

#[derive(Parser)]
#[command(
    name = "bundlecheck",
    about = "Validates that a container bundle is a standard container",
    version
)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,

    /// Policy JSON relaxing the platform checks (defaults to the full checks)
    #[arg(long, global = true)]
    policy: Option<PathBuf>,

    /// Also write a JSON report to this file
    #[arg(long, global = true)]
    report: Option<PathBuf>,

    /// Log each validation stage to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Cmd {
    /// Validate config.json, runtime.json and the files in the rootfs
    #[command(visible_alias = "vb")]
    Bundle {
        /// Bundle directory
        path: PathBuf,
    },

    /// Validate config.json only
    #[command(visible_alias = "vc")]
    Config { path: PathBuf },

    /// Validate runtime.json only
    #[command(visible_alias = "vr")]
    Runtime {
        path: PathBuf,

        /// Platform the runtime descriptor targets
        #[arg(long, default_value = "linux")]
        os: String,

        /// Root filesystem used to look up the AppArmor profile
        #[arg(long)]
        rootfs: Option<PathBuf>,
    },

    /// Validate a container's state.json
    #[command(visible_alias = "vs")]
    State { path: PathBuf },
}

/// What was validated, for the printed verdict and the report.
struct Checked {
    subject: &'static str,
    path: PathBuf,
    target: Option<Target>,
    descriptors: Vec<PathBuf>,
    outcome: Outcome,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "bundlecheck=debug" } else { "bundlecheck=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let checked = run(cli.cmd, cli.policy.as_deref())?;

    if checked.outcome.passed {
        println!("The {} is valid!", checked.subject);
    } else {
        println!("The {} is not valid, details errors:", checked.subject);
        for msg in &checked.outcome.messages {
            println!("{msg}");
        }
    }

    if let Some(dest) = &cli.report {
        let descriptors: Vec<&Path> = checked.descriptors.iter().map(PathBuf::as_path).collect();
        let r = report::build_report(
            checked.subject,
            &checked.path,
            checked.target,
            &checked.outcome,
            &descriptors,
        )?;
        report::write_report(dest, &r)?;
    }

    if !checked.outcome.passed {
        return Err(anyhow!(
            "{} validation failed with {} error(s)",
            checked.subject,
            checked.outcome.messages.len()
        ));
    }
    Ok(())
}

fn run(cmd: Cmd, policy_path: Option<&Path>) -> Result<Checked> {
    match cmd {
        Cmd::Bundle { path } => {
            let policy = ValidationPolicy::load(policy_path)?;
            let outcome = bundle::validate_bundle(&path, &policy);
            Ok(Checked {
                subject: "bundle",
                target: bundle::detect_os(&path),
                descriptors: vec![path.join(CONFIG_FILE), path.join(RUNTIME_FILE)],
                path,
                outcome,
            })
        }
        Cmd::Config { path } => {
            let policy = ValidationPolicy::load(policy_path)?;
            let outcome = bundle::validate_config(&path, &policy);
            Ok(Checked {
                subject: CONFIG_FILE,
                target: bundle::detect_os(&path),
                descriptors: vec![path.clone()],
                path,
                outcome,
            })
        }
        Cmd::Runtime { path, os, rootfs } => {
            let policy = ValidationPolicy::load(policy_path)?;
            let outcome = bundle::validate_runtime(&path, &os, rootfs.as_deref(), &policy);
            Ok(Checked {
                subject: RUNTIME_FILE,
                target: Target::from_os(&os),
                descriptors: vec![path.clone()],
                path,
                outcome,
            })
        }
        Cmd::State { path } => {
            let outcome = bundle::validate_state(&path);
            Ok(Checked {
                subject: "state.json",
                target: None,
                descriptors: vec![path.clone()],
                path,
                outcome,
            })
        }
    }
}
