//! Run command implementation
//!
//! Reads the invocation file and runs every listed step against one staged
//! tree over the workspace directory. Nothing is written unless every step
//! succeeds.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use treegen::config::{self, DEFAULT_CONFIG_FILE};
use treegen::output::{emoji, OutputConfig};
use treegen::phases::RunOptions;
use treegen::suggestions;

use super::{run_invocations, workspace_root};

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the invocation file (defaults to <root>/.treegen.yaml)
    #[arg(short, long, value_name = "PATH", env = "TREEGEN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Workspace directory (defaults to current directory)
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// List the changes without writing them or running tasks
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Do not format changed files
    #[arg(long)]
    pub skip_format: bool,

    /// Write the changes but do not run deferred tasks such as package installs
    #[arg(long)]
    pub skip_tasks: bool,
}

/// Execute the run command
pub fn execute(args: RunArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let root = workspace_root(args.root)?;
    let config_path = args.config.unwrap_or_else(|| root.join(DEFAULT_CONFIG_FILE));

    if !config_path.exists() {
        return Err(suggestions::config_not_found(&config_path));
    }

    let invocations = config::from_file(&config_path)?;
    println!(
        "{} Running {} step(s) from {}",
        emoji(&out, "🛠️", "[GEN]"),
        invocations.len(),
        config_path.display()
    );

    let options = RunOptions {
        dry_run: args.dry_run,
        skip_format: args.skip_format,
        skip_tasks: args.skip_tasks,
    };
    run_invocations(&root, &invocations, &options, &out)
}
