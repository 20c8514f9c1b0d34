use anyhow::Result;
use clap::Args;
use pygit_repository::{clean_worktree, CleanOptions};

use super::open_repo;
use crate::Cli;

#[derive(Args)]
pub struct CleanArgs {
    /// Show what would be removed, without removing it
    #[arg(short = 'n', long = "dry-run")]
    dry_run: bool,

    /// Actually remove the files
    #[arg(short, long)]
    force: bool,

    /// Remove whole untracked directories too
    #[arg(short = 'd')]
    directories: bool,
}

pub fn run(args: &CleanArgs, cli: &Cli) -> Result<i32> {
    if !args.dry_run && !args.force {
        anyhow::bail!("clean.requireForce defaults to true; pass -n or -f");
    }

    let mut repo = open_repo(cli)?;
    let options = CleanOptions { dry_run: args.dry_run, include_directories: args.directories };
    let outcome = clean_worktree(&mut repo, &options)?;

    for path in &outcome.removed {
        if args.dry_run {
            println!("Would remove {path}");
        } else {
            println!("Removing {path}");
        }
    }
    Ok(0)
}
