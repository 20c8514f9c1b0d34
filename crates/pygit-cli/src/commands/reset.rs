use anyhow::Result;
use clap::Args;
use pygit_repository::{reset, ResetMode};

use super::open_repo;
use crate::Cli;

#[derive(Args)]
pub struct ResetArgs {
    /// Commit to reset the current branch to
    target: String,

    /// Move HEAD only
    #[arg(long, conflicts_with_all = ["mixed", "hard"])]
    soft: bool,

    /// Move HEAD and reset the index (default)
    #[arg(long, conflicts_with_all = ["soft", "hard"])]
    mixed: bool,

    /// Move HEAD, reset the index, and overwrite the working tree
    #[arg(long, conflicts_with_all = ["soft", "mixed"])]
    hard: bool,
}

pub fn run(args: &ResetArgs, cli: &Cli) -> Result<i32> {
    let mut repo = open_repo(cli)?;
    let mode = if args.soft {
        ResetMode::Soft
    } else if args.hard {
        ResetMode::Hard
    } else {
        ResetMode::Mixed
    };

    let oid = reset(&mut repo, &args.target, mode)?;
    println!("HEAD is now at {}", &oid.to_hex()[..7]);
    Ok(0)
}
