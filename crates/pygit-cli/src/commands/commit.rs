use anyhow::Result;
use clap::Args;
use pygit_repository::CommitOptions;

use super::open_repo;
use crate::Cli;

#[derive(Args)]
pub struct CommitArgs {
    /// Commit message
    #[arg(short = 'm', long = "message", required = true)]
    message: String,

    /// Allow a commit whose tree is identical to its parent's
    #[arg(long)]
    allow_empty: bool,
}

pub fn run(args: &CommitArgs, cli: &Cli) -> Result<i32> {
    let mut repo = open_repo(cli)?;
    let options = CommitOptions { allow_empty: args.allow_empty };
    let summary = pygit_repository::commit(&mut repo, args.message.clone(), &options)?;

    let branch = repo.current_branch()?.unwrap_or_else(|| "HEAD".to_string());
    println!("[{branch} {}] {}", &summary.oid.to_hex()[..7], args.message.lines().next().unwrap_or(""));
    Ok(0)
}
