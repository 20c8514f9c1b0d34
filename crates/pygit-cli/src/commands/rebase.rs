use anyhow::Result;
use clap::Args;
use pygit_repository::{rebase_abort, rebase_continue, rebase_start, RebaseOutcome};

use super::open_repo;
use crate::Cli;

#[derive(Args)]
pub struct RebaseArgs {
    /// New base to replay the current branch's commits onto
    target: Option<String>,

    /// Resume a paused rebase after resolving conflicts
    #[arg(long)]
    r#continue: bool,

    /// Abort an in-progress rebase, restoring the original branch tip
    #[arg(long)]
    abort: bool,
}

pub fn run(args: &RebaseArgs, cli: &Cli) -> Result<i32> {
    let mut repo = open_repo(cli)?;

    if args.abort {
        rebase_abort(&mut repo)?;
        println!("Rebase aborted.");
        return Ok(0);
    }

    let outcome = if args.r#continue {
        rebase_continue(&mut repo)?
    } else {
        let target = args.target.as_deref().ok_or_else(|| anyhow::anyhow!("a rebase target is required"))?;
        rebase_start(&mut repo, target)?
    };

    report(outcome)
}

fn report(outcome: RebaseOutcome) -> Result<i32> {
    match outcome {
        RebaseOutcome::UpToDate => {
            println!("Current branch is up to date.");
            Ok(0)
        }
        RebaseOutcome::Done { oid } => {
            println!("Successfully rebased onto {}", &oid.to_hex()[..7]);
            Ok(0)
        }
        RebaseOutcome::Conflicted { commit, conflict_count } => {
            println!(
                "could not apply {}: {conflict_count} conflict(s); fix them and run `rebase --continue`",
                &commit.to_hex()[..7]
            );
            Ok(1)
        }
    }
}
