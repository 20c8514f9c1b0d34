use anyhow::Result;
use clap::Args;
use pygit_repository::{merge_branch, MergeOutcome};

use super::open_repo;
use crate::Cli;

#[derive(Args)]
pub struct MergeArgs {
    /// Branch or commit to merge into the current branch
    theirs: String,
}

pub fn run(args: &MergeArgs, cli: &Cli) -> Result<i32> {
    let mut repo = open_repo(cli)?;
    match merge_branch(&mut repo, &args.theirs)? {
        MergeOutcome::AlreadyUpToDate => {
            println!("Already up to date.");
            Ok(0)
        }
        MergeOutcome::FastForward { oid } => {
            println!("Fast-forward to {}", &oid.to_hex()[..7]);
            Ok(0)
        }
        MergeOutcome::Merged { oid } => {
            println!("Merge made by the three-way merge strategy, {}", &oid.to_hex()[..7]);
            Ok(0)
        }
        MergeOutcome::Conflicted { conflict_count } => {
            println!("Automatic merge failed; fix conflicts in {conflict_count} file(s) and commit the result.");
            Ok(1)
        }
    }
}
