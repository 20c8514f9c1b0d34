use anyhow::Result;
use clap::Args;
use pygit_repository::{branch_create, branch_delete, BranchList};

use super::open_repo;
use crate::Cli;

#[derive(Args)]
pub struct BranchArgs {
    /// Name of the branch to create
    name: Option<String>,

    /// Commit to start the new branch at (defaults to HEAD)
    start_point: Option<String>,

    /// Delete a branch
    #[arg(short = 'd', long = "delete", value_name = "name")]
    delete: Option<String>,
}

pub fn run(args: &BranchArgs, cli: &Cli) -> Result<i32> {
    let repo = open_repo(cli)?;

    if let Some(name) = &args.delete {
        branch_delete(&repo, name)?;
        println!("Deleted branch {name}.");
        return Ok(0);
    }

    if let Some(name) = &args.name {
        branch_create(&repo, name, args.start_point.as_deref())?;
        return Ok(0);
    }

    let list = BranchList::list(&repo)?;
    for branch in &list.branches {
        let marker = if branch.is_current { "*" } else { " " };
        println!("{marker} {}", branch.name);
    }
    Ok(0)
}
