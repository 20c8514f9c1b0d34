use anyhow::Result;
use clap::Args;
use pygit_diff::{format_unified, worktree, DiffOptions};
use pygit_object::Object;

use super::open_repo;
use crate::Cli;

#[derive(Args)]
pub struct DiffArgs {
    /// Show the diff between HEAD and the index instead of the index and the working tree
    #[arg(long)]
    staged: bool,
}

pub fn run(args: &DiffArgs, cli: &Cli) -> Result<i32> {
    let mut repo = open_repo(cli)?;
    let options = DiffOptions::default();

    let result = if args.staged {
        let head_tree = match repo.head_oid()? {
            Some(oid) => match repo.odb().read(&oid)? {
                Some(Object::Commit(commit)) => Some(commit.tree),
                _ => anyhow::bail!("HEAD does not point at a commit"),
            },
            None => None,
        };
        worktree::diff_head_to_index(repo.odb(), head_tree.as_ref(), repo.index()?, &options)?
    } else {
        let work_tree = repo.require_work_tree()?.to_path_buf();
        let index = repo.index()?.clone();
        worktree::diff_index_to_worktree(repo.odb(), &index, &work_tree, &options)?
    };

    print!("{}", format_unified(&result, &options));
    Ok(0)
}
