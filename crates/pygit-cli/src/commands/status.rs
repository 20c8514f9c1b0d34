use anyhow::Result;
use clap::Args;
use pygit_repository::{status, WorktreeStatus};

use super::open_repo;
use crate::Cli;

#[derive(Args, Default)]
pub struct StatusArgs {
    /// Give the output in the short-format
    #[arg(short, long)]
    short: bool,
}

pub fn run(args: &StatusArgs, cli: &Cli) -> Result<i32> {
    let mut repo = open_repo(cli)?;
    let report = status(&mut repo)?;

    if args.short {
        for entry in &report.staged {
            println!("{} {}", entry.status.as_char(), entry.path);
        }
        for entry in &report.unstaged {
            println!(" {} {}", entry.status.as_char(), entry.path);
        }
        for path in &report.untracked {
            println!("?? {path}");
        }
        return Ok(0);
    }

    match &report.branch {
        WorktreeStatus::Branch(name) => println!("On branch {name}"),
        WorktreeStatus::Unborn(name) => println!("On branch {name}\n\nNo commits yet"),
        WorktreeStatus::Detached(oid) => println!("HEAD detached at {}", &oid[..7.min(oid.len())]),
    }

    if report.merge_in_progress {
        println!("\nYou have unmerged paths.");
    }
    if report.rebase_in_progress {
        println!("\ninteractive rebase in progress; onto branch");
    }

    if !report.staged.is_empty() {
        println!("\nChanges to be committed:");
        for entry in &report.staged {
            println!("\t{}:   {}", status_word(entry.status), entry.path);
        }
    }

    if !report.unstaged.is_empty() {
        println!("\nChanges not staged for commit:");
        for entry in &report.unstaged {
            println!("\t{}:   {}", status_word(entry.status), entry.path);
        }
    }

    if !report.untracked.is_empty() {
        println!("\nUntracked files:");
        for path in &report.untracked {
            println!("\t{path}");
        }
    }

    if report.is_clean() {
        println!("\nnothing to commit, working tree clean");
    }

    Ok(0)
}

fn status_word(status: pygit_diff::FileStatus) -> &'static str {
    match status {
        pygit_diff::FileStatus::Added => "new file",
        pygit_diff::FileStatus::Deleted => "deleted",
        pygit_diff::FileStatus::Modified => "modified",
    }
}
