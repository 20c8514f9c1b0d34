use anyhow::Result;
use clap::{Args, Subcommand};
use pygit_repository::{stash_list, stash_pop, stash_push};

use super::open_repo;
use crate::Cli;

#[derive(Args)]
pub struct StashArgs {
    #[command(subcommand)]
    action: Option<StashAction>,
}

#[derive(Subcommand)]
enum StashAction {
    /// Save local modifications and revert the working tree to HEAD
    Push {
        #[arg(short = 'm', long = "message")]
        message: Option<String>,
    },
    /// List stash entries
    List,
    /// Restore the most recent stash and remove it from the list
    Pop,
}

pub fn run(args: &StashArgs, cli: &Cli) -> Result<i32> {
    let mut repo = open_repo(cli)?;

    let default_action = StashAction::Push { message: None };
    match args.action.as_ref().unwrap_or(&default_action) {
        StashAction::Push { message } => {
            let entry = stash_push(&mut repo, message.clone())?;
            println!("Saved working directory and index state: {}", &entry.oid.to_hex()[..7]);
        }
        StashAction::List => {
            for (i, entry) in stash_list(&repo)?.into_iter().enumerate() {
                println!("stash@{{{i}}}: {}", entry.message.trim_end());
            }
        }
        StashAction::Pop => {
            let entry = stash_pop(&mut repo)?;
            println!("Dropped stash@{{0}} ({})", &entry.oid.to_hex()[..7]);
        }
    }
    Ok(0)
}
