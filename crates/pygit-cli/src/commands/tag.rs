use anyhow::Result;
use clap::Args;
use pygit_repository::{tag_create, tag_list};

use super::open_repo;
use crate::Cli;

#[derive(Args)]
pub struct TagArgs {
    /// Name of the tag to create
    name: Option<String>,

    /// Object to tag (defaults to HEAD)
    target: Option<String>,

    /// Annotated tag message
    #[arg(short = 'm', long = "message")]
    message: Option<String>,
}

pub fn run(args: &TagArgs, cli: &Cli) -> Result<i32> {
    let repo = open_repo(cli)?;

    if let Some(name) = &args.name {
        tag_create(&repo, name, args.target.as_deref(), args.message.clone())?;
        return Ok(0);
    }

    for tag in tag_list(&repo)? {
        println!("{}", tag.name);
    }
    Ok(0)
}
