use anyhow::Result;
use clap::Args;
use pygit_ref::{RefName, RefStore};
use pygit_repository::{branch_create, checkout_branch, checkout_detached};

use super::open_repo;
use crate::Cli;

#[derive(Args)]
pub struct CheckoutArgs {
    /// Branch, tag, or commit to check out
    target: String,

    /// Create a new branch named <new-branch> at <target> and check it out
    #[arg(short = 'b', value_name = "new-branch")]
    new_branch: Option<String>,
}

pub fn run(args: &CheckoutArgs, cli: &Cli) -> Result<i32> {
    let mut repo = open_repo(cli)?;

    if let Some(new_branch) = &args.new_branch {
        branch_create(&repo, new_branch, Some(&args.target))?;
        checkout_branch(&mut repo, new_branch)?;
        println!("Switched to a new branch '{new_branch}'");
        return Ok(0);
    }

    let branch_ref = RefName::new(format!("refs/heads/{}", args.target))?;
    if repo.refs().resolve_to_oid(&branch_ref)?.is_some() {
        checkout_branch(&mut repo, &args.target)?;
        println!("Switched to branch '{}'", args.target);
    } else {
        let oid = repo.resolve(&args.target)?;
        checkout_detached(&mut repo, &oid)?;
        println!("HEAD is now at {}", &oid.to_hex()[..7]);
    }
    Ok(0)
}
