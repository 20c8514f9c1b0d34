use anyhow::Result;
use bstr::ByteSlice;
use clap::Args;
use pygit_revwalk::{FirstParentWalk, WalkOptions};
use pygit_utils::date::DateFormat;

use super::open_repo;
use crate::Cli;

#[derive(Args)]
pub struct LogArgs {
    /// Limit the number of commits shown
    #[arg(short = 'n', value_name = "N")]
    max_count: Option<usize>,
}

pub fn run(args: &LogArgs, cli: &Cli) -> Result<i32> {
    let repo = open_repo(cli)?;

    let Some(head) = repo.head_oid()? else {
        return Ok(0);
    };

    let options = WalkOptions { max_count: args.max_count };
    let walk = FirstParentWalk::new(repo.odb(), head, options);

    for entry in walk {
        let (oid, commit) = entry?;
        println!("commit {}", oid.to_hex());
        if commit.parents.len() > 1 {
            let parents: Vec<String> =
                commit.parents.iter().map(|p| p.to_hex()[..7].to_string()).collect();
            println!("Merge: {}", parents.join(" "));
        }
        println!("Author: {} <{}>", commit.author.name, commit.author.email);
        println!("Date:   {}", commit.author.date.format(DateFormat::Default));
        println!();
        for line in commit.message.lines() {
            println!("    {}", line.to_str_lossy());
        }
        println!();
    }

    Ok(0)
}
