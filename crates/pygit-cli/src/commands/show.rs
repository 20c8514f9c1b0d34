use anyhow::Result;
use bstr::ByteSlice;
use clap::Args;
use pygit_object::Object;
use pygit_utils::date::DateFormat;

use super::open_repo;
use crate::Cli;

#[derive(Args)]
pub struct ShowArgs {
    /// Object to show (commit, tag, tree, or blob)
    #[arg(default_value = "HEAD")]
    object: String,
}

pub fn run(args: &ShowArgs, cli: &Cli) -> Result<i32> {
    let repo = open_repo(cli)?;
    let oid = repo.resolve(&args.object)?;
    let object = repo.odb().read(&oid)?.ok_or_else(|| anyhow::anyhow!("object {} not found", oid.to_hex()))?;

    match object {
        Object::Commit(commit) => {
            println!("commit {}", oid.to_hex());
            if commit.parents.len() > 1 {
                let parents: Vec<String> = commit.parents.iter().map(|p| p.to_hex()[..7].to_string()).collect();
                println!("Merge: {}", parents.join(" "));
            }
            println!("Author: {} <{}>", commit.author.name, commit.author.email);
            println!("Date:   {}", commit.author.date.format(DateFormat::Default));
            println!();
            for line in commit.message.lines() {
                println!("    {}", line.to_str_lossy());
            }
        }
        Object::Tag(tag) => {
            println!("tag {}", tag.tag_name);
            if let Some(tagger) = &tag.tagger {
                println!("Tagger: {} <{}>", tagger.name, tagger.email);
                println!("Date:   {}", tagger.date.format(DateFormat::Default));
            }
            println!();
            for line in tag.message.lines() {
                println!("{}", line.to_str_lossy());
            }
            println!("\ncommit {}", tag.target.to_hex());
        }
        Object::Tree(tree) => {
            for entry in &tree.entries {
                println!("{:06o} {}\t{}", entry.mode.raw(), entry.oid.to_hex(), entry.name);
            }
        }
        Object::Blob(blob) => {
            use std::io::Write;
            std::io::stdout().write_all(&blob.data)?;
        }
    }
    Ok(0)
}
