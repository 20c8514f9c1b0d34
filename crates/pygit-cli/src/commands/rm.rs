use anyhow::{bail, Result};
use bstr::ByteSlice;
use clap::Args;

use super::open_repo;
use crate::Cli;

#[derive(Args)]
pub struct RmArgs {
    /// Tracked paths to remove
    #[arg(required = true)]
    paths: Vec<String>,

    /// Remove from the index only, leave the working tree file in place
    #[arg(long)]
    cached: bool,
}

pub fn run(args: &RmArgs, cli: &Cli) -> Result<i32> {
    let mut repo = open_repo(cli)?;
    let work_tree = repo.require_work_tree()?.to_path_buf();

    for path in &args.paths {
        if repo.index()?.get(path.as_bytes().as_bstr()).is_none() {
            bail!("pathspec '{path}' did not match any tracked files");
        }
    }

    for path in &args.paths {
        repo.index_mut()?.stage_deletion(path.clone());
        if !args.cached {
            let fs_path = work_tree.join(path);
            if fs_path.exists() {
                std::fs::remove_file(&fs_path)?;
            }
        }
        println!("rm '{path}'");
    }

    repo.write_index()?;
    Ok(0)
}
