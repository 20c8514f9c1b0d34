use std::io::{self, Write};

use anyhow::{bail, Result};
use bstr::{BString, ByteSlice};
use clap::Args;
use pygit_index::StagedState;
use pygit_object::{FileMode, ObjectType};
use pygit_repository::IgnoreStack;

use super::open_repo;
use crate::Cli;

#[derive(Args)]
pub struct AddArgs {
    /// Paths to stage (files or directories)
    #[arg(required = true, value_name = "pathspec")]
    paths: Vec<String>,

    /// Be verbose
    #[arg(short, long)]
    verbose: bool,
}

pub fn run(args: &AddArgs, cli: &Cli) -> Result<i32> {
    let mut repo = open_repo(cli)?;
    let work_tree = repo.require_work_tree()?.to_path_buf();
    let ignores = IgnoreStack::for_directory(&work_tree, &work_tree);

    let stderr = io::stderr();
    let mut err_out = stderr.lock();

    let mut files = Vec::new();
    for path in &args.paths {
        let fs_path = work_tree.join(path);
        if !fs_path.exists() {
            bail!("pathspec '{path}' did not match any files");
        }
        collect_files(&fs_path, &work_tree, &ignores, &mut files)?;
    }

    for fs_path in &files {
        let rel = fs_path.strip_prefix(&work_tree).unwrap_or(fs_path);
        let rel_str = rel.to_string_lossy().replace('\\', "/");
        let content = std::fs::read(fs_path)?;
        let oid = repo.odb().write_raw(ObjectType::Blob, &content)?;
        let mode = file_mode(fs_path)?;
        let state = match repo.index()?.get(rel_str.as_bytes().as_bstr()) {
            Some(existing) if existing.oid == oid && existing.mode == mode => StagedState::Unchanged,
            _ => StagedState::Modified,
        };
        repo.index_mut()?.stage_file(BString::from(rel_str.clone()), oid, mode, state);
        if args.verbose {
            writeln!(err_out, "add '{rel_str}'")?;
        }
    }

    repo.write_index()?;
    Ok(0)
}

fn collect_files(
    path: &std::path::Path,
    work_tree: &std::path::Path,
    ignores: &IgnoreStack,
    out: &mut Vec<std::path::PathBuf>,
) -> Result<()> {
    if path.is_dir() {
        let mut entries: Vec<_> = std::fs::read_dir(path)?.filter_map(|e| e.ok()).collect();
        entries.sort_by_key(|e| e.file_name());
        for entry in entries {
            let child = entry.path();
            if child.file_name().map(|n| n == ".pygit").unwrap_or(false) {
                continue;
            }
            let rel = child.strip_prefix(work_tree).unwrap_or(&child);
            let rel_str = rel.to_string_lossy().replace('\\', "/");
            if ignores.is_ignored(&rel_str, child.is_dir()) {
                continue;
            }
            collect_files(&child, work_tree, ignores, out)?;
        }
    } else {
        out.push(path.to_path_buf());
    }
    Ok(())
}

fn file_mode(path: &std::path::Path) -> Result<FileMode> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let meta = std::fs::symlink_metadata(path)?;
        if meta.permissions().mode() & 0o111 != 0 {
            return Ok(FileMode::Executable);
        }
    }
    Ok(FileMode::Regular)
}
