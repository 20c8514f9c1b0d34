use std::fs;
use std::path::Path;

use crate::{DiscoveredRepo, InitOptions, RepoError, RepositoryKind};

/// Initialize a new repository.
///
/// Creates the standard `.pygit/` structure:
/// - HEAD (pointing to the default branch)
/// - config
/// - objects/
/// - refs/heads/
/// - refs/tags/
pub fn init_repository(path: &Path, options: &InitOptions) -> Result<DiscoveredRepo, RepoError> {
    let path = if path.is_relative() { std::env::current_dir()?.join(path) } else { path.to_path_buf() };

    let (git_dir, work_tree) =
        if options.bare { (path.clone(), None) } else { (path.join(".pygit"), Some(path.clone())) };

    // Re-running init on an existing repository is a safe no-op; we never
    // overwrite existing data.
    if git_dir.join("HEAD").is_file() {
        return Ok(DiscoveredRepo {
            git_dir,
            work_tree,
            kind: if options.bare { RepositoryKind::Bare } else { RepositoryKind::Normal },
        });
    }

    fs::create_dir_all(&git_dir)?;
    fs::create_dir_all(git_dir.join("objects"))?;
    fs::create_dir_all(git_dir.join("refs").join("heads"))?;
    fs::create_dir_all(git_dir.join("refs").join("tags"))?;

    let default_branch = options.default_branch.as_deref().unwrap_or("main");
    fs::write(git_dir.join("HEAD"), format!("ref: refs/heads/{default_branch}\n"))?;

    let config_content = if options.bare {
        "[core]\n\trepositoryformatversion = 0\n\tfilemode = true\n\tbare = true\n"
    } else {
        "[core]\n\trepositoryformatversion = 0\n\tfilemode = true\n\tbare = false\n"
    };
    fs::write(git_dir.join("config"), config_content)?;

    Ok(DiscoveredRepo {
        git_dir,
        work_tree,
        kind: if options.bare { RepositoryKind::Bare } else { RepositoryKind::Normal },
    })
}
