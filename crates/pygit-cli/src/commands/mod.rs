pub mod add;
pub mod branch;
pub mod checkout;
pub mod clean;
pub mod commit;
pub mod config;
pub mod diff;
pub mod init;
pub mod log;
pub mod merge;
pub mod rebase;
pub mod reset;
pub mod rm;
pub mod show;
pub mod stash;
pub mod status;
pub mod tag;

use anyhow::Result;
use clap::Subcommand;

use crate::Cli;

#[derive(Subcommand)]
pub enum Commands {
    /// Create an empty repository or reinitialize an existing one
    Init(init::InitArgs),
    /// Add file contents to the index
    Add(add::AddArgs),
    /// Remove files from the working tree and from the index
    Rm(rm::RmArgs),
    /// Record changes to the repository
    Commit(commit::CommitArgs),
    /// Show commit logs
    Log(log::LogArgs),
    /// Show the working tree status
    Status(status::StatusArgs),
    /// Show changes between commits, commit and working tree, etc
    Diff(diff::DiffArgs),
    /// List, create, or delete branches
    Branch(branch::BranchArgs),
    /// Switch branches or restore working tree files
    Checkout(checkout::CheckoutArgs),
    /// Join two development histories together
    Merge(merge::MergeArgs),
    /// Reapply commits on top of another base tip
    Rebase(rebase::RebaseArgs),
    /// Create, list, or delete a tag
    Tag(tag::TagArgs),
    /// Stash the changes in a dirty working directory
    Stash(stash::StashArgs),
    /// Reset current HEAD to the specified state
    Reset(reset::ResetArgs),
    /// Get and set repository options
    Config(config::ConfigArgs),
    /// Remove untracked files from the working tree
    Clean(clean::CleanArgs),
    /// Show various types of objects
    Show(show::ShowArgs),
}

/// Open a repository, respecting `--git-dir`.
pub fn open_repo(cli: &Cli) -> Result<pygit_repository::Repository> {
    let repo = match &cli.git_dir {
        Some(git_dir) => pygit_repository::Repository::open(git_dir)?,
        None => pygit_repository::Repository::discover(".")?,
    };
    Ok(repo)
}

pub fn run(cli: Cli) -> Result<i32> {
    match &cli.command {
        Commands::Init(args) => init::run(args, &cli),
        Commands::Add(args) => add::run(args, &cli),
        Commands::Rm(args) => rm::run(args, &cli),
        Commands::Commit(args) => commit::run(args, &cli),
        Commands::Log(args) => log::run(args, &cli),
        Commands::Status(args) => status::run(args, &cli),
        Commands::Diff(args) => diff::run(args, &cli),
        Commands::Branch(args) => branch::run(args, &cli),
        Commands::Checkout(args) => checkout::run(args, &cli),
        Commands::Merge(args) => merge::run(args, &cli),
        Commands::Rebase(args) => rebase::run(args, &cli),
        Commands::Tag(args) => tag::run(args, &cli),
        Commands::Stash(args) => stash::run(args, &cli),
        Commands::Reset(args) => reset::run(args, &cli),
        Commands::Config(args) => config::run(args, &cli),
        Commands::Clean(args) => clean::run(args, &cli),
        Commands::Show(args) => show::run(args, &cli),
    }
}
