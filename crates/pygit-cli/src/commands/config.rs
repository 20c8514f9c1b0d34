use anyhow::Result;
use clap::Args;

use super::open_repo;
use crate::Cli;

#[derive(Args)]
pub struct ConfigArgs {
    /// Configuration key, e.g. "user.name"
    key: String,

    /// Value to set; if omitted, the current value is printed
    value: Option<String>,
}

pub fn run(args: &ConfigArgs, cli: &Cli) -> Result<i32> {
    let mut repo = open_repo(cli)?;

    match &args.value {
        Some(value) => {
            repo.config_mut().set_string(&args.key, value)?;
            repo.write_config()?;
            Ok(0)
        }
        None => match repo.config().get_string(&args.key)? {
            Some(value) => {
                println!("{value}");
                Ok(0)
            }
            None => {
                eprintln!("error: key {} not found", args.key);
                Ok(1)
            }
        },
    }
}
