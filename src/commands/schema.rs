use crate::db::schema::{ddl, Backend};
use anyhow::Result;
use clap::Args;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct SchemaArgs {
    #[arg(short, long, value_enum, default_value_t = Backend::Sqlite)]
    backend: Backend,
    /// Write the DDL to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub fn cmd(args: SchemaArgs) -> Result<()> {
    let script = ddl(args.backend);
    match args.output {
        Some(path) => fs::write(path, script)?,
        None => println!("{}", script),
    }
    Ok(())
}
