use camino::Utf8PathBuf;
use clap::Parser;
use gyre::Result;
use gyre::config::{Config, DEFAULT_CONFIG_FILE};

#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Output configuration file path (default is `gyre.toml`)
    #[arg(value_name = "PATH")]
    pub output: Option<Utf8PathBuf>,

    /// Overwrite an existing configuration file
    #[arg(long)]
    pub force: bool,
}

pub fn init_config(args: &InitArgs) -> Result<()> {
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_CONFIG_FILE));

    Config::save_default(&output, args.force)?;
    println!("Generated default configuration file: {output}");
    Ok(())
}
