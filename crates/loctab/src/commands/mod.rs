pub mod stf;

#[derive(clap::Subcommand)]
pub enum Commands {
    /// Handle string table files
    Stf {
        #[command(subcommand)]
        command: stf::StfCommands,
    },
}

impl Commands {
    pub fn handle(&self) -> miette::Result<()> {
        match self {
            Commands::Stf { command } => command.handle(),
        }
    }
}
