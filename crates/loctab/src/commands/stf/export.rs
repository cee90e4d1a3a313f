use clap::Args;
use miette::{IntoDiagnostic, Result};
use std::{io::Write, path::PathBuf};
use tracing::info;

#[derive(Args)]
pub struct ExportArgs {
    /// An input string table file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// A target JSON file, stdout if missing
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Allow overwriting the target
    #[arg(long, default_value_t = false)]
    overwrite: bool,

    /// Replace malformed UTF-8 instead of failing
    #[arg(long, env = "LOCTAB_LOSSY", default_value_t = false)]
    lossy: bool,
}

impl ExportArgs {
    pub fn handle(&self) -> Result<()> {
        let table = super::load_table(&self.file, self.lossy)?;

        let mut out = super::output(self.output.as_deref(), self.overwrite)?;
        serde_json::to_writer_pretty(&mut out, &table).into_diagnostic()?;
        writeln!(out).into_diagnostic()?;
        out.flush().into_diagnostic()?;

        info!("exported {} entries", table.len());
        Ok(())
    }
}
