use clap::Args;
use loctab_stf::{StringTable, TableOptions};
use miette::{miette, Context, IntoDiagnostic, Result};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::PathBuf,
};
use tracing::info;

#[derive(Args)]
pub struct ImportArgs {
    /// A JSON file as written by `export`
    #[arg(short, long, value_name = "FILE")]
    input: PathBuf,

    /// A target string table file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// Allow overwriting the target
    #[arg(long, default_value_t = false)]
    overwrite: bool,

    /// zlib level between 0 and 9
    #[arg(short, long, default_value_t = 9)]
    level: u32,
}

impl ImportArgs {
    pub fn handle(&self) -> Result<()> {
        if self.level > 9 {
            return Err(miette!("compression level must be between 0 and 9"));
        }

        let json = File::open(&self.input)
            .into_diagnostic()
            .context(format!("path: {}", &self.input.display()))?;
        let table: StringTable = serde_json::from_reader(BufReader::new(json))
            .into_diagnostic()
            .context(format!("parsing {}", &self.input.display()))?;

        let options = TableOptions::builder().compression_level(self.level).build();
        let mut out = BufWriter::new(super::create_file(&self.file, self.overwrite)?);
        table.save_with(&mut out, &options)?;
        out.flush().into_diagnostic()?;

        info!("wrote {} entries to {}", table.len(), self.file.display());
        Ok(())
    }
}
