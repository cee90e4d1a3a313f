use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

use loctab_stf::{CodecOptions, StringTable, TableOptions};
use miette::{Context, IntoDiagnostic, Result};

pub mod diff;
pub mod export;
pub mod extract;
pub mod import;
pub mod info;

#[derive(clap::Subcommand)]
pub enum StfCommands {
    /// Compare two string tables
    Diff(diff::DiffArgs),
    /// Write a string table as JSON
    Export(export::ExportArgs),
    /// List every entry of a string table as tab separated lines
    Extract(extract::ExtractArgs),
    /// Build a string table from JSON
    Import(import::ImportArgs),
    /// Summarize a string table
    Info(info::InfoArgs),
}

impl StfCommands {
    pub fn handle(&self) -> Result<()> {
        match self {
            StfCommands::Diff(diff) => diff.handle(),
            StfCommands::Export(export) => export.handle(),
            StfCommands::Extract(extract) => extract.handle(),
            StfCommands::Import(import) => import.handle(),
            StfCommands::Info(info) => info.handle(),
        }
    }
}

/// Open and decode the table at `path`
pub(crate) fn load_table(path: &Path, lossy: bool) -> Result<StringTable> {
    let options = TableOptions::builder()
        .codec(CodecOptions::builder().lossy_utf8(lossy).build())
        .build();

    let file = File::open(path)
        .into_diagnostic()
        .context(format!("path: {}", path.display()))?;

    StringTable::load_with(io::BufReader::new(file), &options)
        .context(format!("decoding {}", path.display()))
}

/// Create `path`, refusing to replace an existing file unless `overwrite` is set
pub(crate) fn create_file(path: &Path, overwrite: bool) -> Result<File> {
    let file = if !overwrite {
        File::create_new(path)
    } else {
        File::create(path)
    };

    file.into_diagnostic()
        .context(format!("creating {}", path.display()))
}

/// The target file if one was given, stdout otherwise
pub(crate) fn output(path: Option<&Path>, overwrite: bool) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(create_file(path, overwrite)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    })
}
