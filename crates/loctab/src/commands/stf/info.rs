use clap::Args;
use loctab_stf::StringTable;
use miette::{Context, IntoDiagnostic, Result};
use std::{fmt::Display, path::PathBuf};

#[derive(Args)]
pub struct InfoArgs {
    /// An input string table file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// Replace malformed UTF-8 instead of failing
    #[arg(long, env = "LOCTAB_LOSSY", default_value_t = false)]
    lossy: bool,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Summary {
    header: u32,
    entries: usize,
    longest_key: usize,
    longest_text: usize,
}

impl From<&StringTable> for Summary {
    fn from(table: &StringTable) -> Self {
        Summary {
            header: table.header(),
            entries: table.len(),
            longest_key: table.keys().map(String::len).max().unwrap_or_default(),
            longest_text: table.values().map(String::len).max().unwrap_or_default(),
        }
    }
}

impl Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "header:       0x{:08X}", self.header)?;
        writeln!(f, "entries:      {}", self.entries)?;
        writeln!(f, "longest key:  {} bytes", self.longest_key)?;
        write!(f, "longest text: {} bytes", self.longest_text)
    }
}

impl InfoArgs {
    pub fn handle(&self) -> Result<()> {
        let size = std::fs::metadata(&self.file)
            .into_diagnostic()
            .context(format!("path: {}", &self.file.display()))?
            .len();
        let table = super::load_table(&self.file, self.lossy)?;

        println!("file:         {} ({} bytes)", self.file.display(), size);
        println!("{}", Summary::from(&table));
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use loctab_stf::StringTable;
    use pretty_assertions::{assert_eq, assert_str_eq};

    use super::Summary;

    #[test]
    fn summarize() {
        let table = StringTable::from_records(0x102, [("ui_buy", "Kaufen"), ("k", "Grüße")]);

        let summary = Summary::from(&table);
        assert_eq!(
            summary,
            Summary {
                header: 0x102,
                entries: 2,
                longest_key: 6,
                longest_text: 7,
            }
        );
        assert_str_eq!(
            summary.to_string(),
            "header:       0x00000102\nentries:      2\nlongest key:  6 bytes\nlongest text: 7 bytes"
        );
    }

    #[test]
    fn summarize_empty() {
        assert_eq!(
            Summary::from(&StringTable::empty(0)),
            Summary::default()
        );
    }
}
