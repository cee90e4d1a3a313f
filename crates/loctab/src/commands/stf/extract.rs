use clap::Args;
use itertools::Itertools;
use loctab_stf::StringTable;
use miette::{IntoDiagnostic, Result};
use std::{io::Write, path::PathBuf};
use tracing::info;

#[derive(Args)]
pub struct ExtractArgs {
    /// An input string table file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// Write lines here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Allow overwriting the target
    #[arg(long, default_value_t = false)]
    overwrite: bool,

    /// Order lines by key instead of by position in the file
    #[arg(long, default_value_t = false)]
    sorted: bool,

    /// Replace malformed UTF-8 instead of failing
    #[arg(long, env = "LOCTAB_LOSSY", default_value_t = false)]
    lossy: bool,
}

/// Keep every entry on a single line
fn escape(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('\t', "\\t")
        .replace('\r', "\\r")
        .replace('\n', "\\n")
}

fn write_lines(table: &StringTable, sorted: bool, out: &mut impl Write) -> std::io::Result<()> {
    let entries: Box<dyn Iterator<Item = (&String, &String)> + '_> = if sorted {
        Box::new(table.iter().sorted_by(|(a, _), (b, _)| a.cmp(b)))
    } else {
        Box::new(table.iter())
    };

    for (key, text) in entries {
        writeln!(out, "{}\t{}", escape(key), escape(text))?;
    }
    Ok(())
}

impl ExtractArgs {
    pub fn handle(&self) -> Result<()> {
        let table = super::load_table(&self.file, self.lossy)?;

        let mut out = super::output(self.output.as_deref(), self.overwrite)?;
        write_lines(&table, self.sorted, &mut out).into_diagnostic()?;
        out.flush().into_diagnostic()?;

        info!("extracted {} entries", table.len());
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use loctab_stf::StringTable;
    use pretty_assertions::assert_str_eq;

    use super::write_lines;

    #[test]
    fn lines_in_file_order() {
        let table = StringTable::from_records(0, [("b", "two"), ("a", "one")]);

        let mut out = Vec::new();
        write_lines(&table, false, &mut out).unwrap();
        assert_str_eq!(String::from_utf8(out).unwrap(), "b\ttwo\na\tone\n");
    }

    #[test]
    fn lines_sorted_and_escaped() {
        let table = StringTable::from_records(0, [("b", "line\nbreak"), ("a", "tab\there")]);

        let mut out = Vec::new();
        write_lines(&table, true, &mut out).unwrap();
        assert_str_eq!(
            String::from_utf8(out).unwrap(),
            "a\ttab\\there\nb\tline\\nbreak\n"
        );
    }
}
