use clap::{Args, ValueEnum};
use itertools::Itertools;
use loctab_stf::StringTable;
use miette::Result;
use owo_colors::OwoColorize;
use similar::{ChangeTag, TextDiff};
use std::{fmt::Display, path::PathBuf};

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum Mode {
    /// Only name what changed
    #[default]
    Semantic,
    /// Also show an inline diff of every modified text
    Full,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Change {
    Header(u32, u32),
    Added(String),
    Removed(String),
    Modified(String, Vec<String>),
}

impl Display for Change {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Change::Header(old, new) => {
                let old = format!("0x{old:08X}");
                let new = format!("0x{new:08X}");
                write!(f, "* header: {} vs {}", old.red(), new.green())
            }
            Change::Added(key) => write!(f, "✅ {}", key.green()),
            Change::Removed(key) => write!(f, "❌ {}", key.red()),
            Change::Modified(key, context) => {
                write!(f, "🔃 {}", key.blue())?;
                for line in context {
                    write!(f, "\n    {}", line)?;
                }
                Ok(())
            }
        }
    }
}

/// Render an inline diff of two texts, one entry per line
fn inline_diff(old: &str, new: &str) -> Vec<String> {
    let diff = TextDiff::from_lines(old, new);

    let mut lines = Vec::new();
    for op in diff.ops() {
        for change in diff.iter_inline_changes(op) {
            let mut context = match change.tag() {
                ChangeTag::Delete => format!("{} ", "-".red()),
                ChangeTag::Insert => format!("{} ", "+".green()),
                ChangeTag::Equal => "  ".to_string(),
            };

            for (emphasized, value) in change.iter_strings_lossy() {
                let value = value.trim_end_matches('\n');
                if emphasized {
                    if change.tag() == ChangeTag::Insert {
                        context.push_str(&format!("{}", value.green().underline()));
                    } else {
                        context.push_str(&format!("{}", value.red().underline()));
                    }
                } else {
                    context.push_str(&format!("{}", value.dimmed()));
                }
            }
            lines.push(context);
        }
    }
    lines
}

fn compare(left: &StringTable, right: &StringTable, mode: Mode) -> Vec<Change> {
    let mut result = Vec::new();

    if left.header() != right.header() {
        result.push(Change::Header(left.header(), right.header()));
    }

    right
        .keys()
        .filter(|k| !left.contains_key(k.as_str()))
        .sorted()
        .for_each(|k| result.push(Change::Added(k.clone())));

    left.keys()
        .filter(|k| !right.contains_key(k.as_str()))
        .sorted()
        .for_each(|k| result.push(Change::Removed(k.clone())));

    left.iter()
        .filter_map(|(k, old)| right.get(k).map(|new| (k, old, new)))
        .filter(|(_, old, new)| old != new)
        .sorted_by(|(a, _, _), (b, _, _)| a.cmp(b))
        .for_each(|(k, old, new)| {
            let context = match mode {
                Mode::Full => inline_diff(old, new),
                Mode::Semantic => Vec::new(),
            };
            result.push(Change::Modified(k.clone(), context));
        });

    result
}

#[derive(Args)]
pub struct DiffArgs {
    /// An input string table file
    #[arg(short, long, value_name = "FILE")]
    left: PathBuf,

    /// An input string table file
    #[arg(short, long, value_name = "FILE")]
    right: PathBuf,

    /// Comparison mode
    #[arg(short, long, value_enum, default_value_t = Mode::Semantic)]
    mode: Mode,

    /// Replace malformed UTF-8 instead of failing
    #[arg(long, env = "LOCTAB_LOSSY", default_value_t = false)]
    lossy: bool,
}

impl DiffArgs {
    pub fn handle(&self) -> Result<()> {
        let left = super::load_table(&self.left, self.lossy)?;
        let right = super::load_table(&self.right, self.lossy)?;

        let changes = compare(&left, &right, self.mode);
        if !changes.is_empty() {
            println!("🔃 {}", self.left.display().blue());
            println!("{}", changes.iter().map(|c| format!("  {}", c)).join("\n"));
        }

        Ok(())
    }
}
