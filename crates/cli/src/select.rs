//! Interactive file selection for `ask --select`.

use anyhow::{bail, Context, Result};
use std::io::{BufRead, Write};
use swiftsmith_core::state::SummaryBook;

/// Print a numbered list of summarized files and read the user's picks
pub fn choose_files<R: BufRead, W: Write>(
    summaries: &SummaryBook,
    mut input: R,
    out: &mut W,
) -> Result<Vec<String>> {
    let names: Vec<&str> = summaries.iter().map(|(name, _)| name).collect();
    if names.is_empty() {
        bail!("No summarized files to choose from");
    }

    for (idx, (name, summary)) in summaries.iter().enumerate() {
        writeln!(out, "{:>3}. {name}\n     {summary}", idx + 1)?;
    }
    write!(out, "Files to share (numbers separated by commas or spaces): ")?;
    out.flush()?;

    let mut line = String::new();
    input
        .read_line(&mut line)
        .context("Failed to read selection")?;

    let picked = parse_indices(&line, names.len())?;
    Ok(picked.into_iter().map(|idx| names[idx].to_string()).collect())
}

/// Parse 1-based numbers into 0-based indices, deduplicated in input order
pub fn parse_indices(line: &str, count: usize) -> Result<Vec<usize>> {
    let mut picked = Vec::new();
    for token in line
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
    {
        let number: usize = token
            .parse()
            .with_context(|| format!("'{token}' is not a file number"))?;
        if number == 0 || number > count {
            bail!("File number {number} is out of range (1-{count})");
        }
        if !picked.contains(&(number - 1)) {
            picked.push(number - 1);
        }
    }
    if picked.is_empty() {
        bail!("No files selected");
    }
    Ok(picked)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_indices() {
        assert_eq!(parse_indices("1, 3 2,1\n", 3).unwrap(), vec![0, 2, 1]);
        assert!(parse_indices("4", 3).is_err());
        assert!(parse_indices("0", 3).is_err());
        assert!(parse_indices("two", 3).is_err());
        assert!(parse_indices("  \n", 3).is_err());
    }

    #[test]
    fn test_choose_files() {
        let mut book = SummaryBook::new();
        book.insert("A.swift", "App entry point.");
        book.insert("B.swift", "Settings view.");

        let mut out = Vec::new();
        let picked = choose_files(&book, "2\n".as_bytes(), &mut out).unwrap();
        assert_eq!(picked, vec!["B.swift"]);

        let listing = String::from_utf8(out).unwrap();
        assert!(listing.contains("  1. A.swift\n     App entry point."));
        assert!(listing.contains("  2. B.swift"));
    }

    #[test]
    fn test_nothing_to_choose() {
        let err = choose_files(&SummaryBook::new(), "1\n".as_bytes(), &mut Vec::<u8>::new()).unwrap_err();
        assert!(err.to_string().contains("No summarized files"));
    }
}
