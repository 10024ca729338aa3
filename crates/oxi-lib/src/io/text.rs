use anyhow::{Context, Result};
use std::path::Path;

/// Parse paired `red,ir` amplitude lines. Comma or whitespace delimited,
/// blank lines and `#` comments ignored, a single leading header line
/// (as written by the window generator) tolerated.
pub fn parse_pair_series(text: &str) -> Result<(Vec<u32>, Vec<u32>)> {
    let mut red = Vec::new();
    let mut ir = Vec::new();
    let mut seen_data = false;
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if !seen_data && trimmed.chars().any(|c| c.is_ascii_alphabetic()) {
            // header row
            continue;
        }
        let mut fields = trimmed.split(|c: char| c == ',' || c.is_whitespace());
        let r: u32 = fields
            .next()
            .unwrap_or_default()
            .trim()
            .parse()
            .with_context(|| format!("line {}: bad red sample: {}", idx + 1, trimmed))?;
        let i: u32 = fields
            .find(|f| !f.is_empty())
            .with_context(|| format!("line {}: missing infrared sample", idx + 1))?
            .trim()
            .parse()
            .with_context(|| format!("line {}: bad infrared sample: {}", idx + 1, trimmed))?;
        red.push(r);
        ir.push(i);
        seen_data = true;
    }
    if red.is_empty() {
        anyhow::bail!("no sample pairs found");
    }
    Ok((red, ir))
}

/// Read a paired sample series from disk.
pub fn read_pair_series(path: &Path) -> Result<(Vec<u32>, Vec<u32>)> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_pair_series(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_and_whitespace_pairs() {
        let (red, ir) = parse_pair_series("5000,5200\n5010 5210\n").unwrap();
        assert_eq!(red, vec![5000, 5010]);
        assert_eq!(ir, vec![5200, 5210]);
    }

    #[test]
    fn skips_comments_blank_lines_and_header() {
        let text = "# captured window\nred,ir\n\n100,200\n101,201\n";
        let (red, ir) = parse_pair_series(text).unwrap();
        assert_eq!(red, vec![100, 101]);
        assert_eq!(ir, vec![200, 201]);
    }

    #[test]
    fn rejects_missing_channel() {
        assert!(parse_pair_series("100\n").is_err());
    }

    #[test]
    fn rejects_empty_input() {
        assert!(parse_pair_series("# nothing\n").is_err());
    }
}
