use anyhow::{Context, Result};
use std::path::Path;

/// Read the song list: one name per line, in file order.
///
/// Lines are neither trimmed nor validated, so blank lines come back as empty
/// names. A missing, unreadable or non UTF-8 file is an error.
pub fn load_songs(path: &Path) -> Result<Vec<String>> {
    let content = fs_err::read_to_string(path)
        .with_context(|| format!("Failed to read songs file {}", path.display()))?;

    Ok(parse_songs(&content))
}

fn parse_songs(content: &str) -> Vec<String> {
    content.lines().map(str::to_string).collect()
}
