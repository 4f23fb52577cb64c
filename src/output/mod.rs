use std::io::{self, Write};

use crate::download::SongOutcome;

/// Console line for a song that was saved
pub fn success_line(song: &str) -> String {
    format!("Successfully download song: {}", song)
}

/// Console line for a song that failed; `{:#}` keeps the whole error chain on one line
pub fn failure_line(song: &str, error: &anyhow::Error) -> String {
    format!(
        "Can't download song: {} with error: {:#}, continue to next song",
        song, error
    )
}

/// Write the per-song result line and flush so it shows up as soon as the song is done
pub fn write_outcome<W: Write>(out: &mut W, outcome: &SongOutcome) -> io::Result<()> {
    match &outcome.result {
        Ok(_) => writeln!(out, "{}", success_line(&outcome.song))?,
        Err(e) => writeln!(out, "{}", failure_line(&outcome.song, e))?,
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use std::path::PathBuf;

    #[test]
    fn test_success_line() {
        assert_eq!(success_line("Imagine"), "Successfully download song: Imagine");
    }

    #[test]
    fn test_failure_line_includes_error_chain() {
        let error = Err::<(), _>(anyhow::anyhow!("HTTP 429"))
            .context("Search failed")
            .unwrap_err();

        assert_eq!(
            failure_line("Imagine", &error),
            "Can't download song: Imagine with error: Search failed: HTTP 429, continue to next song"
        );
    }

    #[test]
    fn test_write_outcome() {
        let mut out = Vec::new();
        let outcome = SongOutcome {
            song: "Imagine".to_string(),
            result: Ok(PathBuf::from("Imagine.mp3")),
        };

        write_outcome(&mut out, &outcome).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Successfully download song: Imagine\n");
    }
}
