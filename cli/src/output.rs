//! Output utilities for CLI tools.

use std::{fs::File, io::Write, path::PathBuf};

use serde::Serialize;

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// YAML format (default).
    #[default]
    Yaml,
    /// JSON format.
    Json,
}

impl OutputFormat {
    /// Picks JSON when `json` is set, YAML otherwise.
    pub fn from_json_flag(json: bool) -> Self {
        if json { Self::Json } else { Self::Yaml }
    }
}

/// Output configuration.
pub struct Output {
    pub format: OutputFormat,
    pub file: Option<PathBuf>,
}

impl Output {
    /// Creates a new output configuration.
    pub fn new(format: OutputFormat, file: Option<PathBuf>) -> Self {
        Self { format, file }
    }

    /// Renders `value` in the configured format.
    pub fn render<T: Serialize>(&self, value: &T) -> anyhow::Result<String> {
        Ok(match self.format {
            OutputFormat::Yaml => serde_yaml::to_string(value)?,
            OutputFormat::Json => serde_json::to_string_pretty(value)?,
        })
    }

    /// Writes the rendered value to the output file or stdout.
    pub fn write<T: Serialize>(&self, value: &T) -> anyhow::Result<()> {
        let output = self.render(value)?;

        match &self.file {
            Some(path) => {
                let mut file = File::create(path)?;
                file.write_all(output.as_bytes())?;
            }
            None => {
                println!("{}", output.trim_end());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Summary {
        pages: usize,
        packets: usize,
    }

    #[test]
    fn test_render_yaml() {
        let out = Output::new(OutputFormat::Yaml, None);
        let text = out.render(&Summary { pages: 2, packets: 6 }).unwrap();
        assert_eq!(text, "pages: 2\npackets: 6\n");
    }

    #[test]
    fn test_render_json() {
        let out = Output::new(OutputFormat::from_json_flag(true), None);
        let text = out.render(&Summary { pages: 2, packets: 6 }).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["pages"], 2);
        assert_eq!(value["packets"], 6);
    }

    #[test]
    fn test_write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.yaml");
        let out = Output::new(OutputFormat::Yaml, Some(path.clone()));
        out.write(&Summary { pages: 1, packets: 3 }).unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "pages: 1\npackets: 3\n");
    }
}
