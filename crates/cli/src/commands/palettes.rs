//! `ganttline palettes`: list the built-in colour palettes.

use super::render_ok;
use crate::cli::CliError;
use ganttline_core::{Palette, PaletteName};
use serde::Serialize;
use std::fmt::Write;

#[derive(Debug, Serialize)]
struct PaletteInfo {
    name: PaletteName,
    classes: Vec<String>,
}

fn builtin_palettes() -> Vec<PaletteInfo> {
    PaletteName::BUILTIN
        .into_iter()
        .map(|name| PaletteInfo {
            name,
            classes: Palette::builtin(name).classes().to_vec(),
        })
        .collect()
}

/// Execute the palettes command.
///
/// One line per palette in text mode, an `ok` envelope in JSON mode.
///
/// # Errors
///
/// Returns an error only if the JSON output cannot be serialized.
pub fn execute_palettes(json_output: bool) -> Result<String, CliError> {
    let palettes = builtin_palettes();
    if json_output {
        return render_ok(palettes, false);
    }

    let mut output = String::new();
    for palette in &palettes {
        let _ = writeln!(output, "{:<8} {}", palette.name.as_str(), palette.classes.join(" "));
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_lists_every_builtin() {
        let output = execute_palettes(false).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("classic  bar-blue bar-green"));
        assert!(lines[3].starts_with("vibrant  bar-vibrant-blue"));
    }

    #[test]
    fn test_json_envelope() {
        let output = execute_palettes(true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["status"], "ok");
        assert_eq!(value["data"][1]["name"], "pastel");
        assert_eq!(value["data"][1]["classes"].as_array().unwrap().len(), 12);
    }
}
