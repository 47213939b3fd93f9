use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::error::RosterError;

use super::participant::Participant;

const HEADERS: [&str; 4] = ["First Name", "Last Name", "Email", "Checked In"];

/// A rendered roster export, ready to be written out.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct CsvExport {
    pub file_name: String,
    pub contents: String,
}

impl CsvExport {
    /// Write the export into `dir`, returning the full path.
    pub fn write_to(&self, dir: &Path) -> anyhow::Result<PathBuf> {
        let path = dir.join(&self.file_name);
        fs::write(&path, &self.contents)?;
        log::info!("Exported participants to {}", path.display());
        Ok(path)
    }
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

fn csv_line<S: AsRef<str>>(fields: &[S]) -> String {
    fields
        .iter()
        .map(|f| quote(f.as_ref()))
        .collect::<Vec<String>>()
        .join(",")
}

/// Render `rows` as CSV: a header line then one line per row, every field
/// quoted.
pub fn participants_csv(rows: &[&Participant]) -> String {
    let mut lines = vec![csv_line(&HEADERS)];
    lines.extend(rows.iter().map(|p| {
        csv_line(&[
            p.first_name.as_str(),
            p.last_name.as_str(),
            p.email.as_str(),
            if p.checked_in { "Yes" } else { "No" },
        ])
    }));
    lines.join("\n")
}

pub fn export_file_name(event_name: Option<&str>) -> String {
    let base = event_name
        .map(|name| name.replace(['/', '\\'], "-"))
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| "participants".to_owned());
    format!("{}-participants.csv", base)
}

/// Export the currently visible rows. Refuses an empty view.
pub fn export_csv(
    rows: &[&Participant],
    event_name: Option<&str>,
) -> Result<CsvExport, RosterError> {
    if rows.is_empty() {
        return Err(RosterError::NothingToExport);
    }

    Ok(CsvExport {
        file_name: export_file_name(event_name),
        contents: participants_csv(rows),
    })
}
