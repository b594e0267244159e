//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::storage::SecureFile;

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Print a table of remote secure files (Name, Checksum, Created).
pub fn print_secure_files_table(files: &[SecureFile]) {
    if files.is_empty() {
        info("No files in this project yet.");
        tip("Run `matchvault push` to upload your first secrets.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Name", "Checksum", "Created"]);

    for f in files {
        let checksum = short_checksum(&f.checksum);
        let created = f
            .created_at
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());

        table.add_row(vec![f.name.clone(), checksum, created]);
    }

    println!("{table}");
}

/// Print a table of workdir-relative file names (Name only, sorted).
pub fn print_file_names_table(header: &str, names: &[String]) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![header]);

    for name in names {
        table.add_row(vec![name.clone()]);
    }

    println!("{table}");
}

/// First twelve characters of a checksum, with an ellipsis when truncated.
/// Counts characters rather than bytes; the checksum comes from the
/// server and is not guaranteed to be ASCII.
fn short_checksum(checksum: &str) -> String {
    let mut chars = checksum.chars();
    let head: String = chars.by_ref().take(12).collect();
    if chars.next().is_some() {
        format!("{head}…")
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_display_truncates_on_character_boundaries() {
        assert_eq!(short_checksum("0123456789abcdef"), "0123456789ab…");
        assert_eq!(short_checksum("abc123"), "abc123");
        // A multibyte character spanning the cut point must not split.
        assert_eq!(short_checksum("abcdefghijké"), "abcdefghijké");
        assert_eq!(short_checksum("ééééééééééééé"), "éééééééééééé…");
    }
}
