//! One module per subcommand. Each exposes an `execute` function that the
//! main dispatcher calls with the parsed CLI arguments.

use std::fs;
use std::path::Path;

use crate::errors::Result;
use crate::workdir::crypter;

pub mod change_password;
pub mod completions;
pub mod decrypt;
pub mod encrypt;
pub mod init;
pub mod list;
pub mod nuke;
pub mod pull;
pub mod push;

/// Write a codec result either to `output_path` or back over the input.
///
/// The in-place case goes through the temp-file-then-rename rewrite so a
/// crash never leaves a half-written file.
pub(crate) fn write_output(input: &Path, output_path: Option<&str>, data: &[u8]) -> Result<()> {
    match output_path {
        Some(dest) => {
            let dest = Path::new(dest);
            if let Some(parent) = dest.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            fs::write(dest, data)?;
        }
        None => crypter::write_in_place(input, data)?,
    }
    Ok(())
}
