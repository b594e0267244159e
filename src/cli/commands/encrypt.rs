//! `matchvault encrypt` — encrypt a single file with the envelope codec.
//!
//! Files already carrying an envelope marker are left alone, so running
//! the command twice never double-wraps. `--legacy` emits the
//! OpenSSL-compatible format for stores shared with older tooling.

use std::fs;
use std::path::Path;

use crate::cli::output;
use crate::cli::resolve_password;
use crate::crypto::{self, envelope, EnvelopeVersion};
use crate::errors::{MatchVaultError, Result};

/// Execute the `encrypt` command.
pub fn execute(
    input_path: &str,
    password: Option<&str>,
    output_path: Option<&str>,
    legacy: bool,
) -> Result<()> {
    let input = Path::new(input_path);
    if !input.is_file() {
        return Err(MatchVaultError::CommandFailed(format!(
            "'{input_path}' is not a file"
        )));
    }

    let password = resolve_password(password)?;
    let data = fs::read(input)?;

    if envelope::is_encrypted(&data) {
        output::info(&format!(
            "'{input_path}' is already encrypted, nothing to do"
        ));
        if let Some(dest) = output_path {
            super::write_output(input, Some(dest), &data)?;
        }
        return Ok(());
    }

    let version = if legacy {
        EnvelopeVersion::V1
    } else {
        EnvelopeVersion::V2
    };
    let sealed = crypto::encrypt_with_version(&data, &password, version)
        .map_err(|e| file_error(input_path, e))?;

    super::write_output(input, output_path, &sealed)?;
    output::success(&format!(
        "Encrypted '{input_path}' → '{}'",
        output_path.unwrap_or(input_path)
    ));
    Ok(())
}

/// Attach the failing file name to a codec error.
fn file_error(input_path: &str, source: MatchVaultError) -> MatchVaultError {
    MatchVaultError::FileCrypto {
        operation: "encrypt",
        file: input_path.to_string(),
        source: Box::new(source),
    }
}
