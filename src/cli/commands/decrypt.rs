//! `matchvault decrypt` — decrypt a single file with the envelope codec.

use std::fs;
use std::path::Path;

use crate::cli::output;
use crate::cli::resolve_password;
use crate::crypto::{self, envelope};
use crate::errors::{MatchVaultError, Result};

/// Execute the `decrypt` command.
pub fn execute(input_path: &str, password: Option<&str>, output_path: Option<&str>) -> Result<()> {
    let input = Path::new(input_path);
    if !input.is_file() {
        return Err(MatchVaultError::CommandFailed(format!(
            "'{input_path}' is not a file"
        )));
    }

    let password = resolve_password(password)?;
    let data = fs::read(input)?;

    if !envelope::is_encrypted(&data) {
        output::info(&format!("'{input_path}' is not encrypted, nothing to do"));
        if let Some(dest) = output_path {
            super::write_output(input, Some(dest), &data)?;
        }
        return Ok(());
    }

    let plaintext = crypto::decrypt(&data, &password).map_err(|e| MatchVaultError::FileCrypto {
        operation: "decrypt",
        file: input_path.to_string(),
        source: Box::new(e),
    })?;

    super::write_output(input, output_path, &plaintext)?;
    output::success(&format!(
        "Decrypted '{input_path}' → '{}'",
        output_path.unwrap_or(input_path)
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_password_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("cert.p12");
        fs::write(&file, b"secret").unwrap();

        crate::cli::commands::encrypt::execute(
            file.to_str().unwrap(),
            Some("hunter2secret"),
            None,
            false,
        )
        .unwrap();

        let err = execute(file.to_str().unwrap(), Some("wrong password"), None).unwrap_err();
        assert!(err.to_string().contains("cert.p12"));
    }

    #[test]
    fn plaintext_input_is_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("cert.cer");
        fs::write(&file, b"not an envelope").unwrap();

        execute(file.to_str().unwrap(), Some("hunter2secret"), None).unwrap();
        assert_eq!(fs::read(&file).unwrap(), b"not an envelope");
    }
}
