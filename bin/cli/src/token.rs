//! The stored login token.
//!
//! `moncli login` saves the body returned by the server's login callback,
//! `{"token": "..."}`, and later commands send the token as a bearer
//! credential.

use crate::error::CliError;
use rootcause::prelude::{Report, ResultExt};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Where the token is kept when `MON_AUTH_TOKEN_FILE` is not set.
#[must_use]
pub fn default_token_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("mon").join("token.json"))
}

/// Body of the login callback response.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredToken {
    pub token: String,
}

impl std::fmt::Debug for StoredToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredToken")
            .field("token", &"[redacted]")
            .finish()
    }
}

impl StoredToken {
    /// Parses the output pasted back by the user after logging in.
    ///
    /// # Errors
    ///
    /// Returns `InvalidToken` unless the text is a JSON object with a
    /// non-empty `token`.
    pub fn parse(text: &str) -> Result<Self, Report<CliError>> {
        let stored: Self =
            serde_json::from_str(text.trim()).map_err(|e| CliError::InvalidToken {
                reason: e.to_string(),
            })?;
        if stored.token.trim().is_empty() {
            return Err(CliError::InvalidToken {
                reason: "token is empty".to_string(),
            }
            .into());
        }
        Ok(stored)
    }

    /// Writes the token, readable only by the current user.
    ///
    /// # Errors
    ///
    /// Returns `TokenFile` if the file or its directory cannot be written.
    pub fn write(&self, path: &Path) -> Result<(), Report<CliError>> {
        let failed = || CliError::TokenFile {
            path: path.to_path_buf(),
        };

        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir).context_with(failed)?;
        }

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let body = serde_json::to_vec(self).context_with(failed)?;
        let mut file = options.open(path).context_with(failed)?;
        file.write_all(&body).context_with(failed)?;

        // `mode` only applies when the file is created.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o600)).context_with(failed)?;
        }
        Ok(())
    }

    /// Reads a previously stored token; `Ok(None)` if there is none.
    ///
    /// # Errors
    ///
    /// Returns `TokenFile` if the file exists but cannot be read or parsed.
    pub fn read(path: &Path) -> Result<Option<Self>, Report<CliError>> {
        let text = match fs::read_to_string(path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            read => read.context_with(|| CliError::TokenFile {
                path: path.to_path_buf(),
            })?,
        };
        Self::parse(&text)
            .map(Some)
            .map_err(|report| report.context(CliError::TokenFile {
                path: path.to_path_buf(),
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_callback_output() {
        let stored = StoredToken::parse("{\"token\":\"signed.jwt.value\"}\n").expect("token");
        assert_eq!(stored.token, "signed.jwt.value");
    }

    #[test]
    fn rejects_other_output() {
        for text in ["invalid state parameter", "{}", "{\"token\":\"\"}", ""] {
            let report = StoredToken::parse(text).expect_err(text);
            assert!(matches!(
                report.current_context(),
                CliError::InvalidToken { .. }
            ));
        }
    }

    #[test]
    fn write_then_read() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("mon").join("token.json");
        let stored = StoredToken {
            token: "signed.jwt.value".to_string(),
        };

        stored.write(&path).expect("write");

        assert_eq!(StoredToken::read(&path).expect("read"), Some(stored));
    }

    #[cfg(unix)]
    #[test]
    fn token_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("token.json");
        fs::write(&path, "old").expect("seed file");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).expect("chmod");

        StoredToken {
            token: "t".to_string(),
        }
        .write(&path)
        .expect("write");

        let mode = fs::metadata(&path).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn missing_file_is_no_token() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert_eq!(
            StoredToken::read(&dir.path().join("absent.json")).expect("read"),
            None
        );
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("token.json");
        fs::write(&path, "not json").expect("seed file");

        let report = StoredToken::read(&path).expect_err("corrupt");
        assert!(matches!(
            report.current_context(),
            CliError::TokenFile { .. }
        ));
    }
}
