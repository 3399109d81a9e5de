//! Capability defaults document.
//!
//! A JSON object with any subset of the three class keys:
//!
//! ```json
//! {"keyboard": true, "mouse": true, "gamepad": true}
//! ```
//!
//! Missing keys take the built-in defaults; a missing file means "all
//! built-in defaults".  A file that exists but cannot be read or parsed is a
//! startup error, so a typo never silently enables a class.

use std::path::{Path, PathBuf};

use relay_core::CapabilitySet;
use thiserror::Error;
use tracing::info;

/// Error type for the capability defaults document.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A file system I/O error other than "not found".
    #[error("I/O error reading capability defaults at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not a valid capability document.
    #[error("failed to parse capability defaults at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Loads the initial [`CapabilitySet`] from `path`.
///
/// Returns [`CapabilitySet::default`] when the file does not exist.
///
/// # Errors
///
/// Returns [`StoreError::Io`] for file-system errors other than "not found",
/// and [`StoreError::Parse`] if the JSON is malformed or has non-boolean flags.
pub fn load_capabilities(path: &Path) -> Result<CapabilitySet, StoreError> {
    match std::fs::read(path) {
        Ok(bytes) => {
            let caps: CapabilitySet =
                serde_json::from_slice(&bytes).map_err(|source| StoreError::Parse {
                    path: path.to_path_buf(),
                    source,
                })?;
            info!("loaded capability defaults from {}", path.display());
            Ok(caps)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!(
                "no capability defaults at {}, using built-in defaults",
                path.display()
            );
            Ok(CapabilitySet::default())
        }
        Err(source) => Err(StoreError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("relay_test_{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_absent_file_yields_defaults() {
        let path = PathBuf::from("/nonexistent/path/that/cannot/exist/caps.json");
        let caps = load_capabilities(&path).unwrap();
        assert_eq!(caps, CapabilitySet::default());
    }

    #[test]
    fn test_partial_document_overrides_only_listed_keys() {
        // Arrange
        let dir = temp_dir();
        let path = dir.join("caps.json");
        std::fs::write(&path, r#"{"gamepad": true, "mouse": false}"#).unwrap();

        // Act
        let caps = load_capabilities(&path).unwrap();

        // Assert
        assert_eq!(
            caps,
            CapabilitySet {
                keyboard: true,
                mouse: false,
                gamepad: true
            }
        );

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_malformed_document_is_an_error() {
        let dir = temp_dir();
        let path = dir.join("caps.json");
        std::fs::write(&path, "{gamepad: yes").unwrap();

        let result = load_capabilities(&path);

        assert!(matches!(result, Err(StoreError::Parse { .. })));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_non_boolean_flag_is_an_error() {
        let dir = temp_dir();
        let path = dir.join("caps.json");
        std::fs::write(&path, r#"{"keyboard": "on"}"#).unwrap();

        assert!(matches!(
            load_capabilities(&path),
            Err(StoreError::Parse { .. })
        ));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_directory_instead_of_file_is_an_io_error() {
        let dir = temp_dir();

        let result = load_capabilities(&dir);

        assert!(matches!(result, Err(StoreError::Io { .. })));
        std::fs::remove_dir_all(&dir).ok();
    }
}
