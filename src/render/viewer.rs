//! External graph viewer invocation.

use std::path::{Path, PathBuf};
use std::process::Command;

/// Location of the external viewer program used to display exported
/// graphs.
///
/// The graph subsystem is set up once with the viewer of the host's
/// choosing; [`display_gdl`] then launches it per file.
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    program: PathBuf,
}

impl ViewerConfig {
    /// Configures `program` as the graph viewer.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        ViewerConfig {
            program: program.into(),
        }
    }

    /// The configured viewer executable.
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }
}

/// Launches the configured viewer with `file` as its only argument and
/// waits for it to exit.
///
/// Returns the platform exit code, `0` meaning success. A viewer that
/// could not be launched at all yields `127`; the failure is logged and is
/// never fatal to the caller — the exported file stays on disk and can be
/// retried.
#[must_use]
pub fn display_gdl(config: &ViewerConfig, file: &Path) -> i32 {
    match Command::new(&config.program).arg(file).status() {
        Ok(status) => status.code().unwrap_or(-1),
        Err(err) => {
            log::warn!(
                "failed to launch viewer {}: {err}",
                config.program.display()
            );
            127
        }
    }
}
