use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Deletes a request's staged files exactly once: on `cleanup()` or, failing that, on drop.
///
/// The output image is only registered after it passed the staging-root containment
/// check, so the guard never touches a path outside the staging directory.
#[derive(Debug)]
pub struct CleanupGuard {
    input: PathBuf,
    output: Option<PathBuf>,
    done: bool,
}

impl CleanupGuard {
    pub fn new(input: PathBuf) -> Self {
        Self {
            input,
            output: None,
            done: false,
        }
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    /// True for files named after the staged input, like `<stem>_analysis.png`.
    /// The stem carries a uuid, so no other request can own such a name.
    pub fn is_derived_output(&self, path: &Path) -> bool {
        let (Some(stem), Some(name)) = (self.input.file_stem(), path.file_name()) else {
            return false;
        };
        Some(name) != self.input.file_name()
            && name
                .to_string_lossy()
                .starts_with(stem.to_string_lossy().as_ref())
    }

    pub fn register_output(&mut self, path: PathBuf) {
        self.output = Some(path);
    }

    /// Each removal is attempted independently; failures are logged and swallowed.
    pub fn cleanup(&mut self) {
        if self.done {
            return;
        }
        self.done = true;

        remove_quietly(&self.input);
        if let Some(output) = &self.output {
            remove_quietly(output);
        }
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        if !self.done {
            log::debug!("Cleaning up {} from drop", self.input.display());
            self.cleanup();
        }
    }
}

fn remove_quietly(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => log::debug!("Removed {}", path.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => log::warn!("Failed to remove {}: {}", path.display(), e),
    }
}
