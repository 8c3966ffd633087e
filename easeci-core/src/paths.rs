//! Filesystem layout of the EaseCI workspace.
//!
//! ```text
//! <home>/.easeci/
//!   workspace/
//!     projects-structure.json   (mode 0600)
//! ```

use std::path::{Path, PathBuf};

use crate::error::RegistryError;

pub const EASECI_DIR: &str = ".easeci";
pub const WORKSPACE_DIR: &str = "workspace";
pub const PROJECTS_STRUCTURE_FILE: &str = "projects-structure.json";

pub fn easeci_root(home: &Path) -> PathBuf {
    home.join(EASECI_DIR)
}

pub fn workspace_dir(home: &Path) -> PathBuf {
    easeci_root(home).join(WORKSPACE_DIR)
}

/// `<home>/.easeci/workspace/projects-structure.json`; pure, no I/O.
pub fn projects_structure_path(home: &Path) -> PathBuf {
    workspace_dir(home).join(PROJECTS_STRUCTURE_FILE)
}

/// The current user's home directory.
pub fn home() -> Result<PathBuf, RegistryError> {
    dirs::home_dir().ok_or(RegistryError::HomeNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projects_structure_path_is_correct() {
        let path = projects_structure_path(Path::new("/home/ci"));
        assert_eq!(
            path,
            PathBuf::from("/home/ci/.easeci/workspace/projects-structure.json")
        );
    }
}
