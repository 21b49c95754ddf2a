use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{resource_io_error, ErrorKind, SessionError};

/// In-memory files which take precedence over the file system when resources are resolved.
#[derive(Debug, Default)]
pub(crate) struct VirtualFiles {
    files: HashMap<String, Vec<u8>>,
}

impl VirtualFiles {
    pub(crate) fn create(&mut self, name: &str, data: Vec<u8>) -> Result<(), SessionError> {
        if name.is_empty() {
            return Err(SessionError::argument("A virtual file needs a name"));
        }
        if self.files.contains_key(name) {
            return Err(SessionError::argument(format!(
                "The virtual file {:?} already exists",
                name
            )));
        }
        log::trace!("Created the virtual file {:?} of {} bytes", name, data.len());
        self.files.insert(name.to_string(), data);
        Ok(())
    }

    pub(crate) fn delete(&mut self, name: &str) -> Result<(), SessionError> {
        self.files.remove(name).map(|_| ()).ok_or_else(|| {
            SessionError::with_context(
                ErrorKind::ResourceNotFound,
                format!("There is no virtual file named {:?}", name),
            )
        })
    }

    pub(crate) fn clear(&mut self) {
        self.files.clear();
    }

    /// Reads the first of the candidate names which can be found, looking at the virtual
    /// files, then at the name as a path and finally in every search path.
    pub(crate) fn read_any(
        &self,
        candidates: &[String],
        search_paths: &[PathBuf],
    ) -> Result<(String, Vec<u8>), SessionError> {
        for candidate in candidates {
            if let Some(data) = self.files.get(candidate) {
                return Ok((candidate.clone(), data.clone()));
            }
        }
        for candidate in candidates {
            let direct_path = Path::new(candidate);
            let locations = std::iter::once(direct_path.to_path_buf()).chain(
                // Absolute names are not looked up in the search paths
                search_paths
                    .iter()
                    .filter(|_| direct_path.is_relative())
                    .map(|search_path| search_path.join(candidate)),
            );
            for location in locations {
                if location.is_file() {
                    let data = std::fs::read(&location).map_err(|error| {
                        resource_io_error(format!("Failed to read {:?}", location), &error)
                    })?;
                    log::trace!("Resolved {:?} to {:?}", candidate, location);
                    return Ok((candidate.clone(), data));
                }
            }
        }

        Err(SessionError::with_context(
            ErrorKind::ResourceNotFound,
            format!(
                "Unable to find {:?} in the virtual files or the search paths",
                candidates.first().map(String::as_str).unwrap_or_default()
            ),
        ))
    }

    pub(crate) fn read(&self, name: &str, search_paths: &[PathBuf]) -> Result<Vec<u8>, SessionError> {
        self.read_any(&[name.to_string()], search_paths)
            .map(|(_, data)| data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn virtual_files_shadow_the_file_system() {
        let mut files = VirtualFiles::default();
        files.create("Cargo.toml", b"virtual".to_vec()).unwrap();
        assert_eq!(files.read("Cargo.toml", &[]).unwrap(), b"virtual");
        files.delete("Cargo.toml").unwrap();
        assert_ne!(files.read("Cargo.toml", &[]).unwrap(), b"virtual");
    }

    #[test]
    fn duplicate_and_unknown_names_are_rejected() {
        let mut files = VirtualFiles::default();
        files.create("a", vec![1]).unwrap();
        assert_eq!(files.create("a", vec![2]).unwrap_err().kind, ErrorKind::Argument);
        assert_eq!(
            files.delete("b").unwrap_err().kind,
            ErrorKind::ResourceNotFound
        );
    }

    #[test]
    fn search_paths_are_consulted() {
        let files = VirtualFiles::default();
        let data = files
            .read("lib.rs", &[PathBuf::from("does-not-exist"), PathBuf::from("src")])
            .unwrap();
        assert!(!data.is_empty());
        let error = files.read("no-such-file.bin", &[PathBuf::from("src")]).unwrap_err();
        assert_eq!(error.kind, ErrorKind::ResourceNotFound);
    }
}
