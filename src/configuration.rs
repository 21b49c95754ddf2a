use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{resource_io_error, ErrorKind, SessionError};

/// The settings a session starts from. They can be read from a JSON file and are
/// afterwards adjusted at runtime through `Session::set_parameter` and `Session::set_value`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionConfiguration {
    /// Directories searched, in order, for fonts, images, PDF documents and ICC profiles.
    pub search_paths: Vec<PathBuf>,
    /// Explicit associations between font names and TrueType font files.
    pub font_associations: Vec<FontAssociation>,
    /// Whether the streams are flate-compressed when the document is closed.
    pub compress: bool,
    /// The version written in the PDF header.
    pub pdf_version: String,
    /// The first entry of the trailer `ID`, random when absent.
    pub document_identifier: Option<String>,
    /// The UNIX timestamp used for the creation and modification dates, now when absent.
    pub timestamp: Option<i64>,
}

impl Default for SessionConfiguration {
    fn default() -> Self {
        SessionConfiguration {
            search_paths: Vec::new(),
            font_associations: Vec::new(),
            compress: true,
            pdf_version: "1.5".into(),
            document_identifier: None,
            timestamp: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FontAssociation {
    pub font_family: String,
    pub font_file_path: PathBuf,
}

impl SessionConfiguration {
    pub fn from_path(configuration_file_path: &Path) -> Result<Self, SessionError> {
        let configuration_file_contents = std::fs::read_to_string(configuration_file_path)
            .map_err(|error| {
                resource_io_error(
                    format!(
                        "Failed to read the configuration file {:?}",
                        configuration_file_path
                    ),
                    &error,
                )
            })?;
        let configuration: SessionConfiguration =
            serde_json::from_str(&configuration_file_contents).map_err(|error| {
                SessionError::with_error(
                    ErrorKind::Format,
                    format!(
                        "Failed to parse the configuration file {:?}",
                        configuration_file_path
                    ),
                    &error,
                )
            })?;

        Ok(configuration)
    }

    pub fn get_font_path(&self, font_family: &str) -> Option<PathBuf> {
        self.font_associations
            .iter()
            .find(|font_association| font_association.font_family == font_family)
            .map(|font_association| font_association.font_file_path.clone())
    }

    /// Registers a font association, replacing an existing one for the same family.
    pub(crate) fn associate_font(&mut self, font_family: &str, font_file_path: PathBuf) {
        self.font_associations
            .retain(|font_association| font_association.font_family != font_family);
        self.font_associations.push(FontAssociation {
            font_family: font_family.to_string(),
            font_file_path,
        });
    }
}
