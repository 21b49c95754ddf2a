use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::configuration::SessionConfiguration;
use crate::error::{resource_io_error, ErrorKind, SessionError};
use crate::handle::Handle;
use crate::session::Session;

/// A script of session operations, to be replayed into a PDF document. Resources are
/// loaded under a symbolic name which the later operations refer to.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// The document identifier, overriding the one of the configuration.
    #[serde(default)]
    pub document_id: Option<String>,
    #[serde(default)]
    pub configuration: Option<SessionConfiguration>,
    pub operations: Vec<Operation>,
}

fn default_usage() -> String {
    "both".to_string()
}

fn default_encoding() -> String {
    "auto".to_string()
}

fn default_image_type() -> String {
    "auto".to_string()
}

fn default_alignment() -> String {
    "left".to_string()
}

/// The operations which a script can contain, one per session call.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Operation {
    BeginPage {
        width: f32,
        height: f32,
    },
    EndPage,
    Save,
    Restore,
    Translate {
        x: f32,
        y: f32,
    },
    Rotate {
        angle: f32,
    },
    Scale {
        x: f32,
        y: f32,
    },
    Concat {
        matrix: [f32; 6],
    },
    SetLineWidth {
        width: f32,
    },
    SetDash {
        black: f32,
        white: f32,
    },
    #[serde(rename_all = "camelCase")]
    SetColor {
        #[serde(default = "default_usage")]
        usage: String,
        color_space: String,
        components: Vec<f32>,
    },
    MoveTo {
        x: f32,
        y: f32,
    },
    LineTo {
        x: f32,
        y: f32,
    },
    CurveTo {
        points: [f32; 6],
    },
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    Circle {
        x: f32,
        y: f32,
        radius: f32,
    },
    Arc {
        x: f32,
        y: f32,
        radius: f32,
        start: f32,
        end: f32,
    },
    ClosePath,
    Fill,
    Stroke,
    FillStroke,
    Clip,
    EndPath,
    LoadFont {
        name: String,
        font: String,
        #[serde(default = "default_encoding")]
        encoding: String,
        #[serde(default)]
        options: String,
    },
    SetFont {
        font: String,
        size: f32,
    },
    SetTextPos {
        x: f32,
        y: f32,
    },
    Show {
        text: String,
    },
    ShowXy {
        text: String,
        x: f32,
        y: f32,
    },
    ContinueText {
        text: String,
    },
    ShowBoxed {
        text: String,
        left: f32,
        bottom: f32,
        width: f32,
        height: f32,
        #[serde(default = "default_alignment")]
        alignment: String,
    },
    FitTextline {
        text: String,
        x: f32,
        y: f32,
        #[serde(default)]
        options: String,
    },
    #[serde(rename_all = "camelCase")]
    LoadImage {
        name: String,
        file: String,
        #[serde(default = "default_image_type")]
        image_type: String,
        #[serde(default)]
        options: String,
    },
    FitImage {
        image: String,
        x: f32,
        y: f32,
        #[serde(default)]
        options: String,
    },
    SetInfo {
        key: String,
        value: String,
    },
    AddBookmark {
        /// The name later bookmarks can use as their parent.
        #[serde(default)]
        name: Option<String>,
        text: String,
        #[serde(default)]
        parent: Option<String>,
        #[serde(default)]
        open: bool,
    },
    AddWeblink {
        rectangle: [f32; 4],
        url: String,
    },
    SetParameter {
        key: String,
        value: String,
    },
    SetValue {
        key: String,
        value: f32,
    },
}

impl Document {
    pub fn from_path(document_path: &Path) -> Result<Document, SessionError> {
        let document_content = std::fs::read_to_string(document_path).map_err(|error| {
            resource_io_error(
                format!("Unable to read the document {:?}", document_path),
                &error,
            )
        })?;
        let document: Document = serde_json::from_str(&document_content).map_err(|error| {
            SessionError::with_error(
                ErrorKind::Format,
                format!("Unable to parse the document {:?}", document_path),
                &error,
            )
        })?;

        Ok(document)
    }

    /// Replays the document into a PDF file.
    pub fn render(&self, destination: &Path) -> Result<(), SessionError> {
        let destination = destination.to_string_lossy();
        if destination.is_empty() {
            return Err(SessionError::argument("The destination path is empty"));
        }
        let mut session = Session::open_with_configuration(&destination, self.session_configuration())?;
        self.replay(&mut session)?;
        session.close()
    }

    /// Replays the document in memory, returning the PDF data.
    pub fn to_pdf_bytes(&self) -> Result<Vec<u8>, SessionError> {
        let mut session = Session::open_with_configuration("", self.session_configuration())?;
        self.replay(&mut session)?;
        session.close()?;
        session.get_output_buffer()
    }

    fn session_configuration(&self) -> SessionConfiguration {
        let mut configuration = self.configuration.clone().unwrap_or_default();
        if let Some(document_id) = &self.document_id {
            configuration.document_identifier = Some(document_id.clone());
        }
        configuration
    }

    fn replay(&self, session: &mut Session) -> Result<(), SessionError> {
        let mut handles: HashMap<String, Handle> = HashMap::new();
        let mut bookmarks: HashMap<String, u32> = HashMap::new();
        let handle = |handles: &HashMap<String, Handle>, name: &str| -> Result<Handle, SessionError> {
            handles.get(name).copied().ok_or_else(|| {
                SessionError::argument(format!("No resource was loaded under the name {:?}", name))
            })
        };

        for (index, operation) in self.operations.iter().enumerate() {
            log::trace!("Replaying operation {}: {:?}", index, operation);
            match operation {
                Operation::BeginPage { width, height } => session.begin_page(*width, *height)?,
                Operation::EndPage => session.end_page()?,
                Operation::Save => session.save()?,
                Operation::Restore => session.restore()?,
                Operation::Translate { x, y } => session.translate(*x, *y)?,
                Operation::Rotate { angle } => session.rotate(*angle)?,
                Operation::Scale { x, y } => session.scale(*x, *y)?,
                Operation::Concat { matrix } => {
                    let [a, b, c, d, e, f] = *matrix;
                    session.concat(a, b, c, d, e, f)?
                }
                Operation::SetLineWidth { width } => session.setlinewidth(*width)?,
                Operation::SetDash { black, white } => session.setdash(*black, *white)?,
                Operation::SetColor {
                    usage,
                    color_space,
                    components,
                } => {
                    let mut padded = [0.0; 4];
                    for (slot, component) in padded.iter_mut().zip(components) {
                        *slot = *component;
                    }
                    let [c1, c2, c3, c4] = padded;
                    session.setcolor(usage, color_space, c1, c2, c3, c4)?
                }
                Operation::MoveTo { x, y } => session.moveto(*x, *y)?,
                Operation::LineTo { x, y } => session.lineto(*x, *y)?,
                Operation::CurveTo { points } => {
                    let [x1, y1, x2, y2, x3, y3] = *points;
                    session.curveto(x1, y1, x2, y2, x3, y3)?
                }
                Operation::Rect {
                    x,
                    y,
                    width,
                    height,
                } => session.rect(*x, *y, *width, *height)?,
                Operation::Circle { x, y, radius } => session.circle(*x, *y, *radius)?,
                Operation::Arc {
                    x,
                    y,
                    radius,
                    start,
                    end,
                } => session.arc(*x, *y, *radius, *start, *end)?,
                Operation::ClosePath => session.closepath()?,
                Operation::Fill => session.fill()?,
                Operation::Stroke => session.stroke()?,
                Operation::FillStroke => session.fill_stroke()?,
                Operation::Clip => session.clip()?,
                Operation::EndPath => session.endpath()?,
                Operation::LoadFont {
                    name,
                    font,
                    encoding,
                    options,
                } => {
                    let font = session.load_font(font, encoding, options)?;
                    handles.insert(name.clone(), font);
                }
                Operation::SetFont { font, size } => {
                    session.setfont(handle(&handles, font)?, *size)?
                }
                Operation::SetTextPos { x, y } => session.set_text_pos(*x, *y)?,
                Operation::Show { text } => session.show(text)?,
                Operation::ShowXy { text, x, y } => session.show_xy(text, *x, *y)?,
                Operation::ContinueText { text } => session.continue_text(text)?,
                Operation::ShowBoxed {
                    text,
                    left,
                    bottom,
                    width,
                    height,
                    alignment,
                } => {
                    let remaining =
                        session.show_boxed(text, *left, *bottom, *width, *height, alignment, "")?;
                    if remaining > 0 {
                        log::warn!(
                            "{} characters did not fit into the box of operation {}",
                            remaining,
                            index
                        );
                    }
                }
                Operation::FitTextline { text, x, y, options } => {
                    session.fit_textline(text, *x, *y, options)?
                }
                Operation::LoadImage {
                    name,
                    file,
                    image_type,
                    options,
                } => {
                    let image = session.load_image(image_type, file, options)?;
                    handles.insert(name.clone(), image);
                }
                Operation::FitImage {
                    image,
                    x,
                    y,
                    options,
                } => session.fit_image(handle(&handles, image)?, *x, *y, options)?,
                Operation::SetInfo { key, value } => session.set_info(key, value)?,
                Operation::AddBookmark {
                    name,
                    text,
                    parent,
                    open,
                } => {
                    let parent = match parent {
                        Some(parent) => *bookmarks.get(parent).ok_or_else(|| {
                            SessionError::argument(format!("No bookmark is named {:?}", parent))
                        })?,
                        None => 0,
                    };
                    let bookmark = session.add_bookmark(text, parent, *open)?;
                    if let Some(name) = name {
                        bookmarks.insert(name.clone(), bookmark);
                    }
                }
                Operation::AddWeblink { rectangle, url } => {
                    let [llx, lly, urx, ury] = *rectangle;
                    session.add_weblink(llx, lly, urx, ury, url)?
                }
                Operation::SetParameter { key, value } => session.set_parameter(key, value)?,
                Operation::SetValue { key, value } => session.set_value(key, *value)?,
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operations_are_tagged_in_kebab_case() {
        let document: Document = serde_json::from_str(
            r#"{
                "documentId": "script",
                "operations": [
                    { "type": "begin-page", "width": 200, "height": 100 },
                    { "type": "load-font", "name": "body", "font": "Helvetica" },
                    { "type": "set-font", "font": "body", "size": 12 },
                    { "type": "show-xy", "text": "Hello", "x": 10, "y": 50 },
                    { "type": "set-color", "colorSpace": "rgb", "components": [1, 0, 0] },
                    { "type": "end-page" }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(document.operations.len(), 6);
        assert_eq!(
            document.operations[4],
            Operation::SetColor {
                usage: "both".into(),
                color_space: "rgb".into(),
                components: vec![1.0, 0.0, 0.0],
            }
        );
        let bytes = document.to_pdf_bytes().unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
    }

    #[test]
    fn unknown_symbolic_names_are_rejected() {
        let document = Document {
            document_id: None,
            configuration: None,
            operations: vec![
                Operation::BeginPage {
                    width: 100.0,
                    height: 100.0,
                },
                Operation::SetFont {
                    font: "missing".into(),
                    size: 10.0,
                },
            ],
        };
        let error = document.to_pdf_bytes().unwrap_err();
        assert_eq!(error.kind, ErrorKind::Argument);
    }
}
