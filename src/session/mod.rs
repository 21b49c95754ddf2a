//! The document session: a stateful facade which owns the PDF under construction together
//! with every resource loaded into it.
//!
//! Each operation either succeeds or fails with a [`SessionError`]; the outcome of the
//! latest operation is also kept on the session and can be inspected through
//! [`Session::get_last_error`], [`Session::get_errnum`], [`Session::get_errmsg`] and
//! [`Session::get_apiname`].

mod content;
mod parameters;
mod resources;
mod text;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use lopdf::content::Operation;
use lopdf::{Dictionary, Object, ObjectId, StringFormat};
use rand::distributions::Alphanumeric;
use rand::Rng;
use time::OffsetDateTime;

use crate::configuration::SessionConfiguration;
use crate::engine;
use crate::error::{ErrorKind, SessionError};
use crate::graphics::{check_finite, GraphicsStack};
use crate::handle::{Handle, ResourceKind, ResourceTable, Tagged};
use crate::import::{ImportedDocument, ImportedPage};
use crate::path::{FillRule, PathBuilder};
use crate::pdf::{Canvas, DocumentFinish, PdfDocument};
use crate::vfs::VirtualFiles;

/// A resource registered in the session, addressed by a handle.
pub(crate) enum Resource {
    Font {
        index: usize,
    },
    Image {
        object_id: ObjectId,
        width: f32,
        height: f32,
    },
    ImportedDocument(ImportedDocument),
    ImportedPage(ImportedPage),
    IccProfile {
        color_space_id: ObjectId,
        components: usize,
    },
    GState {
        object_id: ObjectId,
        settings: resources::GStateSettings,
    },
    Shading {
        object_id: ObjectId,
    },
    Template {
        object_id: ObjectId,
        width: f32,
        height: f32,
        finished: bool,
    },
}

impl Tagged for Resource {
    fn kind(&self) -> ResourceKind {
        match self {
            Resource::Font { .. } => ResourceKind::Font,
            Resource::Image { .. } => ResourceKind::Image,
            Resource::ImportedDocument(_) => ResourceKind::ImportedDocument,
            Resource::ImportedPage(_) => ResourceKind::ImportedPage,
            Resource::IccProfile { .. } => ResourceKind::IccProfile,
            Resource::GState { .. } => ResourceKind::GState,
            Resource::Shading { .. } => ResourceKind::Shading,
            Resource::Template { .. } => ResourceKind::Template,
        }
    }
}

/// Where the content operations currently go.
enum Scope {
    Document,
    Page(Canvas),
    Template { handle: Handle, canvas: Canvas },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Open,
    Closed,
    Disposed,
}

enum Destination {
    File {
        path: PathBuf,
        writer: Option<BufWriter<File>>,
    },
    Memory {
        buffer: Option<Vec<u8>>,
    },
}

/// The position of the text cursor and the start of the current line.
#[derive(Debug, Clone, Copy, PartialEq)]
struct TextCursor {
    x: f32,
    y: f32,
    line_x: f32,
    line_y: f32,
}

/// One PDF document under construction.
pub struct Session {
    id: u32,
    configuration: SessionConfiguration,
    lifecycle: Lifecycle,
    destination: Destination,
    document: PdfDocument,
    scope: Scope,
    resources: ResourceTable<Resource>,
    virtual_files: VirtualFiles,
    graphics: GraphicsStack,
    path: PathBuilder,
    text_cursor: Option<TextCursor>,
    fill_rule: FillRule,
    /// The keyword of the `openmode` parameter, when it was set.
    open_mode: Option<String>,
    last_error: Option<SessionError>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Session")
            .field("id", &self.id)
            .field("lifecycle", &self.lifecycle)
            .field("pages", &self.document.page_count())
            .field("last_error", &self.last_error)
            .finish()
    }
}

impl Session {
    /// Opens a session writing to the given file, or to memory when the destination is empty.
    pub fn open(destination: &str) -> Result<Session, SessionError> {
        Session::open_with_configuration(destination, SessionConfiguration::default())
    }

    pub fn open_with_configuration(
        destination: &str,
        configuration: SessionConfiguration,
    ) -> Result<Session, SessionError> {
        let destination = if destination.is_empty() {
            Destination::Memory { buffer: None }
        } else {
            let path = PathBuf::from(destination);
            let file = File::create(&path).map_err(|error| {
                SessionError::with_error(
                    ErrorKind::Io,
                    format!("Unable to create the output file {:?}", path),
                    &error,
                )
                .in_operation("open")
            })?;
            Destination::File {
                path,
                writer: Some(BufWriter::new(file)),
            }
        };

        let id = engine::register_session();
        log::debug!("Opened session {}", id);
        Ok(Session {
            id,
            document: PdfDocument::new(&configuration.pdf_version),
            configuration,
            lifecycle: Lifecycle::Open,
            destination,
            scope: Scope::Document,
            resources: ResourceTable::new(id),
            virtual_files: VirtualFiles::default(),
            graphics: GraphicsStack::default(),
            path: PathBuilder::default(),
            text_cursor: None,
            fill_rule: FillRule::default(),
            open_mode: None,
            last_error: None,
        })
    }

    /// The identifier of the session, which is also encoded in its handles.
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn configuration(&self) -> &SessionConfiguration {
        &self.configuration
    }

    /// Finishes the document and writes it to the destination.
    pub fn close(&mut self) -> Result<(), SessionError> {
        self.track("close", |session| {
            match session.scope {
                Scope::Document => (),
                Scope::Page(_) => return Err(SessionError::state("A page is still open")),
                Scope::Template { .. } => {
                    return Err(SessionError::state("A template is still open"))
                }
            }
            if session.document.page_count() == 0 {
                return Err(SessionError::state("The document contains no pages"));
            }

            let finish = session.finish_settings()?;
            session.document.finish(&finish)?;
            // A finished document takes no more content, so the session closes even when
            // the output cannot be written
            let written = session.write_output();
            session.lifecycle = Lifecycle::Closed;
            session.resources.clear();
            written?;
            log::debug!(
                "Closed session {} with {} pages",
                session.id,
                session.document.page_count()
            );
            Ok(())
        })
    }

    fn write_output(&mut self) -> Result<(), SessionError> {
        match &mut self.destination {
            Destination::File { path, writer } => {
                let mut writer = writer
                    .take()
                    .ok_or_else(|| SessionError::state("The output file is gone"))?;
                self.document.save_to(&mut writer)?;
                writer.flush().map_err(|error| {
                    SessionError::with_error(
                        ErrorKind::Io,
                        format!("Failed to write the output file {:?}", path),
                        &error,
                    )
                })
            }
            Destination::Memory { buffer } => {
                let mut bytes = Vec::new();
                self.document.save_to(&mut bytes)?;
                *buffer = Some(bytes);
                Ok(())
            }
        }
    }

    /// The finished document of a session which was opened without a destination file.
    pub fn get_output_buffer(&mut self) -> Result<Vec<u8>, SessionError> {
        self.track_any("get_output_buffer", |session| {
            match (&session.lifecycle, &session.destination) {
                (Lifecycle::Closed, Destination::Memory { buffer: Some(buffer) }) => {
                    Ok(buffer.clone())
                }
                (Lifecycle::Closed, Destination::File { .. }) => Err(SessionError::state(
                    "The document was written to a file and not to memory",
                )),
                _ => Err(SessionError::state("The document has not been closed yet")),
            }
        })
    }

    /// The error of the latest operation, `None` if it succeeded.
    pub fn get_last_error(&self) -> Option<&SessionError> {
        self.last_error.as_ref()
    }

    /// The code of the latest error, 0 if the latest operation succeeded.
    pub fn get_errnum(&self) -> i32 {
        self.last_error.as_ref().map_or(0, SessionError::code)
    }

    /// The message of the latest error, empty if the latest operation succeeded.
    pub fn get_errmsg(&self) -> String {
        self.last_error
            .as_ref()
            .map(SessionError::message)
            .unwrap_or_default()
    }

    /// The name of the operation which failed latest, empty if the latest operation succeeded.
    pub fn get_apiname(&self) -> String {
        self.last_error
            .as_ref()
            .map(|error| error.operation.clone())
            .unwrap_or_default()
    }

    /// Releases every resource of the session. It can be called any number of times and
    /// runs when the session is dropped.
    pub fn dispose(&mut self) {
        if self.lifecycle == Lifecycle::Disposed {
            return;
        }
        if !matches!(self.scope, Scope::Document) {
            log::warn!("Session {} disposed with an open page or template", self.id);
        }
        if self.lifecycle == Lifecycle::Open {
            log::debug!("Session {} disposed without being closed", self.id);
        }
        self.scope = Scope::Document;
        self.resources.clear();
        self.virtual_files.clear();
        self.path.take();
        if let Destination::File { writer, .. } = &mut self.destination {
            writer.take();
        }
        self.lifecycle = Lifecycle::Disposed;
        engine::release_session(self.id);
        log::debug!("Disposed session {}", self.id);
    }

    pub fn begin_page(&mut self, width: f32, height: f32) -> Result<(), SessionError> {
        self.track("begin_page", |session| {
            session.require_document_scope()?;
            check_size(width, height)?;
            let page_id = session.document.reserve_object();
            session.scope = Scope::Page(Canvas::new(page_id, width, height));
            session.reset_content_state();
            log::debug!(
                "Began page {} of {}x{}",
                session.document.page_count() + 1,
                width,
                height
            );
            Ok(())
        })
    }

    pub fn end_page(&mut self) -> Result<(), SessionError> {
        self.track("end_page", |session| {
            if !matches!(session.scope, Scope::Page(_)) {
                return Err(SessionError::state("There is no open page"));
            }
            session.check_balanced()?;
            let Scope::Page(canvas) = std::mem::replace(&mut session.scope, Scope::Document) else {
                return Err(SessionError::state("There is no open page"));
            };
            session.document.add_page(canvas)?;
            session.reset_content_state();
            log::debug!("Ended page {}", session.document.page_count());
            Ok(())
        })
    }

    /// Runs an operation which needs an open session and records its outcome.
    fn track<T>(
        &mut self,
        operation: &str,
        run: impl FnOnce(&mut Session) -> Result<T, SessionError>,
    ) -> Result<T, SessionError> {
        self.track_any(operation, |session| {
            if session.lifecycle == Lifecycle::Closed {
                return Err(SessionError::state("The document has already been closed"));
            }
            run(session)
        })
    }

    /// Runs an operation which is also valid after closing and records its outcome.
    fn track_any<T>(
        &mut self,
        operation: &str,
        run: impl FnOnce(&mut Session) -> Result<T, SessionError>,
    ) -> Result<T, SessionError> {
        let result = if self.lifecycle == Lifecycle::Disposed {
            Err(SessionError::state("The session has been disposed"))
        } else {
            run(self)
        };
        match result {
            Ok(value) => {
                self.last_error = None;
                Ok(value)
            }
            Err(error) => {
                let error = error.in_operation(operation);
                log::debug!("Session {} failed: {}", self.id, error);
                self.last_error = Some(error.clone());
                Err(error)
            }
        }
    }

    fn require_document_scope(&self) -> Result<(), SessionError> {
        match self.scope {
            Scope::Document => Ok(()),
            Scope::Page(_) => Err(SessionError::state("A page is already open")),
            Scope::Template { .. } => Err(SessionError::state("A template is still open")),
        }
    }

    /// The page or template receiving the content, for operations that cannot happen
    /// while a path is being constructed.
    fn canvas(&mut self) -> Result<&mut Canvas, SessionError> {
        if !self.path.is_empty() {
            return Err(SessionError::state(
                "The operation is not allowed while a path is being constructed",
            ));
        }
        self.path_canvas()
    }

    /// The page or template receiving the content.
    fn path_canvas(&mut self) -> Result<&mut Canvas, SessionError> {
        match &mut self.scope {
            Scope::Page(canvas) | Scope::Template { canvas, .. } => Ok(canvas),
            Scope::Document => Err(SessionError::state("There is no open page or template")),
        }
    }

    fn emit(&mut self, operations: impl IntoIterator<Item = Operation>) -> Result<(), SessionError> {
        self.canvas()?.operations.extend(operations);
        Ok(())
    }

    /// Every save must have been restored and no path may be pending.
    fn check_balanced(&self) -> Result<(), SessionError> {
        if !self.path.is_empty() {
            return Err(SessionError::state("A path is still being constructed"));
        }
        if self.graphics.depth() > 0 {
            return Err(SessionError::state(format!(
                "{} saved graphics states have not been restored",
                self.graphics.depth()
            )));
        }
        Ok(())
    }

    fn reset_content_state(&mut self) {
        self.graphics = GraphicsStack::default();
        self.path.take();
        self.text_cursor = None;
    }

    fn finish_settings(&self) -> Result<DocumentFinish, SessionError> {
        let date = match self.configuration.timestamp {
            Some(timestamp) => OffsetDateTime::from_unix_timestamp(timestamp).map_err(|error| {
                SessionError::with_error(
                    ErrorKind::Argument,
                    format!("Invalid timestamp {}", timestamp),
                    &error,
                )
            })?,
            None => OffsetDateTime::now_utc(),
        };
        let identifier = self
            .configuration
            .document_identifier
            .clone()
            .unwrap_or_else(random_identifier);
        // A fixed identifier and timestamp make the output reproducible
        let instance_id = match self.configuration.timestamp {
            Some(_) => identifier.clone(),
            None => random_identifier(),
        };
        let page_mode = self.open_mode.as_deref().map(|mode| match mode {
            "outlines" => "UseOutlines",
            "fullscreen" => "FullScreen",
            _ => "UseNone",
        });

        Ok(DocumentFinish {
            identifier,
            instance_id,
            date,
            compress: self.configuration.compress,
            page_mode,
        })
    }

    /// Reads a resource through the virtual files and the search paths.
    fn read_resource(&self, name: &str) -> Result<Vec<u8>, SessionError> {
        self.virtual_files
            .read(name, &self.configuration.search_paths)
    }

    pub fn create_virtual_file(
        &mut self,
        name: &str,
        data: &[u8],
        optlist: &str,
    ) -> Result<(), SessionError> {
        self.track("create_virtual_file", |session| {
            crate::options::OptionList::parse_with_keys(optlist, &[])?;
            session.virtual_files.create(name, data.to_vec())
        })
    }

    pub fn delete_virtual_file(&mut self, name: &str) -> Result<(), SessionError> {
        self.track("delete_virtual_file", |session| session.virtual_files.delete(name))
    }

    /// Sets an entry of the document information dictionary.
    pub fn set_info(&mut self, key: &str, value: &str) -> Result<(), SessionError> {
        self.track("set_info", |session| {
            match key {
                "" => return Err(SessionError::argument("The information key is empty")),
                "Producer" | "CreationDate" | "ModDate" => {
                    return Err(SessionError::argument(format!(
                        "The information key {:?} is reserved",
                        key
                    )))
                }
                "Trapped" if !matches!(value, "True" | "False" | "Unknown") => {
                    return Err(SessionError::argument(format!(
                        "Trapped must be True, False or Unknown, got {:?}",
                        value
                    )))
                }
                _ => (),
            }
            session.document.set_info(key, value);
            Ok(())
        })
    }

    /// Adds an outline entry pointing to the current page, `parent` 0 adds it at the top level.
    pub fn add_bookmark(&mut self, text: &str, parent: u32, open: bool) -> Result<u32, SessionError> {
        self.track("add_bookmark", |session| {
            let Scope::Page(canvas) = &session.scope else {
                return Err(SessionError::state("Bookmarks need an open page"));
            };
            let page_id = canvas.object_id;
            let bookmark = session
                .document
                .add_bookmark(text, parent as usize, open, page_id)?;
            Ok(bookmark as u32)
        })
    }

    /// Adds a link to the given URL over a rectangle of the current page.
    pub fn add_weblink(
        &mut self,
        llx: f32,
        lly: f32,
        urx: f32,
        ury: f32,
        url: &str,
    ) -> Result<(), SessionError> {
        self.track("add_weblink", |session| {
            check_finite(&[llx, lly, urx, ury])?;
            if url.is_empty() {
                return Err(SessionError::argument("The link URL is empty"));
            }
            let transformation = session.graphics.current.transformation;
            let Scope::Page(canvas) = &mut session.scope else {
                return Err(SessionError::state("Links need an open page"));
            };

            // Annotations live in default user space
            let corners = [(llx, lly), (urx, lly), (urx, ury), (llx, ury)]
                .map(|(x, y)| transformation.transform_point(x, y));
            let (mut left, mut bottom, mut right, mut top) =
                (f32::MAX, f32::MAX, f32::MIN, f32::MIN);
            for (x, y) in corners {
                left = left.min(x);
                bottom = bottom.min(y);
                right = right.max(x);
                top = top.max(y);
            }

            let action = Dictionary::from_iter(vec![
                ("S", Object::Name("URI".into())),
                ("URI", Object::String(url.as_bytes().to_vec(), StringFormat::Literal)),
            ]);
            canvas.annotations.push(Dictionary::from_iter(vec![
                ("Type", Object::Name("Annot".into())),
                ("Subtype", Object::Name("Link".into())),
                (
                    "Rect",
                    Object::Array(
                        [left, bottom, right, top]
                            .into_iter()
                            .map(Object::Real)
                            .collect(),
                    ),
                ),
                (
                    "Border",
                    Object::Array(vec![
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Integer(0),
                    ]),
                ),
                ("A", Object::Dictionary(action)),
            ]));
            Ok(())
        })
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.dispose();
    }
}

pub(crate) fn check_size(width: f32, height: f32) -> Result<(), SessionError> {
    if width > 0.0 && height > 0.0 && width.is_finite() && height.is_finite() {
        Ok(())
    } else {
        Err(SessionError::argument(format!(
            "The size must be positive, got {}x{}",
            width, height
        )))
    }
}

/// The name a resource is referred to with in content streams.
pub(crate) fn resource_name(prefix: &str, handle: Handle) -> String {
    format!("{}{}", prefix, handle.slot())
}

fn random_identifier() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_outcome_replaces_the_last_error() {
        let mut session = Session::open("").unwrap();
        assert!(session.end_page().is_err());
        assert_eq!(session.get_errnum(), ErrorKind::State.code());
        assert_eq!(session.get_apiname(), "end_page");
        session.begin_page(100.0, 100.0).unwrap();
        assert_eq!(session.get_errnum(), 0);
        assert!(session.get_errmsg().is_empty());
        assert!(session.get_last_error().is_none());
    }

    #[test]
    fn disposed_sessions_refuse_every_operation() {
        let mut session = Session::open("").unwrap();
        session.dispose();
        session.dispose();
        let error = session.begin_page(10.0, 10.0).unwrap_err();
        assert_eq!(error.kind, ErrorKind::State);
        assert!(session.get_output_buffer().is_err());
    }

    #[test]
    fn info_keys_are_validated() {
        let mut session = Session::open("").unwrap();
        assert!(session.set_info("Title", "A title").is_ok());
        assert_eq!(
            session.set_info("Producer", "me").unwrap_err().kind,
            ErrorKind::Argument
        );
        assert!(session.set_info("Trapped", "Maybe").is_err());
        assert!(session.set_info("Trapped", "True").is_ok());
    }
}
