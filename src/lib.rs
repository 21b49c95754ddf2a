//! pdfscribe is a session-oriented interface for the generation of PDF documents. A `Session`
//! is opened on a destination (a file, or memory), receives pages, graphics, text and
//! resources through a flat set of operations, and writes the finished document when closed.
//!
//! Every resource loaded into a session (fonts, images, imported PDF pages, ICC profiles,
//! graphics states, shadings and templates) is referred to by an opaque `Handle`, which is
//! only valid within the session that issued it. Failures are reported as `SessionError`s,
//! whose kind carries a stable numeric code, and the session keeps the last error around so
//! that it can be queried after the fact.
//!
//! The same operations can be described in a JSON document and replayed through the
//! `Document` struct, which is what the `pdfscribe` binary does.

/// The module where the `SessionConfiguration` is presented: search paths, font associations,
/// compression and the settings which make the output reproducible, such as a fixed document
/// identifier and timestamp.
pub mod configuration;

/// The standard 14 PDF fonts, with the metrics needed to measure text without embedding
/// a font program, and the WinAnsi encoding they are written in.
pub mod core_fonts;

/// The module where the `Document` interface is presented.
///
/// # Introduction
///
/// A `Document` is a list of operations, each one of them corresponding to a call on a
/// `Session`. Resources such as fonts and images are loaded under a symbolic name chosen in
/// the document, which the later operations use in place of a handle. For the supported
/// operations see the `Operation` enum.
///
/// The document is replayed either into a file with `render`, or into memory with
/// `to_pdf_bytes`.
pub mod document;

/// The process-wide engine state: whether the library is booted and how many sessions are
/// alive. Sessions register themselves here when opened and release their id when disposed.
pub mod engine;

/// This module contains the `SessionError` type which is the error type used throughout
/// this library.
///
/// Each error has an `ErrorKind` with a numeric code, a context explaining what went wrong,
/// possibly the propagated source error, and the name of the session operation which failed.
/// It implements `std::fmt::Display`, so it can be explicitly printed out.
pub mod error;

/// The placement of a rectangular object (an image, a template, an imported page or a
/// line of text) into a reference point, according to a fit method, an orientation and
/// an optional target box.
pub mod fitting;

/// Font loading and measurement, for both the standard fonts and embedded TrueType fonts.
pub mod fonts;

/// Transformation matrices, colors, dash patterns and the stack of graphics states.
pub mod graphics;

/// The opaque handles issued by a session and the table of resources they refer to.
pub mod handle;

/// Raster images decoded into PDF image XObjects.
pub mod images;

/// Pages imported from existing PDF documents as form XObjects.
pub mod import;

/// The parser for option lists, the strings of whitespace-separated `key value` pairs taken
/// by many session operations, where a value is a single token or a braced list such as
/// `position {100 0}`.
pub mod options;

/// Path construction and the operators which paint it.
pub mod path;

/// The low-level PDF document being assembled by a session.
///
/// # Disclaimer
///
/// This work was partially adapted from the one of [fschutt](https://github.com/fschutt) for the crate [printpdf](https://github.com/fschutt/printpdf).
/// The [specification for the PDF format](https://opensource.adobe.com/dc-acrobat-sdk-docs/pdfstandards/PDF32000_2008.pdf)
/// was also studied for the structure of pages, outlines and the document information.
mod pdf;

/// The `Session` and all of its operations.
pub mod session;

/// Text measurement and the layout of text into boxes.
pub mod text;

mod vfs;

pub use configuration::SessionConfiguration;
pub use document::Document;
pub use error::{ErrorKind, SessionError};
pub use handle::Handle;
pub use session::Session;
