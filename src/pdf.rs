use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Object, ObjectId, StringFormat};
use std::collections::BTreeMap;
use time::OffsetDateTime;

use crate::error::{ErrorKind, SessionError};
use crate::fonts::Font;

/// The resources used by a page or a template, by the name they are referred to with
/// in the content stream.
#[derive(Default, Debug, Clone)]
pub(crate) struct PdfResources {
    fonts: BTreeMap<String, ObjectId>,
    xobjects: BTreeMap<String, ObjectId>,
    graphics_states: BTreeMap<String, ObjectId>,
    shadings: BTreeMap<String, ObjectId>,
    color_spaces: BTreeMap<String, ObjectId>,
}

impl PdfResources {
    pub(crate) fn add_font(&mut self, name: &str, object_id: ObjectId) {
        self.fonts.insert(name.to_string(), object_id);
    }

    pub(crate) fn add_xobject(&mut self, name: &str, object_id: ObjectId) {
        self.xobjects.insert(name.to_string(), object_id);
    }

    pub(crate) fn add_graphics_state(&mut self, name: &str, object_id: ObjectId) {
        self.graphics_states.insert(name.to_string(), object_id);
    }

    pub(crate) fn add_shading(&mut self, name: &str, object_id: ObjectId) {
        self.shadings.insert(name.to_string(), object_id);
    }

    pub(crate) fn add_color_space(&mut self, name: &str, object_id: ObjectId) {
        self.color_spaces.insert(name.to_string(), object_id);
    }

    pub(crate) fn color_space_id(&self, name: &str) -> Option<ObjectId> {
        self.color_spaces.get(name).copied()
    }

    /// Builds the resource dictionary, leaving out the empty categories.
    fn to_dictionary(&self) -> Dictionary {
        let mut dictionary = Dictionary::new();
        let categories = [
            ("Font", &self.fonts),
            ("XObject", &self.xobjects),
            ("ExtGState", &self.graphics_states),
            ("Shading", &self.shadings),
            ("ColorSpace", &self.color_spaces),
        ];
        for (category, entries) in categories {
            if !entries.is_empty() {
                dictionary.set(
                    category,
                    Object::Dictionary(
                        entries
                            .iter()
                            .map(|(name, object_id)| (name.clone(), Object::Reference(*object_id)))
                            .collect(),
                    ),
                );
            }
        }
        dictionary
    }
}

/// The content under construction of a page or a template.
#[derive(Debug, Clone)]
pub(crate) struct Canvas {
    /// The object the page or the template will be written to.
    pub(crate) object_id: ObjectId,
    pub(crate) width: f32,
    pub(crate) height: f32,
    pub(crate) operations: Vec<Operation>,
    pub(crate) resources: PdfResources,
    /// Annotations of a page, unused for templates.
    pub(crate) annotations: Vec<Dictionary>,
}

impl Canvas {
    pub(crate) fn new(object_id: ObjectId, width: f32, height: f32) -> Canvas {
        Canvas {
            object_id,
            width,
            height,
            operations: Vec::new(),
            resources: PdfResources::default(),
            annotations: Vec::new(),
        }
    }

    fn encode_content(&self) -> Result<Vec<u8>, SessionError> {
        Content {
            operations: self.operations.clone(),
        }
        .encode()
        .map_err(|error| {
            SessionError::with_error(ErrorKind::Format, "Failed to encode the content stream", &error)
        })
    }
}

/// An entry of the document outline.
#[derive(Debug, Clone)]
struct Bookmark {
    title: String,
    /// Index of the parent bookmark, `None` at the top level.
    parent: Option<usize>,
    open: bool,
    page_id: ObjectId,
}

/// The settings of the document catalog and trailer which are written at the end.
#[derive(Debug, Clone)]
pub(crate) struct DocumentFinish {
    pub(crate) identifier: String,
    pub(crate) instance_id: String,
    pub(crate) date: OffsetDateTime,
    pub(crate) compress: bool,
    /// The `PageMode` of the catalog, chosen from the outline when absent.
    pub(crate) page_mode: Option<&'static str>,
}

/// This struct represents the PDF document on a high-level: it is an interface to the underlying
/// `lopdf::Document` which receives the finished pages, templates and resources as they are
/// produced, while the fonts, the page tree, the outline and the catalog are written at the end.
pub(crate) struct PdfDocument {
    /// The underlying PDF document.
    pub(crate) inner_document: lopdf::Document,
    /// The object of the page tree root, reserved from the beginning as pages refer to it.
    pages_id: ObjectId,
    /// The finished pages, in order.
    page_ids: Vec<ObjectId>,
    /// The fonts in order of loading, with the object reserved for their dictionary.
    fonts: Vec<(ObjectId, Font)>,
    bookmarks: Vec<Bookmark>,
    info: BTreeMap<String, String>,
    output_intents: Vec<ObjectId>,
}

impl PdfDocument {
    pub(crate) fn new(pdf_version: &str) -> Self {
        let mut inner_document = lopdf::Document::with_version(pdf_version);
        let pages_id = inner_document.new_object_id();
        PdfDocument {
            inner_document,
            pages_id,
            page_ids: Vec::new(),
            fonts: Vec::new(),
            bookmarks: Vec::new(),
            info: BTreeMap::new(),
            output_intents: Vec::new(),
        }
    }

    pub(crate) fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Reserves an object for a page or template whose content is written later.
    pub(crate) fn reserve_object(&mut self) -> ObjectId {
        self.inner_document.new_object_id()
    }

    /// Registers a font, its dictionary is written when the document is finished.
    pub(crate) fn add_font(&mut self, font: Font) -> usize {
        let font_object_id = self.inner_document.new_object_id();
        self.fonts.push((font_object_id, font));
        self.fonts.len() - 1
    }

    pub(crate) fn font(&self, font_index: usize) -> Result<&(ObjectId, Font), SessionError> {
        self.fonts.get(font_index).ok_or_else(|| {
            SessionError::invalid_handle(format!("Failed to find the font {}", font_index))
        })
    }

    /// The number of fonts loaded so far, which is also the index of the next one.
    pub(crate) fn font_count(&self) -> usize {
        self.fonts.len()
    }

    /// Writes a finished page into the document.
    pub(crate) fn add_page(&mut self, canvas: Canvas) -> Result<(), SessionError> {
        let content_id = self
            .inner_document
            .add_object(lopdf::Stream::new(Dictionary::new(), canvas.encode_content()?));

        let mut page_dictionary = Dictionary::from_iter(vec![
            ("Type", Object::Name("Page".into())),
            ("Parent", Object::Reference(self.pages_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(canvas.width),
                    Object::Real(canvas.height),
                ]),
            ),
            ("Resources", Object::Dictionary(canvas.resources.to_dictionary())),
            ("Contents", Object::Reference(content_id)),
        ]);
        if !canvas.annotations.is_empty() {
            let annotations = canvas
                .annotations
                .into_iter()
                .map(|annotation| Object::Reference(self.inner_document.add_object(annotation)))
                .collect();
            page_dictionary.set("Annots", Object::Array(annotations));
        }

        self.inner_document
            .objects
            .insert(canvas.object_id, Object::Dictionary(page_dictionary));
        self.page_ids.push(canvas.object_id);
        log::trace!("Wrote page {} as {:?}", self.page_ids.len(), canvas.object_id);
        Ok(())
    }

    /// Writes a finished template as a form XObject.
    pub(crate) fn add_template(&mut self, canvas: Canvas) -> Result<(), SessionError> {
        let dictionary = Dictionary::from_iter(vec![
            ("Type", Object::Name("XObject".into())),
            ("Subtype", Object::Name("Form".into())),
            (
                "BBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(canvas.width),
                    Object::Real(canvas.height),
                ]),
            ),
            ("Resources", Object::Dictionary(canvas.resources.to_dictionary())),
        ]);
        let stream = lopdf::Stream::new(dictionary, canvas.encode_content()?);
        self.inner_document
            .objects
            .insert(canvas.object_id, Object::Stream(stream));
        Ok(())
    }

    /// Adds an entry to the outline, returning its 1-based identifier.
    pub(crate) fn add_bookmark(
        &mut self,
        title: &str,
        parent: usize,
        open: bool,
        page_id: ObjectId,
    ) -> Result<usize, SessionError> {
        let parent = match parent {
            0 => None,
            parent if parent <= self.bookmarks.len() => Some(parent - 1),
            parent => {
                return Err(SessionError::argument(format!(
                    "There is no bookmark {} to use as a parent",
                    parent
                )))
            }
        };
        self.bookmarks.push(Bookmark {
            title: title.to_string(),
            parent,
            open,
            page_id,
        });
        Ok(self.bookmarks.len())
    }

    pub(crate) fn has_bookmarks(&self) -> bool {
        !self.bookmarks.is_empty()
    }

    pub(crate) fn set_info(&mut self, key: &str, value: &str) {
        self.info.insert(key.to_string(), value.to_string());
    }

    /// Adds an ICC profile stream with the given number of components.
    pub(crate) fn add_icc_profile(&mut self, data: Vec<u8>, components: usize) -> ObjectId {
        let dictionary = Dictionary::from_iter(vec![("N", Object::Integer(components as i64))]);
        self.inner_document
            .add_object(lopdf::Stream::new(dictionary, data))
    }

    /// Declares an ICC profile stream as the output intent of the document.
    pub(crate) fn add_output_intent(&mut self, profile_id: ObjectId, description: &str) {
        let intent = Dictionary::from_iter(vec![
            ("Type", Object::Name("OutputIntent".into())),
            ("S", Object::Name("GTS_PDFA1".into())),
            (
                "OutputConditionIdentifier",
                Object::String(description.as_bytes().to_vec(), StringFormat::Literal),
            ),
            ("DestOutputProfile", Object::Reference(profile_id)),
        ]);
        let intent_id = self.inner_document.add_object(intent);
        self.output_intents.push(intent_id);
    }

    /// Writes the fonts, the page tree, the outline, the information dictionary, the
    /// catalog and the trailer.
    pub(crate) fn finish(&mut self, finish: &DocumentFinish) -> Result<(), SessionError> {
        use lopdf::Object::*;

        if self.page_ids.is_empty() {
            return Err(SessionError::state("The document contains no pages"));
        }

        // Every font is written into the object reserved for it when it was loaded
        for (font_object_id, font) in self.fonts.iter() {
            let font_dictionary = font.insert_into_document(&mut self.inner_document);
            self.inner_document
                .objects
                .insert(*font_object_id, Dictionary(font_dictionary));
        }

        let pages = lopdf::Dictionary::from_iter(vec![
            ("Type", Name("Pages".into())),
            ("Count", Integer(self.page_ids.len() as i64)),
            (
                "Kids",
                Array(self.page_ids.iter().copied().map(Reference).collect()),
            ),
        ]);
        self.inner_document
            .objects
            .insert(self.pages_id, Dictionary(pages));

        let mut catalog = lopdf::Dictionary::from_iter(vec![
            ("Type", Name("Catalog".into())),
            ("Pages", Reference(self.pages_id)),
        ]);
        if let Some(outlines_id) = self.insert_outline() {
            catalog.set("Outlines", Reference(outlines_id));
        }
        let page_mode = finish.page_mode.unwrap_or(if self.has_bookmarks() {
            "UseOutlines"
        } else {
            "UseNone"
        });
        catalog.set("PageMode", Name(page_mode.into()));
        if !self.output_intents.is_empty() {
            catalog.set(
                "OutputIntents",
                Array(self.output_intents.iter().copied().map(Reference).collect()),
            );
        }
        let catalog_id = self.inner_document.add_object(catalog);

        let timestamp = to_pdf_timestamp_format(&finish.date);
        let mut document_info = lopdf::Dictionary::from_iter(vec![
            (
                "Producer",
                text_string(&format!("pdfscribe {}", env!("CARGO_PKG_VERSION"))),
            ),
            (
                "CreationDate",
                String(timestamp.clone().into_bytes(), StringFormat::Literal),
            ),
            ("ModDate", String(timestamp.into_bytes(), StringFormat::Literal)),
        ]);
        for (key, value) in self.info.iter() {
            let value = if key == "Trapped" {
                Name(value.clone().into_bytes())
            } else {
                text_string(value)
            };
            document_info.set(key.clone(), value);
        }
        let document_info_id = self.inner_document.add_object(Dictionary(document_info));

        let trailer = &mut self.inner_document.trailer;
        trailer.set("Root", Reference(catalog_id));
        trailer.set("Info", Reference(document_info_id));
        trailer.set(
            "ID",
            Array(vec![
                String(finish.identifier.clone().into_bytes(), StringFormat::Literal),
                String(finish.instance_id.clone().into_bytes(), StringFormat::Literal),
            ]),
        );

        // Resources whose handles were closed without ever being placed are dropped
        self.inner_document.prune_objects();
        if finish.compress {
            self.inner_document.compress();
        }
        log::debug!(
            "Finished a document with {} pages and {} fonts",
            self.page_ids.len(),
            self.fonts.len()
        );
        Ok(())
    }

    /// Save the `PdfDocument` to the given writer.
    pub(crate) fn save_to<W: std::io::Write>(&mut self, writer: &mut W) -> Result<(), SessionError> {
        self.inner_document.save_to(writer).map_err(|error| {
            SessionError::with_error(ErrorKind::Io, "Error while writing the PDF document", &error)
        })
    }

    /// Writes the outline tree, returning the outline root when there are bookmarks.
    fn insert_outline(&mut self) -> Option<ObjectId> {
        if self.bookmarks.is_empty() {
            return None;
        }
        use lopdf::Object::*;

        let outlines_id = self.inner_document.new_object_id();
        let bookmark_ids: Vec<ObjectId> = (0..self.bookmarks.len())
            .map(|_| self.inner_document.new_object_id())
            .collect();
        let children_of = |parent: Option<usize>| -> Vec<usize> {
            (0..self.bookmarks.len())
                .filter(|index| self.bookmarks[*index].parent == parent)
                .collect()
        };

        // Children are always added after their parent, so counting backwards visits the
        // descendants of an item before the item itself
        let mut visible_descendants = vec![0i64; self.bookmarks.len()];
        for index in (0..self.bookmarks.len()).rev() {
            visible_descendants[index] = children_of(Some(index))
                .into_iter()
                .map(|child| {
                    1 + if self.bookmarks[child].open {
                        visible_descendants[child]
                    } else {
                        0
                    }
                })
                .sum();
        }

        for (index, bookmark) in self.bookmarks.iter().enumerate() {
            let siblings = children_of(bookmark.parent);
            let position = siblings.iter().position(|sibling| *sibling == index).unwrap_or(0);
            let mut item = lopdf::Dictionary::from_iter(vec![
                ("Title", text_string(&bookmark.title)),
                (
                    "Parent",
                    Reference(bookmark.parent.map_or(outlines_id, |parent| bookmark_ids[parent])),
                ),
                (
                    "Dest",
                    Array(vec![Reference(bookmark.page_id), Name("Fit".into())]),
                ),
            ]);
            if position > 0 {
                item.set("Prev", Reference(bookmark_ids[siblings[position - 1]]));
            }
            if let Some(next) = siblings.get(position + 1) {
                item.set("Next", Reference(bookmark_ids[*next]));
            }
            let children = children_of(Some(index));
            if let (Some(first), Some(last)) = (children.first(), children.last()) {
                item.set("First", Reference(bookmark_ids[*first]));
                item.set("Last", Reference(bookmark_ids[*last]));
                let count = visible_descendants[index];
                item.set("Count", Integer(if bookmark.open { count } else { -count }));
            }
            self.inner_document
                .objects
                .insert(bookmark_ids[index], Dictionary(item));
        }

        let top_level = children_of(None);
        let visible_items: i64 = top_level
            .iter()
            .map(|index| {
                1 + if self.bookmarks[*index].open {
                    visible_descendants[*index]
                } else {
                    0
                }
            })
            .sum();
        let mut outlines = lopdf::Dictionary::from_iter(vec![
            ("Type", Name("Outlines".into())),
            ("Count", Integer(visible_items)),
        ]);
        if let (Some(first), Some(last)) = (top_level.first(), top_level.last()) {
            outlines.set("First", Reference(bookmark_ids[*first]));
            outlines.set("Last", Reference(bookmark_ids[*last]));
        }
        self.inner_document
            .objects
            .insert(outlines_id, Dictionary(outlines));
        Some(outlines_id)
    }
}

/// A PDF text string: a literal when the text is printable ASCII, UTF-16BE with a byte
/// order mark otherwise.
pub(crate) fn text_string(text: &str) -> Object {
    if text.chars().all(|character| (' '..='~').contains(&character)) {
        Object::String(text.as_bytes().to_vec(), StringFormat::Literal)
    } else {
        let bytes = [0xFE, 0xFF]
            .into_iter()
            .chain(text.encode_utf16().flat_map(u16::to_be_bytes))
            .collect();
        Object::String(bytes, StringFormat::Hexadecimal)
    }
}

/// Formats the given time so that it matches what the PDF specification expects.
/// An example of it is the following: D:20170505150224+02'00'.
fn to_pdf_timestamp_format(date: &OffsetDateTime) -> String {
    let offset = date.offset();
    let offset_sign = if offset.is_negative() { '-' } else { '+' };
    format!(
        "D:{:04}{:02}{:02}{:02}{:02}{:02}{offset_sign}{:02}'{:02}'",
        date.year(),
        u8::from(date.month()),
        date.day(),
        date.hour(),
        date.minute(),
        date.second(),
        offset.whole_hours().abs(),
        offset.minutes_past_hour().abs(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finish_settings() -> DocumentFinish {
        DocumentFinish {
            identifier: "identifier".into(),
            instance_id: "instance".into(),
            date: OffsetDateTime::UNIX_EPOCH,
            compress: false,
            page_mode: None,
        }
    }

    #[test]
    fn timestamps_follow_the_pdf_date_format() {
        assert_eq!(
            to_pdf_timestamp_format(&OffsetDateTime::UNIX_EPOCH),
            "D:19700101000000+00'00'"
        );
    }

    #[test]
    fn text_strings_fall_back_to_utf16() {
        assert_eq!(
            text_string("Title"),
            Object::String(b"Title".to_vec(), StringFormat::Literal)
        );
        assert_eq!(
            text_string("é"),
            Object::String(vec![0xFE, 0xFF, 0x00, 0xE9], StringFormat::Hexadecimal)
        );
    }

    #[test]
    fn empty_documents_cannot_be_finished() {
        let mut document = PdfDocument::new("1.5");
        let error = document.finish(&finish_settings()).unwrap_err();
        assert_eq!(error.kind, ErrorKind::State);
    }

    #[test]
    fn outline_counts_follow_the_open_state() {
        let mut document = PdfDocument::new("1.5");
        let page_id = document.reserve_object();
        document
            .add_page(Canvas::new(page_id, 100.0, 100.0))
            .unwrap();
        let chapter = document.add_bookmark("Chapter", 0, true, page_id).unwrap();
        document.add_bookmark("Section 1", chapter, false, page_id).unwrap();
        let section = document.add_bookmark("Section 2", chapter, false, page_id).unwrap();
        document.add_bookmark("Paragraph", section, false, page_id).unwrap();
        assert!(document.add_bookmark("Orphan", 9, false, page_id).is_err());
        document.finish(&finish_settings()).unwrap();

        let mut bytes = Vec::new();
        document.save_to(&mut bytes).unwrap();
        let parsed = lopdf::Document::load_mem(&bytes).unwrap();
        let catalog = parsed.catalog().unwrap();
        let outlines = parsed
            .get_dictionary(catalog.get(b"Outlines").unwrap().as_reference().unwrap())
            .unwrap();
        // The open chapter shows its two sections, the closed section hides its paragraph
        assert_eq!(outlines.get(b"Count").unwrap(), &Object::Integer(3));
        assert_eq!(
            catalog.get(b"PageMode").unwrap(),
            &Object::Name(b"UseOutlines".to_vec())
        );
    }
}
