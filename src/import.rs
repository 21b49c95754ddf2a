use std::collections::HashMap;

use lopdf::{Dictionary, Object, ObjectId};

use crate::error::{ErrorKind, SessionError};
use crate::options::OptionList;

/// The option keys understood by `open_pdi_page`.
pub const PAGE_KEYS: &[&str] = &["pdiusebox"];

/// The page boundaries which can be used as the size of an imported page.
const PAGE_BOXES: &[&str] = &["media", "crop", "bleed", "trim", "art"];

/// An existing PDF document whose pages can be placed into the generated document.
#[derive(Debug)]
pub struct ImportedDocument {
    document: lopdf::Document,
    /// The object IDs of the pages, in page order.
    page_ids: Vec<ObjectId>,
    /// The objects already copied into the generated document, by their ID in the source.
    copied_objects: HashMap<ObjectId, ObjectId>,
}

/// A page converted into a form XObject of the generated document.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedPage {
    pub object_id: ObjectId,
    pub width: f32,
    pub height: f32,
}

impl ImportedDocument {
    pub fn from_bytes(data: &[u8]) -> Result<ImportedDocument, SessionError> {
        let document = lopdf::Document::load_mem(data).map_err(|error| {
            SessionError::with_error(ErrorKind::Format, "Failed to parse the PDF document", &error)
        })?;
        if document.is_encrypted() {
            return Err(SessionError::with_context(
                ErrorKind::Format,
                "Encrypted PDF documents cannot be imported",
            ));
        }
        let page_ids: Vec<ObjectId> = document.get_pages().into_values().collect();
        log::debug!("Opened a PDF document with {} pages", page_ids.len());

        Ok(ImportedDocument {
            document,
            page_ids,
            copied_objects: HashMap::new(),
        })
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// The width and height of a page (1-based) according to the given page box.
    pub fn page_size(&self, page_number: usize, page_box: &str) -> Result<(f32, f32), SessionError> {
        let [llx, lly, urx, ury] = self.page_box(self.page_id(page_number)?, page_box)?;
        Ok((urx - llx, ury - lly))
    }

    /// Copies a page (1-based) together with all the resources it uses into `target`, as a
    /// form XObject whose origin is the lower left corner of the page.
    pub(crate) fn import_page(
        &mut self,
        page_number: usize,
        options: &OptionList,
        target: &mut lopdf::Document,
    ) -> Result<ImportedPage, SessionError> {
        let page_box = options
            .keyword("pdiusebox", PAGE_BOXES)?
            .unwrap_or_else(|| "crop".to_string());
        let page_id = self.page_id(page_number)?;
        let [llx, lly, urx, ury] = self.page_box(page_id, &page_box)?;

        let content = self.document.get_page_content(page_id).map_err(|error| {
            SessionError::with_error(
                ErrorKind::Format,
                format!("Failed to read the content of page {}", page_number),
                &error,
            )
        })?;

        // Resources are collected from the page upwards, inherited entries are applied
        // first so that the entries closer to the page override them
        let (own_resources, inherited_resource_ids) = self.document.get_page_resources(page_id);
        let mut resources = Dictionary::new();
        for dictionary in inherited_resource_ids
            .iter()
            .rev()
            .filter_map(|resource_id| self.document.get_dictionary(*resource_id).ok())
            .chain(own_resources)
        {
            merge_resources(&mut resources, dictionary);
        }
        let resources = self.copy_object(&Object::Dictionary(resources), target);

        let form_dictionary = Dictionary::from_iter(vec![
            ("Type", Object::Name("XObject".into())),
            ("Subtype", Object::Name("Form".into())),
            (
                "BBox",
                Object::Array(vec![
                    Object::Real(llx),
                    Object::Real(lly),
                    Object::Real(urx),
                    Object::Real(ury),
                ]),
            ),
            (
                "Matrix",
                Object::Array(
                    [1.0, 0.0, 0.0, 1.0, -llx, -lly]
                        .into_iter()
                        .map(Object::Real)
                        .collect(),
                ),
            ),
            ("Resources", resources),
        ]);
        let object_id = target.add_object(lopdf::Stream::new(form_dictionary, content));
        log::trace!(
            "Imported page {} as the form XObject {:?}",
            page_number,
            object_id
        );

        Ok(ImportedPage {
            object_id,
            width: urx - llx,
            height: ury - lly,
        })
    }

    fn page_id(&self, page_number: usize) -> Result<ObjectId, SessionError> {
        page_number
            .checked_sub(1)
            .and_then(|index| self.page_ids.get(index))
            .copied()
            .ok_or_else(|| {
                SessionError::argument(format!(
                    "Page {} does not exist, the document has {} pages",
                    page_number,
                    self.page_ids.len()
                ))
            })
    }

    /// Looks up a page boundary, following the page tree for inherited entries. Missing
    /// boxes default to the crop box, which defaults to the media box.
    fn page_box(&self, page_id: ObjectId, page_box: &str) -> Result<[f32; 4], SessionError> {
        let key: &[u8] = match page_box {
            "media" => b"MediaBox",
            "bleed" => b"BleedBox",
            "trim" => b"TrimBox",
            "art" => b"ArtBox",
            _ => b"CropBox",
        };
        self.inherited_rectangle(page_id, key)
            .or_else(|| self.inherited_rectangle(page_id, b"CropBox"))
            .or_else(|| self.inherited_rectangle(page_id, b"MediaBox"))
            .filter(|[llx, lly, urx, ury]| urx > llx && ury > lly)
            .ok_or_else(|| {
                SessionError::with_context(
                    ErrorKind::Format,
                    "The page has no valid media box",
                )
            })
    }

    fn inherited_rectangle(&self, page_id: ObjectId, key: &[u8]) -> Option<[f32; 4]> {
        let mut node_id = page_id;
        // The depth of the page tree is bounded to survive reference cycles
        for _ in 0..64 {
            let node = self.document.get_dictionary(node_id).ok()?;
            if let Ok(value) = node.get(key) {
                let rectangle = self.resolve(value).as_array().ok()?;
                let numbers: Vec<f32> = rectangle
                    .iter()
                    .filter_map(|number| as_number(self.resolve(number)))
                    .collect();
                return match numbers[..] {
                    [x0, y0, x1, y1] => Some([x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1)]),
                    _ => None,
                };
            }
            node_id = node.get(b"Parent").ok()?.as_reference().ok()?;
        }
        None
    }

    fn resolve<'a>(&'a self, object: &'a Object) -> &'a Object {
        match object {
            Object::Reference(object_id) => self.document.get_object(*object_id).unwrap_or(object),
            _ => object,
        }
    }

    /// Deep-copies an object of the imported document into `target`, copying every
    /// referenced object once.
    fn copy_object(&mut self, object: &Object, target: &mut lopdf::Document) -> Object {
        match object {
            Object::Reference(source_id) => {
                if let Some(target_id) = self.copied_objects.get(source_id) {
                    return Object::Reference(*target_id);
                }
                let target_id = target.new_object_id();
                self.copied_objects.insert(*source_id, target_id);
                let copied = match self.document.get_object(*source_id) {
                    Ok(referenced) => {
                        let referenced = referenced.clone();
                        self.copy_object(&referenced, target)
                    }
                    Err(_) => Object::Null,
                };
                target.objects.insert(target_id, copied);
                Object::Reference(target_id)
            }
            Object::Array(array) => Object::Array(
                array
                    .iter()
                    .map(|element| self.copy_object(element, target))
                    .collect(),
            ),
            Object::Dictionary(dictionary) => Object::Dictionary(self.copy_dictionary(dictionary, target)),
            Object::Stream(stream) => {
                let dictionary = self.copy_dictionary(&stream.dict, target);
                // The content keeps its filters, it must not be compressed twice
                Object::Stream(
                    lopdf::Stream::new(dictionary, stream.content.clone()).with_compression(false),
                )
            }
            other => other.clone(),
        }
    }

    fn copy_dictionary(&mut self, dictionary: &Dictionary, target: &mut lopdf::Document) -> Dictionary {
        let mut copy = Dictionary::new();
        for (key, value) in dictionary.iter() {
            // Links back into the page tree would drag the whole source document along
            if key.as_slice() == b"Parent" {
                continue;
            }
            copy.set(key.clone(), self.copy_object(value, target));
        }
        copy
    }
}

/// Merges resource dictionaries, combining the category dictionaries (`Font`, `XObject`
/// and so on) entry by entry.
fn merge_resources(resources: &mut Dictionary, addition: &Dictionary) {
    for (key, value) in addition.iter() {
        match (resources.get_mut(key), value) {
            (Ok(Object::Dictionary(existing)), Object::Dictionary(entries)) => {
                for (name, entry) in entries.iter() {
                    existing.set(name.clone(), entry.clone());
                }
            }
            _ => resources.set(key.clone(), value.clone()),
        }
    }
}

fn as_number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(integer) => Some(*integer as f32),
        Object::Real(real) => Some(*real),
        _ => None,
    }
}
