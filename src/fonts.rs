use lopdf::{Object, StringFormat};
use owned_ttf_parser::{AsFaceRef as _, Face, OwnedFace};
use std::collections::{BTreeMap, HashMap};
use unicode_normalization::UnicodeNormalization as _;

use crate::core_fonts::{winansi_code, StandardFont};
use crate::error::{ErrorKind, SessionError};

/// The (insofar) relevant vertical metrics of a font.
#[derive(Clone, Copy, Debug, Default)]
pub struct FontMetrics {
    /// The ascent of the font.
    pub ascent: i16,
    /// The descent of the font.
    pub descent: i16,
    /// The height of the capital letters, the ascent when the font does not tell it.
    pub cap_height: i16,
    /// The number of units per em of the font.
    pub units_per_em: u16,
}

/// The (insofar) relevant metrics associated to a single glyph of a font.
#[derive(Clone, Copy, Debug, Default)]
pub struct GlyphMetrics {
    /// The width of the glyph.
    pub width: u32,
    /// The height of the glyph.
    pub height: u32,
}

/// A font face loaded from a TTF font, together with its measure of units per em.
#[derive(Clone, Debug)]
struct TtfFontFace {
    /// The underlying font face which is represented through the `ttf_parser` crate.
    inner: std::sync::Arc<OwnedFace>,
    /// The number of units per em of the font face.
    units_per_em: u16,
}

impl TtfFontFace {
    /// Constructs a font face from the underlying raw data extracted from the TTF font file.
    fn from_bytes(data: &[u8]) -> Result<Self, SessionError> {
        let face = OwnedFace::from_vec(data.to_vec(), 0).map_err(|error| {
            SessionError::with_error(ErrorKind::Format, "Failed to parse the font", &error)
        })?;
        let units_per_em = face.as_face_ref().units_per_em();

        Ok(Self {
            inner: std::sync::Arc::new(face),
            units_per_em,
        })
    }

    /// Retrieve the underlying font face as a reference.
    fn face(&self) -> &Face<'_> {
        self.inner.as_face_ref()
    }

    fn font_metrics(&self) -> FontMetrics {
        let ascent = self.face().ascender();
        FontMetrics {
            ascent,
            descent: self.face().descender(),
            cap_height: self.face().capital_height().unwrap_or(ascent),
            units_per_em: self.units_per_em,
        }
    }

    fn glyph_id(&self, character: char) -> Option<u16> {
        self.face()
            .glyph_index(character)
            .map(|glyph_id| glyph_id.0)
    }

    /// Retrieve the mapping between the glyph IDs and the characters they are the first
    /// glyph for in the unicode subtables of the font.
    fn glyph_ids(&self) -> HashMap<u16, char> {
        let font_subtables = self.face().tables().cmap.map(|cmap| {
            cmap.subtables
                .into_iter()
                .filter(|font_subtable| font_subtable.is_unicode())
        });
        let Some(font_subtables) = font_subtables else {
            return HashMap::new();
        };

        let mut gid_to_codepoint_map =
            HashMap::with_capacity(self.face().number_of_glyphs().into());
        for font_subtable in font_subtables {
            font_subtable.codepoints(|codepoint| {
                if let Ok(character) = char::try_from(codepoint) {
                    // The glyph 0 is the missing glyph, it never maps back to a character
                    if let Some(glyph_index) = font_subtable
                        .glyph_index(codepoint)
                        .filter(|index| index.0 > 0)
                    {
                        gid_to_codepoint_map
                            .entry(glyph_index.0)
                            .or_insert(character);
                    }
                }
            })
        }

        gid_to_codepoint_map
    }

    fn glyph_count(&self) -> u16 {
        self.face().number_of_glyphs()
    }

    fn glyph_metrics(&self, glyph_id: u16) -> Option<GlyphMetrics> {
        let glyph_id = owned_ttf_parser::GlyphId(glyph_id);
        let width = self.face().glyph_hor_advance(glyph_id)? as u32;
        // The height is corrected by the descender, which only holds for horizontal fonts
        let height = self
            .face()
            .glyph_bounding_box(glyph_id)
            .map(|bounding_box| {
                i32::from(bounding_box.y_max) - i32::from(bounding_box.y_min)
                    - i32::from(self.face().descender())
            })
            .unwrap_or(1000)
            .max(0) as u32;

        Some(GlyphMetrics { width, height })
    }

    /// The PostScript name stored in the naming table, if any.
    fn postscript_name(&self) -> Option<String> {
        self.face()
            .names()
            .into_iter()
            .filter(|name| name.name_id == owned_ttf_parser::name_id::POST_SCRIPT_NAME)
            .find_map(|name| name.to_string())
    }
}

/// The way the characters of a text are turned into codes in the content stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontEncoding {
    /// Single byte Windows code page 1252.
    WinAnsi,
    /// Single byte codes of the font's own encoding, for the symbolic standard fonts.
    Builtin,
    /// Two byte glyph identifiers of an embedded font.
    IdentityH,
}

/// A single encoded character, ready to be shown.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    /// One byte for simple fonts, two bytes for embedded fonts.
    pub code: Vec<u8>,
    /// Advance width in thousandths of the font size.
    pub width: f32,
    /// Whether the word spacing applies to the glyph, which is the case for the single
    /// byte code 32 only.
    pub is_space: bool,
}

#[derive(Debug, Clone)]
enum FontProgram {
    Standard(StandardFont),
    TrueType {
        bytes: Vec<u8>,
        face: TtfFontFace,
        base_font: String,
    },
}

/// A font loaded into a session, either one of the standard fonts or an embedded TrueType font.
#[derive(Debug, Clone)]
pub struct Font {
    /// The name the font was requested with.
    pub(crate) font_name: String,
    /// The encoding name the font was requested with.
    pub(crate) encoding_name: String,
    /// The name of the font in the page resource dictionaries.
    pub(crate) resource_name: String,
    encoding: FontEncoding,
    program: FontProgram,
}

impl Font {
    /// Selects one of the standard fonts, which are referenced but not embedded.
    pub(crate) fn standard(
        font: StandardFont,
        encoding_name: &str,
        resource_name: String,
    ) -> Result<Font, SessionError> {
        let encoding = match (encoding_name.to_lowercase().as_str(), font.is_symbolic()) {
            ("winansi" | "auto" | "host", false) => FontEncoding::WinAnsi,
            ("builtin" | "auto", true) => FontEncoding::Builtin,
            _ => {
                return Err(SessionError::argument(format!(
                    "Encoding {:?} is not supported for the font {:?}",
                    encoding_name,
                    font.name()
                )))
            }
        };

        Ok(Font {
            font_name: font.name().to_string(),
            encoding_name: encoding_name.to_lowercase(),
            resource_name,
            encoding,
            program: FontProgram::Standard(font),
        })
    }

    /// Parses a TrueType (or OpenType with TrueType outlines) font program to be embedded.
    pub(crate) fn truetype(
        bytes: Vec<u8>,
        font_name: &str,
        encoding_name: &str,
        resource_name: String,
    ) -> Result<Font, SessionError> {
        match encoding_name.to_lowercase().as_str() {
            "unicode" | "identity-h" | "auto" | "winansi" => (),
            _ => {
                return Err(SessionError::argument(format!(
                    "Encoding {:?} is not supported for the embedded font {:?}",
                    encoding_name, font_name
                )))
            }
        }
        let face = TtfFontFace::from_bytes(&bytes)?;
        let base_font = face
            .postscript_name()
            .unwrap_or_else(|| font_name.to_string())
            .chars()
            .filter(|character| character.is_ascii_graphic() && !"()<>[]{}/%#".contains(*character))
            .collect::<String>();
        let base_font = if base_font.is_empty() {
            resource_name.clone()
        } else {
            base_font
        };

        Ok(Font {
            font_name: font_name.to_string(),
            encoding_name: encoding_name.to_lowercase(),
            resource_name,
            encoding: FontEncoding::IdentityH,
            program: FontProgram::TrueType {
                bytes,
                face,
                base_font,
            },
        })
    }

    pub fn encoding(&self) -> FontEncoding {
        self.encoding
    }

    /// Whether the font program is embedded into the document.
    pub fn is_embedded(&self) -> bool {
        matches!(self.program, FontProgram::TrueType { .. })
    }

    /// The height of the capital letters in thousandths of the font size.
    pub fn cap_height(&self) -> f32 {
        match &self.program {
            FontProgram::Standard(font) => font.cap_height(),
            FontProgram::TrueType { face, .. } => {
                let metrics = face.font_metrics();
                f32::from(metrics.cap_height) * 1000.0 / f32::from(metrics.units_per_em)
            }
        }
    }

    pub fn ascender(&self) -> f32 {
        match &self.program {
            FontProgram::Standard(font) => font.ascender(),
            FontProgram::TrueType { face, .. } => {
                let metrics = face.font_metrics();
                f32::from(metrics.ascent) * 1000.0 / f32::from(metrics.units_per_em)
            }
        }
    }

    pub fn descender(&self) -> f32 {
        match &self.program {
            FontProgram::Standard(font) => font.descender(),
            FontProgram::TrueType { face, .. } => {
                let metrics = face.font_metrics();
                f32::from(metrics.descent) * 1000.0 / f32::from(metrics.units_per_em)
            }
        }
    }

    /// Encodes a single character, `None` when the font has no glyph for it.
    pub fn glyph(&self, character: char) -> Option<Glyph> {
        match &self.program {
            FontProgram::Standard(font) => {
                let code = match self.encoding {
                    FontEncoding::Builtin => u8::try_from(u32::from(character)).ok(),
                    _ => winansi_code(character),
                }?;
                Some(Glyph {
                    code: vec![code],
                    width: font.char_width(character),
                    is_space: code == b' ',
                })
            }
            FontProgram::TrueType { face, .. } => {
                let glyph_id = face.glyph_id(character)?;
                let width = face
                    .glyph_metrics(glyph_id)
                    .map(|metrics| metrics.width as f32 * 1000.0 / f32::from(face.units_per_em))
                    .unwrap_or(0.0);
                Some(Glyph {
                    code: vec![(glyph_id >> 8) as u8, (glyph_id & 255) as u8],
                    width,
                    is_space: false,
                })
            }
        }
    }

    /// Encodes a text, characters the font cannot show are replaced by a question mark in
    /// simple fonts and dropped in embedded fonts. Text for embedded fonts is composed first,
    /// so that accented letters map to their precomposed glyphs.
    pub fn shape(&self, text: &str) -> Vec<Glyph> {
        let characters: Vec<char> = match self.program {
            FontProgram::Standard(_) => text.chars().collect(),
            FontProgram::TrueType { .. } => text.nfc().collect(),
        };
        characters
            .into_iter()
            .filter_map(|character| match self.glyph(character) {
                Some(glyph) => Some(glyph),
                None => {
                    log::warn!(
                        "Unable to find the character {:?} in the font {:?}",
                        character,
                        self.font_name
                    );
                    match self.program {
                        FontProgram::Standard(_) => self.glyph('?'),
                        FontProgram::TrueType { .. } => None,
                    }
                }
            })
            .collect()
    }

    /// The string operand showing the given glyphs.
    pub fn to_string_object(&self, glyphs: &[Glyph]) -> Object {
        let bytes: Vec<u8> = glyphs.iter().flat_map(|glyph| glyph.code.clone()).collect();
        match self.encoding {
            FontEncoding::IdentityH => Object::String(bytes, StringFormat::Hexadecimal),
            FontEncoding::WinAnsi | FontEncoding::Builtin => {
                Object::String(bytes, StringFormat::Literal)
            }
        }
    }

    /// Writes the font into the PDF document, returning the font dictionary.
    pub(crate) fn insert_into_document(&self, inner_document: &mut lopdf::Document) -> lopdf::Dictionary {
        match &self.program {
            FontProgram::Standard(font) => {
                let mut font_dictionary = lopdf::Dictionary::from_iter(vec![
                    ("Type", Object::Name("Font".into())),
                    ("Subtype", Object::Name("Type1".into())),
                    ("BaseFont", Object::Name(font.name().into())),
                ]);
                if self.encoding == FontEncoding::WinAnsi {
                    font_dictionary.set("Encoding", Object::Name("WinAnsiEncoding".into()));
                }
                font_dictionary
            }
            FontProgram::TrueType {
                bytes,
                face,
                base_font,
            } => insert_truetype_font(inner_document, bytes, face, base_font),
        }
    }
}

/// Embeds a TrueType font as a Type0 font with a single CIDFontType2 descendant, the
/// identity encoding and a ToUnicode map, returning the Type0 font dictionary.
fn insert_truetype_font(
    inner_document: &mut lopdf::Document,
    bytes: &[u8],
    face: &TtfFontFace,
    base_font: &str,
) -> lopdf::Dictionary {
    use lopdf::Object::*;
    let face_metrics = face.font_metrics();

    // The length of the raw font program is required next to the (possibly compressed) data
    let font_stream = lopdf::Stream::new(
        lopdf::Dictionary::from_iter(vec![("Length1", Integer(bytes.len() as i64))]),
        bytes.to_vec(),
    );

    let mut font_descriptor = lopdf::Dictionary::from_iter(vec![
        ("Type", Name("FontDescriptor".into())),
        ("FontName", Name(base_font.into())),
        ("Ascent", Integer(i64::from(face_metrics.ascent))),
        ("Descent", Integer(i64::from(face_metrics.descent))),
        ("CapHeight", Integer(i64::from(face_metrics.cap_height))),
        ("ItalicAngle", Integer(0)),
        // Nonsymbolic font using the standard Latin character set
        ("Flags", Integer(32)),
        ("StemV", Integer(80)),
    ]);

    let mut maximum_character_height = 0;
    let mut total_width = 0;

    // Glyph IDs associated to their character, width and height; the missing glyph is
    // always present
    let mut gid_to_glyph_properties_map = BTreeMap::<u32, (u32, u32, u32)>::new();
    gid_to_glyph_properties_map.insert(0, (0, 1000, 1000));
    for (glyph_id, character) in face.glyph_ids() {
        if let Some(glyph_metrics) = face.glyph_metrics(glyph_id) {
            maximum_character_height = maximum_character_height.max(glyph_metrics.height);
            total_width += glyph_metrics.width;
            gid_to_glyph_properties_map.insert(
                u32::from(glyph_id),
                (character as u32, glyph_metrics.width, glyph_metrics.height),
            );
        }
    }

    // The ranges of a `beginbfchar` block must share their high byte and hold at most 100 entries
    let mut current_high_byte: u32 = 0;
    let mut all_gid_to_character_blocks = Vec::new();
    let mut current_gid_to_character_block = Vec::new();
    for (glyph_id, (character, _width, _height)) in gid_to_glyph_properties_map.iter() {
        if (*glyph_id >> 8) != current_high_byte || current_gid_to_character_block.len() >= 100 {
            all_gid_to_character_blocks.push(std::mem::take(&mut current_gid_to_character_block));
            current_high_byte = *glyph_id >> 8;
        }
        current_gid_to_character_block.push((*glyph_id, *character));
    }
    all_gid_to_character_blocks.push(current_gid_to_character_block);

    let cid_to_unicode_map = generate_cid_to_unicode_map(base_font, all_gid_to_character_blocks);
    let cid_to_unicode_map_stream = lopdf::Stream::new(
        lopdf::Dictionary::new(),
        cid_to_unicode_map.into_bytes(),
    );
    let cid_to_unicode_map_stream_id = inner_document.add_object(cid_to_unicode_map_stream);

    // Widths are written as runs of consecutive glyph IDs, `first [w1 w2 ...]`, scaled
    // to the 1000 units glyph space
    let mut width_objects = Vec::<Object>::new();
    let mut current_lower_gid = 0;
    let mut current_upper_gid = 0;
    let mut current_widths_vector = Vec::<Object>::new();
    let percentage_font_scaling = 1000.0 / f32::from(face_metrics.units_per_em);
    for glyph_id in 0..face.glyph_count() {
        let Some(GlyphMetrics { width, .. }) = face.glyph_metrics(glyph_id) else {
            log::warn!(
                "Glyph ID {} of the font {:?} has no width, it is left out of the widths array",
                glyph_id,
                base_font
            );
            continue;
        };
        let scaled_width = Integer((width as f32 * percentage_font_scaling) as i64);
        if glyph_id != current_upper_gid && !current_widths_vector.is_empty() {
            width_objects.push(Integer(i64::from(current_lower_gid)));
            width_objects.push(Array(std::mem::take(&mut current_widths_vector)));
            current_lower_gid = glyph_id;
        } else if current_widths_vector.is_empty() {
            current_lower_gid = glyph_id;
        }
        current_widths_vector.push(scaled_width);
        current_upper_gid = glyph_id + 1;
    }
    if !current_widths_vector.is_empty() {
        width_objects.push(Integer(i64::from(current_lower_gid)));
        width_objects.push(Array(current_widths_vector));
    }

    let font_bounding_box = vec![
        Integer(0),
        Integer(i64::from(face_metrics.descent)),
        Integer(i64::from(total_width)),
        Integer(i64::from(maximum_character_height)),
    ];
    font_descriptor.set("FontBBox", Array(font_bounding_box));
    font_descriptor.set("FontFile2", Reference(inner_document.add_object(font_stream)));
    let font_descriptor_id = inner_document.add_object(font_descriptor);

    let descendant_font = lopdf::Dictionary::from_iter(vec![
        ("Type", Name("Font".into())),
        ("Subtype", Name("CIDFontType2".into())),
        ("BaseFont", Name(base_font.into())),
        (
            "CIDSystemInfo",
            Dictionary(lopdf::Dictionary::from_iter(vec![
                ("Registry", String("Adobe".into(), StringFormat::Literal)),
                ("Ordering", String("Identity".into(), StringFormat::Literal)),
                ("Supplement", Integer(0)),
            ])),
        ),
        ("W", Array(width_objects)),
        ("DW", Integer(1000)),
        ("CIDToGIDMap", Name("Identity".into())),
        ("FontDescriptor", Reference(font_descriptor_id)),
    ]);

    lopdf::Dictionary::from_iter(vec![
        ("Type", Name("Font".into())),
        ("Subtype", Name("Type0".into())),
        ("BaseFont", Name(base_font.into())),
        // `Identity-H` is used for horizontal writing, while `Identity-V` for vertical writing
        ("Encoding", Name("Identity-H".into())),
        ("DescendantFonts", Array(vec![Dictionary(descendant_font)])),
        ("ToUnicode", Reference(cid_to_unicode_map_stream_id)),
    ])
}

type GlyphId = u32;
type UnicodeCodePoint = u32;
type CmapBlock = Vec<(GlyphId, UnicodeCodePoint)>;

/// Generates the ToUnicode character map of an embedded font from blocks of glyph IDs
/// and the code points they represent.
fn generate_cid_to_unicode_map(face_name: &str, all_cmap_blocks: Vec<CmapBlock>) -> String {
    let mut cid_to_unicode_map = format!(
        "/CIDInit /ProcSet findresource begin\n\
         12 dict begin\n\
         begincmap\n\
         /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
         /CMapName /{}-UTF16 def\n\
         /CMapType 2 def\n\
         1 begincodespacerange\n\
         <0000> <ffff>\n\
         endcodespacerange\n",
        face_name
    );

    for cmap_block in all_cmap_blocks.into_iter().filter(|block| !block.is_empty()) {
        cid_to_unicode_map.push_str(&format!("{} beginbfchar\n", cmap_block.len()));
        for (glyph_id, unicode) in cmap_block {
            let mut utf16 = [0u16; 2];
            let units = char::from_u32(unicode)
                .map(|character| character.encode_utf16(&mut utf16).to_vec())
                .unwrap_or_default();
            let destination: String = units.iter().map(|unit| format!("{:04x}", unit)).collect();
            cid_to_unicode_map.push_str(&format!("<{:04x}> <{}>\n", glyph_id, destination));
        }
        cid_to_unicode_map.push_str("endbfchar\n");
    }

    cid_to_unicode_map.push_str(
        "endcmap\n\
         CMapName currentdict /CMap defineresource pop\n\
         end\n\
         end\n",
    );

    cid_to_unicode_map
}
