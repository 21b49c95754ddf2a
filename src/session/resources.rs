use lopdf::content::Operation;
use lopdf::{Dictionary, Object, ObjectId};

use super::{check_size, resource_name, Resource, Scope, Session};
use crate::core_fonts::{FontStyle, StandardFont};
use crate::error::{ErrorKind, SessionError};
use crate::fitting::{fit, FitOptions, FIT_KEYS};
use crate::fonts::Font;
use crate::graphics::{check_components, check_finite, Color, DashPattern};
use crate::handle::{Handle, ResourceKind};
use crate::images::{ImageXObject, IMAGE_KEYS};
use crate::import::{ImportedDocument, PAGE_KEYS};
use crate::options::OptionList;
use crate::pdf::Canvas;

use super::text::clip_operations;

const GSTATE_KEYS: &[&str] = &[
    "linewidth",
    "linecap",
    "linejoin",
    "miterlimit",
    "flatness",
    "opacityfill",
    "opacitystroke",
    "blendmode",
    "dasharray",
    "dashphase",
    "strokeadjust",
];

const BLEND_MODES: &[&str] = &[
    "Normal",
    "Multiply",
    "Screen",
    "Overlay",
    "Darken",
    "Lighten",
    "ColorDodge",
    "ColorBurn",
    "HardLight",
    "SoftLight",
    "Difference",
    "Exclusion",
    "Hue",
    "Saturation",
    "Color",
    "Luminosity",
];

/// The parts of a graphics state object which are also tracked by the session.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct GStateSettings {
    line_width: Option<f32>,
    line_cap: Option<i64>,
    line_join: Option<i64>,
    miter_limit: Option<f32>,
    flatness: Option<f32>,
    dash_pattern: Option<DashPattern>,
}

/// An object which can be drawn with the `Do` operator.
struct XObject {
    object_id: ObjectId,
    width: f32,
    height: f32,
    /// Images are drawn into the unit square and need to be scaled to their size.
    is_image: bool,
}

/// Fonts, images, imported pages, color profiles, graphics states, shadings and templates.
impl Session {
    /// Loads one of the standard fonts or a TrueType font file.
    pub fn load_font(&mut self, name: &str, encoding: &str, optlist: &str) -> Result<Handle, SessionError> {
        self.track("load_font", |session| {
            let options = OptionList::parse_with_keys(optlist, &["fontstyle"])?;
            let style = match options
                .keyword("fontstyle", &["normal", "bold", "italic", "bolditalic"])?
                .as_deref()
            {
                Some("bold") => FontStyle::Bold,
                Some("italic") => FontStyle::Italic,
                Some("bolditalic") => FontStyle::BoldItalic,
                _ => FontStyle::Normal,
            };
            if name.is_empty() {
                return Err(SessionError::argument("The font name is empty"));
            }

            let resource_name = format!("F{}", session.document.font_count());
            let font = match StandardFont::find(name) {
                Some(standard_font) => {
                    Font::standard(standard_font.with_style(style), encoding, resource_name)?
                }
                None => {
                    if style != FontStyle::Normal {
                        log::warn!(
                            "The font style {:?} is ignored for the embedded font {:?}",
                            style,
                            name
                        );
                    }
                    let mut candidates: Vec<String> = session
                        .configuration
                        .get_font_path(name)
                        .map(|path| path.to_string_lossy().into_owned())
                        .into_iter()
                        .collect();
                    candidates.extend([
                        name.to_string(),
                        format!("{}.ttf", name),
                        format!("{}.otf", name),
                    ]);
                    let (file_name, bytes) = session
                        .virtual_files
                        .read_any(&candidates, &session.configuration.search_paths)?;
                    log::debug!("Embedding the font {:?} from {:?}", name, file_name);
                    Font::truetype(bytes, name, encoding, resource_name)?
                }
            };

            let index = session.document.add_font(font);
            Ok(session.resources.insert(Resource::Font { index }))
        })
    }

    /// Invalidates a font handle, text already shown with the font is unaffected.
    pub fn close_font(&mut self, font: Handle) -> Result<(), SessionError> {
        self.track("close_font", |session| {
            session.resources.remove(font, &[ResourceKind::Font])?;
            Ok(())
        })
    }

    pub fn load_image(&mut self, imagetype: &str, filename: &str, optlist: &str) -> Result<Handle, SessionError> {
        self.track("load_image", |session| {
            let options = OptionList::parse_with_keys(optlist, IMAGE_KEYS)?;
            let data = session.read_resource(filename)?;
            let image = ImageXObject::from_bytes(imagetype, &data, &options)?;
            let object_id = image.insert_into_document(&mut session.document.inner_document);
            log::debug!(
                "Loaded the {}x{} image {:?}",
                image.width,
                image.height,
                filename
            );
            Ok(session.resources.insert(Resource::Image {
                object_id,
                width: image.width as f32,
                height: image.height as f32,
            }))
        })
    }

    pub fn close_image(&mut self, image: Handle) -> Result<(), SessionError> {
        self.track("close_image", |session| {
            session.resources.remove(image, &[ResourceKind::Image])?;
            Ok(())
        })
    }

    /// Places an image or a template with the fitting options.
    pub fn fit_image(&mut self, image: Handle, x: f32, y: f32, optlist: &str) -> Result<(), SessionError> {
        self.track("fit_image", |session| {
            check_finite(&[x, y])?;
            let options = OptionList::parse_with_keys(optlist, FIT_KEYS)?;
            let fit_options = FitOptions::from_options(&options)?;
            session.place_xobject(image, &[ResourceKind::Image, ResourceKind::Template], x, y, &fit_options)
        })
    }

    /// Places an image or a template with its lower left corner at `(x, y)`.
    pub fn place_image(&mut self, image: Handle, x: f32, y: f32, scale: f32) -> Result<(), SessionError> {
        self.track("place_image", |session| {
            check_finite(&[x, y, scale])?;
            if scale == 0.0 {
                return Err(SessionError::argument("The scaling factor must not be zero"));
            }
            let fit_options = FitOptions {
                scale: (scale, scale),
                ..FitOptions::default()
            };
            session.place_xobject(image, &[ResourceKind::Image, ResourceKind::Template], x, y, &fit_options)
        })
    }

    /// Opens an existing PDF document to import its pages.
    pub fn open_pdi(&mut self, filename: &str, optlist: &str) -> Result<Handle, SessionError> {
        self.track("open_pdi", |session| {
            OptionList::parse_with_keys(optlist, &[])?;
            let data = session.read_resource(filename)?;
            let document = ImportedDocument::from_bytes(&data)?;
            Ok(session.resources.insert(Resource::ImportedDocument(document)))
        })
    }

    /// Closes an imported document, pages already opened from it stay usable.
    pub fn close_pdi(&mut self, document: Handle) -> Result<(), SessionError> {
        self.track("close_pdi", |session| {
            session
                .resources
                .remove(document, &[ResourceKind::ImportedDocument])?;
            Ok(())
        })
    }

    /// Converts a page (1-based) of an imported document into a placeable object.
    pub fn open_pdi_page(&mut self, document: Handle, page_number: usize, optlist: &str) -> Result<Handle, SessionError> {
        self.track("open_pdi_page", |session| {
            let options = OptionList::parse_with_keys(optlist, PAGE_KEYS)?;
            let Session {
                resources,
                document: target,
                ..
            } = session;
            let page = match resources.get_mut(document, &[ResourceKind::ImportedDocument])? {
                Resource::ImportedDocument(imported) => {
                    imported.import_page(page_number, &options, &mut target.inner_document)?
                }
                _ => return Err(SessionError::invalid_handle("Expected an imported document")),
            };
            Ok(resources.insert(Resource::ImportedPage(page)))
        })
    }

    pub fn close_pdi_page(&mut self, page: Handle) -> Result<(), SessionError> {
        self.track("close_pdi_page", |session| {
            session.resources.remove(page, &[ResourceKind::ImportedPage])?;
            Ok(())
        })
    }

    pub fn fit_pdi_page(&mut self, page: Handle, x: f32, y: f32, optlist: &str) -> Result<(), SessionError> {
        self.track("fit_pdi_page", |session| {
            check_finite(&[x, y])?;
            let options = OptionList::parse_with_keys(optlist, FIT_KEYS)?;
            let fit_options = FitOptions::from_options(&options)?;
            session.place_xobject(page, &[ResourceKind::ImportedPage], x, y, &fit_options)
        })
    }

    pub fn place_pdi_page(&mut self, page: Handle, x: f32, y: f32, sx: f32, sy: f32) -> Result<(), SessionError> {
        self.track("place_pdi_page", |session| {
            check_finite(&[x, y, sx, sy])?;
            if sx == 0.0 || sy == 0.0 {
                return Err(SessionError::argument("The scaling factors must not be zero"));
            }
            let fit_options = FitOptions {
                scale: (sx, sy),
                ..FitOptions::default()
            };
            session.place_xobject(page, &[ResourceKind::ImportedPage], x, y, &fit_options)
        })
    }

    /// Queries an imported document: `pagecount`, or the `width` and `height` of a page.
    pub fn pdi_value(&mut self, key: &str, document: Handle, page_number: usize) -> Result<f32, SessionError> {
        self.track("pdi_value", |session| {
            let Resource::ImportedDocument(imported) = session
                .resources
                .get(document, &[ResourceKind::ImportedDocument])?
            else {
                return Err(SessionError::invalid_handle("Expected an imported document"));
            };
            match key.to_lowercase().as_str() {
                "pagecount" => Ok(imported.page_count() as f32),
                "width" => Ok(imported.page_size(page_number, "crop")?.0),
                "height" => Ok(imported.page_size(page_number, "crop")?.1),
                _ => Err(SessionError::option(format!(
                    "Unknown key {:?} for imported documents",
                    key
                ))),
            }
        })
    }

    /// Loads an ICC profile, either as a color space or as the output intent of the document.
    pub fn load_iccprofile(&mut self, name: &str, optlist: &str) -> Result<Handle, SessionError> {
        self.track("load_iccprofile", |session| {
            let options = OptionList::parse_with_keys(optlist, &["usage"])?;
            let usage = options
                .keyword("usage", &["iccbased", "outputintent"])?
                .unwrap_or_else(|| "iccbased".to_string());
            let data = session.read_resource(name)?;
            let components = icc_components(&data)?;

            let profile_id = session.document.add_icc_profile(data, components);
            let color_space_id = session.document.inner_document.add_object(Object::Array(vec![
                Object::Name("ICCBased".into()),
                Object::Reference(profile_id),
            ]));
            if usage == "outputintent" {
                session.document.add_output_intent(profile_id, name);
            }
            log::debug!("Loaded the ICC profile {:?} with {} components", name, components);
            Ok(session.resources.insert(Resource::IccProfile {
                color_space_id,
                components,
            }))
        })
    }

    pub fn close_iccprofile(&mut self, profile: Handle) -> Result<(), SessionError> {
        self.track("close_iccprofile", |session| {
            session.resources.remove(profile, &[ResourceKind::IccProfile])?;
            Ok(())
        })
    }

    /// Creates a graphics state object which can be applied with `set_gstate`.
    pub fn create_gstate(&mut self, optlist: &str) -> Result<Handle, SessionError> {
        self.track("create_gstate", |session| {
            let options = OptionList::parse_with_keys(optlist, GSTATE_KEYS)?;
            let (dictionary, settings) = gstate_dictionary(&options)?;
            let object_id = session.document.inner_document.add_object(dictionary);
            Ok(session
                .resources
                .insert(Resource::GState { object_id, settings }))
        })
    }

    pub fn set_gstate(&mut self, gstate: Handle) -> Result<(), SessionError> {
        self.track("set_gstate", |session| {
            session.canvas()?;
            let Resource::GState { object_id, settings } =
                session.resources.get(gstate, &[ResourceKind::GState])?
            else {
                return Err(SessionError::invalid_handle("Expected a graphics state"));
            };
            let (object_id, settings) = (*object_id, settings.clone());

            let name = resource_name("GS", gstate);
            session.canvas()?.resources.add_graphics_state(&name, object_id);
            session.emit([Operation::new("gs", vec![Object::Name(name.into_bytes())])])?;

            let current = &mut session.graphics.current;
            current.line_width = settings.line_width.unwrap_or(current.line_width);
            current.line_cap = settings.line_cap.unwrap_or(current.line_cap);
            current.line_join = settings.line_join.unwrap_or(current.line_join);
            current.miter_limit = settings.miter_limit.unwrap_or(current.miter_limit);
            current.flatness = settings.flatness.unwrap_or(current.flatness);
            if let Some(dash_pattern) = settings.dash_pattern {
                current.dash_pattern = dash_pattern;
            }
            Ok(())
        })
    }

    /// Defines a color blend from the current fill color to the given color, axial along
    /// the line from `(x0, y0)` to `(x1, y1)` or radial between the circles around them.
    #[allow(clippy::too_many_arguments)]
    pub fn shading(
        &mut self,
        shtype: &str,
        x0: f32,
        y0: f32,
        x1: f32,
        y1: f32,
        c1: f32,
        c2: f32,
        c3: f32,
        c4: f32,
        optlist: &str,
    ) -> Result<Handle, SessionError> {
        self.track("shading", |session| {
            check_finite(&[x0, y0, x1, y1])?;
            let options = OptionList::parse_with_keys(optlist, &["r0", "r1", "extend0", "extend1"])?;
            let radial = match shtype.to_lowercase().as_str() {
                "axial" => false,
                "radial" => true,
                _ => {
                    return Err(SessionError::argument(format!(
                        "Unknown shading type {:?}, expected axial or radial",
                        shtype
                    )))
                }
            };

            let start = session.graphics.current.fill_color.clone();
            let end = match &start {
                Color::Gray(_) => Color::Gray(c1),
                Color::Rgb(..) => Color::Rgb(c1, c2, c3),
                Color::Cmyk(..) => Color::Cmyk(c1, c2, c3, c4),
                Color::IccBased { name, components } => Color::IccBased {
                    name: name.clone(),
                    components: [c1, c2, c3, c4][..components.len().min(4)].to_vec(),
                },
            };
            check_components(&end.components())?;
            let color_space = match (&start, start.device_space()) {
                (_, Some(device_space)) => Object::Name(device_space.into()),
                (Color::IccBased { name, .. }, None) => {
                    let color_space_id = match &session.scope {
                        Scope::Page(canvas) | Scope::Template { canvas, .. } => {
                            canvas.resources.color_space_id(name)
                        }
                        Scope::Document => None,
                    }
                    .ok_or_else(|| {
                        SessionError::state("The ICC-based fill color is not available here")
                    })?;
                    Object::Reference(color_space_id)
                }
                _ => return Err(SessionError::state("The fill color has no color space")),
            };

            let coordinates = if radial {
                let radius = |key: &str| -> Result<f32, SessionError> {
                    let radius = options.float(key)?.ok_or_else(|| {
                        SessionError::option(format!(
                            "Option {:?} is required for radial shadings",
                            key
                        ))
                    })?;
                    if radius < 0.0 {
                        return Err(SessionError::option(format!(
                            "Option {:?} must not be negative",
                            key
                        )));
                    }
                    Ok(radius)
                };
                vec![x0, y0, radius("r0")?, x1, y1, radius("r1")?]
            } else {
                vec![x0, y0, x1, y1]
            };
            let extend = [
                options.boolean("extend0")?.unwrap_or(false),
                options.boolean("extend1")?.unwrap_or(false),
            ];

            let function = Dictionary::from_iter(vec![
                ("FunctionType", Object::Integer(2)),
                (
                    "Domain",
                    Object::Array(vec![Object::Integer(0), Object::Integer(1)]),
                ),
                ("C0", reals(&start.components())),
                ("C1", reals(&end.components())),
                ("N", Object::Integer(1)),
            ]);
            let shading = Dictionary::from_iter(vec![
                ("ShadingType", Object::Integer(if radial { 3 } else { 2 })),
                ("ColorSpace", color_space),
                ("Coords", reals(&coordinates)),
                ("Function", Object::Dictionary(function)),
                (
                    "Extend",
                    Object::Array(extend.into_iter().map(Object::Boolean).collect()),
                ),
            ]);
            let object_id = session.document.inner_document.add_object(shading);
            Ok(session.resources.insert(Resource::Shading { object_id }))
        })
    }

    /// Paints a shading over the current clipping area.
    pub fn shfill(&mut self, shading: Handle) -> Result<(), SessionError> {
        self.track("shfill", |session| {
            session.canvas()?;
            let Resource::Shading { object_id } =
                session.resources.get(shading, &[ResourceKind::Shading])?
            else {
                return Err(SessionError::invalid_handle("Expected a shading"));
            };
            let object_id = *object_id;
            let name = resource_name("Sh", shading);
            session.canvas()?.resources.add_shading(&name, object_id);
            session.emit([Operation::new("sh", vec![Object::Name(name.into_bytes())])])
        })
    }

    /// Starts recording a template, which receives the content instead of a page until
    /// `end_template` is called.
    pub fn begin_template(&mut self, width: f32, height: f32) -> Result<Handle, SessionError> {
        self.track("begin_template", |session| {
            session.require_document_scope()?;
            check_size(width, height)?;
            let object_id = session.document.reserve_object();
            let handle = session.resources.insert(Resource::Template {
                object_id,
                width,
                height,
                finished: false,
            });
            session.scope = Scope::Template {
                handle,
                canvas: Canvas::new(object_id, width, height),
            };
            session.reset_content_state();
            Ok(handle)
        })
    }

    pub fn end_template(&mut self) -> Result<(), SessionError> {
        self.track("end_template", |session| {
            if !matches!(session.scope, Scope::Template { .. }) {
                return Err(SessionError::state("There is no open template"));
            }
            session.check_balanced()?;
            let Scope::Template { handle, canvas } =
                std::mem::replace(&mut session.scope, Scope::Document)
            else {
                return Err(SessionError::state("There is no open template"));
            };
            session.document.add_template(canvas)?;
            if let Resource::Template { finished, .. } =
                session.resources.get_mut(handle, &[ResourceKind::Template])?
            {
                *finished = true;
            }
            session.reset_content_state();
            Ok(())
        })
    }

    /// The natural size of an image, a template or an imported page.
    pub fn resource_size(&mut self, handle: Handle) -> Result<(f32, f32), SessionError> {
        self.track("resource_size", |session| {
            let xobject = session.xobject(
                handle,
                &[
                    ResourceKind::Image,
                    ResourceKind::Template,
                    ResourceKind::ImportedPage,
                ],
            )?;
            Ok((xobject.width, xobject.height))
        })
    }

    fn xobject(&self, handle: Handle, expected: &[ResourceKind]) -> Result<XObject, SessionError> {
        match self.resources.get(handle, expected)? {
            Resource::Image {
                object_id,
                width,
                height,
            } => Ok(XObject {
                object_id: *object_id,
                width: *width,
                height: *height,
                is_image: true,
            }),
            Resource::Template {
                object_id,
                width,
                height,
                finished,
            } => {
                if !finished {
                    return Err(SessionError::state(
                        "The template is still being defined",
                    ));
                }
                Ok(XObject {
                    object_id: *object_id,
                    width: *width,
                    height: *height,
                    is_image: false,
                })
            }
            Resource::ImportedPage(page) => Ok(XObject {
                object_id: page.object_id,
                width: page.width,
                height: page.height,
                is_image: false,
            }),
            _ => Err(SessionError::invalid_handle(format!(
                "Handle {} cannot be placed",
                handle
            ))),
        }
    }

    fn place_xobject(
        &mut self,
        handle: Handle,
        expected: &[ResourceKind],
        x: f32,
        y: f32,
        fit_options: &FitOptions,
    ) -> Result<(), SessionError> {
        self.canvas()?;
        let xobject = self.xobject(handle, expected)?;
        let placement = fit(xobject.width, xobject.height, x, y, fit_options);
        let object = if xobject.is_image {
            crate::graphics::Matrix::scaling(xobject.width, xobject.height).then(&placement.object)
        } else {
            placement.object
        };

        let name = resource_name("X", handle);
        self.canvas()?.resources.add_xobject(&name, xobject.object_id);
        let mut operations = vec![Operation::new("q", vec![]), placement.frame.to_operation()];
        if let Some((clip_width, clip_height)) = placement.clip {
            operations.extend(clip_operations(clip_width, clip_height));
        }
        operations.extend([
            object.to_operation(),
            Operation::new("Do", vec![Object::Name(name.into_bytes())]),
            Operation::new("Q", vec![]),
        ]);
        self.emit(operations)
    }
}

fn reals(values: &[f32]) -> Object {
    Object::Array(values.iter().copied().map(Object::Real).collect())
}

/// Checks the header of an ICC profile and returns the number of components of its data
/// color space.
fn icc_components(data: &[u8]) -> Result<usize, SessionError> {
    if data.len() < 128 || &data[36..40] != b"acsp" {
        return Err(SessionError::with_context(
            ErrorKind::Format,
            "The data is not an ICC profile",
        ));
    }
    match &data[16..20] {
        b"GRAY" => Ok(1),
        b"RGB " => Ok(3),
        b"CMYK" => Ok(4),
        other => Err(SessionError::with_context(
            ErrorKind::Format,
            format!(
                "Unsupported ICC color space {:?}",
                String::from_utf8_lossy(other)
            ),
        )),
    }
}

/// Builds the `ExtGState` dictionary from the options of `create_gstate`.
fn gstate_dictionary(options: &OptionList) -> Result<(Dictionary, GStateSettings), SessionError> {
    let mut dictionary = Dictionary::from_iter(vec![("Type", Object::Name("ExtGState".into()))]);
    let mut settings = GStateSettings::default();

    if let Some(width) = options.float("linewidth")? {
        if width < 0.0 {
            return Err(SessionError::option("Option \"linewidth\" must not be negative"));
        }
        dictionary.set("LW", Object::Real(width));
        settings.line_width = Some(width);
    }
    for (key, entry) in [("linecap", "LC"), ("linejoin", "LJ")] {
        if let Some(value) = options.integer(key)? {
            if !(0..=2).contains(&value) {
                return Err(SessionError::option(format!(
                    "Option {:?} must be 0, 1 or 2",
                    key
                )));
            }
            dictionary.set(entry, Object::Integer(value));
            if key == "linecap" {
                settings.line_cap = Some(value);
            } else {
                settings.line_join = Some(value);
            }
        }
    }
    if let Some(limit) = options.float("miterlimit")? {
        if limit < 1.0 {
            return Err(SessionError::option("Option \"miterlimit\" must be at least 1"));
        }
        dictionary.set("ML", Object::Real(limit));
        settings.miter_limit = Some(limit);
    }
    if let Some(flatness) = options.float("flatness")? {
        if !(0.0..=100.0).contains(&flatness) {
            return Err(SessionError::option(
                "Option \"flatness\" must be between 0 and 100",
            ));
        }
        dictionary.set("FL", Object::Real(flatness));
        settings.flatness = Some(flatness);
    }
    for (key, entry) in [("opacityfill", "ca"), ("opacitystroke", "CA")] {
        if let Some(opacity) = options.float(key)? {
            if !(0.0..=1.0).contains(&opacity) {
                return Err(SessionError::option(format!(
                    "Option {:?} must be between 0 and 1",
                    key
                )));
            }
            dictionary.set(entry, Object::Real(opacity));
        }
    }
    if let Some(blend_mode) = options.string("blendmode")? {
        let blend_mode = BLEND_MODES
            .iter()
            .find(|mode| mode.eq_ignore_ascii_case(&blend_mode))
            .ok_or_else(|| {
                SessionError::option(format!(
                    "Option \"blendmode\" does not accept {:?}",
                    blend_mode
                ))
            })?;
        dictionary.set("BM", Object::Name(blend_mode.as_bytes().to_vec()));
    }
    if options.contains("dasharray") || options.contains("dashphase") {
        let array = options.floats("dasharray", 0..=8)?.unwrap_or_default();
        let phase = options.float("dashphase")?.unwrap_or(0.0);
        let dash_pattern = DashPattern::new(array, phase)
            .map_err(|error| SessionError::option(error.context))?;
        dictionary.set("D", dash_pattern.to_object());
        settings.dash_pattern = Some(dash_pattern);
    }
    if let Some(stroke_adjust) = options.boolean("strokeadjust")? {
        dictionary.set("SA", Object::Boolean(stroke_adjust));
    }

    Ok((dictionary, settings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icc_headers_are_validated() {
        let mut header = vec![0u8; 128];
        header[16..20].copy_from_slice(b"CMYK");
        header[36..40].copy_from_slice(b"acsp");
        assert_eq!(icc_components(&header).unwrap(), 4);
        header[16..20].copy_from_slice(b"Lab ");
        assert_eq!(icc_components(&header).unwrap_err().kind, ErrorKind::Format);
        assert!(icc_components(b"short").is_err());
    }

    #[test]
    fn gstate_options_map_to_entries() {
        let options = OptionList::parse("opacityfill 0.5 blendmode multiply linewidth 3").unwrap();
        let (dictionary, settings) = gstate_dictionary(&options).unwrap();
        assert_eq!(dictionary.get(b"ca").unwrap(), &Object::Real(0.5));
        assert_eq!(
            dictionary.get(b"BM").unwrap(),
            &Object::Name(b"Multiply".to_vec())
        );
        assert_eq!(settings.line_width, Some(3.0));

        let options = OptionList::parse("opacitystroke 2").unwrap();
        assert_eq!(gstate_dictionary(&options).unwrap_err().kind, ErrorKind::Option);
    }
}
