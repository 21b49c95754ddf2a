use lopdf::content::Operation;
use lopdf::Object;

use super::{Resource, Session, TextCursor};
use crate::error::SessionError;
use crate::fitting::{fit, FitOptions, FIT_KEYS};
use crate::graphics::{check_finite, TextState};
use crate::handle::{Handle, ResourceKind};
use crate::options::OptionList;
use crate::text::{layout_boxed, Alignment, TextBox, TextStyle, TEXTLINE_KEYS};

/// Text output and measurement.
impl Session {
    /// Selects a loaded font for the text output, the leading follows the font size.
    pub fn setfont(&mut self, font: Handle, size: f32) -> Result<(), SessionError> {
        self.track("setfont", |session| {
            session.canvas()?;
            if size == 0.0 || !size.is_finite() {
                return Err(SessionError::argument("The font size must not be zero"));
            }
            let index = session.font_index(font)?;
            let text = &mut session.graphics.current.text;
            text.font = Some((index, size));
            text.leading = size;
            Ok(())
        })
    }

    /// Moves the text cursor, which also becomes the start of the current line.
    pub fn set_text_pos(&mut self, x: f32, y: f32) -> Result<(), SessionError> {
        self.track("set_text_pos", |session| {
            check_finite(&[x, y])?;
            session.canvas()?;
            session.text_cursor = Some(TextCursor {
                x,
                y,
                line_x: x,
                line_y: y,
            });
            Ok(())
        })
    }

    /// Shows a text at the text cursor, which advances by the width of the text.
    pub fn show(&mut self, text: &str) -> Result<(), SessionError> {
        self.track("show", |session| {
            let cursor = session.text_cursor.unwrap_or(TextCursor {
                x: 0.0,
                y: 0.0,
                line_x: 0.0,
                line_y: 0.0,
            });
            session.show_at_cursor(text, cursor)
        })
    }

    pub fn show_xy(&mut self, text: &str, x: f32, y: f32) -> Result<(), SessionError> {
        self.track("show_xy", |session| {
            check_finite(&[x, y])?;
            let cursor = TextCursor {
                x,
                y,
                line_x: x,
                line_y: y,
            };
            session.show_at_cursor(text, cursor)
        })
    }

    /// Shows a text at the start of the next line, one leading below the current one.
    pub fn continue_text(&mut self, text: &str) -> Result<(), SessionError> {
        self.track("continue_text", |session| {
            let cursor = session.text_cursor.ok_or_else(|| {
                SessionError::state("There is no current line to continue on this page")
            })?;
            let line_y = cursor.line_y - session.graphics.current.text.leading;
            let cursor = TextCursor {
                x: cursor.line_x,
                y: line_y,
                line_x: cursor.line_x,
                line_y,
            };
            session.show_at_cursor(text, cursor)
        })
    }

    /// The width of a text in the given font and size, with the current text state.
    pub fn stringwidth(&mut self, text: &str, font: Handle, size: f32) -> Result<f32, SessionError> {
        self.track("stringwidth", |session| {
            check_finite(&[size])?;
            let index = session.font_index(font)?;
            let style = text_style(&session.graphics.current.text, size);
            let (_, font) = session.document.font(index)?;
            Ok(style.text_width(font, text))
        })
    }

    /// Formats a text into a box, returning the number of characters which did not fit.
    /// A box of zero width and height places a single line aligned at `(left, bottom)`.
    #[allow(clippy::too_many_arguments)]
    pub fn show_boxed(
        &mut self,
        text: &str,
        left: f32,
        bottom: f32,
        width: f32,
        height: f32,
        hmode: &str,
        feature: &str,
    ) -> Result<usize, SessionError> {
        self.track("show_boxed", |session| {
            check_finite(&[left, bottom, width, height])?;
            let blind = match feature.to_lowercase().as_str() {
                "" => false,
                "blind" => true,
                _ => {
                    return Err(SessionError::argument(format!(
                        "Unknown feature {:?}, expected blind or nothing",
                        feature
                    )))
                }
            };
            let alignment = Alignment::parse(hmode)?;
            if (width == 0.0) != (height == 0.0) {
                return Err(SessionError::argument(
                    "The box width and height must both be zero or both be non-zero",
                ));
            }
            session.canvas()?;
            let text_state = session.graphics.current.text.clone();
            let (index, size) = text_state
                .font
                .ok_or_else(|| SessionError::state("No font has been set"))?;

            let (_, font) = session.document.font(index)?;
            let boxed = layout_boxed(
                text,
                font,
                &text_style(&text_state, size),
                text_state.leading,
                TextBox {
                    left,
                    bottom,
                    width,
                    height,
                },
                alignment,
            );
            if blind {
                return Ok(boxed.remaining);
            }

            for run in boxed.runs.iter() {
                let (operations, run_width) =
                    session.text_operations(index, size, &text_state, run.x, run.y, &run.text)?;
                session.emit(operations)?;
                session.text_cursor = Some(TextCursor {
                    x: run.x + run_width,
                    y: run.y,
                    line_x: left,
                    line_y: run.y,
                });
            }
            Ok(boxed.remaining)
        })
    }

    /// Places a single line of text with the fitting options, the text box being as wide as
    /// the text and as high as the capital letters of the font.
    pub fn fit_textline(&mut self, text: &str, x: f32, y: f32, optlist: &str) -> Result<(), SessionError> {
        self.track("fit_textline", |session| {
            check_finite(&[x, y])?;
            let keys: Vec<&str> = FIT_KEYS.iter().chain(TEXTLINE_KEYS).copied().collect();
            let options = OptionList::parse_with_keys(optlist, &keys)?;
            session.canvas()?;

            let mut text_state = session.graphics.current.text.clone();
            let index = match options.handle("font")? {
                Some(font) => Some(session.font_index(font)?),
                None => text_state.font.map(|(index, _)| index),
            }
            .ok_or_else(|| SessionError::state("No font has been set"))?;
            let size = match options.float("fontsize")? {
                Some(size) => size,
                None => match text_state.font {
                    Some((_, size)) => size,
                    None => {
                        return Err(SessionError::option(
                            "Option \"fontsize\" is required along with \"font\"",
                        ))
                    }
                },
            };
            if size == 0.0 {
                return Err(SessionError::option("Option \"fontsize\" must not be zero"));
            }
            apply_text_options(&mut text_state, &options)?;
            let (margin_x, margin_y) = match options.floats("margin", 1..=2)?.as_deref() {
                Some([margin]) => (*margin, *margin),
                Some([margin_x, margin_y]) => (*margin_x, *margin_y),
                _ => (0.0, 0.0),
            };

            let (_, font) = session.document.font(index)?;
            let text_width = text_style(&text_state, size).text_width(font, text);
            let cap_height = font.cap_height() * size.abs() / 1000.0;
            let placement = fit(
                text_width + 2.0 * margin_x,
                cap_height + 2.0 * margin_y,
                x,
                y,
                &FitOptions::from_options(&options)?,
            );

            let (text_operations, _) =
                session.text_operations(index, size, &text_state, margin_x, margin_y, text)?;
            let mut operations = vec![Operation::new("q", vec![]), placement.frame.to_operation()];
            if let Some((clip_width, clip_height)) = placement.clip {
                operations.extend(clip_operations(clip_width, clip_height));
            }
            operations.push(placement.object.to_operation());
            operations.extend(text_operations);
            operations.push(Operation::new("Q", vec![]));
            session.emit(operations)
        })
    }

    fn font_index(&self, font: Handle) -> Result<usize, SessionError> {
        match self.resources.get(font, &[ResourceKind::Font])? {
            Resource::Font { index } => Ok(*index),
            _ => Err(SessionError::invalid_handle("Expected a font")),
        }
    }

    fn show_at_cursor(&mut self, text: &str, cursor: TextCursor) -> Result<(), SessionError> {
        self.canvas()?;
        let text_state = self.graphics.current.text.clone();
        let (index, size) = text_state
            .font
            .ok_or_else(|| SessionError::state("No font has been set"))?;
        let (operations, width) =
            self.text_operations(index, size, &text_state, cursor.x, cursor.y, text)?;
        self.emit(operations)?;
        self.text_cursor = Some(TextCursor {
            x: cursor.x + width,
            ..cursor
        });
        Ok(())
    }

    /// The text object showing a text at the given position, together with its width. The
    /// font is added to the resources of the current page or template.
    fn text_operations(
        &mut self,
        index: usize,
        size: f32,
        text_state: &TextState,
        x: f32,
        y: f32,
        text: &str,
    ) -> Result<(Vec<Operation>, f32), SessionError> {
        let (font_object_id, font) = self.document.font(index)?;
        let font_object_id = *font_object_id;
        let resource_name = font.resource_name.clone();
        let glyphs = font.shape(text);
        let width = text_style(text_state, size).width(&glyphs);
        let string = font.to_string_object(&glyphs);

        self.canvas()?
            .resources
            .add_font(&resource_name, font_object_id);

        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![Object::Name(resource_name.into_bytes()), Object::Real(size)],
            ),
        ];
        let optional = [
            ("Tc", text_state.character_spacing, 0.0),
            ("Tw", text_state.word_spacing, 0.0),
            ("Tz", text_state.horizontal_scaling, 100.0),
            ("Ts", text_state.rise, 0.0),
        ];
        for (operator, value, default) in optional {
            if value != default {
                operations.push(Operation::new(operator, vec![Object::Real(value)]));
            }
        }
        if text_state.rendering_mode != 0 {
            operations.push(Operation::new(
                "Tr",
                vec![Object::Integer(text_state.rendering_mode)],
            ));
        }
        operations.extend([
            Operation::new("Td", vec![Object::Real(x), Object::Real(y)]),
            Operation::new("Tj", vec![string]),
            Operation::new("ET", vec![]),
        ]);
        Ok((operations, width))
    }
}

pub(crate) fn text_style(text_state: &TextState, size: f32) -> TextStyle {
    TextStyle {
        size,
        character_spacing: text_state.character_spacing,
        word_spacing: text_state.word_spacing,
        horizontal_scaling: text_state.horizontal_scaling,
    }
}

pub(crate) fn clip_operations(width: f32, height: f32) -> Vec<Operation> {
    vec![
        Operation::new(
            "re",
            [0.0, 0.0, width, height]
                .into_iter()
                .map(Object::Real)
                .collect(),
        ),
        Operation::new("W", vec![]),
        Operation::new("n", vec![]),
    ]
}

/// Applies the text state options of `fit_textline` to a copy of the text state.
fn apply_text_options(text_state: &mut TextState, options: &OptionList) -> Result<(), SessionError> {
    if let Some(spacing) = options.float("charspacing")? {
        text_state.character_spacing = spacing;
    }
    if let Some(spacing) = options.float("wordspacing")? {
        text_state.word_spacing = spacing;
    }
    if let Some(scaling) = options.float("horizscaling")? {
        if scaling == 0.0 {
            return Err(SessionError::option(
                "Option \"horizscaling\" must not be zero",
            ));
        }
        text_state.horizontal_scaling = scaling;
    }
    if let Some(rise) = options.float("textrise")? {
        text_state.rise = rise;
    }
    if let Some(mode) = options.integer("textrendering")? {
        if !(0..=7).contains(&mode) {
            return Err(SessionError::option(
                "Option \"textrendering\" must be between 0 and 7",
            ));
        }
        text_state.rendering_mode = mode;
    }
    Ok(())
}
