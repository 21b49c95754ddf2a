use std::path::PathBuf;

use super::{Resource, Scope, Session};
use crate::error::SessionError;
use crate::graphics::check_finite;
use crate::handle::{Handle, ResourceKind};
use crate::path::FillRule;

const OPEN_MODES: &[&str] = &["none", "outlines", "fullscreen"];

/// Runtime parameters and values.
impl Session {
    /// Sets a string parameter: `SearchPath`, `FontOutline` (as `name=file`), `fillrule`
    /// or `openmode`.
    pub fn set_parameter(&mut self, key: &str, value: &str) -> Result<(), SessionError> {
        self.track("set_parameter", |session| {
            match key.to_lowercase().as_str() {
                "searchpath" => {
                    session.configuration.search_paths.push(PathBuf::from(value));
                }
                "fontoutline" => {
                    let (font_name, file_name) = value
                        .split_once('=')
                        .filter(|(font_name, file_name)| !font_name.is_empty() && !file_name.is_empty())
                        .ok_or_else(|| {
                            SessionError::argument(format!(
                                "Expected a font outline as name=file, got {:?}",
                                value
                            ))
                        })?;
                    session
                        .configuration
                        .associate_font(font_name.trim(), PathBuf::from(file_name.trim()));
                }
                "fillrule" => session.fill_rule = FillRule::parse(value)?,
                "openmode" => {
                    let mode = value.to_lowercase();
                    if !OPEN_MODES.contains(&mode.as_str()) {
                        return Err(SessionError::argument(format!(
                            "Unknown open mode {:?}, expected none, outlines or fullscreen",
                            value
                        )));
                    }
                    session.open_mode = Some(mode);
                }
                _ => {
                    return Err(SessionError::option(format!(
                        "Unknown parameter {:?}",
                        key
                    )))
                }
            }
            Ok(())
        })
    }

    /// Reads a string parameter. For `fontname` and `fontencoding` the modifier is a font
    /// handle, or 0 for the current font.
    pub fn get_parameter(&mut self, key: &str, modifier: f64) -> Result<String, SessionError> {
        self.track("get_parameter", |session| match key.to_lowercase().as_str() {
            "fontname" | "fontencoding" => {
                let index = if modifier == 0.0 {
                    session
                        .graphics
                        .current
                        .text
                        .font
                        .map(|(index, _)| index)
                        .ok_or_else(|| SessionError::state("No font has been set"))?
                } else {
                    match session
                        .resources
                        .get(Handle(modifier as u64), &[ResourceKind::Font])?
                    {
                        Resource::Font { index } => *index,
                        _ => return Err(SessionError::invalid_handle("Expected a font")),
                    }
                };
                let (_, font) = session.document.font(index)?;
                Ok(if key.eq_ignore_ascii_case("fontname") {
                    font.font_name.clone()
                } else {
                    font.encoding_name.clone()
                })
            }
            "fillrule" => Ok(session.fill_rule.name().to_string()),
            "openmode" => Ok(session
                .open_mode
                .clone()
                .unwrap_or_else(|| "none".to_string())),
            "version" => Ok(env!("CARGO_PKG_VERSION").to_string()),
            _ => Err(SessionError::option(format!("Unknown parameter {:?}", key))),
        })
    }

    /// Sets a numeric value: `compress` or one of the text state values `leading`,
    /// `charspacing`, `wordspacing`, `horizscaling`, `textrise` and `textrendering`.
    pub fn set_value(&mut self, key: &str, value: f32) -> Result<(), SessionError> {
        self.track("set_value", |session| {
            check_finite(&[value])?;
            let key = key.to_lowercase();
            if key == "compress" {
                session.configuration.compress = value != 0.0;
                return Ok(());
            }
            if !matches!(
                key.as_str(),
                "leading" | "charspacing" | "wordspacing" | "horizscaling" | "textrise" | "textrendering"
            ) {
                return Err(SessionError::option(format!("Unknown value {:?}", key)));
            }
            session.path_canvas()?;
            let text = &mut session.graphics.current.text;
            match key.as_str() {
                "leading" => text.leading = value,
                "charspacing" => text.character_spacing = value,
                "wordspacing" => text.word_spacing = value,
                "horizscaling" => {
                    if value == 0.0 {
                        return Err(SessionError::argument("The horizontal scaling must not be zero"));
                    }
                    text.horizontal_scaling = value;
                }
                "textrise" => text.rise = value,
                _ => {
                    if value.fract() != 0.0 || !(0.0..=7.0).contains(&value) {
                        return Err(SessionError::argument(format!(
                            "The text rendering mode must be an integer between 0 and 7, got {}",
                            value
                        )));
                    }
                    text.rendering_mode = value as i64;
                }
            }
            Ok(())
        })
    }

    /// Reads a numeric value: the text state values, `fontsize`, the text position
    /// `textx`/`texty`, the current point `currentx`/`currenty`, the page size
    /// `pagewidth`/`pageheight` and `compress`.
    pub fn get_value(&mut self, key: &str, _modifier: f64) -> Result<f32, SessionError> {
        self.track("get_value", |session| {
            let text = &session.graphics.current.text;
            let cursor = session.text_cursor;
            let current_point = session.path.current_point();
            let page_size = match &session.scope {
                Scope::Page(canvas) | Scope::Template { canvas, .. } => {
                    Some((canvas.width, canvas.height))
                }
                Scope::Document => None,
            };
            match key.to_lowercase().as_str() {
                "compress" => Ok(if session.configuration.compress { 1.0 } else { 0.0 }),
                "leading" => Ok(text.leading),
                "charspacing" => Ok(text.character_spacing),
                "wordspacing" => Ok(text.word_spacing),
                "horizscaling" => Ok(text.horizontal_scaling),
                "textrise" => Ok(text.rise),
                "textrendering" => Ok(text.rendering_mode as f32),
                "fontsize" => Ok(text.font.map_or(0.0, |(_, size)| size)),
                "textx" => Ok(cursor.map_or(0.0, |cursor| cursor.x)),
                "texty" => Ok(cursor.map_or(0.0, |cursor| cursor.y)),
                "currentx" => Ok(current_point.map_or(0.0, |(x, _)| x)),
                "currenty" => Ok(current_point.map_or(0.0, |(_, y)| y)),
                "pagewidth" | "pageheight" => {
                    let (width, height) = page_size
                        .ok_or_else(|| SessionError::state("There is no open page or template"))?;
                    Ok(if key.eq_ignore_ascii_case("pagewidth") {
                        width
                    } else {
                        height
                    })
                }
                _ => Err(SessionError::option(format!("Unknown value {:?}", key))),
            }
        })
    }
}
