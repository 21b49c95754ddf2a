use crate::error::SessionError;
use crate::fonts::{Font, Glyph};

/// The option keys understood by `fit_textline` in addition to the fitting options.
pub const TEXTLINE_KEYS: &[&str] = &[
    "font",
    "fontsize",
    "margin",
    "charspacing",
    "wordspacing",
    "horizscaling",
    "textrise",
    "textrendering",
];

/// The text state values which influence the width of a text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub size: f32,
    pub character_spacing: f32,
    pub word_spacing: f32,
    /// Horizontal scaling in percent.
    pub horizontal_scaling: f32,
}

impl TextStyle {
    /// The advance of the given glyphs in text space units.
    pub fn width(&self, glyphs: &[Glyph]) -> f32 {
        glyphs
            .iter()
            .map(|glyph| {
                let spacing = self.character_spacing
                    + if glyph.is_space {
                        self.word_spacing
                    } else {
                        0.0
                    };
                (glyph.width / 1000.0 * self.size + spacing) * self.horizontal_scaling / 100.0
            })
            .sum()
    }

    pub fn text_width(&self, font: &Font, text: &str) -> f32 {
        self.width(&font.shape(text))
    }
}

/// The horizontal formatting of the lines of a text box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Right,
    Center,
    /// Lines broken because they were full are stretched to the width of the box.
    Justify,
    /// Every line is stretched to the width of the box.
    FullJustify,
}

impl Alignment {
    pub fn parse(mode: &str) -> Result<Alignment, SessionError> {
        match mode.to_lowercase().as_str() {
            "left" => Ok(Alignment::Left),
            "right" => Ok(Alignment::Right),
            "center" => Ok(Alignment::Center),
            "justify" => Ok(Alignment::Justify),
            "fulljustify" => Ok(Alignment::FullJustify),
            _ => Err(SessionError::argument(format!(
                "Unknown alignment {:?}, expected left, right, center, justify or fulljustify",
                mode
            ))),
        }
    }
}

/// A piece of text to be shown at the given position.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub x: f32,
    pub y: f32,
    pub text: String,
}

/// The result of formatting a text into a box.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoxedText {
    pub runs: Vec<TextRun>,
    /// The number of characters which did not fit into the box.
    pub remaining: usize,
}

/// The geometry of a text box, `left` and `bottom` being its lower left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextBox {
    pub left: f32,
    pub bottom: f32,
    pub width: f32,
    pub height: f32,
}

/// The reason a line ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineEnd {
    Overflow,
    Forced,
    Text,
}

/// Formats a text into a box, breaking lines at spaces and at line feeds, carriage returns
/// or both. Lines are added from the top of the box, one leading apart, as long as their
/// baseline stays inside the box.
pub fn layout_boxed(
    text: &str,
    font: &Font,
    style: &TextStyle,
    leading: f32,
    text_box: TextBox,
    alignment: Alignment,
) -> BoxedText {
    let characters: Vec<char> = text.chars().collect();

    if text_box.width == 0.0 && text_box.height == 0.0 {
        let line: String = characters
            .iter()
            .filter(|character| !matches!(character, '\r' | '\n'))
            .collect();
        let line_width = style.text_width(font, &line);
        let x = match alignment {
            Alignment::Right => text_box.left - line_width,
            Alignment::Center => text_box.left - line_width / 2.0,
            _ => text_box.left,
        };
        return BoxedText {
            runs: vec![TextRun {
                x,
                y: text_box.bottom,
                text: line,
            }],
            remaining: 0,
        };
    }

    let character_width = |character: char| -> f32 {
        font.glyph(character)
            .or_else(|| font.glyph('?'))
            .map(|glyph| style.width(&[glyph]))
            .unwrap_or(0.0)
    };

    let mut runs = Vec::new();
    let mut position = 0;
    let mut baseline = text_box.bottom + text_box.height;

    while position < characters.len() {
        baseline -= leading;
        if baseline < text_box.bottom {
            break;
        }

        // Find where the line ends: a forced break, the first character which does not
        // fit or the end of the text
        let mut line_width = 0.0;
        let mut last_space = None;
        let mut end = position;
        let mut line_end = LineEnd::Text;
        while end < characters.len() {
            let character = characters[end];
            if matches!(character, '\r' | '\n') {
                line_end = LineEnd::Forced;
                break;
            }
            if character == ' ' {
                last_space = Some(end);
            } else if line_width + character_width(character) > text_box.width {
                line_end = LineEnd::Overflow;
                break;
            }
            line_width += character_width(character);
            end += 1;
        }

        let mut next = end;
        if line_end == LineEnd::Overflow {
            match last_space {
                Some(space) => {
                    end = space;
                    next = space;
                }
                // A word longer than the box width ends the formatting
                None => break,
            }
        }

        let line: String = characters[position..end].iter().collect();
        let line = line.trim_end_matches(' ').to_string();
        place_line(
            &mut runs,
            &line,
            font,
            style,
            text_box,
            baseline,
            alignment,
            line_end,
        );

        // Spaces at the break and the line break itself belong to the finished line
        while next < characters.len() && characters[next] == ' ' {
            next += 1;
        }
        if line_end != LineEnd::Text {
            match characters.get(next..next + 2) {
                Some(['\r', '\n']) => next += 2,
                _ if matches!(characters.get(next), Some('\r' | '\n')) => next += 1,
                _ => (),
            }
        }
        position = next;
    }

    BoxedText {
        runs,
        remaining: characters.len() - position.min(characters.len()),
    }
}

#[allow(clippy::too_many_arguments)]
fn place_line(
    runs: &mut Vec<TextRun>,
    line: &str,
    font: &Font,
    style: &TextStyle,
    text_box: TextBox,
    baseline: f32,
    alignment: Alignment,
    line_end: LineEnd,
) {
    let line_width = style.text_width(font, line);
    let gaps = line.matches(' ').count();
    let stretch = match alignment {
        Alignment::Justify => line_end == LineEnd::Overflow,
        Alignment::FullJustify => true,
        _ => false,
    };

    if stretch && gaps > 0 {
        let extra = (text_box.width - line_width) / gaps as f32;
        let space_width = style.text_width(font, " ");
        let mut x = text_box.left;
        for word in line.split(' ') {
            if !word.is_empty() {
                runs.push(TextRun {
                    x,
                    y: baseline,
                    text: word.to_string(),
                });
            }
            x += style.text_width(font, word) + space_width + extra;
        }
        return;
    }

    let x = match alignment {
        Alignment::Right => text_box.left + text_box.width - line_width,
        Alignment::Center => text_box.left + (text_box.width - line_width) / 2.0,
        _ => text_box.left,
    };
    if !line.is_empty() {
        runs.push(TextRun {
            x,
            y: baseline,
            text: line.to_string(),
        });
    }
}
