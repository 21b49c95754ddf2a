//! Metrics and encoding of the fourteen standard PDF fonts, which every viewer provides
//! and which are therefore referenced without embedding their font programs.

use unicode_normalization::UnicodeNormalization as _;

/// Advance widths of the characters from 32 (space) to 126 (tilde) in Helvetica, which
/// Helvetica-Oblique shares.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, 556, 556,
    556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, 1015, 667, 667, 722,
    722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, 667, 778, 722, 667, 611, 722,
    667, 944, 667, 667, 611, 278, 278, 278, 469, 556, 333, 556, 556, 500, 556, 556, 278, 556,
    556, 222, 222, 500, 222, 833, 556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500,
    500, 334, 260, 334, 584,
];

const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, 556, 556,
    556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, 975, 722, 722, 722,
    722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, 667, 778, 722, 667, 611, 722,
    667, 944, 667, 667, 611, 333, 278, 333, 584, 556, 333, 556, 611, 556, 611, 556, 333, 611,
    611, 278, 278, 556, 278, 889, 611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556,
    500, 389, 280, 389, 584,
];

const TIMES_ROMAN_WIDTHS: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278, 500, 500,
    500, 500, 500, 500, 500, 500, 500, 500, 278, 278, 564, 564, 564, 444, 921, 722, 667, 667,
    722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722, 556, 722, 667, 556, 611, 722,
    722, 944, 722, 722, 611, 333, 278, 333, 469, 500, 333, 444, 500, 444, 500, 444, 333, 500,
    500, 278, 278, 500, 278, 778, 500, 500, 500, 500, 333, 389, 278, 500, 500, 722, 500, 500,
    444, 480, 200, 480, 541,
];

const TIMES_BOLD_WIDTHS: [u16; 95] = [
    250, 333, 555, 500, 500, 1000, 833, 278, 333, 333, 500, 570, 250, 333, 250, 278, 500, 500,
    500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 570, 570, 570, 500, 930, 722, 667, 722,
    722, 667, 611, 778, 778, 389, 500, 778, 667, 944, 722, 778, 611, 778, 722, 556, 667, 722,
    722, 1000, 722, 722, 667, 333, 278, 333, 581, 500, 333, 500, 556, 444, 556, 444, 333, 500,
    556, 278, 333, 556, 278, 833, 556, 500, 556, 556, 444, 389, 333, 556, 500, 722, 500, 500,
    444, 394, 220, 394, 520,
];

const TIMES_ITALIC_WIDTHS: [u16; 95] = [
    250, 333, 420, 500, 500, 833, 778, 214, 333, 333, 500, 675, 250, 333, 250, 278, 500, 500,
    500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 675, 675, 675, 500, 920, 611, 611, 667,
    722, 611, 611, 722, 722, 333, 444, 667, 556, 833, 667, 722, 611, 722, 611, 500, 556, 722,
    611, 833, 611, 556, 556, 389, 278, 389, 422, 500, 333, 500, 500, 444, 500, 444, 278, 500,
    500, 278, 278, 444, 278, 722, 500, 500, 500, 500, 389, 389, 278, 500, 444, 667, 444, 444,
    389, 400, 275, 400, 541,
];

const TIMES_BOLD_ITALIC_WIDTHS: [u16; 95] = [
    250, 389, 555, 500, 500, 833, 778, 278, 333, 333, 500, 570, 250, 333, 250, 278, 500, 500,
    500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 570, 570, 570, 500, 832, 667, 667, 667,
    722, 667, 667, 722, 778, 389, 500, 667, 611, 889, 722, 722, 611, 722, 667, 556, 611, 722,
    667, 889, 667, 611, 611, 333, 278, 333, 570, 500, 333, 500, 500, 444, 500, 444, 333, 500,
    556, 278, 278, 500, 278, 778, 556, 500, 500, 500, 389, 389, 278, 556, 444, 667, 500, 444,
    389, 348, 220, 348, 570,
];

/// Widths of the WinAnsi characters which neither are ASCII nor decompose into an ASCII
/// letter, as (character, sans serif width, serif width).
const EXTRA_WIDTHS: [(char, u16, u16); 27] = [
    ('\u{a0}', 278, 250),
    ('€', 556, 500),
    ('‚', 222, 333),
    ('ƒ', 556, 500),
    ('„', 333, 444),
    ('…', 1000, 1000),
    ('†', 556, 500),
    ('‡', 556, 500),
    ('ˆ', 333, 333),
    ('‰', 1000, 1000),
    ('‹', 333, 333),
    ('Œ', 1000, 889),
    ('‘', 222, 333),
    ('’', 222, 333),
    ('“', 333, 444),
    ('”', 333, 444),
    ('•', 350, 350),
    ('–', 556, 500),
    ('—', 1000, 1000),
    ('˜', 333, 333),
    ('™', 1000, 980),
    ('›', 333, 333),
    ('œ', 944, 722),
    ('ß', 611, 500),
    ('Æ', 1000, 889),
    ('æ', 889, 667),
    ('°', 400, 400),
];

/// The characters of the Windows code page 1252 between 0x80 and 0x9F.
const WINANSI_EXTRAS: [(char, u8); 27] = [
    ('€', 0x80),
    ('‚', 0x82),
    ('ƒ', 0x83),
    ('„', 0x84),
    ('…', 0x85),
    ('†', 0x86),
    ('‡', 0x87),
    ('ˆ', 0x88),
    ('‰', 0x89),
    ('Š', 0x8A),
    ('‹', 0x8B),
    ('Œ', 0x8C),
    ('Ž', 0x8E),
    ('‘', 0x91),
    ('’', 0x92),
    ('“', 0x93),
    ('”', 0x94),
    ('•', 0x95),
    ('–', 0x96),
    ('—', 0x97),
    ('˜', 0x98),
    ('™', 0x99),
    ('š', 0x9A),
    ('›', 0x9B),
    ('œ', 0x9C),
    ('ž', 0x9E),
    ('Ÿ', 0x9F),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Helvetica,
    Times,
    Courier,
    Symbol,
    ZapfDingbats,
}

/// One of the fourteen standard fonts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StandardFont {
    name: &'static str,
    family: Family,
    widths: Option<&'static [u16; 95]>,
}

const STANDARD_FONTS: [StandardFont; 14] = [
    StandardFont {
        name: "Helvetica",
        family: Family::Helvetica,
        widths: Some(&HELVETICA_WIDTHS),
    },
    StandardFont {
        name: "Helvetica-Bold",
        family: Family::Helvetica,
        widths: Some(&HELVETICA_BOLD_WIDTHS),
    },
    StandardFont {
        name: "Helvetica-Oblique",
        family: Family::Helvetica,
        widths: Some(&HELVETICA_WIDTHS),
    },
    StandardFont {
        name: "Helvetica-BoldOblique",
        family: Family::Helvetica,
        widths: Some(&HELVETICA_BOLD_WIDTHS),
    },
    StandardFont {
        name: "Times-Roman",
        family: Family::Times,
        widths: Some(&TIMES_ROMAN_WIDTHS),
    },
    StandardFont {
        name: "Times-Bold",
        family: Family::Times,
        widths: Some(&TIMES_BOLD_WIDTHS),
    },
    StandardFont {
        name: "Times-Italic",
        family: Family::Times,
        widths: Some(&TIMES_ITALIC_WIDTHS),
    },
    StandardFont {
        name: "Times-BoldItalic",
        family: Family::Times,
        widths: Some(&TIMES_BOLD_ITALIC_WIDTHS),
    },
    StandardFont {
        name: "Courier",
        family: Family::Courier,
        widths: None,
    },
    StandardFont {
        name: "Courier-Bold",
        family: Family::Courier,
        widths: None,
    },
    StandardFont {
        name: "Courier-Oblique",
        family: Family::Courier,
        widths: None,
    },
    StandardFont {
        name: "Courier-BoldOblique",
        family: Family::Courier,
        widths: None,
    },
    StandardFont {
        name: "Symbol",
        family: Family::Symbol,
        widths: None,
    },
    StandardFont {
        name: "ZapfDingbats",
        family: Family::ZapfDingbats,
        widths: None,
    },
];

/// Style variations which can be requested for a font through the `fontstyle` option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontStyle {
    #[default]
    Normal,
    Bold,
    Italic,
    BoldItalic,
}

impl StandardFont {
    /// Looks up a standard font by its PostScript name, accepting `Times` for
    /// `Times-Roman`. The lookup is case-insensitive.
    pub fn find(name: &str) -> Option<StandardFont> {
        let name = if name.eq_ignore_ascii_case("Times") {
            "Times-Roman"
        } else {
            name
        };
        STANDARD_FONTS
            .iter()
            .find(|font| font.name.eq_ignore_ascii_case(name))
            .copied()
    }

    /// The variant of the same family with the given style, if the family has one.
    pub fn with_style(self, style: FontStyle) -> StandardFont {
        let family_name = match self.family {
            Family::Helvetica => "Helvetica",
            Family::Times => "Times",
            Family::Courier => "Courier",
            Family::Symbol | Family::ZapfDingbats => return self,
        };
        let suffix = match (self.family, style) {
            (_, FontStyle::Normal) if self.family == Family::Times => "-Roman",
            (_, FontStyle::Normal) => "",
            (_, FontStyle::Bold) => "-Bold",
            (Family::Times, FontStyle::Italic) => "-Italic",
            (Family::Times, FontStyle::BoldItalic) => "-BoldItalic",
            (_, FontStyle::Italic) => "-Oblique",
            (_, FontStyle::BoldItalic) => "-BoldOblique",
        };
        StandardFont::find(&format!("{}{}", family_name, suffix)).unwrap_or(self)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether the font uses its own built-in encoding instead of WinAnsi.
    pub fn is_symbolic(&self) -> bool {
        matches!(self.family, Family::Symbol | Family::ZapfDingbats)
    }

    /// The height of the capital letters, in thousandths of the font size.
    pub fn cap_height(&self) -> f32 {
        match self.family {
            Family::Helvetica => 718.0,
            Family::Times => 662.0,
            Family::Courier => 562.0,
            Family::Symbol | Family::ZapfDingbats => 700.0,
        }
    }

    pub fn ascender(&self) -> f32 {
        match self.family {
            Family::Helvetica => 718.0,
            Family::Times => 683.0,
            Family::Courier => 629.0,
            Family::Symbol | Family::ZapfDingbats => 1010.0,
        }
    }

    pub fn descender(&self) -> f32 {
        match self.family {
            Family::Helvetica => -207.0,
            Family::Times => -217.0,
            Family::Courier => -157.0,
            Family::Symbol | Family::ZapfDingbats => -293.0,
        }
    }

    /// The advance width of the character, in thousandths of the font size.
    pub fn char_width(&self, character: char) -> f32 {
        match self.family {
            Family::Courier => 600.0,
            Family::Symbol => {
                if character == ' ' {
                    250.0
                } else {
                    500.0
                }
            }
            Family::ZapfDingbats => {
                if character == ' ' {
                    278.0
                } else {
                    500.0
                }
            }
            Family::Helvetica | Family::Times => self.text_char_width(character),
        }
    }

    fn text_char_width(&self, character: char) -> f32 {
        let Some(widths) = self.widths else {
            return 500.0;
        };
        let ascii_width = |character: char| {
            let code = character as u32;
            (32..=126)
                .contains(&code)
                .then(|| f32::from(widths[(code - 32) as usize]))
        };
        if let Some(width) = ascii_width(character) {
            return width;
        }
        if let Some((_, sans_width, serif_width)) = EXTRA_WIDTHS
            .iter()
            .find(|(extra, _, _)| *extra == character)
        {
            return f32::from(match self.family {
                Family::Times => *serif_width,
                _ => *sans_width,
            });
        }
        // Accented letters are as wide as their base letter
        character
            .nfd()
            .next()
            .and_then(ascii_width)
            .unwrap_or_else(|| f32::from(widths[(u32::from('o') - 32) as usize]))
    }
}

/// Encodes a character in WinAnsiEncoding.
pub fn winansi_code(character: char) -> Option<u8> {
    let code = character as u32;
    match code {
        32..=126 | 160..=255 => Some(code as u8),
        _ => WINANSI_EXTRAS
            .iter()
            .find(|(extra, _)| *extra == character)
            .map(|(_, code)| *code),
    }
}
