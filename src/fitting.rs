use crate::error::SessionError;
use crate::graphics::Matrix;
use crate::options::OptionList;

/// The option keys understood by every fitting operation.
pub const FIT_KEYS: &[&str] = &[
    "scale",
    "position",
    "boxsize",
    "fitmethod",
    "rotate",
    "orientate",
];

/// How an object is adapted to the fitting box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FitMethod {
    /// The object keeps its size and may exceed the box.
    #[default]
    NoFit,
    /// Like `NoFit`, but whatever exceeds the box is clipped.
    Clip,
    /// Scaled down proportionally, only when it does not fit.
    Auto,
    /// Scaled proportionally to fit entirely into the box.
    Meet,
    /// Scaled proportionally to cover the box completely, the rest is clipped.
    Slice,
    /// Scaled independently in both directions to fill the box.
    Entire,
}

impl FitMethod {
    fn parse(keyword: &str) -> FitMethod {
        match keyword {
            "clip" => FitMethod::Clip,
            "auto" => FitMethod::Auto,
            "meet" => FitMethod::Meet,
            "slice" => FitMethod::Slice,
            "entire" => FitMethod::Entire,
            _ => FitMethod::NoFit,
        }
    }
}

/// The direction the top of the object points to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    North,
    West,
    South,
    East,
}

/// The parsed fitting options of a placement.
#[derive(Debug, Clone, PartialEq)]
pub struct FitOptions {
    pub scale: (f32, f32),
    /// Horizontal and vertical position in percent.
    pub position: (f32, f32),
    pub box_size: Option<(f32, f32)>,
    pub method: FitMethod,
    /// Rotation of the fitting frame around the reference point, in degrees.
    pub rotate: f32,
    pub orientation: Orientation,
}

impl Default for FitOptions {
    fn default() -> Self {
        FitOptions {
            scale: (1.0, 1.0),
            position: (0.0, 0.0),
            box_size: None,
            method: FitMethod::NoFit,
            rotate: 0.0,
            orientation: Orientation::North,
        }
    }
}

impl FitOptions {
    pub fn from_options(options: &OptionList) -> Result<FitOptions, SessionError> {
        let mut fit_options = FitOptions::default();

        if let Some(scale) = options.floats("scale", 1..=2)? {
            let (sx, sy) = pair(&scale);
            if sx == 0.0 || sy == 0.0 {
                return Err(SessionError::option("Option \"scale\" must not be zero"));
            }
            fit_options.scale = (sx, sy);
        }
        if let Some(position) = options.string("position")? {
            fit_options.position = parse_position(&position)?;
        }
        if let Some(box_size) = options.floats("boxsize", 2..=2)? {
            if box_size.iter().any(|length| *length < 0.0) {
                return Err(SessionError::option(
                    "Option \"boxsize\" must not be negative",
                ));
            }
            fit_options.box_size = Some((box_size[0], box_size[1]));
        }
        if let Some(method) = options.keyword(
            "fitmethod",
            &["nofit", "clip", "auto", "meet", "slice", "entire"],
        )? {
            fit_options.method = FitMethod::parse(&method);
        }
        if let Some(rotate) = options.float("rotate")? {
            fit_options.rotate = rotate;
        }
        if let Some(orientation) =
            options.keyword("orientate", &["north", "west", "south", "east"])?
        {
            fit_options.orientation = match orientation.as_str() {
                "west" => Orientation::West,
                "south" => Orientation::South,
                "east" => Orientation::East,
                _ => Orientation::North,
            };
        }

        Ok(fit_options)
    }
}

/// The result of fitting an object: `frame` moves the fitting box to the reference point
/// and `object` maps object space into the box.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub frame: Matrix,
    pub object: Matrix,
    /// The box to clip to, in frame coordinates.
    pub clip: Option<(f32, f32)>,
    /// The size the object occupies on the page, before the frame rotation.
    pub size: (f32, f32),
}

impl Placement {
    /// The transformation from object space to the user space of the reference point.
    pub fn combined(&self) -> Matrix {
        self.object.then(&self.frame)
    }
}

/// Computes where and how large an object of the given size lands when placed at
/// `(x, y)` with the given options.
pub fn fit(width: f32, height: f32, x: f32, y: f32, options: &FitOptions) -> Placement {
    // Turn the object so that its top points into the requested direction, keeping its
    // lower left corner at the origin
    let (orientation, oriented_width, oriented_height) = match options.orientation {
        Orientation::North => (Matrix::identity(), width, height),
        Orientation::West => (
            Matrix::rotation(90.0).then(&Matrix::translation(height, 0.0)),
            height,
            width,
        ),
        Orientation::South => (
            Matrix::rotation(180.0).then(&Matrix::translation(width, height)),
            width,
            height,
        ),
        Orientation::East => (
            Matrix::rotation(270.0).then(&Matrix::translation(0.0, width)),
            height,
            width,
        ),
    };

    let usable_box = options
        .box_size
        .filter(|(box_width, box_height)| *box_width > 0.0 && *box_height > 0.0);
    let (scale_x, scale_y) = match usable_box {
        Some((box_width, box_height)) if oriented_width > 0.0 && oriented_height > 0.0 => {
            let ratio_x = box_width / oriented_width;
            let ratio_y = box_height / oriented_height;
            match options.method {
                FitMethod::NoFit | FitMethod::Clip => options.scale,
                FitMethod::Meet => (ratio_x.min(ratio_y), ratio_x.min(ratio_y)),
                FitMethod::Slice => (ratio_x.max(ratio_y), ratio_x.max(ratio_y)),
                FitMethod::Entire => (ratio_x, ratio_y),
                FitMethod::Auto => {
                    if oriented_width > box_width || oriented_height > box_height {
                        (ratio_x.min(ratio_y), ratio_x.min(ratio_y))
                    } else {
                        options.scale
                    }
                }
            }
        }
        _ => options.scale,
    };

    let scaled_width = oriented_width * scale_x;
    let scaled_height = oriented_height * scale_y;
    let (position_x, position_y) = options.position;
    let (offset_x, offset_y) = match usable_box {
        Some((box_width, box_height)) => (
            (box_width - scaled_width) * position_x / 100.0,
            (box_height - scaled_height) * position_y / 100.0,
        ),
        None => (
            -scaled_width * position_x / 100.0,
            -scaled_height * position_y / 100.0,
        ),
    };

    let object = orientation
        .then(&Matrix::scaling(scale_x, scale_y))
        .then(&Matrix::translation(offset_x, offset_y));
    let frame = Matrix::rotation(options.rotate).then(&Matrix::translation(x, y));
    let clip = match options.method {
        FitMethod::Clip | FitMethod::Slice => usable_box,
        _ => None,
    };

    Placement {
        frame,
        object,
        clip,
        size: (scaled_width, scaled_height),
    }
}

fn pair(values: &[f32]) -> (f32, f32) {
    match values {
        [single] => (*single, *single),
        [first, second, ..] => (*first, *second),
        [] => (1.0, 1.0),
    }
}

/// Parses a position given as one or two percentages or keywords like `{left top}` or
/// `center`.
fn parse_position(text: &str) -> Result<(f32, f32), SessionError> {
    let values = text
        .split_whitespace()
        .map(|token| match token.to_lowercase().as_str() {
            "left" | "bottom" => Ok(0.0),
            "center" => Ok(50.0),
            "right" | "top" => Ok(100.0),
            _ => token
                .parse::<f32>()
                .ok()
                .filter(|value| value.is_finite())
                .ok_or_else(|| {
                    SessionError::option(format!(
                        "Option \"position\" expects percentages or keywords but got {:?}",
                        token
                    ))
                }),
        })
        .collect::<Result<Vec<_>, _>>()?;
    match values.len() {
        1 | 2 => Ok(pair(&values)),
        count => Err(SessionError::option(format!(
            "Option \"position\" expects one or two values but got {}",
            count
        ))),
    }
}
