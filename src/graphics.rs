use lopdf::content::Operation;
use lopdf::Object;
use nalgebra_glm as glm;

use crate::error::SessionError;

/// An affine transformation in the PDF convention, where points are row vectors and
/// `[a b c d e f]` is stored as the 3x3 matrix `[[a b 0] [c d 0] [e f 1]]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix(glm::Mat3);

impl Matrix {
    pub fn identity() -> Matrix {
        Matrix(glm::Mat3::identity())
    }

    pub fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Matrix {
        Matrix(glm::mat3(a, b, 0.0, c, d, 0.0, e, f, 1.0))
    }

    pub fn translation(tx: f32, ty: f32) -> Matrix {
        Matrix::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    pub fn scaling(sx: f32, sy: f32) -> Matrix {
        Matrix::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// A counterclockwise rotation by the given angle in degrees.
    pub fn rotation(degrees: f32) -> Matrix {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Matrix::new(cos, sin, -sin, cos, 0.0, 0.0)
    }

    pub fn skewing(alpha_degrees: f32, beta_degrees: f32) -> Matrix {
        Matrix::new(
            1.0,
            alpha_degrees.to_radians().tan(),
            beta_degrees.to_radians().tan(),
            1.0,
            0.0,
            0.0,
        )
    }

    /// The six components `[a b c d e f]`.
    pub fn components(&self) -> [f32; 6] {
        let m = &self.0;
        [m[(0, 0)], m[(0, 1)], m[(1, 0)], m[(1, 1)], m[(2, 0)], m[(2, 1)]]
    }

    /// The transformation which applies `self` first and `other` afterwards.
    pub fn then(&self, other: &Matrix) -> Matrix {
        Matrix(self.0 * other.0)
    }

    pub fn inverse(&self) -> Option<Matrix> {
        self.0.try_inverse().map(Matrix)
    }

    pub fn transform_point(&self, x: f32, y: f32) -> (f32, f32) {
        let [a, b, c, d, e, f] = self.components();
        (a * x + c * y + e, b * x + d * y + f)
    }

    /// The `cm` operator concatenating this matrix to the current transformation.
    pub fn to_operation(&self) -> Operation {
        Operation::new(
            "cm",
            self.components().into_iter().map(Object::Real).collect(),
        )
    }

    pub fn is_identity(&self) -> bool {
        self.0 == glm::Mat3::identity()
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix::identity()
    }
}

/// Where a color setting applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorUsage {
    Fill,
    Stroke,
    Both,
}

impl ColorUsage {
    pub fn parse(fstype: &str) -> Result<ColorUsage, SessionError> {
        match fstype.to_lowercase().as_str() {
            "fill" => Ok(ColorUsage::Fill),
            "stroke" => Ok(ColorUsage::Stroke),
            "both" | "fillstroke" => Ok(ColorUsage::Both),
            _ => Err(SessionError::argument(format!(
                "Unknown color usage {:?}, expected fill, stroke or both",
                fstype
            ))),
        }
    }

    pub fn fill(self) -> bool {
        matches!(self, ColorUsage::Fill | ColorUsage::Both)
    }

    pub fn stroke(self) -> bool {
        matches!(self, ColorUsage::Stroke | ColorUsage::Both)
    }
}

/// A color together with the color space it is expressed in.
#[derive(Debug, Clone, PartialEq)]
pub enum Color {
    Gray(f32),
    Rgb(f32, f32, f32),
    Cmyk(f32, f32, f32, f32),
    /// Components in an ICC-based color space registered under the given resource name.
    IccBased { name: String, components: Vec<f32> },
}

impl Default for Color {
    fn default() -> Self {
        Color::Gray(0.0)
    }
}

impl Color {
    /// Builds a device color from the `setcolor` arguments.
    pub fn from_components(colorspace: &str, components: [f32; 4]) -> Result<Color, SessionError> {
        let [c1, c2, c3, c4] = components;
        let color = match colorspace.to_lowercase().as_str() {
            "gray" => Color::Gray(c1),
            "rgb" => Color::Rgb(c1, c2, c3),
            "cmyk" => Color::Cmyk(c1, c2, c3, c4),
            _ => {
                return Err(SessionError::argument(format!(
                    "Unsupported color space {:?}, expected gray, rgb or cmyk",
                    colorspace
                )))
            }
        };
        check_components(&color.components())?;
        Ok(color)
    }

    pub fn components(&self) -> Vec<f32> {
        match self {
            Color::Gray(gray) => vec![*gray],
            Color::Rgb(red, green, blue) => vec![*red, *green, *blue],
            Color::Cmyk(cyan, magenta, yellow, black) => vec![*cyan, *magenta, *yellow, *black],
            Color::IccBased { components, .. } => components.clone(),
        }
    }

    /// The name of the device color space, `None` for ICC-based colors.
    pub fn device_space(&self) -> Option<&'static str> {
        match self {
            Color::Gray(_) => Some("DeviceGray"),
            Color::Rgb(..) => Some("DeviceRGB"),
            Color::Cmyk(..) => Some("DeviceCMYK"),
            Color::IccBased { .. } => None,
        }
    }

    /// The operations selecting this color for filling or stroking.
    pub fn to_operations(&self, stroke: bool) -> Vec<Operation> {
        let operands: Vec<Object> = self.components().into_iter().map(Object::Real).collect();
        let operator = match (self, stroke) {
            (Color::Gray(_), false) => "g",
            (Color::Gray(_), true) => "G",
            (Color::Rgb(..), false) => "rg",
            (Color::Rgb(..), true) => "RG",
            (Color::Cmyk(..), false) => "k",
            (Color::Cmyk(..), true) => "K",
            (Color::IccBased { name, .. }, _) => {
                let (space_operator, color_operator) = if stroke { ("CS", "SC") } else { ("cs", "sc") };
                return vec![
                    Operation::new(space_operator, vec![Object::Name(name.clone().into_bytes())]),
                    Operation::new(color_operator, operands),
                ];
            }
        };
        vec![Operation::new(operator, operands)]
    }
}

/// Rejects NaN and infinite arguments, which have no representation in a content stream.
pub(crate) fn check_finite(values: &[f32]) -> Result<(), SessionError> {
    match values.iter().find(|value| !value.is_finite()) {
        Some(value) => Err(SessionError::argument(format!(
            "Expected a finite number but got {}",
            value
        ))),
        None => Ok(()),
    }
}

pub(crate) fn check_components(components: &[f32]) -> Result<(), SessionError> {
    match components
        .iter()
        .find(|component| !(0.0..=1.0).contains(*component))
    {
        Some(component) => Err(SessionError::argument(format!(
            "Color component {} is outside of the range [0, 1]",
            component
        ))),
        None => Ok(()),
    }
}

/// The dash pattern of stroked lines, an empty array means solid lines.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DashPattern {
    pub array: Vec<f32>,
    pub phase: f32,
}

impl DashPattern {
    pub fn new(array: Vec<f32>, phase: f32) -> Result<DashPattern, SessionError> {
        check_finite(&array)?;
        check_finite(&[phase])?;
        if array.iter().any(|length| *length < 0.0) {
            return Err(SessionError::argument("Dash lengths must not be negative"));
        }
        // An all-zero array would draw nothing, it selects a solid line instead
        let array = if array.iter().all(|length| *length == 0.0) {
            Vec::new()
        } else {
            array
        };
        Ok(DashPattern { array, phase })
    }

    pub fn to_object(&self) -> Object {
        Object::Array(vec![
            Object::Array(self.array.iter().copied().map(Object::Real).collect()),
            Object::Real(self.phase),
        ])
    }

    pub fn to_operation(&self) -> Operation {
        Operation::new(
            "d",
            vec![
                Object::Array(self.array.iter().copied().map(Object::Real).collect()),
                Object::Real(self.phase),
            ],
        )
    }
}

/// The text parameters which are part of the graphics state.
#[derive(Debug, Clone, PartialEq)]
pub struct TextState {
    /// The index of the current font in the document font list, with its size.
    pub font: Option<(usize, f32)>,
    pub leading: f32,
    pub character_spacing: f32,
    pub word_spacing: f32,
    /// Horizontal scaling in percent.
    pub horizontal_scaling: f32,
    pub rise: f32,
    pub rendering_mode: i64,
}

impl Default for TextState {
    fn default() -> Self {
        TextState {
            font: None,
            leading: 0.0,
            character_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scaling: 100.0,
            rise: 0.0,
            rendering_mode: 0,
        }
    }
}

/// The complete graphics state which is saved and restored as a unit.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphicsState {
    pub transformation: Matrix,
    pub fill_color: Color,
    pub stroke_color: Color,
    pub line_width: f32,
    pub line_cap: i64,
    pub line_join: i64,
    pub miter_limit: f32,
    pub flatness: f32,
    pub dash_pattern: DashPattern,
    pub text: TextState,
}

impl Default for GraphicsState {
    fn default() -> Self {
        GraphicsState {
            transformation: Matrix::identity(),
            fill_color: Color::default(),
            stroke_color: Color::default(),
            line_width: 1.0,
            line_cap: 0,
            line_join: 0,
            miter_limit: 10.0,
            flatness: 1.0,
            dash_pattern: DashPattern::default(),
            text: TextState::default(),
        }
    }
}

/// The current graphics state together with the saved ones.
#[derive(Debug, Clone, Default)]
pub struct GraphicsStack {
    pub current: GraphicsState,
    saved: Vec<GraphicsState>,
}

impl GraphicsStack {
    pub fn save(&mut self) {
        self.saved.push(self.current.clone());
    }

    pub fn restore(&mut self) -> Result<(), SessionError> {
        self.current = self
            .saved
            .pop()
            .ok_or_else(|| SessionError::state("Restore without a matching save"))?;
        Ok(())
    }

    pub fn depth(&self) -> usize {
        self.saved.len()
    }

    /// Applies `operator` before the current transformation.
    pub fn concat(&mut self, operator: &Matrix) {
        self.current.transformation = operator.then(&self.current.transformation);
    }
}
