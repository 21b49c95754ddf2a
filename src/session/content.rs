use lopdf::content::Operation;
use lopdf::Object;

use super::{resource_name, Resource, Session};
use crate::error::SessionError;
use crate::graphics::{check_components, check_finite, Color, ColorUsage, DashPattern, GraphicsState, Matrix};
use crate::handle::{Handle, ResourceKind};
use crate::options::OptionList;
use crate::path::PathPainting;

/// Graphics state, transformations, colors and paths.
impl Session {
    pub fn save(&mut self) -> Result<(), SessionError> {
        self.track("save", |session| {
            session.emit([Operation::new("q", vec![])])?;
            session.graphics.save();
            Ok(())
        })
    }

    pub fn restore(&mut self) -> Result<(), SessionError> {
        self.track("restore", |session| {
            session.canvas()?;
            session.graphics.restore()?;
            session.emit([Operation::new("Q", vec![])])
        })
    }

    /// Resets the graphics state to its defaults, keeping the saved states.
    pub fn initgraphics(&mut self) -> Result<(), SessionError> {
        self.track("initgraphics", |session| {
            session.canvas()?;
            let current = &session.graphics.current;
            let mut operations = Vec::new();
            if !current.transformation.is_identity() {
                let inverse = current.transformation.inverse().ok_or_else(|| {
                    SessionError::argument("The current transformation cannot be inverted")
                })?;
                operations.push(inverse.to_operation());
            }
            let defaults = GraphicsState::default();
            operations.extend([
                Operation::new("w", vec![Object::Real(defaults.line_width)]),
                Operation::new("J", vec![Object::Integer(defaults.line_cap)]),
                Operation::new("j", vec![Object::Integer(defaults.line_join)]),
                Operation::new("M", vec![Object::Real(defaults.miter_limit)]),
                Operation::new("i", vec![Object::Real(defaults.flatness)]),
                defaults.dash_pattern.to_operation(),
            ]);
            operations.extend(defaults.fill_color.to_operations(false));
            operations.extend(defaults.stroke_color.to_operations(true));
            session.emit(operations)?;
            session.graphics.current = defaults;
            Ok(())
        })
    }

    pub fn translate(&mut self, tx: f32, ty: f32) -> Result<(), SessionError> {
        self.track("translate", |session| {
            check_finite(&[tx, ty])?;
            session.apply_transformation(Matrix::translation(tx, ty))
        })
    }

    /// Rotates the coordinate system counterclockwise by the given angle in degrees.
    pub fn rotate(&mut self, degrees: f32) -> Result<(), SessionError> {
        self.track("rotate", |session| {
            check_finite(&[degrees])?;
            session.apply_transformation(Matrix::rotation(degrees))
        })
    }

    pub fn scale(&mut self, sx: f32, sy: f32) -> Result<(), SessionError> {
        self.track("scale", |session| {
            check_finite(&[sx, sy])?;
            if sx == 0.0 || sy == 0.0 {
                return Err(SessionError::argument("Scaling factors must not be zero"));
            }
            session.apply_transformation(Matrix::scaling(sx, sy))
        })
    }

    /// Skews the x axis by `alpha` and the y axis by `beta` degrees.
    pub fn skew(&mut self, alpha: f32, beta: f32) -> Result<(), SessionError> {
        self.track("skew", |session| {
            check_finite(&[alpha, beta])?;
            for angle in [alpha, beta] {
                if !(-90.0 < angle && angle < 90.0) {
                    return Err(SessionError::argument(format!(
                        "Skewing angle {} is outside of the range (-90, 90)",
                        angle
                    )));
                }
            }
            session.apply_transformation(Matrix::skewing(alpha, beta))
        })
    }

    pub fn concat(&mut self, a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Result<(), SessionError> {
        self.track("concat", |session| {
            check_finite(&[a, b, c, d, e, f])?;
            let matrix = Matrix::new(a, b, c, d, e, f);
            check_invertible(&matrix)?;
            session.apply_transformation(matrix)
        })
    }

    /// Replaces the current transformation with the given one.
    pub fn setmatrix(&mut self, a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Result<(), SessionError> {
        self.track("setmatrix", |session| {
            check_finite(&[a, b, c, d, e, f])?;
            let matrix = Matrix::new(a, b, c, d, e, f);
            check_invertible(&matrix)?;
            let inverse = session
                .graphics
                .current
                .transformation
                .inverse()
                .ok_or_else(|| {
                    SessionError::argument("The current transformation cannot be inverted")
                })?;
            session.emit([inverse.to_operation(), matrix.to_operation()])?;
            session.graphics.current.transformation = matrix;
            Ok(())
        })
    }

    fn apply_transformation(&mut self, matrix: Matrix) -> Result<(), SessionError> {
        self.emit([matrix.to_operation()])?;
        self.graphics.concat(&matrix);
        Ok(())
    }

    pub fn setlinewidth(&mut self, width: f32) -> Result<(), SessionError> {
        self.track("setlinewidth", |session| {
            check_finite(&[width])?;
            if width < 0.0 {
                return Err(SessionError::argument(format!(
                    "The line width must not be negative, got {}",
                    width
                )));
            }
            session.emit([Operation::new("w", vec![Object::Real(width)])])?;
            session.graphics.current.line_width = width;
            Ok(())
        })
    }

    /// Sets the line cap: 0 butt, 1 round, 2 projecting square.
    pub fn setlinecap(&mut self, cap: i64) -> Result<(), SessionError> {
        self.track("setlinecap", |session| {
            check_style_index("line cap", cap)?;
            session.emit([Operation::new("J", vec![Object::Integer(cap)])])?;
            session.graphics.current.line_cap = cap;
            Ok(())
        })
    }

    /// Sets the line join: 0 miter, 1 round, 2 bevel.
    pub fn setlinejoin(&mut self, join: i64) -> Result<(), SessionError> {
        self.track("setlinejoin", |session| {
            check_style_index("line join", join)?;
            session.emit([Operation::new("j", vec![Object::Integer(join)])])?;
            session.graphics.current.line_join = join;
            Ok(())
        })
    }

    pub fn setmiterlimit(&mut self, limit: f32) -> Result<(), SessionError> {
        self.track("setmiterlimit", |session| {
            check_finite(&[limit])?;
            if limit < 1.0 {
                return Err(SessionError::argument(format!(
                    "The miter limit must be at least 1, got {}",
                    limit
                )));
            }
            session.emit([Operation::new("M", vec![Object::Real(limit)])])?;
            session.graphics.current.miter_limit = limit;
            Ok(())
        })
    }

    pub fn setflat(&mut self, flatness: f32) -> Result<(), SessionError> {
        self.track("setflat", |session| {
            check_finite(&[flatness])?;
            if !(0.0..=100.0).contains(&flatness) {
                return Err(SessionError::argument(format!(
                    "The flatness must be between 0 and 100, got {}",
                    flatness
                )));
            }
            session.emit([Operation::new("i", vec![Object::Real(flatness)])])?;
            session.graphics.current.flatness = flatness;
            Ok(())
        })
    }

    /// Alternates dashes of length `black` with gaps of length `white`, both zero for
    /// solid lines.
    pub fn setdash(&mut self, black: f32, white: f32) -> Result<(), SessionError> {
        self.track("setdash", |session| {
            session.apply_dash(DashPattern::new(vec![black, white], 0.0)?)
        })
    }

    pub fn setpolydash(&mut self, lengths: &[f32]) -> Result<(), SessionError> {
        self.track("setpolydash", |session| {
            session.apply_dash(DashPattern::new(lengths.to_vec(), 0.0)?)
        })
    }

    /// Sets the dash pattern from the `dasharray` and `dashphase` options.
    pub fn setdashpattern(&mut self, optlist: &str) -> Result<(), SessionError> {
        self.track("setdashpattern", |session| {
            let options = OptionList::parse_with_keys(optlist, &["dasharray", "dashphase"])?;
            let array = options.floats("dasharray", 0..=8)?.unwrap_or_default();
            let phase = options.float("dashphase")?.unwrap_or(0.0);
            session.apply_dash(DashPattern::new(array, phase)?)
        })
    }

    fn apply_dash(&mut self, pattern: DashPattern) -> Result<(), SessionError> {
        self.emit([pattern.to_operation()])?;
        self.graphics.current.dash_pattern = pattern;
        Ok(())
    }

    /// Sets the fill color, the stroke color or both in the gray, rgb or cmyk color space.
    pub fn setcolor(
        &mut self,
        fstype: &str,
        colorspace: &str,
        c1: f32,
        c2: f32,
        c3: f32,
        c4: f32,
    ) -> Result<(), SessionError> {
        self.track("setcolor", |session| {
            let usage = ColorUsage::parse(fstype)?;
            let color = Color::from_components(colorspace, [c1, c2, c3, c4])?;
            session.apply_color(usage, color)
        })
    }

    pub fn setgray(&mut self, gray: f32) -> Result<(), SessionError> {
        self.track("setgray", |session| {
            session.apply_device_color(ColorUsage::Both, Color::Gray(gray))
        })
    }

    pub fn setgray_fill(&mut self, gray: f32) -> Result<(), SessionError> {
        self.track("setgray_fill", |session| {
            session.apply_device_color(ColorUsage::Fill, Color::Gray(gray))
        })
    }

    pub fn setgray_stroke(&mut self, gray: f32) -> Result<(), SessionError> {
        self.track("setgray_stroke", |session| {
            session.apply_device_color(ColorUsage::Stroke, Color::Gray(gray))
        })
    }

    pub fn setrgbcolor(&mut self, red: f32, green: f32, blue: f32) -> Result<(), SessionError> {
        self.track("setrgbcolor", |session| {
            session.apply_device_color(ColorUsage::Both, Color::Rgb(red, green, blue))
        })
    }

    pub fn setrgbcolor_fill(&mut self, red: f32, green: f32, blue: f32) -> Result<(), SessionError> {
        self.track("setrgbcolor_fill", |session| {
            session.apply_device_color(ColorUsage::Fill, Color::Rgb(red, green, blue))
        })
    }

    pub fn setrgbcolor_stroke(&mut self, red: f32, green: f32, blue: f32) -> Result<(), SessionError> {
        self.track("setrgbcolor_stroke", |session| {
            session.apply_device_color(ColorUsage::Stroke, Color::Rgb(red, green, blue))
        })
    }

    /// Sets a color in the ICC-based color space of a loaded profile.
    pub fn setcolor_icc(
        &mut self,
        fstype: &str,
        profile: Handle,
        components: &[f32],
    ) -> Result<(), SessionError> {
        self.track("setcolor_icc", |session| {
            let usage = ColorUsage::parse(fstype)?;
            let Resource::IccProfile {
                color_space_id,
                components: expected,
            } = session.resources.get(profile, &[ResourceKind::IccProfile])?
            else {
                return Err(SessionError::invalid_handle("Expected an ICC profile"));
            };
            let (color_space_id, expected) = (*color_space_id, *expected);
            if components.len() != expected {
                return Err(SessionError::argument(format!(
                    "The profile expects {} color components but got {}",
                    expected,
                    components.len()
                )));
            }
            check_components(components)?;

            let name = resource_name("CS", profile);
            session.canvas()?.resources.add_color_space(&name, color_space_id);
            session.apply_color(
                usage,
                Color::IccBased {
                    name,
                    components: components.to_vec(),
                },
            )
        })
    }

    fn apply_device_color(&mut self, usage: ColorUsage, color: Color) -> Result<(), SessionError> {
        check_components(&color.components())?;
        self.apply_color(usage, color)
    }

    fn apply_color(&mut self, usage: ColorUsage, color: Color) -> Result<(), SessionError> {
        let mut operations = Vec::new();
        if usage.fill() {
            operations.extend(color.to_operations(false));
        }
        if usage.stroke() {
            operations.extend(color.to_operations(true));
        }
        self.emit(operations)?;
        if usage.fill() {
            self.graphics.current.fill_color = color.clone();
        }
        if usage.stroke() {
            self.graphics.current.stroke_color = color;
        }
        Ok(())
    }

    pub fn moveto(&mut self, x: f32, y: f32) -> Result<(), SessionError> {
        self.track("moveto", |session| {
            check_finite(&[x, y])?;
            session.path_canvas()?;
            session.path.move_to(x, y);
            Ok(())
        })
    }

    pub fn lineto(&mut self, x: f32, y: f32) -> Result<(), SessionError> {
        self.track("lineto", |session| {
            check_finite(&[x, y])?;
            session.path_canvas()?;
            session.path.line_to(x, y)
        })
    }

    pub fn curveto(
        &mut self,
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        x3: f32,
        y3: f32,
    ) -> Result<(), SessionError> {
        self.track("curveto", |session| {
            check_finite(&[x1, y1, x2, y2, x3, y3])?;
            session.path_canvas()?;
            session.path.curve_to(x1, y1, x2, y2, x3, y3)
        })
    }

    pub fn rect(&mut self, x: f32, y: f32, width: f32, height: f32) -> Result<(), SessionError> {
        self.track("rect", |session| {
            check_finite(&[x, y, width, height])?;
            session.path_canvas()?;
            session.path.rectangle(x, y, width, height);
            Ok(())
        })
    }

    pub fn circle(&mut self, x: f32, y: f32, radius: f32) -> Result<(), SessionError> {
        self.track("circle", |session| {
            check_finite(&[x, y, radius])?;
            session.path_canvas()?;
            session.path.circle(x, y, radius)
        })
    }

    /// Adds a counterclockwise arc from `alpha` to `beta` degrees.
    pub fn arc(&mut self, x: f32, y: f32, radius: f32, alpha: f32, beta: f32) -> Result<(), SessionError> {
        self.track("arc", |session| {
            session.path_canvas()?;
            session.path.arc(x, y, radius, alpha, beta)
        })
    }

    /// Adds a clockwise arc from `alpha` to `beta` degrees.
    pub fn arcn(&mut self, x: f32, y: f32, radius: f32, alpha: f32, beta: f32) -> Result<(), SessionError> {
        self.track("arcn", |session| {
            session.path_canvas()?;
            session.path.arc_clockwise(x, y, radius, alpha, beta)
        })
    }

    pub fn closepath(&mut self) -> Result<(), SessionError> {
        self.track("closepath", |session| {
            session.path_canvas()?;
            session.path.close_path()
        })
    }

    pub fn fill(&mut self) -> Result<(), SessionError> {
        self.track("fill", |session| session.paint(PathPainting::Fill))
    }

    pub fn stroke(&mut self) -> Result<(), SessionError> {
        self.track("stroke", |session| session.paint(PathPainting::Stroke))
    }

    pub fn fill_stroke(&mut self) -> Result<(), SessionError> {
        self.track("fill_stroke", |session| session.paint(PathPainting::FillStroke))
    }

    pub fn closepath_stroke(&mut self) -> Result<(), SessionError> {
        self.track("closepath_stroke", |session| {
            session.paint(PathPainting::ClosePathStroke)
        })
    }

    pub fn closepath_fill_stroke(&mut self) -> Result<(), SessionError> {
        self.track("closepath_fill_stroke", |session| {
            session.paint(PathPainting::ClosePathFillStroke)
        })
    }

    /// Intersects the clipping path with the current path.
    pub fn clip(&mut self) -> Result<(), SessionError> {
        self.track("clip", |session| session.paint(PathPainting::Clip))
    }

    /// Ends the current path without painting it.
    pub fn endpath(&mut self) -> Result<(), SessionError> {
        self.track("endpath", |session| session.paint(PathPainting::EndPath))
    }

    fn paint(&mut self, painting: PathPainting) -> Result<(), SessionError> {
        let fill_rule = self.fill_rule;
        self.path_canvas()?;
        if self.path.is_empty() {
            return Err(SessionError::state("There is no path to paint"));
        }
        let mut operations = self.path.take();
        operations.extend(painting.to_operations(fill_rule));
        self.path_canvas()?.operations.extend(operations);
        Ok(())
    }
}

fn check_invertible(matrix: &Matrix) -> Result<(), SessionError> {
    match matrix.inverse() {
        Some(_) => Ok(()),
        None => Err(SessionError::argument("The matrix is degenerate")),
    }
}

fn check_style_index(name: &str, value: i64) -> Result<(), SessionError> {
    if (0..=2).contains(&value) {
        Ok(())
    } else {
        Err(SessionError::argument(format!(
            "The {} must be 0, 1 or 2, got {}",
            name, value
        )))
    }
}
