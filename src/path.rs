use lopdf::content::Operation;
use lopdf::Object;

use crate::error::SessionError;
use crate::graphics::check_finite;

/// The magic constant approximating a quarter circle with one cubic Bézier curve.
const KAPPA: f32 = 0.552_284_8;

/// The rule deciding which areas of a path are inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillRule {
    #[default]
    Winding,
    EvenOdd,
}

impl FillRule {
    pub fn parse(value: &str) -> Result<FillRule, SessionError> {
        match value.to_lowercase().as_str() {
            "winding" => Ok(FillRule::Winding),
            "evenodd" => Ok(FillRule::EvenOdd),
            _ => Err(SessionError::argument(format!(
                "Unknown fill rule {:?}, expected winding or evenodd",
                value
            ))),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FillRule::Winding => "winding",
            FillRule::EvenOdd => "evenodd",
        }
    }
}

/// The ways a constructed path can be consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathPainting {
    Fill,
    Stroke,
    FillStroke,
    ClosePathStroke,
    ClosePathFillStroke,
    Clip,
    EndPath,
}

impl PathPainting {
    /// The operators ending the path.
    pub fn to_operations(self, fill_rule: FillRule) -> Vec<Operation> {
        let even_odd = fill_rule == FillRule::EvenOdd;
        let operators: &[&str] = match self {
            PathPainting::Fill if even_odd => &["f*"],
            PathPainting::Fill => &["f"],
            PathPainting::Stroke => &["S"],
            PathPainting::FillStroke if even_odd => &["B*"],
            PathPainting::FillStroke => &["B"],
            PathPainting::ClosePathStroke => &["s"],
            PathPainting::ClosePathFillStroke if even_odd => &["b*"],
            PathPainting::ClosePathFillStroke => &["b"],
            PathPainting::Clip if even_odd => &["W*", "n"],
            PathPainting::Clip => &["W", "n"],
            PathPainting::EndPath => &["n"],
        };
        operators
            .iter()
            .map(|operator| Operation::new(operator, vec![]))
            .collect()
    }
}

/// Accumulates the path under construction, keeping track of the current point.
#[derive(Debug, Clone, Default)]
pub struct PathBuilder {
    operations: Vec<Operation>,
    current_point: Option<(f32, f32)>,
    subpath_start: Option<(f32, f32)>,
}

impl PathBuilder {
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn current_point(&self) -> Option<(f32, f32)> {
        self.current_point
    }

    pub fn move_to(&mut self, x: f32, y: f32) {
        self.push("m", &[x, y]);
        self.current_point = Some((x, y));
        self.subpath_start = Some((x, y));
    }

    pub fn line_to(&mut self, x: f32, y: f32) -> Result<(), SessionError> {
        self.require_current_point()?;
        self.push("l", &[x, y]);
        self.current_point = Some((x, y));
        Ok(())
    }

    pub fn curve_to(
        &mut self,
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        x3: f32,
        y3: f32,
    ) -> Result<(), SessionError> {
        self.require_current_point()?;
        self.push("c", &[x1, y1, x2, y2, x3, y3]);
        self.current_point = Some((x3, y3));
        Ok(())
    }

    pub fn rectangle(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.push("re", &[x, y, width, height]);
        self.current_point = Some((x, y));
        self.subpath_start = Some((x, y));
    }

    pub fn circle(&mut self, x: f32, y: f32, radius: f32) -> Result<(), SessionError> {
        check_finite(&[x, y, radius])?;
        check_radius(radius)?;
        let k = KAPPA * radius;
        self.move_to(x + radius, y);
        self.push("c", &[x + radius, y + k, x + k, y + radius, x, y + radius]);
        self.push("c", &[x - k, y + radius, x - radius, y + k, x - radius, y]);
        self.push("c", &[x - radius, y - k, x - k, y - radius, x, y - radius]);
        self.push("c", &[x + k, y - radius, x + radius, y - k, x + radius, y]);
        self.push("h", &[]);
        self.current_point = Some((x + radius, y));
        Ok(())
    }

    /// Adds a counterclockwise arc from `alpha` to `beta` degrees. When a current point
    /// exists it is connected to the start of the arc by a straight line.
    pub fn arc(&mut self, x: f32, y: f32, radius: f32, alpha: f32, beta: f32) -> Result<(), SessionError> {
        check_finite(&[x, y, radius, alpha, beta])?;
        check_radius(radius)?;
        self.arc_segments(x, y, radius, alpha, arc_sweep(alpha, beta));
        Ok(())
    }

    /// Adds a clockwise arc from `alpha` to `beta` degrees.
    pub fn arc_clockwise(
        &mut self,
        x: f32,
        y: f32,
        radius: f32,
        alpha: f32,
        beta: f32,
    ) -> Result<(), SessionError> {
        check_finite(&[x, y, radius, alpha, beta])?;
        check_radius(radius)?;
        self.arc_segments(x, y, radius, alpha, -arc_sweep(beta, alpha));
        Ok(())
    }

    pub fn close_path(&mut self) -> Result<(), SessionError> {
        self.require_current_point()?;
        self.push("h", &[]);
        self.current_point = self.subpath_start;
        Ok(())
    }

    /// Hands over the accumulated operations, leaving the builder empty.
    pub fn take(&mut self) -> Vec<Operation> {
        self.current_point = None;
        self.subpath_start = None;
        std::mem::take(&mut self.operations)
    }

    /// Approximates the arc by at most four Bézier curves, `sweep` being in degrees and
    /// negative for clockwise arcs.
    fn arc_segments(&mut self, x: f32, y: f32, radius: f32, start: f32, sweep: f32) {
        let start = f64::from(start).rem_euclid(360.0) as f32;
        let start_point = (
            x + radius * start.to_radians().cos(),
            y + radius * start.to_radians().sin(),
        );
        if self.current_point.is_some() {
            self.push("l", &[start_point.0, start_point.1]);
            self.current_point = Some(start_point);
        } else {
            self.move_to(start_point.0, start_point.1);
        }

        let segment_count = ((sweep.abs() / 90.0).ceil() as usize).max(1);
        let segment_sweep = (sweep / segment_count as f32).to_radians();
        let mut angle = start.to_radians();
        for _ in 0..segment_count {
            let next_angle = angle + segment_sweep;
            let handle = 4.0 / 3.0 * (segment_sweep / 4.0).tan();
            let (sin0, cos0) = angle.sin_cos();
            let (sin1, cos1) = next_angle.sin_cos();
            let control_points = [
                x + radius * (cos0 - handle * sin0),
                y + radius * (sin0 + handle * cos0),
                x + radius * (cos1 + handle * sin1),
                y + radius * (sin1 - handle * cos1),
                x + radius * cos1,
                y + radius * sin1,
            ];
            self.push("c", &control_points);
            self.current_point = Some((control_points[4], control_points[5]));
            angle = next_angle;
        }
    }

    fn push(&mut self, operator: &str, operands: &[f32]) {
        self.operations.push(Operation::new(
            operator,
            operands.iter().copied().map(Object::Real).collect(),
        ));
    }

    fn require_current_point(&self) -> Result<(), SessionError> {
        self.current_point
            .map(|_| ())
            .ok_or_else(|| SessionError::state("There is no current point"))
    }
}

/// The counterclockwise sweep from `alpha` to `beta` in degrees, between 0 and 360. Distinct
/// angles a whole number of turns apart make a full circle.
fn arc_sweep(alpha: f32, beta: f32) -> f32 {
    let difference = f64::from(beta) - f64::from(alpha);
    let sweep = difference.rem_euclid(360.0);
    if sweep == 0.0 && difference != 0.0 {
        360.0
    } else {
        sweep as f32
    }
}

fn check_radius(radius: f32) -> Result<(), SessionError> {
    if radius > 0.0 {
        Ok(())
    } else {
        Err(SessionError::argument(format!(
            "The radius must be positive, got {}",
            radius
        )))
    }
}
