use glam::Vec3;
use thiserror::Error;

const MIN_SEGMENT_PARAMETER: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CurveError {
    #[error("curve needs at least 2 control points, got {actual}")]
    TooFewPoints { actual: usize },
    #[error("control point {index} is not finite")]
    NonFinitePoint { index: usize },
}

/// Non-closed centripetal Catmull-Rom curve sampled by normalized `t`.
///
/// Endpoints are extrapolated by reflection so the curve passes through the
/// first and last control points at `t = 0` and `t = 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct CatmullRomCurve {
    points: Vec<Vec3>,
}

impl CatmullRomCurve {
    pub fn new(points: Vec<Vec3>) -> Result<Self, CurveError> {
        if points.len() < 2 {
            return Err(CurveError::TooFewPoints {
                actual: points.len(),
            });
        }
        if let Some(index) = points.iter().position(|point| !point.is_finite()) {
            return Err(CurveError::NonFinitePoint { index });
        }
        Ok(Self { points })
    }

    pub fn first_point(&self) -> Vec3 {
        self.points[0]
    }

    pub fn last_point(&self) -> Vec3 {
        self.points[self.points.len() - 1]
    }

    pub fn point_at(&self, t: f32) -> Vec3 {
        let count = self.points.len();
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };

        let scaled = (count - 1) as f32 * t;
        let mut segment = scaled.floor() as usize;
        let mut weight = scaled - segment as f32;
        if segment >= count - 1 {
            segment = count - 2;
            weight = 1.0;
        }

        let p1 = self.points[segment];
        let p2 = self.points[segment + 1];
        let p0 = if segment > 0 {
            self.points[segment - 1]
        } else {
            p1 + (p1 - p2)
        };
        let p3 = if segment + 2 < count {
            self.points[segment + 2]
        } else {
            p2 + (p2 - p1)
        };

        centripetal_segment(p0, p1, p2, p3, weight)
    }

    pub fn tangent_at(&self, t: f32) -> Vec3 {
        let delta = 1e-3;
        let a = self.point_at((t - delta).max(0.0));
        let b = self.point_at((t + delta).min(1.0));
        (b - a).normalize_or_zero()
    }
}

fn centripetal_segment(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3, weight: f32) -> Vec3 {
    let mut dt0 = p0.distance_squared(p1).powf(0.25);
    let mut dt1 = p1.distance_squared(p2).powf(0.25);
    let mut dt2 = p2.distance_squared(p3).powf(0.25);

    // Coincident neighbours would divide by zero.
    if dt1 < MIN_SEGMENT_PARAMETER {
        dt1 = 1.0;
    }
    if dt0 < MIN_SEGMENT_PARAMETER {
        dt0 = dt1;
    }
    if dt2 < MIN_SEGMENT_PARAMETER {
        dt2 = dt1;
    }

    let tangent1 = ((p1 - p0) / dt0 - (p2 - p0) / (dt0 + dt1) + (p2 - p1) / dt1) * dt1;
    let tangent2 = ((p2 - p1) / dt1 - (p3 - p1) / (dt1 + dt2) + (p3 - p2) / dt2) * dt1;

    let c0 = p1;
    let c1 = tangent1;
    let c2 = -3.0 * p1 + 3.0 * p2 - 2.0 * tangent1 - tangent2;
    let c3 = 2.0 * p1 - 2.0 * p2 + tangent1 + tangent2;

    let w2 = weight * weight;
    let w3 = w2 * weight;
    c0 + c1 * weight + c2 * w2 + c3 * w3
}

pub fn cubic_ease_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

pub fn quadratic_ease_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}
