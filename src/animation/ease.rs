/// Timing curve applied to normalized tween progress.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Ease {
    Linear,
    InQuad,
    OutQuad,
    InOutQuad,
    InCubic,
    OutCubic,
    InOutCubic,
    /// CSS-style `cubic-bezier(x1, y1, x2, y2)` with fixed endpoints (0,0) and (1,1).
    CubicBezier { x1: f64, y1: f64, x2: f64, y2: f64 },
}

impl Ease {
    /// The "standard" material curve, `cubic-bezier(0.4, 0, 0.2, 1)`.
    pub const STANDARD: Self = Self::CubicBezier {
        x1: 0.4,
        y1: 0.0,
        x2: 0.2,
        y2: 1.0,
    };

    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::InQuad => t * t,
            Self::OutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Self::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(2) / 2.0)
                }
            }
            Self::InCubic => t * t * t,
            Self::OutCubic => 1.0 - (1.0 - t).powi(3),
            Self::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(3) / 2.0)
                }
            }
            Self::CubicBezier { x1, y1, x2, y2 } => {
                if t == 0.0 || t == 1.0 {
                    return t;
                }
                let u = solve_bezier_param(t, x1, x2);
                bezier_coord(u, y1, y2)
            }
        }
    }

    pub fn is_valid(self) -> bool {
        match self {
            Self::CubicBezier { x1, y1, x2, y2 } => {
                [x1, y1, x2, y2].iter().all(|v| v.is_finite())
                    && (0.0..=1.0).contains(&x1)
                    && (0.0..=1.0).contains(&x2)
            }
            _ => true,
        }
    }
}

fn bezier_coord(u: f64, p1: f64, p2: f64) -> f64 {
    let iu = 1.0 - u;
    3.0 * iu * iu * u * p1 + 3.0 * iu * u * u * p2 + u * u * u
}

fn bezier_slope(u: f64, p1: f64, p2: f64) -> f64 {
    let iu = 1.0 - u;
    3.0 * iu * iu * p1 + 6.0 * iu * u * (p2 - p1) + 3.0 * u * u * (1.0 - p2)
}

// Newton steps first, bisection when the slope flattens out.
fn solve_bezier_param(x: f64, x1: f64, x2: f64) -> f64 {
    const EPS: f64 = 1e-7;

    let mut u = x;
    for _ in 0..8 {
        let err = bezier_coord(u, x1, x2) - x;
        if err.abs() < EPS {
            return u;
        }
        let d = bezier_slope(u, x1, x2);
        if d.abs() < 1e-6 {
            break;
        }
        u -= err / d;
    }

    let (mut lo, mut hi) = (0.0, 1.0);
    u = x;
    for _ in 0..64 {
        let v = bezier_coord(u, x1, x2);
        if (v - x).abs() < EPS {
            break;
        }
        if v < x {
            lo = u;
        } else {
            hi = u;
        }
        u = 0.5 * (lo + hi);
    }
    u
}

#[cfg(test)]
#[path = "../../tests/unit/animation/ease.rs"]
mod tests;
