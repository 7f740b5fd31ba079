//! Response curves: piecewise-linear maps from an environmental reading to a
//! dimensionless growth multiplier.

use serde::{Deserialize, Serialize};

/// A single `(x, y)` knot of a response curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlPoint {
    /// The environmental reading (ppm CO2, pH units, or degrees Celsius).
    pub x: f64,
    /// The growth multiplier at that reading.
    pub y: f64,
}

/// An ordered list of control points, expected to be strictly increasing in `x`.
///
/// Serialized as a plain list of `[x, y]` pairs so curves read naturally in YAML:
///
/// ```yaml
/// co2_effect_on_mushroom: [[500, 0.9], [800, 1.0], [1000, 0.8]]
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<(f64, f64)>", into = "Vec<(f64, f64)>")]
pub struct ResponseCurve {
    points: Vec<ControlPoint>,
}

impl ResponseCurve {
    pub fn points(&self) -> &[ControlPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&ControlPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&ControlPoint> {
        self.points.last()
    }
}

impl From<Vec<(f64, f64)>> for ResponseCurve {
    fn from(pairs: Vec<(f64, f64)>) -> Self {
        Self {
            points: pairs.into_iter().map(|(x, y)| ControlPoint { x, y }).collect(),
        }
    }
}

impl From<ResponseCurve> for Vec<(f64, f64)> {
    fn from(curve: ResponseCurve) -> Self {
        curve.points.into_iter().map(|p| (p.x, p.y)).collect()
    }
}

impl<const N: usize> From<[(f64, f64); N]> for ResponseCurve {
    fn from(pairs: [(f64, f64); N]) -> Self {
        Self::from(pairs.to_vec())
    }
}
