//! Collision shapes.

use serde::{Serialize, Deserialize};
use anyhow::*;
use vek::*;


/// Geometry of a body, in local space around its center of mass.
///
/// Construct through `Shape::circle` or `Shape::rectangle`, which reject degenerate geometry.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Circle {
        radius: f64,
    },
    /// Axis-aligned rectangle given by its local-space corners.
    Rectangle {
        min: Vec2<f64>,
        max: Vec2<f64>,
    },
}

impl Shape {
    /// Circle with the given radius, which must be positive and finite.
    pub fn circle(radius: f64) -> Result<Self> {
        let shape = Shape::Circle { radius };
        shape.validate()?;
        Ok(shape)
    }

    /// Rectangle from its local-space corners. `min` must be strictly less than `max` on both axes.
    pub fn rectangle<V: Into<Vec2<f64>>>(min: V, max: V) -> Result<Self> {
        let shape = Shape::Rectangle { min: min.into(), max: max.into() };
        shape.validate()?;
        Ok(shape)
    }

    /// Check that the geometry is usable. Shapes may be built directly from their variants (or
    /// arrive deserialized), so this is re-checked whenever derived quantities are recomputed.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Shape::Circle { radius } => {
                ensure!(radius.is_finite() && radius > 0.0, "invalid circle radius {}", radius);
            }
            Shape::Rectangle { min, max } => {
                ensure!(
                    min.x.is_finite() && min.y.is_finite() && max.x.is_finite() && max.y.is_finite(),
                    "non-finite rectangle corners {:?} {:?}", min, max,
                );
                ensure!(
                    min.x < max.x && min.y < max.y,
                    "rectangle min corner {:?} not below max corner {:?}", min, max,
                );
            }
        }
        Ok(())
    }

    /// Width and height of the rectangle, or the circle's diameter on both axes.
    pub fn size(&self) -> Extent2<f64> {
        match *self {
            Shape::Circle { radius } => Extent2::from(radius * 2.0),
            Shape::Rectangle { min, max } => Extent2::new(max.x - min.x, max.y - min.y),
        }
    }

    /// Half of `size`. The exact extent of the shape around the body position along each axis.
    pub fn half_extents(&self) -> Extent2<f64> {
        self.size() * 0.5
    }

    /// Symmetric half extent of the body's bounding box around its position.
    ///
    /// For rectangles this is half of the larger side, a square bound rather than a tight one.
    pub fn bounding_box_offset(&self) -> f64 {
        match *self {
            Shape::Circle { radius } => radius,
            Shape::Rectangle { .. } => {
                let size = self.size();
                size.w.max(size.h) * 0.5
            }
        }
    }

    /// Moment of inertia for a body of mass `mass` with this shape.
    pub fn inertia(&self, mass: f64) -> f64 {
        match *self {
            Shape::Circle { radius } => mass * radius * radius / 4.0,
            Shape::Rectangle { .. } => {
                let size = self.size();
                mass * (size.h * size.h + size.w * size.w) / 12.0
            }
        }
    }

    /// Local-space center of the shape.
    pub fn center(&self) -> Vec2<f64> {
        match *self {
            Shape::Circle { .. } => Vec2::zero(),
            Shape::Rectangle { min, max } => (min + max) * 0.5,
        }
    }
}


#[test]
fn rejects_degenerate_geometry() {
    assert!(Shape::circle(0.0).is_err());
    assert!(Shape::circle(-1.0).is_err());
    assert!(Shape::circle(f64::NAN).is_err());
    assert!(Shape::rectangle([0.0, 0.0], [0.0, 1.0]).is_err());
    assert!(Shape::rectangle([1.0, 0.0], [0.0, 1.0]).is_err());
    assert!(Shape::rectangle([0.0, 0.0], [f64::INFINITY, 1.0]).is_err());
    assert!(Shape::rectangle([-1.0, -2.0], [1.0, 2.0]).is_ok());
}

#[test]
fn derived_quantities() {
    let circle = Shape::circle(2.0).unwrap();
    assert_eq!(circle.bounding_box_offset(), 2.0);
    assert_eq!(circle.inertia(10.0), 10.0);

    let rect = Shape::rectangle([0.0, 0.0], [6.0, 2.0]).unwrap();
    assert_eq!(rect.size(), Extent2::new(6.0, 2.0));
    assert_eq!(rect.bounding_box_offset(), 3.0);
    assert!((rect.inertia(3.0) - 10.0).abs() < 1e-12);
    assert_eq!(rect.center(), Vec2::new(3.0, 1.0));
}
