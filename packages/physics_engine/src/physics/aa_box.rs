//! Axis-aligned box.

use vek::*;


/// Axis-aligned box in world space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AaBox {
    /// Box minimum corner position.
    pub pos: Vec2<f64>,
    /// Box extent from `pos`. Assumed to be non-negative.
    pub ext: Extent2<f64>,
}

impl AaBox {
    /// Box centered on `center` reaching `half` along each axis in both directions.
    pub fn around<V: Into<Vec2<f64>>>(center: V, half: Extent2<f64>) -> Self {
        let center: Vec2<f64> = center.into();
        AaBox {
            pos: center - Vec2::new(half.w, half.h),
            ext: half * 2.0,
        }
    }

    /// Square box `[-half_extent, half_extent]²`.
    pub fn centered_square(half_extent: f64) -> Self {
        AaBox::around(Vec2::zero(), Extent2::from(half_extent))
    }

    /// Maximum corner position.
    pub fn max(self) -> Vec2<f64> {
        self.pos + Vec2::new(self.ext.w, self.ext.h)
    }

    /// Center position.
    pub fn center(self) -> Vec2<f64> {
        self.pos + Vec2::new(self.ext.w, self.ext.h) * 0.5
    }

    /// Translate self by `v`.
    pub fn translate<V: Into<Vec2<f64>>>(mut self, v: V) -> Self {
        let v: Vec2<f64> = v.into();
        self.pos += v;
        self
    }

    /// Does self intersect with `rhs`?
    ///
    /// Touching edges count as intersecting. A box with a NaN coordinate intersects nothing.
    pub fn intersects(self, rhs: AaBox) -> bool {
        let (a_max, b_max) = (self.max(), rhs.max());
        (0..2).all(|i| self.pos[i] <= b_max[i] && rhs.pos[i] <= a_max[i])
    }

    /// Does self fully contain `rhs`? Shared edges are allowed.
    pub fn contains_box(self, rhs: AaBox) -> bool {
        let (a_max, b_max) = (self.max(), rhs.max());
        (0..2).all(|i| rhs.pos[i] >= self.pos[i] && b_max[i] <= a_max[i])
    }

    /// The four quadrants of self, in the order -x-y, +x-y, -x+y, +x+y.
    pub fn quadrants(self) -> [AaBox; 4] {
        let half = self.ext * 0.5;
        let quad = |dx: f64, dy: f64| AaBox {
            pos: self.pos + Vec2::new(dx * half.w, dy * half.h),
            ext: half,
        };
        [quad(0.0, 0.0), quad(1.0, 0.0), quad(0.0, 1.0), quad(1.0, 1.0)]
    }
}


#[test]
fn touching_boxes_intersect() {
    let a = AaBox::around([0.0, 0.0], Extent2::new(1.0, 1.0));
    let b = AaBox::around([2.0, 0.0], Extent2::new(1.0, 1.0));
    let c = AaBox::around([2.0 + 1e-9, 0.0], Extent2::new(1.0, 1.0));
    assert!(a.intersects(b));
    assert!(b.intersects(a));
    assert!(!a.intersects(c));
}

#[test]
fn quadrants_tile_parent() {
    let parent = AaBox::centered_square(4.0);
    let quads = parent.quadrants();
    for q in quads {
        assert!(parent.contains_box(q));
        assert_eq!(q.ext, Extent2::new(4.0, 4.0));
    }
    assert_eq!(quads[0].pos, Vec2::new(-4.0, -4.0));
    assert_eq!(quads[3].max(), Vec2::new(4.0, 4.0));
}

#[test]
fn nan_box_intersects_nothing() {
    let nan = AaBox::around([f64::NAN, 0.0], Extent2::new(1.0, 1.0));
    let b = AaBox::centered_square(10.0);
    assert!(!nan.intersects(b));
    assert!(!b.intersects(nan));
    assert!(!nan.intersects(nan));
}
