//! Rectangular regions on a cube face's parameter plane.

/// An immutable rectangle on a face's unit parameter plane.
///
/// The root extents cover `[-1, 1] × [-1, 1]`; every split halves the
/// region in both directions. `u` runs west→east, `v` runs north→south,
/// so `east > west` and `south > north` always hold.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Extents {
    /// Minimum `u` coordinate.
    pub west: f64,
    /// Maximum `u` coordinate.
    pub east: f64,
    /// Minimum `v` coordinate.
    pub north: f64,
    /// Maximum `v` coordinate.
    pub south: f64,
}

impl Extents {
    /// Create extents from explicit bounds.
    ///
    /// Debug-asserts the `east > west`, `south > north` invariant.
    #[must_use]
    pub fn new(west: f64, east: f64, north: f64, south: f64) -> Self {
        debug_assert!(east > west, "extents invariant violated: east <= west");
        debug_assert!(south > north, "extents invariant violated: south <= north");
        Self {
            west,
            east,
            north,
            south,
        }
    }

    /// The root extents of a cube face: the full `[-1, 1] × [-1, 1]` plane.
    #[must_use]
    pub fn root() -> Self {
        Self::new(-1.0, 1.0, -1.0, 1.0)
    }

    /// Width of the region. Extents are square in practice, so this also
    /// serves as the region's characteristic size.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    /// Center of the region as a `(u, v)` pair.
    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        (
            (self.west + self.east) * 0.5,
            (self.north + self.south) * 0.5,
        )
    }

    /// Split into 4 sub-extents in fixed (NW, NE, SW, SE) order.
    ///
    /// Pure and deterministic; the children tile the parent exactly and
    /// each has exactly half the parent's width.
    #[must_use]
    pub fn split(&self) -> [Extents; 4] {
        let (mid_u, mid_v) = self.center();
        [
            Extents::new(self.west, mid_u, self.north, mid_v),
            Extents::new(mid_u, self.east, self.north, mid_v),
            Extents::new(self.west, mid_u, mid_v, self.south),
            Extents::new(mid_u, self.east, mid_v, self.south),
        ]
    }

    /// Whether this region's west edge lies on the face's root boundary.
    #[must_use]
    pub fn west_on_face_edge(&self) -> bool {
        self.west <= -1.0
    }

    /// Whether this region's east edge lies on the face's root boundary.
    #[must_use]
    pub fn east_on_face_edge(&self) -> bool {
        self.east >= 1.0
    }

    /// Whether this region's north edge lies on the face's root boundary.
    #[must_use]
    pub fn north_on_face_edge(&self) -> bool {
        self.north <= -1.0
    }

    /// Whether this region's south edge lies on the face's root boundary.
    #[must_use]
    pub fn south_on_face_edge(&self) -> bool {
        self.south >= 1.0
    }
}
