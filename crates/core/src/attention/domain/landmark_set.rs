//! Face-mesh landmark set with anatomical index layout.
//!
//! Points follow the MediaPipe face-mesh topology. The base mesh has 468
//! points; the refined mesh appends 10 iris points for 478 total. Both share
//! the indices used for head pose and eye aspect ratio.

use thiserror::Error;

/// Number of points in the base face mesh.
pub const FACE_MESH_POINTS: usize = 468;

/// Number of points in the refined face mesh (base + iris).
pub const FACE_MESH_REFINED_POINTS: usize = 478;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LandmarkError {
    #[error("expected {expected} landmarks, got {actual}")]
    WrongLength { expected: usize, actual: usize },
    #[error("landmark index {index} out of range for {len} points")]
    IndexOutOfRange { index: usize, len: usize },
}

/// A single landmark in frame pixel space. `z` is depth relative to the
/// face center, scaled like `x`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance in the image plane, ignoring depth.
    pub fn planar_distance(&self, other: &Point3) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn midpoint(&self, other: &Point3) -> Point3 {
        Point3::new(
            (self.x + other.x) / 2.0,
            (self.y + other.y) / 2.0,
            (self.z + other.z) / 2.0,
        )
    }
}

/// Six ordered eye points: outer corner, two upper lid, inner corner,
/// two lower lid.
pub type EyeGroup = [usize; 6];

/// Maps anatomical roles to point indices for one mesh topology.
#[derive(Clone, Debug, PartialEq)]
pub struct LandmarkLayout {
    pub expected_len: usize,
    pub nose_tip: usize,
    pub left_eye: EyeGroup,
    pub right_eye: EyeGroup,
}

impl LandmarkLayout {
    pub const FACE_MESH: LandmarkLayout = LandmarkLayout {
        expected_len: FACE_MESH_POINTS,
        nose_tip: 1,
        left_eye: [33, 160, 158, 133, 153, 144],
        right_eye: [362, 385, 387, 263, 373, 380],
    };

    pub const FACE_MESH_REFINED: LandmarkLayout = LandmarkLayout {
        expected_len: FACE_MESH_REFINED_POINTS,
        ..Self::FACE_MESH
    };

    /// Picks the layout whose length matches `len`, if any.
    pub fn for_len(len: usize) -> Option<&'static LandmarkLayout> {
        match len {
            FACE_MESH_POINTS => Some(&Self::FACE_MESH),
            FACE_MESH_REFINED_POINTS => Some(&Self::FACE_MESH_REFINED),
            _ => None,
        }
    }
}

impl Default for LandmarkLayout {
    fn default() -> Self {
        Self::FACE_MESH_REFINED
    }
}

/// Ordered landmarks for one detected face in one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct LandmarkSet {
    points: Vec<Point3>,
    has_depth: bool,
}

impl LandmarkSet {
    /// Builds a set, rejecting lengths that match no known mesh topology.
    pub fn new(points: Vec<Point3>) -> Result<Self, LandmarkError> {
        if LandmarkLayout::for_len(points.len()).is_none() {
            return Err(LandmarkError::WrongLength {
                expected: FACE_MESH_REFINED_POINTS,
                actual: points.len(),
            });
        }
        Ok(Self {
            points,
            has_depth: true,
        })
    }

    /// Builds a set from a detector that reports no depth channel.
    /// The `z` of every point is ignored by pose estimation.
    pub fn planar(points: Vec<(f64, f64)>) -> Result<Self, LandmarkError> {
        let points = points
            .into_iter()
            .map(|(x, y)| Point3::new(x, y, 0.0))
            .collect();
        let mut set = Self::new(points)?;
        set.has_depth = false;
        Ok(set)
    }

    /// Builds a set without length validation.
    ///
    /// Index lookups still fail gracefully through [`LandmarkSet::get`].
    pub fn from_points_unchecked(points: Vec<Point3>) -> Self {
        Self {
            points,
            has_depth: true,
        }
    }

    pub fn has_depth(&self) -> bool {
        self.has_depth
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    pub fn get(&self, index: usize) -> Result<&Point3, LandmarkError> {
        self.points.get(index).ok_or(LandmarkError::IndexOutOfRange {
            index,
            len: self.points.len(),
        })
    }

    /// Mean position of the given indices.
    pub fn centroid(&self, indices: &[usize]) -> Result<Point3, LandmarkError> {
        let mut sum = Point3::new(0.0, 0.0, 0.0);
        for &i in indices {
            let p = self.get(i)?;
            sum.x += p.x;
            sum.y += p.y;
            sum.z += p.z;
        }
        let n = indices.len().max(1) as f64;
        Ok(Point3::new(sum.x / n, sum.y / n, sum.z / n))
    }
}
