//! The six faces of the cube-sphere and their basis vectors.

use glam::DVec3;

/// The six faces of the cube that tiles the planet sphere.
///
/// Each variant corresponds to a face whose outward normal points
/// along the named axis direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum CubeFace {
    /// +X face
    PosX = 0,
    /// −X face
    NegX = 1,
    /// +Y face
    PosY = 2,
    /// −Y face
    NegY = 3,
    /// +Z face
    PosZ = 4,
    /// −Z face
    NegZ = 5,
}

impl CubeFace {
    /// All six faces in canonical order.
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PosX,
        CubeFace::NegX,
        CubeFace::PosY,
        CubeFace::NegY,
        CubeFace::PosZ,
        CubeFace::NegZ,
    ];

    /// Outward-pointing unit normal for this face.
    #[must_use]
    pub fn normal(self) -> DVec3 {
        match self {
            CubeFace::PosX => DVec3::X,
            CubeFace::NegX => DVec3::NEG_X,
            CubeFace::PosY => DVec3::Y,
            CubeFace::NegY => DVec3::NEG_Y,
            CubeFace::PosZ => DVec3::Z,
            CubeFace::NegZ => DVec3::NEG_Z,
        }
    }

    /// U basis vector: direction of increasing `u` on this face.
    ///
    /// Chosen together with [`CubeFace::v_vector`] so that adjacent faces'
    /// boundary vertices line up when all six faces are meshed.
    #[must_use]
    pub fn u_vector(self) -> DVec3 {
        match self {
            CubeFace::PosX => DVec3::NEG_Z,
            CubeFace::NegX => DVec3::Z,
            CubeFace::PosY => DVec3::X,
            CubeFace::NegY => DVec3::X,
            CubeFace::PosZ => DVec3::X,
            CubeFace::NegZ => DVec3::NEG_X,
        }
    }

    /// V basis vector: direction of increasing `v` on this face.
    #[must_use]
    pub fn v_vector(self) -> DVec3 {
        match self {
            CubeFace::PosX => DVec3::Y,
            CubeFace::NegX => DVec3::Y,
            CubeFace::PosY => DVec3::NEG_Z,
            CubeFace::NegY => DVec3::Z,
            CubeFace::PosZ => DVec3::Y,
            CubeFace::NegZ => DVec3::Y,
        }
    }

    /// The basis triple for this face as a [`FaceOrientation`].
    #[must_use]
    pub fn orientation(self) -> FaceOrientation {
        FaceOrientation {
            normal: self.normal(),
            u: self.u_vector(),
            v: self.v_vector(),
        }
    }
}

/// The three basis vectors defining a cube face and its parameter-space
/// orientation: the plane normal plus the U and V directions.
///
/// Every quad node carries one of these; children inherit the parent's
/// orientation unchanged.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceOrientation {
    /// Outward face normal.
    pub normal: DVec3,
    /// Direction of increasing `u`.
    pub u: DVec3,
    /// Direction of increasing `v`.
    pub v: DVec3,
}
