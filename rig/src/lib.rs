pub mod bone;
pub mod builder;
pub mod config;
pub mod convert;
pub mod error;
pub mod geometry;
pub mod limit;
pub mod pose;
pub mod skeleton;
pub mod warning;

pub use bone::{BoneNode, LimitConstraint, LocalAxis};
pub use builder::{MIN_BONE_LENGTH, RigBuilder};
pub use config::ImportConfig;
pub use convert::{Conversion, convert_file, convert_str};
pub use error::{ConvertError, PoseError};
pub use geometry::{GeometryPlacement, MeshFormat, MeshHandle, Shape};
pub use limit::{LimitRecord, LimitSource, LimitTable};
pub use pose::{IkSolver, OpwChain, RigPose};
pub use skeleton::Rig;
pub use warning::Warning;
