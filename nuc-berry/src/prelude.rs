//! 🍇欢迎光临🫐
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, Idx3d};

pub use crate::data::{Calibration, GridAttr, LabelStack, RawStack, VoxelGrid};
pub use crate::{IntensityHistogram, LabelHistogram};

pub use crate::consts::label::{BACKGROUND, FOREGROUND};

pub use crate::segment::{
    run_boundary_search, run_sub_object_segmentation, BoundaryOutcome, GaussianSigma,
    SegmentationParameters, SizeFilter,
};

pub use crate::measure::radial::{compute_radial_distances, RadialDistanceRecord};
pub use crate::measure::{
    measure, measure_nucleus, IntensityStats, NucleusMeasurement, ObjectDescriptor,
};

pub use crate::{SegError, SegResult};
