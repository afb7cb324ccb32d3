#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 提供三维细胞核显微图像的分割与形态学测量算法.
//!
//! 该 crate 目前仅提供 `safe` 接口. 所有入口函数都是纯函数:
//! 不读写任何全局状态, 中间网格由调用自身持有并在返回前丢弃.
//!
//! # 注意
//!
//! 1. 该 crate 不负责图像文件的读写. 调用方需自行将图像解码为 [`RawStack`],
//!   并提供体素物理分辨率 [`Calibration`].
//! 2. 所有三维数据按照 `(z, h, w)` 顺序存储和索引, 与 [`ndarray::Array3`] 一致.
//!   其中 `w` 对应物理 x 轴, `h` 对应物理 y 轴.
//! 3. 参数不合法时返回 [`SegError`], 不会静默替换为默认值.
//!
//! # 开发计划
//!
//! ### 体素网格与有序直方图 ✅
//!
//! 实现位于 `nuc-berry/src/data`.
//!
//! ### 基础算子 (Otsu, 26-连通标记, 高斯模糊, 形态学, 距离变换, 凸包, 表面积) ✅
//!
//! 实现位于 `nuc-berry/src/ops`.
//!
//! ### 细胞核边界搜索 ✅
//!
//! 以 Otsu 门限为种子扫描一段整数门限, 在体积和边缘约束下保留球形度最大的解,
//! 然后进行形态学修正、逐切片孔洞填充和边缘检查. 扫描过程在 `rayon`
//! feature 打开时并行执行, 结果与串行一致.
//!
//! 实现位于 `nuc-berry/src/segment/boundary.rs`.
//!
//! ### 凸包正则化 ✅
//!
//! 实现位于 `nuc-berry/src/segment/convex_hull.rs`.
//!
//! ### 染色中心分割 ✅
//!
//! 局部对比度梯度 + 自适应统计门限 + 体积过滤.
//!
//! 实现位于 `nuc-berry/src/segment/chromocenter.rs`.
//!
//! ### 形态学测量 ✅
//!
//! 体积, 质心, 扁平度/伸长度, 表面积, 球形度, 强度统计, RHF.
//!
//! 实现位于 `nuc-berry/src/measure`.
//!
//! ### 径向距离 ✅
//!
//! 实现位于 `nuc-berry/src/measure/radial.rs`.
//!
//! ### 与旧版本输出的数值对齐 ⌛️
//!
//! 质心目前保留了 "先取整再标定" 的行为. 若后续不再需要与旧输出逐位一致,
//! 可改为亚体素精度.

/// 二维索引 `(h, w)`, 同时也可一定程度上用作非负整数向量.
pub type Idx2d = (usize, usize);

/// 三维索引 `(z, h, w)`, 同时也可一定程度上用作非负整数向量.
pub type Idx3d = (usize, usize, usize);

type Area2d = Vec<Idx2d>;
type Areas2d = Vec<Area2d>;

/// 体素网格、标定与直方图.
mod data;

pub use data::histogram::{HistKey, Histogram, IntensityHistogram, LabelHistogram};
pub use data::slice::{LabelSlice, LabelSliceMut};
pub use data::{Calibration, GridAttr, LabelStack, RawStack, VoxelGrid};

pub mod consts;

mod error;

pub use error::{SegError, SegResult};

pub mod ops;

pub mod segment;

pub use segment::{
    run_boundary_search, run_sub_object_segmentation, BoundaryOutcome, GaussianSigma,
    SegmentationParameters, SizeFilter,
};

pub mod measure;

pub use measure::radial::{compute_radial_distances, RadialDistanceRecord};
pub use measure::{measure, measure_nucleus, IntensityStats, NucleusMeasurement, ObjectDescriptor};

pub mod prelude;

#[cfg(test)]
pub(crate) mod test_utils;
