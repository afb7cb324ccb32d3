//! 运行时错误.

use crate::Idx3d;

/// 分割或测量的运行时错误.
///
/// 注意 "未找到细胞核" 不属于错误, 它通过
/// [`crate::BoundaryOutcome::best_threshold`] 的哨兵值 `-1` 表示.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SegError {
    /// 体积下限大于上限. 两个参数依次为下限和上限.
    #[error("体积范围非法: 下限 {0} 大于上限 {1}")]
    InvalidVolumeRange(f64, f64),

    /// 染色中心体积过滤的下限大于上限.
    #[error("体积过滤范围非法: 下限 {0} 大于上限 {1}")]
    InvalidSizeRange(f64, f64),

    /// 体素分辨率必须为正有限数.
    #[error("体素分辨率非法: {0:?}")]
    InvalidSpacing([f64; 3]),

    /// 其它数值参数非法. 第一个参数为参数名.
    #[error("参数 `{0}` 非法: {1}")]
    InvalidParameter(&'static str, f64),

    /// 两个需要一一对应的网格形状不一致.
    #[error("网格形状不一致: {0:?} 与 {1:?}")]
    ShapeMismatch(Idx3d, Idx3d),

    /// 网格没有任何体素.
    #[error("网格为空")]
    EmptyGrid,

    /// 网格体素数超出处理上限.
    #[error("网格过大: {0} 个体素")]
    GridTooLarge(usize),
}

/// 分割 / 测量运行时错误.
pub type SegResult<T> = Result<T, SegError>;
