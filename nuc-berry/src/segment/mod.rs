//! 细胞核与染色中心分割.
//!
//! 两个入口函数都在进行任何网格计算之前检查参数, 参数非法时返回 [`SegError`].

mod boundary;
mod chromocenter;
mod convex_hull;

pub use crate::ops::GaussianSigma;
pub use boundary::BoundaryOutcome;

use crate::{GridAttr, LabelStack, RawStack, SegError, SegResult};
use log::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 染色中心体积过滤范围 (物理单位, 闭区间).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SizeFilter {
    /// 体积下限.
    pub min: f64,
    /// 体积上限.
    pub max: f64,
}

impl SizeFilter {
    /// 体积 `volume` 是否位于 `[min, max]` 内?
    #[inline]
    pub fn keeps(&self, volume: f64) -> bool {
        self.min <= volume && volume <= self.max
    }
}

/// 分割参数.
///
/// 分割过程从不修改该结构. 染色中心分割中对 `neigh` 和 `factor` 的自适应放大
/// 只作用于局部副本.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SegmentationParameters {
    /// 细胞核物理体积下限.
    pub min_volume: f64,

    /// 细胞核物理体积上限.
    pub max_volume: f64,

    /// 局部对比度的邻域半径 (体素). 实际窗口半径为其向下取整.
    pub neigh: f64,

    /// 染色中心门限 `μ + factor·σ` 中的因子.
    pub factor: f64,

    /// 高斯平滑标准差 (体素).
    pub sigma: GaussianSigma,

    /// 计算局部对比度前是否先平滑原始图像.
    pub blur_raw: bool,

    /// 染色中心体积过滤. `None` 表示不过滤.
    pub size_filter: Option<SizeFilter>,

    /// 是否额外生成凸包正则化后的细胞核掩膜.
    pub convex_hull: bool,
}

impl Default for SegmentationParameters {
    /// 体积范围 `[15, 2000]`, `neigh = 3`, `factor = 1.5`,
    /// `sigma = (1, 1, 2)`, 不平滑原始图像, 不过滤体积, 不生成凸包掩膜.
    fn default() -> Self {
        Self {
            min_volume: 15.0,
            max_volume: 2000.0,
            neigh: 3.0,
            factor: 1.5,
            sigma: GaussianSigma {
                x: 1.0,
                y: 1.0,
                z: 2.0,
            },
            blur_raw: false,
            size_filter: None,
            convex_hull: false,
        }
    }
}

impl SegmentationParameters {
    /// 设置细胞核体积范围.
    pub fn with_volume_range(mut self, min_volume: f64, max_volume: f64) -> Self {
        self.min_volume = min_volume;
        self.max_volume = max_volume;
        self
    }

    /// 设置局部对比度参数.
    pub fn with_contrast(mut self, neigh: f64, factor: f64) -> Self {
        self.neigh = neigh;
        self.factor = factor;
        self
    }

    /// 设置高斯平滑标准差.
    pub fn with_sigma(mut self, sigma: GaussianSigma) -> Self {
        self.sigma = sigma;
        self
    }

    /// 设置是否平滑原始图像.
    pub fn with_blur_raw(mut self, blur_raw: bool) -> Self {
        self.blur_raw = blur_raw;
        self
    }

    /// 设置染色中心体积过滤.
    pub fn with_size_filter(mut self, size_filter: Option<SizeFilter>) -> Self {
        self.size_filter = size_filter;
        self
    }

    /// 设置是否生成凸包掩膜.
    pub fn with_convex_hull(mut self, convex_hull: bool) -> Self {
        self.convex_hull = convex_hull;
        self
    }

    /// 检查参数合法性.
    pub fn validate(&self) -> SegResult<()> {
        non_negative("min_volume", self.min_volume)?;
        non_negative("max_volume", self.max_volume)?;
        if self.min_volume > self.max_volume {
            return Err(SegError::InvalidVolumeRange(self.min_volume, self.max_volume));
        }
        if !self.neigh.is_finite() || self.neigh < 1.0 {
            return Err(SegError::InvalidParameter("neigh", self.neigh));
        }
        if !self.factor.is_finite() {
            return Err(SegError::InvalidParameter("factor", self.factor));
        }
        self.sigma.validate()?;
        if let Some(f) = self.size_filter {
            non_negative("size_filter.min", f.min)?;
            non_negative("size_filter.max", f.max)?;
            if f.min > f.max {
                return Err(SegError::InvalidSizeRange(f.min, f.max));
            }
        }
        Ok(())
    }
}

fn non_negative(name: &'static str, v: f64) -> SegResult<()> {
    if v.is_finite() && v >= 0.0 {
        Ok(())
    } else {
        Err(SegError::InvalidParameter(name, v))
    }
}

/// 在原始图像 `raw` 中搜索细胞核边界.
///
/// 未找到满足约束的门限不是错误, 此时返回值的 `best_threshold` 为 `-1`.
pub fn run_boundary_search(
    raw: &RawStack,
    params: &SegmentationParameters,
) -> SegResult<BoundaryOutcome> {
    params.validate()?;
    debug!("边界搜索: 形状 {:?}, 分辨率 {:?}", raw.shape(), raw.pix_dim());
    Ok(boundary::search(raw, params))
}

/// 在细胞核掩膜 `nucleus` 内分割染色中心, 返回标签网格 (0 为背景, 染色中心为 `1..=n`).
pub fn run_sub_object_segmentation(
    raw: &RawStack,
    nucleus: &LabelStack,
    params: &SegmentationParameters,
) -> SegResult<LabelStack> {
    params.validate()?;
    raw.check_same_shape(nucleus)?;
    Ok(chromocenter::segment(raw, nucleus, params))
}
