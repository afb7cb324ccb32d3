//! 基础算子.
//!
//! 分割与测量流程只依赖这里每个函数的约定, 不依赖其内部实现:
//!
//! | 算子 | 约定 |
//! | --- | --- |
//! | [`otsu_threshold`] | 使类间方差最大的直方图键 (低类包含该键) |
//! | [`label26`] | 26-连通分量标记, 标签从 1 开始按扫描顺序分配 |
//! | [`gaussian_blur`] | 可分离、各向异性的高斯平滑 (体素单位) |
//! | [`erode`] / [`dilate`] | 3x3x3 立方体结构元的平坦形态学 |
//! | [`distance_transform`] | 每个前景体素到最近背景体素的欧氏距离 (体素单位) |
//! | [`convex_hull_2d`] | Graham 扫描平面凸包 |
//! | [`gradient_surface_area`] | 基于梯度的边界表面积估计 (物理单位) |

use crate::Idx3d;
use itertools::iproduct;
use once_cell::sync::Lazy;

mod distance;
mod gaussian;
mod hull;
mod label;
mod morph;
mod otsu;
mod resample;
mod surface;

pub use distance::distance_transform;
pub use gaussian::{gaussian_blur, GaussianSigma};
pub use hull::{convex_hull_2d, hull_contains, Point2};
pub use label::{label26, relabel};
pub use morph::{closing, dilate, erode, opening};
pub use otsu::otsu_threshold;
pub use resample::{isotropic_depth, resample_z};
pub use surface::{
    equivalent_spherical_radius, gradient_surface_area, gradient_surface_areas, sphericity,
};

/// 三维整数偏移 `(dz, dh, dw)`.
pub(crate) type Offset3d = (isize, isize, isize);

/// 26-邻域偏移表 (不含自身), 按 `(dz, dh, dw)` 字典序排列.
pub(crate) static OFFSETS_26: Lazy<Vec<Offset3d>> = Lazy::new(|| {
    iproduct!(-1isize..=1, -1isize..=1, -1isize..=1)
        .filter(|d| *d != (0, 0, 0))
        .collect()
});

/// 6-邻域 (面相邻) 偏移表.
pub(crate) const OFFSETS_6: [Offset3d; 6] = [
    (-1, 0, 0),
    (1, 0, 0),
    (0, -1, 0),
    (0, 1, 0),
    (0, 0, -1),
    (0, 0, 1),
];

/// 计算 `pos + delta`. 结果越界 (包括负数) 时返回 `None`.
#[inline]
pub(crate) fn shift((z, h, w): Idx3d, (dz, dh, dw): Offset3d, (lz, lh, lw): Idx3d) -> Option<Idx3d> {
    let z = z.checked_add_signed(dz)?;
    let h = h.checked_add_signed(dh)?;
    let w = w.checked_add_signed(dw)?;
    (z < lz && h < lh && w < lw).then_some((z, h, w))
}

/// 计算 `pos + delta`, 越界的分量被截断到网格范围内 (边缘复制).
#[inline]
pub(crate) fn shift_clamped((z, h, w): Idx3d, (dz, dh, dw): Offset3d, (lz, lh, lw): Idx3d) -> Idx3d {
    #[inline]
    fn clamp(v: usize, d: isize, len: usize) -> usize {
        v.saturating_add_signed(d).min(len - 1)
    }
    (clamp(z, dz, lz), clamp(h, dh, lh), clamp(w, dw, lw))
}
