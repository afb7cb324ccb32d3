use super::{shift, shift_clamped, OFFSETS_6};
use crate::consts::label::is_object;
use crate::{GridAttr, Idx3d, LabelStack, RawStack};
use itertools::iproduct;
use std::collections::BTreeMap;
use std::f64::consts::PI;

/// 梯度模长低于该值时认为梯度为零.
const GRADIENT_EPS: f64 = 1e-12;

/// 3x3x3 Sobel 梯度 (物理单位), 边界处复制边缘值. 结果按 `(z, h, w)` 排列.
fn sobel(value: impl Fn(Idx3d) -> f64, pos: Idx3d, shape: Idx3d, pix_dim: [f64; 3]) -> [f64; 3] {
    const SMOOTH: [f64; 3] = [1.0, 2.0, 1.0];
    let mut g = [0.0; 3];
    for (dz, dh, dw) in iproduct!(-1isize..=1, -1isize..=1, -1isize..=1) {
        let d = [dz, dh, dw];
        let v = value(shift_clamped(pos, (dz, dh, dw), shape));
        for a in 0..3 {
            if d[a] == 0 {
                continue;
            }
            let b = (d[(a + 1) % 3] + 1) as usize;
            let c = (d[(a + 2) % 3] + 1) as usize;
            g[a] += d[a] as f64 * SMOOTH[b] * SMOOTH[c] * v;
        }
    }
    for (ga, p) in g.iter_mut().zip(pix_dim) {
        *ga /= p;
    }
    g
}

fn unit(g: [f64; 3]) -> Option<[f64; 3]> {
    let norm = g.iter().map(|v| v * v).sum::<f64>().sqrt();
    (norm > GRADIENT_EPS).then(|| g.map(|v| v / norm))
}

/// 基于梯度的表面积估计.
///
/// 对每个对象体素的每个暴露面 (相邻体素不属于该对象或位于网格外),
/// 累加 `面积 * |n . e|`, 其中 `n` 为该体素处强度梯度方向, `e` 为面的法向.
/// 强度梯度为零时改用对象掩膜自身的梯度, 仍为零时使用完整的面积.
struct SurfaceEstimator<'a> {
    raw: &'a RawStack,
    labels: &'a LabelStack,
    shape: Idx3d,
    pix_dim: [f64; 3],
    face_area: [f64; 3],
}

impl<'a> SurfaceEstimator<'a> {
    fn new(raw: &'a RawStack, labels: &'a LabelStack) -> Self {
        assert_eq!(raw.shape(), labels.shape(), "强度图像和标签形状不一致");
        let pix_dim @ [pz, ph, pw] = labels.pix_dim();
        Self {
            raw,
            labels,
            shape: labels.shape(),
            pix_dim,
            face_area: [ph * pw, pz * pw, pz * ph],
        }
    }

    /// 位于 `pos` 的体素 (标签为 `label`) 贡献的表面积.
    fn voxel_area(&self, pos: Idx3d, label: u32) -> f64 {
        let labels = self.labels;
        let intensity = |p: Idx3d| self.raw[p] as f64;
        let inside = |p: Idx3d| if labels[p] == label { 1.0 } else { 0.0 };

        let mut weights: Option<[f64; 3]> = None;
        let mut area = 0.0;
        for (i, d) in OFFSETS_6.iter().enumerate() {
            let exposed = shift(pos, *d, self.shape).map_or(true, |n| labels[n] != label);
            if !exposed {
                continue;
            }
            let w = weights.get_or_insert_with(|| {
                unit(sobel(intensity, pos, self.shape, self.pix_dim))
                    .or_else(|| unit(sobel(inside, pos, self.shape, self.pix_dim)))
                    .map_or([1.0; 3], |n| n.map(f64::abs))
            });
            let axis = i / 2;
            area += self.face_area[axis] * w[axis];
        }
        area
    }
}

/// 估计标签为 `label` 的对象的表面积 (物理单位).
///
/// 如果 `raw` 与 `labels` 形状不一致, 则程序 panic.
pub fn gradient_surface_area(raw: &RawStack, labels: &LabelStack, label: u32) -> f64 {
    let est = SurfaceEstimator::new(raw, labels);
    labels
        .data()
        .indexed_iter()
        .filter(|(_, l)| **l == label)
        .map(|(pos, _)| est.voxel_area(pos, label))
        .sum()
}

/// 一次遍历估计所有非背景标签的表面积.
///
/// 如果 `raw` 与 `labels` 形状不一致, 则程序 panic.
pub fn gradient_surface_areas(raw: &RawStack, labels: &LabelStack) -> BTreeMap<u32, f64> {
    let est = SurfaceEstimator::new(raw, labels);
    let mut areas = BTreeMap::new();
    for (pos, &l) in labels.data().indexed_iter() {
        if is_object(l) {
            *areas.entry(l).or_insert(0.0) += est.voxel_area(pos, l);
        }
    }
    areas
}

/// 球形度 `cbrt(36 π V²) / S`. 表面积不为正时返回 0.
pub fn sphericity(volume: f64, surface_area: f64) -> f64 {
    if surface_area > 0.0 {
        (36.0 * PI * volume * volume).cbrt() / surface_area
    } else {
        0.0
    }
}

/// 与给定体积相同的球的半径.
pub fn equivalent_spherical_radius(volume: f64) -> f64 {
    (3.0 * volume / (4.0 * PI)).cbrt()
}
