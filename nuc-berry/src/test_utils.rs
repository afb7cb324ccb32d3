//! 单元测试共用的合成数据.

use crate::consts::label::*;
use crate::{Calibration, Idx3d, LabelStack, RawStack};
use ndarray::Array3;

#[inline]
fn dist((z, h, w): Idx3d, [cz, ch, cw]: [f64; 3]) -> f64 {
    ((z as f64 - cz).powi(2) + (h as f64 - ch).powi(2) + (w as f64 - cw).powi(2)).sqrt()
}

/// 单位分辨率网格中, 从 `origin` 开始边长为 `side` 的前景立方体.
pub(crate) fn cube(shape: Idx3d, (z0, h0, w0): Idx3d, side: usize) -> LabelStack {
    let within = |v: usize, v0: usize| v >= v0 && v < v0 + side;
    let data = Array3::from_shape_fn(shape, |(z, h, w)| {
        if within(z, z0) && within(h, h0) && within(w, w0) {
            FOREGROUND
        } else {
            BACKGROUND
        }
    });
    LabelStack::new(data, Calibration::unit()).unwrap()
}

/// 单位分辨率网格中, 以 `center` (体素坐标 `[z, h, w]`) 为球心, 半径为 `radius` 的前景球.
pub(crate) fn ball(shape: Idx3d, center: [f64; 3], radius: f64) -> LabelStack {
    let data = Array3::from_shape_fn(shape, |p| {
        if dist(p, center) <= radius {
            FOREGROUND
        } else {
            BACKGROUND
        }
    });
    LabelStack::new(data, Calibration::unit()).unwrap()
}

/// 球内强度为 `inside`, 球外强度为 `outside` 的原始图像.
pub(crate) fn ball_raw(
    shape: Idx3d,
    center: [f64; 3],
    radius: f64,
    inside: f32,
    outside: f32,
) -> RawStack {
    let data = Array3::from_shape_fn(shape, |p| {
        if dist(p, center) <= radius {
            inside
        } else {
            outside
        }
    });
    RawStack::new(data, Calibration::unit()).unwrap()
}

/// 强度随半径平滑下降 (logistic 轮廓) 的球, 球面处强度为 `peak / 2`.
pub(crate) fn smooth_ball_raw(shape: Idx3d, center: [f64; 3], radius: f64, peak: f32) -> RawStack {
    let data = Array3::from_shape_fn(shape, |p| {
        let t = dist(p, center) - radius;
        peak / (1.0 + t.exp() as f32)
    });
    RawStack::new(data, Calibration::unit()).unwrap()
}

/// 在 `grid` 中以 `value` 绘制一个实心球, 已有的值被覆盖.
pub(crate) fn paint_ball<T: Copy>(grid: &mut Array3<T>, center: [f64; 3], radius: f64, value: T) {
    grid.indexed_iter_mut()
        .filter(|(p, _)| dist(*p, center) <= radius)
        .for_each(|(_, v)| *v = value);
}
