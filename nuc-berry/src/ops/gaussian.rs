use crate::{SegError, SegResult};
use ndarray::{Array3, ArrayView3, Axis};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 各轴高斯平滑的标准差, 以体素为单位. 某一轴为 0 时该轴不做平滑.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GaussianSigma {
    /// 宽方向 (物理 x 轴).
    pub x: f64,
    /// 高方向 (物理 y 轴).
    pub y: f64,
    /// 切片方向.
    pub z: f64,
}

impl GaussianSigma {
    /// 三个轴相同的标准差.
    pub const fn uniform(sigma: f64) -> Self {
        Self {
            x: sigma,
            y: sigma,
            z: sigma,
        }
    }

    /// 检查三个分量都非负且有限.
    pub fn validate(&self) -> SegResult<()> {
        for (name, s) in [("sigma.x", self.x), ("sigma.y", self.y), ("sigma.z", self.z)] {
            if !s.is_finite() || s < 0.0 {
                return Err(SegError::InvalidParameter(name, s));
            }
        }
        Ok(())
    }

    /// 按存储轴顺序 `(z, h, w)` 排列.
    #[inline]
    fn by_axis(&self) -> [f64; 3] {
        [self.z, self.y, self.x]
    }
}

/// 离散化的归一化高斯核, 半径为 `ceil(3σ)`.
fn kernel(sigma: f64) -> Vec<f64> {
    let radius = ((3.0 * sigma).ceil() as usize).max(1);
    let denom = 2.0 * sigma * sigma;
    let mut k: Vec<f64> = (0..=2 * radius)
        .map(|i| {
            let x = i as f64 - radius as f64;
            (-x * x / denom).exp()
        })
        .collect();
    let sum: f64 = k.iter().sum();
    k.iter_mut().for_each(|v| *v /= sum);
    k
}

/// 沿单个轴做一维卷积, 边界处复制边缘值.
fn blur_axis(data: &mut Array3<f32>, axis: usize, sigma: f64) {
    let k = kernel(sigma);
    let radius = (k.len() / 2) as isize;
    let mut buf: Vec<f32> = Vec::new();

    for mut lane in data.lanes_mut(Axis(axis)) {
        buf.clear();
        buf.extend(lane.iter().copied());
        let last = buf.len() as isize - 1;
        for (i, out) in lane.iter_mut().enumerate() {
            let acc: f64 = k
                .iter()
                .enumerate()
                .map(|(j, w)| {
                    let src = (i as isize + j as isize - radius).clamp(0, last);
                    w * buf[src as usize] as f64
                })
                .sum();
            *out = acc as f32;
        }
    }
}

/// 可分离的三维高斯平滑.
///
/// 标准差以体素为单位, 与体素物理分辨率无关. 结果形状与输入一致.
pub fn gaussian_blur(data: ArrayView3<'_, f32>, sigma: GaussianSigma) -> Array3<f32> {
    let mut out = data.to_owned();
    for (axis, s) in sigma.by_axis().into_iter().enumerate() {
        if s > 0.0 {
            blur_axis(&mut out, axis, s);
        }
    }
    out
}
