//! 染色中心分割: 局部对比度 + 自适应统计门限.

use super::{SegmentationParameters, SizeFilter};
use crate::consts::chromocenter::*;
use crate::consts::label::*;
use crate::data::histogram::IntensityHistogram;
use crate::ops::{gaussian_blur, label26, relabel};
use crate::{GridAttr, Idx3d, LabelStack, RawStack};
use log::{debug, info, warn};
use ndarray::{s, Array3, ArrayView3, Axis, Zip};
use std::collections::HashSet;

/// 细胞核物理体积超过经验值时, 放大邻域半径和对比度因子. 返回 `(neigh, factor)`.
fn adapt_contrast(neigh: f64, factor: f64, nucleus_volume: f64) -> (f64, f64) {
    if nucleus_volume > LARGE_NUCLEUS_VOLUME {
        (neigh * NEIGH_SCALE, factor + FACTOR_INCREMENT)
    } else {
        (neigh, factor)
    }
}

/// 三维前缀和表. 每个维度前补一层 0, 以便 `O(1)` 计算任意长方体内的和.
struct SummedVolume {
    table: Array3<f64>,
}

impl SummedVolume {
    fn new(values: ArrayView3<f64>) -> Self {
        let (lz, lh, lw) = values.dim();
        let mut table = Array3::<f64>::zeros((lz + 1, lh + 1, lw + 1));
        table.slice_mut(s![1.., 1.., 1..]).assign(&values);
        for axis in 0..3 {
            table.accumulate_axis_inplace(Axis(axis), |prev, cur| *cur += *prev);
        }
        Self { table }
    }

    /// 半开长方体 `[lo, hi)` 内的和.
    fn box_sum(&self, (z0, h0, w0): Idx3d, (z1, h1, w1): Idx3d) -> f64 {
        let t = &self.table;
        t[(z1, h1, w1)] - t[(z0, h1, w1)] - t[(z1, h0, w1)] - t[(z1, h1, w0)]
            + t[(z0, h0, w1)]
            + t[(z0, h1, w0)]
            + t[(z1, h0, w0)]
            - t[(z0, h0, w0)]
    }
}

/// 局部对比度.
///
/// 对细胞核内的每个体素 `v`, 计算 `I(v) - I(n)` 的平均值, 其中 `n` 取遍以 `v` 为中心,
/// 半径为 `radius` 的立方体窗口内所有位于细胞核内的其它体素.
/// 细胞核外的体素, 以及窗口内没有其它细胞核体素的体素, 结果为 0.
fn local_contrast(image: ArrayView3<f32>, nucleus: &LabelStack, radius: usize) -> Array3<f32> {
    let shape @ (lz, lh, lw) = nucleus.shape();
    let inside = nucleus.data().mapv(|l| if is_object(l) { 1.0 } else { 0.0 });
    let masked = Zip::from(&image)
        .and(&inside)
        .map_collect(|v, m| *v as f64 * *m);
    let sums = SummedVolume::new(masked.view());
    let counts = SummedVolume::new(inside.view());

    Array3::from_shape_fn(shape, |pos @ (z, h, w)| {
        if is_background(nucleus[pos]) {
            return 0.0;
        }
        let lo = (z.saturating_sub(radius), h.saturating_sub(radius), w.saturating_sub(radius));
        let hi = (
            (z + radius + 1).min(lz),
            (h + radius + 1).min(lh),
            (w + radius + 1).min(lw),
        );
        let others = counts.box_sum(lo, hi) - 1.0;
        if others < 0.5 {
            return 0.0;
        }
        let v = image[pos] as f64;
        let mean_others = (sums.box_sum(lo, hi) - v) / others;
        (v - mean_others) as f32
    })
}

/// 体积过滤: 删除物理体积位于 `filter` 之外的标签, 然后按扫描顺序重新编号.
pub(super) fn size_filter(labels: &LabelStack, filter: SizeFilter) -> LabelStack {
    let voxel = labels.voxel();
    let removed: HashSet<u32> = labels
        .histogram()
        .iter()
        .filter(|(l, c)| is_object(*l) && !filter.keeps(*c as f64 * voxel))
        .map(|(l, _)| l)
        .collect();
    if !removed.is_empty() {
        debug!("体积过滤删除了 {} 个标签", removed.len());
    }
    let kept = labels.data().mapv(|l| if removed.contains(&l) { BACKGROUND } else { l });
    relabel(&labels.with_data(kept)).0
}

/// 染色中心分割主流程. 调用方负责检查参数和形状.
pub(super) fn segment(
    raw: &RawStack,
    nucleus: &LabelStack,
    params: &SegmentationParameters,
) -> LabelStack {
    let empty = || nucleus.with_data(Array3::zeros(nucleus.shape()));
    let volume = nucleus.count_objects() as f64 * nucleus.voxel();
    if volume == 0.0 {
        warn!("细胞核掩膜为空");
        return empty();
    }

    let (neigh, factor) = adapt_contrast(params.neigh, params.factor, volume);
    let radius = neigh.floor() as usize;
    debug!("细胞核体积 {volume:.3}, 邻域半径 {radius}, 因子 {factor}");

    let image = if params.blur_raw {
        gaussian_blur(raw.data(), params.sigma)
    } else {
        raw.data().to_owned()
    };
    let contrast = gaussian_blur(
        local_contrast(image.view(), nucleus, radius).view(),
        params.sigma,
    );

    let stats: IntensityHistogram = contrast
        .iter()
        .zip(nucleus.data().iter())
        .filter(|(_, l)| is_object(**l))
        .map(|(g, _)| (*g).into())
        .collect();
    let std_dev = stats.std_dev_population();
    if std_dev == 0.0 {
        debug!("细胞核内局部对比度为常数, 没有染色中心");
        return empty();
    }
    let threshold = stats.mean() + factor * std_dev;

    let binary = Zip::from(&contrast)
        .and(nucleus.data())
        .map_collect(|g, l| {
            if is_object(*l) && *g as f64 >= threshold {
                FOREGROUND
            } else {
                BACKGROUND
            }
        });
    let (labels, n) = label26(&nucleus.with_data(binary));
    info!("门限 {threshold:.4} 下得到 {n} 个染色中心");

    match params.size_filter {
        Some(filter) => size_filter(&labels, filter),
        None => labels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::GaussianSigma;
    use crate::test_utils::{cube, paint_ball};
    use crate::Calibration;
    use approx::assert_abs_diff_eq;

    /// 半径 8 的细胞核 (强度 50) 内有两个半径 2 的亮斑 (强度 200).
    fn phantom(cal: Calibration) -> (RawStack, LabelStack) {
        let shape = (25, 25, 25);
        let mut raw = Array3::from_elem(shape, 10.0f32);
        let mut mask = Array3::<u32>::zeros(shape);
        paint_ball(&mut raw, [12.0, 12.0, 12.0], 8.0, 50.0);
        paint_ball(&mut mask, [12.0, 12.0, 12.0], 8.0, FOREGROUND);
        paint_ball(&mut raw, [12.0, 12.0, 8.0], 2.0, 200.0);
        paint_ball(&mut raw, [12.0, 12.0, 16.0], 2.0, 200.0);
        (
            RawStack::new(raw, cal).unwrap(),
            LabelStack::new(mask, cal).unwrap(),
        )
    }

    fn params() -> SegmentationParameters {
        SegmentationParameters::default()
            .with_contrast(2.0, 1.5)
            .with_sigma(GaussianSigma::default())
    }

    #[test]
    fn test_adapt_contrast() {
        assert_eq!(adapt_contrast(3.0, 1.5, 50.0), (3.0, 1.5));
        assert_eq!(adapt_contrast(3.0, 1.5, 50.1), (7.5, 2.5));
    }

    #[test]
    fn test_summed_volume() {
        let values = Array3::from_shape_fn((3, 4, 5), |(z, h, w)| (z * 20 + h * 5 + w) as f64);
        let sv = SummedVolume::new(values.view());
        assert_eq!(sv.box_sum((0, 0, 0), (3, 4, 5)), values.sum());
        let expect = values.slice(s![1..3, 1..2, 2..5]).sum();
        assert_eq!(sv.box_sum((1, 1, 2), (3, 2, 5)), expect);
    }

    #[test]
    fn test_local_contrast_ignores_outside() {
        let mut data = Array3::<u32>::zeros((1, 1, 4));
        data[(0, 0, 1)] = FOREGROUND;
        data[(0, 0, 2)] = FOREGROUND;
        let mask = LabelStack::new(data, Calibration::unit()).unwrap();
        let image = Array3::from_shape_vec((1, 1, 4), vec![1000.0f32, 4.0, 1.0, 1000.0]).unwrap();
        let g = local_contrast(image.view(), &mask, 1);
        assert_eq!(g.iter().copied().collect::<Vec<_>>(), vec![0.0, 3.0, -3.0, 0.0]);
    }

    #[test]
    fn test_two_chromocenters() {
        simple_logger::init_with_level(log::Level::Debug).ok();
        let (raw, mask) = phantom(Calibration::new(0.2, 0.2, 0.2).unwrap());
        let labels = segment(&raw, &mask, &params());

        assert_eq!(labels.histogram().object_labels().count(), 2);
        assert_eq!(labels[(12, 12, 8)], 1);
        assert_eq!(labels[(12, 12, 16)], 2);
        assert_eq!(labels.count(1), 33);
        assert_eq!(labels.count(2), 33);
        assert_eq!(labels[(12, 12, 12)], BACKGROUND);
    }

    #[test]
    fn test_large_nucleus_still_separates() {
        // 单位分辨率下细胞核体积超过 50, 触发自适应放大.
        let (raw, mask) = phantom(Calibration::unit());
        let p = params().with_blur_raw(true);
        let labels = segment(&raw, &mask, &p);
        assert_eq!(labels.histogram().object_labels().count(), 2);
    }

    #[test]
    fn test_uniform_nucleus_has_none() {
        let mask = cube((9, 9, 9), (2, 2, 2), 5);
        let raw = mask.with_data(mask.data().mapv(|l| l as f32 * 80.0));
        let labels = segment(&raw, &mask, &params());
        assert_eq!(labels.count_objects(), 0);
    }

    #[test]
    fn test_size_filter_is_inclusive() {
        let mut data = Array3::<u32>::zeros((5, 5, 5));
        for w in 0..4 {
            data[(0, 0, w)] = 3;
        }
        for w in 0..3 {
            data[(4, 4, w)] = 9;
        }
        let labels = LabelStack::new(data, Calibration::unit()).unwrap();
        let filtered = size_filter(&labels, SizeFilter { min: 4.0, max: 10.0 });
        assert_eq!(filtered.count(1), 4);
        assert_eq!(filtered.count_objects(), 4);
        assert_eq!(filtered[(4, 4, 0)], BACKGROUND);

        let all = size_filter(&labels, SizeFilter { min: 0.0, max: 4.0 });
        assert_eq!(all.count(1), 4);
        assert_eq!(all.count(2), 3);
        assert_abs_diff_eq!(all.count_objects() as f64 * all.voxel(), 7.0);
    }
}
