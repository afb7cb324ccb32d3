//! 形态学测量.
//!
//! 所有测量值都以标定后的物理单位给出. 体素数为零等退化情况下,
//! 需要除以体素数的统计量以及没有定义的形状比值都返回 0.

mod intensity;
pub mod radial;
mod shape;

pub use intensity::IntensityStats;

use crate::consts::label::*;
use crate::ops::{equivalent_spherical_radius, gradient_surface_areas, sphericity};
use crate::{GridAttr, Idx3d, LabelStack, RawStack, SegResult};
use intensity::{label_histograms, ratio};
use log::{debug, warn};
use shape::{centroids, flatness_elongation, second_moments, sorted_eigenvalues};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 单个对象 (一个标签) 的测量结果.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ObjectDescriptor {
    /// 标签值.
    pub label: u32,

    /// 体素个数.
    pub voxel_count: u64,

    /// 物理体积.
    pub volume: f64,

    /// 体素质心 `(z, h, w)`, 每个分量都已截断取整.
    pub barycenter_voxel: Idx3d,

    /// 体素质心的物理坐标 `[z, h, w]`.
    pub barycenter: [f64; 3],

    /// 扁平度 `sqrt(λ_mid / λ_min)`.
    pub flatness: f64,

    /// 伸长度 `sqrt(λ_max / λ_mid)`.
    pub elongation: f64,

    /// 表面积.
    pub surface_area: f64,

    /// 球形度.
    pub sphericity: f64,

    /// 等效球半径.
    pub equivalent_spherical_radius: f64,

    /// 对象内的原始强度统计.
    pub intensity: IntensityStats,
}

/// 测量标签网格 `labels` 中的每个非背景标签, 按标签值升序返回.
///
/// `labels` 与 `raw` 形状不一致时返回 `Err(SegError::ShapeMismatch)`.
pub fn measure(labels: &LabelStack, raw: &RawStack) -> SegResult<Vec<ObjectDescriptor>> {
    labels.check_same_shape(raw)?;
    let voxel = labels.voxel();

    let centroids = centroids(labels);
    let moments = second_moments(labels, &centroids);
    let histograms = label_histograms(labels, raw);
    let areas = gradient_surface_areas(raw, labels);
    debug!("测量 {} 个对象", centroids.len());

    let ans = centroids
        .iter()
        .map(|(&label, c)| {
            let volume = c.count as f64 * voxel;
            let surface_area = areas.get(&label).copied().unwrap_or(0.0);
            let (flatness, elongation) = moments
                .get(&label)
                .map_or((0.0, 0.0), |m| flatness_elongation(sorted_eigenvalues(*m)));
            let intensity = histograms
                .get(&label)
                .map(IntensityStats::from_histogram)
                .unwrap_or_default();
            ObjectDescriptor {
                label,
                voxel_count: c.count,
                volume,
                barycenter_voxel: c.barycenter,
                barycenter: labels.to_physical(c.barycenter),
                flatness,
                elongation,
                surface_area,
                sphericity: sphericity(volume, surface_area),
                equivalent_spherical_radius: equivalent_spherical_radius(volume),
                intensity,
            }
        })
        .collect();
    Ok(ans)
}

/// 所有非背景体素的总物理体积.
pub fn volume_of_all_objects(labels: &LabelStack) -> f64 {
    labels.count_objects() as f64 * labels.voxel()
}

/// 细胞核的物理体积: 掩膜中第一个计数为正的非背景标签的体积.
/// 掩膜中没有对象时返回 0.
pub fn nucleus_volume(mask: &LabelStack) -> f64 {
    mask.histogram()
        .first_positive()
        .map_or(0.0, |(_, c)| c as f64 * mask.voxel())
}

/// 相对异染色质比例 `Σ 染色中心体积 / 细胞核体积`. 细胞核体积为 0 时返回 0.
pub fn relative_heterochromatin_fraction<I>(nucleus_volume: f64, chromocenter_volumes: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    ratio(chromocenter_volumes.into_iter().sum(), nucleus_volume)
}

/// 单个细胞核及其染色中心的测量报告.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NucleusMeasurement {
    /// 细胞核 (掩膜中第一个非背景标签) 的测量结果.
    pub nucleus: ObjectDescriptor,

    /// 每个染色中心的测量结果, 按标签升序.
    pub chromocenters: Vec<ObjectDescriptor>,

    /// 染色中心个数.
    pub chromocenter_count: usize,

    /// 染色中心总体积.
    pub chromocenter_volume: f64,

    /// 按体积计算的相对异染色质比例.
    pub rhf_volume: f64,

    /// 按强度计算的相对异染色质比例: 染色中心强度之和 / 细胞核强度之和.
    pub rhf_intensity: f64,

    /// 每个染色中心的平均强度除以细胞核平均强度, 与 `chromocenters` 一一对应.
    pub normalized_intensities: Vec<f64>,

    /// 整幅图像的强度中位数.
    pub image_median: f64,

    /// 细胞核 (掩膜中值为 `FOREGROUND` 的体素) 内的强度统计.
    pub nucleus_intensity: IntensityStats,

    /// 背景 (掩膜中其余体素) 的强度统计.
    pub background_intensity: IntensityStats,
}

/// 测量细胞核掩膜 `mask` 与染色中心标签 `chromocenters`.
///
/// 三个网格形状不一致时返回 `Err(SegError::ShapeMismatch)`.
pub fn measure_nucleus(
    mask: &LabelStack,
    chromocenters: &LabelStack,
    raw: &RawStack,
) -> SegResult<NucleusMeasurement> {
    raw.check_same_shape(mask)?;
    raw.check_same_shape(chromocenters)?;

    let nucleus = match measure(mask, raw)?.into_iter().next() {
        Some(d) => d,
        None => {
            warn!("细胞核掩膜为空");
            ObjectDescriptor::default()
        }
    };
    let objects = measure(chromocenters, raw)?;

    let nucleus_hist = raw.histogram_where(mask, |l| l == FOREGROUND);
    let background_hist = raw.histogram_where(mask, |l| l != FOREGROUND);
    let chromocenter_hist = raw.histogram_where(chromocenters, is_object);

    let nucleus_intensity = IntensityStats::from_histogram(&nucleus_hist);
    let normalized_intensities = objects
        .iter()
        .map(|c| ratio(c.intensity.mean, nucleus_intensity.mean))
        .collect();

    Ok(NucleusMeasurement {
        chromocenter_count: objects.len(),
        chromocenter_volume: volume_of_all_objects(chromocenters),
        rhf_volume: relative_heterochromatin_fraction(
            nucleus_volume(mask),
            objects.iter().map(|c| c.volume),
        ),
        rhf_intensity: ratio(chromocenter_hist.sum(), nucleus_hist.sum()),
        normalized_intensities,
        image_median: raw.histogram().median(),
        nucleus_intensity,
        background_intensity: IntensityStats::from_histogram(&background_hist),
        nucleus,
        chromocenters: objects,
    })
}
