//! 门限扫描式细胞核边界搜索.

use super::convex_hull::convex_hull_mask;
use super::SegmentationParameters;
use crate::consts::boundary::*;
use crate::consts::label::*;
use crate::ops::{closing, gradient_surface_area, label26, opening, otsu_threshold, sphericity};
use crate::{GridAttr, LabelStack, RawStack};
use log::{debug, info, warn};
use std::ops::RangeInclusive;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 边界搜索的结果.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoundaryOutcome {
    /// 最佳门限. 没有任何候选满足约束时为 `-1`.
    pub best_threshold: i64,

    /// 整幅图像的 Otsu 门限.
    pub otsu_threshold: f64,

    /// 最佳候选的球形度. 未找到时为 0.
    pub sphericity: f64,

    /// 经过形态学修正和孔洞填充的细胞核掩膜.
    pub mask: Option<LabelStack>,

    /// 凸包正则化后的掩膜. 仅当参数要求时生成.
    pub convex_hull_mask: Option<LabelStack>,

    /// 掩膜是否接触网格的任意一个外表面?
    pub bad_crop: bool,
}

impl BoundaryOutcome {
    /// 是否找到了细胞核?
    #[inline]
    pub fn is_found(&self) -> bool {
        self.best_threshold != NO_THRESHOLD
    }

    fn not_found(otsu_threshold: f64) -> Self {
        Self {
            best_threshold: NO_THRESHOLD,
            otsu_threshold,
            sphericity: 0.0,
            mask: None,
            convex_hull_mask: None,
            bad_crop: false,
        }
    }
}

/// 单个门限下的候选对象.
#[derive(Debug, Clone)]
struct Candidate {
    threshold: i64,
    mask: LabelStack,
    volume: f64,
    sphericity: f64,
}

/// 在两个候选中保留球形度较大者, 相同时保留门限较小者.
fn pick_better(a: Candidate, b: Candidate) -> Candidate {
    if b.sphericity > a.sphericity || (b.sphericity == a.sphericity && b.threshold < a.threshold) {
        b
    } else {
        a
    }
}

/// 门限扫描范围 `[max(t0 - 2σ, 6), t0 + σ/2]` 内的所有整数.
fn threshold_range(otsu: f64, std_dev: f64) -> RangeInclusive<i64> {
    let start = (otsu - 2.0 * std_dev).max(MIN_THRESHOLD).ceil() as i64;
    let end = (otsu + std_dev / 2.0).floor() as i64;
    start..=end
}

/// 评估门限 `t`. 候选不满足任一约束时返回 `None`.
fn evaluate(raw: &RawStack, t: i64, params: &SegmentationParameters) -> Option<Candidate> {
    let (labels, n) = label26(&raw.binarize(t as f64));
    if n == 0 {
        return None;
    }
    let label = labels.histogram().mode_label()?;
    let mask = labels.mask_where(|l| l == label);
    let count = mask.count(FOREGROUND);

    if count as f64 / raw.size() as f64 >= MAX_VOLUME_RATIO {
        return None;
    }
    let volume = count as f64 * raw.voxel();
    if volume < params.min_volume || volume > params.max_volume {
        return None;
    }
    let last = mask.len_z() - 1;
    if mask.count_objects_at(0) >= BORDER_SLICE_LIMIT
        || mask.count_objects_at(last) >= BORDER_SLICE_LIMIT
    {
        return None;
    }

    let s = sphericity(volume, gradient_surface_area(raw, &mask, FOREGROUND));
    debug!("门限 {t}: 体积 {volume:.3}, 球形度 {s:.4}");
    Some(Candidate {
        threshold: t,
        mask,
        volume,
        sphericity: s,
    })
}

#[cfg_attr(all(feature = "rayon", not(test)), allow(dead_code))]
fn sweep_sequential(
    raw: &RawStack,
    range: RangeInclusive<i64>,
    params: &SegmentationParameters,
) -> Option<Candidate> {
    range
        .filter_map(|t| evaluate(raw, t, params))
        .reduce(pick_better)
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IntoParallelIterator, ParallelIterator};

        /// 借助 `rayon` 并行评估所有门限. 归约规则与串行版本一致, 结果相同.
        fn sweep(
            raw: &RawStack,
            range: RangeInclusive<i64>,
            params: &SegmentationParameters,
        ) -> Option<Candidate> {
            range
                .into_par_iter()
                .filter_map(|t| evaluate(raw, t, params))
                .reduce_with(pick_better)
        }

        fn fill_holes(mask: &mut LabelStack) -> bool {
            mask.par_fill_holes_2d()
        }
    } else {
        fn sweep(
            raw: &RawStack,
            range: RangeInclusive<i64>,
            params: &SegmentationParameters,
        ) -> Option<Candidate> {
            sweep_sequential(raw, range, params)
        }

        fn fill_holes(mask: &mut LabelStack) -> bool {
            mask.fill_holes_2d()
        }
    }
}

/// 边界搜索主流程. 调用方负责检查参数.
pub(super) fn search(raw: &RawStack, params: &SegmentationParameters) -> BoundaryOutcome {
    let hist = raw.histogram();
    let otsu = otsu_threshold(&hist);
    let std_dev = hist.std_dev_population();
    let range = threshold_range(otsu, std_dev);
    debug!("Otsu 门限 {otsu}, 标准差 {std_dev:.3}, 扫描范围 {range:?}");

    let Some(best) = sweep(raw, range, params) else {
        warn!("没有任何门限满足体积和边缘约束");
        return BoundaryOutcome::not_found(otsu);
    };
    info!(
        "最佳门限 {}, 体积 {:.3}, 球形度 {:.4}",
        best.threshold, best.volume, best.sphericity
    );

    let mut mask = closing(&opening(&best.mask));
    if fill_holes(&mut mask) {
        debug!("逐切片填充了孔洞");
    }
    let bad_crop = mask.touches_border();
    if bad_crop {
        warn!("细胞核接触图像边缘");
    }
    let convex_hull_mask = params.convex_hull.then(|| convex_hull_mask(&mask));

    BoundaryOutcome {
        best_threshold: best.threshold,
        otsu_threshold: otsu,
        sphericity: best.sphericity,
        mask: Some(mask),
        convex_hull_mask,
        bad_crop,
    }
}
