//! 强度统计.

use crate::consts::label::is_object;
use crate::data::histogram::IntensityHistogram;
use crate::{LabelStack, RawStack};
use ordered_float::OrderedFloat;
use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 一组体素的强度统计量. 没有任何体素时所有字段为 0.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IntensityStats {
    /// 平均值.
    pub mean: f64,
    /// 样本标准差 (分母为 `n - 1`). 少于两个体素时为 0.
    pub std_dev: f64,
    /// 最小值.
    pub min: f64,
    /// 最大值.
    pub max: f64,
    /// 中位数: 按升序累加计数, 第一个使累计数超过总数一半的值.
    pub median: f64,
}

impl IntensityStats {
    /// 由有序直方图计算统计量.
    pub fn from_histogram(hist: &IntensityHistogram) -> Self {
        let as_f64 = |k: Option<OrderedFloat<f32>>| k.map_or(0.0, |v| v.into_inner() as f64);
        Self {
            mean: hist.mean(),
            std_dev: hist.std_dev_sample(),
            min: as_f64(hist.min()),
            max: as_f64(hist.max()),
            median: hist.median(),
        }
    }
}

/// 一次遍历构建每个非背景标签上的强度直方图.
pub(crate) fn label_histograms(
    labels: &LabelStack,
    raw: &RawStack,
) -> BTreeMap<u32, IntensityHistogram> {
    let mut ans: BTreeMap<u32, IntensityHistogram> = BTreeMap::new();
    for (l, v) in labels.data().iter().zip(raw.data().iter()) {
        if is_object(*l) {
            ans.entry(*l).or_default().push(OrderedFloat(*v));
        }
    }
    ans
}

/// `num / den`. 分母为零时返回 0.
#[inline]
pub(crate) fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_stats() {
        let h = IntensityHistogram::from_values([2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        let s = IntensityStats::from_histogram(&h);
        assert_abs_diff_eq!(s.mean, 5.0);
        assert_abs_diff_eq!(s.std_dev, (32.0f64 / 7.0).sqrt(), epsilon = 1e-12);
        assert_eq!((s.min, s.max), (2.0, 9.0));
        assert_eq!(s.median, 5.0);
    }

    #[test]
    fn test_degenerate_stats() {
        assert_eq!(
            IntensityStats::from_histogram(&IntensityHistogram::new()),
            IntensityStats::default()
        );
        let one = IntensityStats::from_histogram(&IntensityHistogram::from_values([3.0]));
        assert_eq!(one.std_dev, 0.0);
        assert_eq!(one.median, 3.0);
        assert_eq!(ratio(1.0, 0.0), 0.0);
    }
}
