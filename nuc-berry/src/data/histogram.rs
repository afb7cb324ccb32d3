//! 有序直方图.
//!
//! 键按升序迭代. 中位数等统计量依赖这一顺序.

use ordered_float::OrderedFloat;
use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 可作为直方图键的类型.
pub trait HistKey: Copy + Ord {
    /// 转换为用于统计计算的 `f64`.
    fn to_f64(self) -> f64;
}

impl HistKey for u32 {
    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }
}

impl HistKey for OrderedFloat<f32> {
    #[inline]
    fn to_f64(self) -> f64 {
        self.into_inner() as f64
    }
}

/// 键 -> 体素个数的有序映射.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Histogram<K: Ord> {
    bins: BTreeMap<K, u64>,
    total: u64,
}

/// 以标签值为键的直方图.
pub type LabelHistogram = Histogram<u32>;

/// 以原始强度为键的直方图.
pub type IntensityHistogram = Histogram<OrderedFloat<f32>>;

impl<K: HistKey> Histogram<K> {
    /// 创建空直方图.
    #[inline]
    pub fn new() -> Self {
        Self {
            bins: BTreeMap::new(),
            total: 0,
        }
    }

    /// 记录一个值.
    #[inline]
    pub fn push(&mut self, key: K) {
        self.push_n(key, 1);
    }

    /// 记录 `n` 个相同的值.
    pub fn push_n(&mut self, key: K, n: u64) {
        if n == 0 {
            return;
        }
        *self.bins.entry(key).or_insert(0) += n;
        self.total += n;
    }

    /// 记录的值的总个数.
    #[inline]
    pub fn total(&self) -> u64 {
        self.total
    }

    /// 是否没有记录任何值.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// 不同键的个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    /// 键 `key` 的计数.
    #[inline]
    pub fn count(&self, key: K) -> u64 {
        self.bins.get(&key).copied().unwrap_or(0)
    }

    /// 按键升序迭代 `(键, 计数)`.
    #[inline]
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (K, u64)> + '_ {
        self.bins.iter().map(|(k, c)| (*k, *c))
    }

    /// 最小键.
    #[inline]
    pub fn min(&self) -> Option<K> {
        self.bins.keys().next().copied()
    }

    /// 最大键.
    #[inline]
    pub fn max(&self) -> Option<K> {
        self.bins.keys().next_back().copied()
    }

    /// 所有值之和.
    pub fn sum(&self) -> f64 {
        self.iter().map(|(k, c)| k.to_f64() * c as f64).sum()
    }

    /// 平均值. 空直方图返回 0.
    pub fn mean(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        self.sum() / self.total as f64
    }

    /// 平方偏差之和 `Σ c·(k - mean)²`, 覆盖所有桶.
    fn squared_deviation(&self) -> f64 {
        let mean = self.mean();
        self.iter()
            .map(|(k, c)| c as f64 * (k.to_f64() - mean).powi(2))
            .sum()
    }

    /// 总体标准差. 空直方图返回 0.
    pub fn std_dev_population(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        (self.squared_deviation() / self.total as f64).sqrt()
    }

    /// 样本标准差 (分母为 `n - 1`). 少于两个值时返回 0.
    pub fn std_dev_sample(&self) -> f64 {
        if self.total < 2 {
            return 0.0;
        }
        (self.squared_deviation() / (self.total - 1) as f64).sqrt()
    }

    /// 中位数: 按升序累加计数, 返回第一个使累计数超过总数一半的键.
    /// 空直方图返回 0.
    pub fn median(&self) -> f64 {
        let half = self.total as f64 / 2.0;
        let mut acc = 0u64;
        for (k, c) in self.iter() {
            acc += c;
            if acc as f64 > half {
                return k.to_f64();
            }
        }
        0.0
    }
}

impl<K: HistKey> FromIterator<K> for Histogram<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut ans = Self::new();
        for k in iter {
            ans.push(k);
        }
        ans
    }
}

impl LabelHistogram {
    /// 所有非背景标签的体素总数.
    pub fn positive_count(&self) -> u64 {
        self.iter().filter(|(k, _)| *k > 0).map(|(_, c)| c).sum()
    }

    /// 体素数最多的非背景标签. 计数相同时取升序迭代中最后一个.
    /// 没有非背景标签时返回 `None`.
    pub fn mode_label(&self) -> Option<u32> {
        let mut best: Option<(u32, u64)> = None;
        for (k, c) in self.iter().filter(|(k, _)| *k > 0) {
            if best.map_or(true, |(_, bc)| c >= bc) {
                best = Some((k, c));
            }
        }
        best.map(|(k, _)| k)
    }

    /// 第一个计数为正的非背景标签及其计数.
    #[inline]
    pub fn first_positive(&self) -> Option<(u32, u64)> {
        self.iter().find(|(k, c)| *k > 0 && *c > 0)
    }

    /// 所有非背景标签, 升序.
    #[inline]
    pub fn object_labels(&self) -> impl Iterator<Item = u32> + '_ {
        self.bins.keys().copied().filter(|k| *k > 0)
    }
}

impl IntensityHistogram {
    /// 由强度值迭代器直接构建.
    #[inline]
    pub fn from_values<I: IntoIterator<Item = f32>>(it: I) -> Self {
        it.into_iter().map(OrderedFloat).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{IntensityHistogram, LabelHistogram};
    use approx::assert_relative_eq;

    #[test]
    fn test_median_three_values() {
        let h = IntensityHistogram::from_values([10.0, 20.0, 30.0]);
        assert_relative_eq!(h.median(), 20.0);
    }

    #[test]
    fn test_median_even_count() {
        // 累计数必须严格超过一半.
        let h = IntensityHistogram::from_values([1.0, 2.0, 3.0, 4.0]);
        assert_relative_eq!(h.median(), 3.0);
        assert_relative_eq!(IntensityHistogram::new().median(), 0.0);
    }

    #[test]
    fn test_std_dev_uses_every_bin() {
        let h = IntensityHistogram::from_values([2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_relative_eq!(h.mean(), 5.0);
        assert_relative_eq!(h.std_dev_population(), 2.0);
        assert_relative_eq!(h.std_dev_sample(), (32.0f64 / 7.0).sqrt());

        let one = IntensityHistogram::from_values([3.0]);
        assert_relative_eq!(one.std_dev_sample(), 0.0);
    }

    #[test]
    fn test_ascending_order_and_extremes() {
        let h = IntensityHistogram::from_values([7.0, -1.0, 3.0, 3.0]);
        let keys: Vec<f32> = h.iter().map(|(k, _)| k.into_inner()).collect();
        assert_eq!(keys, vec![-1.0, 3.0, 7.0]);
        assert_eq!(h.min().map(|k| k.into_inner()), Some(-1.0));
        assert_eq!(h.max().map(|k| k.into_inner()), Some(7.0));
        assert_eq!(h.total(), 4);
    }

    #[test]
    fn test_mode_label_ties_keep_last() {
        let h: LabelHistogram = [0, 0, 0, 0, 1, 1, 2, 2, 3].into_iter().collect();
        assert_eq!(h.mode_label(), Some(2));
        assert_eq!(h.positive_count(), 5);
        assert_eq!(h.first_positive(), Some((1, 2)));

        let bg: LabelHistogram = [0, 0].into_iter().collect();
        assert_eq!(bg.mode_label(), None);
    }
}
