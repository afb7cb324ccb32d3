use crate::data::histogram::{HistKey, IntensityHistogram};

/// Otsu 全局门限.
///
/// 在直方图的键上寻找使类间方差最大的划分, 返回低类的最大键
/// (即低类为 `value <= threshold`). 方差相同时取较小的键.
/// 空直方图返回 0, 只有一个键时返回该键.
pub fn otsu_threshold(hist: &IntensityHistogram) -> f64 {
    let Some(first) = hist.min() else {
        return 0.0;
    };
    let total = hist.total() as f64;
    let sum_total = hist.sum();

    let mut weight_low = 0.0;
    let mut sum_low = 0.0;
    let mut max_variance = -1.0;
    let mut threshold = first.to_f64();

    for (key, count) in hist.iter() {
        let key = key.to_f64();
        weight_low += count as f64;
        let weight_high = total - weight_low;
        if weight_high <= 0.0 {
            break;
        }
        sum_low += key * count as f64;

        let mean_low = sum_low / weight_low;
        let mean_high = (sum_total - sum_low) / weight_high;

        // 类间方差
        let variance = weight_low * weight_high * (mean_low - mean_high).powi(2);
        if variance > max_variance {
            max_variance = variance;
            threshold = key;
        }
    }
    threshold
}
