//! 以 3x3x3 立方体为结构元的平坦形态学.
//!
//! 立方体结构元可以按轴分解, 因此每一步都是三次一维 min/max 滤波.
//! 网格外的体素不参与计算.

use crate::LabelStack;
use ndarray::{Array3, Axis};

fn extremum_axis(data: &mut Array3<u32>, axis: usize, pick: fn(u32, u32) -> u32) {
    let mut buf: Vec<u32> = Vec::new();
    for mut lane in data.lanes_mut(Axis(axis)) {
        buf.clear();
        buf.extend(lane.iter().copied());
        let n = buf.len();
        for (i, out) in lane.iter_mut().enumerate() {
            let lo = i.saturating_sub(1);
            let hi = (i + 1).min(n - 1);
            *out = buf[lo..=hi].iter().copied().fold(buf[i], pick);
        }
    }
}

fn filter(mask: &LabelStack, pick: fn(u32, u32) -> u32) -> LabelStack {
    let mut data = mask.data().to_owned();
    for axis in 0..3 {
        extremum_axis(&mut data, axis, pick);
    }
    mask.with_data(data)
}

/// 腐蚀 (3x3x3 最小值滤波).
pub fn erode(mask: &LabelStack) -> LabelStack {
    filter(mask, u32::min)
}

/// 膨胀 (3x3x3 最大值滤波).
pub fn dilate(mask: &LabelStack) -> LabelStack {
    filter(mask, u32::max)
}

/// 开运算: 先腐蚀再膨胀.
pub fn opening(mask: &LabelStack) -> LabelStack {
    dilate(&erode(mask))
}

/// 闭运算: 先膨胀再腐蚀.
pub fn closing(mask: &LabelStack) -> LabelStack {
    erode(&dilate(mask))
}
