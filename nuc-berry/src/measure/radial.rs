//! 染色中心到细胞核边界的径向距离.

use super::shape::centroids;
use crate::consts::label::is_object;
use crate::ops::{distance_transform, isotropic_depth, resample_z};
use crate::{GridAttr, LabelStack, SegResult};
use log::debug;
use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 单个染色中心的径向距离 (物理单位).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RadialDistanceRecord {
    /// 染色中心标签.
    pub label: u32,

    /// 染色中心内离细胞核边界最近的体素到边界的距离.
    pub border_to_border: f64,

    /// 染色中心质心到细胞核边界的距离.
    pub barycenter_to_border: f64,
}

/// 计算每个染色中心到细胞核边界的径向距离, 按标签升序返回.
///
/// 两个网格先沿 `z` 方向最近邻重采样为边长 `dx` 的立方体素 (假设 `dx == dy`),
/// 然后对细胞核掩膜做欧氏距离变换. 网格外部视为背景.
/// 质心在重采样后的标签网格上计算并截断到体素.
///
/// 两个网格形状不一致时返回 `Err(SegError::ShapeMismatch)`.
pub fn compute_radial_distances(
    nucleus: &LabelStack,
    labels: &LabelStack,
) -> SegResult<Vec<RadialDistanceRecord>> {
    nucleus.check_same_shape(labels)?;
    let depth = isotropic_depth(nucleus)?;
    debug!("径向距离: z 方向重采样 {} -> {depth}", nucleus.len_z());

    let nucleus_iso = resample_z(nucleus, depth);
    let labels_iso = resample_z(labels, depth);
    let distance = distance_transform(&nucleus_iso);
    let dx = nucleus.calibration().x();

    let mut nearest: BTreeMap<u32, f32> = BTreeMap::new();
    for (l, d) in labels_iso.data().iter().zip(distance.iter()) {
        if is_object(*l) {
            let v = nearest.entry(*l).or_insert(f32::INFINITY);
            *v = v.min(*d);
        }
    }

    let ans = centroids(&labels_iso)
        .into_iter()
        .map(|(label, c)| RadialDistanceRecord {
            label,
            border_to_border: nearest[&label] as f64 * dx,
            barycenter_to_border: distance[c.barycenter] as f64 * dx,
        })
        .collect();
    Ok(ans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::label::*;
    use crate::test_utils::ball;
    use crate::{Calibration, SegError};
    use approx::assert_abs_diff_eq;
    use ndarray::{s, Array3};

    #[test]
    fn test_center_voxel_in_ball() {
        let nucleus = ball((25, 25, 25), [12.0, 12.0, 12.0], 8.0);
        let mut labels = nucleus.mask_where(|_| false);
        labels[(12, 12, 12)] = 1;
        let records = compute_radial_distances(&nucleus, &labels).unwrap();

        assert_eq!(records.len(), 1);
        // 最近的背景体素位于 (1, 0, 8) 方向.
        let expect = 65f64.sqrt();
        assert_abs_diff_eq!(records[0].border_to_border, expect, epsilon = 1e-5);
        assert_abs_diff_eq!(records[0].barycenter_to_border, expect, epsilon = 1e-5);
    }

    #[test]
    fn test_anisotropic_resampling() {
        let cal = Calibration::new(0.5, 0.5, 1.0).unwrap();
        let mut mask = Array3::<u32>::zeros((5, 10, 10));
        mask.slice_mut(s![1..4, 1..9, 1..9]).fill(FOREGROUND);
        let mut chromo = Array3::<u32>::zeros((5, 10, 10));
        chromo[(2, 4, 4)] = 3;
        let nucleus = LabelStack::new(mask, cal).unwrap();
        let labels = LabelStack::new(chromo, cal).unwrap();

        // 重采样后深度为 10, 染色中心占据 z = 4, 5 两层.
        let records = compute_radial_distances(&nucleus, &labels).unwrap();
        assert_eq!(
            records,
            vec![RadialDistanceRecord {
                label: 3,
                border_to_border: 1.5,
                barycenter_to_border: 1.5,
            }]
        );
    }

    #[test]
    fn test_border_and_barycenter_differ() {
        // 一条贯穿细胞核的染色中心: 端点贴近边界, 质心位于中央.
        let nucleus = ball((25, 25, 25), [12.0, 12.0, 12.0], 8.0);
        let mut labels = nucleus.mask_where(|_| false);
        for w in 6..=18 {
            labels[(12, 12, w)] = 2;
        }
        let r = compute_radial_distances(&nucleus, &labels).unwrap()[0];
        assert_eq!(r.label, 2);
        assert!(r.border_to_border < r.barycenter_to_border);
        // 端点 (12, 12, 6) 最近的背景体素为 (13, 12, 4).
        assert_abs_diff_eq!(r.border_to_border, 5f64.sqrt(), epsilon = 1e-5);
        assert_abs_diff_eq!(r.barycenter_to_border, 65f64.sqrt(), epsilon = 1e-5);
    }

    #[test]
    fn test_no_labels_and_mismatch() {
        let nucleus = ball((9, 9, 9), [4.0, 4.0, 4.0], 3.0);
        let empty = nucleus.mask_where(|_| false);
        assert!(compute_radial_distances(&nucleus, &empty).unwrap().is_empty());

        let other = ball((9, 9, 8), [4.0, 4.0, 4.0], 3.0);
        assert_eq!(
            compute_radial_distances(&nucleus, &other).unwrap_err(),
            SegError::ShapeMismatch((9, 9, 9), (9, 9, 8))
        );
    }
}
