//! 质心与主矩.

use crate::consts::label::is_object;
use crate::{GridAttr, Idx3d, LabelStack};
use nalgebra::{Matrix3, SymmetricEigen, Vector3};
use std::collections::BTreeMap;

/// 单个标签的体素数和体素质心.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct VoxelCentroid {
    pub count: u64,
    /// 各轴整数坐标之和对体素数截断整除的结果.
    pub barycenter: Idx3d,
}

/// 一次遍历计算所有非背景标签的体素数和体素质心.
///
/// 质心在乘以分辨率之前就已取整到体素, 这与旧版本的输出保持一致.
pub(crate) fn centroids(labels: &LabelStack) -> BTreeMap<u32, VoxelCentroid> {
    let mut acc: BTreeMap<u32, (u64, [u64; 3])> = BTreeMap::new();
    for ((z, h, w), &l) in labels.data().indexed_iter() {
        if !is_object(l) {
            continue;
        }
        let (n, sum) = acc.entry(l).or_insert((0, [0; 3]));
        *n += 1;
        sum[0] += z as u64;
        sum[1] += h as u64;
        sum[2] += w as u64;
    }
    acc.into_iter()
        .map(|(l, (n, [sz, sh, sw]))| {
            let barycenter = ((sz / n) as usize, (sh / n) as usize, (sw / n) as usize);
            (l, VoxelCentroid { count: n, barycenter })
        })
        .collect()
}

/// 以物理坐标计算每个标签相对于其 (取整后) 质心的二阶矩矩阵, 除以体素数.
pub(crate) fn second_moments(
    labels: &LabelStack,
    centroids: &BTreeMap<u32, VoxelCentroid>,
) -> BTreeMap<u32, Matrix3<f64>> {
    let centers: BTreeMap<u32, Vector3<f64>> = centroids
        .iter()
        .map(|(l, c)| (*l, Vector3::from(labels.to_physical(c.barycenter))))
        .collect();

    let mut acc: BTreeMap<u32, Matrix3<f64>> = BTreeMap::new();
    for (pos, l) in labels.data().indexed_iter() {
        let Some(center) = centers.get(l) else {
            continue;
        };
        let d = Vector3::from(labels.to_physical(pos)) - center;
        *acc.entry(*l).or_insert_with(Matrix3::zeros) += d * d.transpose();
    }
    for (l, m) in acc.iter_mut() {
        *m /= centroids[l].count as f64;
    }
    acc
}

/// 对称矩阵的特征值, 显式按升序排列.
pub(crate) fn sorted_eigenvalues(m: Matrix3<f64>) -> [f64; 3] {
    let e = SymmetricEigen::new(m).eigenvalues;
    let mut ans = [e[0], e[1], e[2]];
    ans.sort_by(f64::total_cmp);
    ans
}

/// 由升序特征值计算 `(扁平度, 伸长度)`.
///
/// 扁平度为 `sqrt(λ_mid / λ_min)`, 伸长度为 `sqrt(λ_max / λ_mid)`.
/// 分母 (相对最大特征值) 为零时对应的比值为 0.
pub(crate) fn flatness_elongation([min, mid, max]: [f64; 3]) -> (f64, f64) {
    let eps = max.abs() * 1e-12;
    let ratio = |num: f64, den: f64| {
        if den > eps && den > 0.0 {
            (num / den).sqrt()
        } else {
            0.0
        }
    };
    (ratio(mid, min), ratio(max, mid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::cube;
    use crate::Calibration;
    use approx::assert_abs_diff_eq;
    use ndarray::Array3;

    #[test]
    fn test_single_voxel_barycenter() {
        let mut data = Array3::<u32>::zeros((10, 10, 10));
        data[(5, 5, 5)] = 1;
        let labels = LabelStack::new(data, Calibration::unit()).unwrap();
        let c = centroids(&labels);
        assert_eq!(c[&1].barycenter, (5, 5, 5));
        assert_eq!(c[&1].count, 1);
        assert_eq!(labels.to_physical(c[&1].barycenter), [5.0, 5.0, 5.0]);
    }

    #[test]
    fn test_barycenter_is_truncated() {
        let mut data = Array3::<u32>::zeros((3, 3, 3));
        data[(1, 1, 0)] = 4;
        data[(1, 1, 1)] = 4;
        let labels = LabelStack::new(data, Calibration::unit()).unwrap();
        assert_eq!(centroids(&labels)[&4].barycenter, (1, 1, 0));
    }

    #[test]
    fn test_box_moments() {
        // 3 x 5 x 9 的长方体, 各轴方差为 (n² - 1) / 12.
        let mut data = Array3::<u32>::zeros((5, 7, 11));
        data.slice_mut(ndarray::s![1..4, 1..6, 1..10]).fill(1);
        let labels = LabelStack::new(data, Calibration::unit()).unwrap();
        let c = centroids(&labels);
        assert_eq!(c[&1].barycenter, (2, 3, 5));

        let m = second_moments(&labels, &c);
        let ev = sorted_eigenvalues(m[&1]);
        assert_abs_diff_eq!(ev[0], 2.0 / 3.0, epsilon = 1e-9);
        assert_abs_diff_eq!(ev[1], 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(ev[2], 20.0 / 3.0, epsilon = 1e-9);

        let (flatness, elongation) = flatness_elongation(ev);
        assert_abs_diff_eq!(flatness, 3f64.sqrt(), epsilon = 1e-9);
        assert_abs_diff_eq!(elongation, (10.0f64 / 3.0).sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn test_anisotropic_moments_use_physical_units() {
        let mut data = Array3::<u32>::zeros((5, 5, 5));
        data.slice_mut(ndarray::s![1..4, 2..3, 2..3]).fill(1);
        let cal = Calibration::new(1.0, 1.0, 2.0).unwrap();
        let labels = LabelStack::new(data, cal).unwrap();
        let c = centroids(&labels);
        let ev = sorted_eigenvalues(second_moments(&labels, &c)[&1]);
        // z 方向坐标 {2, 4, 6} 相对 4 的方差为 8/3.
        assert_abs_diff_eq!(ev[2], 8.0 / 3.0, epsilon = 1e-9);
        assert_eq!(flatness_elongation(ev), (0.0, 0.0));
    }

    #[test]
    fn test_eigenvalues_are_sorted() {
        let m = Matrix3::from_diagonal(&Vector3::new(3.0, 1.0, 2.0));
        let ev = sorted_eigenvalues(m);
        for (got, want) in ev.iter().zip([1.0, 2.0, 3.0]) {
            assert_abs_diff_eq!(*got, want, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_degenerate_single_voxel() {
        let labels = cube((3, 3, 3), (1, 1, 1), 1);
        let c = centroids(&labels);
        let ev = sorted_eigenvalues(second_moments(&labels, &c)[&1]);
        assert_eq!(flatness_elongation(ev), (0.0, 0.0));
    }
}
