use crate::consts::MAX_VOXELS;
use crate::{GridAttr, LabelStack, SegError, SegResult};
use ndarray::{Array3, Axis};
use num::ToPrimitive;

/// 将 `z` 方向重采样为与 `x` 方向相同分辨率时的切片数 `round(D * dz / dx)`, 至少为 1.
pub fn isotropic_depth(grid: &impl GridAttr) -> SegResult<usize> {
    let cal = grid.calibration();
    let depth = (grid.len_z() as f64 * cal.z() / cal.x())
        .round()
        .to_usize()
        .ok_or(SegError::InvalidSpacing([cal.x(), cal.y(), cal.z()]))?
        .max(1);
    let (_, h, w) = grid.shape();
    match depth.checked_mul(h * w) {
        Some(n) if n <= MAX_VOXELS => Ok(depth),
        Some(n) => Err(SegError::GridTooLarge(n)),
        None => Err(SegError::GridTooLarge(usize::MAX)),
    }
}

/// 最近邻插值, 将标签网格沿 `z` 方向重采样到 `depth` 张切片.
///
/// 结果的分辨率为立方体素, 边长取原 `x` 方向分辨率.
pub fn resample_z(grid: &LabelStack, depth: usize) -> LabelStack {
    let (lz, lh, lw) = grid.shape();
    let src = grid.data();
    let mut out = Array3::<u32>::zeros((depth, lh, lw));
    for (k, mut plane) in out.axis_iter_mut(Axis(0)).enumerate() {
        let z = (((k as f64 + 0.5) * lz as f64 / depth as f64) as usize).min(lz - 1);
        plane.assign(&src.index_axis(Axis(0), z));
    }
    LabelStack::from_parts(out, grid.calibration().cubic())
}

#[cfg(test)]
mod tests {
    use super::{isotropic_depth, resample_z};
    use crate::{Calibration, GridAttr, LabelStack};
    use ndarray::Array3;

    fn stack(lz: usize, cal: Calibration) -> LabelStack {
        let data = Array3::from_shape_fn((lz, 2, 2), |(z, _, _)| z as u32);
        LabelStack::new(data, cal).unwrap()
    }

    #[test]
    fn test_isotropic_depth() {
        let g = stack(10, Calibration::new(0.5, 0.5, 1.0).unwrap());
        assert_eq!(isotropic_depth(&g).unwrap(), 20);
        let g = stack(3, Calibration::new(1.0, 1.0, 0.1).unwrap());
        assert_eq!(isotropic_depth(&g).unwrap(), 1);
    }

    #[test]
    fn test_resample_nearest() {
        let g = stack(3, Calibration::new(0.5, 0.5, 1.0).unwrap());
        let r = resample_z(&g, 6);
        assert_eq!(r.shape(), (6, 2, 2));
        assert_eq!(r.calibration(), &Calibration::new(0.5, 0.5, 0.5).unwrap());
        let zs: Vec<u32> = (0..6).map(|z| r[(z, 0, 0)]).collect();
        assert_eq!(zs, vec![0, 0, 1, 1, 2, 2]);
    }
}
