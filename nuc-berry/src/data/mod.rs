use std::ops::{Index, IndexMut};

use ndarray::{Array3, ArrayView3, Axis};
use ordered_float::OrderedFloat;

use crate::consts::label::*;
use crate::consts::MAX_VOXELS;
use crate::{Idx3d, SegError, SegResult};

mod calibration;
pub mod histogram;
pub mod slice;

pub use calibration::Calibration;
use histogram::{IntensityHistogram, LabelHistogram};
use slice::{LabelSlice, LabelSliceMut};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 三维体素网格, 包括体素分辨率和按 `(z, h, w)` 存储的数据.
///
/// 网格的形状和分辨率在创建后不可修改. 所有就地修改都只涉及体素值.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VoxelGrid<T> {
    calibration: Calibration,
    data: Array3<T>,
}

/// 原始强度图像.
pub type RawStack = VoxelGrid<f32>;

/// 标签图像. 二值掩膜也以该类型表示 (`BACKGROUND` / `FOREGROUND`).
pub type LabelStack = VoxelGrid<u32>;

/// 体素网格的共用属性和部分通用操作.
pub trait GridAttr {
    /// 获取体素分辨率.
    fn calibration(&self) -> &Calibration;

    /// 获取数据形状大小 `(z, h, w)`.
    fn shape(&self) -> Idx3d;

    /// 获取水平切片个数.
    #[inline]
    fn len_z(&self) -> usize {
        self.shape().0
    }

    /// 获取数据体素个数.
    #[inline]
    fn size(&self) -> usize {
        let (z, h, w) = self.shape();
        z * h * w
    }

    /// 检查索引是否合法.
    #[inline]
    fn check(&self, (z0, h0, w0): &Idx3d) -> bool {
        let (z, h, w) = self.shape();
        *z0 < z && *h0 < h && *w0 < w
    }

    /// 获取单个体素分辨率, 分别代表空间 (相邻切片方向), 高, 宽.
    #[inline]
    fn pix_dim(&self) -> [f64; 3] {
        self.calibration().pix_dim()
    }

    /// 获取体素的实际体积值.
    #[inline]
    fn voxel(&self) -> f64 {
        self.calibration().voxel()
    }

    /// 将体素索引转换为物理坐标 `(z, h, w)`.
    #[inline]
    fn to_physical(&self, (z, h, w): Idx3d) -> [f64; 3] {
        let [pz, ph, pw] = self.pix_dim();
        [z as f64 * pz, h as f64 * ph, w as f64 * pw]
    }
}

impl<T> GridAttr for VoxelGrid<T> {
    #[inline]
    fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    #[inline]
    fn shape(&self) -> Idx3d {
        self.data.dim()
    }
}

impl<T> Index<Idx3d> for VoxelGrid<T> {
    type Output = T;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl<T> IndexMut<Idx3d> for VoxelGrid<T> {
    #[inline]
    fn index_mut(&mut self, index: Idx3d) -> &mut Self::Output {
        &mut self.data[index]
    }
}

impl<T> VoxelGrid<T> {
    /// 由 `(z, h, w)` 数据和分辨率创建网格.
    ///
    /// 网格为空时返回 `Err(SegError::EmptyGrid)`, 体素数超过上限时返回
    /// `Err(SegError::GridTooLarge)`.
    pub fn new(data: Array3<T>, calibration: Calibration) -> SegResult<Self> {
        match data.len() {
            0 => Err(SegError::EmptyGrid),
            n if n > MAX_VOXELS => Err(SegError::GridTooLarge(n)),
            _ => Ok(Self { calibration, data }),
        }
    }

    /// 内部构建, 由调用方保证数据来源于已检查过的网格.
    #[inline]
    pub(crate) fn from_parts(data: Array3<T>, calibration: Calibration) -> Self {
        debug_assert_ne!(data.len(), 0);
        Self { calibration, data }
    }

    /// 以相同的分辨率包装新数据. 形状必须与 `self` 一致.
    #[inline]
    pub(crate) fn with_data<U>(&self, data: Array3<U>) -> VoxelGrid<U> {
        debug_assert_eq!(self.data.dim(), data.dim());
        VoxelGrid::from_parts(data, self.calibration)
    }

    /// 获取给定位置的体素值. 越界时返回 `None`.
    #[inline]
    pub fn get(&self, pos: Idx3d) -> Option<&T> {
        self.data.get(pos)
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView3<'_, T> {
        self.data.view()
    }

    /// 检查 `other` 与自身形状是否一致.
    pub fn check_same_shape<U>(&self, other: &VoxelGrid<U>) -> SegResult<()> {
        if self.shape() == other.shape() {
            Ok(())
        } else {
            Err(SegError::ShapeMismatch(self.shape(), other.shape()))
        }
    }
}

impl RawStack {
    /// 整幅图像的强度直方图.
    pub fn histogram(&self) -> IntensityHistogram {
        IntensityHistogram::from_values(self.data.iter().copied())
    }

    /// `mask` 中值满足 `pred` 的位置上的强度直方图.
    ///
    /// 如果 `mask` 与 `self` 形状不一致, 则程序 panic.
    pub fn histogram_where(
        &self,
        mask: &LabelStack,
        pred: impl Fn(u32) -> bool,
    ) -> IntensityHistogram {
        assert_eq!(self.shape(), mask.shape(), "强度图像和掩膜形状不一致");
        self.data
            .iter()
            .zip(mask.data.iter())
            .filter(|(_, l)| pred(**l))
            .map(|(v, _)| OrderedFloat(*v))
            .collect()
    }

    /// 以 `threshold` 为门限二值化: 强度 `>= threshold` 的体素为前景.
    pub fn binarize(&self, threshold: f64) -> LabelStack {
        self.with_data(self.data.mapv(|v| {
            if v as f64 >= threshold {
                FOREGROUND
            } else {
                BACKGROUND
            }
        }))
    }
}

impl LabelStack {
    /// 以 `FOREGROUND` 填充满足 `pred` 的体素, 其余为 `BACKGROUND`, 得到二值掩膜.
    pub fn mask_where(&self, pred: impl Fn(u32) -> bool) -> LabelStack {
        self.with_data(
            self.data
                .mapv(|l| if pred(l) { FOREGROUND } else { BACKGROUND }),
        )
    }

    /// 标签直方图.
    pub fn histogram(&self) -> LabelHistogram {
        self.data.iter().copied().collect()
    }

    /// 获取网格中值为 `label` 的体素个数.
    #[inline]
    pub fn count(&self, label: u32) -> usize {
        self.data.iter().filter(|p| **p == label).count()
    }

    /// 获取网格中非背景体素个数.
    #[inline]
    pub fn count_objects(&self) -> usize {
        self.data.iter().filter(|p| is_object(**p)).count()
    }

    /// 收集值为 `label` 的所有体素对应的下标, 结果按行优先存储.
    pub fn positions(&self, label: u32) -> Vec<Idx3d> {
        self.data
            .indexed_iter()
            .filter_map(|(pos, l)| (*l == label).then_some(pos))
            .collect()
    }

    /// 获取 z 空间的第 `z_index` 层不可变切片.
    ///
    /// 当 `z_index` 越界时 panic.
    #[inline]
    pub fn slice_at(&self, z_index: usize) -> LabelSlice {
        LabelSlice::new(self.data.index_axis(Axis(0), z_index))
    }

    /// 获取能按升序迭代水平可变切片的迭代器.
    #[inline]
    pub fn slice_iter_mut(&mut self) -> impl ExactSizeIterator<Item = LabelSliceMut> {
        self.data.axis_iter_mut(Axis(0)).map(LabelSliceMut::new)
    }

    /// 逐水平切片填充二维孔洞 (4-相邻背景区域中不接触切片边缘的那些).
    ///
    /// 如果以此法修改了网格则返回 `true`.
    pub fn fill_holes_2d(&mut self) -> bool {
        let mut non_trivial = false;
        self.slice_iter_mut()
            .for_each(|mut s| non_trivial |= s.fill_holes());
        non_trivial
    }

    /// 判断是否有前景体素位于长方体六个表面中的任意一个上.
    pub fn touches_border(&self) -> bool {
        let (z, h, w) = self.shape();
        macro_rules! face_has_object {
            ($axis: expr, $index: expr) => {
                self.data
                    .index_axis(Axis($axis), $index)
                    .iter()
                    .any(|p| is_object(*p))
            };
        }
        face_has_object!(0, 0)
            || face_has_object!(0, z - 1)
            || face_has_object!(1, 0)
            || face_has_object!(1, h - 1)
            || face_has_object!(2, 0)
            || face_has_object!(2, w - 1)
    }

    /// 第 `z_index` 层水平切片上的非背景体素个数.
    #[inline]
    pub fn count_objects_at(&self, z_index: usize) -> usize {
        self.slice_at(z_index).count_objects()
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use std::sync::atomic::{AtomicBool, Ordering};
        use rayon::iter::{IntoParallelIterator, ParallelIterator};
    }
}

/// 并发操作部分
#[cfg(feature = "rayon")]
impl LabelStack {
    /// 借助 `rayon`, 并行地对每个水平可变切片实施 `op` 操作.
    pub fn par_for_each_slice_mut<F>(&mut self, op: F)
    where
        F: Fn(LabelSliceMut) + Sync + Send,
    {
        self.data
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .for_each(|v| {
                op(LabelSliceMut::new(v));
            });
    }

    /// 借助 `rayon`, 使用多任务模式运行 `self.fill_holes_2d`.
    pub fn par_fill_holes_2d(&mut self) -> bool {
        let non_trivial = AtomicBool::new(false);
        self.par_for_each_slice_mut(|mut s| {
            non_trivial.fetch_or(s.fill_holes(), Ordering::Release);
        });
        non_trivial.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::cube;

    #[test]
    fn test_grid_rejects_empty() {
        let data = Array3::<u32>::zeros((0, 4, 4));
        assert_eq!(
            LabelStack::new(data, Calibration::unit()).unwrap_err(),
            SegError::EmptyGrid
        );
    }

    #[test]
    fn test_border_plane_at_first_slice() {
        let mut data = Array3::<u32>::zeros((10, 10, 10));
        data.index_axis_mut(Axis(0), 0).fill(FOREGROUND);
        let grid = LabelStack::new(data, Calibration::unit()).unwrap();
        assert!(grid.touches_border());
        assert_eq!(grid.count_objects_at(0), 100);
    }

    #[test]
    fn test_inner_cube_does_not_touch_border() {
        let grid = cube((10, 10, 10), (2, 2, 2), 5);
        assert!(!grid.touches_border());
        assert_eq!(grid.count(FOREGROUND), 125);
    }

    #[test]
    fn test_binarize_is_inclusive() {
        let data = Array3::from_shape_vec((1, 1, 3), vec![5.0f32, 6.0, 7.0]).unwrap();
        let raw = RawStack::new(data, Calibration::unit()).unwrap();
        let mask = raw.binarize(6.0);
        assert_eq!(mask.positions(FOREGROUND), vec![(0, 0, 1), (0, 0, 2)]);
    }

    #[test]
    fn test_fill_holes_2d() {
        let mut grid = cube((7, 7, 7), (1, 1, 1), 5);
        grid[(2, 3, 3)] = BACKGROUND;
        assert!(grid.fill_holes_2d());
        assert_eq!(grid[(2, 3, 3)], FOREGROUND);
    }

    #[cfg(feature = "rayon")]
    #[test]
    fn test_par_fill_holes_2d() {
        let mut grid = cube((7, 7, 7), (1, 1, 1), 5);
        grid[(1, 2, 4)] = BACKGROUND;
        grid[(3, 3, 3)] = BACKGROUND;
        assert!(grid.par_fill_holes_2d());
        assert_eq!(grid.count(FOREGROUND), 125);
    }
}
