//! 标签网格水平切片的二维操作.

use crate::consts::label::*;
use crate::{Area2d, Areas2d, Idx2d};
use ndarray::{ArrayView2, ArrayViewMut2};
use std::collections::{HashSet, VecDeque};
use std::ops::{Index, IndexMut};

/// 标签谓词.
pub(crate) type Predicate = fn(u32) -> bool;

/// 不可变、借用的二维水平标签切片.
pub struct LabelSlice<'a> {
    /// 底层数据的轻量级视图, 借用于 [`crate::LabelStack`].
    data: ArrayView2<'a, u32>,
}

impl Index<Idx2d> for LabelSlice<'_> {
    type Output = u32;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

/// 可变、借用的二维水平标签切片.
pub struct LabelSliceMut<'a> {
    /// 底层数据的轻量级视图, 借用于 [`crate::LabelStack`].
    data: ArrayViewMut2<'a, u32>,
}

impl Index<Idx2d> for LabelSliceMut<'_> {
    type Output = u32;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

impl IndexMut<Idx2d> for LabelSliceMut<'_> {
    #[inline]
    fn index_mut(&mut self, index: Idx2d) -> &mut Self::Output {
        &mut self.data[index]
    }
}

/// 可变方法集合.
impl<'a> LabelSliceMut<'a> {
    /// 将 `it` 中的每个索引对应的像素改为 `new`.
    pub(crate) fn fill_batch<I: IntoIterator<Item = Idx2d>>(&mut self, it: I, new: u32) {
        for pos in it.into_iter() {
            self[pos] = new;
        }
    }

    /// 填充孔洞: 按照 4-相邻规则获取所有背景区域,
    /// 将不接触切片边缘的那些区域填充为 `FOREGROUND`.
    ///
    /// 如果以此法修改了原图则返回 `true`, 否则返回 `false`.
    pub fn fill_holes(&mut self) -> bool {
        let mut non_trivial = false;
        for area in self.background_areas() {
            if self.all_within(&area) {
                non_trivial = true;
                self.fill_batch(area, FOREGROUND);
            }
        }
        non_trivial
    }
}

/// 不可变方法集合.
macro_rules! impl_label_slice_immut {
    ($life: lifetime, $slice: ty, $array: ty) => {
        /// 不可变方法集合.
        impl<$life> $slice {
            /// 直接初始化.
            #[inline]
            pub(crate) fn new(data: $array) -> Self {
                Self { data }
            }

            /// 获取给定位置 (高, 宽) 的像素值. 越界时返回 `None`.
            #[inline]
            pub fn get(&self, pos: Idx2d) -> Option<&u32> {
                self.data.get(pos)
            }

            /// 图像的分辨率 (高, 宽).
            #[inline]
            pub fn shape(&self) -> Idx2d {
                self.data.dim()
            }

            /// 获得图像的高.
            #[inline]
            pub fn height(&self) -> usize {
                self.shape().0
            }

            /// 获得图像的宽.
            #[inline]
            pub fn width(&self) -> usize {
                self.shape().1
            }

            /// 判断一个索引是否合法 (未越界).
            #[inline]
            pub fn check(&self, (h, w): Idx2d) -> bool {
                let (h_len, w_len) = self.shape();
                h < h_len && w < w_len
            }

            /// 统计图像中值为 `label` 的像素总个数.
            #[inline]
            pub fn count(&self, label: u32) -> usize {
                self.data.iter().filter(|&p| *p == label).count()
            }

            /// 统计图像中非背景像素总个数.
            #[inline]
            pub fn count_objects(&self) -> usize {
                self.data.iter().filter(|&p| is_object(*p)).count()
            }

            /// 判断一个索引是否位于图像的边缘.
            #[inline]
            pub fn is_at_border(&self, (h, w): Idx2d) -> bool {
                h == 0
                    || h.saturating_add(1) == self.height()
                    || w == 0
                    || w.saturating_add(1) == self.width()
            }

            /// 判断 `positions` 的索引是否全部都在图像的内部.
            #[inline]
            pub fn all_within(&self, positions: &[Idx2d]) -> bool {
                positions.iter().all(|p| !self.is_at_border(*p))
            }

            /// 以行优先规则, 获取能迭代图像所有索引的迭代器.
            #[inline]
            pub fn pos_iter(&self) -> impl Iterator<Item = Idx2d> {
                let (h, w) = self.shape();
                itertools::iproduct!(0..h, 0..w)
            }

            /// 按照 4-相邻规则获取所有区域. 两个像素 `p1` 和 `p2` 属于同一个区域,
            /// 当且仅当存在一条从 `p1` 到 `p2` 的 4-相邻路径, 且路径上的所有像素
            /// (包括 `p1` 和 `p2`) 都满足谓词 `pred`.
            pub fn areas(&self, pred: Predicate) -> Areas2d {
                self.areas_from_local(self.pos_iter(), pred)
            }

            /// 按照 4-相邻原则获得图像中所有背景区域.
            #[inline]
            pub fn background_areas(&self) -> Areas2d {
                self.areas(is_background)
            }

            /// 按照 4-相邻规则获取所有区域, 但区域的种子由 `it` 指定.
            pub fn areas_from_local<I: IntoIterator<Item = Idx2d>>(
                &self,
                it: I,
                pred: Predicate,
            ) -> Areas2d {
                let mut ans = Areas2d::with_capacity(1);
                let mut bfs_q = VecDeque::with_capacity(4);
                let mut set = HashSet::with_capacity(16);
                let (height, width) = self.shape();

                for pos in it.into_iter() {
                    if set.contains(&pos) || !pred(self[pos]) {
                        continue;
                    }
                    bfs_q.push_back(pos);
                    let mut this_area = Area2d::with_capacity(1);
                    while let Some(cur_pos) = bfs_q.pop_front() {
                        if !set.insert(cur_pos) {
                            continue;
                        }
                        this_area.push(cur_pos);

                        // bfs
                        let (cur_h, cur_w) = cur_pos;
                        let mut visit = |next: Idx2d| {
                            if pred(self[next]) && !set.contains(&next) {
                                bfs_q.push_back(next);
                            }
                        };
                        if cur_h > 0 {
                            visit((cur_h - 1, cur_w));
                        }
                        if cur_h + 1 < height {
                            visit((cur_h + 1, cur_w));
                        }
                        if cur_w > 0 {
                            visit((cur_h, cur_w - 1));
                        }
                        if cur_w + 1 < width {
                            visit((cur_h, cur_w + 1));
                        }
                    }
                    ans.push(this_area);
                }
                ans
            }
        }
    };
}

impl_label_slice_immut!('a, LabelSlice<'a>, ArrayView2<'a, u32>);
impl_label_slice_immut!('a, LabelSliceMut<'a>, ArrayViewMut2<'a, u32>);
