//! 凸包正则化: 依次在 XY, XZ, YZ 三组平面上用二维凸包填充掩膜.

use crate::consts::label::*;
use crate::ops::{convex_hull_2d, hull_contains, Point2};
use crate::LabelStack;
use itertools::{iproduct, Itertools};
use ndarray::{Array3, ArrayViewMut2, Axis};

/// 用平面内前景点的凸包填充该平面. 凸包不足 3 个顶点时不做任何修改.
fn fill_plane(mut plane: ArrayViewMut2<u32>) {
    // 平面坐标 (行, 列) 对应凸包坐标 (y, x).
    let points: Vec<Point2> = plane
        .indexed_iter()
        .filter(|(_, v)| is_object(**v))
        .map(|((r, c), _)| (c as i64, r as i64))
        .collect();
    let hull = convex_hull_2d(&points);
    if hull.len() < 3 {
        return;
    }

    let (x0, x1) = hull.iter().map(|p| p.0).minmax().into_option().unwrap_or_default();
    let (y0, y1) = hull.iter().map(|p| p.1).minmax().into_option().unwrap_or_default();
    for (y, x) in iproduct!(y0..=y1, x0..=x1) {
        let cell = &mut plane[(y as usize, x as usize)];
        if is_background(*cell) && hull_contains(&hull, (x, y)) {
            *cell = FOREGROUND;
        }
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IntoParallelIterator, ParallelIterator};

        fn fill_planes(data: &mut Array3<u32>, axis: usize) {
            data.axis_iter_mut(Axis(axis))
                .into_par_iter()
                .for_each(fill_plane);
        }
    } else {
        fn fill_planes(data: &mut Array3<u32>, axis: usize) {
            data.axis_iter_mut(Axis(axis)).for_each(fill_plane);
        }
    }
}

/// 对二值掩膜做凸包正则化, 返回新的掩膜. 结果总是包含原掩膜.
///
/// 每组平面的结果作为下一组平面的输入.
pub(super) fn convex_hull_mask(mask: &LabelStack) -> LabelStack {
    let mut data = mask.data().mapv(|l| if is_object(l) { FOREGROUND } else { BACKGROUND });
    // XY (固定 z), XZ (固定 h), YZ (固定 w).
    for axis in 0..3 {
        fill_planes(&mut data, axis);
    }
    mask.with_data(data)
}

#[cfg(test)]
mod tests {
    use super::convex_hull_mask;
    use crate::consts::label::*;
    use crate::test_utils::cube;

    #[test]
    fn test_bridges_two_blocks() {
        let mut grid = cube((7, 7, 9), (2, 2, 1), 3);
        for p in cube((7, 7, 9), (2, 2, 5), 3).positions(FOREGROUND) {
            grid[p] = FOREGROUND;
        }
        assert_eq!(grid.count(FOREGROUND), 54);

        let hull = convex_hull_mask(&grid);
        assert_eq!(hull[(3, 3, 4)], FOREGROUND);
        assert_eq!(hull.count(FOREGROUND), 63);
        assert_eq!(hull[(3, 3, 0)], BACKGROUND);
    }

    #[test]
    fn test_convex_shape_unchanged() {
        let grid = cube((7, 7, 7), (1, 1, 1), 4);
        assert_eq!(convex_hull_mask(&grid), grid);
    }

    #[test]
    fn test_thin_line_is_left_alone() {
        // 单列体素在任意平面上都是退化凸包.
        let mut grid = cube((5, 5, 5), (0, 0, 0), 0);
        grid[(1, 2, 2)] = FOREGROUND;
        grid[(2, 2, 2)] = FOREGROUND;
        grid[(3, 2, 2)] = FOREGROUND;
        assert_eq!(convex_hull_mask(&grid), grid);
    }
}
