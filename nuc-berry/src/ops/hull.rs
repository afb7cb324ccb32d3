/// 平面整数点 `(x, y)`.
pub type Point2 = (i64, i64);

/// `(a - o) x (b - o)`. 为正时 `o -> a -> b` 逆时针.
#[inline]
fn cross(o: Point2, a: Point2, b: Point2) -> i64 {
    (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
}

#[inline]
fn dist2(a: Point2, b: Point2) -> i64 {
    (a.0 - b.0).pow(2) + (a.1 - b.1).pow(2)
}

/// Graham 扫描求平面凸包.
///
/// 以 `y` 最小 (相同时 `x` 最小) 的点为锚点, 其余点按极角排序,
/// 共线的点按到锚点的距离排序. 返回逆时针排列的凸包顶点, 不含共线点.
/// 去重后不足 3 个点时原样返回去重后的点.
pub fn convex_hull_2d(points: &[Point2]) -> Vec<Point2> {
    let mut pts = points.to_vec();
    pts.sort_unstable_by_key(|&(x, y)| (y, x));
    pts.dedup();
    if pts.len() < 3 {
        return pts;
    }

    let anchor = pts[0];
    pts[1..].sort_by(|&a, &b| {
        cross(anchor, a, b)
            .cmp(&0)
            .reverse()
            .then_with(|| dist2(anchor, a).cmp(&dist2(anchor, b)))
    });

    let mut stack: Vec<Point2> = Vec::with_capacity(pts.len());
    for p in pts {
        while stack.len() >= 2 && cross(stack[stack.len() - 2], stack[stack.len() - 1], p) <= 0 {
            stack.pop();
        }
        stack.push(p);
    }
    stack
}

/// 判断 `p` 是否位于逆时针凸包 `hull` 内部或边上. 顶点数不足 3 时返回 `false`.
pub fn hull_contains(hull: &[Point2], p: Point2) -> bool {
    if hull.len() < 3 {
        return false;
    }
    hull.iter()
        .zip(hull.iter().cycle().skip(1))
        .all(|(&a, &b)| cross(a, b, p) >= 0)
}
