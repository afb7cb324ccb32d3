use crate::consts::label::is_object;
use crate::{GridAttr, LabelStack};
use ndarray::{s, Array3, Axis};

/// 一维平方距离变换 (下包络抛物线).
///
/// `f` 中为 `INFINITY` 的位置不产生抛物线. 全部为 `INFINITY` 时 `d` 也全部为 `INFINITY`.
fn squared_edt_1d(f: &[f64], d: &mut [f64], v: &mut [usize], z: &mut [f64]) {
    let n = f.len();
    let sq = |q: usize| (q * q) as f64;
    let mut k: isize = -1;

    for q in 0..n {
        if f[q] == f64::INFINITY {
            continue;
        }
        let mut s = f64::NEG_INFINITY;
        while k >= 0 {
            let p = v[k as usize];
            s = ((f[q] + sq(q)) - (f[p] + sq(p))) / (2.0 * (q - p) as f64);
            if s <= z[k as usize] {
                k -= 1;
            } else {
                break;
            }
        }
        k += 1;
        let ku = k as usize;
        v[ku] = q;
        z[ku] = if ku == 0 { f64::NEG_INFINITY } else { s };
        z[ku + 1] = f64::INFINITY;
    }

    if k < 0 {
        d.fill(f64::INFINITY);
        return;
    }
    let mut k = 0usize;
    for (q, out) in d.iter_mut().enumerate() {
        while z[k + 1] < q as f64 {
            k += 1;
        }
        let p = v[k];
        *out = (q as f64 - p as f64).powi(2) + f[p];
    }
}

/// 欧氏距离变换.
///
/// 对每个前景 (非背景) 体素, 计算其到最近背景体素的欧氏距离, 背景体素为 0.
/// 距离以体素为单位 (忽略分辨率). 网格外部视为背景, 因此贴边体素的距离至多为 1.
pub fn distance_transform(mask: &LabelStack) -> Array3<f32> {
    let (lz, lh, lw) = mask.shape();

    // 四周补一层背景.
    let mut grid = Array3::<f64>::zeros((lz + 2, lh + 2, lw + 2));
    grid.slice_mut(s![1..=lz, 1..=lh, 1..=lw])
        .zip_mut_with(&mask.data(), |g, l| {
            if is_object(*l) {
                *g = f64::INFINITY;
            }
        });

    let longest = lz.max(lh).max(lw) + 2;
    let mut f = Vec::with_capacity(longest);
    let mut d = vec![0.0; longest];
    let mut v = vec![0usize; longest];
    let mut z = vec![0.0; longest + 1];

    for axis in 0..3 {
        for mut lane in grid.lanes_mut(Axis(axis)) {
            f.clear();
            f.extend(lane.iter().copied());
            let n = f.len();
            squared_edt_1d(&f, &mut d[..n], &mut v[..n], &mut z[..=n]);
            lane.iter_mut().zip(d.iter()).for_each(|(g, dv)| *g = *dv);
        }
    }

    grid.slice(s![1..=lz, 1..=lh, 1..=lw])
        .mapv(|v| v.sqrt() as f32)
}
