use super::{shift, OFFSETS_26};
use crate::consts::label::*;
use crate::{GridAttr, LabelStack};
use ndarray::Array3;
use std::collections::{HashMap, VecDeque};

/// 26-连通分量标记.
///
/// 所有非背景体素都被视为前景 (不区分原有标签值). 标签从 1 开始,
/// 按照行优先扫描中第一次遇到某分量的顺序分配. 返回标签网格和分量个数.
pub fn label26(mask: &LabelStack) -> (LabelStack, u32) {
    let shape = mask.shape();
    let mut labels = Array3::<u32>::zeros(shape);
    let mut bfs_q = VecDeque::with_capacity(64);
    let mut next = 0u32;

    for (pos, &v) in mask.data().indexed_iter() {
        if is_background(v) || labels[pos] != BACKGROUND {
            continue;
        }
        next += 1;
        labels[pos] = next;
        bfs_q.push_back(pos);

        while let Some(cur) = bfs_q.pop_front() {
            for d in OFFSETS_26.iter() {
                let Some(neigh) = shift(cur, *d, shape) else {
                    continue;
                };
                if is_object(mask[neigh]) && labels[neigh] == BACKGROUND {
                    labels[neigh] = next;
                    bfs_q.push_back(neigh);
                }
            }
        }
    }
    (mask.with_data(labels), next)
}

/// 紧凑化标签: 按照行优先扫描中第一次出现的顺序, 将非背景标签重新编号为 `1..=n`.
/// 返回新标签网格和 `n`.
pub fn relabel(labels: &LabelStack) -> (LabelStack, u32) {
    let mut table: HashMap<u32, u32> = HashMap::new();
    let data = labels.data().mapv(|l| {
        if is_background(l) {
            return BACKGROUND;
        }
        let n = table.len() as u32 + 1;
        *table.entry(l).or_insert(n)
    });
    let n = table.len() as u32;
    (labels.with_data(data), n)
}
