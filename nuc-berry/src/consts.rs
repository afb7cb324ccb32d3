//! 通用常量.

/// 标签 / 掩膜取值.
pub mod label {
    /// 背景 (未选中) 体素的值. 任何标签网格中 0 都表示背景.
    pub const BACKGROUND: u32 = 0;

    /// 二值掩膜中前景体素的值.
    pub const FOREGROUND: u32 = 1;

    /// 体素是否是背景?
    #[inline]
    pub const fn is_background(p: u32) -> bool {
        p == BACKGROUND
    }

    /// 体素是否属于某个对象?
    #[inline]
    pub const fn is_object(p: u32) -> bool {
        p != BACKGROUND
    }
}

/// 细胞核边界搜索使用的经验常量.
pub mod boundary {
    /// 门限扫描的最低下限.
    pub const MIN_THRESHOLD: f64 = 6.0;

    /// 候选对象体素数占整幅图像体素数的比例达到该值时, 该候选被拒绝.
    pub const MAX_VOLUME_RATIO: f64 = 0.7;

    /// 第一张或最后一张 z 切片上的前景体素数达到该值时, 认为对象被截断.
    pub const BORDER_SLICE_LIMIT: usize = 10;

    /// 未找到任何候选门限时的哨兵值.
    pub const NO_THRESHOLD: i64 = -1;
}

/// 染色中心分割使用的经验常量.
pub mod chromocenter {
    /// 细胞核物理体积超过该值时, 对邻域半径和对比度因子进行放大.
    pub const LARGE_NUCLEUS_VOLUME: f64 = 50.0;

    /// 大细胞核的邻域半径放大倍数.
    pub const NEIGH_SCALE: f64 = 2.5;

    /// 大细胞核的对比度因子增量.
    pub const FACTOR_INCREMENT: f64 = 1.0;
}

/// 网格体素数上限. 超出时报告 [`crate::SegError::GridTooLarge`].
pub const MAX_VOXELS: usize = 1 << 31;
