use crate::{SegError, SegResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 体素的物理分辨率 (一般以微米为单位).
///
/// `x` 对应图像宽 (`w`) 方向, `y` 对应图像高 (`h`) 方向, `z` 对应相邻切片方向.
/// 该结构是只读的. 若要修改分辨率, 你应该创建新的实例.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Calibration {
    x: f64,
    y: f64,
    z: f64,
}

impl Calibration {
    /// 构建体素分辨率. 三个分量必须都是正有限数, 否则返回 `Err`.
    pub fn new(x: f64, y: f64, z: f64) -> SegResult<Self> {
        if [x, y, z].iter().all(|v| v.is_finite() && *v > 0.0) {
            Ok(Self { x, y, z })
        } else {
            Err(SegError::InvalidSpacing([x, y, z]))
        }
    }

    /// 各向同性的单位分辨率 `(1, 1, 1)`.
    #[inline]
    pub const fn unit() -> Self {
        Self {
            x: 1.0,
            y: 1.0,
            z: 1.0,
        }
    }

    /// 宽方向 (物理 x 轴) 分辨率.
    #[inline]
    pub fn x(&self) -> f64 {
        self.x
    }

    /// 高方向 (物理 y 轴) 分辨率.
    #[inline]
    pub fn y(&self) -> f64 {
        self.y
    }

    /// 切片方向 (物理 z 轴) 分辨率.
    #[inline]
    pub fn z(&self) -> f64 {
        self.z
    }

    /// 以 `[z, h, w]` 顺序返回分辨率, 与网格索引顺序一致.
    #[inline]
    pub fn pix_dim(&self) -> [f64; 3] {
        [self.z, self.y, self.x]
    }

    /// 单个体素的物理体积.
    #[inline]
    pub fn voxel(&self) -> f64 {
        self.x * self.y * self.z
    }

    /// 将 `z` 方向分辨率替换为 `x` 方向分辨率, 得到立方体素的标定.
    #[inline]
    pub(crate) fn cubic(&self) -> Self {
        Self {
            x: self.x,
            y: self.x,
            z: self.x,
        }
    }
}
