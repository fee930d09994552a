//! 滤镜权重查找表.
//!
//! 将归一化平方距离 `t2 in [0, 1]` (对应 `[0, radius^2]`) 离散为 `samples` 个采样点,
//! 每个点存储 "主滤镜 x 窗函数" 的乘积, 避免缩放时逐点求 Bessel 函数.
//!
//! ```text
//! filter(t2) = jinc(radius^2 * t2 / blur^2)        若 radius^2 * t2 / blur^2 < radius^2
//! window(t2) = jinc(JINC_ZERO_SQR * t2)            若 JINC_ZERO_SQR * t2 < radius^2
//! lut[i]     = filter(i / (samples-1)) * window(i / (samples-1))
//! ```
//!
//! 窗函数是未模糊 Jinc 的主瓣, 用于压低截断带来的振铃.

use jinc_core::{AlignedBuf, JincError, JincResult};
use log::{debug, warn};

use crate::kernel::{JINC_ZERO_SQR, jinc_sqr, sample_sqr};

/// 默认查找表采样点数
pub const DEFAULT_LUT_SAMPLES: usize = 1024;

/// Jinc 滤镜查找表
#[derive(Debug, Clone)]
pub struct FilterLut {
    samples: usize,
    radius: f64,
    blur: f64,
    table: AlignedBuf<f64>,
}

impl FilterLut {
    /// 构建查找表
    ///
    /// # 参数
    /// - `samples`: 采样点数, 至少为 2 (建议为 4 的倍数)
    /// - `radius`: 核半径 (源像素单位)
    /// - `blur`: 模糊系数, <1 锐化, >1 柔化, <=0 时不缩放参数
    pub fn new(samples: usize, radius: f64, blur: f64) -> JincResult<Self> {
        if samples < 2 {
            return Err(JincError::InvalidArgument(format!(
                "查找表采样点数至少为 2, 实际: {samples}",
            )));
        }
        if !(radius.is_finite() && radius > 0.0) {
            return Err(JincError::InvalidArgument(format!(
                "核半径必须为正数, 实际: {radius}",
            )));
        }
        if !blur.is_finite() {
            return Err(JincError::InvalidArgument(format!(
                "模糊系数必须为有限值, 实际: {blur}",
            )));
        }
        if samples % 4 != 0 {
            warn!("查找表采样点数 {samples} 不是 4 的倍数");
        }

        let radius2 = radius * radius;
        let blur2 = blur * blur;
        let last = (samples - 1) as f64;

        let mut table = AlignedBuf::<f64>::zeroed(samples);
        for (i, slot) in table.iter_mut().enumerate() {
            let t2 = i as f64 / last;
            let filter = sample_sqr(jinc_sqr, radius2 * t2, blur2, radius2);
            let window = sample_sqr(jinc_sqr, JINC_ZERO_SQR * t2, 1.0, radius2);
            *slot = filter * window;
        }

        debug!("构建 Jinc 查找表: samples={samples}, radius={radius:.6}, blur={blur:.6}");

        Ok(Self {
            samples,
            radius,
            blur,
            table,
        })
    }

    /// 采样点数
    pub fn samples(&self) -> usize {
        self.samples
    }

    /// 核半径
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// 模糊系数
    pub fn blur(&self) -> f64 {
        self.blur
    }

    /// 查找表原始数据
    pub fn table(&self) -> &[f64] {
        &self.table
    }

    /// 按索引取权重, 越界 (支撑之外) 返回 0
    #[inline]
    pub fn factor(&self, index: usize) -> f32 {
        self.table.get(index).map_or(0.0, |&v| v as f32)
    }

    /// 平方距离 `dist2` 对应的表索引
    ///
    /// `round((samples - 1) * dist2 / radius2)`, 半整数远离零舍入 (即向上).
    #[inline]
    pub fn index_for(&self, dist2: f64, radius2: f64) -> usize {
        ((self.samples - 1) as f64 * dist2 / radius2).round() as usize
    }

    /// 按平方距离查表, `radius2` 为归一化使用的平方半径
    #[inline]
    pub fn lookup(&self, dist2: f64, radius2: f64) -> f32 {
        self.factor(self.index_for(dist2, radius2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::{DEFAULT_BLUR, radius_for_tap};

    fn tap3_lut() -> FilterLut {
        FilterLut::new(1024, radius_for_tap(3).unwrap(), DEFAULT_BLUR).unwrap()
    }

    #[test]
    fn test_零距离权重为1() {
        let lut = tap3_lut();
        assert_eq!(lut.table()[0], 1.0);
        assert_eq!(lut.factor(0), 1.0);
        assert_eq!(lut.lookup(0.0, 9.0), 1.0);

        for tap in 1..=16 {
            let lut = FilterLut::new(1000, radius_for_tap(tap).unwrap(), 0.5).unwrap();
            assert_eq!(lut.table()[0], 1.0, "tap={tap}");
        }
    }

    #[test]
    fn test_支撑边界为0() {
        let lut = tap3_lut();
        let radius = radius_for_tap(3).unwrap();
        let radius2 = radius * radius;
        assert_eq!(radius, 3.238_315_484_166_236_2);
        assert_eq!(lut.index_for(radius2, radius2), 1023);
        assert_eq!(lut.lookup(radius2, radius2), 0.0);

        // blur = 1 时, 边界处恰好等于支撑半径, 严格小于比较使其为 0
        let lut = FilterLut::new(1024, radius, 1.0).unwrap();
        assert_eq!(lut.lookup(radius2, radius2), 0.0);
    }

    #[test]
    fn test_越界索引为0() {
        let lut = tap3_lut();
        assert_eq!(lut.factor(1024), 0.0);
        assert_eq!(lut.factor(usize::MAX), 0.0);
        assert_eq!(lut.lookup(100.0, 9.0), 0.0);
    }

    #[test]
    fn test_主瓣单调递减() {
        let lut = tap3_lut();
        // 窗函数主瓣在 t2 -> 1 时才到零, 前段两者乘积单调下降
        let table = lut.table();
        for i in 1..64 {
            assert!(table[i] < table[i - 1], "i={i}");
            assert!(table[i] > 0.0);
        }
    }

    #[test]
    fn test_索引舍入_半整数向上() {
        // samples = 5, radius2 = 4: index = 4 * d2 / 4 = d2, 精确可表示
        let lut = FilterLut::new(5, 2.0, 1.0).unwrap();
        assert_eq!(lut.index_for(2.5, 4.0), 3);
        assert_eq!(lut.index_for(1.5, 4.0), 2);
        assert_eq!(lut.index_for(0.5, 4.0), 1);
        assert_eq!(lut.index_for(2.4999, 4.0), 2);
        assert_eq!(lut.index_for(2.5001, 4.0), 3);
        // 与 "偶数舍入" 的差别: 2.5 -> 3 而非 2
        assert_ne!(lut.index_for(2.5, 4.0), 2.5f64.round_ties_even() as usize);
    }

    #[test]
    fn test_非法参数() {
        assert!(matches!(
            FilterLut::new(1, 3.0, 1.0),
            Err(JincError::InvalidArgument(_))
        ));
        assert!(FilterLut::new(1024, 0.0, 1.0).is_err());
        assert!(FilterLut::new(1024, f64::NAN, 1.0).is_err());
        assert!(FilterLut::new(1024, 3.0, f64::INFINITY).is_err());
        // blur <= 0 合法: 参数不缩放
        assert!(FilterLut::new(1000, 3.0, 0.0).is_ok());
    }
}
