//! Jinc 径向核函数.
//!
//! `jinc(r) = 2 * J1(pi * r) / (pi * r)`, `jinc(0) = 1`, 是 sinc 在圆盘上的二维推广.
//!
//! 所有入口都接收 **平方** 半径 `x2 = r^2`, 调用方无需开方.
//! 按 `x2` 的大小分段求值:
//!
//! | `x2` 范围        | 方法                         |
//! |------------------|------------------------------|
//! | `< 1.49`         | 泰勒级数, 16 项 (1-tap 半径) |
//! | `< 4.97`         | 泰勒级数, 21 项 (2-tap 半径) |
//! | `< 10.49`        | 泰勒级数, 26 项 (3-tap 半径) |
//! | `< 17.99`        | 泰勒级数, 31 项 (4-tap 半径) |
//! | 其余             | J1 大参数渐近展开的有理逼近  |
//!
//! 级数在大参数下会因相消损失精度, 渐近式在小参数下不收敛, 两者拼接覆盖到 16-tap.

use std::f64::consts::PI;

/// 未模糊 Jinc 第一个零点的平方 (窗函数的支撑)
pub const JINC_ZERO_SQR: f64 = 1.487_594_643_662_046_800_053_56;

/// 默认模糊系数
pub const DEFAULT_BLUR: f64 = 0.981_250_564_426_935_6;

/// 最大 tap 数
pub const MAX_TAP: u32 = 16;

/// `2 * J1(pi * x) / (pi * x)` 关于 `x^2` 的泰勒展开系数
const TAYLOR_SERIES: [f64; 31] = [
    1.0,
    -1.233_700_550_136_169_827_354_311_37,
    0.507_339_015_802_096_027_273_126_733,
    -0.104_317_403_816_764_804_365_258_186,
    0.012_869_643_847_751_972_123_384_027_1,
    -0.001_058_485_779_668_545_430_204_226_91,
    6.218_354_708_039_986_384_844_765_98e-5,
    -2.739_852_722_946_704_611_427_562_04e-6,
    9.389_327_254_420_645_477_960_034_05e-8,
    -2.574_137_377_597_174_073_049_310_36e-9,
    5.774_026_725_214_020_317_564_293_43e-11,
    -1.079_306_052_635_982_417_545_729_77e-12,
    1.707_103_167_823_473_560_469_745_52e-14,
    -2.314_345_183_827_491_844_066_487_62e-16,
    2.719_246_596_659_973_121_205_153_90e-18,
    -2.795_613_351_879_430_285_180_835_29e-20,
    2.535_992_448_662_996_223_521_384_64e-22,
    -2.044_872_731_409_614_940_857_864_52e-24,
    1.475_298_604_502_043_388_667_924_75e-26,
    -9.579_351_052_575_234_531_550_433_07e-29,
    5.627_643_173_099_792_541_403_939_17e-31,
    -3.005_552_588_148_603_663_423_638_67e-33,
    1.465_593_629_036_411_619_893_382_21e-35,
    -6.551_100_240_645_966_003_356_244_26e-38,
    2.694_031_990_294_040_934_123_816_43e-40,
    -1.022_654_999_541_599_640_971_199_23e-42,
    3.594_444_545_680_843_246_941_806_35e-45,
    -1.173_139_739_005_399_823_131_190_19e-47,
    3.564_786_062_555_577_464_260_343_01e-50,
    -1.011_006_557_814_383_132_395_135_38e-52,
    2.682_321_175_412_644_853_286_586_05e-55,
];

/// Jinc 的前 16 个零点, 第 `tap - 1` 项即 `tap` 对应的核半径
pub const JINC_ZEROS: [f64; 16] = [
    1.219_669_891_266_504_5,
    2.233_130_594_381_528_6,
    3.238_315_484_166_236_2,
    4.241_062_863_796_069_9,
    5.242_764_376_870_181_7,
    6.243_921_689_864_487_7,
    7.244_759_868_719_957_0,
    8.245_394_913_952_042_7,
    9.245_892_684_949_467_3,
    10.246_293_348_754_916,
    11.246_622_794_877_883,
    12.246_898_461_138_105,
    13.247_132_522_181_061,
    14.247_333_735_806_849,
    15.247_508_563_037_300,
    16.247_661_874_700_962,
];

// J1(x), x > 8 的渐近展开有理系数:
// J1(x) = sqrt(2 / (pi x)) * (P(64/x^2) * cos(w) - (8/x) * Q(64/x^2) * sin(w)), w = x - 3pi/4
const ASYM_PC: [f64; 7] = [
    -4.435_757_816_794_127_857_1e6,
    -9.942_246_505_077_641_195_7e6,
    -6.603_373_248_364_939_109_3e6,
    -1.523_529_351_181_137_383_3e6,
    -1.098_240_554_345_934_672_7e5,
    -1.611_616_644_324_610_116_5e3,
    0.0,
];
const ASYM_QC: [f64; 7] = [
    -4.435_757_816_794_127_856_8e6,
    -9.934_124_389_934_585_659_0e6,
    -6.585_339_479_723_087_072_8e6,
    -1.511_809_506_634_160_881_6e6,
    -1.072_638_599_110_382_011_9e5,
    -1.455_009_440_190_496_182_5e3,
    1.0,
];
const ASYM_PS: [f64; 7] = [
    3.322_091_340_985_722_351_9e4,
    8.514_516_067_533_570_196_6e4,
    6.617_883_658_127_083_517_9e4,
    1.849_426_287_322_386_679_7e4,
    1.706_375_429_020_768_002_1e3,
    3.526_513_384_663_603_218_6e1,
    0.0,
];
const ASYM_QS: [f64; 7] = [
    7.087_128_194_102_874_357_4e5,
    1.819_458_042_243_997_298_9e6,
    1.419_460_669_603_720_892_9e6,
    4.002_944_358_226_697_511_7e5,
    3.789_022_974_577_220_264_1e4,
    8.638_367_769_604_990_967_5e2,
    1.0,
];

/// `tap` 对应的核半径 (Jinc 第 `tap` 个零点), `tap` 超出 1..=16 时返回 None
pub fn radius_for_tap(tap: u32) -> Option<f64> {
    let idx = tap.checked_sub(1)? as usize;
    JINC_ZEROS.get(idx).copied()
}

/// `jinc(sqrt(x2))`
pub fn jinc_sqr(x2: f64) -> f64 {
    if x2 == 0.0 {
        return 1.0;
    }
    if x2 < 1.49 {
        taylor(x2, 16)
    } else if x2 < 4.97 {
        taylor(x2, 21)
    } else if x2 < 10.49 {
        taylor(x2, 26)
    } else if x2 < 17.99 {
        taylor(x2, 31)
    } else {
        asymptotic(x2)
    }
}

/// `jinc(r)`, 以非平方半径调用
pub fn jinc(r: f64) -> f64 {
    jinc_sqr(r * r)
}

/// 在半径 `radius2` 内对核函数采样, 参数先除以 `blur2` (若 > 0)
///
/// 支撑边界本身 (`x2 == radius2`) 已在支撑之外, 返回 0.
pub fn sample_sqr(filter: impl Fn(f64) -> f64, x2: f64, blur2: f64, radius2: f64) -> f64 {
    let x2 = if blur2 > 0.0 { x2 / blur2 } else { x2 };
    if x2 < radius2 { filter(x2) } else { 0.0 }
}

/// Horner 求值泰勒级数的前 `terms` 项
#[inline]
fn taylor(x2: f64, terms: usize) -> f64 {
    TAYLOR_SERIES[..terms]
        .iter()
        .rev()
        .fold(0.0, |acc, &c| acc * x2 + c)
}

/// 有理函数 `num(z) / den(z)` 求值, z > 1 时按 1/z 反序求值避免溢出
fn evaluate_rational(num: &[f64; 7], den: &[f64; 7], z: f64) -> f64 {
    fn horner<'a>(coeffs: impl Iterator<Item = (&'a f64, &'a f64)>, z: f64) -> (f64, f64) {
        coeffs.fold((0.0, 0.0), |(s1, s2), (&n, &d)| (s1 * z + n, s2 * z + d))
    }

    let (s1, s2) = if z <= 1.0 {
        horner(num.iter().zip(den).rev(), z)
    } else {
        horner(num.iter().zip(den), 1.0 / z)
    };
    s1 / s2
}

/// 大参数下的 `jinc(sqrt(x2))`, 要求 `pi * sqrt(x2) > 8`
fn asymptotic(x2: f64) -> f64 {
    let y2 = PI * PI * x2;
    let xp = y2.sqrt();
    let y2p = 64.0 / y2;
    let yp = 8.0 / xp;
    // sqrt(2 / (pi x)) * (2 / x), 其中 cos(x - 3pi/4) = (sin x - cos x) / sqrt(2)
    let factor = (xp / PI).sqrt() * 2.0 / y2;
    let rc = evaluate_rational(&ASYM_PC, &ASYM_QC, y2p);
    let rs = evaluate_rational(&ASYM_PS, &ASYM_QS, y2p);
    let (sx, cx) = xp.sin_cos();
    factor * (rc * (sx - cx) + yp * rs * (sx + cx))
}
