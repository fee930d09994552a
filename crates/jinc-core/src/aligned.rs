//! 缓存行对齐的定长缓冲区.
//!
//! 系数表与查找表按 64 字节边界对齐存放, 便于按行向量化读取.
//! 底层存储为 `Vec<CacheLine>`, 由 `Vec` 负责分配与释放, 不需要手动 free.

use std::fmt;
use std::ops::{Deref, DerefMut};

/// 缓存行字节数
pub const CACHE_LINE: usize = 64;

mod sealed {
    pub trait Sealed {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
}

/// 可存入 [`AlignedBuf`] 的元素类型
///
/// `Line` 恰好占满一个缓存行, 保证相邻缓存行之间没有填充.
pub trait AlignedElement: sealed::Sealed + Copy + Default + Send + Sync + 'static {
    /// 每个缓存行容纳的元素个数
    const LANES: usize;
    /// 一个缓存行的元素数组
    type Line: Copy + Send + Sync + 'static;
    /// 全零缓存行
    fn zero_line() -> Self::Line;
}

impl AlignedElement for f32 {
    const LANES: usize = CACHE_LINE / 4;
    type Line = [f32; CACHE_LINE / 4];

    fn zero_line() -> Self::Line {
        [0.0; CACHE_LINE / 4]
    }
}

impl AlignedElement for f64 {
    const LANES: usize = CACHE_LINE / 8;
    type Line = [f64; CACHE_LINE / 8];

    fn zero_line() -> Self::Line {
        [0.0; CACHE_LINE / 8]
    }
}

#[derive(Clone, Copy)]
#[repr(C, align(64))]
struct CacheLine<L>(L);

const _: () = assert!(std::mem::size_of::<CacheLine<[f32; 16]>>() == CACHE_LINE);
const _: () = assert!(std::mem::size_of::<CacheLine<[f64; 8]>>() == CACHE_LINE);

/// 64 字节对齐的定长缓冲区
pub struct AlignedBuf<T: AlignedElement> {
    lines: Vec<CacheLine<T::Line>>,
    len: usize,
}

impl<T: AlignedElement> AlignedBuf<T> {
    /// 分配 `len` 个元素的全零缓冲区
    pub fn zeroed(len: usize) -> Self {
        let lines = vec![CacheLine(T::zero_line()); len.div_ceil(T::LANES)];
        Self { lines, len }
    }

    /// 复制切片内容到新的对齐缓冲区
    pub fn from_slice(data: &[T]) -> Self {
        let mut buf = Self::zeroed(data.len());
        buf.as_mut_slice().copy_from_slice(data);
        buf
    }

    /// 元素个数
    pub fn len(&self) -> usize {
        self.len
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// 以切片形式访问
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: `CacheLine<T::Line>` 为 repr(C), 大小恰为 LANES 个 T 且无填充,
        // 因此 `lines` 是 `lines.len() * LANES >= len` 个连续且已初始化的 T.
        unsafe { std::slice::from_raw_parts(self.lines.as_ptr().cast::<T>(), self.len) }
    }

    /// 以可变切片形式访问
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: 同 `as_slice`, 且 `&mut self` 保证独占访问.
        unsafe { std::slice::from_raw_parts_mut(self.lines.as_mut_ptr().cast::<T>(), self.len) }
    }
}

impl<T: AlignedElement> Deref for AlignedBuf<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T: AlignedElement> DerefMut for AlignedBuf<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T: AlignedElement> Clone for AlignedBuf<T> {
    fn clone(&self) -> Self {
        Self {
            lines: self.lines.clone(),
            len: self.len,
        }
    }
}

impl<T: AlignedElement + fmt::Debug> fmt::Debug for AlignedBuf<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlignedBuf")
            .field("len", &self.len)
            .field("data", &self.as_slice())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_对齐到缓存行() {
        let a = AlignedBuf::<f32>::zeroed(37);
        let b = AlignedBuf::<f64>::zeroed(1024);
        assert_eq!(a.as_ptr() as usize % CACHE_LINE, 0);
        assert_eq!(b.as_ptr() as usize % CACHE_LINE, 0);
        assert_eq!(a.len(), 37);
        assert!(a.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_读写与复制() {
        let src: Vec<f32> = (0..20).map(|i| i as f32 * 0.5).collect();
        let mut buf = AlignedBuf::from_slice(&src);
        assert_eq!(&buf[..], &src[..]);

        buf[19] = -1.0;
        let copy = buf.clone();
        assert_eq!(copy[19], -1.0);
        assert_eq!(copy[18], 9.0);
    }

    #[test]
    fn test_空缓冲区() {
        let buf = AlignedBuf::<f64>::zeroed(0);
        assert!(buf.is_empty());
        assert_eq!(buf.as_slice(), &[] as &[f64]);
    }
}
