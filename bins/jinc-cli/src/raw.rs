//! 原始平面帧读写.
//!
//! 每帧按平面顺序紧密排列 (行跨度 = 平面宽度), 多字节采样为小端序.

use std::io::{self, Read, Write};

use byteorder::{ByteOrder, LittleEndian};
use jinc_core::{JincResult, VideoFormat};
use jinc_ewa::Sample;

/// 可从原始字节流读写的采样类型
pub trait RawSample: Sample + Default {
    /// 将小端字节解码到采样缓冲区
    fn decode(bytes: &[u8], out: &mut [Self]);
    /// 将采样编码为小端字节
    fn encode(samples: &[Self], out: &mut [u8]);
}

impl RawSample for u8 {
    fn decode(bytes: &[u8], out: &mut [Self]) {
        out.copy_from_slice(bytes);
    }

    fn encode(samples: &[Self], out: &mut [u8]) {
        out.copy_from_slice(samples);
    }
}

impl RawSample for u16 {
    fn decode(bytes: &[u8], out: &mut [Self]) {
        LittleEndian::read_u16_into(bytes, out);
    }

    fn encode(samples: &[Self], out: &mut [u8]) {
        LittleEndian::write_u16_into(samples, out);
    }
}

impl RawSample for f32 {
    fn decode(bytes: &[u8], out: &mut [Self]) {
        LittleEndian::read_f32_into(bytes, out);
    }

    fn encode(samples: &[Self], out: &mut [u8]) {
        LittleEndian::write_f32_into(samples, out);
    }
}

/// 一帧的各平面缓冲区
pub struct RawFrame<T> {
    pub planes: Vec<Vec<T>>,
    pub strides: Vec<usize>,
}

impl<T: RawSample> RawFrame<T> {
    /// 按格式分配全零帧
    pub fn new(format: &VideoFormat) -> Self {
        let (planes, strides) = (0..format.plane_count())
            .map(|p| {
                let w = format.plane_width(p) as usize;
                let h = format.plane_height(p) as usize;
                (vec![T::default(); w * h], w)
            })
            .unzip();
        Self { planes, strides }
    }

    /// 一帧的字节数
    pub fn byte_len(&self) -> usize {
        self.planes.iter().map(|p| p.len() * T::BYTES).sum()
    }

    /// 读取一帧, 流在帧起始处结束时返回 `Ok(false)`
    pub fn read_from(&mut self, reader: &mut impl Read, scratch: &mut Vec<u8>) -> JincResult<bool> {
        scratch.resize(self.byte_len(), 0);
        let got = read_full(reader, scratch)?;
        if got == 0 {
            return Ok(false);
        }
        if got < scratch.len() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("帧数据不完整: 需要 {} 字节, 实际 {got}", scratch.len()),
            )
            .into());
        }

        let mut offset = 0;
        for plane in &mut self.planes {
            let len = plane.len() * T::BYTES;
            T::decode(&scratch[offset..offset + len], plane);
            offset += len;
        }
        Ok(true)
    }

    /// 写出一帧
    pub fn write_to(&self, writer: &mut impl Write, scratch: &mut Vec<u8>) -> JincResult<()> {
        scratch.resize(self.byte_len(), 0);
        let mut offset = 0;
        for plane in &self.planes {
            let len = plane.len() * T::BYTES;
            T::encode(plane, &mut scratch[offset..offset + len]);
            offset += len;
        }
        writer.write_all(scratch)?;
        Ok(())
    }

    /// 各平面的只读切片
    pub fn plane_refs(&self) -> Vec<&[T]> {
        self.planes.iter().map(Vec::as_slice).collect()
    }
}

/// 尽量读满缓冲区, 返回实际读取的字节数 (小于缓冲区长度表示到达流末尾)
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
