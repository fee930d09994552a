//! jinc-cli - EWA Jinc 缩放命令行工具
//!
//! 读取原始平面帧 (小端序), 逐帧做 EWA Jinc 缩放后写出原始平面帧.

mod logging;
mod params;
mod raw;

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{debug, info};

use jinc_core::{SampleType, VideoFormat};
use jinc_ewa::{CropRect, JincResizer, ResizeParams};

use params::{AccelArg, ParamsFile, parse_crop, parse_quantize, parse_size};
use raw::{RawFrame, RawSample};

#[derive(Parser, Debug)]
#[command(name = "jinc-cli", version, about = "EWA Jinc 原始平面图像缩放工具")]
struct Cli {
    /// 输入文件路径 (原始平面帧)
    #[arg(short, long)]
    input: PathBuf,

    /// 输出文件路径 (原始平面帧)
    #[arg(short, long)]
    output: PathBuf,

    /// 源分辨率 (如 "640x480")
    #[arg(long = "src-size", value_parser = parse_size)]
    src_size: (u32, u32),

    /// 目标分辨率 (如 "1280x720")
    #[arg(short = 's', long = "size", value_parser = parse_size)]
    size: (u32, u32),

    /// 像素格式 (如 gray8, gray16, grayf32, yuv420p8, yuv420p10, yuv444pf32, rgbp8)
    #[arg(short = 'f', long, default_value = "yuv420p8")]
    format: String,

    /// tap 数 (1-16)
    #[arg(long)]
    tap: Option<u32>,

    /// 模糊系数
    #[arg(long)]
    blur: Option<f64>,

    /// 源裁剪区域 (L:T:W:H, 亮度平面坐标)
    #[arg(long, value_parser = parse_crop)]
    crop: Option<CropRect>,

    /// 查找表采样点数
    #[arg(long)]
    samples: Option<usize>,

    /// 量化网格 (QX:QY)
    #[arg(long, value_parser = parse_quantize)]
    quantize: Option<(u32, u32)>,

    /// 内积实现
    #[arg(long, value_enum)]
    accel: Option<AccelArg>,

    /// 关闭按行并行
    #[arg(long)]
    single_thread: bool,

    /// 最多处理的帧数 (默认处理到输入结束)
    #[arg(long)]
    frames: Option<u64>,

    /// JSON 参数文件, 命令行选项优先
    #[arg(long)]
    params: Option<PathBuf>,

    /// 覆盖输出文件
    #[arg(short = 'y', long)]
    overwrite: bool,

    /// 日志级别 (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = logging::init("jinc-cli", cli.verbose) {
        eprintln!("警告: 日志系统初始化失败: {e:#}");
    }

    if let Err(e) = run(&cli) {
        eprintln!("错误: {e:#}");
        process::exit(1);
    }
}

/// 合并参数文件与命令行选项
fn build_params(cli: &Cli) -> Result<ResizeParams> {
    let (dst_w, dst_h) = cli.size;
    let mut params = ResizeParams::new(dst_w, dst_h);

    if let Some(path) = &cli.params {
        params = ParamsFile::load(path)?.apply(params);
    }
    if let Some(tap) = cli.tap {
        params = params.with_tap(tap);
    }
    if let Some(blur) = cli.blur {
        params = params.with_blur(blur);
    }
    if let Some(crop) = cli.crop {
        params = params.with_crop(crop);
    }
    if let Some(samples) = cli.samples {
        params = params.with_lut_samples(samples);
    }
    if let Some((qx, qy)) = cli.quantize {
        params = params.with_quantize(qx, qy);
    }
    if let Some(accel) = cli.accel {
        params = params.with_accel(accel.into());
    }
    if cli.single_thread {
        params = params.with_parallel(false);
    }
    Ok(params)
}

fn run(cli: &Cli) -> Result<()> {
    if !cli.overwrite && cli.output.exists() {
        bail!("输出文件已存在 '{}', 使用 -y 覆盖", cli.output.display());
    }

    let (src_w, src_h) = cli.src_size;
    let format = VideoFormat::parse(&cli.format, src_w, src_h)?;
    let params = build_params(cli)?;

    let start = Instant::now();
    let resizer = JincResizer::new(format, params).context("创建缩放上下文失败")?;
    info!(
        "{} -> {}, tap={}, 半径 {:.4}, 模糊 {:.4}",
        format,
        resizer.output_format(),
        params.tap,
        resizer.radius(),
        resizer.blur(),
    );
    if let Some(table) = resizer.table(0) {
        debug!(
            "亮度系数表: filter_size={}, 系数块 {} 个, 边界像素 {} 个, 构建耗时 {:?}",
            table.filter_size(),
            table.distinct_stencils(),
            table.border_pixels(),
            start.elapsed(),
        );
    }

    let mut reader = BufReader::new(open_input(&cli.input)?);
    let mut writer = BufWriter::new(
        File::create(&cli.output)
            .with_context(|| format!("无法创建输出文件 '{}'", cli.output.display()))?,
    );

    let (r, w, max) = (&mut reader, &mut writer, cli.frames);
    let frames = match (format.sample_type, format.bytes_per_sample()) {
        (SampleType::Integer, 1) => resize_stream::<u8>(&resizer, r, w, max)?,
        (SampleType::Integer, 2) => resize_stream::<u16>(&resizer, r, w, max)?,
        (SampleType::Float, 4) => resize_stream::<f32>(&resizer, r, w, max)?,
        _ => bail!("不支持的采样格式: {format}"),
    };
    writer.flush().context("写出输出文件失败")?;

    info!("完成: {frames} 帧, 耗时 {:?}", start.elapsed());
    Ok(())
}

fn open_input(path: &Path) -> Result<File> {
    File::open(path).with_context(|| format!("无法打开输入文件 '{}'", path.display()))
}

/// 逐帧缩放, 返回处理的帧数
fn resize_stream<T: RawSample>(
    resizer: &JincResizer,
    reader: &mut impl Read,
    writer: &mut impl Write,
    max_frames: Option<u64>,
) -> Result<u64> {
    let mut src = RawFrame::<T>::new(resizer.src_format());
    let mut dst = RawFrame::<T>::new(&resizer.output_format());
    let mut scratch = Vec::new();
    let mut count = 0u64;

    while max_frames.is_none_or(|max| count < max) {
        if !src
            .read_from(reader, &mut scratch)
            .with_context(|| format!("读取第 {count} 帧失败"))?
        {
            break;
        }
        let src_planes = src.plane_refs();
        let mut dst_planes: Vec<&mut [T]> =
            dst.planes.iter_mut().map(Vec::as_mut_slice).collect();
        resizer.process(&src_planes, &src.strides, &mut dst_planes, &dst.strides)?;
        dst.write_to(writer, &mut scratch)
            .with_context(|| format!("写出第 {count} 帧失败"))?;
        count += 1;
        debug!("已处理第 {count} 帧");
    }
    Ok(count)
}
