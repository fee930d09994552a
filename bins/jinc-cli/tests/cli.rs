//! jinc-cli 端到端测试: 在临时目录中生成原始帧, 运行命令行工具并检查输出.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn run_cli(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_jinc-cli"))
        .current_dir(dir)
        .args(args)
        .output()
        .expect("启动 jinc-cli 失败")
}

#[test]
fn test_gray8_放大_多帧() {
    let dir = TempDir::new().unwrap();
    // 两帧 4x4 常量图像
    let mut input = vec![100u8; 16];
    input.extend(vec![30u8; 16]);
    fs::write(dir.path().join("in.raw"), &input).unwrap();

    let out = run_cli(
        dir.path(),
        &[
            "-i", "in.raw", "-o", "out.raw", "--src-size", "4x4", "-s", "8x8", "--format",
            "gray8", "--tap", "1",
        ],
    );
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let output = fs::read(dir.path().join("out.raw")).unwrap();
    assert_eq!(output.len(), 2 * 64);
    assert!(output[..64].iter().all(|&v| v == 100));
    assert!(output[64..].iter().all(|&v| v == 30));
    assert!(dir.path().join("logs").is_dir());
}

#[test]
fn test_帧数限制与16位小端() {
    let dir = TempDir::new().unwrap();
    let frame: Vec<u8> = std::iter::repeat_n(700u16.to_le_bytes(), 8 * 8)
        .flatten()
        .collect();
    let input = [frame.as_slice(), frame.as_slice(), frame.as_slice()].concat();
    fs::write(dir.path().join("in.raw"), &input).unwrap();

    let out = run_cli(
        dir.path(),
        &[
            "-i", "in.raw", "-o", "out.raw", "--src-size", "8x8", "-s", "4x4", "--format",
            "gray10", "--frames", "2", "--accel", "scalar", "--single-thread",
        ],
    );
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let output = fs::read(dir.path().join("out.raw")).unwrap();
    assert_eq!(output.len(), 2 * 16 * 2);
    for px in output.chunks_exact(2) {
        assert_eq!(u16::from_le_bytes([px[0], px[1]]), 700);
    }
}

#[test]
fn test_参数文件与yuv420p() {
    let dir = TempDir::new().unwrap();
    let mut input = vec![16u8; 8 * 8];
    input.extend(vec![128u8; 2 * 4 * 4]);
    fs::write(dir.path().join("in.yuv"), &input).unwrap();
    fs::write(
        dir.path().join("params.json"),
        r#"{ "tap": 2, "quantize_x": 64, "quantize_y": 64, "accel": "lanes" }"#,
    )
    .unwrap();

    let out = run_cli(
        dir.path(),
        &[
            "-i", "in.yuv", "-o", "out.yuv", "--src-size", "8x8", "-s", "12x12", "--params",
            "params.json", "-v",
        ],
    );
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let output = fs::read(dir.path().join("out.yuv")).unwrap();
    assert_eq!(output.len(), 144 + 2 * 36);
    assert!(output[..144].iter().all(|&v| v == 16));
    assert!(output[144..].iter().all(|&v| v == 128));
}

#[test]
fn test_拒绝覆盖已有输出() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("in.raw"), vec![0u8; 16]).unwrap();
    fs::write(dir.path().join("out.raw"), b"keep").unwrap();

    let args = [
        "-i", "in.raw", "-o", "out.raw", "--src-size", "4x4", "-s", "2x2", "--format", "gray8",
    ];
    let out = run_cli(dir.path(), &args);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("-y"));
    assert_eq!(fs::read(dir.path().join("out.raw")).unwrap(), b"keep");

    let mut with_y = args.to_vec();
    with_y.push("-y");
    let out = run_cli(dir.path(), &with_y);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(fs::read(dir.path().join("out.raw")).unwrap().len(), 4);
}

#[test]
fn test_非法配置报错() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("in.raw"), vec![0u8; 16]).unwrap();

    let out = run_cli(
        dir.path(),
        &[
            "-i", "in.raw", "-o", "out.raw", "--src-size", "4x4", "-s", "8x8", "--format",
            "gray8", "--tap", "17",
        ],
    );
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("tap"));

    // 输入不足一帧
    let out = run_cli(
        dir.path(),
        &[
            "-i", "in.raw", "-o", "out2.raw", "--src-size", "8x8", "-s", "4x4", "--format",
            "gray8",
        ],
    );
    assert!(!out.status.success());
}
