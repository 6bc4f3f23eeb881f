//! Gunmetal 简单窗口示例
//!
//! 打开一个窗口，持续驱动事件队列，直到用户关闭窗口或按下 Escape。
//!
//! # 使用方法
//!
//! ```bash
//! # 使用配置文件 gunmetal.toml（不存在时使用默认配置）
//! cargo run
//!
//! # 命令行覆盖
//! cargo run -- --backend x11 --width 1024 --height 768 --fixed-size
//! cargo run -- --headless
//! ```
//!
//! # 初始化流程
//!
//! 1. 加载配置文件并应用命令行参数
//! 2. 验证配置
//! 3. 初始化日志系统
//! 4. 通过工厂选择原生后端并打开窗口
//! 5. 主循环：`while running() { poll_events() }`
//! 6. 退出时 `shutdown`

use std::time::Duration;

use anyhow::Context;
use gunmetal::core::{log, Config};
use gunmetal::platform::Platform;
use gunmetal::{app_info, app_warn};

/// 无头后端没有用户输入，运行固定帧数后自行退出
const HEADLESS_FRAMES: u32 = 120;

fn main() -> anyhow::Result<()> {
    // 1. 加载配置（在初始化日志之前）
    let mut config = Config::from_file_or_default("gunmetal.toml");
    config.apply_args(std::env::args().skip(1));

    // 2. 验证配置
    config.validate().context("invalid configuration")?;

    // 3. 初始化日志系统
    let log_file = config
        .logging
        .file_output
        .then_some(config.logging.log_file.as_str());
    log::init_logger(config.logging.level, config.logging.file_output, log_file);

    app_info!(version = gunmetal::version(), "Gunmetal simple window");

    // 4. 创建平台并打开窗口
    let mut platform = Platform::from_config(&config.platform)
        .context("failed to select platform backend")?;
    platform
        .init(&config.descriptor())
        .context("failed to initialize platform")?;

    app_info!(
        backend = %platform.backend_type(),
        "Window created successfully, press ESC to quit"
    );

    // 5. 主循环
    let headless = platform.backend_type() == gunmetal::platform::BackendTag::Headless;
    let mut frames = 0u32;
    while platform.running() {
        if let Err(e) = platform.poll_events() {
            app_warn!(error = %e, "Event polling failed");
            platform.request_quit()?;
            break;
        }

        // 在这里渲染
        frames += 1;
        if headless && frames >= HEADLESS_FRAMES {
            platform.request_quit()?;
        }
        std::thread::sleep(Duration::from_millis(1));
    }

    // 6. 关闭
    let (width, height) = platform.size()?;
    app_info!(frames, width, height, "Shutting down");
    platform.shutdown();

    Ok(())
}
