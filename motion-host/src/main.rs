//! motion-host 命令行入口
//!
//! 用法：
//!   motion-host run <scenario.json> [--output report.json] [--frame-rate 120]
//!   motion-host check <scenario.json>...
//!   motion-host init-config [--force]
//!
//! 全局参数 `--config` 指定配置文件（默认 motion.json），`--log-level` 覆盖配置中的日志级别。

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use motion_host::{DEFAULT_CONFIG_PATH, HostConfig, Scenario, ScenarioRunner};
use tracing::level_filters::LevelFilter;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "motion-host", about = "无界面过渡引擎宿主", version)]
struct Cli {
    /// 配置文件路径
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// 日志级别（覆盖配置文件）
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 运行场景并输出报告
    Run {
        /// 场景文件
        scenario: PathBuf,

        /// 报告输出路径（默认打印到 stdout）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 帧率（覆盖配置文件）
        #[arg(long)]
        frame_rate: Option<u32>,

        /// 记录逐帧状态
        #[arg(long)]
        record_frames: bool,
    },
    /// 只构建场景并检查过渡请求，不运行动画
    Check {
        /// 场景文件
        #[arg(required = true)]
        scenarios: Vec<PathBuf>,
    },
    /// 把当前生效的配置写到 `--config` 指定的文件
    InitConfig {
        /// 覆盖已有文件
        #[arg(long)]
        force: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match HostConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }

    let level = match config.level_filter() {
        Ok(level) => level,
        Err(e) => {
            eprintln!("❌ {e}");
            return ExitCode::FAILURE;
        }
    };
    init_logging(level);

    let result = match cli.command {
        Command::Run {
            scenario,
            output,
            frame_rate,
            record_frames,
        } => {
            if let Some(rate) = frame_rate {
                config.frame_rate = rate;
            }
            config.report.record_frames |= record_frames;
            run(config, scenario, output)
        }
        Command::Check { scenarios } => check(&scenarios),
        Command::InitConfig { force } => init_config(&config, &cli.config, force),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(level: LevelFilter) {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// 运行场景；过渡被认领且没有超时时返回 true
fn run(config: HostConfig, scenario: PathBuf, output: Option<PathBuf>) -> Result<bool> {
    config.validate().context("配置无效")?;
    let scenario = Scenario::load(&scenario)
        .with_context(|| format!("加载场景失败: {}", scenario.display()))?;

    let pretty = config.report.pretty;
    let report = ScenarioRunner::new(config).run(&scenario)?;
    let json = report.to_json(pretty).context("报告序列化失败")?;

    match output {
        Some(path) => {
            fs::write(&path, json)
                .with_context(|| format!("写入报告失败: {}", path.display()))?;
            info!(path = %path.display(), "报告已写入");
        }
        None => println!("{json}"),
    }
    Ok(report.claimed && !report.timed_out)
}

/// 检查场景文件；全部可构建且可认领时返回 true
fn check(paths: &[PathBuf]) -> Result<bool> {
    let mut failed = 0;
    for path in paths {
        let summary = Scenario::load(path).and_then(|scenario| scenario.check());
        match summary {
            Ok(summary) if summary.claimable => {
                println!(
                    "✅ {}: {} 个视图, {} 个控制器, {} 个动作",
                    path.display(),
                    summary.views,
                    summary.controllers,
                    summary.actions
                );
            }
            Ok(_) => {
                println!("❌ {}: 过渡请求不会被认领", path.display());
                failed += 1;
            }
            Err(e) => {
                println!("❌ {}: {e}", path.display());
                failed += 1;
            }
        }
    }
    println!("共 {} 个场景，{} 个失败", paths.len(), failed);
    Ok(failed == 0)
}

/// 写出配置文件；文件已存在且未指定 `--force` 时返回 false
fn init_config(config: &HostConfig, path: &Path, force: bool) -> Result<bool> {
    config.validate().context("配置无效")?;
    let written = config
        .init_file(path, force)
        .with_context(|| format!("写入配置失败: {}", path.display()))?;
    if written {
        println!("✅ 已写入 {}", path.display());
    } else {
        println!("❌ {} 已存在，使用 --force 覆盖", path.display());
    }
    Ok(written)
}
