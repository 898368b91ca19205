//! # xtask - 开发辅助工具
//!
//! 提供本地质量门禁与开发辅助命令。
//!
//! ## 命令
//!
//! - `check-all`: 运行 fmt、clippy、test
//! - `cov-runtime`: 运行 motion-runtime 覆盖率
//! - `scenario-check`: 检查场景文件（解析、构建、过渡请求可认领）

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use motion_host::{Scenario, ScenarioError, ScenarioSummary};
use walkdir::WalkDir;
use xshell::{Shell, cmd};

/// 默认场景目录（相对于 workspace root）
const DEFAULT_SCENARIO_DIR: &str = "motion-host/scenarios";

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        eprintln!("xtask error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let sub = args.next().unwrap_or_else(|| "help".to_string());

    match sub.as_str() {
        "check-all" => {
            let sh = Shell::new()?;
            step("cargo fmt --all -- --check");
            cmd!(sh, "cargo fmt --all -- --check").run()?;
            step("cargo clippy --workspace --all-targets");
            cmd!(sh, "cargo clippy --workspace --all-targets").run()?;
            step("cargo test --workspace");
            cmd!(sh, "cargo test --workspace").run()?;
        }
        "cov-runtime" => {
            let sh = Shell::new()?;
            if cmd!(sh, "cargo llvm-cov --version").quiet().run().is_err() {
                anyhow::bail!(
                    "cargo llvm-cov 不可用。\n\
请先安装：\n\
  - cargo install cargo-llvm-cov\n\
  - rustup component add llvm-tools-preview\n\
然后重试。"
                );
            }
            step("cargo llvm-cov -p motion-runtime --html");
            cmd!(sh, "cargo llvm-cov -p motion-runtime --html").run()?;
            eprintln!("\nCoverage HTML: target/llvm-cov/html/index.html");
        }
        "scenario-check" => {
            let path = args.next();
            scenario_check(path.as_deref())?;
        }
        "help" | "-h" | "--help" => {
            print_help();
        }
        other => anyhow::bail!("unknown xtask subcommand: {other}"),
    }

    Ok(())
}

fn step(name: &str) {
    eprintln!("\n==> {name}");
}

fn print_help() {
    eprintln!(
        r#"xtask - 开发辅助工具

USAGE:
  cargo xtask <command>

COMMANDS:
  check-all        运行 fmt、clippy、test 门禁检查
  cov-runtime      运行 motion-runtime 覆盖率报告
  scenario-check   检查场景文件

SCENARIO-CHECK:
  cargo xtask scenario-check [path]

  不带参数：检查 {DEFAULT_SCENARIO_DIR}/ 下所有 .json 文件
  带路径参数：检查指定文件或目录

  检查内容：
    - JSON 结构
    - 视图 / 控制器名字引用与重复
    - 数值范围（frame、透明度、动作时间）
    - 过渡请求能否被认领
"#
    );
}

//=============================================================================
// scenario-check 命令实现
//=============================================================================

/// 执行场景检查
fn scenario_check(path: Option<&str>) -> anyhow::Result<()> {
    let root = PathBuf::from(path.unwrap_or(DEFAULT_SCENARIO_DIR));
    if !root.exists() {
        anyhow::bail!(
            "路径不存在: {}\n请在 workspace 根目录运行，或指定场景路径",
            root.display()
        );
    }

    let files = collect_scenario_files(&root);
    if files.is_empty() {
        eprintln!("未找到场景文件（.json）");
        return Ok(());
    }

    eprintln!("==> 检查 {} 个场景文件...\n", files.len());

    let mut failures = 0;
    for file in &files {
        match check_scenario_file(file) {
            Ok(summary) if summary.claimable => {
                eprintln!(
                    "[OK] {}: {} 个视图, {} 个控制器, {} 个动作",
                    file.display(),
                    summary.views,
                    summary.controllers,
                    summary.actions
                );
            }
            Ok(_) => {
                eprintln!("[ERROR] {}: 过渡请求不会被认领", file.display());
                failures += 1;
            }
            Err(e) => {
                eprintln!("[ERROR] {}: {}", file.display(), e);
                failures += 1;
            }
        }
    }

    eprintln!("─────────────────────────────────────────────────────");
    if failures > 0 {
        eprintln!("❌ {} 个场景, {} 个错误", files.len(), failures);
        anyhow::bail!("场景检查发现错误");
    }
    eprintln!("✅ {} 个场景，检查通过", files.len());
    Ok(())
}

/// 收集场景文件（单个文件或目录下所有 .json）
fn collect_scenario_files(root: &Path) -> Vec<PathBuf> {
    if root.is_file() {
        return vec![root.to_path_buf()];
    }
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    files
}

fn check_scenario_file(file: &Path) -> Result<ScenarioSummary, ScenarioError> {
    Scenario::load(file)?.check()
}
