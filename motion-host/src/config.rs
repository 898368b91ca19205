//! # Config 模块
//!
//! 宿主配置，集中管理帧率、日志级别、过渡选项与报告输出。
//!
//! ## 配置优先级
//!
//! 1. 命令行参数（最高）
//! 2. 配置文件 (motion.json)
//! 3. 默认值（最低）

use std::fs;
use std::path::Path;

use motion_runtime::TransitionOptions;
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;
use tracing::{info, warn};

use crate::error::ConfigError;

/// 默认配置文件名
pub const DEFAULT_CONFIG_PATH: &str = "motion.json";

/// 宿主配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostConfig {
    /// 帧循环频率（每秒帧数）
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,

    /// 单个场景最多运行的帧数，超出视为超时
    #[serde(default = "default_max_frames")]
    pub max_frames: u32,

    /// 日志级别（off / error / warn / info / debug / trace）
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// 过渡选项，场景可以覆盖
    #[serde(default)]
    pub transition: TransitionOptions,

    /// 报告配置
    #[serde(default)]
    pub report: ReportConfig,
}

/// 报告配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// 是否记录每一帧的状态与进度
    #[serde(default)]
    pub record_frames: bool,

    /// 是否输出带缩进的 JSON
    #[serde(default = "default_pretty")]
    pub pretty: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            record_frames: false,
            pretty: default_pretty(),
        }
    }
}

// 默认值函数
fn default_frame_rate() -> u32 {
    60
}

fn default_max_frames() -> u32 {
    3600
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_pretty() -> bool {
    true
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            frame_rate: default_frame_rate(),
            max_frames: default_max_frames(),
            log_level: default_log_level(),
            transition: TransitionOptions::default(),
            report: ReportConfig::default(),
        }
    }
}

impl HostConfig {
    /// 加载配置文件
    ///
    /// 文件不存在时返回默认配置；存在但无法读取或解析时报错。
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            warn!(path = %path.display(), "配置文件不存在，使用默认配置");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        let config: Self =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        info!(path = %path.display(), "配置文件加载成功");
        Ok(config)
    }

    /// 保存配置到文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::Serialization(e.to_string()))?;

        fs::write(path, json).map_err(|e| ConfigError::Io(e.to_string()))?;

        Ok(())
    }

    /// 写出配置文件；文件已存在且 `overwrite` 为 false 时不写
    ///
    /// 返回是否写入。
    pub fn init_file(&self, path: impl AsRef<Path>, overwrite: bool) -> Result<bool, ConfigError> {
        let path = path.as_ref();
        if path.exists() && !overwrite {
            warn!(path = %path.display(), "配置文件已存在，未覆盖");
            return Ok(false);
        }
        self.save(path)?;
        info!(path = %path.display(), "配置文件已写入");
        Ok(true)
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=1000).contains(&self.frame_rate) {
            return Err(ConfigError::Validation(format!(
                "帧率必须在 1 - 1000 之间: {}",
                self.frame_rate
            )));
        }

        if self.max_frames == 0 {
            return Err(ConfigError::Validation("max_frames 必须大于 0".to_string()));
        }

        self.level_filter()?;

        let duration = self.transition.default_duration;
        if !duration.is_finite() || duration < 0.0 {
            return Err(ConfigError::Validation(format!(
                "默认过渡时长必须是非负有限数: {duration}"
            )));
        }

        Ok(())
    }

    /// 解析日志级别
    pub fn level_filter(&self) -> Result<LevelFilter, ConfigError> {
        self.log_level
            .parse()
            .map_err(|_| ConfigError::Validation(format!("未知日志级别: {}", self.log_level)))
    }

    /// 每帧时长（秒）
    pub fn frame_duration(&self) -> f64 {
        1.0 / f64::from(self.frame_rate.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HostConfig::default();
        assert_eq!(config.frame_rate, 60);
        assert_eq!(config.log_level, "info");
        assert!(!config.report.record_frames);
        assert!(config.report.pretty);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: HostConfig =
            serde_json::from_str(r#"{"frame_rate":120,"transition":{"default_duration":0.5}}"#)
                .unwrap();
        assert_eq!(config.frame_rate, 120);
        assert_eq!(config.max_frames, 3600);
        assert_eq!(config.transition.default_duration, 0.5);
        assert_eq!(config.report, ReportConfig::default());
    }

    #[test]
    fn test_missing_file_uses_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = HostConfig::load(dir.path().join("missing.json")).unwrap();
        assert_eq!(config, HostConfig::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_PATH);
        let config = HostConfig {
            frame_rate: 30,
            log_level: "debug".to_string(),
            ..HostConfig::default()
        };
        config.save(&path).unwrap();
        assert_eq!(HostConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_init_file_keeps_existing_unless_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_PATH);

        assert!(HostConfig::default().init_file(&path, false).unwrap());
        assert_eq!(HostConfig::load(&path).unwrap(), HostConfig::default());

        let edited = HostConfig {
            max_frames: 90,
            ..HostConfig::default()
        };
        assert!(!edited.init_file(&path, false).unwrap());
        assert_eq!(HostConfig::load(&path).unwrap().max_frames, 3600);

        assert!(edited.init_file(&path, true).unwrap());
        assert_eq!(HostConfig::load(&path).unwrap(), edited);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_PATH);
        fs::write(&path, "{ frame_rate: ").unwrap();
        assert!(matches!(HostConfig::load(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let zero_rate = HostConfig {
            frame_rate: 0,
            ..HostConfig::default()
        };
        assert!(zero_rate.validate().is_err());

        let bad_level = HostConfig {
            log_level: "loud".to_string(),
            ..HostConfig::default()
        };
        assert!(matches!(bad_level.validate(), Err(ConfigError::Validation(_))));

        let mut negative = HostConfig::default();
        negative.transition.default_duration = -1.0;
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_level_filter() {
        let config = HostConfig {
            log_level: "warn".to_string(),
            ..HostConfig::default()
        };
        assert_eq!(config.level_filter().unwrap(), LevelFilter::WARN);
    }
}
