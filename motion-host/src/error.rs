//! # Error 模块
//!
//! 宿主侧的错误类型：配置加载与场景脚本。

use motion_runtime::SceneError;
use thiserror::Error;

/// 配置错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// 读取或写入配置文件失败
    #[error("配置 IO 错误: {0}")]
    Io(String),

    /// JSON 解析失败
    #[error("配置解析失败: {0}")]
    Parse(String),

    /// 序列化失败
    #[error("配置序列化失败: {0}")]
    Serialization(String),

    /// 配置值不合法
    #[error("配置验证失败: {0}")]
    Validation(String),
}

/// 场景脚本错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScenarioError {
    #[error("场景文件读取失败 {path}: {message}")]
    Io { path: String, message: String },

    #[error("场景解析失败: {0}")]
    Parse(String),

    /// 同名视图或控制器
    #[error("名字重复: {0}")]
    DuplicateName(String),

    #[error("未知视图: {0}")]
    UnknownView(String),

    #[error("未知控制器: {0}")]
    UnknownController(String),

    /// 数值不合法（负尺寸、非有限数等）
    #[error("场景数据无效: {0}")]
    Invalid(String),

    #[error("场景构建失败: {0}")]
    Scene(#[from] SceneError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ScenarioError::UnknownView("card".to_string());
        assert_eq!(err.to_string(), "未知视图: card");

        let err = ConfigError::Validation("帧率必须大于 0".to_string());
        assert!(err.to_string().contains("帧率"));
    }
}
