//! # Error 模块
//!
//! 定义 motion-runtime 中使用的错误类型。
//!
//! 过渡控制接口（update / finish / cancel / apply）在状态不匹配时静默忽略，
//! 不返回错误；只有场景构建与视图树结构编辑会报错。

use thiserror::Error;

use crate::scene::{ControllerId, ViewId};

/// 场景图结构错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    /// 视图不存在
    #[error("视图 {0} 不存在")]
    ViewNotFound(ViewId),

    /// 控制器不存在
    #[error("控制器 {0} 不存在")]
    ControllerNotFound(ControllerId),

    /// 插入位置越界
    #[error("视图 {parent} 的子视图插入位置 {index} 越界（共 {len} 个子视图）")]
    IndexOutOfRange {
        parent: ViewId,
        index: usize,
        len: usize,
    },

    /// 会形成环的层级操作
    #[error("不能把视图 {child} 加入到它自己的子孙 {parent} 中")]
    CycleDetected { parent: ViewId, child: ViewId },

    /// 窗口根视图不能被移动
    #[error("窗口根视图不能被移动或删除")]
    WindowIsImmutable,
}

/// 统一错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MotionError {
    #[error("场景错误: {0}")]
    Scene(#[from] SceneError),

    #[error("过渡请求无效: {0}")]
    InvalidRequest(String),
}

/// Result 类型别名
pub type MotionResult<T> = Result<T, MotionError>;
