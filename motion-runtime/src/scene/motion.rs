//! # Motion 侧表
//!
//! 每个视图的过渡声明（标识符、修饰器列表、开关）与保存的透明度。
//! 以视图 id 为键存放在视图树上，而不是挂在视图对象本身。

use crate::modifier::Modifier;

/// 单个视图的过渡声明
#[derive(Debug, Clone, PartialEq)]
pub struct ViewMotion {
    /// 跨层级匹配用的标识符
    pub identifier: Option<String>,
    pub modifiers: Vec<Modifier>,
    /// 为 false 时视图及其子树都不参与过渡
    pub is_enabled: bool,
    /// 为 false 时只有视图本身参与过渡
    pub is_enabled_for_subviews: bool,
    /// OverFullScreen 呈现期间保存的透明度
    pub(crate) stored_alpha: Option<f64>,
}

impl Default for ViewMotion {
    fn default() -> Self {
        Self {
            identifier: None,
            modifiers: Vec::new(),
            is_enabled: true,
            is_enabled_for_subviews: true,
            stored_alpha: None,
        }
    }
}

impl ViewMotion {
    pub fn stored_alpha(&self) -> Option<f64> {
        self.stored_alpha
    }
}
