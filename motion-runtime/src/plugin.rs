//! # Plugin 模块
//!
//! 插件同时是预处理器和动画器：在内置预处理器之后、时长预处理器之前处理
//! 目标状态，并排在内置动画器之后参与动画。
//!
//! 启用哪些插件由 [`PluginRegistry`] 这个显式的值决定；每次过渡开始时按注册
//! 顺序创建全新的插件实例，过渡结束后丢弃。

use std::any::TypeId;

use crate::animator::Animator;
use crate::preprocess::Preprocessor;

/// 过渡插件
pub trait Plugin: Preprocessor + Animator {
    /// 插件名（日志与报告使用）
    fn name(&self) -> &'static str;

    /// 自动播放期间是否需要逐帧收到 `seek`
    fn requires_per_frame_callback(&self) -> bool {
        false
    }
}

fn instantiate_plugin<P: Plugin + Default + 'static>() -> Box<dyn Plugin> {
    Box::new(P::default())
}

#[derive(Debug, Clone, Copy)]
struct PluginEntry {
    type_id: TypeId,
    type_name: &'static str,
    factory: fn() -> Box<dyn Plugin>,
    enabled: bool,
}

/// 插件注册表
#[derive(Debug, Clone, Default)]
pub struct PluginRegistry {
    entries: Vec<PluginEntry>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册并启用插件；已注册时只启用
    pub fn with<P: Plugin + Default + 'static>(&self) -> Self {
        let mut next = self.clone();
        let type_id = TypeId::of::<P>();
        match next.entries.iter_mut().find(|e| e.type_id == type_id) {
            Some(entry) => entry.enabled = true,
            None => next.entries.push(PluginEntry {
                type_id,
                type_name: std::any::type_name::<P>(),
                factory: instantiate_plugin::<P>,
                enabled: true,
            }),
        }
        next
    }

    /// 启用已注册的插件；未注册时原样返回
    pub fn enable<P: 'static>(&self) -> Self {
        self.set_enabled::<P>(true)
    }

    pub fn disable<P: 'static>(&self) -> Self {
        self.set_enabled::<P>(false)
    }

    fn set_enabled<P: 'static>(&self, enabled: bool) -> Self {
        let mut next = self.clone();
        let type_id = TypeId::of::<P>();
        for entry in next.entries.iter_mut().filter(|e| e.type_id == type_id) {
            entry.enabled = enabled;
        }
        next
    }

    pub fn is_registered<P: 'static>(&self) -> bool {
        let type_id = TypeId::of::<P>();
        self.entries.iter().any(|e| e.type_id == type_id)
    }

    pub fn is_enabled<P: 'static>(&self) -> bool {
        let type_id = TypeId::of::<P>();
        self.entries
            .iter()
            .any(|e| e.type_id == type_id && e.enabled)
    }

    /// 已启用插件的类型名
    pub fn enabled_type_names(&self) -> Vec<&'static str> {
        self.entries
            .iter()
            .filter(|e| e.enabled)
            .map(|e| e.type_name)
            .collect()
    }

    /// 按注册顺序创建已启用插件的新实例
    pub fn instantiate(&self) -> Vec<Box<dyn Plugin>> {
        self.entries
            .iter()
            .filter(|e| e.enabled)
            .map(|e| (e.factory)())
            .collect()
    }
}
