//! 过渡请求与选项

use serde::{Deserialize, Serialize};

use crate::geometry::Color;
use crate::scene::{ControllerId, ViewId};
use crate::timing::TimingFunction;
use crate::transition_type::TransitionType;

/// 过渡来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    Present,
    Dismiss,
    Push,
    Pop,
    TabSwitch { from_index: usize, to_index: usize },
    Custom { presenting: bool },
}

impl TransitionKind {
    pub fn is_presenting(&self) -> bool {
        match self {
            TransitionKind::Present | TransitionKind::Push => true,
            TransitionKind::Dismiss | TransitionKind::Pop => false,
            TransitionKind::TabSwitch {
                from_index,
                to_index,
            } => to_index > from_index,
            TransitionKind::Custom { presenting } => *presenting,
        }
    }

    pub fn is_navigation(&self) -> bool {
        matches!(self, TransitionKind::Push | TransitionKind::Pop)
    }

    pub fn is_tab_bar(&self) -> bool {
        matches!(self, TransitionKind::TabSwitch { .. })
    }

    pub fn is_modal(&self) -> bool {
        matches!(self, TransitionKind::Present | TransitionKind::Dismiss)
    }
}

/// 快照叠放顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewOrderStrategy {
    /// 消失（非标签页切换）时目标在下
    #[default]
    Auto,
    SourceViewOnTop,
    DestinationViewOnTop,
}

/// 过渡选项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionOptions {
    /// 默认过渡原型使用的时长（秒）
    #[serde(default = "default_duration")]
    pub default_duration: f64,

    #[serde(default)]
    pub default_timing: TimingFunction,

    /// 过渡容器背景色（OverFullScreen 呈现时不使用）
    #[serde(default = "default_container_background")]
    pub container_background: Option<Color>,

    #[serde(default)]
    pub view_order: ViewOrderStrategy,

    /// 过渡期间是否允许交互
    #[serde(default)]
    pub is_user_interaction_enabled: bool,
}

fn default_duration() -> f64 {
    0.35
}

fn default_container_background() -> Option<Color> {
    Some(Color::BLACK)
}

impl Default for TransitionOptions {
    fn default() -> Self {
        Self {
            default_duration: default_duration(),
            default_timing: TimingFunction::default(),
            container_background: default_container_background(),
            view_order: ViewOrderStrategy::default(),
            is_user_interaction_enabled: false,
        }
    }
}

/// 过渡请求
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionRequest {
    pub from: ControllerId,
    pub to: ControllerId,
    /// 宿主提供的过渡容器
    pub container: ViewId,
    pub kind: TransitionKind,
    /// 导航 / 标签页容器控制器
    pub host: Option<ControllerId>,
    /// 本次过渡指定的默认类型
    pub animation: TransitionType,
}

impl TransitionRequest {
    pub fn new(from: ControllerId, to: ControllerId, container: ViewId, kind: TransitionKind) -> Self {
        Self {
            from,
            to,
            container,
            kind,
            host: None,
            animation: TransitionType::Auto,
        }
    }

    pub fn with_host(mut self, host: ControllerId) -> Self {
        self.host = Some(host);
        self
    }

    pub fn with_animation(mut self, animation: TransitionType) -> Self {
        self.animation = animation;
        self
    }
}

/// 已认领的过渡的不变信息
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionInfo {
    pub kind: TransitionKind,
    pub is_presenting: bool,
    pub from: ControllerId,
    pub to: ControllerId,
    pub host: Option<ControllerId>,
    pub from_view: ViewId,
    pub to_view: ViewId,
    pub default_type: TransitionType,
    pub from_over_full_screen: bool,
    pub to_over_full_screen: bool,
    pub options: TransitionOptions,
}
