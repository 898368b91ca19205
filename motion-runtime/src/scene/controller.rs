//! # Controller 模块
//!
//! 视图控制器记录：根视图、容器类别、模态呈现方式与每个控制器的默认过渡。

use serde::{Deserialize, Serialize};

use super::ViewId;
use crate::transition_type::TransitionType;

/// 控制器类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerKind {
    #[default]
    Plain,
    Navigation,
    TabBar,
}

/// 模态呈现方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModalPresentationStyle {
    #[default]
    FullScreen,
    /// 呈现后下层内容保持可见
    OverFullScreen,
    OverCurrentContext,
}

impl ModalPresentationStyle {
    pub fn is_over_full_screen(&self) -> bool {
        matches!(
            self,
            ModalPresentationStyle::OverFullScreen | ModalPresentationStyle::OverCurrentContext
        )
    }
}

/// 视图控制器
#[derive(Debug, Clone, PartialEq)]
pub struct ViewController {
    pub name: Option<String>,
    pub root: ViewId,
    pub kind: ControllerKind,
    pub modal_presentation_style: ModalPresentationStyle,
    /// 为 false 时不接管该控制器的过渡
    pub is_motion_enabled: bool,
    /// 作为被呈现控制器时的默认过渡
    pub modal_transition: TransitionType,
    /// 作为导航控制器时的默认过渡
    pub navigation_transition: TransitionType,
    /// 作为标签栏控制器时的默认过渡
    pub tab_transition: TransitionType,
    /// OverFullScreen 呈现后留在窗口上的源快照
    pub(crate) stored_snapshot: Option<ViewId>,
}

impl ViewController {
    pub fn new(root: ViewId) -> Self {
        Self {
            name: None,
            root,
            kind: ControllerKind::Plain,
            modal_presentation_style: ModalPresentationStyle::FullScreen,
            is_motion_enabled: true,
            modal_transition: TransitionType::Auto,
            navigation_transition: TransitionType::Auto,
            tab_transition: TransitionType::Auto,
            stored_snapshot: None,
        }
    }

    pub fn with_kind(mut self, kind: ControllerKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn stored_snapshot(&self) -> Option<ViewId> {
        self.stored_snapshot
    }
}
