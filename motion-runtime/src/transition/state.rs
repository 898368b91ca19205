//! 过渡状态与对外事件

use serde::Serialize;

use crate::scene::ControllerId;

/// 过渡状态机的状态
///
/// ```text
/// Possible ─begin→ Notified ─start→ Starting ─(下一帧)→ Animating ─→ Completing ─→ Possible
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum TransitionState {
    /// 空闲，可以认领新的过渡
    #[default]
    Possible,
    /// 已认领，尚未开始准备
    Notified,
    /// 准备中：快照、预处理
    Starting,
    /// 动画进行中（自动或交互）
    Animating,
    /// 收尾中
    Completing,
}

/// 通知的作用范围
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HookScope {
    /// 整个过渡
    Transition,
    /// 离开的控制器
    From(ControllerId),
    /// 进入的控制器
    To(ControllerId),
}

/// 过渡事件，由调用方在 `tick` 或控制调用后取走
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TransitionEvent {
    WillStart(HookScope),
    ProgressUpdated(f64),
    Completed { finished: bool },
    DidEnd(HookScope),
    DidCancel(HookScope),
}

impl TransitionEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransitionEvent::Completed { .. })
    }
}

/// 延迟执行的内部任务
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Deferred {
    Animate,
}
