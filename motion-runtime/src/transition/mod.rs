//! # Transition 模块
//!
//! 过渡状态机：认领过渡请求、搭建过渡容器、运行预处理管线、驱动动画器，
//! 并在结束时把视图层级恢复原状。
//!
//! ## 生命周期
//!
//! ```text
//! begin(request)   Possible  → Notified
//! start(tree)      Notified  → Starting   （下一帧执行 animate）
//! animate          Starting  → Animating  （自动完成或进入交互模式）
//! complete         Animating → Completing → Possible
//! ```
//!
//! 宿主每帧调用 [`MotionTransition::tick`]，依次推进媒体时钟、推进自动进度、
//! 执行到期的延迟任务，并取走这一帧产生的 [`TransitionEvent`]。
//!
//! 控制接口（`update` / `finish` / `cancel` / `apply`）在状态不匹配时静默忽略。
//! `finish` / `cancel` 若在动画构建之前调用，决定会被记下，动画开始时立即生效。

mod animate;
mod complete;
mod control;
mod options;
mod start;
mod state;

use serde::Serialize;
use tracing::{debug, info};

pub use options::{
    TransitionInfo, TransitionKind, TransitionOptions, TransitionRequest, ViewOrderStrategy,
};
pub use state::{HookScope, TransitionEvent, TransitionState};

use state::Deferred;

use crate::animator::Animator;
use crate::clock::{DelayQueue, ProgressRunner, RunnerStep};
use crate::context::TransitionContext;
use crate::plugin::{Plugin, PluginRegistry};
use crate::preprocess::Preprocessor;
use crate::scene::{ViewId, ViewTree};

/// 过渡状态机
///
/// 同一时刻只处理一个过渡；`Possible` 以外的状态下新的 `begin` 会被拒绝。
pub struct MotionTransition {
    options: TransitionOptions,
    registry: PluginRegistry,
    state: TransitionState,

    // ── 单次过渡的临时状态，complete 时全部复位 ──
    request: Option<TransitionRequest>,
    info: Option<TransitionInfo>,
    /// 引擎创建的过渡容器
    container: Option<ViewId>,
    /// 准备期间盖住源视图的整屏快照
    full_screen_snapshot: Option<ViewId>,
    context: Option<TransitionContext>,
    preprocessors: Vec<Box<dyn Preprocessor>>,
    animators: Vec<Box<dyn Animator>>,
    plugins: Vec<Box<dyn Plugin>>,
    animating_from_views: Vec<ViewId>,
    animating_to_views: Vec<ViewId>,
    total_duration: f64,
    progress: f64,
    starting_progress: Option<f64>,
    force_finishing: Option<bool>,
    /// 已开始自动完成；此后进度不再为负
    is_committed: bool,
    runner: ProgressRunner,
    deferred: DelayQueue<Deferred>,

    events: Vec<TransitionEvent>,
}

/// 状态机字段的可比较快照（测试与报告使用）
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransitionFields {
    pub state: TransitionState,
    pub has_request: bool,
    pub container: Option<ViewId>,
    pub full_screen_snapshot: Option<ViewId>,
    pub has_context: bool,
    pub preprocessors: usize,
    pub animators: usize,
    pub plugins: usize,
    pub animating_from_views: Vec<ViewId>,
    pub animating_to_views: Vec<ViewId>,
    pub total_duration: f64,
    pub progress: f64,
    pub starting_progress: Option<f64>,
    pub force_finishing: Option<bool>,
    pub is_committed: bool,
    pub runner: ProgressRunner,
    pub pending_tasks: usize,
}

impl MotionTransition {
    pub fn new(options: TransitionOptions, registry: PluginRegistry) -> Self {
        Self {
            options,
            registry,
            state: TransitionState::Possible,
            request: None,
            info: None,
            container: None,
            full_screen_snapshot: None,
            context: None,
            preprocessors: Vec::new(),
            animators: Vec::new(),
            plugins: Vec::new(),
            animating_from_views: Vec::new(),
            animating_to_views: Vec::new(),
            total_duration: 0.0,
            progress: 0.0,
            starting_progress: None,
            force_finishing: None,
            is_committed: false,
            runner: ProgressRunner::new(),
            deferred: DelayQueue::new(),
            events: Vec::new(),
        }
    }

    // ── 访问器 ──

    pub fn state(&self) -> TransitionState {
        self.state
    }

    /// 是否有过渡正在进行
    pub fn is_transitioning(&self) -> bool {
        self.state != TransitionState::Possible
    }

    /// 动画中且没有自动进度在跑
    pub fn is_interactive(&self) -> bool {
        self.state == TransitionState::Animating && !self.runner.is_running()
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn total_duration(&self) -> f64 {
        self.total_duration
    }

    pub fn options(&self) -> &TransitionOptions {
        &self.options
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    pub fn info(&self) -> Option<&TransitionInfo> {
        self.info.as_ref()
    }

    pub fn context(&self) -> Option<&TransitionContext> {
        self.context.as_ref()
    }

    pub fn container(&self) -> Option<ViewId> {
        self.container
    }

    /// 只在空闲时生效
    pub fn set_options(&mut self, options: TransitionOptions) {
        if self.state == TransitionState::Possible {
            self.options = options;
        }
    }

    /// 只在空闲时生效；新的插件集合从下一次过渡开始使用
    pub fn set_registry(&mut self, registry: PluginRegistry) {
        if self.state == TransitionState::Possible {
            self.registry = registry;
        }
    }

    pub fn fields(&self) -> TransitionFields {
        TransitionFields {
            state: self.state,
            has_request: self.request.is_some(),
            container: self.container,
            full_screen_snapshot: self.full_screen_snapshot,
            has_context: self.context.is_some(),
            preprocessors: self.preprocessors.len(),
            animators: self.animators.len(),
            plugins: self.plugins.len(),
            animating_from_views: self.animating_from_views.clone(),
            animating_to_views: self.animating_to_views.clone(),
            total_duration: self.total_duration,
            progress: self.progress,
            starting_progress: self.starting_progress,
            force_finishing: self.force_finishing,
            is_committed: self.is_committed,
            runner: self.runner.clone(),
            pending_tasks: self.deferred.len(),
        }
    }

    /// 取走已产生的事件
    pub fn drain_events(&mut self) -> Vec<TransitionEvent> {
        std::mem::take(&mut self.events)
    }

    // ── 入口 ──

    /// 认领过渡请求
    ///
    /// 要求当前空闲、两个控制器都存在且允许过渡（有容器控制器时看容器控制器）。
    pub fn begin(&mut self, tree: &ViewTree, request: TransitionRequest) -> bool {
        if self.state != TransitionState::Possible {
            debug!(state = ?self.state, "已有过渡进行中，拒绝新的请求");
            return false;
        }
        let (Some(from), Some(to)) = (tree.controller(request.from), tree.controller(request.to))
        else {
            debug!(from = %request.from, to = %request.to, "控制器不存在");
            return false;
        };
        if !tree.contains(request.container) {
            debug!(container = %request.container, "过渡容器不存在");
            return false;
        }

        let enabled = match request.host.and_then(|id| tree.controller(id)) {
            Some(host) => host.is_motion_enabled,
            None => from.is_motion_enabled && to.is_motion_enabled,
        };
        if !enabled {
            debug!("控制器关闭了过渡");
            return false;
        }

        let kind = request.kind;
        let is_presenting = kind.is_presenting();
        let from_over_full_screen = !kind.is_navigation()
            && !kind.is_tab_bar()
            && !is_presenting
            && from.modal_presentation_style.is_over_full_screen();
        let to_over_full_screen = is_presenting && to.modal_presentation_style.is_over_full_screen();

        self.info = Some(TransitionInfo {
            kind,
            is_presenting,
            from: request.from,
            to: request.to,
            host: request.host,
            from_view: from.root,
            to_view: to.root,
            default_type: request.animation.clone(),
            from_over_full_screen,
            to_over_full_screen,
            options: self.options.clone(),
        });
        self.request = Some(request);
        self.state = TransitionState::Notified;
        info!(?kind, is_presenting, "认领过渡");
        true
    }

    /// `begin` 后立即 `start`
    pub fn transition(&mut self, tree: &mut ViewTree, request: TransitionRequest) -> bool {
        if !self.begin(tree, request) {
            return false;
        }
        self.start(tree);
        true
    }

    /// 推进一帧
    pub fn tick(&mut self, tree: &mut ViewTree, dt: f64) -> Vec<TransitionEvent> {
        tree.advance_time(dt);

        match self.runner.advance(dt) {
            RunnerStep::Idle => {}
            RunnerStep::Progress(progress) => self.set_progress(tree, progress),
            RunnerStep::Complete { finished } => self.complete(tree, finished),
        }

        let now = tree.current_time();
        for task in self.deferred.drain_due(now) {
            match task {
                Deferred::Animate => self.animate(tree),
            }
        }

        self.drain_events()
    }

    /// 是否有动画器或插件认领这个视图
    fn is_claimed(&self, tree: &ViewTree, context: &TransitionContext, view: ViewId, appearing: bool) -> bool {
        self.animators
            .iter()
            .any(|a| a.can_animate(tree, context, view, appearing))
            || self
                .plugins
                .iter()
                .any(|p| p.can_animate(tree, context, view, appearing))
    }

    fn emit_hooks(&mut self, make: fn(HookScope) -> TransitionEvent) {
        let Some(info) = self.info.as_ref() else {
            return;
        };
        let (from, to) = (info.from, info.to);
        self.events.push(make(HookScope::Transition));
        self.events.push(make(HookScope::From(from)));
        self.events.push(make(HookScope::To(to)));
    }

    /// 复位全部临时状态，回到 `Possible`
    fn reset(&mut self) {
        self.request = None;
        self.info = None;
        self.container = None;
        self.full_screen_snapshot = None;
        self.context = None;
        self.preprocessors.clear();
        self.animators.clear();
        self.plugins.clear();
        self.animating_from_views.clear();
        self.animating_to_views.clear();
        self.total_duration = 0.0;
        self.progress = 0.0;
        self.starting_progress = None;
        self.force_finishing = None;
        self.is_committed = false;
        self.runner = ProgressRunner::new();
        self.deferred.clear();
        self.state = TransitionState::Possible;
    }
}

impl Default for MotionTransition {
    fn default() -> Self {
        Self::new(TransitionOptions::default(), PluginRegistry::new())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! 状态机测试共用的场景

    use crate::geometry::{Rect, Size};
    use crate::scene::{ControllerId, ViewController, ViewId, ViewKind, ViewTree};

    use super::{TransitionKind, TransitionRequest};

    pub struct Stage {
        pub tree: ViewTree,
        pub container: ViewId,
        pub from: ControllerId,
        pub to: ControllerId,
        pub from_root: ViewId,
        pub to_root: ViewId,
    }

    impl Stage {
        /// 窗口中一个过渡容器，源根视图已在容器中，目标根视图尚未上树
        pub fn new() -> Self {
            let mut tree = ViewTree::new(Size::new(400.0, 800.0));
            let window = tree.window();
            let bounds = Rect::new(0.0, 0.0, 400.0, 800.0);
            let container = tree.add_view(window, ViewKind::Plain, bounds).unwrap();
            let from_root = tree.add_view(container, ViewKind::Plain, bounds).unwrap();
            let to_root = tree.create_view(ViewKind::Plain, bounds);
            let from = tree.add_controller(ViewController::new(from_root).with_name("from"));
            let to = tree.add_controller(ViewController::new(to_root).with_name("to"));
            Self {
                tree,
                container,
                from,
                to,
                from_root,
                to_root,
            }
        }

        pub fn request(&self, kind: TransitionKind) -> TransitionRequest {
            TransitionRequest::new(self.from, self.to, self.container, kind)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::Stage;
    use super::*;
    use crate::scene::ModalPresentationStyle;

    #[test]
    fn test_begin_claims_only_when_possible() {
        let stage = Stage::new();
        let mut transition = MotionTransition::default();
        assert!(transition.begin(&stage.tree, stage.request(TransitionKind::Present)));
        assert_eq!(transition.state(), TransitionState::Notified);

        let before = transition.fields();
        assert!(!transition.begin(&stage.tree, stage.request(TransitionKind::Present)));
        assert_eq!(transition.fields(), before);
    }

    #[test]
    fn test_begin_respects_motion_enabled() {
        let mut stage = Stage::new();
        stage.tree.controller_mut(stage.to).unwrap().is_motion_enabled = false;
        let mut transition = MotionTransition::default();
        assert!(!transition.begin(&stage.tree, stage.request(TransitionKind::Present)));
        assert_eq!(transition.fields(), TransitionFields::default());
    }

    #[test]
    fn test_host_controller_decides_enabled() {
        let mut stage = Stage::new();
        let host_root = stage.tree.window();
        let host = stage
            .tree
            .add_controller(crate::scene::ViewController::new(host_root));
        stage.tree.controller_mut(stage.to).unwrap().is_motion_enabled = false;
        let mut transition = MotionTransition::default();
        let request = stage.request(TransitionKind::Push).with_host(host);
        assert!(transition.begin(&stage.tree, request));
    }

    #[test]
    fn test_over_full_screen_flags() {
        let mut stage = Stage::new();
        stage.tree.controller_mut(stage.to).unwrap().modal_presentation_style =
            ModalPresentationStyle::OverFullScreen;
        let mut transition = MotionTransition::default();
        transition.begin(&stage.tree, stage.request(TransitionKind::Present));
        let info = transition.info().unwrap();
        assert!(info.to_over_full_screen);
        assert!(!info.from_over_full_screen);

        // 导航转场不看源控制器的呈现方式
        let mut stage = Stage::new();
        stage.tree.controller_mut(stage.from).unwrap().modal_presentation_style =
            ModalPresentationStyle::OverFullScreen;
        let mut transition = MotionTransition::default();
        transition.begin(&stage.tree, stage.request(TransitionKind::Pop));
        assert!(!transition.info().unwrap().from_over_full_screen);
    }

    #[test]
    fn test_idle_fields_snapshot() {
        let transition = MotionTransition::default();
        insta::assert_debug_snapshot!(transition.fields(), @r###"
        TransitionFields {
            state: Possible,
            has_request: false,
            container: None,
            full_screen_snapshot: None,
            has_context: false,
            preprocessors: 0,
            animators: 0,
            plugins: 0,
            animating_from_views: [],
            animating_to_views: [],
            total_duration: 0.0,
            progress: 0.0,
            starting_progress: None,
            force_finishing: None,
            is_committed: false,
            runner: ProgressRunner {
                running: false,
                reversed: false,
                duration: 0.0,
                current_time: 0.0,
            },
            pending_tasks: 0,
        }
        "###);
    }

    #[test]
    fn test_set_options_only_when_idle() {
        let stage = Stage::new();
        let mut transition = MotionTransition::default();
        transition.begin(&stage.tree, stage.request(TransitionKind::Present));
        let mut options = TransitionOptions::default();
        options.default_duration = 1.0;
        transition.set_options(options);
        assert_eq!(transition.options().default_duration, 0.35);
    }
}
