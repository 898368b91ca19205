//! # Animator 模块
//!
//! 动画器：把目标状态落实为快照上的动画，并支持拖动、继续与反向。
//!
//! ## 结构
//!
//! - [`Animator`]：状态机面对的动画器接口
//! - [`ViewContext`]：单个视图的动画上下文，由 [`CoreAnimator`] 按视图持有
//! - [`LayerViewContext`]：按图层键构建动画（位置、尺寸、透明度、圆角……）
//! - [`EffectViewContext`]：效果视图的效果开关混合
//!
//! 时长约定：`animate` 返回 [`AnimatorDuration::Interactive`] 表示该动画器
//! 需要手动驱动进度，状态机不会为它启动自动完成。

mod effect_context;
mod layer_context;

use std::collections::BTreeMap;

use tracing::debug;

pub use effect_context::EffectViewContext;
pub use layer_context::LayerViewContext;

use crate::context::TransitionContext;
use crate::preprocess::optimized_duration;
use crate::scene::{ViewId, ViewTree};
use crate::target_state::TargetState;

/// 动画器给出的时长
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnimatorDuration {
    /// 自动播放所需的秒数
    Finite(f64),
    /// 需要交互式驱动
    Interactive,
}

impl AnimatorDuration {
    pub fn seconds(&self) -> Option<f64> {
        match self {
            AnimatorDuration::Finite(d) => Some(*d),
            AnimatorDuration::Interactive => None,
        }
    }
}

/// 动画器
pub trait Animator {
    /// 是否处理这个视图
    fn can_animate(
        &self,
        tree: &ViewTree,
        context: &TransitionContext,
        view: ViewId,
        appearing: bool,
    ) -> bool;

    /// 为视图创建动画，返回所需时长
    fn animate(
        &mut self,
        tree: &mut ViewTree,
        context: &mut TransitionContext,
        from_views: &[ViewId],
        to_views: &[ViewId],
    ) -> AnimatorDuration;

    /// 暂停在 `elapsed` 秒处
    fn seek(&mut self, tree: &mut ViewTree, elapsed: f64);

    /// 从 `elapsed` 秒处继续播放（或反向），返回到停止为止还需的秒数
    fn resume(&mut self, tree: &mut ViewTree, elapsed: f64, reversed: bool) -> f64;

    /// 把目标状态直接应用到视图上，保持到下一次 `resume`
    fn apply(&mut self, tree: &mut ViewTree, state: &TargetState, view: ViewId);

    /// 过渡结束时清理
    fn clean(&mut self, tree: &mut ViewTree);
}

/// 视图动画上下文共用的字段
#[derive(Debug, Clone, PartialEq)]
pub struct ViewContextBase {
    /// 真实视图
    pub view: ViewId,
    /// 被动画的节点（快照或不拍快照时的真实视图）
    pub snapshot: ViewId,
    pub target_state: TargetState,
    pub is_appearing: bool,
    pub duration: f64,
}

/// 单个视图的动画上下文
pub trait ViewContext {
    fn can_animate(tree: &ViewTree, view: ViewId, state: &TargetState, appearing: bool) -> bool
    where
        Self: Sized;

    fn new(base: ViewContextBase) -> Self
    where
        Self: Sized;

    fn base(&self) -> &ViewContextBase;

    fn base_mut(&mut self) -> &mut ViewContextBase;

    /// 开始动画，返回到停止为止的秒数（含延迟）
    fn start_animations(&mut self, tree: &mut ViewTree) -> f64;

    fn seek(&mut self, tree: &mut ViewTree, elapsed: f64);

    fn resume(&mut self, tree: &mut ViewTree, elapsed: f64, reversed: bool) -> f64;

    fn apply(&mut self, tree: &mut ViewTree, state: &TargetState);

    fn clean(&mut self, tree: &mut ViewTree);
}

/// 按视图持有动画上下文的通用动画器
#[derive(Debug)]
pub struct CoreAnimator<C> {
    contexts: BTreeMap<ViewId, C>,
}

impl<C> Default for CoreAnimator<C> {
    fn default() -> Self {
        Self {
            contexts: BTreeMap::new(),
        }
    }
}

impl<C: ViewContext> CoreAnimator<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view_context(&self, view: ViewId) -> Option<&C> {
        self.contexts.get(&view)
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    fn create_view_context(
        &mut self,
        tree: &mut ViewTree,
        context: &mut TransitionContext,
        view: ViewId,
        appearing: bool,
    ) {
        let Some(state) = context.target_state(view).cloned() else {
            return;
        };
        let snapshot = context.snapshot_view(tree, view);
        let duration = match state.seconds() {
            Some(seconds) => seconds,
            None => tree
                .presentation(snapshot)
                .map_or(0.0, |props| optimized_duration(&props, &state)),
        };
        self.contexts.insert(
            view,
            C::new(ViewContextBase {
                view,
                snapshot,
                target_state: state,
                is_appearing: appearing,
                duration,
            }),
        );
    }
}

impl<C: ViewContext> Animator for CoreAnimator<C> {
    fn can_animate(
        &self,
        tree: &ViewTree,
        context: &TransitionContext,
        view: ViewId,
        appearing: bool,
    ) -> bool {
        context
            .target_state(view)
            .is_some_and(|state| C::can_animate(tree, view, state, appearing))
    }

    fn animate(
        &mut self,
        tree: &mut ViewTree,
        context: &mut TransitionContext,
        from_views: &[ViewId],
        to_views: &[ViewId],
    ) -> AnimatorDuration {
        for &view in from_views {
            self.create_view_context(tree, context, view, false);
        }
        for &view in to_views {
            self.create_view_context(tree, context, view, true);
        }

        let mut longest: f64 = 0.0;
        for view_context in self.contexts.values_mut() {
            longest = longest.max(view_context.start_animations(tree));
        }
        debug!(views = self.contexts.len(), longest, "动画器开始");
        AnimatorDuration::Finite(longest)
    }

    fn seek(&mut self, tree: &mut ViewTree, elapsed: f64) {
        for view_context in self.contexts.values_mut() {
            view_context.seek(tree, elapsed);
        }
    }

    fn resume(&mut self, tree: &mut ViewTree, elapsed: f64, reversed: bool) -> f64 {
        let mut longest: f64 = 0.0;
        for view_context in self.contexts.values_mut() {
            let base = view_context.base();
            if !base.target_state.has_explicit_duration() {
                // 未指定时长的视图按当前位置重新估算
                let optimized = tree
                    .presentation(base.snapshot)
                    .map(|props| optimized_duration(&props, &base.target_state));
                if let Some(optimized) = optimized {
                    let base = view_context.base_mut();
                    base.duration = base.duration.max(optimized + elapsed);
                }
            }
            longest = longest.max(view_context.resume(tree, elapsed, reversed));
        }
        longest
    }

    fn apply(&mut self, tree: &mut ViewTree, state: &TargetState, view: ViewId) {
        if let Some(view_context) = self.contexts.get_mut(&view) {
            view_context.apply(tree, state);
        }
    }

    fn clean(&mut self, tree: &mut ViewTree) {
        for view_context in self.contexts.values_mut() {
            view_context.clean(tree);
        }
        self.contexts.clear();
    }
}

/// 内置动画器：图层动画器在前，效果动画器在后
pub fn builtin_animators() -> Vec<Box<dyn Animator>> {
    vec![
        Box::new(CoreAnimator::<LayerViewContext>::new()),
        Box::new(CoreAnimator::<EffectViewContext>::new()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Point, Rect};
    use crate::modifier::Modifier;
    use crate::preprocess::test_support::Harness;
    use crate::scene::{LayerKey, LayerSlot, ViewKind};
    use crate::transition::TransitionKind;

    fn moving_view(h: &mut Harness, modifiers: Vec<Modifier>) -> ViewId {
        let v = h
            .tree
            .add_view(h.from_root, ViewKind::Plain, Rect::new(0.0, 0.0, 100.0, 100.0))
            .unwrap();
        h.tree.set_modifiers(v, modifiers);
        v
    }

    #[test]
    fn test_animate_reports_longest_duration() {
        let mut h = Harness::new(TransitionKind::Present);
        let a = moving_view(&mut h, vec![Modifier::Fade, Modifier::Duration(0.4)]);
        let b = moving_view(
            &mut h,
            vec![Modifier::Fade, Modifier::Duration(0.3), Modifier::Delay(0.2)],
        );
        h.index();

        let mut animator = CoreAnimator::<LayerViewContext>::new();
        let duration = animator.animate(&mut h.tree, &mut h.context, &[a, b], &[]);
        assert_eq!(duration, AnimatorDuration::Finite(0.5));
        assert_eq!(animator.len(), 2);
        assert!(animator.view_context(a).is_some());
    }

    #[test]
    fn test_missing_duration_uses_optimized() {
        let mut h = Harness::new(TransitionKind::Present);
        let a = moving_view(&mut h, vec![Modifier::Position(Point::new(50.0, 350.0))]);
        h.index();

        let mut animator = CoreAnimator::<LayerViewContext>::new();
        animator.animate(&mut h.tree, &mut h.context, &[a], &[]);
        let duration = animator.view_context(a).unwrap().base().duration;
        assert!((duration - 0.308).abs() < 1e-9);
    }

    #[test]
    fn test_can_animate_requires_target_state() {
        let mut h = Harness::new(TransitionKind::Present);
        let plain = moving_view(&mut h, vec![]);
        let faded = moving_view(&mut h, vec![Modifier::Fade]);
        h.index();

        let animator = CoreAnimator::<LayerViewContext>::new();
        assert!(!animator.can_animate(&h.tree, &h.context, plain, false));
        assert!(animator.can_animate(&h.tree, &h.context, faded, false));
    }

    #[test]
    fn test_resume_extends_optimized_duration() {
        let mut h = Harness::new(TransitionKind::Present);
        let a = moving_view(&mut h, vec![Modifier::Position(Point::new(50.0, 350.0))]);
        h.index();
        h.context.target_state_mut(a).unwrap().duration =
            Some(crate::target_state::TargetDuration::Optimized(0.1));

        let mut animator = CoreAnimator::<LayerViewContext>::new();
        animator.animate(&mut h.tree, &mut h.context, &[a], &[]);
        animator.seek(&mut h.tree, 0.0);
        animator.resume(&mut h.tree, 0.05, false);
        // 0.308 + 0.05
        let duration = animator.view_context(a).unwrap().base().duration;
        assert!((duration - 0.358).abs() < 1e-9);
    }

    #[test]
    fn test_clean_drops_contexts_and_animations() {
        let mut h = Harness::new(TransitionKind::Present);
        let a = moving_view(&mut h, vec![Modifier::Fade, Modifier::Duration(0.4)]);
        h.index();

        let mut animator = CoreAnimator::<LayerViewContext>::new();
        animator.animate(&mut h.tree, &mut h.context, &[a], &[]);
        let snapshot = h.context.snapshot(a).unwrap();
        assert!(h.tree.layer(snapshot, LayerSlot::Main).unwrap().animation(LayerKey::Opacity).is_some());

        animator.clean(&mut h.tree);
        assert!(animator.is_empty());
        assert!(!h.tree.layer(snapshot, LayerSlot::Main).unwrap().has_animations());
    }
}
