//! # EffectViewContext
//!
//! 效果视图的透明度：图层无法插值效果本身，改为在“有效果”和“无效果”之间
//! 按完成比例线性混合。

use super::{ViewContext, ViewContextBase};
use crate::scene::{EffectAnimation, ViewId, ViewKind, ViewTree, VisualEffect};
use crate::target_state::TargetState;

#[derive(Debug, Clone, PartialEq)]
pub struct EffectViewContext {
    base: ViewContextBase,
    start_effect: Option<VisualEffect>,
    end_effect: Option<VisualEffect>,
    /// 开始前的模型效果
    original_effect: Option<VisualEffect>,
}

impl EffectViewContext {
    fn set_model_effect(tree: &mut ViewTree, node: ViewId, value: Option<VisualEffect>) {
        if let Some(node) = tree.view_mut(node) {
            if let ViewKind::EffectView { effect } = &mut node.kind {
                *effect = value;
            }
        }
    }

    fn fraction_for(&self, elapsed: f64) -> f64 {
        if self.base.duration > 0.0 {
            (elapsed / self.base.duration).clamp(0.0, 1.0)
        } else {
            1.0
        }
    }
}

impl ViewContext for EffectViewContext {
    fn can_animate(tree: &ViewTree, view: ViewId, state: &TargetState, _appearing: bool) -> bool {
        tree.is_effect_view(view) && state.opacity.is_some()
    }

    fn new(base: ViewContextBase) -> Self {
        Self {
            base,
            start_effect: None,
            end_effect: None,
            original_effect: None,
        }
    }

    fn base(&self) -> &ViewContextBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ViewContextBase {
        &mut self.base
    }

    fn start_animations(&mut self, tree: &mut ViewTree) -> f64 {
        let snapshot = self.base.snapshot;
        if !tree.is_effect_view(snapshot) {
            return 0.0;
        }
        let appeared = tree.presented_effect(snapshot);
        let disappeared = if self.base.target_state.opacity == Some(0.0) {
            None
        } else {
            appeared
        };
        let (start, end) = if self.base.is_appearing {
            (disappeared, appeared)
        } else {
            (appeared, disappeared)
        };
        self.start_effect = start;
        self.end_effect = end;
        self.original_effect = tree.view(snapshot).and_then(|node| match &node.kind {
            ViewKind::EffectView { effect } => *effect,
            _ => None,
        });

        let now = tree.current_time();
        Self::set_model_effect(tree, snapshot, end);
        if let Some(node) = tree.view_mut(snapshot) {
            node.effect_animation = Some(EffectAnimation::start(start, end, self.base.duration, now));
        }
        self.base.duration
    }

    fn seek(&mut self, tree: &mut ViewTree, elapsed: f64) {
        let fraction = self.fraction_for(elapsed);
        if let Some(animation) = tree
            .view_mut(self.base.snapshot)
            .and_then(|node| node.effect_animation.as_mut())
        {
            animation.set_fraction(fraction);
        }
    }

    fn resume(&mut self, tree: &mut ViewTree, elapsed: f64, reversed: bool) -> f64 {
        let now = tree.current_time();
        let duration = self.base.duration;
        let snapshot = self.base.snapshot;
        let Some(current) = tree
            .view(snapshot)
            .and_then(|node| node.effect_animation.as_ref())
            .map(|animation| animation.fraction(now))
        else {
            return 0.0;
        };

        if reversed {
            let fraction = self.fraction_for(elapsed).min(current);
            let mut animation = EffectAnimation::start(self.end_effect, self.start_effect, duration, now);
            animation.set_fraction(1.0 - fraction);
            animation.resume(now);
            Self::set_model_effect(tree, snapshot, self.start_effect);
            if let Some(node) = tree.view_mut(snapshot) {
                node.effect_animation = Some(animation);
            }
            fraction * duration
        } else {
            if let Some(animation) = tree
                .view_mut(snapshot)
                .and_then(|node| node.effect_animation.as_mut())
            {
                animation.resume(now);
            }
            (1.0 - current) * duration
        }
    }

    fn apply(&mut self, _tree: &mut ViewTree, _state: &TargetState) {}

    fn clean(&mut self, tree: &mut ViewTree) {
        let snapshot = self.base.snapshot;
        if let Some(node) = tree.view_mut(snapshot) {
            node.effect_animation = None;
        }
        // 直接动画真实视图时恢复它原来的效果
        if snapshot == self.base.view {
            Self::set_model_effect(tree, snapshot, self.original_effect);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animator::{Animator, CoreAnimator};
    use crate::geometry::Rect;
    use crate::modifier::Modifier;
    use crate::preprocess::test_support::Harness;
    use crate::scene::EffectStyle;
    use crate::target_state::SnapshotStrategy;
    use crate::transition::TransitionKind;

    fn blur() -> VisualEffect {
        VisualEffect {
            style: EffectStyle::Dark,
            radius: 20.0,
        }
    }

    fn effect_view(h: &mut Harness, appearing: bool, modifiers: Vec<Modifier>) -> ViewId {
        let root = if appearing { h.to_root } else { h.from_root };
        let v = h
            .tree
            .add_view(
                root,
                ViewKind::EffectView {
                    effect: Some(blur()),
                },
                Rect::new(0.0, 0.0, 100.0, 100.0),
            )
            .unwrap();
        h.tree.set_modifiers(v, modifiers);
        v
    }

    #[test]
    fn test_can_animate_needs_effect_view_and_opacity() {
        let mut h = Harness::new(TransitionKind::Present);
        let faded = effect_view(&mut h, false, vec![Modifier::Fade]);
        let moved = effect_view(&mut h, false, vec![Modifier::translate(10.0, 0.0)]);
        let plain = h
            .tree
            .add_view(h.from_root, ViewKind::Plain, Rect::new(0.0, 0.0, 10.0, 10.0))
            .unwrap();
        h.tree.set_modifiers(plain, vec![Modifier::Fade]);
        h.index();

        let animator = CoreAnimator::<EffectViewContext>::new();
        assert!(animator.can_animate(&h.tree, &h.context, faded, false));
        assert!(!animator.can_animate(&h.tree, &h.context, moved, false));
        assert!(!animator.can_animate(&h.tree, &h.context, plain, false));
    }

    #[test]
    fn test_fade_out_blends_effect_away() {
        let mut h = Harness::new(TransitionKind::Present);
        let v = effect_view(&mut h, false, vec![Modifier::Fade, Modifier::Duration(0.4)]);
        h.index();

        let mut animator = CoreAnimator::<EffectViewContext>::new();
        let duration = animator.animate(&mut h.tree, &mut h.context, &[v], &[]);
        assert_eq!(duration.seconds(), Some(0.4));

        let snapshot = h.context.snapshot(v).unwrap();
        assert_eq!(h.tree.presented_effect(snapshot), Some(blur()));

        animator.seek(&mut h.tree, 0.2);
        assert_eq!(h.tree.presented_effect(snapshot).map(|e| e.radius), Some(10.0));

        // 反向：回到完整效果还需 0.2 秒
        let back = animator.resume(&mut h.tree, 0.2, true);
        assert!((back - 0.2).abs() < 1e-9);
        h.tree.advance_time(0.2);
        assert_eq!(h.tree.presented_effect(snapshot), Some(blur()));
    }

    #[test]
    fn test_appearing_with_partial_opacity_keeps_effect() {
        let mut h = Harness::new(TransitionKind::Present);
        let v = effect_view(&mut h, true, vec![Modifier::Opacity(0.5)]);
        h.index();

        let mut animator = CoreAnimator::<EffectViewContext>::new();
        animator.animate(&mut h.tree, &mut h.context, &[], &[v]);
        let snapshot = h.context.snapshot(v).unwrap();
        animator.seek(&mut h.tree, 0.0);
        assert_eq!(h.tree.presented_effect(snapshot), Some(blur()));
    }

    #[test]
    fn test_live_view_effect_restored_on_clean() {
        let mut h = Harness::new(TransitionKind::Present);
        let v = effect_view(
            &mut h,
            false,
            vec![
                Modifier::Fade,
                Modifier::Duration(0.3),
                Modifier::Snapshot(SnapshotStrategy::NoSnapshot),
            ],
        );
        h.index();

        let mut animator = CoreAnimator::<EffectViewContext>::new();
        animator.animate(&mut h.tree, &mut h.context, &[v], &[]);
        h.tree.advance_time(1.0);
        assert_eq!(h.tree.presented_effect(v), None);

        animator.clean(&mut h.tree);
        assert_eq!(h.tree.presented_effect(v), Some(blur()));
    }
}
