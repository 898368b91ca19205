//! 动画阶段：拍快照、交给各动画器构建动画、决定自动完成还是交互驱动

use tracing::{debug, info};

use super::{MotionTransition, TransitionState};
use crate::animator::AnimatorDuration;
use crate::scene::{ViewId, ViewTree};

fn claimed(views: &[ViewId], can: impl Fn(ViewId) -> bool) -> Vec<ViewId> {
    views.iter().copied().filter(|&v| can(v)).collect()
}

impl MotionTransition {
    pub(super) fn animate(&mut self, tree: &mut ViewTree) {
        if self.state != TransitionState::Starting {
            return;
        }
        let (Some(mut context), Some(info)) = (self.context.take(), self.info.as_ref()) else {
            return;
        };
        let to_view = info.to_view;
        self.state = TransitionState::Animating;

        context.unhide(tree, to_view);
        for &view in self.animating_from_views.iter().chain(&self.animating_to_views) {
            context.hide(tree, view);
        }

        let (first, second) = if context.insert_to_view_first {
            (&self.animating_to_views, &self.animating_from_views)
        } else {
            (&self.animating_from_views, &self.animating_to_views)
        };
        for &view in first.iter().chain(second) {
            context.snapshot_view(tree, view);
        }

        let mut total: f64 = 0.0;
        let mut wants_interactive = false;
        for animator in self.animators.iter_mut() {
            let from = claimed(&self.animating_from_views, |v| {
                animator.can_animate(&*tree, &context, v, false)
            });
            let to = claimed(&self.animating_to_views, |v| {
                animator.can_animate(&*tree, &context, v, true)
            });
            match animator.animate(tree, &mut context, &from, &to) {
                AnimatorDuration::Interactive => wants_interactive = true,
                AnimatorDuration::Finite(duration) => total = total.max(duration),
            }
        }
        for plugin in self.plugins.iter_mut() {
            let from = claimed(&self.animating_from_views, |v| {
                plugin.can_animate(&*tree, &context, v, false)
            });
            let to = claimed(&self.animating_to_views, |v| {
                plugin.can_animate(&*tree, &context, v, true)
            });
            match plugin.animate(tree, &mut context, &from, &to) {
                AnimatorDuration::Interactive => wants_interactive = true,
                AnimatorDuration::Finite(duration) => total = total.max(duration),
            }
        }
        self.total_duration = total;
        self.context = Some(context);

        if let Some(cover) = self.full_screen_snapshot.take() {
            if tree.remove_view(cover).is_err() {
                debug!(%cover, "整屏快照已被移除");
            }
        }

        info!(total, wants_interactive, "动画开始");
        if let Some(finished) = self.force_finishing {
            self.complete(tree, finished);
        } else if let Some(progress) = self.starting_progress {
            self.update(tree, progress);
        } else if wants_interactive {
            self.update(tree, 0.0);
        } else {
            self.complete_after(tree, total, true);
        }
    }
}
