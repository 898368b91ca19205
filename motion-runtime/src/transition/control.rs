//! 控制接口：拖动进度、结束、取消、实时覆盖

use tracing::debug;

use super::{MotionTransition, TransitionEvent, TransitionState};
use crate::clock::FRAME_EPSILON;
use crate::modifier::Modifier;
use crate::scene::{ViewId, ViewTree};
use crate::target_state::TargetState;

/// 自动完成时剩余比例的下限，避免除以接近 0 的数
const MIN_REMAINING_FRACTION: f64 = 0.01;

impl MotionTransition {
    /// 设置交互进度
    ///
    /// 动画构建前调用时记下进度，动画开始后从该进度进入交互模式。
    /// 尚未提交自动完成时允许负进度（向反方向拖动），范围 [-1, 1]。
    pub fn update(&mut self, tree: &mut ViewTree, progress: f64) {
        if !progress.is_finite() {
            debug!(progress, "忽略非有限进度");
            return;
        }
        match self.state {
            TransitionState::Animating => {}
            TransitionState::Notified | TransitionState::Starting => {
                self.starting_progress = Some(progress);
                return;
            }
            state => {
                debug!(?state, "update 被忽略");
                return;
            }
        }
        self.runner.stop();
        let lower = if self.is_committed { 0.0 } else { -1.0 };
        self.set_progress(tree, progress.clamp(lower, 1.0));
    }

    /// 结束过渡；`animated` 为 false 时立即完成
    pub fn finish(&mut self, tree: &mut ViewTree, animated: bool) {
        self.end(tree, animated, true);
    }

    /// 取消过渡，回到起始状态；`animated` 为 false 时立即完成
    pub fn cancel(&mut self, tree: &mut ViewTree, animated: bool) {
        self.end(tree, animated, false);
    }

    fn end(&mut self, tree: &mut ViewTree, animated: bool, finishing: bool) {
        match self.state {
            TransitionState::Animating => {}
            TransitionState::Notified | TransitionState::Starting => {
                self.force_finishing = Some(finishing);
                return;
            }
            state => {
                debug!(?state, finishing, "结束请求被忽略");
                return;
            }
        }
        if !animated {
            self.complete(tree, finishing);
            return;
        }

        // 负进度与其绝对值在画面上等价
        self.progress = self.progress.abs();
        let elapsed = self.progress * self.total_duration;
        let mut remaining: f64 = 0.0;
        for animator in self.animators.iter_mut() {
            remaining = remaining.max(animator.resume(tree, elapsed, !finishing));
        }
        for plugin in self.plugins.iter_mut() {
            remaining = remaining.max(plugin.resume(tree, elapsed, !finishing));
        }
        debug!(finishing, elapsed, remaining, "继续播放");
        self.complete_after(tree, remaining, finishing);
    }

    /// 把修饰器作为实时覆盖应用到视图（及其配对视图）上
    pub fn apply(&mut self, tree: &mut ViewTree, modifiers: &[Modifier], view: ViewId) {
        if self.state != TransitionState::Animating {
            debug!(state = ?self.state, "apply 被忽略");
            return;
        }
        let state = TargetState::from_modifiers(modifiers);
        let paired = self
            .context
            .as_ref()
            .and_then(|context| context.paired_view(tree, view));

        for target in paired.into_iter().chain([view]) {
            for animator in self.animators.iter_mut() {
                animator.apply(tree, &state, target);
            }
            for plugin in self.plugins.iter_mut() {
                plugin.apply(tree, &state, target);
            }
        }
    }

    /// `after` 秒后完成；不足一帧时立即完成
    pub(super) fn complete_after(&mut self, tree: &mut ViewTree, after: f64, finishing: bool) {
        if after <= FRAME_EPSILON {
            self.complete(tree, finishing);
            return;
        }
        let remaining = if finishing {
            1.0 - self.progress
        } else {
            self.progress
        };
        let duration = after / remaining.max(MIN_REMAINING_FRACTION);
        self.runner.start(self.progress, duration, !finishing);
        self.is_committed = true;
    }

    /// 推送新进度：交互时驱动全部动画器，自动播放时只驱动需要逐帧回调的插件
    pub(super) fn set_progress(&mut self, tree: &mut ViewTree, progress: f64) {
        self.progress = progress;
        let elapsed = progress.abs() * self.total_duration;
        if self.runner.is_running() {
            for plugin in self.plugins.iter_mut() {
                if plugin.requires_per_frame_callback() {
                    plugin.seek(tree, elapsed);
                }
            }
        } else {
            for animator in self.animators.iter_mut() {
                animator.seek(tree, elapsed);
            }
            for plugin in self.plugins.iter_mut() {
                plugin.seek(tree, elapsed);
            }
        }
        self.events.push(TransitionEvent::ProgressUpdated(progress));
    }
}
