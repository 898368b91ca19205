//! 收尾：清理快照、把两侧根视图放回宿主容器、发出结束通知并复位

use tracing::{debug, info};

use super::start::attach;
use super::{MotionTransition, TransitionEvent, TransitionState};
use crate::scene::ViewTree;

impl MotionTransition {
    /// 完成过渡；`finished` 为 false 表示取消
    pub(super) fn complete(&mut self, tree: &mut ViewTree, finished: bool) {
        if !matches!(
            self.state,
            TransitionState::Animating | TransitionState::Notified | TransitionState::Starting
        ) {
            return;
        }
        self.state = TransitionState::Completing;
        self.runner.stop();

        if let Some(cover) = self.full_screen_snapshot.take()
            && let Err(err) = tree.remove_view(cover)
        {
            debug!(%cover, error = %err, "移除整屏遮盖失败");
        }

        let request_container = self.request.as_ref().map(|r| r.container);
        if let (Some(info), Some(mut context), Some(container), Some(request_container)) = (
            self.info.clone(),
            self.context.take(),
            self.container,
            request_container,
        ) {
            context.clean(tree);
            let (from_view, to_view) = (info.from_view, info.to_view);

            if finished && info.is_presenting && info.to_over_full_screen {
                // 呈现 OverFullScreen 完成：源快照留在源视图上
                context.unhide_root(tree, to_view);
                context.remove_snapshots_under(tree, to_view);
                context.store_view_alpha(tree, from_view);
                if let Some(controller) = tree.controller_mut(info.from) {
                    controller.stored_snapshot = Some(container);
                }
                attach(tree, request_container, from_view);
                attach(tree, from_view, container);
            } else if !finished && !info.is_presenting && info.from_over_full_screen {
                // 取消 OverFullScreen 的消失：目标快照留在目标视图上
                context.unhide_root(tree, from_view);
                context.remove_snapshots_under(tree, from_view);
                context.store_view_alpha(tree, to_view);
                if let Some(controller) = tree.controller_mut(info.to) {
                    controller.stored_snapshot = Some(container);
                }
                attach(tree, request_container, to_view);
                attach(tree, to_view, container);
            } else {
                context.unhide_all(tree);
                context.remove_all_snapshots(tree);
            }

            if (info.to_over_full_screen && finished) || (info.from_over_full_screen && !finished) {
                attach(tree, request_container, if finished { from_view } else { to_view });
            }
            attach(tree, request_container, if finished { to_view } else { from_view });

            if tree.superview(container) == Some(request_container) {
                // 未放回的根视图随容器一起离开视图树，但不能被销毁
                for root in [from_view, to_view] {
                    if tree.superview(root) == Some(container) {
                        tree.remove_from_superview(root);
                    }
                }
                if let Err(err) = tree.remove_view(container) {
                    debug!(%container, error = %err, "移除过渡容器失败");
                }
            }
        }

        for animator in self.animators.iter_mut() {
            animator.clean(tree);
        }
        for plugin in self.plugins.iter_mut() {
            plugin.clean(tree);
        }

        info!(finished, "过渡结束");
        self.events.push(TransitionEvent::Completed { finished });
        if finished {
            self.emit_hooks(TransitionEvent::DidEnd);
        } else {
            self.emit_hooks(TransitionEvent::DidCancel);
        }
        self.reset();
    }
}
