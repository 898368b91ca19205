//! 准备阶段：整屏遮盖、搭建容器、索引层级、运行预处理管线

use tracing::{debug, warn};

use super::{Deferred, MotionTransition, TransitionEvent, TransitionState, ViewOrderStrategy};
use crate::animator::builtin_animators;
use crate::context::TransitionContext;
use crate::preprocess::{DurationPreprocessor, PreprocessContext, builtin_preprocessors};
use crate::scene::{Capture, ViewId, ViewKind, ViewTree};

/// 结构编辑失败只记录日志，过渡继续进行
pub(super) fn attach(tree: &mut ViewTree, parent: ViewId, child: ViewId) {
    if let Err(err) = tree.add_subview(parent, child) {
        warn!(%parent, %child, error = %err, "无法加入子视图");
    }
}

impl MotionTransition {
    /// 开始准备已认领的过渡，动画在下一帧构建
    pub fn start(&mut self, tree: &mut ViewTree) {
        if self.state != TransitionState::Notified {
            debug!(state = ?self.state, "start 被忽略");
            return;
        }
        let (Some(info), Some(request)) = (self.info.clone(), self.request.as_ref()) else {
            return;
        };
        let request_container = request.container;
        self.state = TransitionState::Starting;
        self.emit_hooks(TransitionEvent::WillStart);

        // 准备期间盖住源视图，避免中间状态露出
        let window = tree.window_of(request_container).unwrap_or(tree.window());
        let cover = tree.create_view(
            ViewKind::Snapshot {
                source: info.from_view,
                capture: Capture::Surface,
            },
            tree.bounds(window),
        );
        attach(tree, window, cover);
        self.full_screen_snapshot = Some(cover);

        // 上一次 OverFullScreen 呈现留下的快照
        for controller in [info.from, info.to] {
            let stored = tree
                .controller_mut(controller)
                .and_then(|c| c.stored_snapshot.take());
            if let Some(stored) = stored {
                if tree.remove_view(stored).is_err() {
                    debug!(%stored, "保存的快照已不在视图树上");
                }
            }
        }

        self.plugins = self.registry.instantiate();
        self.preprocessors = builtin_preprocessors();
        self.preprocessors.push(Box::new(DurationPreprocessor));
        self.animators = builtin_animators();

        let container = tree.create_view(ViewKind::Plain, tree.bounds(request_container));
        if let Some(node) = tree.view_mut(container) {
            node.name = Some("motion-container".to_string());
            node.layer.props.background_color = if info.to_over_full_screen || info.from_over_full_screen {
                None
            } else {
                info.options.container_background
            };
        }
        attach(tree, request_container, container);
        self.container = Some(container);

        let mut context = TransitionContext::new(container);
        context.load_view_alpha(tree, info.to_view);
        context.load_view_alpha(tree, info.from_view);
        attach(tree, container, info.to_view);
        attach(tree, container, info.from_view);

        let from_views = tree.flattened_hierarchy(info.from_view);
        let to_views = tree.flattened_hierarchy(info.to_view);
        context.set(tree, from_views, to_views);

        context.insert_to_view_first = match info.options.view_order {
            ViewOrderStrategy::Auto => !info.is_presenting && !info.kind.is_tab_bar(),
            ViewOrderStrategy::SourceViewOnTop => true,
            ViewOrderStrategy::DestinationViewOnTop => false,
        };

        let from_views = context.from_views().to_vec();
        let to_views = context.to_views().to_vec();
        {
            let mut cx = PreprocessContext {
                tree: &*tree,
                context: &mut context,
                info: &info,
                animators: &self.animators,
                plugins: &self.plugins,
            };
            // 时长预处理器固定在插件之后
            if let Some((duration, builtin)) = self.preprocessors.split_last() {
                for preprocessor in builtin {
                    preprocessor.process(&mut cx, &from_views, &to_views);
                }
                for plugin in &self.plugins {
                    plugin.process(&mut cx, &from_views, &to_views);
                }
                duration.process(&mut cx, &from_views, &to_views);
            }
        }

        self.animating_from_views = from_views
            .iter()
            .copied()
            .filter(|&v| self.is_claimed(tree, &context, v, false))
            .collect();
        self.animating_to_views = to_views
            .iter()
            .copied()
            .filter(|&v| self.is_claimed(tree, &context, v, true))
            .collect();
        debug!(
            from = self.animating_from_views.len(),
            to = self.animating_to_views.len(),
            plugins = self.plugins.len(),
            "预处理完成"
        );

        context.hide(tree, info.to_view);
        self.context = Some(context);

        let now = tree.current_time();
        self.deferred.schedule(now, Deferred::Animate);
    }
}
