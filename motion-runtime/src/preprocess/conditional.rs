//! 条件修饰器

use super::{PreprocessContext, Preprocessor};
use crate::context::TransitionContext;
use crate::scene::{ControllerId, ViewId, ViewTree};
use crate::transition::TransitionInfo;

/// 条件求值时可见的只读信息
pub struct ConditionalContext<'a> {
    tree: &'a ViewTree,
    context: &'a TransitionContext,
    info: &'a TransitionInfo,
    view: ViewId,
    appearing: bool,
}

impl<'a> ConditionalContext<'a> {
    pub fn new(
        tree: &'a ViewTree,
        context: &'a TransitionContext,
        info: &'a TransitionInfo,
        view: ViewId,
        appearing: bool,
    ) -> Self {
        Self {
            tree,
            context,
            info,
            view,
            appearing,
        }
    }

    pub fn view(&self) -> ViewId {
        self.view
    }

    pub fn is_appearing(&self) -> bool {
        self.appearing
    }

    pub fn is_presenting(&self) -> bool {
        self.info.is_presenting
    }

    pub fn is_navigation(&self) -> bool {
        self.info.kind.is_navigation()
    }

    pub fn is_tab_bar(&self) -> bool {
        self.info.kind.is_tab_bar()
    }

    pub fn matched_view(&self) -> Option<ViewId> {
        self.context.paired_view(self.tree, self.view)
    }

    /// 最近的有配对视图的祖先，以及它的配对视图
    pub fn matched_ancestor(&self) -> Option<(ViewId, ViewId)> {
        let mut current = self.tree.superview(self.view);
        while let Some(ancestor) = current {
            if ancestor == self.context.container() {
                break;
            }
            if let Some(paired) = self.context.paired_view(self.tree, ancestor) {
                return Some((ancestor, paired));
            }
            current = self.tree.superview(ancestor);
        }
        None
    }

    pub fn from_controller(&self) -> ControllerId {
        self.info.from
    }

    pub fn to_controller(&self) -> ControllerId {
        self.info.to
    }

    /// 视图所在一侧的控制器
    pub fn current_controller(&self) -> ControllerId {
        if self.appearing { self.info.to } else { self.info.from }
    }

    pub fn other_controller(&self) -> ControllerId {
        if self.appearing { self.info.from } else { self.info.to }
    }
}

/// 求值条件修饰器，成立时把修饰器追加到目标状态
#[derive(Debug, Default)]
pub struct ConditionalPreprocessor;

impl ConditionalPreprocessor {
    fn process_views(cx: &mut PreprocessContext<'_>, views: &[ViewId], appearing: bool) {
        for &view in views {
            let Some(conditionals) = cx
                .context
                .target_state(view)
                .map(|s| s.conditional_modifiers.clone())
            else {
                continue;
            };
            if conditionals.is_empty() {
                continue;
            }
            let mut accepted = Vec::new();
            {
                let condition_cx = ConditionalContext::new(cx.tree, &*cx.context, cx.info, view, appearing);
                for (condition, modifiers) in &conditionals {
                    if condition.evaluate(&condition_cx) {
                        accepted.extend(modifiers.iter().cloned());
                    }
                }
            }
            if let Some(state) = cx.context.target_state_mut(view) {
                state.append(&accepted);
            }
        }
    }
}

impl Preprocessor for ConditionalPreprocessor {
    fn process(&self, cx: &mut PreprocessContext<'_>, from_views: &[ViewId], to_views: &[ViewId]) {
        Self::process_views(cx, from_views, false);
        Self::process_views(cx, to_views, true);
    }
}
