//! 忽略子视图过渡

use tracing::debug;

use super::{PreprocessContext, Preprocessor};
use crate::scene::{ViewId, ViewKind};

/// 对声明了 `IgnoreSubviewTransitions` 的视图，清除其子视图（或整个子树）的目标状态
#[derive(Debug, Default)]
pub struct IgnoreSubviewPreprocessor;

impl IgnoreSubviewPreprocessor {
    fn process_views(cx: &mut PreprocessContext<'_>, views: &[ViewId]) {
        for (index, &view) in views.iter().enumerate() {
            let Some(recursive) = cx
                .context
                .target_state(view)
                .and_then(|s| s.ignore_subview_transitions)
            else {
                continue;
            };

            if recursive {
                // 展开顺序是深度优先，子孙紧跟在视图之后
                for &child in &views[index + 1..] {
                    if !cx.tree.is_descendant(child, view) {
                        break;
                    }
                    cx.context.set_target_state(child, None);
                }
            } else {
                let parent = content_parent(cx, view);
                for &child in cx.tree.subviews(parent) {
                    cx.context.set_target_state(child, None);
                }
            }
            debug!(view = %view, recursive, "忽略子视图过渡");
        }
    }
}

/// 列表类容器的子视图挂在第一个包装视图下
pub(super) fn content_parent(cx: &PreprocessContext<'_>, view: ViewId) -> ViewId {
    let is_collection = matches!(cx.tree.view(view).map(|n| &n.kind), Some(ViewKind::Collection));
    match cx.tree.subviews(view).first() {
        Some(&wrapper) if is_collection => wrapper,
        _ => view,
    }
}

impl Preprocessor for IgnoreSubviewPreprocessor {
    fn process(&self, cx: &mut PreprocessContext<'_>, from_views: &[ViewId], to_views: &[ViewId]) {
        Self::process_views(cx, from_views);
        Self::process_views(cx, to_views);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::modifier::Modifier;
    use crate::preprocess::test_support::Harness;
    use crate::transition::TransitionKind;

    fn build(recursive: bool) -> (Harness, ViewId, ViewId, ViewId) {
        let mut h = Harness::new(TransitionKind::Present);
        let parent = h
            .tree
            .add_view(h.from_root, ViewKind::Plain, Rect::new(0.0, 0.0, 200.0, 200.0))
            .unwrap();
        let child = h
            .tree
            .add_view(parent, ViewKind::Plain, Rect::new(0.0, 0.0, 100.0, 100.0))
            .unwrap();
        let grandchild = h
            .tree
            .add_view(child, ViewKind::Plain, Rect::new(0.0, 0.0, 50.0, 50.0))
            .unwrap();
        let sibling = h
            .tree
            .add_view(h.from_root, ViewKind::Plain, Rect::new(0.0, 0.0, 10.0, 10.0))
            .unwrap();
        h.tree
            .set_modifiers(parent, vec![Modifier::IgnoreSubviewTransitions { recursive }]);
        for v in [child, grandchild, sibling] {
            h.tree.set_modifiers(v, vec![Modifier::Fade]);
        }
        h.index();
        (h, child, grandchild, sibling)
    }

    #[test]
    fn test_direct_children_only() {
        let (mut h, child, grandchild, sibling) = build(false);
        h.run(&IgnoreSubviewPreprocessor);
        assert!(h.context.target_state(child).is_none());
        assert!(h.context.target_state(grandchild).is_some());
        assert!(h.context.target_state(sibling).is_some());
    }

    #[test]
    fn test_recursive_stops_at_subtree_end() {
        let (mut h, child, grandchild, sibling) = build(true);
        h.run(&IgnoreSubviewPreprocessor);
        assert!(h.context.target_state(child).is_none());
        assert!(h.context.target_state(grandchild).is_none());
        assert!(h.context.target_state(sibling).is_some());
    }
}
