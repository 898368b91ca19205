//! 级联延迟

use std::cmp::Ordering;

use super::ignore_subview::content_parent;
use super::{PreprocessContext, Preprocessor};
use crate::geometry::Rect;
use crate::scene::ViewId;
use crate::target_state::CascadeDirection;

/// 按方向排序子视图，为每个子树设置递增的延迟
#[derive(Debug, Default)]
pub struct CascadePreprocessor;

fn compare(direction: CascadeDirection, a: &Rect, b: &Rect) -> Ordering {
    let by = |x: f64, y: f64| x.partial_cmp(&y).unwrap_or(Ordering::Equal);
    match direction {
        CascadeDirection::TopToBottom => by(a.min_y(), b.min_y()),
        CascadeDirection::BottomToTop => by(b.max_y(), a.max_y()),
        CascadeDirection::LeftToRight => by(a.min_x(), b.min_x()),
        CascadeDirection::RightToLeft => by(b.max_x(), a.max_x()),
        CascadeDirection::Radial { center } => {
            by(a.center().distance(center), b.center().distance(center))
        }
        CascadeDirection::InverseRadial { center } => {
            by(b.center().distance(center), a.center().distance(center))
        }
    }
}

impl CascadePreprocessor {
    fn process_views(cx: &mut PreprocessContext<'_>, views: &[ViewId]) {
        for &view in views {
            let Some((cascade, initial_delay)) = cx
                .context
                .target_state(view)
                .and_then(|s| s.cascade.map(|c| (c, s.delay)))
            else {
                continue;
            };

            let parent = content_parent(cx, view);
            let mut sorted: Vec<(ViewId, Rect)> = cx
                .tree
                .subviews(parent)
                .iter()
                .map(|&v| (v, cx.tree.frame(v)))
                .collect();
            sorted.sort_by(|a, b| compare(cascade.direction, &a.1, &b.1));

            let final_delay = sorted.len() as f64 * cascade.delta + initial_delay;
            for (index, (subview, _)) in sorted.into_iter().enumerate() {
                let delay = index as f64 * cascade.delta + initial_delay;
                Self::apply_delay(cx, subview, delay, final_delay, cascade.delay_matched_views);
            }
        }
    }

    fn apply_delay(
        cx: &mut PreprocessContext<'_>,
        view: ViewId,
        delay: f64,
        final_delay: f64,
        delay_matched_views: bool,
    ) {
        match cx.context.paired_view(cx.tree, view) {
            None => {
                if let Some(state) = cx.context.target_state_mut(view) {
                    state.delay = delay;
                }
            }
            Some(paired) if delay_matched_views => {
                for v in [view, paired] {
                    if let Some(state) = cx.context.target_state_mut(v) {
                        state.delay = final_delay;
                    }
                }
            }
            Some(_) => {}
        }
        let tree = cx.tree;
        for &child in tree.subviews(view) {
            Self::apply_delay(cx, child, delay, final_delay, delay_matched_views);
        }
    }
}

impl Preprocessor for CascadePreprocessor {
    fn process(&self, cx: &mut PreprocessContext<'_>, from_views: &[ViewId], to_views: &[ViewId]) {
        Self::process_views(cx, from_views);
        Self::process_views(cx, to_views);
    }
}
