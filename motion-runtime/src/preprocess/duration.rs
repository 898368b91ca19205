//! 时长解析

use tracing::debug;

use super::{PreprocessContext, Preprocessor};
use crate::geometry::Point;
use crate::scene::{LayerProps, ViewId};
use crate::target_state::{CoordinateSpace, TargetDuration, TargetState};

/// 位移为 0 时的时长
const BASE_DURATION: f64 = 0.208;
/// 位移量上限（点）
const MAX_MOVEMENT: f64 = 500.0;
/// 每秒对应的位移量
const POINTS_PER_SECOND: f64 = 3000.0;

/// 按位移与尺寸变化量估算时长：0 点为 0.208 秒，500 点及以上为 0.375 秒
pub fn optimized_duration(current: &LayerProps, state: &TargetState) -> f64 {
    let from_position = current.position;
    let to_position = state.position.unwrap_or(from_position);
    let from_size = current.bounds_size;
    let to_size = state.size.unwrap_or(from_size);
    let from_transform = current.transform;
    let to_transform = state.transform.unwrap_or(from_transform);

    let real_from_position = from_transform.apply_to_point(Point::ZERO) + from_position;
    let real_to_position = to_transform.apply_to_point(Point::ZERO) + to_position;
    let real_from_size = from_transform.apply_to_size(from_size);
    let real_to_size = to_transform.apply_to_size(to_size);

    let movement = real_from_position.distance(real_to_position)
        + real_from_size.to_point().distance(real_to_size.to_point());
    BASE_DURATION + movement.clamp(0.0, MAX_MOVEMENT) / POINTS_PER_SECOND
}

/// 为没有时长的视图计算优化时长，再把 `MatchLongest` 解析成最长时长
#[derive(Debug, Default)]
pub struct DurationPreprocessor;

impl DurationPreprocessor {
    /// 补齐优化时长，返回这组视图的最长时长
    fn apply_optimized(cx: &mut PreprocessContext<'_>, views: &[ViewId]) -> f64 {
        let tree = cx.tree;
        let container = cx.context.container();
        let mut longest: f64 = 0.0;
        for &view in views {
            let Some(node) = tree.view(view) else {
                continue;
            };
            let Some(state) = cx.context.target_state_mut(view) else {
                continue;
            };
            let mut current = node.layer.props.clone();
            if state.coordinate_space == Some(CoordinateSpace::Global) {
                current.position = tree.position_in(view, container);
            }
            if state.duration.is_none() {
                state.duration = Some(TargetDuration::Optimized(optimized_duration(&current, state)));
            }
            // 跟随最长时长的视图以自身的优化时长参与比较
            let candidate = match state.seconds() {
                Some(seconds) => seconds,
                None => optimized_duration(&current, state),
            };
            longest = longest.max(candidate);
        }
        longest
    }

    fn resolve_match_longest(cx: &mut PreprocessContext<'_>, views: &[ViewId], duration: f64) {
        for &view in views {
            if let Some(state) = cx.context.target_state_mut(view) {
                if state.matches_longest() {
                    state.duration = Some(TargetDuration::Seconds(duration));
                }
            }
        }
    }
}

impl Preprocessor for DurationPreprocessor {
    fn process(&self, cx: &mut PreprocessContext<'_>, from_views: &[ViewId], to_views: &[ViewId]) {
        let longest = Self::apply_optimized(cx, from_views).max(Self::apply_optimized(cx, to_views));
        debug!(longest, "解析最长时长");
        Self::resolve_match_longest(cx, from_views, longest);
        Self::resolve_match_longest(cx, to_views, longest);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Rect, Size};
    use crate::modifier::Modifier;
    use crate::preprocess::test_support::Harness;
    use crate::scene::ViewKind;
    use crate::transition::TransitionKind;

    #[test]
    fn test_optimized_duration_boundaries() {
        let props = LayerProps {
            position: Point::new(10.0, 10.0),
            bounds_size: Size::new(20.0, 20.0),
            ..LayerProps::default()
        };
        let still = TargetState::default();
        assert_eq!(optimized_duration(&props, &still), 0.208);

        let far = TargetState::from_modifiers(&[Modifier::Position(Point::new(10.0, 1010.0))]);
        assert_eq!(optimized_duration(&props, &far), 0.208 + 500.0 / 3000.0);

        let near = TargetState::from_modifiers(&[Modifier::Position(Point::new(10.0, 310.0))]);
        assert!((optimized_duration(&props, &near) - 0.308).abs() < 1e-9);
    }

    #[test]
    fn test_size_and_transform_count_as_movement() {
        let props = LayerProps {
            bounds_size: Size::new(100.0, 0.0),
            ..LayerProps::default()
        };
        let grow = TargetState::from_modifiers(&[Modifier::Size(Size::new(400.0, 0.0))]);
        assert!((optimized_duration(&props, &grow) - 0.308).abs() < 1e-9);

        let shift = TargetState::from_modifiers(&[Modifier::translate(0.0, 150.0)]);
        assert!((optimized_duration(&props, &shift) - 0.258).abs() < 1e-9);
    }

    #[test]
    fn test_match_longest_takes_max_finite() {
        let mut h = Harness::new(TransitionKind::Present);
        let a = h
            .tree
            .add_view(h.from_root, ViewKind::Plain, Rect::new(0.0, 0.0, 10.0, 10.0))
            .unwrap();
        let b = h
            .tree
            .add_view(h.to_root, ViewKind::Plain, Rect::new(0.0, 0.0, 10.0, 10.0))
            .unwrap();
        let c = h
            .tree
            .add_view(h.to_root, ViewKind::Plain, Rect::new(0.0, 0.0, 10.0, 10.0))
            .unwrap();
        h.tree.set_modifiers(a, vec![Modifier::Fade, Modifier::Duration(0.6)]);
        h.tree.set_modifiers(b, vec![Modifier::Fade]);
        h.tree.set_modifiers(c, vec![Modifier::Fade, Modifier::DurationMatchLongest]);
        h.index();
        h.run(&DurationPreprocessor);

        assert_eq!(h.context.target_state(a).unwrap().seconds(), Some(0.6));
        assert_eq!(h.context.target_state(b).unwrap().seconds(), Some(0.208));
        assert!(!h.context.target_state(b).unwrap().has_explicit_duration());
        assert_eq!(h.context.target_state(c).unwrap().seconds(), Some(0.6));
    }

    #[test]
    fn test_match_longest_alone_uses_own_optimized_duration() {
        let mut h = Harness::new(TransitionKind::Present);
        h.tree.set_modifiers(h.to_root, vec![Modifier::Fade, Modifier::DurationMatchLongest]);
        h.index();
        h.run(&DurationPreprocessor);
        let state = h.context.target_state(h.to_root).unwrap();
        assert_eq!(state.seconds(), Some(0.208));
        assert!(state.has_explicit_duration());
    }
}
