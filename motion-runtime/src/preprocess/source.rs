//! 来源几何

use super::{PreprocessContext, Preprocessor};
use crate::scene::ViewId;
use crate::target_state::CoordinateSpace;

/// 把来源视图的当前几何与外观写入声明了来源的视图
#[derive(Debug, Default)]
pub struct SourcePreprocessor;

impl SourcePreprocessor {
    fn prepare(cx: &mut PreprocessContext<'_>, view: ViewId, target: ViewId) {
        let tree = cx.tree;
        let container = cx.context.container();
        let (Some(node), Some(target_node)) = (tree.view(view), tree.view(target)) else {
            return;
        };
        let Some(state) = cx.context.target_state_mut(view) else {
            return;
        };
        let own = &node.layer.props;
        let other = &target_node.layer.props;

        // 目标位置换算自容器，因此固定使用全局坐标空间
        state.coordinate_space = Some(CoordinateSpace::Global);
        state.position = Some(tree.position_in(target, container));
        state.transform = Some(tree.flat_transform_to(container, target));

        state.size = None;
        if own.bounds_size != other.bounds_size {
            state.size = Some(other.bounds_size);
        }
        if state.corner_radius.is_none() && own.corner_radius != other.corner_radius {
            state.corner_radius = Some(other.corner_radius);
        }
        if own.shadow_color != other.shadow_color {
            state.shadow_color = other.shadow_color;
        }
        if own.shadow_opacity != other.shadow_opacity {
            state.shadow_opacity = Some(other.shadow_opacity);
        }
        if own.shadow_offset != other.shadow_offset {
            state.shadow_offset = Some(other.shadow_offset);
        }
        if own.shadow_radius != other.shadow_radius {
            state.shadow_radius = Some(other.shadow_radius);
        }
        if own.shadow_path != other.shadow_path {
            state.shadow_path = other.shadow_path;
        }
        if own.contents_rect != other.contents_rect {
            state.contents_rect = Some(other.contents_rect);
        }
        if own.contents_scale != other.contents_scale {
            state.contents_scale = Some(other.contents_scale);
        }
    }
}

impl Preprocessor for SourcePreprocessor {
    fn process(&self, cx: &mut PreprocessContext<'_>, from_views: &[ViewId], to_views: &[ViewId]) {
        for &fv in from_views {
            let target = cx
                .context
                .target_state(fv)
                .and_then(|s| s.source.as_deref())
                .and_then(|id| cx.context.destination_view(id));
            if let Some(tv) = target {
                Self::prepare(cx, fv, tv);
            }
        }
        for &tv in to_views {
            let target = cx
                .context
                .target_state(tv)
                .and_then(|s| s.source.as_deref())
                .and_then(|id| cx.context.source_view(id));
            if let Some(fv) = target {
                Self::prepare(cx, tv, fv);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Point, Rect, Size};
    use crate::modifier::Modifier;
    use crate::preprocess::MatchPreprocessor;
    use crate::preprocess::test_support::Harness;
    use crate::scene::ViewKind;
    use crate::transition::TransitionKind;

    #[test]
    fn test_matched_card_targets_destination_geometry() {
        let mut h = Harness::new(TransitionKind::Present);
        let fv = h
            .tree
            .add_view(h.from_root, ViewKind::Plain, Rect::new(0.0, 0.0, 100.0, 100.0))
            .unwrap();
        let tv = h
            .tree
            .add_view(h.to_root, ViewKind::Plain, Rect::new(50.0, 250.0, 300.0, 300.0))
            .unwrap();
        h.tree.view_mut(fv).unwrap().layer.props.corner_radius = 8.0;
        h.tree.set_identifier(fv, "card");
        h.tree.set_identifier(tv, "card");
        h.index();
        h.run(&MatchPreprocessor);
        h.run(&SourcePreprocessor);

        let fs = h.context.target_state(fv).unwrap();
        assert_eq!(fs.position, Some(Point::new(200.0, 400.0)));
        assert_eq!(fs.size, Some(Size::new(300.0, 300.0)));
        assert_eq!(fs.corner_radius, Some(0.0));
        assert_eq!(fs.coordinate_space, Some(CoordinateSpace::Global));

        let ts = h.context.target_state(tv).unwrap();
        assert_eq!(ts.position, Some(Point::new(50.0, 50.0)));
        assert_eq!(ts.size, Some(Size::new(100.0, 100.0)));
        assert_eq!(ts.corner_radius, Some(8.0));
        assert_eq!(ts.opacity, Some(0.0));
    }

    #[test]
    fn test_explicit_corner_radius_is_kept() {
        let mut h = Harness::new(TransitionKind::Present);
        let fv = h
            .tree
            .add_view(h.from_root, ViewKind::Plain, Rect::new(0.0, 0.0, 100.0, 100.0))
            .unwrap();
        let tv = h
            .tree
            .add_view(h.to_root, ViewKind::Plain, Rect::new(0.0, 0.0, 100.0, 100.0))
            .unwrap();
        h.tree.view_mut(tv).unwrap().layer.props.corner_radius = 20.0;
        h.tree.set_identifier(tv, "avatar");
        h.tree.set_modifiers(
            fv,
            vec![Modifier::Source("avatar".into()), Modifier::CornerRadius(4.0)],
        );
        h.index();
        h.run(&SourcePreprocessor);

        let fs = h.context.target_state(fv).unwrap();
        assert_eq!(fs.corner_radius, Some(4.0));
        // 尺寸相同则不写入
        assert_eq!(fs.size, None);
        assert_eq!(fs.position, Some(Point::new(50.0, 50.0)));
    }
}
