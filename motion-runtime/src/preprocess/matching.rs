//! 配对视图

use super::{PreprocessContext, Preprocessor};
use crate::scene::ViewId;

/// 配对视图互为来源；目标视图由源快照代替显示
#[derive(Debug, Default)]
pub struct MatchPreprocessor;

impl Preprocessor for MatchPreprocessor {
    fn process(&self, cx: &mut PreprocessContext<'_>, _from_views: &[ViewId], to_views: &[ViewId]) {
        for &tv in to_views {
            let Some(identifier) = cx.tree.identifier(tv) else {
                continue;
            };
            let Some(fv) = cx.context.source_view(identifier) else {
                continue;
            };
            let (Some(tv_node), Some(fv_node)) = (cx.tree.view(tv), cx.tree.view(fv)) else {
                continue;
            };

            let mut tv_state = cx.context.target_state(tv).cloned().unwrap_or_default();
            let mut fv_state = cx.context.target_state(fv).cloned().unwrap_or_default();

            tv_state.source = Some(identifier.to_string());
            fv_state.source = Some(identifier.to_string());
            fv_state.arc = tv_state.arc;
            fv_state.duration = tv_state.duration;
            fv_state.timing = tv_state.timing;
            fv_state.delay = tv_state.delay;
            fv_state.spring = tv_state.spring;

            let force_non_fade = tv_state.non_fade || fv_state.non_fade;
            let is_non_opaque = !fv_node.is_opaque
                || fv_node.alpha() < 1.0
                || !tv_node.is_opaque
                || tv_node.alpha() < 1.0;

            if cx.context.insert_to_view_first {
                fv_state.opacity = Some(0.0);
                if !force_non_fade && is_non_opaque {
                    tv_state.opacity = Some(0.0);
                } else {
                    tv_state.opacity = None;
                    if !tv_node.layer.props.masks_to_bounds && tv_state.display_shadow {
                        fv_state.display_shadow = false;
                    }
                }
            } else {
                tv_state.opacity = Some(0.0);
                if !force_non_fade && is_non_opaque {
                    // 两侧都半透明时交叉淡入淡出
                    fv_state.opacity = Some(0.0);
                } else {
                    fv_state.opacity = None;
                    // 只保留一份阴影
                    if !fv_node.layer.props.masks_to_bounds && fv_state.display_shadow {
                        tv_state.display_shadow = false;
                    }
                }
            }

            cx.context.set_target_state(tv, Some(tv_state));
            cx.context.set_target_state(fv, Some(fv_state));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::modifier::Modifier;
    use crate::preprocess::test_support::Harness;
    use crate::scene::ViewKind;
    use crate::timing::TimingFunction;
    use crate::transition::TransitionKind;

    fn pair(h: &mut Harness) -> (ViewId, ViewId) {
        let fv = h
            .tree
            .add_view(h.from_root, ViewKind::Plain, Rect::new(0.0, 0.0, 100.0, 100.0))
            .unwrap();
        let tv = h
            .tree
            .add_view(h.to_root, ViewKind::Plain, Rect::new(50.0, 50.0, 200.0, 200.0))
            .unwrap();
        h.tree.set_identifier(fv, "card");
        h.tree.set_identifier(tv, "card");
        (fv, tv)
    }

    #[test]
    fn test_opaque_pair_hides_destination_only() {
        let mut h = Harness::new(TransitionKind::Present);
        let (fv, tv) = pair(&mut h);
        h.tree.set_modifiers(
            tv,
            vec![Modifier::Timing(TimingFunction::Linear), Modifier::Delay(0.1), Modifier::Arc(1.0)],
        );
        h.index();
        h.run(&MatchPreprocessor);

        let fs = h.context.target_state(fv).unwrap();
        let ts = h.context.target_state(tv).unwrap();
        assert_eq!(ts.opacity, Some(0.0));
        assert_eq!(fs.opacity, None);
        assert_eq!(fs.timing, Some(TimingFunction::Linear));
        assert_eq!(fs.delay, 0.1);
        assert_eq!(fs.arc, Some(1.0));
        assert_eq!(fs.source.as_deref(), Some("card"));
        assert_eq!(ts.source.as_deref(), Some("card"));
        // 源视图不裁剪时关闭目标视图阴影
        assert!(!ts.display_shadow);
        assert!(fs.display_shadow);
    }

    #[test]
    fn test_translucent_pair_cross_fades() {
        let mut h = Harness::new(TransitionKind::Present);
        let (fv, tv) = pair(&mut h);
        h.tree.view_mut(fv).unwrap().is_opaque = false;
        h.index();
        h.run(&MatchPreprocessor);
        assert_eq!(h.context.target_state(fv).unwrap().opacity, Some(0.0));
        assert_eq!(h.context.target_state(tv).unwrap().opacity, Some(0.0));
    }

    #[test]
    fn test_non_fade_wins_over_translucency() {
        let mut h = Harness::new(TransitionKind::Present);
        let (fv, tv) = pair(&mut h);
        h.tree.view_mut(tv).unwrap().set_alpha(0.5);
        h.tree.set_modifiers(fv, vec![Modifier::ForceNonFade]);
        h.index();
        h.run(&MatchPreprocessor);
        assert_eq!(h.context.target_state(fv).unwrap().opacity, None);
    }

    #[test]
    fn test_destination_first_hides_source() {
        let mut h = Harness::new(TransitionKind::Dismiss);
        let (fv, tv) = pair(&mut h);
        h.index();
        h.context.insert_to_view_first = true;
        h.run(&MatchPreprocessor);
        assert_eq!(h.context.target_state(fv).unwrap().opacity, Some(0.0));
        assert_eq!(h.context.target_state(tv).unwrap().opacity, None);
        assert!(!h.context.target_state(fv).unwrap().display_shadow);
    }
}
