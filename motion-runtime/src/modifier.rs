//! # Modifier 模块
//!
//! 视图声明过渡行为所用的修饰器。
//!
//! 修饰器是封闭的值类型，每个变体都是“目标状态草稿 → 新草稿”的纯函数，
//! 按列表顺序折叠，后者覆盖前者。条件修饰器（[`Modifier::When`]）先存入
//! 目标状态，由条件预处理器在上下文就绪后求值。

use serde::{Deserialize, Serialize};

use crate::geometry::{Color, Point, Rect, Size, Transform3D};
use crate::preprocess::ConditionalContext;
use crate::target_state::{
    Cascade, CoordinateSpace, Overlay, SnapshotStrategy, TargetDuration, TargetState,
};
use crate::timing::{Spring, TimingFunction};

fn one() -> f64 {
    1.0
}

/// 修饰器
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modifier {
    /// 透明度归零
    Fade,
    Opacity(f64),
    Position(Point),
    Size(Size),
    Transform(Transform3D),
    /// 透视距离
    Perspective(f64),
    Translate {
        #[serde(default)]
        x: f64,
        #[serde(default)]
        y: f64,
        #[serde(default)]
        z: f64,
    },
    Scale {
        #[serde(default = "one")]
        x: f64,
        #[serde(default = "one")]
        y: f64,
        #[serde(default = "one")]
        z: f64,
    },
    /// 依次绕 x、y、z 轴旋转（弧度）
    Rotate {
        #[serde(default)]
        x: f64,
        #[serde(default)]
        y: f64,
        #[serde(default)]
        z: f64,
    },
    CornerRadius(f64),
    BackgroundColor(Color),
    BorderWidth(f64),
    BorderColor(Color),
    ZPosition(f64),
    MasksToBounds(bool),
    ShadowColor(Color),
    ShadowOpacity(f64),
    ShadowOffset(Size),
    ShadowRadius(f64),
    ShadowPath(Rect),
    ContentsRect(Rect),
    ContentsScale(f64),
    Overlay { color: Color, opacity: f64 },
    Duration(f64),
    DurationMatchLongest,
    Delay(f64),
    Timing(TimingFunction),
    Spring(Spring),
    /// 位置沿弧线移动，参数为弧度强度
    Arc(f64),
    /// 以指定标识符的视图为几何来源
    Source(String),
    Cascade(Cascade),
    IgnoreSubviewTransitions {
        #[serde(default)]
        recursive: bool,
    },
    CoordinateSpace(CoordinateSpace),
    UseScaleBasedSizeChange,
    Snapshot(SnapshotStrategy),
    ForceAnimate,
    ForceNonFade,
    HideShadow,
    /// 动画开始前直接应用的状态
    BeginWith(Vec<Modifier>),
    /// 条件成立时才应用
    When(Condition, Vec<Modifier>),
}

impl Modifier {
    /// 把修饰器应用到目标状态草稿
    pub fn apply(&self, state: &mut TargetState) {
        match self {
            Modifier::Fade => state.opacity = Some(0.0),
            Modifier::Opacity(v) => state.opacity = Some(*v),
            Modifier::Position(p) => state.position = Some(*p),
            Modifier::Size(s) => state.size = Some(*s),
            Modifier::Transform(t) => state.transform = Some(*t),
            Modifier::Perspective(distance) => {
                let base = state.transform.unwrap_or(Transform3D::IDENTITY);
                state.transform = Some(base.with_perspective(*distance));
            }
            Modifier::Translate { x, y, z } => {
                let base = state.transform.unwrap_or(Transform3D::IDENTITY);
                state.transform = Some(base.translate(*x, *y, *z));
            }
            Modifier::Scale { x, y, z } => {
                let base = state.transform.unwrap_or(Transform3D::IDENTITY);
                state.transform = Some(base.scale(*x, *y, *z));
            }
            Modifier::Rotate { x, y, z } => {
                let base = state.transform.unwrap_or(Transform3D::IDENTITY);
                state.transform = Some(
                    base.rotate(*x, 1.0, 0.0, 0.0)
                        .rotate(*y, 0.0, 1.0, 0.0)
                        .rotate(*z, 0.0, 0.0, 1.0),
                );
            }
            Modifier::CornerRadius(v) => state.corner_radius = Some(*v),
            Modifier::BackgroundColor(c) => state.background_color = Some(*c),
            Modifier::BorderWidth(v) => state.border_width = Some(*v),
            Modifier::BorderColor(c) => state.border_color = Some(*c),
            Modifier::ZPosition(v) => state.z_position = Some(*v),
            Modifier::MasksToBounds(b) => state.masks_to_bounds = Some(*b),
            Modifier::ShadowColor(c) => state.shadow_color = Some(*c),
            Modifier::ShadowOpacity(v) => state.shadow_opacity = Some(*v),
            Modifier::ShadowOffset(s) => state.shadow_offset = Some(*s),
            Modifier::ShadowRadius(v) => state.shadow_radius = Some(*v),
            Modifier::ShadowPath(r) => state.shadow_path = Some(*r),
            Modifier::ContentsRect(r) => state.contents_rect = Some(*r),
            Modifier::ContentsScale(v) => state.contents_scale = Some(*v),
            Modifier::Overlay { color, opacity } => {
                state.overlay = Some(Overlay {
                    color: *color,
                    opacity: *opacity,
                })
            }
            Modifier::Duration(d) => state.duration = Some(TargetDuration::Seconds(*d)),
            Modifier::DurationMatchLongest => state.duration = Some(TargetDuration::MatchLongest),
            Modifier::Delay(d) => state.delay = *d,
            Modifier::Timing(t) => state.timing = Some(*t),
            Modifier::Spring(s) => state.spring = Some(*s),
            Modifier::Arc(intensity) => state.arc = Some(*intensity),
            Modifier::Source(id) => state.source = Some(id.clone()),
            Modifier::Cascade(c) => state.cascade = Some(*c),
            Modifier::IgnoreSubviewTransitions { recursive } => {
                state.ignore_subview_transitions = Some(*recursive)
            }
            Modifier::CoordinateSpace(cs) => state.coordinate_space = Some(*cs),
            Modifier::UseScaleBasedSizeChange => state.use_scale_based_size_change = Some(true),
            Modifier::Snapshot(strategy) => state.snapshot = Some(*strategy),
            Modifier::ForceAnimate => state.force_animate = true,
            Modifier::ForceNonFade => state.non_fade = true,
            Modifier::HideShadow => state.display_shadow = false,
            Modifier::BeginWith(modifiers) => state.begin_state.extend(modifiers.iter().cloned()),
            Modifier::When(condition, modifiers) => state
                .conditional_modifiers
                .push((condition.clone(), modifiers.clone())),
        }
    }

    // ── 便捷构造 ──

    pub fn translate(x: f64, y: f64) -> Self {
        Modifier::Translate { x, y, z: 0.0 }
    }

    pub fn scale(s: f64) -> Self {
        Modifier::Scale { x: s, y: s, z: 1.0 }
    }

    pub fn overlay(color: Color, opacity: f64) -> Self {
        Modifier::Overlay { color, opacity }
    }

    pub fn when_presenting(modifiers: Vec<Modifier>) -> Self {
        Modifier::When(Condition::Presenting, modifiers)
    }

    pub fn when_dismissing(modifiers: Vec<Modifier>) -> Self {
        Modifier::When(Condition::Dismissing, modifiers)
    }

    pub fn when_appearing(modifiers: Vec<Modifier>) -> Self {
        Modifier::When(Condition::Appearing, modifiers)
    }

    pub fn when_disappearing(modifiers: Vec<Modifier>) -> Self {
        Modifier::When(Condition::Disappearing, modifiers)
    }

    pub fn when_matched(modifiers: Vec<Modifier>) -> Self {
        Modifier::When(Condition::Matched, modifiers)
    }

    /// 仅在视图被匹配时使用的起始状态
    pub fn begin_with_if_matched(modifiers: Vec<Modifier>) -> Self {
        Modifier::When(Condition::Matched, vec![Modifier::BeginWith(modifiers)])
    }
}

/// 条件修饰器的判定条件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Presenting,
    Dismissing,
    Appearing,
    Disappearing,
    /// 视图有配对视图
    Matched,
    /// 某个祖先有配对视图
    AncestorMatched,
    NavigationTransition,
    TabBarTransition,
    ModalTransition,
    Not(Box<Condition>),
    All(Vec<Condition>),
    Any(Vec<Condition>),
}

impl Condition {
    pub fn evaluate(&self, cx: &ConditionalContext<'_>) -> bool {
        match self {
            Condition::Presenting => cx.is_presenting(),
            Condition::Dismissing => !cx.is_presenting(),
            Condition::Appearing => cx.is_appearing(),
            Condition::Disappearing => !cx.is_appearing(),
            Condition::Matched => cx.matched_view().is_some(),
            Condition::AncestorMatched => cx.matched_ancestor().is_some(),
            Condition::NavigationTransition => cx.is_navigation(),
            Condition::TabBarTransition => cx.is_tab_bar(),
            Condition::ModalTransition => !cx.is_navigation() && !cx.is_tab_bar(),
            Condition::Not(inner) => !inner.evaluate(cx),
            Condition::All(all) => all.iter().all(|c| c.evaluate(cx)),
            Condition::Any(any) => any.iter().any(|c| c.evaluate(cx)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_modifiers_compose() {
        let state = TargetState::from_modifiers(&[Modifier::scale(0.5), Modifier::translate(100.0, 0.0)]);
        let t = state.transform.unwrap();
        // 平移在缩放之前生效
        let p = t.apply_to_point(Point::ZERO);
        assert!((p.x - 50.0).abs() < 1e-9);
        assert!((t.m[0][0] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_perspective_sets_m34() {
        let state = TargetState::from_modifiers(&[Modifier::Perspective(500.0)]);
        assert_eq!(state.transform.unwrap().m[2][3], -1.0 / 500.0);
    }

    #[test]
    fn test_begin_with_appends() {
        let state = TargetState::from_modifiers(&[
            Modifier::BeginWith(vec![Modifier::Fade]),
            Modifier::BeginWith(vec![Modifier::scale(0.5)]),
        ]);
        assert_eq!(state.begin_state, vec![Modifier::Fade, Modifier::scale(0.5)]);
    }

    #[test]
    fn test_conditional_modifiers_are_deferred() {
        let state = TargetState::from_modifiers(&[Modifier::when_presenting(vec![Modifier::Fade])]);
        assert_eq!(state.opacity, None);
        assert_eq!(state.conditional_modifiers.len(), 1);
        assert_eq!(state.conditional_modifiers[0].0, Condition::Presenting);
    }

    #[test]
    fn test_begin_with_if_matched_shape() {
        insta::assert_debug_snapshot!(
            Modifier::begin_with_if_matched(vec![Modifier::Fade]),
            @r###"
        When(
            Matched,
            [
                BeginWith(
                    [
                        Fade,
                    ],
                ),
            ],
        )
        "###
        );
    }

    #[test]
    fn test_modifier_json_shape() {
        let modifiers: Vec<Modifier> = serde_json::from_str(
            r#"["fade", {"translate": {"x": 10.0}}, {"duration": 0.3}, {"arc": 1.0},
                {"when": ["presenting", [{"scale": {"x": 0.8, "y": 0.8}}]]},
                {"ignore_subview_transitions": {"recursive": true}}]"#,
        )
        .unwrap();
        assert_eq!(modifiers[0], Modifier::Fade);
        assert_eq!(modifiers[1], Modifier::translate(10.0, 0.0));
        assert_eq!(modifiers[2], Modifier::Duration(0.3));
        assert_eq!(
            modifiers[4],
            Modifier::when_presenting(vec![Modifier::Scale { x: 0.8, y: 0.8, z: 1.0 }])
        );
        assert_eq!(
            modifiers[5],
            Modifier::IgnoreSubviewTransitions { recursive: true }
        );
    }
}
