//! 整屏默认过渡

use tracing::debug;

use super::{PreprocessContext, Preprocessor};
use crate::geometry::{Color, Point};
use crate::modifier::Modifier;
use crate::scene::{ControllerKind, ViewId};
use crate::target_state::TargetState;
use crate::timing::TimingFunction;
use crate::transition_type::{Direction, TransitionType};

/// 为两侧根视图注入默认过渡原型对应的修饰器
#[derive(Debug, Default)]
pub struct DefaultTypePreprocessor;

impl DefaultTypePreprocessor {
    /// 解析本次过渡实际使用的类型
    fn resolve(cx: &PreprocessContext<'_>) -> TransitionType {
        let info = cx.info;
        let mut resolved = info.default_type.clone();

        if resolved == TransitionType::Auto {
            let host = info.host.and_then(|id| cx.tree.controller(id));
            let presented = if info.is_presenting { info.to } else { info.from };
            resolved = match host {
                Some(host) if info.kind.is_navigation() || host.kind == ControllerKind::Navigation => {
                    host.navigation_transition.clone()
                }
                Some(host) if info.kind.is_tab_bar() || host.kind == ControllerKind::TabBar => {
                    host.tab_transition.clone()
                }
                _ => cx
                    .tree
                    .controller(presented)
                    .map(|c| c.modal_transition.clone())
                    .unwrap_or_default(),
            };
        }

        resolved = resolved.select(info.is_presenting);

        if resolved == TransitionType::Auto {
            resolved = if cx.can_animate(info.to_view, true) || cx.can_animate(info.from_view, false) {
                TransitionType::None
            } else if info.kind.is_navigation() {
                if info.is_presenting {
                    TransitionType::Push(Direction::Left)
                } else {
                    TransitionType::Pull(Direction::Right)
                }
            } else if info.kind.is_tab_bar() {
                if info.is_presenting {
                    TransitionType::Slide(Direction::Left)
                } else {
                    TransitionType::Slide(Direction::Right)
                }
            } else {
                TransitionType::Fade
            };
        }
        resolved
    }
}

/// 根视图整屏位移量
fn shift(cx: &PreprocessContext<'_>, direction: Direction, appearing: bool) -> Point {
    let size = cx.tree.bounds(cx.context.container()).size;
    match direction {
        Direction::Left | Direction::Right => {
            let x = if (direction == Direction::Right) == appearing {
                -size.width
            } else {
                size.width
            };
            Point::new(x, 0.0)
        }
        Direction::Up | Direction::Down => {
            let y = if (direction == Direction::Down) == appearing {
                -size.height
            } else {
                size.height
            };
            Point::new(0.0, y)
        }
    }
}

fn translate(p: Point) -> Modifier {
    Modifier::translate(p.x, p.y)
}

fn shadow_state() -> Vec<Modifier> {
    vec![
        Modifier::ShadowOpacity(0.5),
        Modifier::ShadowColor(Color::BLACK),
        Modifier::ShadowRadius(5.0),
        Modifier::ShadowOffset(crate::geometry::Size::ZERO),
        Modifier::MasksToBounds(false),
    ]
}

fn dim() -> Modifier {
    Modifier::overlay(Color::BLACK, 0.1)
}

impl Preprocessor for DefaultTypePreprocessor {
    fn process(&self, cx: &mut PreprocessContext<'_>, _from_views: &[ViewId], _to_views: &[ViewId]) {
        let from_view = cx.info.from_view;
        let to_view = cx.info.to_view;
        if from_view == to_view {
            return;
        }

        let resolved = Self::resolve(cx);
        debug!(transition_type = ?resolved, "默认过渡类型");
        if resolved == TransitionType::None {
            return;
        }

        if let Some(below) = resolved.inserts_destination_below() {
            cx.context.insert_to_view_first = below;
        }

        let options = &cx.info.options;
        let base = [
            Modifier::Timing(options.default_timing),
            Modifier::Duration(options.default_duration),
        ];
        let mut from_state = TargetState::from_modifiers(&base);
        let mut to_state = TargetState::from_modifiers(&base);

        match resolved {
            TransitionType::Push(d) => {
                to_state.append(&[
                    translate(shift(cx, d, true)),
                    Modifier::ShadowOpacity(0.0),
                    Modifier::BeginWith(shadow_state()),
                    Modifier::Timing(TimingFunction::Deceleration),
                ]);
                from_state.append(&[
                    translate(shift(cx, d, false) / 3.0),
                    dim(),
                    Modifier::Timing(TimingFunction::Deceleration),
                ]);
            }
            TransitionType::Pull(d) => {
                from_state.append(&[
                    translate(shift(cx, d, false)),
                    Modifier::ShadowOpacity(0.0),
                    Modifier::BeginWith(shadow_state()),
                ]);
                to_state.append(&[translate(shift(cx, d, true) / 3.0), dim()]);
            }
            TransitionType::Slide(d) => {
                from_state.append(&[translate(shift(cx, d, false))]);
                to_state.append(&[translate(shift(cx, d, true))]);
            }
            TransitionType::ZoomSlide(d) => {
                from_state.append(&[translate(shift(cx, d, false)), Modifier::scale(0.8)]);
                to_state.append(&[translate(shift(cx, d, true)), Modifier::scale(0.8)]);
            }
            TransitionType::Cover(d) => {
                to_state.append(&[
                    translate(shift(cx, d, true)),
                    Modifier::ShadowOpacity(0.0),
                    Modifier::BeginWith(shadow_state()),
                    Modifier::Timing(TimingFunction::Deceleration),
                ]);
                from_state.append(&[dim(), Modifier::Timing(TimingFunction::Deceleration)]);
            }
            TransitionType::Uncover(d) => {
                from_state.append(&[
                    translate(shift(cx, d, false)),
                    Modifier::ShadowOpacity(0.0),
                    Modifier::BeginWith(shadow_state()),
                ]);
                to_state.append(&[dim()]);
            }
            TransitionType::PageIn(d) => {
                to_state.append(&[
                    translate(shift(cx, d, true)),
                    Modifier::ShadowOpacity(0.0),
                    Modifier::BeginWith(shadow_state()),
                    Modifier::Timing(TimingFunction::Deceleration),
                ]);
                from_state.append(&[
                    Modifier::scale(0.7),
                    dim(),
                    Modifier::Timing(TimingFunction::Deceleration),
                ]);
            }
            TransitionType::PageOut(d) => {
                from_state.append(&[
                    translate(shift(cx, d, false)),
                    Modifier::ShadowOpacity(0.0),
                    Modifier::BeginWith(shadow_state()),
                ]);
                to_state.append(&[Modifier::scale(0.7), dim()]);
            }
            TransitionType::Fade => {
                let info = cx.info;
                if !(info.from_over_full_screen && !info.is_presenting) {
                    to_state = TargetState::from_modifiers(&[Modifier::Fade]);
                }
                let from_is_translucent = cx.tree.view(from_view).is_some_and(|n| {
                    !n.is_opaque || n.layer.props.background_color.is_some_and(|c| c.a < 1.0)
                });
                if (!info.is_presenting && info.to_over_full_screen) || from_is_translucent {
                    from_state = TargetState::from_modifiers(&[Modifier::Fade]);
                }
                to_state.append(&[Modifier::DurationMatchLongest]);
                from_state.append(&[Modifier::DurationMatchLongest]);
            }
            TransitionType::Zoom => {
                to_state.append(&[Modifier::scale(1.3), Modifier::Fade]);
                from_state.append(&[Modifier::scale(0.7)]);
            }
            TransitionType::ZoomOut => {
                to_state.append(&[Modifier::scale(0.7)]);
                from_state.append(&[Modifier::scale(1.3), Modifier::Fade]);
            }
            TransitionType::Auto | TransitionType::None | TransitionType::SelectBy { .. } => {
                unreachable!("默认过渡类型在解析后仍为 {resolved:?}")
            }
        }

        cx.context.set_target_state(from_view, Some(from_state));
        cx.context.set_target_state(to_view, Some(to_state));
    }
}
