//! # LayerViewContext
//!
//! 按图层键构建显式动画。
//!
//! 每个键记录一对 `(from, to)`；出现的视图从目标状态动画到当前值，
//! 消失的视图从当前值动画到目标状态。圆角、内容矩形与内容缩放同时装到
//! 内容子层与遮罩层上，尺寸同时装到内容子层上。

use std::collections::{BTreeMap, BTreeSet};

use super::{ViewContext, ViewContextBase};
use crate::geometry::{Point, Transform3D};
use crate::scene::{
    AnimValue, AnimationCurve, LayerAnimation, LayerKey, LayerProps, LayerSlot, ViewId, ViewTree,
};
use crate::target_state::TargetState;

/// `apply` 装上的保持动画时长
const HOLD_DURATION: f64 = 100.0;
/// 拖动时留在动画末尾之前的余量
const SEEK_END_MARGIN: f64 = 0.01;

/// 装到某个图层上的一条动画
#[derive(Debug, Clone, PartialEq)]
struct InstalledAnimation {
    node: ViewId,
    slot: LayerSlot,
    /// 目标状态里的键（遮罩层键在图层上装成映射后的键）
    state_key: LayerKey,
    animation: LayerAnimation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayerViewContext {
    base: ViewContextBase,
    state: BTreeMap<LayerKey, (AnimValue, AnimValue)>,
    animations: Vec<InstalledAnimation>,
    /// 被 `apply` 覆盖、拖动时跳过的键
    overridden: BTreeSet<LayerKey>,
    created_overlay: bool,
}

impl LayerViewContext {
    /// 目标状态换算成图层键上的值
    fn view_state(&self, tree: &ViewTree, state: &TargetState) -> BTreeMap<LayerKey, AnimValue> {
        let snapshot = self.base.snapshot;
        let mut values = BTreeMap::new();
        let mut transform = state.transform;

        if let Some(size) = state.size {
            let scale_based = state
                .use_scale_based_size_change
                .or(self.base.target_state.use_scale_based_size_change)
                .unwrap_or(false);
            if scale_based {
                let current = tree
                    .view(snapshot)
                    .map(|node| node.layer.props.bounds_size)
                    .unwrap_or(size);
                let sx = if current.width > 0.0 { size.width / current.width } else { 1.0 };
                let sy = if current.height > 0.0 { size.height / current.height } else { 1.0 };
                transform = Some(transform.unwrap_or(Transform3D::IDENTITY).scale(sx, sy, 1.0));
            } else {
                values.insert(LayerKey::BoundsSize, AnimValue::Size(size));
            }
        }
        if let Some(position) = state.position {
            values.insert(LayerKey::Position, AnimValue::Point(position));
        }
        if let Some(opacity) = state.opacity {
            // 效果视图的透明度交给效果动画器
            if !tree.is_effect_view(snapshot) {
                values.insert(LayerKey::Opacity, AnimValue::Scalar(opacity));
            }
        }
        if let Some(v) = state.corner_radius {
            values.insert(LayerKey::CornerRadius, AnimValue::Scalar(v));
        }
        if let Some(c) = state.background_color {
            values.insert(LayerKey::BackgroundColor, AnimValue::Color(Some(c)));
        }
        if let Some(v) = state.z_position {
            values.insert(LayerKey::ZPosition, AnimValue::Scalar(v));
        }
        if let Some(v) = state.border_width {
            values.insert(LayerKey::BorderWidth, AnimValue::Scalar(v));
        }
        if let Some(c) = state.border_color {
            values.insert(LayerKey::BorderColor, AnimValue::Color(Some(c)));
        }
        if let Some(b) = state.masks_to_bounds {
            values.insert(LayerKey::MasksToBounds, AnimValue::Bool(b));
        }
        if state.display_shadow {
            if let Some(c) = state.shadow_color {
                values.insert(LayerKey::ShadowColor, AnimValue::Color(Some(c)));
            }
            if let Some(v) = state.shadow_radius {
                values.insert(LayerKey::ShadowRadius, AnimValue::Scalar(v));
            }
            if let Some(v) = state.shadow_opacity {
                values.insert(LayerKey::ShadowOpacity, AnimValue::Scalar(v));
            }
            if let Some(path) = state.shadow_path {
                values.insert(LayerKey::ShadowPath, AnimValue::Path(Some(path)));
            }
            if let Some(offset) = state.shadow_offset {
                values.insert(LayerKey::ShadowOffset, AnimValue::Size(offset));
            }
        }
        if let Some(r) = state.contents_rect {
            values.insert(LayerKey::ContentsRect, AnimValue::Rect(r));
        }
        if let Some(v) = state.contents_scale {
            values.insert(LayerKey::ContentsScale, AnimValue::Scalar(v));
        }
        if let Some(t) = transform {
            values.insert(LayerKey::Transform, AnimValue::Transform(t));
        }
        if let Some(overlay) = state.overlay {
            values.insert(LayerKey::OverlayColor, AnimValue::Color(Some(overlay.color)));
            values.insert(LayerKey::OverlayOpacity, AnimValue::Scalar(overlay.opacity));
        }
        values
    }

    fn ensure_overlay(&mut self, tree: &mut ViewTree) {
        let snapshot = self.base.snapshot;
        if tree.layer(snapshot, LayerSlot::Overlay).is_none() && tree.ensure_overlay(snapshot) {
            self.created_overlay = true;
        }
    }

    /// 键的当前呈现值
    fn current_value(&mut self, tree: &mut ViewTree, key: LayerKey) -> AnimValue {
        let snapshot = self.base.snapshot;
        let value = match key.overlay_target() {
            Some(target) => {
                self.ensure_overlay(tree);
                tree.presentation_value(snapshot, LayerSlot::Overlay, target)
            }
            None => tree.presentation_value(snapshot, LayerSlot::Main, key),
        };
        value.unwrap_or_else(|| LayerProps::default().get(key))
    }

    /// 直接写模型值
    fn set_value(&mut self, tree: &mut ViewTree, key: LayerKey, value: AnimValue) {
        let snapshot = self.base.snapshot;
        match key.overlay_target() {
            Some(target) => {
                self.ensure_overlay(tree);
                tree.set_model_value(snapshot, LayerSlot::Overlay, target, value);
            }
            None => tree.set_model_value(snapshot, LayerSlot::Main, key, value),
        }
    }

    /// 与快照等大的第一个子视图
    fn content_child(&self, tree: &ViewTree) -> Option<ViewId> {
        let snapshot = self.base.snapshot;
        let size = tree.view(snapshot)?.layer.props.bounds_size;
        let first = *tree.subviews(snapshot).first()?;
        let first_size = tree.view(first)?.layer.props.bounds_size;
        (first_size == size).then_some(first)
    }

    fn make_animation(
        &self,
        key: LayerKey,
        begin_time: f64,
        duration: f64,
        from: AnimValue,
        to: AnimValue,
        ignore_arc: bool,
    ) -> LayerAnimation {
        let state = &self.base.target_state;
        let timing = state.timing.unwrap_or_default();
        let mut animation_duration = duration;

        let arc = match (key, from.as_point(), to.as_point(), state.arc) {
            (LayerKey::Position, Some(p0), Some(p1), Some(intensity))
                if !ignore_arc && (p0.x - p1.x).abs() >= 1.0 && (p0.y - p1.y).abs() >= 1.0 =>
            {
                let corner = if p0.y > p1.y {
                    Point::new(p1.x, p0.y)
                } else {
                    Point::new(p0.x, p1.y)
                };
                Some((corner - p0) * intensity + p0)
            }
            _ => None,
        };

        let curve = match (arc, state.spring) {
            (Some(control), _) => AnimationCurve::Arc { control, timing },
            // 圆角不使用弹簧
            (None, Some(spring)) if key != LayerKey::CornerRadius => {
                animation_duration = spring.settling_duration();
                AnimationCurve::Spring(spring)
            }
            _ => AnimationCurve::Basic(timing),
        };

        let mut animation = LayerAnimation::new(key, from, to, curve);
        animation.begin_time = begin_time;
        animation.duration = animation_duration;
        animation
    }

    fn install(
        &mut self,
        tree: &mut ViewTree,
        node: ViewId,
        slot: LayerSlot,
        state_key: LayerKey,
        animation: LayerAnimation,
        record: bool,
    ) {
        let Some(layer) = tree.layer_mut(node, slot) else {
            return;
        };
        layer.add_animation(animation.clone());
        if record {
            self.animations.push(InstalledAnimation {
                node,
                slot,
                state_key,
                animation,
            });
        }
    }

    /// 为一个键装动画，返回它需要的秒数
    #[allow(clippy::too_many_arguments)]
    fn animate_key(
        &mut self,
        tree: &mut ViewTree,
        key: LayerKey,
        begin_time: f64,
        duration: f64,
        from: AnimValue,
        to: AnimValue,
        record: bool,
    ) -> f64 {
        let snapshot = self.base.snapshot;

        if let Some(target) = key.overlay_target() {
            self.ensure_overlay(tree);
            let animation = self.make_animation(target, begin_time, duration, from, to, false);
            let needed = animation.duration;
            self.install(tree, snapshot, LayerSlot::Overlay, key, animation, record);
            return needed;
        }

        let animation = self.make_animation(key, begin_time, duration, from, to, false);
        let needed = animation.duration;
        let content = self.content_child(tree);

        if key.is_mirrored() {
            if let Some(content) = content {
                self.install(tree, content, LayerSlot::Main, key, animation.clone(), record);
            }
            if tree.layer(snapshot, LayerSlot::Overlay).is_some() {
                self.install(tree, snapshot, LayerSlot::Overlay, key, animation.clone(), record);
            }
        } else if key == LayerKey::BoundsSize {
            if let (Some(content), Some(from_size), Some(to_size)) =
                (content, from.as_size(), to.as_size())
            {
                self.install(tree, content, LayerSlot::Main, key, animation.clone(), record);
                // 内容子层的中心跟随尺寸
                let center = |w: f64, h: f64| AnimValue::Point(Point::new(w / 2.0, h / 2.0));
                let follow = self.make_animation(
                    LayerKey::Position,
                    begin_time,
                    duration,
                    center(from_size.width, from_size.height),
                    center(to_size.width, to_size.height),
                    true,
                );
                self.install(tree, content, LayerSlot::Main, key, follow, record);
            }
        }
        self.install(tree, snapshot, LayerSlot::Main, key, animation, record);
        needed
    }

    fn remove_installed(&mut self, tree: &mut ViewTree) {
        for installed in self.animations.drain(..) {
            if let Some(layer) = tree.layer_mut(installed.node, installed.slot) {
                layer.remove_animation(installed.animation.key);
            }
        }
    }

    /// 按状态表重新开始全部动画，返回到停止为止的秒数
    fn animate(&mut self, tree: &mut ViewTree, delay: f64, duration: f64) -> f64 {
        self.remove_installed(tree);
        let begin_time = tree.current_time() + delay;
        let mut until_stopped: f64 = 0.0;
        let entries: Vec<(LayerKey, (AnimValue, AnimValue))> =
            self.state.iter().map(|(k, v)| (*k, *v)).collect();
        for (key, (from, to)) in entries {
            let needed = self.animate_key(tree, key, begin_time, duration, from, to, true);
            until_stopped = until_stopped.max(needed);
        }
        until_stopped + delay
    }
}

impl ViewContext for LayerViewContext {
    fn can_animate(_tree: &ViewTree, _view: ViewId, state: &TargetState, _appearing: bool) -> bool {
        state.has_layer_targets() || state.force_animate
    }

    fn new(base: ViewContextBase) -> Self {
        Self {
            base,
            state: BTreeMap::new(),
            animations: Vec::new(),
            overridden: BTreeSet::new(),
            created_overlay: false,
        }
    }

    fn base(&self) -> &ViewContextBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ViewContextBase {
        &mut self.base
    }

    fn start_animations(&mut self, tree: &mut ViewTree) -> f64 {
        if !self.base.target_state.begin_state.is_empty() {
            let begin_state = TargetState::from_modifiers(&self.base.target_state.begin_state);
            for (key, value) in self.view_state(tree, &begin_state) {
                self.set_value(tree, key, value);
            }
        }

        let target = self.base.target_state.clone();
        for (key, target_value) in self.view_state(tree, &target) {
            let current = self.current_value(tree, key);
            let pair = if self.base.is_appearing {
                (target_value, current)
            } else {
                (current, target_value)
            };
            self.state.insert(key, pair);
        }

        self.animate(tree, target.delay, self.base.duration)
    }

    fn seek(&mut self, tree: &mut ViewTree, elapsed: f64) {
        let offset = elapsed - self.base.target_state.delay;
        for installed in self.animations.iter_mut() {
            if self.overridden.contains(&installed.state_key) {
                continue;
            }
            let animation = &mut installed.animation;
            animation.speed = 0.0;
            animation.time_offset = offset.min(animation.duration - SEEK_END_MARGIN).max(0.0);
            if let Some(layer) = tree.layer_mut(installed.node, installed.slot) {
                layer.add_animation(animation.clone());
            }
        }
    }

    fn resume(&mut self, tree: &mut ViewTree, elapsed: f64, reversed: bool) -> f64 {
        let keys: Vec<LayerKey> = self.state.keys().copied().collect();
        for key in keys {
            let current = self.current_value(tree, key);
            if let Some(entry) = self.state.get_mut(&key) {
                let to = if reversed { entry.0 } else { entry.1 };
                *entry = (current, to);
            }
        }
        self.overridden.clear();

        let delay = self.base.target_state.delay;
        let duration = self.base.duration;
        if reversed {
            if elapsed > delay + duration {
                let back_delay = elapsed - (delay + duration);
                return self.animate(tree, back_delay, duration);
            } else if elapsed > delay {
                return self.animate(tree, 0.0, elapsed - delay);
            }
        } else if elapsed <= delay {
            return self.animate(tree, delay - elapsed, duration);
        } else if elapsed <= delay + duration {
            let elapsed_in_animation = elapsed - delay;
            return self.animate(tree, 0.0, duration - elapsed_in_animation);
        }
        0.0
    }

    fn apply(&mut self, tree: &mut ViewTree, state: &TargetState) {
        let begin_time = tree.current_time();
        for (key, value) in self.view_state(tree, state) {
            if !self.state.contains_key(&key) {
                let current = self.current_value(tree, key);
                self.state.insert(key, (current, current));
            }
            self.animate_key(tree, key, begin_time, HOLD_DURATION, value, value, false);
            self.overridden.insert(key);
        }
    }

    fn clean(&mut self, tree: &mut ViewTree) {
        let snapshot = self.base.snapshot;
        self.remove_installed(tree);
        let content = self.content_child(tree);
        for node in [Some(snapshot), content].into_iter().flatten() {
            if let Some(node) = tree.view_mut(node) {
                node.layer.remove_engine_animations();
                if let Some(overlay) = node.overlay.as_mut() {
                    overlay.remove_engine_animations();
                }
            }
        }
        if self.created_overlay {
            if let Some(node) = tree.view_mut(snapshot) {
                node.overlay = None;
            }
            self.created_overlay = false;
        }
        self.state.clear();
        self.overridden.clear();
    }
}
