//! # Scene 模块
//!
//! 过渡引擎所编排的保留模式场景图。
//!
//! ## 组成
//!
//! - [`ViewTree`]：视图 arena，单一窗口根节点，父子链接，媒体时钟
//! - [`ViewNode`]：视图节点，持有主图层、可选遮罩层与可见性标志
//! - [`ViewController`]：控制器记录
//! - [`ViewMotion`]：每个视图的过渡声明侧表
//!
//! 图层动画按媒体时钟求值，宿主每帧调用 [`ViewTree::advance_time`]。

mod controller;
mod layer;
mod motion;
mod tree;
mod view;

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub use controller::{ControllerKind, ModalPresentationStyle, ViewController};
pub use layer::{
    AnimValue, AnimationCurve, Layer, LayerAnimation, LayerKey, LayerProps, LayerSlot,
};
pub use motion::ViewMotion;
pub use view::{
    Capture, EffectAnimation, EffectStyle, RenderedLayer, ViewKind, ViewNode, VisualEffect,
};

use crate::error::SceneError;
use crate::geometry::{Rect, Size};
use crate::modifier::Modifier;

/// 视图句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ViewId(u64);

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view#{}", self.0)
    }
}

/// 控制器句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ControllerId(u64);

impl fmt::Display for ControllerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "controller#{}", self.0)
    }
}

/// 视图树
#[derive(Debug, Clone)]
pub struct ViewTree {
    views: HashMap<ViewId, ViewNode>,
    controllers: HashMap<ControllerId, ViewController>,
    motion: HashMap<ViewId, ViewMotion>,
    window: ViewId,
    next_view: u64,
    next_controller: u64,
    time: f64,
}

impl ViewTree {
    /// 创建只含窗口根节点的视图树
    pub fn new(window_size: Size) -> Self {
        let window = ViewId(0);
        let mut node = ViewNode::new(ViewKind::Plain);
        node.name = Some("window".to_string());
        node.layer.props.bounds_size = window_size;
        node.layer.props.position =
            crate::geometry::Point::new(window_size.width / 2.0, window_size.height / 2.0);

        let mut views = HashMap::new();
        views.insert(window, node);
        Self {
            views,
            controllers: HashMap::new(),
            motion: HashMap::new(),
            window,
            next_view: 1,
            next_controller: 0,
            time: 0.0,
        }
    }

    pub fn window(&self) -> ViewId {
        self.window
    }

    // ── 媒体时钟 ──

    pub fn current_time(&self) -> f64 {
        self.time
    }

    pub fn advance_time(&mut self, dt: f64) {
        self.time += dt.max(0.0);
    }

    // ── 节点 ──

    /// 创建一个不在树上的视图
    pub fn create_view(&mut self, kind: ViewKind, frame: Rect) -> ViewId {
        let id = ViewId(self.next_view);
        self.next_view += 1;
        self.views.insert(id, ViewNode::new(kind));
        self.set_frame(id, frame);
        id
    }

    /// 创建视图并加入 `parent`
    pub fn add_view(
        &mut self,
        parent: ViewId,
        kind: ViewKind,
        frame: Rect,
    ) -> Result<ViewId, SceneError> {
        if !self.contains(parent) {
            return Err(SceneError::ViewNotFound(parent));
        }
        let id = self.create_view(kind, frame);
        self.add_subview(parent, id)?;
        Ok(id)
    }

    pub fn contains(&self, id: ViewId) -> bool {
        self.views.contains_key(&id)
    }

    pub fn view(&self, id: ViewId) -> Option<&ViewNode> {
        self.views.get(&id)
    }

    pub fn view_mut(&mut self, id: ViewId) -> Option<&mut ViewNode> {
        self.views.get_mut(&id)
    }

    pub fn require(&self, id: ViewId) -> Result<&ViewNode, SceneError> {
        self.views.get(&id).ok_or(SceneError::ViewNotFound(id))
    }

    pub fn require_mut(&mut self, id: ViewId) -> Result<&mut ViewNode, SceneError> {
        self.views.get_mut(&id).ok_or(SceneError::ViewNotFound(id))
    }

    pub fn view_count(&self) -> usize {
        self.views.len()
    }

    /// 按名字查找视图（名字不唯一时返回 id 最小者）
    pub fn find_view(&self, name: &str) -> Option<ViewId> {
        self.views
            .iter()
            .filter(|(_, node)| node.name.as_deref() == Some(name))
            .map(|(id, _)| *id)
            .min()
    }

    pub fn alpha(&self, id: ViewId) -> Option<f64> {
        self.views.get(&id).map(ViewNode::alpha)
    }

    pub fn is_effect_view(&self, id: ViewId) -> bool {
        self.views
            .get(&id)
            .is_some_and(|node| node.kind.is_effect_view())
    }

    // ── 控制器 ──

    pub fn add_controller(&mut self, controller: ViewController) -> ControllerId {
        let id = ControllerId(self.next_controller);
        self.next_controller += 1;
        self.controllers.insert(id, controller);
        id
    }

    pub fn controller(&self, id: ControllerId) -> Option<&ViewController> {
        self.controllers.get(&id)
    }

    pub fn controller_mut(&mut self, id: ControllerId) -> Option<&mut ViewController> {
        self.controllers.get_mut(&id)
    }

    pub fn find_controller(&self, name: &str) -> Option<ControllerId> {
        self.controllers
            .iter()
            .filter(|(_, c)| c.name.as_deref() == Some(name))
            .map(|(id, _)| *id)
            .min()
    }

    // ── 过渡声明侧表 ──

    pub fn motion(&self, id: ViewId) -> Option<&ViewMotion> {
        self.motion.get(&id)
    }

    /// 取得（必要时创建）视图的过渡声明
    pub fn motion_mut(&mut self, id: ViewId) -> &mut ViewMotion {
        self.motion.entry(id).or_default()
    }

    pub fn identifier(&self, id: ViewId) -> Option<&str> {
        self.motion.get(&id).and_then(|m| m.identifier.as_deref())
    }

    pub fn set_identifier(&mut self, id: ViewId, identifier: impl Into<String>) {
        self.motion_mut(id).identifier = Some(identifier.into());
    }

    pub fn modifiers(&self, id: ViewId) -> &[Modifier] {
        self.motion
            .get(&id)
            .map(|m| m.modifiers.as_slice())
            .unwrap_or(&[])
    }

    pub fn set_modifiers(&mut self, id: ViewId, modifiers: Vec<Modifier>) {
        self.motion_mut(id).modifiers = modifiers;
    }

    // ── 图层与呈现值 ──

    pub fn layer(&self, id: ViewId, slot: LayerSlot) -> Option<&Layer> {
        let node = self.views.get(&id)?;
        match slot {
            LayerSlot::Main => Some(&node.layer),
            LayerSlot::Overlay => node.overlay.as_ref(),
        }
    }

    pub fn layer_mut(&mut self, id: ViewId, slot: LayerSlot) -> Option<&mut Layer> {
        let node = self.views.get_mut(&id)?;
        match slot {
            LayerSlot::Main => Some(&mut node.layer),
            LayerSlot::Overlay => node.overlay.as_mut(),
        }
    }

    /// 确保视图有遮罩层（铺满 bounds，初始透明度 0）
    pub fn ensure_overlay(&mut self, id: ViewId) -> bool {
        let Some(node) = self.views.get_mut(&id) else {
            return false;
        };
        if node.overlay.is_none() {
            let size = node.layer.props.bounds_size;
            let mut props = LayerProps {
                bounds_size: size,
                position: crate::geometry::Point::new(size.width / 2.0, size.height / 2.0),
                opacity: 0.0,
                ..LayerProps::default()
            };
            props.border_color = None;
            node.overlay = Some(Layer::new(props));
        }
        true
    }

    /// 在当前媒体时间求某个键的呈现值
    pub fn presentation_value(&self, id: ViewId, slot: LayerSlot, key: LayerKey) -> Option<AnimValue> {
        let layer = self.layer(id, slot)?;
        Some(layer.presentation(key, self.time))
    }

    /// 视图主图层在当前时间的完整呈现属性
    pub fn presentation(&self, id: ViewId) -> Option<LayerProps> {
        let layer = self.layer(id, LayerSlot::Main)?;
        let mut props = layer.props.clone();
        for animation in layer.animations() {
            props.set(animation.key, animation.value_at(self.time));
        }
        Some(props)
    }

    pub fn set_model_value(&mut self, id: ViewId, slot: LayerSlot, key: LayerKey, value: AnimValue) {
        if let Some(layer) = self.layer_mut(id, slot) {
            layer.props.set(key, value);
        }
    }

    /// 效果视图当前呈现的效果
    pub fn presented_effect(&self, id: ViewId) -> Option<VisualEffect> {
        let node = self.views.get(&id)?;
        let ViewKind::EffectView { effect } = &node.kind else {
            return None;
        };
        match &node.effect_animation {
            Some(animation) => animation.value(self.time),
            None => *effect,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    #[test]
    fn test_new_tree_has_window() {
        let tree = ViewTree::new(Size::new(375.0, 812.0));
        let window = tree.window();
        assert_eq!(tree.find_view("window"), Some(window));
        assert_eq!(tree.frame(window), Rect::new(0.0, 0.0, 375.0, 812.0));
    }

    #[test]
    fn test_motion_side_table_defaults() {
        let mut tree = ViewTree::new(Size::new(100.0, 100.0));
        let v = tree
            .add_view(tree.window(), ViewKind::Plain, Rect::new(0.0, 0.0, 10.0, 10.0))
            .unwrap();
        assert!(tree.motion(v).is_none());
        assert!(tree.modifiers(v).is_empty());

        tree.set_identifier(v, "card");
        assert_eq!(tree.identifier(v), Some("card"));
        assert!(tree.motion(v).unwrap().is_enabled);
    }

    #[test]
    fn test_overlay_created_lazily() {
        let mut tree = ViewTree::new(Size::new(100.0, 100.0));
        let v = tree
            .add_view(tree.window(), ViewKind::Plain, Rect::new(0.0, 0.0, 40.0, 20.0))
            .unwrap();
        assert!(tree.layer(v, LayerSlot::Overlay).is_none());
        assert!(tree.ensure_overlay(v));
        let overlay = tree.layer(v, LayerSlot::Overlay).unwrap();
        assert_eq!(overlay.props.opacity, 0.0);
        assert_eq!(overlay.props.position, Point::new(20.0, 10.0));
    }

    #[test]
    fn test_presentation_tracks_media_time() {
        let mut tree = ViewTree::new(Size::new(100.0, 100.0));
        let v = tree
            .add_view(tree.window(), ViewKind::Plain, Rect::new(0.0, 0.0, 10.0, 10.0))
            .unwrap();
        let mut animation = LayerAnimation::new(
            LayerKey::Opacity,
            AnimValue::Scalar(1.0),
            AnimValue::Scalar(0.0),
            AnimationCurve::Basic(crate::timing::TimingFunction::Linear),
        );
        animation.duration = 1.0;
        tree.layer_mut(v, LayerSlot::Main).unwrap().add_animation(animation);

        tree.advance_time(0.25);
        assert_eq!(
            tree.presentation_value(v, LayerSlot::Main, LayerKey::Opacity),
            Some(AnimValue::Scalar(0.75))
        );
        assert_eq!(tree.presentation(v).unwrap().opacity, 0.75);
        // 模型值不变
        assert_eq!(tree.alpha(v), Some(1.0));
    }
}
