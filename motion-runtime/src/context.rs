//! # Context 模块
//!
//! 一次过渡的共享上下文：容器视图、标识符映射、目标状态表、快照表与隐藏记录。
//!
//! ## 快照
//!
//! 每个真实视图在一次过渡中最多有一个快照代理，[`TransitionContext::snapshot_view`]
//! 幂等。快照的几何（锚点、位置、变换）表示在视图所配置的坐标空间中：
//! 最近的已快照祖先的快照（局部），或过渡容器（全局）。
//!
//! 拍快照时真实视图被隐藏，直到过渡结束时 [`TransitionContext::unhide_all`] 恢复。

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use crate::geometry::{Point, Size, Transform3D};
use crate::scene::{Capture, LayerProps, ViewId, ViewKind, ViewTree};
use crate::target_state::{CoordinateSpace, SnapshotStrategy, TargetState};

/// 不拍快照、直接拿来动画的真实视图原来的位置
#[derive(Debug, Clone, PartialEq)]
struct DetachedView {
    view: ViewId,
    superview: ViewId,
    index: usize,
    position: Point,
    transform: Transform3D,
}

/// 视图被隐藏前的可见性
#[derive(Debug, Clone, Copy, PartialEq)]
enum HiddenState {
    /// 普通视图：原透明度
    Alpha(f64),
    /// 效果视图：原 `is_hidden` 标记，透明度不动
    Flag { was_hidden: bool, alpha: f64 },
}

impl HiddenState {
    fn alpha(self) -> f64 {
        match self {
            HiddenState::Alpha(alpha) | HiddenState::Flag { alpha, .. } => alpha,
        }
    }
}

/// 过渡上下文
#[derive(Debug, Clone)]
pub struct TransitionContext {
    container: ViewId,
    from_views: Vec<ViewId>,
    to_views: Vec<ViewId>,
    source_by_identifier: BTreeMap<String, ViewId>,
    destination_by_identifier: BTreeMap<String, ViewId>,
    target_states: BTreeMap<ViewId, TargetState>,
    snapshots: BTreeMap<ViewId, ViewId>,
    /// 快照创建顺序，保证清理顺序确定
    snapshot_order: Vec<ViewId>,
    /// 上下文创建的节点（快照及其内容子视图）
    owned_nodes: BTreeSet<ViewId>,
    hidden_views: BTreeMap<ViewId, HiddenState>,
    detached_views: Vec<DetachedView>,
    /// 目标快照放在源快照之下
    pub insert_to_view_first: bool,
}

impl TransitionContext {
    pub fn new(container: ViewId) -> Self {
        Self {
            container,
            from_views: Vec::new(),
            to_views: Vec::new(),
            source_by_identifier: BTreeMap::new(),
            destination_by_identifier: BTreeMap::new(),
            target_states: BTreeMap::new(),
            snapshots: BTreeMap::new(),
            snapshot_order: Vec::new(),
            owned_nodes: BTreeSet::new(),
            hidden_views: BTreeMap::new(),
            detached_views: Vec::new(),
            insert_to_view_first: false,
        }
    }

    pub fn container(&self) -> ViewId {
        self.container
    }

    pub fn from_views(&self) -> &[ViewId] {
        &self.from_views
    }

    pub fn to_views(&self) -> &[ViewId] {
        &self.to_views
    }

    /// 索引两侧层级，建立目标状态与标识符映射。
    ///
    /// 只有与容器可见区域相交、或声明了强制动画的视图会被收录。
    pub fn set(&mut self, tree: &mut ViewTree, from_views: Vec<ViewId>, to_views: Vec<ViewId>) {
        let mut sources = BTreeMap::new();
        let mut destinations = BTreeMap::new();
        self.index_views(tree, &from_views, &mut sources);
        self.index_views(tree, &to_views, &mut destinations);
        self.source_by_identifier = sources;
        self.destination_by_identifier = destinations;
        self.from_views = from_views;
        self.to_views = to_views;
    }

    fn index_views(
        &mut self,
        tree: &mut ViewTree,
        views: &[ViewId],
        identifiers: &mut BTreeMap<String, ViewId>,
    ) {
        let container_bounds = tree.bounds(self.container);
        for &view in views {
            if let Some(node) = tree.view_mut(view) {
                node.layer.remove_engine_animations();
            }
            let modifiers = tree.modifiers(view);
            let state = (!modifiers.is_empty()).then(|| TargetState::from_modifiers(modifiers));
            let forced = state.as_ref().is_some_and(|s| s.force_animate);
            let visible = tree
                .convert_rect(tree.bounds(view), view, self.container)
                .intersects(&container_bounds);
            if !(forced || visible) {
                continue;
            }
            // 同一侧重复的标识符以最后一个为准
            if let Some(identifier) = tree.identifier(view) {
                identifiers.insert(identifier.to_string(), view);
            }
            match state {
                Some(state) => {
                    self.target_states.insert(view, state);
                }
                None => {
                    self.target_states.remove(&view);
                }
            }
        }
    }

    // ── 标识符与配对 ──

    pub fn source_view(&self, identifier: &str) -> Option<ViewId> {
        self.source_by_identifier.get(identifier).copied()
    }

    pub fn destination_view(&self, identifier: &str) -> Option<ViewId> {
        self.destination_by_identifier.get(identifier).copied()
    }

    /// 另一侧拥有相同标识符的视图
    pub fn paired_view(&self, tree: &ViewTree, view: ViewId) -> Option<ViewId> {
        let identifier = tree.identifier(view)?;
        if self.source_view(identifier) == Some(view) {
            self.destination_view(identifier)
        } else if self.destination_view(identifier) == Some(view) {
            self.source_view(identifier)
        } else {
            None
        }
    }

    // ── 目标状态 ──

    pub fn target_state(&self, view: ViewId) -> Option<&TargetState> {
        self.target_states.get(&view)
    }

    pub fn target_state_mut(&mut self, view: ViewId) -> Option<&mut TargetState> {
        self.target_states.get_mut(&view)
    }

    /// 取得目标状态，没有时创建空状态
    pub fn state_entry(&mut self, view: ViewId) -> &mut TargetState {
        self.target_states.entry(view).or_default()
    }

    pub fn set_target_state(&mut self, view: ViewId, state: Option<TargetState>) {
        match state {
            Some(state) => {
                self.target_states.insert(view, state);
            }
            None => {
                self.target_states.remove(&view);
            }
        }
    }

    // ── 快照 ──

    pub fn snapshot(&self, view: ViewId) -> Option<ViewId> {
        self.snapshots.get(&view).copied()
    }

    /// 取得（必要时创建）视图的快照代理
    pub fn snapshot_view(&mut self, tree: &mut ViewTree, view: ViewId) -> ViewId {
        if let Some(snapshot) = self.snapshots.get(&view) {
            return *snapshot;
        }

        let state = self.target_states.get(&view);
        let coordinate_space = state
            .and_then(|s| s.coordinate_space)
            .unwrap_or(CoordinateSpace::Local);
        let strategy = state.and_then(|s| s.snapshot).unwrap_or_default();
        let display_shadow = state.is_none_or(|s| s.display_shadow);

        // 快照挂载点与它的几何参照
        let (parent_node, coordinate_root) = match coordinate_space {
            CoordinateSpace::Global => (self.container, self.container),
            CoordinateSpace::Local => self.local_coordinate_space(tree, view),
        };

        self.unhide(tree, view);

        let snapshot = self.capture(tree, view, strategy);

        let Some(source) = tree.view(view).map(|node| node.layer.props.clone()) else {
            return snapshot;
        };
        let position = tree.position_in(view, parent_node);
        let transform = tree.flat_transform_to(coordinate_root, view);
        let identifier = tree.identifier(view).map(str::to_string);
        let is_navigation_bar = matches!(
            tree.view(view).map(|n| &n.kind),
            Some(ViewKind::NavigationBar { .. })
        );
        let is_opaque = tree.view(view).is_some_and(|n| n.is_opaque);

        if let Some(node) = tree.view_mut(snapshot) {
            let props = &mut node.layer.props;
            props.anchor_point = source.anchor_point;
            props.position = position;
            props.transform = transform;
            props.bounds_size = source.bounds_size;
        }
        if let Some(identifier) = identifier {
            tree.set_identifier(snapshot, identifier);
        }

        if strategy != SnapshotStrategy::NoSnapshot {
            if !is_navigation_bar {
                if let Some(&content) = tree.subviews(snapshot).first() {
                    if let Some(node) = tree.view_mut(content) {
                        node.layer.props.corner_radius = source.corner_radius;
                        node.layer.props.masks_to_bounds = true;
                    }
                }
            }
            if let Some(node) = tree.view_mut(snapshot) {
                node.is_opaque = is_opaque;
                let props = &mut node.layer.props;
                props.corner_radius = source.corner_radius;
                props.z_position = source.z_position;
                props.opacity = source.opacity;
                props.masks_to_bounds = source.masks_to_bounds;
                props.border_color = source.border_color;
                props.border_width = source.border_width;
                props.contents_rect = source.contents_rect;
                props.contents_scale = source.contents_scale;
                if display_shadow {
                    props.shadow_radius = source.shadow_radius;
                    props.shadow_opacity = source.shadow_opacity;
                    props.shadow_color = source.shadow_color;
                    props.shadow_offset = source.shadow_offset;
                    props.shadow_path = source.shadow_path;
                }
            }
            self.hide(tree, view);
        }

        let paired_snapshot = self
            .paired_view(tree, view)
            .and_then(|paired| self.snapshots.get(&paired).map(|s| (paired, *s)));
        match paired_snapshot {
            Some((paired, paired_snapshot)) => {
                let next_siblings: Vec<ViewId> = match tree.superview(paired) {
                    Some(parent) => {
                        let siblings = tree.subviews(parent);
                        let index = siblings.iter().position(|v| *v == paired).unwrap_or(0);
                        siblings[index + 1..].to_vec()
                    }
                    None => Vec::new(),
                };
                let _ = tree.add_subview(parent_node, paired_snapshot);
                let _ = tree.add_subview(parent_node, snapshot);
                let children = tree.subviews(paired).to_vec();
                for child in children {
                    self.insert_global_view_tree(tree, child);
                }
                for sibling in next_siblings {
                    self.insert_global_view_tree(tree, sibling);
                }
            }
            None => {
                let _ = tree.add_subview(parent_node, snapshot);
            }
        }
        let _ = tree.add_subview(parent_node, snapshot);

        debug!(view = %view, snapshot = %snapshot, strategy = ?strategy, "创建快照");
        self.snapshots.insert(view, snapshot);
        self.snapshot_order.push(view);
        snapshot
    }

    /// 沿父链找最近的已快照祖先；找不到时使用容器
    fn local_coordinate_space(&self, tree: &ViewTree, view: ViewId) -> (ViewId, ViewId) {
        let mut current = view;
        while current != self.container && !self.snapshots.contains_key(&current) {
            match tree.superview(current) {
                Some(parent) => current = parent,
                None => break,
            }
        }
        match self.snapshots.get(&current) {
            Some(snapshot) => (*snapshot, current),
            None => (self.container, self.container),
        }
    }

    /// 把全局坐标空间中已快照的视图重新放回容器最上层
    fn insert_global_view_tree(&self, tree: &mut ViewTree, view: ViewId) {
        let is_global = self
            .target_states
            .get(&view)
            .and_then(|s| s.coordinate_space)
            == Some(CoordinateSpace::Global);
        if is_global {
            if let Some(snapshot) = self.snapshots.get(&view) {
                let _ = tree.add_subview(self.container, *snapshot);
            }
        }
        let children = tree.subviews(view).to_vec();
        for child in children {
            self.insert_global_view_tree(tree, child);
        }
    }

    /// 去掉圆角、透明度与阴影后按策略捕获
    fn capture(&mut self, tree: &mut ViewTree, view: ViewId, strategy: SnapshotStrategy) -> ViewId {
        let Some(node) = tree.view_mut(view) else {
            return view;
        };
        let saved = node.layer.props.clone();
        {
            let props = &mut node.layer.props;
            props.corner_radius = 0.0;
            props.opacity = 1.0;
            props.shadow_radius = 0.0;
            props.shadow_offset = Size::ZERO;
            props.shadow_path = None;
            props.shadow_opacity = 0.0;
        }

        let snapshot = match strategy {
            SnapshotStrategy::LayerRender => self.render_snapshot(tree, view),
            SnapshotStrategy::NoSnapshot => {
                self.detach_live_view(tree, &saved, view);
                view
            }
            SnapshotStrategy::Normal => self.surface_snapshot(tree, view),
            SnapshotStrategy::Optimized => self.optimized_snapshot(tree, view),
        };

        if let Some(node) = tree.view_mut(view) {
            let props = &mut node.layer.props;
            props.corner_radius = saved.corner_radius;
            props.opacity = saved.opacity;
            props.shadow_radius = saved.shadow_radius;
            props.shadow_offset = saved.shadow_offset;
            props.shadow_path = saved.shadow_path;
            props.shadow_opacity = saved.shadow_opacity;
        }
        snapshot
    }

    fn optimized_snapshot(&mut self, tree: &mut ViewTree, view: ViewId) -> ViewId {
        let Some(node) = tree.view(view) else {
            return view;
        };
        let bounds = tree.bounds(view);
        let background = node.layer.props.background_color;
        match node.kind.clone() {
            ViewKind::Stack => self.render_snapshot(tree, view),
            ViewKind::Image { image } => {
                let has_visible_subviews = node
                    .children
                    .iter()
                    .any(|c| tree.view(*c).is_some_and(|n| !n.is_hidden));
                if has_visible_subviews {
                    return self.surface_snapshot(tree, view);
                }
                let wrapper = self.own(tree.create_view(ViewKind::Plain, bounds));
                let content = self.own(tree.create_view(ViewKind::Image { image }, bounds));
                if let Some(content_node) = tree.view_mut(content) {
                    content_node.layer.props.background_color = background;
                }
                let _ = tree.add_subview(wrapper, content);
                wrapper
            }
            ViewKind::NavigationBar { translucent: true } => {
                let copy = self.own(
                    tree.create_view(ViewKind::NavigationBar { translucent: true }, bounds),
                );
                if let Some(copy_node) = tree.view_mut(copy) {
                    copy_node.layer.props.background_color = background;
                }
                copy
            }
            ViewKind::EffectView { effect } => {
                let presented = tree.presented_effect(view).or(effect);
                self.own(tree.create_view(ViewKind::EffectView { effect: presented }, bounds))
            }
            _ => self.surface_snapshot(tree, view),
        }
    }

    fn surface_snapshot(&mut self, tree: &mut ViewTree, view: ViewId) -> ViewId {
        let bounds = tree.bounds(view);
        let background = tree.view(view).and_then(|n| n.layer.props.background_color);
        let snapshot = tree.create_view(
            ViewKind::Snapshot {
                source: view,
                capture: Capture::Surface,
            },
            bounds,
        );
        if let Some(node) = tree.view_mut(snapshot) {
            node.layer.props.background_color = background;
        }
        self.own(snapshot)
    }

    /// 全保真渲染：外层容器 + 铺满的渲染图像
    fn render_snapshot(&mut self, tree: &mut ViewTree, view: ViewId) -> ViewId {
        let bounds = tree.bounds(view);
        let rendered = tree.render_subtree(view);
        let wrapper = self.own(tree.create_view(ViewKind::Plain, bounds));
        let image = self.own(tree.create_view(
            ViewKind::Snapshot {
                source: view,
                capture: Capture::Rendered(rendered),
            },
            bounds,
        ));
        let _ = tree.add_subview(wrapper, image);
        wrapper
    }

    fn own(&mut self, id: ViewId) -> ViewId {
        self.owned_nodes.insert(id);
        id
    }

    fn detach_live_view(&mut self, tree: &ViewTree, saved: &LayerProps, view: ViewId) {
        let Some(superview) = tree.superview(view) else {
            return;
        };
        if superview == self.container || self.detached_views.iter().any(|d| d.view == view) {
            return;
        }
        let index = tree.index_in_superview(view).unwrap_or(0);
        self.detached_views.push(DetachedView {
            view,
            superview,
            index,
            position: saved.position,
            transform: saved.transform,
        });
    }

    // ── 隐藏 ──

    /// 隐藏视图并记录原透明度（效果视图记录原 `is_hidden`）；已有记录时不做任何事
    pub fn hide(&mut self, tree: &mut ViewTree, view: ViewId) {
        if self.hidden_views.contains_key(&view) {
            return;
        }
        let Some(node) = tree.view_mut(view) else {
            return;
        };
        let state = if node.kind.is_effect_view() {
            let state = HiddenState::Flag {
                was_hidden: node.is_hidden,
                alpha: node.alpha(),
            };
            node.is_hidden = true;
            state
        } else {
            let state = HiddenState::Alpha(node.alpha());
            node.set_alpha(0.0);
            state
        };
        self.hidden_views.insert(view, state);
    }

    /// 恢复隐藏前的可见性
    pub fn unhide(&mut self, tree: &mut ViewTree, view: ViewId) {
        let Some(state) = self.hidden_views.remove(&view) else {
            return;
        };
        if let Some(node) = tree.view_mut(view) {
            match state {
                HiddenState::Alpha(alpha) => node.set_alpha(alpha),
                HiddenState::Flag { was_hidden, .. } => node.is_hidden = was_hidden,
            }
        }
    }

    pub fn is_hidden_by_context(&self, view: ViewId) -> bool {
        self.hidden_views.contains_key(&view)
    }

    pub fn unhide_all(&mut self, tree: &mut ViewTree) {
        let views: Vec<ViewId> = self.hidden_views.keys().copied().collect();
        for view in views {
            self.unhide(tree, view);
        }
    }

    pub fn unhide_root(&mut self, tree: &mut ViewTree, root: ViewId) {
        for view in tree.flattened_hierarchy(root) {
            self.unhide(tree, view);
        }
    }

    // ── 清理 ──

    /// 把全部快照移出视图树；直接动画的真实视图只移除引擎动画
    pub fn remove_all_snapshots(&mut self, tree: &mut ViewTree) {
        for view in self.snapshot_order.clone() {
            if let Some(snapshot) = self.snapshots.get(&view).copied() {
                self.discard_snapshot(tree, view, snapshot);
            }
        }
    }

    /// 只移除 `root` 子树中视图的快照
    pub fn remove_snapshots_under(&mut self, tree: &mut ViewTree, root: ViewId) {
        let mut queue = std::collections::VecDeque::from([root]);
        while let Some(view) = queue.pop_front() {
            if let Some(snapshot) = self.snapshots.get(&view).copied() {
                self.discard_snapshot(tree, view, snapshot);
            }
            queue.extend(tree.subviews(view).iter().copied());
        }
    }

    fn discard_snapshot(&mut self, tree: &mut ViewTree, view: ViewId, snapshot: ViewId) {
        if snapshot == view {
            if let Some(node) = tree.view_mut(view) {
                node.layer.remove_engine_animations();
            }
            return;
        }
        if !tree.contains(snapshot) {
            return;
        }
        // 快照子树里可能挂着别的真实视图，先摘下它们
        let mut stack = vec![snapshot];
        let mut live = Vec::new();
        while let Some(v) = stack.pop() {
            for &child in tree.subviews(v) {
                if self.owned_nodes.contains(&child) {
                    stack.push(child);
                } else {
                    live.push(child);
                }
            }
        }
        for v in live {
            tree.remove_from_superview(v);
        }
        let _ = tree.remove_view(snapshot);
    }

    /// `root` 子树中各视图的快照
    pub fn snapshot_views_under(&self, tree: &ViewTree, root: ViewId) -> Vec<ViewId> {
        tree.flattened_hierarchy(root)
            .into_iter()
            .filter_map(|v| self.snapshots.get(&v).copied())
            .collect()
    }

    /// 把隐藏记录写入侧表，供 OverFullScreen 呈现结束后保留
    pub fn store_view_alpha(&self, tree: &mut ViewTree, root: ViewId) {
        for view in tree.flattened_hierarchy(root) {
            let alpha = self.hidden_views.get(&view).map(|state| state.alpha());
            if alpha.is_some() || tree.motion(view).is_some() {
                tree.motion_mut(view).stored_alpha = alpha;
            }
        }
    }

    /// 恢复侧表中保存的透明度并清除记录
    pub fn load_view_alpha(&self, tree: &mut ViewTree, root: ViewId) {
        for view in tree.flattened_hierarchy(root) {
            let stored = tree.motion(view).and_then(|m| m.stored_alpha);
            if let Some(alpha) = stored {
                if let Some(node) = tree.view_mut(view) {
                    node.set_alpha(alpha);
                }
                tree.motion_mut(view).stored_alpha = None;
            }
        }
    }

    /// 把直接动画的真实视图按记录的倒序放回原父视图
    pub fn clean(&mut self, tree: &mut ViewTree) {
        for detached in self.detached_views.drain(..).rev() {
            let len = tree
                .subviews(detached.superview)
                .iter()
                .filter(|v| **v != detached.view)
                .count();
            let index = if detached.index > len {
                warn!(
                    view = %detached.view,
                    superview = %detached.superview,
                    recorded = detached.index,
                    len,
                    "原插入位置已失效，钳制到末尾"
                );
                len
            } else {
                detached.index
            };
            if let Err(err) = tree.insert_subview(detached.superview, detached.view, index) {
                warn!(view = %detached.view, error = %err, "无法放回直接动画的视图");
                continue;
            }
            if let Some(node) = tree.view_mut(detached.view) {
                node.layer.props.position = detached.position;
                node.layer.props.transform = detached.transform;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::modifier::Modifier;
    use crate::scene::{EffectStyle, VisualEffect};

    struct Fixture {
        tree: ViewTree,
        container: ViewId,
        from_root: ViewId,
        to_root: ViewId,
    }

    fn fixture() -> Fixture {
        let mut tree = ViewTree::new(Size::new(400.0, 800.0));
        let window = tree.window();
        let container = tree
            .add_view(window, ViewKind::Plain, Rect::new(0.0, 0.0, 400.0, 800.0))
            .unwrap();
        let to_root = tree
            .add_view(container, ViewKind::Plain, Rect::new(0.0, 0.0, 400.0, 800.0))
            .unwrap();
        let from_root = tree
            .add_view(container, ViewKind::Plain, Rect::new(0.0, 0.0, 400.0, 800.0))
            .unwrap();
        Fixture {
            tree,
            container,
            from_root,
            to_root,
        }
    }

    fn card(tree: &mut ViewTree, parent: ViewId, frame: Rect) -> ViewId {
        let v = tree.add_view(parent, ViewKind::Plain, frame).unwrap();
        tree.set_identifier(v, "card");
        v
    }

    fn context_for(f: &mut Fixture) -> TransitionContext {
        let mut context = TransitionContext::new(f.container);
        let from = f.tree.flattened_hierarchy(f.from_root);
        let to = f.tree.flattened_hierarchy(f.to_root);
        context.set(&mut f.tree, from, to);
        context
    }

    #[test]
    fn test_pairing_is_symmetric() {
        let mut f = fixture();
        let a = card(&mut f.tree, f.from_root, Rect::new(0.0, 0.0, 100.0, 100.0));
        let b = card(&mut f.tree, f.to_root, Rect::new(100.0, 100.0, 200.0, 200.0));
        let context = context_for(&mut f);

        assert_eq!(context.paired_view(&f.tree, a), Some(b));
        assert_eq!(context.paired_view(&f.tree, b), Some(a));
        assert_eq!(context.paired_view(&f.tree, f.from_root), None);
    }

    #[test]
    fn test_offscreen_views_are_excluded() {
        let mut f = fixture();
        let offscreen = card(&mut f.tree, f.from_root, Rect::new(1000.0, 0.0, 100.0, 100.0));
        f.tree.set_modifiers(offscreen, vec![Modifier::Fade]);
        let forced = f
            .tree
            .add_view(f.from_root, ViewKind::Plain, Rect::new(-500.0, 0.0, 10.0, 10.0))
            .unwrap();
        f.tree.set_modifiers(forced, vec![Modifier::ForceAnimate, Modifier::Fade]);
        let context = context_for(&mut f);

        assert_eq!(context.source_view("card"), None);
        assert!(context.target_state(offscreen).is_none());
        assert_eq!(context.target_state(forced).unwrap().opacity, Some(0.0));
    }

    #[test]
    fn test_duplicate_identifier_last_write_wins() {
        let mut f = fixture();
        let _first = card(&mut f.tree, f.from_root, Rect::new(0.0, 0.0, 10.0, 10.0));
        let second = card(&mut f.tree, f.from_root, Rect::new(20.0, 0.0, 10.0, 10.0));
        let context = context_for(&mut f);
        assert_eq!(context.source_view("card"), Some(second));
    }

    #[test]
    fn test_snapshot_is_idempotent_and_hides_view() {
        let mut f = fixture();
        let v = f
            .tree
            .add_view(f.from_root, ViewKind::Plain, Rect::new(10.0, 20.0, 50.0, 60.0))
            .unwrap();
        f.tree.view_mut(v).unwrap().layer.props.corner_radius = 8.0;
        f.tree.view_mut(v).unwrap().set_alpha(0.8);
        let mut context = context_for(&mut f);

        let s1 = context.snapshot_view(&mut f.tree, v);
        let s2 = context.snapshot_view(&mut f.tree, v);
        assert_eq!(s1, s2);
        assert_ne!(s1, v);

        // 真实视图被隐藏，圆角保留
        let live = f.tree.view(v).unwrap();
        assert_eq!(live.alpha(), 0.0);
        assert_eq!(live.layer.props.corner_radius, 8.0);

        let snap = f.tree.view(s1).unwrap();
        assert_eq!(snap.layer.props.corner_radius, 8.0);
        assert_eq!(snap.alpha(), 0.8);
        assert_eq!(snap.layer.props.bounds_size, Size::new(50.0, 60.0));
    }

    #[test]
    fn test_local_snapshot_nests_under_ancestor_snapshot() {
        let mut f = fixture();
        let parent = f
            .tree
            .add_view(f.from_root, ViewKind::Plain, Rect::new(100.0, 100.0, 200.0, 200.0))
            .unwrap();
        let child = f
            .tree
            .add_view(parent, ViewKind::Plain, Rect::new(10.0, 10.0, 20.0, 20.0))
            .unwrap();
        let mut context = context_for(&mut f);

        let parent_snapshot = context.snapshot_view(&mut f.tree, parent);
        let child_snapshot = context.snapshot_view(&mut f.tree, child);
        assert_eq!(f.tree.superview(parent_snapshot), Some(f.container));
        assert_eq!(f.tree.superview(child_snapshot), Some(parent_snapshot));
        assert_eq!(
            f.tree.view(child_snapshot).unwrap().layer.props.position,
            Point::new(20.0, 20.0)
        );
    }

    #[test]
    fn test_global_snapshot_lives_in_container() {
        let mut f = fixture();
        let parent = f
            .tree
            .add_view(f.from_root, ViewKind::Plain, Rect::new(100.0, 100.0, 200.0, 200.0))
            .unwrap();
        let child = f
            .tree
            .add_view(parent, ViewKind::Plain, Rect::new(10.0, 10.0, 20.0, 20.0))
            .unwrap();
        f.tree
            .set_modifiers(child, vec![Modifier::CoordinateSpace(CoordinateSpace::Global)]);
        let mut context = context_for(&mut f);

        context.snapshot_view(&mut f.tree, parent);
        let child_snapshot = context.snapshot_view(&mut f.tree, child);
        assert_eq!(f.tree.superview(child_snapshot), Some(f.container));
        assert_eq!(
            f.tree.view(child_snapshot).unwrap().layer.props.position,
            Point::new(120.0, 120.0)
        );
    }

    #[test]
    fn test_paired_snapshots_are_adjacent() {
        let mut f = fixture();
        let a = card(&mut f.tree, f.from_root, Rect::new(0.0, 0.0, 100.0, 100.0));
        let b = card(&mut f.tree, f.to_root, Rect::new(0.0, 0.0, 100.0, 100.0));
        let other = f
            .tree
            .add_view(f.from_root, ViewKind::Plain, Rect::new(0.0, 0.0, 10.0, 10.0))
            .unwrap();
        let mut context = context_for(&mut f);

        let sa = context.snapshot_view(&mut f.tree, a);
        let so = context.snapshot_view(&mut f.tree, other);
        let sb = context.snapshot_view(&mut f.tree, b);
        let children = f.tree.subviews(f.container);
        let ia = children.iter().position(|v| *v == sa).unwrap();
        let ib = children.iter().position(|v| *v == sb).unwrap();
        let io = children.iter().position(|v| *v == so).unwrap();
        assert_eq!(ib, ia + 1);
        assert!(io < ia);
    }

    #[test]
    fn test_hide_twice_keeps_first_alpha() {
        let mut f = fixture();
        let v = f
            .tree
            .add_view(f.from_root, ViewKind::Plain, Rect::new(0.0, 0.0, 10.0, 10.0))
            .unwrap();
        f.tree.view_mut(v).unwrap().set_alpha(0.6);
        let mut context = context_for(&mut f);

        context.hide(&mut f.tree, v);
        context.hide(&mut f.tree, v);
        assert_eq!(f.tree.alpha(v), Some(0.0));
        context.unhide(&mut f.tree, v);
        assert_eq!(f.tree.alpha(v), Some(0.6));
        // 没有记录时 unhide 不做任何事
        f.tree.view_mut(v).unwrap().set_alpha(0.2);
        context.unhide(&mut f.tree, v);
        assert_eq!(f.tree.alpha(v), Some(0.2));
    }

    #[test]
    fn test_effect_view_hides_with_flag() {
        let mut f = fixture();
        let effect = VisualEffect {
            style: EffectStyle::Dark,
            radius: 10.0,
        };
        let v = f
            .tree
            .add_view(
                f.from_root,
                ViewKind::EffectView {
                    effect: Some(effect),
                },
                Rect::new(0.0, 0.0, 10.0, 10.0),
            )
            .unwrap();
        let mut context = context_for(&mut f);

        let snapshot = context.snapshot_view(&mut f.tree, v);
        assert!(f.tree.view(v).unwrap().is_hidden);
        assert_eq!(f.tree.alpha(v), Some(1.0));
        assert_eq!(
            f.tree.view(snapshot).unwrap().kind,
            ViewKind::EffectView {
                effect: Some(effect)
            }
        );
        context.unhide_all(&mut f.tree);
        assert!(!f.tree.view(v).unwrap().is_hidden);
    }

    #[test]
    fn test_hidden_effect_view_stays_hidden_after_unhide() {
        let mut f = fixture();
        let v = f
            .tree
            .add_view(
                f.from_root,
                ViewKind::EffectView { effect: None },
                Rect::new(0.0, 0.0, 10.0, 10.0),
            )
            .unwrap();
        f.tree.view_mut(v).unwrap().is_hidden = true;
        let mut context = context_for(&mut f);

        context.hide(&mut f.tree, v);
        assert!(context.is_hidden_by_context(v));
        context.unhide(&mut f.tree, v);
        assert!(f.tree.view(v).unwrap().is_hidden);
        assert!(!context.is_hidden_by_context(v));

        // 原本可见的效果视图照常恢复
        f.tree.view_mut(v).unwrap().is_hidden = false;
        context.hide(&mut f.tree, v);
        assert!(f.tree.view(v).unwrap().is_hidden);
        context.unhide_all(&mut f.tree);
        assert!(!f.tree.view(v).unwrap().is_hidden);
    }

    #[test]
    fn test_image_snapshot_has_content_child() {
        let mut f = fixture();
        let v = f
            .tree
            .add_view(
                f.from_root,
                ViewKind::Image {
                    image: "cover.png".into(),
                },
                Rect::new(0.0, 0.0, 80.0, 80.0),
            )
            .unwrap();
        f.tree.view_mut(v).unwrap().layer.props.corner_radius = 12.0;
        let mut context = context_for(&mut f);

        let snapshot = context.snapshot_view(&mut f.tree, v);
        let content = f.tree.subviews(snapshot)[0];
        let content_node = f.tree.view(content).unwrap();
        assert_eq!(content_node.layer.props.corner_radius, 12.0);
        assert!(content_node.layer.props.masks_to_bounds);
    }

    #[test]
    fn test_no_snapshot_views_are_reinserted_in_order() {
        let mut f = fixture();
        let parent = f
            .tree
            .add_view(f.from_root, ViewKind::Plain, Rect::new(0.0, 0.0, 100.0, 100.0))
            .unwrap();
        let a = f.tree.add_view(parent, ViewKind::Plain, Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        let b = f.tree.add_view(parent, ViewKind::Plain, Rect::new(10.0, 0.0, 10.0, 10.0)).unwrap();
        let c = f.tree.add_view(parent, ViewKind::Plain, Rect::new(20.0, 0.0, 10.0, 10.0)).unwrap();
        for v in [a, b] {
            f.tree
                .set_modifiers(v, vec![Modifier::Snapshot(SnapshotStrategy::NoSnapshot)]);
        }
        f.tree.set_modifiers(
            parent,
            vec![Modifier::CoordinateSpace(CoordinateSpace::Global)],
        );
        let mut context = context_for(&mut f);

        assert_eq!(context.snapshot_view(&mut f.tree, a), a);
        assert_eq!(context.snapshot_view(&mut f.tree, b), b);
        assert_eq!(f.tree.subviews(parent), &[c]);

        context.clean(&mut f.tree);
        assert_eq!(f.tree.subviews(parent), &[a, b, c]);
        assert_eq!(f.tree.frame(b), Rect::new(10.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn test_no_snapshot_reinsert_clamps_stale_index() {
        let mut f = fixture();
        let parent = f
            .tree
            .add_view(f.from_root, ViewKind::Plain, Rect::new(0.0, 0.0, 100.0, 100.0))
            .unwrap();
        let a = f.tree.add_view(parent, ViewKind::Plain, Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        let b = f.tree.add_view(parent, ViewKind::Plain, Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        f.tree
            .set_modifiers(b, vec![Modifier::Snapshot(SnapshotStrategy::NoSnapshot)]);
        let mut context = context_for(&mut f);

        context.snapshot_view(&mut f.tree, b);
        // 过渡期间父视图的子视图被外部删掉
        f.tree.remove_view(a).unwrap();
        context.clean(&mut f.tree);
        assert_eq!(f.tree.subviews(parent), &[b]);
    }

    #[test]
    fn test_remove_all_snapshots() {
        let mut f = fixture();
        let v = f
            .tree
            .add_view(f.from_root, ViewKind::Plain, Rect::new(0.0, 0.0, 10.0, 10.0))
            .unwrap();
        let mut context = context_for(&mut f);
        let from_snapshot = context.snapshot_view(&mut f.tree, f.from_root);
        let child_snapshot = context.snapshot_view(&mut f.tree, v);
        assert_eq!(context.snapshot_views_under(&f.tree, f.from_root).len(), 2);

        context.remove_all_snapshots(&mut f.tree);
        assert!(!f.tree.contains(from_snapshot));
        assert!(!f.tree.contains(child_snapshot));
        assert!(f.tree.contains(v));
    }

    #[test]
    fn test_store_and_load_view_alpha() {
        let mut f = fixture();
        let v = f
            .tree
            .add_view(f.from_root, ViewKind::Plain, Rect::new(0.0, 0.0, 10.0, 10.0))
            .unwrap();
        f.tree.view_mut(v).unwrap().set_alpha(0.7);
        let mut context = context_for(&mut f);
        context.hide(&mut f.tree, v);
        context.store_view_alpha(&mut f.tree, f.from_root);
        assert_eq!(f.tree.motion(v).unwrap().stored_alpha(), Some(0.7));

        let fresh = TransitionContext::new(f.container);
        fresh.load_view_alpha(&mut f.tree, f.from_root);
        assert_eq!(f.tree.alpha(v), Some(0.7));
        assert_eq!(f.tree.motion(v).unwrap().stored_alpha(), None);
    }
}
