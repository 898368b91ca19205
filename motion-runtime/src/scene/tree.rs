//! 视图树的结构编辑、坐标换算与层级展开。

use super::{LayerProps, RenderedLayer, ViewId, ViewNode, ViewTree};
use crate::error::SceneError;
use crate::geometry::{Point, Rect, Transform3D};

/// 把视图自身坐标系中的点变换到父视图坐标系
fn to_superview(props: &LayerProps, p: Point) -> Point {
    let anchor = Point::new(
        props.anchor_point.x * props.bounds_size.width,
        props.anchor_point.y * props.bounds_size.height,
    );
    props.transform.apply_to_point(p - anchor) + props.position
}

/// 把父视图坐标系中的点变换回视图自身坐标系
fn from_superview(props: &LayerProps, p: Point) -> Point {
    let anchor = Point::new(
        props.anchor_point.x * props.bounds_size.width,
        props.anchor_point.y * props.bounds_size.height,
    );
    let local = p - props.position;
    let local = match props.transform.affine_inverse() {
        Some(inverse) => inverse.apply_to_point(local),
        None => local,
    };
    local + anchor
}

impl ViewTree {
    // ── 层级查询 ──

    pub fn superview(&self, id: ViewId) -> Option<ViewId> {
        self.views.get(&id).and_then(|node| node.parent)
    }

    pub fn subviews(&self, id: ViewId) -> &[ViewId] {
        self.views
            .get(&id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn index_in_superview(&self, id: ViewId) -> Option<usize> {
        let parent = self.superview(id)?;
        self.subviews(parent).iter().position(|c| *c == id)
    }

    /// 从父到根的祖先链（不含自身）
    pub fn ancestors(&self, id: ViewId) -> Vec<ViewId> {
        let mut out = Vec::new();
        let mut current = self.superview(id);
        while let Some(v) = current {
            out.push(v);
            current = self.superview(v);
        }
        out
    }

    /// `view` 是否是 `ancestor` 的子孙（不含自身）
    pub fn is_descendant(&self, view: ViewId, ancestor: ViewId) -> bool {
        self.ancestors(view).contains(&ancestor)
    }

    /// 视图所在的窗口；未挂到窗口上时返回 `None`
    pub fn window_of(&self, id: ViewId) -> Option<ViewId> {
        if id == self.window || self.is_descendant(id, self.window) {
            Some(self.window)
        } else {
            None
        }
    }

    // ── 结构编辑 ──

    /// 加到 `parent` 子视图列表末尾（已是子视图时移到最上层）
    pub fn add_subview(&mut self, parent: ViewId, child: ViewId) -> Result<(), SceneError> {
        self.check_insertion(parent, child)?;
        self.detach(child);
        let len = self.subviews(parent).len();
        self.attach(parent, child, len);
        Ok(())
    }

    /// 插入到 `parent` 子视图列表的 `index` 处
    pub fn insert_subview(
        &mut self,
        parent: ViewId,
        child: ViewId,
        index: usize,
    ) -> Result<(), SceneError> {
        self.check_insertion(parent, child)?;
        let len = self
            .subviews(parent)
            .iter()
            .filter(|c| **c != child)
            .count();
        if index > len {
            return Err(SceneError::IndexOutOfRange { parent, index, len });
        }
        self.detach(child);
        self.attach(parent, child, index);
        Ok(())
    }

    /// 插入到 `sibling` 之上
    pub fn insert_subview_above(&mut self, child: ViewId, sibling: ViewId) -> Result<(), SceneError> {
        let parent = self
            .superview(sibling)
            .ok_or(SceneError::ViewNotFound(sibling))?;
        self.check_insertion(parent, child)?;
        self.detach(child);
        let index = self
            .subviews(parent)
            .iter()
            .position(|c| *c == sibling)
            .map_or(0, |i| i + 1);
        self.attach(parent, child, index);
        Ok(())
    }

    pub fn remove_from_superview(&mut self, id: ViewId) {
        if id != self.window {
            self.detach(id);
        }
    }

    /// 从树上摘下并销毁整棵子树
    pub fn remove_view(&mut self, id: ViewId) -> Result<(), SceneError> {
        if id == self.window {
            return Err(SceneError::WindowIsImmutable);
        }
        if !self.contains(id) {
            return Err(SceneError::ViewNotFound(id));
        }
        self.detach(id);
        let mut stack = vec![id];
        while let Some(v) = stack.pop() {
            if let Some(node) = self.views.remove(&v) {
                stack.extend(node.children);
            }
            self.motion.remove(&v);
        }
        Ok(())
    }

    fn check_insertion(&self, parent: ViewId, child: ViewId) -> Result<(), SceneError> {
        if child == self.window {
            return Err(SceneError::WindowIsImmutable);
        }
        if !self.contains(parent) {
            return Err(SceneError::ViewNotFound(parent));
        }
        if !self.contains(child) {
            return Err(SceneError::ViewNotFound(child));
        }
        if parent == child || self.is_descendant(parent, child) {
            return Err(SceneError::CycleDetected { parent, child });
        }
        Ok(())
    }

    fn detach(&mut self, id: ViewId) {
        let Some(parent) = self.superview(id) else {
            return;
        };
        if let Some(node) = self.views.get_mut(&parent) {
            node.children.retain(|c| *c != id);
        }
        if let Some(node) = self.views.get_mut(&id) {
            node.parent = None;
        }
    }

    fn attach(&mut self, parent: ViewId, child: ViewId, index: usize) {
        if let Some(node) = self.views.get_mut(&parent) {
            let index = index.min(node.children.len());
            node.children.insert(index, child);
        }
        if let Some(node) = self.views.get_mut(&child) {
            node.parent = Some(parent);
        }
    }

    // ── 几何 ──

    /// 视图在父视图坐标系中的外接矩形
    pub fn frame(&self, id: ViewId) -> Rect {
        let Some(node) = self.views.get(&id) else {
            return Rect::ZERO;
        };
        let corners = self.bounds(id).corners().map(|p| to_superview(&node.layer.props, p));
        Rect::bounding(&corners)
    }

    /// 按父坐标系矩形设置尺寸与位置（不改变变换）
    pub fn set_frame(&mut self, id: ViewId, frame: Rect) {
        if let Some(node) = self.views.get_mut(&id) {
            let props = &mut node.layer.props;
            props.bounds_size = frame.size;
            props.position = Point::new(
                frame.origin.x + props.anchor_point.x * frame.size.width,
                frame.origin.y + props.anchor_point.y * frame.size.height,
            );
        }
    }

    pub fn bounds(&self, id: ViewId) -> Rect {
        self.views.get(&id).map_or(Rect::ZERO, |node| {
            Rect::from_origin_size(Point::ZERO, node.layer.props.bounds_size)
        })
    }

    fn to_root(&self, mut p: Point, mut id: ViewId) -> Point {
        while let Some(node) = self.views.get(&id) {
            let Some(parent) = node.parent else {
                break;
            };
            p = to_superview(&node.layer.props, p);
            id = parent;
        }
        p
    }

    fn from_root(&self, mut p: Point, id: ViewId) -> Point {
        let mut chain = vec![id];
        chain.extend(self.ancestors(id));
        // 根节点自身的几何不参与换算
        chain.pop();
        for v in chain.iter().rev() {
            if let Some(node) = self.views.get(v) {
                p = from_superview(&node.layer.props, p);
            }
        }
        p
    }

    /// 把 `from` 坐标系中的点换算到 `to` 坐标系
    pub fn convert_point(&self, p: Point, from: ViewId, to: ViewId) -> Point {
        if from == to {
            return p;
        }
        self.from_root(self.to_root(p, from), to)
    }

    pub fn convert_rect(&self, rect: Rect, from: ViewId, to: ViewId) -> Rect {
        let corners = rect.corners().map(|p| self.convert_point(p, from, to));
        Rect::bounding(&corners)
    }

    /// 视图在 `to` 坐标系中的位置（锚点所在点）
    pub fn position_in(&self, id: ViewId, to: ViewId) -> Point {
        let Some(node) = self.views.get(&id) else {
            return Point::ZERO;
        };
        match node.parent {
            Some(parent) => self.convert_point(node.layer.props.position, parent, to),
            None => node.layer.props.position,
        }
    }

    /// 从 `view` 向上累积变换，直到 `ancestor` 或窗口为止
    pub fn flat_transform_to(&self, ancestor: ViewId, view: ViewId) -> Transform3D {
        let Some(node) = self.views.get(&view) else {
            return Transform3D::IDENTITY;
        };
        let mut transform = node.layer.props.transform;
        let mut current = view;
        while let Some(parent) = self.superview(current) {
            if parent == ancestor || parent == self.window {
                break;
            }
            if let Some(parent_node) = self.views.get(&parent) {
                transform = parent_node.layer.props.transform.concat(&transform);
            }
            current = parent;
        }
        transform
    }

    // ── 层级展开 ──

    /// 根节点加上深度优先顺序的全部参与过渡的子孙
    pub fn flattened_hierarchy(&self, root: ViewId) -> Vec<ViewId> {
        let mut out = Vec::new();
        self.flatten_into(root, &mut out);
        out
    }

    fn flatten_into(&self, id: ViewId, out: &mut Vec<ViewId>) {
        let Some(node) = self.views.get(&id) else {
            return;
        };
        let motion = self.motion.get(&id);
        if motion.is_some_and(|m| !m.is_enabled) {
            return;
        }
        let in_reusing_container = node
            .parent
            .and_then(|p| self.views.get(&p))
            .is_some_and(|parent| parent.kind.is_reusing_container());
        if node.is_hidden && in_reusing_container {
            return;
        }
        out.push(id);
        if motion.is_none_or(|m| m.is_enabled_for_subviews) {
            for child in &node.children {
                self.flatten_into(*child, out);
            }
        }
    }

    // ── 渲染捕获 ──

    /// 把可见子树渲染成冻结的绘制列表（坐标相对 `root`）
    pub fn render_subtree(&self, root: ViewId) -> Vec<RenderedLayer> {
        let mut out = Vec::new();
        self.render_into(root, root, 1.0, &mut out);
        out
    }

    fn render_into(&self, id: ViewId, root: ViewId, inherited: f64, out: &mut Vec<RenderedLayer>) {
        let Some(node) = self.views.get(&id) else {
            return;
        };
        let opacity = inherited * node.alpha();
        if node.is_hidden || opacity <= 0.0 {
            return;
        }
        out.push(rendered_layer(self, node, id, root, opacity));
        for child in &node.children {
            self.render_into(*child, root, opacity, out);
        }
    }
}

fn rendered_layer(tree: &ViewTree, node: &ViewNode, id: ViewId, root: ViewId, opacity: f64) -> RenderedLayer {
    RenderedLayer {
        frame: tree.convert_rect(tree.bounds(id), id, root),
        opacity,
        background_color: node.layer.props.background_color,
        corner_radius: node.layer.props.corner_radius,
    }
}
