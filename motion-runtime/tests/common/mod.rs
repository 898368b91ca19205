//! 集成测试共用的场景搭建

#![allow(dead_code)]

use motion_runtime::{
    ControllerId, MotionTransition, Rect, Size, TransitionEvent, TransitionKind, TransitionRequest,
    TransitionState, ViewController, ViewId, ViewKind, ViewTree,
};

pub const FRAME: f64 = 1.0 / 60.0;

/// 400x800 窗口中的一个宿主容器，源根视图已上树
pub struct Stage {
    pub tree: ViewTree,
    pub container: ViewId,
    pub from: ControllerId,
    pub to: ControllerId,
    pub from_root: ViewId,
    pub to_root: ViewId,
}

impl Stage {
    pub fn new() -> Self {
        let mut tree = ViewTree::new(Size::new(400.0, 800.0));
        let bounds = Rect::new(0.0, 0.0, 400.0, 800.0);
        let container = tree.add_view(tree.window(), ViewKind::Plain, bounds).unwrap();
        let from_root = tree.add_view(container, ViewKind::Plain, bounds).unwrap();
        let to_root = tree.create_view(ViewKind::Plain, bounds);
        let from = tree.add_controller(ViewController::new(from_root).with_name("list"));
        let to = tree.add_controller(ViewController::new(to_root).with_name("detail"));
        Self {
            tree,
            container,
            from,
            to,
            from_root,
            to_root,
        }
    }

    pub fn add(&mut self, parent: ViewId, frame: Rect) -> ViewId {
        self.tree.add_view(parent, ViewKind::Plain, frame).unwrap()
    }

    pub fn request(&self, kind: TransitionKind) -> TransitionRequest {
        TransitionRequest::new(self.from, self.to, self.container, kind)
    }

    /// 逐帧推进直到回到空闲，返回全部事件
    pub fn run_to_end(&mut self, transition: &mut MotionTransition) -> Vec<TransitionEvent> {
        let mut events = Vec::new();
        for _ in 0..600 {
            events.extend(transition.tick(&mut self.tree, FRAME));
            if transition.state() == TransitionState::Possible {
                break;
            }
        }
        events
    }
}
