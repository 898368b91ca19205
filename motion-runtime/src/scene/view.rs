//! # View 模块
//!
//! 视图节点、视图类别与视觉效果动画。

use serde::{Deserialize, Serialize};

use super::ViewId;
use super::layer::Layer;
use crate::geometry::{Color, Rect};

/// 视觉效果（模糊等）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisualEffect {
    pub style: EffectStyle,
    /// 效果强度，混合时按比例缩放
    #[serde(default = "default_effect_radius")]
    pub radius: f64,
}

fn default_effect_radius() -> f64 {
    20.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectStyle {
    Light,
    Dark,
    Regular,
    Prominent,
}

impl VisualEffect {
    /// 在两个效果之间混合；一端为空时按强度淡入淡出
    pub fn blend(from: Option<Self>, to: Option<Self>, fraction: f64) -> Option<Self> {
        let f = fraction.clamp(0.0, 1.0);
        match (from, to) {
            (Some(a), Some(b)) => Some(VisualEffect {
                style: if f < 0.5 { a.style } else { b.style },
                radius: a.radius + (b.radius - a.radius) * f,
            }),
            (Some(a), None) => (f < 1.0).then_some(VisualEffect {
                radius: a.radius * (1.0 - f),
                ..a
            }),
            (None, Some(b)) => (f > 0.0).then_some(VisualEffect {
                radius: b.radius * f,
                ..b
            }),
            (None, None) => None,
        }
    }
}

/// 全保真渲染得到的一层冻结绘制内容
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedLayer {
    /// 在被渲染视图坐标系中的外接矩形
    pub frame: Rect,
    pub opacity: f64,
    pub background_color: Option<Color>,
    pub corner_radius: f64,
}

/// 快照的捕获方式
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Capture {
    /// 系统原生的当前视觉状态拷贝
    Surface,
    /// 渲染成图像的冻结内容
    Rendered(Vec<RenderedLayer>),
}

/// 视图类别
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ViewKind {
    Plain,
    Image { image: String },
    Stack,
    Collection,
    NavigationBar { translucent: bool },
    EffectView { effect: Option<VisualEffect> },
    /// 过渡上下文生成的快照代理
    Snapshot { source: ViewId, capture: Capture },
}

impl ViewKind {
    pub fn is_effect_view(&self) -> bool {
        matches!(self, ViewKind::EffectView { .. })
    }

    /// 会复用子视图的容器（其中隐藏的子视图不参与过渡）
    pub fn is_reusing_container(&self) -> bool {
        matches!(self, ViewKind::Stack | ViewKind::Collection)
    }
}

/// 基于属性的效果动画（线性，按完成比例驱动）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectAnimation {
    pub from: Option<VisualEffect>,
    pub to: Option<VisualEffect>,
    pub duration: f64,
    begin_time: f64,
    paused_fraction: Option<f64>,
}

impl EffectAnimation {
    /// 立即开始运行
    pub fn start(
        from: Option<VisualEffect>,
        to: Option<VisualEffect>,
        duration: f64,
        now: f64,
    ) -> Self {
        Self {
            from,
            to,
            duration,
            begin_time: now,
            paused_fraction: None,
        }
    }

    pub fn fraction(&self, now: f64) -> f64 {
        if let Some(f) = self.paused_fraction {
            return f;
        }
        if self.duration <= 0.0 {
            return 1.0;
        }
        ((now - self.begin_time) / self.duration).clamp(0.0, 1.0)
    }

    pub fn is_paused(&self) -> bool {
        self.paused_fraction.is_some()
    }

    /// 暂停并设置完成比例
    pub fn set_fraction(&mut self, fraction: f64) {
        self.paused_fraction = Some(fraction.clamp(0.0, 1.0));
    }

    /// 从当前完成比例继续运行
    pub fn resume(&mut self, now: f64) {
        if let Some(f) = self.paused_fraction.take() {
            self.begin_time = now - f * self.duration;
        }
    }

    pub fn value(&self, now: f64) -> Option<VisualEffect> {
        VisualEffect::blend(self.from, self.to, self.fraction(now))
    }
}

/// 视图树中的一个节点
#[derive(Debug, Clone, PartialEq)]
pub struct ViewNode {
    pub kind: ViewKind,
    pub layer: Layer,
    /// 遮罩层，按需创建
    pub overlay: Option<Layer>,
    pub is_hidden: bool,
    pub is_opaque: bool,
    pub user_interaction_enabled: bool,
    /// 调试 / 场景脚本使用的名字
    pub name: Option<String>,
    pub effect_animation: Option<EffectAnimation>,
    pub(crate) parent: Option<ViewId>,
    pub(crate) children: Vec<ViewId>,
}

impl ViewNode {
    pub fn new(kind: ViewKind) -> Self {
        Self {
            kind,
            layer: Layer::default(),
            overlay: None,
            is_hidden: false,
            is_opaque: true,
            user_interaction_enabled: true,
            name: None,
            effect_animation: None,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn parent(&self) -> Option<ViewId> {
        self.parent
    }

    pub fn children(&self) -> &[ViewId] {
        &self.children
    }

    /// 视图透明度（即主图层的模型透明度）
    pub fn alpha(&self) -> f64 {
        self.layer.props.opacity
    }

    pub fn set_alpha(&mut self, alpha: f64) {
        self.layer.props.opacity = alpha;
    }

    /// 背景色的透明度（无背景色视为 0）
    pub fn background_alpha(&self) -> f64 {
        self.layer.props.background_color.map_or(0.0, |c| c.a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blur() -> VisualEffect {
        VisualEffect {
            style: EffectStyle::Light,
            radius: 20.0,
        }
    }

    #[test]
    fn test_blend_fades_effect_in() {
        assert_eq!(VisualEffect::blend(None, Some(blur()), 0.0), None);
        assert_eq!(
            VisualEffect::blend(None, Some(blur()), 0.5).map(|e| e.radius),
            Some(10.0)
        );
        assert_eq!(VisualEffect::blend(Some(blur()), None, 1.0), None);
    }

    #[test]
    fn test_effect_animation_pause_and_resume() {
        let mut anim = EffectAnimation::start(None, Some(blur()), 2.0, 10.0);
        assert_eq!(anim.fraction(11.0), 0.5);

        anim.set_fraction(0.25);
        assert!(anim.is_paused());
        assert_eq!(anim.fraction(100.0), 0.25);

        anim.resume(20.0);
        assert!(!anim.is_paused());
        assert_eq!(anim.fraction(21.0), 0.75);
    }
}
