//! # Layer 模块
//!
//! 图层属性、可动画键与显式图层动画。
//!
//! 动画以值的形式挂在图层上，按当前媒体时间求值得到呈现值；
//! 所有动画都是双向填充（fill both）且完成后不自动移除。

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::geometry::{Color, Point, Rect, Size, Transform3D};
use crate::timing::{Spring, TimingFunction};

/// 图层可动画属性键
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum LayerKey {
    Position,
    BoundsSize,
    Transform,
    Opacity,
    CornerRadius,
    BackgroundColor,
    ZPosition,
    BorderWidth,
    BorderColor,
    MasksToBounds,
    ShadowColor,
    ShadowOpacity,
    ShadowOffset,
    ShadowRadius,
    ShadowPath,
    ContentsRect,
    ContentsScale,
    /// 遮罩层背景色
    OverlayColor,
    /// 遮罩层透明度
    OverlayOpacity,
}

impl LayerKey {
    /// 键路径名
    pub fn as_str(&self) -> &'static str {
        match self {
            LayerKey::Position => "position",
            LayerKey::BoundsSize => "bounds.size",
            LayerKey::Transform => "transform",
            LayerKey::Opacity => "opacity",
            LayerKey::CornerRadius => "cornerRadius",
            LayerKey::BackgroundColor => "backgroundColor",
            LayerKey::ZPosition => "zPosition",
            LayerKey::BorderWidth => "borderWidth",
            LayerKey::BorderColor => "borderColor",
            LayerKey::MasksToBounds => "masksToBounds",
            LayerKey::ShadowColor => "shadowColor",
            LayerKey::ShadowOpacity => "shadowOpacity",
            LayerKey::ShadowOffset => "shadowOffset",
            LayerKey::ShadowRadius => "shadowRadius",
            LayerKey::ShadowPath => "shadowPath",
            LayerKey::ContentsRect => "contentsRect",
            LayerKey::ContentsScale => "contentsScale",
            LayerKey::OverlayColor => "overlay.backgroundColor",
            LayerKey::OverlayOpacity => "overlay.opacity",
        }
    }

    /// 遮罩层键映射到遮罩层上的实际属性
    pub fn overlay_target(&self) -> Option<LayerKey> {
        match self {
            LayerKey::OverlayColor => Some(LayerKey::BackgroundColor),
            LayerKey::OverlayOpacity => Some(LayerKey::Opacity),
            _ => None,
        }
    }

    /// 需要同步到内容子层与遮罩层的键
    pub fn is_mirrored(&self) -> bool {
        matches!(
            self,
            LayerKey::CornerRadius | LayerKey::ContentsRect | LayerKey::ContentsScale
        )
    }
}

impl fmt::Display for LayerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 图层槽位：视图的主图层或遮罩层
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum LayerSlot {
    Main,
    Overlay,
}

/// 可动画的属性值
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum AnimValue {
    Scalar(f64),
    Point(Point),
    Size(Size),
    Rect(Rect),
    Transform(Transform3D),
    Color(Option<Color>),
    Path(Option<Rect>),
    Bool(bool),
}

impl AnimValue {
    /// 插值；`t` 不做钳制，弹簧过冲时可能大于 1。
    ///
    /// 类型不一致时按离散值处理：中点之前取起点，之后取终点。
    pub fn interpolate(&self, to: &AnimValue, t: f64) -> AnimValue {
        match (self, to) {
            (AnimValue::Scalar(a), AnimValue::Scalar(b)) => AnimValue::Scalar(a + (b - a) * t),
            (AnimValue::Point(a), AnimValue::Point(b)) => AnimValue::Point(a.lerp(*b, t)),
            (AnimValue::Size(a), AnimValue::Size(b)) => AnimValue::Size(a.lerp(*b, t)),
            (AnimValue::Rect(a), AnimValue::Rect(b)) => AnimValue::Rect(a.lerp(*b, t)),
            (AnimValue::Transform(a), AnimValue::Transform(b)) => {
                AnimValue::Transform(a.interpolate(b, t))
            }
            (AnimValue::Color(a), AnimValue::Color(b)) => {
                AnimValue::Color(interpolate_color(*a, *b, t))
            }
            (AnimValue::Path(Some(a)), AnimValue::Path(Some(b))) => {
                AnimValue::Path(Some(a.lerp(*b, t)))
            }
            _ => {
                if t < 0.5 {
                    *self
                } else {
                    *to
                }
            }
        }
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            AnimValue::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_point(&self) -> Option<Point> {
        match self {
            AnimValue::Point(p) => Some(*p),
            _ => None,
        }
    }

    pub fn as_size(&self) -> Option<Size> {
        match self {
            AnimValue::Size(s) => Some(*s),
            _ => None,
        }
    }

    pub fn as_transform(&self) -> Option<Transform3D> {
        match self {
            AnimValue::Transform(t) => Some(*t),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Option<Color>> {
        match self {
            AnimValue::Color(c) => Some(*c),
            _ => None,
        }
    }
}

/// 缺失颜色视为同色全透明
fn interpolate_color(a: Option<Color>, b: Option<Color>, t: f64) -> Option<Color> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.lerp(b, t)),
        (Some(a), None) => Some(a.lerp(a.with_alpha(0.0), t)),
        (None, Some(b)) => Some(b.with_alpha(0.0).lerp(b, t)),
        (None, None) => None,
    }
}

/// 图层模型属性
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerProps {
    pub position: Point,
    pub bounds_size: Size,
    pub anchor_point: Point,
    pub transform: Transform3D,
    pub opacity: f64,
    pub corner_radius: f64,
    pub background_color: Option<Color>,
    pub z_position: f64,
    pub border_width: f64,
    pub border_color: Option<Color>,
    pub masks_to_bounds: bool,
    pub shadow_color: Option<Color>,
    pub shadow_opacity: f64,
    pub shadow_offset: Size,
    pub shadow_radius: f64,
    pub shadow_path: Option<Rect>,
    pub contents_rect: Rect,
    pub contents_scale: f64,
}

impl Default for LayerProps {
    fn default() -> Self {
        Self {
            position: Point::ZERO,
            bounds_size: Size::ZERO,
            anchor_point: Point::new(0.5, 0.5),
            transform: Transform3D::IDENTITY,
            opacity: 1.0,
            corner_radius: 0.0,
            background_color: None,
            z_position: 0.0,
            border_width: 0.0,
            border_color: Some(Color::BLACK),
            masks_to_bounds: false,
            shadow_color: Some(Color::BLACK),
            shadow_opacity: 0.0,
            shadow_offset: Size::new(0.0, -3.0),
            shadow_radius: 3.0,
            shadow_path: None,
            contents_rect: Rect::UNIT,
            contents_scale: 1.0,
        }
    }
}

impl LayerProps {
    /// 读取属性；遮罩层键读取它映射到的属性
    pub fn get(&self, key: LayerKey) -> AnimValue {
        match key {
            LayerKey::Position => AnimValue::Point(self.position),
            LayerKey::BoundsSize => AnimValue::Size(self.bounds_size),
            LayerKey::Transform => AnimValue::Transform(self.transform),
            LayerKey::Opacity | LayerKey::OverlayOpacity => AnimValue::Scalar(self.opacity),
            LayerKey::CornerRadius => AnimValue::Scalar(self.corner_radius),
            LayerKey::BackgroundColor | LayerKey::OverlayColor => {
                AnimValue::Color(self.background_color)
            }
            LayerKey::ZPosition => AnimValue::Scalar(self.z_position),
            LayerKey::BorderWidth => AnimValue::Scalar(self.border_width),
            LayerKey::BorderColor => AnimValue::Color(self.border_color),
            LayerKey::MasksToBounds => AnimValue::Bool(self.masks_to_bounds),
            LayerKey::ShadowColor => AnimValue::Color(self.shadow_color),
            LayerKey::ShadowOpacity => AnimValue::Scalar(self.shadow_opacity),
            LayerKey::ShadowOffset => AnimValue::Size(self.shadow_offset),
            LayerKey::ShadowRadius => AnimValue::Scalar(self.shadow_radius),
            LayerKey::ShadowPath => AnimValue::Path(self.shadow_path),
            LayerKey::ContentsRect => AnimValue::Rect(self.contents_rect),
            LayerKey::ContentsScale => AnimValue::Scalar(self.contents_scale),
        }
    }

    /// 写入属性；类型不匹配的值被忽略
    pub fn set(&mut self, key: LayerKey, value: AnimValue) {
        match (key, value) {
            (LayerKey::Position, AnimValue::Point(p)) => self.position = p,
            (LayerKey::BoundsSize, AnimValue::Size(s)) => self.bounds_size = s,
            (LayerKey::Transform, AnimValue::Transform(t)) => self.transform = t,
            (LayerKey::Opacity | LayerKey::OverlayOpacity, AnimValue::Scalar(v)) => {
                self.opacity = v
            }
            (LayerKey::CornerRadius, AnimValue::Scalar(v)) => self.corner_radius = v,
            (LayerKey::BackgroundColor | LayerKey::OverlayColor, AnimValue::Color(c)) => {
                self.background_color = c
            }
            (LayerKey::ZPosition, AnimValue::Scalar(v)) => self.z_position = v,
            (LayerKey::BorderWidth, AnimValue::Scalar(v)) => self.border_width = v,
            (LayerKey::BorderColor, AnimValue::Color(c)) => self.border_color = c,
            (LayerKey::MasksToBounds, AnimValue::Bool(b)) => self.masks_to_bounds = b,
            (LayerKey::ShadowColor, AnimValue::Color(c)) => self.shadow_color = c,
            (LayerKey::ShadowOpacity, AnimValue::Scalar(v)) => self.shadow_opacity = v,
            (LayerKey::ShadowOffset, AnimValue::Size(s)) => self.shadow_offset = s,
            (LayerKey::ShadowRadius, AnimValue::Scalar(v)) => self.shadow_radius = v,
            (LayerKey::ShadowPath, AnimValue::Path(p)) => self.shadow_path = p,
            (LayerKey::ContentsRect, AnimValue::Rect(r)) => self.contents_rect = r,
            (LayerKey::ContentsScale, AnimValue::Scalar(v)) => self.contents_scale = v,
            (key, value) => {
                tracing::debug!(key = %key, value = ?value, "忽略类型不匹配的图层属性写入");
            }
        }
    }
}

/// 动画插值方式
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum AnimationCurve {
    /// 基础插值
    Basic(TimingFunction),
    /// 沿二次贝塞尔路径移动（仅用于位置）
    Arc {
        control: Point,
        timing: TimingFunction,
    },
    /// 弹簧
    Spring(Spring),
}

/// 挂在图层上的一条动画
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerAnimation {
    pub key: LayerKey,
    pub from: AnimValue,
    pub to: AnimValue,
    pub curve: AnimationCurve,
    /// 开始的媒体时间
    pub begin_time: f64,
    pub duration: f64,
    /// 速度为 0 时动画暂停在 `time_offset`
    pub speed: f64,
    pub time_offset: f64,
    /// 是否由过渡引擎创建（清理时只移除这些）
    pub engine_owned: bool,
}

impl LayerAnimation {
    pub fn new(key: LayerKey, from: AnimValue, to: AnimValue, curve: AnimationCurve) -> Self {
        Self {
            key,
            from,
            to,
            curve,
            begin_time: 0.0,
            duration: 0.0,
            speed: 1.0,
            time_offset: 0.0,
            engine_owned: true,
        }
    }

    /// 动画本地时间（已按双向填充钳制）
    pub fn local_time(&self, now: f64) -> f64 {
        let t = if self.speed == 0.0 {
            self.time_offset
        } else {
            (now - self.begin_time) * self.speed + self.time_offset
        };
        t.clamp(0.0, self.duration.max(0.0))
    }

    /// 归一化进度
    pub fn fraction(&self, now: f64) -> f64 {
        if self.duration <= 0.0 {
            let started = self.speed == 0.0 || now >= self.begin_time;
            return if started { 1.0 } else { 0.0 };
        }
        self.local_time(now) / self.duration
    }

    /// 在 `now` 时刻的呈现值
    pub fn value_at(&self, now: f64) -> AnimValue {
        match self.curve {
            AnimationCurve::Basic(timing) => {
                self.from.interpolate(&self.to, timing.apply(self.fraction(now)))
            }
            AnimationCurve::Arc { control, timing } => {
                match (self.from.as_point(), self.to.as_point()) {
                    (Some(p0), Some(p1)) => {
                        let s = timing.apply(self.fraction(now));
                        let inv = 1.0 - s;
                        AnimValue::Point(p0 * (inv * inv) + control * (2.0 * inv * s) + p1 * (s * s))
                    }
                    _ => self.from.interpolate(&self.to, timing.apply(self.fraction(now))),
                }
            }
            AnimationCurve::Spring(spring) => {
                if self.duration <= 0.0 {
                    return self.to;
                }
                self.from.interpolate(&self.to, spring.value(self.local_time(now)))
            }
        }
    }
}

/// 图层：模型属性 + 按键存放的动画
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layer {
    pub props: LayerProps,
    animations: BTreeMap<LayerKey, LayerAnimation>,
}

impl Layer {
    pub fn new(props: LayerProps) -> Self {
        Self {
            props,
            animations: BTreeMap::new(),
        }
    }

    /// 添加动画，替换同键的旧动画
    pub fn add_animation(&mut self, animation: LayerAnimation) {
        self.animations.insert(animation.key, animation);
    }

    pub fn remove_animation(&mut self, key: LayerKey) -> Option<LayerAnimation> {
        self.animations.remove(&key)
    }

    pub fn animation(&self, key: LayerKey) -> Option<&LayerAnimation> {
        self.animations.get(&key)
    }

    pub fn animation_mut(&mut self, key: LayerKey) -> Option<&mut LayerAnimation> {
        self.animations.get_mut(&key)
    }

    pub fn animations(&self) -> impl Iterator<Item = &LayerAnimation> {
        self.animations.values()
    }

    pub fn has_animations(&self) -> bool {
        !self.animations.is_empty()
    }

    /// 移除过渡引擎创建的全部动画
    pub fn remove_engine_animations(&mut self) {
        self.animations.retain(|_, a| !a.engine_owned);
    }

    /// 呈现值：有动画时按时间求值，否则为模型值
    pub fn presentation(&self, key: LayerKey, now: f64) -> AnimValue {
        match self.animations.get(&key) {
            Some(animation) => animation.value_at(now),
            None => self.props.get(key),
        }
    }
}
