//! # TargetState 模块
//!
//! 单个视图在本次过渡中的目标状态。
//!
//! 所有字段都是可选的，缺省表示“保持当前值”。目标状态由视图声明的修饰器列表
//! 从左到右折叠得到，每次过渡重新构建，过渡结束后整体丢弃。

use serde::{Deserialize, Serialize};

use crate::geometry::{Color, Point, Rect, Size, Transform3D};
use crate::modifier::{Condition, Modifier};
use crate::timing::{Spring, TimingFunction};

/// 目标时长
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetDuration {
    /// 明确的秒数
    Seconds(f64),
    /// 与本次过渡中最长的时长一致（由时长预处理器解析）
    MatchLongest,
    /// 时长预处理器按位移估算的时长
    Optimized(f64),
}

/// 快照策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotStrategy {
    /// 按视图类型选择最合适的捕获方式
    #[default]
    Optimized,
    /// 原生视觉状态拷贝
    Normal,
    /// 全保真渲染成图像
    LayerRender,
    /// 不捕获，直接动画真实视图
    NoSnapshot,
}

/// 快照几何所在坐标空间
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateSpace {
    /// 过渡容器
    Global,
    /// 最近的已快照祖先
    Local,
}

/// 级联方向
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadeDirection {
    #[default]
    TopToBottom,
    BottomToTop,
    LeftToRight,
    RightToLeft,
    /// 离中心越近越早
    Radial { center: Point },
    /// 离中心越远越早
    InverseRadial { center: Point },
}

/// 级联参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cascade {
    #[serde(default = "default_cascade_delta")]
    pub delta: f64,
    #[serde(default)]
    pub direction: CascadeDirection,
    /// 匹配视图等所有级联子视图开始后再开始
    #[serde(default)]
    pub delay_matched_views: bool,
}

fn default_cascade_delta() -> f64 {
    0.02
}

impl Default for Cascade {
    fn default() -> Self {
        Self {
            delta: default_cascade_delta(),
            direction: CascadeDirection::default(),
            delay_matched_views: false,
        }
    }
}

/// 遮罩层颜色与透明度
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Overlay {
    pub color: Color,
    pub opacity: f64,
}

/// 视图目标状态
#[derive(Debug, Clone, PartialEq)]
pub struct TargetState {
    /// 动画开始前直接应用到快照上的状态
    pub begin_state: Vec<Modifier>,
    /// 条件成立时追加的修饰器
    pub conditional_modifiers: Vec<(Condition, Vec<Modifier>)>,

    pub position: Option<Point>,
    pub size: Option<Size>,
    pub transform: Option<Transform3D>,
    pub opacity: Option<f64>,
    pub corner_radius: Option<f64>,
    pub background_color: Option<Color>,
    pub z_position: Option<f64>,
    pub contents_rect: Option<Rect>,
    pub contents_scale: Option<f64>,
    pub border_width: Option<f64>,
    pub border_color: Option<Color>,
    pub shadow_color: Option<Color>,
    pub shadow_opacity: Option<f64>,
    pub shadow_offset: Option<Size>,
    pub shadow_radius: Option<f64>,
    pub shadow_path: Option<Rect>,
    pub masks_to_bounds: Option<bool>,
    /// 为 false 时快照不复制、不动画阴影
    pub display_shadow: bool,
    pub overlay: Option<Overlay>,

    pub spring: Option<Spring>,
    pub delay: f64,
    pub duration: Option<TargetDuration>,
    pub timing: Option<TimingFunction>,
    pub arc: Option<f64>,
    pub source: Option<String>,
    pub cascade: Option<Cascade>,
    /// `Some(recursive)`
    pub ignore_subview_transitions: Option<bool>,
    pub coordinate_space: Option<CoordinateSpace>,
    pub use_scale_based_size_change: Option<bool>,
    pub snapshot: Option<SnapshotStrategy>,
    pub non_fade: bool,
    pub force_animate: bool,
}

impl Default for TargetState {
    fn default() -> Self {
        Self {
            begin_state: Vec::new(),
            conditional_modifiers: Vec::new(),
            position: None,
            size: None,
            transform: None,
            opacity: None,
            corner_radius: None,
            background_color: None,
            z_position: None,
            contents_rect: None,
            contents_scale: None,
            border_width: None,
            border_color: None,
            shadow_color: None,
            shadow_opacity: None,
            shadow_offset: None,
            shadow_radius: None,
            shadow_path: None,
            masks_to_bounds: None,
            display_shadow: true,
            overlay: None,
            spring: None,
            delay: 0.0,
            duration: None,
            timing: None,
            arc: None,
            source: None,
            cascade: None,
            ignore_subview_transitions: None,
            coordinate_space: None,
            use_scale_based_size_change: None,
            snapshot: None,
            non_fade: false,
            force_animate: false,
        }
    }
}

impl TargetState {
    /// 由修饰器列表折叠出目标状态
    pub fn from_modifiers(modifiers: &[Modifier]) -> Self {
        let mut state = Self::default();
        state.append(modifiers);
        state
    }

    /// 依次应用修饰器，后者覆盖前者
    pub fn append(&mut self, modifiers: &[Modifier]) {
        for modifier in modifiers {
            modifier.apply(self);
        }
    }

    /// 已解析的有限秒数
    pub fn seconds(&self) -> Option<f64> {
        match self.duration {
            Some(TargetDuration::Seconds(d) | TargetDuration::Optimized(d)) if d.is_finite() => {
                Some(d)
            }
            _ => None,
        }
    }

    /// 是否由修饰器明确指定了时长
    pub fn has_explicit_duration(&self) -> bool {
        matches!(
            self.duration,
            Some(TargetDuration::Seconds(_) | TargetDuration::MatchLongest)
        )
    }

    pub fn matches_longest(&self) -> bool {
        self.duration == Some(TargetDuration::MatchLongest)
    }

    /// 是否有任何图层层面的可动画目标
    pub fn has_layer_targets(&self) -> bool {
        self.position.is_some()
            || self.size.is_some()
            || self.transform.is_some()
            || self.opacity.is_some()
            || self.corner_radius.is_some()
            || self.background_color.is_some()
            || self.z_position.is_some()
            || self.contents_rect.is_some()
            || self.contents_scale.is_some()
            || self.border_width.is_some()
            || self.border_color.is_some()
            || self.shadow_color.is_some()
            || self.shadow_opacity.is_some()
            || self.shadow_offset.is_some()
            || self.shadow_radius.is_some()
            || self.shadow_path.is_some()
            || self.masks_to_bounds.is_some()
            || self.overlay.is_some()
            || !self.begin_state.is_empty()
    }
}
