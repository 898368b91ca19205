//! # Motion Runtime
//!
//! 声明式视图过渡引擎的核心库。
//!
//! ## 架构概述
//!
//! `motion-runtime` 是纯逻辑核心，不做任何 IO，也不依赖渲染引擎。
//! 它在一棵保留模式的视图树上编排过渡：宿主描述视图、控制器和每个视图的
//! 修饰器列表，引擎负责匹配、快照、插值与收尾。
//!
//! ```text
//! Host                                   Runtime
//!   │                                       │
//!   │── begin(request) / start(tree) ─────►│
//!   │                                       │ preprocess → animate
//!   │── tick(tree, dt) ───────────────────►│
//!   │◄── Vec<TransitionEvent> ─────────────│
//!   │── update / finish / cancel / apply ─►│
//! ```
//!
//! ## 核心类型
//!
//! - [`ViewTree`]：视图树、控制器与媒体时钟
//! - [`Modifier`]：视图声明的过渡修饰器
//! - [`TargetState`]：修饰器折叠后的目标状态
//! - [`TransitionContext`]：一次过渡的快照与配对信息
//! - [`MotionTransition`]：过渡状态机
//! - [`PluginRegistry`]：插件注册表
//!
//! ## 使用示例
//!
//! ```ignore
//! use motion_runtime::{MotionTransition, PluginRegistry, TransitionKind, TransitionOptions, TransitionRequest};
//!
//! let mut transition = MotionTransition::new(TransitionOptions::default(), PluginRegistry::new());
//! let request = TransitionRequest::new(from, to, container, TransitionKind::Push);
//! transition.transition(&mut tree, request);
//!
//! while transition.is_transitioning() {
//!     for event in transition.tick(&mut tree, 1.0 / 60.0) {
//!         host.handle(event);
//!     }
//! }
//! ```
//!
//! ## 模块结构
//!
//! - [`geometry`] / [`timing`]：几何与时间曲线
//! - [`scene`]：视图树
//! - [`modifier`] / [`target_state`] / [`transition_type`]：过渡声明
//! - [`context`]：过渡上下文
//! - [`preprocess`]：预处理管线
//! - [`animator`]：动画器
//! - [`plugin`]：插件
//! - [`clock`]：进度推进器与延迟队列
//! - [`transition`]：状态机
//! - [`error`]：错误类型

pub mod animator;
pub mod clock;
pub mod context;
pub mod error;
pub mod geometry;
pub mod modifier;
pub mod plugin;
pub mod preprocess;
pub mod scene;
pub mod target_state;
pub mod timing;
pub mod transition;
pub mod transition_type;

// 重导出核心类型
pub use animator::{Animator, AnimatorDuration, CoreAnimator, EffectViewContext, LayerViewContext};
pub use clock::{DelayQueue, DelayToken, FRAME_EPSILON, ProgressRunner, RunnerStep};
pub use context::TransitionContext;
pub use error::{MotionError, MotionResult, SceneError};
pub use geometry::{Color, Point, Rect, Size, Transform3D};
pub use modifier::{Condition, Modifier};
pub use plugin::{Plugin, PluginRegistry};
pub use preprocess::{PreprocessContext, Preprocessor};
pub use scene::{
    ControllerId, ControllerKind, ModalPresentationStyle, ViewController, ViewId, ViewKind,
    ViewTree,
};
pub use target_state::{SnapshotStrategy, TargetState};
pub use timing::{Spring, TimingFunction};
pub use transition::{
    HookScope, MotionTransition, TransitionEvent, TransitionFields, TransitionKind,
    TransitionOptions, TransitionRequest, TransitionState, ViewOrderStrategy,
};
pub use transition_type::{Direction, TransitionType};
