//! # Preprocess 模块
//!
//! 预处理管线：把视图声明的修饰器转换成具体的目标状态。
//!
//! ## 执行顺序
//!
//! 顺序固定，后面的预处理器依赖前面写入的字段：
//!
//! 1. [`IgnoreSubviewPreprocessor`]：清除被忽略子树的目标状态
//! 2. [`ConditionalPreprocessor`]：求值条件修饰器
//! 3. [`DefaultTypePreprocessor`]：整屏默认过渡
//! 4. [`MatchPreprocessor`]：配对视图互设来源
//! 5. [`SourcePreprocessor`]：把来源视图的几何写入目标状态
//! 6. [`CascadePreprocessor`]：级联延迟
//! 7. 插件
//! 8. [`DurationPreprocessor`]：解析时长（必须最后）

mod cascade;
mod conditional;
mod default_type;
mod duration;
mod ignore_subview;
mod matching;
mod source;

pub use cascade::CascadePreprocessor;
pub use conditional::{ConditionalContext, ConditionalPreprocessor};
pub use default_type::DefaultTypePreprocessor;
pub use duration::{DurationPreprocessor, optimized_duration};
pub use ignore_subview::IgnoreSubviewPreprocessor;
pub use matching::MatchPreprocessor;
pub use source::SourcePreprocessor;

use crate::animator::Animator;
use crate::context::TransitionContext;
use crate::plugin::Plugin;
use crate::scene::{ViewId, ViewTree};
use crate::transition::TransitionInfo;

/// 预处理器
pub trait Preprocessor {
    /// 修改上下文中各视图的目标状态
    fn process(&self, cx: &mut PreprocessContext<'_>, from_views: &[ViewId], to_views: &[ViewId]);
}

/// 预处理器运行时可见的过渡状态
pub struct PreprocessContext<'a> {
    pub tree: &'a ViewTree,
    pub context: &'a mut TransitionContext,
    pub info: &'a TransitionInfo,
    pub animators: &'a [Box<dyn Animator>],
    pub plugins: &'a [Box<dyn Plugin>],
}

impl PreprocessContext<'_> {
    /// 是否有动画器（含插件）认领这个视图
    pub fn can_animate(&self, view: ViewId, appearing: bool) -> bool {
        self.animators
            .iter()
            .any(|a| a.can_animate(self.tree, self.context, view, appearing))
            || self
                .plugins
                .iter()
                .any(|p| p.can_animate(self.tree, self.context, view, appearing))
    }
}

/// 内置预处理器（不含时长预处理器）
pub fn builtin_preprocessors() -> Vec<Box<dyn Preprocessor>> {
    vec![
        Box::new(IgnoreSubviewPreprocessor),
        Box::new(ConditionalPreprocessor),
        Box::new(DefaultTypePreprocessor),
        Box::new(MatchPreprocessor),
        Box::new(SourcePreprocessor),
        Box::new(CascadePreprocessor),
    ]
}
