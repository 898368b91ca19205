//! # TransitionType 模块
//!
//! 整屏默认过渡的原型与方向，以及它们的反转表。

use serde::{Deserialize, Serialize};

/// 过渡方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }
}

/// 整屏过渡类型
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionType {
    /// 按控制器类型与方向自动选择
    #[default]
    Auto,
    /// 不使用默认过渡
    None,
    Push(Direction),
    Pull(Direction),
    Cover(Direction),
    Uncover(Direction),
    Slide(Direction),
    ZoomSlide(Direction),
    PageIn(Direction),
    PageOut(Direction),
    Fade,
    Zoom,
    ZoomOut,
    /// 呈现与消失分别使用不同的类型
    SelectBy {
        presenting: Box<TransitionType>,
        dismissing: Box<TransitionType>,
    },
}

impl TransitionType {
    /// 反转：push ↔ pull、cover ↔ uncover、pageIn ↔ pageOut 并翻转方向，
    /// slide / zoomSlide 翻转方向，zoom ↔ zoomOut
    pub fn reversed(&self) -> TransitionType {
        match self {
            TransitionType::Push(d) => TransitionType::Pull(d.opposite()),
            TransitionType::Pull(d) => TransitionType::Push(d.opposite()),
            TransitionType::Cover(d) => TransitionType::Uncover(d.opposite()),
            TransitionType::Uncover(d) => TransitionType::Cover(d.opposite()),
            TransitionType::Slide(d) => TransitionType::Slide(d.opposite()),
            TransitionType::ZoomSlide(d) => TransitionType::ZoomSlide(d.opposite()),
            TransitionType::PageIn(d) => TransitionType::PageOut(d.opposite()),
            TransitionType::PageOut(d) => TransitionType::PageIn(d.opposite()),
            TransitionType::Zoom => TransitionType::ZoomOut,
            TransitionType::ZoomOut => TransitionType::Zoom,
            other => other.clone(),
        }
    }

    /// 呈现时用 `presenting`，消失时用它的反转
    pub fn auto_reverse(presenting: TransitionType) -> TransitionType {
        let dismissing = presenting.reversed();
        TransitionType::SelectBy {
            presenting: Box::new(presenting),
            dismissing: Box::new(dismissing),
        }
    }

    /// 展开 `SelectBy`
    pub fn select(&self, is_presenting: bool) -> TransitionType {
        match self {
            TransitionType::SelectBy {
                presenting,
                dismissing,
            } => {
                let chosen = if is_presenting { presenting } else { dismissing };
                chosen.select(is_presenting)
            }
            other => other.clone(),
        }
    }

    /// 该类型要求的快照层级：`Some(true)` 目标在源之下，`Some(false)` 目标在上，
    /// `None` 沿用视图顺序策略
    pub fn inserts_destination_below(&self) -> Option<bool> {
        match self {
            TransitionType::Pull(_)
            | TransitionType::Uncover(_)
            | TransitionType::PageOut(_)
            | TransitionType::ZoomOut => Some(true),
            TransitionType::Push(_) | TransitionType::Cover(_) => Some(false),
            _ => None,
        }
    }
}
