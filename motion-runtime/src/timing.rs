//! # Timing 模块
//!
//! 时间曲线（三次贝塞尔）与弹簧参数。
//!
//! 曲线与图层系统的命名曲线一一对应，求值时对 x 反解参数后取 y。

use serde::{Deserialize, Serialize};

/// 时间曲线
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingFunction {
    /// 线性（匀速）
    Linear,
    /// 缓入
    EaseIn,
    /// 缓出
    EaseOut,
    /// 缓入缓出
    EaseInOut,
    /// 标准曲线
    #[default]
    Standard,
    /// 减速曲线（快进慢出）
    Deceleration,
    /// 加速曲线
    Acceleration,
    /// 锐利曲线
    Sharp,
    /// 回弹缓出（略微过冲）
    EaseOutBack,
    /// 自定义三次贝塞尔控制点
    CubicBezier { x1: f64, y1: f64, x2: f64, y2: f64 },
}

impl TimingFunction {
    /// 两个控制点
    pub fn control_points(&self) -> (f64, f64, f64, f64) {
        match *self {
            TimingFunction::Linear => (0.0, 0.0, 1.0, 1.0),
            TimingFunction::EaseIn => (0.42, 0.0, 1.0, 1.0),
            TimingFunction::EaseOut => (0.0, 0.0, 0.58, 1.0),
            TimingFunction::EaseInOut => (0.42, 0.0, 0.58, 1.0),
            TimingFunction::Standard => (0.4, 0.0, 0.2, 1.0),
            TimingFunction::Deceleration => (0.0, 0.0, 0.2, 1.0),
            TimingFunction::Acceleration => (0.4, 0.0, 1.0, 1.0),
            TimingFunction::Sharp => (0.4, 0.0, 0.6, 1.0),
            TimingFunction::EaseOutBack => (0.175, 0.885, 0.32, 1.275),
            TimingFunction::CubicBezier { x1, y1, x2, y2 } => (x1, y1, x2, y2),
        }
    }

    /// 计算曲线值
    ///
    /// # 参数
    /// - `t`: 时间进度 (0.0 - 1.0)，超出范围会被钳制
    pub fn apply(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        if matches!(self, TimingFunction::Linear) || t == 0.0 || t == 1.0 {
            return t;
        }
        let (x1, y1, x2, y2) = self.control_points();
        let s = solve_parameter(t, x1, x2);
        bezier(s, y1, y2)
    }
}

/// 一维三次贝塞尔（端点固定为 0 和 1）
fn bezier(s: f64, p1: f64, p2: f64) -> f64 {
    let inv = 1.0 - s;
    3.0 * inv * inv * s * p1 + 3.0 * inv * s * s * p2 + s * s * s
}

fn bezier_derivative(s: f64, p1: f64, p2: f64) -> f64 {
    let inv = 1.0 - s;
    3.0 * inv * inv * p1 + 6.0 * inv * s * (p2 - p1) + 3.0 * s * s * (1.0 - p2)
}

/// 反解 x(s) = t：先牛顿迭代，不收敛时二分
fn solve_parameter(t: f64, x1: f64, x2: f64) -> f64 {
    let mut s = t;
    for _ in 0..8 {
        let err = bezier(s, x1, x2) - t;
        if err.abs() < 1e-7 {
            return s;
        }
        let d = bezier_derivative(s, x1, x2);
        if d.abs() < 1e-6 {
            break;
        }
        s -= err / d;
    }

    let (mut lo, mut hi) = (0.0, 1.0);
    s = t;
    for _ in 0..64 {
        let x = bezier(s, x1, x2);
        if (x - t).abs() < 1e-7 {
            break;
        }
        if x < t {
            lo = s;
        } else {
            hi = s;
        }
        s = (lo + hi) / 2.0;
    }
    s
}

/// 弹簧参数（质量 1，初速度 0）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spring {
    pub stiffness: f64,
    pub damping: f64,
}

/// 判定静止的误差阈值
const SETTLE_THRESHOLD: f64 = 0.001;
/// 静止时长的搜索上限（秒）
const SETTLE_LIMIT: f64 = 20.0;

impl Spring {
    pub const fn new(stiffness: f64, damping: f64) -> Self {
        Self { stiffness, damping }
    }

    /// 阻尼振子在 `t` 秒时的归一化位移（0 → 1，可能过冲）
    pub fn value(&self, t: f64) -> f64 {
        if t <= 0.0 {
            return 0.0;
        }
        let k = self.stiffness.max(f64::EPSILON);
        let omega = k.sqrt();
        let zeta = self.damping / (2.0 * omega);

        if zeta < 1.0 {
            let omega_d = omega * (1.0 - zeta * zeta).sqrt();
            let envelope = (-zeta * omega * t).exp();
            1.0 - envelope * ((omega_d * t).cos() + (zeta * omega / omega_d) * (omega_d * t).sin())
        } else if (zeta - 1.0).abs() < 1e-9 {
            1.0 - (-omega * t).exp() * (1.0 + omega * t)
        } else {
            let root = (zeta * zeta - 1.0).sqrt();
            let r1 = -omega * (zeta - root);
            let r2 = -omega * (zeta + root);
            1.0 - (r2 * (r1 * t).exp() - r1 * (r2 * t).exp()) / (r2 - r1)
        }
    }

    /// 位移与终点的误差持续低于阈值所需的时长
    pub fn settling_duration(&self) -> f64 {
        let step = 1.0 / 240.0;
        let mut last_unsettled = 0.0;
        let mut t = 0.0;
        while t < SETTLE_LIMIT {
            t += step;
            if (1.0 - self.value(t)).abs() > SETTLE_THRESHOLD {
                last_unsettled = t;
            } else if t - last_unsettled > 1.0 {
                break;
            }
        }
        last_unsettled + step
    }
}
