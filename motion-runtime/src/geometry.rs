//! # Geometry 模块
//!
//! 场景图使用的基础几何类型：点、尺寸、矩形、三维变换与颜色。
//!
//! 变换采用行向量约定（与图层系统一致）：点 `p` 经变换 `M` 后为 `p * M`，
//! 平移位于 `m41/m42/m43`。

use std::ops::{Add, Div, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// 二维点
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// 欧氏距离
    pub fn distance(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// 线性插值（不钳制 `t`，弹簧过冲需要）
    pub fn lerp(self, other: Self, t: f64) -> Self {
        Self {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }
}

impl Add for Point {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f64> for Point {
    type Output = Self;
    fn div(self, rhs: f64) -> Self {
        Self::new(self.x / rhs, self.y / rhs)
    }
}

impl Neg for Point {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

/// 二维尺寸
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const ZERO: Self = Self {
        width: 0.0,
        height: 0.0,
    };

    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// 以点的形式看待尺寸（用于距离计算）
    pub fn to_point(self) -> Point {
        Point::new(self.width, self.height)
    }

    pub fn lerp(self, other: Self, t: f64) -> Self {
        Self {
            width: self.width + (other.width - self.width) * t,
            height: self.height + (other.height - self.height) * t,
        }
    }

    pub fn is_empty(self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// 矩形
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub const ZERO: Self = Self {
        origin: Point::ZERO,
        size: Size::ZERO,
    };

    /// 单位矩形，`contentsRect` 的默认值
    pub const UNIT: Self = Self {
        origin: Point::ZERO,
        size: Size {
            width: 1.0,
            height: 1.0,
        },
    };

    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            origin: Point { x, y },
            size: Size { width, height },
        }
    }

    pub fn from_origin_size(origin: Point, size: Size) -> Self {
        Self { origin, size }
    }

    pub fn min_x(&self) -> f64 {
        self.origin.x.min(self.origin.x + self.size.width)
    }

    pub fn max_x(&self) -> f64 {
        self.origin.x.max(self.origin.x + self.size.width)
    }

    pub fn min_y(&self) -> f64 {
        self.origin.y.min(self.origin.y + self.size.height)
    }

    pub fn max_y(&self) -> f64 {
        self.origin.y.max(self.origin.y + self.size.height)
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x() + self.max_x()) / 2.0,
            (self.min_y() + self.max_y()) / 2.0,
        )
    }

    /// 两矩形是否有非空交集
    pub fn intersects(&self, other: &Rect) -> bool {
        self.min_x() < other.max_x()
            && other.min_x() < self.max_x()
            && self.min_y() < other.max_y()
            && other.min_y() < self.max_y()
    }

    /// 包含所有给定点的最小矩形
    pub fn bounding(points: &[Point]) -> Rect {
        let Some(first) = points.first() else {
            return Rect::ZERO;
        };
        let (mut min, mut max) = (*first, *first);
        for p in &points[1..] {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Rect::new(min.x, min.y, max.x - min.x, max.y - min.y)
    }

    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.min_x(), self.min_y()),
            Point::new(self.max_x(), self.min_y()),
            Point::new(self.max_x(), self.max_y()),
            Point::new(self.min_x(), self.max_y()),
        ]
    }

    pub fn lerp(self, other: Self, t: f64) -> Self {
        Self {
            origin: self.origin.lerp(other.origin, t),
            size: self.size.lerp(other.size, t),
        }
    }
}

/// 4×4 三维变换矩阵
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform3D {
    pub m: [[f64; 4]; 4],
}

impl Default for Transform3D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

const EPSILON: f64 = 1e-9;

impl Transform3D {
    pub const IDENTITY: Self = Self {
        m: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    pub fn translation(tx: f64, ty: f64, tz: f64) -> Self {
        let mut t = Self::IDENTITY;
        t.m[3][0] = tx;
        t.m[3][1] = ty;
        t.m[3][2] = tz;
        t
    }

    pub fn scaling(sx: f64, sy: f64, sz: f64) -> Self {
        let mut t = Self::IDENTITY;
        t.m[0][0] = sx;
        t.m[1][1] = sy;
        t.m[2][2] = sz;
        t
    }

    /// 绕轴 `(x, y, z)` 旋转 `angle` 弧度
    pub fn rotation(angle: f64, x: f64, y: f64, z: f64) -> Self {
        let len = (x * x + y * y + z * z).sqrt();
        if len < EPSILON {
            return Self::IDENTITY;
        }
        let (x, y, z) = (x / len, y / len, z / len);
        let (s, c) = angle.sin_cos();
        let t = 1.0 - c;
        Self {
            m: [
                [t * x * x + c, t * x * y + s * z, t * x * z - s * y, 0.0],
                [t * x * y - s * z, t * y * y + c, t * y * z + s * x, 0.0],
                [t * x * z + s * y, t * y * z - s * x, t * z * z + c, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// 先应用 `self` 再应用 `other`
    pub fn concat(&self, other: &Self) -> Self {
        let mut out = [[0.0; 4]; 4];
        for (i, row) in out.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = (0..4).map(|k| self.m[i][k] * other.m[k][j]).sum();
            }
        }
        Self { m: out }
    }

    /// 在现有变换之前追加平移
    pub fn translate(&self, tx: f64, ty: f64, tz: f64) -> Self {
        Self::translation(tx, ty, tz).concat(self)
    }

    /// 在现有变换之前追加缩放
    pub fn scale(&self, sx: f64, sy: f64, sz: f64) -> Self {
        Self::scaling(sx, sy, sz).concat(self)
    }

    /// 在现有变换之前追加旋转
    pub fn rotate(&self, angle: f64, x: f64, y: f64, z: f64) -> Self {
        Self::rotation(angle, x, y, z).concat(self)
    }

    /// 透视距离（`m34 = -1 / distance`）
    pub fn with_perspective(&self, distance: f64) -> Self {
        let mut t = *self;
        t.m[2][3] = if distance.abs() < EPSILON {
            0.0
        } else {
            -1.0 / distance
        };
        t
    }

    pub fn is_identity(&self) -> bool {
        self.approx_eq(&Self::IDENTITY)
    }

    pub fn approx_eq(&self, other: &Self) -> bool {
        self.m
            .iter()
            .flatten()
            .zip(other.m.iter().flatten())
            .all(|(a, b)| (a - b).abs() < 1e-6)
    }

    /// 变换平面上的点（忽略 z，做透视除法）
    pub fn apply_to_point(&self, p: Point) -> Point {
        let m = &self.m;
        let x = p.x * m[0][0] + p.y * m[1][0] + m[3][0];
        let y = p.x * m[0][1] + p.y * m[1][1] + m[3][1];
        let w = p.x * m[0][3] + p.y * m[1][3] + m[3][3];
        if w.abs() < EPSILON || (w - 1.0).abs() < EPSILON {
            Point::new(x, y)
        } else {
            Point::new(x / w, y / w)
        }
    }

    /// 用仿射部分变换尺寸向量
    pub fn apply_to_size(&self, s: Size) -> Size {
        let m = &self.m;
        Size::new(
            s.width * m[0][0] + s.height * m[1][0],
            s.width * m[0][1] + s.height * m[1][1],
        )
    }

    /// 仿射部分的逆（不可逆时返回 `None`）
    pub fn affine_inverse(&self) -> Option<Self> {
        let m = &self.m;
        let (a, b, c, d) = (m[0][0], m[0][1], m[1][0], m[1][1]);
        let (tx, ty) = (m[3][0], m[3][1]);
        let det = a * d - b * c;
        if det.abs() < EPSILON {
            return None;
        }
        let (ia, ib, ic, id) = (d / det, -b / det, -c / det, a / det);
        let mut out = Self::IDENTITY;
        out.m[0][0] = ia;
        out.m[0][1] = ib;
        out.m[1][0] = ic;
        out.m[1][1] = id;
        out.m[3][0] = -(tx * ia + ty * ic);
        out.m[3][1] = -(tx * ib + ty * id);
        Some(out)
    }

    /// 插值；两端都是无切变的仿射变换时分解为平移/缩放/旋转，否则逐元素
    pub fn interpolate(&self, other: &Self, t: f64) -> Self {
        match (self.decompose(), other.decompose()) {
            (Some(a), Some(b)) => {
                let mut delta = b.angle - a.angle;
                while delta > std::f64::consts::PI {
                    delta -= std::f64::consts::TAU;
                }
                while delta < -std::f64::consts::PI {
                    delta += std::f64::consts::TAU;
                }
                Decomposed {
                    tx: a.tx + (b.tx - a.tx) * t,
                    ty: a.ty + (b.ty - a.ty) * t,
                    sx: a.sx + (b.sx - a.sx) * t,
                    sy: a.sy + (b.sy - a.sy) * t,
                    angle: a.angle + delta * t,
                    m34: a.m34 + (b.m34 - a.m34) * t,
                }
                .compose()
            }
            _ => {
                let mut out = [[0.0; 4]; 4];
                for (i, row) in out.iter_mut().enumerate() {
                    for (j, cell) in row.iter_mut().enumerate() {
                        *cell = self.m[i][j] + (other.m[i][j] - self.m[i][j]) * t;
                    }
                }
                Self { m: out }
            }
        }
    }

    fn decompose(&self) -> Option<Decomposed> {
        let m = &self.m;
        // 只允许透视分量 m34 存在于平面之外
        let planar = [m[0][2], m[0][3], m[1][2], m[1][3], m[2][0], m[2][1], m[3][2]]
            .iter()
            .all(|v| v.abs() < EPSILON)
            && (m[2][2] - 1.0).abs() < EPSILON
            && (m[3][3] - 1.0).abs() < EPSILON;
        if !planar {
            return None;
        }
        let (a, b, c, d) = (m[0][0], m[0][1], m[1][0], m[1][1]);
        let sx = a.hypot(b);
        if sx < EPSILON {
            return None;
        }
        // 有切变时无法无损分解
        if (a * c + b * d).abs() > 1e-6 {
            return None;
        }
        Some(Decomposed {
            tx: m[3][0],
            ty: m[3][1],
            sx,
            sy: (a * d - b * c) / sx,
            angle: b.atan2(a),
            m34: m[2][3],
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct Decomposed {
    tx: f64,
    ty: f64,
    sx: f64,
    sy: f64,
    angle: f64,
    m34: f64,
}

impl Decomposed {
    fn compose(self) -> Transform3D {
        let (s, c) = self.angle.sin_cos();
        let mut t = Transform3D::IDENTITY;
        t.m[0][0] = self.sx * c;
        t.m[0][1] = self.sx * s;
        t.m[1][0] = -self.sy * s;
        t.m[1][1] = self.sy * c;
        t.m[3][0] = self.tx;
        t.m[3][1] = self.ty;
        t.m[2][3] = self.m34;
        t
    }
}

/// RGBA 颜色，分量取值 0.0 - 1.0
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    #[serde(default = "default_alpha")]
    pub a: f64,
}

fn default_alpha() -> f64 {
    1.0
}

impl Color {
    pub const BLACK: Self = Self::rgba(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Self = Self::rgba(1.0, 1.0, 1.0, 1.0);
    pub const CLEAR: Self = Self::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub fn with_alpha(self, a: f64) -> Self {
        Self { a, ..self }
    }

    pub fn lerp(self, other: Self, t: f64) -> Self {
        Self {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_translate_then_scale_order() {
        // translate 追加在已有缩放之前：先平移，再缩放
        let t = Transform3D::scaling(2.0, 2.0, 1.0).translate(10.0, 0.0, 0.0);
        let p = t.apply_to_point(Point::ZERO);
        assert!(close(p.x, 20.0));

        let t = Transform3D::translation(10.0, 0.0, 0.0).concat(&Transform3D::scaling(2.0, 2.0, 1.0));
        assert!(close(t.apply_to_point(Point::ZERO).x, 20.0));
    }

    #[test]
    fn test_rotation_quarter_turn() {
        let t = Transform3D::rotation(std::f64::consts::FRAC_PI_2, 0.0, 0.0, 1.0);
        let p = t.apply_to_point(Point::new(1.0, 0.0));
        assert!(close(p.x, 0.0));
        assert!(close(p.y, 1.0));
    }

    #[test]
    fn test_affine_inverse_round_trip() {
        let t = Transform3D::scaling(2.0, 3.0, 1.0)
            .rotate(0.3, 0.0, 0.0, 1.0)
            .translate(5.0, -7.0, 0.0);
        let inv = t.affine_inverse().unwrap();
        let p = Point::new(12.0, 34.0);
        let back = inv.apply_to_point(t.apply_to_point(p));
        assert!(close(back.x, p.x) && close(back.y, p.y));
    }

    #[test]
    fn test_interpolate_decomposes_rotation() {
        let a = Transform3D::IDENTITY;
        let b = Transform3D::rotation(std::f64::consts::PI * 0.5, 0.0, 0.0, 1.0);
        let mid = a.interpolate(&b, 0.5);
        let expected = Transform3D::rotation(std::f64::consts::PI * 0.25, 0.0, 0.0, 1.0);
        assert!(mid.approx_eq(&expected));
    }

    #[test]
    fn test_interpolate_scale_and_translation() {
        let a = Transform3D::IDENTITY;
        let b = Transform3D::translation(100.0, 0.0, 0.0).scale(0.5, 0.5, 1.0);
        let mid = a.interpolate(&b, 0.5);
        assert!(close(mid.m[0][0], 0.75));
        assert!(close(mid.m[3][0], 50.0));
        assert!(a.interpolate(&b, 1.0).approx_eq(&b));
    }

    #[test]
    fn test_interpolate_non_affine_is_elementwise() {
        let a = Transform3D::IDENTITY.with_perspective(500.0).rotate(0.4, 0.0, 1.0, 0.0);
        let b = Transform3D::IDENTITY;
        let mid = a.interpolate(&b, 0.5);
        assert!(close(mid.m[0][2], a.m[0][2] / 2.0));
    }

    #[test]
    fn test_rect_intersects() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert!(a.intersects(&Rect::new(50.0, 50.0, 100.0, 100.0)));
        assert!(!a.intersects(&Rect::new(100.0, 0.0, 10.0, 10.0)));
        assert!(!a.intersects(&Rect::new(-20.0, -20.0, 10.0, 10.0)));
    }

    #[test]
    fn test_bounding_rect() {
        let r = Rect::bounding(&[Point::new(3.0, 4.0), Point::new(-1.0, 10.0)]);
        assert_eq!(r, Rect::new(-1.0, 4.0, 4.0, 6.0));
        assert_eq!(Rect::bounding(&[]), Rect::ZERO);
    }

    #[test]
    fn test_color_deserialize_default_alpha() {
        let c: Color = serde_json::from_str(r#"{"r":1.0,"g":0.0,"b":0.0}"#).unwrap();
        assert_eq!(c, Color::rgba(1.0, 0.0, 0.0, 1.0));
    }
}
