//! # Scenario 模块
//!
//! JSON 场景脚本：窗口、视图、控制器、一次过渡请求与按时间触发的控制调用。
//!
//! 视图按声明顺序创建，父视图必须先于子视图声明。`parent` 为 `"window"`
//! 时挂到窗口根视图上；省略 `parent` 的视图不在树上（通常是目标控制器的根视图）。
//!
//! ```json
//! {
//!   "name": "present-card",
//!   "views": [
//!     { "name": "stage", "parent": "window", "frame": { "width": 400, "height": 800 } },
//!     { "name": "home", "parent": "stage", "frame": { "width": 400, "height": 800 } },
//!     { "name": "detail", "frame": { "width": 400, "height": 800 } }
//!   ],
//!   "controllers": [
//!     { "name": "home", "root": "home" },
//!     { "name": "detail", "root": "detail" }
//!   ],
//!   "transition": { "from": "home", "to": "detail", "container": "stage", "kind": "present" },
//!   "actions": [ { "at": 0.1, "action": "finish" } ]
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use motion_runtime::scene::VisualEffect;
use motion_runtime::{
    Color, ControllerId, ControllerKind, ModalPresentationStyle, Modifier, MotionTransition,
    Rect, Size, TransitionKind, TransitionOptions, TransitionRequest, TransitionType,
    ViewController, ViewId, ViewKind, ViewTree,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ScenarioError;

/// 指向窗口根视图的保留名
pub const WINDOW: &str = "window";

/// 场景脚本
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: String,

    /// 窗口尺寸
    #[serde(default = "default_window")]
    pub window: Size,

    pub views: Vec<ViewSpec>,

    pub controllers: Vec<ControllerSpec>,

    pub transition: TransitionSpec,

    /// 覆盖配置文件中的过渡选项
    #[serde(default)]
    pub options: Option<TransitionOptions>,

    #[serde(default)]
    pub actions: Vec<ActionSpec>,
}

fn default_window() -> Size {
    Size::new(400.0, 800.0)
}

fn yes() -> bool {
    true
}

/// 视图声明
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewSpec {
    pub name: String,

    #[serde(default)]
    pub parent: Option<String>,

    #[serde(default)]
    pub kind: ViewKindSpec,

    pub frame: FrameSpec,

    /// 匹配用的标识符
    #[serde(default)]
    pub identifier: Option<String>,

    #[serde(default)]
    pub modifiers: Vec<Modifier>,

    #[serde(default)]
    pub alpha: Option<f64>,

    #[serde(default = "yes")]
    pub opaque: bool,

    #[serde(default)]
    pub hidden: bool,

    #[serde(default = "yes")]
    pub user_interaction_enabled: bool,

    #[serde(default)]
    pub corner_radius: Option<f64>,

    #[serde(default)]
    pub background_color: Option<Color>,
}

/// 视图类别
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewKindSpec {
    #[default]
    Plain,
    Image {
        image: String,
    },
    Stack,
    Collection,
    NavigationBar {
        #[serde(default)]
        translucent: bool,
    },
    EffectView {
        #[serde(default)]
        effect: Option<VisualEffect>,
    },
}

impl ViewKindSpec {
    fn to_view_kind(&self) -> ViewKind {
        match self {
            ViewKindSpec::Plain => ViewKind::Plain,
            ViewKindSpec::Image { image } => ViewKind::Image {
                image: image.clone(),
            },
            ViewKindSpec::Stack => ViewKind::Stack,
            ViewKindSpec::Collection => ViewKind::Collection,
            ViewKindSpec::NavigationBar { translucent } => ViewKind::NavigationBar {
                translucent: *translucent,
            },
            ViewKindSpec::EffectView { effect } => ViewKind::EffectView { effect: *effect },
        }
    }
}

/// 父坐标系中的矩形
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameSpec {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl FrameSpec {
    pub fn to_rect(self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    fn is_valid(&self) -> bool {
        [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
            && self.width >= 0.0
            && self.height >= 0.0
    }
}

/// 控制器声明
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerSpec {
    pub name: String,

    /// 根视图名
    pub root: String,

    #[serde(default)]
    pub kind: ControllerKind,

    #[serde(default)]
    pub modal_presentation_style: ModalPresentationStyle,

    #[serde(default = "yes")]
    pub motion_enabled: bool,

    #[serde(default)]
    pub modal_transition: TransitionType,

    #[serde(default)]
    pub navigation_transition: TransitionType,

    #[serde(default)]
    pub tab_transition: TransitionType,
}

/// 过渡请求声明
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionSpec {
    pub from: String,
    pub to: String,
    /// 过渡容器视图名
    pub container: String,
    pub kind: TransitionKind,
    /// 导航 / 标签页容器控制器名
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub animation: TransitionType,
}

/// 在过渡开始后 `at` 秒触发的控制调用
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionSpec {
    pub at: f64,
    #[serde(flatten)]
    pub action: Action,
}

/// 控制调用
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Update {
        progress: f64,
    },
    Finish {
        #[serde(default = "yes")]
        animated: bool,
    },
    Cancel {
        #[serde(default = "yes")]
        animated: bool,
    },
    Apply {
        view: String,
        modifiers: Vec<Modifier>,
    },
}

/// 视图名已解析的控制调用
#[derive(Debug, Clone, PartialEq)]
pub enum ControlCall {
    Update(f64),
    Finish { animated: bool },
    Cancel { animated: bool },
    Apply { view: ViewId, modifiers: Vec<Modifier> },
}

impl ControlCall {
    /// 对过渡发出调用
    pub fn dispatch(&self, transition: &mut MotionTransition, tree: &mut ViewTree) {
        match self {
            ControlCall::Update(progress) => transition.update(tree, *progress),
            ControlCall::Finish { animated } => transition.finish(tree, *animated),
            ControlCall::Cancel { animated } => transition.cancel(tree, *animated),
            ControlCall::Apply { view, modifiers } => transition.apply(tree, modifiers, *view),
        }
    }
}

/// 由场景脚本构建出的场景
#[derive(Debug)]
pub struct Scene {
    pub tree: ViewTree,
    pub views: BTreeMap<String, ViewId>,
    pub controllers: BTreeMap<String, ControllerId>,
    pub request: TransitionRequest,
    /// 按触发时间排好序的控制调用
    pub actions: Vec<(f64, ControlCall)>,
}

impl Scene {
    /// 反查视图名
    pub fn view_name(&self, id: ViewId) -> Option<&str> {
        self.views
            .iter()
            .find(|(_, view)| **view == id)
            .map(|(name, _)| name.as_str())
    }
}

/// 场景检查结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioSummary {
    pub name: String,
    pub views: usize,
    pub controllers: usize,
    pub actions: usize,
    /// 过渡请求能否被认领
    pub claimable: bool,
}

impl Scenario {
    /// 从文件加载
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ScenarioError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let mut scenario = Self::from_json(&content)?;
        if scenario.name.is_empty()
            && let Some(stem) = path.file_stem()
        {
            scenario.name = stem.to_string_lossy().into_owned();
        }
        Ok(scenario)
    }

    pub fn from_json(json: &str) -> Result<Self, ScenarioError> {
        serde_json::from_str(json).map_err(|e| ScenarioError::Parse(e.to_string()))
    }

    /// 构建视图树、控制器与过渡请求
    pub fn build(&self) -> Result<Scene, ScenarioError> {
        if !self.window.width.is_finite()
            || !self.window.height.is_finite()
            || self.window.is_empty()
        {
            return Err(ScenarioError::Invalid(format!(
                "窗口尺寸无效: {}x{}",
                self.window.width, self.window.height
            )));
        }

        let mut tree = ViewTree::new(self.window);
        let mut views = BTreeMap::new();
        views.insert(WINDOW.to_string(), tree.window());

        for spec in &self.views {
            if views.contains_key(&spec.name) {
                return Err(ScenarioError::DuplicateName(spec.name.clone()));
            }
            let id = build_view(&mut tree, &views, spec)?;
            views.insert(spec.name.clone(), id);
        }

        let mut controllers = BTreeMap::new();
        for spec in &self.controllers {
            if controllers.contains_key(&spec.name) {
                return Err(ScenarioError::DuplicateName(spec.name.clone()));
            }
            let root = lookup_view(&views, &spec.root)?;
            let mut controller = ViewController::new(root)
                .with_kind(spec.kind)
                .with_name(spec.name.clone());
            controller.modal_presentation_style = spec.modal_presentation_style;
            controller.is_motion_enabled = spec.motion_enabled;
            controller.modal_transition = spec.modal_transition.clone();
            controller.navigation_transition = spec.navigation_transition.clone();
            controller.tab_transition = spec.tab_transition.clone();
            controllers.insert(spec.name.clone(), tree.add_controller(controller));
        }

        let t = &self.transition;
        let mut request = TransitionRequest::new(
            lookup_controller(&controllers, &t.from)?,
            lookup_controller(&controllers, &t.to)?,
            lookup_view(&views, &t.container)?,
            t.kind,
        )
        .with_animation(t.animation.clone());
        if let Some(host) = &t.host {
            request = request.with_host(lookup_controller(&controllers, host)?);
        }

        let mut actions = Vec::with_capacity(self.actions.len());
        for spec in &self.actions {
            if !spec.at.is_finite() || spec.at < 0.0 {
                return Err(ScenarioError::Invalid(format!("动作时间无效: {}", spec.at)));
            }
            let call = match &spec.action {
                Action::Update { progress } => {
                    if !progress.is_finite() {
                        return Err(ScenarioError::Invalid(format!("进度无效: {progress}")));
                    }
                    ControlCall::Update(*progress)
                }
                Action::Finish { animated } => ControlCall::Finish {
                    animated: *animated,
                },
                Action::Cancel { animated } => ControlCall::Cancel {
                    animated: *animated,
                },
                Action::Apply { view, modifiers } => ControlCall::Apply {
                    view: lookup_view(&views, view)?,
                    modifiers: modifiers.clone(),
                },
            };
            actions.push((spec.at, call));
        }
        // 同一时刻按声明顺序
        actions.sort_by(|a, b| a.0.total_cmp(&b.0));

        debug!(
            views = views.len(),
            controllers = controllers.len(),
            actions = actions.len(),
            "场景构建完成"
        );
        Ok(Scene {
            tree,
            views,
            controllers,
            request,
            actions,
        })
    }

    /// 构建场景并确认过渡请求可被认领，不运行动画
    pub fn check(&self) -> Result<ScenarioSummary, ScenarioError> {
        let scene = self.build()?;
        let mut trial = MotionTransition::default();
        let claimable = trial.begin(&scene.tree, scene.request.clone());
        Ok(ScenarioSummary {
            name: self.name.clone(),
            views: self.views.len(),
            controllers: scene.controllers.len(),
            actions: scene.actions.len(),
            claimable,
        })
    }
}

fn build_view(
    tree: &mut ViewTree,
    views: &BTreeMap<String, ViewId>,
    spec: &ViewSpec,
) -> Result<ViewId, ScenarioError> {
    if !spec.frame.is_valid() {
        return Err(ScenarioError::Invalid(format!("视图 {} 的 frame 无效", spec.name)));
    }
    if let Some(alpha) = spec.alpha
        && !(0.0..=1.0).contains(&alpha)
    {
        return Err(ScenarioError::Invalid(format!(
            "视图 {} 的透明度超出 0.0 - 1.0: {alpha}",
            spec.name
        )));
    }

    let id = tree.create_view(spec.kind.to_view_kind(), spec.frame.to_rect());
    if let Some(parent) = &spec.parent {
        let parent = lookup_view(views, parent)?;
        tree.add_subview(parent, id)?;
    }

    let node = tree.require_mut(id)?;
    node.name = Some(spec.name.clone());
    node.is_opaque = spec.opaque;
    node.is_hidden = spec.hidden;
    node.user_interaction_enabled = spec.user_interaction_enabled;
    if let Some(alpha) = spec.alpha {
        node.set_alpha(alpha);
    }
    if let Some(radius) = spec.corner_radius {
        node.layer.props.corner_radius = radius;
    }
    if spec.background_color.is_some() {
        node.layer.props.background_color = spec.background_color;
    }

    if let Some(identifier) = &spec.identifier {
        tree.set_identifier(id, identifier.clone());
    }
    if !spec.modifiers.is_empty() {
        tree.set_modifiers(id, spec.modifiers.clone());
    }
    Ok(id)
}

fn lookup_view(views: &BTreeMap<String, ViewId>, name: &str) -> Result<ViewId, ScenarioError> {
    views
        .get(name)
        .copied()
        .ok_or_else(|| ScenarioError::UnknownView(name.to_string()))
}

fn lookup_controller(
    controllers: &BTreeMap<String, ControllerId>,
    name: &str,
) -> Result<ControllerId, ScenarioError> {
    controllers
        .get(name)
        .copied()
        .ok_or_else(|| ScenarioError::UnknownController(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRESENT: &str = r#"{
        "name": "present",
        "views": [
            { "name": "stage", "parent": "window", "frame": { "width": 400, "height": 800 } },
            { "name": "home", "parent": "stage", "frame": { "width": 400, "height": 800 } },
            { "name": "thumb", "parent": "home", "identifier": "card",
              "frame": { "x": 20, "y": 20, "width": 100, "height": 100 }, "corner_radius": 8 },
            { "name": "detail", "frame": { "width": 400, "height": 800 } },
            { "name": "hero", "parent": "detail", "identifier": "card",
              "frame": { "width": 400, "height": 300 }, "modifiers": ["fade", { "duration": 0.4 }] }
        ],
        "controllers": [
            { "name": "home", "root": "home" },
            { "name": "detail", "root": "detail", "modal_presentation_style": "over_full_screen" }
        ],
        "transition": { "from": "home", "to": "detail", "container": "stage", "kind": "present" },
        "actions": [
            { "at": 0.2, "action": "finish" },
            { "at": 0.0, "action": "update", "progress": 0.25 },
            { "at": 0.1, "action": "apply", "view": "thumb", "modifiers": [{ "opacity": 0.5 }] }
        ]
    }"#;

    #[test]
    fn test_build_present_scene() {
        let scenario = Scenario::from_json(PRESENT).unwrap();
        let scene = scenario.build().unwrap();

        let stage = scene.views["stage"];
        let home = scene.views["home"];
        let detail = scene.views["detail"];
        assert_eq!(scene.tree.superview(stage), Some(scene.tree.window()));
        assert_eq!(scene.tree.superview(home), Some(stage));
        assert_eq!(scene.tree.superview(detail), None);
        assert_eq!(scene.tree.identifier(scene.views["hero"]), Some("card"));
        assert_eq!(
            scene.tree.modifiers(scene.views["hero"]),
            &[Modifier::Fade, Modifier::Duration(0.4)]
        );
        assert_eq!(
            scene.tree.view(scene.views["thumb"]).unwrap().layer.props.corner_radius,
            8.0
        );

        let detail_controller = scene.tree.controller(scene.controllers["detail"]).unwrap();
        assert_eq!(
            detail_controller.modal_presentation_style,
            ModalPresentationStyle::OverFullScreen
        );
        assert_eq!(scene.request.container, stage);
        assert_eq!(scene.request.kind, TransitionKind::Present);
        assert_eq!(scene.view_name(home), Some("home"));
    }

    #[test]
    fn test_actions_sorted_by_time() {
        let scene = Scenario::from_json(PRESENT).unwrap().build().unwrap();
        let times: Vec<f64> = scene.actions.iter().map(|(at, _)| *at).collect();
        assert_eq!(times, vec![0.0, 0.1, 0.2]);
        assert_eq!(scene.actions[0].1, ControlCall::Update(0.25));
        assert_eq!(scene.actions[2].1, ControlCall::Finish { animated: true });
    }

    #[test]
    fn test_check_summary() {
        let summary = Scenario::from_json(PRESENT).unwrap().check().unwrap();
        insta::assert_debug_snapshot!(summary, @r###"
        ScenarioSummary {
            name: "present",
            views: 5,
            controllers: 2,
            actions: 3,
            claimable: true,
        }
        "###);
    }

    #[test]
    fn test_unknown_names_are_reported() {
        let mut scenario = Scenario::from_json(PRESENT).unwrap();
        scenario.views[1].parent = Some("nowhere".to_string());
        assert_eq!(
            scenario.build().unwrap_err(),
            ScenarioError::UnknownView("nowhere".to_string())
        );

        let mut scenario = Scenario::from_json(PRESENT).unwrap();
        scenario.transition.to = "settings".to_string();
        assert_eq!(
            scenario.build().unwrap_err(),
            ScenarioError::UnknownController("settings".to_string())
        );
    }

    #[test]
    fn test_duplicate_and_reserved_names() {
        let mut scenario = Scenario::from_json(PRESENT).unwrap();
        scenario.views[3].name = "home".to_string();
        assert_eq!(
            scenario.build().unwrap_err(),
            ScenarioError::DuplicateName("home".to_string())
        );

        let mut scenario = Scenario::from_json(PRESENT).unwrap();
        scenario.views[0].name = WINDOW.to_string();
        assert!(matches!(scenario.build(), Err(ScenarioError::DuplicateName(_))));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut scenario = Scenario::from_json(PRESENT).unwrap();
        scenario.views[2].alpha = Some(1.5);
        assert!(matches!(scenario.build(), Err(ScenarioError::Invalid(_))));

        let mut scenario = Scenario::from_json(PRESENT).unwrap();
        scenario.views[2].frame.width = -1.0;
        assert!(matches!(scenario.build(), Err(ScenarioError::Invalid(_))));

        let mut scenario = Scenario::from_json(PRESENT).unwrap();
        scenario.actions[0].at = -0.5;
        assert!(matches!(scenario.build(), Err(ScenarioError::Invalid(_))));
    }

    #[test]
    fn test_disabled_controller_is_not_claimable() {
        let mut scenario = Scenario::from_json(PRESENT).unwrap();
        scenario.controllers[1].motion_enabled = false;
        assert!(!scenario.check().unwrap().claimable);
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            Scenario::from_json("{ \"views\": 3 }"),
            Err(ScenarioError::Parse(_))
        ));
    }

    #[test]
    fn test_load_names_scenario_after_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unnamed.json");
        let json = PRESENT.replacen("\"name\": \"present\",", "", 1);
        fs::write(&path, json).unwrap();
        assert_eq!(Scenario::load(&path).unwrap().name, "unnamed");

        let missing = Scenario::load(dir.path().join("missing.json"));
        assert!(matches!(missing, Err(ScenarioError::Io { .. })));
    }
}
