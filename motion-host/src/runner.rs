//! # Runner 模块
//!
//! 固定帧率的无界面帧循环：构建场景、认领过渡、按时间触发控制调用、逐帧推进引擎，
//! 直到过渡结束且没有待触发的调用（或达到帧数上限）。
//!
//! 每一帧先触发到期的控制调用，再推进一帧。时间为 0 的调用因此发生在
//! 动画构建之前，会被引擎记下并在动画开始时生效。

use motion_runtime::{DelayQueue, MotionTransition, PluginRegistry, ViewId};
use tracing::{debug, info, warn};

use crate::config::HostConfig;
use crate::error::ScenarioError;
use crate::report::{FrameRecord, Report, ViewReport};
use crate::scenario::{ControlCall, Scenario, Scene};

/// 场景运行器
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    config: HostConfig,
    registry: PluginRegistry,
}

impl ScenarioRunner {
    pub fn new(config: HostConfig) -> Self {
        Self {
            config,
            registry: PluginRegistry::new(),
        }
    }

    /// 使用自定义插件注册表
    pub fn with_registry(mut self, registry: PluginRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// 运行一个场景
    pub fn run(&self, scenario: &Scenario) -> Result<Report, ScenarioError> {
        let mut scene = scenario.build()?;
        let options = scenario
            .options
            .clone()
            .unwrap_or_else(|| self.config.transition.clone());
        let mut transition = MotionTransition::new(options, self.registry.clone());
        let mut report = Report::new(&scenario.name, self.config.report.record_frames);
        info!(
            scenario = %scenario.name,
            frame_rate = self.config.frame_rate,
            plugins = ?self.registry.enabled_type_names(),
            "运行场景"
        );

        let mut pending = DelayQueue::new();
        for (at, call) in std::mem::take(&mut scene.actions) {
            pending.schedule(at, call);
        }

        report.claimed = transition.transition(&mut scene.tree, scene.request.clone());
        if !report.claimed {
            warn!(scenario = %scenario.name, "过渡请求未被认领");
            self.finish_report(&mut report, &transition, &scene, 0);
            return Ok(report);
        }

        let dt = self.config.frame_duration();
        let mut frame = 0;
        loop {
            let now = scene.tree.current_time();
            for call in pending.drain_due(now) {
                debug!(?call, time = now, "触发控制调用");
                call.dispatch(&mut transition, &mut scene.tree);
            }
            report.record_events(frame, now, transition.drain_events());

            if !transition.is_transitioning() && pending.is_empty() {
                break;
            }
            if frame >= self.config.max_frames {
                warn!(frame, state = ?transition.state(), "达到帧数上限，停止运行");
                report.timed_out = true;
                break;
            }

            frame += 1;
            let events = transition.tick(&mut scene.tree, dt);
            let now = scene.tree.current_time();
            report.record_events(frame, now, events);
            report.total_duration = report.total_duration.max(transition.total_duration());
            report.record_frame(FrameRecord {
                frame,
                time: now,
                state: transition.state(),
                progress: transition.progress(),
            });
        }

        info!(
            frames = frame,
            finished = ?report.finished,
            timed_out = report.timed_out,
            "场景结束"
        );
        self.finish_report(&mut report, &transition, &scene, frame);
        Ok(report)
    }

    fn finish_report(
        &self,
        report: &mut Report,
        transition: &MotionTransition,
        scene: &Scene,
        frames: u32,
    ) {
        report.frames = frames;
        report.elapsed = scene.tree.current_time();
        report.final_state = transition.state();

        let window = scene.tree.window();
        for (name, &id) in &scene.views {
            if id == window {
                continue;
            }
            let Some(node) = scene.tree.view(id) else {
                continue;
            };
            let parent = scene.tree.superview(id).map(|p| parent_name(scene, p));
            report.views.insert(
                name.clone(),
                ViewReport {
                    parent,
                    frame: scene.tree.frame(id),
                    alpha: node.alpha(),
                    hidden: node.is_hidden,
                },
            );
        }
    }
}

fn parent_name(scene: &Scene, id: ViewId) -> String {
    scene
        .view_name(id)
        .map(str::to_string)
        .unwrap_or_else(|| id.to_string())
}
