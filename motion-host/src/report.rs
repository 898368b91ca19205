//! # Report 模块
//!
//! 一次场景运行的结果：事件流、最终状态、命名视图的最终几何，可选逐帧记录。

use std::collections::BTreeMap;

use motion_runtime::{Rect, TransitionEvent, TransitionState};
use serde::Serialize;

/// 运行报告
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub scenario: String,
    /// 过渡请求是否被认领
    pub claimed: bool,
    /// `Completed` 事件携带的结果，未完成时为空
    pub finished: Option<bool>,
    /// 达到帧数上限仍未结束
    pub timed_out: bool,
    pub frames: u32,
    /// 运行结束时的媒体时间（秒）
    pub elapsed: f64,
    /// 运行期间观察到的最大总时长
    pub total_duration: f64,
    pub final_state: TransitionState,
    pub events: Vec<EventRecord>,
    pub views: BTreeMap<String, ViewReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_log: Option<Vec<FrameRecord>>,
}

/// 带时间戳的事件
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRecord {
    pub frame: u32,
    pub time: f64,
    pub event: TransitionEvent,
}

/// 命名视图的最终状态
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewReport {
    /// 父视图名；父视图没有名字时为其 id
    pub parent: Option<String>,
    pub frame: Rect,
    pub alpha: f64,
    pub hidden: bool,
}

/// 单帧记录
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameRecord {
    pub frame: u32,
    pub time: f64,
    pub state: TransitionState,
    pub progress: f64,
}

impl Report {
    pub fn new(scenario: impl Into<String>, record_frames: bool) -> Self {
        Self {
            scenario: scenario.into(),
            claimed: false,
            finished: None,
            timed_out: false,
            frames: 0,
            elapsed: 0.0,
            total_duration: 0.0,
            final_state: TransitionState::Possible,
            events: Vec::new(),
            views: BTreeMap::new(),
            frame_log: record_frames.then(Vec::new),
        }
    }

    /// 追加一批事件
    pub fn record_events(&mut self, frame: u32, time: f64, events: Vec<TransitionEvent>) {
        for event in events {
            if let TransitionEvent::Completed { finished } = event {
                self.finished = Some(finished);
            }
            self.events.push(EventRecord { frame, time, event });
        }
    }

    pub fn record_frame(&mut self, record: FrameRecord) {
        if let Some(log) = self.frame_log.as_mut() {
            log.push(record);
        }
    }

    /// 只看事件本身
    pub fn event_kinds(&self) -> Vec<&TransitionEvent> {
        self.events.iter().map(|r| &r.event).collect()
    }

    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use motion_runtime::HookScope;

    #[test]
    fn test_completed_event_sets_result() {
        let mut report = Report::new("demo", false);
        report.record_events(
            3,
            0.05,
            vec![
                TransitionEvent::Completed { finished: false },
                TransitionEvent::DidCancel(HookScope::Transition),
            ],
        );
        assert_eq!(report.finished, Some(false));
        assert_eq!(report.events.len(), 2);
        assert_eq!(report.events[1].frame, 3);
    }

    #[test]
    fn test_frame_log_only_when_enabled() {
        let record = FrameRecord {
            frame: 1,
            time: 0.0,
            state: TransitionState::Starting,
            progress: 0.0,
        };
        let mut quiet = Report::new("demo", false);
        quiet.record_frame(record.clone());
        assert!(quiet.frame_log.is_none());
        assert!(!quiet.to_json(false).unwrap().contains("frame_log"));

        let mut verbose = Report::new("demo", true);
        verbose.record_frame(record);
        assert_eq!(verbose.frame_log.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn test_json_shape() {
        let mut report = Report::new("demo", false);
        report.record_events(0, 0.0, vec![TransitionEvent::ProgressUpdated(0.5)]);
        let value: serde_json::Value = serde_json::from_str(&report.to_json(true).unwrap()).unwrap();
        assert_eq!(value["scenario"], "demo");
        assert_eq!(value["final_state"], "Possible");
        assert_eq!(value["events"][0]["event"]["ProgressUpdated"], 0.5);
    }
}
