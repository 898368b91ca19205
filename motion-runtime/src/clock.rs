//! # Clock 模块
//!
//! 帧驱动的进度推进器与一次性延迟任务队列。
//!
//! 引擎不持有真实时钟：宿主每帧调用 `tick(dt)`，这里的两个结构都只按传入的
//! 时间推进，因此在测试中完全确定。

use serde::Serialize;

/// 一帧（120Hz）的时长；剩余时间低于它视为已完成
pub const FRAME_EPSILON: f64 = 1.0 / 120.0;

/// 推进一帧的结果
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum RunnerStep {
    /// 未运行
    Idle,
    /// 新的进度
    Progress(f64),
    /// 到达终点（反向时为起点）
    Complete { finished: bool },
}

/// 自动进度推进器
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProgressRunner {
    running: bool,
    reversed: bool,
    duration: f64,
    current_time: f64,
}

impl ProgressRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 `progress` 开始，以 `duration` 秒走完全程
    pub fn start(&mut self, progress: f64, duration: f64, reversed: bool) {
        self.running = true;
        self.reversed = reversed;
        self.duration = duration;
        self.current_time = progress * duration;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// 推进 `dt` 秒
    pub fn advance(&mut self, dt: f64) -> RunnerStep {
        if !self.running {
            return RunnerStep::Idle;
        }
        self.current_time += if self.reversed { -dt } else { dt };

        if self.reversed && self.current_time <= FRAME_EPSILON {
            self.stop();
            return RunnerStep::Complete { finished: false };
        }
        if !self.reversed && self.current_time > self.duration - FRAME_EPSILON {
            self.stop();
            return RunnerStep::Complete { finished: true };
        }
        RunnerStep::Progress(self.current_time / self.duration)
    }
}

/// 延迟任务的取消凭据
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DelayToken(u64);

#[derive(Debug, Clone)]
struct Scheduled<T> {
    due: f64,
    token: DelayToken,
    task: T,
}

/// 一次性延迟任务队列
#[derive(Debug, Clone)]
pub struct DelayQueue<T> {
    tasks: Vec<Scheduled<T>>,
    next_token: u64,
}

impl<T> Default for DelayQueue<T> {
    fn default() -> Self {
        Self {
            tasks: Vec::new(),
            next_token: 0,
        }
    }
}

impl<T> DelayQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 安排任务在 `due` 时刻（含）之后执行
    pub fn schedule(&mut self, due: f64, task: T) -> DelayToken {
        let token = DelayToken(self.next_token);
        self.next_token += 1;
        self.tasks.push(Scheduled { due, token, task });
        token
    }

    /// 取消尚未执行的任务，返回被取消的任务
    pub fn cancel(&mut self, token: DelayToken) -> Option<T> {
        let index = self.tasks.iter().position(|s| s.token == token)?;
        Some(self.tasks.remove(index).task)
    }

    /// 取出所有到期任务，按到期时间排序，同时到期的按安排顺序
    pub fn drain_due(&mut self, now: f64) -> Vec<T> {
        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.tasks.drain(..).partition(|s| s.due <= now);
        self.tasks = pending;
        due.sort_by(|a, b| a.due.total_cmp(&b.due).then(a.token.0.cmp(&b.token.0)));
        due.into_iter().map(|s| s.task).collect()
    }

    /// 最早的到期时间
    pub fn next_due(&self) -> Option<f64> {
        self.tasks.iter().map(|s| s.due).min_by(f64::total_cmp)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runner_finishes_within_one_frame_of_end() {
        let mut runner = ProgressRunner::new();
        runner.start(0.0, 1.0, false);
        assert_eq!(runner.advance(0.5), RunnerStep::Progress(0.5));
        // 剩余不足一帧
        assert_eq!(runner.advance(0.495), RunnerStep::Complete { finished: true });
        assert!(!runner.is_running());
        assert_eq!(runner.advance(0.1), RunnerStep::Idle);
    }

    #[test]
    fn test_reversed_runner_counts_down() {
        let mut runner = ProgressRunner::new();
        runner.start(0.5, 2.0, true);
        assert_eq!(runner.advance(0.5), RunnerStep::Progress(0.25));
        assert_eq!(runner.advance(0.495), RunnerStep::Complete { finished: false });
    }

    #[test]
    fn test_restart_replaces_previous_run() {
        let mut runner = ProgressRunner::new();
        runner.start(0.0, 1.0, false);
        runner.advance(0.25);
        runner.start(0.5, 4.0, true);
        assert!(runner.is_reversed());
        assert_eq!(runner.advance(1.0), RunnerStep::Progress(0.25));
    }

    #[test]
    fn test_delay_queue_orders_and_cancels() {
        let mut queue = DelayQueue::new();
        queue.schedule(0.3, "c");
        let b = queue.schedule(0.2, "b");
        queue.schedule(0.1, "a");
        queue.schedule(0.1, "a2");
        assert_eq!(queue.next_due(), Some(0.1));

        assert_eq!(queue.cancel(b), Some("b"));
        assert_eq!(queue.cancel(b), None);

        assert!(queue.drain_due(0.05).is_empty());
        assert_eq!(queue.drain_due(0.25), vec!["a", "a2"]);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.drain_due(1.0), vec!["c"]);
        assert!(queue.is_empty());
    }
}
