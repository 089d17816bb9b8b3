use std::time::Instant;

/// 一帧的时间信息
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameTime {
    /// 自计时器启动（或重置）以来的秒数
    pub elapsed_seconds: f64,
    /// 距上一帧的秒数，不会为负
    pub delta_seconds: f32,
}

/// 单调计时器
#[derive(Debug, Clone)]
pub struct Timer {
    start: Instant,
    last_elapsed: f64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            last_elapsed: 0.0,
        }
    }

    pub fn elapsed(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    /// 从零重新计时
    pub fn reset(&mut self) {
        self.start = Instant::now();
        self.last_elapsed = 0.0;
    }

    /// 读取当前时间并开始新的一帧
    pub fn tick(&mut self) -> FrameTime {
        let now = self.elapsed();
        self.tick_at(now)
    }

    /// 以给定的时间点开始新的一帧
    pub fn tick_at(&mut self, elapsed_seconds: f64) -> FrameTime {
        let delta_seconds = (elapsed_seconds - self.last_elapsed).max(0.0) as f32;
        self.last_elapsed = elapsed_seconds;
        FrameTime {
            elapsed_seconds,
            delta_seconds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_deltas() {
        let mut timer = Timer::new();
        let first = timer.tick_at(0.5);
        assert_eq!(first.delta_seconds, 0.5);
        let second = timer.tick_at(0.75);
        assert_eq!(second.elapsed_seconds, 0.75);
        assert_eq!(second.delta_seconds, 0.25);
    }

    #[test]
    fn test_delta_never_negative() {
        let mut timer = Timer::new();
        timer.tick_at(2.0);
        assert_eq!(timer.tick_at(1.0).delta_seconds, 0.0);
    }

    #[test]
    fn test_reset() {
        let mut timer = Timer::new();
        timer.tick_at(10.0);
        timer.reset();
        assert!(timer.elapsed() < 1.0);
        assert!(timer.tick().delta_seconds < 1.0);
    }
}
