//! 并行粒子物理
//!
//! 物理线程与渲染线程以锁步方式交替推进：物理线程计算第 N+1 帧的同时，
//! 渲染线程绘制第 N 帧。两者共享一把互斥锁和两个条件变量。
//!
//! ## 架构设计
//!
//! ```text
//! ┌─────────────────┐                 ┌─────────────────┐
//! │  Render Thread  │                 │  Physics Thread │
//! │                 │   physics_done  │                 │
//! │ wait p > d      │◄────────────────│ p += 1, step    │
//! │ publish t, dt   │                 │                 │
//! │ d += 1, read    │────────────────►│ wait p <= d     │
//! │                 │    draw_done    │                 │
//! └─────────────────┘                 └─────────────────┘
//! ```
//!
//! 静止时 `physics_frame - draw_frame` 只可能是 0 或 1。所有等待都带超时，
//! 关闭标志置位后双方都不再阻塞。
//!
//! ## 使用示例
//!
//! ```ignore
//! let mut thread = PhysicsThread::spawn(ParticleWorld::new(&config), timeout)?;
//! let count = thread.frame(t, dt, |world| world.store.active_count());
//! thread.shutdown();
//! ```

use super::particle_store::ParticleStore;
use super::stepper::{ParticleStepper, StepReport};
use crate::config::ParticleConfig;
use crate::core::error::{DemoError, DemoResult};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// 渲染线程发布给物理线程的帧时钟
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameClock {
    /// 帧时间（秒）
    pub t: f64,
    /// 帧增量（秒）
    pub dt: f32,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self { t: 0.0, dt: 0.001 }
    }
}

/// 帧计数器快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameCounters {
    /// 物理线程已开始的帧数
    pub physics_frame: u64,
    /// 渲染线程已开始的帧数
    pub draw_frame: u64,
}

/// 粒子世界：存储加步进器
pub struct ParticleWorld {
    pub store: ParticleStore,
    pub stepper: ParticleStepper,
}

impl ParticleWorld {
    pub fn new(config: &ParticleConfig) -> Self {
        Self {
            store: ParticleStore::with_capacity(config.max_particles),
            stepper: ParticleStepper::new(config),
        }
    }

    /// 推进一帧
    pub fn step(&mut self, clock: FrameClock) -> StepReport {
        self.stepper.step(&mut self.store, clock.t, clock.dt)
    }
}

struct SyncState {
    counters: FrameCounters,
    clock: FrameClock,
    shutdown: bool,
    world: ParticleWorld,
}

/// 帧同步器
pub struct FrameSynchronizer {
    state: Mutex<SyncState>,
    physics_done: Condvar,
    draw_done: Condvar,
    timeout: Duration,
}

impl FrameSynchronizer {
    /// 创建同步器，`timeout` 为单次等待的上限
    pub fn new(world: ParticleWorld, timeout: Duration) -> Self {
        Self {
            state: Mutex::new(SyncState {
                counters: FrameCounters::default(),
                clock: FrameClock::default(),
                shutdown: false,
                world,
            }),
            physics_done: Condvar::new(),
            draw_done: Condvar::new(),
            timeout,
        }
    }

    // 另一方持锁时崩溃不影响继续使用粒子数据
    fn lock(&self) -> MutexGuard<'_, SyncState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 渲染侧：等待物理帧就绪，发布新时钟，然后在锁内读取粒子
    ///
    /// 关闭后不再等待，直接读取当前状态。
    pub fn render_frame<R, F>(&self, t: f64, dt: f32, read: F) -> R
    where
        F: FnOnce(&ParticleWorld) -> R,
    {
        let mut state = self.lock();
        while !state.shutdown && state.counters.physics_frame <= state.counters.draw_frame {
            let (guard, _) = self
                .physics_done
                .wait_timeout(state, self.timeout)
                .unwrap_or_else(PoisonError::into_inner);
            state = guard;
        }

        state.clock = FrameClock { t, dt };
        state.counters.draw_frame += 1;
        let result = read(&state.world);
        drop(state);

        self.draw_done.notify_one();
        result
    }

    /// 物理侧：等待上一帧绘制开始，然后用已发布的时钟推进一帧
    ///
    /// 已关闭时返回 `None`。
    pub fn run_physics_step(&self) -> Option<StepReport> {
        let mut state = self.lock();
        while !state.shutdown && state.counters.physics_frame > state.counters.draw_frame {
            let (guard, _) = self
                .draw_done
                .wait_timeout(state, self.timeout)
                .unwrap_or_else(PoisonError::into_inner);
            state = guard;
        }
        if state.shutdown {
            return None;
        }

        state.counters.physics_frame += 1;
        let clock = state.clock;
        let report = state.world.step(clock);
        drop(state);

        self.physics_done.notify_one();
        Some(report)
    }

    /// 置位关闭标志并唤醒双方
    pub fn request_shutdown(&self) {
        self.lock().shutdown = true;
        self.physics_done.notify_all();
        self.draw_done.notify_all();
    }

    pub fn is_shutdown(&self) -> bool {
        self.lock().shutdown
    }

    pub fn counters(&self) -> FrameCounters {
        self.lock().counters
    }

    /// 最近一次发布的帧时钟
    pub fn clock(&self) -> FrameClock {
        self.lock().clock
    }
}

/// 物理线程退出（包括崩溃）时置位关闭标志
struct ShutdownOnExit(Arc<FrameSynchronizer>);

impl Drop for ShutdownOnExit {
    fn drop(&mut self) {
        self.0.request_shutdown();
    }
}

/// 独立物理线程
pub struct PhysicsThread {
    sync: Arc<FrameSynchronizer>,
    handle: Option<JoinHandle<()>>,
}

impl PhysicsThread {
    /// 启动物理线程
    pub fn spawn(world: ParticleWorld, timeout: Duration) -> DemoResult<Self> {
        let sync = Arc::new(FrameSynchronizer::new(world, timeout));
        let guard = ShutdownOnExit(sync.clone());

        let handle = thread::Builder::new()
            .name("particle-physics".to_string())
            .spawn(move || {
                let guard = guard;
                tracing::debug!(target: "physics", "Physics thread started");
                let mut frames = 0u64;
                while guard.0.run_physics_step().is_some() {
                    frames += 1;
                }
                tracing::debug!(target: "physics", frames, "Physics thread stopped");
            })
            .map_err(|e| DemoError::Thread(format!("Failed to spawn physics thread: {}", e)))?;

        Ok(Self {
            sync,
            handle: Some(handle),
        })
    }

    pub fn synchronizer(&self) -> &Arc<FrameSynchronizer> {
        &self.sync
    }

    /// 渲染一帧，见 [`FrameSynchronizer::render_frame`]
    pub fn frame<R, F>(&self, t: f64, dt: f32, read: F) -> R
    where
        F: FnOnce(&ParticleWorld) -> R,
    {
        self.sync.render_frame(t, dt, read)
    }

    /// 请求关闭并等待线程退出
    pub fn shutdown(&mut self) {
        self.sync.request_shutdown();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!(target: "physics", "Physics thread panicked");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().map_or(false, |h| !h.is_finished())
    }
}

impl Drop for PhysicsThread {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// 粒子模拟：单线程内联或独立物理线程
pub enum ParticleSimulation {
    Inline(ParticleWorld),
    Threaded(PhysicsThread),
}

impl ParticleSimulation {
    /// 按配置创建
    pub fn from_config(config: &ParticleConfig) -> DemoResult<Self> {
        let world = ParticleWorld::new(config);
        if config.multithreaded {
            let timeout = Duration::from_millis(config.sync_timeout_ms);
            Ok(Self::Threaded(PhysicsThread::spawn(world, timeout)?))
        } else {
            Ok(Self::Inline(world))
        }
    }

    /// 推进（或等待）一帧并读取粒子状态
    ///
    /// 内联模式先用本帧时钟推进再读取；线程模式读取物理线程用上一帧时钟
    /// 算好的结果。
    pub fn frame<R, F>(&mut self, t: f64, dt: f32, read: F) -> R
    where
        F: FnOnce(&ParticleWorld) -> R,
    {
        match self {
            Self::Inline(world) => {
                world.step(FrameClock { t, dt });
                read(world)
            }
            Self::Threaded(thread) => thread.frame(t, dt, read),
        }
    }

    pub fn is_threaded(&self) -> bool {
        matches!(self, Self::Threaded(_))
    }

    /// 停止物理线程（内联模式无操作）
    pub fn shutdown(&mut self) {
        if let Self::Threaded(thread) = self {
            thread.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn test_config() -> ParticleConfig {
        ParticleConfig {
            max_particles: 200,
            seed: Some(42),
            ..Default::default()
        }
    }

    #[test]
    fn test_counters_stay_in_lockstep() {
        let config = test_config();
        let mut thread =
            PhysicsThread::spawn(ParticleWorld::new(&config), Duration::from_millis(20)).unwrap();

        let dt = 1.0 / 60.0;
        for frame in 0..100u64 {
            thread.frame(frame as f64 * dt as f64, dt, |_| ());
            let counters = thread.synchronizer().counters();
            assert_eq!(counters.draw_frame, frame + 1);
            let lead = counters.physics_frame - counters.draw_frame;
            assert!(lead <= 1, "physics ran {} frames ahead", lead);
        }

        thread.shutdown();
        assert!(!thread.is_running());
    }

    #[test]
    fn test_physics_uses_published_clock() {
        let config = test_config();
        let sync = FrameSynchronizer::new(ParticleWorld::new(&config), Duration::from_millis(10));

        // 首帧使用默认时钟
        let report = sync.run_physics_step().unwrap();
        assert!(report.substeps > 0);

        sync.render_frame(5.0, 0.25, |_| ());
        sync.run_physics_step().unwrap();

        let simulated = sync.render_frame(5.25, 0.25, |world| world.stepper.stats().simulated_seconds);
        assert!((simulated - 0.251).abs() < 1e-6);
        assert_eq!(sync.clock(), FrameClock { t: 5.25, dt: 0.25 });
        assert_eq!(
            sync.counters(),
            FrameCounters {
                physics_frame: 2,
                draw_frame: 2
            }
        );
    }

    #[test]
    fn test_shutdown_releases_waiting_renderer() {
        let config = test_config();
        let sync = Arc::new(FrameSynchronizer::new(
            ParticleWorld::new(&config),
            Duration::from_millis(10),
        ));

        // 没有物理线程，渲染侧只能靠关闭标志脱离等待
        let stopper = {
            let sync = sync.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(50));
                sync.request_shutdown();
            })
        };

        let start = Instant::now();
        sync.render_frame(0.0, 0.016, |_| ());
        stopper.join().unwrap();

        assert!(sync.is_shutdown());
        assert!(start.elapsed() < Duration::from_secs(5));
        assert!(sync.run_physics_step().is_none());
    }

    #[test]
    fn test_shutdown_joins_thread() {
        let config = test_config();
        let mut simulation = ParticleSimulation::from_config(&config).unwrap();
        assert!(simulation.is_threaded());

        for i in 0..10 {
            simulation.frame(i as f64 * 0.016, 0.016, |_| ());
        }

        let start = Instant::now();
        simulation.shutdown();
        assert!(start.elapsed() < Duration::from_secs(5));

        // 关闭后渲染不再阻塞
        let active = simulation.frame(1.0, 0.016, |world| world.store.active_count());
        assert!(active <= config.max_particles);
    }

    #[test]
    fn test_inline_simulation_steps_each_frame() {
        let config = ParticleConfig {
            multithreaded: false,
            ..test_config()
        };
        let mut simulation = ParticleSimulation::from_config(&config).unwrap();
        assert!(!simulation.is_threaded());

        let mut t = 0.0;
        let mut active = 0;
        for _ in 0..60 {
            active = simulation.frame(t, 1.0 / 60.0, |world| world.store.active_count());
            t += 1.0 / 60.0;
        }

        // 1 秒，出生间隔 0.04 秒
        assert!(active >= 24 && active <= 26);
        simulation.shutdown();
    }
}
