// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Scheduler implementation
//!
//! Preemptive round-robin scheduler, one instance per logical processor.
//!
//! # Queues
//!
//! - **ready**: runnable threads in rotation order. The running thread stays
//!   in this list until it delays or is killed.
//! - **delayed**: sleeping threads ordered by absolute wake tick.
//! - **suspended**: threads parked without a deadline.
//!
//! All of it sits behind one [`SpinMutex`], so the owning core's interrupt
//! handlers and a remote core's `undelay` never observe a half-moved thread.
//!
//! # Switching
//!
//! Nothing here switches stacks. `on_system_tick` and `yield_thread` take the
//! interrupted context and return the one to resume; voluntary operations
//! (`delay`, killing the running thread) queue a yield DPC and the switch
//! happens on the way out of the core-notification interrupt.

use alloc::collections::VecDeque;
use alloc::sync::{Arc, Weak};
use alloc::vec::Vec;
use core::sync::atomic::{AtomicBool, Ordering};

use super::state::{DelayedQueue, ThreadScheduleEntry, ThreadState, WaitKind};
use super::thread::{Thread, ThreadId};
use crate::error::{KernelError, KernelResult};
use crate::interrupt::{Dpc, IrqDispatcher, IrqHandler, SystemIrq};
use crate::kernel::Kernel;
use crate::sync::SpinMutex;
use crate::time::TimeSpan;
use crate::traits::{ChipControl, Context};

/// Queue state guarded by the scheduler lock
struct RunQueues {
    ready: VecDeque<Arc<Thread>>,
    delayed: DelayedQueue,
    suspended: Vec<Arc<Thread>>,
    running: Option<Arc<Thread>>,
    tick_count: u64,
}

impl RunQueues {
    const fn new() -> Self {
        Self {
            ready: VecDeque::new(),
            delayed: DelayedQueue::new(),
            suspended: Vec::new(),
            running: None,
            tick_count: 0,
        }
    }

    fn remove_ready(&mut self, thread: &Arc<Thread>) -> bool {
        match self.ready.iter().position(|t| Arc::ptr_eq(t, thread)) {
            Some(index) => {
                self.ready.remove(index);
                true
            }
            None => false,
        }
    }

    fn remove_suspended(&mut self, thread: &Arc<Thread>) -> bool {
        match self.suspended.iter().position(|t| Arc::ptr_eq(t, thread)) {
            Some(index) => {
                self.suspended.remove(index);
                true
            }
            None => false,
        }
    }

    fn make_ready(&mut self, thread: Arc<Thread>) {
        thread.set_state(ThreadState::Ready);
        self.ready.push_back(thread);
    }

    /// Pick the next thread and return its context
    fn reschedule(&mut self, core: usize, context: Context) -> Context {
        let current = self.running.take();

        let position = current.as_ref().and_then(|current| {
            current.save_context(context);
            if current.state() == ThreadState::Running {
                current.set_state(ThreadState::Ready);
            }
            self.ready.iter().position(|t| Arc::ptr_eq(t, current))
        });

        let next = match position {
            Some(index) => self.ready.get((index + 1) % self.ready.len()),
            None => self.ready.front(),
        };
        let Some(next) = next.cloned() else {
            log::error!("sched[{}]: ready list is empty", core);
            panic!("no runnable thread on core {}", core);
        };

        next.set_state(ThreadState::Running);
        let context = next.context();
        self.running = Some(next);
        context
    }
}

/// Per-core scheduler
pub struct Scheduler {
    this: Weak<Scheduler>,
    core: usize,
    chip: Arc<dyn ChipControl>,
    dispatcher: Arc<IrqDispatcher>,
    time_slice: TimeSpan,
    idle: Arc<Thread>,
    started: AtomicBool,
    queues: SpinMutex<RunQueues>,
}

impl Scheduler {
    /// Create the scheduler for `core`, including its idle thread
    pub fn new(
        core: usize,
        chip: Arc<dyn ChipControl>,
        dispatcher: Arc<IrqDispatcher>,
        time_slice: TimeSpan,
        idle_description: &str,
    ) -> Arc<Self> {
        let idle = Thread::new(idle_entry, idle_description);
        idle.save_context(chip.initialize_thread_context(&idle));

        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            core,
            chip,
            dispatcher,
            time_slice,
            idle,
            started: AtomicBool::new(false),
            queues: SpinMutex::new(RunQueues::new()),
        })
    }

    pub fn core_id(&self) -> usize {
        self.core
    }

    pub fn time_slice(&self) -> TimeSpan {
        self.time_slice
    }

    pub fn idle_thread(&self) -> &Arc<Thread> {
        &self.idle
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    pub fn tick_count(&self) -> u64 {
        self.queues.lock(&*self.chip).tick_count
    }

    pub fn running_thread(&self) -> Option<Arc<Thread>> {
        self.queues.lock(&*self.chip).running.clone()
    }

    /// Ready thread ids in rotation order
    pub fn ready_ids(&self) -> Vec<ThreadId> {
        self.queues.lock(&*self.chip).ready.iter().map(|t| t.id()).collect()
    }

    /// Delayed thread ids in wake order
    pub fn delayed_ids(&self) -> Vec<ThreadId> {
        self.queues.lock(&*self.chip).delayed.ids()
    }

    pub fn suspended_ids(&self) -> Vec<ThreadId> {
        self.queues.lock(&*self.chip).suspended.iter().map(|t| t.id()).collect()
    }

    /// Absolute wake tick of a delayed thread
    pub fn wake_tick_of(&self, thread: &Arc<Thread>) -> Option<u64> {
        self.queues.lock(&*self.chip).delayed.wake_tick_of(thread)
    }

    /// Admit `thread` to this core's ready list
    ///
    /// Returns `false` without touching any queue if the thread is already
    /// owned by a scheduler or has terminated.
    pub fn start_thread(&self, thread: &Arc<Thread>) -> bool {
        if thread.state() == ThreadState::Terminated || !thread.claim(self.core) {
            return false;
        }

        self.queues.lock(&*self.chip).make_ready(thread.clone());
        log::debug!("sched[{}]: started thread {} '{}'", self.core, thread.id(), thread.description());
        true
    }

    /// Remove `thread` from every queue and mark it terminated
    pub fn kill_thread(&self, thread: &Arc<Thread>) -> KernelResult<()> {
        if !thread.release(self.core) {
            return Err(KernelError::InvalidOperation);
        }

        let was_running = {
            let mut queues = self.queues.lock(&*self.chip);
            queues.remove_ready(thread);
            queues.delayed.remove(thread);
            queues.remove_suspended(thread);
            thread.set_state(ThreadState::Terminated);
            queues.running.as_ref().is_some_and(|r| Arc::ptr_eq(r, thread))
        };

        log::debug!("sched[{}]: killed thread {}", self.core, thread.id());
        if was_running {
            self.request_yield();
        }
        Ok(())
    }

    /// Suspend the running thread for `span`
    ///
    /// - negative: `ArgumentOutOfRange`, nothing changes
    /// - zero: the thread stays ready and only a reschedule is requested
    /// - `INFINITE`: parked until [`undelay`](Self::undelay)
    /// - otherwise: ready again after `ceil(span / time_slice)` ticks, at
    ///   least one
    pub fn delay(&self, span: TimeSpan) -> KernelResult<()> {
        if span.is_negative() {
            return Err(KernelError::ArgumentOutOfRange);
        }

        if !span.is_zero() {
            let mut queues = self.queues.lock(&*self.chip);
            let Some(current) = queues.running.clone() else {
                log::error!("sched[{}]: delay without a running thread", self.core);
                panic!("delay called with no running thread on core {}", self.core);
            };
            queues.remove_ready(&current);

            if span.is_infinite() {
                current.set_state(ThreadState::Wait(WaitKind::Infinite));
                queues.suspended.push(current);
            } else {
                let ticks = span.ticks_ceil(self.time_slice).unwrap_or(u64::MAX).max(1);
                let wake_tick = queues.tick_count.saturating_add(ticks);
                current.set_state(ThreadState::Wait(WaitKind::Timed));
                log::trace!("sched[{}]: thread {} sleeps until tick {}", self.core, current.id(), wake_tick);
                queues.delayed.insert(ThreadScheduleEntry {
                    thread: current,
                    wake_tick,
                });
            }
        }

        self.request_yield();
        Ok(())
    }

    /// Make a delayed or suspended thread ready
    pub fn undelay(&self, thread: &Arc<Thread>) -> bool {
        let mut queues = self.queues.lock(&*self.chip);
        let woken = queues.delayed.remove(thread) || queues.remove_suspended(thread);
        if woken {
            queues.make_ready(thread.clone());
        } else {
            log::warn!("sched[{}]: undelay of thread {} which is not waiting", self.core, thread.id());
        }
        woken
    }

    /// Save `context` into the running thread and pick the next one
    pub fn yield_thread(&self, context: Context) -> Context {
        self.queues.lock(&*self.chip).reschedule(self.core, context)
    }

    /// Periodic tick: wake due sleepers, then rotate
    pub fn on_system_tick(&self, context: Context) -> Context {
        let mut queues = self.queues.lock(&*self.chip);
        queues.tick_count += 1;
        let tick = queues.tick_count;

        while let Some(entry) = queues.delayed.pop_due(tick) {
            log::trace!("sched[{}]: tick {} wakes thread {}", self.core, tick, entry.thread.id());
            queues.make_ready(entry.thread);
        }

        queues.reschedule(self.core, context)
    }

    /// Prepare this core for scheduling and return the first context
    ///
    /// Starts the idle thread, makes the ready head the running thread,
    /// installs the tick handler and arms the timer. Fails with
    /// `InvalidOperation` on a second call.
    pub fn bootstrap(&self) -> KernelResult<Context> {
        if self.started.swap(true, Ordering::AcqRel) {
            return Err(KernelError::InvalidOperation);
        }

        self.start_thread(&self.idle);

        let context = {
            let mut queues = self.queues.lock(&*self.chip);
            let Some(first) = queues.ready.front().cloned() else {
                return Err(KernelError::InvalidOperation);
            };
            first.set_state(ThreadState::Running);
            let context = first.context();
            queues.running = Some(first);
            context
        };

        let this = self.this.clone();
        let on_tick: IrqHandler = Arc::new(move |context| match this.upgrade() {
            Some(scheduler) => scheduler.on_system_tick(context),
            None => context,
        });
        self.dispatcher.register_system_irq(SystemIrq::SystemTick, on_tick);
        self.chip.setup_system_timer(self.time_slice);

        log::debug!("sched[{}]: bootstrapped, slice {} ns", self.core, self.time_slice.as_nanos());
        Ok(context)
    }

    /// Bootstrap and enter the first thread; never returns
    pub fn start(&self) -> ! {
        match self.bootstrap() {
            Ok(context) => self.chip.start_schedule(context),
            Err(err) => {
                log::error!("sched[{}]: cannot start: {}", self.core, err);
                panic!("scheduler start failed on core {}: {}", self.core, err);
            }
        }
    }

    /// Queue a DPC that reschedules on interrupt return
    fn request_yield(&self) {
        let this = self.this.clone();
        self.dispatcher.register_dpc(Dpc::new(move |context| match this.upgrade() {
            Some(scheduler) => scheduler.yield_thread(context),
            None => context,
        }));
    }
}

fn idle_entry(_: &Kernel, _: usize) -> KernelResult<()> {
    loop {
        core::hint::spin_loop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Harness;

    #[test]
    fn test_bootstrap_runs_ready_head() {
        let mut harness = Harness::new(1);
        let worker = harness.spawn("worker");
        harness.bootstrap();

        let scheduler = harness.scheduler();
        assert!(scheduler.is_started());
        assert_eq!(harness.running().id(), worker.id());
        assert_eq!(harness.context, worker.context());
        assert_eq!(worker.state(), ThreadState::Running);
        assert_eq!(scheduler.ready_ids(), [worker.id(), scheduler.idle_thread().id()]);
        assert_eq!(harness.chip.timer_slice(), Some(scheduler.time_slice()));
    }

    #[test]
    fn test_second_bootstrap_fails() {
        let mut harness = Harness::new(1);
        harness.bootstrap();
        assert_eq!(
            harness.scheduler().bootstrap().unwrap_err(),
            KernelError::InvalidOperation
        );
    }

    #[test]
    fn test_only_idle_runs_without_threads() {
        let mut harness = Harness::new(1);
        harness.bootstrap();

        let idle = harness.scheduler().idle_thread().clone();
        for _ in 0..3 {
            harness.tick();
            assert_eq!(harness.running().id(), idle.id());
        }
        assert_eq!(harness.scheduler().tick_count(), 3);
    }

    #[test]
    fn test_tick_saves_context_and_rotates() {
        let mut harness = Harness::new(1);
        let a = harness.spawn("a");
        let b = harness.spawn("b");
        harness.bootstrap();

        let interrupted = Context(0xdead);
        harness.context = interrupted;
        harness.tick();

        assert_eq!(a.context(), interrupted);
        assert_eq!(a.state(), ThreadState::Ready);
        assert_eq!(harness.running().id(), b.id());
        assert_eq!(harness.context, b.context());
    }

    #[test]
    fn test_start_thread_twice_is_noop() {
        let harness = Harness::new(1);
        let thread = harness.spawn("t");

        assert!(!harness.scheduler().start_thread(&thread));
        assert_eq!(harness.scheduler().ready_ids(), [thread.id()]);
    }

    #[test]
    fn test_negative_delay_changes_nothing() {
        let mut harness = Harness::new(1);
        let a = harness.spawn("a");
        harness.bootstrap();

        let ready = harness.scheduler().ready_ids();
        assert_eq!(
            harness.kernel.delay(TimeSpan::from_millis(-1)).unwrap_err(),
            KernelError::ArgumentOutOfRange
        );
        assert_eq!(harness.scheduler().ready_ids(), ready);
        assert_eq!(a.state(), ThreadState::Running);
        assert_eq!(harness.kernel.current_processor().dispatcher().pending_dpcs(), 0);
    }

    #[test]
    fn test_delay_rounds_up_to_whole_ticks() {
        let mut harness = Harness::new(1);
        let a = harness.spawn("a");
        harness.bootstrap();
        harness.tick();
        harness.tick();
        assert_eq!(harness.running().id(), a.id());

        // 10 ms slice: 25 ms is three ticks
        harness.kernel.delay(TimeSpan::from_millis(25)).unwrap();

        let scheduler = harness.scheduler();
        assert_eq!(scheduler.wake_tick_of(&a), Some(2 + 3));
        assert_eq!(a.state(), ThreadState::Wait(WaitKind::Timed));
        assert!(!scheduler.ready_ids().contains(&a.id()));
    }

    #[test]
    fn test_short_delay_waits_at_least_one_tick() {
        let mut harness = Harness::new(1);
        let a = harness.spawn("a");
        harness.bootstrap();

        harness.kernel.delay(TimeSpan::from_nanos(1)).unwrap();
        assert_eq!(harness.scheduler().wake_tick_of(&a), Some(1));

        harness.notify();
        assert_ne!(harness.running().id(), a.id());

        // Woken onto the ready tail, right behind the idle thread
        harness.tick();
        assert!(harness.scheduler().delayed_ids().is_empty());
        assert_eq!(harness.running().id(), a.id());
    }

    #[test]
    fn test_infinite_delay_suspends_until_undelay() {
        let mut harness = Harness::new(1);
        let a = harness.spawn("a");
        harness.bootstrap();

        harness.kernel.delay(TimeSpan::INFINITE).unwrap();
        harness.notify();

        let scheduler = harness.scheduler();
        assert_eq!(scheduler.suspended_ids(), [a.id()]);
        assert_eq!(a.state(), ThreadState::Wait(WaitKind::Infinite));

        for _ in 0..5 {
            harness.tick();
        }
        assert_eq!(a.state(), ThreadState::Wait(WaitKind::Infinite));

        assert!(scheduler.undelay(&a));
        assert!(scheduler.suspended_ids().is_empty());
        assert_eq!(a.state(), ThreadState::Ready);
        assert_eq!(scheduler.ready_ids().last(), Some(&a.id()));
    }

    #[test]
    fn test_undelay_of_ready_thread_is_false() {
        let harness = Harness::new(1);
        let a = harness.spawn("a");

        assert!(!harness.scheduler().undelay(&a));
        assert_eq!(harness.scheduler().ready_ids(), [a.id()]);
    }

    #[test]
    fn test_kill_running_thread_yields() {
        let mut harness = Harness::new(1);
        let a = harness.spawn("a");
        let b = harness.spawn("b");
        harness.bootstrap();

        harness.scheduler().kill_thread(&a).unwrap();
        assert_eq!(a.state(), ThreadState::Terminated);
        assert_eq!(a.owner(), None);

        harness.notify();
        assert_eq!(harness.running().id(), b.id());
        assert!(!harness.scheduler().ready_ids().contains(&a.id()));
    }

    #[test]
    fn test_kill_requires_ownership() {
        let harness = Harness::new(1);
        let a = harness.spawn("a");
        let scheduler = harness.scheduler();

        scheduler.kill_thread(&a).unwrap();
        assert_eq!(scheduler.kill_thread(&a).unwrap_err(), KernelError::InvalidOperation);
        // A terminated thread is not admitted again
        assert!(!scheduler.start_thread(&a));
    }

    #[test]
    fn test_kill_delayed_thread() {
        let mut harness = Harness::new(1);
        let a = harness.spawn("a");
        harness.bootstrap();

        harness.kernel.delay(TimeSpan::from_millis(50)).unwrap();
        harness.notify();
        harness.scheduler().kill_thread(&a).unwrap();

        assert!(harness.scheduler().delayed_ids().is_empty());
        for _ in 0..10 {
            harness.tick();
        }
        assert_eq!(a.state(), ThreadState::Terminated);
    }
}
