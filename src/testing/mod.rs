// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Testing infrastructure for host-side kernel verification
//!
//! [`SimChip`] stands in for the platform: it tracks the local interrupt
//! mask, records timer and notification requests, and mints distinct
//! contexts. [`Harness`] boots a kernel on it and plays the trap stub,
//! feeding ticks and core notifications through [`Kernel::dispatch`] and
//! carrying the resumed context from one interrupt to the next.
//!
//! # Usage
//! ```ignore
//! let mut harness = Harness::new(1);
//! let worker = harness.spawn("worker");
//! harness.bootstrap();
//! harness.tick();
//! assert_eq!(harness.running().id(), harness.scheduler().idle_thread().id());
//! ```

use alloc::sync::Arc;
use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::config::KernelConfig;
use crate::error::{KernelError, KernelResult};
use crate::interrupt::{DispatchOutcome, SystemIrq};
use crate::kernel::Kernel;
use crate::sched::{Scheduler, Thread};
use crate::time::TimeSpan;
use crate::traits::{ChipControl, Context, InterruptState};

/// Simulated chip control
pub struct SimChip {
    processors: usize,
    initialized: AtomicBool,
    interrupts: AtomicBool,
    restores: AtomicUsize,
    next_context: AtomicUsize,
    timer: spin::Mutex<Option<TimeSpan>>,
    notifications: AtomicUsize,
    current: AtomicUsize,
}

impl SimChip {
    /// Tick period reported as the platform default
    pub const DEFAULT_TIME_SLICE: TimeSpan = TimeSpan::from_millis(10);

    pub fn new(processors: usize) -> Self {
        Self {
            processors,
            initialized: AtomicBool::new(false),
            interrupts: AtomicBool::new(true),
            restores: AtomicUsize::new(0),
            next_context: AtomicUsize::new(1),
            timer: spin::Mutex::new(None),
            notifications: AtomicUsize::new(0),
            current: AtomicUsize::new(0),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    pub fn interrupts_enabled(&self) -> bool {
        self.interrupts.load(Ordering::SeqCst)
    }

    /// Number of `restore_interrupt` calls so far
    pub fn restore_count(&self) -> usize {
        self.restores.load(Ordering::SeqCst)
    }

    /// Slice passed to the last `setup_system_timer`
    pub fn timer_slice(&self) -> Option<TimeSpan> {
        *self.timer.lock()
    }

    /// Number of core notifications raised so far
    pub fn notification_count(&self) -> usize {
        self.notifications.load(Ordering::SeqCst)
    }

    pub fn set_current_processor(&self, id: usize) {
        self.current.store(id, Ordering::SeqCst);
    }
}

impl ChipControl for SimChip {
    fn initialize(&self) -> KernelResult<()> {
        self.initialized.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn enable_interrupt(&self) -> InterruptState {
        InterruptState {
            enabled: self.interrupts.swap(true, Ordering::SeqCst),
        }
    }

    fn disable_interrupt(&self) -> InterruptState {
        InterruptState {
            enabled: self.interrupts.swap(false, Ordering::SeqCst),
        }
    }

    fn restore_interrupt(&self, state: InterruptState) {
        self.restores.fetch_add(1, Ordering::SeqCst);
        self.interrupts.store(state.enabled, Ordering::SeqCst);
    }

    fn initialize_thread_context(&self, _thread: &Arc<Thread>) -> Context {
        Context(self.next_context.fetch_add(1, Ordering::SeqCst))
    }

    fn start_schedule(&self, context: Context) -> ! {
        panic!("SimChip cannot enter context {:?}", context);
    }

    fn restore_context(&self, context: Context) -> ! {
        panic!("SimChip cannot restore context {:?}", context);
    }

    fn setup_system_timer(&self, slice: TimeSpan) {
        *self.timer.lock() = Some(slice);
    }

    fn raise_core_notification(&self) {
        self.notifications.fetch_add(1, Ordering::SeqCst);
    }

    fn default_time_slice(&self) -> TimeSpan {
        Self::DEFAULT_TIME_SLICE
    }

    fn processors_count(&self) -> usize {
        self.processors
    }

    fn current_processor_id(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }
}

/// Entry point that returns immediately
pub fn noop_entry(_: &Kernel, _: usize) -> KernelResult<()> {
    Ok(())
}

/// Entry point that faults
pub fn failing_entry(_: &Kernel, _: usize) -> KernelResult<()> {
    Err(KernelError::InvalidOperation)
}

/// Kernel on a [`SimChip`], driven one interrupt at a time
pub struct Harness {
    pub chip: Arc<SimChip>,
    pub kernel: Kernel,
    /// Context the simulated core is executing
    pub context: Context,
}

impl Harness {
    /// Upper bound on ticks `run_until` will spend
    const MAX_TICKS: usize = 64;

    pub fn new(processors: usize) -> Self {
        Self::with_config(processors, KernelConfig::default())
    }

    pub fn with_config(processors: usize, config: KernelConfig) -> Self {
        let chip = Arc::new(SimChip::new(processors));
        let kernel = Kernel::new(chip.clone(), config).unwrap();
        Self {
            chip,
            kernel,
            context: Context::NULL,
        }
    }

    pub fn scheduler(&self) -> Arc<Scheduler> {
        self.kernel.current_scheduler().clone()
    }

    /// Create and start a thread with a no-op entry point
    pub fn spawn(&self, description: &str) -> Arc<Thread> {
        let thread = self.kernel.create_thread(noop_entry, description);
        assert!(self.kernel.start_thread(&thread, 0));
        thread
    }

    /// Bootstrap the current core and take the first context
    pub fn bootstrap(&mut self) {
        self.context = self.kernel.current_scheduler().bootstrap().unwrap();
    }

    /// Deliver one timer tick
    pub fn tick(&mut self) {
        self.interrupt(SystemIrq::SystemTick);
    }

    /// Deliver a core notification, running every queued DPC
    pub fn notify(&mut self) {
        self.interrupt(SystemIrq::CoreNotification);
    }

    pub fn running(&self) -> Arc<Thread> {
        self.kernel.current_scheduler().running_thread().unwrap()
    }

    /// Tick until `thread` is the running thread
    pub fn run_until(&mut self, thread: &Arc<Thread>) {
        for _ in 0..Self::MAX_TICKS {
            if Arc::ptr_eq(&self.running(), thread) {
                return;
            }
            self.tick();
        }
        panic!("thread {} never got the processor", thread.id());
    }

    fn interrupt(&mut self, irq: SystemIrq) {
        match self.kernel.dispatch(irq, self.context) {
            DispatchOutcome::Resume(context) => {
                assert_eq!(context, self.running().context());
                self.context = context;
            }
            DispatchOutcome::Fatal(err) => panic!("{}", err),
        }
    }
}
