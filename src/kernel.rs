// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Kernel instance
//!
//! Owns the per-core array (scheduler plus interrupt dispatcher for each
//! logical processor) and the object namespace, and exposes the services
//! threads call. "Current" always means the processor reported by
//! [`ChipControl::current_processor_id`].

use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::config::KernelConfig;
use crate::error::{KernelError, KernelResult};
use crate::interrupt::{DispatchOutcome, Dpc, IrqDispatcher, SystemIrq};
use crate::object::ObjectManager;
use crate::sched::{Scheduler, Thread, ThreadEntry};
use crate::time::TimeSpan;
use crate::traits::{ChipControl, Context};

/// Per-core state
pub struct Processor {
    id: usize,
    dispatcher: Arc<IrqDispatcher>,
    scheduler: Arc<Scheduler>,
}

impl Processor {
    fn new(id: usize, chip: &Arc<dyn ChipControl>, time_slice: TimeSpan, config: &KernelConfig) -> Self {
        let dispatcher = IrqDispatcher::new(chip.clone());
        let scheduler = Scheduler::new(
            id,
            chip.clone(),
            dispatcher.clone(),
            time_slice,
            config.idle_description,
        );
        Self {
            id,
            dispatcher,
            scheduler,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn dispatcher(&self) -> &Arc<IrqDispatcher> {
        &self.dispatcher
    }

    pub fn scheduler(&self) -> &Arc<Scheduler> {
        &self.scheduler
    }
}

/// Kernel
pub struct Kernel {
    chip: Arc<dyn ChipControl>,
    config: KernelConfig,
    processors: Vec<Processor>,
    objects: ObjectManager,
}

impl Kernel {
    /// Initialize the chip and build one processor slot per managed core
    pub fn new(chip: Arc<dyn ChipControl>, config: KernelConfig) -> KernelResult<Self> {
        chip.initialize()?;

        let time_slice = config.time_slice.unwrap_or_else(|| chip.default_time_slice());
        if time_slice.is_negative() || time_slice.is_zero() || time_slice.is_infinite() {
            return Err(KernelError::ArgumentOutOfRange);
        }

        let count = chip.processors_count().min(config.max_processors);
        if count == 0 {
            return Err(KernelError::ArgumentOutOfRange);
        }

        let processors = (0..count)
            .map(|id| Processor::new(id, &chip, time_slice, &config))
            .collect();

        log::debug!("kernel: {} processor(s), slice {} ns", count, time_slice.as_nanos());

        Ok(Self {
            chip,
            config,
            processors,
            objects: ObjectManager::new(),
        })
    }

    pub fn chip(&self) -> &Arc<dyn ChipControl> {
        &self.chip
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    pub fn objects(&self) -> &ObjectManager {
        &self.objects
    }

    pub fn processor_count(&self) -> usize {
        self.processors.len()
    }

    pub fn processor(&self, id: usize) -> Option<&Processor> {
        self.processors.get(id)
    }

    pub fn scheduler(&self, id: usize) -> Option<&Arc<Scheduler>> {
        self.processor(id).map(Processor::scheduler)
    }

    /// Processor executing this call
    ///
    /// Panics if the chip reports a core this kernel does not manage.
    pub fn current_processor(&self) -> &Processor {
        let id = self.chip.current_processor_id();
        match self.processors.get(id) {
            Some(processor) => processor,
            None => {
                log::error!("kernel: running on unmanaged core {}", id);
                panic!("core {} is not managed by this kernel", id);
            }
        }
    }

    pub fn current_scheduler(&self) -> &Arc<Scheduler> {
        self.current_processor().scheduler()
    }

    /// Create a thread with a platform-built initial context
    ///
    /// The thread does not run until [`start_thread`](Self::start_thread).
    pub fn create_thread(&self, entry: ThreadEntry, description: &str) -> Arc<Thread> {
        let thread = Thread::new(entry, description);
        thread.save_context(self.chip.initialize_thread_context(&thread));
        log::debug!("kernel: created thread {} '{}'", thread.id(), description);
        thread
    }

    /// Start `thread` on the current core with `argument`
    pub fn start_thread(&self, thread: &Arc<Thread>, argument: usize) -> bool {
        thread.start(self, argument)
    }

    /// Delay the running thread of the current core
    pub fn delay(&self, span: TimeSpan) -> KernelResult<()> {
        self.current_scheduler().delay(span)
    }

    /// Terminate the running thread of the current core with `code`
    pub fn exit_thread(&self, code: i32) -> KernelResult<()> {
        let thread = self
            .current_scheduler()
            .running_thread()
            .ok_or(KernelError::InvalidOperation)?;
        thread.exit(self, code)
    }

    /// Queue a DPC on the current core
    pub fn register_dpc(&self, dpc: Dpc) {
        self.current_processor().dispatcher().register_dpc(dpc);
    }

    /// Dispatch `irq` on the current core
    pub fn dispatch(&self, irq: SystemIrq, context: Context) -> DispatchOutcome {
        self.current_processor().dispatcher().dispatch(irq, context)
    }

    /// Trap entry: dispatch, then resume the chosen context
    pub fn handle_trap(&self, irq: SystemIrq, context: Context) -> ! {
        match self.dispatch(irq, context) {
            DispatchOutcome::Resume(next) => self.chip.restore_context(next),
            DispatchOutcome::Fatal(err) => {
                log::error!("kernel: fatal trap: {}", err);
                panic!("{}", err);
            }
        }
    }

    /// Start scheduling on the current core; never returns
    pub fn start(&self) -> ! {
        self.current_scheduler().start()
    }
}
