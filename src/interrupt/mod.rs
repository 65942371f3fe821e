// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Generic interrupt handling
//!
//! Architecture-independent dispatch of the two system interrupts every
//! core services, plus the deferred procedure call (DPC) queue.
//!
//! The platform's trap stub calls [`Kernel::handle_trap`] with the
//! interrupted context. [`IrqDispatcher::dispatch`] runs the registered
//! handler and reports the context to resume; only `handle_trap` performs
//! the actual transfer.
//!
//! DPCs are queued with local interrupts masked and announced with a
//! core-notification soft interrupt. The built-in notification handler runs
//! them in FIFO order, each receiving the context its predecessor returned,
//! which is how a voluntary yield becomes a switch at interrupt return.
//!
//! [`Kernel::handle_trap`]: crate::kernel::Kernel::handle_trap

use alloc::boxed::Box;
use alloc::collections::VecDeque;
use alloc::sync::{Arc, Weak};
use core::fmt;

use crate::sync::ProcessorCriticalSection;
use crate::traits::{ChipControl, Context};

/// System interrupt lines
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemIrq {
    /// Periodic scheduler tick
    SystemTick = 0,
    /// Core-local soft interrupt that drains the DPC queue
    CoreNotification = 1,
}

impl SystemIrq {
    /// Number of system interrupt lines
    pub const COUNT: usize = 2;

    pub const fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::SystemTick),
            1 => Some(Self::CoreNotification),
            _ => None,
        }
    }

    pub const fn into_raw(self) -> u32 {
        self as u32
    }

    const fn index(self) -> usize {
        self as usize
    }
}

/// Interrupt handler: receives the interrupted context, returns the one to
/// resume
pub type IrqHandler = Arc<dyn Fn(Context) -> Context + Send + Sync>;

/// Deferred procedure call
pub struct Dpc {
    callback: Box<dyn FnOnce(Context) -> Context + Send>,
}

impl Dpc {
    pub fn new<F>(callback: F) -> Self
    where
        F: FnOnce(Context) -> Context + Send + 'static,
    {
        Self {
            callback: Box::new(callback),
        }
    }

    fn run(self, context: Context) -> Context {
        (self.callback)(context)
    }
}

impl fmt::Debug for Dpc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dpc").finish_non_exhaustive()
    }
}

/// Unrecoverable dispatch failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatalError {
    /// No handler registered for the line
    UnhandledIrq(SystemIrq),
}

impl fmt::Display for FatalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnhandledIrq(irq) => write!(f, "unhandled system interrupt {:?}", irq),
        }
    }
}

/// Result of dispatching one interrupt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Resume this context
    Resume(Context),
    /// Kernel panic
    Fatal(FatalError),
}

/// Per-core interrupt dispatcher
pub struct IrqDispatcher {
    chip: Arc<dyn ChipControl>,
    handlers: spin::RwLock<[Option<IrqHandler>; SystemIrq::COUNT]>,
    dpcs: spin::Mutex<VecDeque<Dpc>>,
}

impl IrqDispatcher {
    /// Create a dispatcher with the DPC drain installed on
    /// [`SystemIrq::CoreNotification`]
    pub fn new(chip: Arc<dyn ChipControl>) -> Arc<Self> {
        Arc::new_cyclic(|this: &Weak<Self>| {
            let this = this.clone();
            let drain: IrqHandler = Arc::new(move |context| match this.upgrade() {
                Some(dispatcher) => dispatcher.drain_dpcs(context),
                None => context,
            });

            let mut handlers: [Option<IrqHandler>; SystemIrq::COUNT] =
                core::array::from_fn(|_| None);
            handlers[SystemIrq::CoreNotification.index()] = Some(drain);

            Self {
                chip,
                handlers: spin::RwLock::new(handlers),
                dpcs: spin::Mutex::new(VecDeque::new()),
            }
        })
    }

    /// Install `handler` for `irq`, returning the handler it replaces
    pub fn register_system_irq(&self, irq: SystemIrq, handler: IrqHandler) -> Option<IrqHandler> {
        self.handlers.write()[irq.index()].replace(handler)
    }

    /// Queue `dpc` and raise the core notification
    pub fn register_dpc(&self, dpc: Dpc) {
        {
            let _section = ProcessorCriticalSection::enter(&*self.chip);
            self.dpcs.lock().push_back(dpc);
        }
        self.chip.raise_core_notification();
    }

    /// DPCs waiting for the next core notification
    pub fn pending_dpcs(&self) -> usize {
        let _section = ProcessorCriticalSection::enter(&*self.chip);
        self.dpcs.lock().len()
    }

    /// Run the handler registered for `irq`
    pub fn dispatch(&self, irq: SystemIrq, context: Context) -> DispatchOutcome {
        let handler = self.handlers.read()[irq.index()].clone();
        match handler {
            Some(handler) => DispatchOutcome::Resume(handler(context)),
            None => {
                log::error!("irq: no handler for {:?}", irq);
                DispatchOutcome::Fatal(FatalError::UnhandledIrq(irq))
            }
        }
    }

    /// Run queued DPCs until the queue is empty, including ones queued
    /// while draining
    fn drain_dpcs(&self, mut context: Context) -> Context {
        loop {
            let next = {
                let _section = ProcessorCriticalSection::enter(&*self.chip);
                self.dpcs.lock().pop_front()
            };
            match next {
                Some(dpc) => {
                    log::trace!("irq: running dpc");
                    context = dpc.run(context);
                }
                None => return context,
            }
        }
    }
}
