// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Thread representation and management
//!
//! A thread is owned by at most one scheduler at a time. Ownership is an
//! atomic core slot claimed with compare-and-swap, so starting a thread
//! twice, or from two cores at once, admits it exactly once.

use alloc::string::String;
use alloc::sync::Arc;
use core::fmt;
use core::sync::atomic::{AtomicI32, AtomicU64, AtomicU8, AtomicUsize, Ordering};

use super::state::ThreadState;
use crate::error::{KernelError, KernelResult};
use crate::kernel::Kernel;
use crate::object::{AccessMask, KernelObject, ObjectHeader};
use crate::traits::Context;

/// Thread ID type
pub type ThreadId = u64;

/// Thread entry point
///
/// Returning `Err` is the fault path: the thread exits with the error's
/// code.
pub type ThreadEntry = fn(&Kernel, usize) -> KernelResult<()>;

/// Owner slot value for "no scheduler"
const NO_OWNER: usize = 0;

static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

fn new_thread_id() -> ThreadId {
    NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed)
}

/// Thread structure
pub struct Thread {
    header: ObjectHeader,
    id: ThreadId,
    description: String,
    entry: ThreadEntry,
    argument: AtomicUsize,
    context: AtomicUsize,
    exit_code: AtomicI32,
    state: AtomicU8,
    /// Owning core + 1, or `NO_OWNER`
    owner: AtomicUsize,
}

impl Thread {
    /// Create a thread that no scheduler owns yet
    ///
    /// The context is null until the platform builds one; use
    /// [`Kernel::create_thread`] for a runnable thread.
    pub fn new(entry: ThreadEntry, description: &str) -> Arc<Self> {
        Arc::new(Self {
            header: ObjectHeader::new(),
            id: new_thread_id(),
            description: String::from(description),
            entry,
            argument: AtomicUsize::new(0),
            context: AtomicUsize::new(Context::NULL.0),
            exit_code: AtomicI32::new(0),
            state: AtomicU8::new(ThreadState::Ready.into_raw()),
            owner: AtomicUsize::new(NO_OWNER),
        })
    }

    pub fn id(&self) -> ThreadId {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn argument(&self) -> usize {
        self.argument.load(Ordering::Acquire)
    }

    /// Saved machine context
    pub fn context(&self) -> Context {
        Context(self.context.load(Ordering::Acquire))
    }

    pub(crate) fn save_context(&self, context: Context) {
        self.context.store(context.0, Ordering::Release);
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_code.load(Ordering::Acquire)
    }

    pub fn state(&self) -> ThreadState {
        ThreadState::from_raw(self.state.load(Ordering::Acquire)).unwrap_or(ThreadState::Terminated)
    }

    pub(crate) fn set_state(&self, state: ThreadState) {
        self.state.store(state.into_raw(), Ordering::Release);
    }

    /// Core whose scheduler owns this thread
    pub fn owner(&self) -> Option<usize> {
        match self.owner.load(Ordering::Acquire) {
            NO_OWNER => None,
            slot => Some(slot - 1),
        }
    }

    /// Claim ownership for `core`; fails if any core already owns it
    pub(crate) fn claim(&self, core: usize) -> bool {
        self.owner
            .compare_exchange(NO_OWNER, core + 1, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Give up ownership; fails unless `core` is the owner
    pub(crate) fn release(&self, core: usize) -> bool {
        self.owner
            .compare_exchange(core + 1, NO_OWNER, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Stash `argument` and hand the thread to the current core's scheduler
    ///
    /// Returns `false` if the thread was already started.
    pub fn start(self: &Arc<Self>, kernel: &Kernel, argument: usize) -> bool {
        if self.owner().is_some() {
            return false;
        }
        self.argument.store(argument, Ordering::Release);
        kernel.current_scheduler().start_thread(self)
    }

    /// Trampoline body: run the entry point, then exit with its outcome
    pub fn run(self: &Arc<Self>, kernel: &Kernel) -> KernelResult<()> {
        let code = match (self.entry)(kernel, self.argument()) {
            Ok(()) => 0,
            Err(err) => {
                log::warn!("thread {} '{}' faulted: {}", self.id, self.description, err);
                err.code()
            }
        };
        self.exit(kernel, code)
    }

    /// Record `code` and ask the owning scheduler to terminate the thread
    pub fn exit(self: &Arc<Self>, kernel: &Kernel, code: i32) -> KernelResult<()> {
        let core = self.owner().ok_or(KernelError::InvalidOperation)?;
        let scheduler = kernel.scheduler(core).ok_or(KernelError::InvalidOperation)?;

        self.exit_code.store(code, Ordering::Release);
        log::debug!("thread {} '{}' exiting with {}", self.id, self.description, code);
        scheduler.kill_thread(self)
    }

    /// Make a delayed or suspended thread ready again
    ///
    /// Returns whether the thread was actually waiting.
    pub fn undelay(self: &Arc<Self>, kernel: &Kernel) -> KernelResult<bool> {
        let core = self.owner().ok_or(KernelError::InvalidOperation)?;
        let scheduler = kernel.scheduler(core).ok_or(KernelError::InvalidOperation)?;
        Ok(scheduler.undelay(self))
    }
}

impl KernelObject for Thread {
    fn header(&self) -> &ObjectHeader {
        &self.header
    }

    fn valid_access_mask(&self) -> AccessMask {
        AccessMask::ALL
    }

    fn type_name(&self) -> &'static str {
        "thread"
    }
}

impl fmt::Debug for Thread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Thread")
            .field("id", &self.id)
            .field("description", &self.description)
            .field("state", &self.state())
            .field("owner", &self.owner())
            .finish()
    }
}
