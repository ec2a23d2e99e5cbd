//! Mutex-guarded dispatcher for hosts that call in from several threads.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tactor_driver::TactorDriver;
use tactor_types::error::Result;

use crate::dispatcher::{CommandOutput, Dispatcher};
use crate::value::Value;

/// Cloneable handle to one dispatcher.
///
/// Every call holds the lock for the whole dispatch, so lifecycle commands
/// (initialize, connect, close, shutdown) never interleave. The session is
/// torn down when the last handle is dropped.
pub struct SharedDispatcher<D: TactorDriver> {
    inner: Arc<Mutex<Dispatcher<D>>>,
}

impl<D: TactorDriver> Clone for SharedDispatcher<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D: TactorDriver> SharedDispatcher<D> {
    pub fn new(dispatcher: Dispatcher<D>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(dispatcher)),
        }
    }

    /// Lock the dispatcher, recovering from a poisoned lock.
    pub fn lock(&self) -> MutexGuard<'_, Dispatcher<D>> {
        self.inner.lock().unwrap_or_else(|poisoned| {
            log::warn!("Dispatcher lock poisoned; recovering");
            poisoned.into_inner()
        })
    }

    /// See [`Dispatcher::invoke`].
    pub fn invoke(&self, inputs: &[Value]) -> Result<CommandOutput> {
        self.lock().invoke(inputs)
    }

    pub fn dispatch_name(&self, name: &str, args: &[Value]) -> Result<CommandOutput> {
        self.lock().dispatch_name(name, args)
    }

    pub fn dispatch_code(&self, code: u8, args: &[Value]) -> Result<CommandOutput> {
        self.lock().dispatch_code(code, args)
    }

    /// Close every device and shut the interface down now, without waiting
    /// for the last handle to drop.
    pub fn shutdown(&self) -> Result<()> {
        self.lock().session_mut().shutdown()
    }

    /// Handle that does not keep the session alive.
    pub fn downgrade(&self) -> WeakDispatcher<D> {
        WeakDispatcher {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

/// Non-owning handle from [`SharedDispatcher::downgrade`].
pub struct WeakDispatcher<D: TactorDriver> {
    inner: Weak<Mutex<Dispatcher<D>>>,
}

impl<D: TactorDriver> Clone for WeakDispatcher<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<D: TactorDriver> WeakDispatcher<D> {
    /// `None` once every [`SharedDispatcher`] is gone.
    pub fn upgrade(&self) -> Option<SharedDispatcher<D>> {
        self.inner.upgrade().map(|inner| SharedDispatcher { inner })
    }
}
