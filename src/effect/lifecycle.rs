//! Effect lifecycle state machine

use std::sync::Arc;

use parking_lot::Mutex;

use super::{Effect, EffectDescriptor};

/// Lifecycle of an effect instance.
///
/// ```text
/// Constructed --initialize ok--> Initialized
/// Constructed --initialize err-> Faulted
/// any (except Disposed) --dispose--> Disposed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Constructed,
    Initialized,
    /// Initialization failed; the effect never runs again
    Faulted,
    Disposed,
}

/// An effect instance together with the state the compositor tracks for it.
pub struct EffectSlot {
    descriptor: EffectDescriptor,
    effect: Box<dyn Effect>,
    state: LifecycleState,
}

/// Slot handle held by every stage the instance is registered under
pub type SharedEffect = Arc<Mutex<EffectSlot>>;

impl EffectSlot {
    pub fn new(descriptor: EffectDescriptor, effect: Box<dyn Effect>) -> Self {
        Self {
            descriptor,
            effect,
            state: LifecycleState::Constructed,
        }
    }

    pub(crate) fn into_shared(self) -> SharedEffect {
        Arc::new(Mutex::new(self))
    }

    pub fn descriptor(&self) -> &EffectDescriptor {
        &self.descriptor
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn effect(&self) -> &dyn Effect {
        self.effect.as_ref()
    }

    pub fn effect_mut(&mut self) -> &mut dyn Effect {
        self.effect.as_mut()
    }

    /// Whether the slot may still be set up and executed
    pub fn is_schedulable(&self) -> bool {
        matches!(
            self.state,
            LifecycleState::Constructed | LifecycleState::Initialized
        )
    }

    /// Run `initialize` on first use. Returns whether the effect may execute.
    pub(crate) fn ensure_initialized(&mut self) -> bool {
        match self.state {
            LifecycleState::Initialized => true,
            LifecycleState::Constructed => match self.effect.initialize() {
                Ok(()) => {
                    log::debug!("Initialized effect `{}`", self.descriptor.name);
                    self.state = LifecycleState::Initialized;
                    true
                }
                Err(err) => {
                    log::error!(
                        "Effect `{}` failed to initialize and is disabled: {}",
                        self.descriptor.name,
                        err
                    );
                    self.state = LifecycleState::Faulted;
                    false
                }
            },
            LifecycleState::Faulted | LifecycleState::Disposed => false,
        }
    }

    /// Dispose the effect. Returns `false` if it was already disposed.
    pub(crate) fn dispose(&mut self) -> bool {
        if self.state == LifecycleState::Disposed {
            return false;
        }
        self.effect.dispose();
        self.state = LifecycleState::Disposed;
        true
    }
}

impl std::fmt::Debug for EffectSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectSlot")
            .field("descriptor", &self.descriptor)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
