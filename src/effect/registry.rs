//! Static effect registry

use super::{Effect, EffectDescriptor, EffectSlot, InjectionPoint, SharedEffect};
use crate::error::RegistryError;

type EffectFactory = Box<dyn Fn() -> Box<dyn Effect> + Send + Sync>;

/// One row of the registry: descriptor plus a constructor for new instances
pub struct EffectRegistration {
    descriptor: EffectDescriptor,
    factory: EffectFactory,
}

impl EffectRegistration {
    pub fn descriptor(&self) -> &EffectDescriptor {
        &self.descriptor
    }

    fn instantiate(&self) -> SharedEffect {
        EffectSlot::new(self.descriptor.clone(), (self.factory)()).into_shared()
    }
}

/// Ordered table of effect registrations, built once before the compositor.
///
/// Registration order is execution order within a stage.
#[derive(Default)]
pub struct EffectRegistry {
    entries: Vec<EffectRegistration>,
}

impl EffectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an effect type to the table
    pub fn register<E, F>(
        &mut self,
        descriptor: EffectDescriptor,
        factory: F,
    ) -> Result<(), RegistryError>
    where
        E: Effect + 'static,
        F: Fn() -> E + Send + Sync + 'static,
    {
        if descriptor.name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if descriptor.injection_points.is_empty() {
            return Err(RegistryError::NoInjectionPoint(descriptor.name.to_string()));
        }
        if self.entries.iter().any(|e| e.descriptor.name == descriptor.name) {
            return Err(RegistryError::DuplicateName(descriptor.name.to_string()));
        }

        log::trace!(
            "Registered effect `{}` at {:?} (shared: {})",
            descriptor.name,
            descriptor.injection_points,
            descriptor.share_instance
        );
        self.entries.push(EffectRegistration {
            descriptor,
            factory: Box::new(move || Box::new(factory()) as Box<dyn Effect>),
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn registrations(&self) -> &[EffectRegistration] {
        &self.entries
    }

    /// Build the per-stage effect lists, indexed like [`InjectionPoint::PIPELINE_ORDER`].
    ///
    /// A shared registration yields one instance referenced by every flagged
    /// stage; otherwise each flagged stage gets its own instance.
    pub fn instantiate(&self) -> [Vec<SharedEffect>; 4] {
        let mut stages: [Vec<SharedEffect>; 4] = Default::default();

        for entry in &self.entries {
            let shared = entry
                .descriptor
                .share_instance
                .then(|| entry.instantiate());

            for (index, point) in InjectionPoint::PIPELINE_ORDER.iter().enumerate() {
                if !entry.descriptor.injection_points.contains(*point) {
                    continue;
                }
                let slot = match &shared {
                    Some(slot) => slot.clone(),
                    None => entry.instantiate(),
                };
                stages[index].push(slot);
            }
        }

        stages
    }
}
