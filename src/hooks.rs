//! Named extension points applied to rendered bytes.
//!
//! The set of hook points is closed ([`HookName`]). Each point starts out as
//! the identity function and can be replaced once, while the site is being
//! configured. Unknown names are rejected when registering, never at render
//! time.

use crate::context::RenderContext;
use crate::site::RenderError;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Error type a hook may return.
pub type HookFailure = Box<dyn std::error::Error + Send + Sync>;

/// A hook transforms the rendered bytes of one file.
pub type HookFn =
    Arc<dyn Fn(&RenderContext<'_>, Vec<u8>) -> Result<Vec<u8>, HookFailure> + Send + Sync>;

/// Wrap a closure as a [`HookFn`].
pub fn hook<F>(func: F) -> HookFn
where
    F: Fn(&RenderContext<'_>, Vec<u8>) -> Result<Vec<u8>, HookFailure> + Send + Sync + 'static,
{
    Arc::new(func)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookName {
    /// Runs on every rendered file, after the view.
    PostRender,
}

impl HookName {
    /// Every hook point, in pipeline order.
    pub const ALL: [HookName; 1] = [HookName::PostRender];

    pub fn as_str(&self) -> &'static str {
        match self {
            HookName::PostRender => "post_render_hook",
        }
    }
}

impl fmt::Display for HookName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HookName {
    type Err = HookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HookName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| HookError::Unknown(s.to_string()))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HookError {
    #[error("{0} is not a valid hook name")]
    Unknown(String),
    #[error("{0} is already registered")]
    AlreadyRegistered(HookName),
}

struct Slot {
    name: HookName,
    func: Option<HookFn>,
}

/// The hook pipeline of a site.
pub struct Hooks {
    slots: Vec<Slot>,
}

impl Default for Hooks {
    fn default() -> Self {
        Self {
            slots: HookName::ALL
                .into_iter()
                .map(|name| Slot { name, func: None })
                .collect(),
        }
    }
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the identity default of `name`.
    pub fn register(&mut self, name: HookName, func: HookFn) -> Result<(), HookError> {
        let slot = self.slot_mut(name);
        if slot.func.is_some() {
            return Err(HookError::AlreadyRegistered(name));
        }
        slot.func = Some(func);
        Ok(())
    }

    /// Like [`Hooks::register`], with the hook point given by name.
    pub fn register_named(&mut self, name: &str, func: HookFn) -> Result<(), HookError> {
        self.register(name.parse()?, func)
    }

    pub fn is_registered(&self, name: HookName) -> bool {
        self.slots
            .iter()
            .any(|slot| slot.name == name && slot.func.is_some())
    }

    /// Run `data` through every hook point in order.
    pub(crate) fn apply(
        &self,
        context: &RenderContext<'_>,
        mut data: Vec<u8>,
    ) -> Result<Vec<u8>, RenderError> {
        for slot in &self.slots {
            let Some(func) = &slot.func else { continue };
            data = func(context, data).map_err(|source| RenderError::Hook {
                hook: slot.name,
                realpath: context.realpath().to_string(),
                source,
            })?;
        }
        Ok(data)
    }

    fn slot_mut(&mut self, name: HookName) -> &mut Slot {
        let index = HookName::ALL
            .iter()
            .position(|candidate| *candidate == name)
            .unwrap_or_default();
        &mut self.slots[index]
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registered: Vec<&str> = self
            .slots
            .iter()
            .filter(|slot| slot.func.is_some())
            .map(|slot| slot.name.as_str())
            .collect();
        f.debug_struct("Hooks").field("registered", &registered).finish()
    }
}
