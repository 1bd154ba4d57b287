//! Hand-written increment instructions.
//!
//! Only x86-64 has a single memory-increment instruction that can take the
//! bus-lock prefix, so the pair exists there and nowhere else. Callers ask
//! once through [`instructions`] and skip the extra counters on `None`.

use std::fmt;

use crate::sync::Increment;

#[cfg(target_arch = "x86_64")]
mod x86_64;

#[cfg(target_arch = "x86_64")]
pub use self::x86_64::{Inc, LockInc};

/// The locked and unlocked flavor of the same instruction.
#[derive(Clone, Copy)]
pub struct Instructions {
    pub locked: &'static dyn Increment,
    pub plain: &'static dyn Increment,
}

impl fmt::Debug for Instructions {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Instructions")
            .field("locked", &self.locked.name())
            .field("plain", &self.plain.name())
            .finish()
    }
}

#[cfg(target_arch = "x86_64")]
pub fn instructions() -> Option<Instructions> {
    Some(Instructions {
        locked: &LockInc,
        plain: &Inc,
    })
}

#[cfg(not(target_arch = "x86_64"))]
pub fn instructions() -> Option<Instructions> {
    None
}
