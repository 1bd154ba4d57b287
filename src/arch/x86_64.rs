use std::arch::asm;

use crate::sync::{Counter, Increment};

/// `lock inc qword ptr [counter]`
#[derive(Debug, Clone, Copy)]
pub struct LockInc;

/// `inc qword ptr [counter]`: a single instruction, but the core still
/// splits it into a load and a store that other cores can slip between.
#[derive(Debug, Clone, Copy)]
pub struct Inc;

impl Increment for LockInc {
    fn name(&self) -> &'static str {
        "arch_atomic"
    }

    fn is_atomic(&self) -> bool {
        true
    }

    #[inline]
    fn increment(&self, counter: &Counter) {
        let ptr = counter.cell().as_ptr();
        // SAFETY: ptr comes from a live AtomicU64, so it is aligned and
        // valid for the 8-byte read-modify-write.
        unsafe {
            asm!("lock inc qword ptr [{0}]", in(reg) ptr, options(nostack));
        }
    }
}

impl Increment for Inc {
    fn name(&self) -> &'static str {
        "arch_non_atomic"
    }

    fn is_atomic(&self) -> bool {
        false
    }

    #[inline]
    fn increment(&self, counter: &Counter) {
        let ptr = counter.cell().as_ptr();
        // SAFETY: as for LockInc. Losing updates here is the point.
        unsafe {
            asm!("inc qword ptr [{0}]", in(reg) ptr, options(nostack));
        }
    }
}
