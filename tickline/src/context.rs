// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Execution context tokens and context-owned cells.
//!
//! The system has exactly two contexts: the mainline loop and the
//! (non-reentrant) interrupt handler. Every piece of static state is held
//! in one of three cell types, which encode who may touch it:
//!
//! | cell              | written by | read by     | synchronization          |
//! |-------------------|------------|-------------|--------------------------|
//! | [MainCtxCell]     | main       | main        | none, main-only          |
//! | [IrqCtxCell]      | irq        | irq         | none, irq-only           |
//! | [IrqSharedCell]   | irq / main | main / irq  | critical section in main |

use core::{cell::Cell, cell::UnsafeCell, mem::MaybeUninit};
use critical_section::{CriticalSection, Mutex};

macro_rules! define_context {
    ($name:ident) => {
        pub struct $name<'cs>(CriticalSection<'cs>);

        impl<'cs> $name<'cs> {
            /// Create a new context.
            ///
            /// # SAFETY
            ///
            /// This may only be called from the corresponding context.
            /// `MainCtx` may only be constructed from `main()`
            /// and `IrqCtx` may only be constructed from ISRs.
            #[inline(always)]
            pub unsafe fn new() -> Self {
                // SAFETY: This cs is used with the low level cell primitives.
                //         The IRQ safety is upheld by the context machinery instead.
                //
                //         If a function takes a `MainCtx` argument, it can only be
                //         called from `main()` context. Correspondingly for `IrqCtx`.
                //
                //         Values that both contexts access live in `IrqSharedCell`,
                //         which takes a real critical section on the main side.
                //         With this mechanism we can run the main context with IRQs
                //         enabled. There cannot be any concurrency in safe code.
                let cs = unsafe { CriticalSection::new() };
                fence();
                Self(cs)
            }

            /// Get the `CriticalSection` that belongs to this context.
            #[inline(always)]
            pub fn cs(&self) -> CriticalSection<'cs> {
                self.0
            }
        }

        impl Drop for $name<'_> {
            #[inline(always)]
            fn drop(&mut self) {
                fence();
            }
        }
    };
}

define_context!(MainCtx);
define_context!(IrqCtx);

/// Main context initialization marker.
///
/// This marker does not have a pub constructor.
/// It is only created by [MainCtx::new_with_init].
pub struct MainInitCtx(());

impl MainCtx<'_> {
    /// SAFETY: The safety contract of [MainCtx::new] must be upheld
    ///         and interrupts must still be disabled.
    #[inline(always)]
    pub unsafe fn new_with_init<F: FnOnce(&MainInitCtx)>(f: F) -> Self {
        f(&MainInitCtx(()));
        // SAFETY: Safety contract of MainCtx::new is upheld by the caller.
        unsafe { Self::new() }
    }
}

/// Lazy initialization of static variables.
pub struct LazyMainInit<T>(UnsafeCell<MaybeUninit<T>>);

impl<T> LazyMainInit<T> {
    /// # SAFETY
    ///
    /// It must be ensured that the returned instance is initialized
    /// with a call to [Self::init] during construction of the [MainCtx].
    /// See [MainCtx::new_with_init].
    ///
    /// Using this object in any way before initializing it will
    /// result in Undefined Behavior.
    #[inline(always)]
    pub const unsafe fn uninit() -> Self {
        Self(UnsafeCell::new(MaybeUninit::uninit()))
    }

    #[inline(always)]
    pub fn init(&self, _m: &MainInitCtx, inner: T) {
        // SAFETY: MainInitCtx only exists while interrupts are disabled
        //         and before any MainCtx exists. Nobody else can observe the write.
        unsafe { *self.0.get() = MaybeUninit::new(inner) };
    }

    #[inline(always)]
    pub fn deref(&self, _m: &MainCtx<'_>) -> &T {
        // SAFETY: the `Self::uninit` safety contract ensures that `Self::init` is called before us.
        unsafe { (*self.0.get()).assume_init_ref() }
    }
}

// SAFETY: The `deref` function ensures that it can only be called
//         from `MainCtx` context. `init` only runs before that.
unsafe impl<T> Sync for LazyMainInit<T> {}

/// Optimization and reordering fence.
#[inline(always)]
pub fn fence() {
    core::sync::atomic::fence(core::sync::atomic::Ordering::SeqCst);
}

/// State owned by the main context.
pub struct MainCtxCell<T> {
    inner: Mutex<Cell<T>>,
}

impl<T> MainCtxCell<T> {
    #[inline]
    pub const fn new(inner: T) -> Self {
        Self {
            inner: Mutex::new(Cell::new(inner)),
        }
    }

    #[inline]
    pub fn replace(&self, m: &MainCtx<'_>, inner: T) -> T {
        self.inner.borrow(m.cs()).replace(inner)
    }
}

impl<T: Copy> MainCtxCell<T> {
    #[inline]
    pub fn get(&self, m: &MainCtx<'_>) -> T {
        self.inner.borrow(m.cs()).get()
    }

    #[inline]
    pub fn set(&self, m: &MainCtx<'_>, inner: T) {
        self.inner.borrow(m.cs()).set(inner);
    }
}

/// State owned by the interrupt handler.
pub struct IrqCtxCell<T> {
    inner: Mutex<Cell<T>>,
}

impl<T> IrqCtxCell<T> {
    #[inline]
    pub const fn new(inner: T) -> Self {
        Self {
            inner: Mutex::new(Cell::new(inner)),
        }
    }
}

impl<T: Copy> IrqCtxCell<T> {
    #[inline]
    pub fn get(&self, c: &IrqCtx<'_>) -> T {
        self.inner.borrow(c.cs()).get()
    }

    #[inline]
    pub fn set(&self, c: &IrqCtx<'_>, inner: T) {
        self.inner.borrow(c.cs()).set(inner);
    }
}

/// State shared between the interrupt handler and the main context.
///
/// The interrupt handler already runs with interrupts disabled,
/// so it uses the cell directly.
/// Every main context access runs inside of a real critical section,
/// because `T` may be wider than what the CPU can load or store atomically.
pub struct IrqSharedCell<T> {
    inner: Mutex<Cell<T>>,
}

impl<T> IrqSharedCell<T> {
    #[inline]
    pub const fn new(inner: T) -> Self {
        Self {
            inner: Mutex::new(Cell::new(inner)),
        }
    }

    /// Run `f` on the cell with interrupts disabled.
    #[inline]
    pub fn with<R>(&self, _m: &MainCtx<'_>, f: impl FnOnce(&Cell<T>) -> R) -> R {
        critical_section::with(|cs| f(self.inner.borrow(cs)))
    }

    #[inline]
    pub fn replace(&self, m: &MainCtx<'_>, inner: T) -> T {
        self.with(m, |cell| cell.replace(inner))
    }
}

impl<T: Copy> IrqSharedCell<T> {
    #[inline]
    pub fn get(&self, m: &MainCtx<'_>) -> T {
        self.with(m, |cell| cell.get())
    }

    #[inline]
    pub fn set(&self, m: &MainCtx<'_>, inner: T) {
        self.with(m, |cell| cell.set(inner));
    }

    #[inline]
    pub fn get_irq(&self, c: &IrqCtx<'_>) -> T {
        self.inner.borrow(c.cs()).get()
    }

    #[inline]
    pub fn set_irq(&self, c: &IrqCtx<'_>, inner: T) {
        self.inner.borrow(c.cs()).set(inner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_cell_both_sides() {
        let cell = IrqSharedCell::new(0x1234_5678_u32);
        // SAFETY: Single threaded test. Both contexts are emulated.
        let m = unsafe { MainCtx::new() };
        // SAFETY: See above.
        let c = unsafe { IrqCtx::new() };

        assert_eq!(cell.get(&m), 0x1234_5678);
        cell.set_irq(&c, 0xFFFF_0000);
        assert_eq!(cell.get(&m), 0xFFFF_0000);
        assert_eq!(cell.replace(&m, 7), 0xFFFF_0000);
        assert_eq!(cell.get_irq(&c), 7);
    }

    #[test]
    fn test_lazy_main_init() {
        // SAFETY: Initialized right below, before any deref.
        let lazy: LazyMainInit<u16> = unsafe { LazyMainInit::uninit() };
        // SAFETY: Single threaded test.
        let m = unsafe { MainCtx::new_with_init(|i| lazy.init(i, 42)) };
        assert_eq!(*lazy.deref(&m), 42);
    }

    #[test]
    fn test_owned_cells() {
        let main_cell = MainCtxCell::new(false);
        let irq_cell = IrqCtxCell::new(3_u8);
        // SAFETY: Single threaded test.
        let m = unsafe { MainCtx::new() };
        // SAFETY: Single threaded test.
        let c = unsafe { IrqCtx::new() };

        assert!(!main_cell.replace(&m, true));
        assert!(main_cell.get(&m));
        irq_cell.set(&c, irq_cell.get(&c) + 1);
        assert_eq!(irq_cell.get(&c), 4);
    }
}

// vim: ts=4 sw=4 expandtab
