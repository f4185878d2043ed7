//! Re-entrancy guard for the facade's state-mutating entry points.

use crate::error::EngineError;
use std::cell::Cell;

/// RAII guard over the engine-wide in-progress flag.
///
/// A hostile asset implementation calling back into the engine during a
/// transfer hits the raised flag and is rejected; the flag clears on drop
/// regardless of how the entry point exits.
pub(crate) struct CallGuard<'a> {
    flag: &'a Cell<bool>,
}

impl<'a> CallGuard<'a> {
    pub(crate) fn acquire(flag: &'a Cell<bool>) -> Result<Self, EngineError> {
        if flag.get() {
            return Err(EngineError::ReentrantCall);
        }
        flag.set(true);
        Ok(Self { flag })
    }
}

impl Drop for CallGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_until_drop() {
        let flag = Cell::new(false);
        let guard = CallGuard::acquire(&flag).unwrap();
        assert!(matches!(
            CallGuard::acquire(&flag),
            Err(EngineError::ReentrantCall)
        ));
        drop(guard);
        assert!(CallGuard::acquire(&flag).is_ok());
    }

    #[test]
    fn flag_clears_on_early_exit() {
        let flag = Cell::new(false);
        {
            let _guard = CallGuard::acquire(&flag).unwrap();
        }
        assert!(!flag.get());
    }
}
