// Extended register lock discipline.
//
// SR05 gates every SiS extension register. Writing the unlock code opens the
// bank, the readback confirms it. The old family also gates a second bank
// through CR80. This is a hardware mode toggle, not a mutex: every sequence
// of register writes must run between `acquire_unlock` and `release_lock`,
// and `RegisterLock` pairs the two for the lifetime of a scope.

use std::ops::{Deref, DerefMut};

use quick_error::quick_error;

use crate::hw::io::{Bank, Regs};
use crate::hw::regs::{CR_LEGACY_LOCK, LOCK_CODE, SR_LOCK, UNLOCKED, UNLOCK_CODE};

#[cfg(test)]
#[path = "./lock_test.rs"]
mod lock_test;

quick_error! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum LockError {
        Sequencer(readback: u8) {
            display("failed to unlock SR registers (readback {:02X})", readback)
        }
        Legacy(readback: u8) {
            display("failed to unlock CR registers (readback {:02X})", readback)
        }
    }
}

/// Unlocks the extended banks and returns the prior (SR05, CR80) values.
///
/// A failed unlock is logged and, where the family has one, the legacy CR80
/// bank is tried as a fallback. The caller always proceeds.
pub fn acquire_unlock(regs: &mut Regs, legacy_bank: bool) -> (u8, u8) {
    let (prior, failure) = try_acquire(regs, legacy_bank);
    if let Some(err) = failure {
        log::error!("{}", err);
    }
    prior
}

/// Same as `acquire_unlock`, but also hands back the first failure seen.
pub fn try_acquire(regs: &mut Regs, legacy_bank: bool) -> ((u8, u8), Option<LockError>) {
    let prior_seq = regs.read(Bank::Sr, SR_LOCK);
    let prior_crt = if legacy_bank {
        regs.read(Bank::Cr, CR_LEGACY_LOCK)
    } else {
        0
    };

    let mut failure = None;
    regs.write(Bank::Sr, SR_LOCK, UNLOCK_CODE);
    let readback = regs.read(Bank::Sr, SR_LOCK);
    if readback != UNLOCKED {
        failure = Some(LockError::Sequencer(readback));
        if !legacy_bank {
            // degraded path: retry once, registers may still accept writes
            regs.write(Bank::Sr, SR_LOCK, UNLOCK_CODE);
        }
    }

    if legacy_bank {
        regs.write(Bank::Cr, CR_LEGACY_LOCK, UNLOCK_CODE);
        let readback = regs.read(Bank::Cr, CR_LEGACY_LOCK);
        if readback != UNLOCKED && failure.is_none() {
            failure = Some(LockError::Legacy(readback));
        }
    }
    ((prior_seq, prior_crt), failure)
}

/// Puts the lock registers back the way `acquire_unlock` found them.
pub fn release_lock(regs: &mut Regs, legacy_bank: bool, prior_seq: u8, prior_crt: u8) {
    if prior_seq != UNLOCKED {
        regs.write(Bank::Sr, SR_LOCK, LOCK_CODE);
    }
    if legacy_bank && prior_crt != UNLOCKED {
        regs.write(Bank::Cr, CR_LEGACY_LOCK, LOCK_CODE);
    }
}

/// Scoped unlock: derefs to the register accessor, relocks on drop.
pub struct RegisterLock<'a> {
    regs: Regs<'a>,
    legacy_bank: bool,
    prior: (u8, u8),
    failure: Option<LockError>,
}

impl<'a> RegisterLock<'a> {
    pub fn acquire(mut regs: Regs<'a>, legacy_bank: bool) -> Self {
        let (prior, failure) = try_acquire(&mut regs, legacy_bank);
        if let Some(ref err) = failure {
            log::error!("{}", err);
        }
        RegisterLock { regs, legacy_bank, prior, failure }
    }

    /// lock state found on entry, (SR05, CR80)
    pub fn prior(&self) -> (u8, u8) {
        self.prior
    }

    pub fn failure(&self) -> Option<&LockError> {
        self.failure.as_ref()
    }
}

impl<'a> Deref for RegisterLock<'a> {
    type Target = Regs<'a>;

    fn deref(&self) -> &Regs<'a> {
        &self.regs
    }
}

impl<'a> DerefMut for RegisterLock<'a> {
    fn deref_mut(&mut self) -> &mut Regs<'a> {
        &mut self.regs
    }
}

impl<'a> Drop for RegisterLock<'a> {
    fn drop(&mut self) {
        let (seq, crt) = self.prior;
        release_lock(&mut self.regs, self.legacy_bank, seq, crt);
    }
}
