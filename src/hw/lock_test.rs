use pretty_assertions::assert_eq;

use crate::hw::regs::{SR_LOCK, UNLOCKED};
use crate::hw::{acquire_unlock, release_lock, try_acquire, Bank, EmulatedAdapter, LockError, Ports, RegisterLock, Regs};

#[test]
fn unlock_opens_extended_registers() {
    let mut emu = EmulatedAdapter::new(Ports::default());
    {
        let mut regs = Regs::new(&mut emu, Ports::default());
        regs.write(Bank::Sr, 0x26, 0x55);
    }
    assert_eq!(0x00, emu.reg(Bank::Sr, 0x26));

    let mut regs = Regs::new(&mut emu, Ports::default());
    let (seq, crt) = acquire_unlock(&mut regs, false);
    assert_eq!((0x21, 0x00), (seq, crt));
    regs.write(Bank::Sr, 0x26, 0x55);
    assert_eq!(0x55, regs.read(Bank::Sr, 0x26));
    release_lock(&mut regs, false, seq, crt);
    assert_eq!(false, emu.is_unlocked());
}

#[test]
fn release_keeps_a_lock_that_was_open_on_entry() {
    let mut emu = EmulatedAdapter::new(Ports::default());
    let mut regs = Regs::new(&mut emu, Ports::default());
    let outer = acquire_unlock(&mut regs, false);
    let inner = acquire_unlock(&mut regs, false);
    assert_eq!(UNLOCKED, inner.0);
    release_lock(&mut regs, false, inner.0, inner.1);
    assert_eq!(UNLOCKED, regs.read(Bank::Sr, SR_LOCK));
    release_lock(&mut regs, false, outer.0, outer.1);
    assert_eq!(0x21, regs.read(Bank::Sr, SR_LOCK));
}

#[test]
fn scoped_lock_relocks_on_drop() {
    let mut emu = EmulatedAdapter::new(Ports::default());
    {
        let mut lock = RegisterLock::acquire(Regs::new(&mut emu, Ports::default()), false);
        assert_eq!(None, lock.failure());
        lock.write(Bank::Cr, 0x30, 0x20);
    }
    assert_eq!(0x20, emu.reg(Bank::Cr, 0x30));
    assert_eq!(false, emu.is_unlocked());
}

#[test]
fn refused_unlock_is_reported_and_legacy_bank_falls_back() {
    let mut emu = EmulatedAdapter::new(Ports::default());
    emu.refuse_unlock(true);
    let mut regs = Regs::new(&mut emu, Ports::default());
    let (_, failure) = try_acquire(&mut regs, true);
    assert_eq!(Some(LockError::Sequencer(0x21)), failure);

    // CR extensions stay reachable through CR80
    regs.write(Bank::Cr, 0x30, 0x04);
    assert_eq!(0x04, regs.read(Bank::Cr, 0x30));
    release_lock(&mut regs, true, 0x21, 0x21);
    assert_eq!(false, emu.is_legacy_unlocked());
}

#[test]
fn degraded_unlock_still_proceeds() {
    let mut emu = EmulatedAdapter::new(Ports::default());
    emu.refuse_unlock(true);
    let lock = RegisterLock::acquire(Regs::new(&mut emu, Ports::default()), false);
    assert_eq!(Some(&LockError::Sequencer(0x21)), lock.failure());
    assert_eq!(0x21, lock.prior().0);
    drop(lock);
    assert_eq!(false, emu.is_unlocked());
}
