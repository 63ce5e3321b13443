use crate::chip::QueueKind;
use crate::hw::regs::{MMIO_QUEUE_BASE, MMIO_QUEUE_READ_PTR, MMIO_QUEUE_WRITE_PTR};
use crate::hw::{Bank, EmulatedAdapter, Hardware, Ports, RegisterLock, Regs};
use crate::options::QueueMode;
use crate::switch::queue::enable_queue;

#[test]
fn turbo_queue_position() {
    let mut emu = EmulatedAdapter::new(Ports::default());
    {
        let mut lock = RegisterLock::acquire(Regs::new(&mut emu, Ports::default()), false);
        enable_queue(&mut lock, QueueKind::TurboQueue, QueueMode::Mmio, 32 * 1024);
    }
    // (32 MiB - 512 KiB) / 64 KiB = 504 = 0x1F8
    assert_eq!(0xF8, emu.reg(Bank::Sr, 0x26));
    assert_eq!(0xF1, emu.reg(Bank::Sr, 0x27));
}

#[test]
fn mmio_queue_is_flushed_before_resize() {
    let mut emu = EmulatedAdapter::new(Ports::default());
    emu.mmio_out32(MMIO_QUEUE_READ_PTR, 0x1234);
    {
        let mut lock = RegisterLock::acquire(Regs::new(&mut emu, Ports::default()), false);
        enable_queue(&mut lock, QueueKind::MmioQueue, QueueMode::Vram, 16 * 1024);
    }
    assert_eq!(0x1234, emu.mmio(MMIO_QUEUE_WRITE_PTR));
    assert_eq!((16 * 1024 - 512) * 1024, emu.mmio(MMIO_QUEUE_BASE));
    assert_eq!(0x40, emu.reg(Bank::Sr, 0x26));

    // the reset code went out before the final size code
    let writes: Vec<u8> = emu
        .write_log()
        .iter()
        .filter(|w| w.bank == Bank::Sr && w.index == 0x26)
        .map(|w| w.value)
        .collect();
    assert_eq!(vec![0x01, 0x40], writes);
}
