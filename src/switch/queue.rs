// Command queue enable, done as a side effect of bridge pre-configuration.
//
// 300 family: TurboQueue, a fixed 512 KiB ring at the top of video memory,
// position in 64 KiB units in SR26 and SR27 bits 1:0.
// 315 family: the queue has to be reset before it can be resized, which is
// done by writing the current read pointer into the write pointer.

use crate::chip::QueueKind;
use crate::hw::regs::{MMIO_QUEUE_BASE, MMIO_QUEUE_READ_PTR, MMIO_QUEUE_WRITE_PTR, SR_QUEUE_CTRL, SR_QUEUE_THRESHOLD};
use crate::hw::{Bank, Regs};
use crate::options::QueueMode;

#[cfg(test)]
#[path = "./queue_test.rs"]
mod queue_test;

const DEBUG_QUEUE: bool = false;

pub const QUEUE_SIZE_KB: u32 = 512;

const TURBO_ENABLE: u8 = 0xF0;

const MMIO_RESET: u8 = 0x01;
const MMIO_THRESHOLD: u8 = 0x1F;
/// SR26 size code for 512 KiB
const MMIO_SIZE_512K: u8 = 0x00;
const MMIO_FEED_MMIO: u8 = 0x20;
const MMIO_FEED_VRAM: u8 = 0x40;

/// Enables the queue at the top of `video_memory_kb`.
pub fn enable_queue(regs: &mut Regs, kind: QueueKind, mode: QueueMode, video_memory_kb: u32) {
    let base_kb = video_memory_kb.saturating_sub(QUEUE_SIZE_KB);
    match kind {
        QueueKind::TurboQueue => {
            let pos = base_kb / 64;
            regs.write(Bank::Sr, SR_QUEUE_CTRL, (pos & 0xFF) as u8);
            regs.set(Bank::Sr, SR_QUEUE_THRESHOLD, 0xFC, TURBO_ENABLE | ((pos >> 8) & 0x03) as u8);
            if DEBUG_QUEUE {
                log::debug!("turbo queue at {} KiB", base_kb);
            }
        }
        QueueKind::MmioQueue => {
            regs.write(Bank::Sr, SR_QUEUE_THRESHOLD, MMIO_THRESHOLD);
            regs.write(Bank::Sr, SR_QUEUE_CTRL, MMIO_RESET);
            let read_ptr = regs.mmio_in32(MMIO_QUEUE_READ_PTR);
            regs.mmio_out32(MMIO_QUEUE_WRITE_PTR, read_ptr);
            let feed = match mode {
                QueueMode::Mmio => MMIO_FEED_MMIO,
                QueueMode::Vram => MMIO_FEED_VRAM,
            };
            regs.write(Bank::Sr, SR_QUEUE_CTRL, MMIO_SIZE_512K | feed);
            regs.mmio_out32(MMIO_QUEUE_BASE, base_kb * 1024);
            if DEBUG_QUEUE {
                log::debug!("{:?} fed queue at {} KiB, tail {:08X}", mode, base_kb, read_ptr);
            }
        }
    }
}
