// Blanking and the VT switch entry points.

use std::rc::Rc;

use crate::context::DeviceContext;
use crate::hw::regs::{SR01_SCREEN_OFF, SR_CLOCKING};
use crate::hw::{Bank, RegisterLock, Regs};
use crate::switch::{SwitchError, SwitchReport};
use crate::tv;

#[cfg(test)]
#[path = "./screen_test.rs"]
mod screen_test;

impl DeviceContext {
    /// Blanks or unblanks the outputs this head drives.
    pub fn blank(&mut self, on: bool) -> Result<(), SwitchError> {
        let _guard = self.begin()?;
        let io = Rc::clone(&self.io);
        let mut hw = io.borrow_mut();
        let mut lock = RegisterLock::acquire(Regs::new(&mut *hw, self.ports), self.caps.legacy_lock);
        if self.role.drives_crt1(&self.output) {
            let bits = if on { SR01_SCREEN_OFF } else { 0 };
            lock.set(Bank::Sr, SR_CLOCKING, !SR01_SCREEN_OFF, bits);
        }
        if self.role.drives_crt2(&self.output) {
            tv::crt2_blank(&mut lock, self.chip.family(), self.detected.bridge, self.output.crt2(), on);
        }
        Ok(())
    }

    /// Takes the display over from the console. The console state is saved
    /// on the first entry, then the last mode (or the first usable one) is
    /// set.
    pub fn enter_display(&mut self) -> Result<SwitchReport, SwitchError> {
        if !self.console_saved {
            self.save_state()?;
            self.console_saved = true;
        }
        let mode = match self.current {
            Some(ref m) => m.clone(),
            None => match self.catalog.first() {
                Some(m) => m.clone(),
                None => {
                    log::error!("{:?} head: no usable mode to enter", self.role);
                    return Err(SwitchError::Replay("no usable mode"));
                }
            },
        };
        self.set_mode(&mode)
    }

    /// Gives the display back to the console.
    pub fn leave_display(&mut self) -> Result<(), SwitchError> {
        self.restore_state()?;
        Ok(())
    }
}
