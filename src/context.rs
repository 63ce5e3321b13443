// Per-head device context.
//
// A context is created once per logical head: `DeviceContext::new` for a
// single head owning the whole adapter, `DeviceContext::bind` for one of
// the two heads of a dual head Entity. Detection, option overrides and the
// mode catalog are settled here; mode switching, save/restore, power and
// blanking are implemented on the context in their own modules.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::bios::VbeModeInfo;
use crate::chip::{caps, BridgeFamily, ChipVariant, FamilyCaps};
use crate::entity::{partition_memory, Entity, MemorySlice, SequenceGuard};
use crate::hw::{IoHandle, Ports, RegisterLock, Regs};
use crate::modes::{Catalog, ModeDescriptor, MonitorDescriptor, ValidationEnv};
use crate::options::Options;
use crate::output::{derive_output, probe_outputs, BindError, Detected, OutputConfig};
use crate::power::PowerState;
use crate::state::RegisterSnapshot;
use crate::switch::{StrategyKind, SwitchError, SwitchState};
use crate::tv::{self, initial_values, TvError, TvParam, TvParamSet, TvQuery};

#[cfg(test)]
#[path = "./context_test.rs"]
mod context_test;

/// Which outputs a head drives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HeadRole {
    /// the only head, drives whatever the output configuration says
    Sole,
    /// dual head: CRT2
    Master,
    /// dual head: CRT1
    Slave,
}

impl HeadRole {
    pub fn drives_crt1(self, output: &OutputConfig) -> bool {
        match self {
            HeadRole::Sole => output.crt1(),
            HeadRole::Master => false,
            HeadRole::Slave => true,
        }
    }

    pub fn drives_crt2(self, output: &OutputConfig) -> bool {
        match self {
            HeadRole::Sole => !output.crt2().is_none(),
            HeadRole::Master => true,
            HeadRole::Slave => false,
        }
    }
}

/// What the probe layer hands over.
#[derive(Clone, Debug, PartialEq)]
pub struct ProbeInfo {
    pub pci_id: u16,
    /// relocated I/O base
    pub rel_io: u16,
    pub video_memory_kb: u32,
    /// mode list reported by the VBE BIOS, if one was queried
    pub vbe_modes: Vec<VbeModeInfo>,
    pub monitor: MonitorDescriptor,
}

pub struct DeviceContext {
    pub(crate) chip: ChipVariant,
    pub(crate) caps: &'static FamilyCaps,
    pub(crate) detected: Detected,
    /// output configuration as derived at bind time
    pub(crate) intended: OutputConfig,
    /// output configuration in effect after the last post-configuration
    pub(crate) output: OutputConfig,
    pub(crate) role: HeadRole,
    pub(crate) options: Options,
    pub(crate) vesa: bool,
    pub(crate) restore_by_set: bool,
    pub(crate) io: IoHandle,
    pub(crate) ports: Ports,
    pub(crate) probe: ProbeInfo,
    pub(crate) memory: MemorySlice,
    pub(crate) catalog: Catalog,
    pub(crate) current: Option<ModeDescriptor>,
    pub(crate) state: SwitchState,
    pub(crate) snapshot: Option<RegisterSnapshot>,
    /// console state has been saved by the first enter_display
    pub(crate) console_saved: bool,
    pub(crate) power: PowerState,
    pub(crate) tv: TvParamSet,
    pub(crate) entity: Option<Rc<RefCell<Entity>>>,
    pub(crate) busy: Rc<Cell<bool>>,
    /// the Entity slot this head holds
    pub(crate) slot: Option<Rc<Cell<bool>>>,
}

impl DeviceContext {
    /// Single head context owning the whole adapter.
    pub fn new(io: IoHandle, probe: ProbeInfo, options: Options) -> Result<DeviceContext, BindError> {
        let busy = Rc::new(Cell::new(false));
        Self::create(io, probe, options, HeadRole::Sole, None, busy)
    }

    /// Binds one head of a dual head Entity. Each role can be bound once.
    pub fn bind(entity: &Rc<RefCell<Entity>>, role: HeadRole, probe: ProbeInfo, mut options: Options) -> Result<DeviceContext, BindError> {
        let (io, busy, slot) = {
            let ent = entity.borrow();
            let slot = ent.bind_head(role)?;
            ent.shared().apply(&mut options);
            (ent.io(), ent.busy_flag(), slot)
        };
        match Self::create(io, probe, options, role, Some(Rc::clone(entity)), busy) {
            Ok(mut ctx) => {
                ctx.slot = Some(slot);
                Ok(ctx)
            }
            Err(e) => {
                slot.set(false);
                Err(e)
            }
        }
    }

    fn create(
        io: IoHandle,
        probe: ProbeInfo,
        mut options: Options,
        role: HeadRole,
        entity: Option<Rc<RefCell<Entity>>>,
        busy: Rc<Cell<bool>>,
    ) -> Result<DeviceContext, BindError> {
        let chip = ChipVariant::from_pci_id(probe.pci_id).ok_or(BindError::UnknownChip(probe.pci_id))?;
        let family_caps = caps(chip.family());
        let ports = Ports::new(probe.rel_io);
        let dual_head = role != HeadRole::Sole;

        if options.validate().is_err() {
            log::warn!("unsupported depth {}, using 16", options.depth);
            options.depth = 16;
        }
        if dual_head && options.use_vesa {
            log::warn!("VESA mode switching cannot drive two heads, disabled");
            options.use_vesa = false;
        }
        if options.use_vesa && probe.vbe_modes.is_empty() {
            log::info!("no VBE mode list reported, mode numbers from the built-in table only");
        }

        let detected = {
            let mut hw = io.borrow_mut();
            let mut lock = RegisterLock::acquire(Regs::new(&mut *hw, ports), family_caps.legacy_lock);
            probe_outputs(&mut lock, chip)
        };
        let output = derive_output(&detected, chip, &options, dual_head)?;

        let restore_by_set = options
            .restore_by_set
            .unwrap_or_else(|| detected.bridge.needs_restore_by_set(chip.family()));

        let mut tv = initial_values(&options.tv, detected.bridge.tv_encoder());
        let memory = match entity {
            Some(ref ent) => {
                let mut ent = ent.borrow_mut();
                ent.seed_tv(&tv);
                tv = ent.tv().clone();
                ent.slice_for(role)
            }
            None => partition_memory(probe.video_memory_kb, family_caps.queue, false).master,
        };

        let vesa = options.use_vesa;
        let mut ctx = DeviceContext {
            chip,
            caps: family_caps,
            detected,
            intended: output.clone(),
            output,
            role,
            options,
            vesa,
            restore_by_set,
            io,
            ports,
            probe,
            memory,
            catalog: Catalog::default(),
            current: None,
            state: SwitchState::Idle,
            snapshot: None,
            console_saved: false,
            power: PowerState::On,
            tv,
            entity,
            busy,
            slot: None,
        };
        ctx.revalidate();
        if ctx.catalog.is_empty() {
            log::warn!("{:?} head of {}: no usable modes", role, chip);
        }
        Ok(ctx)
    }

    pub fn chip(&self) -> ChipVariant {
        self.chip
    }

    pub fn bridge(&self) -> BridgeFamily {
        self.detected.bridge
    }

    pub fn detected(&self) -> &Detected {
        &self.detected
    }

    pub fn role(&self) -> HeadRole {
        self.role
    }

    pub fn output(&self) -> &OutputConfig {
        &self.output
    }

    pub fn intended_output(&self) -> &OutputConfig {
        &self.intended
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn current_mode(&self) -> Option<&ModeDescriptor> {
        self.current.as_ref()
    }

    pub fn state(&self) -> SwitchState {
        self.state
    }

    pub fn memory(&self) -> MemorySlice {
        self.memory
    }

    pub fn restore_by_set(&self) -> bool {
        self.restore_by_set
    }

    /// Marks the adapter as needing restore by re-switching from now on.
    pub fn set_restore_by_set(&mut self, on: bool) {
        self.restore_by_set = on;
    }

    pub fn power_state(&self) -> PowerState {
        self.power
    }

    pub fn snapshot(&self) -> Option<&RegisterSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn strategy_kind(&self) -> StrategyKind {
        if self.vesa {
            StrategyKind::Vesa
        } else if self.caps.native_switch {
            StrategyKind::Native
        } else {
            StrategyKind::Legacy
        }
    }

    pub(crate) fn validation_env(&self) -> ValidationEnv {
        ValidationEnv {
            chip: self.chip,
            bridge: self.detected.bridge,
            output: &self.output,
            role: self.role,
            depth: self.options.depth,
            strategy: self.strategy_kind(),
            vbe_modes: &self.probe.vbe_modes,
            monitor: &self.probe.monitor,
        }
    }

    /// Rebuilds the catalog for the output in effect.
    pub fn revalidate(&mut self) {
        let catalog = Catalog::build(&self.validation_env());
        self.catalog = catalog;
    }

    /// Virtual width in pixels for a mode.
    pub(crate) fn pitch_for(&self, mode: &ModeDescriptor) -> u16 {
        match self.options.virtual_width {
            Some(w) if w >= mode.hdisplay => w,
            _ => mode.hdisplay,
        }
    }

    /// Starts a register sequence, fails if one is already running on this
    /// adapter.
    pub(crate) fn begin(&self) -> Result<SequenceGuard, SwitchError> {
        SequenceGuard::enter(&self.busy)
    }

    /// Dual head switching needs both heads bound.
    pub(crate) fn heads_complete(&self) -> bool {
        match self.entity {
            Some(ref ent) => ent.borrow().heads_bound() == 2,
            None => true,
        }
    }

    /// Sets a TV parameter. The value is clamped to the encoder's range,
    /// cached, and written if a TV is the active CRT2 device. Returns the
    /// clamped value.
    pub fn set_tv_param(&mut self, param: TvParam, value: i32) -> Result<i32, TvError> {
        let encoder = self.detected.bridge.tv_encoder().ok_or(TvError::NoEncoder)?;
        let clamped = tv::clamp_param(encoder, param, value).ok_or(TvError::Unsupported(param, encoder))?;
        if clamped != value {
            log::debug!("{:?} {} clamped to {}", param, value, clamped);
        }
        self.tv.set(param, clamped);
        if let Some(ref ent) = self.entity {
            ent.borrow_mut().tv_mut().set(param, clamped);
        }
        if self.output.tv_active() {
            let io = Rc::clone(&self.io);
            let mut hw = io.borrow_mut();
            let mut lock = RegisterLock::acquire(Regs::new(&mut *hw, self.ports), self.caps.legacy_lock);
            tv::write_param(&mut lock, encoder, param, clamped)?;
        }
        Ok(clamped)
    }

    /// Reads a TV parameter: from the encoder while a TV is active, from
    /// the cache otherwise.
    pub fn tv_param(&self, param: TvParam) -> TvQuery {
        let encoder = match self.detected.bridge.tv_encoder() {
            Some(e) => e,
            None => return TvQuery::Unsupported,
        };
        if tv::param_range(encoder, param).is_none() {
            return TvQuery::Unsupported;
        }
        if self.output.tv_active() {
            let mut hw = self.io.borrow_mut();
            let mut lock = RegisterLock::acquire(Regs::new(&mut *hw, self.ports), self.caps.legacy_lock);
            if let Some(v) = tv::read_param(&mut lock, encoder, param) {
                return TvQuery::Value(v);
            }
        }
        let cached = match self.entity {
            Some(ref ent) => ent.borrow().tv().get(param),
            None => self.tv.get(param),
        };
        match cached {
            Some(v) => TvQuery::Value(v),
            None => TvQuery::Unset,
        }
    }

    /// Writes the cached TV parameters to the encoder.
    pub(crate) fn reapply_tv(&mut self, regs: &mut Regs) {
        if !self.output.tv_active() {
            return;
        }
        if let Some(ref ent) = self.entity {
            self.tv = ent.borrow().tv().clone();
        }
        if let Some(encoder) = self.detected.bridge.tv_encoder() {
            tv::reapply(regs, encoder, &self.tv);
        }
    }
}

impl Drop for DeviceContext {
    fn drop(&mut self) {
        if let Some(ref slot) = self.slot {
            slot.set(false);
            log::debug!("{:?} head released", self.role);
        }
    }
}
