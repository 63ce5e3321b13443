use std::cell::RefCell;
use std::rc::Rc;

use pretty_assertions::assert_eq;

use crate::chip::{BridgeFamily, ChipFamily, ChipVariant};
use crate::context::{DeviceContext, HeadRole, ProbeInfo};
use crate::entity::Entity;
use crate::hw::regs::{P1_BLANK, P4_BACKLIGHT, SR_CLOCKING, SR_POWER};
use crate::hw::{Bank, EmulatedAdapter, IoHandle, Ports, RegisterLock, Regs};
use crate::modes::MonitorDescriptor;
use crate::options::Options;
use crate::output::{Crt2Device, PanelInfo};
use crate::power::{power_sequence, PowerState, PowerTargets};

fn panel() -> Crt2Device {
    Crt2Device::Panel(PanelInfo { width: 1024, height: 768, type_code: 2 })
}

fn bridged() -> EmulatedAdapter {
    let mut emu = EmulatedAdapter::new(Ports::default());
    emu.attach_bridge(1, 0xB0);
    emu.set_connection(0x20 | 0x08, 0x02, 0x00);
    emu.set_reg(Bank::Part4, P4_BACKLIGHT, 0x03);
    emu
}

fn sequence(emu: &mut EmulatedAdapter, targets: PowerTargets, state: PowerState) {
    let mut lock = RegisterLock::acquire(Regs::new(emu, Ports::default()), false);
    let sr01 = lock.read(Bank::Sr, SR_CLOCKING);
    power_sequence(&mut lock, ChipFamily::Sis315, BridgeFamily::Sis301B, sr01, targets, state);
}

#[test]
fn sync_bits_per_state() {
    assert_eq!(0x00, PowerState::On.sync_bits());
    assert_eq!(0x40, PowerState::Standby.sync_bits());
    assert_eq!(0x80, PowerState::Suspend.sync_bits());
    assert_eq!(0xC0, PowerState::Off.sync_bits());
    assert_eq!("suspend", format!("{}", PowerState::Suspend));
}

#[test]
fn off_and_back_on() {
    let mut emu = bridged();
    emu.set_reg(Bank::Sr, SR_POWER, 0x05);
    let targets = PowerTargets::for_head(HeadRole::Sole, panel());

    sequence(&mut emu, targets, PowerState::Off);
    assert_eq!(0xC5, emu.reg(Bank::Sr, SR_POWER));
    assert_eq!(0x21, emu.reg(Bank::Sr, SR_CLOCKING));
    assert_eq!(0x01, emu.reg(Bank::Part4, P4_BACKLIGHT));
    assert_eq!(0x20, emu.reg(Bank::Part1, P1_BLANK) & 0x20);
    assert_eq!(1, emu.reset_pulses());

    sequence(&mut emu, targets, PowerState::On);
    assert_eq!(0x05, emu.reg(Bank::Sr, SR_POWER));
    assert_eq!(0x01, emu.reg(Bank::Sr, SR_CLOCKING));
    assert_eq!(0x03, emu.reg(Bank::Part4, P4_BACKLIGHT));
    assert_eq!(0x00, emu.reg(Bank::Part1, P1_BLANK) & 0x20);
    assert_eq!(2, emu.reset_pulses());
}

#[test]
fn standby_keeps_vsync() {
    let mut emu = bridged();
    sequence(&mut emu, PowerTargets { crt1: true, crt2: Crt2Device::None }, PowerState::Standby);
    assert_eq!(0x40, emu.reg(Bank::Sr, SR_POWER));
    assert_eq!(0x03, emu.reg(Bank::Part4, P4_BACKLIGHT));
}

#[test]
fn dual_head_roles_split_the_outputs() {
    assert_eq!(PowerTargets { crt1: true, crt2: Crt2Device::None }, PowerTargets::for_head(HeadRole::Slave, panel()));
    assert_eq!(PowerTargets { crt1: false, crt2: panel() }, PowerTargets::for_head(HeadRole::Master, panel()));
}

fn probe() -> ProbeInfo {
    ProbeInfo {
        pci_id: ChipVariant::Sis315H.pci_id(),
        rel_io: 0x380,
        video_memory_kb: 32 * 1024,
        vbe_modes: Vec::new(),
        monitor: MonitorDescriptor::default(),
    }
}

#[test]
fn each_head_powers_its_own_output() {
    let emu = Rc::new(RefCell::new(bridged()));
    let io: IoHandle = emu.clone();
    let ent = Entity::new(io, &probe(), &Options::default()).unwrap();
    let mut master = DeviceContext::bind(&ent, HeadRole::Master, probe(), Options::default()).unwrap();
    let mut slave = DeviceContext::bind(&ent, HeadRole::Slave, probe(), Options::default()).unwrap();

    master.set_power(PowerState::Off).unwrap();
    assert_eq!(PowerState::Off, master.power_state());
    assert_eq!(PowerState::On, slave.power_state());
    {
        let emu = emu.borrow();
        assert_eq!(0x00, emu.reg(Bank::Sr, SR_POWER));
        assert_eq!(0x01, emu.reg(Bank::Sr, SR_CLOCKING));
        assert_eq!(0x01, emu.reg(Bank::Part4, P4_BACKLIGHT));
    }

    slave.set_power(PowerState::Suspend).unwrap();
    let emu = emu.borrow();
    assert_eq!(0x80, emu.reg(Bank::Sr, SR_POWER));
    assert_eq!(0x21, emu.reg(Bank::Sr, SR_CLOCKING));
    assert_eq!(0x01, emu.reg(Bank::Part4, P4_BACKLIGHT));
}

#[test]
fn crt1_only_power_cycle_comes_back() {
    let mut emu = EmulatedAdapter::new(Ports::default());
    emu.set_reg(Bank::Sr, SR_POWER, 0x05);
    let targets = PowerTargets { crt1: true, crt2: Crt2Device::None };
    sequence(&mut emu, targets, PowerState::Off);
    sequence(&mut emu, targets, PowerState::On);

    assert_eq!(0x05, emu.reg(Bank::Sr, SR_POWER));
    assert_eq!(0x01, emu.reg(Bank::Sr, SR_CLOCKING));
    assert_eq!(0xA3, emu.reg(Bank::Cr, 0x17));
    assert_eq!(0x00, emu.reg(Bank::Cr, 0x63));
}
