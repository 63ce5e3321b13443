// Randomized sweeps over adapter configurations.

use std::cell::RefCell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use rand::{Rng, SeedableRng};
use rand_xorshift::XorShiftRng;

use sisdisplay::chip::{caps, ChipVariant, TvEncoder, ALL_VARIANTS};
use sisdisplay::hw::{EmulatedAdapter, IoHandle, Ports};
use sisdisplay::modes::MonitorDescriptor;
use sisdisplay::output::{BindError, OutputConfig, Relation};
use sisdisplay::tv::{param_range, TvQuery, ALL_PARAMS};
use sisdisplay::{DeviceContext, Entity, HeadRole, Options, ProbeInfo};

const ROUNDS: usize = 40;

/// CR32 connection bits: CRT1 alone, or with a panel, a TV or a second VGA
const CONNECTIONS: [u8; 5] = [0x20, 0x20 | 0x08, 0x20 | 0x04, 0x20 | 0x02, 0x20 | 0x10];

fn context(rng: &mut XorShiftRng) -> (Rc<RefCell<EmulatedAdapter>>, DeviceContext) {
    let mut emu = EmulatedAdapter::new(Ports::default());
    emu.attach_bridge(1, [0xB0, 0xC0][rng.gen_range(0, 2)]);
    let cr32 = CONNECTIONS[rng.gen_range(0, CONNECTIONS.len())];
    emu.set_connection(cr32, 0x02, 0x00);
    let emu = Rc::new(RefCell::new(emu));

    let force_crt1 = match rng.gen_range(0, 3) {
        0 => None,
        1 => Some(true),
        _ => Some(false),
    };
    let depth = [8, 16, 24][rng.gen_range(0, 3)];
    let opts = Options { force_crt1, depth, ..Options::default() };
    let probe = ProbeInfo {
        pci_id: ChipVariant::Sis650.pci_id(),
        rel_io: 0x380,
        video_memory_kb: 32 * 1024,
        vbe_modes: Vec::new(),
        monitor: MonitorDescriptor::default(),
    };
    let io: IoHandle = emu.clone();
    let ctx = match DeviceContext::new(io, probe, opts) {
        Ok(ctx) => ctx,
        Err(e) => panic!("bind failed: {}", e),
    };
    (emu, ctx)
}

/// Part4 id and revision of a SiS bridge, or CR37 encoder bits without one
const BRIDGES: [(u8, u8, u8); 7] = [
    (0, 0x00, 0x00),
    (1, 0xB0, 0x00),
    (1, 0xC0, 0x00),
    (2, 0xE0, 0x00),
    // LVDS
    (0, 0x00, 0x04),
    // LVDS with a Chrontel encoder
    (0, 0x00, 0x06),
    // Chrontel
    (0, 0x00, 0x08),
];

fn any_adapter(rng: &mut XorShiftRng) -> (IoHandle, ProbeInfo, Options) {
    let chip = ALL_VARIANTS[rng.gen_range(0, ALL_VARIANTS.len())];
    let (id, revision, cr37) = BRIDGES[rng.gen_range(0, BRIDGES.len())];
    let mut emu = EmulatedAdapter::new(Ports::default());
    if id != 0 {
        emu.attach_bridge(id, revision);
    }
    if chip == ChipVariant::Sis6326 && rng.gen() {
        // integrated TV encoder present and attached
        emu.set_tv6326_reg(0x00, 0x80 | 0x04);
    }
    let cr32 = CONNECTIONS[rng.gen_range(0, CONNECTIONS.len())];
    emu.set_connection(cr32, 0x02, cr37);

    let force_crt1 = match rng.gen_range(0, 3) {
        0 => None,
        1 => Some(true),
        _ => Some(false),
    };
    let depth = [8, 16, 24][rng.gen_range(0, 3)];
    let opts = Options { force_crt1, depth, ..Options::default() };
    let probe = ProbeInfo {
        pci_id: chip.pci_id(),
        rel_io: 0x380,
        video_memory_kb: 32 * 1024,
        vbe_modes: Vec::new(),
        monitor: MonitorDescriptor::default(),
    };
    (Rc::new(RefCell::new(emu)), probe, opts)
}

fn check_single_head(out: &OutputConfig) {
    let expected = if out.crt1() && !out.crt2().is_none() {
        Relation::Mirror
    } else {
        Relation::Single
    };
    assert_eq!(expected, out.relation(), "{}", out);
    assert!(out.crt1() || !out.crt2().is_none(), "{}", out);
    assert_eq!(Some(out.relation()), out.flags().relation());
}

#[test]
fn relation_matches_the_active_outputs() {
    let mut rng = XorShiftRng::seed_from_u64(0x5153);
    for _ in 0..ROUNDS {
        let (_emu, ctx) = context(&mut rng);
        check_single_head(ctx.output());
    }
}

#[test]
fn relation_holds_on_every_chip_and_bridge() {
    let mut rng = XorShiftRng::seed_from_u64(0x0630);
    for _ in 0..ROUNDS * 4 {
        let (io, probe, opts) = any_adapter(&mut rng);
        let chip = ChipVariant::from_pci_id(probe.pci_id).unwrap();
        let ctx = match DeviceContext::new(io, probe, opts) {
            Ok(ctx) => ctx,
            Err(e) => panic!("{} bind failed: {}", chip, e),
        };
        check_single_head(ctx.output());
    }
}

#[test]
fn dual_head_binds_are_always_dual_head() {
    let mut rng = XorShiftRng::seed_from_u64(0x0740);
    for _ in 0..ROUNDS * 4 {
        let (io, probe, opts) = any_adapter(&mut rng);
        let chip = ChipVariant::from_pci_id(probe.pci_id).unwrap();
        let ent = match Entity::new(io, &probe, &opts) {
            Ok(ent) => ent,
            Err(e) => {
                assert!(!caps(chip.family()).dual_head, "{}: {}", chip, e);
                continue;
            }
        };
        let master = match DeviceContext::bind(&ent, HeadRole::Master, probe.clone(), opts.clone()) {
            Ok(ctx) => ctx,
            Err(e) => {
                match e {
                    BindError::NoCrt2 | BindError::NoIndependentTiming(_) => {}
                    other => panic!("{}: unexpected {}", chip, other),
                }
                assert_eq!(0, ent.borrow().heads_bound());
                continue;
            }
        };
        let slave = DeviceContext::bind(&ent, HeadRole::Slave, probe, opts).unwrap();
        for out in &[master.output(), slave.output()] {
            assert_eq!(Relation::DualHead, out.relation(), "{}", out);
            assert!(out.crt1() && !out.crt2().is_none(), "{}", out);
            assert_eq!(Some(Relation::DualHead), out.flags().relation());
        }
    }
}

#[test]
fn switching_twice_gives_the_same_rate_index() {
    let mut rng = XorShiftRng::seed_from_u64(0x0315);
    for _ in 0..ROUNDS {
        let (_emu, mut ctx) = context(&mut rng);
        if ctx.catalog().is_empty() {
            continue;
        }
        let modes = ctx.catalog().modes().to_vec();
        let mode = &modes[rng.gen_range(0, modes.len())];
        let first = ctx.set_mode(mode).unwrap();
        let second = ctx.set_mode(mode).unwrap();
        assert_eq!(first.rate_index, second.rate_index);
        assert_eq!(mode.rate_index, Some(first.rate_index));
        assert_eq!(first.relation, second.relation);
    }
}

#[test]
fn tv_values_stay_in_range() {
    let mut rng = XorShiftRng::seed_from_u64(0x0301);
    for _ in 0..ROUNDS {
        let (_emu, mut ctx) = context(&mut rng);
        let param = ALL_PARAMS[rng.gen_range(0, ALL_PARAMS.len())];
        let value = rng.gen_range(-100, 100);
        match ctx.set_tv_param(param, value) {
            Ok(stored) => {
                let (min, max) = param_range(TvEncoder::SisBridge, param).unwrap();
                assert!(min <= stored && stored <= max);
                if min <= value && value <= max {
                    assert_eq!(value, stored);
                }
                assert_eq!(TvQuery::Value(stored), ctx.tv_param(param));
                // storing the clamped value again is a no-op
                assert_eq!(Ok(stored), ctx.set_tv_param(param, stored));
            }
            Err(_) => assert_eq!(TvQuery::Unsupported, ctx.tv_param(param)),
        }
    }
}
