use pretty_assertions::assert_eq;

use crate::bios::VbeModeInfo;
use crate::chip::{caps, BridgeFamily, ChipFamily, ChipVariant};
use crate::context::HeadRole;
use crate::modes::{
    candidate_modes, dmt_modes, native_mode_lookup, rate_index, rate_refresh, synthesize, validate_mode, Catalog,
    ModeDescriptor, ModeFlags, MonitorDescriptor, RejectReason, ValidationEnv, SLAVE_ONLY_MODES,
};
use crate::output::{panel_from_type, Crt2Device, OutputConfig, TvPlug, TvStandard};
use crate::switch::StrategyKind;

fn env<'a>(output: &'a OutputConfig, monitor: &'a MonitorDescriptor, vbe: &'a [VbeModeInfo]) -> ValidationEnv<'a> {
    ValidationEnv {
        chip: ChipVariant::Sis315H,
        bridge: BridgeFamily::Sis301B,
        output,
        role: HeadRole::Sole,
        depth: 16,
        strategy: StrategyKind::Native,
        vbe_modes: vbe,
        monitor,
    }
}

fn mode(name: &str) -> ModeDescriptor {
    let mut all = dmt_modes();
    all.extend(crate::modes::synthetic_lowres());
    match all.into_iter().find(|m| m.name == name) {
        Some(m) => m,
        None => panic!("no builtin mode {}", name),
    }
}

#[test]
fn builtin_names() {
    let names: Vec<String> = dmt_modes().iter().take(3).map(|m| m.name.clone()).collect();
    assert_eq!(vec!["640x480@60", "640x480@73", "640x480@75"], names);
    assert_eq!("320x200@70", crate::modes::synthetic_lowres()[0].name);
}

#[test]
fn rate_index_exact_and_nearest() {
    assert_eq!(2, rate_index(1024, 768, 60.0));
    assert_eq!(4, rate_index(1024, 768, 75.0));
    // slightly above a variant keeps the lower one
    assert_eq!(2, rate_index(1024, 768, 61.8));
    // slightly below a variant takes it
    assert_eq!(4, rate_index(1024, 768, 72.6));
    // between two variants falls back to the lower
    assert_eq!(2, rate_index(1024, 768, 65.0));
    assert_eq!(Some(60), rate_refresh(1024, 768, 2));
}

#[test]
fn rate_index_defaults() {
    // unknown refresh: the 60 Hz variant
    assert_eq!(2, rate_index(1280, 1024, 150.0));
    // unknown resolution
    assert_eq!(1, rate_index(1000, 700, 60.0));
    // below every variant
    assert_eq!(2, rate_index(800, 600, 40.0));
    assert_eq!(2, rate_index(1024, 768, 30.0));
}

#[test]
fn rate_index_is_idempotent() {
    for m in dmt_modes() {
        let a = rate_index(m.hdisplay, m.vdisplay, m.refresh_hz());
        let b = rate_index(m.hdisplay, m.vdisplay, m.refresh_hz());
        assert_eq!(a, b);
    }
}

#[test]
fn panel_prunes_larger_and_interlaced() {
    let panel = panel_from_type(0x02).unwrap();
    let output = OutputConfig::mirror(Crt2Device::Panel(panel));
    let monitor = MonitorDescriptor::default();
    let catalog = Catalog::build(&env(&output, &monitor, &[]));

    assert!(catalog.find(1024, 768, 60).is_some());
    assert!(catalog.find(1280, 1024, 60).is_none());
    assert_eq!(Some(&RejectReason::ExceedsPanel(1024, 768)), catalog.reason_for("1280x1024@60"));
    assert_eq!(Some(&RejectReason::InterlaceOnPanel), catalog.reason_for("1024x768@87"));
}

#[test]
fn slave_head_ignores_the_panel() {
    let panel = panel_from_type(0x02).unwrap();
    let output = OutputConfig::dual_head(Crt2Device::Panel(panel)).unwrap();
    let monitor = MonitorDescriptor::default();
    let mut e = env(&output, &monitor, &[]);
    e.role = HeadRole::Slave;
    assert!(validate_mode(&e, &mode("1280x1024@60")).is_ok());
    e.role = HeadRole::Master;
    assert_eq!(
        Err(RejectReason::ExceedsPanel(1024, 768)),
        validate_mode(&e, &mode("1280x1024@60"))
    );
}

#[test]
fn dual_head_rejects_slave_only_modes() {
    let output = OutputConfig::dual_head(Crt2Device::SecondVga).unwrap();
    let monitor = MonitorDescriptor::default();
    let mut e = env(&output, &monitor, &[]);
    for role in &[HeadRole::Master, HeadRole::Slave] {
        e.role = *role;
        let catalog = Catalog::build(&e);
        for m in catalog.modes() {
            assert!(!SLAVE_ONLY_MODES.contains(&m.size()), "{} accepted", m.name);
        }
        assert_eq!(Some(&RejectReason::SlaveOnly), catalog.reason_for("640x400@70"));
    }

    let mirror = OutputConfig::mirror(Crt2Device::SecondVga);
    let catalog = Catalog::build(&env(&mirror, &monitor, &[]));
    assert!(catalog.find_named("320x200@70").is_some());
}

#[test]
fn tv_size_limit_per_encoder() {
    let tv = Crt2Device::Tv { standard: TvStandard::Ntsc, plug: TvPlug::Composite };
    let output = OutputConfig::mirror(tv);
    let monitor = MonitorDescriptor::default();
    let mut e = env(&output, &monitor, &[]);
    assert!(validate_mode(&e, &mode("1024x768@60")).is_ok());
    assert_eq!(
        Err(RejectReason::TvSize(1024, 768)),
        validate_mode(&e, &mode("1280x1024@60"))
    );
    e.bridge = BridgeFamily::Chrontel7019;
    assert_eq!(Err(RejectReason::TvSize(800, 600)), validate_mode(&e, &mode("1024x768@60")));
    // Chrontel cannot doublescan
    assert_eq!(Err(RejectReason::Synthetic), validate_mode(&e, &mode("320x240@60")));
}

#[test]
fn dot_clock_limits() {
    let output = OutputConfig::mirror(Crt2Device::SecondVga);
    let monitor = MonitorDescriptor::default();
    let mut e = env(&output, &monitor, &[]);
    let fast = ModeDescriptor::new(175_500, [1600, 1664, 1856, 2160], [1200, 1201, 1204, 1250], ModeFlags::empty());
    assert!(validate_mode(&e, &fast).is_ok());
    e.bridge = BridgeFamily::Sis301;
    assert_eq!(
        Err(RejectReason::DotClock(175_500, 162_000)),
        validate_mode(&e, &fast).map(|_| ())
    );

    let crt1 = OutputConfig::crt1_only();
    let mut e = env(&crt1, &monitor, &[]);
    e.chip = ChipVariant::Sis5597;
    e.depth = 24;
    assert_eq!(
        Err(RejectReason::DotClock(94_500, 85_000)),
        validate_mode(&e, &mode("1024x768@85")).map(|_| ())
    );
}

#[test]
fn monitor_sync_range_prunes_crt1_modes() {
    let output = OutputConfig::crt1_only();
    let monitor = MonitorDescriptor {
        modes: Vec::new(),
        hsync_khz: Some((30.0, 50.0)),
        vrefresh_hz: Some((50.0, 75.0)),
    };
    let catalog = Catalog::build(&env(&output, &monitor, &[]));
    assert!(catalog.find(1024, 768, 60).is_some());
    assert_eq!(Some(&RejectReason::SyncRange), catalog.reason_for("1024x768@75"));
    assert_eq!(Some(&RejectReason::SyncRange), catalog.reason_for("640x480@85"));
}

#[test]
fn vesa_numbers_from_table_then_bios_list() {
    let output = OutputConfig::crt1_only();
    let monitor = MonitorDescriptor::default();
    let list = [VbeModeInfo { mode: 0x130, width: 1600, height: 1200, bpp: 16 }];
    let mut e = env(&output, &monitor, &list);
    e.strategy = StrategyKind::Vesa;

    let m = validate_mode(&e, &mode("1024x768@60")).unwrap();
    assert_eq!(Some(0x117), m.bios_mode);
    let m = validate_mode(&e, &mode("1600x1200@60")).unwrap();
    assert_eq!(Some(0x130), m.bios_mode);
    assert_eq!(
        Err(RejectReason::NoBiosMode(16)),
        validate_mode(&e, &mode("1152x864@75")).map(|_| ())
    );
}

#[test]
fn native_ids_and_rate_index_attached() {
    let output = OutputConfig::crt1_only();
    let monitor = MonitorDescriptor::default();
    let m = validate_mode(&env(&output, &monitor, &[]), &mode("800x600@75")).unwrap();
    assert_eq!(Some(0x47), m.bios_mode);
    assert_eq!(Some(4), m.rate_index);
    assert_eq!(Some((800, 600, 16)), native_mode_lookup(0x47));
}

#[test]
fn old_family_gets_precomputed_modes_by_depth() {
    let old = caps(ChipFamily::Old);
    let at8 = candidate_modes(old, &[], 8);
    let hi = at8.iter().find(|m| m.name == "1600x1200@60").unwrap();
    assert!(hi.flags.contains(ModeFlags::PRECOMPUTED));
    assert!(hi.clock_regs.is_some());
    let sxga = at8.iter().filter(|m| m.name == "1280x1024@75").count();
    assert_eq!(1, sxga);

    let at24 = candidate_modes(old, &[], 24);
    assert!(at24.iter().all(|m| !m.flags.contains(ModeFlags::PRECOMPUTED)));
    // no doublescan timings on the old family
    assert!(at24.iter().all(|m| !m.flags.contains(ModeFlags::SYNTHETIC)));
}

#[test]
fn declared_modes_replace_the_dmt_list() {
    let declared = vec![mode("800x600@60"), mode("640x480@60")];
    let list = candidate_modes(caps(ChipFamily::Sis300), &declared, 16);
    assert_eq!("800x600@60", list[0].name);
    assert_eq!("640x480@60", list[1].name);
    assert!(list.iter().all(|m| m.size() != (1024, 768)));
}

#[test]
fn synthesizer_gets_close() {
    for target in &[25_175u32, 40_000, 65_000, 108_000, 162_000] {
        let regs = synthesize(*target).unwrap();
        let err = (regs.khz() as i64 - i64::from(*target)).abs();
        assert!(err * 200 < i64::from(*target), "{} kHz: got {}", target, regs.khz());
    }
}

#[test]
fn disordered_timings_are_pruned() {
    let output = OutputConfig::crt1_only();
    let short_total = ModeDescriptor::new(25_175, [640, 656, 752, 32], [480, 490, 492, 525], ModeFlags::empty());
    let sync_before_display = ModeDescriptor::new(25_175, [640, 656, 752, 800], [480, 470, 492, 525], ModeFlags::empty());
    let monitor = MonitorDescriptor::default();
    let e = env(&output, &monitor, &[]);
    assert_eq!(Err(RejectReason::BadTiming), validate_mode(&e, &short_total));
    assert_eq!(Err(RejectReason::BadTiming), validate_mode(&e, &sync_before_display));

    let declared = vec![short_total, sync_before_display, mode("640x480@60")];
    let catalog = Catalog::from_candidates(&e, &declared);
    assert_eq!(1, catalog.modes().len());
    assert_eq!(2, catalog.rejected().len());
    assert!(dmt_modes().iter().all(|m| m.has_ordered_timing()));
}
