#[macro_use]
extern crate criterion;

use criterion::Criterion;

use sisdisplay::chip::{BridgeFamily, ChipVariant};
use sisdisplay::modes::{dmt_modes, validate_mode, Catalog, MonitorDescriptor, ValidationEnv};
use sisdisplay::output::{Crt2Device, OutputConfig, PanelInfo};
use sisdisplay::switch::StrategyKind;
use sisdisplay::HeadRole;

fn build_catalog(c: &mut Criterion) {
    let output = OutputConfig::mirror(Crt2Device::Panel(PanelInfo { width: 1024, height: 768, type_code: 2 }));
    let monitor = MonitorDescriptor::default();

    c.bench_function("build mirror catalog", move |b| {
        let env = ValidationEnv {
            chip: ChipVariant::Sis650,
            bridge: BridgeFamily::Sis301B,
            output: &output,
            role: HeadRole::Sole,
            depth: 16,
            strategy: StrategyKind::Native,
            vbe_modes: &[],
            monitor: &monitor,
        };
        b.iter(|| Catalog::build(&env))
    });
}

fn validate_dmt(c: &mut Criterion) {
    let output = OutputConfig::crt1_only();
    let monitor = MonitorDescriptor::default();
    let modes = dmt_modes();

    c.bench_function("validate dmt list", move |b| {
        b.iter(|| {
            let env = ValidationEnv {
                chip: ChipVariant::Sis315H,
                bridge: BridgeFamily::None,
                output: &output,
                role: HeadRole::Sole,
                depth: 24,
                strategy: StrategyKind::Native,
                vbe_modes: &[],
                monitor: &monitor,
            };
            modes.iter().filter(|m| validate_mode(&env, m).is_ok()).count()
        })
    });
}

criterion_group!(benches, build_catalog, validate_dmt);
criterion_main!(benches);
