use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use dasp_signal::{rate, Signal};
use eelab::kernel::KernelLifecycle;
use eelab::signal::filter::design::{ButterConfig, ButterKernel, FilterBandType};
use eelab::signal::filter::{filter_signal, Cutoff, SosFiltFiltConfig, SosFiltFiltKernel};
use eelab::signal::traits::{IirDesign, SosFiltFilt1D};

fn sine(sample_hz: f64, hz: f64, seconds: usize) -> Vec<f64> {
    let mut signal = rate(sample_hz).const_hz(hz).sine();
    (0..seconds * sample_hz as usize)
        .map(|_| signal.next())
        .collect()
}

///
/// Butterworth bandpass 10 to 50 Hz over 10 seconds of a 1666 Hz-sampled sine,
/// at increasing orders.
///
fn butter_bandpass_sosfiltfilt(c: &mut Criterion) {
    let sin_wave = sine(1666.0, 25.0, 10);
    let mut group = c.benchmark_group("sosfiltfilt_bandpass");
    for order in [2usize, 4, 10] {
        let sos = ButterKernel::try_new(ButterConfig {
            order,
            wn: vec![10.0, 50.0],
            btype: FilterBandType::Bandpass,
            fs: Some(1666.0),
        })
        .expect("butter kernel config should be valid")
        .run_alloc()
        .expect("butter kernel should produce sections");
        let kernel =
            SosFiltFiltKernel::try_new(SosFiltFiltConfig { sos }).expect("valid sos config");
        group.bench_with_input(BenchmarkId::from_parameter(order), &sin_wave, |b, x| {
            b.iter(|| {
                black_box(
                    kernel
                        .run_alloc(x.as_slice())
                        .expect("benchmark input should satisfy sosfiltfilt preconditions"),
                );
            });
        });
    }
    group.finish();
}

///
/// Design and apply in one call, as the request path does.
///
fn filter_signal_lowpass(c: &mut Criterion) {
    let sin_wave = sine(10_000.0, 440.0, 1);
    c.bench_function("filter_signal_lowpass_1s", |b| {
        b.iter(|| {
            black_box(
                filter_signal(
                    sin_wave.as_slice(),
                    10_000.0,
                    FilterBandType::Lowpass,
                    Cutoff::Single(1000.0),
                    4,
                )
                .expect("valid request"),
            );
        });
    });
}

criterion_group!(benches, butter_bandpass_sosfiltfilt, filter_signal_lowpass);
criterion_main!(benches);
