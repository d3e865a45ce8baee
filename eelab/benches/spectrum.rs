use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use eelab::signal::{add_noise, compute_fft, generate_signal, NoiseConfig, WaveformConfig};

///
/// Hann-windowed single-sided spectrum of a noisy 1 kHz sine at a range of
/// lengths, including a prime length that defeats radix-2 planning.
///
fn spectrum_noisy_sine(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_fft");
    for n in [1024usize, 10_000, 65_536, 100_003] {
        let wave = generate_signal(WaveformConfig {
            frequency: 1000.0,
            duration: n as f64 / 48_000.0,
            sample_rate: 48_000.0,
            ..Default::default()
        })
        .expect("valid waveform");
        let noisy = add_noise(
            &wave.signal,
            NoiseConfig {
                seed: Some(0),
                ..Default::default()
            },
        )
        .expect("valid noise config")
        .noisy_signal;
        group.bench_with_input(BenchmarkId::from_parameter(n), &noisy, |b, x| {
            b.iter(|| black_box(compute_fft(x.as_slice(), 48_000.0).expect("non-empty")));
        });
    }
    group.finish();
}

criterion_group!(benches, spectrum_noisy_sine);
criterion_main!(benches);
