// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use kurbo::Rect;
use tableau_region::Region;

#[derive(Clone)]
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_f64(&mut self, upper: f64) -> f64 {
        // Numerical Recipes LCG parameters.
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        f64::from((self.0 >> 40) as u32) / f64::from(1_u32 << 24) * upper
    }
}

/// Pixel-aligned damage rectangles scattered over a 1024x768 surface.
fn damage_rects(n: usize, seed: u64) -> Vec<Rect> {
    let mut rng = Lcg::new(seed);
    (0..n)
        .map(|_| {
            let x = rng.next_f64(1000.0).floor();
            let y = rng.next_f64(740.0).floor();
            let w = 4.0 + rng.next_f64(60.0).floor();
            let h = 4.0 + rng.next_f64(40.0).floor();
            Rect::new(x, y, x + w, y + h)
        })
        .collect()
}

fn bench_region(c: &mut Criterion) {
    let mut group = c.benchmark_group("tableau_region");
    group.sample_size(50);

    for &n in &[16_usize, 64, 256] {
        let rects = damage_rects(n, 0x7AB1_EA00_0000_0001);
        group.bench_function(format!("union_rect(n={n})"), |b| {
            b.iter(|| {
                let mut region = Region::new();
                for r in &rects {
                    region.union_rect(*r);
                }
                black_box(region)
            });
        });

        let region: Region = rects.iter().copied().collect();
        let visible = Region::from_rect(Rect::new(100.0, 100.0, 700.0, 500.0));
        group.bench_function(format!("intersect(n={n})"), |b| {
            b.iter(|| black_box(Region::intersect(&region, &visible)));
        });

        group.bench_function(format!("collapse(n={n})"), |b| {
            b.iter_batched(
                || region.clone(),
                |mut r| {
                    r.collapse();
                    black_box(r)
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_region);
criterion_main!(benches);
