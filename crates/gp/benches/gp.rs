use criterion::{criterion_group, criterion_main, Criterion};
use gpr_core::{GaussianProcess, KernelMethod, PosteriorPredictor, SquaredExponentialKernel};
use linfa::prelude::{Dataset, Fit};
use ndarray::{Array, Array1, Zip};
use ndarray_rand::rand::SeedableRng;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand_xoshiro::Xoshiro256Plus;

fn griewank(x: &Array1<f64>) -> f64 {
    let dim = x.len();
    let d = Array1::linspace(1., dim as f64, dim).mapv(|v| v.sqrt());
    x.mapv(|v| v * v).sum() / 4000. - (x / &d).mapv(|v| v.cos()).fold(1., |acc, x| acc * x) + 1.0
}

fn criterion_kernel(c: &mut Criterion) {
    let mut group = c.benchmark_group("kernel");
    group.sample_size(20);
    for (nt, dim) in [(100, 5), (400, 10)] {
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let xt = Array::random_using((nt, dim), Uniform::new(-600., 600.), &mut rng);
        let kernel = SquaredExponentialKernel::new(1e4).unwrap();
        for method in [KernelMethod::Direct, KernelMethod::Vectorized] {
            group.bench_function(format!("{method} {nt}x{dim}"), |b| {
                b.iter(|| std::hint::black_box(kernel.self_matrix(&xt, method)));
            });
        }
    }
    group.finish();
}

fn criterion_gp(c: &mut Criterion) {
    let mut group = c.benchmark_group("gp");
    group.sample_size(20);
    for (nt, dim) in [(100, 5), (300, 10)] {
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let xt = Array::random_using((nt, dim), Uniform::new(-600., 600.), &mut rng);
        let mut yt: Array1<f64> = Array1::zeros(xt.nrows());
        Zip::from(&mut yt).and(xt.rows()).par_for_each(|y, x| {
            *y = griewank(&x.to_owned());
        });
        let xtest = Array::random_using((nt, dim), Uniform::new(-600., 600.), &mut rng);

        group.bench_function(format!("fit {nt}x{dim}"), |b| {
            b.iter(|| {
                std::hint::black_box(
                    GaussianProcess::<f64>::params()
                        .noise_variance(1e-4)
                        .fit(&Dataset::new(xt.to_owned(), yt.to_owned()))
                        .expect("GP fit error"),
                )
            });
        });

        let gp = GaussianProcess::<f64>::params()
            .noise_variance(1e-4)
            .fit(&Dataset::new(xt.to_owned(), yt.to_owned()))
            .expect("GP fit error");
        group.bench_function(format!("batch {nt}x{dim}"), |b| {
            b.iter(|| std::hint::black_box(gp.batch().posterior(&xtest).expect("batch")));
        });
        group.bench_function(format!("online {nt}x{dim}"), |b| {
            b.iter(|| std::hint::black_box(gp.online().posterior(&xtest).expect("online")));
        });
        group.bench_function(format!("predict_var {nt}x{dim}"), |b| {
            b.iter(|| std::hint::black_box(gp.predict_var(&xtest.view()).expect("var")));
        });
        group.bench_function(format!("online iter {nt}x{dim}"), |b| {
            b.iter(|| {
                let n = gp
                    .online()
                    .iter(xtest.view())
                    .filter_map(|res| res.ok())
                    .count();
                std::hint::black_box(n)
            });
        });
    }
    group.finish();
}

criterion_group!(benches, criterion_kernel, criterion_gp);
criterion_main!(benches);
