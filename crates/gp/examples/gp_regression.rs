use gpr_core::{GaussianProcess, KernelMethod, PosteriorPredictor, SamplingMethod};
use linfa::prelude::*;
use ndarray::{arr2, concatenate, Array, Array1, Array2, Axis};
use ndarray_npy::write_npy;

fn xsinx(x: &Array2<f64>) -> Array1<f64> {
    ((x - 3.5) * ((x - 3.5) / std::f64::consts::PI).mapv(|v| v.sin())).remove_axis(Axis(1))
}

fn main() {
    env_logger::init();

    let xt = arr2(&[[0.0], [5.0], [10.0], [15.0], [18.0], [20.0], [25.0]]);
    let yt = xsinx(&xt);

    println!("Train GP of 'xsinx' at {}", xt.column(0));
    let gp = GaussianProcess::<f64>::params()
        .noise_variance(1e-4)
        .kernel_method(KernelMethod::Vectorized)
        .fit(&Dataset::new(xt, yt))
        .expect("GP fitting");
    println!("{gp}");
    println!("log marginal likelihood = {}", gp.log_marginal_likelihood());

    let xtest = Array::linspace(0., 25., 26).insert_axis(Axis(1));
    let ytest = xsinx(&xtest);

    let batch = gp.batch().posterior(&xtest).expect("GP batch prediction");
    let online = gp.online().posterior(&xtest).expect("GP online prediction");
    let max_gap = (&batch.mean - &online.mean)
        .mapv(f64::abs)
        .fold(0., |acc: f64, &v| acc.max(v));
    println!("Max gap between batch and online means = {max_gap:e}");

    let ysigma = online.variances().mapv(|v| v.max(0.).sqrt());
    println!("Compute prediction errors (x, err(x), sigma(x))");
    println!(
        "{}",
        concatenate![
            Axis(1),
            xtest,
            (&batch.mean - &ytest).insert_axis(Axis(1)),
            ysigma.clone().insert_axis(Axis(1))
        ]
    );

    let trajs = gp
        .sample_with_seed(&xtest, 5, SamplingMethod::EigenValues, 42)
        .expect("GP sampling");

    // dump results for plotting
    let out_dir = "target/gp_regression";
    std::fs::create_dir_all(out_dir).expect("output directory created");
    write_npy(format!("{out_dir}/x.npy"), &xtest).expect("x saved");
    write_npy(format!("{out_dir}/mean.npy"), &batch.mean).expect("mean saved");
    write_npy(format!("{out_dir}/sigma.npy"), &ysigma).expect("sigma saved");
    write_npy(format!("{out_dir}/trajectories.npy"), &trajs).expect("trajectories saved");
    println!("Results saved in {out_dir}");
}
