use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use ndarray::Array2;
use ndarray_npy::{read_npy, write_npy};
use std::path::{Path, PathBuf};
use wingp::calib::{Algorithm, CalibratedModel, CalibrationConfig};
use wingp::gp::{metrics, WindowedGpParams};
use wingp::ParamGuard;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum AlgorithmArg {
    Slsqp,
    Cobyla,
}

impl From<AlgorithmArg> for Algorithm {
    fn from(algo: AlgorithmArg) -> Self {
        match algo {
            AlgorithmArg::Slsqp => Algorithm::Slsqp,
            AlgorithmArg::Cobyla => Algorithm::Cobyla,
        }
    }
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Calibrate hyperparameters on a raw training dataset and save the model
    Calibrate {
        /// Training dataset (.npy), trailing columns are targets
        #[arg(short, long)]
        data: PathBuf,
        /// Number of past observations used to predict the next one
        #[arg(short, long, default_value_t = 10)]
        window: usize,
        /// Number of target columns
        #[arg(short, long, default_value_t = 1)]
        targets: usize,
        /// Model output file (.json)
        #[arg(short, long, default_value = "model.json")]
        output: PathBuf,
        /// Optimization algorithm
        #[arg(short, long, value_enum, default_value_t = AlgorithmArg::Slsqp)]
        algorithm: AlgorithmArg,
        /// Max number of objective evaluations
        #[arg(long, default_value_t = 200)]
        max_eval: usize,
    },
    /// Predict targets of a raw dataset with a saved model
    Predict {
        /// Dataset (.npy), trailing columns are targets
        #[arg(short, long)]
        data: PathBuf,
        /// Model file (.json)
        #[arg(short, long, default_value = "model.json")]
        model: PathBuf,
        /// Output directory of means.npy and std_devs.npy
        #[arg(short, long, default_value = ".")]
        outdir: PathBuf,
    },
}

fn read_dataset(path: &Path) -> Result<Array2<f64>> {
    let data: Array2<f64> =
        read_npy(path).with_context(|| format!("cannot read dataset {}", path.display()))?;
    info!("Dataset {} loaded: {:?}", path.display(), data.dim());
    Ok(data)
}

fn calibrate(
    data: &Path,
    window: usize,
    targets: usize,
    output: &Path,
    algorithm: AlgorithmArg,
    max_eval: usize,
) -> Result<()> {
    let data = read_dataset(data)?;
    let params = WindowedGpParams::new(window).n_targets(targets).check()?;
    let config = CalibrationConfig::default()
        .algorithm(algorithm.into())
        .max_eval(max_eval);
    let model = CalibratedModel::fit(&data, params, config)?;
    if let Some(calibration) = model.calibration() {
        info!("Calibrated {}", calibration);
    }
    model.save(output)?;
    Ok(())
}

fn predict(data: &Path, model: &Path, outdir: &Path) -> Result<()> {
    let data = read_dataset(data)?;
    let model: CalibratedModel = CalibratedModel::load(model)
        .with_context(|| format!("cannot load model {}", model.display()))?;
    info!("Model hyperparameters {}", model.hyperparameters());

    let prediction = model.predict(&data)?;
    if !outdir.is_dir() {
        std::fs::create_dir_all(outdir)?;
    }
    write_npy(outdir.join("means.npy"), &prediction.means)?;
    write_npy(outdir.join("std_devs.npy"), &prediction.std_devs)?;

    let rmse = metrics::rmse(&prediction.means, &prediction.actual)?;
    let mae = metrics::mae(&prediction.means, &prediction.actual)?;
    for (i, (rmse, mae)) in rmse.iter().zip(mae.iter()).enumerate() {
        info!("Target {}: RMSE={:.6} MAE={:.6}", i, rmse, mae);
    }
    info!(
        "{} predictions written in {}",
        prediction.means.nrows(),
        outdir.display()
    );
    Ok(())
}

fn main() -> Result<()> {
    let env = env_logger::Env::new().filter_or("WINGP_LOG", "info");
    env_logger::Builder::from_env(env).init();

    let cli = Cli::parse();
    match &cli.command {
        Commands::Calibrate {
            data,
            window,
            targets,
            output,
            algorithm,
            max_eval,
        } => calibrate(data, *window, *targets, output, *algorithm, *max_eval),
        Commands::Predict {
            data,
            model,
            outdir,
        } => predict(data, model, outdir),
    }
}
