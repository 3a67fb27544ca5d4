use std::env;
use std::path::PathBuf;

use churnlab_generate::{GenerationEngine, GeneratorConfig};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut args = env::args().skip(1);
    let mut config = GeneratorConfig::default();
    let mut out_dir = PathBuf::from("data");

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--customers" => {
                config.customers = args.next().ok_or("missing --customers value")?.parse()?
            }
            "--seed" => config.seed = Some(args.next().ok_or("missing --seed value")?.parse()?),
            "--out" => out_dir = args.next().map(PathBuf::from).ok_or("missing --out path")?,
            _ => return Err(format!("unexpected argument '{arg}'").into()),
        }
    }

    let result = GenerationEngine::new(config).run(&out_dir)?;

    println!("raw={}", result.raw_path.display());
    println!("rows_written={}", result.report.rows_written);
    Ok(())
}
