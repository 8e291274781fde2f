//! Process entry point (spec §6): logging bring-up, panic-hook
//! installation, config loading, pipeline construction, and exit-code
//! mapping. CLI flag parsing and the exact on-disk layout are out of scope
//! of the core's engineering value (spec §1) — this binary's only job is to
//! wire a config file into the core and map its outcome to a process exit
//! code an operator can script against.

mod engine;

use std::process::ExitCode;

use ct_core::{Error, Result};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
	tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();
}

fn install_panic_hook() {
	let default_hook = std::panic::take_hook();
	std::panic::set_hook(Box::new(move |info| {
		tracing::error!(panic = %info, "fatal panic");
		default_hook(info);
	}));
}

fn load_config(path: &str) -> Result<ct_core::EngineConfig> {
	let text = std::fs::read_to_string(path)?;
	serde_json::from_str(&text).map_err(|err| Error::invalid_argument(format!("{path}: {err}")))
}

fn run() -> Result<()> {
	let path = std::env::args()
		.nth(1)
		.ok_or_else(|| Error::invalid_argument("usage: ct-recon <config.json>"))?;
	let config = load_config(&path)?;
	config.detector.validate()?;
	engine::run(&config)
}

fn main() -> ExitCode {
	init_tracing();
	install_panic_hook();

	match run() {
		Ok(()) => ExitCode::SUCCESS,
		Err(err) => {
			tracing::error!(error = %err, exit_code = err.exit_code(), "ct-recon exiting with failure");
			ExitCode::from(err.exit_code() as u8)
		}
	}
}
