use lc3_vm::emulator;
use lc3_vm::hardware::console::TerminalConsole;
use std::env;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const USAGE_ERROR: u8 = 2;
const LOAD_ERROR: u8 = 3;

fn main() -> ExitCode {
    // RUST_LOG=lc3_vm=trace logs every executed instruction
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let Some(path) = env::args_os().nth(1) else {
        eprintln!("Usage: lc3-vm <program image>");
        return ExitCode::from(USAGE_ERROR);
    };
    let (result, registers) = {
        let mut emu = match emulator::from_program(&path, TerminalConsole::shared()) {
            Ok(emu) => emu,
            Err(e) => {
                tracing::error!("{e}");
                return ExitCode::from(LOAD_ERROR);
            }
        };
        let result = emu.execute();
        (result, emu.registers().clone())
        // the terminal leaves raw mode when the emulator is dropped
    };
    tracing::debug!("registers at exit\n{registers}");
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::from(e.exit_code())
        }
    }
}
