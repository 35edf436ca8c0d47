use clap::CommandFactory;
use clap_complete::{generate, Shell};

use super::CmdResult;

pub fn run(shell: Shell) -> CmdResult {
    let mut cmd = crate::Cli::command();
    generate(shell, &mut cmd, "studyplan", &mut std::io::stdout());
    Ok(())
}
