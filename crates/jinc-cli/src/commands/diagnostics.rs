//! Diagnostics command: print recorded round summaries.

use miette::Result;

use jinc_builder::diagnostics::read_sessions;
use jinc_ops::ProjectContext;

pub fn exec(count: usize) -> Result<()> {
    let cwd = super::current_dir()?;
    let project = ProjectContext::load(&cwd)?;
    let sessions = read_sessions(&project.layout.diagnostic_path())?;
    if sessions.is_empty() {
        println!("No rounds recorded");
        return Ok(());
    }
    for (i, session) in sessions.iter().take(count.max(1)).enumerate() {
        if i > 0 {
            println!();
        }
        print!("{session}");
    }
    Ok(())
}
