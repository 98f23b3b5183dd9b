//! Status command: print the dirty scope of the next round.

use miette::Result;

use jinc_ops::ops_status;

pub fn exec(verbose: bool) -> Result<()> {
    let cwd = super::current_dir()?;
    let report = ops_status::status(&cwd)?;
    let plan = &report.plan;

    if let Some(reason) = report.rebuild {
        println!("Full rebuild required: {reason}");
    }
    if plan.scope.is_empty() && report.rebuild.is_none() {
        println!("Up to date ({} sources)", plan.digests.len());
        return Ok(());
    }

    for source in &plan.changes.added {
        println!("added     {source}");
    }
    for source in &plan.changes.modified {
        let note = if report.dirty.contains(source) { " (failed last round)" } else { "" };
        println!("modified  {source}{note}");
    }
    for source in &plan.changes.removed {
        println!("removed   {source}");
    }
    let dependents = plan.scope.dependents();
    for source in &dependents {
        println!("dependent {source}");
    }
    if verbose {
        println!(
            "{} changed, {} in scope",
            plan.scope.changed().len(),
            plan.scope.len()
        );
    }
    Ok(())
}
