use console::Style;
use miette::Result;

use jinc_ops::ops_validate;
use jinc_util::errors::JincError;

pub fn exec() -> Result<()> {
    let cwd = super::current_dir()?;
    let report = ops_validate::validate(&cwd)?;
    if report.is_ok() {
        println!("{}", Style::new().green().apply_to("Output is consistent"));
        return Ok(());
    }
    for problem in &report.problems {
        println!("{} {problem}", Style::new().red().bold().apply_to("problem:"));
    }
    Err(JincError::Invariant {
        message: format!("{} consistency problems found", report.problems.len()),
    }
    .into())
}
