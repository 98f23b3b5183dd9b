use miette::Result;

use jinc_ops::ops_clean::{self, CleanResult};

pub fn exec() -> Result<()> {
    let cwd = super::current_dir()?;
    match ops_clean::clean(&cwd)? {
        CleanResult::Cleaned => println!("Cleaned build output"),
        CleanResult::NothingToClean => println!("Nothing to clean"),
    }
    Ok(())
}
