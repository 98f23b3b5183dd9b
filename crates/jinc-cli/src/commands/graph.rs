use miette::Result;

use jinc_ops::ops_graph;

pub fn exec() -> Result<()> {
    let cwd = super::current_dir()?;
    let graph = ops_graph::load(&cwd)?;
    print!("{}", ops_graph::render(&graph));
    Ok(())
}
