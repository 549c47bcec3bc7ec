use clap::App;

use crate::ctx::{Command, Context, RunResult};
use crate::gen::{DefaultEnvironment, Generator};
use crate::log::TracingLogger;

pub struct Gen;

impl Command for Gen {
  fn init<'a, 'b>(&self, cmd: App<'a, 'b>) -> App<'a, 'b> {
    cmd.about("Generates the Xcode project")
  }

  fn run(&self, ctx: &Context) -> RunResult {
    Generator::new(&DefaultEnvironment, &TracingLogger).generate(ctx.project, &ctx.options)?;
    println!("{}", ctx.options.output_path.display());
    Ok(())
  }
}
