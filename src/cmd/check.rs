use clap::App;
use std::cell::{Cell, RefCell};
use std::path::Path;

use crate::ctx::{Command, Context, RunResult};
use crate::dto::{BuildMode, Project};
use crate::error::Error;
use crate::gen::{Environment, Files, Generator, Options};
use crate::log::{Logger, TracingLogger};
use crate::xcode::XcodeProj;

pub struct Check;

impl Command for Check {
  fn init<'a, 'b>(&self, cmd: App<'a, 'b>) -> App<'a, 'b> {
    cmd.about("Runs the generator without writing anything")
  }

  fn run(&self, ctx: &Context) -> RunResult {
    let s = summarize(ctx.project, &ctx.options)?;
    println!("{}: {} targets, {} schemes, {} warnings", ctx.project.name, s.targets, s.schemes, s.warnings);
    Ok(())
  }
}

#[derive(Debug, Default, PartialEq)]
struct Summary {
  targets:  usize,
  schemes:  usize,
  warnings: usize
}

/// Keeps the project in memory instead of writing it.
#[derive(Default)]
struct DryRun {
  summary: RefCell<Summary>
}

impl Environment for DryRun {
  fn write_xcodeproj(&self, xcodeproj: &XcodeProj, _: BuildMode, _: &Files, _: &str, _: &Path,
                     _: &Path) -> Result<(), Error>
  {
    let mut s = self.summary.borrow_mut();
    s.targets = xcodeproj.pbx_proj.root()?.targets.len();
    s.schemes = xcodeproj.shared_data.schemes.len();
    Ok(())
  }
}

/// Forwards warnings while counting them.
#[derive(Default)]
struct Counter {
  count: Cell<usize>
}

impl Logger for Counter {
  fn warning(&self, message: &str) {
    self.count.set(self.count.get() + 1);
    TracingLogger.warning(message);
  }
}

fn summarize(project: &Project, options: &Options) -> Result<Summary, Error> {
  let env    = DryRun::default();
  let logger = Counter::default();
  Generator::new(&env, &logger).generate(project, options)?;

  let mut s = env.summary.into_inner();
  s.warnings = logger.count.get();
  Ok(s)
}
