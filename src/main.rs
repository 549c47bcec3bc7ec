#![allow(clippy::write_with_newline)]

#![cfg_attr(debug_assertions, allow(dead_code))]

mod cmd;
mod consolidate;
mod ctx;
mod dto;
mod error;
mod gen;
mod log;
mod pbx;
mod platform;
mod resolver;
mod scheme;
mod sort;
mod xcode;

use clap::{Arg, App, SubCommand};
use std::fmt::Display;

use crate::dto::{BuildMode, Project};

fn main() {
  // Initialize.
  let commands = cmd::init();

  // Parse the environment variables.
  let env: ctx::Env = envy::prefixed(ctx::ENV_PREFIX).from_env()
    .check(|| "Failed to parse environment variables");

  // Parse the command line.
  let args = App::new(env!("CARGO_PKG_NAME"))
    .version(env!("CARGO_PKG_VERSION"))
    .author(env!("CARGO_PKG_AUTHORS"))
    .about(env!("CARGO_PKG_DESCRIPTION"))
    .arg(Arg::with_name("PROJECT_JSON")
         .help("Build graph description of the project")
         .required(true))
    .arg(Arg::with_name("output")
         .short("o")
         .long("output")
         .value_name("FOLDER")
         .help("Where to write the .xcodeproj bundle")
         .takes_value(true))
    .arg(Arg::with_name("workspace")
         .short("w")
         .long("workspace")
         .value_name("FOLDER")
         .help("Root of the Bazel workspace")
         .takes_value(true))
    .arg(Arg::with_name("config")
         .short("c")
         .long("config")
         .value_name("FILE")
         .help("Generator configuration file")
         .takes_value(true))
    .arg(Arg::with_name("build-mode")
         .short("m")
         .long("build-mode")
         .value_name("MODE")
         .possible_values(&["xcode", "bazel"])
         .help("Build with Xcode or proxy every build through Bazel")
         .takes_value(true))
    .arg(Arg::with_name("v")
         .short("v")
         .multiple(true)
         .help("Verbosity level"))
    .subcommands(commands.iter().map(|(name, cmd)| {
      cmd.init(SubCommand::with_name(name))
    }))
    .get_matches();

  log::init(env.log.as_deref(), args.occurrences_of("v"));

  let cwd = std::env::current_dir()
    .check(|| "Failed to read the current directory");
  let absolute = |p: &str| cwd.join(p);

  // Load the build graph and the generator configuration.
  let project_path = args.value_of("PROJECT_JSON").map(absolute).unwrap_or_default();
  let project = Project::load(&project_path)
    .check(|| format!("Failed to load project ({:?})", project_path));

  let config_path = match args.value_of("config") {
    Some(c) => absolute(c),
    None    => project_path.parent().unwrap_or(&cwd).join(ctx::CONFIG_FILE)
  };
  let config = ctx::Config::load(&config_path)
    .check(|| format!("Failed to read config file ({:?})", config_path));

  ctx::is_supported(&config.min_version, env!("CARGO_PKG_VERSION"))
    .check(|| "Min version check failed");

  let build_mode = args.value_of("build-mode").map(str::parse::<BuildMode>).transpose()
    .check(|| "Invalid build mode");
  let workspace  = args.value_of("workspace").map(absolute).unwrap_or_else(|| cwd.clone());
  let output_dir = args.value_of("output").map(absolute).unwrap_or_else(|| cwd.clone());

  // Execute the requested command.
  let ctx = ctx::Context {
    options:  config.options(&env, build_mode, &project, &workspace, &output_dir),
    commands,
    args:     &args,
    project:  &project
  };

  let cmd_name = ctx.args.subcommand_name().unwrap_or("gen");
  ctx.commands[cmd_name].run(&ctx)
    .check(|| format!("Failed to run command ({})", cmd_name));
}

trait Check {
  type R;
  fn check<F, S>(self, msg: F) -> Self::R where F: FnOnce() -> S, S: Display;
}

impl<T, E> Check for Result<T, E> where E: Display {
  type R = T;
  fn check<F, S>(self, msg: F) -> Self::R where F: FnOnce() -> S, S: Display {
    match self {
      Ok (v) => v,
      Err(e) => fatal(format!("{}: {}", msg(), e))
    }
  }
}

fn fatal<S: Display>(msg: S) -> ! {
  eprintln!("{}", msg);
  std::process::exit(1)
}
