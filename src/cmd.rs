mod check;
mod gen;
mod show;

use crate::ctx::Commands;

pub fn init() -> Commands {
  let mut commands = Commands::new();
  commands.insert("check", Box::new(check::Check));
  commands.insert("gen",   Box::new(gen::Gen));
  commands.insert("show",  Box::new(show::Show));
  commands
}
