use clap::App;

use crate::consolidate::ConsolidatedTargetKey;
use crate::ctx::{Command, Context, RunResult};
use crate::dto::Project;
use crate::error::Error;
use crate::gen::{DefaultEnvironment, Environment};
use crate::sort::sort_localized_standard_by;

pub struct Show;

impl Command for Show {
  fn init<'a, 'b>(&self, cmd: App<'a, 'b>) -> App<'a, 'b> {
    cmd.about("Lists the targets the project would contain")
  }

  fn run(&self, ctx: &Context) -> RunResult {
    for (name, key) in target_names(&DefaultEnvironment, ctx.project)? {
      println!("{}\t{}", name, key);
    }
    Ok(())
  }
}

/// Every consolidated target under its final name, sorted like the schemes.
fn target_names(env: &dyn Environment, project: &Project) -> Result<Vec<(String, ConsolidatedTargetKey)>, Error> {
  let mut targets = project.targets.clone();
  env.process_target_merges(&mut targets, &project.target_merges);

  let consolidated  = env.consolidate_targets(targets)?;
  let disambiguated = env.disambiguate_targets(&consolidated)?;
  disambiguated.validate()?;

  let mut names: Vec<_> = disambiguated.targets.into_iter().map(|(k, t)| (t.name, k)).collect();
  sort_localized_standard_by(&mut names, |(name, _)| name.clone());
  Ok(names)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::dto::{FilePath, ProductType, Target};
  use crate::platform::Platform;
  use pretty_assertions::assert_eq;

  #[test]
  fn names_follow_merges_and_consolidation() {
    let mut p = Project::default();
    let t = |label: &str, name: &str, path: &str| {
      Target::mock(label, "a1b2c", ProductType::StaticLibrary, name, FilePath::generated(path))
    };
    p.targets.insert("Z 1".into(), t("//z:Z", "Z", "z1/libZ.a"));
    p.targets.insert("Z 2".into(), t("//z:Z", "Z", "z2/libZ.a").with_platform(Platform::simulator()));
    p.targets.insert("b 1".into(), t("//b:b", "b", "b/libb.a"));
    p.targets.insert("M 1".into(), t("//m:M", "M", "m/libM.a"));
    p.target_merges.insert("M 1".into(), vec!("b 1".to_string()).into_iter().collect());

    let names = target_names(&DefaultEnvironment, &p).unwrap();
    assert_eq!(names, vec!(
      ("b".to_string(), ConsolidatedTargetKey::from("b 1")),
      ("Z".to_string(), ConsolidatedTargetKey::new(vec!("Z 1", "Z 2")))
    ));
  }
}
