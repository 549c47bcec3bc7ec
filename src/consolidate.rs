//! Turns the flat map of build targets into the set of targets the project
//! will show.
//!
//! This happens in three passes:
//! - merges fold library targets into the targets that own them,
//! - consolidation groups the platform variants of one target together,
//! - disambiguation gives every consolidated target a unique display name.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::dto::{FilePath, Inputs, LinkerInputs, ProductType, Target, TargetID};
use crate::error::{PreconditionError, precondition};

/// Identity of a consolidated target: the ids of its members.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ConsolidatedTargetKey(BTreeSet<TargetID>);

impl ConsolidatedTargetKey {
  pub fn new<I, S>(ids: I) -> Self where I: IntoIterator<Item = S>, S: Into<TargetID> {
    ConsolidatedTargetKey(ids.into_iter().map(Into::into).collect())
  }

  /// The key of the aggregate target every other target depends on.
  pub fn bazel_dependencies() -> Self {
    Self::new(vec!("bazel_dependencies"))
  }

  pub fn ids(&self) -> &BTreeSet<TargetID> {
    &self.0
  }
}

impl fmt::Display for ConsolidatedTargetKey {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    let ids: Vec<&str> = self.0.iter().map(String::as_str).collect();
    f.write_str(&ids.join(", "))
  }
}

impl From<&str> for ConsolidatedTargetKey {
  fn from(id: &str) -> Self {
    Self::new(vec!(id))
  }
}

/// One or more build targets shown as a single project target.
#[derive(Clone, Debug, PartialEq)]
pub struct ConsolidatedTarget {
  pub targets: BTreeMap<TargetID, Target>
}

impl ConsolidatedTarget {
  /// Members are never empty, `ConsolidatedTargets::new` checks it.
  fn first(&self) -> &Target {
    match self.targets.values().next() {
      Some(t) => t,
      None    => unreachable!("consolidated targets have at least one member")
    }
  }

  pub fn label(&self) -> &str {
    &self.first().label
  }

  pub fn product_type(&self) -> ProductType {
    self.first().product.product_type
  }

  pub fn product_name(&self) -> &str {
    &self.first().product.name
  }

  /// Display names of the member platforms, sorted and without duplicates.
  pub fn platforms(&self) -> Vec<String> {
    let set: BTreeSet<String> = self.targets.values().map(|t| t.platform.to_string()).collect();
    set.into_iter().collect()
  }

  pub fn configurations(&self) -> Vec<&str> {
    let set: BTreeSet<&str> = self.targets.values().map(|t| t.configuration.as_str()).collect();
    set.into_iter().collect()
  }

  pub fn product_paths(&self) -> BTreeSet<&FilePath> {
    self.targets.values().map(|t| &t.product.path).collect()
  }

  pub fn inputs(&self) -> Inputs {
    let mut inputs = Inputs::default();
    for t in self.targets.values() {
      inputs.merge(&t.inputs);
    }
    inputs
  }

  pub fn linker_inputs(&self) -> LinkerInputs {
    let mut linker = LinkerInputs::default();
    for t in self.targets.values() {
      linker.dynamic_frameworks.extend(t.linker_inputs.dynamic_frameworks.iter().cloned());
      linker.static_frameworks.extend(t.linker_inputs.static_frameworks.iter().cloned());
      linker.static_libraries.extend(t.linker_inputs.static_libraries.iter().cloned());
    }
    linker
  }

  pub fn dependencies(&self) -> BTreeSet<&TargetID> {
    self.targets.values().flat_map(|t| &t.dependencies).collect()
  }

  pub fn resource_bundle_dependencies(&self) -> BTreeSet<&TargetID> {
    self.targets.values().flat_map(|t| &t.resource_bundle_dependencies).collect()
  }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ConsolidatedTargets {
  pub keys:    BTreeMap<TargetID, ConsolidatedTargetKey>,
  pub targets: BTreeMap<ConsolidatedTargetKey, ConsolidatedTarget>
}

impl ConsolidatedTargets {
  /// Groups `targets` by `partition`, which must name every target exactly
  /// once. Members of a group must build the same kind of product.
  pub fn new(mut targets: BTreeMap<TargetID, Target>,
             partition: Vec<BTreeSet<TargetID>>) -> Result<Self, PreconditionError>
  {
    let mut keys   = BTreeMap::new();
    let mut groups = BTreeMap::new();

    for ids in partition {
      if ids.is_empty() {
        return precondition("Consolidation partition contains an empty group");
      }

      let key = ConsolidatedTargetKey(ids);
      let mut members = BTreeMap::new();
      for id in key.ids() {
        if keys.insert(id.clone(), key.clone()).is_some() {
          return precondition(format!("Target \"{}\" is part of more than one consolidated target", id));
        }
        match targets.remove(id) {
          Some(t) => { members.insert(id.clone(), t); },
          None    => return precondition(format!("Target \"{}\" not found in `targets`", id))
        }
      }

      let product_types: BTreeSet<ProductType> = members.values().map(|t| t.product.product_type).collect();
      if product_types.len() > 1 {
        return precondition(format!("Members of \"{}\" build different product types", key));
      }

      groups.insert(key, ConsolidatedTarget { targets: members });
    }

    if let Some(id) = targets.keys().next() {
      return precondition(format!("Target \"{}\" is not part of any consolidated target", id));
    }

    Ok(ConsolidatedTargets { keys, targets: groups })
  }

  pub fn key(&self, id: &str) -> Result<&ConsolidatedTargetKey, PreconditionError> {
    match self.keys.get(id) {
      Some(k) => Ok(k),
      None    => precondition(format!("Target \"{}\" not found in `consolidated_targets`", id))
    }
  }
}

/// Targets sharing a label and a product are consolidated when each of them
/// builds for a different platform. Everything else stays on its own.
pub fn default_partition(targets: &BTreeMap<TargetID, Target>) -> Vec<BTreeSet<TargetID>> {
  let mut candidates: BTreeMap<(&str, ProductType, &str), Vec<(&TargetID, &Target)>> = BTreeMap::new();
  for (id, t) in targets {
    candidates
      .entry((t.label.as_str(), t.product.product_type, t.product.name.as_str()))
      .or_insert_with(Vec::new)
      .push((id, t));
  }

  let mut partition = Vec::new();
  for members in candidates.values() {
    let platforms: BTreeSet<_> = members.iter().map(|(_, t)| &t.platform).collect();
    if platforms.len() == members.len() {
      partition.push(members.iter().map(|(id, _)| (*id).clone()).collect());
    }
    else {
      partition.extend(members.iter().map(|(id, _)| vec!((*id).clone()).into_iter().collect()));
    }
  }
  partition
}

/// Merge directive destinations that could not be honored.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InvalidMerge {
  pub source:       TargetID,
  pub destinations: BTreeSet<TargetID>
}

/// Folds every merge source into its destinations. A destination is only
/// valid when both it and the source are still in `targets`; everything else
/// is reported back instead of failing.
pub fn apply_merges(targets: &mut BTreeMap<TargetID, Target>,
                    merges:  &BTreeMap<TargetID, BTreeSet<TargetID>>) -> Vec<InvalidMerge>
{
  let mut invalid = Vec::new();

  for (source_id, destinations) in merges {
    let source = match targets.get(source_id) {
      Some(t) => t.clone(),
      None    => {
        invalid.push(InvalidMerge { source: source_id.clone(), destinations: destinations.clone() });
        continue;
      }
    };

    let mut merged   = BTreeSet::new();
    let mut rejected = BTreeSet::new();
    for dest_id in destinations {
      match targets.get_mut(dest_id) {
        Some(dest) if dest_id != source_id => {
          merge_into(dest, dest_id, source_id, &source);
          merged.insert(dest_id.clone());
        },
        _ => { rejected.insert(dest_id.clone()); }
      }
    }

    if !merged.is_empty() {
      targets.remove(source_id);
      for (id, t) in targets.iter_mut() {
        let replacements = merged.iter().filter(|m| *m != id).cloned();
        if t.dependencies.remove(source_id) {
          t.dependencies.extend(replacements.clone());
        }
        if t.resource_bundle_dependencies.remove(source_id) {
          t.resource_bundle_dependencies.extend(replacements);
        }
        if t.test_host.as_ref() == Some(source_id) {
          t.test_host = merged.iter().next().cloned();
        }
      }
    }

    if !rejected.is_empty() {
      invalid.push(InvalidMerge { source: source_id.clone(), destinations: rejected });
    }
  }

  invalid
}

fn merge_into(dest: &mut Target, dest_id: &str, source_id: &str, source: &Target) {
  dest.inputs.merge(&source.inputs);

  let product = &source.product.path;
  dest.linker_inputs.static_libraries.remove(product);
  dest.linker_inputs.static_frameworks.remove(product);
  dest.linker_inputs.dynamic_frameworks.remove(product);

  if dest.dependencies.remove(source_id) {
    dest.dependencies.extend(source.dependencies.iter().filter(|d| *d != dest_id).cloned());
  }
}

/// A consolidated target with its display name.
#[derive(Clone, Debug, PartialEq)]
pub struct DisambiguatedTarget {
  pub name:   String,
  pub target: ConsolidatedTarget
}

#[derive(Clone, Debug, PartialEq)]
pub struct DisambiguatedTargets {
  pub keys:    BTreeMap<TargetID, ConsolidatedTargetKey>,
  pub targets: BTreeMap<ConsolidatedTargetKey, DisambiguatedTarget>
}

impl DisambiguatedTargets {
  pub fn new(keys:    BTreeMap<TargetID, ConsolidatedTargetKey>,
             targets: BTreeMap<ConsolidatedTargetKey, DisambiguatedTarget>) -> Result<Self, PreconditionError>
  {
    let v = DisambiguatedTargets { keys, targets };
    v.validate()?;
    Ok(v)
  }

  /// Every key has exactly one target and no two targets share a name.
  pub fn validate(&self) -> Result<(), PreconditionError> {
    let referenced: BTreeSet<&ConsolidatedTargetKey> = self.keys.values().collect();
    for key in &referenced {
      if !self.targets.contains_key(key) {
        return precondition(format!("Consolidated target \"{}\" has no disambiguated name", key));
      }
    }
    for key in self.targets.keys() {
      if !referenced.contains(key) {
        return precondition(format!("Disambiguated target \"{}\" is not a known consolidated target", key));
      }
    }

    let mut names: BTreeMap<&str, &ConsolidatedTargetKey> = BTreeMap::new();
    for (key, t) in &self.targets {
      if let Some(other) = names.insert(&t.name, key) {
        return precondition(format!("Targets \"{}\" and \"{}\" are both named \"{}\"", other, key, t.name));
      }
    }
    Ok(())
  }
}

/// Names targets after their product. Names still shared by several targets
/// are then qualified by platform, then by configuration, and as a last
/// resort by their key.
///
/// A qualified name can still equal a name that was never qualified (a
/// product literally named `A (B)`). That is not retried here:
/// `DisambiguatedTargets::new` rejects it as a `PreconditionError`.
pub fn disambiguate(consolidated: &ConsolidatedTargets) -> Result<DisambiguatedTargets, PreconditionError> {
  let mut names: BTreeMap<&ConsolidatedTargetKey, String> = consolidated.targets.iter()
    .map(|(k, t)| (k, t.product_name().to_string()))
    .collect();

  for step in &[Qualifier::Platforms, Qualifier::Configurations, Qualifier::Key] {
    let collisions = colliding(&names);
    if collisions.is_empty() {
      break;
    }
    for key in collisions {
      let qualified = format!("{} ({})", names[key], step.apply(key, &consolidated.targets[key]));
      names.insert(key, qualified);
    }
  }

  let targets = names.into_iter()
    .map(|(k, name)| (k.clone(), DisambiguatedTarget { name, target: consolidated.targets[k].clone() }))
    .collect();

  DisambiguatedTargets::new(consolidated.keys.clone(), targets)
}

enum Qualifier {
  Platforms,
  Configurations,
  Key
}

impl Qualifier {
  fn apply(&self, key: &ConsolidatedTargetKey, target: &ConsolidatedTarget) -> String {
    match self {
      Qualifier::Platforms      => target.platforms().join(", "),
      Qualifier::Configurations => target.configurations().join(", "),
      Qualifier::Key            => key.to_string()
    }
  }
}

fn colliding<'a>(names: &BTreeMap<&'a ConsolidatedTargetKey, String>) -> Vec<&'a ConsolidatedTargetKey> {
  let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
  for name in names.values() {
    *counts.entry(name.as_str()).or_insert(0) += 1;
  }
  names.iter()
    .filter(|(_, name)| counts[name.as_str()] > 1)
    .map(|(k, _)| *k)
    .collect()
}
