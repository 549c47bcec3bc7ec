//! Writes the object graph as a `project.pbxproj` file.
//!
//! Xcode uses the NeXTSTEP property list format:
//! - String:     contents, or "contents" when it has delimiters
//! - Array:      ( element, ... )
//! - Dictionary: { key = value; ... }
//!
//! Every object lives in the root `objects` dictionary, keyed by its id and
//! grouped in one section per `isa`. Comments after ids name the object. They
//! are optional but Xcode writes them, so the file diffs cleanly once Xcode
//! touches it. Sections are sorted by `isa`, objects by id, and the keys of
//! every object alphabetically, matching what Xcode itself writes.

use serde_json::Value;
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::io::Write;

use crate::error::Result;
use crate::pbx::{BuildPhase, BuildPhaseKind, ConfigurationList, Element, ElementKind, ObjectId,
                 PbxProj, PbxProject, PbxTarget, TargetKind};

type Sections = BTreeMap<&'static str, BTreeMap<ObjectId, String>>;

/// Leaves `s` bare when every character is safe outside quotes.
pub fn quote(s: &str) -> Cow<'_, str> {
  let safe = |c: char| c.is_ascii_alphanumeric() || "_$/:.".contains(c);
  if !s.is_empty() && s.chars().all(safe) {
    return Cow::Borrowed(s);
  }

  let mut q = String::with_capacity(s.len() + 2);
  q.push('"');
  for c in s.chars() {
    match c {
      '\\' => q.push_str("\\\\"),
      '"'  => q.push_str("\\\""),
      '\n' => q.push_str("\\n"),
      '\t' => q.push_str("\\t"),
      c    => q.push(c)
    }
  }
  q.push('"');
  Cow::Owned(q)
}

fn tabs(depth: usize) -> String {
  "\t".repeat(depth)
}

fn value(v: &Value, depth: usize) -> String {
  match v {
    Value::Null      => "\"\"".to_string(),
    Value::Bool(b)   => if *b { "YES" } else { "NO" }.to_string(),
    Value::Number(n) => n.to_string(),
    Value::String(s) => quote(s).into_owned(),
    Value::Array(a)  => list(a.iter().map(|x| value(x, depth + 1)), depth),
    Value::Object(o) => dictionary(o.iter(), depth)
  }
}

fn list<I: Iterator<Item = String>>(items: I, depth: usize) -> String {
  let mut s = String::from("(\n");
  for item in items {
    s.push_str(&format!("{}\t{},\n", tabs(depth), item));
  }
  s.push_str(&tabs(depth));
  s.push(')');
  s
}

fn dictionary<'a, I>(entries: I, depth: usize) -> String
  where I: Iterator<Item = (&'a String, &'a Value)>
{
  let mut s = String::from("{\n");
  for (k, v) in entries {
    s.push_str(&format!("{}\t{} = {};\n", tabs(depth), quote(k), value(v, depth + 1)));
  }
  s.push_str(&tabs(depth));
  s.push('}');
  s
}

struct Encoder {
  names:    HashMap<ObjectId, String>,
  sections: Sections
}

impl Encoder {
  fn reference(&self, id: &ObjectId) -> String {
    match self.names.get(id) {
      Some(name) => format!("{} /* {} */", id, name),
      None       => id.to_string()
    }
  }

  fn references<'a, I: Iterator<Item = &'a ObjectId>>(&self, ids: I) -> String {
    list(ids.map(|id| self.reference(id)), 3)
  }

  /// `fields` are written one per line, already sorted by key.
  fn object(&mut self, isa: &'static str, id: &ObjectId, fields: Vec<(&str, String)>) {
    let mut s = format!("\t\t{} = {{\n\t\t\tisa = {};\n", self.reference(id), isa);
    for (k, v) in fields {
      s.push_str(&format!("\t\t\t{} = {};\n", k, v));
    }
    s.push_str("\t\t};\n");
    self.sections.entry(isa).or_default().insert(id.clone(), s);
  }

  /// Same as `object` on a single line, like Xcode writes build files and
  /// file references.
  fn inline_object(&mut self, isa: &'static str, id: &ObjectId, fields: Vec<(&str, String)>) {
    let mut s = format!("\t\t{} = {{isa = {}; ", self.reference(id), isa);
    for (k, v) in fields {
      s.push_str(&format!("{} = {}; ", k, v));
    }
    s.push_str("};\n");
    self.sections.entry(isa).or_default().insert(id.clone(), s);
  }

  fn name_elements(&mut self, e: &Element) {
    self.names.insert(e.id.clone(), e.display_name().to_string());
    for c in e.children() {
      self.name_elements(c);
    }
  }

  fn name_target(&mut self, target: &PbxTarget) {
    self.names.insert(target.id.clone(), target.name.clone());
    self.name_configuration_list(&target.configuration_list, target.isa(), &target.name);
    for phase in &target.build_phases {
      self.names.insert(phase.id.clone(), phase.display_name().to_string());
      for file in &phase.files {
        self.names.insert(file.id.clone(), format!("{} in {}", file.name, phase.display_name()));
      }
    }
    for d in &target.dependencies {
      self.names.insert(d.id.clone(),       "PBXTargetDependency".to_string());
      self.names.insert(d.proxy_id.clone(), "PBXContainerItemProxy".to_string());
    }
  }

  fn name_configuration_list(&mut self, list: &ConfigurationList, owner_isa: &str, owner_name: &str) {
    self.names.insert(list.id.clone(), format!("Build configuration list for {} \"{}\"", owner_isa, owner_name));
    for c in &list.configurations {
      self.names.insert(c.id.clone(), c.name.clone());
    }
  }

  fn element(&mut self, e: &Element) {
    for c in e.children() {
      self.element(c);
    }

    let mut fields = Vec::new();
    match &e.kind {
      ElementKind::File(f) => {
        if let Some(t) = &f.explicit_file_type {
          fields.push(("explicitFileType", quote(t).into_owned()));
        }
        if let Some(i) = f.include_in_index {
          fields.push(("includeInIndex", (i as u8).to_string()));
        }
        if let Some(t) = &f.last_known_file_type {
          fields.push(("lastKnownFileType", quote(t).into_owned()));
        }
      },
      ElementKind::Group(c) | ElementKind::VariantGroup(c) => {
        fields.push(("children", self.references(c.iter().map(|x| &x.id))));
      },
      ElementKind::VersionGroup { children, current_version, .. } => {
        fields.push(("children", self.references(children.iter().map(|x| &x.id))));
        if let Some(v) = current_version {
          fields.push(("currentVersion", self.reference(v)));
        }
      }
    }
    if let Some(n) = &e.name {
      fields.push(("name", quote(n).into_owned()));
    }
    if let Some(p) = &e.path {
      fields.push(("path", quote(p).into_owned()));
    }
    fields.push(("sourceTree", e.source_tree.to_str().to_string()));
    if let ElementKind::VersionGroup { version_group_type, .. } = &e.kind {
      fields.push(("versionGroupType", quote(version_group_type).into_owned()));
    }

    match &e.kind {
      ElementKind::File(_) => self.inline_object(e.isa(), &e.id, fields),
      _                    => self.object(e.isa(), &e.id, fields)
    }
  }

  fn configuration_list(&mut self, list: &ConfigurationList) {
    for c in &list.configurations {
      let settings = dictionary(c.build_settings.iter(), 3);
      self.object("XCBuildConfiguration", &c.id, vec!(
        ("buildSettings", settings),
        ("name",          quote(&c.name).into_owned())
      ));
    }
    let configurations = self.references(list.configurations.iter().map(|c| &c.id));
    self.object("XCConfigurationList", &list.id, vec!(
      ("buildConfigurations",           configurations),
      ("defaultConfigurationIsVisible", "0".to_string()),
      ("defaultConfigurationName",      quote(&list.default_configuration_name).into_owned())
    ));
  }

  fn build_phase(&mut self, phase: &BuildPhase) {
    for file in &phase.files {
      let mut fields = vec!(("fileRef", self.reference(&file.file_ref)));
      if let Some(settings) = &file.settings {
        let entries: Vec<String> = settings.iter().map(|(k, v)| format!("{} = {}; ", quote(k), quote(v))).collect();
        fields.push(("settings", ["{", &entries.concat(), "}"].concat()));
      }
      self.inline_object("PBXBuildFile", &file.id, fields);
    }

    let files = self.references(phase.files.iter().map(|f| &f.id));
    let mut fields = vec!(("buildActionMask", "2147483647".to_string()), ("files", files));
    if let BuildPhaseKind::ShellScript { name, input_paths, output_paths,
                                         input_file_list_paths, output_file_list_paths, .. } = &phase.kind
    {
      let strings = |v: &Vec<String>| list(v.iter().map(|s| quote(s).into_owned()), 3);
      fields.push(("inputFileListPaths",  strings(input_file_list_paths)));
      fields.push(("inputPaths",          strings(input_paths)));
      fields.push(("name",                quote(name).into_owned()));
      fields.push(("outputFileListPaths", strings(output_file_list_paths)));
      fields.push(("outputPaths",         strings(output_paths)));
    }
    fields.push(("runOnlyForDeploymentPostprocessing", "0".to_string()));
    if let BuildPhaseKind::ShellScript { script, .. } = &phase.kind {
      fields.push(("shellPath",        "/bin/sh".to_string()));
      fields.push(("shellScript",      quote(script).into_owned()));
      fields.push(("showEnvVarsInLog", "0".to_string()));
    }
    self.object(phase.isa(), &phase.id, fields);
  }

  fn target(&mut self, root: &PbxProject, target: &PbxTarget) {
    self.configuration_list(&target.configuration_list);
    for phase in &target.build_phases {
      self.build_phase(phase);
    }
    for d in &target.dependencies {
      self.object("PBXContainerItemProxy", &d.proxy_id, vec!(
        ("containerPortal",      self.reference(&root.id)),
        ("proxyType",            "1".to_string()),
        ("remoteGlobalIDString", d.target.to_string()),
        ("remoteInfo",           quote(&d.target_name).into_owned())
      ));
      self.object("PBXTargetDependency", &d.id, vec!(
        ("target",      self.reference(&d.target)),
        ("targetProxy", self.reference(&d.proxy_id))
      ));
    }

    let mut fields = vec!(
      ("buildConfigurationList", self.reference(&target.configuration_list.id)),
      ("buildPhases",            self.references(target.build_phases.iter().map(|p| &p.id)))
    );
    if target.is_native() {
      fields.push(("buildRules", list(std::iter::empty(), 3)));
    }
    fields.push(("dependencies", self.references(target.dependencies.iter().map(|d| &d.id))));
    fields.push(("name", quote(&target.name).into_owned()));
    match &target.kind {
      TargetKind::Native { product_type, product_name, product } => {
        fields.push(("productName", quote(product_name).into_owned()));
        if let Some(p) = product {
          fields.push(("productReference", self.reference(&p.id)));
        }
        fields.push(("productType", quote(product_type.identifier()).into_owned()));
      },
      TargetKind::Aggregate => {
        fields.push(("productName", quote(&target.name).into_owned()));
      }
    }
    self.object(target.isa(), &target.id, fields);
  }

  fn project(&mut self, root: &PbxProject) {
    let attributes = dictionary(root.attributes.iter(), 3);
    let mut fields = vec!(
      ("attributes",             attributes),
      ("buildConfigurationList", self.reference(&root.configuration_list.id)),
      ("compatibilityVersion",   quote(&root.compatibility_version).into_owned()),
      ("developmentRegion",      quote(&root.development_region).into_owned()),
      ("hasScannedForEncodings", "0".to_string()),
      ("knownRegions",           list(vec!(quote(&root.development_region).into_owned(), "Base".to_string()).into_iter(), 3)),
      ("mainGroup",              root.main_group.id.to_string())
    );
    if let Some(p) = &root.product_ref_group {
      fields.push(("productRefGroup", self.reference(p)));
    }
    fields.push(("projectDirPath", quote(&root.project_dir_path).into_owned()));
    fields.push(("projectRoot",    "\"\"".to_string()));
    fields.push(("targets",        self.references(root.targets.iter().map(|t| &t.id))));
    self.object("PBXProject", &root.id, fields);
  }
}

/// Encodes `proj`, which must have its root object.
pub fn encode<W: Write>(proj: &PbxProj, f: &mut W) -> Result<()> {
  let root = proj.root()?;
  let mut e = Encoder { names: HashMap::new(), sections: Sections::new() };

  e.names.insert(root.id.clone(), "Project object".to_string());
  e.name_configuration_list(&root.configuration_list, "PBXProject", &root.name);
  e.name_elements(&root.main_group);
  e.names.remove(&root.main_group.id);
  for t in &root.targets {
    e.name_target(t);
  }

  e.project(root);
  e.configuration_list(&root.configuration_list);
  e.element(&root.main_group);
  for t in &root.targets {
    e.target(root, t);
  }

  write!(f, concat!("// !$*UTF8*$!\n",
                    "{{\n",
                    "\tarchiveVersion = 1;\n",
                    "\tclasses = {{\n",
                    "\t}};\n",
                    "\tobjectVersion = {version};\n",
                    "\tobjects = {{\n"),
         version = proj.object_version)?;

  for (isa, objects) in &e.sections {
    write!(f, "\n/* Begin {} section */\n", isa)?;
    for text in objects.values() {
      f.write_all(text.as_bytes())?;
    }
    write!(f, "/* End {} section */\n", isa)?;
  }

  write!(f, concat!("\t}};\n",
                    "\trootObject = {root} /* Project object */;\n",
                    "}}\n"),
         root = root.id)?;
  Ok(())
}
