//! Writes schemes in the XML dialect Xcode uses for `.xcscheme` files.
//!
//! Xcode puts every attribute on its own line, indents by three spaces and
//! never self-closes elements. Writing the same layout keeps Xcode from
//! rewriting the file the first time the scheme is opened.

use std::borrow::Cow;

use crate::dto::EnvironmentVariable;
use crate::scheme::*;

const SHELL_SCRIPT_ACTION: &str = "Xcode.IDEStandardExecutionActionsCore.ExecutionActionType.ShellScriptAction";
const LLDB_DEBUGGER:       &str = "Xcode.DebuggerFoundation.Debugger.LLDB";
const LLDB_LAUNCHER:       &str = "Xcode.DebuggerFoundation.Launcher.LLDB";

struct Node {
  name:       &'static str,
  attributes: Vec<(&'static str, String)>,
  children:   Vec<Node>
}

impl Node {
  fn new(name: &'static str) -> Self {
    Node { name, attributes: Vec::new(), children: Vec::new() }
  }

  fn attr<S: Into<String>>(mut self, key: &'static str, value: S) -> Self {
    self.attributes.push((key, value.into()));
    self
  }

  fn child(mut self, node: Node) -> Self {
    self.children.push(node);
    self
  }

  fn children<I: IntoIterator<Item = Node>>(mut self, nodes: I) -> Self {
    self.children.extend(nodes);
    self
  }

  fn write(&self, depth: usize, out: &mut String) {
    let indent = "   ".repeat(depth);
    out.push_str(&indent);
    out.push('<');
    out.push_str(self.name);
    for (k, v) in &self.attributes {
      out.push_str(&format!("\n{}   {} = \"{}\"", indent, k, escape(v)));
    }
    out.push_str(">\n");
    for c in &self.children {
      c.write(depth + 1, out);
    }
    out.push_str(&format!("{}</{}>\n", indent, self.name));
  }
}

fn escape(s: &str) -> Cow<'_, str> {
  if !s.contains(|c: char| matches!(c, '&' | '<' | '>' | '"' | '\n')) {
    return Cow::Borrowed(s);
  }
  let mut e = String::with_capacity(s.len() + 16);
  for c in s.chars() {
    match c {
      '&'  => e.push_str("&amp;"),
      '<'  => e.push_str("&lt;"),
      '>'  => e.push_str("&gt;"),
      '"'  => e.push_str("&quot;"),
      '\n' => e.push_str("&#10;"),
      c    => e.push(c)
    }
  }
  Cow::Owned(e)
}

fn yes(b: bool) -> &'static str {
  if b { "YES" } else { "NO" }
}

fn buildable_reference(r: &BuildableReference) -> Node {
  Node::new("BuildableReference")
    .attr("BuildableIdentifier", "primary")
    .attr("BlueprintIdentifier", r.blueprint_identifier.to_string())
    .attr("BuildableName",       r.buildable_name.as_str())
    .attr("BlueprintName",       r.blueprint_name.as_str())
    .attr("ReferencedContainer", r.referenced_container.as_str())
}

fn runnable(r: &BuildableReference) -> Node {
  Node::new("BuildableProductRunnable")
    .attr("runnableDebuggingMode", "0")
    .child(buildable_reference(r))
}

fn macro_expansion(r: &BuildableReference) -> Node {
  Node::new("MacroExpansion").child(buildable_reference(r))
}

fn execution_action(a: &ExecutionAction) -> Node {
  let mut content = Node::new("ActionContent")
    .attr("title",      a.title.as_str())
    .attr("scriptText", a.script_text.as_str());
  if let Some(r) = &a.environment_buildable {
    content = content.child(Node::new("EnvironmentBuildable").child(buildable_reference(r)));
  }
  Node::new("ExecutionAction")
    .attr("ActionType", SHELL_SCRIPT_ACTION)
    .child(content)
}

fn environment_variables(vars: &[EnvironmentVariable]) -> Node {
  Node::new("EnvironmentVariables").children(vars.iter().map(|v| {
    Node::new("EnvironmentVariable")
      .attr("key",       v.variable.as_str())
      .attr("value",     v.value.as_str())
      .attr("isEnabled", yes(v.enabled))
  }))
}

fn build_action(a: &BuildAction) -> Node {
  let mut node = Node::new("BuildAction")
    .attr("parallelizeBuildables",     yes(a.parallelize_build))
    .attr("buildImplicitDependencies", yes(a.build_implicit_dependencies));
  if !a.pre_actions.is_empty() {
    node = node.child(Node::new("PreActions").children(a.pre_actions.iter().map(execution_action)));
  }
  node.child(Node::new("BuildActionEntries").children(a.entries.iter().map(|e| {
    let entry = BuildFor::ALL.iter().fold(Node::new("BuildActionEntry"), |n, b| {
      n.attr(b.attribute(), yes(e.build_for.contains(b)))
    });
    entry.child(buildable_reference(&e.reference))
  })))
}

fn test_action(a: &TestAction) -> Node {
  let mut node = Node::new("TestAction")
    .attr("buildConfiguration",         a.build_configuration.as_str())
    .attr("selectedDebuggerIdentifier", LLDB_DEBUGGER)
    .attr("selectedLauncherIdentifier", LLDB_LAUNCHER);
  if let Some(f) = &a.custom_lldb_init_file {
    node = node.attr("customLLDBInitFile", f.as_str());
  }
  node = node.attr("shouldUseLaunchSchemeArgsEnv", "YES");
  if let Some(r) = &a.macro_expansion {
    node = node.child(macro_expansion(r));
  }
  node.child(Node::new("Testables").children(a.testables.iter().map(|t| {
    Node::new("TestableReference")
      .attr("skipped", yes(t.skipped))
      .child(buildable_reference(&t.reference))
  })))
}

fn launch_action(a: &LaunchAction) -> Node {
  let mut node = Node::new("LaunchAction")
    .attr("buildConfiguration",         a.build_configuration.as_str())
    .attr("selectedDebuggerIdentifier", LLDB_DEBUGGER)
    .attr("selectedLauncherIdentifier", LLDB_LAUNCHER);
  if let Some(f) = &a.custom_lldb_init_file {
    node = node.attr("customLLDBInitFile", f.as_str());
  }
  node = node
    .attr("launchStyle",                    "0")
    .attr("useCustomWorkingDirectory",      "NO")
    .attr("ignoresPersistentStateOnLaunch", "NO")
    .attr("debugDocumentVersioning",        "YES")
    .attr("debugServiceExtension",          "internal")
    .attr("allowLocationSimulation",        "YES");
  if let Some(r) = &a.runnable {
    node = node.child(runnable(r));
  }
  if let Some(r) = &a.macro_expansion {
    node = node.child(macro_expansion(r));
  }
  match &a.environment_variables {
    Some(vars) => node.child(environment_variables(vars)),
    None       => node
  }
}

fn profile_action(a: &ProfileAction) -> Node {
  let node = Node::new("ProfileAction")
    .attr("buildConfiguration",           a.build_configuration.as_str())
    .attr("shouldUseLaunchSchemeArgsEnv", "YES")
    .attr("savedToolIdentifier",          "")
    .attr("useCustomWorkingDirectory",    "NO")
    .attr("debugDocumentVersioning",      "YES");
  match &a.runnable {
    Some(r) => node.child(runnable(r)),
    None    => node
  }
}

/// The complete document for `scheme`.
pub fn encode(scheme: &XCScheme) -> String {
  let root = Node::new("Scheme")
    .attr("LastUpgradeVersion", scheme.last_upgrade_version.as_str())
    .attr("version",            scheme.base_version.as_str())
    .child(build_action(&scheme.build_action))
    .child(test_action(&scheme.test_action))
    .child(launch_action(&scheme.launch_action))
    .child(profile_action(&scheme.profile_action))
    .child(Node::new("AnalyzeAction")
             .attr("buildConfiguration", scheme.analyze_action.build_configuration.as_str()))
    .child(Node::new("ArchiveAction")
             .attr("buildConfiguration",       scheme.archive_action.build_configuration.as_str())
             .attr("revealArchiveInOrganizer", yes(scheme.archive_action.reveal_archive_in_organizer)));

  let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
  root.write(0, &mut out);
  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::pbx::ObjectId;
  use indoc::formatdoc;
  use pretty_assertions::assert_eq;

  fn reference() -> BuildableReference {
    BuildableReference {
      referenced_container: "container:P.xcodeproj".into(),
      blueprint_identifier: ObjectId::new("PBXNativeTarget", "A"),
      buildable_name:       "A.app".into(),
      blueprint_name:       "A".into()
    }
  }

  #[test]
  fn attributes_are_escaped() {
    assert_eq!(escape("plain"), "plain");
    assert_eq!(escape("a < b && \"c\"\n"), "a &lt; b &amp;&amp; &quot;c&quot;&#10;");
  }

  #[test]
  fn build_action_layout() {
    let r = reference();
    let a = BuildAction {
      entries:                     vec!(BuildActionEntry { reference: r.clone(), build_for: vec!(BuildFor::Running) }),
      pre_actions:                 vec!(ExecutionAction {
        script_text:           "echo \"hi\"\n".into(),
        title:                 BUILD_OUTPUT_GROUPS_TITLE.into(),
        environment_buildable: None
      }),
      parallelize_build:           true,
      build_implicit_dependencies: false
    };

    let mut out = String::new();
    build_action(&a).write(0, &mut out);
    assert_eq!(out, formatdoc! {r#"
      <BuildAction
         parallelizeBuildables = "YES"
         buildImplicitDependencies = "NO">
         <PreActions>
            <ExecutionAction
               ActionType = "Xcode.IDEStandardExecutionActionsCore.ExecutionActionType.ShellScriptAction">
               <ActionContent
                  title = "Set Bazel Build Output Groups"
                  scriptText = "echo &quot;hi&quot;&#10;">
               </ActionContent>
            </ExecutionAction>
         </PreActions>
         <BuildActionEntries>
            <BuildActionEntry
               buildForRunning = "YES"
               buildForTesting = "NO"
               buildForProfiling = "NO"
               buildForArchiving = "NO"
               buildForAnalyzing = "NO">
               <BuildableReference
                  BuildableIdentifier = "primary"
                  BlueprintIdentifier = "{id}"
                  BuildableName = "A.app"
                  BlueprintName = "A"
                  ReferencedContainer = "container:P.xcodeproj">
               </BuildableReference>
            </BuildActionEntry>
         </BuildActionEntries>
      </BuildAction>
    "#, id = r.blueprint_identifier});
  }

  #[test]
  fn full_scheme() {
    let r = reference();
    let scheme = XCScheme {
      name:                 "A".into(),
      last_upgrade_version: "1320".into(),
      base_version:         "1.7".into(),
      build_action:         BuildAction {
        entries:                     vec!(BuildActionEntry { reference: r.clone(), build_for: BuildFor::ALL.to_vec() }),
        pre_actions:                 Vec::new(),
        parallelize_build:           true,
        build_implicit_dependencies: true
      },
      test_action:          TestAction {
        build_configuration:   "Debug".into(),
        macro_expansion:       None,
        testables:             Vec::new(),
        custom_lldb_init_file: Some(LLDB_INIT_FILE.into())
      },
      launch_action:        LaunchAction {
        build_configuration:   "Debug".into(),
        runnable:              Some(r.clone()),
        macro_expansion:       None,
        environment_variables: Some(vec!(EnvironmentVariable {
          variable: "BUILD_WORKSPACE_DIRECTORY".into(),
          value:    "$(SRCROOT)".into(),
          enabled:  true
        })),
        custom_lldb_init_file: Some(LLDB_INIT_FILE.into())
      },
      profile_action:       ProfileAction { build_configuration: "Debug".into(), runnable: Some(r) },
      analyze_action:       AnalyzeAction { build_configuration: "Debug".into() },
      archive_action:       ArchiveAction { build_configuration: "Debug".into(), reveal_archive_in_organizer: true }
    };

    let xml = encode(&scheme);
    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Scheme\n   LastUpgradeVersion = \"1320\"\n   version = \"1.7\">\n"));
    assert!(xml.ends_with("   <ArchiveAction\n      buildConfiguration = \"Debug\"\n      revealArchiveInOrganizer = \"YES\">\n   </ArchiveAction>\n</Scheme>\n"));
    assert_eq!(xml.matches("customLLDBInitFile = \"$(BAZEL_LLDB_INIT)\"").count(), 2);
    assert_eq!(xml.matches("<BuildableProductRunnable").count(), 2);
    assert!(xml.contains("            key = \"BUILD_WORKSPACE_DIRECTORY\"\n            value = \"$(SRCROOT)\"\n            isEnabled = \"YES\">\n"));
    assert!(!xml.contains("<MacroExpansion>"));
    assert!(!xml.contains("<PreActions>"));
  }
}
