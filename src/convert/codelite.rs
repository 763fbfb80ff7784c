//! CodeLite `.project` files.

use roxmltree::{Document, Node};

use super::{BuildKind, BuildSettings, ConfigSettings, ImportContext};
use crate::options::ExeType;

pub(crate) fn import(doc: &Document, ctx: &mut ImportContext) {
    let root = doc.root_element();
    if let Some(name) = root.attribute("Name") {
        ctx.set_project(name);
    }

    // Files sit in (possibly nested) <VirtualDirectory> folders.
    for file in root
        .descendants()
        .filter(|n| {
            n.has_tag_name("File") && n.ancestors().any(|a| a.has_tag_name("VirtualDirectory"))
        })
    {
        if let Some(name) = file.attribute("Name") {
            ctx.add_source(name);
        }
    }

    let Some(project_settings) = root.children().find(|n| n.has_tag_name("Settings")) else {
        return;
    };

    let mut common = ConfigSettings::default();
    let global = project_settings
        .children()
        .find(|n| n.has_tag_name("GlobalSettings"));
    if let Some(compiler) = global.and_then(compiler_of) {
        read_compiler(compiler, &mut common);
    }

    let mut settings = BuildSettings::default();
    for config in project_settings
        .children()
        .filter(|n| n.has_tag_name("Configuration"))
    {
        let Some(kind) = config.attribute("Name").and_then(BuildKind::from_name) else {
            continue;
        };
        let mut current = ConfigSettings::default();
        if let Some(compiler) = compiler_of(config) {
            read_compiler(compiler, &mut current);
        }
        let gui = config
            .children()
            .find(|n| n.has_tag_name("General"))
            .and_then(|g| g.attribute("IsGUIProgram"))
            .is_some_and(|v| v.eq_ignore_ascii_case("yes"));
        current.exe_type = match config.attribute("Type") {
            Some("Static Library") => Some(ExeType::Lib),
            Some("Dynamic Library") => Some(ExeType::Dll),
            Some("Executable") if gui => Some(ExeType::Window),
            Some("Executable") => Some(ExeType::Console),
            _ => None,
        };
        let slot = settings.slot(kind);
        if slot.is_none() {
            *slot = Some(current);
        }
    }
    settings.with_common(&common).apply(ctx);
}

fn compiler_of<'a, 'i>(node: Node<'a, 'i>) -> Option<Node<'a, 'i>> {
    node.children().find(|n| n.has_tag_name("Compiler"))
}

/// `Options="-g;-O0;-Wall"` plus `<IncludePath Value=.../>` and
/// `<Preprocessor Value=.../>` children.
fn read_compiler(compiler: Node, settings: &mut ConfigSettings) {
    if let Some(options) = compiler.attribute("Options") {
        for option in options.split(';') {
            settings.add_gcc_option(option);
        }
    }
    for node in compiler.children().filter(|n| n.is_element()) {
        let Some(value) = node.attribute("Value") else {
            continue;
        };
        match node.tag_name().name() {
            "IncludePath" => settings.add_inc_dirs([value]),
            "Preprocessor" => settings.add_defines([value]),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::import_project;
    use super::super::tests::project_dir;
    use crate::options::OptionId;
    use pretty_assertions::assert_eq;

    const PROJECT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<CodeLite_Project Name="cldemo" InternalType="Console">
  <VirtualDirectory Name="src">
    <File Name="src/main.cpp"/>
    <File Name="src/util.cpp"/>
    <VirtualDirectory Name="include">
      <File Name="src/util.h"/>
    </VirtualDirectory>
  </VirtualDirectory>
  <Settings Type="Executable">
    <GlobalSettings>
      <Compiler Options="-DUNICODE" C_Options="" Assembler="">
        <IncludePath Value="include"/>
      </Compiler>
    </GlobalSettings>
    <Configuration Name="Debug" CompilerType="gnu g++" Type="Executable">
      <Compiler Options="-g;-O0;-Wall" C_Options="-g;-O0;-Wall" Required="yes">
        <IncludePath Value="."/>
        <Preprocessor Value="DEBUG_BUILD"/>
      </Compiler>
      <General OutputFile="$(IntermediateDirectory)/$(ProjectName)" IsGUIProgram="no" IsEnabled="yes"/>
    </Configuration>
    <Configuration Name="Release" CompilerType="gnu g++" Type="Executable">
      <Compiler Options="-Os;-Wall" C_Options="-Os;-Wall" Required="yes">
        <IncludePath Value="."/>
        <Preprocessor Value="NDEBUG"/>
      </Compiler>
      <General OutputFile="$(IntermediateDirectory)/$(ProjectName)" IsGUIProgram="no" IsEnabled="yes"/>
    </Configuration>
  </Settings>
</CodeLite_Project>
"#;

    #[test]
    fn imports_configurations_and_global_settings() {
        let dir = project_dir(&[
            ("cldemo.project", PROJECT),
            ("src/main.cpp", ""),
            ("src/util.cpp", ""),
        ]);
        let script = dir.path().join("cldemo.project");
        let conversion = import_project(script, dir.path().join("src")).unwrap();
        let desc = &conversion.descriptor;

        let files: Vec<&str> = desc.src_files().iter().map(|f| f.path()).collect();
        assert_eq!(files, ["main.cpp", "util.cpp"]);
        assert!(desc.diagnostics().is_empty());

        assert_eq!(desc.project_name(), Some("cldemo"));
        assert_eq!(desc.option(OptionId::ExeType), Some("console"));
        assert_eq!(desc.option(OptionId::Warn), Some("4"));
        assert_eq!(desc.option(OptionId::Optimize), Some("space"));
        assert_eq!(desc.option(OptionId::IncDirs), Some("../include;.."));
        assert_eq!(desc.option(OptionId::CFlagsCmn), Some("-DUNICODE"));
        assert_eq!(desc.option(OptionId::CFlagsRel), None);
        assert_eq!(desc.option(OptionId::CFlagsDbg), Some("-DDEBUG_BUILD"));
    }
}
