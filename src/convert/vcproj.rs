//! Visual Studio 2002-2008 `.vcproj` projects.
//!
//! Settings live in attributes: `<Configuration Name="Release|Win32">` holds
//! `<Tool Name="VCCLCompilerTool" .../>` and `<Tool Name="VCLinkerTool" .../>`.

use roxmltree::{Document, Node};

use super::{BuildKind, BuildSettings, ConfigSettings, ImportContext};
use crate::options::ExeType;

pub(crate) fn import(doc: &Document, ctx: &mut ImportContext) {
    let root = doc.root_element();
    if let Some(name) = root.attribute("Name") {
        ctx.set_project(name);
    }

    for file in root.descendants().filter(|n| n.has_tag_name("File")) {
        if let Some(path) = file.attribute("RelativePath") {
            ctx.add_source(path);
        }
    }

    let configurations: Vec<Node> = root
        .descendants()
        .filter(|n| n.has_tag_name("Configuration") && n.attribute("Name").is_some())
        .collect();
    // Only the first platform's configurations are read.
    let platform = configurations
        .first()
        .and_then(|c| c.attribute("Name"))
        .and_then(|name| name.split_once('|'))
        .map(|(_, platform)| platform);

    let mut settings = BuildSettings::default();
    for config in &configurations {
        let Some((name, config_platform)) =
            config.attribute("Name").and_then(|n| n.split_once('|'))
        else {
            continue;
        };
        if Some(config_platform) != platform {
            continue;
        }
        let Some(kind) = BuildKind::from_name(name) else {
            continue;
        };
        let slot = settings.slot(kind);
        if slot.is_none() {
            *slot = Some(read_configuration(*config));
        }
    }
    settings.apply(ctx);
}

fn tool<'a, 'i>(config: Node<'a, 'i>, name: &str) -> Option<Node<'a, 'i>> {
    config
        .children()
        .find(|n| n.has_tag_name("Tool") && n.attribute("Name") == Some(name))
}

fn read_configuration(config: Node) -> ConfigSettings {
    let mut settings = ConfigSettings::default();

    if let Some(compiler) = tool(config, "VCCLCompilerTool") {
        settings.warn = compiler
            .attribute("WarningLevel")
            .filter(|level| matches!(*level, "1" | "2" | "3" | "4"))
            .map(String::from);
        // 1 = minimize size, 2 = maximize speed, 3 = full.
        settings.optimize_speed = match compiler.attribute("Optimization") {
            Some("1") => Some(false),
            Some("2" | "3") => Some(true),
            _ => None,
        };
        // 1 = favor speed, 2 = favor size.
        match compiler.attribute("FavorSizeOrSpeed") {
            Some("1") => settings.optimize_speed = Some(true),
            Some("2") => settings.optimize_speed = Some(false),
            _ => {}
        }
        if let Some(dirs) = compiler.attribute("AdditionalIncludeDirectories") {
            settings.add_inc_dirs(dirs.split([';', ',']));
        }
        if let Some(defines) = compiler.attribute("PreprocessorDefinitions") {
            settings.add_defines(defines.split([';', ',']));
        }
    }

    let subsystem = tool(config, "VCLinkerTool").and_then(|linker| linker.attribute("SubSystem"));
    settings.exe_type = match config.attribute("ConfigurationType") {
        Some("2") => Some(ExeType::Dll),
        Some("4") => Some(ExeType::Lib),
        Some("1") => match subsystem {
            Some("1") => Some(ExeType::Console),
            Some("2") => Some(ExeType::Window),
            _ => None,
        },
        _ => None,
    };
    settings
}

#[cfg(test)]
mod tests {
    use super::super::import_project;
    use super::super::tests::project_dir;
    use crate::options::OptionId;
    use pretty_assertions::assert_eq;

    const PROJECT: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<VisualStudioProject ProjectType="Visual C++" Version="9.00" Name="oldtool">
  <Platforms>
    <Platform Name="Win32"/>
  </Platforms>
  <Configurations>
    <Configuration Name="Debug|Win32" ConfigurationType="1">
      <Tool Name="VCCLCompilerTool" Optimization="0" AdditionalIncludeDirectories="&quot;..\include&quot;"
            PreprocessorDefinitions="WIN32;_DEBUG;_CONSOLE" WarningLevel="4"/>
      <Tool Name="VCLinkerTool" SubSystem="1"/>
    </Configuration>
    <Configuration Name="Release|Win32" ConfigurationType="1">
      <Tool Name="VCCLCompilerTool" Optimization="2" FavorSizeOrSpeed="2"
            PreprocessorDefinitions="WIN32;NDEBUG;_CONSOLE" WarningLevel="3"/>
      <Tool Name="VCLinkerTool" SubSystem="1"/>
    </Configuration>
    <Configuration Name="Release|x64" ConfigurationType="2">
      <Tool Name="VCCLCompilerTool" WarningLevel="1"/>
    </Configuration>
  </Configurations>
  <Files>
    <Filter Name="Source Files">
      <File RelativePath=".\main.cpp"/>
      <File RelativePath=".\util.c"/>
    </Filter>
    <Filter Name="Header Files">
      <File RelativePath=".\util.h"/>
    </Filter>
    <File RelativePath=".\oldtool.rc"/>
  </Files>
</VisualStudioProject>
"#;

    #[test]
    fn imports_attributes_of_first_platform() {
        let dir = project_dir(&[
            ("oldtool.vcproj", PROJECT),
            ("main.cpp", ""),
            ("util.c", ""),
            ("oldtool.rc", ""),
        ]);
        let conversion = import_project(dir.path().join("oldtool.vcproj"), dir.path()).unwrap();
        let desc = &conversion.descriptor;

        let files: Vec<&str> = desc.src_files().iter().map(|f| f.path()).collect();
        assert_eq!(files, ["main.cpp", "util.c", "oldtool.rc"]);
        assert!(desc.diagnostics().is_empty());

        assert_eq!(desc.project_name(), Some("oldtool"));
        assert_eq!(desc.option(OptionId::ExeType), Some("console"));
        assert_eq!(desc.option(OptionId::Warn), Some("3"));
        assert_eq!(desc.option(OptionId::Optimize), Some("space"));
        assert_eq!(desc.option(OptionId::IncDirs), Some("../include"));
        assert_eq!(desc.option(OptionId::CFlagsCmn), Some("-DWIN32"));
        assert_eq!(desc.option(OptionId::CFlagsRel), None);
    }
}
