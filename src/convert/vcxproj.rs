//! MSBuild `.vcxproj` projects and their `.vcxproj.filters` companions.

use roxmltree::{Document, Node};
use tracing::debug;

use super::condition::{self, Vars};
use super::{BuildKind, BuildSettings, ConfigSettings, ImportContext};
use crate::options::ExeType;

/// Item elements whose `Include` names a file to list.
const FILE_ITEMS: &[&str] = &["ClCompile", "ResourceCompile", "Midl", "None"];

pub(crate) fn import(doc: &Document, ctx: &mut ImportContext) {
    let root = doc.root_element();

    if let Some(name) = property(root, "ProjectName").or_else(|| property(root, "RootNamespace")) {
        ctx.set_project(name);
    }
    add_items(root, ctx);

    let configurations = project_configurations(root);
    let platform = configurations
        .first()
        .map_or("Win32", |(_, platform)| platform.as_str());
    let mut settings = BuildSettings::default();
    for kind in [BuildKind::Release, BuildKind::Debug] {
        // A project listing no configurations is read once, as Release.
        let wanted = if configurations.is_empty() {
            kind == BuildKind::Release
        } else {
            configurations
                .iter()
                .any(|(config, _)| BuildKind::from_name(config) == Some(kind))
        };
        if !wanted {
            continue;
        }
        let vars = Vars::for_configuration(kind.configuration(), platform);
        *settings.slot(kind) = Some(read_configuration(root, &vars));
    }
    debug!(
        platform,
        configurations = configurations.len(),
        "read MSBuild configurations"
    );
    settings.apply(ctx);
}

/// The filters file only groups items into folders; its items are unioned
/// with the project's.
pub(crate) fn import_filters(doc: &Document, ctx: &mut ImportContext) {
    add_items(doc.root_element(), ctx);
}

fn elements<'a, 'i>(node: Node<'a, 'i>, tag: &'static str) -> impl Iterator<Item = Node<'a, 'i>> {
    node.children()
        .filter(move |n| n.is_element() && n.tag_name().name() == tag)
}

fn child_text<'a>(node: Node<'a, '_>, tag: &str) -> Option<&'a str> {
    node.children()
        .find(|n| n.is_element() && n.tag_name().name() == tag)
        .and_then(|n| n.text())
        .map(str::trim)
}

/// Text of the first `<PropertyGroup>` child named `tag`, whatever its
/// condition.
fn property<'a>(root: Node<'a, '_>, tag: &str) -> Option<&'a str> {
    elements(root, "PropertyGroup")
        .find_map(|group| child_text(group, tag).filter(|t| !t.is_empty()))
}

fn add_items(root: Node, ctx: &mut ImportContext) {
    for group in elements(root, "ItemGroup") {
        for item in group.children().filter(|n| n.is_element()) {
            if FILE_ITEMS.contains(&item.tag_name().name()) {
                if let Some(include) = item.attribute("Include") {
                    ctx.add_source(include);
                }
            }
        }
    }
}

/// `(Configuration, Platform)` pairs from `<ProjectConfiguration>` items, in
/// file order.
fn project_configurations(root: Node) -> Vec<(String, String)> {
    elements(root, "ItemGroup")
        .flat_map(|group| elements(group, "ProjectConfiguration"))
        .filter_map(|pc| {
            let configuration = child_text(pc, "Configuration");
            let platform = child_text(pc, "Platform");
            match (configuration, platform) {
                (Some(c), Some(p)) => Some((c.to_string(), p.to_string())),
                _ => {
                    let (c, p) = pc.attribute("Include")?.split_once('|')?;
                    Some((c.to_string(), p.to_string()))
                }
            }
        })
        .collect()
}

/// Everything the groups that apply under `vars` say about one
/// configuration. Later groups override earlier ones, as in MSBuild.
fn read_configuration(root: Node, vars: &Vars) -> ConfigSettings {
    let mut settings = ConfigSettings::default();
    let mut configuration_type = None;
    let mut subsystem = None;

    for node in root.children().filter(|n| n.is_element()) {
        if !condition::applies(node.attribute("Condition"), vars) {
            continue;
        }
        match node.tag_name().name() {
            "PropertyGroup" => {
                if let Some(kind) = child_text(node, "ConfigurationType") {
                    configuration_type = Some(kind.to_string());
                }
            }
            "ItemDefinitionGroup" => {
                for compile in elements(node, "ClCompile") {
                    read_compiler(compile, &mut settings);
                }
                for link in elements(node, "Link") {
                    if let Some(value) = child_text(link, "SubSystem") {
                        subsystem = Some(value.to_string());
                    }
                }
            }
            _ => {}
        }
    }

    settings.exe_type = match configuration_type.as_deref() {
        Some("DynamicLibrary") => Some(ExeType::Dll),
        Some("StaticLibrary") => Some(ExeType::Lib),
        Some("Application") => match subsystem.as_deref() {
            Some("Windows") => Some(ExeType::Window),
            Some("Console") => Some(ExeType::Console),
            _ => None,
        },
        _ => None,
    };
    settings
}

fn read_compiler(compile: Node, settings: &mut ConfigSettings) {
    if let Some(level) = child_text(compile, "WarningLevel") {
        settings.warn = warning_level(level);
    }
    match child_text(compile, "Optimization") {
        Some("MaxSpeed" | "Full") => settings.optimize_speed = Some(true),
        Some("MinSpace") => settings.optimize_speed = Some(false),
        _ => {}
    }
    match child_text(compile, "FavorSizeOrSpeed") {
        Some("Speed") => settings.optimize_speed = Some(true),
        Some("Size") => settings.optimize_speed = Some(false),
        _ => {}
    }
    if let Some(dirs) = child_text(compile, "AdditionalIncludeDirectories") {
        settings.add_inc_dirs(dirs.split(';'));
    }
    if let Some(defines) = child_text(compile, "PreprocessorDefinitions") {
        settings.add_defines(defines.split(';').filter(|d| !d.contains("%(")));
    }
}

/// `Level3` → `3`. `EnableAllWarnings` counts as the highest level.
fn warning_level(value: &str) -> Option<String> {
    match value {
        "EnableAllWarnings" => Some("4".into()),
        "TurnOffAllWarnings" => None,
        _ => value
            .strip_prefix("Level")
            .filter(|n| matches!(*n, "1" | "2" | "3" | "4"))
            .map(String::from),
    }
}

#[cfg(test)]
mod tests {
    use super::super::import_project;
    use super::super::tests::project_dir;
    use super::*;
    use crate::descriptor::DiagnosticKind;
    use crate::options::OptionId;
    use pretty_assertions::assert_eq;

    const PROJECT: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Project DefaultTargets="Build" xmlns="http://schemas.microsoft.com/developer/msbuild/2003">
  <ItemGroup Label="ProjectConfigurations">
    <ProjectConfiguration Include="Debug|x64">
      <Configuration>Debug</Configuration>
      <Platform>x64</Platform>
    </ProjectConfiguration>
    <ProjectConfiguration Include="Release|x64">
      <Configuration>Release</Configuration>
      <Platform>x64</Platform>
    </ProjectConfiguration>
    <ProjectConfiguration Include="Release|Win32">
      <Configuration>Release</Configuration>
      <Platform>Win32</Platform>
    </ProjectConfiguration>
  </ItemGroup>
  <PropertyGroup Label="Globals">
    <RootNamespace>ttdemo</RootNamespace>
  </PropertyGroup>
  <PropertyGroup Condition="'$(Configuration)|$(Platform)'=='Release|x64'" Label="Configuration">
    <ConfigurationType>Application</ConfigurationType>
  </PropertyGroup>
  <PropertyGroup Condition="'$(Configuration)|$(Platform)'=='Debug|x64'" Label="Configuration">
    <ConfigurationType>Application</ConfigurationType>
  </PropertyGroup>
  <ItemDefinitionGroup>
    <ClCompile>
      <AdditionalIncludeDirectories>..\include;$(VcpkgRoot)include;%(AdditionalIncludeDirectories)</AdditionalIncludeDirectories>
    </ClCompile>
  </ItemDefinitionGroup>
  <ItemDefinitionGroup Condition="'$(Configuration)|$(Platform)'=='Release|x64'">
    <ClCompile>
      <WarningLevel>Level3</WarningLevel>
      <Optimization>MaxSpeed</Optimization>
      <PreprocessorDefinitions>WIN32;NDEBUG;_WINDOWS;%(PreprocessorDefinitions)</PreprocessorDefinitions>
    </ClCompile>
    <Link>
      <SubSystem>Windows</SubSystem>
    </Link>
  </ItemDefinitionGroup>
  <ItemDefinitionGroup Condition="'$(Configuration)|$(Platform)'=='Debug|x64'">
    <ClCompile>
      <WarningLevel>Level4</WarningLevel>
      <Optimization>Disabled</Optimization>
      <PreprocessorDefinitions>WIN32;_DEBUG;_WINDOWS;TRACE_ALL;%(PreprocessorDefinitions)</PreprocessorDefinitions>
    </ClCompile>
    <Link>
      <SubSystem>Windows</SubSystem>
    </Link>
  </ItemDefinitionGroup>
  <ItemDefinitionGroup Condition="'$(Configuration)|$(Platform)'=='Release|Win32'">
    <ClCompile>
      <WarningLevel>Level1</WarningLevel>
    </ClCompile>
  </ItemDefinitionGroup>
  <ItemGroup>
    <ClCompile Include="..\src\main.cpp" />
    <ClCompile Include="..\src\view.cpp" />
    <ClInclude Include="..\src\view.h" />
    <ResourceCompile Include="..\src\ttdemo.rc" />
  </ItemGroup>
</Project>
"#;

    const FILTERS: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Project ToolsVersion="4.0" xmlns="http://schemas.microsoft.com/developer/msbuild/2003">
  <ItemGroup>
    <ClCompile Include="..\src\main.cpp">
      <Filter>Source Files</Filter>
    </ClCompile>
    <ClCompile Include="..\src\extra.cpp">
      <Filter>Source Files</Filter>
    </ClCompile>
  </ItemGroup>
</Project>
"#;

    #[test]
    fn imports_files_and_first_platform_settings() {
        let dir = project_dir(&[
            ("build/ttdemo.vcxproj", PROJECT),
            ("build/ttdemo.vcxproj.filters", FILTERS),
            ("src/main.cpp", ""),
            ("src/view.cpp", ""),
            ("src/ttdemo.rc", ""),
            ("src/extra.cpp", ""),
        ]);
        let script = dir.path().join("build/ttdemo.vcxproj");
        let conversion = import_project(script, dir.path().join("src")).unwrap();
        let desc = &conversion.descriptor;

        let files: Vec<&str> = desc.src_files().iter().map(|f| f.path()).collect();
        assert_eq!(files, ["main.cpp", "view.cpp", "ttdemo.rc", "extra.cpp"]);
        assert!(desc.diagnostics().is_empty());

        assert_eq!(desc.project_name(), Some("ttdemo"));
        assert_eq!(desc.option(OptionId::ExeType), Some("window"));
        assert_eq!(desc.option(OptionId::Warn), Some("3"));
        assert_eq!(desc.option(OptionId::Optimize), Some("speed"));
        assert_eq!(desc.option(OptionId::IncDirs), Some("../include"));
        assert_eq!(desc.option(OptionId::CFlagsCmn), Some("-DWIN32 -D_WINDOWS"));
        assert_eq!(desc.option(OptionId::CFlagsRel), None);
        assert_eq!(desc.option(OptionId::CFlagsDbg), Some("-DTRACE_ALL"));
    }

    #[test]
    fn missing_sources_are_diagnostics() {
        let dir = project_dir(&[("ttdemo.vcxproj", PROJECT)]);
        let conversion = import_project(dir.path().join("ttdemo.vcxproj"), dir.path()).unwrap();
        let desc = &conversion.descriptor;
        assert_eq!(desc.src_files().len(), 3);
        assert!(desc.diagnostics().iter().all(|d| d.kind == DiagnosticKind::MissingFile));
        assert_eq!(desc.diagnostics().len(), 3);
    }

    #[test]
    fn library_configuration_types() {
        let project = r#"<Project>
  <PropertyGroup><ConfigurationType>StaticLibrary</ConfigurationType></PropertyGroup>
</Project>"#;
        let dir = project_dir(&[("lib.vcxproj", project)]);
        let conversion = import_project(dir.path().join("lib.vcxproj"), dir.path()).unwrap();
        assert_eq!(conversion.descriptor.option(OptionId::ExeType), Some("lib"));
        assert_eq!(conversion.descriptor.project_name(), Some("lib"));
    }

    #[test]
    fn warning_levels() {
        assert_eq!(warning_level("Level2").as_deref(), Some("2"));
        assert_eq!(warning_level("EnableAllWarnings").as_deref(), Some("4"));
        assert_eq!(warning_level("TurnOffAllWarnings"), None);
        assert_eq!(warning_level("Level9"), None);
    }
}
