//! CodeBlocks `.cbp` projects.

use roxmltree::{Document, Node};

use super::{BuildKind, BuildSettings, ConfigSettings, ImportContext};
use crate::options::ExeType;

pub(crate) fn import(doc: &Document, ctx: &mut ImportContext) {
    let Some(project) = child(doc.root_element(), "Project") else {
        return;
    };

    for option in children(project, "Option") {
        if let Some(title) = option.attribute("title") {
            ctx.set_project(title);
        }
    }
    for unit in children(project, "Unit") {
        if let Some(file) = unit.attribute("filename") {
            ctx.add_source(file);
        }
    }

    let mut common = ConfigSettings::default();
    if let Some(compiler) = child(project, "Compiler") {
        read_compiler(compiler, &mut common);
    }

    let mut settings = BuildSettings::default();
    for target in child(project, "Build").into_iter().flat_map(|b| children(b, "Target")) {
        let Some(kind) = target.attribute("title").and_then(BuildKind::from_name) else {
            continue;
        };
        let mut config = ConfigSettings::default();
        for option in children(target, "Option") {
            if let Some(kind) = option.attribute("type") {
                config.exe_type = exe_type(kind);
            }
        }
        if let Some(compiler) = child(target, "Compiler") {
            read_compiler(compiler, &mut config);
        }
        let slot = settings.slot(kind);
        if slot.is_none() {
            *slot = Some(config);
        }
    }
    settings.with_common(&common).apply(ctx);
}

fn child<'a, 'i>(node: Node<'a, 'i>, tag: &str) -> Option<Node<'a, 'i>> {
    node.children().find(|n| n.has_tag_name(tag))
}

fn children<'a, 'i>(node: Node<'a, 'i>, tag: &'static str) -> impl Iterator<Item = Node<'a, 'i>> {
    node.children().filter(move |n| n.has_tag_name(tag))
}

/// `<Add option="-O2"/>` and `<Add directory="include"/>` entries.
fn read_compiler(compiler: Node, settings: &mut ConfigSettings) {
    for add in children(compiler, "Add") {
        if let Some(options) = add.attribute("option") {
            for option in options.split_whitespace() {
                settings.add_gcc_option(option);
            }
        }
        if let Some(dir) = add.attribute("directory") {
            settings.add_inc_dirs([dir]);
        }
    }
}

/// Target types: 0 GUI, 1 console, 2 static library, 3 shared library.
fn exe_type(kind: &str) -> Option<ExeType> {
    match kind.trim() {
        "0" => Some(ExeType::Window),
        "1" => Some(ExeType::Console),
        "2" => Some(ExeType::Lib),
        "3" => Some(ExeType::Dll),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::super::import_project;
    use super::super::tests::project_dir;
    use crate::options::OptionId;
    use pretty_assertions::assert_eq;

    const PROJECT: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes" ?>
<CodeBlocks_project_file>
  <FileVersion major="1" minor="6" />
  <Project>
    <Option title="cbdemo" />
    <Option compiler="gcc" />
    <Build>
      <Target title="Debug">
        <Option output="bin/Debug/cbdemo" prefix_auto="1" extension_auto="1" />
        <Option type="0" />
        <Compiler>
          <Add option="-g" />
          <Add option="-DTRACE" />
        </Compiler>
      </Target>
      <Target title="Release">
        <Option output="bin/Release/cbdemo" prefix_auto="1" extension_auto="1" />
        <Option type="0" />
        <Compiler>
          <Add option="-O2" />
        </Compiler>
      </Target>
    </Build>
    <Compiler>
      <Add option="-Wall -DUNICODE" />
      <Add directory="../include" />
    </Compiler>
    <Unit filename="main.cpp" />
    <Unit filename="main.h" />
    <Unit filename="res/cbdemo.rc">
      <Option compilerVar="WINDRES" />
    </Unit>
  </Project>
</CodeBlocks_project_file>
"#;

    #[test]
    fn imports_targets_and_shared_compiler_settings() {
        let dir = project_dir(&[
            ("cb/cbdemo.cbp", PROJECT),
            ("cb/main.cpp", ""),
            ("cb/res/cbdemo.rc", ""),
        ]);
        let conversion = import_project(dir.path().join("cb/cbdemo.cbp"), dir.path()).unwrap();
        let desc = &conversion.descriptor;

        let files: Vec<&str> = desc.src_files().iter().map(|f| f.path()).collect();
        assert_eq!(files, ["cb/main.cpp", "cb/res/cbdemo.rc"]);
        assert!(desc.diagnostics().is_empty());

        assert_eq!(desc.project_name(), Some("cbdemo"));
        assert_eq!(desc.option(OptionId::ExeType), Some("window"));
        assert_eq!(desc.option(OptionId::Warn), Some("4"));
        assert_eq!(desc.option(OptionId::Optimize), Some("speed"));
        assert_eq!(desc.option(OptionId::IncDirs), Some("include"));
        assert_eq!(desc.option(OptionId::CFlagsCmn), Some("-DUNICODE"));
        assert_eq!(desc.option(OptionId::CFlagsDbg), Some("-DTRACE"));
    }
}
