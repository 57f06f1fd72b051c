//! WGSL front end shared by every graphics device.
//!
//! Parsing and validation go through `naga`, the compiler `wgpu` itself uses,
//! so the logs match what the production backend would report.

use naga::valid::{Capabilities, ValidationFlags, Validator};

use crate::device::ShaderKind;

/// Entry point the vertex stage must export.
pub const VERTEX_ENTRY: &str = "vs_main";
/// Entry point the fragment stage must export.
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// Parses and validates one stage. Returns the compiler log on failure.
pub(crate) fn compile_wgsl(kind: ShaderKind, source: &str) -> Result<naga::Module, String> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| e.emit_to_string(source))?;

    Validator::new(ValidationFlags::all(), Capabilities::default())
        .validate(&module)
        .map_err(|e| e.emit_to_string(source))?;

    let stage = naga_stage(kind);
    if !module.entry_points.iter().any(|ep| ep.stage == stage) {
        return Err(format!("module declares no {} entry point", stage_name(kind)));
    }

    Ok(module)
}

/// Checks that the named entry points exist and that every fragment input
/// location is written by the vertex stage.
pub(crate) fn link(vertex: &naga::Module, fragment: &naga::Module) -> Result<(), String> {
    let vs = find_entry(vertex, naga::ShaderStage::Vertex, VERTEX_ENTRY)?;
    let fs = find_entry(fragment, naga::ShaderStage::Fragment, FRAGMENT_ENTRY)?;

    let outputs = vs
        .function
        .result
        .as_ref()
        .map(|r| locations(vertex, r.ty, r.binding.as_ref()))
        .unwrap_or_default();

    let mut unmatched: Vec<u32> = fs
        .function
        .arguments
        .iter()
        .flat_map(|arg| locations(fragment, arg.ty, arg.binding.as_ref()))
        .filter(|loc| !outputs.contains(loc))
        .collect();

    if unmatched.is_empty() {
        return Ok(());
    }

    unmatched.sort_unstable();
    Err(format!(
        "fragment input location(s) {unmatched:?} of `{FRAGMENT_ENTRY}` are not written by `{VERTEX_ENTRY}`"
    ))
}

fn find_entry<'m>(
    module: &'m naga::Module,
    stage: naga::ShaderStage,
    name: &str,
) -> Result<&'m naga::EntryPoint, String> {
    module
        .entry_points
        .iter()
        .find(|ep| ep.stage == stage && ep.name == name)
        .ok_or_else(|| format!("missing {stage:?} entry point `{name}`"))
}

/// User-defined `@location` slots carried by a value of type `ty`.
fn locations(
    module: &naga::Module,
    ty: naga::Handle<naga::Type>,
    binding: Option<&naga::Binding>,
) -> Vec<u32> {
    match binding {
        Some(naga::Binding::Location { location, .. }) => vec![*location],
        Some(naga::Binding::BuiltIn(_)) => Vec::new(),
        None => match &module.types[ty].inner {
            naga::TypeInner::Struct { members, .. } => members
                .iter()
                .filter_map(|m| match &m.binding {
                    Some(naga::Binding::Location { location, .. }) => Some(*location),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        },
    }
}

fn naga_stage(kind: ShaderKind) -> naga::ShaderStage {
    match kind {
        ShaderKind::Vertex => naga::ShaderStage::Vertex,
        ShaderKind::Fragment => naga::ShaderStage::Fragment,
    }
}

fn stage_name(kind: ShaderKind) -> &'static str {
    match kind {
        ShaderKind::Vertex => "vertex",
        ShaderKind::Fragment => "fragment",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::{COMPOSITE_FRAGMENT_SOURCE, COMPOSITE_VERTEX_SOURCE};

    #[test]
    fn bundled_stages_compile_and_link() {
        let vs = compile_wgsl(ShaderKind::Vertex, COMPOSITE_VERTEX_SOURCE).unwrap();
        let fs = compile_wgsl(ShaderKind::Fragment, COMPOSITE_FRAGMENT_SOURCE).unwrap();
        link(&vs, &fs).unwrap();
    }

    #[test]
    fn syntax_error_yields_nonempty_log() {
        let log = compile_wgsl(ShaderKind::Fragment, "@fragment fn fs_main( -> {").unwrap_err();
        assert!(!log.trim().is_empty());
    }

    #[test]
    fn wrong_stage_is_rejected() {
        let err = compile_wgsl(ShaderKind::Vertex, COMPOSITE_FRAGMENT_SOURCE).unwrap_err();
        assert!(err.contains("vertex"));
    }

    #[test]
    fn link_reports_unwritten_fragment_inputs() {
        let vs = compile_wgsl(
            ShaderKind::Vertex,
            "@vertex fn vs_main() -> @builtin(position) vec4<f32> { return vec4<f32>(0.0); }",
        )
        .unwrap();
        let fs = compile_wgsl(ShaderKind::Fragment, COMPOSITE_FRAGMENT_SOURCE).unwrap();
        let log = link(&vs, &fs).unwrap_err();
        assert!(log.contains("[0]"), "{log}");
    }

    #[test]
    fn link_requires_named_entry_points() {
        let vs = compile_wgsl(
            ShaderKind::Vertex,
            "@vertex fn main() -> @builtin(position) vec4<f32> { return vec4<f32>(0.0); }",
        )
        .unwrap();
        let fs = compile_wgsl(ShaderKind::Fragment, COMPOSITE_FRAGMENT_SOURCE).unwrap();
        let log = link(&vs, &fs).unwrap_err();
        assert!(log.contains(VERTEX_ENTRY));
    }
}
