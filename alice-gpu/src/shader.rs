//! WGSL validation.
//!
//! Module-supplied shader text is parsed and validated with naga before the
//! device ever sees it, so a bad shader is a reported rejection instead of a
//! device error.

use naga::valid::{Capabilities, ValidationFlags, Validator};

pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Vertex,
    Fragment,
    Compute,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoint {
    pub name: String,
    pub stage: Stage,
}

/// WGSL source that passed validation, with its entry points.
#[derive(Debug, Clone)]
pub struct ValidatedShader {
    pub source: String,
    pub entry_points: Vec<EntryPoint>,
}

impl ValidatedShader {
    pub fn has_entry(&self, name: &str, stage: Stage) -> bool {
        self.entry_points
            .iter()
            .any(|e| e.name == name && e.stage == stage)
    }

    /// True when the shader can back a render pipeline.
    pub fn is_renderable(&self) -> bool {
        self.has_entry(VERTEX_ENTRY, Stage::Vertex) && self.has_entry(FRAGMENT_ENTRY, Stage::Fragment)
    }
}

/// Parse and validate `source`. The error string is the diagnostic to report.
pub fn validate_wgsl(source: &str) -> Result<ValidatedShader, String> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| e.emit_to_string(source))?;

    Validator::new(ValidationFlags::all(), Capabilities::default())
        .validate(&module)
        .map_err(|e| e.as_inner().to_string())?;

    let entry_points = module
        .entry_points
        .iter()
        .map(|ep| EntryPoint {
            name: ep.name.clone(),
            stage: match ep.stage {
                naga::ShaderStage::Vertex => Stage::Vertex,
                naga::ShaderStage::Fragment => Stage::Fragment,
                naga::ShaderStage::Compute => Stage::Compute,
                #[allow(unreachable_patterns)]
                _ => Stage::Other,
            },
        })
        .collect();

    Ok(ValidatedShader {
        source: source.to_owned(),
        entry_points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_collects_entry_points() {
        let src = "@vertex fn vs_main() -> @builtin(position) vec4<f32> { return vec4<f32>(0.0); }
                   @fragment fn fs_main() -> @location(0) vec4<f32> { return vec4<f32>(1.0); }";
        let shader = validate_wgsl(src).unwrap();
        assert_eq!(shader.entry_points.len(), 2);
        assert!(shader.is_renderable());
    }

    #[test]
    fn test_validate_rejects_garbage() {
        assert!(validate_wgsl("fn (").is_err());
    }

    #[test]
    fn test_validate_rejects_type_errors() {
        let src = "@fragment fn fs_main() -> @location(0) vec4<f32> { return 1u; }";
        assert!(validate_wgsl(src).is_err());
    }
}
