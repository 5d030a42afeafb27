use std::borrow::Cow;

use formula::FragmentBody;
use wgpu::naga::ShaderStage;

/// Compiles the shared quad vertex shader used by every pass.
pub(crate) fn compile_vertex_shader(device: &wgpu::Device) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("gallery quad vertex"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Borrowed(VERTEX_SHADER_GLSL),
            stage: ShaderStage::Vertex,
            defines: &[],
        },
    })
}

/// Compiles a formula body into a throwaway fragment module.
///
/// Validation errors surface through the device error scope the caller
/// pushed, not through the return value.
pub(crate) fn compile_formula_shader(
    device: &wgpu::Device,
    body: &FragmentBody,
) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("formula fragment"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(wrap_fragment(body.as_str())),
            stage: ShaderStage::Fragment,
            defines: &[],
        },
    })
}

/// Compiles the fragment shader that copies a slot texture onto the screen.
pub(crate) fn compile_display_shader(device: &wgpu::Device) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("gallery display fragment"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(wrap_fragment(DISPLAY_BODY)),
            stage: ShaderStage::Fragment,
            defines: &[],
        },
    })
}

/// Splices a `vec3` expression between [`HEADER`] and [`FOOTER`].
///
/// The expression may use `t` (the bound texture), `UV`, `normalizeMult` and
/// `normalizeAdd`.
pub(crate) fn wrap_fragment(body: &str) -> String {
    format!("{HEADER}\n    vec3 color = {body};\n{FOOTER}")
}

const DISPLAY_BODY: &str = "texture(t,UV).rgb";

/// Must match `DrawParams` in `gpu/uniforms.rs`.
const HEADER: &str = r"#version 450
layout(location = 0) in vec2 UV;
layout(location = 0) out vec4 outColor;

layout(std140, set = 0, binding = 0) uniform DrawParams {
    mat4 projection;
    vec2 translation;
    float size;
    float _padding;
    vec4 _normalizeMult;
    vec4 _normalizeAdd;
} params;

layout(set = 1, binding = 0) uniform texture2D source_texture;
layout(set = 1, binding = 1) uniform sampler source_sampler;

#define t sampler2D(source_texture, source_sampler)
#define normalizeMult params._normalizeMult
#define normalizeAdd params._normalizeAdd

void main() {";

const FOOTER: &str = r"    outColor = vec4(color, 1.0);
}
";

/// Unit quad drawn as a four-vertex triangle strip, scaled by `size` and
/// placed at `translation` in pixel space.
const VERTEX_SHADER_GLSL: &str = r"#version 450
layout(location = 0) out vec2 UV;

layout(std140, set = 0, binding = 0) uniform DrawParams {
    mat4 projection;
    vec2 translation;
    float size;
    float _padding;
    vec4 _normalizeMult;
    vec4 _normalizeAdd;
} params;

const vec2 corners[4] = vec2[4](
    vec2(1.0, 0.0),
    vec2(1.0, 1.0),
    vec2(0.0, 0.0),
    vec2(0.0, 1.0)
);

void main() {
    vec2 position = corners[gl_VertexIndex];
    UV = position;
    vec2 pixel = position * params.size + params.translation;
    gl_Position = params.projection * vec4(pixel, 0.0, 1.0);
}
";

#[cfg(test)]
mod tests {
    use super::*;
    use formula::{ChannelExpressions, Expression, Formula};

    #[test]
    fn wrap_places_body_inside_main() {
        let wrapped = wrap_fragment("texture(t,UV).bgr");
        assert!(wrapped.starts_with("#version 450"));
        assert!(wrapped.contains("vec3 color = texture(t,UV).bgr;"));
        assert!(wrapped.contains("#define t sampler2D(source_texture, source_sampler)"));
        assert!(wrapped.trim_end().ends_with('}'));
        assert_eq!(wrapped.matches('{').count(), wrapped.matches('}').count());
    }

    #[test]
    fn wrapped_formula_references_normalisation_uniforms() {
        let expression = Expression::from_bytes(&[0x10, 0x25, 0x03]).unwrap();
        let body = Formula::Generated(ChannelExpressions::from_red(expression)).fragment_body();
        let wrapped = wrap_fragment(body.as_str());
        assert!(wrapped.contains("#define normalizeMult params._normalizeMult"));
        assert!(wrapped.contains("normalizeMult.r * ("));
        assert!(wrapped.contains("normalizeAdd.b"));
        assert_eq!(wrapped.matches('(').count(), wrapped.matches(')').count());
    }

    #[test]
    fn uniform_blocks_agree() {
        let block = |source: &str| {
            let start = source.find("uniform DrawParams").unwrap();
            let end = source[start..].find("} params;").unwrap();
            source[start..start + end].to_string()
        };
        assert_eq!(block(HEADER), block(VERTEX_SHADER_GLSL));
    }
}
