//! GLSL sources for the frame pipeline, valid as both GLSL 3.30 and
//! GLSL ES 3.00 once the backend adds its `#version` line.
//!
//! Positions are in config space; `u_model` takes them to physical pixels
//! and `u_projection` to clip space. Fragments within one physical pixel of
//! a frame edge are discarded, leaving a gap between neighbouring frames.

pub const A_POSITION: &str = "a_position";
pub const A_BOUNDS: &str = "a_bounds";
pub const A_COLOR: &str = "a_color";
pub const A_IS_SEARCH_RESULT: &str = "a_is_search_result";

pub const U_MODEL: &str = "u_model";
pub const U_PROJECTION: &str = "u_projection";
pub const U_BORDER_WIDTH: &str = "u_border_width";
pub const U_DRAW_BORDER: &str = "u_draw_border";
pub const U_SEARCH_ACTIVE: &str = "u_search_active";
pub const U_SEARCH_DIM: &str = "u_search_dim";

pub const ATTRIBUTES: [&str; 4] = [A_POSITION, A_BOUNDS, A_COLOR, A_IS_SEARCH_RESULT];
pub const UNIFORMS: [&str; 6] = [
    U_MODEL,
    U_PROJECTION,
    U_BORDER_WIDTH,
    U_DRAW_BORDER,
    U_SEARCH_ACTIVE,
    U_SEARCH_DIM,
];

pub const VERTEX_SHADER: &str = r#"
in vec2 a_position;
in vec4 a_bounds;
in vec4 a_color;
in float a_is_search_result;

uniform mat3 u_model;
uniform mat3 u_projection;

out vec2 v_config_pos;
out vec4 v_bounds;
out vec4 v_color;
out float v_is_search_result;

void main() {
    vec3 physical = u_model * vec3(a_position, 1.0);
    vec3 clip = u_projection * vec3(physical.xy, 1.0);
    gl_Position = vec4(clip.xy, 0.0, 1.0);

    v_config_pos = a_position;
    v_bounds = a_bounds;
    v_color = a_color;
    v_is_search_result = a_is_search_result;
}
"#;

pub const FRAGMENT_SHADER: &str = r#"
precision mediump float;

uniform vec2 u_border_width;
uniform bool u_draw_border;
uniform bool u_search_active;
uniform float u_search_dim;

in vec2 v_config_pos;
in vec4 v_bounds;
in vec4 v_color;
in float v_is_search_result;

out vec4 out_color;

void main() {
    if (u_draw_border) {
        bool near_x = v_config_pos.x - v_bounds.x < u_border_width.x
            || v_bounds.z - v_config_pos.x < u_border_width.x;
        bool near_y = v_config_pos.y - v_bounds.y < u_border_width.y
            || v_bounds.w - v_config_pos.y < u_border_width.y;
        if (near_x || near_y) {
            discard;
        }
    }

    vec4 color = v_color;
    if (u_search_active && v_is_search_result < 0.5) {
        color.a *= u_search_dim;
    }
    // premultiplied alpha
    out_color = vec4(color.rgb * color.a, color.a);
}
"#;
