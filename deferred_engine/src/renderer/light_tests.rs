/// Unit tests for light.rs

use super::*;
use crate::graphics_context::{RecordingContext, UniformValue};

const VERTEX: &str = "void main() {}";

const LIGHTING: &str = "
    struct PointLight {
        vec3 position;
        vec4 ambient;
        vec4 diffuse;
        vec4 specular;
        float constant;
        float linear;
        float quadratic;
        float radius;
    };
    struct DirLight {
        vec3 direction;
        vec4 ambient;
        vec4 diffuse;
        vec4 specular;
        float radius;
    };
    #define NR_POINT_LIGHTS 4
    #define NR_DIR_LIGHTS 4
    uniform PointLight pointLights[NR_POINT_LIGHTS];
    uniform DirLight dirLights[NR_DIR_LIGHTS];
    void main() {}
";

fn lighting_program(ctx: &mut RecordingContext) -> ShaderProgram {
    ShaderProgram::from_sources(ctx, "lighting", VERTEX, LIGHTING).unwrap()
}

fn red_point(intensity: f32) -> Light {
    Light::point(
        ObjectKey::default(),
        Vec4::new(1.0, 0.0, 0.0, 1.0),
        Vec4::splat(0.1),
        Vec4::splat(0.5),
        intensity,
    )
}

// ============================================================================
// RADIUS
// ============================================================================

#[test]
fn test_radius_formula() {
    assert_eq!(radius_for_intensity(0.0), 0.0);
    assert_eq!(radius_for_intensity(1.0), 10.0);
    assert_eq!(radius_for_intensity(4.0), 20.0);
    assert!((radius_for_intensity(2.0) - 14.142136).abs() < 1e-4);
}

#[test]
fn test_negative_intensity_clamps() {
    assert_eq!(radius_for_intensity(-3.0), 0.0);
    let light = red_point(-1.0);
    assert_eq!(light.intensity(), 0.0);
    assert_eq!(light.radius(), 0.0);
}

#[test]
fn test_default_point_light() {
    let light = red_point(1.0);
    let point = light.as_point().unwrap();

    assert_eq!(point.constant, 1.0);
    assert_eq!(point.linear, 0.0);
    assert_eq!(point.quadratic, 0.0);
    assert_eq!(light.radius(), 10.0);
    assert_eq!(light.kind_tag(), LightKindTag::Point);
}

#[test]
fn test_radius_follows_intensity() {
    let mut light = red_point(1.0);
    light.set_intensity(9.0);
    assert_eq!(light.radius(), 30.0);
    light.set_intensity(0.0);
    assert_eq!(light.radius(), 0.0);
}

#[test]
fn test_radius_override() {
    let mut light = red_point(1.0);
    light.set_radius_override(3.0);
    light.set_intensity(100.0);
    assert_eq!(light.radius(), 3.0);

    light.clear_radius_override();
    assert_eq!(light.radius(), 100.0);
}

#[test]
fn test_array_names() {
    let directional = Light::directional(
        ObjectKey::default(), Vec3::NEG_Y, Vec4::ONE, Vec4::ZERO, Vec4::ONE, 1.0,
    );
    assert_eq!(directional.uniform_array_name(), "dirLights");
    assert_eq!(red_point(1.0).uniform_array_name(), "pointLights");
    assert!(directional.as_point().is_none());
}

#[test]
fn test_kind_data_mutators_stay_within_kind() {
    let mut point = red_point(1.0);
    assert!(point.as_directional_mut().is_none());
    point.as_point_mut().unwrap().quadratic = 0.032;
    assert_eq!(point.kind_tag(), LightKindTag::Point);
    assert_eq!(
        *point.kind(),
        LightKind::Point(PointLight { constant: 1.0, linear: 0.0, quadratic: 0.032 })
    );

    let mut sun = Light::directional(
        ObjectKey::default(), Vec3::NEG_Y, Vec4::ONE, Vec4::ZERO, Vec4::ONE, 1.0,
    );
    assert!(sun.as_point_mut().is_none());
    sun.as_directional_mut().unwrap().direction = Vec3::X;
    assert_eq!(sun.kind_tag(), LightKindTag::Directional);
    assert_eq!(sun.as_directional().unwrap().direction, Vec3::X);
}

// ============================================================================
// FORWARDING
// ============================================================================

#[test]
fn test_point_light_forwards_every_field() {
    let mut ctx = RecordingContext::new(64, 64);
    let program = lighting_program(&mut ctx);
    let light = Light::point_with_attenuation(
        ObjectKey::default(),
        Vec4::ONE,
        Vec4::splat(0.2),
        Vec4::splat(0.7),
        4.0,
        PointLight { constant: 1.0, linear: 0.09, quadratic: 0.032 },
    );

    light.forward_to_shader(&mut ctx, &program, 1, Vec3::new(1.0, 2.0, 3.0));

    let handle = program.handle();
    assert_eq!(
        ctx.uniform_writes(),
        vec![
            "pointLights[1].position",
            "pointLights[1].ambient",
            "pointLights[1].diffuse",
            "pointLights[1].specular",
            "pointLights[1].constant",
            "pointLights[1].linear",
            "pointLights[1].quadratic",
            "pointLights[1].radius",
        ]
    );
    assert_eq!(
        ctx.uniform_value(handle, "pointLights[1].position"),
        Some(UniformValue::Vec3(Vec3::new(1.0, 2.0, 3.0)))
    );
    assert_eq!(ctx.uniform_value(handle, "pointLights[1].linear"), Some(UniformValue::Float(0.09)));
    assert_eq!(ctx.uniform_value(handle, "pointLights[1].radius"), Some(UniformValue::Float(20.0)));
}

#[test]
fn test_two_point_lights_do_not_overlap() {
    let mut ctx = RecordingContext::new(64, 64);
    let program = lighting_program(&mut ctx);
    let red = red_point(1.0);
    let blue = Light::point(
        ObjectKey::default(),
        Vec4::new(0.0, 0.0, 1.0, 1.0),
        Vec4::splat(0.3),
        Vec4::splat(0.9),
        4.0,
    );

    red.forward_to_shader(&mut ctx, &program, 0, Vec3::X);
    blue.forward_to_shader(&mut ctx, &program, 1, Vec3::Y);

    let handle = program.handle();
    let value = |name: &str| ctx.uniform_value(handle, name);
    assert_eq!(value("pointLights[0].diffuse"), Some(UniformValue::Vec4(Vec4::new(1.0, 0.0, 0.0, 1.0))));
    assert_eq!(value("pointLights[1].diffuse"), Some(UniformValue::Vec4(Vec4::new(0.0, 0.0, 1.0, 1.0))));
    assert_eq!(value("pointLights[0].position"), Some(UniformValue::Vec3(Vec3::X)));
    assert_eq!(value("pointLights[1].position"), Some(UniformValue::Vec3(Vec3::Y)));
    assert_eq!(value("pointLights[0].radius"), Some(UniformValue::Float(10.0)));
    assert_eq!(value("pointLights[1].radius"), Some(UniformValue::Float(20.0)));
    assert_eq!(value("pointLights[0].ambient"), Some(UniformValue::Vec4(Vec4::splat(0.1))));
    assert_eq!(value("pointLights[1].ambient"), Some(UniformValue::Vec4(Vec4::splat(0.3))));
}

#[test]
fn test_directional_light_writes_only_its_slot() {
    let mut ctx = RecordingContext::new(64, 64);
    let program = lighting_program(&mut ctx);
    let light = Light::directional(
        ObjectKey::default(),
        Vec3::new(-0.2, -1.0, -0.3),
        Vec4::splat(0.8),
        Vec4::splat(0.05),
        Vec4::splat(0.5),
        1.0,
    );

    light.forward_to_shader(&mut ctx, &program, 3, Vec3::new(9.0, 9.0, 9.0));

    let writes = ctx.uniform_writes();
    assert_eq!(
        writes,
        vec![
            "dirLights[3].direction",
            "dirLights[3].ambient",
            "dirLights[3].diffuse",
            "dirLights[3].specular",
            "dirLights[3].radius",
        ]
    );
    for k in [0, 1, 2] {
        let prefix = format!("dirLights[{}]", k);
        assert!(!writes.iter().any(|w| w.starts_with(&prefix)));
    }
    assert_eq!(
        ctx.uniform_value(program.handle(), "dirLights[3].direction"),
        Some(UniformValue::Vec3(Vec3::new(-0.2, -1.0, -0.3)))
    );
}
