//! Gears：三个咬合转动的齿轮
//!
//! 方向键绕 X / Y 轴旋转视角，Z 和 Shift+Z 绕 Z 轴正反旋转，每次 5 度。
//! 光照在 CPU 上逐顶点计算：方向光加 0.2 的环境光，法线变换到观察空间。

use crate::config::WindowConfig;
use crate::core::error::DemoResult;
use crate::core::{Demo, FrameTime};
use crate::platform::{InputEvent, KeyCode, Window};
use crate::render::{DrawState, GraphicsContext, LitVertex, Primitive, Vertex};
use glam::{Mat3, Mat4, Vec2, Vec3};
use std::f32::consts::TAU;

pub const TITLE: &str = "Gears";

pub const CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// 观察空间中的光源方向
const LIGHT_DIRECTION: Vec3 = Vec3::new(5.0, 5.0, 10.0);
const AMBIENT: f32 = 0.2;

const DEGREES_PER_SECOND: f64 = 100.0;
const KEY_STEP: f32 = 5.0;

const Z_NEAR: f32 = 5.0;
const Z_FAR: f32 = 30.0;
const X_MAX: f32 = Z_NEAR * 0.5;
const CAMERA_DISTANCE: f32 = 20.0;

fn lit(position: Vec3, normal: Vec3) -> LitVertex {
    LitVertex::new(position, normal)
}

/// 齿轮尺寸
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GearSpec {
    /// 中心孔半径
    pub inner_radius: f32,
    /// 齿中部半径
    pub outer_radius: f32,
    /// 厚度
    pub width: f32,
    pub teeth: usize,
    /// 齿高
    pub tooth_depth: f32,
}

/// 三角形扇，`corners[0]` 为扇心
fn push_fan(mesh: &mut Vec<LitVertex>, corners: &[LitVertex]) {
    for k in 1..corners.len().saturating_sub(1) {
        mesh.extend_from_slice(&[corners[0], corners[k], corners[k + 1]]);
    }
}

/// 齿轮网格（三角形列表），轴为 Z，厚度方向对称
///
/// 每个齿由正反两面、四个外侧面和一段内孔面组成，共 60 个顶点。
pub fn gear_mesh(spec: &GearSpec) -> Vec<LitVertex> {
    let r0 = spec.inner_radius;
    let r1 = spec.outer_radius - spec.tooth_depth / 2.0;
    let r2 = spec.outer_radius + spec.tooth_depth / 2.0;
    let da = TAU / spec.teeth as f32 / 4.0;
    let half = spec.width * 0.5;
    let at = |r: f32, angle: f32, z: f32| Vec3::new(r * angle.cos(), r * angle.sin(), z);

    let mut mesh = Vec::with_capacity(spec.teeth * 60);
    for i in 0..spec.teeth {
        let a = i as f32 * TAU / spec.teeth as f32;

        // 正面和背面：齿根环带 + 齿面
        for (z, normal) in [(half, Vec3::Z), (-half, Vec3::NEG_Z)] {
            let mut ring = [
                lit(at(r0, a, z), normal),
                lit(at(r1, a, z), normal),
                lit(at(r1, a + 3.0 * da, z), normal),
                lit(at(r1, a + 4.0 * da, z), normal),
                lit(at(r0, a + 4.0 * da, z), normal),
            ];
            let mut tooth = [
                lit(at(r1, a, z), normal),
                lit(at(r2, a + da, z), normal),
                lit(at(r2, a + 2.0 * da, z), normal),
                lit(at(r1, a + 3.0 * da, z), normal),
            ];
            if z < 0.0 {
                ring[1..].reverse();
                tooth[1..].reverse();
            }
            push_fan(&mut mesh, &ring);
            push_fan(&mut mesh, &tooth);
        }

        // 外侧：上升沿、齿顶、下降沿、齿根
        let outline = [
            (r1, a),
            (r2, a + da),
            (r2, a + 2.0 * da),
            (r1, a + 3.0 * da),
            (r1, a + 4.0 * da),
        ];
        for pair in outline.windows(2) {
            let p = at(pair[0].0, pair[0].1, 0.0);
            let q = at(pair[1].0, pair[1].1, 0.0);
            let d = q - p;
            let normal = Vec3::new(d.y, -d.x, 0.0).normalize_or_zero();
            push_fan(
                &mut mesh,
                &[
                    lit(p + Vec3::Z * half, normal),
                    lit(p - Vec3::Z * half, normal),
                    lit(q - Vec3::Z * half, normal),
                    lit(q + Vec3::Z * half, normal),
                ],
            );
        }

        // 内孔，法线朝轴心平滑过渡
        let b = a + 4.0 * da;
        let inward = |angle: f32| Vec3::new(-angle.cos(), -angle.sin(), 0.0);
        push_fan(
            &mut mesh,
            &[
                lit(at(r0, a, -half), inward(a)),
                lit(at(r0, a, half), inward(a)),
                lit(at(r0, b, half), inward(b)),
                lit(at(r0, b, -half), inward(b)),
            ],
        );
    }
    mesh
}

/// 环境光加方向光漫反射
pub fn shade(color: Vec3, normal: Vec3, light: Vec3) -> Vec3 {
    color * (AMBIENT + normal.dot(light).max(0.0))
}

/// 一个齿轮及其在齿轮组中的位置
#[derive(Debug, Clone)]
pub struct Gear {
    pub spec: GearSpec,
    pub color: Vec3,
    pub center: Vec2,
    /// 相对主动轮的转速倍率
    pub speed: f32,
    /// 初始相位（度）
    pub phase: f32,
    mesh: Vec<LitVertex>,
}

impl Gear {
    pub fn new(spec: GearSpec, color: Vec3, center: Vec2, speed: f32, phase: f32) -> Self {
        Self {
            mesh: gear_mesh(&spec),
            spec,
            color,
            center,
            speed,
            phase,
        }
    }

    pub fn mesh(&self) -> &[LitVertex] {
        &self.mesh
    }

    /// 主动轮转过 `angle` 度时本齿轮的角度
    pub fn rotation_degrees(&self, angle: f32) -> f32 {
        self.speed * angle + self.phase
    }

    pub fn model(&self, angle: f32) -> Mat4 {
        Mat4::from_translation(self.center.extend(0.0))
            * Mat4::from_rotation_z(self.rotation_degrees(angle).to_radians())
    }
}

/// 红色主动轮带动绿、蓝两个小齿轮
pub fn gear_train() -> [Gear; 3] {
    [
        Gear::new(
            GearSpec {
                inner_radius: 1.0,
                outer_radius: 4.0,
                width: 1.0,
                teeth: 20,
                tooth_depth: 0.7,
            },
            Vec3::new(0.8, 0.1, 0.0),
            Vec2::new(-3.0, -2.0),
            1.0,
            0.0,
        ),
        Gear::new(
            GearSpec {
                inner_radius: 0.5,
                outer_radius: 2.0,
                width: 2.0,
                teeth: 10,
                tooth_depth: 0.7,
            },
            Vec3::new(0.0, 0.8, 0.2),
            Vec2::new(3.1, -2.0),
            -2.0,
            -9.0,
        ),
        Gear::new(
            GearSpec {
                inner_radius: 1.3,
                outer_radius: 2.0,
                width: 0.5,
                teeth: 10,
                tooth_depth: 0.7,
            },
            Vec3::new(0.2, 0.2, 1.0),
            Vec2::new(-3.1, 4.2),
            -2.0,
            -25.0,
        ),
    ]
}

/// 视角（度）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GearsView {
    pub rot_x: f32,
    pub rot_y: f32,
    pub rot_z: f32,
}

impl Default for GearsView {
    fn default() -> Self {
        Self {
            rot_x: 20.0,
            rot_y: 30.0,
            rot_z: 0.0,
        }
    }
}

impl GearsView {
    /// 按键调整，返回是否处理
    pub fn apply_key(&mut self, key: KeyCode, shift: bool) -> bool {
        match key {
            KeyCode::Z if shift => self.rot_z -= KEY_STEP,
            KeyCode::Z => self.rot_z += KEY_STEP,
            KeyCode::Up => self.rot_x += KEY_STEP,
            KeyCode::Down => self.rot_x -= KEY_STEP,
            KeyCode::Left => self.rot_y += KEY_STEP,
            KeyCode::Right => self.rot_y -= KEY_STEP,
            _ => return false,
        }
        true
    }

    pub fn rotation(&self) -> Mat4 {
        Mat4::from_rotation_x(self.rot_x.to_radians())
            * Mat4::from_rotation_y(self.rot_y.to_radians())
            * Mat4::from_rotation_z(self.rot_z.to_radians())
    }
}

/// 近平面半宽固定为 2.5 的透视投影
pub fn gears_projection(aspect_ratio: f32) -> Mat4 {
    let top = X_MAX / aspect_ratio;
    Mat4::perspective_rh(2.0 * (top / Z_NEAR).atan(), aspect_ratio, Z_NEAR, Z_FAR)
}

pub struct GearsDemo {
    gears: [Gear; 3],
    view: GearsView,
    shift: bool,
    scratch: Vec<Vertex>,
}

impl Default for GearsDemo {
    fn default() -> Self {
        Self::new()
    }
}

impl GearsDemo {
    pub fn new() -> Self {
        Self {
            gears: gear_train(),
            view: GearsView::default(),
            shift: false,
            scratch: Vec::new(),
        }
    }

    /// 正方形窗口，边长取配置高度
    pub fn window_config(base: &WindowConfig) -> WindowConfig {
        WindowConfig {
            width: base.height,
            ..base.clone()
        }
    }

    pub fn view(&self) -> GearsView {
        self.view
    }

    pub fn gears(&self) -> &[Gear] {
        &self.gears
    }
}

impl Demo for GearsDemo {
    fn title(&self) -> &str {
        TITLE
    }

    fn init(&mut self, _ctx: &mut dyn GraphicsContext) -> DemoResult<()> {
        Ok(())
    }

    fn handle_input(&mut self, event: &InputEvent, _window: &dyn Window) {
        match *event {
            InputEvent::ModifiersChanged { shift } => self.shift = shift,
            InputEvent::KeyPressed { key } => {
                if self.view.apply_key(key, self.shift) {
                    tracing::trace!(target: "app", view = ?self.view, "Gears view changed");
                }
            }
            _ => {}
        }
    }

    fn frame(&mut self, ctx: &mut dyn GraphicsContext, time: FrameTime) -> DemoResult<()> {
        let angle = (time.elapsed_seconds * DEGREES_PER_SECOND) as f32;
        let rotation = self.view.rotation();
        let view = Mat4::from_translation(Vec3::new(0.0, 0.0, -CAMERA_DISTANCE)) * rotation;
        let projection = gears_projection(ctx.aspect_ratio());
        let light = LIGHT_DIRECTION.normalize();

        ctx.begin_frame(CLEAR_COLOR)?;
        ctx.bind_texture(None)?;
        ctx.set_state(DrawState::OPAQUE);
        for gear in &self.gears {
            let model = gear.model(angle);
            let normal_matrix = Mat3::from_mat4(rotation * model);
            self.scratch.clear();
            self.scratch.extend(gear.mesh().iter().map(|v| {
                let color = shade(gear.color, normal_matrix * v.normal, light);
                Vertex::colored(v.position, color)
            }));
            ctx.set_transform(projection * view * model);
            ctx.submit(Primitive::Triangles, &self.scratch);
        }
        ctx.end_frame()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::testing::MockWindow;
    use crate::render::{rgba8, RecordingContext};

    fn at(elapsed: f64) -> FrameTime {
        FrameTime {
            elapsed_seconds: elapsed,
            delta_seconds: 0.0,
        }
    }

    #[test]
    fn test_gear_mesh_shape() {
        let [big, small, _] = gear_train();
        assert_eq!(big.mesh().len(), 20 * 60);
        assert_eq!(small.mesh().len(), 10 * 60);

        let r2 = big.spec.outer_radius + big.spec.tooth_depth / 2.0;
        for v in big.mesh() {
            assert!(v.position.z.abs() <= 0.5 + 1e-6);
            assert!(v.position.truncate().length() <= r2 + 1e-4);
            assert!(v.position.truncate().length() >= big.spec.inner_radius - 1e-4);
            assert!((v.normal.length() - 1.0).abs() < 1e-4);
        }

        let front = big.mesh().iter().filter(|v| v.normal == Vec3::Z).count();
        let back = big.mesh().iter().filter(|v| v.normal == Vec3::NEG_Z).count();
        assert_eq!(front, 20 * 15);
        assert_eq!(back, front);
    }

    #[test]
    fn test_outward_normals_point_away_from_axis() {
        let [big, _, _] = gear_train();
        for v in big.mesh().iter().filter(|v| v.normal.z == 0.0) {
            let radial = v.position.truncate();
            let outward = v.normal.truncate().dot(radial) > 0.0;
            let on_hole = (radial.length() - big.spec.inner_radius).abs() < 1e-4;
            assert_eq!(outward, !on_hole, "vertex {:?}", v);
        }
    }

    #[test]
    fn test_shade_ambient_and_diffuse() {
        let red = Vec3::new(0.8, 0.1, 0.0);
        let light = LIGHT_DIRECTION.normalize();
        assert!((shade(red, light, light) - red * 1.2).length() < 1e-6);
        assert!((shade(red, -light, light) - red * 0.2).length() < 1e-6);
    }

    #[test]
    fn test_keys_rotate_view() {
        let mut demo = GearsDemo::new();
        let window = MockWindow::new(300, 300);
        let press = |demo: &mut GearsDemo, key| {
            demo.handle_input(&InputEvent::KeyPressed { key }, &window)
        };

        press(&mut demo, KeyCode::Up);
        press(&mut demo, KeyCode::Left);
        press(&mut demo, KeyCode::Z);
        assert_eq!(
            demo.view(),
            GearsView {
                rot_x: 25.0,
                rot_y: 35.0,
                rot_z: 5.0
            }
        );

        demo.handle_input(&InputEvent::ModifiersChanged { shift: true }, &window);
        press(&mut demo, KeyCode::Z);
        press(&mut demo, KeyCode::Z);
        assert_eq!(demo.view().rot_z, -5.0);

        demo.handle_input(&InputEvent::ModifiersChanged { shift: false }, &window);
        press(&mut demo, KeyCode::Down);
        press(&mut demo, KeyCode::Right);
        assert_eq!(demo.view().rot_x, 20.0);
        assert_eq!(demo.view().rot_y, 30.0);
        assert!(!demo.view.apply_key(KeyCode::W, false));
    }

    #[test]
    fn test_gear_train_speeds() {
        let [big, green, blue] = gear_train();
        assert_eq!(big.rotation_degrees(90.0), 90.0);
        assert_eq!(green.rotation_degrees(90.0), -189.0);
        assert_eq!(blue.rotation_degrees(0.0), -25.0);
    }

    #[test]
    fn test_frame_draws_three_lit_gears() {
        let mut demo = GearsDemo::new();
        let mut ctx = RecordingContext::new(300, 300);
        demo.init(&mut ctx).unwrap();
        demo.frame(&mut ctx, at(0.9)).unwrap();

        let frame = ctx.last_frame().unwrap();
        assert_eq!(frame.clear, CLEAR_COLOR);
        assert_eq!(frame.draws.len(), 3);
        let counts: Vec<usize> = frame.draws.iter().map(|d| d.vertices.len()).collect();
        assert_eq!(counts, vec![1200, 600, 600]);
        assert!(frame.draws.iter().all(|d| d.state.depth_test));

        let gear = &demo.gears()[0];
        let expected = gears_projection(1.0)
            * Mat4::from_translation(Vec3::new(0.0, 0.0, -CAMERA_DISTANCE))
            * GearsView::default().rotation()
            * gear.model(90.0);
        assert!(frame.draws[0].transform.abs_diff_eq(expected, 1e-4));

        // 红色齿轮不含蓝色分量，亮度在环境光和 1.2 倍之间
        let brightest = rgba8((gear.color * 1.2).extend(1.0));
        let darkest = rgba8((gear.color * AMBIENT).extend(1.0));
        for v in &frame.draws[0].vertices {
            assert_eq!(v.color[2], 0);
            assert!(v.color[0] >= darkest[0] && v.color[0] <= brightest[0]);
        }
    }

    #[test]
    fn test_projection_half_width_fixed() {
        for aspect in [0.5, 1.0, 2.0] {
            let projection = gears_projection(aspect);
            assert!((projection.x_axis.x - Z_NEAR / X_MAX).abs() < 1e-4);
        }
    }
}
