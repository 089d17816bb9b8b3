//! 喷泉场景的静态几何体、纹理、相机和光照
//!
//! 光照在 CPU 上按顶点计算（环境光 + 漫反射 + Blinn-Phong 高光），再按到相机的
//! 距离混入指数雾，结果写入顶点颜色。

use super::{rgba8, TextureDesc, Vertex};
use crate::physics::GlowLight;
use glam::{Mat4, Vec2, Vec3};

/// 粒子纹理（8x8 亮度光斑）
pub const PARTICLE_TEXTURE_SIZE: u32 = 8;
#[rustfmt::skip]
pub const PARTICLE_TEXTURE: [u8; 64] = [
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x11, 0x22, 0x22, 0x11, 0x00, 0x00,
    0x00, 0x11, 0x33, 0x88, 0x77, 0x33, 0x11, 0x00,
    0x00, 0x22, 0x88, 0xff, 0xee, 0x77, 0x22, 0x00,
    0x00, 0x22, 0x77, 0xee, 0xff, 0x88, 0x22, 0x00,
    0x00, 0x11, 0x33, 0x77, 0x88, 0x33, 0x11, 0x00,
    0x00, 0x00, 0x11, 0x33, 0x22, 0x11, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// 地面纹理（16x16 亮度棋盘格）
pub const FLOOR_TEXTURE_SIZE: u32 = 16;
#[rustfmt::skip]
pub const FLOOR_TEXTURE: [u8; 256] = [
    0xf0, 0xf0, 0xf0, 0xf0, 0xf0, 0xf0, 0xf0, 0xf0, 0x30, 0x30, 0x30, 0x30, 0x30, 0x30, 0x30, 0x30,
    0xff, 0xf0, 0xcc, 0xf0, 0xf0, 0xf0, 0xff, 0xf0, 0x30, 0x30, 0x30, 0x30, 0x30, 0x30, 0x30, 0x30,
    0xf0, 0xcc, 0xee, 0xff, 0xf0, 0xf0, 0xf0, 0xf0, 0x30, 0x66, 0x30, 0x30, 0x30, 0x20, 0x30, 0x30,
    0xf0, 0xf0, 0xf0, 0xf0, 0xf0, 0xee, 0xf0, 0xf0, 0x30, 0x30, 0x30, 0x30, 0x30, 0x30, 0x30, 0x30,
    0xf0, 0xf0, 0xf0, 0xf0, 0xcc, 0xf0, 0xf0, 0xf0, 0x30, 0x30, 0x55, 0x30, 0x30, 0x44, 0x30, 0x30,
    0xf0, 0xdd, 0xf0, 0xf0, 0xf0, 0xf0, 0xf0, 0xf0, 0x33, 0x30, 0x30, 0x30, 0x30, 0x30, 0x30, 0x30,
    0xf0, 0xf0, 0xf0, 0xf0, 0xf0, 0xff, 0xf0, 0xf0, 0x30, 0x30, 0x30, 0x30, 0x30, 0x30, 0x60, 0x30,
    0xf0, 0xf0, 0xf0, 0xf0, 0xf0, 0xf0, 0xf0, 0xf0, 0x33, 0x33, 0x30, 0x30, 0x30, 0x30, 0x30, 0x30,
    0x30, 0x30, 0x30, 0x30, 0x30, 0x30, 0x33, 0x30, 0xf0, 0xf0, 0xf0, 0xf0, 0xf0, 0xf0, 0xf0, 0xf0,
    0x30, 0x30, 0x30, 0x30, 0x30, 0x20, 0x30, 0x30, 0xf0, 0xff, 0xf0, 0xf0, 0xdd, 0xf0, 0xf0, 0xff,
    0x30, 0x30, 0x30, 0x30, 0x30, 0x30, 0x55, 0x33, 0xf0, 0xf0, 0xf0, 0xf0, 0xf0, 0xff, 0xf0, 0xf0,
    0x30, 0x44, 0x66, 0x30, 0x30, 0x30, 0x30, 0x30, 0xf0, 0xf0, 0xf0, 0xf0, 0xf0, 0xf0, 0xf0, 0xf0,
    0x30, 0x30, 0x30, 0x30, 0x30, 0x30, 0x30, 0x30, 0xf0, 0xf0, 0xf0, 0xaa, 0xf0, 0xf0, 0xcc, 0xf0,
    0x30, 0x30, 0x30, 0x30, 0x30, 0x30, 0x30, 0x30, 0xff, 0xf0, 0xf0, 0xf0, 0xff, 0xf0, 0xdd, 0xf0,
    0x30, 0x30, 0x30, 0x77, 0x30, 0x30, 0x30, 0x30, 0xf0, 0xf0, 0xf0, 0xf0, 0xf0, 0xf0, 0xf0, 0xf0,
    0x30, 0x30, 0x30, 0x30, 0x30, 0x30, 0x30, 0x30, 0xf0, 0xf0, 0xf0, 0xf0, 0xf0, 0xf0, 0xf0, 0xf0,
];

pub fn particle_texture() -> TextureDesc {
    TextureDesc::luminance(
        "particle",
        PARTICLE_TEXTURE_SIZE,
        PARTICLE_TEXTURE_SIZE,
        PARTICLE_TEXTURE.to_vec(),
    )
}

pub fn floor_texture() -> TextureDesc {
    TextureDesc::luminance(
        "floor",
        FLOOR_TEXTURE_SIZE,
        FLOOR_TEXTURE_SIZE,
        FLOOR_TEXTURE.to_vec(),
    )
}

/// 场景背景色
pub const CLEAR_COLOR: [f32; 4] = [0.1, 0.1, 0.1, 1.0];

/// 材质
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub shininess: f32,
}

pub const FOUNTAIN_MATERIAL: Material = Material {
    diffuse: Vec3::new(0.7, 1.0, 1.0),
    specular: Vec3::ONE,
    shininess: 12.0,
};

pub const FLOOR_MATERIAL: Material = Material {
    diffuse: Vec3::new(1.0, 0.6, 0.6),
    specular: Vec3::splat(0.6),
    shininess: 18.0,
};

/// 点光源
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
}

/// 两个固定光源加喷泉口的辉光
pub fn scene_lights(glow: GlowLight) -> [PointLight; 3] {
    [
        PointLight {
            position: Vec3::new(0.0, -9.0, 8.0),
            ambient: Vec3::splat(0.2),
            diffuse: Vec3::new(0.8, 0.4, 0.2),
            specular: Vec3::new(1.0, 0.6, 0.2),
        },
        PointLight {
            position: Vec3::new(-15.0, 12.0, 1.5),
            ambient: Vec3::ZERO,
            diffuse: Vec3::new(0.2, 0.4, 0.8),
            specular: Vec3::new(0.2, 0.6, 1.0),
        },
        PointLight {
            position: glow.position,
            ambient: Vec3::ZERO,
            diffuse: glow.color,
            specular: glow.color,
        },
    ]
}

/// 顶点光照
///
/// 背向光源的一面只得到环境光，没有漫反射和高光。
pub fn shade(
    position: Vec3,
    normal: Vec3,
    material: &Material,
    lights: &[PointLight],
    eye: Vec3,
) -> Vec3 {
    let normal = normal.normalize_or_zero();
    let to_eye = (eye - position).normalize_or_zero();
    let mut diffuse = Vec3::ZERO;
    let mut specular = Vec3::ZERO;
    for source in lights {
        let to_light = (source.position - position).normalize_or_zero();
        let lambert = normal.dot(to_light);
        diffuse += source.ambient;
        if lambert > 0.0 {
            diffuse += source.diffuse * lambert;
            let half = (to_light + to_eye).normalize_or_zero();
            let highlight = normal.dot(half).max(0.0).powf(material.shininess);
            specular += source.specular * highlight;
        }
    }
    (material.diffuse * diffuse + material.specular * specular).min(Vec3::ONE)
}

/// 指数雾
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fog {
    pub color: Vec3,
    pub density: f32,
}

/// 喷泉场景的雾，颜色与背景一致
pub const SCENE_FOG: Fog = Fog {
    color: Vec3::new(0.1, 0.1, 0.1),
    density: 0.05,
};

impl Fog {
    /// 保留的表面颜色比例 `exp(-density * distance)`
    pub fn factor(&self, distance: f32) -> f32 {
        (-self.density * distance.max(0.0)).exp().clamp(0.0, 1.0)
    }

    pub fn apply(&self, color: Vec3, distance: f32) -> Vec3 {
        self.color.lerp(color, self.factor(distance))
    }
}

/// 光照并加雾后的顶点颜色
fn lit_color(position: Vec3, normal: Vec3, material: &Material, lights: &[PointLight], eye: Vec3) -> Vec3 {
    let color = shade(position, normal, material, lights, eye);
    SCENE_FOG.apply(color, position.distance(eye))
}

/// 地面瓦片（单位坐标，-1..1）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloorTile {
    pub min: Vec2,
    pub max: Vec2,
}

impl FloorTile {
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }
}

/// 最大细分深度
pub const FLOOR_MAX_DEPTH: u32 = 5;
/// 地面缩放：位置和纹理坐标
pub const FLOOR_SCALE: f32 = 80.0;
pub const FLOOR_UV_SCALE: f32 = 30.0;

/// 中心细、边缘粗的地面细分
pub fn tessellate_floor() -> Vec<FloorTile> {
    let mut tiles = Vec::new();
    let mut stack: Vec<(FloorTile, u32)> = [
        (Vec2::new(-1.0, 0.0), Vec2::new(0.0, 1.0)),
        (Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0)),
        (Vec2::new(0.0, -1.0), Vec2::new(1.0, 0.0)),
        (Vec2::new(-1.0, -1.0), Vec2::new(0.0, 0.0)),
    ]
    .into_iter()
    .map(|(min, max)| (FloorTile { min, max }, 0))
    .collect();

    while let Some((tile, depth)) = stack.pop() {
        let near = tile.min.abs().min(tile.max.abs());
        if depth < FLOOR_MAX_DEPTH && near.length_squared() < 0.1 {
            let mid = (tile.min + tile.max) * 0.5;
            let (lo, hi) = (tile.min, tile.max);
            // 逆序入栈，出栈顺序为左下、右下、左上、右上
            stack.push((FloorTile { min: mid, max: hi }, depth + 1));
            stack.push((FloorTile { min: Vec2::new(lo.x, mid.y), max: Vec2::new(mid.x, hi.y) }, depth + 1));
            stack.push((FloorTile { min: Vec2::new(mid.x, lo.y), max: Vec2::new(hi.x, mid.y) }, depth + 1));
            stack.push((FloorTile { min: lo, max: mid }, depth + 1));
        } else {
            tiles.push(tile);
        }
    }
    tiles
}

/// 地面四边形顶点
pub fn floor_vertices(tiles: &[FloorTile], lights: &[PointLight], eye: Vec3) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity(tiles.len() * 4);
    for tile in tiles {
        let corners = [
            tile.min,
            Vec2::new(tile.max.x, tile.min.y),
            tile.max,
            Vec2::new(tile.min.x, tile.max.y),
        ];
        for corner in corners {
            let position = (corner * FLOOR_SCALE).extend(0.0);
            let color = lit_color(position, Vec3::Z, &FLOOR_MATERIAL, lights, eye);
            vertices.push(Vertex::new(
                position,
                rgba8(color.extend(1.0)),
                corner * FLOOR_UV_SCALE,
            ));
        }
    }
    vertices
}

pub const FOUNTAIN_SWEEP_STEPS: usize = 32;

/// 喷泉侧面轮廓 `(r, z)`
pub const FOUNTAIN_SIDE: [[f32; 2]; 14] = [
    [1.2, 0.0], [1.0, 0.2], [0.41, 0.3], [0.4, 0.35],
    [0.4, 1.95], [0.41, 2.0], [0.8, 2.2], [1.2, 2.4],
    [1.5, 2.7], [1.55, 2.95], [1.6, 3.0], [1.0, 3.0],
    [0.5, 3.0], [0.0, 3.0],
];

/// 轮廓各点的法线 `(r, z)`
pub const FOUNTAIN_NORMAL: [[f32; 2]; 14] = [
    [1.0000, 0.0000], [0.6428, 0.7660], [0.3420, 0.9397], [1.0000, 0.0000],
    [1.0000, 0.0000], [0.3420, -0.9397], [0.4226, -0.9063], [0.5000, -0.8660],
    [0.7660, -0.6428], [0.9063, -0.4226], [0.0000, 1.0000], [0.0000, 1.0000],
    [0.0000, 1.0000], [0.0000, 1.0000],
];

/// 旋转轮廓得到的三角形带，每段轮廓一条
pub fn fountain_strips(lights: &[PointLight], eye: Vec3) -> Vec<Vec<Vertex>> {
    let mut strips = Vec::with_capacity(FOUNTAIN_SIDE.len() - 1);
    for n in 0..FOUNTAIN_SIDE.len() - 1 {
        let mut strip = Vec::with_capacity((FOUNTAIN_SWEEP_STEPS + 1) * 2);
        for m in 0..=FOUNTAIN_SWEEP_STEPS {
            let angle = m as f32 * std::f32::consts::TAU / FOUNTAIN_SWEEP_STEPS as f32;
            let (y, x) = angle.sin_cos();
            for k in [n + 1, n] {
                let [r, z] = FOUNTAIN_SIDE[k];
                let [nr, nz] = FOUNTAIN_NORMAL[k];
                let position = Vec3::new(x * r, y * r, z);
                let normal = Vec3::new(x * nr, y * nr, nz);
                strip.push(Vertex::colored(
                    position,
                    lit_color(position, normal, &FOUNTAIN_MATERIAL, lights, eye),
                ));
            }
        }
        strips.push(strip);
    }
    strips
}

/// 相机在时刻 `t` 的世界坐标
pub fn fountain_eye(t: f64) -> Vec3 {
    let angle_z = 10.0 * t;
    Vec3::new(
        (15.0 * angle_z.to_radians().sin() + 2.0 * (3.1 * t).to_radians().sin()) as f32,
        (-15.0 * angle_z.to_radians().cos() + 2.0 * (2.9 * t).to_radians().cos()) as f32,
        (4.0 + 2.0 * (4.9 * t).to_radians().cos()) as f32,
    )
}

/// 绕喷泉缓慢盘旋的相机
pub fn fountain_view(t: f64) -> Mat4 {
    let angle_x = 90.0 - 10.0;
    let angle_y = 10.0 * (0.3 * t).sin();
    let angle_z = 10.0 * t;

    Mat4::from_rotation_x(-(angle_x as f32).to_radians())
        * Mat4::from_rotation_y(-(angle_y as f32).to_radians())
        * Mat4::from_rotation_z(-(angle_z as f32).to_radians())
        * Mat4::from_translation(-fountain_eye(t))
}

pub fn fountain_projection(aspect_ratio: f32) -> Mat4 {
    Mat4::perspective_rh(65f32.to_radians(), aspect_ratio, 1.0, 60.0)
}
