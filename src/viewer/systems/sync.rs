//! Mirroring the core scene graph into Bevy entities.
//!
//! Every scene node maps to one entity, spawned once, updated in place when
//! the node's revision moves and despawned when the core reports it removed.

use bevy::prelude::*;
use bevy::render::mesh::PrimitiveTopology;
use bevy::render::render_asset::RenderAssetUsages;
use bevy::render::render_resource::Face;
use bevy::render::view::NoFrustumCulling;

use crate::visualizer::geometry::unit_circle;
use crate::visualizer::{Blending, Material, MeshPart, NodeId, PartShape, SceneNode, Shape};
use crate::viewer::components::{OutlineHull, SceneNodeRef};
use crate::viewer::constants::{
    AMBIENT_BRIGHTNESS, OUTLINE_HULL_SCALE, POINT_LIGHT_LUMENS, POINT_LIGHT_RANGE, SKY_SECTORS,
    SPHERE_SECTORS, SPHERE_STACKS,
};
use crate::viewer::resources::{MirroredNode, NodeEntities, TextureCache, VisualizerRes};

/// Asset stores a mirrored node draws from.
struct MirrorAssets<'a> {
    meshes: &'a mut Assets<Mesh>,
    materials: &'a mut Assets<StandardMaterial>,
    textures: &'a TextureCache,
}

pub fn sync_scene_system(
    mut commands: Commands,
    mut visualizer: ResMut<VisualizerRes>,
    mut entities: ResMut<NodeEntities>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut ambient: ResMut<AmbientLight>,
    textures: Res<TextureCache>,
) {
    for id in visualizer.0.take_removed_nodes() {
        if let Some(mirrored) = entities.0.remove(&id) {
            commands.entity(mirrored.entity).despawn_recursive();
        }
    }

    let ctx = visualizer.0.context();
    let outline = &ctx.composer.outline;
    let mut assets = MirrorAssets {
        meshes: &mut meshes,
        materials: &mut materials,
        textures: &textures,
    };

    for (id, node) in ctx.scene.iter() {
        let outlined = outline.is_selected(id);

        if let Shape::AmbientLight = node.shape {
            let color = Color::Srgba(node.material.color);
            if ambient.color != color {
                ambient.color = color;
                ambient.brightness = AMBIENT_BRIGHTNESS;
            }
        }

        match entities.0.get_mut(&id) {
            None => {
                let hull = outlined.then_some(outline.color);
                let mirrored = spawn_node(&mut commands, &mut assets, id, node, hull);
                entities.0.insert(id, mirrored);
            }
            Some(mirrored) if mirrored.revision != node.revision() => {
                update_node(&mut commands, &mut assets, mirrored, node);
                if outlined && !mirrored.outlined {
                    let entity = mirrored.entity;
                    add_outline_hull(&mut commands, &mut assets, entity, node, outline.color);
                    mirrored.outlined = true;
                }
            }
            Some(_) => {}
        }
    }
}

fn spawn_node(
    commands: &mut Commands,
    assets: &mut MirrorAssets,
    id: NodeId,
    node: &SceneNode,
    outline: Option<Srgba>,
) -> MirroredNode {
    let mut entity = commands.spawn((
        SceneNodeRef(id),
        node_transform(node),
        node_visibility(node),
    ));
    let mut materials = Vec::new();

    match &node.shape {
        Shape::Sphere { radius } => {
            let mesh = Sphere::new(*radius as f32)
                .mesh()
                .uv(SPHERE_SECTORS, SPHERE_STACKS);
            let material = assets.material(&node.material);
            entity.insert((Mesh3d(assets.meshes.add(mesh)), MeshMaterial3d(material.clone())));
            materials.push(material);
        }
        Shape::Sky { radius } => {
            let mesh = Sphere::new(*radius as f32).mesh().uv(SKY_SECTORS, SKY_SECTORS);
            let material = assets.material(&node.material);
            entity.insert((
                Mesh3d(assets.meshes.add(mesh)),
                MeshMaterial3d(material.clone()),
                NoFrustumCulling,
            ));
            materials.push(material);
        }
        Shape::Circle { segments } => {
            let material = assets.material(&node.material);
            entity.insert((
                Mesh3d(assets.meshes.add(circle_mesh(*segments))),
                MeshMaterial3d(material.clone()),
            ));
            materials.push(material);
        }
        Shape::Model { parts } => {
            let handles: Vec<_> = parts
                .iter()
                .map(|part| (part, assets.material(&part.material)))
                .collect();
            entity.with_children(|parent| {
                for (part, material) in &handles {
                    parent.spawn((
                        Mesh3d(assets.meshes.add(part_mesh(&part.shape))),
                        MeshMaterial3d(material.clone()),
                        part_transform(part),
                    ));
                }
            });
            materials.extend(handles.into_iter().map(|(_, material)| material));
        }
        Shape::PointLight { intensity } => {
            entity.insert(point_light(&node.material, *intensity));
        }
        Shape::AmbientLight => {}
    }

    let entity = entity.id();
    if let Some(color) = outline {
        add_outline_hull(commands, assets, entity, node, color);
    }

    MirroredNode {
        entity,
        revision: node.revision(),
        materials,
        outlined: outline.is_some(),
    }
}

fn update_node(
    commands: &mut Commands,
    assets: &mut MirrorAssets,
    mirrored: &mut MirroredNode,
    node: &SceneNode,
) {
    let mut entity = commands.entity(mirrored.entity);
    entity.insert((node_transform(node), node_visibility(node)));
    if let Shape::PointLight { intensity } = node.shape {
        entity.insert(point_light(&node.material, intensity));
    }

    for (handle, material) in mirrored.materials.iter().zip(node.mesh_materials()) {
        if let Some(standard) = assets.materials.get_mut(handle) {
            apply_material(standard, material, assets.textures);
        }
    }
    mirrored.revision = node.revision();
}

/// Inverted hull drawn slightly larger than a sphere, front faces culled.
fn add_outline_hull(
    commands: &mut Commands,
    assets: &mut MirrorAssets,
    entity: Entity,
    node: &SceneNode,
    color: Srgba,
) {
    let Shape::Sphere { radius } = node.shape else {
        return;
    };
    let mesh = Sphere::new(radius as f32 * OUTLINE_HULL_SCALE)
        .mesh()
        .uv(SPHERE_SECTORS, SPHERE_STACKS);
    let material = assets.materials.add(StandardMaterial {
        base_color: Color::Srgba(color),
        unlit: true,
        cull_mode: Some(Face::Front),
        ..default()
    });
    let hull = commands
        .spawn((
            Mesh3d(assets.meshes.add(mesh)),
            MeshMaterial3d(material),
            Transform::default(),
            OutlineHull,
        ))
        .id();
    commands.entity(entity).add_child(hull);
}

impl MirrorAssets<'_> {
    fn material(&mut self, material: &Material) -> Handle<StandardMaterial> {
        let mut standard = StandardMaterial::default();
        apply_material(&mut standard, material, self.textures);
        self.materials.add(standard)
    }
}

/// Copy a scene material onto a Bevy material.
pub fn apply_material(standard: &mut StandardMaterial, material: &Material, textures: &TextureCache) {
    let mut color = material.color;
    color.alpha = material.opacity;

    standard.base_color = Color::Srgba(color);
    standard.base_color_texture = material
        .texture
        .as_ref()
        .and_then(|path| textures.0.get(path).cloned());
    standard.unlit = !material.lit;
    standard.double_sided = material.double_sided;
    standard.cull_mode = if material.double_sided {
        None
    } else {
        Some(Face::Back)
    };
    standard.alpha_mode = match material.blending {
        Blending::Additive => AlphaMode::Add,
        Blending::Normal if material.opacity < 1.0 => AlphaMode::Blend,
        Blending::Normal => AlphaMode::Opaque,
    };
}

pub fn node_transform(node: &SceneNode) -> Transform {
    Transform {
        translation: node.position.as_vec3(),
        rotation: node.rotation.as_quat(),
        scale: Vec3::splat(node.scale as f32),
    }
}

pub fn node_visibility(node: &SceneNode) -> Visibility {
    if node.visible {
        Visibility::Inherited
    } else {
        Visibility::Hidden
    }
}

fn part_transform(part: &MeshPart) -> Transform {
    Transform::from_translation(part.offset.as_vec3()).with_rotation(part.rotation.as_quat())
}

fn part_mesh(shape: &PartShape) -> Mesh {
    match *shape {
        PartShape::Cone { radius, height } => Cone::new(radius as f32, height as f32).into(),
        PartShape::Cylinder { radius, height } => {
            Cylinder::new(radius as f32, height as f32).into()
        }
        PartShape::Cuboid { x, y, z } => Cuboid::new(x as f32, y as f32, z as f32).into(),
        PartShape::Sphere { radius } => Sphere::new(radius as f32).into(),
    }
}

/// Closed line strip around the unit circle in the XY plane.
fn circle_mesh(segments: u32) -> Mesh {
    let positions: Vec<[f32; 3]> = unit_circle(segments)
        .into_iter()
        .map(|p| p.as_vec3().to_array())
        .collect();
    let normals = vec![[0.0, 0.0, 1.0]; positions.len()];

    Mesh::new(PrimitiveTopology::LineStrip, RenderAssetUsages::default())
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
        .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, normals)
}

fn point_light(material: &Material, intensity: f32) -> PointLight {
    PointLight {
        color: Color::Srgba(material.color),
        intensity: intensity * POINT_LIGHT_LUMENS,
        range: POINT_LIGHT_RANGE,
        shadows_enabled: false,
        ..default()
    }
}
