use bevy::asset::RenderAssetUsages;
use bevy::prelude::*;
use bevy::render::mesh::{Indices, PrimitiveTopology};
use bevy::render::view::NoFrustumCulling;

use constants::render_settings::{FLOOR_GRID_HALF_EXTENT, FLOOR_GRID_SPACING};
use constants::xr::SIMULATED_FLOOR_HEIGHT;

#[derive(Component)]
pub struct GroundGrid;

pub fn spawn_floor_grid(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let grid_material = materials.add(StandardMaterial {
        base_color: Color::srgba(1.0, 1.0, 1.0, 0.5),
        alpha_mode: AlphaMode::Blend,
        unlit: true,
        ..default()
    });

    let mesh = create_floor_grid_mesh(
        FLOOR_GRID_HALF_EXTENT,
        FLOOR_GRID_SPACING,
        SIMULATED_FLOOR_HEIGHT,
    );

    commands.spawn((
        Mesh3d(meshes.add(mesh)),
        MeshMaterial3d(grid_material),
        Visibility::Visible,
        NoFrustumCulling,
        Transform::IDENTITY,
        GroundGrid,
    ));
}

/// Square line grid centred on the origin at `height`.
pub fn create_floor_grid_mesh(half_extent: f32, spacing: f32, height: f32) -> Mesh {
    let (vertices, indices) = floor_grid_lines(half_extent, spacing, height);

    let mut mesh = Mesh::new(PrimitiveTopology::LineList, RenderAssetUsages::RENDER_WORLD);
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, vertices);
    mesh.insert_indices(Indices::U32(indices));
    mesh
}

fn floor_grid_lines(half_extent: f32, spacing: f32, height: f32) -> (Vec<[f32; 3]>, Vec<u32>) {
    let line_count = ((half_extent * 2.0) / spacing).round().max(1.0) as u32;
    let step = (half_extent * 2.0) / line_count as f32;

    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    for i in 0..=line_count {
        let offset = -half_extent + i as f32 * step;

        // Line along Z at fixed X, then along X at fixed Z
        for (start, end) in [
            ([offset, height, -half_extent], [offset, height, half_extent]),
            ([-half_extent, height, offset], [half_extent, height, offset]),
        ] {
            let base = vertices.len() as u32;
            vertices.push(start);
            vertices.push(end);
            indices.extend_from_slice(&[base, base + 1]);
        }
    }

    (vertices, indices)
}
