//! End-to-end coverage of mesh construction, pathfinding, points, cursor
//! consumption and runtime cuts.

use std::collections::{HashMap, HashSet};

use anyhow::Result;
use approx::assert_relative_eq;
use glam::{UVec2, Vec2};
use tilenav::{
    Aabb2d, BuildError, BuildSettings, DebugDraw, DrawOptions, GridLayer, NavMesh, TileEdge,
    TileLayer, TileMap,
};

fn settings_32() -> BuildSettings {
    BuildSettings {
        tile_width: 32.0,
        tile_height: 32.0,
        ..Default::default()
    }
}

fn mesh_32(art: &str) -> Result<NavMesh> {
    let mut mesh = NavMesh::new();
    mesh.build_from_layer(&GridLayer::from_ascii(art), &settings_32())?;
    Ok(mesh)
}

/// Open ring: every border tile walkable, center blocked.
const RING: &str = "###\n\
                    #.#\n\
                    ###";

#[test]
fn three_by_one_row_builds_one_merged_polygon() -> Result<()> {
    let mesh = mesh_32("###")?;
    assert_eq!(mesh.polygon_count(), 1);

    let polygon = mesh.polygon(0).unwrap();
    assert_eq!(polygon.aabb(), Aabb2d::new(Vec2::ZERO, Vec2::new(96.0, 32.0)));
    assert_eq!(polygon.centroid(), Vec2::new(48.0, 16.0));

    let start = Vec2::new(16.0, 16.0);
    let end = Vec2::new(80.0, 16.0);
    let path = mesh.generate_path(start, end);
    assert!(path.is_valid());
    assert_eq!(path.waypoints(), &[start, end]);
    assert_relative_eq!(path.length(), 64.0);
    Ok(())
}

#[test]
fn same_polygon_paths_skip_the_graph_search() -> Result<()> {
    let mesh = mesh_32(RING)?;
    let start = Vec2::new(8.0, 8.0);
    let end = Vec2::new(88.0, 24.0);
    // Both on the top row, which merges into a single polygon.
    assert_eq!(mesh.find_polygon_at(start), mesh.find_polygon_at(end));

    let path = mesh.generate_path(start, end);
    assert!(path.is_valid());
    assert_eq!(path.waypoints().len(), 2);
    assert_relative_eq!(path.length(), start.distance(end));
    Ok(())
}

#[test]
fn paths_between_rooms_route_through_connector_centroids() -> Result<()> {
    // Two columns joined only through the bottom-middle tile.
    let mesh = mesh_32(
        "#.#\n\
         ###",
    )?;
    assert_eq!(mesh.polygon_count(), 3);

    let start = Vec2::new(16.0, 16.0);
    let end = Vec2::new(80.0, 16.0);
    let path = mesh.generate_path(start, end);
    assert!(path.is_valid());
    assert_eq!(path.waypoints().len(), 3);
    assert_eq!(path.waypoints()[0], start);
    // The interior waypoint is the connector tile's centroid.
    assert_eq!(path.waypoints()[1], Vec2::new(48.0, 48.0));
    assert_eq!(path.waypoints()[2], end);
    assert_relative_eq!(
        path.length(),
        start.distance(path.waypoints()[1]) + path.waypoints()[1].distance(end)
    );
    Ok(())
}

#[test]
fn disconnected_regions_yield_invalid_paths() -> Result<()> {
    let mut art = vec![b'.'; 6 * 7 - 1];
    // 6x6 grid: walkable at (0,0) and (5,5), everything between blocked.
    for row in 1..6 {
        art[row * 7 - 1] = b'\n';
    }
    art[0] = b'#';
    art[6 * 7 - 2] = b'#';
    let mesh = mesh_32(std::str::from_utf8(&art)?)?;
    assert_eq!(mesh.polygon_count(), 2);

    let path = mesh.generate_path(Vec2::new(16.0, 16.0), Vec2::new(176.0, 176.0));
    assert!(!path.is_valid());
    assert!(path.waypoints().is_empty());
    assert_eq!(path.length(), 0.0);
    Ok(())
}

#[test]
fn off_mesh_endpoints_fail_without_panicking() -> Result<()> {
    let mesh = mesh_32("###")?;
    let on = Vec2::new(16.0, 16.0);
    let off = Vec2::new(16.0, 200.0);

    for path in [
        mesh.generate_path(off, on),
        mesh.generate_path(on, off),
        mesh.generate_path(off, off),
    ] {
        assert!(!path.is_valid());
        assert!(path.waypoints().is_empty());
    }
    Ok(())
}

#[test]
fn valid_paths_start_and_end_at_the_literal_requests() -> Result<()> {
    let mesh = mesh_32(RING)?;
    let pairs = [
        (Vec2::new(16.0, 16.0), Vec2::new(80.0, 80.0)),
        (Vec2::new(8.0, 24.0), Vec2::new(88.0, 40.0)),
        (Vec2::new(16.0, 80.0), Vec2::new(80.0, 16.0)),
    ];
    for (start, end) in pairs {
        let path = mesh.generate_path(start, end);
        assert!(path.is_valid());
        assert!(path.waypoints().len() >= 2);
        assert_eq!(path.waypoints().first(), Some(&start));
        assert_eq!(path.waypoints().last(), Some(&end));
    }
    Ok(())
}

#[test]
fn repeated_builds_are_deterministic() -> Result<()> {
    let first = mesh_32(RING)?;
    let second = mesh_32(RING)?;

    assert_eq!(first.polygons(), second.polygons());
    assert_eq!(first.edges(), second.edges());
    assert_eq!(first.bounds(), second.bounds());
    Ok(())
}

#[test]
fn clear_then_rebuild_matches_a_fresh_build() -> Result<()> {
    let fresh = mesh_32(RING)?;

    let mut recycled = mesh_32("##")?;
    recycled.clear();
    assert_eq!(recycled.polygon_count(), 0);
    assert_eq!(recycled.edge_count(), 0);
    assert_eq!(recycled.bounds(), None);
    assert_eq!(recycled.grid_size(), UVec2::ZERO);

    recycled.build_from_layer(&GridLayer::from_ascii(RING), &settings_32())?;
    assert_eq!(recycled.polygons(), fresh.polygons());
    assert_eq!(recycled.edges(), fresh.edges());
    Ok(())
}

#[test]
fn produced_polygons_never_overlap() -> Result<()> {
    let mesh = mesh_32(RING)?;
    let layer = GridLayer::from_ascii(RING);
    for y in 0..layer.height() {
        for x in 0..layer.width() {
            if layer.tile(x, y) == 0 {
                continue;
            }
            let center = Vec2::new(x as f32 * 32.0 + 16.0, y as f32 * 32.0 + 16.0);
            let containing = mesh
                .polygons()
                .iter()
                .filter(|polygon| polygon.contains(center))
                .count();
            assert_eq!(containing, 1, "tile ({x}, {y}) center in {containing} polygons");
        }
    }
    Ok(())
}

struct DemoMap {
    layers: HashMap<String, GridLayer>,
}

impl TileMap for DemoMap {
    fn layer(&self, name: &str) -> Option<&dyn TileLayer> {
        self.layers.get(name).map(|layer| layer as &dyn TileLayer)
    }
}

#[test]
fn missing_layer_name_fails_and_clears_the_mesh() -> Result<()> {
    let map = DemoMap {
        layers: HashMap::from([("ground".to_owned(), GridLayer::from_ascii("###"))]),
    };

    let mut mesh = NavMesh::new();
    mesh.build_from_map(&map, "ground", &settings_32())?;
    assert_eq!(mesh.polygon_count(), 1);

    let error = mesh
        .build_from_map(&map, "collision", &settings_32())
        .unwrap_err();
    assert_eq!(
        error,
        BuildError::LayerNotFound {
            name: "collision".to_owned()
        }
    );
    assert_eq!(mesh.polygon_count(), 0);
    assert_eq!(mesh.bounds(), None);
    Ok(())
}

#[test]
fn named_points_bind_to_their_containing_polygon() -> Result<()> {
    let mut mesh = mesh_32(RING)?;

    assert!(mesh.add_point("spawn", Vec2::new(16.0, 16.0)));
    assert!(!mesh.add_point("spawn", Vec2::new(80.0, 80.0)));
    assert_eq!(mesh.point("spawn").unwrap().polygon(), Some(0));
    assert_eq!(mesh.point("spawn").unwrap().name(), "spawn");

    // Off-mesh points are stored, just unbound.
    assert!(mesh.add_point("treasure", Vec2::new(48.0, 48.0)));
    assert_eq!(mesh.point("treasure").unwrap().polygon(), None);

    assert!(mesh.point("missing").is_none());
    assert!(mesh.remove_point("treasure"));
    assert!(!mesh.remove_point("treasure"));

    assert!(mesh.add_point("exit", Vec2::new(80.0, 80.0)));
    assert_eq!(mesh.points().count(), 2);
    mesh.clear_points();
    assert_eq!(mesh.points().count(), 0);
    // Polygons are untouched by the registry.
    assert_eq!(mesh.polygon_count(), 4);
    Ok(())
}

#[test]
fn paths_to_named_points_resolve_through_the_registry() -> Result<()> {
    let mut mesh = mesh_32(RING)?;
    let exit = Vec2::new(80.0, 80.0);
    mesh.add_point("exit", exit);

    let path = mesh.generate_path_to_point(Vec2::new(16.0, 16.0), "exit");
    assert!(path.is_valid());
    assert_eq!(path.waypoints().last(), Some(&exit));

    let missing = mesh.generate_path_to_point(Vec2::new(16.0, 16.0), "nowhere");
    assert!(!missing.is_valid());
    assert!(missing.waypoints().is_empty());
    // Failed generations are logged too, with their own id.
    assert_eq!(mesh.path_count(), 2);
    assert_ne!(path.id(), missing.id());
    Ok(())
}

#[test]
fn cursor_consumption_walks_to_the_end_and_stops() -> Result<()> {
    let mesh = mesh_32(
        "#.#\n\
         ###",
    )?;
    let start = Vec2::new(16.0, 16.0);
    let end = Vec2::new(80.0, 16.0);
    let path = mesh.generate_path(start, end);
    assert_eq!(path.waypoints().len(), 3);

    assert_eq!(path.current_waypoint(), Some(start));
    assert!(path.is_at_current_waypoint(Vec2::new(17.0, 16.0), 2.0));
    assert!(!path.is_at_current_waypoint(Vec2::new(40.0, 16.0), 2.0));

    let middle = path.advance_waypoint().unwrap();
    assert_eq!(middle, Vec2::new(48.0, 48.0));
    assert_eq!(path.current_waypoint(), Some(middle));

    // The end waypoint is never "current"; the walk is over one before it.
    assert_eq!(path.advance_waypoint(), None);
    assert_eq!(path.advance_waypoint(), None);
    assert_eq!(path.waypoint_cursor(), 1);
    assert_eq!(path.waypoints().len(), 3);
    Ok(())
}

#[test]
fn cutting_the_only_connection_severs_the_path() -> Result<()> {
    let mut mesh = mesh_32(
        "#.\n\
         ##",
    )?;
    let start = Vec2::new(16.0, 16.0);
    let end = Vec2::new(48.0, 48.0);
    assert!(mesh.generate_path(start, end).is_valid());

    // The only crossing is the border between tiles (0, 1) and (1, 1).
    assert!(mesh.apply_cut(0, 1, TileEdge::Right));
    assert!(mesh.polygons().iter().all(|polygon| polygon.neighbors().is_empty()));
    assert!(mesh.edges().iter().all(|edge| !edge.is_crossable()));
    assert!(!mesh.generate_path(start, end).is_valid());

    // Cutting an already-cut or boundary edge changes nothing.
    assert!(!mesh.apply_cut(0, 1, TileEdge::Right));
    assert!(!mesh.apply_cut(0, 0, TileEdge::Left));
    // Out-of-grid cuts are rejected.
    assert!(!mesh.apply_cut(7, 7, TileEdge::Top));
    Ok(())
}

#[test]
fn cut_paths_reroute_around_the_blocked_border() -> Result<()> {
    let mut mesh = mesh_32(RING)?;
    let start = Vec2::new(80.0, 48.0);
    let end = Vec2::new(80.0, 16.0);

    let direct = mesh.generate_path(start, end);
    assert!(direct.is_valid());
    assert_eq!(direct.waypoints().len(), 2);

    // Sever the border between the top row and the right column.
    assert!(mesh.apply_cut(2, 0, TileEdge::Bottom));
    let rerouted = mesh.generate_path(start, end);
    assert!(rerouted.is_valid());
    assert!(rerouted.waypoints().len() > 2);
    assert!(rerouted.length() > direct.length());
    assert_eq!(rerouted.waypoints().first(), Some(&start));
    assert_eq!(rerouted.waypoints().last(), Some(&end));
    Ok(())
}

#[test]
fn concurrent_generation_keeps_the_log_and_ids_consistent() -> Result<()> {
    let mesh = mesh_32(RING)?;
    let handles = std::thread::scope(|scope| {
        let workers: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    (0..25)
                        .map(|_| mesh.generate_path(Vec2::new(16.0, 16.0), Vec2::new(80.0, 80.0)))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        workers
            .into_iter()
            .flat_map(|worker| worker.join().unwrap())
            .collect::<Vec<_>>()
    });

    assert_eq!(mesh.path_count(), 100);
    let ids: HashSet<u64> = handles.iter().map(|path| path.id()).collect();
    assert_eq!(ids.len(), 100);
    assert!(handles.iter().all(|path| path.is_valid()));

    // Clearing the log never invalidates handles already handed out.
    mesh.clear_paths();
    assert_eq!(mesh.path_count(), 0);
    assert!(handles[0].is_valid());
    assert_eq!(handles[0].current_waypoint(), Some(Vec2::new(16.0, 16.0)));
    Ok(())
}

#[test]
fn nearest_point_projects_onto_the_mesh() -> Result<()> {
    let mesh = mesh_32(RING)?;
    let on_mesh = Vec2::new(16.0, 16.0);
    assert_eq!(mesh.nearest_point(on_mesh), Some(on_mesh));

    // Center of the blocked tile: equidistant to all four ring sides.
    let hole = Vec2::new(48.0, 48.0);
    let projected = mesh.nearest_point(hole).unwrap();
    assert_relative_eq!(projected.distance(hole), 16.0);
    assert!(mesh.is_walkable_at(projected));

    assert_eq!(NavMesh::new().nearest_point(hole), None);
    Ok(())
}

#[test]
fn metadata_reflects_the_last_build() -> Result<()> {
    let mut mesh = NavMesh::new();
    mesh.build_from_layer(
        &GridLayer::from_ascii("###"),
        &BuildSettings {
            tile_width: 32.0,
            tile_height: 32.0,
            offset: Vec2::new(64.0, 0.0),
            invert: false,
        },
    )?;
    assert_eq!(
        mesh.bounds(),
        Some(Aabb2d::new(Vec2::new(64.0, 0.0), Vec2::new(160.0, 32.0)))
    );
    assert_eq!(mesh.tile_size(), Vec2::splat(32.0));
    assert_eq!(mesh.offset(), Vec2::new(64.0, 0.0));
    assert_eq!(mesh.grid_size(), UVec2::new(3, 1));

    assert!(mesh.polygon(0).is_some());
    assert!(mesh.polygon(1).is_none());
    assert!(mesh.edge(usize::MAX).is_none());
    Ok(())
}

#[derive(Default)]
struct DrawRecorder {
    camera: Option<Aabb2d>,
    polygons: usize,
    lines: usize,
    markers: Vec<String>,
}

impl DebugDraw for DrawRecorder {
    fn is_visible(&self, bounds: Aabb2d) -> bool {
        match &self.camera {
            Some(camera) => camera.intersects(&bounds),
            None => true,
        }
    }

    fn line(&mut self, _start: Vec2, _end: Vec2) {
        self.lines += 1;
    }

    fn polygon(&mut self, _vertices: &[Vec2]) {
        self.polygons += 1;
    }

    fn marker(&mut self, _position: Vec2, name: &str) {
        self.markers.push(name.to_owned());
    }
}

#[test]
fn debug_draw_respects_culling_and_options() -> Result<()> {
    let mut mesh = mesh_32(RING)?;
    mesh.add_point("spawn", Vec2::new(16.0, 16.0));

    let mut everything = DrawRecorder::default();
    mesh.debug_draw(&mut everything, DrawOptions::default());
    assert_eq!(everything.polygons, mesh.polygon_count());
    assert_eq!(everything.lines, mesh.edge_count());
    assert_eq!(everything.markers, vec!["spawn".to_owned()]);

    let mut off_screen = DrawRecorder {
        camera: Some(Aabb2d::new(Vec2::splat(1000.0), Vec2::splat(2000.0))),
        ..Default::default()
    };
    mesh.debug_draw(&mut off_screen, DrawOptions::default());
    assert_eq!(off_screen.polygons, 0);
    assert_eq!(off_screen.lines, 0);
    assert!(off_screen.markers.is_empty());

    let mut edges_only = DrawRecorder::default();
    mesh.debug_draw(&mut edges_only, DrawOptions::EDGES);
    assert_eq!(edges_only.polygons, 0);
    assert_eq!(edges_only.lines, mesh.edge_count());
    assert!(edges_only.markers.is_empty());
    Ok(())
}
