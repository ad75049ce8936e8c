//! Asset Loader Tests
//!
//! Tests for:
//! - glTF import from memory and from disk (hierarchy, meshes, lights)
//! - HDR environment decoding and decoder selection by extension
//! - Failure classification (missing, undecodable)
//! - Background dispatch through the load channel

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use half::f16;
use image::Rgb;
use image::codecs::hdr::HdrEncoder;

use vitrine::assets::{
    AssetLoader, AssetSource, AssetSources, DefaultAssetLoader, LoadEvent, dispatch_loads,
};
use vitrine::errors::LoadError;
use vitrine::scene::{LightKind, NodeKind, SceneGraph};

const TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// Fixtures
// ============================================================================

/// A three-node glTF: a parent group holding a one-triangle mesh and a point light.
fn triangle_gltf() -> Vec<u8> {
    let positions: [f32; 9] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
    let bytes: &[u8] = bytemuck::cast_slice(&positions);
    let data_uri = format!(
        "data:application/octet-stream;base64,{}",
        STANDARD.encode(bytes)
    );

    let json = serde_json::json!({
        "asset": { "version": "2.0" },
        "extensionsUsed": ["KHR_lights_punctual"],
        "extensions": {
            "KHR_lights_punctual": {
                "lights": [{ "type": "point", "color": [1.0, 0.9, 0.8], "intensity": 2.0 }]
            }
        },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [
            { "name": "Toucan", "children": [1, 2], "translation": [0.0, 1.0, 0.0] },
            { "name": "Body", "mesh": 0 },
            { "name": "Lamp", "extensions": { "KHR_lights_punctual": { "light": 0 } } }
        ],
        "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 }, "material": 0 }] }],
        "materials": [{
            "pbrMetallicRoughness": {
                "baseColorFactor": [1.0, 0.0, 0.0, 1.0],
                "metallicFactor": 0.0,
                "roughnessFactor": 0.9
            }
        }],
        "accessors": [{
            "bufferView": 0,
            "componentType": 5126,
            "count": 3,
            "type": "VEC3",
            "min": [0.0, 0.0, 0.0],
            "max": [1.0, 1.0, 0.0]
        }],
        "bufferViews": [{ "buffer": 0, "byteLength": 36 }],
        "buffers": [{ "byteLength": 36, "uri": data_uri }]
    });
    serde_json::to_vec(&json).unwrap()
}

/// A 2x1 Radiance HDR image.
fn tiny_hdr() -> Vec<u8> {
    let pixels = [Rgb([1.0_f32, 0.5, 0.25]), Rgb([2.0, 4.0, 8.0])];
    let mut out = Vec::new();
    HdrEncoder::new(&mut out).encode(&pixels, 2, 1).unwrap();
    out
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("vitrine-{}-{name}", std::process::id()))
}

fn node_named<'a>(graph: &'a SceneGraph, name: &str) -> &'a vitrine::scene::Node {
    graph.get_node(graph.find_by_name(name).unwrap()).unwrap()
}

// ============================================================================
// glTF
// ============================================================================

#[tokio::test]
async fn gltf_from_memory_keeps_hierarchy() {
    let loader = DefaultAssetLoader::new();
    let source = AssetSource::from_bytes("toucan.gltf", triangle_gltf());

    let graph = loader.load_scene(&source).await.unwrap();

    assert_eq!(graph.node_count(), 3);
    assert_eq!(graph.roots().len(), 1);
    let root = node_named(&graph, "Toucan");
    assert!(matches!(root.kind, NodeKind::Group));
    assert_eq!(root.children().len(), 2);
    assert_eq!(root.transform.position.y, 1.0);

    let body = node_named(&graph, "Body");
    let mesh = body.mesh().unwrap();
    assert_eq!(mesh.primitives.len(), 1);
    assert_eq!(mesh.primitives[0].geometry.draw_count(), 3);
    assert_eq!(mesh.primitives[0].material.roughness, 0.9);

    match node_named(&graph, "Lamp").kind {
        NodeKind::Light(light) => {
            assert!(matches!(light.kind, LightKind::Point { .. }));
            assert_eq!(light.intensity, 2.0);
        }
        ref other => panic!("expected a light, got {other:?}"),
    }
}

#[tokio::test]
async fn gltf_from_disk() {
    let path = temp_path("scene.gltf");
    tokio::fs::write(&path, triangle_gltf()).await.unwrap();

    let graph = DefaultAssetLoader::new()
        .load_scene(&AssetSource::Path(path.clone()))
        .await;
    let _ = tokio::fs::remove_file(&path).await;

    assert_eq!(graph.unwrap().mesh_count(), 1);
}

#[tokio::test]
async fn missing_file_is_an_io_error() {
    let source = AssetSource::Path(temp_path("does-not-exist.gltf"));

    let err = DefaultAssetLoader::new().load_scene(&source).await.unwrap_err();

    assert!(matches!(err, LoadError::Io { .. }), "{err:?}");
    assert_eq!(err.uri(), source.uri());
}

#[tokio::test]
async fn garbage_scene_is_a_decode_error() {
    let source = AssetSource::from_bytes("broken.gltf", b"{ not gltf".to_vec());

    let err = DefaultAssetLoader::new().load_scene(&source).await.unwrap_err();

    assert!(matches!(err, LoadError::Decode { .. }), "{err:?}");
    assert_eq!(err.uri(), "memory://broken.gltf");
}

// ============================================================================
// Environment
// ============================================================================

#[tokio::test]
async fn hdr_decodes_to_rgba16f() {
    let source = AssetSource::from_bytes("studio.hdr", tiny_hdr());

    let texture = DefaultAssetLoader::new()
        .load_environment(&source)
        .await
        .unwrap();

    assert_eq!((texture.width(), texture.height()), (2, 1));
    assert_eq!(texture.data().len(), 2 * 8);

    let texel: Vec<f32> = texture.data()[..8]
        .chunks_exact(2)
        .map(|b| f16::from_le_bytes([b[0], b[1]]).to_f32())
        .collect();
    for (got, want) in texel.iter().zip([1.0, 0.5, 0.25, 1.0]) {
        assert!((got - want).abs() < 1e-2, "{texel:?}");
    }
}

#[tokio::test]
async fn garbage_environment_is_rejected() {
    let source = AssetSource::from_bytes("noise.hdr", vec![0x13; 64]);

    let err = DefaultAssetLoader::new()
        .load_environment(&source)
        .await
        .unwrap_err();

    assert!(
        matches!(err, LoadError::Decode { .. } | LoadError::Unsupported { .. }),
        "{err:?}"
    );
}

#[tokio::test]
async fn extensionless_environment_is_sniffed() {
    let source = AssetSource::from_bytes("studio", tiny_hdr());

    let texture = DefaultAssetLoader::new()
        .load_environment(&source)
        .await
        .unwrap();

    assert_eq!((texture.width(), texture.height()), (2, 1));
}

#[tokio::test]
async fn extension_selects_the_decoder() {
    // Radiance bytes behind an OpenEXR name go to the EXR decoder
    let source = AssetSource::from_bytes("studio.exr", tiny_hdr());

    let err = DefaultAssetLoader::new()
        .load_environment(&source)
        .await
        .unwrap_err();

    assert!(
        matches!(err, LoadError::Decode { .. } | LoadError::Unsupported { .. }),
        "{err:?}"
    );
    assert_eq!(err.uri(), "memory://studio.exr");
}

// ============================================================================
// Dispatch
// ============================================================================

fn memory_sources() -> AssetSources {
    AssetSources {
        scene: AssetSource::from_bytes("toucan.gltf", triangle_gltf()),
        environment: AssetSource::from_bytes("studio.hdr", tiny_hdr()),
    }
}

#[test]
fn dispatch_delivers_both_outcomes() {
    let (tx, rx) = flume::unbounded();

    dispatch_loads(Arc::new(DefaultAssetLoader::new()), memory_sources(), tx);

    let mut scene = None;
    let mut environment = None;
    for _ in 0..2 {
        match rx.recv_timeout(TIMEOUT).unwrap() {
            LoadEvent::Scene(result) => scene = Some(result),
            LoadEvent::Environment(result) => environment = Some(result),
        }
    }
    assert_eq!(scene.unwrap().unwrap().node_count(), 3);
    assert_eq!(environment.unwrap().unwrap().width(), 2);
}

#[test]
fn dispatch_reports_each_failure_separately() {
    let (tx, rx) = flume::unbounded();
    let sources = AssetSources {
        scene: AssetSource::Path(temp_path("missing.glb")),
        environment: AssetSource::from_bytes("studio.hdr", tiny_hdr()),
    };

    dispatch_loads(Arc::new(DefaultAssetLoader::new()), sources, tx);

    let mut failures = 0;
    let mut successes = 0;
    for _ in 0..2 {
        match rx.recv_timeout(TIMEOUT).unwrap() {
            LoadEvent::Scene(Err(_)) | LoadEvent::Environment(Err(_)) => failures += 1,
            LoadEvent::Scene(Ok(_)) | LoadEvent::Environment(Ok(_)) => successes += 1,
        }
    }
    assert_eq!((failures, successes), (1, 1));
}

#[test]
fn dispatch_survives_a_dropped_receiver() {
    let (tx, rx) = flume::unbounded();
    drop(rx);
    dispatch_loads(Arc::new(DefaultAssetLoader::new()), memory_sources(), tx);

    // the shared runtime keeps serving later dispatches
    let (tx, rx) = flume::unbounded();
    dispatch_loads(Arc::new(DefaultAssetLoader::new()), memory_sources(), tx);
    for _ in 0..2 {
        rx.recv_timeout(TIMEOUT).unwrap();
    }
}
