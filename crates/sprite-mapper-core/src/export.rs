use crate::model::Atlas;
use serde_json::{Value, json};

fn meta<K>(atlas: &Atlas<K>) -> Value {
    json!({
        "app": "sprite-mapper",
        "version": env!("CARGO_PKG_VERSION"),
        "format": "RGBA8888",
        "size": {"w": atlas.width, "h": atlas.height},
        "efficiency": atlas.efficiency(),
    })
}

/// Serialize the atlas as `{ width, height, images: [...], meta }`, images in input order.
/// Suitable for generic tooling and simple consumption.
pub fn to_json_array<K: ToString>(atlas: &Atlas<K>) -> Value {
    let images: Vec<Value> = atlas
        .images
        .iter()
        .map(|p| {
            json!({
                "key": p.key.to_string(),
                "index": p.index,
                "frame": {"x": p.x, "y": p.y, "w": p.width, "h": p.height},
            })
        })
        .collect();
    json!({
        "width": atlas.width,
        "height": atlas.height,
        "images": images,
        "meta": meta(atlas),
    })
}

/// Flatten images keyed by name.
/// Shape: `{ frames: { name: { frame, rotated, trimmed, sourceSize } }, meta }`.
/// Compatible with pipelines expecting TexturePacker-like JSON hash. Later
/// duplicates of a key overwrite earlier ones.
pub fn to_json_hash<K: ToString>(atlas: &Atlas<K>) -> Value {
    let mut frames = serde_json::Map::new();
    for p in &atlas.images {
        frames.insert(
            p.key.to_string(),
            json!({
                "frame": {"x": p.x, "y": p.y, "w": p.width, "h": p.height},
                "rotated": false,
                "trimmed": false,
                "sourceSize": {"w": p.width, "h": p.height},
            }),
        );
    }
    json!({ "frames": frames, "meta": meta(atlas) })
}
