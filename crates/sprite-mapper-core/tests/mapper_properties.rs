use rand::{Rng, SeedableRng, rngs::StdRng};
use sprite_mapper_core::prelude::*;

fn random_requests(rng: &mut StdRng, max_side: u32) -> Vec<ImageRequest<String>> {
    let n = rng.gen_range(1..=30);
    (0..n)
        .map(|i| {
            let w = rng.gen_range(1..=max_side);
            let h = rng.gen_range(1..=max_side);
            ImageRequest::new(format!("r{i}"), w, h)
        })
        .collect()
}

fn assert_valid(requests: &[ImageRequest<String>], atlas: &Atlas<String>) {
    // coverage, in input order
    assert_eq!(atlas.images.len(), requests.len());
    for (i, (p, r)) in atlas.images.iter().zip(requests).enumerate() {
        assert_eq!(p.index, i);
        assert_eq!(p.key, r.key);
        assert_eq!((p.width, p.height), (r.width, r.height));
    }
    // containment, and the canvas is the bounding box
    let bounds = Rect::new(0, 0, atlas.width, atlas.height);
    for p in &atlas.images {
        assert!(bounds.contains(&p.rect()), "{:?} outside {:?}", p.rect(), bounds);
    }
    assert_eq!(atlas.images.iter().map(|p| p.x + p.width).max(), Some(atlas.width));
    assert_eq!(atlas.images.iter().map(|p| p.y + p.height).max(), Some(atlas.height));
    // non-overlap
    for i in 0..atlas.images.len() {
        for j in (i + 1)..atlas.images.len() {
            let a = atlas.images[i].rect();
            let b = atlas.images[j].rect();
            assert!(!a.intersects(&b), "{a:?} overlaps {b:?}");
        }
    }
    assert!(atlas.area() >= atlas.used_area());
}

#[test]
fn random_sets_are_covered_disjoint_and_contained() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..60 {
        let reqs = random_requests(&mut rng, 40);
        let outcome = AtlasMapper::default().map_with_stats(&reqs).expect("map");
        assert_valid(&reqs, &outcome.atlas);
    }
}

#[test]
fn retained_candidates_shrink_and_width_never_grows() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..40 {
        let reqs = random_requests(&mut rng, 48);
        let outcome = AtlasMapper::default().map_with_stats(&reqs).expect("map");
        let history = &outcome.stats.history;
        assert_eq!(history.len() as u64, outcome.stats.candidates_generated);

        let retained: Vec<u64> = history
            .iter()
            .filter(|c| c.retained)
            .map(|c| c.area())
            .collect();
        assert!(retained.windows(2).all(|w| w[1] < w[0]), "{retained:?}");
        assert_eq!(retained.last().copied(), Some(outcome.atlas.area()));

        assert!(history.windows(2).all(|w| w[1].canvas_width <= w[0].canvas_width));
        for c in history {
            assert!(c.width <= c.canvas_width);
            assert!(c.height <= c.canvas_height);
        }
    }
}

#[test]
fn terminates_under_tight_width_ceilings() {
    let mut rng = StdRng::seed_from_u64(1234);
    for max_width in [40, 48, 64, 100] {
        for _ in 0..10 {
            let reqs = random_requests(&mut rng, 40);
            let cfg = MapperConfig::builder().max_canvas_width(max_width).build();
            let atlas = AtlasMapper::new(cfg).map(&reqs).expect("map");
            assert!(atlas.width <= max_width);
            assert_valid(&reqs, &atlas);
        }
    }
}

#[test]
fn mapping_is_deterministic() {
    let mut rng = StdRng::seed_from_u64(99);
    let reqs = random_requests(&mut rng, 64);
    let a = AtlasMapper::default().map_with_stats(&reqs).unwrap();
    let b = AtlasMapper::default().map_with_stats(&reqs).unwrap();
    assert_eq!(a.atlas, b.atlas);
    assert_eq!(a.stats, b.stats);
}

#[test]
fn budget_never_exceeded() {
    let mut rng = StdRng::seed_from_u64(5);
    for budget in 1..=4 {
        let reqs = random_requests(&mut rng, 32);
        let cfg = MapperConfig::builder()
            .max_candidate_atlases(Some(budget))
            .build();
        let outcome = AtlasMapper::new(cfg).map_with_stats(&reqs).unwrap();
        assert!(outcome.stats.candidates_generated <= budget as u64);
        assert_valid(&reqs, &outcome.atlas);
    }
}
