use sprite_mapper_core::prelude::*;

#[test]
fn batch_matches_individual_runs() {
    let cfg = MapperConfig::default();
    let jobs: Vec<Vec<ImageRequest<u32>>> = (1..=6)
        .map(|n| {
            (0..n * 3)
                .map(|i| ImageRequest::new(i, 4 + (i * 7) % 13, 3 + (i * 5) % 11))
                .collect()
        })
        .collect();

    let results = map_batch(&jobs, &cfg);
    assert_eq!(results.len(), jobs.len());
    for (job, result) in jobs.iter().zip(results) {
        let expected = AtlasMapper::new(cfg.clone()).map(job).expect("single");
        assert_eq!(result.expect("batch"), expected);
    }
}

#[test]
fn batch_reports_errors_per_job() {
    let cfg = MapperConfig::builder().max_canvas_width(16).build();
    let jobs = vec![
        vec![ImageRequest::new("fits", 8, 8)],
        vec![ImageRequest::new("too-wide", 32, 8)],
        vec![],
    ];
    let results = map_batch(&jobs, &cfg);
    assert!(results[0].is_ok());
    assert!(matches!(
        results[1],
        Err(sprite_mapper_core::MapperError::Ungroupable { .. })
    ));
    assert!(matches!(
        results[2],
        Err(sprite_mapper_core::MapperError::Empty)
    ));
}
