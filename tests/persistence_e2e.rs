use lvdb::VecDB;
use lvdb::vector::cosine_similarity;
use std::time::Instant;
use tempfile::TempDir;

fn random_vector(dim: usize, seed: u64) -> Vec<f64> {
    // Simple LCG pseudo-random generator (no external dep needed)
    let mut state = seed;
    (0..dim)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            // Map to [-1.0, 1.0]
            ((state >> 33) as f64) / (u32::MAX as f64) * 2.0 - 1.0
        })
        .collect()
}

#[test]
fn test_reopen_compact_and_search() {
    let dim = 128;
    let num_vectors = 2_000;
    let num_searches = 20;

    let temp = TempDir::new().unwrap();
    let path = temp.path().join("vectors.db");

    println!("\n=== Persistence E2E Test ===");
    println!("Vectors: {}, Dimensions: {}, Searches: {}\n", num_vectors, dim, num_searches);

    // Phase 1: Create DB and insert vectors, each synced to the log
    let start = Instant::now();
    let db = VecDB::open(&path).unwrap();
    let ids: Vec<u64> = db
        .insert_batch((0..num_vectors).map(|i| random_vector(dim, i as u64)).collect())
        .into_iter()
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(db.count(), num_vectors);
    println!("Phase 1 - Insert {} vectors: {:.3}s", num_vectors, start.elapsed().as_secs_f64());

    // Phase 2: Delete every tenth vector and update a few others
    for id in ids.iter().step_by(10) {
        assert!(db.delete(*id).unwrap());
    }
    for id in ids.iter().skip(1).step_by(100) {
        db.update(*id, random_vector(dim, 50_000 + id)).unwrap();
    }
    let expected = db.get_all().unwrap();
    drop(db);

    // Phase 3: Reopen and compare
    let start = Instant::now();
    let db = VecDB::open(&path).unwrap();
    println!("Phase 3 - Replay log: {:.3}s", start.elapsed().as_secs_f64());
    assert_eq!(db.get_all().unwrap(), expected);

    // Phase 4: Compact, reopen, compare again
    let before = std::fs::metadata(&path).unwrap().len();
    db.compact().unwrap();
    let after = std::fs::metadata(&path).unwrap().len();
    println!("Phase 4 - Compact: {} -> {} bytes", before, after);
    assert!(after < before);
    drop(db);

    let db = VecDB::open(&path).unwrap();
    assert_eq!(db.get_all().unwrap(), expected);

    // Deleted ids stay retired after compaction
    let fresh = db.insert(random_vector(dim, 7)).unwrap();
    assert!(fresh > *ids.last().unwrap());

    // Phase 5: Searches agree with brute force
    let start = Instant::now();
    for i in 0..num_searches {
        let query = random_vector(dim, (num_vectors + i) as u64);
        let results = db.search(&query, 10).unwrap();
        assert_eq!(results.len(), 10);

        let mut brute: Vec<(u64, f64)> = db
            .get_all()
            .unwrap()
            .iter()
            .map(|r| (r.id, cosine_similarity(&query, &r.values).unwrap()))
            .collect();
        brute.sort_by(|a, b| b.1.total_cmp(&a.1));

        let got: Vec<u64> = results.iter().map(|r| r.record.id).collect();
        let want: Vec<u64> = brute.iter().take(10).map(|(id, _)| *id).collect();
        assert_eq!(got, want);

        for w in results.windows(2) {
            assert!(w[0].score >= w[1].score, "Results not sorted by score");
        }
    }
    println!("Phase 5 - {} searches: {:.3}s\n", num_searches, start.elapsed().as_secs_f64());
}
