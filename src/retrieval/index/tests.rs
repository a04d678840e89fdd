use super::*;

fn sample_index() -> VectorIndex {
    VectorIndex::build(
        2,
        vec![
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![0.0, 2.0],
            vec![3.0, 3.0],
        ],
    )
    .expect("should build index")
}

#[test]
fn squared_l2_distance() {
    assert_eq!(squared_l2(&[0.0, 0.0], &[3.0, 4.0]), 25.0);
    assert_eq!(squared_l2(&[1.5, -1.0], &[1.5, -1.0]), 0.0);
}

#[test]
fn search_orders_by_distance() {
    let index = sample_index();

    let hits = index.search(&[0.9, 0.1], 3).expect("search should succeed");

    let order: Vec<usize> = hits.iter().map(|n| n.index).collect();
    assert_eq!(order, vec![1, 0, 2]);
    assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
    assert!((hits[0].distance - 0.02).abs() < 1e-6);
}

#[test]
fn ties_keep_index_order() {
    let index = VectorIndex::build(
        1,
        vec![vec![2.0], vec![-1.0], vec![1.0], vec![-1.0]],
    )
    .expect("should build index");

    let hits = index.search(&[0.0], 4).expect("search should succeed");

    let order: Vec<usize> = hits.iter().map(|n| n.index).collect();
    assert_eq!(order, vec![1, 2, 3, 0]);
}

#[test]
fn k_larger_than_corpus_returns_everything() {
    let index = sample_index();

    let hits = index.search(&[0.0, 0.0], 10).expect("search should succeed");

    assert_eq!(hits.len(), 4);
    assert_eq!(hits[0].index, 0);
    assert_eq!(hits[0].distance, 0.0);
}

#[test]
fn zero_k_returns_nothing() {
    let hits = sample_index()
        .search(&[0.0, 0.0], 0)
        .expect("search should succeed");
    assert!(hits.is_empty());
}

#[test]
fn empty_index_returns_no_results() {
    let index = VectorIndex::empty(384);
    assert!(index.is_empty());

    let hits = index.search(&vec![0.5; 384], 4).expect("search should succeed");
    assert!(hits.is_empty());

    let built = VectorIndex::build(8, Vec::new()).expect("should build empty index");
    assert_eq!(built.len(), 0);
    assert_eq!(built.dimension(), 8);
}

#[test]
fn dimension_mismatch_fails_fast() {
    let bad_row = VectorIndex::build(3, vec![vec![0.0, 0.0, 0.0], vec![1.0, 1.0]]);
    assert_eq!(
        bad_row,
        Err(IndexError::RowDimensionMismatch {
            row: 1,
            expected: 3,
            actual: 2
        })
    );

    let index = sample_index();
    assert_eq!(
        index.search(&[0.0, 0.0, 0.0], 2),
        Err(IndexError::QueryDimensionMismatch {
            expected: 2,
            actual: 3
        })
    );
}
