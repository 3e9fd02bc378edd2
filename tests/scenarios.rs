//! End-to-end behaviour of the public API.

use anyhow::Result;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use ranked_skiplist::{RankedSkipList, SkipListError};
use rstest::{fixture, rstest};

/// Ten squares, keyed `1..=10`, in a ten-level list.
#[fixture]
fn squares() -> RankedSkipList<i64, i64> {
    let mut list = RankedSkipList::new(10, 1).unwrap();
    for key in 1..=10 {
        list.insert(key, key * key).unwrap();
        // The median so far is always reachable by rank.
        let median = (key + 1) / 2;
        let rank = usize::try_from(median - 1).unwrap();
        assert_eq!(list.get_index(rank).unwrap().0, &median);
    }
    list
}

#[rstest]
fn lookup_by_rank_and_key(squares: RankedSkipList<i64, i64>) -> Result<()> {
    assert_eq!(squares.len(), 10);
    for rank in 0..10 {
        let key = i64::try_from(rank)? + 1;
        assert_eq!(squares.get_index(rank)?, (&key, &(key * key)));
    }
    for key in 1..=10 {
        assert_eq!(squares.get(&key), Some(&(key * key)));
    }
    Ok(())
}

#[rstest]
fn remove_middle(mut squares: RankedSkipList<i64, i64>) -> Result<()> {
    assert_eq!(squares.remove(&5)?, 25);
    assert_eq!(squares.get(&5), None);
    assert_eq!(squares.len(), 9);
    for key in (1..=10).filter(|&key| key != 5) {
        assert_eq!(squares.get(&key), Some(&(key * key)));
    }

    let ranked: Vec<i64> = (0..9)
        .map(|rank| squares.get_index(rank).map(|(&key, _)| key))
        .collect::<Result<_, _>>()?;
    assert_eq!(ranked, vec![1, 2, 3, 4, 6, 7, 8, 9, 10]);
    Ok(())
}

#[rstest]
fn remove_twice(mut squares: RankedSkipList<i64, i64>) -> Result<()> {
    squares.remove(&5)?;
    assert_eq!(squares.remove(&5), Err(SkipListError::NotFound));
    assert_eq!(squares.len(), 9);

    // Removing every odd key only fails for the one already gone.
    for key in (1..=10).step_by(2) {
        let removed = squares.remove(&key);
        if key == 5 {
            assert_eq!(removed, Err(SkipListError::NotFound));
        } else {
            assert_eq!(removed, Ok(key * key));
        }
    }
    assert_eq!(squares.len(), 5);
    Ok(())
}

#[rstest]
fn rank_past_the_end(squares: RankedSkipList<i64, i64>) {
    let len = squares.len();
    assert_eq!(
        squares.get_index(len),
        Err(SkipListError::OutOfRange { rank: len, len })
    );
}

#[test]
fn error_messages() {
    assert_eq!(SkipListError::NotFound.to_string(), "key not found.");
    assert_eq!(
        SkipListError::OutOfRange { rank: 3, len: 2 }.to_string(),
        "rank 3 is out of range for a list of length 2."
    );
    assert_eq!(
        RankedSkipList::<u8, u8>::new(0, 1)
            .err()
            .map(|err| err.to_string()),
        Some(String::from("max must be non-zero."))
    );
}

#[test]
fn independent_instances() -> Result<()> {
    // Interleaving two lists must not change the levels either one draws.
    let mut alone = RankedSkipList::with_seed(12, 1, 99)?;
    for key in 0..1000 {
        alone.insert(key, ())?;
    }

    let mut first = RankedSkipList::with_seed(12, 1, 99)?;
    let mut second = RankedSkipList::with_seed(12, 3, 7)?;
    for key in 0..1000 {
        first.insert(key, ())?;
        second.insert(key, ())?;
    }
    assert_eq!(first.node_levels(), alone.node_levels());
    Ok(())
}

proptest! {
    #[test]
    fn insert_then_remove_all(
        keys in prop::collection::hash_set(any::<i32>(), 0..200)
            .prop_map(|keys| keys.into_iter().collect::<Vec<_>>())
            .prop_shuffle(),
        order in any::<prop::sample::Index>(),
    ) {
        let mut list = RankedSkipList::new(8, 1).unwrap();
        for &key in &keys {
            list.insert(key, i64::from(key) * 3).unwrap();
        }
        prop_assert_eq!(list.len(), keys.len());

        let mut sorted = keys.clone();
        sorted.sort_unstable();
        for (rank, key) in sorted.iter().enumerate() {
            prop_assert_eq!(list.get_index(rank).unwrap().0, key);
        }

        // Remove in a rotated order, unrelated to the insertion order.
        let mut removal = keys.clone();
        if !removal.is_empty() {
            let at = order.index(removal.len());
            removal.rotate_left(at);
        }
        for (removed, key) in removal.iter().enumerate() {
            prop_assert_eq!(list.remove(key), Ok(i64::from(*key) * 3));
            prop_assert_eq!(list.len(), keys.len() - removed - 1);
        }

        prop_assert!(list.is_empty());
        for key in &keys {
            prop_assert_eq!(list.get(key), None);
        }
    }
}
