//! Splitting an ordered entity list into fixed-capacity pages.
//!
//! Each page later becomes one rendered document, so an empty input yields
//! no pages at all rather than one empty page.

use crate::error::{ReportError, Result};

/// An ordered, non-empty chunk of at most `capacity` entities.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page<'a, T> {
    entities: &'a [T],
    capacity: usize,
}

impl<'a, T> Page<'a, T> {
    pub fn entities(&self) -> &'a [T] {
        self.entities
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entities.len() == self.capacity
    }

    pub fn iter(&self) -> std::slice::Iter<'a, T> {
        self.entities.iter()
    }
}

/// Fail with [`ReportError::InvalidCapacity`] unless `capacity >= 1`.
pub fn validate_capacity(capacity: usize) -> Result<usize> {
    if capacity == 0 {
        return Err(ReportError::InvalidCapacity(capacity));
    }
    Ok(capacity)
}

/// Partition `entities` into pages of `capacity`, preserving order.
///
/// Only the last page may be partial; no reordering happens here.
pub fn paginate<T>(entities: &[T], capacity: usize) -> Result<Vec<Page<'_, T>>> {
    let capacity = validate_capacity(capacity)?;
    Ok(entities
        .chunks(capacity)
        .map(|chunk| Page {
            entities: chunk,
            capacity,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_130_entities_by_40() {
        let entities: Vec<u32> = (0..130).collect();
        let pages = paginate(&entities, 40).unwrap();
        let sizes: Vec<usize> = pages.iter().map(Page::len).collect();
        assert_eq!(sizes, vec![40, 40, 40, 10]);
        assert!(pages[0].is_full());
        assert!(!pages[3].is_full());
        assert_eq!(pages[3].entities().first(), Some(&120));
    }

    #[test]
    fn test_empty_input_yields_no_pages() {
        let entities: Vec<u32> = Vec::new();
        assert!(paginate(&entities, 5).unwrap().is_empty());
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        let entities = vec!["a", "b"];
        assert!(matches!(
            paginate(&entities, 0),
            Err(ReportError::InvalidCapacity(0))
        ));
    }

    #[test]
    fn test_exact_multiple_has_no_trailing_page() {
        let entities: Vec<u32> = (0..10).collect();
        assert_eq!(paginate(&entities, 5).unwrap().len(), 2);
    }

    proptest! {
        #[test]
        fn prop_pages_concatenate_to_input(
            entities in proptest::collection::vec(any::<u16>(), 0..300),
            capacity in 1usize..50,
        ) {
            let pages = paginate(&entities, capacity).unwrap();
            let flattened: Vec<u16> = pages.iter().flat_map(|p| p.iter().copied()).collect();
            prop_assert_eq!(&flattened, &entities);
            for page in &pages {
                prop_assert!(!page.is_empty());
                prop_assert!(page.len() <= capacity);
            }
            prop_assert_eq!(pages.len(), entities.len().div_ceil(capacity));
        }
    }
}
