//! Legal brick size catalog
//!
//! Pure lookup of which rectangular footprints a brick family is physically
//! allowed to produce, keyed by cell type and height class (1-tall plate
//! class or 3-tall brick class). Footprints are orientation-normalized, so
//! `(2, 4)` and `(4, 2)` are the same entry. An empty set for a type that
//! the merge engine is actively using is a configuration error, surfaced as
//! [`BrickError::EmptyLegalSizeSet`].

use crate::error::{BrickError, BrickResult};
use crate::grid::{BrickSize, BrickType};
use std::collections::{HashMap, HashSet};

/// Standard footprints shared by stud bricks and plates
const STANDARD_FOOTPRINTS: &[(i32, i32)] = &[
    (1, 1),
    (1, 2),
    (1, 3),
    (1, 4),
    (1, 6),
    (1, 8),
    (2, 2),
    (2, 3),
    (2, 4),
    (2, 6),
    (2, 8),
    (2, 10),
    (4, 4),
    (4, 6),
    (4, 8),
    (4, 10),
    (4, 12),
    (6, 6),
    (6, 8),
    (6, 10),
    (6, 12),
    (6, 14),
    (6, 16),
    (8, 8),
    (8, 11),
    (8, 16),
    (16, 16),
];

/// Extra footprints that exist only in the plate class
const PLATE_ONLY_FOOTPRINTS: &[(i32, i32)] = &[
    (1, 10),
    (1, 12),
    (2, 12),
    (2, 14),
    (2, 16),
    (3, 3),
];

const SLOPE_FOOTPRINTS: &[(i32, i32)] = &[
    (1, 1),
    (1, 2),
    (1, 3),
    (1, 4),
    (2, 2),
    (2, 3),
    (2, 4),
    (2, 8),
    (3, 3),
    (4, 4),
];

const TILE_FOOTPRINTS: &[(i32, i32)] = &[
    (1, 1),
    (1, 2),
    (1, 3),
    (1, 4),
    (1, 6),
    (1, 8),
    (2, 2),
    (2, 4),
    (6, 6),
];

const ROUND_FOOTPRINTS: &[(i32, i32)] = &[(1, 1), (2, 2), (4, 4)];

/// Lookup of legal footprints per (cell type, height class).
#[derive(Debug, Clone)]
pub struct LegalSizeCatalog {
    sizes: HashMap<(BrickType, i32), HashSet<(i32, i32)>>,
}

impl LegalSizeCatalog {
    /// Catalog with no entries; every legality query fails until families
    /// are registered. Useful for custom hosts that supply their own sets.
    pub fn empty() -> Self {
        LegalSizeCatalog {
            sizes: HashMap::new(),
        }
    }

    /// Register a footprint set for a type at a height class. Footprints
    /// are normalized on insertion.
    pub fn register(
        &mut self,
        brick_type: BrickType,
        height_class: i32,
        footprints: impl IntoIterator<Item = (i32, i32)>,
    ) {
        let entry = self
            .sizes
            .entry((brick_type, height_class))
            .or_default();
        for (w, d) in footprints {
            entry.insert((w.min(d), w.max(d)));
        }
    }

    /// Register every footprint up to the given caps. Used for the custom
    /// family, which has no fixed mold set.
    pub fn register_unrestricted(
        &mut self,
        brick_type: BrickType,
        height_class: i32,
        max_w: i32,
        max_d: i32,
    ) {
        let all = (1..=max_w).flat_map(|w| (w..=max_d).map(move |d| (w, d)));
        self.register(brick_type, height_class, all);
    }

    /// Whether a full size triple is legal for a type. The height component
    /// selects the height class.
    pub fn is_legal(&self, size: BrickSize, brick_type: BrickType) -> bool {
        self.sizes
            .get(&(brick_type, size.h))
            .map(|set| set.contains(&size.normalized_footprint()))
            .unwrap_or(false)
    }

    /// The legal footprint set for a type at a height class. An absent or
    /// empty set is a fatal configuration error.
    pub fn legal_sizes_for(
        &self,
        brick_type: BrickType,
        height_class: i32,
    ) -> BrickResult<&HashSet<(i32, i32)>> {
        match self.sizes.get(&(brick_type, height_class)) {
            Some(set) if !set.is_empty() => Ok(set),
            _ => Err(BrickError::EmptyLegalSizeSet {
                brick_type,
                height_class,
            }),
        }
    }
}

impl Default for LegalSizeCatalog {
    /// The standard mold tables for every built-in family
    fn default() -> Self {
        let mut catalog = LegalSizeCatalog::empty();
        catalog.register(BrickType::Brick, 3, STANDARD_FOOTPRINTS.iter().copied());
        catalog.register(BrickType::Plate, 1, STANDARD_FOOTPRINTS.iter().copied());
        catalog.register(BrickType::Plate, 1, PLATE_ONLY_FOOTPRINTS.iter().copied());
        catalog.register(BrickType::Slope, 3, SLOPE_FOOTPRINTS.iter().copied());
        catalog.register(BrickType::Tile, 1, TILE_FOOTPRINTS.iter().copied());
        catalog.register(BrickType::Round, 1, ROUND_FOOTPRINTS.iter().copied());
        catalog.register_unrestricted(BrickType::Custom, 3, 8, 8);
        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_sizes_are_legal() {
        let catalog = LegalSizeCatalog::default();
        assert!(catalog.is_legal(BrickSize::new(2, 4, 3), BrickType::Brick));
        assert!(catalog.is_legal(BrickSize::new(4, 2, 3), BrickType::Brick)); // orientation
        assert!(catalog.is_legal(BrickSize::new(1, 1, 1), BrickType::Plate));
        assert!(catalog.is_legal(BrickSize::new(4, 4, 3), BrickType::Brick));
    }

    #[test]
    fn test_illegal_sizes_rejected() {
        let catalog = LegalSizeCatalog::default();
        assert!(!catalog.is_legal(BrickSize::new(3, 5, 3), BrickType::Brick));
        // Wrong height class for the type
        assert!(!catalog.is_legal(BrickSize::new(2, 4, 1), BrickType::Brick));
        assert!(!catalog.is_legal(BrickSize::new(2, 4, 3), BrickType::Round));
    }

    #[test]
    fn test_empty_set_is_a_config_error() {
        let catalog = LegalSizeCatalog::empty();
        let err = catalog.legal_sizes_for(BrickType::Brick, 3);
        assert!(matches!(
            err,
            Err(BrickError::EmptyLegalSizeSet { .. })
        ));
    }

    #[test]
    fn test_unrestricted_registration() {
        let mut catalog = LegalSizeCatalog::empty();
        catalog.register_unrestricted(BrickType::Custom, 3, 4, 4);
        assert!(catalog.is_legal(BrickSize::new(3, 4, 3), BrickType::Custom));
        assert!(!catalog.is_legal(BrickSize::new(5, 1, 3), BrickType::Custom));
    }
}
