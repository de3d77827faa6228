#![forbid(unsafe_code)]

//! Practice/main split of the rated face pool.
//!
//! Faces are shuffled, stably sorted by their pre-rating, and walked in
//! order: each gender fills its quota in the main set first and everything
//! past the quota becomes practice material. Shuffling before the stable
//! sort breaks rating ties at random.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::catalog::{Gender, StimulusItem};
use crate::config::{RatingOrder, SelectionConfig};
use crate::error::{Result, StroopError};
use crate::rating::RatingPhase;

/// Two disjoint sets covering the rated pool.
#[derive(Debug, Clone, Default)]
pub struct FaceSelection {
    pub practice: Vec<StimulusItem>,
    pub selected: Vec<StimulusItem>,
}

impl FaceSelection {
    #[must_use]
    pub fn len(&self) -> usize {
        self.practice.len() + self.selected.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.practice.is_empty() && self.selected.is_empty()
    }
}

fn sort_key(order: RatingOrder, rating: i32) -> i64 {
    match order {
        RatingOrder::Magnitude => i64::from(rating.unsigned_abs()),
        RatingOrder::Signed => i64::from(rating),
    }
}

/// Split `items` into practice and main faces.
///
/// Every item must carry a pre-rating, and each gender must offer at least
/// `quota_per_gender` faces.
pub fn select_faces<R: Rng + ?Sized>(
    mut items: Vec<StimulusItem>,
    config: &SelectionConfig,
    rng: &mut R,
) -> Result<FaceSelection> {
    if let Some(item) = items.iter().find(|item| item.prerating.is_none()) {
        return Err(StroopError::MissingRating {
            id: item.id.clone(),
            phase: RatingPhase::Pre,
        });
    }

    let quota = config.quota_per_gender;
    for gender in Gender::ALL {
        let available = items.iter().filter(|item| item.gender == gender).count();
        if available < quota {
            return Err(StroopError::InsufficientStimuli {
                gender,
                available,
                quota,
            });
        }
    }

    items.shuffle(rng);
    items.sort_by_key(|item| sort_key(config.rating_order, item.prerating.unwrap_or_default()));

    let mut remaining = [quota, quota];
    let mut selection = FaceSelection::default();
    for item in items {
        let open = &mut remaining[item.gender as usize];
        if *open > 0 {
            *open -= 1;
            selection.selected.push(item);
        } else {
            selection.practice.push(item);
        }
    }

    tracing::debug!(
        selected = selection.selected.len(),
        practice = selection.practice.len(),
        order = ?config.rating_order,
        "selected faces"
    );
    Ok(selection)
}
