#![forbid(unsafe_code)]

//! Pleasantness rating passes.
//!
//! A pass presents every listed face once, in shuffled order, and writes
//! each response back into the catalog by identifier. The same machinery
//! runs before the classification task (all faces) and after it (the main
//! set only).

use std::collections::BTreeSet;
use std::fmt;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, StimulusId, StimulusItem};
use crate::config::RatingScale;
use crate::error::{Result, StroopError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RatingPhase {
    #[serde(rename = "prerating")]
    Pre,
    #[serde(rename = "postrating")]
    Post,
}

impl RatingPhase {
    /// Block type recorded with every rating trial.
    #[must_use]
    pub const fn block_type(self) -> &'static str {
        match self {
            Self::Pre => "prerating",
            Self::Post => "postrating",
        }
    }
}

impl fmt::Display for RatingPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pre => "pre-rating",
            Self::Post => "post-rating",
        })
    }
}

/// Source of slider responses; stands in for the presentation layer.
pub trait RatingResponder {
    /// Rate one face. The value must fall inside the session's [`RatingScale`].
    fn rate(&mut self, item: &StimulusItem, phase: RatingPhase) -> i32;
}

/// Uniform integer responses over the whole scale.
#[derive(Debug)]
pub struct UniformResponder<R> {
    rng: R,
    scale: RatingScale,
}

impl<R: Rng> UniformResponder<R> {
    pub fn new(rng: R, scale: RatingScale) -> Self {
        Self { rng, scale }
    }
}

impl<R: Rng> RatingResponder for UniformResponder<R> {
    fn rate(&mut self, _item: &StimulusItem, _phase: RatingPhase) -> i32 {
        self.rng.random_range(self.scale.min..=self.scale.max)
    }
}

impl<F> RatingResponder for F
where
    F: FnMut(&StimulusItem, RatingPhase) -> i32,
{
    fn rate(&mut self, item: &StimulusItem, phase: RatingPhase) -> i32 {
        self(item, phase)
    }
}

/// One rating pass over a fixed list of faces.
#[derive(Debug, Clone)]
pub struct RatingPass {
    phase: RatingPhase,
    order: Vec<StimulusId>,
    members: BTreeSet<StimulusId>,
}

impl RatingPass {
    /// Shuffle `ids` into presentation order.
    pub fn new<R: Rng + ?Sized>(phase: RatingPhase, mut ids: Vec<StimulusId>, rng: &mut R) -> Self {
        ids.shuffle(rng);
        let members = ids.iter().cloned().collect();
        Self {
            phase,
            order: ids,
            members,
        }
    }

    #[must_use]
    pub fn phase(&self) -> RatingPhase {
        self.phase
    }

    /// Presentation order.
    #[must_use]
    pub fn order(&self) -> &[StimulusId] {
        &self.order
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Write back one response collected by the presenter.
    pub fn record(
        &self,
        catalog: &mut Catalog,
        id: &StimulusId,
        value: i32,
        scale: &RatingScale,
    ) -> Result<()> {
        if !self.members.contains(id) {
            return Err(StroopError::UnknownStimulus { id: id.clone() });
        }
        catalog.record_rating(id, self.phase, value, scale)
    }

    /// Check every face was rated, then hand the catalog to `on_finish`.
    pub fn finish<T>(
        self,
        catalog: &Catalog,
        on_finish: impl FnOnce(&Catalog) -> Result<T>,
    ) -> Result<T> {
        let missing = catalog.unrated(&self.order, self.phase).len();
        if missing > 0 {
            return Err(StroopError::IncompleteRatingPass {
                phase: self.phase,
                missing,
            });
        }
        tracing::info!(phase = %self.phase, rated = self.order.len(), "rating pass complete");
        on_finish(catalog)
    }

    /// Drive `responder` over the faces still unrated in this pass, then run
    /// `on_finish`.
    ///
    /// Responses are collected and range-checked before any is written, so a
    /// rejected response leaves the catalog untouched and the pass can be run
    /// again.
    pub fn run<T>(
        self,
        catalog: &mut Catalog,
        scale: &RatingScale,
        responder: &mut impl RatingResponder,
        on_finish: impl FnOnce(&Catalog) -> Result<T>,
    ) -> Result<T> {
        let pending: Vec<StimulusId> = catalog
            .unrated(&self.order, self.phase)
            .into_iter()
            .cloned()
            .collect();
        let mut responses = Vec::with_capacity(pending.len());
        for id in pending {
            let item = catalog
                .get(&id)
                .ok_or_else(|| StroopError::UnknownStimulus { id: id.clone() })?;
            let value = responder.rate(item, self.phase);
            if !scale.contains(value) {
                return Err(StroopError::RatingOutOfRange {
                    value,
                    min: scale.min,
                    max: scale.max,
                });
            }
            responses.push((id, value));
        }
        for (id, value) in &responses {
            self.record(catalog, id, *value, scale)?;
        }
        self.finish(catalog, on_finish)
    }
}
