//! Sample selection
//!
//! Chooses which pictures to hand out next. Three policies, each returning an
//! unordered subset of at most `amount` pictures:
//!
//! - **unused**: fresh work for a human annotator
//! - **with suggestion**: recognizer proposals awaiting human confirmation
//! - **for recognizer**: pictures never sent to the recognizer, claimed as
//!   they are drawn so no two calls hand out the same picture
//!
//! Any store failure aborts the call; partial results are never returned.

use tracing::{debug, info, warn};

use crate::db::schemas::PictureDoc;
use crate::repository::PictureRepository;
use crate::store::PictureFilter;
use crate::types::Result;

/// Upper bound on sample-and-claim rounds per recognizer batch
const MAX_CLAIM_ROUNDS: usize = 4;

#[derive(Clone)]
pub struct Selector {
    repo: PictureRepository,
}

impl Selector {
    pub fn new(repo: PictureRepository) -> Self {
        Self { repo }
    }

    /// Pictures neither annotated nor unreadable
    pub async fn unused(&self, amount: usize) -> Result<Vec<PictureDoc>> {
        let pictures = self.repo.sample(&PictureFilter::unused(), amount).await?;
        debug!("Selected {}/{} unused pictures", pictures.len(), amount);
        Ok(pictures)
    }

    /// Recognizer-annotated pictures awaiting confirmation
    pub async fn with_suggestion(&self, amount: usize) -> Result<Vec<PictureDoc>> {
        let pictures = self
            .repo
            .sample(&PictureFilter::with_suggestion(), amount)
            .await?;
        debug!("Selected {}/{} suggested pictures", pictures.len(), amount);
        Ok(pictures)
    }

    /// Claim a batch of pictures for the recognizer.
    ///
    /// Each drawn picture is claimed with a conditional write before the next
    /// one is considered. A picture another caller claimed in the meantime is
    /// dropped and the shortfall is re-sampled, for at most
    /// [`MAX_CLAIM_ROUNDS`] rounds. Every returned picture has
    /// `SentToReco=true`.
    pub async fn for_recognizer(&self, amount: usize) -> Result<Vec<PictureDoc>> {
        let filter = PictureFilter::for_recognizer();
        let mut claimed: Vec<PictureDoc> = Vec::new();
        let mut lost = 0usize;

        for _ in 0..MAX_CLAIM_ROUNDS {
            let wanted = amount - claimed.len();
            if wanted == 0 {
                break;
            }

            let candidates = self.repo.sample(&filter, wanted).await?;
            if candidates.is_empty() {
                break;
            }

            for candidate in candidates {
                let Some(id) = candidate.id else {
                    continue;
                };
                match self.repo.claim_for_recognizer(id).await? {
                    Some(pic) => claimed.push(pic),
                    None => {
                        lost += 1;
                        debug!("Picture {} was claimed by another caller", id);
                    }
                }
            }
        }

        if lost > 0 {
            warn!("Lost {} recognizer claims to concurrent callers", lost);
        }
        info!("Claimed {}/{} pictures for the recognizer", claimed.len(), amount);
        Ok(claimed)
    }

    /// Fill an annotator's page: suggestions first, unused pictures for the
    /// shortfall.
    ///
    /// The two pools are disjoint (suggestions are annotated, unused pictures
    /// are not), so nothing is counted twice.
    pub async fn annotator_page(&self, amount: usize) -> Result<Vec<PictureDoc>> {
        let mut page = self.with_suggestion(amount).await?;

        if page.len() < amount {
            let fresh = self.unused(amount - page.len()).await?;
            page.extend(fresh);
        }

        Ok(page)
    }
}
