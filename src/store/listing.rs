//! Game lookup for user queries: search, region check, DLC enumeration.

use tracing::{info, warn};

use crate::store::models::{DlcListing, GameListing, PriceLabel};
use crate::store::pacing::RequestPacer;
use crate::store::{LookupError, LookupService};

/// Resolve a search term to a game card with its DLC.
///
/// A paid game without a formatted price is reported as unavailable in the
/// configured region. DLC that are unavailable are skipped; any other DLC
/// failure aborts the whole lookup.
pub async fn lookup_game(
    lookup: &dyn LookupService,
    pacer: &RequestPacer,
    term: &str,
) -> Result<GameListing, LookupError> {
    let hit = lookup.search_by_name(term).await?;
    // Every detail request in the chain, the first DLC included, goes through the pacer.
    pacer.ready().await;
    let details = lookup.get_details(hit.app_id).await?;

    if !details.is_available() {
        return Err(LookupError::Unavailable(hit.app_id));
    }

    let mut dlcs = Vec::with_capacity(details.related_ids.len());

    for &dlc_id in &details.related_ids {
        pacer.ready().await;

        match lookup.get_details(dlc_id).await {
            Ok(dlc) => dlcs.push(DlcListing {
                app_id: dlc_id,
                price: PriceLabel::of(&dlc),
                title: dlc.name,
            }),
            Err(LookupError::Unavailable(_)) => {
                warn!(app_id = hit.app_id, dlc_id, "DLC unavailable in region, skipped");
            }
            Err(LookupError::Transport(e)) => {
                return Err(LookupError::Transport(format!("DLC {dlc_id}: {e}")));
            }
            Err(LookupError::Decode(e)) => {
                return Err(LookupError::Decode(format!("DLC {dlc_id}: {e}")));
            }
            Err(e) => return Err(e),
        }
    }

    info!(app_id = hit.app_id, dlcs = dlcs.len(), "Game resolved");

    Ok(GameListing {
        app_id: hit.app_id,
        price: PriceLabel::of(&details),
        title: hit.name,
        link: hit.link,
        dlcs,
    })
}
