//! Annual commute burden of a block or a whole track from one home.

use serde::Serialize;
use tracing::warn;

use crate::config::CostModel;
use crate::error::{BurdenError, BurdenResult};
use crate::model::{Block, BlockKind, Context, LatLng, Track, type_label};
use crate::router::{Offline, Router};
use crate::traits::RouteProvider;

/// Hours and miles spent commuting over a block's weeks.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Burden {
    pub hours: f64,
    pub miles: f64,
    pub weeks: f64,
}

/// Per-entry line of a track evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockDetail {
    pub slots: Vec<String>,
    pub block: String,
    pub hours: f64,
    pub miles: f64,
    pub weeks: f64,
    pub zero_commute: bool,
    pub unresolved: bool,
    pub fixed_multi_site: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrackBurden {
    pub hours: f64,
    pub miles: f64,
    pub weeks: f64,
    pub details: Vec<BlockDetail>,
}

pub struct BurdenEvaluator<'a, P> {
    ctx: &'a Context,
    router: &'a Router<P>,
    cost: CostModel,
}

impl<'a, P: RouteProvider> BurdenEvaluator<'a, P> {
    pub fn new(ctx: &'a Context, router: &'a Router<P>, cost: CostModel) -> Self {
        Self { ctx, router, cost }
    }

    pub fn context(&self) -> &'a Context {
        self.ctx
    }

    pub fn cost_model(&self) -> &CostModel {
        &self.cost
    }

    /// Evaluate a block by name. Unknown names are an error here; track
    /// evaluation skips them instead.
    pub fn evaluate_named(&self, name: &str, home: LatLng, allow_network: bool) -> BurdenResult<Burden> {
        let block = self
            .ctx
            .block(name)
            .ok_or_else(|| BurdenError::Config(format!("unknown block {:?}", name)))?;
        self.evaluate(block, home, allow_network)
    }

    pub fn evaluate(&self, block: &Block, home: LatLng, allow_network: bool) -> BurdenResult<Burden> {
        match block.kind {
            BlockKind::Unresolved => self.evaluate_unresolved(block, home, allow_network),
            BlockKind::ZeroCommute => Ok(Burden {
                hours: 0.0,
                miles: 0.0,
                weeks: f64::from(block.weeks),
            }),
            BlockKind::FixedMultiSite => self.evaluate_fixed_schedule(block, home, allow_network),
            BlockKind::Regular => Ok(self.evaluate_regular(block, home, allow_network)),
        }
    }

    /// Mean of all resolved blocks sharing the leading type label.
    fn evaluate_unresolved(&self, block: &Block, home: LatLng, allow_network: bool) -> BurdenResult<Burden> {
        let label = type_label(&block.name);
        let mut hours = 0.0;
        let mut miles = 0.0;
        let mut weeks: Option<f64> = None;
        let mut count = 0usize;

        for sibling in self.ctx.resolved_siblings(label) {
            let burden = self.evaluate(sibling, home, allow_network)?;
            hours += burden.hours;
            miles += burden.miles;
            match weeks {
                None => weeks = Some(burden.weeks),
                Some(first) => {
                    if first != burden.weeks {
                        warn!(
                            block = %block.name,
                            sibling = %sibling.name,
                            "siblings disagree on block length; using the first"
                        );
                    }
                }
            }
            count += 1;
        }

        match weeks {
            Some(weeks) => Ok(Burden {
                hours: hours / count as f64,
                miles: miles / count as f64,
                weeks,
            }),
            None => Err(BurdenError::NoSiblings {
                block: block.name.clone(),
                label: label.to_string(),
            }),
        }
    }

    /// Costed from the configured visit schedule; the block's own sites are
    /// not used. An empty schedule is a configuration error.
    fn evaluate_fixed_schedule(&self, block: &Block, home: LatLng, allow_network: bool) -> BurdenResult<Burden> {
        let schedule = &self.ctx.rules().fixed_multi_site_schedule;
        if schedule.is_empty() {
            return Err(BurdenError::Config(format!(
                "block {:?} is {} but no fixed multi-site schedule is configured",
                block.name,
                self.ctx.rules().fixed_multi_site_category
            )));
        }

        let mut burden = Burden {
            weeks: f64::from(block.weeks),
            ..Burden::default()
        };

        for stop in schedule {
            let Some(site) = self.site(&block.name, &stop.site) else {
                continue;
            };
            let leg = self.router.resolve(home.coords(), site.coords(), allow_network);
            let round_trips = f64::from(stop.visits) * 2.0;
            burden.hours += leg.hours * round_trips;
            burden.miles += leg.miles * round_trips;
        }

        Ok(burden)
    }

    fn evaluate_regular(&self, block: &Block, home: LatLng, allow_network: bool) -> Burden {
        let weeks = f64::from(block.weeks);
        let mut burden = Burden {
            weeks,
            ..Burden::default()
        };
        if block.sites.is_empty() {
            return burden;
        }

        let weeks_at_site = weeks / block.sites.len() as f64;
        let trip_multiplier = if block.weekday_exception {
            self.cost.weekday_exception_trip_multiplier
        } else {
            self.cost.standard_trip_multiplier
        };
        let factor = trip_multiplier * self.cost.workdays_per_week * weeks_at_site;

        for name in &block.sites {
            let Some(site) = self.site(&block.name, name) else {
                continue;
            };
            let leg = self.router.resolve(home.coords(), site.coords(), allow_network);
            burden.hours += leg.hours * factor;
            burden.miles += leg.miles * factor;
        }

        burden
    }

    fn site(&self, block: &str, name: &str) -> Option<LatLng> {
        let site = self.ctx.location(name);
        if site.is_none() {
            warn!(%block, site = %name, "unknown site skipped");
        }
        site
    }

    /// Sum of every entry's burden. Entries naming an unknown block count as zero.
    pub fn evaluate_track(&self, track: &Track, home: LatLng, allow_network: bool) -> BurdenResult<TrackBurden> {
        let mut total = TrackBurden::default();

        for entry in &track.entries {
            let Some(block) = self.ctx.block(&entry.block) else {
                warn!(track = %track.name, block = %entry.block, "unknown block skipped");
                continue;
            };
            let burden = self.evaluate(block, home, allow_network)?;

            total.hours += burden.hours;
            total.miles += burden.miles;
            total.weeks += burden.weeks;
            total.details.push(BlockDetail {
                slots: entry.slots.clone(),
                block: entry.block.clone(),
                hours: burden.hours,
                miles: burden.miles,
                weeks: burden.weeks,
                zero_commute: block.kind == BlockKind::ZeroCommute,
                unresolved: block.kind == BlockKind::Unresolved,
                fixed_multi_site: block.kind == BlockKind::FixedMultiSite,
            });
        }

        Ok(total)
    }

    /// The same model with routing disabled; `Sync` regardless of `P`.
    pub(crate) fn offline_router(&self) -> Router<Offline> {
        Router::offline(self.cost.fallback_speed_mph)
    }
}
