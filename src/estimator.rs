//! Reactive estimate state for a booking form.
//!
//! A form pushes its current inputs through [`Estimator::update`] on every
//! change; subscribers see the latest [`EstimateState`] through a watch
//! channel. Results from superseded inputs are dropped, so a slow lookup for
//! an old address can never overwrite the estimate for the current one.

use std::sync::atomic::{AtomicU64, Ordering};

use rust_decimal::Decimal;
use tokio::sync::watch;
use tracing::debug;

use crate::pricing::models::{PriceEstimate, ShipmentType};
use crate::pricing::services::EstimateService;

/// Addresses shorter than this are not worth geocoding yet
pub const MIN_PLACE_LEN: usize = 3;

/// Current form inputs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EstimateInputs {
    pub from: String,
    pub to: String,
    pub weight_kg: Option<Decimal>,
    pub shipment_type: ShipmentType,
}

impl EstimateInputs {
    /// True when every input is present enough to try an estimate
    pub fn is_complete(&self) -> bool {
        self.from.trim().chars().count() >= MIN_PLACE_LEN
            && self.to.trim().chars().count() >= MIN_PLACE_LEN
            && self.weight_kg.map_or(false, |w| w > Decimal::ZERO)
    }
}

/// What the form should display
#[derive(Debug, Clone, PartialEq)]
pub enum EstimateState {
    /// Not enough input yet; show "will be calculated"
    Incomplete,
    Calculating,
    Ready(PriceEstimate),
    /// Lookup failed; show no price
    Unavailable { reason: String, retryable: bool },
}

/// View-model that recomputes the estimate whenever inputs change
pub struct Estimator {
    service: EstimateService,
    generation: AtomicU64,
    state: watch::Sender<EstimateState>,
}

impl Estimator {
    pub fn new(service: EstimateService) -> Self {
        let (state, _) = watch::channel(EstimateState::Incomplete);
        Self {
            service,
            generation: AtomicU64::new(0),
            state,
        }
    }

    /// Receiver that observes every published state
    pub fn subscribe(&self) -> watch::Receiver<EstimateState> {
        self.state.subscribe()
    }

    /// Latest published state
    pub fn current(&self) -> EstimateState {
        self.state.borrow().clone()
    }

    /// Recompute for new inputs.
    ///
    /// Returns the state this call produced. If a newer `update` started while
    /// this one was waiting on the network, the result is discarded and
    /// `None` is returned.
    pub async fn update(&self, inputs: EstimateInputs) -> Option<EstimateState> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let weight_kg = match inputs.weight_kg {
            Some(w) if inputs.is_complete() => w,
            _ => {
                self.state.send_replace(EstimateState::Incomplete);
                return Some(EstimateState::Incomplete);
            }
        };

        self.state.send_replace(EstimateState::Calculating);

        let result = self
            .service
            .estimate_between_places(&inputs.from, &inputs.to, weight_kg, inputs.shipment_type)
            .await;

        let next = match result {
            Ok(estimate) => EstimateState::Ready(estimate),
            Err(e) => EstimateState::Unavailable {
                retryable: e.is_retryable(),
                reason: e.to_string(),
            },
        };

        // send_if_modified runs the check and the write under the channel lock
        let mut published = false;
        self.state.send_if_modified(|current| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            *current = next.clone();
            published = true;
            true
        });

        if published {
            Some(next)
        } else {
            debug!(generation, "Discarding stale estimate");
            None
        }
    }
}
