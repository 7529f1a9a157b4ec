//! Simulation harness for noisy order flow against the engine.
//!
//! Grounded on the teacher's own `simulate.rs`: Poisson inter-arrival via `rand_distr::Exp`,
//! exponential order size, and a Normal-distributed random walk on the mid price. Reworked to
//! drive `OrderBookEngine::post` in-process instead of POSTing JSON to an HTTP server —
//! `SPEC_FULL.md` §1 carries no wire protocol, so there is no server to talk to.

use rand::Rng;
use rand_distr::{Distribution, Exp, Exp1, Normal};
use rust_decimal::Decimal;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::engine::OrderBookEngine;
use crate::order::{Order, Side};

#[derive(Clone)]
pub struct SimConfig {
    pub run_secs: Option<u64>,
    pub attack_rate_hz: f64,
    pub noise_sigma: f64,
    pub mean_qty: f64,
    pub starting_mid: f64,
}

/// Noisy limit-order simulation loop. Runs until `cancel_token` fires or `run_secs` elapses,
/// whichever comes first.
pub async fn run_simulation(
    cfg: SimConfig,
    engine: &OrderBookEngine,
    cancel_token: CancellationToken,
) -> anyhow::Result<()> {
    let ia = Exp::new(cfg.attack_rate_hz).expect("attack_rate_hz must be > 0");
    let drift = Normal::new(0.0, cfg.noise_sigma.max(f64::MIN_POSITIVE)).expect("noise_sigma >= 0");
    let size = Exp1;

    let mut mid = cfg.starting_mid;
    let start = Instant::now();
    let spread = 1.0_f64;
    let mut ticks = 0u64;

    loop {
        if let Some(max_secs) = cfg.run_secs {
            if start.elapsed().as_secs() >= max_secs {
                break;
            }
        }

        let wait_secs: f64 = ia.sample(&mut rand::rng());
        tokio::select! {
            _ = cancel_token.cancelled() => {
                info!("received shutdown; exiting simulation loop");
                break;
            }
            _ = sleep(Duration::from_secs_f64(wait_secs)) => {}
        }

        let unit: f64 = size.sample(&mut rand::rng());
        let qty = (unit * cfg.mean_qty).max(1.0).round() as u64;

        mid += drift.sample(&mut rand::rng());

        let (price, side) = if rand::rng().random_bool(0.5) {
            (mid - spread, Side::Bid)
        } else {
            (mid + spread, Side::Ask)
        };
        let price = Decimal::new(price.max(1.0).round() as i64, 0);

        let id = engine.post(Order::new(side, price, qty));
        ticks += 1;
        info!(
            elapsed = format_args!("{:.1}s", start.elapsed().as_secs_f64()),
            ?side,
            qty,
            %price,
            mid = format_args!("{:.2}", mid),
            %id,
            "sim tick"
        );
    }

    info!(ticks, "simulation done");
    Ok(())
}
