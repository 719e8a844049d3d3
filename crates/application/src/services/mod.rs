mod dispatch_stats;
mod inflight;

pub use dispatch_stats::{DispatchStats, DispatchStatsSnapshot};
pub use inflight::{
    wait_for_leader, InflightLeaderGuard, InflightOutcome, InflightRegistry, InflightRole,
};
