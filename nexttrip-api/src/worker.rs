use std::sync::Arc;
use chrono::Utc;
use nexttrip_shared::models::events::{AuditAction, AuditEvent, AuditStatus};
use nexttrip_wizard::SessionManager;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info};

use crate::audit;

/// Run one sweep, returning how many sessions were dropped.
pub async fn sweep_sessions(sessions: &SessionManager) -> usize {
    let removed = sessions.cleanup_expired(Utc::now()).await;

    for id in &removed {
        audit::record(
            &AuditEvent::new("system", AuditAction::SessionExpired, AuditStatus::Success, "Idle booking discarded")
                .for_session(*id),
        );
    }
    if !removed.is_empty() {
        info!("Session sweeper discarded {} idle session(s)", removed.len());
    }
    removed.len()
}

pub fn start_session_sweeper(sessions: Arc<SessionManager>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("Session sweeper started, every {:?}", every);

        loop {
            ticker.tick().await;
            let removed = sweep_sessions(&sessions).await;
            let remaining = sessions.len().await;
            debug!(removed, remaining, "Session sweep finished");
        }
    })
}
