use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::OnceCell;
use sqlx::MySqlPool;
use std::time::Duration;

use crate::model::leave_type::LeaveType;

/// Read-through cache of the leave-type policy table, keyed by id.
/// Left uninitialized, every lookup misses and reads go to the database.
static LEAVE_TYPE_CACHE: OnceCell<Cache<u64, LeaveType>> = OnceCell::new();

pub fn init(ttl: Duration) {
    let _ = LEAVE_TYPE_CACHE.set(
        Cache::builder()
            .max_capacity(10_000)
            .time_to_live(ttl)
            .build(),
    );
}

pub async fn get(id: u64) -> Option<LeaveType> {
    LEAVE_TYPE_CACHE.get()?.get(&id).await
}

pub async fn put(leave_type: &LeaveType) {
    if let Some(cache) = LEAVE_TYPE_CACHE.get() {
        cache.insert(leave_type.id, leave_type.clone()).await;
    }
}

pub async fn invalidate(id: u64) {
    if let Some(cache) = LEAVE_TYPE_CACHE.get() {
        cache.invalidate(&id).await;
    }
}

/// Load every active leave type into the cache
pub async fn warmup_policy_cache(pool: &MySqlPool) -> Result<()> {
    let mut stream = sqlx::query_as::<_, LeaveType>(
        r#"
        SELECT id, name, description, annual_quota, max_consecutive_days,
               carry_forward_enabled, max_carry_forward_days, requires_approval,
               advance_notice_days, is_active
        FROM leave_types
        WHERE is_active = TRUE
        "#,
    )
    .fetch(pool);

    let mut total_count = 0usize;
    while let Some(row) = stream.next().await {
        put(&row?).await;
        total_count += 1;
    }

    tracing::info!(leave_types = total_count, "Policy cache warmup complete");
    Ok(())
}
