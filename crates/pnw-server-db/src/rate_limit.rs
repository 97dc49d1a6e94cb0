// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Sliding-window request counting.
//!
//! Each key keeps one row per fixed window. A hit increments the current
//! window atomically and weights the previous window by how much of it still
//! overlaps the sliding window:
//!
//! `estimate = previous × (1 − elapsed / window) + current`

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqlitePool, Row};

use crate::error::DbError;

/// Result of recording one request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimitHit {
	pub current: i64,
	pub previous: i64,
	pub estimate: f64,
	/// Seconds until the current fixed window rolls over.
	pub reset_after_secs: u64,
}

impl RateLimitHit {
	pub fn exceeds(&self, max_requests: u32) -> bool {
		self.estimate > f64::from(max_requests)
	}
}

#[async_trait]
pub trait RateLimitStore: Send + Sync {
	async fn hit(
		&self,
		key: &str,
		now: DateTime<Utc>,
		window_secs: u64,
	) -> Result<RateLimitHit, DbError>;
}

#[async_trait]
impl RateLimitStore for RateLimitRepository {
	async fn hit(
		&self,
		key: &str,
		now: DateTime<Utc>,
		window_secs: u64,
	) -> Result<RateLimitHit, DbError> {
		self.hit(key, now, window_secs).await
	}
}

#[derive(Clone)]
pub struct RateLimitRepository {
	pool: SqlitePool,
}

impl RateLimitRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Record one request for `key` and return the sliding estimate.
	#[tracing::instrument(skip(self), fields(key = %key))]
	pub async fn hit(
		&self,
		key: &str,
		now: DateTime<Utc>,
		window_secs: u64,
	) -> Result<RateLimitHit, DbError> {
		if window_secs == 0 {
			return Err(DbError::Internal("rate limit window must be > 0".to_string()));
		}
		let window = i64::try_from(window_secs)
			.map_err(|_| DbError::Internal("rate limit window too large".to_string()))?;
		let now_secs = now.timestamp();
		let window_start = now_secs - now_secs.rem_euclid(window);
		let previous_start = window_start - window;

		let current: i64 = sqlx::query(
			r#"
			INSERT INTO rate_limits (key, window_start, count) VALUES (?, ?, 1)
			ON CONFLICT (key, window_start) DO UPDATE SET count = count + 1
			RETURNING count
			"#,
		)
		.bind(key)
		.bind(window_start)
		.fetch_one(&self.pool)
		.await?
		.get("count");

		let previous: i64 = sqlx::query(
			"SELECT count FROM rate_limits WHERE key = ? AND window_start = ?",
		)
		.bind(key)
		.bind(previous_start)
		.fetch_optional(&self.pool)
		.await?
		.map(|row| row.get("count"))
		.unwrap_or(0);

		sqlx::query("DELETE FROM rate_limits WHERE key = ? AND window_start < ?")
			.bind(key)
			.bind(previous_start)
			.execute(&self.pool)
			.await?;

		let elapsed = (now_secs - window_start) as f64;
		let estimate = sliding_estimate(previous, current, elapsed, window as f64);

		tracing::trace!(current, previous, estimate, "rate limit hit recorded");
		Ok(RateLimitHit {
			current,
			previous,
			estimate,
			reset_after_secs: (window_start + window - now_secs).max(0) as u64,
		})
	}

	/// Delete every window that can no longer affect an estimate.
	#[tracing::instrument(skip(self))]
	pub async fn prune_expired(
		&self,
		now: DateTime<Utc>,
		window_secs: u64,
	) -> Result<u64, DbError> {
		let window = i64::try_from(window_secs.max(1))
			.map_err(|_| DbError::Internal("rate limit window too large".to_string()))?;
		let now_secs = now.timestamp();
		let cutoff = now_secs - now_secs.rem_euclid(window) - window;

		let result = sqlx::query("DELETE FROM rate_limits WHERE window_start < ?")
			.bind(cutoff)
			.execute(&self.pool)
			.await?;
		Ok(result.rows_affected())
	}
}

pub fn sliding_estimate(previous: i64, current: i64, elapsed_secs: f64, window_secs: f64) -> f64 {
	let overlap = (1.0 - elapsed_secs / window_secs).clamp(0.0, 1.0);
	previous as f64 * overlap + current as f64
}
