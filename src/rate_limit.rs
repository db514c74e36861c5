//! Rate limiting
//!
//! Two fixed-window counters guard the login route: [`LoginAttempts`] counts
//! failed logins per email, [`FixedWindowLimiter`] counts requests per client
//! address. Both keep their state in memory and are purged periodically.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Failed logins allowed per email before further attempts are refused
pub const MAX_LOGIN_ATTEMPTS: u32 = 5;

/// How long failed attempts are remembered after the most recent one
pub const LOGIN_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Requests per client address allowed in one window on the login route
pub const LOGIN_REQUESTS_PER_WINDOW: u32 = 5;

/// Length of the per-address window
pub const LOGIN_REQUEST_WINDOW: Duration = Duration::from_secs(15 * 60);

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Clone, Copy)]
struct AttemptRecord {
    attempts: u32,
    last_attempt: Instant,
}

/// Failed login attempts per email
#[derive(Debug)]
pub struct LoginAttempts {
    max_attempts: u32,
    timeout: Duration,
    records: Mutex<HashMap<String, AttemptRecord>>,
}

impl Default for LoginAttempts {
    fn default() -> Self {
        Self::new(MAX_LOGIN_ATTEMPTS, LOGIN_ATTEMPT_TIMEOUT)
    }
}

impl LoginAttempts {
    pub fn new(max_attempts: u32, timeout: Duration) -> Self {
        Self { max_attempts, timeout, records: Mutex::new(HashMap::new()) }
    }

    /// Whether `email` may try to log in now
    pub fn is_allowed(&self, email: &str) -> bool {
        self.is_allowed_at(email, Instant::now())
    }

    /// Whether `email` may try to log in at `now`
    ///
    /// A record older than the timeout is forgotten and the email is allowed
    /// again.
    pub fn is_allowed_at(&self, email: &str, now: Instant) -> bool {
        let mut records = lock(&self.records);
        let Some(record) = records.get(email).copied() else {
            return true;
        };

        if now.saturating_duration_since(record.last_attempt) > self.timeout {
            records.remove(email);
            return true;
        }

        record.attempts < self.max_attempts
    }

    /// Counts a failed login for `email`
    pub fn record_failure(&self, email: &str) {
        self.record_failure_at(email, Instant::now());
    }

    pub fn record_failure_at(&self, email: &str, now: Instant) {
        let mut records = lock(&self.records);
        records
            .entry(email.to_string())
            .and_modify(|record| {
                record.attempts += 1;
                record.last_attempt = now;
            })
            .or_insert(AttemptRecord { attempts: 1, last_attempt: now });
    }

    /// Forgets the failures of `email`, after it logged in successfully
    pub fn reset(&self, email: &str) {
        lock(&self.records).remove(email);
    }

    /// Number of failures currently counted for `email`
    pub fn attempts(&self, email: &str) -> u32 {
        lock(&self.records).get(email).map_or(0, |record| record.attempts)
    }

    /// Drops every expired record and returns how many were removed
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    pub fn purge_expired_at(&self, now: Instant) -> usize {
        let mut records = lock(&self.records);
        let before = records.len();
        records.retain(|_, record| now.saturating_duration_since(record.last_attempt) <= self.timeout);
        before - records.len()
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Fixed-window request counter keyed by an arbitrary string
#[derive(Debug)]
pub struct FixedWindowLimiter {
    max_requests: u32,
    window: Duration,
    windows: Mutex<HashMap<String, Window>>,
}

impl Default for FixedWindowLimiter {
    fn default() -> Self {
        Self::new(LOGIN_REQUESTS_PER_WINDOW, LOGIN_REQUEST_WINDOW)
    }
}

impl FixedWindowLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self { max_requests, window, windows: Mutex::new(HashMap::new()) }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Counts one request for `key`
    ///
    /// ### Returns
    ///
    /// `Ok(())` if the request is within the limit, otherwise the time until
    /// the current window ends
    pub fn check(&self, key: &str) -> Result<(), Duration> {
        self.check_at(key, Instant::now())
    }

    pub fn check_at(&self, key: &str, now: Instant) -> Result<(), Duration> {
        let mut windows = lock(&self.windows);
        let window = windows
            .entry(key.to_string())
            .or_insert(Window { started: now, count: 0 });

        if now.saturating_duration_since(window.started) >= self.window {
            *window = Window { started: now, count: 0 };
        }

        if window.count >= self.max_requests {
            let elapsed = now.saturating_duration_since(window.started);
            return Err(self.window.saturating_sub(elapsed));
        }

        window.count += 1;
        Ok(())
    }

    /// Drops every window that has ended and returns how many were removed
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    pub fn purge_expired_at(&self, now: Instant) -> usize {
        let mut windows = lock(&self.windows);
        let before = windows.len();
        windows.retain(|_, window| now.saturating_duration_since(window.started) < self.window);
        before - windows.len()
    }
}
