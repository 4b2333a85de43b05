//! Security monitor: per-session record of security events and a rolling score.
//!
//! A monitor is created per session and passed explicitly to whatever logs
//! events. It keeps:
//! - the event log (bounded)
//! - active threats (medium and above) for one hour
//! - a 0–100 security score derived from the active threats
//! - recent transaction timestamps for burst detection
//!
//! State is in-memory only; a restart or `reset()` starts from a clean slate.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use sdai_common::config::AppConfig;
use sdai_common::types::{RiskAssessment, ThreatLevel};

/// Events older than this stop counting as active threats.
const THREAT_TTL_MINUTES: i64 = 60;

/// Transaction timestamps older than this are dropped.
const TX_HISTORY_MINUTES: i64 = 5;

/// Maximum number of events retained in the log.
const MAX_EVENTS: usize = 1_000;

/// Kinds of security events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityEventType {
    WalletConnected,
    TransactionInitiated,
    TransactionSucceeded,
    TransactionFailed,
    SuspiciousActivity,
    SecurityError,
    CdpNearLiquidation,
    LargeTransaction,
}

impl std::fmt::Display for SecurityEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecurityEventType::WalletConnected => write!(f, "wallet_connected"),
            SecurityEventType::TransactionInitiated => write!(f, "transaction_initiated"),
            SecurityEventType::TransactionSucceeded => write!(f, "transaction_succeeded"),
            SecurityEventType::TransactionFailed => write!(f, "transaction_failed"),
            SecurityEventType::SuspiciousActivity => write!(f, "suspicious_activity"),
            SecurityEventType::SecurityError => write!(f, "security_error"),
            SecurityEventType::CdpNearLiquidation => write!(f, "cdp_near_liquidation"),
            SecurityEventType::LargeTransaction => write!(f, "large_transaction"),
        }
    }
}

/// A logged security event.
#[derive(Debug, Clone, Serialize)]
pub struct SecurityEvent {
    pub id: Uuid,
    pub event_type: SecurityEventType,
    pub timestamp: DateTime<Utc>,
    pub data: serde_json::Value,
    /// Obfuscated wallet address, if the event concerns one
    pub wallet_address: Option<String>,
    pub threat_level: ThreatLevel,
    pub message: String,
}

/// Overall security status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityState {
    Secure,
    Warning,
    Alert,
}

/// Snapshot of the monitor's status.
#[derive(Debug, Clone, Serialize)]
pub struct SecurityStatus {
    pub status: SecurityState,
    pub last_checked: DateTime<Utc>,
    pub active_threats: Vec<SecurityEvent>,
    /// 0 (compromised) to 100 (no active threats)
    pub security_score: u8,
}

impl SecurityStatus {
    fn clean(now: DateTime<Utc>) -> Self {
        Self {
            status: SecurityState::Secure,
            last_checked: now,
            active_threats: Vec::new(),
            security_score: 100,
        }
    }
}

/// Per-session security monitor.
pub struct SecurityMonitor {
    events: VecDeque<SecurityEvent>,
    status: SecurityStatus,
    recent_transactions: VecDeque<DateTime<Utc>>,
    max_tx_per_minute: usize,
    large_tx_threshold: Decimal,
}

impl SecurityMonitor {
    pub fn new(
        max_tx_per_minute: usize,
        large_tx_threshold: Decimal,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            events: VecDeque::new(),
            status: SecurityStatus::clean(now),
            recent_transactions: VecDeque::new(),
            max_tx_per_minute,
            large_tx_threshold,
        }
    }

    pub fn from_config(config: &AppConfig, now: DateTime<Utc>) -> Self {
        Self::new(config.max_tx_per_minute, config.large_tx_threshold, now)
    }

    /// Record an event and recompute the status.
    pub fn log_event(
        &mut self,
        event_type: SecurityEventType,
        data: serde_json::Value,
        threat_level: ThreatLevel,
        message: impl Into<String>,
        wallet_address: Option<&str>,
        now: DateTime<Utc>,
    ) -> SecurityEvent {
        let event = SecurityEvent {
            id: Uuid::new_v4(),
            event_type,
            timestamp: now,
            data,
            wallet_address: wallet_address.map(obfuscate_wallet),
            threat_level,
            message: message.into(),
        };

        if threat_level >= ThreatLevel::High {
            tracing::warn!(
                event_type = %event.event_type,
                threat_level = %threat_level,
                wallet = event.wallet_address.as_deref().unwrap_or("-"),
                "{}",
                event.message
            );
        } else {
            tracing::debug!(
                event_type = %event.event_type,
                threat_level = %threat_level,
                "{}",
                event.message
            );
        }

        self.update_status(&event, now);

        if self.events.len() == MAX_EVENTS {
            self.events.pop_front();
        }
        self.events.push_back(event.clone());
        event
    }

    /// Check a transaction for bursts and unusually large amounts.
    ///
    /// Records the transaction. More than `max_tx_per_minute` within the last
    /// minute is unsafe; an amount above `large_tx_threshold` is allowed but
    /// flagged.
    pub fn check_transaction(&mut self, amount: Decimal, now: DateTime<Utc>) -> RiskAssessment {
        self.recent_transactions.push_back(now);

        let history_cutoff = now - Duration::minutes(TX_HISTORY_MINUTES);
        while self
            .recent_transactions
            .front()
            .is_some_and(|ts| *ts < history_cutoff)
        {
            self.recent_transactions.pop_front();
        }

        let minute_ago = now - Duration::minutes(1);
        let recent = self
            .recent_transactions
            .iter()
            .filter(|ts| **ts > minute_ago)
            .count();

        if recent > self.max_tx_per_minute {
            return RiskAssessment::new(
                false,
                ThreatLevel::High,
                format!(
                    "Too many transactions ({}) in the last minute. Potential DoS attack.",
                    recent
                ),
            );
        }

        if amount > self.large_tx_threshold {
            return RiskAssessment::new(
                true,
                ThreatLevel::Medium,
                format!(
                    "Large transaction detected ({}). Please verify this is intentional.",
                    amount
                ),
            );
        }

        RiskAssessment::new(true, ThreatLevel::Low, "Transaction appears secure")
    }

    pub fn status(&self) -> &SecurityStatus {
        &self.status
    }

    /// Events in the order they were logged.
    pub fn events(&self) -> impl DoubleEndedIterator<Item = &SecurityEvent> {
        self.events.iter()
    }

    /// Drop all events, threats and transaction history.
    pub fn reset(&mut self, now: DateTime<Utc>) {
        self.events.clear();
        self.recent_transactions.clear();
        self.status = SecurityStatus::clean(now);
        tracing::info!("Security monitor reset");
    }

    fn update_status(&mut self, event: &SecurityEvent, now: DateTime<Utc>) {
        let mut active_threats = std::mem::take(&mut self.status.active_threats);
        if event.threat_level != ThreatLevel::Low {
            active_threats.push(event.clone());
        }
        let ttl_cutoff = now - Duration::minutes(THREAT_TTL_MINUTES);
        active_threats.retain(|t| t.timestamp > ttl_cutoff);

        let score = security_score(&active_threats);
        let status = if score < 50 {
            SecurityState::Alert
        } else if score < 80 {
            SecurityState::Warning
        } else {
            SecurityState::Secure
        };

        self.status = SecurityStatus {
            status,
            last_checked: now,
            active_threats,
            security_score: score,
        };
    }
}

/// 100, minus 10 per active threat, minus a penalty for the worst threat.
fn security_score(active_threats: &[SecurityEvent]) -> u8 {
    let worst_penalty = match active_threats.iter().map(|t| t.threat_level).max() {
        Some(ThreatLevel::Critical) => 60,
        Some(ThreatLevel::High) => 30,
        Some(ThreatLevel::Medium) => 15,
        Some(ThreatLevel::Low) | None => 0,
    };
    let per_threat = (active_threats.len() as i64).saturating_mul(10);
    100_i64
        .saturating_sub(per_threat)
        .saturating_sub(worst_penalty)
        .clamp(0, 100) as u8
}

/// Per-identifier attempt limiter over a sliding time window.
pub struct RateLimiter {
    attempts: HashMap<String, AttemptState>,
    max_attempts: u32,
    window: Duration,
}

#[derive(Debug, Clone)]
struct AttemptState {
    count: u32,
    last_attempt: DateTime<Utc>,
}

impl RateLimiter {
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            attempts: HashMap::new(),
            max_attempts,
            window,
        }
    }

    /// Record an attempt and report whether it is within the limit.
    ///
    /// The count restarts once `window` has passed since the previous attempt.
    /// Identifiers idle for longer than `window` are forgotten.
    pub fn is_allowed(&mut self, identifier: &str, now: DateTime<Utc>) -> bool {
        let window = self.window;
        self.attempts.retain(|_, state| now - state.last_attempt <= window);

        let state = self
            .attempts
            .entry(identifier.to_string())
            .or_insert(AttemptState {
                count: 0,
                last_attempt: now,
            });

        state.count += 1;
        state.last_attempt = now;

        state.count <= self.max_attempts
    }

    /// Number of identifiers currently tracked (for monitoring).
    pub fn tracked_count(&self) -> usize {
        self.attempts.len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(5, Duration::minutes(1))
    }
}

/// Shorten a wallet address for logs: first 4 and last 4 characters.
pub fn obfuscate_wallet(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    } else {
        "****".to_string()
    }
}
