//! Simulated one-time-password verification.
//!
//! Sending and verifying each wait a fixed latency before resolving, standing
//! in for the network round-trip. Nothing can be cancelled and nothing retries.

use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use crate::validate;

pub const MAX_ATTEMPTS: u8 = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OtpError {
    #[error("invalid mobile number '{0}'")]
    InvalidPhone(String),

    #[error("no OTP has been sent")]
    NotSent,

    #[error("too many wrong attempts, request a new session")]
    Locked,

    #[error("already verified")]
    AlreadyVerified,

    #[error("incorrect OTP, {remaining} attempt(s) left")]
    Mismatch { remaining: u8 },

    #[error("input ended before the OTP was verified")]
    Abandoned,
}

/// Produces the 6-digit codes a session sends.
pub trait CodeSource {
    fn next_code(&mut self) -> String;
}

/// Deterministic code generator (64-bit LCG).
#[derive(Debug, Clone)]
pub struct SeededCodes {
    state: u64,
}

impl SeededCodes {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }
}

impl CodeSource for SeededCodes {
    fn next_code(&mut self) -> String {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        format!("{:06}", (self.state >> 33) % 1_000_000)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    Idle,
    Sent { code: String, remaining: u8 },
    Verified,
    Locked,
}

/// Externally visible session state; never exposes the code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpStatus {
    Idle,
    Sent { remaining: u8 },
    Verified,
    Locked,
}

pub struct OtpSession<C: CodeSource = SeededCodes> {
    phone: String,
    latency: Duration,
    state: State,
    codes: C,
}

impl<C: CodeSource> OtpSession<C> {
    pub fn new(phone: &str, latency: Duration, codes: C) -> Result<Self, OtpError> {
        let phone =
            validate::phone(phone).map_err(|_| OtpError::InvalidPhone(phone.to_string()))?;
        Ok(Self {
            phone,
            latency,
            state: State::Idle,
            codes,
        })
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn status(&self) -> OtpStatus {
        match &self.state {
            State::Idle => OtpStatus::Idle,
            State::Sent { remaining, .. } => OtpStatus::Sent {
                remaining: *remaining,
            },
            State::Verified => OtpStatus::Verified,
            State::Locked => OtpStatus::Locked,
        }
    }

    /// Issue a fresh code. A resend replaces the previous code and resets the
    /// attempt counter. Returns the code as the simulated SMS would show it.
    pub async fn send(&mut self) -> Result<String, OtpError> {
        match self.state {
            State::Verified => return Err(OtpError::AlreadyVerified),
            State::Locked => return Err(OtpError::Locked),
            State::Idle | State::Sent { .. } => {}
        }

        tokio::time::sleep(self.latency).await;

        let code = self.codes.next_code();
        self.state = State::Sent {
            code: code.clone(),
            remaining: MAX_ATTEMPTS,
        };
        info!(phone = %self.phone, "otp sent");
        Ok(code)
    }

    pub async fn verify(&mut self, input: &str) -> Result<(), OtpError> {
        let code = match &self.state {
            State::Idle => return Err(OtpError::NotSent),
            State::Verified => return Err(OtpError::AlreadyVerified),
            State::Locked => return Err(OtpError::Locked),
            State::Sent { code, .. } => code.clone(),
        };

        tokio::time::sleep(self.latency).await;

        if input.trim() == code {
            self.state = State::Verified;
            info!(phone = %self.phone, "otp verified");
            return Ok(());
        }

        let left = match &mut self.state {
            State::Sent { remaining, .. } => {
                *remaining -= 1;
                *remaining
            }
            _ => 0,
        };
        if left == 0 {
            self.state = State::Locked;
            warn!(phone = %self.phone, "otp locked after {MAX_ATTEMPTS} wrong attempts");
            return Err(OtpError::Locked);
        }
        warn!(phone = %self.phone, remaining = left, "otp mismatch");
        Err(OtpError::Mismatch { remaining: left })
    }
}
