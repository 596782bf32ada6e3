//! Probe and announce state machine (RFC 6762 §8).
//!
//! `transition` is pure: it decides what to send next and when, and the
//! publish engine carries the decision out.

use std::fmt;
use std::time::Duration;

pub const PROBE_COUNT: u8 = 3;
pub const PROBE_INTERVAL: Duration = Duration::from_millis(250);
pub const ANNOUNCE_COUNT: u8 = 3;
/// Gap after the first announcement; each later gap doubles.
pub const ANNOUNCE_INTERVAL: Duration = Duration::from_secs(1);
pub const SEND_RETRY_INTERVAL: Duration = Duration::from_secs(1);
/// Upper bound of the random delay before the first probe.
pub const MAX_INITIAL_DELAY: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishState {
    Initial,
    Probe,
    Announce,
    Done,
}

impl fmt::Display for PublishState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PublishState::Initial => "initial",
            PublishState::Probe => "probe",
            PublishState::Announce => "announce",
            PublishState::Done => "done",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishEvent {
    Timer,
    /// Someone else holds different data for one of our unique records.
    Conflict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Packet {
    Probe,
    Announce,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub state: PublishState,
    pub sent: u8,
    pub send: Option<Packet>,
    /// Pick a new name before the next probe.
    pub rename: bool,
    /// When to fire the next timer; `None` leaves the set idle.
    pub next: Option<Duration>,
}

pub fn transition(state: PublishState, sent: u8, event: PublishEvent) -> Step {
    use PublishState::*;

    match (state, event) {
        (Initial | Probe, PublishEvent::Conflict) => Step {
            state: Probe,
            sent: 0,
            send: None,
            rename: true,
            next: Some(PROBE_INTERVAL),
        },
        (Announce | Done, PublishEvent::Conflict) => Step {
            state: Probe,
            sent: 0,
            send: None,
            rename: false,
            next: Some(PROBE_INTERVAL),
        },
        (Initial, PublishEvent::Timer) => probe(1),
        (Probe, PublishEvent::Timer) if sent < PROBE_COUNT => probe(sent + 1),
        (Probe, PublishEvent::Timer) => announce(1),
        (Announce, PublishEvent::Timer) if sent < ANNOUNCE_COUNT => announce(sent + 1),
        (Announce | Done, PublishEvent::Timer) => Step {
            state: Done,
            sent,
            send: None,
            rename: false,
            next: None,
        },
    }
}

fn probe(nth: u8) -> Step {
    Step {
        state: PublishState::Probe,
        sent: nth,
        send: Some(Packet::Probe),
        rename: false,
        next: Some(PROBE_INTERVAL),
    }
}

fn announce(nth: u8) -> Step {
    if nth >= ANNOUNCE_COUNT {
        return Step {
            state: PublishState::Done,
            sent: nth,
            send: Some(Packet::Announce),
            rename: false,
            next: None,
        };
    }
    Step {
        state: PublishState::Announce,
        sent: nth,
        send: Some(Packet::Announce),
        rename: false,
        next: Some(ANNOUNCE_INTERVAL * (1u32 << (nth - 1))),
    }
}
