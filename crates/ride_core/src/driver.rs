//! Driver dispatch simulator: `OFFLINE ⇄ ONLINE → BUSY → ONLINE`.
//!
//! While online with nothing pending and no active ride, the session keeps exactly
//! one dispatch timer armed; when it fires a synthetic [RideRequest] is offered.
//! [DriverSession::apply] is the only writer of [DriverStatus].

mod generator;

pub use generator::{RequestGenerator, PASSENGER_ROSTER};

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::clock::{DriverTimer, EventKind, SimulationClock, TimerId, TimerSlot};
use crate::geo::Location;
use crate::notifications::{NotificationKind, Notifications};
use crate::telemetry::{DriverLedger, DriverTripRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DriverStatus {
    Offline,
    Online,
    Busy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RideRequest {
    pub id: u64,
    pub passenger_name: String,
    pub rating: f64,
    pub origin: Location,
    pub destination: Location,
    /// Kz.
    pub price: i64,
    pub distance_km: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActiveRide {
    pub request: RideRequest,
    pub accepted_at: u64,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("driver is not online")]
    NotOnline,
    #[error("no pending ride request")]
    NoPendingRequest,
    #[error("request {id} is not the pending request")]
    UnknownRequest { id: u64 },
    #[error("no active ride to complete")]
    NoActiveRide,
    #[error("a ride is in progress")]
    RideInProgress,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DriverEvent {
    ToggleOnline,
    Accept(u64),
    Reject(u64),
    Complete,
    SetLocation(Location),
    /// A synthesized request handed to the session by the effect applier.
    Offer(RideRequest),
    Timer(DriverTimer),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DriverEffect {
    Notify {
        message: String,
        kind: NotificationKind,
    },
    /// Arm the dispatch timer with a freshly sampled delay.
    ScheduleRequest,
    ClearDispatchTimer,
    SynthesizeRequest,
    RequestGenerated,
    RequestAccepted,
    RequestRejected,
    RecordTrip(DriverTripRecord),
}

#[derive(Debug, Resource)]
pub struct DriverSession {
    status: DriverStatus,
    location: Location,
    pending_request: Option<RideRequest>,
    active_ride: Option<ActiveRide>,
    earnings: i64,
    dispatch_timer: TimerSlot,
}

impl DriverSession {
    pub fn new(location: Location, opening_earnings: i64) -> Self {
        Self {
            status: DriverStatus::Offline,
            location,
            pending_request: None,
            active_ride: None,
            earnings: opening_earnings,
            dispatch_timer: TimerSlot::default(),
        }
    }

    pub fn status(&self) -> DriverStatus {
        self.status
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn pending_request(&self) -> Option<&RideRequest> {
        self.pending_request.as_ref()
    }

    pub fn active_ride(&self) -> Option<&ActiveRide> {
        self.active_ride.as_ref()
    }

    /// Cumulative earnings in Kz, opening balance included.
    pub fn earnings(&self) -> i64 {
        self.earnings
    }

    pub fn dispatch_timer(&self) -> Option<TimerId> {
        self.dispatch_timer.id()
    }

    fn wants_dispatch(&self) -> bool {
        self.status == DriverStatus::Online
            && self.pending_request.is_none()
            && self.active_ride.is_none()
    }

    /// The single transition function. Refused intents leave the session untouched.
    pub fn apply(&mut self, event: DriverEvent, now: u64) -> Result<Vec<DriverEffect>, DispatchError> {
        let mut effects = Vec::new();
        match event {
            DriverEvent::ToggleOnline => self.toggle_online(&mut effects)?,
            DriverEvent::Accept(id) => self.accept(id, now, &mut effects)?,
            DriverEvent::Reject(id) => self.reject(id, &mut effects)?,
            DriverEvent::Complete => self.complete(now, &mut effects)?,
            DriverEvent::SetLocation(location) => {
                if location.is_in_range() {
                    self.location = location;
                } else {
                    warn!("ignoring invalid driver position, keeping last known");
                }
            }
            DriverEvent::Offer(request) => self.offer(request, &mut effects),
            DriverEvent::Timer(DriverTimer::DispatchRequest) => {
                if self.wants_dispatch() {
                    effects.push(DriverEffect::SynthesizeRequest);
                } else {
                    debug!(status = ?self.status, "dispatch timer fired with nothing to do");
                }
                return Ok(effects);
            }
        }
        self.reconcile(&mut effects);
        Ok(effects)
    }

    fn set_status(&mut self, next: DriverStatus) {
        if self.status != next {
            info!(from = ?self.status, to = ?next, "driver status changed");
            self.status = next;
        }
    }

    fn toggle_online(&mut self, effects: &mut Vec<DriverEffect>) -> Result<(), DispatchError> {
        match self.status {
            DriverStatus::Busy => return Err(DispatchError::RideInProgress),
            DriverStatus::Offline => {
                self.set_status(DriverStatus::Online);
                notify(effects, NotificationKind::Info, "Estás online. À procura de passageiros...");
            }
            DriverStatus::Online => {
                self.set_status(DriverStatus::Offline);
                notify(effects, NotificationKind::Info, "Estás offline.");
            }
        }
        self.pending_request = None;
        Ok(())
    }

    fn take_pending(&mut self, id: u64) -> Result<RideRequest, DispatchError> {
        let pending_id = self
            .pending_request
            .as_ref()
            .map(|request| request.id)
            .ok_or(DispatchError::NoPendingRequest)?;
        if pending_id != id {
            return Err(DispatchError::UnknownRequest { id });
        }
        self.pending_request.take().ok_or(DispatchError::NoPendingRequest)
    }

    fn accept(&mut self, id: u64, now: u64, effects: &mut Vec<DriverEffect>) -> Result<(), DispatchError> {
        if self.status != DriverStatus::Online {
            return Err(DispatchError::NotOnline);
        }
        let request = self.take_pending(id)?;
        notify(
            effects,
            NotificationKind::Success,
            format!("Viagem aceite! A caminho de {}.", request.passenger_name),
        );
        self.active_ride = Some(ActiveRide {
            request,
            accepted_at: now,
        });
        self.set_status(DriverStatus::Busy);
        effects.push(DriverEffect::RequestAccepted);
        Ok(())
    }

    fn reject(&mut self, id: u64, effects: &mut Vec<DriverEffect>) -> Result<(), DispatchError> {
        if self.status != DriverStatus::Online {
            return Err(DispatchError::NotOnline);
        }
        let request = self.take_pending(id)?;
        debug!(request = request.id, "request rejected");
        effects.push(DriverEffect::RequestRejected);
        Ok(())
    }

    fn complete(&mut self, now: u64, effects: &mut Vec<DriverEffect>) -> Result<(), DispatchError> {
        let ride = self.active_ride.take().ok_or(DispatchError::NoActiveRide)?;
        let price = ride.request.price;
        self.earnings += price;
        self.set_status(DriverStatus::Online);
        notify(
            effects,
            NotificationKind::Success,
            format!("Viagem finalizada! Recebeste {price} Kz."),
        );
        effects.push(DriverEffect::RecordTrip(DriverTripRecord {
            request_id: ride.request.id,
            passenger_name: ride.request.passenger_name,
            fare_kz: price,
            distance_km: ride.request.distance_km,
            accepted_at: ride.accepted_at,
            completed_at: now,
        }));
        Ok(())
    }

    fn offer(&mut self, request: RideRequest, effects: &mut Vec<DriverEffect>) {
        if !self.wants_dispatch() {
            debug!(request = request.id, "dropping request offered while unavailable");
            return;
        }
        notify(
            effects,
            NotificationKind::Info,
            format!("Novo pedido de {}: {} Kz", request.passenger_name, request.price),
        );
        self.pending_request = Some(request);
        effects.push(DriverEffect::RequestGenerated);
    }

    /// Keep the dispatch timer armed exactly while a request may be generated.
    fn reconcile(&self, effects: &mut Vec<DriverEffect>) {
        if self.wants_dispatch() {
            if !self.dispatch_timer.is_armed() {
                effects.push(DriverEffect::ScheduleRequest);
            }
        } else if self.dispatch_timer.is_armed() {
            effects.push(DriverEffect::ClearDispatchTimer);
        }
    }
}

fn notify(effects: &mut Vec<DriverEffect>, kind: NotificationKind, message: impl Into<String>) {
    effects.push(DriverEffect::Notify {
        message: message.into(),
        kind,
    });
}

/// Borrowed driver-world resources that driver effects are carried out against.
pub struct DriverContext<'a> {
    pub clock: &'a mut SimulationClock,
    pub notifications: &'a mut Notifications,
    pub ledger: &'a mut DriverLedger,
    pub generator: &'a mut RequestGenerator,
}

impl DriverContext<'_> {
    pub fn dispatch(&mut self, session: &mut DriverSession, event: DriverEvent) -> Result<(), DispatchError> {
        let effects = session.apply(event, self.clock.now())?;
        for effect in effects {
            self.execute(session, effect);
        }
        Ok(())
    }

    /// Deliver a popped dispatch timer; superseded handles are dropped.
    pub fn fire(&mut self, session: &mut DriverSession, id: TimerId, timer: DriverTimer) {
        if !session.dispatch_timer.release_fired(id) {
            debug!(?timer, ?id, "dropping stale driver timer");
            return;
        }
        if let Err(err) = self.dispatch(session, DriverEvent::Timer(timer)) {
            warn!(error = %err, "dispatch timer refused");
        }
    }

    fn schedule_request(&mut self, session: &mut DriverSession) {
        let delay_ms = self.generator.sample_delay_ms();
        let id = session.dispatch_timer.arm(
            self.clock,
            delay_ms,
            EventKind::Driver(DriverTimer::DispatchRequest),
        );
        debug!(?id, delay_ms, "dispatch timer armed");
    }

    fn execute(&mut self, session: &mut DriverSession, effect: DriverEffect) {
        match effect {
            DriverEffect::Notify { message, kind } => {
                self.notifications.emit(self.clock, message, kind);
            }
            DriverEffect::ScheduleRequest => self.schedule_request(session),
            DriverEffect::ClearDispatchTimer => {
                if session.dispatch_timer.disarm(self.clock) {
                    debug!("dispatch timer cancelled");
                }
            }
            DriverEffect::SynthesizeRequest => match self.generator.synthesize(&session.location) {
                Some(request) => {
                    if let Err(err) = self.dispatch(session, DriverEvent::Offer(request)) {
                        warn!(error = %err, "synthesized request refused");
                    }
                }
                None => {
                    warn!("synthesized request had invalid coordinates, re-arming");
                    self.schedule_request(session);
                }
            },
            DriverEffect::RequestGenerated => self.ledger.requests_generated += 1,
            DriverEffect::RequestAccepted => self.ledger.requests_accepted += 1,
            DriverEffect::RequestRejected => self.ledger.requests_rejected += 1,
            DriverEffect::RecordTrip(trip) => self.ledger.trips.push(trip),
        }
    }
}
