//! Passenger ride lifecycle: `IDLE → CHOOSING_DESTINATION → REQUESTING → MATCHED →
//! IN_PROGRESS → COMPLETED → IDLE`.
//!
//! [PassengerSession::apply] is the only function that writes [RideStatus]. It
//! mutates the session and returns [Effect]s; timers, notifications, tips and
//! history writes are carried out by [PassengerContext]. A phase owns at most one
//! timer, held in a [TimerSlot](crate::clock::TimerSlot) that is torn down before
//! it is re-armed.

mod effects;

pub use effects::PassengerContext;

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::clock::{PassengerTimer, TimerId, TimerSlot};
use crate::config::SimConfig;
use crate::geo::{distance_km, is_valid_location, Location};
use crate::movement::{StepOutcome, TickProfile};
use crate::notifications::NotificationKind;
use crate::pricing::{default_option, estimate_base_fare, fare_for_option, find_option, RideOption};
use crate::telemetry::{RideOutcome, RideRecord};

const MSG_INVALID_LOCATION: &str = "Localização inválida. Tente novamente.";
const MSG_CANCELLED: &str = "Viagem cancelada.";
const MSG_CANNOT_CANCEL: &str = "A viagem já terminou, não é possível cancelar.";
const MSG_OPTION_LOCKED: &str = "Não é possível mudar de categoria durante a viagem.";
const MSG_DESTINATION_REACHED: &str = "Chegaste ao destino!";
const MSG_MUSIC_CONNECTED: &str = "Conectado! Tu controlas o som.";
const MSG_QUIET_UPDATED: &str = "Modo silêncio atualizado.";
const MSG_AC_REQUESTED: &str = "Ar condicionado solicitado.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RideStatus {
    Idle,
    ChoosingDestination,
    Requesting,
    Matched,
    InProgress,
    Completed,
}

impl RideStatus {
    /// A ride has been requested and not yet finished.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Requesting | Self::Matched | Self::InProgress)
    }

    pub fn accepts_destination(self) -> bool {
        matches!(self, Self::Idle | Self::ChoosingDestination)
    }
}

impl PassengerTimer {
    /// Status the timer belongs to; `None` for timers outside the phase slot.
    pub fn phase(self) -> Option<RideStatus> {
        match self {
            Self::MatchFound => Some(RideStatus::Requesting),
            Self::ApproachTick => Some(RideStatus::Matched),
            Self::EnRouteTick => Some(RideStatus::InProgress),
            Self::ResetAfterCompletion => Some(RideStatus::Completed),
            Self::MusicConnected => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RidePreferences {
    pub quiet: bool,
    pub ac: bool,
    pub music: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preference {
    Quiet,
    Ac,
    Music,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    Home,
    Work,
}

impl Shortcut {
    /// Offset from the passenger location in degrees `(lat, lng)`.
    pub fn offset(self) -> (f64, f64) {
        match self {
            Self::Home => (0.01, 0.01),
            Self::Work => (-0.01, -0.005),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Home => "Casa",
            Self::Work => "Trabalho",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PassengerEvent {
    SelectPoint(Location),
    Shortcut(Shortcut),
    EnterDestinationMode,
    SelectOption(String),
    RequestRide,
    Cancel,
    TogglePreference(Preference),
    SetUserLocation(Location),
    Timer(PassengerTimer),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Notify {
        message: String,
        kind: NotificationKind,
    },
    /// Replace the phase timer; the previous handle is cancelled first.
    ArmPhaseTimer {
        timer: PassengerTimer,
        delay_ms: u64,
    },
    ClearPhaseTimer,
    ArmMusicTimer {
        delay_ms: u64,
    },
    CancelMusicTimer,
    RequestTip,
    RecordRide(RideRecord),
}

pub struct TransitionContext<'a> {
    pub now: u64,
    pub config: &'a SimConfig,
}

#[derive(Debug, Resource)]
pub struct PassengerSession {
    status: RideStatus,
    user_location: Location,
    destination: Option<Location>,
    /// Simulated proxy of the matched driver; not shared with any driver session.
    driver_location: Option<Location>,
    selected_option: &'static RideOption,
    price_estimate: i64,
    quoted_fare: Option<i64>,
    preferences: RidePreferences,
    music_playing: bool,
    ride_tip: Option<String>,
    phase_timer: TimerSlot,
    music_timer: TimerSlot,
    requested_at: Option<u64>,
    matched_at: Option<u64>,
    pickup_at: Option<u64>,
}

impl PassengerSession {
    pub fn new(user_location: Location) -> Self {
        Self {
            status: RideStatus::Idle,
            user_location,
            destination: None,
            driver_location: None,
            selected_option: default_option(),
            price_estimate: 0,
            quoted_fare: None,
            preferences: RidePreferences::default(),
            music_playing: false,
            ride_tip: None,
            phase_timer: TimerSlot::default(),
            music_timer: TimerSlot::default(),
            requested_at: None,
            matched_at: None,
            pickup_at: None,
        }
    }

    pub fn status(&self) -> RideStatus {
        self.status
    }

    pub fn user_location(&self) -> &Location {
        &self.user_location
    }

    pub fn destination(&self) -> Option<&Location> {
        self.destination.as_ref()
    }

    pub fn driver_location(&self) -> Option<&Location> {
        self.driver_location.as_ref()
    }

    pub fn selected_option(&self) -> &'static RideOption {
        self.selected_option
    }

    /// Distance-derived base price; 0 until a destination is set.
    pub fn price_estimate(&self) -> i64 {
        self.price_estimate
    }

    /// Price for the selected option. Locked at request time for the active ride.
    pub fn quoted_price(&self) -> i64 {
        self.quoted_fare
            .unwrap_or_else(|| fare_for_option(self.price_estimate, self.selected_option))
    }

    pub fn preferences(&self) -> RidePreferences {
        self.preferences
    }

    pub fn music_playing(&self) -> bool {
        self.music_playing
    }

    pub fn ride_tip(&self) -> Option<&str> {
        self.ride_tip.as_deref()
    }

    pub fn phase_timer(&self) -> Option<TimerId> {
        self.phase_timer.id()
    }

    pub fn music_timer(&self) -> Option<TimerId> {
        self.music_timer.id()
    }

    /// The single transition function. Mutates the session and returns the side effects to run.
    pub fn apply(&mut self, event: PassengerEvent, ctx: &TransitionContext<'_>) -> Vec<Effect> {
        let mut effects = Vec::new();
        match event {
            PassengerEvent::SelectPoint(point) => self.select_point(point, &mut effects),
            PassengerEvent::Shortcut(shortcut) => self.select_shortcut(shortcut, &mut effects),
            PassengerEvent::EnterDestinationMode => self.enter_destination_mode(),
            PassengerEvent::SelectOption(id) => self.select_option(&id, &mut effects),
            PassengerEvent::RequestRide => self.request_ride(ctx, &mut effects),
            PassengerEvent::Cancel => self.cancel(ctx, &mut effects),
            PassengerEvent::TogglePreference(preference) => {
                self.toggle_preference(preference, ctx, &mut effects)
            }
            PassengerEvent::SetUserLocation(location) => self.set_user_location(location, &mut effects),
            PassengerEvent::Timer(timer) => self.on_timer(timer, ctx, &mut effects),
        }
        effects
    }

    fn set_status(&mut self, next: RideStatus) {
        if self.status != next {
            info!(from = ?self.status, to = ?next, "passenger status changed");
            self.status = next;
        }
    }

    fn recompute_estimate(&mut self) {
        if let Some(destination) = &self.destination {
            if self.user_location.is_valid() && destination.is_valid() {
                self.price_estimate =
                    estimate_base_fare(distance_km(&self.user_location, destination));
            }
        }
    }

    fn set_destination(&mut self, destination: Location, effects: &mut Vec<Effect>) {
        self.destination = Some(destination);
        self.recompute_estimate();
        self.set_status(RideStatus::ChoosingDestination);
        effects.push(Effect::RequestTip);
    }

    fn select_point(&mut self, point: Location, effects: &mut Vec<Effect>) {
        if !point.is_in_range() {
            warn!(lat = point.lat, lng = point.lng, "rejecting invalid destination point");
            notify(effects, NotificationKind::Warning, MSG_INVALID_LOCATION);
            return;
        }
        if !self.status.accepts_destination() {
            debug!(status = ?self.status, "ignoring map selection outside destination choice");
            return;
        }
        self.set_destination(point, effects);
    }

    fn select_shortcut(&mut self, shortcut: Shortcut, effects: &mut Vec<Effect>) {
        if !self.status.accepts_destination() {
            debug!(status = ?self.status, ?shortcut, "ignoring shortcut outside destination choice");
            return;
        }
        let (dlat, dlng) = shortcut.offset();
        let destination = self
            .user_location
            .offset(dlat, dlng)
            .with_address(shortcut.label());
        if !self.user_location.is_in_range() || !destination.is_in_range() {
            warn!(?shortcut, "shortcut destination falls outside the globe");
            notify(effects, NotificationKind::Warning, MSG_INVALID_LOCATION);
            return;
        }
        self.set_destination(destination, effects);
    }

    fn enter_destination_mode(&mut self) {
        if self.status == RideStatus::Idle {
            self.set_status(RideStatus::ChoosingDestination);
        }
    }

    fn select_option(&mut self, id: &str, effects: &mut Vec<Effect>) {
        let Some(option) = find_option(id) else {
            notify(
                effects,
                NotificationKind::Warning,
                format!("Opção de viagem desconhecida: {id}"),
            );
            return;
        };
        if !self.status.accepts_destination() {
            notify(effects, NotificationKind::Warning, MSG_OPTION_LOCKED);
            return;
        }
        self.selected_option = option;
    }

    fn request_ride(&mut self, ctx: &TransitionContext<'_>, effects: &mut Vec<Effect>) {
        if !self.status.accepts_destination() {
            debug!(status = ?self.status, "ride already requested");
            return;
        }
        if !self.user_location.is_valid() || !is_valid_location(self.destination.as_ref()) {
            warn!(status = ?self.status, "ride request refused: missing or invalid location");
            notify(effects, NotificationKind::Warning, MSG_INVALID_LOCATION);
            return;
        }
        self.recompute_estimate();
        self.quoted_fare = Some(fare_for_option(self.price_estimate, self.selected_option));
        self.requested_at = Some(ctx.now);
        self.set_status(RideStatus::Requesting);
        effects.push(Effect::ArmPhaseTimer {
            timer: PassengerTimer::MatchFound,
            delay_ms: ctx.config.match_delay_ms,
        });
    }

    fn cancel(&mut self, ctx: &TransitionContext<'_>, effects: &mut Vec<Effect>) {
        match self.status {
            RideStatus::Idle => {
                debug!("nothing to cancel");
            }
            RideStatus::Completed => {
                notify(effects, NotificationKind::Warning, MSG_CANNOT_CANCEL);
            }
            RideStatus::ChoosingDestination => {
                self.end_ride(effects);
                notify(effects, NotificationKind::Warning, MSG_CANCELLED);
            }
            RideStatus::Requesting | RideStatus::Matched | RideStatus::InProgress => {
                effects.push(Effect::RecordRide(self.ride_record(RideOutcome::Cancelled, ctx.now)));
                self.end_ride(effects);
                notify(effects, NotificationKind::Warning, MSG_CANCELLED);
            }
        }
    }

    fn toggle_preference(
        &mut self,
        preference: Preference,
        ctx: &TransitionContext<'_>,
        effects: &mut Vec<Effect>,
    ) {
        match preference {
            Preference::Music => {
                self.preferences.music = !self.preferences.music;
                if self.preferences.music {
                    notify(
                        effects,
                        NotificationKind::Info,
                        format!("{} DJ: A conectar ao carro...", ctx.config.brand),
                    );
                    effects.push(Effect::ArmMusicTimer {
                        delay_ms: ctx.config.music_handshake_ms,
                    });
                } else {
                    self.music_playing = false;
                    effects.push(Effect::CancelMusicTimer);
                }
            }
            Preference::Quiet => {
                self.preferences.quiet = !self.preferences.quiet;
                if self.status == RideStatus::InProgress {
                    notify(effects, NotificationKind::Info, MSG_QUIET_UPDATED);
                }
            }
            Preference::Ac => {
                self.preferences.ac = !self.preferences.ac;
                if self.status == RideStatus::InProgress {
                    notify(effects, NotificationKind::Info, MSG_AC_REQUESTED);
                }
            }
        }
    }

    fn set_user_location(&mut self, location: Location, effects: &mut Vec<Effect>) {
        if !location.is_in_range() {
            warn!(lat = location.lat, lng = location.lng, "ignoring invalid passenger position, keeping last known");
            notify(effects, NotificationKind::Warning, MSG_INVALID_LOCATION);
            return;
        }
        self.user_location = location;
        self.recompute_estimate();
    }

    fn on_timer(&mut self, timer: PassengerTimer, ctx: &TransitionContext<'_>, effects: &mut Vec<Effect>) {
        if let Some(phase) = timer.phase() {
            if phase != self.status {
                debug!(?timer, status = ?self.status, "timer does not belong to current phase");
                return;
            }
        }
        match timer {
            PassengerTimer::MatchFound => self.on_match_found(ctx, effects),
            PassengerTimer::ApproachTick => self.on_approach_tick(ctx, effects),
            PassengerTimer::EnRouteTick => self.on_en_route_tick(ctx, effects),
            PassengerTimer::ResetAfterCompletion => {
                self.end_ride(effects);
                notify(
                    effects,
                    NotificationKind::Success,
                    format!("Viagem finalizada! Obrigado por viajares com a {}.", ctx.config.brand),
                );
            }
            PassengerTimer::MusicConnected => {
                if self.preferences.music {
                    self.music_playing = true;
                    notify(effects, NotificationKind::Success, MSG_MUSIC_CONNECTED);
                }
            }
        }
    }

    fn on_match_found(&mut self, ctx: &TransitionContext<'_>, effects: &mut Vec<Effect>) {
        if !self.user_location.is_valid() {
            notify(effects, NotificationKind::Warning, MSG_INVALID_LOCATION);
            effects.push(Effect::ArmPhaseTimer {
                timer: PassengerTimer::MatchFound,
                delay_ms: ctx.config.tick_ms,
            });
            return;
        }
        let offset = ctx.config.match_offset_deg;
        let driver = self.user_location.offset(offset, offset);
        if !driver.is_in_range() {
            warn!(offset, "matched driver position is not a valid coordinate, retrying");
            notify(effects, NotificationKind::Warning, MSG_INVALID_LOCATION);
            effects.push(Effect::ArmPhaseTimer {
                timer: PassengerTimer::MatchFound,
                delay_ms: ctx.config.tick_ms,
            });
            return;
        }
        self.driver_location = Some(driver);
        self.matched_at = Some(ctx.now);
        self.set_status(RideStatus::Matched);
        notify(
            effects,
            NotificationKind::Success,
            format!(
                "{} a caminho! {} aceitou o pedido.",
                ctx.config.brand, ctx.config.matched_driver.name
            ),
        );
        effects.push(Effect::ArmPhaseTimer {
            timer: PassengerTimer::ApproachTick,
            delay_ms: ctx.config.tick_ms,
        });
    }

    fn on_approach_tick(&mut self, ctx: &TransitionContext<'_>, effects: &mut Vec<Effect>) {
        let profile = TickProfile::approach(ctx.config);
        let rearm = Effect::ArmPhaseTimer {
            timer: PassengerTimer::ApproachTick,
            delay_ms: profile.interval_ms,
        };
        let Some(driver) = &self.driver_location else {
            effects.push(rearm);
            return;
        };
        match profile.step(driver, &self.user_location) {
            StepOutcome::Arrived(pickup) => {
                self.driver_location = Some(pickup);
                self.pickup_at = Some(ctx.now);
                self.set_status(RideStatus::InProgress);
                notify(
                    effects,
                    NotificationKind::Info,
                    format!("O teu {} chegou! Podes entrar.", ctx.config.brand),
                );
                effects.push(Effect::ArmPhaseTimer {
                    timer: PassengerTimer::EnRouteTick,
                    delay_ms: ctx.config.tick_ms,
                });
            }
            StepOutcome::Moved(next) => {
                self.driver_location = Some(next);
                effects.push(rearm);
            }
            StepOutcome::Held => {
                debug!("approach step discarded, keeping previous driver position");
                effects.push(rearm);
            }
        }
    }

    fn on_en_route_tick(&mut self, ctx: &TransitionContext<'_>, effects: &mut Vec<Effect>) {
        let profile = TickProfile::en_route(ctx.config);
        let rearm = Effect::ArmPhaseTimer {
            timer: PassengerTimer::EnRouteTick,
            delay_ms: profile.interval_ms,
        };
        let (Some(driver), Some(destination)) = (&self.driver_location, &self.destination) else {
            effects.push(rearm);
            return;
        };
        match profile.step(driver, destination) {
            StepOutcome::Arrived(dropoff) => {
                self.driver_location = Some(dropoff);
                self.set_status(RideStatus::Completed);
                notify(effects, NotificationKind::Success, MSG_DESTINATION_REACHED);
                effects.push(Effect::RecordRide(self.ride_record(RideOutcome::Completed, ctx.now)));
                effects.push(Effect::ArmPhaseTimer {
                    timer: PassengerTimer::ResetAfterCompletion,
                    delay_ms: ctx.config.completion_reset_ms,
                });
            }
            StepOutcome::Moved(next) => {
                self.driver_location = Some(next);
                effects.push(rearm);
            }
            StepOutcome::Held => {
                debug!("en-route step discarded, keeping previous driver position");
                effects.push(rearm);
            }
        }
    }

    /// Back to `IDLE` with every ride field at its default.
    fn end_ride(&mut self, effects: &mut Vec<Effect>) {
        self.set_status(RideStatus::Idle);
        self.destination = None;
        self.driver_location = None;
        self.price_estimate = 0;
        self.quoted_fare = None;
        self.preferences = RidePreferences::default();
        self.music_playing = false;
        self.ride_tip = None;
        self.requested_at = None;
        self.matched_at = None;
        self.pickup_at = None;
        effects.push(Effect::ClearPhaseTimer);
        effects.push(Effect::CancelMusicTimer);
    }

    fn ride_record(&self, outcome: RideOutcome, now: u64) -> RideRecord {
        RideRecord {
            outcome,
            option_id: self.selected_option.id,
            origin: self.user_location.clone(),
            destination: self.destination.clone(),
            fare_kz: self.quoted_price(),
            requested_at: self.requested_at.unwrap_or(now),
            matched_at: self.matched_at,
            pickup_at: self.pickup_at,
            ended_at: now,
        }
    }
}

fn notify(effects: &mut Vec<Effect>, kind: NotificationKind, message: impl Into<String>) {
    effects.push(Effect::Notify {
        message: message.into(),
        kind,
    });
}
