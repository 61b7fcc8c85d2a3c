//! Typed domain fetchers layered on the gateway façade.
//!
//! Every fetcher follows the same recipe: build the endpoint URL from the provider
//! profile, describe the query with [`ODataQuery`](crate::provider::ODataQuery), run it
//! through [`Gateway::get`](crate::gateway::Gateway::get), and shape the decoded records
//! into display models. No fetcher talks to the transport or the cache directly.

/// Airline directory and per-airline route fetchers.
pub mod airlines;
/// Flight-board and timetable fetchers.
pub mod flights;
/// Airport METAR weather fetcher.
pub mod weather;

mod common;

pub use airlines::{AirlineProfile, LocalizedName, RouteSegment, RouteSummary};
pub use flights::{FlightBoardEntry, FlightDirection, FlightStatus, ScheduledFlight};
pub use weather::{AirportWeather, MetarDetail};
