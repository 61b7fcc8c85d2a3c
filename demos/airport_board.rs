//! Walks a mock TDX server end to end: exchange client credentials, pull the
//! Taoyuan flight board and METAR through the gateway, then show the cache
//! absorbing a repeat read.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use tdx_gateway::{
	auth::Credentials,
	config::GatewayConfig,
	fetch::{FlightDirection, FlightStatus},
	gateway::Gateway,
	http::ReqwestTransport,
	provider::{AirportCode, ProviderProfile},
	reqwest::Client,
};

const GRANT_BODY: &str = r#"{"access_token":"demo-token","token_type":"Bearer","expires_in":1800}"#;
const DEPARTURES_BODY: &str = r#"[
	{"AirlineID":"CI","FlightNumber":"100","DepartureAirportID":"TPE","ArrivalAirportID":"NRT","ScheduleTime":"2026-08-23T08:00:00+08:00","FlightStatus":"Boarding","Gate":"A3"},
	{"AirlineID":"BR","FlightNumber":"200","DepartureAirportID":"TPE","ArrivalAirportID":"BKK","ScheduleTime":"2026-08-23T12:00:00+08:00","FlightStatus":"Scheduled","Terminal":"2"}
]"#;
const ARRIVALS_BODY: &str = r#"[
	{"AirlineID":"JX","FlightNumber":"300","DepartureAirportID":"HND","ArrivalAirportID":"TPE","ScheduleTime":"2026-08-23T06:30:00+08:00","FlightStatus":"Arrived"}
]"#;
const METAR_BODY: &str = r#"[
	{"StationID":"RCTP","WeatherState":"晴","Temperature":28.5,"DewPointTemperature":24,"AltimeterSetting":"1012.1","WindDirection":60,"WindSpeed":4.1,"Visibility":"9999","ObservationTime":"2026-08-23T10:00:00+08:00","MetarText":"METAR RCTP 230200Z 06008KT 9999 FEW018 28/24 Q1012"}
]"#;

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let base = server.base_url();

	server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body(GRANT_BODY);
		})
		.await;

	let departures = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/api/Air/FIDS/Airport/TPE")
				.query_param("$filter", "DepartureAirportID eq 'TPE'");
			then.status(200).header("content-type", "application/json").body(DEPARTURES_BODY);
		})
		.await;

	server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/api/Air/FIDS/Airport/TPE")
				.query_param("$filter", "ArrivalAirportID eq 'TPE'");
			then.status(200).header("content-type", "application/json").body(ARRIVALS_BODY);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/api/Air/METAR/Airport/TPE");
			then.status(200).header("content-type", "application/json").body(METAR_BODY);
		})
		.await;

	let profile = ProviderProfile::from_urls(&format!("{base}/token"), &format!("{base}/api"))?;
	let transport = ReqwestTransport::with_client(
		Client::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()?,
	);
	let gateway = Gateway::with_transport(
		transport,
		profile,
		Credentials::new("demo-client", "demo-secret"),
		GatewayConfig::default(),
	)?;
	let airport: AirportCode = "TPE".parse()?;
	let board = gateway.airport_flights(&airport).await?;

	println!("Flight board for {airport}:");

	for entry in &board {
		let tag = match entry.direction {
			FlightDirection::Departure => "DEP",
			FlightDirection::Arrival => "ARR",
		};
		let when = entry.scheduled_time.as_deref().unwrap_or("unscheduled");
		let status = entry.status.as_ref().map_or("-", FlightStatus::as_str);

		println!(
			"  {tag} {} {} → {} at {when} [{status}]",
			entry.flight_number, entry.departure_airport, entry.arrival_airport,
		);
	}

	let weather = gateway.airport_weather(&airport).await?;

	if let (Some(temperature), Some(humidity)) = (weather.temperature, weather.humidity) {
		println!("Weather at {airport}: {temperature:.1} °C, {humidity}% relative humidity.");
	}

	// The repeat read never leaves the cache.
	gateway.airport_flights(&airport).await?;

	departures.assert_calls_async(1).await;

	println!("Repeat board read was served from the cache.");

	Ok(())
}
