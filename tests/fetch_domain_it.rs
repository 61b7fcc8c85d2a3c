// crates.io
use httpmock::prelude::*;
// self
use tdx_gateway::{
	_preludet::*,
	config::GatewayConfig,
	fetch::{FlightDirection, FlightStatus},
	provider::{AirlineCode, AirportCode},
};

const GRANT_BODY: &str = r#"{"access_token":"wire-token","token_type":"Bearer","expires_in":3600}"#;
const DEPARTURES_BODY: &str = r#"[
	{"AirlineID":"CI","FlightNumber":"100","DepartureAirportID":"TPE","ArrivalAirportID":"NRT","ScheduleTime":"2026-08-23T08:00:00+08:00","FlightStatus":"Boarding","Gate":"A3"},
	{"AirlineID":"BR","FlightNumber":"200","DepartureAirportID":"TPE","ArrivalAirportID":"BKK","ScheduleTime":"2026-08-23T12:00:00+08:00","FlightStatus":"Scheduled","Terminal":"2"}
]"#;
const ARRIVALS_BODY: &str = r#"[
	{"AirlineID":"JX","FlightNumber":"300","DepartureAirportID":"HND","ArrivalAirportID":"TPE","ScheduleTime":"2026-08-23T06:30:00+08:00","FlightStatus":"Arrived"},
	{"AirlineID":"AE","FlightNumber":"400","DepartureAirportID":"MZG","ArrivalAirportID":"TPE","ScheduleTime":"2026-08-23T23:10:00+08:00","FlightStatus":"Delayed","Remark":"Weather"}
]"#;
const METAR_BODY: &str = r#"[
	{"StationID":"RMQ","WeatherState":"晴","Temperature":30,"DewPointTemperature":25,"AltimeterSetting":"1013.2","WindDirection":90,"WindSpeed":3.6,"Visibility":"9999","ObservationTime":"2026-08-23T10:00:00+08:00","MetarText":"METAR RCMQ 230200Z 09007KT 9999 FEW020 30/25 Q1013"}
]"#;
const AIRLINES_BODY: &str = r#"[
	{"AirlineID":"BR","AirlineName":{"Zh_tw":"長榮航空","En":"EVA Air"},"AirlineICAOCode":"EVA"},
	{"AirlineID":"CI","AirlineName":{"En":"China Airlines"}}
]"#;
const ROUTES_BODY: &str = r#"[
	{"AirlineID":"BR","DepartureAirportID":"TPE","ArrivalAirportID":"NRT","ServiceDays":[true,true,true,true,true,true,true]},
	{"AirlineID":"BR","DepartureAirportID":"TPE","ArrivalAirportID":"BKK","AircraftType":"77W"},
	{"AirlineID":"CI","DepartureAirportID":"TSA","ArrivalAirportID":"HND"}
]"#;
const B7_ROUTES_BODY: &str = r#"[
	{"AirlineID":"B7","DepartureAirportID":"RMQ","ArrivalAirportID":"MZG","ServiceDays":[true,false,true,false,true,false,false]}
]"#;
const SCHEDULE_BODY: &str = r#"[
	{"AirlineID":"IT","FlightNumber":"204","DepartureAirportID":"TPE","ArrivalAirportID":"KIX","DepartureTime":"09:10","ArrivalTime":"12:55","ServiceDays":[true,false,true,false,true,false,false]}
]"#;
const SCHEDULE_SELECT: &str =
	"AirlineID,FlightNumber,DepartureAirportID,ArrivalAirportID,DepartureTime,ArrivalTime,ServiceDays";

fn airport(code: &str) -> AirportCode {
	code.parse().expect("Airport code should be valid.")
}

fn airline(code: &str) -> AirlineCode {
	code.parse().expect("Airline code should be valid.")
}

async fn mount_token(server: &MockServer) {
	server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body(GRANT_BODY);
		})
		.await;
}

#[tokio::test]
async fn airport_board_merges_both_directions_over_the_wire() {
	let server = MockServer::start_async().await;
	let gateway = build_reqwest_test_gateway(&server.base_url(), GatewayConfig::default());

	mount_token(&server).await;

	let departures = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/api/Air/FIDS/Airport/TPE")
				.query_param("$filter", "DepartureAirportID eq 'TPE'")
				.query_param("$orderby", "ScheduleTime");
			then.status(200).header("content-type", "application/json").body(DEPARTURES_BODY);
		})
		.await;
	let arrivals = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/api/Air/FIDS/Airport/TPE")
				.query_param("$filter", "ArrivalAirportID eq 'TPE'")
				.query_param("$orderby", "ScheduleTime");
			then.status(200).header("content-type", "application/json").body(ARRIVALS_BODY);
		})
		.await;
	let board =
		gateway.airport_flights(&airport("TPE")).await.expect("Board fetch should succeed.");

	assert_eq!(board.len(), 4);
	assert_eq!(
		board.iter().map(|entry| entry.flight_number.as_str()).collect::<Vec<_>>(),
		["JX300", "CI100", "BR200", "AE400"],
	);
	assert_eq!(board[0].direction, FlightDirection::Arrival);
	assert_eq!(board[1].direction, FlightDirection::Departure);
	assert_eq!(board[1].status, Some(FlightStatus::Boarding));
	assert_eq!(board[1].gate.as_deref(), Some("A3"));
	assert_eq!(board[3].status, Some(FlightStatus::Delayed));
	assert_eq!(board[3].remark.as_deref(), Some("Weather"));

	departures.assert_calls_async(1).await;
	arrivals.assert_calls_async(1).await;

	// A warm repeat is served from the cache for both directions.
	gateway.airport_flights(&airport("TPE")).await.expect("Warm board fetch should succeed.");

	departures.assert_calls_async(1).await;
	arrivals.assert_calls_async(1).await;
}

#[tokio::test]
async fn airport_weather_reports_derived_humidity() {
	let server = MockServer::start_async().await;
	let gateway = build_reqwest_test_gateway(&server.base_url(), GatewayConfig::default());

	mount_token(&server).await;

	let metar = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/api/Air/METAR/Airport/RMQ")
				.header("authorization", "Bearer wire-token");
			then.status(200).header("content-type", "application/json").body(METAR_BODY);
		})
		.await;
	let weather =
		gateway.airport_weather(&airport("RMQ")).await.expect("Weather fetch should succeed.");

	assert_eq!(weather.station_id.as_deref(), Some("RMQ"));
	assert_eq!(weather.description.as_deref(), Some("晴"));
	assert_eq!(weather.temperature, Some(30.0));
	assert_eq!(weather.humidity, Some(75));
	assert_eq!(weather.wind_direction, Some(90.0));
	assert_eq!(weather.wind_speed, Some(3.6));
	assert_eq!(weather.metar.dew_point, Some(25.0));
	assert_eq!(weather.metar.visibility, Some(9_999.0));
	assert_eq!(weather.metar.pressure, Some(1_013.2));
	assert!(weather.metar.raw.as_deref().is_some_and(|raw| raw.starts_with("METAR RCMQ")));

	metar.assert_calls_async(1).await;
}

#[tokio::test]
async fn empty_weather_payload_maps_to_not_found() {
	let server = MockServer::start_async().await;
	let gateway = build_reqwest_test_gateway(&server.base_url(), GatewayConfig::default());

	mount_token(&server).await;

	let metar = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/Air/METAR/Airport/KHH");
			then.status(200).header("content-type", "application/json").body("[]");
		})
		.await;
	let error = gateway
		.airport_weather(&airport("KHH"))
		.await
		.expect_err("An empty METAR list should be reported as missing.");

	assert!(
		matches!(error, Error::NotFound { ref url } if url.contains("/Air/METAR/Airport/KHH"))
	);

	metar.assert_calls_async(1).await;
}

#[tokio::test]
async fn airline_directory_joins_route_segments() {
	let server = MockServer::start_async().await;
	let gateway = build_reqwest_test_gateway(&server.base_url(), GatewayConfig::default());

	mount_token(&server).await;

	let directory = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/Air/Airline").query_param("$orderby", "AirlineID");
			then.status(200).header("content-type", "application/json").body(AIRLINES_BODY);
		})
		.await;
	let routes = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/Air/Route");
			then.status(200).header("content-type", "application/json").body(ROUTES_BODY);
		})
		.await;
	let airlines = gateway.airlines().await.expect("Directory fetch should succeed.");

	assert_eq!(airlines.len(), 2);

	let eva = &airlines[0];

	assert_eq!(eva.airline_id, "BR");
	assert_eq!(eva.name.zh_tw.as_deref(), Some("長榮航空"));
	assert_eq!(eva.name.en.as_deref(), Some("EVA Air"));
	assert_eq!(eva.icao_code.as_deref(), Some("EVA"));
	assert_eq!(eva.routes.len(), 2);
	assert_eq!(eva.routes[0].departure_airport, "TPE");
	assert_eq!(eva.routes[1].aircraft.as_deref(), Some("77W"));

	let china = &airlines[1];

	assert_eq!(china.airline_id, "CI");
	assert!(china.name.zh_tw.is_none());
	assert_eq!(china.name.en.as_deref(), Some("China Airlines"));
	assert_eq!(china.routes.len(), 1);

	directory.assert_calls_async(1).await;
	routes.assert_calls_async(1).await;
}

#[tokio::test]
async fn airline_routes_render_synthetic_identifiers() {
	let server = MockServer::start_async().await;
	let gateway = build_reqwest_test_gateway(&server.base_url(), GatewayConfig::default());

	mount_token(&server).await;

	let rows = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/api/Air/Route/Airline/B7")
				.query_param("$orderby", "DepartureAirportID");
			then.status(200).header("content-type", "application/json").body(B7_ROUTES_BODY);
		})
		.await;
	let routes =
		gateway.airline_routes(&airline("B7")).await.expect("Route fetch should succeed.");

	assert_eq!(routes.len(), 1);
	assert_eq!(routes[0].route_id, "B7-RMQ-MZG");
	assert_eq!(routes[0].route, "RMQ → MZG");
	assert_eq!(routes[0].frequency.as_deref(), Some("Monday, Wednesday, Friday"));

	rows.assert_calls_async(1).await;
}

#[tokio::test]
async fn airport_schedule_lists_weekly_services() {
	let server = MockServer::start_async().await;
	let gateway = build_reqwest_test_gateway(&server.base_url(), GatewayConfig::default());

	mount_token(&server).await;

	let schedule = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/api/Air/Schedule/Airport/TPE")
				.query_param("$orderby", "ScheduleTime")
				.query_param("$select", SCHEDULE_SELECT);
			then.status(200).header("content-type", "application/json").body(SCHEDULE_BODY);
		})
		.await;
	let flights = gateway
		.airport_schedule(&airport("TPE"))
		.await
		.expect("Schedule fetch should succeed.");

	assert_eq!(flights.len(), 1);
	assert_eq!(flights[0].flight_number, "IT204");
	assert_eq!(flights[0].airline_id, "IT");
	assert_eq!(flights[0].route, "TPE → KIX");
	assert_eq!(flights[0].departure_time.as_deref(), Some("09:10"));
	assert_eq!(flights[0].frequency.as_deref(), Some("Monday, Wednesday, Friday"));

	schedule.assert_calls_async(1).await;
}
