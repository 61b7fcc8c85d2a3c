//! Flight-board and timetable fetchers.
//!
//! The board issues one filtered FIDS query per direction, merges both sides, and sorts
//! the result by scheduled time. The timetable issues a single projected schedule query.
//! All shaping is local and synchronous; network traffic goes through
//! [`Gateway::get`](crate::gateway::Gateway::get) like every other fetcher.

// crates.io
use time::format_description::well_known::Rfc3339;
// self
use crate::{
	_prelude::*,
	cache::ResourceKind,
	fetch::common,
	gateway::Gateway,
	http::UpstreamTransport,
	provider::{AirportCode, ODataQuery},
};

const SCHEDULE_TIME: &str = "ScheduleTime";
const SCHEDULE_FIELDS: [&str; 7] = [
	"AirlineID",
	"FlightNumber",
	"DepartureAirportID",
	"ArrivalAirportID",
	"DepartureTime",
	"ArrivalTime",
	"ServiceDays",
];

impl<C> Gateway<C>
where
	C: ?Sized + UpstreamTransport,
{
	/// Merged departure and arrival board for one airport.
	///
	/// Issues one FIDS query per direction, concurrently and cached as two distinct
	/// entries, tags each row with its [`FlightDirection`], and sorts the merged board by
	/// scheduled time. Rows whose timestamp fails the RFC 3339 parse sort lexicographically
	/// after the parseable ones; rows without a timestamp sort last.
	pub async fn airport_flights(&self, airport: &AirportCode) -> Result<Vec<FlightBoardEntry>> {
		let url = self.profile().flights_url(airport)?;
		let departure_query = ODataQuery::new()
			.filter(format!("DepartureAirportID eq '{airport}'"))
			.order_by(SCHEDULE_TIME);
		let arrival_query = ODataQuery::new()
			.filter(format!("ArrivalAirportID eq '{airport}'"))
			.order_by(SCHEDULE_TIME);
		let (departures, arrivals) = tokio::join!(
			common::fetch_records::<C, Vec<FidsRecord>>(
				self,
				ResourceKind::Flights,
				airport.as_ref(),
				url.clone(),
				&departure_query,
			),
			common::fetch_records::<C, Vec<FidsRecord>>(
				self,
				ResourceKind::Flights,
				airport.as_ref(),
				url,
				&arrival_query,
			),
		);
		let mut board = departures?
			.into_iter()
			.map(|record| FlightBoardEntry::new(record, FlightDirection::Departure))
			.chain(
				arrivals?
					.into_iter()
					.map(|record| FlightBoardEntry::new(record, FlightDirection::Arrival)),
			)
			.collect::<Vec<_>>();

		board.sort_by_cached_key(|entry| TimeKey::new(entry.scheduled_time.as_deref()));

		Ok(board)
	}

	/// Timetable of recurring flights for one airport.
	pub async fn airport_schedule(&self, airport: &AirportCode) -> Result<Vec<ScheduledFlight>> {
		let url = self.profile().schedule_url(airport)?;
		let query = ODataQuery::new().order_by(SCHEDULE_TIME).select(SCHEDULE_FIELDS);
		let records = common::fetch_records::<C, Vec<ScheduleRecord>>(
			self,
			ResourceKind::Schedule,
			airport.as_ref(),
			url,
			&query,
		)
		.await?;

		Ok(records.into_iter().map(ScheduledFlight::from).collect())
	}
}

/// Which flight board a record belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlightDirection {
	/// Outbound rows, filtered by departure airport.
	Departure,
	/// Inbound rows, filtered by arrival airport.
	Arrival,
}

/// Upstream flight status, normalized from the raw FIDS text.
///
/// Values outside the published vocabulary pass through untouched in
/// [`Other`](Self::Other).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FlightStatus {
	/// Flight is on time.
	Scheduled,
	/// Flight is delayed.
	Delayed,
	/// Flight is cancelled.
	Cancelled,
	/// Check-in desks are open.
	CheckIn,
	/// Boarding is in progress.
	Boarding,
	/// Final boarding call.
	FinalCall,
	/// Flight has departed.
	Departed,
	/// Flight has landed.
	Arrived,
	/// Generic arrival-board state.
	Arrival,
	/// Generic departure-board state.
	Departure,
	/// Status text outside the published vocabulary.
	Other(String),
}
impl FlightStatus {
	/// Upstream text for this status.
	pub fn as_str(&self) -> &str {
		match self {
			Self::Scheduled => "Scheduled",
			Self::Delayed => "Delayed",
			Self::Cancelled => "Cancelled",
			Self::CheckIn => "CheckIn",
			Self::Boarding => "Boarding",
			Self::FinalCall => "FinalCall",
			Self::Departed => "Departed",
			Self::Arrived => "Arrived",
			Self::Arrival => "Arrival",
			Self::Departure => "Departure",
			Self::Other(raw) => raw,
		}
	}
}
impl From<&str> for FlightStatus {
	fn from(raw: &str) -> Self {
		match raw {
			"Scheduled" => Self::Scheduled,
			"Delayed" => Self::Delayed,
			"Cancelled" => Self::Cancelled,
			"CheckIn" => Self::CheckIn,
			"Boarding" => Self::Boarding,
			"FinalCall" => Self::FinalCall,
			"Departed" => Self::Departed,
			"Arrived" => Self::Arrived,
			"Arrival" => Self::Arrival,
			"Departure" => Self::Departure,
			_ => Self::Other(raw.to_owned()),
		}
	}
}
impl From<String> for FlightStatus {
	fn from(raw: String) -> Self {
		Self::from(raw.as_str())
	}
}
impl From<FlightStatus> for String {
	fn from(status: FlightStatus) -> Self {
		match status {
			FlightStatus::Other(raw) => raw,
			_ => status.as_str().to_owned(),
		}
	}
}
impl Display for FlightStatus {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// One row of the merged flight board.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightBoardEntry {
	/// Combined airline and flight number, e.g. `BR189`.
	pub flight_number: String,
	/// Operating airline code.
	pub airline_id: String,
	/// Which board the row came from.
	pub direction: FlightDirection,
	/// Origin airport code.
	pub departure_airport: String,
	/// Destination airport code.
	pub arrival_airport: String,
	/// Scheduled time of the movement.
	pub scheduled_time: Option<String>,
	/// Actual time, once the movement happened.
	pub actual_time: Option<String>,
	/// Estimated time, while the movement is pending.
	pub estimated_time: Option<String>,
	/// Terminal serving the flight.
	pub terminal: Option<String>,
	/// Gate serving the flight.
	pub gate: Option<String>,
	/// Normalized flight status.
	pub status: Option<FlightStatus>,
	/// Free-form upstream remark.
	pub remark: Option<String>,
}
impl FlightBoardEntry {
	fn new(record: FidsRecord, direction: FlightDirection) -> Self {
		Self {
			flight_number: format!("{}{}", record.airline_id, record.flight_number),
			airline_id: record.airline_id,
			direction,
			departure_airport: record.departure_airport_id,
			arrival_airport: record.arrival_airport_id,
			scheduled_time: record.schedule_time,
			actual_time: record.actual_time,
			estimated_time: record.estimated_time,
			terminal: record.terminal,
			gate: record.gate,
			status: record.flight_status.as_deref().map(FlightStatus::from),
			remark: record.remark,
		}
	}
}

/// One recurring flight from the airport timetable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledFlight {
	/// Combined airline and flight number.
	pub flight_number: String,
	/// Operating airline code.
	pub airline_id: String,
	/// Rendered route, e.g. `TPE → NRT`.
	pub route: String,
	/// Scheduled departure time at the origin.
	pub departure_time: Option<String>,
	/// Scheduled arrival time at the destination.
	pub arrival_time: Option<String>,
	/// Weekday names the flight operates on.
	pub frequency: Option<String>,
}
impl From<ScheduleRecord> for ScheduledFlight {
	fn from(record: ScheduleRecord) -> Self {
		Self {
			flight_number: format!("{}{}", record.airline_id, record.flight_number),
			airline_id: record.airline_id,
			route: format!("{} → {}", record.departure_airport_id, record.arrival_airport_id),
			departure_time: record.departure_time,
			arrival_time: record.arrival_time,
			frequency: common::service_days_text(record.service_days.as_deref()),
		}
	}
}

/// Raw FIDS row as served by the flight-board endpoint.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct FidsRecord {
	#[serde(rename = "AirlineID")]
	airline_id: String,
	flight_number: String,
	#[serde(rename = "DepartureAirportID")]
	departure_airport_id: String,
	#[serde(rename = "ArrivalAirportID")]
	arrival_airport_id: String,
	schedule_time: Option<String>,
	actual_time: Option<String>,
	estimated_time: Option<String>,
	terminal: Option<String>,
	gate: Option<String>,
	flight_status: Option<String>,
	remark: Option<String>,
}

/// Raw timetable row as served by the schedule endpoint.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ScheduleRecord {
	#[serde(rename = "AirlineID")]
	airline_id: String,
	flight_number: String,
	#[serde(rename = "DepartureAirportID")]
	departure_airport_id: String,
	#[serde(rename = "ArrivalAirportID")]
	arrival_airport_id: String,
	departure_time: Option<String>,
	arrival_time: Option<String>,
	service_days: Option<Vec<bool>>,
}

/// Sort key ordering RFC 3339 timestamps chronologically, unparseable values
/// lexicographically after them, and missing values last.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum TimeKey {
	Parsed(OffsetDateTime),
	Raw(String),
	Missing,
}
impl TimeKey {
	fn new(timestamp: Option<&str>) -> Self {
		match timestamp {
			Some(raw) => OffsetDateTime::parse(raw, &Rfc3339)
				.map_or_else(|_| Self::Raw(raw.to_owned()), Self::Parsed),
			None => Self::Missing,
		}
	}
}
