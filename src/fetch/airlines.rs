//! Airline directory and route fetchers.

// self
use crate::{
	_prelude::*,
	cache::ResourceKind,
	fetch::common,
	gateway::Gateway,
	http::UpstreamTransport,
	provider::{AirlineCode, ODataQuery},
};

const AIRLINE_ID: &str = "AirlineID";
const DEPARTURE_AIRPORT: &str = "DepartureAirportID";
const DIRECTORY_KEY: &str = "directory";
const ALL_ROUTES_KEY: &str = "all";

impl<C> Gateway<C>
where
	C: ?Sized + UpstreamTransport,
{
	/// Airline directory joined with every carrier's route segments.
	///
	/// The directory and the all-routes list are fetched concurrently and cached
	/// independently; the join runs locally on every call, so a fresh directory
	/// entry never pins a stale route list or vice versa.
	pub async fn airlines(&self) -> Result<Vec<AirlineProfile>> {
		let directory_url = self.profile().airlines_url()?;
		let routes_url = self.profile().routes_url()?;
		let directory_query = ODataQuery::new().order_by(AIRLINE_ID);
		let route_query = ODataQuery::new();
		let (airlines, routes) = tokio::join!(
			common::fetch_records::<C, Vec<AirlineRecord>>(
				self,
				ResourceKind::Airlines,
				DIRECTORY_KEY,
				directory_url,
				&directory_query,
			),
			common::fetch_records::<C, Vec<RouteRecord>>(
				self,
				ResourceKind::AirlineRoutes,
				ALL_ROUTES_KEY,
				routes_url,
				&route_query,
			),
		);
		let mut segments = HashMap::<String, Vec<RouteSegment>>::new();

		for route in routes? {
			segments.entry(route.airline_id.clone()).or_default().push(route.into());
		}

		Ok(airlines?
			.into_iter()
			.map(|airline| AirlineProfile {
				routes: segments.remove(&airline.airline_id).unwrap_or_default(),
				airline_id: airline.airline_id,
				name: airline.airline_name.unwrap_or_default(),
				icao_code: airline.airline_icao_code,
			})
			.collect())
	}

	/// Route list for a single airline, one row per segment.
	pub async fn airline_routes(&self, airline: &AirlineCode) -> Result<Vec<RouteSummary>> {
		let url = self.profile().airline_routes_url(airline)?;
		let query = ODataQuery::new().order_by(DEPARTURE_AIRPORT);
		let records = common::fetch_records::<C, Vec<RouteRecord>>(
			self,
			ResourceKind::AirlineRoutes,
			airline.as_ref(),
			url,
			&query,
		)
		.await?;

		Ok(records.into_iter().map(RouteSummary::from).collect())
	}
}

/// Localized name pair as the upstream publishes it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedName {
	/// Traditional Chinese name.
	#[serde(rename = "Zh_tw")]
	pub zh_tw: Option<String>,
	/// English name.
	#[serde(rename = "En")]
	pub en: Option<String>,
}

/// One airline with its localized names and route segments.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AirlineProfile {
	/// IATA airline designator.
	pub airline_id: String,
	/// Localized carrier names.
	pub name: LocalizedName,
	/// ICAO designator, when published.
	pub icao_code: Option<String>,
	/// Route segments operated by this airline.
	pub routes: Vec<RouteSegment>,
}

/// One route segment inside an [`AirlineProfile`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSegment {
	/// Origin airport code.
	pub departure_airport: String,
	/// Destination airport code.
	pub arrival_airport: String,
	/// Weekday names the segment operates on.
	pub frequency: Option<String>,
	/// Aircraft type, when published.
	pub aircraft: Option<String>,
}
impl From<RouteRecord> for RouteSegment {
	fn from(record: RouteRecord) -> Self {
		Self {
			departure_airport: record.departure_airport_id,
			arrival_airport: record.arrival_airport_id,
			frequency: common::service_days_text(record.service_days.as_deref()),
			aircraft: record.aircraft_type,
		}
	}
}

/// One row of a single airline's route query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSummary {
	/// Synthetic `{airline}-{departure}-{arrival}` identifier.
	pub route_id: String,
	/// Rendered route, e.g. `TPE → NRT`.
	pub route: String,
	/// Weekday names the route operates on.
	pub frequency: Option<String>,
	/// Aircraft type, when published.
	pub aircraft: Option<String>,
	/// Free-form upstream remarks.
	pub remarks: Option<String>,
}
impl From<RouteRecord> for RouteSummary {
	fn from(record: RouteRecord) -> Self {
		Self {
			route_id: format!(
				"{}-{}-{}",
				record.airline_id, record.departure_airport_id, record.arrival_airport_id
			),
			route: format!("{} → {}", record.departure_airport_id, record.arrival_airport_id),
			frequency: common::service_days_text(record.service_days.as_deref()),
			aircraft: record.aircraft_type,
			remarks: record.remarks,
		}
	}
}

/// Raw airline row as served by the directory endpoint.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AirlineRecord {
	#[serde(rename = "AirlineID")]
	airline_id: String,
	airline_name: Option<LocalizedName>,
	#[serde(rename = "AirlineICAOCode")]
	airline_icao_code: Option<String>,
}

/// Raw route row shared by the all-routes and per-airline endpoints.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RouteRecord {
	#[serde(rename = "AirlineID")]
	airline_id: String,
	#[serde(rename = "DepartureAirportID")]
	departure_airport_id: String,
	#[serde(rename = "ArrivalAirportID")]
	arrival_airport_id: String,
	service_days: Option<Vec<bool>>,
	aircraft_type: Option<String>,
	remarks: Option<String>,
}
