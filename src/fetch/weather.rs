//! Airport weather fetcher backed by the upstream METAR feed.

// crates.io
use serde::Deserializer;
// self
use crate::{
	_prelude::*,
	cache::ResourceKind,
	fetch::common,
	gateway::Gateway,
	http::UpstreamTransport,
	provider::{AirportCode, ODataQuery},
};

const METAR_FIELDS: [&str; 10] = [
	"StationID",
	"WeatherState",
	"Temperature",
	"DewPointTemperature",
	"AltimeterSetting",
	"WindDirection",
	"WindSpeed",
	"Visibility",
	"ObservationTime",
	"MetarText",
];
const MAGNUS_A: f64 = 17.27;
const MAGNUS_B: f64 = 237.7;

impl<C> Gateway<C>
where
	C: ?Sized + UpstreamTransport,
{
	/// Latest METAR-derived weather for one airport.
	///
	/// The upstream feed answers an empty array for stations without a current
	/// report; that maps to [`Error::NotFound`].
	pub async fn airport_weather(&self, airport: &AirportCode) -> Result<AirportWeather> {
		let url = self.profile().metar_url(airport)?;
		let query = ODataQuery::new().select(METAR_FIELDS);
		let records = common::fetch_records::<C, Vec<MetarRecord>>(
			self,
			ResourceKind::Weather,
			airport.as_ref(),
			url.clone(),
			&query,
		)
		.await?;
		let Some(record) = records.into_iter().next() else {
			return Err(Error::NotFound { url: url.to_string() });
		};

		Ok(record.into())
	}
}

/// Current weather at one airport, derived from the latest METAR report.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AirportWeather {
	/// Reporting station, normally the airport's ICAO code.
	pub station_id: Option<String>,
	/// Air temperature in degrees Celsius.
	pub temperature: Option<f64>,
	/// Relative humidity in percent, derived from temperature and dew point.
	pub humidity: Option<i64>,
	/// Upstream weather phenomena text.
	pub description: Option<String>,
	/// Wind speed as reported.
	pub wind_speed: Option<f64>,
	/// Wind direction in degrees.
	pub wind_direction: Option<f64>,
	/// Observation timestamp.
	pub observation_time: Option<String>,
	/// Raw METAR details backing the derived fields.
	pub metar: MetarDetail,
}
impl From<MetarRecord> for AirportWeather {
	fn from(record: MetarRecord) -> Self {
		Self {
			station_id: record.station_id,
			temperature: record.temperature,
			humidity: relative_humidity(record.temperature, record.dew_point_temperature),
			description: record.weather_state,
			wind_speed: record.wind_speed,
			wind_direction: record.wind_direction,
			observation_time: record.observation_time,
			metar: MetarDetail {
				visibility: record.visibility,
				dew_point: record.dew_point_temperature,
				pressure: record.altimeter_setting,
				raw: record.metar_text,
			},
		}
	}
}

/// METAR detail block carried alongside the derived weather fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetarDetail {
	/// Visibility as reported.
	pub visibility: Option<f64>,
	/// Dew point in degrees Celsius.
	pub dew_point: Option<f64>,
	/// Altimeter setting, when the station reports one.
	pub pressure: Option<f64>,
	/// Raw METAR sentence.
	pub raw: Option<String>,
}

/// Raw METAR row as served by the weather endpoint.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MetarRecord {
	#[serde(rename = "StationID")]
	station_id: Option<String>,
	weather_state: Option<String>,
	#[serde(default, deserialize_with = "loose_number")]
	temperature: Option<f64>,
	#[serde(default, deserialize_with = "loose_number")]
	dew_point_temperature: Option<f64>,
	#[serde(default, deserialize_with = "loose_number")]
	altimeter_setting: Option<f64>,
	#[serde(default, deserialize_with = "loose_number")]
	wind_direction: Option<f64>,
	#[serde(default, deserialize_with = "loose_number")]
	wind_speed: Option<f64>,
	#[serde(default, deserialize_with = "loose_number")]
	visibility: Option<f64>,
	observation_time: Option<String>,
	metar_text: Option<String>,
}

/// Accepts a numeric field the upstream serializes either as a JSON number or as a
/// string, mapping unparseable text to `None`.
fn loose_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
	D: Deserializer<'de>,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum Raw {
		Number(f64),
		Text(String),
	}

	Ok(match Option::<Raw>::deserialize(deserializer)? {
		Some(Raw::Number(value)) => Some(value),
		Some(Raw::Text(text)) => text.trim().parse().ok(),
		None => None,
	})
}

/// Relative humidity in percent from temperature and dew point (both in degrees
/// Celsius) via the Magnus approximation, rounded to the nearest integer.
fn relative_humidity(temperature: Option<f64>, dew_point: Option<f64>) -> Option<i64> {
	let gamma = |t: f64| (MAGNUS_A * t) / (MAGNUS_B + t);
	let humidity = 100.0 * (gamma(dew_point?).exp() / gamma(temperature?).exp());

	humidity.is_finite().then(|| humidity.round() as i64)
}
