//! Strongly typed resource identifiers enforced across the gateway domain.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

macro_rules! def_code {
	($name:ident, $doc:literal, $kind:literal, $min:literal, $max:literal, $digits:literal) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Creates a new code after validation.
			pub fn new(value: impl AsRef<str>) -> Result<Self, CodeError> {
				let view = value.as_ref();

				validate_view($kind, view, $min, $max, $digits)?;

				Ok(Self(view.to_owned()))
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &Self::Target {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = CodeError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				validate_view($kind, &value, $min, $max, $digits)?;

				Ok(Self(value))
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
		impl FromStr for $name {
			type Err = CodeError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
	};
}

/// Error returned when code validation fails.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum CodeError {
	/// The code was empty.
	#[error("{kind} code cannot be empty.")]
	Empty {
		/// Kind of code (airport, airline).
		kind: &'static str,
	},
	/// The code length falls outside the permitted range.
	#[error("{kind} code must be {min}-{max} characters long.")]
	BadLength {
		/// Kind of code (airport, airline).
		kind: &'static str,
		/// Minimum permitted character count.
		min: usize,
		/// Maximum permitted character count.
		max: usize,
	},
	/// The code contains characters outside the permitted alphabet.
	#[error("{kind} code contains invalid characters.")]
	InvalidCharacters {
		/// Kind of code (airport, airline).
		kind: &'static str,
	},
}

def_code! { AirportCode, "IATA airport location code (3 uppercase letters, e.g. `TPE`).", "Airport", 3, 3, false }
def_code! { AirlineCode, "IATA airline designator (2-3 uppercase alphanumerics, e.g. `BR`, `B7`).", "Airline", 2, 3, true }

fn validate_view(
	kind: &'static str,
	view: &str,
	min: usize,
	max: usize,
	digits: bool,
) -> Result<(), CodeError> {
	if view.is_empty() {
		return Err(CodeError::Empty { kind });
	}
	if view.len() < min || view.len() > max {
		return Err(CodeError::BadLength { kind, min, max });
	}
	if !view.bytes().all(|b| b.is_ascii_uppercase() || (digits && b.is_ascii_digit())) {
		return Err(CodeError::InvalidCharacters { kind });
	}

	Ok(())
}
