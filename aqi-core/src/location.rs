use std::fmt;

use tracing::debug;

/// Prefix of a city profile URL copied from the aqicn.org website.
const CITY_URL_PREFIX: &str = "https://aqicn.org/city/";

/// Slug the feed API interprets as "geolocate the caller by IP".
pub const HERE: &str = "here";

/// Where to look up air quality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Location {
    /// Nearest station to the requester, resolved by the API from the IP.
    Here,
    /// A normalized city (or `@station`) slug.
    City(String),
}

impl Location {
    /// Normalize a free-form city preference into a location.
    ///
    /// Accepts a bare city name, a name with spaces, or a full
    /// `https://aqicn.org/city/<slug>/` profile URL. Absent or empty input
    /// means [`Location::Here`], as does anything that leaves no usable path
    /// segment (`/`, `.`, `..`).
    ///
    /// Only one slash is stripped from each end, so `//x//` resolves to `/x/`
    /// and resolving that again yields `x`. Both request the same feed path,
    /// since [`Location::path_segments`] skips empty segments.
    pub fn resolve(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Location::Here;
        };

        let lowered = raw.to_lowercase();
        let compact: String = lowered.chars().filter(|c| !c.is_whitespace()).collect();

        let slug = compact.strip_prefix(CITY_URL_PREFIX).unwrap_or(&compact);
        let slug = slug.strip_prefix('/').unwrap_or(slug);
        let slug = slug.strip_suffix('/').unwrap_or(slug);

        let location = if slug == HERE || path_segments(slug).next().is_none() {
            Location::Here
        } else {
            Location::City(slug.to_owned())
        };

        debug!(raw, slug = location.slug(), "resolved location");
        location
    }

    /// Path segment sent to the feed endpoint.
    pub fn slug(&self) -> &str {
        match self {
            Location::Here => HERE,
            Location::City(slug) => slug,
        }
    }

    /// Slug parts that form the request path, without empty or dot segments.
    pub fn path_segments(&self) -> impl Iterator<Item = &str> {
        path_segments(self.slug())
    }
}

fn path_segments(slug: &str) -> impl Iterator<Item = &str> {
    slug.split('/')
        .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}
