use std::fmt::{Display, Formatter};

/// Snapshot granularity, encoded as a marker segment in snapshot filenames.
///
/// The raw table builder splits the data directory into two disjoint logical
/// tables by matching this marker, so the marker is part of the on-disk
/// contract, not just a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    Hourly,
    Daily,
}

impl Granularity {
    pub const fn as_str(self) -> &'static str {
        match self {
            Granularity::Hourly => "hourly",
            Granularity::Daily => "daily",
        }
    }

    /// The infix matched against snapshot filenames, e.g. `_hourly_`.
    pub fn filename_marker(self) -> String {
        format!("_{}_", self.as_str())
    }
}

impl Display for Granularity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which upstream API endpoint an ingestion run targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiSource {
    /// The archive endpoint, used for backfills and custom ranges.
    Historical,
    /// The forecast endpoint, used for incremental (yesterday) runs.
    Forecast,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn granularity_markers() {
        assert_eq!(Granularity::Hourly.filename_marker(), "_hourly_");
        assert_eq!(Granularity::Daily.filename_marker(), "_daily_");
        assert_eq!(Granularity::Hourly.to_string(), "hourly");
    }
}
