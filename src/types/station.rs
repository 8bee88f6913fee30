use crate::types::time_range::DATETIME_FORMAT;
use chrono::NaiveDateTime;

/// A measuring station as far as the download planner is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Station {
    /// Data hub station identifier, e.g. "5925".
    pub id: String,
    /// Display name, e.g. "Wien/Hohe Warte".
    pub name: String,
    /// First timestamp the station has data for. Requests never start before it.
    pub earliest_start: NaiveDateTime,
}

impl Station {
    pub fn new(id: impl Into<String>, name: impl Into<String>, earliest_start: NaiveDateTime) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            earliest_start,
        }
    }

    /// Name safe for use in paths: `/` and spaces become `-`.
    pub fn sanitized_name(&self) -> String {
        self.name.replace(['/', ' '], "-")
    }

    /// `{id}_{sanitized name}`, used both as directory and file name prefix.
    pub fn directory_name(&self) -> String {
        format!("{}_{}", self.id, self.sanitized_name())
    }

    pub(crate) fn earliest_start_text(&self) -> String {
        self.earliest_start.format(DATETIME_FORMAT).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::time_range::parse_timestamp;

    #[test]
    fn test_sanitized_names() {
        let station = Station::new(
            "5925",
            "Wien/Hohe Warte",
            parse_timestamp("1872-01-01").unwrap(),
        );
        assert_eq!(station.sanitized_name(), "Wien-Hohe-Warte");
        assert_eq!(station.directory_name(), "5925_Wien-Hohe-Warte");
        assert_eq!(station.earliest_start_text(), "1872-01-01 00:00");
    }
}
