use crate::core::ResultBundle;
use crate::utils::error::{LookupError, Result};
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

pub fn render(bundle: &ResultBundle, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(bundle)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(bundle)?),
        OutputFormat::Csv => render_csv(bundle),
    }
}

fn date_range(from: Option<NaiveDate>, to: Option<NaiveDate>) -> String {
    match (from, to) {
        (Some(from), Some(to)) => format!("{} .. {}", from, to),
        (Some(from), None) => format!("since {}", from),
        (None, Some(to)) => format!("until {}", to),
        (None, None) => String::new(),
    }
}

fn render_text(bundle: &ResultBundle) -> String {
    let Some(soldier) = &bundle.soldier else {
        return "No record loaded".to_string();
    };

    let mut lines = Vec::new();
    let details: Vec<&str> = [soldier.rank.as_deref(), soldier.unit.as_deref()]
        .into_iter()
        .flatten()
        .collect();
    if details.is_empty() {
        lines.push(format!("Soldier    {}  {}", soldier.id, soldier.name));
    } else {
        lines.push(format!(
            "Soldier    {}  {} ({})",
            soldier.id,
            soldier.name,
            details.join(", ")
        ));
    }

    match &bundle.status {
        Some(status) => match &status.remarks {
            Some(remarks) => lines.push(format!("Status     {} - {}", status.status, remarks)),
            None => lines.push(format!("Status     {}", status.status)),
        },
        None => lines.push("Status     unknown".to_string()),
    }

    if let Some(location) = &bundle.birth_location {
        let place: Vec<&str> = [
            location.place.as_deref(),
            location.district.as_deref(),
            location.state.as_deref(),
            location.country.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect();
        lines.push(format!(
            "Born in    {} ({})",
            place.join(", "),
            location.postal_code
        ));
    }

    lines.push(format!("Postings   {}", bundle.postings.len()));
    for posting in &bundle.postings {
        let range = date_range(posting.from, posting.to);
        if range.is_empty() {
            lines.push(format!("  - {}", posting.location));
        } else {
            lines.push(format!("  - {} ({})", posting.location, range));
        }
    }

    lines.push(format!("Visited    {}", bundle.visits.len()));
    for visit in &bundle.visits {
        match visit.visited_on {
            Some(date) => lines.push(format!("  - {} ({})", visit.place, date)),
            None => lines.push(format!("  - {}", visit.place)),
        }
    }

    lines.join("\n")
}

/// One `section,key,value` row per displayed field.
fn render_csv(bundle: &ResultBundle) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["section", "key", "value"])?;

    if let Some(soldier) = &bundle.soldier {
        writer.write_record(["soldier", "id", soldier.id.to_string().as_str()])?;
        writer.write_record(["soldier", "name", soldier.name.as_str()])?;
        if let Some(rank) = &soldier.rank {
            writer.write_record(["soldier", "rank", rank.as_str()])?;
        }
        if let Some(unit) = &soldier.unit {
            writer.write_record(["soldier", "unit", unit.as_str()])?;
        }
    }
    if let Some(status) = &bundle.status {
        writer.write_record(["status", "status", status.status.as_str()])?;
        if let Some(remarks) = &status.remarks {
            writer.write_record(["status", "remarks", remarks.as_str()])?;
        }
    }
    if let Some(location) = &bundle.birth_location {
        writer.write_record(["birth_location", "postal_code", location.postal_code.as_str()])?;
        if let Some(place) = &location.place {
            writer.write_record(["birth_location", "place", place.as_str()])?;
        }
    }
    for (index, posting) in bundle.postings.iter().enumerate() {
        writer.write_record(["posting", index.to_string().as_str(), posting.location.as_str()])?;
    }
    for (index, visit) in bundle.visits.iter().enumerate() {
        writer.write_record(["visit", index.to_string().as_str(), visit.place.as_str()])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| LookupError::IoError(e.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|e| LookupError::IoError(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}
