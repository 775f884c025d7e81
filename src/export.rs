use chrono::NaiveDate;

use crate::models::Lead;

// Column order is fixed; downstream sheet imports depend on it.
const CSV_HEADERS: [&str; 9] = [
    "Name",
    "Phone",
    "Email",
    "Location",
    "Property Type",
    "Budget",
    "Status",
    "Source",
    "Date",
];

pub fn render_leads_csv(leads: &[Lead]) -> String {
    let mut lines = Vec::with_capacity(leads.len() + 1);
    lines.push(CSV_HEADERS.join(","));

    for lead in leads {
        let fields = [
            lead.name.as_str(),
            lead.phone.as_str(),
            lead.email.as_deref().unwrap_or(""),
            lead.location.as_deref().unwrap_or(""),
            lead.property_type.as_deref().unwrap_or(""),
            lead.budget.as_deref().unwrap_or(""),
            lead.status.as_str(),
            lead.source.as_str(),
            lead.date.as_str(),
        ];
        lines.push(
            fields
                .iter()
                .map(|field| escape_field(field))
                .collect::<Vec<_>>()
                .join(","),
        );
    }

    lines.join("\n")
}

pub fn export_filename(date: NaiveDate) -> String {
    format!("leads_{}.csv", date)
}

fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
