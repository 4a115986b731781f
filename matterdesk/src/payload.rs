//! Request payload produced by the intake front-end.

use crate::errors::AutomationError;
use crate::fill::FieldAssignment;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io::Read;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Form {
    pub matter_id: String,
    pub client_title: String,
    pub client_name: String,
    pub client_email: String,
    pub client_phone: String,
    pub client_language: String,
    pub case_type: String,
    pub lawyer_id: String,
    pub is_ref_barreau: bool,
    pub is_first_consultation: bool,
    pub is_existing_client: bool,
    pub is_payment_made: bool,
    pub payment_method: String,
    pub appointment_date: String,
    pub appointment_time: String,
    pub location: String,
    pub notes: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Lawyer {
    pub id: String,
    pub name: String,
    pub email: String,
    pub break_minutes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payload {
    pub form: Form,
    /// Case-type specific details; free-form.
    #[serde(default, alias = "caseDetails")]
    pub case: Map<String, Value>,
    #[serde(default)]
    pub lawyer: Lawyer,
}

/// Lawyers with their own billing code; everyone else bills under the principal.
const RESPONSIBLE_LAWYERS: [&str; 3] = ["MM", "DH", "TG"];
const DEFAULT_RESPONSIBLE: &str = "JR";

/// Type-of-law codes keyed by front-end case type.
fn law_type_code(case_type: &str) -> &'static str {
    match case_type {
        "divorce" => "mat",
        "estate" => "est",
        "employment" => "Lab",
        "contract" => "con",
        "defamations" => "def",
        "real_estate" => "re",
        "name_change" => "nam",
        "adoptions" => "ado",
        "mandates" => "Rem",
        "business" => "Com",
        "assermentation" => "oa",
        _ => "",
    }
}

/// Display name of a case type in the client's language.
pub fn case_name(case_type: &str, details: &Map<String, Value>, language: &str) -> String {
    let case_type = case_type.to_lowercase();
    if case_type == "common" {
        return match details.get("commonField") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
    }
    let french = language.to_lowercase().starts_with("fr");
    let (en, fr) = match case_type.as_str() {
        "divorce" => ("Divorce / Family Law", "Divorce / Droit de la famille"),
        "estate" => ("Estate Law", "Droit des successions"),
        "employment" => ("Employment Law", "Droit du travail"),
        "contract" => ("Contract Law", "Droit des contrats"),
        "defamations" => ("Defamations", "Diffamations"),
        "real_estate" => ("Real Estate", "Immobilier"),
        "name_change" => ("Name Change", "Changement de nom"),
        "adoptions" => ("Adoption", "Adoption"),
        "mandates" => ("Protection mandates", "Régime de protection"),
        "business" => ("Business Law", "Droit des affaires"),
        "assermentation" => ("Assermentation", "Assermentation"),
        _ => ("", ""),
    };
    let name = if french { fr } else { en };
    name.to_string()
}

impl Payload {
    pub fn from_json(raw: &str) -> Result<Self, AutomationError> {
        serde_json::from_str(raw).map_err(|e| AutomationError::Payload(e.to_string()))
    }

    pub fn from_reader(mut reader: impl Read) -> Result<Self, AutomationError> {
        let mut raw = String::new();
        reader.read_to_string(&mut raw)?;
        Self::from_json(&raw)
    }

    pub fn from_file(path: &Path) -> Result<Self, AutomationError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn matter_id(&self) -> Result<&str, AutomationError> {
        let id = self.form.matter_id.trim();
        if id.is_empty() {
            return Err(AutomationError::Payload(
                "matter ID is required but was not provided".to_string(),
            ));
        }
        Ok(id)
    }

    /// Lower-cased client language, English when unset.
    pub fn language(&self) -> String {
        let lang = self.form.client_language.trim();
        if lang.is_empty() {
            "english".to_string()
        } else {
            lang.to_lowercase()
        }
    }

    pub fn is_french(&self) -> bool {
        self.language().starts_with("fr")
    }

    /// Main-pane assignments for the New Matter dialog, by Tab-order position.
    pub fn consultation_fields(&self) -> Result<Vec<FieldAssignment>, AutomationError> {
        let form = &self.form;
        let client_name = form.client_name.trim();
        if client_name.is_empty() {
            return Err(AutomationError::Payload("clientName is required".to_string()));
        }

        let parts: Vec<&str> = client_name.split_whitespace().collect();
        let first = parts.first().copied().unwrap_or_default();
        let last = if parts.len() > 1 { parts[parts.len() - 1] } else { "" };
        let middle = if parts.len() > 2 {
            parts[1..parts.len() - 1].join(" ")
        } else {
            String::new()
        };

        let prefix = if self.language().starts_with("en") {
            "Consultation in"
        } else {
            "Consultation en"
        };
        let name = case_name(&form.case_type, &self.case, &self.language());
        let description = format!("{prefix} {}", name.to_lowercase()).trim().to_string();

        let default_rate = if form.is_ref_barreau {
            "J"
        } else if form.is_first_consultation {
            "I"
        } else {
            "A"
        };

        let lawyer = form.lawyer_id.trim();
        let responsible = if RESPONSIBLE_LAWYERS.contains(&lawyer) {
            lawyer
        } else {
            DEFAULT_RESPONSIBLE
        };

        let type_of_law = if form.is_first_consultation {
            "cons"
        } else {
            law_type_code(&form.case_type.to_lowercase())
        };

        Ok(vec![
            FieldAssignment::new(2, type_of_law),
            FieldAssignment::new(3, default_rate),
            FieldAssignment::new(5, responsible),
            FieldAssignment::new(6, description),
            FieldAssignment::new(7, form.client_title.as_str()),
            FieldAssignment::new(8, first),
            FieldAssignment::new(9, middle),
            FieldAssignment::new(10, last),
            FieldAssignment::new(25, form.client_phone.as_str()),
            FieldAssignment::new(29, form.client_email.as_str()),
        ])
    }
}
