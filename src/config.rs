use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub ultramsg_instance_id: String,
    pub ultramsg_token: String,
    pub sheets: Option<SheetsConfig>,
}

/// Remote availability store settings. Absent when the deployment runs in
/// memory-only mode.
#[derive(Clone, Debug)]
pub struct SheetsConfig {
    pub spreadsheet_id: String,
    pub worksheet: String,
    pub api_token: String,
    pub use_cache: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let sheets = match (env::var("GOOGLE_SHEET_ID"), env::var("SHEETS_API_TOKEN")) {
            (Ok(spreadsheet_id), Ok(api_token))
                if !spreadsheet_id.is_empty() && !api_token.is_empty() =>
            {
                Some(SheetsConfig {
                    spreadsheet_id,
                    api_token,
                    worksheet: env::var("SHEETS_WORKSHEET")
                        .unwrap_or_else(|_| "Agendamentos".to_string()),
                    use_cache: env::var("SHEETS_USE_CACHE")
                        .map(|v| v != "false" && v != "0")
                        .unwrap_or(true),
                })
            }
            _ => None,
        };

        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            ultramsg_instance_id: env::var("ULTRAMSG_INSTANCE_ID").unwrap_or_default(),
            ultramsg_token: env::var("ULTRAMSG_TOKEN").unwrap_or_default(),
            sheets,
        }
    }
}
