use serde::{Deserialize, Serialize};

pub const MISSING_CODE: &str = "-";

/// One coded tuple from the market feed: up to three positions (asset, trend, confidence).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawSignal(pub Vec<String>);

impl RawSignal {
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(codes.into_iter().map(Into::into).collect())
    }

    fn position(&self, i: usize) -> &str {
        self.0.get(i).map(String::as_str).unwrap_or(MISSING_CODE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarketRow {
    pub asset: String,
    pub trend: String,
    pub confidence: String,
}

fn asset_label(code: &str) -> Option<&'static str> {
    match code {
        "I" => Some("IHSG"),
        "B" => Some("BBCA"),
        "T" => Some("TLKM"),
        _ => None,
    }
}

fn trend_label(code: &str) -> Option<&'static str> {
    match code {
        "H" => Some("Naik (Uptrend)"),
        "B" => Some("Sideways"),
        "L" => Some("Turun (Downtrend)"),
        _ => None,
    }
}

fn confidence_label(code: &str) -> Option<&'static str> {
    match code {
        "T" => Some("Tinggi"),
        "S" => Some("Sedang"),
        "R" => Some("Rendah"),
        _ => None,
    }
}

fn translate(code: &str, table: fn(&str) -> Option<&'static str>) -> String {
    table(code).map(str::to_string).unwrap_or_else(|| code.to_string())
}

/// Translates a coded tuple to display labels. Unknown codes pass through verbatim and missing
/// trailing positions become `-`.
pub fn normalize(raw: &RawSignal) -> MarketRow {
    MarketRow {
        asset: translate(raw.position(0), asset_label),
        trend: translate(raw.position(1), trend_label),
        confidence: translate(raw.position(2), confidence_label),
    }
}

pub fn normalize_all(raw: &[RawSignal]) -> Vec<MarketRow> {
    raw.iter().map(normalize).collect()
}
