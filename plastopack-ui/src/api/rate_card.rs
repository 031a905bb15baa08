//! Printable rate card
//!
//! A standalone document built from nine already-computed cost-sheet
//! figures (tape thickness, length, and the seven width rates) plus
//! the coreless reference length. Pure projection: values arrive
//! preformatted in the query string and are never recomputed here.

use crate::pricing::CostSheet;
use axum::{
    extract::Query,
    response::{Html, IntoResponse},
};
use serde::{Deserialize, Serialize};

/// The nine projected figures, preformatted for display. Anything
/// absent renders as "-".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateCardView {
    #[serde(default)]
    pub microns: Option<String>,
    #[serde(default)]
    pub tape_length_m: Option<String>,
    #[serde(default)]
    pub coreless_length_m: Option<String>,
    #[serde(default)]
    pub rate_12mm: Option<String>,
    #[serde(default)]
    pub rate_24mm: Option<String>,
    #[serde(default)]
    pub rate_36mm: Option<String>,
    #[serde(default)]
    pub rate_48mm: Option<String>,
    #[serde(default)]
    pub rate_60mm: Option<String>,
    #[serde(default)]
    pub rate_72mm: Option<String>,
    #[serde(default)]
    pub rate_96mm: Option<String>,
}

impl RateCardView {
    /// Project a computed cost sheet into the printable view,
    /// formatting to two decimals.
    pub fn from_sheet(sheet: &CostSheet) -> Self {
        RateCardView {
            microns: Some(sheet.microns.display()),
            tape_length_m: Some(sheet.tape_length_m.display()),
            coreless_length_m: Some(sheet.coreless_length_m.display()),
            rate_12mm: Some(sheet.rate_12mm.display()),
            rate_24mm: Some(sheet.rate_24mm.display()),
            rate_36mm: Some(sheet.rate_36mm.display()),
            rate_48mm: Some(sheet.rate_48mm.display()),
            rate_60mm: Some(sheet.rate_60mm.display()),
            rate_72mm: Some(sheet.rate_72mm.display()),
            rate_96mm: Some(sheet.rate_96mm.display()),
        }
    }

    fn field(&self, value: &Option<String>) -> String {
        escape_html(value.as_deref().unwrap_or("-"))
    }
}

/// GET /rate-card
///
/// Renders the printable rate card from query parameters.
pub async fn rate_card_page(Query(view): Query<RateCardView>) -> impl IntoResponse {
    Html(render_rate_card(&view))
}

/// Build the printable HTML document.
pub fn render_rate_card(view: &RateCardView) -> String {
    let width_rows: String = [
        ("12", &view.rate_12mm),
        ("24", &view.rate_24mm),
        ("36", &view.rate_36mm),
        ("48", &view.rate_48mm),
        ("60", &view.rate_60mm),
        ("72", &view.rate_72mm),
        ("96", &view.rate_96mm),
    ]
    .into_iter()
    .map(|(size, value)| {
        format!(
            "            <tr><td>{size}</td><td class=\"num\">{}</td></tr>\n",
            view.field(value)
        )
    })
    .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>BOPP Tape Rate Card</title>
    <style>
        body {{
            font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif;
            color: #1e293b;
            margin: 0;
            padding: 24px;
        }}
        .card {{
            max-width: 560px;
            margin: 0 auto;
            border: 1px solid #cbd5e1;
            border-radius: 8px;
            overflow: hidden;
        }}
        header {{
            background-color: #1e3a8a;
            color: #ffffff;
            padding: 16px 20px;
        }}
        header h1 {{
            margin: 0;
            font-size: 20px;
        }}
        header p {{
            margin: 4px 0 0;
            font-size: 13px;
            color: #bfdbfe;
        }}
        .meta {{
            display: flex;
            justify-content: space-between;
            padding: 12px 20px;
            font-size: 13px;
            background-color: #f1f5f9;
            border-bottom: 1px solid #cbd5e1;
        }}
        table {{
            width: 100%;
            border-collapse: collapse;
        }}
        th, td {{
            padding: 8px 20px;
            font-size: 14px;
            border-bottom: 1px solid #e2e8f0;
            text-align: left;
        }}
        th {{
            background-color: #f8fafc;
            font-weight: 600;
        }}
        .num {{
            text-align: right;
        }}
        footer {{
            padding: 12px 20px;
            font-size: 11px;
            color: #64748b;
        }}
        @media print {{
            body {{ padding: 0; }}
            .card {{ border: none; }}
        }}
    </style>
</head>
<body>
    <div class="card">
        <header>
            <h1>BOPP Tape Rate Card</h1>
            <p>J M PlastoPack Pvt. Ltd.</p>
        </header>
        <div class="meta">
            <span>Microns: {microns}</span>
            <span>Tape Length: {tape_length} Mtrs</span>
            <span>Per {coreless_length} Mtrs (Coreless)</span>
        </div>
        <table>
            <thead>
                <tr><th>Size (mm)</th><th class="num">Rate per piece</th></tr>
            </thead>
            <tbody>
{width_rows}            </tbody>
        </table>
        <footer>Rates are indicative and subject to confirmation at order time.</footer>
    </div>
</body>
</html>
"#,
        microns = view.field(&view.microns),
        tape_length = view.field(&view.tape_length_m),
        coreless_length = view.field(&view.coreless_length_m),
        width_rows = width_rows,
    )
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
