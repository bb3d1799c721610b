#![forbid(unsafe_code)]

use pallet_contracts::{PalletCode, PalletRecord};
use serde::Serialize;
use url::form_urlencoded;

use crate::date_format::format_display_date;
use crate::qr::QrReference;

pub const NOT_AVAILABLE: &str = "N/A";
pub const SHARE_QUERY_PARAM: &str = "palete";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoordinatesView {
    pub latitude: f64,
    pub longitude: f64,
    pub maps_embed_url: String,
    pub maps_link_url: String,
}

impl CoordinatesView {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            maps_embed_url: format!(
                "https://www.google.com/maps?q={latitude},{longitude}&t=k&z=16&output=embed"
            ),
            maps_link_url: format!("https://www.google.com/maps?q={latitude},{longitude}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QrView {
    Embedded { mime: String, download_name: String },
    Remote { url: String },
}

/// Display-ready projection of one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordView {
    pub pallet_code_display: String,
    pub created_on: String,
    pub lot_code: String,
    pub harvested_on: String,
    pub variety: String,
    pub plot_name: String,
    pub plot_code: String,
    pub plot_description: String,
    pub plot_caption: String,
    pub company_name: String,
    pub company_city: String,
    pub company_state: String,
    pub coordinates: Option<CoordinatesView>,
    pub share_url: String,
    pub qr: Option<QrView>,
}

impl RecordView {
    pub fn build(code: &PalletCode, record: &PalletRecord, share_base: Option<&str>) -> Self {
        let pallet_code_display = non_empty(&record.palete_codigo)
            .map(str::to_string)
            .unwrap_or_else(|| code.as_str().to_string());
        let plot_description = or_blank(&record.talhao_descricao);
        let plot_caption = if plot_description.is_empty() {
            or_na(&record.talhao_nome)
        } else {
            plot_description.clone()
        };
        let share_url = share_url(share_base, &pallet_code_display);
        let qr = record
            .qr_code_url
            .as_deref()
            .and_then(QrReference::parse)
            .map(|qr| match qr {
                QrReference::DataUrl { mime, .. } => QrView::Embedded {
                    mime,
                    download_name: qr_download_name(&pallet_code_display),
                },
                QrReference::Remote(url) => QrView::Remote { url },
            });

        Self {
            created_on: display_date(&record.data_criacao),
            lot_code: or_na(&record.lote_codigo),
            harvested_on: display_date(&record.data_corte),
            variety: or_na(&record.variedade_nome_unificado),
            plot_name: or_na(&record.talhao_nome),
            plot_code: or_na(&record.talhao_codigo),
            plot_description,
            plot_caption,
            company_name: or_na(&record.empresa_nome),
            company_city: or_blank(&record.empresa_cidade),
            company_state: or_blank(&record.empresa_estado),
            coordinates: coordinates(record),
            share_url,
            qr,
            pallet_code_display,
        }
    }
}

/// The code is form-encoded, so `+`, `&` and `#` survive the round trip.
pub fn share_url(share_base: Option<&str>, pallet_code_display: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair(SHARE_QUERY_PARAM, pallet_code_display)
        .finish();
    match share_base.map(str::trim).filter(|b| !b.is_empty()) {
        Some(base) => format!("{base}?{query}"),
        None => format!("?{query}"),
    }
}

/// Safe to place in a quoted `Content-Disposition` filename.
pub fn qr_download_name(pallet_code_display: &str) -> String {
    let stem: String = pallet_code_display
        .chars()
        .map(|c| match c {
            'A'..='Z' | 'a'..='z' | '0'..='9' | '-' | '_' | '.' => c,
            _ => '_',
        })
        .collect();
    format!("{stem}_qr.png")
}

// A zero coordinate counts as missing.
fn coordinates(record: &PalletRecord) -> Option<CoordinatesView> {
    match (record.latitude, record.longitude) {
        (Some(lat), Some(lon)) if lat != 0.0 && lon != 0.0 => Some(CoordinatesView::new(lat, lon)),
        _ => None,
    }
}

fn display_date(value: &Option<String>) -> String {
    non_empty(value)
        .map(format_display_date)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn or_na(value: &Option<String>) -> String {
    value
        .clone()
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn or_blank(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}
