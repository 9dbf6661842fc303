//! Transactional email for new payment submissions, via the Resend HTTP API.
//!
//! Sending is best-effort: the submission is already committed when the email
//! goes out, so a delivery failure only flips `emailSent` in the response.

use crate::config::AppConfig;
use crate::services::storage::UploadedFile;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use tracing::{error, info, warn};

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

const MESES: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

/// Everything the notification email needs about one submission.
pub struct PagoNotification<'a> {
    pub proveedor: &'a str,
    pub locales: &'a [String],
    pub fecha_pago: NaiveDate,
    pub fecha_servicio: NaiveDate,
    pub moneda: &'a str,
    pub concepto: &'a str,
    pub importe_total: f64,
    pub observacion: Option<&'a str>,
    pub archivos: &'a [UploadedFile],
    pub usuario: &'a str,
}

#[derive(Serialize)]
struct ResendRequest<'a> {
    from: &'a str,
    to: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    cc: Option<&'a [String]>,
    subject: String,
    html: String,
}

/// Resend-backed mailer. Disabled when no API key is configured.
#[derive(Clone)]
pub struct Mailer {
    client: reqwest::Client,
    api_key: Option<String>,
    from: String,
    to: Vec<String>,
    cc: Vec<String>,
}

impl Mailer {
    pub fn from_config(cfg: &AppConfig) -> Self {
        let api_key = cfg
            .resend_api_key
            .as_ref()
            .filter(|key| !key.trim().is_empty())
            .cloned();
        if api_key.is_none() {
            warn!("email not configured; notifications will be skipped");
        }
        let cc = cfg
            .email_to_cc
            .iter()
            .map(|addr| addr.trim().to_string())
            .filter(|addr| !addr.is_empty())
            .collect();
        Self {
            client: reqwest::Client::new(),
            api_key,
            from: cfg.email_from.clone(),
            to: vec![cfg.email_to.clone()],
            cc,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    /// Sends the notification, reporting success as a plain bool.
    pub async fn send_notification(&self, pago: &PagoNotification<'_>) -> bool {
        let Some(api_key) = self.api_key.as_ref() else {
            return false;
        };

        let request = ResendRequest {
            from: &self.from,
            to: &self.to,
            cc: (!self.cc.is_empty()).then_some(self.cc.as_slice()),
            subject: build_subject(pago.proveedor, pago.fecha_servicio, pago.locales),
            html: render_html(pago),
        };

        let result = self
            .client
            .post(RESEND_ENDPOINT)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                info!(subject = %request.subject, "notification email sent");
                true
            }
            Ok(response) => {
                let status = response.status();
                let detail = response.text().await.unwrap_or_default();
                error!(%status, detail, "email API rejected the notification");
                false
            }
            Err(e) => {
                error!(error = %e, "email send failed");
                false
            }
        }
    }
}

/// `Presupuesto {proveedor} - Periodo: {Mes Año} - Local: {locales}`, with the
/// period taken from the service date.
pub fn build_subject(proveedor: &str, fecha_servicio: NaiveDate, locales: &[String]) -> String {
    let mes = MESES[fecha_servicio.month0() as usize];
    format!(
        "Presupuesto {} - Periodo: {} {} - Local: {}",
        proveedor,
        mes,
        fecha_servicio.year(),
        locales.join(", ")
    )
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn format_fecha(fecha: NaiveDate) -> String {
    fecha.format("%d/%m/%Y").to_string()
}

fn render_html(pago: &PagoNotification<'_>) -> String {
    let n = pago.locales.len().max(1);
    let importe_por_local = pago.importe_total / n as f64;

    let mut rows = String::new();
    let mut push_row = |label: &str, value: &str| {
        rows.push_str(&format!(
            "<tr><td style=\"padding:6px 12px;font-weight:bold\">{}</td>\
             <td style=\"padding:6px 12px\">{}</td></tr>",
            label,
            escape_html(value)
        ));
    };

    push_row("Proveedor", pago.proveedor);
    push_row("Locales", &pago.locales.join(", "));
    push_row("Fecha de pago", &format_fecha(pago.fecha_pago));
    push_row("Fecha de servicio", &format_fecha(pago.fecha_servicio));
    push_row("Moneda", pago.moneda);
    push_row("Concepto", pago.concepto);
    push_row(
        "Importe total",
        &format!("{} {:.2}", pago.moneda, pago.importe_total),
    );
    if n > 1 {
        push_row(
            "Importe por local",
            &format!("{} {:.2} ({} locales)", pago.moneda, importe_por_local, n),
        );
    }
    if let Some(observacion) = pago.observacion.filter(|o| !o.trim().is_empty()) {
        push_row("Observación", observacion);
    }
    push_row("Registrado por", pago.usuario);

    let archivos_html = if pago.archivos.is_empty() {
        String::new()
    } else {
        let links: String = pago
            .archivos
            .iter()
            .map(|archivo| {
                format!(
                    "<li><a href=\"{}\">{}</a></li>",
                    escape_html(&archivo.url),
                    escape_html(&archivo.file_name)
                )
            })
            .collect();
        format!("<h3>Archivos adjuntos</h3><ul>{links}</ul>")
    };

    format!(
        "<div style=\"font-family:Arial,sans-serif;max-width:600px\">\
         <h2>Nueva solicitud de pago</h2>\
         <table style=\"border-collapse:collapse;width:100%\">{rows}</table>\
         {archivos_html}\
         </div>"
    )
}
