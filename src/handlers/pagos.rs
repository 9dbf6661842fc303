//! Payment endpoints: multipart submission, history listing and the
//! restricted OP annotation.

use crate::auth::CurrentUser;
use crate::errors::ServiceError;
use crate::handlers::common::{created_response, success_response};
use crate::services::mailer::PagoNotification;
use crate::services::payments::NuevoPago;
use crate::services::storage::{self, MAX_FILES, MAX_FILE_BYTES};
use crate::AppState;
use axum::extract::{Multipart, Path, State};
use axum::response::Response;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

#[derive(Debug)]
struct RawFile {
    name: String,
    mime: String,
    bytes: Vec<u8>,
}

#[derive(Debug, Default)]
struct RawSubmission {
    locales: Option<String>,
    proveedor: Option<String>,
    fecha_pago: Option<String>,
    fecha_servicio: Option<String>,
    moneda: Option<String>,
    concepto: Option<String>,
    importe: Option<String>,
    observacion: Option<String>,
    files: Vec<RawFile>,
}

async fn read_multipart(mut multipart: Multipart) -> Result<RawSubmission, ServiceError> {
    let mut raw = RawSubmission::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServiceError::ValidationError(format!("Formulario inválido: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "archivos" {
            if raw.files.len() >= MAX_FILES {
                return Err(ServiceError::ValidationError(format!(
                    "Se permiten hasta {MAX_FILES} archivos"
                )));
            }
            let file_name = field.file_name().unwrap_or("archivo").to_string();
            let mime = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            if !storage::is_valid_file_type(&mime) {
                return Err(ServiceError::ValidationError(
                    "Tipo de archivo no permitido. Solo se aceptan imágenes y PDF".to_string(),
                ));
            }
            let bytes = field.bytes().await.map_err(|e| {
                ServiceError::ValidationError(format!("Error al leer el archivo: {e}"))
            })?;
            if bytes.len() > MAX_FILE_BYTES {
                return Err(ServiceError::ValidationError(
                    "Cada archivo debe pesar menos de 10 MB".to_string(),
                ));
            }
            raw.files.push(RawFile {
                name: file_name,
                mime,
                bytes: bytes.to_vec(),
            });
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| ServiceError::ValidationError(format!("Formulario inválido: {e}")))?;
        match name.as_str() {
            "locales" => raw.locales = Some(value),
            "proveedor" => raw.proveedor = Some(value),
            "fechaPago" => raw.fecha_pago = Some(value),
            "fechaServicio" => raw.fecha_servicio = Some(value),
            "moneda" => raw.moneda = Some(value),
            "concepto" => raw.concepto = Some(value),
            "importe" => raw.importe = Some(value),
            "observacion" => raw.observacion = Some(value),
            _ => {}
        }
    }

    Ok(raw)
}

fn required_text(value: Option<String>, message: &str) -> Result<String, ServiceError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ServiceError::ValidationError(message.to_string()))
}

fn parse_fecha(value: Option<&str>) -> Result<NaiveDate, ServiceError> {
    let value = value.map(str::trim).filter(|v| !v.is_empty()).ok_or_else(|| {
        ServiceError::ValidationError("Las fechas de pago y servicio son requeridas".to_string())
    })?;
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| ServiceError::ValidationError("Formato de fecha inválido".to_string()))
}

/// First failing rule decides the 400: locations, provider, currency,
/// concept, dates, amount, then files (files are checked while streaming).
fn validate_submission(
    raw: RawSubmission,
    usuario: String,
) -> Result<(NuevoPago, Vec<RawFile>), ServiceError> {
    let locales: Vec<String> = raw
        .locales
        .as_deref()
        .and_then(|v| serde_json::from_str(v).ok())
        .unwrap_or_default();
    let locales: Vec<String> = locales
        .into_iter()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect();
    if locales.is_empty() {
        return Err(ServiceError::ValidationError(
            "Debe seleccionar al menos un local".to_string(),
        ));
    }

    let proveedor = required_text(raw.proveedor, "El proveedor es requerido")?;
    let moneda = required_text(raw.moneda, "La moneda es requerida")?;
    let concepto = required_text(raw.concepto, "El concepto es requerido")?;

    let fecha_pago = parse_fecha(raw.fecha_pago.as_deref())?;
    let fecha_servicio = parse_fecha(raw.fecha_servicio.as_deref())?;
    if fecha_pago > Utc::now().date_naive() {
        return Err(ServiceError::ValidationError(
            "La fecha de pago no puede ser futura".to_string(),
        ));
    }

    let importe_total = raw
        .importe
        .as_deref()
        .map(str::trim)
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v > 0.0)
        .ok_or_else(|| {
            ServiceError::ValidationError("El importe debe ser un número mayor a 0".to_string())
        })?;

    let observacion = raw
        .observacion
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty());

    Ok((
        NuevoPago {
            locales,
            proveedor,
            fecha_pago,
            fecha_servicio,
            moneda,
            concepto,
            importe_total,
            observacion,
            archivos: Vec::new(),
            usuario,
        },
        raw.files,
    ))
}

pub async fn create_pago(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    multipart: Multipart,
) -> Result<Response, ServiceError> {
    let raw = read_multipart(multipart).await?;
    let (mut nuevo, files) = validate_submission(raw, principal.username)?;

    // Uploads are best-effort: a failed one is dropped, never fatal.
    for file in files {
        match state.storage.upload(&file.name, &file.mime, file.bytes).await {
            Ok(archivo) => nuevo.archivos.push(archivo),
            Err(e) => warn!(file = %file.name, error = %e, "attachment upload failed, omitting"),
        }
    }

    let ids = state.pagos.create_pagos(nuevo.clone()).await?;

    let email_sent = state
        .mailer
        .send_notification(&PagoNotification {
            proveedor: &nuevo.proveedor,
            locales: &nuevo.locales,
            fecha_pago: nuevo.fecha_pago,
            fecha_servicio: nuevo.fecha_servicio,
            moneda: &nuevo.moneda,
            concepto: &nuevo.concepto,
            importe_total: nuevo.importe_total,
            observacion: nuevo.observacion.as_deref(),
            archivos: &nuevo.archivos,
            usuario: &nuevo.usuario,
        })
        .await;

    let body = json!({
        "success": true,
        "pagoId": ids[0],
        "pagoIds": ids,
        "emailSent": email_sent,
    });
    // Delivery failure degrades the status, never the persisted rows.
    Ok(if email_sent {
        created_response(body)
    } else {
        success_response(body)
    })
}

pub async fn list_pagos(
    State(state): State<AppState>,
    CurrentUser(_principal): CurrentUser,
) -> Result<Json<Value>, ServiceError> {
    let data = state.pagos.list_pagos().await?;
    Ok(Json(json!({ "success": true, "data": data })))
}

#[derive(Debug, Deserialize)]
pub struct UpdateOpRequest {
    #[serde(default)]
    pub op: Option<String>,
}

pub async fn update_op(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(id): Path<i32>,
    Json(body): Json<UpdateOpRequest>,
) -> Result<Json<Value>, ServiceError> {
    state
        .pagos
        .update_op(id, body.op.as_deref().unwrap_or(""), &principal)
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "OP actualizado correctamente",
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn raw(locales: &str, importe: &str) -> RawSubmission {
        RawSubmission {
            locales: Some(locales.to_string()),
            proveedor: Some("Acme".into()),
            fecha_pago: Some("2024-01-10".into()),
            fecha_servicio: Some("2024-01-05".into()),
            moneda: Some("Peso".into()),
            concepto: Some("Internet".into()),
            importe: Some(importe.to_string()),
            observacion: None,
            files: Vec::new(),
        }
    }

    #[test]
    fn accepts_a_complete_submission() {
        let (nuevo, _) = validate_submission(raw(r#"["A","B"]"#, "100.5"), "u".into()).unwrap();
        assert_eq!(nuevo.locales, vec!["A", "B"]);
        assert_eq!(nuevo.importe_total, 100.5);
        assert_eq!(nuevo.fecha_pago, NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
    }

    #[test]
    fn empty_or_malformed_locales_rejected_first() {
        for locales in ["[]", "not json", r#"["  "]"#] {
            let err = validate_submission(raw(locales, "10"), "u".into()).unwrap_err();
            let msg = assert_matches!(err, ServiceError::ValidationError(m) => m);
            assert_eq!(msg, "Debe seleccionar al menos un local");
        }
    }

    #[test]
    fn blank_required_fields_rejected() {
        let mut submission = raw(r#"["A"]"#, "10");
        submission.proveedor = Some("   ".into());
        assert_matches!(
            validate_submission(submission, "u".into()),
            Err(ServiceError::ValidationError(m)) if m == "El proveedor es requerido"
        );

        let mut submission = raw(r#"["A"]"#, "10");
        submission.concepto = None;
        assert_matches!(
            validate_submission(submission, "u".into()),
            Err(ServiceError::ValidationError(m)) if m == "El concepto es requerido"
        );
    }

    #[test]
    fn dates_must_parse_and_payment_date_cannot_be_future() {
        let mut submission = raw(r#"["A"]"#, "10");
        submission.fecha_pago = Some("10/01/2024".into());
        assert_matches!(
            validate_submission(submission, "u".into()),
            Err(ServiceError::ValidationError(m)) if m == "Formato de fecha inválido"
        );

        let mut submission = raw(r#"["A"]"#, "10");
        submission.fecha_servicio = None;
        assert_matches!(
            validate_submission(submission, "u".into()),
            Err(ServiceError::ValidationError(m)) if m == "Las fechas de pago y servicio son requeridas"
        );

        let mut submission = raw(r#"["A"]"#, "10");
        let mañana = Utc::now().date_naive() + chrono::Duration::days(1);
        submission.fecha_pago = Some(mañana.format("%Y-%m-%d").to_string());
        assert_matches!(
            validate_submission(submission, "u".into()),
            Err(ServiceError::ValidationError(m)) if m == "La fecha de pago no puede ser futura"
        );
    }

    #[test]
    fn importe_must_be_a_positive_number() {
        for importe in ["0", "-1", "abc", "", "NaN", "inf"] {
            let err = validate_submission(raw(r#"["A"]"#, importe), "u".into()).unwrap_err();
            let msg = assert_matches!(err, ServiceError::ValidationError(m) => m);
            assert_eq!(msg, "El importe debe ser un número mayor a 0");
        }
    }

    #[test]
    fn observacion_is_optional_and_trimmed() {
        let mut submission = raw(r#"["A"]"#, "10");
        submission.observacion = Some("  pagar antes del 10  ".into());
        let (nuevo, _) = validate_submission(submission, "u".into()).unwrap();
        assert_eq!(nuevo.observacion.as_deref(), Some("pagar antes del 10"));

        let mut submission = raw(r#"["A"]"#, "10");
        submission.observacion = Some("   ".into());
        let (nuevo, _) = validate_submission(submission, "u".into()).unwrap();
        assert_eq!(nuevo.observacion, None);
    }
}
