//! Payment records: transactional multi-location creation, normalized reads
//! and the restricted OP annotation.

use crate::auth::Principal;
use crate::db::DbPool;
use crate::entities::{pago, pago_item};
use crate::errors::ServiceError;
use crate::services::storage::UploadedFile;
use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, EntityTrait, LoaderTrait, QueryOrder, TransactionTrait,
};
use serde::Serialize;
use tracing::{info, warn};

/// A validated submission, ready to persist. One row is written per entry in
/// `locales`, each carrying `importe_total / locales.len()`.
#[derive(Clone, Debug)]
pub struct NuevoPago {
    pub locales: Vec<String>,
    pub proveedor: String,
    pub fecha_pago: NaiveDate,
    pub fecha_servicio: NaiveDate,
    pub moneda: String,
    pub concepto: String,
    pub importe_total: f64,
    pub observacion: Option<String>,
    pub archivos: Vec<UploadedFile>,
    pub usuario: String,
}

/// Legacy line item, surfaced under its parent record on reads.
#[derive(Clone, Debug, Serialize)]
pub struct ItemView {
    pub concepto: String,
    pub importe: f64,
    pub observacion: Option<String>,
}

/// One payment record normalized at the read boundary: legacy line items are
/// folded into `concepto`/`importe` when the flattened columns are empty, and
/// the legacy single date backs `fecha_pago`-era display fields. Downstream
/// code never branches on schema generation.
#[derive(Clone, Debug, Serialize)]
pub struct PagoView {
    pub id: i32,
    pub local: String,
    pub proveedor: String,
    pub fecha_pago: NaiveDate,
    pub fecha_servicio: NaiveDate,
    pub fecha: Option<NaiveDate>,
    pub moneda: String,
    pub concepto: Option<String>,
    pub importe: Option<f64>,
    pub observacion: Option<String>,
    pub op: Option<String>,
    pub archivos: Vec<UploadedFile>,
    pub items: Vec<ItemView>,
    pub usuario_registro: String,
    pub fecha_registro: chrono::NaiveDateTime,
}

impl PagoView {
    fn from_parts(model: pago::Model, items: Vec<pago_item::Model>) -> Self {
        let items: Vec<ItemView> = items
            .into_iter()
            .map(|item| ItemView {
                concepto: item.concepto,
                importe: item.importe,
                observacion: item.observacion,
            })
            .collect();

        // Flattened columns win; item-era rows synthesize them from children.
        let concepto = model.concepto.clone().or_else(|| {
            if items.is_empty() {
                None
            } else {
                Some(
                    items
                        .iter()
                        .map(|item| item.concepto.as_str())
                        .collect::<Vec<_>>()
                        .join("; "),
                )
            }
        });
        let importe = model
            .importe
            .or_else(|| (!items.is_empty()).then(|| items.iter().map(|item| item.importe).sum()));

        let archivos = serde_json::from_str(&model.archivos).unwrap_or_else(|e| {
            warn!(pago_id = model.id, error = %e, "unreadable archivos column, serving empty list");
            Vec::new()
        });

        Self {
            id: model.id,
            local: model.local,
            proveedor: model.proveedor,
            fecha_pago: model.fecha_pago,
            fecha_servicio: model.fecha_servicio,
            fecha: model.fecha,
            moneda: model.moneda,
            concepto,
            importe,
            observacion: model.observacion,
            op: model.op,
            archivos,
            items,
            usuario_registro: model.usuario_registro,
            fecha_registro: model.fecha_registro,
        }
    }
}

/// Create/list/annotate operations over the `pagos` table.
#[derive(Clone)]
pub struct PagoService {
    db: DbPool,
    op_editor: String,
}

impl PagoService {
    pub fn new(db: DbPool, op_editor: String) -> Self {
        Self { db, op_editor }
    }

    /// Persists one submission as `locales.len()` rows inside a single
    /// transaction. Either every location gets its row or none do.
    pub async fn create_pagos(&self, nuevo: NuevoPago) -> Result<Vec<i32>, ServiceError> {
        let n = nuevo.locales.len();
        if n == 0 {
            return Err(ServiceError::ValidationError(
                "Debe seleccionar al menos un local".to_string(),
            ));
        }
        if !nuevo.importe_total.is_finite() || nuevo.importe_total <= 0.0 {
            return Err(ServiceError::ValidationError(
                "El importe debe ser un número mayor a 0".to_string(),
            ));
        }

        let importe_por_local = nuevo.importe_total / n as f64;
        let archivos_json = serde_json::to_string(&nuevo.archivos)
            .map_err(|e| ServiceError::InternalError(e.to_string()))?;
        let now = Utc::now().naive_utc();

        let txn = self.db.begin().await?;
        let mut ids = Vec::with_capacity(n);
        for local in &nuevo.locales {
            let inserted = pago::ActiveModel {
                local: Set(local.clone()),
                proveedor: Set(nuevo.proveedor.clone()),
                fecha_pago: Set(nuevo.fecha_pago),
                fecha_servicio: Set(nuevo.fecha_servicio),
                fecha: Set(None),
                moneda: Set(nuevo.moneda.clone()),
                concepto: Set(Some(nuevo.concepto.clone())),
                importe: Set(Some(importe_por_local)),
                observacion: Set(nuevo.observacion.clone()),
                op: Set(None),
                archivos: Set(archivos_json.clone()),
                usuario_registro: Set(nuevo.usuario.clone()),
                fecha_registro: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            ids.push(inserted.id);
        }
        txn.commit().await?;

        info!(
            proveedor = %nuevo.proveedor,
            locales = n,
            importe_total = nuevo.importe_total,
            usuario = %nuevo.usuario,
            "payment recorded"
        );
        Ok(ids)
    }

    /// Every record, newest first, normalized for display.
    pub async fn list_pagos(&self) -> Result<Vec<PagoView>, ServiceError> {
        // Loaded in two steps: find_with_related would reorder by id ascending
        // for its row consolidation, demoting the requested ordering to a
        // tie-breaker.
        let rows = pago::Entity::find()
            .order_by_desc(pago::Column::FechaRegistro)
            .order_by_desc(pago::Column::Id)
            .all(&self.db)
            .await?;
        let items = rows.load_many(pago_item::Entity, &self.db).await?;

        Ok(rows
            .into_iter()
            .zip(items)
            .map(|(model, items)| PagoView::from_parts(model, items))
            .collect())
    }

    /// Sets or clears the OP number on one record. Restricted to the single
    /// configured editor; a non-empty value must be digits only.
    pub async fn update_op(
        &self,
        id: i32,
        nuevo_op: &str,
        principal: &Principal,
    ) -> Result<(), ServiceError> {
        if principal.username != self.op_editor {
            return Err(ServiceError::Forbidden(
                "No tiene permisos para editar el campo OP".to_string(),
            ));
        }

        let trimmed = nuevo_op.trim();
        if !trimmed.is_empty() && !trimmed.chars().all(|c| c.is_ascii_digit()) {
            return Err(ServiceError::ValidationError(
                "El campo OP debe contener solo números".to_string(),
            ));
        }

        let model = pago::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Pago no encontrado".to_string()))?;

        let mut active: pago::ActiveModel = model.into();
        active.op = Set((!trimmed.is_empty()).then(|| trimmed.to_string()));
        active.update(&self.db).await?;

        info!(pago_id = id, editor = %principal.username, "OP updated");
        Ok(())
    }
}
