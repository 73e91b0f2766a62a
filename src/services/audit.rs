use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::entities::booking_modification::{self, ModificationKind};
use crate::error::AppResult;

/// One field-level change to a reservation, before it is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub kind: ModificationKind,
    pub field: &'static str,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

impl FieldChange {
    pub fn new(
        kind: ModificationKind,
        field: &'static str,
        old_value: Option<String>,
        new_value: Option<String>,
    ) -> Self {
        Self {
            kind,
            field,
            old_value,
            new_value,
        }
    }
}

/// Append one audit row. Callers pass their open transaction so the record
/// commits or rolls back together with the change it describes.
pub async fn record<C: ConnectionTrait>(
    db: &C,
    reservation_id: i32,
    change: FieldChange,
) -> AppResult<booking_modification::Model> {
    let row = booking_modification::ActiveModel {
        reservation_id: Set(reservation_id),
        modification_type: Set(change.kind),
        field: Set(change.field.to_string()),
        old_value: Set(change.old_value),
        new_value: Set(change.new_value),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    };

    Ok(row.insert(db).await?)
}

pub async fn record_all<C: ConnectionTrait>(
    db: &C,
    reservation_id: i32,
    changes: Vec<FieldChange>,
) -> AppResult<()> {
    for change in changes {
        record(db, reservation_id, change).await?;
    }
    Ok(())
}

/// Audit trail of a reservation in the order it was written.
pub async fn history<C: ConnectionTrait>(
    db: &C,
    reservation_id: i32,
) -> AppResult<Vec<booking_modification::Model>> {
    Ok(booking_modification::Entity::find()
        .filter(booking_modification::Column::ReservationId.eq(reservation_id))
        .order_by_asc(booking_modification::Column::Id)
        .all(db)
        .await?)
}
