//! # Shift Service

use tracing::info;

use bistro_core::Shift;

use crate::context::ServiceContext;
use crate::error::{ServiceError, ServiceResult};

#[derive(Debug, Clone)]
pub struct ShiftService {
    ctx: ServiceContext,
}

impl ShiftService {
    pub fn new(ctx: ServiceContext) -> Self {
        ShiftService { ctx }
    }

    pub async fn open(&self, attendant_id: &str) -> ServiceResult<Shift> {
        let shift = Shift::open(attendant_id)?;
        self.ctx.db.shifts().insert(&shift).await?;

        info!(shift_id = %shift.id, attendant_id = %attendant_id, "Shift opened");
        Ok(shift)
    }

    pub async fn get(&self, id: &str) -> ServiceResult<Shift> {
        self.ctx
            .db
            .shifts()
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Shift", id))
    }

    /// The most recently opened shift that is still open.
    pub async fn current(&self) -> ServiceResult<Option<Shift>> {
        Ok(self.ctx.db.shifts().get_open().await?)
    }

    /// Closes the shift. Its orders stay as they are.
    pub async fn close(&self, id: &str) -> ServiceResult<Shift> {
        let _guard = self.ctx.locks.lock(id).await;

        let mut shift = self.get(id).await?;
        shift.close()?;
        self.ctx.db.shifts().save(&shift).await?;

        info!(
            shift_id = %id,
            orders = shift.current_order_number,
            "Shift closed"
        );
        Ok(shift)
    }
}
